//! metalp - reify logic programs with provenance tags.

use std::io::{self, Write};

use metalp_cli::{error_kind, init_logging, parse_args, run};
use metalp_extension::default_extensions;

fn main() {
    let cli = match parse_args(&default_extensions(), std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    if let Err(e) = init_logging(&cli.log) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }

    match run(&cli, default_extensions(), io::stdin().lock()) {
        Ok(output) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = stdout.write_all(output.as_bytes()).and_then(|()| stdout.flush()) {
                eprintln!("error[IoError]: cannot write output: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("error[{}]: {:#}", error_kind(&e), e);
            std::process::exit(1);
        }
    }
}
