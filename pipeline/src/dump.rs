//! Diagnostic copies of intermediate output.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

pub const FULL_DUMP: &str = "reified_output_full.lp";
pub const CLEAN_DUMP: &str = "reified_output_clean.lp";

/// Write `text` to `dir/name`. Failures are logged and otherwise ignored.
pub fn write_dump(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    let result = fs::create_dir_all(dir).and_then(|()| fs::write(&path, text));
    match result {
        Ok(()) => debug!(path = %path.display(), "dump written"),
        Err(e) => warn!(path = %path.display(), error = %e, "cannot write dump"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        write_dump(&target, FULL_DUMP, "a.\n");
        assert_eq!(fs::read_to_string(target.join(FULL_DUMP)).unwrap(), "a.\n");
    }

    #[test]
    fn test_failed_dump_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        fs::write(&file, "").unwrap();
        // A file where the directory should be.
        write_dump(&file, CLEAN_DUMP, "a.\n");
        assert!(!file.join(CLEAN_DUMP).exists());
    }
}
