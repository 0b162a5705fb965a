//! Ground symbols.
//!
//! A symbol is the value of a variable-free term. Symbols are totally ordered:
//! `#inf` < numbers < functions < strings < `#sup`. Functions (which include
//! constants and tuples) compare by arity, then sign, then name, then arguments.

use std::cmp::Ordering;
use std::fmt;

use crate::Signature;

/// A ground value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `#inf`
    Infimum,
    /// Integer.
    Number(i64),
    /// Constant (`a`), function (`f(1,a)`) or tuple (empty name).
    Function {
        name: String,
        args: Vec<Symbol>,
        positive: bool,
    },
    /// String, stored unescaped.
    String(String),
    /// `#sup`
    Supremum,
}

impl Symbol {
    pub fn number(n: i64) -> Self {
        Symbol::Number(n)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Symbol::String(s.into())
    }

    pub fn constant(name: impl Into<String>) -> Self {
        Self::function(name, Vec::new())
    }

    pub fn function(name: impl Into<String>, args: Vec<Symbol>) -> Self {
        Symbol::Function {
            name: name.into(),
            args,
            positive: true,
        }
    }

    pub fn tuple(args: Vec<Symbol>) -> Self {
        Self::function("", args)
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Symbol::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Function name; `None` for non-functions, `Some("")` for tuples.
    pub fn name(&self) -> Option<&str> {
        match self {
            Symbol::Function { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Symbol] {
        match self {
            Symbol::Function { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_positive(&self) -> bool {
        !matches!(self, Symbol::Function { positive: false, .. })
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Symbol::Function { name, .. } if name.is_empty())
    }

    /// Symbols that may stand as atoms: named functions and constants.
    pub fn is_atom(&self) -> bool {
        matches!(self, Symbol::Function { name, .. } if !name.is_empty())
    }

    /// Classical negation of a named function; `None` for anything else.
    pub fn negate(&self) -> Option<Symbol> {
        match self {
            Symbol::Function {
                name,
                args,
                positive,
            } if !name.is_empty() => Some(Symbol::Function {
                name: name.clone(),
                args: args.clone(),
                positive: !positive,
            }),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<Signature> {
        match self {
            Symbol::Function {
                name,
                args,
                positive,
            } if !name.is_empty() => Some(Signature::new(name.clone(), args.len(), *positive)),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Symbol::Infimum => 0,
            Symbol::Number(_) => 1,
            Symbol::Function { .. } => 2,
            Symbol::String(_) => 3,
            Symbol::Supremum => 4,
        }
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Symbol::Number(a), Symbol::Number(b)) => a.cmp(b),
            (Symbol::String(a), Symbol::String(b)) => a.cmp(b),
            (
                Symbol::Function {
                    name: n1,
                    args: a1,
                    positive: p1,
                },
                Symbol::Function {
                    name: n2,
                    args: a2,
                    positive: p2,
                },
            ) => a1
                .len()
                .cmp(&a2.len())
                .then_with(|| p2.cmp(p1))
                .then_with(|| n1.cmp(n2))
                .then_with(|| a1.cmp(a2)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Write `s` as a quoted string literal.
pub fn write_quoted(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Infimum => write!(f, "#inf"),
            Symbol::Supremum => write!(f, "#sup"),
            Symbol::Number(n) => write!(f, "{}", n),
            Symbol::String(s) => write_quoted(f, s),
            Symbol::Function {
                name,
                args,
                positive,
            } => {
                if !positive {
                    write!(f, "-")?;
                }
                write!(f, "{}", name)?;
                if !args.is_empty() || name.is_empty() {
                    write!(f, "(")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    if name.is_empty() && args.len() == 1 {
                        write!(f, ",")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_functions_and_tuples() {
        let sym = Symbol::function(
            "f",
            vec![
                Symbol::number(1),
                Symbol::constant("a"),
                Symbol::tuple(vec![Symbol::number(2), Symbol::number(3)]),
            ],
        );
        assert_eq!(sym.to_string(), "f(1,a,(2,3))");
        assert_eq!(Symbol::tuple(vec![]).to_string(), "()");
        assert_eq!(Symbol::tuple(vec![Symbol::number(1)]).to_string(), "(1,)");
        assert_eq!(Symbol::constant("a").to_string(), "a");
    }

    #[test]
    fn test_display_escapes_strings() {
        let sym = Symbol::string("say \"hi\"\\\n");
        assert_eq!(sym.to_string(), r#""say \"hi\"\\\n""#);
    }

    #[test]
    fn test_negation() {
        let p = Symbol::function("p", vec![Symbol::number(1)]);
        let neg = p.negate().unwrap();
        assert_eq!(neg.to_string(), "-p(1)");
        assert!(!neg.is_positive());
        assert_eq!(neg.signature().unwrap().to_string(), "-p/1");
        assert!(Symbol::number(1).negate().is_none());
        assert!(Symbol::tuple(vec![]).negate().is_none());
    }

    #[test]
    fn test_total_order() {
        let mut symbols = vec![
            Symbol::Supremum,
            Symbol::string("a"),
            Symbol::function("f", vec![Symbol::number(1)]),
            Symbol::constant("b"),
            Symbol::constant("a"),
            Symbol::number(3),
            Symbol::number(-2),
            Symbol::Infimum,
        ];
        symbols.sort();
        let rendered: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["#inf", "-2", "3", "a", "b", "f(1)", "\"a\"", "#sup"]
        );
    }
}
