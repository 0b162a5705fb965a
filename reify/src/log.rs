//! Append-only meta-fact log.

use crate::fact::MetaFact;

/// Meta-facts in arrival order. Facts are never reordered or removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaLog {
    facts: Vec<MetaFact>,
}

impl MetaLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fact and return its sequence number, starting at 0.
    pub fn append(&mut self, fact: MetaFact) -> usize {
        self.facts.push(fact);
        self.facts.len() - 1
    }

    pub fn facts(&self) -> &[MetaFact] {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetaFact> {
        self.facts.iter()
    }

    /// Largest surrogate identifier in use, if any fact exists.
    pub fn max_id(&self) -> Option<u32> {
        self.facts.iter().map(MetaFact::max_id).max()
    }

    /// The log as program text, one `fact.` per line.
    pub fn to_program(&self) -> String {
        let mut out = String::new();
        for fact in &self.facts {
            out.push_str(&fact.to_string());
            out.push_str(".\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_assigns_sequence_numbers() {
        // GIVEN
        let mut log = MetaLog::new();

        // WHEN
        let first = log.append(MetaFact::AtomTuple(0));
        let second = log.append(MetaFact::AtomTupleAtom { tuple: 0, atom: 1 });

        // THEN
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(log.facts()[second], MetaFact::AtomTupleAtom { tuple: 0, atom: 1 });
        assert_eq!(log.max_id(), Some(1));
    }

    #[test]
    fn test_program_text() {
        let mut log = MetaLog::new();
        assert_eq!(log.max_id(), None);
        log.append(MetaFact::LiteralTuple(1));
        log.append(MetaFact::LiteralTupleLiteral {
            tuple: 1,
            literal: -2,
        });
        assert_eq!(log.to_program(), "literal_tuple(1).\nliteral_tuple(1,-2).\n");
    }
}
