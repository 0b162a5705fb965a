//! Comment-driven tagging.
//!
//! Every rule receives `&tag_rule("<rendered rule>")` as provenance. Two
//! comment forms add user tags:
//! - `% @TAG` tags the next rule with `&tag_rule(TAG)`
//! - `% @TAG :: HEAD : COND, ...` is replaced by the constraint
//!   `:- not &tag_atom(TAG,HEAD), HEAD, COND, ....`

use metalp_parser::{
    parse_program, parse_term, Atom, Comment, Head, Literal, Rule, Sign, Statement, Term,
    TheoryAtom,
};
use regex_lite::Regex;
use tracing::debug;

use crate::error::{ExtensionError, ExtensionResult};
use crate::extension::{rewrite, Extension, Visitor};

/// Theory grammar declaring the tag atoms.
pub const TAG_THEORY: &str = "#theory tag {
  constant {
  };
  &tag_rule/1 : constant, any;
  &tag_atom/2 : constant, any
}.
";

const ATOM_TAG_PATTERN: &str = r"^\s*%\s*@([^\n]+?)\s*::\s*(.*)$";
const RULE_TAG_PATTERN: &str = r"^\s*%\s*@([^\n]+?)\s*$";

/// Tags rules and atoms with provenance theory atoms.
#[derive(Debug, Default)]
pub struct TagExtension;

impl TagExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Extension for TagExtension {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn visitor(&self) -> ExtensionResult<Box<dyn Visitor>> {
        Ok(Box::new(TagVisitor::new()?))
    }

    fn transform(&self, files: &[std::path::PathBuf], prior: Option<&str>) -> ExtensionResult<String> {
        let mut visitor = self.visitor()?;
        let mut out = rewrite(visitor.as_mut(), files, prior)?;
        out.push_str(TAG_THEORY);
        Ok(out)
    }

    fn encoding(&self) -> Option<&'static str> {
        Some("tag")
    }
}

/// State of one tagging run.
#[derive(Debug)]
pub struct TagVisitor {
    atom_pattern: Regex,
    rule_pattern: Regex,
    /// Tags waiting for the next rule, in insertion order.
    rule_tags: Vec<Term>,
    /// Constraints generated from atom tags.
    atom_rules: Vec<Rule>,
}

impl TagVisitor {
    pub fn new() -> ExtensionResult<Self> {
        Ok(Self {
            atom_pattern: Regex::new(ATOM_TAG_PATTERN)?,
            rule_pattern: Regex::new(RULE_TAG_PATTERN)?,
            rule_tags: Vec::new(),
            atom_rules: Vec::new(),
        })
    }

    fn visit_comment(&mut self, comment: Comment) -> ExtensionResult<Option<Statement>> {
        if let Some(caps) = self.atom_pattern.captures(&comment.text) {
            let tag = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let rest = caps.get(2).map_or("", |m| m.as_str()).to_string();
            let rule = atom_tag_rule(&comment.text, &tag, &rest)?;
            debug!(tag = %tag, rule = %rule, "atom tag");
            self.atom_rules.push(rule);
            return Ok(self.atom_rules.pop().map(Statement::Rule));
        }

        if let Some(caps) = self.rule_pattern.captures(&comment.text) {
            let tag = caps.get(1).map_or("", |m| m.as_str());
            let term = parse_term(tag).map_err(|e| {
                ExtensionError::tag_syntax(
                    comment.text.clone(),
                    Some(format!("{}.", tag)),
                    format!("{}; rule tags should be in the format @tag_name", e),
                )
            })?;
            if !self.rule_tags.contains(&term) {
                self.rule_tags.push(term);
            }
            return Ok(None);
        }

        Ok(Some(Statement::Comment(comment)))
    }

    fn visit_rule(&mut self, mut rule: Rule) -> Rule {
        let fingerprint = rule.to_string().replace('"', "'");
        rule.body.push(tag_literal(Term::string(fingerprint)));
        for tag in self.rule_tags.drain(..) {
            rule.body.push(tag_literal(tag));
        }
        rule
    }
}

impl Visitor for TagVisitor {
    fn visit(&mut self, statement: Statement) -> ExtensionResult<Option<Statement>> {
        match statement {
            Statement::Comment(comment) => self.visit_comment(comment),
            Statement::Rule(rule) => Ok(Some(Statement::Rule(self.visit_rule(rule)))),
            other => Ok(Some(other)),
        }
    }

    fn finish(&mut self) -> ExtensionResult<()> {
        if !self.rule_tags.is_empty() {
            debug!(count = self.rule_tags.len(), "discarding rule tags without a rule");
            self.rule_tags.clear();
        }
        Ok(())
    }
}

fn tag_literal(tag: Term) -> Literal {
    Literal::positive(Atom::Theory(TheoryAtom::directive("tag_rule", vec![tag])))
}

/// Index of the first `:` that does not start `:-`.
fn condition_separator(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    (0..bytes.len()).find(|&i| bytes[i] == b':' && bytes.get(i + 1) != Some(&b'-'))
}

/// Build the constraint for `% @tag :: head : conditions`.
fn atom_tag_rule(comment: &str, tag: &str, rest: &str) -> ExtensionResult<Rule> {
    let rest = rest.trim();
    let written = match condition_separator(rest) {
        Some(i) => format!("{} :- {}.", rest[..i].trim(), rest[i + 1..].trim()),
        None => format!("{}.", rest),
    };

    let invalid = |rule: &str, message: String| {
        ExtensionError::tag_syntax(comment, Some(rule.to_string()), message)
    };

    let (head, body) = match single_rule(&written) {
        Ok(Rule {
            head:
                Head::Literal(Literal {
                    sign: Sign::Positive,
                    atom: Atom::Symbolic(head),
                }),
            body,
            ..
        }) => (head, body),
        Ok(_) => {
            return Err(invalid(
                &written,
                "the tagged atom must be a single symbolic atom".to_string(),
            ))
        }
        Err(message) => {
            return Err(invalid(
                &written,
                format!("{}; atom tags should be in the format @tag_name :: atom : conditions", message),
            ))
        }
    };

    let mut text = format!(":- not &tag_atom({},{}), {}", tag, head, head);
    for literal in &body {
        text.push_str(", ");
        text.push_str(&literal.to_string());
    }
    text.push('.');

    single_rule(&text).map_err(|message| invalid(&text, message))
}

fn single_rule(text: &str) -> Result<Rule, String> {
    let mut statements = parse_program(text).map_err(|e| e.to_string())?;
    match (statements.pop(), statements.is_empty()) {
        (Some(Statement::Rule(rule)), true) => Ok(rule),
        _ => Err("expected exactly one rule".to_string()),
    }
}
