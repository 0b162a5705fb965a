//! Canonical text of AST nodes.
//!
//! Rendering is lossless up to spans: parsing the rendered text of a node
//! yields an equal node. Binary arithmetic is always parenthesised.

use std::fmt;

use crate::ast::*;

fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Body literals; `;` keeps a conditional literal's condition from
/// absorbing the literals after it.
fn body(f: &mut fmt::Formatter<'_>, literals: &[Literal]) -> fmt::Result {
    let conditional = literals
        .iter()
        .any(|l| matches!(l.atom, Atom::Conditional(_)));
    join(f, literals, if conditional { "; " } else { ", " })
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Rule(r) => write!(f, "{}", r),
            Statement::Comment(c) => f.write_str(&c.text),
            Statement::Directive(d) => write!(f, "{}", d),
            Statement::Theory(t) => write!(f, "{}", t),
        }
    }
}

// ==================== RULES ====================

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.head, self.body.is_empty()) {
            (Head::Falsity, true) => f.write_str("#false."),
            (Head::Falsity, false) => {
                f.write_str(":- ")?;
                body(f, &self.body)?;
                f.write_str(".")
            }
            (head, true) => write!(f, "{}.", head),
            (head, false) => {
                write!(f, "{} :- ", head)?;
                body(f, &self.body)?;
                f.write_str(".")
            }
        }
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Head::Falsity => f.write_str("#false"),
            Head::Literal(l) => write!(f, "{}", l),
            Head::Disjunction(ls) => join(f, ls, "; "),
            Head::Choice(c) => write!(f, "{}", c),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(lower) = &self.lower {
            write!(f, "{} ", lower)?;
        }
        if self.elements.is_empty() {
            f.write_str("{ }")?;
        } else {
            f.write_str("{ ")?;
            join(f, &self.elements, "; ")?;
            f.write_str(" }")?;
        }
        if let Some(upper) = &self.upper {
            write!(f, " {}", upper)?;
        }
        Ok(())
    }
}

impl fmt::Display for ChoiceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literal)?;
        if !self.condition.is_empty() {
            f.write_str(": ")?;
            join(f, &self.condition, ", ")?;
        }
        Ok(())
    }
}

// ==================== LITERALS ====================

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sign {
            Sign::Positive => {}
            Sign::Negative => f.write_str("not ")?,
            Sign::DoubleNegative => f.write_str("not not ")?,
        }
        write!(f, "{}", self.atom)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Symbolic(a) => write!(f, "{}", a),
            Atom::Comparison(c) => write!(f, "{}", c),
            Atom::Boolean(true) => f.write_str("#true"),
            Atom::Boolean(false) => f.write_str("#false"),
            Atom::Theory(t) => write!(f, "{}", t),
            Atom::Aggregate(a) => write!(f, "{}", a),
            Atom::Conditional(c) => write!(f, "{}", c),
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(guard) = &self.left {
            write!(f, "{} {} ", guard.term, guard.op)?;
        }
        f.write_str(self.function.name())?;
        if self.elements.is_empty() {
            f.write_str(" { }")?;
        } else {
            f.write_str(" { ")?;
            join(f, &self.elements, "; ")?;
            f.write_str(" }")?;
        }
        if let Some(guard) = &self.right {
            write!(f, " {} {}", guard.op, guard.term)?;
        }
        Ok(())
    }
}

impl fmt::Display for AggregateElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join(f, &self.terms, ",")?;
        if !self.condition.is_empty() {
            f.write_str(": ")?;
            join(f, &self.condition, ", ")?;
        }
        Ok(())
    }
}

impl fmt::Display for ConditionalLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.literal)?;
        join(f, &self.condition, ", ")
    }
}

impl fmt::Display for SymbolicAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.positive {
            f.write_str("-")?;
        }
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("(")?;
            join(f, &self.args, ",")?;
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
        })
    }
}

// ==================== TERMS ====================

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Symbol(sym) => write!(f, "{}", sym),
            Term::Variable(name) => f.write_str(name),
            Term::Function { name, args } => {
                f.write_str(name)?;
                f.write_str("(")?;
                join(f, args, ",")?;
                if name.is_empty() && args.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Term::Unary(UnaryOp::Minus, inner) => write!(f, "-{}", inner),
            Term::Binary(op, left, right) => write!(f, "({}{}{})", left, op, right),
            Term::Interval(lower, upper) => write!(f, "({}..{})", lower, upper),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "\\",
            BinaryOp::Pow => "**",
        })
    }
}

// ==================== THEORY ATOMS ====================

impl fmt::Display for TheoryAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}", self.name)?;
        if !self.elements.is_empty() || self.guard.is_some() {
            if self.elements.is_empty() {
                f.write_str(" { }")?;
            } else {
                f.write_str(" { ")?;
                join(f, &self.elements, "; ")?;
                f.write_str(" }")?;
            }
        }
        if let Some(guard) = &self.guard {
            write!(f, " {} {}", guard.operator, guard.term)?;
        }
        Ok(())
    }
}

impl fmt::Display for TheoryElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join(f, &self.terms, ", ")?;
        if !self.condition.is_empty() {
            f.write_str(": ")?;
            join(f, &self.condition, ", ")?;
        }
        Ok(())
    }
}

impl fmt::Display for TheoryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TheoryTerm::Symbol(sym) => write!(f, "{}", sym),
            TheoryTerm::Variable(name) => f.write_str(name),
            TheoryTerm::Function { name, args } => {
                write!(f, "{}(", name)?;
                join(f, args, ",")?;
                f.write_str(")")
            }
            TheoryTerm::Sequence { kind, terms } => {
                let (open, close) = match kind {
                    SequenceKind::Tuple => ("(", ")"),
                    SequenceKind::List => ("[", "]"),
                    SequenceKind::Set => ("{", "}"),
                };
                f.write_str(open)?;
                join(f, terms, ",")?;
                if *kind == SequenceKind::Tuple && terms.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(close)
            }
            TheoryTerm::Unparsed(elements) => {
                let mut first = true;
                for element in elements {
                    for op in &element.operators {
                        if !first {
                            f.write_str(" ")?;
                        }
                        f.write_str(op)?;
                        first = false;
                    }
                    if !first {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", element.term)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

// ==================== DIRECTIVES ====================

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Show(show) => match &show.kind {
                ShowKind::Nothing => f.write_str("#show."),
                ShowKind::Signature(sig) => write!(f, "#show {}.", sig),
                ShowKind::Term { term, body } if body.is_empty() => {
                    write!(f, "#show {}.", term)
                }
                ShowKind::Term { term, body } => {
                    write!(f, "#show {} : ", term)?;
                    self::body(f, body)?;
                    f.write_str(".")
                }
            },
            Directive::Const(c) => {
                write!(f, "#const {} = {}.", c.name, c.value)?;
                if c.kind == ConstKind::Override {
                    f.write_str(" [override]")?;
                }
                Ok(())
            }
            Directive::Program(p) => {
                write!(f, "#program {}", p.name)?;
                if !p.params.is_empty() {
                    write!(f, "({})", p.params.join(","))?;
                }
                f.write_str(".")
            }
            Directive::Defined(d) => write!(f, "#defined {}.", d.signature),
            Directive::External(e) => {
                write!(f, "#external {}", e.atom)?;
                if !e.body.is_empty() {
                    f.write_str(" : ")?;
                    join(f, &e.body, ", ")?;
                }
                f.write_str(".")?;
                if let Some(value) = &e.value {
                    write!(f, " [{}]", value)?;
                }
                Ok(())
            }
        }
    }
}

// ==================== THEORY DEFINITIONS ====================

impl fmt::Display for TheoryDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries = Vec::new();
        for term in &self.terms {
            let mut entry = format!("  {} {{\n", term.name);
            let operators: Vec<String> = term
                .operators
                .iter()
                .map(|op| format!("    {}", op))
                .collect();
            if !operators.is_empty() {
                entry.push_str(&operators.join(";\n"));
                entry.push('\n');
            }
            entry.push_str("  }");
            entries.push(entry);
        }
        for atom in &self.atoms {
            entries.push(format!("  {}", atom));
        }

        writeln!(f, "#theory {} {{", self.name)?;
        if !entries.is_empty() {
            f.write_str(&entries.join(";\n"))?;
            f.write_str("\n")?;
        }
        f.write_str("}.")
    }
}

impl fmt::Display for TheoryOperatorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}, ", self.operator, self.priority)?;
        f.write_str(match self.kind {
            OperatorKind::Unary => "unary",
            OperatorKind::BinaryLeft => "binary, left",
            OperatorKind::BinaryRight => "binary, right",
        })
    }
}

impl fmt::Display for TheoryAtomDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}/{} : {}, ", self.name, self.arity, self.term)?;
        if let Some(guard) = &self.guard {
            write!(f, "{{{}}}, {}, ", guard.operators.join(", "), guard.term)?;
        }
        f.write_str(self.atom_type.name())
    }
}
