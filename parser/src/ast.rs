//! Abstract Syntax Tree types for logic programs.
//!
//! Nodes are plain values: rewriting a node means building a new one.
//! Canonical text for every node lives in `render.rs`.

use metalp_core::{Signature, Symbol};

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// A top-level statement of a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Rule(Rule),
    Comment(Comment),
    Directive(Directive),
    Theory(TheoryDefinition),
}

/// Coarse classification of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Rule,
    Fact,
    Constraint,
    Comment,
    Directive,
    TheoryDeclaration,
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Rule(r) => r.span,
            Statement::Comment(c) => c.span,
            Statement::Directive(d) => d.span(),
            Statement::Theory(t) => t.span,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Statement::Rule(r) if r.is_fact() => NodeKind::Fact,
            Statement::Rule(r) if r.is_constraint() => NodeKind::Constraint,
            Statement::Rule(_) => NodeKind::Rule,
            Statement::Comment(_) => NodeKind::Comment,
            Statement::Directive(_) => NodeKind::Directive,
            Statement::Theory(_) => NodeKind::TheoryDeclaration,
        }
    }
}

// ==================== RULES ====================

/// A rule `head :- body.`; facts and constraints are rules too.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub head: Head,
    pub body: Vec<Literal>,
    pub span: Span,
}

impl Rule {
    pub fn new(head: Head, body: Vec<Literal>) -> Self {
        Self {
            head,
            body,
            span: Span::default(),
        }
    }

    pub fn is_fact(&self) -> bool {
        self.body.is_empty() && matches!(self.head, Head::Literal(_))
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self.head, Head::Falsity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Head {
    /// No head: the rule is an integrity constraint.
    Falsity,
    Literal(Literal),
    /// `a ; b ; c`
    Disjunction(Vec<Literal>),
    Choice(Choice),
}

/// `L { e1 ; e2 } U`
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub lower: Option<Term>,
    pub elements: Vec<ChoiceElement>,
    pub upper: Option<Term>,
}

/// `literal : condition`
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceElement {
    pub literal: Literal,
    pub condition: Vec<Literal>,
}

// ==================== LITERALS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    /// `not a`
    Negative,
    /// `not not a`
    DoubleNegative,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub sign: Sign,
    pub atom: Atom,
}

impl Literal {
    pub fn positive(atom: Atom) -> Self {
        Self {
            sign: Sign::Positive,
            atom,
        }
    }

    pub fn negative(atom: Atom) -> Self {
        Self {
            sign: Sign::Negative,
            atom,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Symbolic(SymbolicAtom),
    Comparison(Comparison),
    /// `#true` / `#false`
    Boolean(bool),
    Theory(TheoryAtom),
    Aggregate(Aggregate),
    /// Only in bodies, and always under a positive sign.
    Conditional(ConditionalLiteral),
}

/// `p(t1,...,tn)` or its classical negation `-p(...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicAtom {
    pub name: String,
    pub args: Vec<Term>,
    pub positive: bool,
}

impl SymbolicAtom {
    pub fn new(name: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            args,
            positive: true,
        }
    }

    pub fn signature(&self) -> Signature {
        Signature::new(self.name.clone(), self.args.len(), self.positive)
    }

    /// The atom read as a term, e.g. for use as an argument.
    pub fn to_term(&self) -> Term {
        let term = if self.args.is_empty() {
            Term::Symbol(Symbol::constant(self.name.clone()))
        } else {
            Term::Function {
                name: self.name.clone(),
                args: self.args.clone(),
            }
        };
        if self.positive {
            term
        } else {
            Term::Unary(UnaryOp::Minus, Box::new(term))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub op: ComparisonOp,
    pub left: Term,
    pub right: Term,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOp {
    pub fn holds(&self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            ComparisonOp::Eq => ordering == Equal,
            ComparisonOp::NotEq => ordering != Equal,
            ComparisonOp::Lt => ordering == Less,
            ComparisonOp::LtEq => ordering != Greater,
            ComparisonOp::Gt => ordering == Greater,
            ComparisonOp::GtEq => ordering != Less,
        }
    }
}

// ==================== AGGREGATES ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Sum,
    /// `#sum+`: only positive weights count.
    SumPlus,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "#count",
            AggregateFunction::Sum => "#sum",
            AggregateFunction::SumPlus => "#sum+",
            AggregateFunction::Min => "#min",
            AggregateFunction::Max => "#max",
        }
    }
}

/// `T1 op1 #fun { elements } op2 T2`, each guard optional.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub function: AggregateFunction,
    pub elements: Vec<AggregateElement>,
    /// Written before the aggregate: `T op #fun {..}` compares `T op value`.
    pub left: Option<AggregateGuard>,
    /// Written after the aggregate: compares `value op T`.
    pub right: Option<AggregateGuard>,
}

/// `t1,...,tn : condition`
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateElement {
    pub terms: Vec<Term>,
    pub condition: Vec<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateGuard {
    pub op: ComparisonOp,
    pub term: Term,
}

/// `literal : condition` in a rule body.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalLiteral {
    pub literal: Box<Literal>,
    pub condition: Vec<Literal>,
}

// ==================== TERMS ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Numbers, strings, constants, `#inf` and `#sup`.
    Symbol(Symbol),
    /// Named variable, or `_` for an anonymous one.
    Variable(String),
    /// Function with arguments; tuples have an empty name.
    Function { name: String, args: Vec<Term> },
    Unary(UnaryOp, Box<Term>),
    Binary(BinaryOp, Box<Term>, Box<Term>),
    /// `lower..upper`
    Interval(Box<Term>, Box<Term>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl Term {
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Symbol(Symbol::constant(name))
    }

    pub fn number(n: i64) -> Self {
        Term::Symbol(Symbol::Number(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Term::Symbol(Symbol::String(s.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    pub fn function(name: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Function {
            name: name.into(),
            args,
        }
    }

    /// Append the variables of this term, in occurrence order.
    pub fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Term::Symbol(_) => {}
            Term::Variable(name) => out.push(name.clone()),
            Term::Function { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
            Term::Unary(_, inner) => inner.collect_variables(out),
            Term::Binary(_, left, right) | Term::Interval(left, right) => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
        }
    }

    pub fn is_ground(&self) -> bool {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.is_empty()
    }

    /// The symbol this term denotes without evaluating arithmetic, if any.
    ///
    /// Accepts symbols, functions over such terms, and `-` applied to a number
    /// or a named function.
    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Term::Symbol(sym) => Some(sym.clone()),
            Term::Function { name, args } => {
                let args = args.iter().map(Term::as_symbol).collect::<Option<Vec<_>>>()?;
                Some(Symbol::function(name.clone(), args))
            }
            Term::Unary(UnaryOp::Minus, inner) => match inner.as_symbol()? {
                Symbol::Number(n) => n.checked_neg().map(Symbol::Number),
                sym => sym.negate(),
            },
            _ => None,
        }
    }

    /// Read a term as an atom: `p`, `p(t)` or `-p(t)`.
    pub fn to_atom(&self) -> Option<SymbolicAtom> {
        match self {
            Term::Symbol(Symbol::Function {
                name,
                args,
                positive,
            }) if !name.is_empty() => Some(SymbolicAtom {
                name: name.clone(),
                args: args.iter().cloned().map(Term::Symbol).collect(),
                positive: *positive,
            }),
            Term::Function { name, args } if !name.is_empty() => {
                Some(SymbolicAtom::new(name.clone(), args.clone()))
            }
            Term::Unary(UnaryOp::Minus, inner) => {
                let atom = inner.to_atom()?;
                if !atom.positive {
                    return None;
                }
                Some(SymbolicAtom {
                    positive: false,
                    ..atom
                })
            }
            _ => None,
        }
    }
}

// ==================== THEORY ATOMS ====================

/// `&name(args) { elements } op guard`
#[derive(Debug, Clone, PartialEq)]
pub struct TheoryAtom {
    pub name: Term,
    pub elements: Vec<TheoryElement>,
    pub guard: Option<TheoryGuard>,
}

impl TheoryAtom {
    /// Theory atom without elements or guard, e.g. `&tag_rule("r")`.
    pub fn directive(name: impl Into<String>, args: Vec<Term>) -> Self {
        let name = name.into();
        let name = if args.is_empty() {
            Term::constant(name)
        } else {
            Term::function(name, args)
        };
        Self {
            name,
            elements: Vec::new(),
            guard: None,
        }
    }

    /// Name and arity of the atom's name term.
    pub fn name_and_arity(&self) -> Option<(&str, usize)> {
        match &self.name {
            Term::Symbol(Symbol::Function { name, args, .. }) => Some((name, args.len())),
            Term::Function { name, args } => Some((name, args.len())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TheoryElement {
    pub terms: Vec<TheoryTerm>,
    pub condition: Vec<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TheoryGuard {
    pub operator: String,
    pub term: TheoryTerm,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TheoryTerm {
    Symbol(Symbol),
    Variable(String),
    Function { name: String, args: Vec<TheoryTerm> },
    Sequence { kind: SequenceKind, terms: Vec<TheoryTerm> },
    /// Operator/term sequence whose structure depends on the theory's operator table.
    Unparsed(Vec<UnparsedElement>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    Tuple,
    List,
    Set,
}

/// Operators preceding a term inside an unparsed theory term.
#[derive(Debug, Clone, PartialEq)]
pub struct UnparsedElement {
    pub operators: Vec<String>,
    pub term: TheoryTerm,
}

impl TheoryTerm {
    pub fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            TheoryTerm::Symbol(_) => {}
            TheoryTerm::Variable(name) => out.push(name.clone()),
            TheoryTerm::Function { args: terms, .. } | TheoryTerm::Sequence { terms, .. } => {
                for term in terms {
                    term.collect_variables(out);
                }
            }
            TheoryTerm::Unparsed(elements) => {
                for element in elements {
                    element.term.collect_variables(out);
                }
            }
        }
    }
}

// ==================== COMMENTS ====================

/// A `%` line comment or `%* *%` block comment, text included.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
    pub block: bool,
    pub span: Span,
}

// ==================== DIRECTIVES ====================

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Show(Show),
    Const(ConstDef),
    Program(ProgramDecl),
    Defined(DefinedDecl),
    External(ExternalDecl),
}

impl Directive {
    pub fn span(&self) -> Span {
        match self {
            Directive::Show(d) => d.span,
            Directive::Const(d) => d.span,
            Directive::Program(d) => d.span,
            Directive::Defined(d) => d.span,
            Directive::External(d) => d.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Show {
    pub kind: ShowKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShowKind {
    /// `#show.` hides all atoms.
    Nothing,
    /// `#show p/2.`
    Signature(Signature),
    /// `#show t : body.`
    Term { term: Term, body: Vec<Literal> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstKind {
    Default,
    Override,
}

/// `#const name = value.`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstDef {
    pub name: String,
    pub value: Term,
    pub kind: ConstKind,
    pub span: Span,
}

/// `#program name(params).`
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramDecl {
    pub name: String,
    pub params: Vec<String>,
    pub span: Span,
}

/// `#defined p/n.`
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedDecl {
    pub signature: Signature,
    pub span: Span,
}

/// `#external atom : body. [value]`
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalDecl {
    pub atom: SymbolicAtom,
    pub body: Vec<Literal>,
    pub value: Option<Term>,
    pub span: Span,
}

// ==================== THEORY DEFINITIONS ====================

/// `#theory name { term and atom definitions }.`
#[derive(Debug, Clone, PartialEq)]
pub struct TheoryDefinition {
    pub name: String,
    pub terms: Vec<TheoryTermDefinition>,
    pub atoms: Vec<TheoryAtomDefinition>,
    pub span: Span,
}

impl TheoryDefinition {
    pub fn term(&self, name: &str) -> Option<&TheoryTermDefinition> {
        self.terms.iter().find(|t| t.name == name)
    }

    pub fn atom(&self, name: &str, arity: usize) -> Option<&TheoryAtomDefinition> {
        self.atoms
            .iter()
            .find(|a| a.name == name && a.arity == arity)
    }
}

/// Operator table of one theory term kind.
#[derive(Debug, Clone, PartialEq)]
pub struct TheoryTermDefinition {
    pub name: String,
    pub operators: Vec<TheoryOperatorDefinition>,
}

impl TheoryTermDefinition {
    pub fn operator(&self, operator: &str, kind: OperatorArity) -> Option<&TheoryOperatorDefinition> {
        self.operators
            .iter()
            .find(|o| o.operator == operator && o.kind.arity() == kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TheoryOperatorDefinition {
    pub operator: String,
    pub priority: u32,
    pub kind: OperatorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Unary,
    BinaryLeft,
    BinaryRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorArity {
    Unary,
    Binary,
}

impl OperatorKind {
    pub fn arity(&self) -> OperatorArity {
        match self {
            OperatorKind::Unary => OperatorArity::Unary,
            OperatorKind::BinaryLeft | OperatorKind::BinaryRight => OperatorArity::Binary,
        }
    }
}

/// `&name/arity : term, {ops}, guard_term, type`
#[derive(Debug, Clone, PartialEq)]
pub struct TheoryAtomDefinition {
    pub name: String,
    pub arity: usize,
    pub term: String,
    pub guard: Option<TheoryGuardDefinition>,
    pub atom_type: TheoryAtomType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TheoryGuardDefinition {
    pub operators: Vec<String>,
    pub term: String,
}

/// Where a theory atom may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TheoryAtomType {
    Head,
    Body,
    Any,
    Directive,
}

impl TheoryAtomType {
    pub fn name(&self) -> &'static str {
        match self {
            TheoryAtomType::Head => "head",
            TheoryAtomType::Body => "body",
            TheoryAtomType::Any => "any",
            TheoryAtomType::Directive => "directive",
        }
    }
}
