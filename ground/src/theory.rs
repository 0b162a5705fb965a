//! Theory atom checking, operator resolution and ground theory terms.

use metalp_core::Symbol;
use metalp_parser::{
    OperatorArity, OperatorKind, SequenceKind, TheoryAtom, TheoryAtomType, TheoryDefinition,
    TheoryElement, TheoryGuard, TheoryOperatorDefinition, TheoryTerm, TheoryTermDefinition,
    UnparsedElement,
};

use crate::error::{GroundError, GroundResult};
use crate::eval::Bindings;

/// Where a theory atom occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// Head of a rule with a body.
    Head,
    Body,
    /// Head of a fact.
    Directive,
}

impl Placement {
    fn name(&self) -> &'static str {
        match self {
            Placement::Head => "rule heads",
            Placement::Body => "rule bodies",
            Placement::Directive => "directives",
        }
    }

    fn allowed(&self, atom_type: TheoryAtomType) -> bool {
        match atom_type {
            TheoryAtomType::Any => true,
            TheoryAtomType::Head => *self != Placement::Body,
            TheoryAtomType::Body => *self == Placement::Body,
            TheoryAtomType::Directive => *self == Placement::Directive,
        }
    }
}

/// Every `#theory` declaration of a program.
#[derive(Debug, Default)]
pub(crate) struct TheoryRegistry {
    definitions: Vec<TheoryDefinition>,
}

impl TheoryRegistry {
    pub(crate) fn new(definitions: Vec<TheoryDefinition>) -> Self {
        Self { definitions }
    }

    /// Check `atom` against its declaration and resolve operator sequences.
    pub(crate) fn resolve_atom(
        &self,
        atom: &TheoryAtom,
        placement: Placement,
        statement: &str,
    ) -> GroundResult<TheoryAtom> {
        let (name, arity) = atom
            .name_and_arity()
            .ok_or_else(|| GroundError::unsupported(format!("theory atom name in: {statement}")))?;

        let (theory, definition) = self
            .definitions
            .iter()
            .find_map(|theory| theory.atom(name, arity).map(|def| (theory, def)))
            .ok_or_else(|| GroundError::undeclared_theory_atom(name, arity, statement))?;

        if !placement.allowed(definition.atom_type) {
            return Err(GroundError::TheoryAtomPlacement {
                name: name.to_string(),
                arity,
                declared: definition.atom_type.name(),
                position: placement.name(),
                statement: statement.to_string(),
            });
        }

        let term_definition = lookup_term(theory, &definition.term, statement)?;
        let elements = atom
            .elements
            .iter()
            .map(|element| {
                let terms = element
                    .terms
                    .iter()
                    .map(|t| resolve_term(t, term_definition, statement))
                    .collect::<GroundResult<Vec<_>>>()?;
                Ok(TheoryElement {
                    terms,
                    condition: element.condition.clone(),
                })
            })
            .collect::<GroundResult<Vec<_>>>()?;

        let guard = match (&atom.guard, &definition.guard) {
            (None, _) => None,
            (Some(guard), Some(declared)) if declared.operators.contains(&guard.operator) => {
                let guard_definition = lookup_term(theory, &declared.term, statement)?;
                Some(TheoryGuard {
                    operator: guard.operator.clone(),
                    term: resolve_term(&guard.term, guard_definition, statement)?,
                })
            }
            (Some(guard), _) => {
                return Err(GroundError::undeclared_theory_operator(
                    guard.operator.clone(),
                    "guard",
                    format!("&{name}/{arity}"),
                    statement,
                ))
            }
        };

        Ok(TheoryAtom {
            name: atom.name.clone(),
            elements,
            guard,
        })
    }
}

fn lookup_term<'a>(
    theory: &'a TheoryDefinition,
    name: &str,
    statement: &str,
) -> GroundResult<&'a TheoryTermDefinition> {
    theory
        .term(name)
        .ok_or_else(|| GroundError::UndeclaredTheoryTerm {
            term: name.to_string(),
            statement: statement.to_string(),
        })
}

// ==================== OPERATOR RESOLUTION ====================

fn resolve_term(
    term: &TheoryTerm,
    definition: &TheoryTermDefinition,
    statement: &str,
) -> GroundResult<TheoryTerm> {
    match term {
        TheoryTerm::Symbol(_) | TheoryTerm::Variable(_) => Ok(term.clone()),
        TheoryTerm::Function { name, args } => Ok(TheoryTerm::Function {
            name: name.clone(),
            args: resolve_all(args, definition, statement)?,
        }),
        TheoryTerm::Sequence { kind, terms } => Ok(TheoryTerm::Sequence {
            kind: *kind,
            terms: resolve_all(terms, definition, statement)?,
        }),
        TheoryTerm::Unparsed(elements) => resolve_unparsed(elements, definition, statement),
    }
}

fn resolve_all(
    terms: &[TheoryTerm],
    definition: &TheoryTermDefinition,
    statement: &str,
) -> GroundResult<Vec<TheoryTerm>> {
    terms
        .iter()
        .map(|t| resolve_term(t, definition, statement))
        .collect()
}

/// Build the operator tree of `elements`.
///
/// Unary operators bind to the operand that follows them; binary operators
/// are grouped by priority, higher binding tighter, ties by associativity.
fn resolve_unparsed(
    elements: &[UnparsedElement],
    definition: &TheoryTermDefinition,
    statement: &str,
) -> GroundResult<TheoryTerm> {
    let mut operands = Vec::with_capacity(elements.len());
    let mut binary = Vec::new();

    for (i, element) in elements.iter().enumerate() {
        let unary = if i == 0 {
            &element.operators[..]
        } else {
            let (first, rest) = element.operators.split_first().ok_or_else(|| {
                GroundError::unsupported(format!("theory term without operator in: {statement}"))
            })?;
            let declared = definition
                .operator(first, OperatorArity::Binary)
                .ok_or_else(|| {
                    GroundError::undeclared_theory_operator(
                        first.clone(),
                        "binary",
                        definition.name.clone(),
                        statement,
                    )
                })?;
            binary.push(declared);
            rest
        };

        let mut operand = resolve_term(&element.term, definition, statement)?;
        for op in unary.iter().rev() {
            if definition.operator(op, OperatorArity::Unary).is_none() {
                return Err(GroundError::undeclared_theory_operator(
                    op.clone(),
                    "unary",
                    definition.name.clone(),
                    statement,
                ));
            }
            operand = TheoryTerm::Function {
                name: op.clone(),
                args: vec![operand],
            };
        }
        operands.push(operand);
    }

    let mut operands = operands.into_iter();
    let mut output: Vec<TheoryTerm> = operands.next().into_iter().collect();
    let mut pending: Vec<&TheoryOperatorDefinition> = Vec::new();

    for (op, operand) in binary.into_iter().zip(operands) {
        while let Some(top) = pending.last() {
            let reduce = top.priority > op.priority
                || (top.priority == op.priority && op.kind == OperatorKind::BinaryLeft);
            if !reduce {
                break;
            }
            reduce_top(&mut output, &mut pending);
        }
        pending.push(op);
        output.push(operand);
    }
    while !pending.is_empty() {
        reduce_top(&mut output, &mut pending);
    }

    output
        .pop()
        .ok_or_else(|| GroundError::unsupported(format!("empty theory term in: {statement}")))
}

fn reduce_top(
    output: &mut Vec<TheoryTerm>,
    pending: &mut Vec<&TheoryOperatorDefinition>,
) {
    if let (Some(op), Some(right), Some(left)) = (pending.pop(), output.pop(), output.pop()) {
        output.push(TheoryTerm::Function {
            name: op.operator.clone(),
            args: vec![left, right],
        });
    }
}

// ==================== GROUND THEORY TERMS ====================

/// A variable-free theory term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum TheoryValue {
    Number(i64),
    /// Constants, strings (quoted), operator names and other symbols by text.
    Name(String),
    Function(String, Vec<TheoryValue>),
    Sequence(SequenceKind, Vec<TheoryValue>),
}

impl TheoryValue {
    pub(crate) fn from_symbol(symbol: &Symbol) -> Self {
        match symbol {
            Symbol::Number(n) => TheoryValue::Number(*n),
            Symbol::Function {
                name,
                args,
                positive: true,
            } if !args.is_empty() => {
                let args = args.iter().map(TheoryValue::from_symbol).collect();
                if name.is_empty() {
                    TheoryValue::Sequence(SequenceKind::Tuple, args)
                } else {
                    TheoryValue::Function(name.clone(), args)
                }
            }
            other => TheoryValue::Name(other.to_string()),
        }
    }
}

/// Substitute `bindings` into a resolved theory term.
pub(crate) fn ground_theory_term(term: &TheoryTerm, bindings: &Bindings) -> Option<TheoryValue> {
    match term {
        TheoryTerm::Symbol(symbol) => Some(TheoryValue::from_symbol(symbol)),
        TheoryTerm::Variable(name) => bindings.get(name).map(TheoryValue::from_symbol),
        TheoryTerm::Function { name, args } => Some(TheoryValue::Function(
            name.clone(),
            args.iter()
                .map(|a| ground_theory_term(a, bindings))
                .collect::<Option<Vec<_>>>()?,
        )),
        TheoryTerm::Sequence { kind, terms } => Some(TheoryValue::Sequence(
            *kind,
            terms
                .iter()
                .map(|t| ground_theory_term(t, bindings))
                .collect::<Option<Vec<_>>>()?,
        )),
        TheoryTerm::Unparsed(_) => None,
    }
}
