//! Literals, clauses and clause sets, plus extraction from CNF.

use super::formula::{Formula, Interpretation};
use super::normal_form::{self, NormalForm};
use core::fmt;
use itertools::Itertools;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// A variable together with a polarity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    name: String,
    negated: bool,
}

impl Literal {
    #[must_use]
    pub fn new(name: impl Into<String>, negated: bool) -> Self {
        Self {
            name: name.into(),
            negated,
        }
    }

    #[must_use]
    pub fn positive(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    #[must_use]
    pub fn negative(name: impl Into<String>) -> Self {
        Self::new(name, true)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_negated(&self) -> bool {
        self.negated
    }

    /// The same variable with the opposite polarity.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self {
            name: self.name.clone(),
            negated: !self.negated,
        }
    }

    /// The assignment of this literal's variable that makes it true.
    #[must_use]
    pub const fn satisfying_value(&self) -> bool {
        !self.negated
    }

    /// True when the interpretation assigns this literal's variable a value
    /// that satisfies it; unassigned variables satisfy nothing.
    #[must_use]
    pub fn is_satisfied_by(&self, interpretation: &Interpretation) -> bool {
        interpretation
            .get(&self.name)
            .is_some_and(|&value| value != self.negated)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!")?;
        }
        write!(f, "{}", self.name)
    }
}

/// A set of literals, read as their disjunction.
///
/// Literals are kept sorted and deduplicated, so equality and hashing are
/// set-like while iteration stays deterministic. The empty clause is
/// unsatisfiable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Clause {
    literals: SmallVec<[Literal; 4]>,
}

impl Clause {
    #[must_use]
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        let mut literals: SmallVec<[Literal; 4]> = literals.into_iter().collect();
        literals.sort();
        literals.dedup();
        Self { literals }
    }

    /// The empty clause.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// A unit clause forces its single literal.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    /// The forced literal of a unit clause, `None` otherwise.
    #[must_use]
    pub fn unit_literal(&self) -> Option<&Literal> {
        if self.is_unit() {
            self.literals.first()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    #[must_use]
    pub fn contains(&self, literal: &Literal) -> bool {
        self.literals.binary_search(literal).is_ok()
    }

    /// This clause with every literal over `variable` removed.
    #[must_use]
    pub fn without_variable(&self, variable: &str) -> Self {
        Self {
            literals: self
                .literals
                .iter()
                .filter(|lit| lit.name() != variable)
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn is_satisfied_by(&self, interpretation: &Interpretation) -> bool {
        self.literals
            .iter()
            .any(|lit| lit.is_satisfied_by(interpretation))
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.literals.iter().join(", "))
    }
}

/// An ordered, duplicate-free collection of clauses, read as their
/// conjunction.
///
/// Clause order is first-insertion order; the solver's "first found"
/// selection rules all iterate it front to back, which is what makes the
/// search deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClauseSet {
    clauses: Vec<Clause>,
}

impl ClauseSet {
    #[must_use]
    pub fn new(clauses: impl IntoIterator<Item = Clause>) -> Self {
        let mut seen = FxHashSet::default();
        Self {
            clauses: clauses
                .into_iter()
                .filter(|clause| seen.insert(clause.clone()))
                .collect(),
        }
    }

    /// The empty clause set, trivially satisfiable.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// True when the set contains the empty clause and is therefore
    /// unsatisfiable.
    #[must_use]
    pub fn contains_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }

    /// Distinct variable names in clause-then-literal order.
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        self.clauses
            .iter()
            .flat_map(Clause::iter)
            .filter(|lit| seen.insert(lit.name().to_string()))
            .map(|lit| lit.name().to_string())
            .collect()
    }

    #[must_use]
    pub fn is_satisfied_by(&self, interpretation: &Interpretation) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.is_satisfied_by(interpretation))
    }
}

impl fmt::Display for ClauseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clause in &self.clauses {
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}

/// Converts a formula to a clause set by rewriting it to CNF and reading
/// off the conjuncts.
///
/// A formula equivalent to `1` yields the empty set (no constraints); one
/// equivalent to `0` yields the set containing only the empty clause.
///
/// # Panics
///
/// Panics if the CNF rewriting hands back a shape that is not a
/// conjunction of disjunctions of literals; that is a rewriting bug, not
/// an input condition.
#[must_use]
pub fn to_clauses(formula: &Formula) -> ClauseSet {
    let trace = normal_form::to_cnf(formula);
    let cnf = trace.last().expect("normal-form trace is never empty");
    debug_assert!(
        cnf.is_constant() || normal_form::is_in_nf(cnf, NormalForm::Conjunctive),
        "CNF rewriting returned a non-normal formula: {cnf}"
    );

    match cnf {
        Formula::Val(true) => ClauseSet::empty(),
        Formula::Val(false) => ClauseSet::new([Clause::empty()]),
        Formula::And(children) => ClauseSet::new(children.iter().map(clause_of)),
        other => ClauseSet::new([clause_of(other)]),
    }
}

fn clause_of(conjunct: &Formula) -> Clause {
    match conjunct {
        Formula::Or(children) => Clause::new(children.iter().map(literal_of)),
        other => Clause::new([literal_of(other)]),
    }
}

fn literal_of(formula: &Formula) -> Literal {
    match formula {
        Formula::Var(name) => Literal::positive(name.clone()),
        Formula::Not(child) => match child.as_ref() {
            Formula::Var(name) => Literal::negative(name.clone()),
            other => panic!("clause extraction hit a non-literal negation: !({other})"),
        },
        other => panic!("clause extraction hit a non-literal: {other}"),
    }
}
