#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! The propositional formula tree.
//!
//! `Formula` is an immutable sum type over constants, variables and the
//! usual connectives. Junctions (`And`/`Or`) are n-ary and keep their
//! children as an ordered sequence; equality is structural and
//! order-sensitive. Values are never mutated in place: every rewrite
//! elsewhere in the crate produces a fresh `Formula`.

use core::fmt;
use rustc_hash::{FxHashMap, FxHashSet};

/// An assignment of truth values to variable names.
pub type Interpretation = FxHashMap<String, bool>;

/// A propositional formula.
///
/// `And`/`Or` must only be built through [`Formula::and`] / [`Formula::or`],
/// which collapse degenerate child lists; no node in a well-formed tree has
/// a junction with fewer than two children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Formula {
    /// A truth constant.
    Val(bool),
    /// A named variable.
    Var(String),
    /// Negation.
    Not(Box<Formula>),
    /// n-ary conjunction, two or more children.
    And(Vec<Formula>),
    /// n-ary disjunction, two or more children.
    Or(Vec<Formula>),
    /// Implication, antecedent then consequent.
    Implies(Box<Formula>, Box<Formula>),
    /// Equivalence.
    Iff(Box<Formula>, Box<Formula>),
    /// Exclusive or.
    Xor(Box<Formula>, Box<Formula>),
}

impl Formula {
    /// Builds a variable from any string-ish name.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Builds a conjunction over `children`.
    ///
    /// An empty list collapses to `Val(true)`, a single child to that
    /// child. Directly nested conjunctions are spliced into the parent so
    /// that a junction never holds a child of its own kind.
    #[must_use]
    pub fn and(children: Vec<Self>) -> Self {
        Self::junction(children, true)
    }

    /// Builds a disjunction over `children`; the dual of [`Formula::and`],
    /// collapsing an empty list to `Val(false)`.
    #[must_use]
    pub fn or(children: Vec<Self>) -> Self {
        Self::junction(children, false)
    }

    fn junction(children: Vec<Self>, conjunctive: bool) -> Self {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Self::And(grand) if conjunctive => flat.extend(grand),
                Self::Or(grand) if !conjunctive => flat.extend(grand),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => Self::Val(conjunctive),
            1 => flat.remove(0),
            _ if conjunctive => Self::And(flat),
            _ => Self::Or(flat),
        }
    }

    /// Builds `antecedent -> consequent`.
    #[must_use]
    pub fn implies(antecedent: Self, consequent: Self) -> Self {
        Self::Implies(Box::new(antecedent), Box::new(consequent))
    }

    /// Builds `left <-> right`.
    #[must_use]
    pub fn iff(left: Self, right: Self) -> Self {
        Self::Iff(Box::new(left), Box::new(right))
    }

    /// Builds `left ^ right`.
    #[must_use]
    pub fn xor(left: Self, right: Self) -> Self {
        Self::Xor(Box::new(left), Box::new(right))
    }

    /// Returns the negation of this formula.
    ///
    /// Only wraps in `Not`; double negations are left for the rewriting
    /// engine to remove.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self::Not(Box::new(self.clone()))
    }

    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Val(_))
    }

    #[must_use]
    pub const fn is_variable(&self) -> bool {
        matches!(self, Self::Var(_))
    }

    #[must_use]
    pub const fn is_negation(&self) -> bool {
        matches!(self, Self::Not(_))
    }

    #[must_use]
    pub const fn is_conjunction(&self) -> bool {
        matches!(self, Self::And(_))
    }

    #[must_use]
    pub const fn is_disjunction(&self) -> bool {
        matches!(self, Self::Or(_))
    }

    #[must_use]
    pub const fn is_implication(&self) -> bool {
        matches!(self, Self::Implies(_, _))
    }

    #[must_use]
    pub const fn is_equivalence(&self) -> bool {
        matches!(self, Self::Iff(_, _))
    }

    #[must_use]
    pub const fn is_xor(&self) -> bool {
        matches!(self, Self::Xor(_, _))
    }

    /// Returns the direct children, left to right; empty for leaves.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Val(_) | Self::Var(_) => Vec::new(),
            Self::Not(child) => vec![child.as_ref()],
            Self::And(children) | Self::Or(children) => children.iter().collect(),
            Self::Implies(a, b) | Self::Iff(a, b) | Self::Xor(a, b) => {
                vec![a.as_ref(), b.as_ref()]
            }
        }
    }

    /// Returns a copy of this formula with the child at `index` replaced.
    ///
    /// # Panics
    ///
    /// Panics if this formula is a leaf or `index` is out of range; such a
    /// call is a bug in the caller, not a recoverable condition.
    #[must_use]
    pub fn replace_child(&self, index: usize, new_child: Self) -> Self {
        let arity = self.children().len();
        assert!(
            index < arity,
            "replace_child index {index} out of range for formula with {arity} children"
        );

        match self {
            Self::Val(_) | Self::Var(_) => unreachable!("leaves have no children"),
            Self::Not(_) => Self::Not(Box::new(new_child)),
            Self::And(children) | Self::Or(children) => {
                let replaced = children
                    .iter()
                    .enumerate()
                    .map(|(i, child)| if i == index { new_child.clone() } else { child.clone() })
                    .collect();
                if self.is_conjunction() {
                    Self::and(replaced)
                } else {
                    Self::or(replaced)
                }
            }
            Self::Implies(a, b) => {
                if index == 0 {
                    Self::implies(new_child, (**b).clone())
                } else {
                    Self::implies((**a).clone(), new_child)
                }
            }
            Self::Iff(a, b) => {
                if index == 0 {
                    Self::iff(new_child, (**b).clone())
                } else {
                    Self::iff((**a).clone(), new_child)
                }
            }
            Self::Xor(a, b) => {
                if index == 0 {
                    Self::xor(new_child, (**b).clone())
                } else {
                    Self::xor((**a).clone(), new_child)
                }
            }
        }
    }

    /// Evaluates the formula under `interpretation`.
    ///
    /// # Panics
    ///
    /// Panics if a free variable of the formula is missing from the
    /// interpretation. Constants evaluate under any interpretation,
    /// including an empty one.
    #[must_use]
    pub fn evaluate(&self, interpretation: &Interpretation) -> bool {
        match self {
            Self::Val(value) => *value,
            Self::Var(name) => *interpretation
                .get(name)
                .unwrap_or_else(|| panic!("variable '{name}' has no assigned truth value")),
            Self::Not(child) => !child.evaluate(interpretation),
            Self::And(children) => children.iter().all(|c| c.evaluate(interpretation)),
            Self::Or(children) => children.iter().any(|c| c.evaluate(interpretation)),
            Self::Implies(a, b) => !a.evaluate(interpretation) || b.evaluate(interpretation),
            Self::Iff(a, b) => a.evaluate(interpretation) == b.evaluate(interpretation),
            Self::Xor(a, b) => a.evaluate(interpretation) != b.evaluate(interpretation),
        }
    }

    /// Returns the distinct variable names in pre-order first-occurrence
    /// order.
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut names = Vec::new();
        self.collect_variables(&mut seen, &mut names);
        names
    }

    fn collect_variables(&self, seen: &mut FxHashSet<String>, names: &mut Vec<String>) {
        if let Self::Var(name) = self {
            if seen.insert(name.clone()) {
                names.push(name.clone());
            }
            return;
        }
        for child in self.children() {
            child.collect_variables(seen, names);
        }
    }

    /// Total number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Structural fold: dispatches on the variant and returns whatever the
    /// visitor produces. Rendering collaborators use this instead of
    /// matching on the enum themselves.
    pub fn accept<R, V: FormulaVisitor<R>>(&self, visitor: &mut V) -> R {
        match self {
            Self::Val(value) => visitor.visit_constant(*value),
            Self::Var(name) => visitor.visit_variable(name),
            Self::Not(child) => visitor.visit_negation(child),
            Self::And(children) => visitor.visit_conjunction(children),
            Self::Or(children) => visitor.visit_disjunction(children),
            Self::Implies(a, b) => visitor.visit_implication(a, b),
            Self::Iff(a, b) => visitor.visit_equivalence(a, b),
            Self::Xor(a, b) => visitor.visit_xor(a, b),
        }
    }

    const fn precedence(&self) -> u8 {
        match self {
            Self::Iff(_, _) => 1,
            Self::Implies(_, _) => 2,
            Self::Xor(_, _) => 3,
            Self::Or(_) => 4,
            Self::And(_) => 5,
            Self::Not(_) => 6,
            Self::Val(_) | Self::Var(_) => 7,
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        let parens = self.precedence() < min;
        if parens {
            write!(f, "(")?;
        }

        match self {
            Self::Val(true) => write!(f, "1")?,
            Self::Val(false) => write!(f, "0")?,
            Self::Var(name) => write!(f, "{name}")?,
            Self::Not(child) => {
                write!(f, "!")?;
                child.fmt_prec(f, 6)?;
            }
            Self::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " && ")?;
                    }
                    child.fmt_prec(f, 6)?;
                }
            }
            Self::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " || ")?;
                    }
                    child.fmt_prec(f, 5)?;
                }
            }
            Self::Xor(a, b) => {
                a.fmt_prec(f, 3)?;
                write!(f, " ^ ")?;
                b.fmt_prec(f, 4)?;
            }
            Self::Implies(a, b) => {
                a.fmt_prec(f, 3)?;
                write!(f, " -> ")?;
                b.fmt_prec(f, 2)?;
            }
            Self::Iff(a, b) => {
                a.fmt_prec(f, 1)?;
                write!(f, " <-> ")?;
                b.fmt_prec(f, 2)?;
            }
        }

        if parens {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Formula {
    /// Renders the formula in the same infix grammar the parser accepts.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

/// A structural visitor over [`Formula`], one method per variant.
pub trait FormulaVisitor<R> {
    fn visit_constant(&mut self, value: bool) -> R;
    fn visit_variable(&mut self, name: &str) -> R;
    fn visit_negation(&mut self, child: &Formula) -> R;
    fn visit_conjunction(&mut self, children: &[Formula]) -> R;
    fn visit_disjunction(&mut self, children: &[Formula]) -> R;
    fn visit_implication(&mut self, antecedent: &Formula, consequent: &Formula) -> R;
    fn visit_equivalence(&mut self, left: &Formula, right: &Formula) -> R;
    fn visit_xor(&mut self, left: &Formula, right: &Formula) -> R;
}
