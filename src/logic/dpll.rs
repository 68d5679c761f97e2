//! A classical DPLL (Davis-Putnam-Logemann-Loveland) satisfiability
//! search that records its whole derivation.
//!
//! Unlike a solver that only answers SAT/UNSAT, [`dpll`] returns the full
//! decision tree: every unit-propagation and pure-literal step, every
//! branching decision and both branches where the first one failed. The
//! tree is what downstream exercise rendering consumes; it holds no solver
//! state and is immutable once built.
//!
//! The search itself is the textbook procedure:
//!
//! 1. **Unit propagation** — while a unit clause exists, its literal is
//!    forced and substituted into the set.
//! 2. **Pure-literal elimination** — once no unit clause remains at this
//!    level, any variable occurring with a single polarity is assigned
//!    that polarity.
//! 3. **Terminal check** — an empty set is satisfiable, a set containing
//!    the empty clause is not.
//! 4. **Branching** — otherwise the first variable in clause-then-literal
//!    order is tried true first; the false branch is only explored when
//!    the true branch fails.
//!
//! Every "first" above means first in the clause set's insertion order,
//! then first in the clause's sorted literal order, so identical inputs
//! produce identical trees. Unsatisfiability is a normal outcome, not an
//! error; the search is total over any finite clause set.

use super::clause::{ClauseSet, Literal};
use super::formula::Interpretation;
use rustc_hash::FxHashMap;

/// Why a deterministic assignment was forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// The literal was the sole member of a unit clause.
    UnitPropagation,
    /// The literal's variable occurred with only one polarity.
    PureLiteral,
}

/// A node of the recorded search tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DpllNode {
    /// Search stopped here: an empty clause set (satisfiable) or a set
    /// containing the empty clause (unsatisfiable).
    Terminal {
        /// The clause set at the point search stopped.
        clauses: ClauseSet,
    },
    /// A forced assignment, with the clause set it was applied to.
    Deterministic {
        /// The clause set before the assignment.
        clauses: ClauseSet,
        /// The literal made true.
        literal: Literal,
        /// What forced the assignment.
        reason: Reason,
        /// The rest of the derivation.
        next: Box<DpllNode>,
    },
    /// A case split on a variable.
    Branch {
        /// The clause set before branching.
        clauses: ClauseSet,
        /// The variable split on.
        variable: String,
        /// Derivation with the variable assigned true.
        if_true: Box<DpllNode>,
        /// Derivation with the variable assigned false; absent when the
        /// true branch already succeeded.
        if_false: Option<Box<DpllNode>>,
    },
}

impl DpllNode {
    /// Whether this subtree ends in a satisfiable terminal.
    #[must_use]
    pub fn is_satisfiable(&self) -> bool {
        match self {
            Self::Terminal { clauses } => clauses.is_empty(),
            Self::Deterministic { next, .. } => next.is_satisfiable(),
            Self::Branch {
                if_true, if_false, ..
            } => {
                if_true.is_satisfiable()
                    || if_false.as_ref().is_some_and(|node| node.is_satisfiable())
            }
        }
    }

    /// Extracts a satisfying assignment from a satisfiable subtree.
    ///
    /// Variables eliminated before search ever split on them are absent
    /// from the result; they are don't-cares.
    #[must_use]
    pub fn satisfying_assignment(&self) -> Option<Interpretation> {
        match self {
            Self::Terminal { clauses } => clauses.is_empty().then(FxHashMap::default),
            Self::Deterministic { literal, next, .. } => {
                next.satisfying_assignment().map(|mut model| {
                    model.insert(literal.name().to_string(), literal.satisfying_value());
                    model
                })
            }
            Self::Branch {
                variable,
                if_true,
                if_false,
                ..
            } => if_true
                .satisfying_assignment()
                .map(|mut model| {
                    model.insert(variable.clone(), true);
                    model
                })
                .or_else(|| {
                    if_false
                        .as_ref()
                        .and_then(|node| node.satisfying_assignment())
                        .map(|mut model| {
                            model.insert(variable.clone(), false);
                            model
                        })
                }),
        }
    }

    /// Number of nodes in the subtree. Callers imposing an external time
    /// budget can bound search size with this.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Self::Terminal { .. } => 1,
            Self::Deterministic { next, .. } => 1 + next.node_count(),
            Self::Branch {
                if_true, if_false, ..
            } => {
                1 + if_true.node_count()
                    + if_false.as_ref().map_or(0, |node| node.node_count())
            }
        }
    }

    /// Number of branch nodes in the subtree.
    #[must_use]
    pub fn decisions(&self) -> usize {
        match self {
            Self::Terminal { .. } => 0,
            Self::Deterministic { next, .. } => next.decisions(),
            Self::Branch {
                if_true, if_false, ..
            } => {
                1 + if_true.decisions()
                    + if_false.as_ref().map_or(0, |node| node.decisions())
            }
        }
    }

    /// Number of deterministic (forced) assignments in the subtree.
    #[must_use]
    pub fn propagations(&self) -> usize {
        match self {
            Self::Terminal { .. } => 0,
            Self::Deterministic { next, .. } => 1 + next.propagations(),
            Self::Branch {
                if_true, if_false, ..
            } => {
                if_true.propagations()
                    + if_false.as_ref().map_or(0, |node| node.propagations())
            }
        }
    }
}

/// Runs the DPLL search on `clauses` and returns the full decision tree.
#[must_use]
pub fn dpll(clauses: &ClauseSet) -> DpllNode {
    solve(clauses.clone())
}

fn solve(clauses: ClauseSet) -> DpllNode {
    let mut steps: Vec<(ClauseSet, Literal, Reason)> = Vec::new();
    let mut current = clauses;

    while let Some(literal) = first_unit_literal(&current) {
        let next = set_truth(literal.name(), literal.satisfying_value(), &current);
        steps.push((current, literal, Reason::UnitPropagation));
        current = next;
    }

    while let Some(literal) = first_pure_literal(&current) {
        let next = set_truth(literal.name(), literal.satisfying_value(), &current);
        steps.push((current, literal, Reason::PureLiteral));
        current = next;
    }

    let node = if current.is_empty() || current.contains_empty_clause() {
        DpllNode::Terminal { clauses: current }
    } else {
        branch(current)
    };

    // Thread the forced-assignment chain onto the front of whatever node
    // the search produced, innermost step last.
    steps
        .into_iter()
        .rev()
        .fold(node, |next, (clauses, literal, reason)| {
            DpllNode::Deterministic {
                clauses,
                literal,
                reason,
                next: Box::new(next),
            }
        })
}

fn branch(clauses: ClauseSet) -> DpllNode {
    let variable = clauses
        .iter()
        .flat_map(|clause| clause.iter())
        .next()
        .expect("branching requires a non-empty clause set without empty clauses")
        .name()
        .to_string();

    let if_true = solve(set_truth(&variable, true, &clauses));
    if if_true.is_satisfiable() {
        return DpllNode::Branch {
            clauses,
            variable,
            if_true: Box::new(if_true),
            if_false: None,
        };
    }

    let if_false = solve(set_truth(&variable, false, &clauses));
    DpllNode::Branch {
        clauses,
        variable,
        if_true: Box::new(if_true),
        if_false: Some(Box::new(if_false)),
    }
}

fn first_unit_literal(clauses: &ClauseSet) -> Option<Literal> {
    clauses
        .iter()
        .find_map(|clause| clause.unit_literal())
        .cloned()
}

/// The first literal (clause-then-literal order) whose variable occurs
/// with a single polarity across the whole set.
fn first_pure_literal(clauses: &ClauseSet) -> Option<Literal> {
    let mut polarities: FxHashMap<&str, (bool, bool)> = FxHashMap::default();
    for clause in clauses.iter() {
        for literal in clause.iter() {
            let entry = polarities.entry(literal.name()).or_insert((false, false));
            if literal.is_negated() {
                entry.1 = true;
            } else {
                entry.0 = true;
            }
        }
    }

    clauses
        .iter()
        .flat_map(|clause| clause.iter())
        .find(|literal| {
            let (positive, negative) = polarities[literal.name()];
            !(positive && negative)
        })
        .cloned()
}

/// Substitutes a truth value for a variable: satisfied clauses are
/// dropped, falsified literals are removed from their clauses, everything
/// else is untouched. Both propagation and branching go through this.
#[must_use]
pub fn set_truth(variable: &str, truth: bool, clauses: &ClauseSet) -> ClauseSet {
    ClauseSet::new(clauses.iter().filter_map(|clause| {
        let satisfied = clause
            .iter()
            .any(|lit| lit.name() == variable && lit.satisfying_value() == truth);
        if satisfied {
            None
        } else {
            Some(clause.without_variable(variable))
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::clause::Clause;
    use crate::logic::parser::parse_clause_set;

    fn set(text: &str) -> ClauseSet {
        parse_clause_set(text).unwrap()
    }

    /// Exhaustive check over all assignments of the set's variables.
    fn brute_force_satisfiable(clauses: &ClauseSet) -> bool {
        let variables = clauses.variables();
        (0..1usize << variables.len()).any(|row| {
            let interpretation: Interpretation = variables
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), (row >> i) & 1 == 1))
                .collect();
            clauses.is_satisfied_by(&interpretation)
        })
    }

    #[test]
    fn test_single_unit_clause_is_sat() {
        let tree = dpll(&set("{p}"));

        let DpllNode::Deterministic {
            literal,
            reason,
            next,
            ..
        } = &tree
        else {
            panic!("expected a unit-propagation node, got {tree:?}");
        };
        assert_eq!(literal, &Literal::positive("p"));
        assert_eq!(*reason, Reason::UnitPropagation);
        assert!(matches!(
            next.as_ref(),
            DpllNode::Terminal { clauses } if clauses.is_empty()
        ));
        assert!(tree.is_satisfiable());
    }

    #[test]
    fn test_conflicting_units_are_unsat() {
        let tree = dpll(&set("{p}{!p}"));
        assert!(!tree.is_satisfiable());

        // Propagating {p} drops it and reduces {!p} to the empty clause.
        let DpllNode::Deterministic { literal, next, .. } = &tree else {
            panic!("expected a unit-propagation node, got {tree:?}");
        };
        assert_eq!(literal, &Literal::positive("p"));
        assert!(matches!(
            next.as_ref(),
            DpllNode::Terminal { clauses } if clauses.contains_empty_clause()
        ));
    }

    #[test]
    fn test_branching_then_propagation() {
        let tree = dpll(&set("{p, q}{!p, q}{p, !q}"));
        assert!(tree.is_satisfiable());

        // No units, no pures: branch on p, then q propagates.
        let DpllNode::Branch {
            variable,
            if_true,
            if_false,
            ..
        } = &tree
        else {
            panic!("expected a branch node, got {tree:?}");
        };
        assert_eq!(variable, "p");
        assert!(if_false.is_none(), "false branch must not be explored");
        assert!(matches!(
            if_true.as_ref(),
            DpllNode::Deterministic {
                literal,
                reason: Reason::UnitPropagation,
                ..
            } if *literal == Literal::positive("q")
        ));

        let model = tree.satisfying_assignment().unwrap();
        assert_eq!(model.get("p"), Some(&true));
        assert_eq!(model.get("q"), Some(&true));
    }

    #[test]
    fn test_pure_literal_elimination() {
        // p occurs only positively; eliminating it satisfies both clauses.
        let clauses = set("{p, q}{p, !q}");
        let tree = dpll(&clauses);

        let DpllNode::Deterministic {
            literal, reason, ..
        } = &tree
        else {
            panic!("expected a pure-literal node, got {tree:?}");
        };
        assert_eq!(literal, &Literal::positive("p"));
        assert_eq!(*reason, Reason::PureLiteral);
        assert!(tree.is_satisfiable());

        let model = tree.satisfying_assignment().unwrap();
        assert!(clauses.is_satisfied_by(&model));
    }

    #[test]
    fn test_empty_set_and_empty_clause_terminals() {
        assert!(dpll(&ClauseSet::empty()).is_satisfiable());
        assert!(!dpll(&ClauseSet::new([Clause::empty()])).is_satisfiable());
    }

    #[test]
    fn test_false_branch_explored_on_failure() {
        // p=true kills {!p, q}{!p, !q} into a q contradiction; p=false works.
        let tree = dpll(&set("{p, q}{!p, q}{!p, !q}{p, !r}"));
        assert!(tree.is_satisfiable());

        let model = tree.satisfying_assignment().unwrap();
        assert!(set("{p, q}{!p, q}{!p, !q}{p, !r}").is_satisfied_by(&model));
    }

    #[test]
    fn test_pigeonhole_two_in_one_is_unsat() {
        // Two pigeons, one hole.
        let clauses = set("{a}{b}{!a, !b}");
        let tree = dpll(&clauses);
        assert!(!tree.is_satisfiable());
        assert!(tree.satisfying_assignment().is_none());
    }

    #[test]
    fn test_matches_brute_force_on_small_sets() {
        let corpus = [
            "{p}",
            "{p}{!p}",
            "{p, q}{!p, q}{p, !q}",
            "{a, b, c}{!a, b}{!b, c}{!c, a}{!a, !b, !c}",
            "{a, b}{a, !b}{!a, b}{!a, !b}",
            "{x, y}{!x, z}{!z, w}{!w, !y}{y, w}",
            "{a}{!a, b}{!b, c}{!c, d}{!d, e}{!e, f}",
            "{a}{!a, b}{!b, c}{!c, !a}",
            "{p, q, r}{!p, !q, !r}{p, !q}{q, !r}{r, !p}",
        ];

        for text in corpus {
            let clauses = set(text);
            assert_eq!(
                dpll(&clauses).is_satisfiable(),
                brute_force_satisfiable(&clauses),
                "solver disagrees with enumeration on {text}"
            );
        }
    }

    #[test]
    fn test_models_satisfy_their_inputs() {
        let corpus = [
            "{p, q}{!p, q}{p, !q}",
            "{a, b, c}{!a, b}{!b, c}",
            "{x}{x, y}{!y, z}",
        ];
        for text in corpus {
            let clauses = set(text);
            let tree = dpll(&clauses);
            let model = tree
                .satisfying_assignment()
                .unwrap_or_else(|| panic!("{text} should be satisfiable"));
            assert!(clauses.is_satisfied_by(&model), "bad model for {text}");
        }
    }

    #[test]
    fn test_determinism() {
        let clauses = set("{a, b, c}{!a, b}{!b, c}{!c, a}{!a, !b, !c}");
        assert_eq!(dpll(&clauses), dpll(&clauses));
    }

    #[test]
    fn test_unit_chain_recorded_in_order() {
        // {a} forces a, which forces b, which forces c.
        let tree = dpll(&set("{a}{!a, b}{!b, c}"));

        let mut node = &tree;
        let mut forced = Vec::new();
        while let DpllNode::Deterministic { literal, next, .. } = node {
            forced.push(literal.name().to_string());
            node = next;
        }
        assert_eq!(forced, ["a", "b", "c"]);
        assert!(matches!(node, DpllNode::Terminal { clauses } if clauses.is_empty()));
    }

    #[test]
    fn test_node_counts() {
        let tree = dpll(&set("{p, q}{!p, q}{p, !q}"));
        assert_eq!(tree.decisions(), 1);
        assert_eq!(tree.propagations(), 1);
        assert_eq!(tree.node_count(), 3);
    }
}
