//! Rewriting a formula into conjunctive or disjunctive normal form.
//!
//! [`to_nf`] drives a formula to the requested normal form one rewrite at a
//! time and returns the whole derivation: every element of the returned
//! trace is logically equivalent to the input, and the last element
//! satisfies [`is_in_nf`] (or is a bare constant).
//!
//! Each iteration applies exactly one rewrite, chosen by fixed priority:
//!
//! 1. operator elimination (`^`, `<->`, `->` rewritten away, first
//!    occurrence in pre-order),
//! 2. simplification (constants, double negation, absorption, idempotence),
//! 3. De Morgan negation pushing,
//! 4. distribution toward the requested form.
//!
//! Once the formula is in normal form, simplification alone runs to a
//! fixpoint to clear the tautological and duplicate members distribution
//! tends to leave behind. The fixed priority and pre-order first-match
//! rule selection make the whole derivation deterministic.

use super::formula::Formula;
use rustc_hash::FxHashSet;

/// The two target normal forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalForm {
    /// Conjunction of disjunctions of literals.
    Conjunctive,
    /// Disjunction of conjunctions of literals.
    Disjunctive,
}

/// Rewrites `formula` into `form`, returning the full derivation trace.
///
/// The trace starts with the input itself; its last element is in the
/// requested normal form or is a residual constant. A formula already in
/// normal form yields a singleton (or near-singleton, when redundancy can
/// still be simplified away) trace.
#[must_use]
pub fn to_nf(formula: &Formula, form: NormalForm) -> Vec<Formula> {
    let mut trace = vec![formula.clone()];
    let mut current = formula.clone();
    let budget = step_budget(formula);

    while !is_in_nf(&current, form) {
        let next = transform_operators(&current)
            .or_else(|| simplify(&current))
            .or_else(|| push_negations(&current))
            .or_else(|| distribute(&current, form));

        let Some(next) = next else {
            debug_assert!(false, "no rewrite applies to a non-normal formula: {current}");
            break;
        };

        debug_assert!(trace.len() <= budget, "rewrite step budget exceeded for: {formula}");
        current = next;
        trace.push(current.clone());
    }

    while let Some(next) = simplify(&current) {
        debug_assert!(trace.len() <= budget, "rewrite step budget exceeded for: {formula}");
        current = next;
        trace.push(current.clone());
    }

    trace
}

/// Shorthand for [`to_nf`] with [`NormalForm::Conjunctive`].
#[must_use]
pub fn to_cnf(formula: &Formula) -> Vec<Formula> {
    to_nf(formula, NormalForm::Conjunctive)
}

/// Shorthand for [`to_nf`] with [`NormalForm::Disjunctive`].
#[must_use]
pub fn to_dnf(formula: &Formula) -> Vec<Formula> {
    to_nf(formula, NormalForm::Disjunctive)
}

// Rewriting is exponential in the worst case (no Tseitin here), so the
// budget only guards against a rule-ordering loop, not against legitimate
// blowup.
fn step_budget(formula: &Formula) -> usize {
    (1usize << formula.node_count().min(28)).max(1024)
}

/// Tests whether `formula` satisfies the requested normal form: no derived
/// operators, negations only on atoms, and clause nesting of the right
/// shape (at most junction-of-opposite-junctions-of-literals).
#[must_use]
pub fn is_in_nf(formula: &Formula, form: NormalForm) -> bool {
    let conjunctive = matches!(form, NormalForm::Conjunctive);
    let clause = |f: &Formula| is_literal(f) || is_literal_junction(f, !conjunctive);

    match (formula, conjunctive) {
        (Formula::And(children), true) | (Formula::Or(children), false) => {
            children.iter().all(clause)
        }
        _ => clause(formula),
    }
}

fn is_literal(formula: &Formula) -> bool {
    match formula {
        Formula::Val(_) | Formula::Var(_) => true,
        Formula::Not(child) => matches!(child.as_ref(), Formula::Val(_) | Formula::Var(_)),
        _ => false,
    }
}

fn is_literal_junction(formula: &Formula, conjunctive: bool) -> bool {
    match (formula, conjunctive) {
        (Formula::And(children), true) | (Formula::Or(children), false) => {
            children.iter().all(is_literal)
        }
        _ => false,
    }
}

/// Rewrites the first (pre-order) derived operator: `a ^ b` to
/// `!(a <-> b)`, `a <-> b` to `(a -> b) && (b -> a)`, `a -> b` to
/// `!a || b`. One rewrite per call.
fn transform_operators(formula: &Formula) -> Option<Formula> {
    match formula {
        Formula::Xor(a, b) => Some(Formula::Not(Box::new(Formula::iff(
            (**a).clone(),
            (**b).clone(),
        )))),
        Formula::Iff(a, b) => Some(Formula::and(vec![
            Formula::implies((**a).clone(), (**b).clone()),
            Formula::implies((**b).clone(), (**a).clone()),
        ])),
        Formula::Implies(a, b) => Some(Formula::or(vec![a.negate(), (**b).clone()])),
        _ => {
            for (i, child) in formula.children().into_iter().enumerate() {
                if let Some(rewritten) = transform_operators(child) {
                    return Some(formula.replace_child(i, rewritten));
                }
            }
            None
        }
    }
}

/// Applies the highest-priority simplification rule at the first (pre-order)
/// node it fits; `None` when the formula is fully simplified.
fn simplify(formula: &Formula) -> Option<Formula> {
    match formula {
        Formula::Not(child) => match child.as_ref() {
            Formula::Val(value) => Some(Formula::Val(!value)),
            Formula::Not(inner) => Some((**inner).clone()),
            _ => simplify(child).map(|inner| Formula::Not(Box::new(inner))),
        },
        Formula::And(children) => simplify_junction(formula, children, true),
        Formula::Or(children) => simplify_junction(formula, children, false),
        _ => None,
    }
}

fn simplify_junction(parent: &Formula, children: &[Formula], conjunctive: bool) -> Option<Formula> {
    // `And` collapses on `0` and sheds `1`; `Or` the other way around.
    let collapsing = Formula::Val(!conjunctive);
    let removable = Formula::Val(conjunctive);

    // Defensive: the smart constructors never emit these shapes.
    if children.is_empty() {
        return Some(collapsing);
    }
    if children.len() == 1 {
        return Some(children[0].clone());
    }

    if children.contains(&collapsing) {
        return Some(collapsing);
    }

    // A variable alongside its own negation decides the junction.
    for child in children {
        if child.is_variable() && children.contains(&child.negate()) {
            return Some(collapsing);
        }
    }

    // Absorption: an opposite-kind child covering another child entirely is
    // redundant, a || (a && b) == a.
    for (j, absorber) in children.iter().enumerate() {
        if !is_opposite_junction(absorber, conjunctive) {
            continue;
        }
        let absorber_children = absorber.children();
        for (i, other) in children.iter().enumerate() {
            if i == j {
                continue;
            }
            let contents: Vec<&Formula> = if is_opposite_junction(other, conjunctive) {
                other.children()
            } else {
                vec![other]
            };
            if contents.iter().all(|c| absorber_children.contains(c)) {
                return Some(rebuild(without_index(children, j), conjunctive));
            }
        }
    }

    if children.contains(&removable) {
        let remaining = children.iter().filter(|&c| *c != removable).cloned().collect();
        return Some(rebuild(remaining, conjunctive));
    }

    // Idempotence: keep the first occurrence of each child.
    let mut seen: FxHashSet<&Formula> = FxHashSet::default();
    let deduped: Vec<Formula> = children
        .iter()
        .filter(|&child| seen.insert(child))
        .cloned()
        .collect();
    if deduped.len() < children.len() {
        return Some(rebuild(deduped, conjunctive));
    }

    for (i, child) in children.iter().enumerate() {
        if let Some(simplified) = simplify(child) {
            return Some(parent.replace_child(i, simplified));
        }
    }

    None
}

const fn is_opposite_junction(formula: &Formula, conjunctive: bool) -> bool {
    if conjunctive {
        formula.is_disjunction()
    } else {
        formula.is_conjunction()
    }
}

fn without_index(children: &[Formula], index: usize) -> Vec<Formula> {
    children
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != index)
        .map(|(_, c)| c.clone())
        .collect()
}

fn rebuild(children: Vec<Formula>, conjunctive: bool) -> Formula {
    if conjunctive {
        Formula::and(children)
    } else {
        Formula::or(children)
    }
}

/// Pushes the first (pre-order) negation-over-junction inward by De
/// Morgan. Double negations never reach this stage; simplification runs
/// first and removes them.
fn push_negations(formula: &Formula) -> Option<Formula> {
    match formula {
        Formula::Not(child) => match child.as_ref() {
            Formula::And(children) => {
                Some(Formula::or(children.iter().map(Formula::negate).collect()))
            }
            Formula::Or(children) => {
                Some(Formula::and(children.iter().map(Formula::negate).collect()))
            }
            _ => None,
        },
        Formula::And(children) | Formula::Or(children) => {
            for (i, child) in children.iter().enumerate() {
                if let Some(pushed) = push_negations(child) {
                    return Some(formula.replace_child(i, pushed));
                }
            }
            None
        }
        _ => None,
    }
}

/// Distributes the first (pre-order) junction of the wrong kind for `form`
/// over one of its opposite-kind children.
fn distribute(formula: &Formula, form: NormalForm) -> Option<Formula> {
    match (form, formula) {
        (NormalForm::Conjunctive, Formula::Or(children)) => children
            .iter()
            .position(Formula::is_conjunction)
            .map_or_else(|| descend(formula, children, form), |k| Some(distribute_at(children, k, false))),
        (NormalForm::Disjunctive, Formula::And(children)) => children
            .iter()
            .position(Formula::is_disjunction)
            .map_or_else(|| descend(formula, children, form), |k| Some(distribute_at(children, k, true))),
        (_, Formula::And(children) | Formula::Or(children)) => descend(formula, children, form),
        _ => None,
    }
}

// The picked child's members each pair with the remaining siblings under
// the original junction kind; the smart constructors splice any nesting
// this produces.
fn distribute_at(children: &[Formula], k: usize, conjunctive_outer: bool) -> Formula {
    let rest = without_index(children, k);
    let distributed = children[k]
        .children()
        .into_iter()
        .map(|grandchild| {
            let mut inner = Vec::with_capacity(rest.len() + 1);
            inner.push(grandchild.clone());
            inner.extend(rest.iter().cloned());
            rebuild(inner, conjunctive_outer)
        })
        .collect();
    rebuild(distributed, !conjunctive_outer)
}

fn descend(parent: &Formula, children: &[Formula], form: NormalForm) -> Option<Formula> {
    for (i, child) in children.iter().enumerate() {
        if let Some(distributed) = distribute(child, form) {
            return Some(parent.replace_child(i, distributed));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::parser::parse_formula;
    use crate::logic::truth_table::TruthTable;

    fn var(name: &str) -> Formula {
        Formula::var(name)
    }

    fn assert_trace_equivalent(trace: &[Formula]) {
        let table = TruthTable::new(&trace[0]);
        for row in 0..table.rows() {
            let interpretation = table.interpretation(row);
            let expected = table.result(row);
            for step in trace {
                assert_eq!(
                    step.evaluate(&interpretation),
                    expected,
                    "step '{step}' differs from input '{}'",
                    trace[0]
                );
            }
        }
    }

    #[test]
    fn test_cnf_distribution_with_residual_simplification() {
        let f = Formula::or(vec![
            Formula::and(vec![var("A"), var("B")]),
            Formula::and(vec![var("A").negate(), var("C")]),
        ]);

        let trace = to_cnf(&f);
        assert_trace_equivalent(&trace);

        // (A && B) || (!A && C) distributes to four clauses; the A || !A
        // tautology then simplifies away.
        let expected = Formula::and(vec![
            Formula::or(vec![var("C"), var("A")]),
            Formula::or(vec![var("A").negate(), var("B")]),
            Formula::or(vec![var("C"), var("B")]),
        ]);
        assert_eq!(*trace.last().unwrap(), expected);
    }

    #[test]
    fn test_dnf_of_parsed_formula() {
        let f = parse_formula("A && B || !A && C").unwrap();
        let trace = to_dnf(&f);
        assert_trace_equivalent(&trace);
        // Already a disjunction of conjunctions of literals.
        assert_eq!(trace.len(), 1);
        assert!(is_in_nf(trace.last().unwrap(), NormalForm::Disjunctive));
    }

    #[test]
    fn test_operator_elimination_order() {
        let f = Formula::implies(var("a"), var("b"));
        let trace = to_cnf(&f);
        assert_eq!(trace[1], Formula::or(vec![var("a").negate(), var("b")]));
        assert!(is_in_nf(trace.last().unwrap(), NormalForm::Conjunctive));
        assert_trace_equivalent(&trace);
    }

    #[test]
    fn test_xor_and_equivalence_eliminate_to_cnf() {
        for input in ["a ^ b", "a <-> b", "a <-> b ^ c", "(a -> b) <-> (c -> a)"] {
            let f = parse_formula(input).unwrap();
            let trace = to_cnf(&f);
            assert!(is_in_nf(trace.last().unwrap(), NormalForm::Conjunctive), "{input}");
            assert_trace_equivalent(&trace);
        }
    }

    #[test]
    fn test_double_negation_removed_by_simplification() {
        let f = var("a").negate().negate();
        let trace = to_cnf(&f);
        assert_eq!(*trace.last().unwrap(), var("a"));
        assert_eq!(trace.len(), 2);
    }

    #[test]
    fn test_de_morgan_pushes_negations_to_literals() {
        let f = Formula::and(vec![var("a"), var("b")]).negate();
        let trace = to_cnf(&f);
        assert_eq!(
            trace[1],
            Formula::or(vec![var("a").negate(), var("b").negate()])
        );
        assert_trace_equivalent(&trace);
    }

    #[test]
    fn test_constants_collapse() {
        let f = Formula::and(vec![var("a"), Formula::Val(false)]);
        assert_eq!(*to_cnf(&f).last().unwrap(), Formula::Val(false));

        let g = Formula::or(vec![var("a"), Formula::Val(false)]);
        assert_eq!(*to_cnf(&g).last().unwrap(), var("a"));

        assert_eq!(to_cnf(&Formula::Val(true)), vec![Formula::Val(true)]);
    }

    #[test]
    fn test_contradiction_and_tautology_of_variables() {
        let f = Formula::and(vec![var("a"), var("a").negate()]);
        assert_eq!(*to_cnf(&f).last().unwrap(), Formula::Val(false));

        let g = Formula::or(vec![var("a"), var("a").negate()]);
        assert_eq!(*to_cnf(&g).last().unwrap(), Formula::Val(true));
    }

    #[test]
    fn test_absorption() {
        // a || (a && b) == a
        let f = Formula::or(vec![var("a"), Formula::and(vec![var("a"), var("b")])]);
        assert_eq!(*to_cnf(&f).last().unwrap(), var("a"));
    }

    #[test]
    fn test_idempotence_near_singleton_trace() {
        let f = Formula::or(vec![var("a"), var("a")]);
        let trace = to_cnf(&f);
        assert_eq!(trace.len(), 2);
        assert_eq!(*trace.last().unwrap(), var("a"));
    }

    #[test]
    fn test_already_normal_is_singleton() {
        let f = Formula::and(vec![
            Formula::or(vec![var("a"), var("b").negate()]),
            var("c"),
        ]);
        let trace = to_cnf(&f);
        assert_eq!(trace, vec![f]);
    }

    #[test]
    fn test_is_in_nf_shapes() {
        let cnf = Formula::and(vec![
            Formula::or(vec![var("a"), var("b")]),
            var("c").negate(),
        ]);
        assert!(is_in_nf(&cnf, NormalForm::Conjunctive));
        assert!(!is_in_nf(&cnf, NormalForm::Disjunctive));

        let dnf = Formula::or(vec![
            Formula::and(vec![var("a"), var("b")]),
            var("c"),
        ]);
        assert!(is_in_nf(&dnf, NormalForm::Disjunctive));
        assert!(!is_in_nf(&dnf, NormalForm::Conjunctive));

        assert!(is_in_nf(&var("a"), NormalForm::Conjunctive));
        assert!(is_in_nf(&var("a").negate(), NormalForm::Disjunctive));
        assert!(!is_in_nf(&Formula::implies(var("a"), var("b")), NormalForm::Conjunctive));
        assert!(!is_in_nf(
            &Formula::and(vec![var("a"), var("b")]).negate(),
            NormalForm::Conjunctive
        ));
    }

    #[test]
    fn test_equivalence_preserved_across_mixed_operators() {
        for input in [
            "a -> b -> c",
            "!(a <-> b) && (c || !a)",
            "(a ^ b) -> (b ^ c)",
            "!(!a && !(b || c))",
        ] {
            let f = parse_formula(input).unwrap();
            for form in [NormalForm::Conjunctive, NormalForm::Disjunctive] {
                let trace = to_nf(&f, form);
                assert_trace_equivalent(&trace);
                let last = trace.last().unwrap();
                assert!(last.is_constant() || is_in_nf(last, form), "{input}: {last}");
            }
        }
    }

    #[test]
    fn test_determinism() {
        let f = parse_formula("(a ^ b) <-> (c -> a)").unwrap();
        assert_eq!(to_cnf(&f), to_cnf(&f));
        assert_eq!(to_dnf(&f), to_dnf(&f));
    }
}
