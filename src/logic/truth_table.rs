//! Truth-table enumeration over a formula's variables.

use super::formula::{Formula, Interpretation};
use bit_vec::BitVec;

/// The evaluation of a formula under every interpretation of its
/// variables.
///
/// Variables are ordered by first occurrence in the formula; rows follow
/// binary counting order with the first variable as the most significant
/// bit (row 0 is all-false, the last row all-true). Results are packed one
/// bit per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    variables: Vec<String>,
    results: BitVec,
}

impl TruthTable {
    /// Evaluates `formula` under every interpretation.
    ///
    /// # Panics
    ///
    /// Panics if the formula has more variables than fit a row index.
    #[must_use]
    pub fn new(formula: &Formula) -> Self {
        let variables = formula.variables();
        assert!(
            variables.len() < usize::BITS as usize,
            "too many variables for truth-table enumeration"
        );

        let rows = 1usize << variables.len();
        let mut results = BitVec::from_elem(rows, false);
        for row in 0..rows {
            if formula.evaluate(&Self::row_interpretation(&variables, row)) {
                results.set(row, true);
            }
        }

        Self { variables, results }
    }

    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Number of rows, `2^n` for `n` variables.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.results.len()
    }

    /// The formula's value in the given row.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    #[must_use]
    pub fn result(&self, row: usize) -> bool {
        self.results.get(row).expect("truth-table row out of range")
    }

    /// The interpretation belonging to the given row.
    #[must_use]
    pub fn interpretation(&self, row: usize) -> Interpretation {
        Self::row_interpretation(&self.variables, row)
    }

    fn row_interpretation(variables: &[String], row: usize) -> Interpretation {
        let count = variables.len();
        variables
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), (row >> (count - 1 - i)) & 1 == 1))
            .collect()
    }
}
