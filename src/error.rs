use std::fmt;
use thiserror::Error;

/// Precondition violations that make the solution impossible to compute.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolnError {
    #[error("voltage vector has {actual} elements, expected one per bus ({expected})")]
    VoltageLength { expected: usize, actual: usize },

    #[error("{name} is {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    MatrixShape {
        name: &'static str,
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("gen {gen} is connected to bus {bus}, but there are only {nb} buses")]
    GenBus { gen: usize, bus: usize, nb: usize },

    #[error("branch {branch} connects bus {bus}, but there are only {nb} buses")]
    BranchBus { branch: usize, bus: usize, nb: usize },

    #[error("load {load} is at bus {bus}, but there are only {nb} buses")]
    LoadBus { load: usize, bus: usize, nb: usize },

    #[error("load aggregator returned {actual} values for {expected} buses")]
    LoadLength { expected: usize, actual: usize },

    #[error("reference bus {bus} is out of range ({nb} buses)")]
    RefBus { bus: usize, nb: usize },

    #[error("reference bus {0} has no in-service generator")]
    NoRefGen(usize),
}

/// Non-fatal conditions found while finishing the solution.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The equal-violation correction for zero Qg range buses could not
    /// be applied. The proportionally split values were kept for the
    /// generators at `buses`.
    ZeroRangeUnfixed { buses: Vec<usize>, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ZeroRangeUnfixed { buses, reason } => write!(
                f,
                "unable to fix Qg at zero range buses {:?}: {}",
                buses, reason
            ),
        }
    }
}
