use thiserror::Error;

/// Error taxonomy for the LCQP solver.
///
/// Covers setup/validation failures, runtime failures of the penalty-homotopy
/// loop, and I/O failures from the file-based loaders. Algorithmic outcomes
/// that are not failures (e.g. reaching the iteration budget) are still
/// reported through this type as runtime errors; the distinction from
/// [`crate::types::AlgorithmStatus`] is that the latter
/// only ever describes a *result* of `solve`, never a reason `solve` could
/// not run at all.
#[derive(Debug, Error)]
pub enum LcqpError {
    /// A problem dimension (`nV`, `nC`, `nComp`) was zero or otherwise invalid.
    #[error("invalid problem dimensions: nV={n_v}, nC={n_c}, nComp={n_comp}")]
    InvalidDimensions {
        n_v: usize,
        n_c: usize,
        n_comp: usize,
    },

    /// An option setter rejected its argument.
    #[error("invalid value for option `{field}`: {reason}")]
    InvalidOptionValue { field: &'static str, reason: String },

    /// A CSC index array referenced a row or column outside the matrix shape.
    #[error("CSC index out of bounds: {0}")]
    IndexOutOfBounds(String),

    /// The problem's stored representation and the requested backend's
    /// representation disagree, and attempting to convert failed.
    #[error("dense/sparse representation mismatch during mode switch")]
    DenseSparseMismatch,

    /// The operator-splitting backend was asked to honor nontrivial box
    /// bounds, which it cannot accept directly.
    #[error(
        "the operator-splitting backend does not accept box constraints directly; \
         encode them as linear constraints or omit them"
    )]
    InvalidOperatorSplittingBoxConstraints,

    /// `S1`/`S2` were not both supplied, so the complementarity matrix `C`
    /// could not be constructed.
    #[error("missing complementarity matrices S1/S2")]
    MissingComplementarityMatrix,

    /// The symmetrization `S1^T S2 + S2^T S1` could not be produced
    /// (defensive check on the linear algebra kernel).
    #[error("failed to symmetrize complementarity matrix")]
    SymmetrizationFailed,

    /// The subsolver reported a non-success exit flag.
    #[error("subsolver failed with exit flag {exit_flag}")]
    SubsolverFailed { exit_flag: i32 },

    /// The outer loop exhausted its iteration budget before converging.
    #[error("maximum number of iterations reached")]
    MaxIterationsReached,

    /// The penalty parameter exceeded `maxRho` before complementarity held.
    #[error("maximum penalty parameter reached")]
    MaxPenaltyReached,

    /// A data file could not be read or did not contain well-formed values.
    #[error("unable to read file `{path}`: {source}")]
    UnableToReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A statistics counter update would have moved a monotonic counter
    /// backwards.
    #[error("invalid statistics update: {0}")]
    InvalidStatisticsUpdate(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, LcqpError>;
