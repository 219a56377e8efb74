use thiserror::Error;

#[derive(Error, Debug)]
pub enum VecError {
    #[error("vecstore: dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    #[error("vecstore: zero-norm vector cannot be normalized")]
    ZeroVector,

    #[error("vecstore: index is not trained")]
    NotTrained,

    #[error("vecstore: empty training set")]
    EmptyTrainingSet,

    #[error("vecstore: {0}")]
    Io(String),

    #[error("vecstore: invalid format: {0}")]
    InvalidFormat(String),
}
