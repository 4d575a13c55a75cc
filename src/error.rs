use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Library error type
// ---------------------------------------------------------------------------

/// Everything that can go wrong while building a dataset or pulling batches.
#[derive(Debug, Error)]
pub enum Error {
    #[error("a dataframe needs at least one column")]
    EmptyFrame,

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("column '{column}' has unsupported type {data_type:?}")]
    UnsupportedType { column: String, data_type: DataType },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("unknown tag '{0}'")]
    UnknownTag(String),

    #[error("partition {0} does not match the schema of the first partition")]
    SchemaMismatch(usize),

    #[error("no accelerator backend is available in this build")]
    DeviceUnavailable,

    #[error("invalid loader config: {0}")]
    InvalidConfig(String),

    #[error("no rows left in the current epoch")]
    Exhausted,

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
