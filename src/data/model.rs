use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// DType – element type of a numeric column
// ---------------------------------------------------------------------------

/// The numeric element types a column may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl DType {
    /// Map an Arrow type onto a column dtype. `None` for anything non-numeric.
    pub fn from_arrow(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Int32 => Some(DType::Int32),
            DataType::Int64 => Some(DType::Int64),
            DataType::Float32 => Some(DType::Float32),
            DataType::Float64 => Some(DType::Float64),
            _ => None,
        }
    }

    pub fn to_arrow(self) -> DataType {
        match self {
            DType::Int32 => DataType::Int32,
            DType::Int64 => DataType::Int64,
            DType::Float32 => DataType::Float32,
            DType::Float64 => DataType::Float64,
        }
    }

    /// Integer columns usually carry category ids rather than magnitudes.
    pub fn is_integer(self) -> bool {
        matches!(self, DType::Int32 | DType::Int64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Int32 => write!(f, "int32"),
            DType::Int64 => write!(f, "int64"),
            DType::Float32 => write!(f, "float32"),
            DType::Float64 => write!(f, "float64"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataframe construction
// ---------------------------------------------------------------------------

/// Build a dataframe (an Arrow [`RecordBatch`]) from named numeric columns.
///
/// Columns keep the order in which they are given. Every column must have the
/// same length and a numeric type, and names must be unique.
pub fn make_df<I, S>(columns: I) -> Result<RecordBatch>
where
    I: IntoIterator<Item = (S, ArrayRef)>,
    S: Into<String>,
{
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut fields = Vec::new();
    let mut arrays = Vec::new();
    let mut expected_len: Option<usize> = None;

    for (name, array) in columns {
        let name = name.into();
        if !seen.insert(name.clone()) {
            return Err(Error::DuplicateColumn(name));
        }
        if DType::from_arrow(array.data_type()).is_none() {
            return Err(Error::UnsupportedType {
                column: name,
                data_type: array.data_type().clone(),
            });
        }
        match expected_len {
            None => expected_len = Some(array.len()),
            Some(expected) if expected != array.len() => {
                return Err(Error::LengthMismatch {
                    column: name,
                    expected,
                    found: array.len(),
                });
            }
            Some(_) => {}
        }
        fields.push(Field::new(name, array.data_type().clone(), array.null_count() > 0));
        arrays.push(array);
    }

    if arrays.is_empty() {
        return Err(Error::EmptyFrame);
    }

    let schema = Arc::new(ArrowSchema::new(fields));
    Ok(RecordBatch::try_new(schema, arrays)?)
}
