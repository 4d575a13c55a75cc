//! Tabular dataset loading for training loops.
//!
//! A [`Dataset`] wraps Arrow record batches and a taggable [`Schema`]. A
//! [`Loader`] pulls batches from it, splitting every batch into an input
//! mapping (all columns not tagged [`Tag::Target`]) and the target.

pub mod cli;
pub mod data;
pub mod error;
pub mod loader;

pub use data::dataset::{Dataset, Device};
pub use data::model::{make_df, DType};
pub use data::schema::{ColumnSchema, Schema, Tag};
pub use error::{Error, Result};
pub use loader::{Batch, Loader, LoaderConfig, Target};
