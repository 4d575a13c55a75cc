//! Batch loader: turns a tagged [`Dataset`] into `(inputs, target)` batches.
//!
//! ```text
//!   Dataset ──► Loader::new ──► epoch order (identity or shuffled)
//!                                   │
//!                                   ▼
//!                 slice / take `batch_size` rows ──► Batch { inputs, target }
//! ```
//!
//! The loader owns its data for as long as it lives and releases it on drop,
//! so a loader created inside a scope is always released when the scope ends.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use arrow::array::{Array, ArrayRef, UInt64Array};
use arrow::compute::take_record_batch;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::data::dataset::Dataset;
use crate::data::schema::Tag;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Rows per batch.
    pub batch_size: usize,
    /// Shuffle row order at the start of each epoch.
    pub shuffle: bool,
    /// Seed for the shuffle. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Skip a trailing batch shorter than `batch_size`.
    pub drop_last: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 1024,
            shuffle: false,
            seed: None,
            drop_last: false,
        }
    }
}

impl LoaderConfig {
    pub fn new(batch_size: usize, shuffle: bool) -> Self {
        Self {
            batch_size,
            shuffle,
            ..Default::default()
        }
    }

    /// Read a JSON config file. Missing keys fall back to the defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading loader config {}", path.display()))?;
        let config: LoaderConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing loader config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Batch – one (inputs, target) pull
// ---------------------------------------------------------------------------

/// The label part of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// No column is tagged as target.
    None,
    /// Exactly one target column; its values directly.
    Single(ArrayRef),
    /// Several target columns, keyed by name.
    Multi(BTreeMap<String, ArrayRef>),
}

impl Target {
    pub fn is_none(&self) -> bool {
        matches!(self, Target::None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: BTreeMap<String, ArrayRef>,
    pub target: Target,
    num_rows: usize,
}

impl Batch {
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.keys().map(String::as_str).collect()
    }

    pub fn into_parts(self) -> (BTreeMap<String, ArrayRef>, Target) {
        (self.inputs, self.target)
    }

    /// Render the first `rows` rows of the inputs as a text table.
    pub fn preview(&self, rows: usize) -> Result<String> {
        if self.inputs.is_empty() {
            return Ok(String::new());
        }
        let len = rows.min(self.num_rows);
        let head = RecordBatch::try_from_iter(
            self.inputs
                .iter()
                .map(|(name, values)| (name.as_str(), values.slice(0, len))),
        )?;
        Ok(pretty_format_batches(&[head])?.to_string())
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

pub struct Loader {
    frame: RecordBatch,
    config: LoaderConfig,
    input_columns: Vec<(String, usize)>,
    target_columns: Vec<(String, usize)>,
    /// Row permutation for the current epoch; `None` means natural order.
    order: Option<Vec<u64>>,
    rng: StdRng,
    cursor: usize,
    epoch: usize,
}

impl Loader {
    /// Acquire a loader over `dataset`. Inputs are every schema column not
    /// tagged [`Tag::Target`], in schema order.
    pub fn new(dataset: &Dataset, config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        let frame = dataset.to_frame()?;
        let arrow_schema = frame.schema();

        let locate = |name: String| -> Result<(String, usize)> {
            let idx = arrow_schema
                .index_of(&name)
                .map_err(|_| Error::UnknownColumn(name.clone()))?;
            Ok((name, idx))
        };
        let schema = dataset.schema();
        let input_columns = schema
            .excluding_by_tag(Tag::Target)
            .column_names()
            .into_iter()
            .map(&locate)
            .collect::<Result<Vec<_>>>()?;
        let target_columns = schema
            .select_by_tag(Tag::Target)
            .column_names()
            .into_iter()
            .map(&locate)
            .collect::<Result<Vec<_>>>()?;

        if target_columns.is_empty() {
            log::warn!("no column tagged '{}'; batches carry no target", Tag::Target);
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut loader = Loader {
            frame,
            config,
            input_columns,
            target_columns,
            order: None,
            rng,
            cursor: 0,
            epoch: 0,
        };
        loader.start_epoch();

        log::debug!(
            "loader acquired: {} rows, batch_size={}, shuffle={}, {} batch(es) per epoch",
            loader.frame.num_rows(),
            loader.config.batch_size,
            loader.config.shuffle,
            loader.len()
        );
        Ok(loader)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.input_columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.target_columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn num_rows(&self) -> usize {
        self.frame.num_rows()
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Batches per epoch.
    pub fn len(&self) -> usize {
        let rows = self.frame.num_rows();
        if self.config.drop_last {
            rows / self.config.batch_size
        } else {
            rows.div_ceil(self.config.batch_size)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The next batch, without advancing.
    pub fn peek(&self) -> Result<Batch> {
        match self.batch_at(self.cursor)? {
            Some(batch) => Ok(batch),
            None => Err(Error::Exhausted),
        }
    }

    /// Rewind to the first batch of a fresh epoch.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.start_epoch();
    }

    fn start_epoch(&mut self) {
        self.cursor = 0;
        self.order = if self.config.shuffle {
            let mut order: Vec<u64> = (0..self.frame.num_rows() as u64).collect();
            order.shuffle(&mut self.rng);
            Some(order)
        } else {
            None
        };
    }

    /// Rows `[start, start + batch_size)` of the epoch order, or `None` past the end.
    fn batch_at(&self, start: usize) -> Result<Option<Batch>> {
        let rows = self.frame.num_rows();
        if start >= rows {
            return Ok(None);
        }
        let len = self.config.batch_size.min(rows - start);
        if len < self.config.batch_size && self.config.drop_last {
            return Ok(None);
        }

        let chunk = match &self.order {
            None => self.frame.slice(start, len),
            Some(order) => {
                let indices = UInt64Array::from(order[start..start + len].to_vec());
                take_record_batch(&self.frame, &indices)?
            }
        };
        Ok(Some(self.split(&chunk)))
    }

    fn split(&self, chunk: &RecordBatch) -> Batch {
        let pick = |cols: &[(String, usize)]| -> BTreeMap<String, ArrayRef> {
            cols.iter()
                .map(|(name, idx)| (name.clone(), chunk.column(*idx).clone()))
                .collect()
        };

        let inputs = pick(&self.input_columns);
        let target = match self.target_columns.as_slice() {
            [] => Target::None,
            [(_, idx)] => Target::Single(chunk.column(*idx).clone()),
            many => Target::Multi(pick(many)),
        };
        Batch {
            inputs,
            target,
            num_rows: chunk.num_rows(),
        }
    }
}

impl Iterator for Loader {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.batch_at(self.cursor) {
            Ok(Some(batch)) => {
                self.cursor += batch.num_rows();
                Some(Ok(batch))
            }
            Ok(None) => None,
            Err(e) => {
                // Skip past the failing rows so iteration terminates.
                self.cursor = self.frame.num_rows();
                Some(Err(e))
            }
        }
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        log::debug!(
            "loader released after {} epoch(s), cursor at row {}",
            self.epoch + 1,
            self.cursor
        );
    }
}
