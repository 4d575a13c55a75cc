use std::fmt;
use std::path::Path;
use std::str::FromStr;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

use super::io::load_file;
use super::schema::Schema;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Device – where batches are materialised
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Gpu,
}

impl Device {
    /// Translate a `use_cpu` style flag.
    pub fn from_use_cpu(use_cpu: bool) -> Self {
        if use_cpu {
            Device::Cpu
        } else {
            Device::Gpu
        }
    }

    /// Whether this build can place data on the device.
    pub fn is_available(self) -> bool {
        matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Gpu => write!(f, "gpu"),
        }
    }
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "gpu" | "cuda" => Ok(Device::Gpu),
            _ => Err(Error::InvalidConfig(format!("unknown device '{s}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – partitions plus a mutable, taggable schema
// ---------------------------------------------------------------------------

/// A tabular dataset: one or more Arrow partitions sharing a schema.
#[derive(Debug, Clone)]
pub struct Dataset {
    partitions: Vec<RecordBatch>,
    schema: Schema,
    device: Device,
}

impl Dataset {
    /// Wrap a single dataframe.
    pub fn new(frame: RecordBatch, device: Device) -> Result<Self> {
        Self::from_partitions(vec![frame], device)
    }

    /// Wrap several dataframes that share one Arrow schema.
    pub fn from_partitions(partitions: Vec<RecordBatch>, device: Device) -> Result<Self> {
        if !device.is_available() {
            return Err(Error::DeviceUnavailable);
        }
        let first = partitions.first().ok_or(Error::EmptyFrame)?;
        let arrow_schema = first.schema();
        if let Some(i) = partitions
            .iter()
            .position(|p| p.schema().fields() != arrow_schema.fields())
        {
            return Err(Error::SchemaMismatch(i));
        }
        let schema = Schema::infer(&arrow_schema)?;

        log::debug!(
            "dataset on {device}: {} columns, {} partition(s)",
            schema.len(),
            partitions.len()
        );
        Ok(Dataset {
            partitions,
            schema,
            device,
        })
    }

    /// Read a Parquet, CSV or JSON file. Column errors raised while building
    /// the frame (duplicate or ragged columns) keep their typed variant.
    pub fn from_file(path: &Path, device: Device) -> Result<Self> {
        let partitions = load_file(path).map_err(|e| match e.downcast::<Error>() {
            Ok(typed) => typed,
            Err(other) => Error::Io(other),
        })?;
        Self::from_partitions(partitions, device)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn partitions(&self) -> &[RecordBatch] {
        &self.partitions
    }

    /// All partitions as one frame. A single partition is returned without copying.
    pub fn to_frame(&self) -> Result<RecordBatch> {
        match self.partitions.as_slice() {
            [only] => Ok(only.clone()),
            parts => Ok(concat_batches(&parts[0].schema(), parts)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::make_df;
    use crate::data::schema::Tag;
    use arrow::array::{ArrayRef, Float32Array, Int32Array};
    use std::sync::Arc;

    fn frame(n: usize) -> RecordBatch {
        make_df([
            ("cat1", Arc::new(Int32Array::from(vec![1; n])) as ArrayRef),
            ("label", Arc::new(Int32Array::from(vec![0; n])) as ArrayRef),
            ("cont1", Arc::new(Float32Array::from(vec![1.0f32; n])) as ArrayRef),
        ])
        .unwrap()
    }

    #[test]
    fn schema_is_inferred_untagged() {
        let ds = Dataset::new(frame(4), Device::Cpu).unwrap();
        assert_eq!(ds.schema().column_names(), ["cat1", "label", "cont1"]);
        assert!(ds.schema().iter().all(|c| c.tags.is_empty()));
        assert_eq!(ds.num_rows(), 4);
    }

    #[test]
    fn schema_mut_tags_stick() {
        let mut ds = Dataset::new(frame(4), Device::Cpu).unwrap();
        let label = ds.schema()["label"].with_tags([Tag::Target]);
        ds.schema_mut().set(label).unwrap();
        assert!(ds.schema()["label"].has_tag(Tag::Target));
    }

    #[test]
    fn gpu_is_unavailable() {
        let err = Dataset::new(frame(1), Device::from_use_cpu(false)).unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable));
    }

    #[test]
    fn partitions_concatenate_in_order() {
        let ds = Dataset::from_partitions(vec![frame(3), frame(5)], Device::Cpu).unwrap();
        assert_eq!(ds.num_partitions(), 2);
        assert_eq!(ds.to_frame().unwrap().num_rows(), 8);
    }

    #[test]
    fn mismatched_partitions_are_rejected() {
        let other = make_df([("x", Arc::new(Int32Array::from(vec![1])) as ArrayRef)]).unwrap();
        let err = Dataset::from_partitions(vec![frame(2), other], Device::Cpu).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(1)));
    }

    #[test]
    fn duplicate_csv_headers_keep_their_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dup.csv");
        std::fs::write(&path, "a,b,a\n1,2,3\n").unwrap();
        let err = Dataset::from_file(&path, Device::Cpu).unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn(ref c) if c == "a"));

        let path = dir.path().join("text.csv");
        std::fs::write(&path, "a\nx\n").unwrap();
        let err = Dataset::from_file(&path, Device::Cpu).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn device_parses_from_text() {
        assert_eq!("CPU".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Gpu);
        assert!("tpu".parse::<Device>().is_err());
    }
}
