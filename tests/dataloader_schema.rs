use std::collections::BTreeSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float32Array, Int32Array};
use arrow::datatypes::Int32Type;

use tabloader::data::io::write_parquet;
use tabloader::{make_df, Dataset, Device, Error, Loader, LoaderConfig, Tag, Target};

fn frame(num_rows: usize) -> arrow::record_batch::RecordBatch {
    make_df([
        ("cat1", Arc::new(Int32Array::from(vec![1; num_rows])) as ArrayRef),
        ("cat2", Arc::new(Int32Array::from(vec![2; num_rows])) as ArrayRef),
        ("cat3", Arc::new(Int32Array::from(vec![3; num_rows])) as ArrayRef),
        ("label", Arc::new(Int32Array::from(vec![0; num_rows])) as ArrayRef),
        ("cont1", Arc::new(Float32Array::from(vec![1.0f32; num_rows])) as ArrayRef),
        ("cont2", Arc::new(Float32Array::from(vec![2.0f32; num_rows])) as ArrayRef),
    ])
    .unwrap()
}

fn check_schema_split(num_rows: usize) {
    let mut dataset = Dataset::new(frame(num_rows), Device::from_use_cpu(true)).unwrap();
    let label = dataset.schema()["label"].with_tags([Tag::Target]);
    dataset.schema_mut().set(label).unwrap();

    let (inputs, target) = {
        let loader = Loader::new(&dataset, LoaderConfig::new(num_rows, false)).unwrap();
        loader.peek().unwrap().into_parts()
    };

    let mut columns: BTreeSet<String> = dataset.schema().column_names().into_iter().collect();
    columns.remove("label");
    let got: BTreeSet<String> = inputs.keys().cloned().collect();
    assert_eq!(got, columns);
    assert_eq!(
        got,
        BTreeSet::from(["cat1", "cat2", "cat3", "cont1", "cont2"].map(String::from))
    );

    for values in inputs.values() {
        assert_eq!(values.len(), num_rows);
    }
    match target {
        Target::Single(values) => {
            assert_eq!(values.len(), num_rows);
            assert!(values.as_primitive::<Int32Type>().values().iter().all(|&v| v == 0));
        }
        other => panic!("expected the label column as target, got {other:?}"),
    }
}

#[test]
fn dataloader_schema_1000_rows() {
    check_schema_split(1000);
}

#[test]
fn dataloader_schema_10000_rows() {
    check_schema_split(10_000);
}

#[test]
fn accelerator_dataset_is_rejected_without_backend() {
    let err = Dataset::new(frame(10), Device::from_use_cpu(false)).unwrap_err();
    assert!(matches!(err, Error::DeviceUnavailable));
}

#[test]
fn parquet_dataset_splits_the_same_way() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.parquet");
    write_parquet(&path, &frame(500)).unwrap();

    let mut dataset = Dataset::from_file(&path, Device::Cpu).unwrap();
    dataset.schema_mut().tag("label", [Tag::Target]).unwrap();
    dataset.schema_mut().tag("cat1", [Tag::Categorical]).unwrap();

    let loader = Loader::new(&dataset, LoaderConfig::new(128, true)).unwrap();
    assert_eq!(loader.len(), 4);
    assert_eq!(loader.input_names(), ["cat1", "cat2", "cat3", "cont1", "cont2"]);

    let mut rows = 0;
    for batch in loader {
        let batch = batch.unwrap();
        assert_eq!(batch.inputs.len(), 5);
        assert!(!batch.inputs.contains_key("label"));
        rows += batch.num_rows();
    }
    assert_eq!(rows, 500);
}

#[test]
fn loader_is_released_on_early_error() {
    fn pull_twice(dataset: &Dataset, column: &ArrayRef, held: usize) -> tabloader::Result<usize> {
        let mut loader = Loader::new(dataset, LoaderConfig::new(10, false))?;
        assert!(Arc::strong_count(column) > held, "loader should hold the column");
        loader.next().transpose()?;
        let batch = loader.peek()?;
        Ok(batch.num_rows())
    }

    let dataset = Dataset::new(frame(10), Device::Cpu).unwrap();
    let column = dataset.partitions()[0].column(0).clone();
    let held = Arc::strong_count(&column);

    assert!(matches!(pull_twice(&dataset, &column, held), Err(Error::Exhausted)));
    assert_eq!(Arc::strong_count(&column), held);

    {
        let loader = Loader::new(&dataset, LoaderConfig::new(10, false)).unwrap();
        assert!(Arc::strong_count(&column) > held);
        assert_eq!(loader.peek().unwrap().num_rows(), 10);
    }
    assert_eq!(Arc::strong_count(&column), held);
}
