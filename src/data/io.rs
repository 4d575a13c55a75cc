use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde_json::Value as JsonValue;

use super::model::make_df;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a tabular file into one or more record batches.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – numeric columns, one record batch per row group chunk
/// * `.json`    – `[{ "cat1": 1, "cont1": 0.5, ... }, ...]`
/// * `.csv`     – header row plus numeric cells
pub fn load_file(path: &Path) -> Result<Vec<RecordBatch>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let batches = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => vec![load_json(path)?],
        "csv" => vec![load_csv(path)?],
        other => bail!("Unsupported file extension: .{other}"),
    };

    log::info!(
        "loaded {} rows in {} partition(s) from {}",
        batches.iter().map(RecordBatch::num_rows).sum::<usize>(),
        batches.len(),
        path.display()
    );
    Ok(batches)
}

/// Write a single frame to a Parquet file.
pub fn write_parquet(path: &Path, frame: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, frame.schema(), None).context("creating parquet writer")?;
    writer.write(frame).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Column type guessing shared by the text formats
// ---------------------------------------------------------------------------

/// A column of text-format cells parsed into the narrowest numeric type.
enum ParsedColumn {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl ParsedColumn {
    fn into_array(self) -> ArrayRef {
        match self {
            ParsedColumn::Int(v) => Arc::new(Int64Array::from(v)),
            ParsedColumn::Float(v) => Arc::new(Float64Array::from(v)),
        }
    }
}

/// All integers → Int64, otherwise all numbers → Float64, otherwise an error.
fn guess_column(name: &str, cells: &[String]) -> Result<ParsedColumn> {
    if let Ok(ints) = cells
        .iter()
        .map(|s| s.trim().parse::<i64>())
        .collect::<std::result::Result<Vec<_>, _>>()
    {
        return Ok(ParsedColumn::Int(ints));
    }
    cells
        .iter()
        .enumerate()
        .map(|(row, s)| {
            s.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, column '{name}': '{s}' is not a number"))
        })
        .collect::<Result<Vec<_>>>()
        .map(ParsedColumn::Float)
}

fn build_frame(headers: &[String], cells: Vec<Vec<String>>) -> Result<RecordBatch> {
    let columns = headers
        .iter()
        .zip(cells)
        .map(|(name, col)| Ok((name.clone(), guess_column(name, &col)?.into_array())))
        .collect::<Result<Vec<_>>>()?;
    // Left without context so the typed column error survives a downcast.
    Ok(make_df(columns)?)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "cat1": 1, "label": 0, "cont1": 1.0 },
///   ...
/// ]
/// ```
///
/// Every record must carry exactly the keys of the first one.
fn load_json(path: &Path) -> Result<RecordBatch> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;
    let first = records
        .first()
        .and_then(|r| r.as_object())
        .context("Expected at least one JSON object")?;
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut cells: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        if obj.len() != headers.len() {
            bail!("Row {i}: has {} keys but row 0 has {}", obj.len(), headers.len());
        }
        for key in &headers {
            let value = obj
                .get(key)
                .with_context(|| format!("Row {i}: missing key '{key}'"))?;
            let cell = match value {
                JsonValue::Number(n) => n.to_string(),
                other => bail!("Row {i}, column '{key}': {other} is not a number"),
            };
            cells.entry(key.as_str()).or_default().push(cell);
        }
    }

    let ordered = headers
        .iter()
        .map(|h| cells.remove(h.as_str()).unwrap_or_default())
        .collect();
    build_frame(&headers, ordered)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one numeric cell per column.
fn load_csv(path: &Path) -> Result<RecordBatch> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, value) in record.iter().enumerate() {
            if value.trim().is_empty() {
                bail!("CSV row {row_no}: empty cell in column '{}'", headers[col_idx]);
            }
            cells[col_idx].push(value.to_string());
        }
    }

    if cells.first().map_or(true, Vec::is_empty) {
        bail!("CSV file has no data rows");
    }
    build_frame(&headers, cells)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file as-is, one record batch per reader chunk. Column
/// types are checked when the dataset infers its schema, so non-numeric
/// columns surface there.
fn load_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let batches = reader
        .enumerate()
        .map(|(i, batch)| batch.with_context(|| format!("reading parquet record batch {i}")))
        .collect::<Result<Vec<_>>>()?;

    if batches.is_empty() {
        bail!("Parquet file contains no record batches");
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float32Array, Int32Array};
    use arrow::datatypes::DataType;
    use std::io::Write;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_guesses_int_and_float_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.csv", "cat1,label,cont1\n1,0,0.5\n2,1,1.5\n");
        let batches = load_file(&path).unwrap();
        assert_eq!(batches.len(), 1);
        let b = &batches[0];
        assert_eq!(b.num_rows(), 2);
        assert_eq!(b.column(0).data_type(), &DataType::Int64);
        assert_eq!(b.column(2).data_type(), &DataType::Float64);
    }

    #[test]
    fn csv_rejects_text_and_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bad.csv", "a,b\n1,x\n");
        assert!(load_file(&path).is_err());
        let path = write(&dir, "hole.csv", "a,b\n1,\n");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn json_records_keep_first_row_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "d.json",
            r#"[{"cat1": 1, "cont1": 0.25}, {"cat1": 3, "cont1": 2}]"#,
        );
        let batches = load_file(&path).unwrap();
        let b = &batches[0];
        assert_eq!(b.num_columns(), 2);
        assert_eq!(b.num_rows(), 2);
        assert_eq!(b.schema().field(1).data_type(), &DataType::Float64);
    }

    #[test]
    fn json_rejects_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "d.json", r#"[{"a": 1, "b": 2}, {"a": 1, "c": 2}]"#);
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn parquet_round_trip_keeps_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.parquet");
        let frame = make_df([
            ("cat1", Arc::new(Int32Array::from(vec![1, 2, 3])) as ArrayRef),
            ("cont1", Arc::new(Float32Array::from(vec![0.5f32, 1.0, 1.5])) as ArrayRef),
        ])
        .unwrap();
        write_parquet(&path, &frame).unwrap();

        let batches = load_file(&path).unwrap();
        let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
        assert_eq!(rows, 3);
        assert_eq!(batches[0].column(0).data_type(), &DataType::Int32);
        assert_eq!(batches[0].column(1).len(), 3);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("data.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
