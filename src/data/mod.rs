/// Data layer: dataframes, schema tags, datasets, and file IO.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv        make_df(columns)
///        │                              │
///        ▼                              │
///   ┌──────────┐                        │
///   │    io     │  parse file → batches  │
///   └──────────┘                        │
///        │                              │
///        ▼                              ▼
///   ┌──────────────────────────────────────┐
///   │ Dataset   partitions + Schema + Device│
///   └──────────────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  tag columns (target, categorical, ...)
///   └──────────┘
/// ```

pub mod dataset;
pub mod io;
pub mod model;
pub mod schema;
