use std::collections::BTreeSet;
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use arrow::datatypes::Schema as ArrowSchema;
use serde::{Deserialize, Serialize};

use super::model::DType;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Tag – semantic role of a column
// ---------------------------------------------------------------------------

/// Metadata marking what a column means to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// The column a model is trained to predict. Never part of the inputs.
    Target,
    Categorical,
    Continuous,
    Binary,
    Regression,
    Classification,
    Id,
}

impl Tag {
    pub const ALL: [Tag; 7] = [
        Tag::Target,
        Tag::Categorical,
        Tag::Continuous,
        Tag::Binary,
        Tag::Regression,
        Tag::Classification,
        Tag::Id,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Target => "target",
            Tag::Categorical => "categorical",
            Tag::Continuous => "continuous",
            Tag::Binary => "binary",
            Tag::Regression => "regression",
            Tag::Classification => "classification",
            Tag::Id => "id",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Tag::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| Error::UnknownTag(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ColumnSchema – one column's name, dtype and tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: DType,
    pub tags: BTreeSet<Tag>,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        ColumnSchema {
            name: name.into(),
            dtype,
            tags: BTreeSet::new(),
        }
    }

    /// Return a copy carrying `tags` in addition to the existing ones.
    pub fn with_tags(&self, tags: impl IntoIterator<Item = Tag>) -> Self {
        let mut out = self.clone();
        out.tags.extend(tags);
        out
    }

    /// Return a copy with `tags` removed.
    pub fn without_tags(&self, tags: impl IntoIterator<Item = Tag>) -> Self {
        let mut out = self.clone();
        for tag in tags {
            out.tags.remove(&tag);
        }
        out
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }
}

// ---------------------------------------------------------------------------
// Schema – ordered column schemas of a dataset
// ---------------------------------------------------------------------------

/// Ordered collection of column schemas. Order follows the dataframe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSchema>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Schema { columns }
    }

    /// Build an untagged schema from an Arrow schema.
    pub fn infer(arrow_schema: &ArrowSchema) -> Result<Self> {
        let columns = arrow_schema
            .fields()
            .iter()
            .map(|field| {
                DType::from_arrow(field.data_type())
                    .map(|dtype| ColumnSchema::new(field.name().clone(), dtype))
                    .ok_or_else(|| Error::UnsupportedType {
                        column: field.name().clone(),
                        data_type: field.data_type().clone(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Schema { columns })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Replace the column with the same name as `column`.
    pub fn set(&mut self, column: ColumnSchema) -> Result<()> {
        let slot = self
            .columns
            .iter_mut()
            .find(|c| c.name == column.name)
            .ok_or_else(|| Error::UnknownColumn(column.name.clone()))?;
        *slot = column;
        Ok(())
    }

    /// Add `tags` to the named column.
    pub fn tag(&mut self, name: &str, tags: impl IntoIterator<Item = Tag>) -> Result<()> {
        let column = self
            .get(name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))?
            .with_tags(tags);
        self.set(column)
    }

    /// Columns carrying `tag`, in schema order.
    pub fn select_by_tag(&self, tag: Tag) -> Schema {
        Schema::new(self.columns.iter().filter(|c| c.has_tag(tag)).cloned().collect())
    }

    /// Columns not carrying `tag`, in schema order.
    pub fn excluding_by_tag(&self, tag: Tag) -> Schema {
        Schema::new(self.columns.iter().filter(|c| !c.has_tag(tag)).cloned().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Index<&str> for Schema {
    type Output = ColumnSchema;

    /// Panics when the column does not exist, like map indexing.
    fn index(&self, name: &str) -> &ColumnSchema {
        match self.get(name) {
            Some(column) => column,
            None => panic!("no column named '{name}' in schema"),
        }
    }
}
