use std::collections::HashMap;

/// Translates a record's internal field names to the column names used by a
/// data source. Fields without an entry are looked up under their own name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameMap {
    columns: HashMap<String, String>,
}

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            columns: pairs
                .into_iter()
                .map(|(field, column)| (field.to_string(), column.to_string()))
                .collect(),
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, column: impl Into<String>) {
        self.columns.insert(field.into(), column.into());
    }

    /// The column name `field` is read from.
    pub fn external<'a>(&'a self, field: &'a str) -> &'a str {
        self.columns.get(field).map_or(field, String::as_str)
    }
}
