use serde::Serialize;
use serde_json::{Map, Value};

/// One named column of a [`ColumnTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Cell values, one per row.
    pub values: Vec<Value>,
}

/// The canonical tabular form of forecaster output: ordered, named columns of
/// equal length. Column order is preserved as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnTable {
    columns: Vec<Column>,
}

impl ColumnTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, values)` pairs. Fails when lengths differ.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self, String> {
        if let Some((first_name, first)) = columns.first() {
            let expected = first.len();
            for (name, values) in &columns {
                if values.len() != expected {
                    return Err(format!(
                        "column '{name}' has {} values but '{first_name}' has {expected}",
                        values.len()
                    ));
                }
            }
        }
        Ok(Self {
            columns: columns
                .into_iter()
                .map(|(name, values)| Column { name, values })
                .collect(),
        })
    }

    /// Build from row records. Columns appear in first-seen key order; a key
    /// missing from a record yields `null` for that row.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut names: Vec<&String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !names.contains(&key) {
                    names.push(key);
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| Column {
                name: name.clone(),
                values: records
                    .iter()
                    .map(|r| r.get(name).cloned().unwrap_or(Value::Null))
                    .collect(),
            })
            .collect();

        Self { columns }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Values of the first column called `name`.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// All columns.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub(crate) fn from_parts(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Column-mapping JSON (`{"ds": [...], "yhat": [...]}`).
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for column in &self.columns {
            map.insert(column.name.clone(), Value::Array(column.values.clone()));
        }
        Value::Object(map)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_columns_rejects_ragged() {
        let err = ColumnTable::from_columns(vec![
            ("ds".into(), vec![json!("2024-01-31"), json!("2024-02-29")]),
            ("yhat".into(), vec![json!(1.0)]),
        ])
        .unwrap_err();
        assert!(err.contains("'yhat' has 1 values"));
    }

    #[test]
    fn test_from_records_fills_missing_with_null() {
        let records: Vec<Map<String, Value>> = vec![
            json!({"ds": "2024-01-31", "yhat": 1.0}).as_object().unwrap().clone(),
            json!({"ds": "2024-02-29", "trend": 2.0}).as_object().unwrap().clone(),
        ];
        let table = ColumnTable::from_records(&records);
        assert_eq!(table.column_names(), vec!["ds", "yhat", "trend"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("yhat").unwrap()[1], Value::Null);
        assert_eq!(table.column("trend").unwrap()[0], Value::Null);
    }

    #[test]
    fn test_to_json_column_mapping() {
        let table = ColumnTable::from_columns(vec![("yhat".into(), vec![json!(5.0)])]).unwrap();
        assert_eq!(table.to_json(), json!({"yhat": [5.0]}));
        assert!(ColumnTable::new().is_empty());
    }
}
