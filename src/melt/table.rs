use serde_json::{Map, Value};

/// A flat table: ordered columns and rows of equal width
///
/// Every row holds exactly one value per column. Values absent from a
/// source record are stored as `Value::Null`. Cells may still carry
/// embedded lists (or objects, when flattening depth was limited) until
/// the decomposer splits them out into child tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        let mut table = Table::default();
        for name in columns {
            if table.column_index(&name).is_none() {
                table.columns.push(name);
            }
        }
        table
    }

    /// Build a table from records, taking the outer union of their keys
    ///
    /// Column order is the order in which keys are first seen.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Map<String, Value>>,
    {
        let mut table = Table::default();
        for record in records {
            table.push_record(record);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate the values of one column in row order
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Append a record, adding any new keys as columns
    pub fn push_record(&mut self, record: Map<String, Value>) {
        let mut row = vec![Value::Null; self.columns.len()];
        for (key, value) in record {
            match self.column_index(&key) {
                Some(idx) => row[idx] = value,
                None => {
                    self.add_column(key);
                    row.push(value);
                }
            }
        }
        self.rows.push(row);
    }

    /// Row `idx` as a JSON object, keys in column order
    pub fn record(&self, idx: usize) -> Option<Map<String, Value>> {
        let row = self.rows.get(idx)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect(),
        )
    }

    pub fn records(&self) -> impl Iterator<Item = Map<String, Value>> + '_ {
        (0..self.rows.len()).filter_map(move |idx| self.record(idx))
    }

    /// Project onto `columns`, in the order given
    ///
    /// Names the table does not have are skipped.
    pub fn select(&self, columns: &[String]) -> Table {
        let picked: Vec<(usize, &String)> = columns
            .iter()
            .filter_map(|name| self.column_index(name).map(|idx| (idx, name)))
            .collect();

        Table {
            columns: picked.iter().map(|(_, name)| (*name).clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picked.iter().map(|(idx, _)| row[*idx].clone()).collect())
                .collect(),
        }
    }

    /// Put `name` first, holding `value` in every row
    ///
    /// An existing column of the same name is replaced.
    pub fn with_leading_column(mut self, name: String, value: &Value) -> Table {
        if let Some(idx) = self.column_index(&name) {
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
        self.columns.insert(0, name);
        for row in &mut self.rows {
            row.insert(0, value.clone());
        }
        self
    }

    /// Append the rows of `other` after our own
    ///
    /// Columns become the outer union: ours first, then the new ones in
    /// `other`'s order. Missing cells on either side are null.
    pub fn append(&mut self, other: Table) {
        let Table { columns, rows } = other;

        let positions: Vec<usize> = columns
            .into_iter()
            .map(|name| match self.column_index(&name) {
                Some(idx) => idx,
                None => {
                    self.add_column(name);
                    self.columns.len() - 1
                }
            })
            .collect();

        let width = self.columns.len();
        self.rows.reserve(rows.len());
        for row in rows {
            let mut merged = vec![Value::Null; width];
            for (value, &idx) in row.into_iter().zip(&positions) {
                merged[idx] = value;
            }
            self.rows.push(merged);
        }
    }

    fn add_column(&mut self, name: String) {
        self.columns.push(name);
        for row in &mut self.rows {
            row.push(Value::Null);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_from_records_fills_missing_with_null() {
        let table = Table::from_records(vec![
            record(json!({"a": 1, "b": 2})),
            record(json!({"b": 3, "c": 4})),
        ]);

        assert_eq!(table.columns(), ["a", "b", "c"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], vec![json!(1), json!(2), Value::Null]);
        assert_eq!(table.rows()[1], vec![Value::Null, json!(3), json!(4)]);
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let table = Table::from_records(vec![record(json!({"a": 1, "b": 2, "c": 3}))]);
        let picked = table.select(&["c".to_string(), "a".to_string(), "zz".to_string()]);

        assert_eq!(picked.columns(), ["c", "a"]);
        assert_eq!(picked.rows()[0], vec![json!(3), json!(1)]);
    }

    #[test]
    fn test_leading_column_replaces_existing() {
        let table = Table::from_records(vec![
            record(json!({"x": 1, "json.id": "old"})),
            record(json!({"x": 2})),
        ]);
        let table = table.with_leading_column("json.id".to_string(), &json!(9));

        assert_eq!(table.columns(), ["json.id", "x"]);
        assert_eq!(table.value(0, "json.id"), Some(&json!(9)));
        assert_eq!(table.value(1, "json.id"), Some(&json!(9)));
        assert_eq!(table.value(1, "x"), Some(&json!(2)));
    }

    #[test]
    fn test_append_outer_union() {
        let mut left = Table::from_records(vec![record(json!({"a": 1, "b": 2}))]);
        let right = Table::from_records(vec![record(json!({"c": 3, "a": 4}))]);
        left.append(right);

        assert_eq!(left.columns(), ["a", "b", "c"]);
        assert_eq!(left.rows()[0], vec![json!(1), json!(2), Value::Null]);
        assert_eq!(left.rows()[1], vec![json!(4), Value::Null, json!(3)]);
    }

    #[test]
    fn test_record_round_trips_column_order() {
        let table = Table::from_records(vec![record(json!({"z": 1, "a": 2}))]);
        let keys: Vec<String> = table.record(0).unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a"]);
        assert!(table.record(1).is_none());
    }
}
