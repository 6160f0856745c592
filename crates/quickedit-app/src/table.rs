// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::{Change, Column, ColumnKey, RowIndex};

/// One backing data row.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// String form of a record value. Only null or absent is empty; `0` stays
/// `"0"`.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    records: Vec<Record>,
    summary: Option<Record>,
}

impl Table {
    pub fn new(columns: Vec<Column>, records: Vec<Record>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if column.key.as_str().is_empty() {
                bail!("column key cannot be empty -- give every column a key");
            }
            if !seen.insert(column.key.as_str()) {
                bail!(
                    "duplicate column key {:?} -- column keys must be unique",
                    column.key.as_str()
                );
            }
        }
        Ok(Self {
            columns,
            records,
            summary: None,
        })
    }

    pub fn with_summary(mut self, summary: Record) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.key.as_str() == key)
    }

    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.key.as_str() == key)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, row: RowIndex) -> Option<&Record> {
        self.records.get(row.get())
    }

    pub fn row_count(&self) -> usize {
        self.records.len()
    }

    pub fn summary(&self) -> Option<&Record> {
        self.summary.as_ref()
    }

    /// Stable sort of the records by one sortable column. Returns the prior
    /// row index of each record in its new order, or `None` when the column
    /// is unknown or not sortable.
    pub fn sort_rows(&mut self, key: &ColumnKey, direction: SortDirection) -> Option<Vec<usize>> {
        if !self.column(key.as_str()).is_some_and(|column| column.sortable) {
            return None;
        }
        let mut order = (0..self.records.len()).collect::<Vec<_>>();
        order.sort_by(|&left, &right| {
            let ordering = compare_values(
                self.records[left].get(key.as_str()),
                self.records[right].get(key.as_str()),
            );
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        let mut records = std::mem::take(&mut self.records)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        self.records = order
            .iter()
            .filter_map(|&index| records[index].take())
            .collect();
        Some(order)
    }

    /// Writes saved values back into the records, row by row. Keys in `skip`
    /// and keys that are not columns are left alone. Returns the number of
    /// values written.
    pub fn apply_changes(&mut self, changes: &[Change], skip: &[ColumnKey]) -> usize {
        let mut written = 0;
        for (record, change) in self.records.iter_mut().zip(changes) {
            for (key, value) in change {
                let skipped = skip.iter().any(|skipped| skipped.as_str() == key);
                let known = self.columns.iter().any(|column| column.key.as_str() == key);
                if skipped || !known {
                    continue;
                }
                record.insert(key.clone(), value.clone());
                written += 1;
            }
        }
        written
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => {
            let left = left.as_f64().unwrap_or_default();
            let right = right.as_f64().unwrap_or_default();
            left.total_cmp(&right)
        }
        _ => value_text(left)
            .to_ascii_lowercase()
            .cmp(&value_text(right).to_ascii_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::{SortDirection, Table, value_text};
    use crate::{Column, ColumnKey, Record};
    use serde_json::{Value, json};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn value_text_keeps_zero_distinct_from_empty() {
        assert_eq!(value_text(Some(&json!(0))), "0");
        assert_eq!(value_text(Some(&json!(""))), "");
        assert_eq!(value_text(Some(&Value::Null)), "");
        assert_eq!(value_text(None), "");
        assert_eq!(value_text(Some(&json!(false))), "false");
        assert_eq!(value_text(Some(&json!("Ada"))), "Ada");
    }

    #[test]
    fn duplicate_column_keys_are_rejected() {
        let error = Table::new(
            vec![Column::new("age", "Age"), Column::new("age", "Age again")],
            Vec::new(),
        )
        .expect_err("duplicate keys should fail");
        assert!(error.to_string().contains("duplicate column key"));
    }

    #[test]
    fn sort_rows_orders_numbers_numerically() -> anyhow::Result<()> {
        let mut table = Table::new(
            vec![Column::new("age", "Age").sortable(true), Column::new("name", "Name")],
            vec![
                record(json!({ "age": 10, "name": "b" })),
                record(json!({ "age": 9, "name": "a" })),
                record(json!({ "age": 100, "name": "c" })),
            ],
        )?;

        let order = table.sort_rows(&ColumnKey::from("age"), SortDirection::Asc);
        assert_eq!(order, Some(vec![1, 0, 2]));
        let ages = table
            .records()
            .iter()
            .map(|record| value_text(record.get("age")))
            .collect::<Vec<_>>();
        assert_eq!(ages, ["9", "10", "100"]);

        assert!(table.sort_rows(&ColumnKey::from("name"), SortDirection::Asc).is_none());
        Ok(())
    }

    #[test]
    fn apply_changes_writes_columns_and_skips_listed_keys() -> anyhow::Result<()> {
        let mut table = Table::new(
            vec![Column::new("id", "ID"), Column::new("age", "Age")],
            vec![
                record(json!({ "id": 1, "age": 7 })),
                record(json!({ "id": 2, "age": 9 })),
            ],
        )?;
        let changes = vec![
            record(json!({ "id": 99, "age": "8", "stray": "x" })),
            record(json!({ "id": 2 })),
        ];

        let written = table.apply_changes(&changes, &[ColumnKey::from("id")]);

        assert_eq!(written, 1);
        assert_eq!(
            Value::Object(table.records()[0].clone()),
            json!({ "id": 1, "age": "8" })
        );
        assert_eq!(
            Value::Object(table.records()[1].clone()),
            json!({ "id": 2, "age": 9 })
        );
        Ok(())
    }
}
