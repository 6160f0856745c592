// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::{Column, FieldRef, QuickEdit, RowIndex, TableHost, value_text};

/// Sparse per-row change set: column key to new value.
pub type Change = Map<String, Value>;

impl QuickEdit {
    /// Validates, then diffs every live field against its record. Returns
    /// `None` when validation fails. Yields one entry per record, in row
    /// order, even when a row has nothing to report.
    pub fn get_changes<H: TableHost>(&mut self, host: &mut H) -> Option<Vec<Change>> {
        if !self.validate(host) {
            debug!("changes withheld: validation failed");
            return None;
        }

        let mut by_row: BTreeMap<RowIndex, Vec<FieldRef>> = BTreeMap::new();
        for field in host.fields() {
            by_row.entry(field.row).or_default().push(field);
        }

        let mut changes = Vec::with_capacity(self.table.row_count());
        for (index, record) in self.table.records().iter().enumerate() {
            let mut change = Change::new();
            let fields = by_row.remove(&RowIndex::new(index)).unwrap_or_default();
            for field in fields {
                let Some(column) = self.table.column(field.column.as_str()) else {
                    continue;
                };
                let raw = host.field_value(field.id).unwrap_or_default();
                let value = raw.trim();
                let original = record.get(column.key.as_str());
                if is_changed(column, original, value) {
                    change.insert(column.key.to_string(), Value::String(value.to_owned()));
                }
            }

            for key in &self.options.changes_always_include {
                let original = record.get(key.as_str()).cloned().unwrap_or(Value::Null);
                change.insert(key.to_string(), original);
            }
            changes.push(change);
        }

        debug!(
            "collected changes for {} rows, {} with edits",
            changes.len(),
            changes.iter().filter(|change| !change.is_empty()).count()
        );
        Some(changes)
    }

    /// Folds a saved change set back into the records so the next edit
    /// session starts from it. Always-included keys carry original values
    /// and are skipped. Returns `None` while editing.
    pub fn apply_changes(&mut self, changes: &[Change]) -> Option<usize> {
        let skip = self.options.changes_always_include.clone();
        let written = self.table_mut()?.apply_changes(changes, &skip);
        debug!("applied {written} saved values to the table");
        Some(written)
    }
}

fn is_changed(column: &Column, original: Option<&Value>, new: &str) -> bool {
    match column.edit.as_ref().and_then(|config| config.changed.as_ref()) {
        Some(predicate) => predicate.is_changed(original, new),
        None => value_text(original) != new,
    }
}
