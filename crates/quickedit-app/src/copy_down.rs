// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::debug;

use crate::{CellRef, TableHost};

/// Copies the trimmed value of `start` into the same column of every later
/// row. An empty value is a no-op. Returns the number of fields written.
pub fn copy_down<H: TableHost + ?Sized>(host: &mut H, start: &CellRef) -> usize {
    let Some(source) = host.field_at(start.row, start.column.as_str()) else {
        return 0;
    };
    let value = host.field_value(source.id).unwrap_or_default();
    let value = value.trim();
    if value.is_empty() {
        return 0;
    }

    let targets = host
        .fields()
        .into_iter()
        .filter(|field| field.column == start.column && field.row > start.row)
        .collect::<Vec<_>>();
    for field in &targets {
        host.set_field_value(field.id, value);
    }
    debug!(
        "copied {value:?} down {} rows of {}",
        targets.len(),
        start.column
    );
    targets.len()
}
