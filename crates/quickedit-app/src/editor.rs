// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Deserialize;

use crate::mode::ModeState;
use crate::{Column, ColumnKey, FieldRef, FormatArgs, RenderContext, Rendered, StatusBoard, Table};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EditorOptions {
    /// Keys copied from the record into every row's change set.
    #[serde(default)]
    pub changes_always_include: Vec<ColumnKey>,
}

/// Edit-mode overlay for one table.
#[derive(Debug)]
pub struct QuickEdit {
    pub(crate) table: Table,
    pub(crate) options: EditorOptions,
    pub(crate) mode: Option<ModeState>,
    pub(crate) status: StatusBoard,
}

impl QuickEdit {
    pub fn new(table: Table, options: EditorOptions) -> Self {
        Self {
            table,
            options,
            mode: None,
            status: StatusBoard::default(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Column configuration is frozen while editing.
    pub fn table_mut(&mut self) -> Option<&mut Table> {
        if self.mode.is_some() {
            return None;
        }
        Some(&mut self.table)
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn column_for(&self, field: &FieldRef) -> Option<&Column> {
        self.table.column(field.column.as_str())
    }

    /// Renders one cell through the column's installed formatter. Returns
    /// `None` for an unknown column or row.
    pub fn render_cell(&self, context: RenderContext, column_index: usize) -> Option<Rendered> {
        let column = self.table.columns().get(column_index)?;
        let record = match context {
            RenderContext::DataRow(row) => self.table.record(row)?,
            RenderContext::Summary => self.table.summary()?,
        };
        let args = FormatArgs {
            context,
            column: &column.key,
            value: record.get(column.key.as_str()),
            record,
        };
        let mut rendered = column.formatter.select(context).render(&args);
        if let Rendered::Field(template) = &mut rendered {
            template.copy_down =
                column.copy_down() && matches!(context, RenderContext::DataRow(row) if row.get() == 0);
        }
        Some(rendered)
    }
}
