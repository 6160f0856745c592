// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::{debug, warn};
use std::fmt;

use crate::{ColumnFormatter, QuickEdit, TableHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeError {
    AlreadyEditing,
    NotEditing,
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyEditing => f.write_str("edit mode is already active"),
            Self::NotEditing => f.write_str("edit mode is not active"),
        }
    }
}

impl std::error::Error for ModeError {}

/// Column state saved on `start`, parallel to the table's columns.
#[derive(Debug)]
pub(crate) struct ModeState {
    saved_sortable: Vec<bool>,
    saved_formatter: Vec<ColumnFormatter>,
}

impl QuickEdit {
    pub fn is_editing(&self) -> bool {
        self.mode.is_some()
    }

    pub fn start<H: TableHost>(&mut self, host: &mut H) -> Result<(), ModeError> {
        if self.mode.is_some() {
            warn!("start ignored: {}", ModeError::AlreadyEditing);
            return Err(ModeError::AlreadyEditing);
        }

        host.clear_notifications();

        let columns = self.table.columns_mut();
        let state = ModeState {
            saved_sortable: columns.iter().map(|column| column.sortable).collect(),
            saved_formatter: columns
                .iter()
                .map(|column| column.formatter.clone())
                .collect(),
        };

        let mut overlaid = 0usize;
        for column in columns.iter_mut() {
            column.sortable = false;
            let Some(edit) = column.edit_formatter() else {
                continue;
            };
            column.formatter = ColumnFormatter::Overlay {
                edit,
                original: column.formatter.original().clone(),
            };
            overlaid += 1;
        }
        self.mode = Some(state);

        host.bind_navigation(true);
        host.set_edit_marker(true);
        host.request_render();
        debug!("edit mode started with {overlaid} editable columns");
        Ok(())
    }

    /// Leaves edit mode without keeping any edits. Call `get_changes`
    /// first to collect them.
    pub fn cancel<H: TableHost>(&mut self, host: &mut H) -> Result<(), ModeError> {
        let Some(state) = self.mode.take() else {
            warn!("cancel ignored: {}", ModeError::NotEditing);
            return Err(ModeError::NotEditing);
        };

        host.clear_notifications();

        let columns = self.table.columns_mut();
        for ((column, sortable), formatter) in columns
            .iter_mut()
            .zip(state.saved_sortable)
            .zip(state.saved_formatter)
        {
            column.sortable = sortable;
            column.formatter = formatter;
        }
        self.status.clear();

        host.bind_navigation(false);
        host.set_edit_marker(false);
        host.request_render();
        debug!("edit mode canceled");
        Ok(())
    }
}
