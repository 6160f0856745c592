// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{CellRef, ColumnKey, FieldId, FieldKind, RowIndex};

/// A live editable field, bound to its row and column when it is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub id: FieldId,
    pub row: RowIndex,
    pub column: ColumnKey,
    pub kind: FieldKind,
}

impl FieldRef {
    pub fn cell(&self) -> CellRef {
        CellRef::new(self.row, self.column.clone())
    }
}

/// The rendering layer the editor drives. It owns the fields and their
/// text; the editor owns columns, records, and status markers.
pub trait TableHost {
    /// Every live field, in document order (row-major).
    fn fields(&self) -> Vec<FieldRef>;
    fn field_value(&self, field: FieldId) -> Option<String>;
    fn set_field_value(&mut self, field: FieldId, value: &str);
    /// Moves input focus to the field and selects its contents.
    fn focus_field(&mut self, field: FieldId);
    fn scroll_to_row(&mut self, row: RowIndex);
    fn set_edit_marker(&mut self, editing: bool);
    fn bind_navigation(&mut self, bound: bool);
    fn request_render(&mut self);

    fn clear_notifications(&mut self) {}

    fn notify_errors(&mut self) {}

    fn field_at(&self, row: RowIndex, column: &str) -> Option<FieldRef> {
        self.fields()
            .into_iter()
            .find(|field| field.row == row && field.column.as_str() == column)
    }
}
