// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ColumnKey, RowIndex};

/// Status levels, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Error,
    Warn,
    Success,
    Info,
}

impl StatusLevel {
    pub const ALL: [Self; 4] = [Self::Error, Self::Warn, Self::Success, Self::Info];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Success => "success",
            Self::Info => "info",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "error" => Some(Self::Error),
            "warn" => Some(Self::Warn),
            "success" => Some(Self::Success),
            "info" => Some(Self::Info),
            _ => None,
        }
    }

    pub const fn precedence(self) -> usize {
        match self {
            Self::Error => 0,
            Self::Warn => 1,
            Self::Success => 2,
            Self::Info => 3,
        }
    }
}

/// Precedence of a level given by name. Unknown names rank below every
/// known level.
pub fn precedence_of(name: &str) -> usize {
    StatusLevel::parse(name).map_or(usize::MAX, StatusLevel::precedence)
}

/// The only gate for overwriting a displayed status. Equal precedence does
/// not overwrite.
pub fn takes_precedence(current: Option<StatusLevel>, new: StatusLevel) -> bool {
    match current {
        None => true,
        Some(current) => new.precedence() < current.precedence(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMarker {
    pub level: StatusLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: RowIndex,
    pub column: ColumnKey,
}

impl CellRef {
    pub fn new(row: RowIndex, column: impl Into<ColumnKey>) -> Self {
        Self {
            row,
            column: column.into(),
        }
    }
}

/// Row and cell markers written during a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBoard {
    rows: BTreeMap<RowIndex, StatusMarker>,
    cells: BTreeMap<CellRef, StatusMarker>,
    has_messages: bool,
}

impl StatusBoard {
    pub fn clear(&mut self) {
        self.rows.clear();
        self.cells.clear();
        self.has_messages = false;
    }

    pub fn is_clear(&self) -> bool {
        self.rows.is_empty() && self.cells.is_empty() && !self.has_messages
    }

    pub fn has_messages(&self) -> bool {
        self.has_messages
    }

    pub fn row(&self, row: RowIndex) -> Option<&StatusMarker> {
        self.rows.get(&row)
    }

    pub fn cell(&self, cell: &CellRef) -> Option<&StatusMarker> {
        self.cells.get(cell)
    }

    pub fn count_at(&self, level: StatusLevel) -> usize {
        self.cells
            .values()
            .filter(|marker| marker.level == level)
            .count()
    }

    /// Records a message against a cell and its row. Returns true when this
    /// is the first message since the board was last cleared.
    pub fn record(&mut self, cell: &CellRef, message: &str, level: StatusLevel) -> bool {
        let first = !self.has_messages;
        self.has_messages = true;

        if let Some(marker) = merged_marker(self.rows.get(&cell.row), message, level) {
            self.rows.insert(cell.row, marker);
        }
        if let Some(marker) = merged_marker(self.cells.get(cell), message, level) {
            self.cells.insert(cell.clone(), marker);
        }
        first
    }
}

// An empty message keeps whatever text is already shown.
fn merged_marker(
    existing: Option<&StatusMarker>,
    message: &str,
    level: StatusLevel,
) -> Option<StatusMarker> {
    if !takes_precedence(existing.map(|marker| marker.level), level) {
        return None;
    }
    let message = if message.is_empty() {
        existing
            .map(|marker| marker.message.clone())
            .unwrap_or_default()
    } else {
        message.to_owned()
    };
    Some(StatusMarker { level, message })
}

#[cfg(test)]
mod tests {
    use super::{CellRef, StatusBoard, StatusLevel, precedence_of, takes_precedence};
    use crate::RowIndex;

    #[test]
    fn precedence_follows_declaration_order() {
        let ranks = StatusLevel::ALL.map(StatusLevel::precedence);
        assert_eq!(ranks, [0, 1, 2, 3]);
        assert_eq!(precedence_of("warn"), 1);
        assert_eq!(precedence_of("fatal"), usize::MAX);
    }

    #[test]
    fn takes_precedence_is_strict_for_every_pair() {
        for current in StatusLevel::ALL {
            for new in StatusLevel::ALL {
                assert_eq!(
                    takes_precedence(Some(current), new),
                    new.precedence() < current.precedence(),
                    "current={current:?} new={new:?}"
                );
            }
            assert!(takes_precedence(None, current));
        }
    }

    #[test]
    fn record_only_overwrites_with_higher_precedence() {
        let mut board = StatusBoard::default();
        let cell = CellRef::new(RowIndex::new(1), "age");

        assert!(board.record(&cell, "looks odd", StatusLevel::Warn));
        assert!(!board.record(&cell, "fyi", StatusLevel::Info));
        assert!(!board.record(&cell, "another warning", StatusLevel::Warn));
        let marker = board.cell(&cell).expect("cell marker");
        assert_eq!(marker.level, StatusLevel::Warn);
        assert_eq!(marker.message, "looks odd");

        board.record(&cell, "broken", StatusLevel::Error);
        let marker = board.cell(&cell).expect("cell marker");
        assert_eq!(marker.level, StatusLevel::Error);
        assert_eq!(marker.message, "broken");
        assert_eq!(
            board.row(RowIndex::new(1)).map(|marker| marker.level),
            Some(StatusLevel::Error)
        );
    }

    #[test]
    fn cell_error_does_not_touch_sibling_cells() {
        let mut board = StatusBoard::default();
        let age = CellRef::new(RowIndex::new(0), "age");
        let name = CellRef::new(RowIndex::new(0), "name");

        board.record(&name, "check spelling", StatusLevel::Warn);
        board.record(&age, "required", StatusLevel::Error);

        assert_eq!(
            board.cell(&name).map(|marker| marker.level),
            Some(StatusLevel::Warn)
        );
        assert_eq!(
            board.row(RowIndex::new(0)).map(|marker| marker.level),
            Some(StatusLevel::Error)
        );
    }

    #[test]
    fn empty_message_keeps_existing_text() {
        let mut board = StatusBoard::default();
        let cell = CellRef::new(RowIndex::new(0), "email");

        board.record(&cell, "custom markup", StatusLevel::Info);
        board.record(&cell, "", StatusLevel::Error);

        let marker = board.cell(&cell).expect("cell marker");
        assert_eq!(marker.level, StatusLevel::Error);
        assert_eq!(marker.message, "custom markup");
    }

    #[test]
    fn clear_is_idempotent() {
        let mut board = StatusBoard::default();
        board.record(&CellRef::new(RowIndex::new(2), "name"), "x", StatusLevel::Error);

        board.clear();
        let once = board.clone();
        board.clear();
        assert_eq!(board, once);
        assert!(board.is_clear());
    }
}
