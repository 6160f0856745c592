// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FieldId, TableHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Up,
    Down,
}

impl NavDirection {
    /// Only Up/Down with the modifier held navigate.
    pub fn from_key(key: NavKey, modifier: bool) -> Option<Self> {
        match (key, modifier) {
            (NavKey::Up, true) => Some(Self::Up),
            (NavKey::Down, true) => Some(Self::Down),
            _ => None,
        }
    }
}

/// Moves focus to the field at the same position in the adjacent row.
/// Returns the focused field, or `None` at the top or bottom edge.
pub fn navigate<H: TableHost + ?Sized>(
    host: &mut H,
    from: FieldId,
    direction: NavDirection,
) -> Option<FieldId> {
    let fields = host.fields();
    let current = fields.iter().find(|field| field.id == from)?;
    let position = fields
        .iter()
        .filter(|field| field.row == current.row)
        .position(|field| field.id == from)?;
    let target_row = match direction {
        NavDirection::Up => current.row.previous()?,
        NavDirection::Down => current.row.next(),
    };
    let target = fields
        .iter()
        .filter(|field| field.row == target_row)
        .nth(position)?
        .id;
    host.focus_field(target);
    Some(target)
}
