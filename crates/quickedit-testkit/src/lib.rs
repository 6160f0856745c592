// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use quickedit_app::{
    CellRef, ChangedPredicate, Column, CustomCheck, EditConfig, EditorOptions, FieldId, FieldRef,
    Formatter, QuickEdit, Record, RenderContext, Rendered, RowIndex, RuleKind, RuleSet,
    StatusLevel, Table, TableHost, ValidationSpec, value_text,
};
use regex::Regex;
use serde_json::{Value, json};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];
const TEAMS: [&str; 4] = ["red", "green", "blue", "gold"];

/// Everything the editor asked the host to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSignal {
    ClearNotifications,
    NotifyErrors,
    EditMarker(bool),
    Navigation(bool),
    RenderRequested,
    ScrollTo(RowIndex),
    Focus(FieldId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryField {
    pub field: FieldRef,
    pub value: String,
    pub copy_down: bool,
}

/// In-memory rendering layer. `render` rebuilds the fields from the editor
/// the way a real host does after a render request.
#[derive(Debug, Default)]
pub struct MemoryHost {
    fields: Vec<MemoryField>,
    next_field: usize,
    pub signals: Vec<HostSignal>,
    pub focused: Option<FieldId>,
    pub editing: bool,
    pub navigation_bound: bool,
    pub pending_render: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroys every field and renders a fresh set for each data row.
    pub fn render(&mut self, editor: &QuickEdit) {
        self.fields.clear();
        self.focused = None;
        self.pending_render = false;
        if !editor.is_editing() {
            return;
        }

        for row in 0..editor.table().row_count() {
            let row = RowIndex::new(row);
            for (index, column) in editor.table().columns().iter().enumerate() {
                let Some(Rendered::Field(template)) =
                    editor.render_cell(RenderContext::DataRow(row), index)
                else {
                    continue;
                };
                let id = FieldId::new(self.next_field);
                self.next_field += 1;
                self.fields.push(MemoryField {
                    field: FieldRef {
                        id,
                        row,
                        column: column.key.clone(),
                        kind: template.kind,
                    },
                    value: template.value,
                    copy_down: template.copy_down,
                });
            }
        }
    }

    pub fn start(&mut self, editor: &mut QuickEdit) -> Result<()> {
        editor.start(self).context("start edit mode")?;
        self.render(editor);
        Ok(())
    }

    pub fn memory_fields(&self) -> &[MemoryField] {
        &self.fields
    }

    pub fn field_id(&self, row: usize, column: &str) -> Result<FieldId> {
        self.field_at(RowIndex::new(row), column)
            .map(|field| field.id)
            .ok_or_else(|| anyhow!("no field at row {row} column {column:?}"))
    }

    pub fn type_into(&mut self, row: usize, column: &str, text: &str) -> Result<()> {
        let id = self.field_id(row, column)?;
        self.set_field_value(id, text);
        Ok(())
    }

    pub fn value_at(&self, row: usize, column: &str) -> Option<String> {
        let id = self.field_id(row, column).ok()?;
        self.field_value(id)
    }

    pub fn copy_down_cells(&self) -> Vec<CellRef> {
        self.fields
            .iter()
            .filter(|field| field.copy_down)
            .map(|field| field.field.cell())
            .collect()
    }

    pub fn count(&self, signal: &HostSignal) -> usize {
        self.signals
            .iter()
            .filter(|candidate| *candidate == signal)
            .count()
    }
}

impl TableHost for MemoryHost {
    fn fields(&self) -> Vec<FieldRef> {
        self.fields.iter().map(|field| field.field.clone()).collect()
    }

    fn field_value(&self, field: FieldId) -> Option<String> {
        self.fields
            .iter()
            .find(|candidate| candidate.field.id == field)
            .map(|candidate| candidate.value.clone())
    }

    fn set_field_value(&mut self, field: FieldId, value: &str) {
        if let Some(candidate) = self
            .fields
            .iter_mut()
            .find(|candidate| candidate.field.id == field)
        {
            candidate.value = value.to_owned();
        }
    }

    fn focus_field(&mut self, field: FieldId) {
        self.focused = Some(field);
        self.signals.push(HostSignal::Focus(field));
    }

    fn scroll_to_row(&mut self, row: RowIndex) {
        self.signals.push(HostSignal::ScrollTo(row));
    }

    fn set_edit_marker(&mut self, editing: bool) {
        self.editing = editing;
        self.signals.push(HostSignal::EditMarker(editing));
    }

    fn bind_navigation(&mut self, bound: bool) {
        self.navigation_bound = bound;
        self.signals.push(HostSignal::Navigation(bound));
    }

    fn request_render(&mut self) {
        self.pending_render = true;
        self.signals.push(HostSignal::RenderRequested);
    }

    fn clear_notifications(&mut self) {
        self.signals.push(HostSignal::ClearNotifications);
    }

    fn notify_errors(&mut self) {
        self.signals.push(HostSignal::NotifyErrors);
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn pick<'a>(&mut self, values: &[&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }
}

/// Seeded generator of roster records.
#[derive(Debug, Clone)]
pub struct RosterFaker {
    rng: DeterministicRng,
}

impl RosterFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: DeterministicRng::new(seed),
        }
    }

    pub fn record(&mut self, id: usize) -> Record {
        let first = self.rng.pick(&FIRST_NAMES);
        let last = self.rng.pick(&LAST_NAMES);
        let age = 18 + self.rng.int_n(60);
        let score = (self.rng.int_n(1000) as f64) / 10.0;
        let team = self.rng.pick(&TEAMS);
        record(json!({
            "id": id,
            "name": format!("{first} {last}"),
            "age": age,
            "score": score,
            "email": format!("{}.{}@example.com", first.to_ascii_lowercase(), last.to_ascii_lowercase()),
            "team": team,
            "notes": "",
        }))
    }

    pub fn records(&mut self, count: usize) -> Vec<Record> {
        (0..count).map(|id| self.record(id + 1)).collect()
    }
}

pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// Columns of the roster fixture:
/// `id` read-only, `name` required with a minimum length, `age` bounded
/// integer, `score` decimal, `email` pattern plus a uniqueness check, `team`
/// choice with copy-down, `notes` multi-line.
pub fn roster_columns() -> Result<Vec<Column>> {
    let email = Regex::new(r"^[^@\s]+@[^@\s]+\.[a-z]+$").context("compile email pattern")?;

    Ok(vec![
        Column::new("id", "ID").sortable(true),
        Column::new("name", "Name").sortable(true).editable(EditConfig {
            validation: Some(ValidationSpec {
                rules: RuleSet::parse(["required", "length[2,40]"])?,
                ..ValidationSpec::default()
            }
            .message(RuleKind::Required, "Required")
            .message(RuleKind::MinLength, "Too short")),
            ..EditConfig::default()
        }),
        Column::new("age", "Age").sortable(true).editable(EditConfig {
            validation: Some(ValidationSpec {
                rules: RuleSet::parse(["integer[0,120]"])?,
                ..ValidationSpec::default()
            }
            .message(RuleKind::Integer, "Age must be a whole number from 0 to 120")),
            ..EditConfig::default()
        }),
        Column::new("score", "Score").editable(EditConfig {
            changed: Some(numeric_changed()),
            validation: Some(ValidationSpec {
                rules: RuleSet::parse(["decimal[0,100]"])?,
                ..ValidationSpec::default()
            }),
            ..EditConfig::default()
        }),
        Column::new("email", "Email").editable(EditConfig {
            validation: Some(
                ValidationSpec::default()
                    .regex(email)
                    .message(RuleKind::Regex, "Not an email address")
                    .custom(unique_in_column("Already used in another row")),
            ),
            ..EditConfig::default()
        }),
        Column::new("team", "Team").editable(EditConfig {
            formatter: Some(Formatter::choice_field(
                TEAMS.iter().map(|team| (*team).to_owned()).collect(),
            )),
            copy_down: true,
            ..EditConfig::default()
        }),
        Column::new("notes", "Notes").editable(EditConfig {
            formatter: Some(Formatter::multi_line_field()),
            ..EditConfig::default()
        }),
    ])
}

pub fn roster_table(rows: usize) -> Result<Table> {
    let records = RosterFaker::new(7).records(rows);
    Table::new(roster_columns()?, records)
}

pub fn roster_editor(rows: usize, options: EditorOptions) -> Result<QuickEdit> {
    Ok(QuickEdit::new(roster_table(rows)?, options))
}

/// Changed unless both sides parse to the same number.
pub fn numeric_changed() -> ChangedPredicate {
    ChangedPredicate::new(|original, new| {
        let original = value_text(original);
        match (original.trim().parse::<f64>(), new.parse::<f64>()) {
            (Ok(left), Ok(right)) => left != right,
            _ => original != new,
        }
    })
}

/// Fails, with a warning marker, when another row of the column holds the
/// same non-empty value.
pub fn unique_in_column(message: &'static str) -> CustomCheck {
    CustomCheck::new(move |field, scope| {
        if scope.value().is_empty() {
            return true;
        }
        let duplicate = scope
            .column_values(&field.column)
            .iter()
            .any(|(row, value)| *row != field.row && value == scope.value());
        if duplicate {
            scope.display_message(message, StatusLevel::Warn);
        }
        !duplicate
    })
}

#[cfg(test)]
mod tests {
    use super::{MemoryHost, RosterFaker, roster_editor};
    use anyhow::Result;
    use quickedit_app::{EditorOptions, TableHost};

    #[test]
    fn faker_is_deterministic_per_seed() {
        let left = RosterFaker::new(3).records(5);
        let right = RosterFaker::new(3).records(5);
        assert_eq!(left, right);
        assert_ne!(left, RosterFaker::new(4).records(5));
    }

    #[test]
    fn render_builds_fields_only_while_editing() -> Result<()> {
        let mut editor = roster_editor(3, EditorOptions::default())?;
        let mut host = MemoryHost::new();

        host.render(&editor);
        assert!(host.fields().is_empty());

        host.start(&mut editor)?;
        // name, age, score, email, team, notes per row
        assert_eq!(host.fields().len(), 18);
        assert_eq!(host.copy_down_cells().len(), 1);
        Ok(())
    }
}
