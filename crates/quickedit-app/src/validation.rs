// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::debug;
use serde_json::Value;

use crate::{
    ColumnKey, FieldRef, QuickEdit, Record, RowIndex, StatusBoard, StatusLevel, TableHost,
};

/// What a custom check can reach while it runs.
pub struct PredicateScope<'a> {
    field: &'a FieldRef,
    value: &'a str,
    record: Option<&'a Record>,
    status: &'a mut StatusBoard,
    host: &'a mut dyn TableHost,
}

impl PredicateScope<'_> {
    pub fn field(&self) -> &FieldRef {
        self.field
    }

    /// Trimmed text of the field under validation.
    pub fn value(&self) -> &str {
        self.value
    }

    pub fn record(&self) -> Option<&Record> {
        self.record
    }

    pub fn original(&self) -> Option<&Value> {
        self.record?.get(self.field.column.as_str())
    }

    /// Trimmed values of every live field in a column, with their rows.
    pub fn column_values(&self, column: &ColumnKey) -> Vec<(RowIndex, String)> {
        self.host
            .fields()
            .into_iter()
            .filter(|field| &field.column == column)
            .map(|field| {
                let value = self.host.field_value(field.id).unwrap_or_default();
                (field.row, value.trim().to_owned())
            })
            .collect()
    }

    pub fn display_message(&mut self, message: &str, level: StatusLevel) {
        show_message(self.status, self.host, self.field, message, level, true);
    }
}

fn show_message(
    status: &mut StatusBoard,
    host: &mut dyn TableHost,
    field: &FieldRef,
    message: &str,
    level: StatusLevel,
    scroll: bool,
) {
    let first = status.record(&field.cell(), message, level);
    if first && scroll {
        host.scroll_to_row(field.row);
    }
}

impl QuickEdit {
    pub fn clear_messages(&mut self) {
        self.status.clear();
    }

    pub fn display_message<H: TableHost>(
        &mut self,
        host: &mut H,
        field: &FieldRef,
        message: &str,
        level: StatusLevel,
        scroll: bool,
    ) {
        show_message(&mut self.status, host, field, message, level, scroll);
    }

    /// Validates every live field. Failures are marked in place; the result
    /// is true only when every field passes.
    pub fn validate<H: TableHost>(&mut self, host: &mut H) -> bool {
        self.clear_messages();

        let fields = host.fields();
        let mut failed = 0usize;
        for field in &fields {
            let Some(spec) = self
                .table
                .column(field.column.as_str())
                .and_then(|column| column.validation())
            else {
                continue;
            };

            let raw = host.field_value(field.id).unwrap_or_default();
            let value = raw.trim();

            if let Err(failure) = spec.rules.evaluate(value, &spec.messages, spec.regex.as_ref()) {
                show_message(
                    &mut self.status,
                    &mut *host,
                    field,
                    &failure.message,
                    StatusLevel::Error,
                    true,
                );
                failed += 1;
                continue;
            }

            if let Some(check) = &spec.custom {
                let mut scope = PredicateScope {
                    field,
                    value,
                    record: self.table.record(field.row),
                    status: &mut self.status,
                    host: &mut *host,
                };
                if !check.run(field, &mut scope) {
                    failed += 1;
                }
            }
        }

        debug!("validated {} fields, {failed} failed", fields.len());
        if failed > 0 {
            host.notify_errors();
        }
        failed == 0
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        Column, CustomCheck, EditConfig, EditorOptions, FieldId, FieldKind, FieldRef, QuickEdit,
        Record, Rule, RowIndex, RuleKind, StatusLevel, Table, TableHost, ValidationSpec,
    };
    use serde_json::json;

    #[derive(Debug, Default)]
    struct FieldsHost {
        fields: Vec<(FieldRef, String)>,
        scrolled: Vec<RowIndex>,
        error_notices: usize,
    }

    impl FieldsHost {
        fn with(values: &[(usize, &str, &str)]) -> Self {
            let fields = values
                .iter()
                .enumerate()
                .map(|(index, (row, column, value))| {
                    (
                        FieldRef {
                            id: FieldId::new(index),
                            row: RowIndex::new(*row),
                            column: (*column).into(),
                            kind: FieldKind::SingleLine,
                        },
                        (*value).to_owned(),
                    )
                })
                .collect();
            Self {
                fields,
                ..Self::default()
            }
        }
    }

    impl TableHost for FieldsHost {
        fn fields(&self) -> Vec<FieldRef> {
            self.fields.iter().map(|(field, _)| field.clone()).collect()
        }

        fn field_value(&self, field: FieldId) -> Option<String> {
            self.fields
                .iter()
                .find(|(candidate, _)| candidate.id == field)
                .map(|(_, value)| value.clone())
        }

        fn set_field_value(&mut self, _field: FieldId, _value: &str) {}

        fn focus_field(&mut self, _field: FieldId) {}

        fn scroll_to_row(&mut self, row: RowIndex) {
            self.scrolled.push(row);
        }

        fn set_edit_marker(&mut self, _editing: bool) {}

        fn bind_navigation(&mut self, _bound: bool) {}

        fn request_render(&mut self) {}

        fn notify_errors(&mut self) {
            self.error_notices += 1;
        }
    }

    fn editor(columns: Vec<Column>, rows: usize) -> QuickEdit {
        let records = (0..rows).map(|_| Record::new()).collect();
        let table = Table::new(columns, records).expect("unique keys");
        QuickEdit::new(table, EditorOptions::default())
    }

    fn validated(spec: ValidationSpec) -> EditConfig {
        EditConfig {
            validation: Some(spec),
            ..EditConfig::default()
        }
    }

    #[test]
    fn required_failure_never_reports_length() {
        let mut editor = editor(
            vec![Column::new("name", "Name").editable(validated(
                ValidationSpec::new([
                    Rule::Required,
                    Rule::Length {
                        min: Some(2),
                        max: None,
                    },
                ])
                .message(RuleKind::Required, "Required")
                .message(RuleKind::MinLength, "Too short"),
            ))],
            3,
        );
        let mut host = FieldsHost::with(&[(0, "name", "  "), (1, "name", "a"), (2, "name", "ab")]);

        assert!(!editor.validate(&mut host));
        let status = editor.status();
        let first = status
            .cell(&crate::CellRef::new(RowIndex::new(0), "name"))
            .expect("row 0 marked");
        assert_eq!(first.level, StatusLevel::Error);
        assert_eq!(first.message, "Required");
        let second = status
            .cell(&crate::CellRef::new(RowIndex::new(1), "name"))
            .expect("row 1 marked");
        assert_eq!(second.message, "Too short");
        assert!(
            status
                .cell(&crate::CellRef::new(RowIndex::new(2), "name"))
                .is_none()
        );
        assert_eq!(host.scrolled, vec![RowIndex::new(0)]);
        assert_eq!(host.error_notices, 1);
    }

    #[test]
    fn fields_without_edit_config_or_column_are_skipped() {
        let mut editor = editor(vec![Column::new("id", "ID")], 1);
        let mut host = FieldsHost::with(&[(0, "id", ""), (0, "ghost", "")]);

        assert!(editor.validate(&mut host));
        assert!(editor.status().is_clear());
        assert_eq!(host.error_notices, 0);
    }

    #[test]
    fn custom_check_runs_after_rules_and_owns_its_message() {
        let check = CustomCheck::new(|_field, scope| {
            let taken = scope
                .column_values(&"email".into())
                .iter()
                .filter(|(_, value)| value == scope.value())
                .count()
                > 1;
            if taken {
                scope.display_message("already used", StatusLevel::Warn);
            }
            !taken
        });
        let mut editor = editor(
            vec![
                Column::new("email", "Email")
                    .editable(validated(ValidationSpec::new([Rule::Required]).custom(check))),
            ],
            3,
        );
        let mut host = FieldsHost::with(&[
            (0, "email", "a@x.example"),
            (1, "email", "a@x.example "),
            (2, "email", ""),
        ]);

        assert!(!editor.validate(&mut host));
        let marker = editor
            .status()
            .cell(&crate::CellRef::new(RowIndex::new(1), "email"))
            .expect("duplicate marked");
        assert_eq!(marker.level, StatusLevel::Warn);
        assert_eq!(marker.message, "already used");
        let empty = editor
            .status()
            .cell(&crate::CellRef::new(RowIndex::new(2), "email"))
            .expect("empty marked");
        assert_eq!(empty.level, StatusLevel::Error);
    }

    #[test]
    fn silent_custom_failure_still_fails_the_pass() {
        let mut editor = editor(
            vec![Column::new("code", "Code").editable(validated(
                ValidationSpec::default().custom(CustomCheck::new(|_, _| false)),
            ))],
            1,
        );
        let mut host = FieldsHost::with(&[(0, "code", "x")]);

        assert!(!editor.validate(&mut host));
        assert!(editor.status().is_clear());
        assert_eq!(host.error_notices, 1);
    }

    #[test]
    fn custom_check_sees_the_original_record_value() {
        let table = Table::new(
            vec![Column::new("age", "Age").editable(validated(
                ValidationSpec::default().custom(CustomCheck::new(|_, scope| {
                    scope.original() == Some(&json!(30)) && scope.value() == "31"
                })),
            ))],
            vec![json!({ "age": 30 }).as_object().cloned().unwrap_or_default()],
        )
        .expect("unique keys");
        let mut editor = QuickEdit::new(table, EditorOptions::default());
        let mut host = FieldsHost::with(&[(0, "age", " 31 ")]);

        assert!(editor.validate(&mut host));
    }

    #[test]
    fn display_message_scrolls_only_on_first_message() {
        let mut editor = editor(vec![Column::new("name", "Name")], 2);
        let mut host = FieldsHost::with(&[(0, "name", ""), (1, "name", "")]);
        let fields = host.fields();

        editor.display_message(&mut host, &fields[1], "first", StatusLevel::Info, true);
        editor.display_message(&mut host, &fields[0], "second", StatusLevel::Info, true);
        assert_eq!(host.scrolled, vec![RowIndex::new(1)]);

        editor.clear_messages();
        editor.display_message(&mut host, &fields[0], "quiet", StatusLevel::Info, false);
        assert_eq!(host.scrolled, vec![RowIndex::new(1)]);
        assert!(editor.status().has_messages());
    }
}
