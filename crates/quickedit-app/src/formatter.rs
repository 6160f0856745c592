// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::{ColumnKey, Record, RowIndex, value_text};

/// Which kind of row a cell is being rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContext {
    DataRow(RowIndex),
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    SingleLine,
    MultiLine,
    Choice(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTemplate {
    pub kind: FieldKind,
    pub value: String,
    pub copy_down: bool,
}

/// Output of a formatter: plain cell text or an editable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    Field(FieldTemplate),
}

impl Rendered {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Field(template) => &template.value,
        }
    }
}

pub struct FormatArgs<'a> {
    pub context: RenderContext,
    pub column: &'a ColumnKey,
    pub value: Option<&'a Value>,
    pub record: &'a Record,
}

type FormatFn = dyn Fn(&FormatArgs<'_>) -> Rendered + Send + Sync;

/// Shared rendering function for one column. Clones share identity.
#[derive(Clone)]
pub struct Formatter {
    name: &'static str,
    render: Arc<FormatFn>,
}

impl Formatter {
    pub fn new<F>(name: &'static str, render: F) -> Self
    where
        F: Fn(&FormatArgs<'_>) -> Rendered + Send + Sync + 'static,
    {
        Self {
            name,
            render: Arc::new(render),
        }
    }

    pub fn plain_text() -> Self {
        Self::new("plain_text", |args| Rendered::Text(value_text(args.value)))
    }

    pub fn text_field() -> Self {
        Self::field("text_field", FieldKind::SingleLine)
    }

    pub fn multi_line_field() -> Self {
        Self::field("multi_line_field", FieldKind::MultiLine)
    }

    pub fn choice_field(choices: Vec<String>) -> Self {
        Self::field("choice_field", FieldKind::Choice(choices))
    }

    fn field(name: &'static str, kind: FieldKind) -> Self {
        Self::new(name, move |args| {
            Rendered::Field(FieldTemplate {
                kind: kind.clone(),
                value: value_text(args.value),
                copy_down: false,
            })
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn render(&self, args: &FormatArgs<'_>) -> Rendered {
        (self.render)(args)
    }

    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Formatter").field(&self.name).finish()
    }
}

/// The formatter installed on a column. While editing, the overlay keeps
/// the original for non-data rows.
#[derive(Debug, Clone)]
pub enum ColumnFormatter {
    Plain(Formatter),
    Overlay { edit: Formatter, original: Formatter },
}

impl ColumnFormatter {
    pub fn select(&self, context: RenderContext) -> &Formatter {
        match (self, context) {
            (Self::Plain(formatter), _) => formatter,
            (Self::Overlay { edit, .. }, RenderContext::DataRow(_)) => edit,
            (Self::Overlay { original, .. }, RenderContext::Summary) => original,
        }
    }

    pub fn original(&self) -> &Formatter {
        match self {
            Self::Plain(formatter) => formatter,
            Self::Overlay { original, .. } => original,
        }
    }

    pub fn is_overlay(&self) -> bool {
        matches!(self, Self::Overlay { .. })
    }

    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain(left), Self::Plain(right)) => left.same_as(right),
            (
                Self::Overlay {
                    edit: left_edit,
                    original: left_original,
                },
                Self::Overlay {
                    edit: right_edit,
                    original: right_original,
                },
            ) => left_edit.same_as(right_edit) && left_original.same_as(right_original),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnFormatter, FieldKind, FormatArgs, Formatter, RenderContext, Rendered};
    use crate::{ColumnKey, Record, RowIndex};
    use serde_json::json;

    fn args<'a>(
        context: RenderContext,
        column: &'a ColumnKey,
        record: &'a Record,
    ) -> FormatArgs<'a> {
        FormatArgs {
            context,
            column,
            value: record.get(column.as_str()),
            record,
        }
    }

    #[test]
    fn overlay_dispatches_on_render_context() {
        let original = Formatter::plain_text();
        let overlay = ColumnFormatter::Overlay {
            edit: Formatter::text_field(),
            original: original.clone(),
        };
        let key = ColumnKey::from("age");
        let record = json!({ "age": 7 }).as_object().cloned().unwrap_or_default();

        let data = overlay
            .select(RenderContext::DataRow(RowIndex::new(0)))
            .render(&args(RenderContext::DataRow(RowIndex::new(0)), &key, &record));
        assert!(matches!(
            data,
            Rendered::Field(ref template) if template.kind == FieldKind::SingleLine && template.value == "7"
        ));

        let summary = overlay
            .select(RenderContext::Summary)
            .render(&args(RenderContext::Summary, &key, &record));
        assert_eq!(summary, Rendered::Text("7".to_owned()));
        assert!(overlay.original().same_as(&original));
    }

    #[test]
    fn clones_share_identity_but_fresh_formatters_do_not() {
        let formatter = Formatter::plain_text();
        assert!(formatter.same_as(&formatter.clone()));
        assert!(!formatter.same_as(&Formatter::plain_text()));
        assert_eq!(format!("{formatter:?}"), "Formatter(\"plain_text\")");
    }
}
