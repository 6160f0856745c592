// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::{
    ColumnFormatter, ColumnKey, FieldRef, Formatter, Messages, PredicateScope, Rule, RuleKind,
    RuleSet,
};

type ChangedFn = dyn Fn(Option<&Value>, &str) -> bool + Send + Sync;
type CheckFn = dyn Fn(&FieldRef, &mut PredicateScope<'_>) -> bool + Send + Sync;

/// Custom change detection: `(original, trimmed new text) -> changed`.
#[derive(Clone)]
pub struct ChangedPredicate(Arc<ChangedFn>);

impl ChangedPredicate {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(Option<&Value>, &str) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    pub fn is_changed(&self, original: Option<&Value>, new: &str) -> bool {
        (self.0)(original, new)
    }
}

impl fmt::Debug for ChangedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChangedPredicate(..)")
    }
}

/// Validation hook run after the rules pass. It owns its message display
/// through the scope; returning false only fails the aggregate.
#[derive(Clone)]
pub struct CustomCheck(Arc<CheckFn>);

impl CustomCheck {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&FieldRef, &mut PredicateScope<'_>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    pub fn run(&self, field: &FieldRef, scope: &mut PredicateScope<'_>) -> bool {
        (self.0)(field, scope)
    }
}

impl fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCheck(..)")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationSpec {
    pub rules: RuleSet,
    pub messages: Messages,
    pub regex: Option<Regex>,
    pub custom: Option<CustomCheck>,
}

impl ValidationSpec {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: RuleSet::new(rules),
            ..Self::default()
        }
    }

    pub fn message(mut self, kind: RuleKind, message: impl Into<String>) -> Self {
        self.messages.set(kind, message);
        self
    }

    pub fn regex(mut self, pattern: Regex) -> Self {
        self.regex = Some(pattern);
        self
    }

    pub fn custom(mut self, check: CustomCheck) -> Self {
        self.custom = Some(check);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditConfig {
    pub formatter: Option<Formatter>,
    pub changed: Option<ChangedPredicate>,
    pub validation: Option<ValidationSpec>,
    pub copy_down: bool,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub key: ColumnKey,
    pub label: String,
    pub formatter: ColumnFormatter,
    pub read_only_formatter: Option<Formatter>,
    pub edit: Option<EditConfig>,
    pub sortable: bool,
}

impl Column {
    pub fn new(key: impl Into<ColumnKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            formatter: ColumnFormatter::Plain(Formatter::plain_text()),
            read_only_formatter: None,
            edit: None,
            sortable: false,
        }
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = ColumnFormatter::Plain(formatter);
        self
    }

    pub fn editable(mut self, config: EditConfig) -> Self {
        self.edit = Some(config);
        self
    }

    pub fn read_only(mut self, formatter: Formatter) -> Self {
        self.read_only_formatter = Some(formatter);
        self
    }

    /// Columns that switch renderer while editing.
    pub fn is_edit_target(&self) -> bool {
        self.edit.is_some() || self.read_only_formatter.is_some()
    }

    /// Edit-mode renderer: explicit editable formatter, then the read-only
    /// override, then a plain text field.
    pub fn edit_formatter(&self) -> Option<Formatter> {
        if !self.is_edit_target() {
            return None;
        }
        let explicit = self
            .edit
            .as_ref()
            .and_then(|config| config.formatter.clone());
        Some(
            explicit
                .or_else(|| self.read_only_formatter.clone())
                .unwrap_or_else(Formatter::text_field),
        )
    }

    pub fn validation(&self) -> Option<&ValidationSpec> {
        self.edit.as_ref()?.validation.as_ref()
    }

    pub fn copy_down(&self) -> bool {
        self.edit.as_ref().is_some_and(|config| config.copy_down)
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, EditConfig};
    use crate::Formatter;

    #[test]
    fn edit_formatter_prefers_explicit_then_read_only_then_default() {
        let explicit = Formatter::multi_line_field();
        let read_only = Formatter::plain_text();

        let column = Column::new("notes", "Notes")
            .editable(EditConfig {
                formatter: Some(explicit.clone()),
                ..EditConfig::default()
            })
            .read_only(read_only.clone());
        assert!(column.edit_formatter().is_some_and(|f| f.same_as(&explicit)));

        let column = Column::new("notes", "Notes").read_only(read_only.clone());
        assert!(column.edit_formatter().is_some_and(|f| f.same_as(&read_only)));

        let column = Column::new("notes", "Notes").editable(EditConfig::default());
        assert_eq!(
            column.edit_formatter().map(|f| f.name()),
            Some("text_field")
        );

        assert!(Column::new("id", "ID").edit_formatter().is_none());
    }

    #[test]
    fn copy_down_requires_edit_config() {
        let column = Column::new("team", "Team").editable(EditConfig {
            copy_down: true,
            ..EditConfig::default()
        });
        assert!(column.copy_down());
        assert!(!Column::new("team", "Team").copy_down());
    }
}
