// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use quickedit_app::{
    ChangedPredicate, Column, CustomCheck, EditConfig, Formatter, Record, Rendered, RuleKind,
    RuleSet, StatusLevel, Table, ValidationSpec, value_text,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const LOCKED_MARK: &str = "⊘";
const DUPLICATE_MESSAGE: &str = "value is already used in another row";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableFile {
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub rows: Vec<Record>,
    pub footer: Option<Record>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKindSpec {
    #[default]
    Text,
    Multiline,
    Choice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedSpec {
    Numeric,
    CaseInsensitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckSpec {
    Unique,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSpec {
    pub key: String,
    pub label: Option<String>,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub kind: FieldKindSpec,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default)]
    pub messages: BTreeMap<RuleKind, String>,
    pub regex: Option<String>,
    #[serde(default)]
    pub copy_down: bool,
    pub changed: Option<ChangedSpec>,
    pub check: Option<CheckSpec>,
}

impl ColumnSpec {
    fn build(&self) -> Result<Column> {
        let key = self.key.trim();
        if key.is_empty() {
            bail!("column key must not be empty");
        }
        let label = self.label.clone().unwrap_or_else(|| key.to_owned());
        let mut column = Column::new(key, label).sortable(self.sortable);

        if self.read_only {
            column = column.read_only(locked_text());
        }

        if !self.editable {
            let edit_only = [
                ("kind", self.kind != FieldKindSpec::Text),
                ("choices", !self.choices.is_empty()),
                ("rules", !self.rules.is_empty()),
                ("messages", !self.messages.is_empty()),
                ("regex", self.regex.is_some()),
                ("copy_down", self.copy_down),
                ("changed", self.changed.is_some()),
                ("check", self.check.is_some()),
            ];
            if let Some((name, _)) = edit_only.iter().find(|(_, set)| *set) {
                bail!("column {key:?} sets `{name}` but is not editable");
            }
            return Ok(column);
        }

        let formatter = match self.kind {
            FieldKindSpec::Text => None,
            FieldKindSpec::Multiline => Some(Formatter::multi_line_field()),
            FieldKindSpec::Choice => {
                if self.choices.is_empty() {
                    bail!("choice column {key:?} needs at least one entry in `choices`");
                }
                Some(Formatter::choice_field(self.choices.clone()))
            }
        };

        Ok(column.editable(EditConfig {
            formatter,
            changed: self.changed.map(changed_predicate),
            validation: self.validation(key)?,
            copy_down: self.copy_down,
        }))
    }

    fn validation(&self, key: &str) -> Result<Option<ValidationSpec>> {
        if self.rules.is_empty() && self.regex.is_none() && self.check.is_none() {
            if !self.messages.is_empty() {
                bail!("column {key:?} sets `messages` without rules or regex");
            }
            return Ok(None);
        }

        let mut spec = ValidationSpec {
            rules: RuleSet::parse(&self.rules)
                .with_context(|| format!("parse rules for column {key:?}"))?,
            ..ValidationSpec::default()
        };
        for (kind, message) in &self.messages {
            spec = spec.message(*kind, message.as_str());
        }
        if let Some(pattern) = &self.regex {
            let pattern = Regex::new(pattern)
                .with_context(|| format!("compile regex for column {key:?}"))?;
            spec = spec.regex(pattern);
        }
        if let Some(CheckSpec::Unique) = self.check {
            spec = spec.custom(unique_in_column());
        }
        Ok(Some(spec))
    }
}

impl TableFile {
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("parse TOML table")
    }

    pub fn into_table(self) -> Result<Table> {
        let columns = self
            .columns
            .iter()
            .map(ColumnSpec::build)
            .collect::<Result<Vec<_>>>()?;
        let table = Table::new(columns, self.rows)?;
        Ok(match self.footer {
            Some(footer) => table.with_summary(footer),
            None => table,
        })
    }
}

pub fn load(path: &Path) -> Result<Table> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read table file {}", path.display()))?;
    TableFile::parse(&raw)
        .and_then(TableFile::into_table)
        .with_context(|| format!("load table file {}", path.display()))
}

fn locked_text() -> Formatter {
    Formatter::new("locked_text", |args| {
        Rendered::Text(format!("{LOCKED_MARK} {}", value_text(args.value)))
    })
}

fn changed_predicate(spec: ChangedSpec) -> ChangedPredicate {
    match spec {
        ChangedSpec::Numeric => ChangedPredicate::new(|original, new| {
            let original = value_text(original);
            match (original.trim().parse::<f64>(), new.parse::<f64>()) {
                (Ok(left), Ok(right)) => left != right,
                _ => original != new,
            }
        }),
        ChangedSpec::CaseInsensitive => ChangedPredicate::new(|original, new| {
            value_text(original).to_lowercase() != new.to_lowercase()
        }),
    }
}

fn unique_in_column() -> CustomCheck {
    CustomCheck::new(|field, scope| {
        if scope.value().is_empty() {
            return true;
        }
        let duplicate = scope
            .column_values(&field.column)
            .iter()
            .any(|(row, value)| *row != field.row && value == scope.value());
        if duplicate {
            scope.display_message(DUPLICATE_MESSAGE, StatusLevel::Warn);
        }
        !duplicate
    })
}
