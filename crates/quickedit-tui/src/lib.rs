// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use log::{debug, info, warn};
use quickedit_app::{
    Change, FieldId, FieldKind, FieldRef, NavDirection, NavKey, QuickEdit, RenderContext,
    Rendered, RowIndex, SortDirection, StatusLevel, TableHost, copy_down, navigate,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::time::Duration;

const SORT_MARK_ASC: &str = "▲";
const SORT_MARK_DESC: &str = "▼";
const COPY_DOWN_MARK: &str = "⇣";
const NEWLINE_MARK: &str = " ⏎ ";
const ERRORS_BANNER: &str = "some fields need attention";
const VIEW_HINTS: &str = "h/l j/k move | s sort | e edit | ? help | q quit";
const EDIT_HINTS: &str =
    "tab/shift+tab field | ctrl+↑/↓ row | ctrl+d copy down | ctrl+v check | ctrl+s save | esc cancel";

#[derive(Debug, Clone, PartialEq, Eq)]
struct TerminalField {
    field: FieldRef,
    value: String,
    copy_down: bool,
}

/// Field registry and edit chrome for the terminal table.
#[derive(Debug, Default)]
pub struct TerminalHost {
    fields: Vec<TerminalField>,
    next_field: usize,
    focused: Option<FieldId>,
    editing: bool,
    navigation_bound: bool,
    needs_render: bool,
    scroll_row: Option<RowIndex>,
    banner: Option<String>,
    // Focused contents are selected; the next edit replaces them.
    selected: bool,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Rebuilds the fields from the editor's current formatters, keeping
    /// focus on the same cell when it still exists.
    pub fn sync(&mut self, editor: &QuickEdit) {
        let focused_cell = self.focused_field().map(|field| field.field.cell());
        self.fields.clear();
        self.needs_render = false;

        if editor.is_editing() {
            let table = editor.table();
            for row in (0..table.row_count()).map(RowIndex::new) {
                for (index, column) in table.columns().iter().enumerate() {
                    let Some(Rendered::Field(template)) =
                        editor.render_cell(RenderContext::DataRow(row), index)
                    else {
                        continue;
                    };
                    let id = FieldId::new(self.next_field);
                    self.next_field += 1;
                    self.fields.push(TerminalField {
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

        let kept = focused_cell
            .and_then(|cell| self.field_at(cell.row, cell.column.as_str()))
            .map(|field| field.id);
        self.selected &= kept.is_some();
        self.focused = kept.or_else(|| self.fields.first().map(|field| field.field.id));
        debug!("synced {} fields", self.fields.len());
    }

    fn focused_field(&self) -> Option<&TerminalField> {
        let focused = self.focused?;
        self.fields.iter().find(|field| field.field.id == focused)
    }

    fn focused_field_mut(&mut self) -> Option<&mut TerminalField> {
        let focused = self.focused?;
        self.fields.iter_mut().find(|field| field.field.id == focused)
    }

    fn field_for(&self, row: RowIndex, column: &str) -> Option<&TerminalField> {
        self.fields
            .iter()
            .find(|field| field.field.row == row && field.field.column.as_str() == column)
    }

    fn cycle_focus(&mut self, delta: isize) {
        if self.fields.is_empty() {
            return;
        }
        let len = self.fields.len() as isize;
        let next = match self
            .focused
            .and_then(|id| self.fields.iter().position(|field| field.field.id == id))
        {
            Some(current) => (current as isize + delta).rem_euclid(len),
            None => 0,
        };
        let id = self.fields[next as usize].field.id;
        self.focus_field(id);
    }

    /// Applies a text edit to the focused field. Choice fields only change
    /// through `cycle_choice`.
    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        let selected = std::mem::take(&mut self.selected);
        let Some(field) = self.focused_field_mut() else {
            return;
        };
        if matches!(field.field.kind, FieldKind::Choice(_)) {
            return;
        }
        if selected {
            field.value.clear();
        }
        edit(&mut field.value);
    }

    fn cycle_choice(&mut self, delta: isize) {
        self.selected = false;
        let Some(field) = self.focused_field_mut() else {
            return;
        };
        let FieldKind::Choice(choices) = &field.field.kind else {
            return;
        };
        if choices.is_empty() {
            return;
        }
        let len = choices.len() as isize;
        let next = match choices.iter().position(|choice| *choice == field.value) {
            Some(current) => (current as isize + delta).rem_euclid(len),
            None if delta < 0 => len - 1,
            None => 0,
        };
        field.value = choices[next as usize].clone();
    }
}

impl TableHost for TerminalHost {
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
        self.selected = true;
        self.scroll_row = None;
    }

    fn scroll_to_row(&mut self, row: RowIndex) {
        self.scroll_row = Some(row);
    }

    fn set_edit_marker(&mut self, editing: bool) {
        self.editing = editing;
    }

    fn bind_navigation(&mut self, bound: bool) {
        self.navigation_bound = bound;
    }

    fn request_render(&mut self) {
        self.needs_render = true;
    }

    fn clear_notifications(&mut self) {
        self.banner = None;
    }

    fn notify_errors(&mut self) {
        self.banner = Some(ERRORS_BANNER.to_owned());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SortSpec {
    column: usize,
    direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct TableUiState {
    selected_row: usize,
    selected_col: usize,
    sort: Option<SortSpec>,
}

#[derive(Debug, Default)]
struct ViewData {
    host: TerminalHost,
    table_state: TableUiState,
    status_line: Option<String>,
    help_visible: bool,
    saved: Option<Vec<Change>>,
}

/// Runs the table until the user quits. Returns every change saved with
/// ctrl+s during the run, merged per row, if anything was saved.
pub fn run_app(editor: &mut QuickEdit) -> Result<Option<Vec<Change>>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let result = event_loop(&mut terminal, editor, &mut view_data);

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result?;
    Ok(view_data.saved)
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    editor: &mut QuickEdit,
    view_data: &mut ViewData,
) -> Result<()> {
    loop {
        terminal
            .draw(|frame| render(frame, editor, view_data))
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(120)).context("poll event")? {
            continue;
        }
        if let Event::Key(key) = event::read().context("read event")?
            && handle_key_event(editor, view_data, key)
        {
            return Ok(());
        }
    }
}

fn handle_key_event(editor: &mut QuickEdit, view_data: &mut ViewData, key: KeyEvent) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        view_data.help_visible = false;
        return false;
    }

    let should_quit = if editor.is_editing() {
        handle_edit_key(editor, view_data, key);
        false
    } else {
        handle_view_key(editor, view_data, key)
    };

    if view_data.host.needs_render {
        view_data.host.sync(editor);
    }
    should_quit
}

fn handle_view_key(editor: &mut QuickEdit, view_data: &mut ViewData, key: KeyEvent) -> bool {
    let rows = editor.table().row_count();
    let columns = editor.table().columns().len();
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Char('e') => {
            let status = match editor.start(&mut view_data.host) {
                Ok(()) => "editing".to_owned(),
                Err(error) => error.to_string(),
            };
            view_data.status_line = Some(status);
        }
        KeyCode::Char('s') => {
            let status = cycle_sort(editor, &mut view_data.table_state, &mut view_data.saved);
            view_data.status_line = Some(status);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.table_state.selected_row = step(view_data.table_state.selected_row, 1, rows);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.table_state.selected_row = step(view_data.table_state.selected_row, -1, rows);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            view_data.table_state.selected_col =
                step(view_data.table_state.selected_col, 1, columns);
        }
        KeyCode::Char('h') | KeyCode::Left => {
            view_data.table_state.selected_col =
                step(view_data.table_state.selected_col, -1, columns);
        }
        _ => {}
    }
    false
}

fn handle_edit_key(editor: &mut QuickEdit, view_data: &mut ViewData, key: KeyEvent) {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    let nav_key = match key.code {
        KeyCode::Up => NavKey::Up,
        KeyCode::Down => NavKey::Down,
        _ => NavKey::Other,
    };
    if view_data.host.navigation_bound
        && let Some(direction) = NavDirection::from_key(nav_key, control)
    {
        if let Some(from) = view_data.host.focused {
            navigate(&mut view_data.host, from, direction);
        }
        return;
    }

    match (key.code, control) {
        (KeyCode::Esc, _) => {
            let status = match editor.cancel(&mut view_data.host) {
                Ok(()) => "edits discarded".to_owned(),
                Err(error) => error.to_string(),
            };
            view_data.status_line = Some(status);
        }
        (KeyCode::Char('s'), true) => save_changes(editor, view_data),
        (KeyCode::Char('v'), true) => {
            let status = if editor.validate(&mut view_data.host) {
                view_data.host.clear_notifications();
                "all fields valid"
            } else {
                "fix highlighted fields"
            };
            view_data.status_line = Some(status.to_owned());
        }
        (KeyCode::Char('d'), true) => copy_focused_down(view_data),
        (KeyCode::Tab, _) => view_data.host.cycle_focus(1),
        (KeyCode::BackTab, _) => view_data.host.cycle_focus(-1),
        (KeyCode::Left, false) => view_data.host.cycle_choice(-1),
        (KeyCode::Right, false) => view_data.host.cycle_choice(1),
        (KeyCode::Backspace, _) => view_data.host.edit_focused(|value| {
            value.pop();
        }),
        (KeyCode::Enter, _) => {
            let multi_line = view_data
                .host
                .focused_field()
                .is_some_and(|field| field.field.kind == FieldKind::MultiLine);
            if multi_line {
                view_data.host.edit_focused(|value| value.push('\n'));
            } else {
                view_data.host.cycle_focus(1);
            }
        }
        (KeyCode::Char(ch), false) => view_data.host.edit_focused(|value| value.push(ch)),
        _ => {}
    }
}

fn save_changes(editor: &mut QuickEdit, view_data: &mut ViewData) {
    let Some(changes) = editor.get_changes(&mut view_data.host) else {
        view_data.status_line = Some("fix highlighted fields before saving".to_owned());
        return;
    };

    let edited = edited_rows(editor, &changes);
    info!("saved changes for {edited} rows");
    if let Err(error) = editor.cancel(&mut view_data.host) {
        warn!("leave edit mode after save: {error}");
    }
    if editor.apply_changes(&changes).is_none() {
        warn!("saved changes not applied: still editing");
    }
    merge_saved(&mut view_data.saved, changes);
    view_data.status_line = Some(format!("saved {edited} changed rows"));
}

// Later saves win per key; rows stay aligned with the table.
fn merge_saved(saved: &mut Option<Vec<Change>>, changes: Vec<Change>) {
    let Some(merged) = saved else {
        *saved = Some(changes);
        return;
    };
    for (row, change) in merged.iter_mut().zip(changes) {
        row.extend(change);
    }
}

// Rows with at least one key beyond the always-included ones.
fn edited_rows(editor: &QuickEdit, changes: &[Change]) -> usize {
    let always = &editor.options().changes_always_include;
    changes
        .iter()
        .filter(|change| {
            change
                .keys()
                .any(|key| !always.iter().any(|included| included.as_str() == key))
        })
        .count()
}

fn copy_focused_down(view_data: &mut ViewData) {
    let Some(start) = view_data
        .host
        .focused_field()
        .filter(|field| field.copy_down)
        .map(|field| field.field.cell())
    else {
        view_data.status_line = Some("copy down starts from a marked first-row field".to_owned());
        return;
    };
    let written = copy_down(&mut view_data.host, &start);
    view_data.status_line = Some(format!("copied to {written} rows"));
}

fn cycle_sort(
    editor: &mut QuickEdit,
    table_state: &mut TableUiState,
    saved: &mut Option<Vec<Change>>,
) -> String {
    let column_index = table_state.selected_col;
    let Some(column) = editor
        .table()
        .columns()
        .get(column_index)
        .filter(|column| column.sortable)
    else {
        return "sort unavailable".to_owned();
    };
    let key = column.key.clone();
    let label = column.label.clone();
    let direction = match table_state.sort {
        Some(spec) if spec.column == column_index => spec.direction.flipped(),
        _ => SortDirection::Asc,
    };

    let Some(order) = editor
        .table_mut()
        .and_then(|table| table.sort_rows(&key, direction))
    else {
        return "sort unavailable".to_owned();
    };
    if let Some(saved) = saved.as_mut() {
        let mut rows = std::mem::take(saved).into_iter().map(Some).collect::<Vec<_>>();
        *saved = order
            .iter()
            .filter_map(|&index| rows.get_mut(index).and_then(Option::take))
            .collect();
    }
    table_state.sort = Some(SortSpec {
        column: column_index,
        direction,
    });
    let status = match direction {
        SortDirection::Asc => format!("sort {label} asc"),
        SortDirection::Desc => format!("sort {label} desc"),
    };
    debug!("{status}");
    status
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

/// First visible row so that `anchor` lands inside a window of `height`.
fn visible_start(anchor: Option<usize>, height: usize, total: usize) -> usize {
    let height = height.max(1);
    let max_start = total.saturating_sub(height);
    match anchor {
        Some(row) if row >= height => (row + 1 - height).min(max_start),
        _ => 0,
    }
}

fn render(frame: &mut ratatui::Frame<'_>, editor: &QuickEdit, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let title_style = if view_data.host.banner().is_some() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let title = Paragraph::new(title_text(editor, view_data))
        .style(title_style)
        .block(Block::default().title("quickedit").borders(Borders::ALL));
    frame.render_widget(title, layout[0]);

    render_table(frame, layout[1], editor, view_data);

    let status = Paragraph::new(status_text(editor, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    editor: &QuickEdit,
    view_data: &ViewData,
) {
    let table = editor.table();
    let columns = table.columns();
    let widths = vec![Constraint::Min(8); columns.len().max(1)];

    let header = Row::new(columns.iter().enumerate().map(|(index, column)| {
        Cell::from(header_label(&column.label, index, &view_data.table_state)).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    // Borders, header and footer take four lines.
    let height = usize::from(area.height.saturating_sub(4));
    let anchor = if editor.is_editing() {
        view_data
            .host
            .scroll_row
            .or_else(|| view_data.host.focused_field().map(|field| field.field.row))
            .map(RowIndex::get)
    } else {
        Some(view_data.table_state.selected_row)
    };
    let start = visible_start(anchor, height, table.row_count());
    let end = table.row_count().min(start + height.max(1));
    let rows = (start..end)
        .map(RowIndex::new)
        .map(|row| render_row(editor, view_data, row));

    let mut widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(editor, view_data))
                .borders(Borders::ALL),
        );
    if table.summary().is_some() {
        let cells = (0..columns.len()).map(|index| {
            let text = editor
                .render_cell(RenderContext::Summary, index)
                .map(|rendered| display_text(rendered.text()))
                .unwrap_or_default();
            Cell::from(text)
        });
        widget = widget.footer(
            Row::new(cells).style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            ),
        );
    }
    frame.render_widget(widget, area);
}

fn render_row(editor: &QuickEdit, view_data: &ViewData, row: RowIndex) -> Row<'static> {
    let host = &view_data.host;
    let row_marker = editor.status().row(row);
    let selected_row = !editor.is_editing() && row.get() == view_data.table_state.selected_row;

    let cells = editor
        .table()
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let field = host.field_for(row, column.key.as_str());
            let text = match field {
                Some(field) => field_text(field),
                None => editor
                    .render_cell(RenderContext::DataRow(row), index)
                    .map(|rendered| display_text(rendered.text()))
                    .unwrap_or_default(),
            };

            let mut style = Style::default();
            if let Some(marker) = row_marker {
                style = style.fg(level_color(marker.level));
            }
            if let Some(field) = field
                && let Some(marker) = editor.status().cell(&field.field.cell())
            {
                style = Style::default()
                    .fg(Color::Black)
                    .bg(level_color(marker.level));
            }
            if selected_row {
                style = style.bg(Color::DarkGray);
                if index == view_data.table_state.selected_col {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
            }
            if field.is_some_and(|field| host.focused == Some(field.field.id)) {
                style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            }
            Cell::from(text).style(style)
        })
        .collect::<Vec<_>>();
    Row::new(cells)
}

fn field_text(field: &TerminalField) -> String {
    let value = display_text(&field.value);
    let mut text = match field.field.kind {
        FieldKind::Choice(_) => format!("‹{value}›"),
        FieldKind::SingleLine | FieldKind::MultiLine => format!("[{value}]"),
    };
    if field.copy_down {
        text.push(' ');
        text.push_str(COPY_DOWN_MARK);
    }
    text
}

fn display_text(text: &str) -> String {
    text.replace('\n', NEWLINE_MARK)
}

fn level_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Error => Color::Red,
        StatusLevel::Warn => Color::Yellow,
        StatusLevel::Success => Color::Green,
        StatusLevel::Info => Color::Blue,
    }
}

fn header_label(label: &str, column: usize, table_state: &TableUiState) -> String {
    match table_state.sort {
        Some(spec) if spec.column == column => {
            let mark = match spec.direction {
                SortDirection::Asc => SORT_MARK_ASC,
                SortDirection::Desc => SORT_MARK_DESC,
            };
            format!("{label} {mark}")
        }
        _ => label.to_owned(),
    }
}

fn title_text(editor: &QuickEdit, view_data: &ViewData) -> String {
    let mut title = if view_data.host.is_editing() {
        "editing".to_owned()
    } else {
        "viewing".to_owned()
    };
    if let Some(banner) = view_data.host.banner() {
        title.push_str(" | ");
        title.push_str(banner);
    }
    if !editor.is_editing() && view_data.saved.is_some() {
        title.push_str(" | changes saved");
    }
    title
}

fn table_title(editor: &QuickEdit, view_data: &ViewData) -> String {
    let rows = editor.table().row_count();
    let sort = view_data.table_state.sort.and_then(|spec| {
        let column = editor.table().columns().get(spec.column)?;
        let direction = match spec.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        Some(format!(" sorted by {} {direction}", column.label))
    });
    format!("{rows} rows{}", sort.unwrap_or_default())
}

fn status_text(editor: &QuickEdit, view_data: &ViewData) -> String {
    let (mode, hints) = if editor.is_editing() {
        ("EDIT", EDIT_HINTS)
    } else {
        ("VIEW", VIEW_HINTS)
    };

    let mut parts = vec![mode.to_owned()];
    if let Some(status) = &view_data.status_line {
        parts.push(status.clone());
    }
    if let Some(marker) = view_data
        .host
        .focused_field()
        .and_then(|field| editor.status().cell(&field.field.cell()))
        .filter(|marker| !marker.message.is_empty())
    {
        parts.push(format!("{}: {}", marker.level.as_str(), marker.message));
    }
    parts.push(hints.to_owned());
    parts.join(" | ")
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help\n\
view: h/l j/k move | s sort column | e edit | q quit\n\
edit: tab/shift+tab field | ctrl+up/down same field in next row | enter next field\n\
edit: left/right cycle choice | ctrl+d copy first row down | ctrl+v check\n\
edit: ctrl+s save and leave | esc discard and leave"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
