use chrono::Utc;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, Field, Focus, InputMode, StatusLevel};
use crate::domain::detail::Pane;
use crate::domain::feed::feed_line;
use crate::domain::nav::ViewMode;
use crate::domain::tree::{ExploreScope, NodeKind, TreeRow, TreeStatus};
use crate::domain::write::{WriteMode, WritePhase};
use crate::infrastructure::api::{preview_value, KvEntry};

const TRUNCATED_NOTICE: &str = "Results truncated — narrow your query or use the API for full results";

pub fn draw(f: &mut Frame, app: &mut App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    match app.nav.view_mode {
        ViewMode::Tree => {
            draw_tree_panel(f, areas.tree, app);
            draw_detail_panel(f, areas.details, app);
        }
        ViewMode::Json => draw_json_panel(f, areas.main, app),
        ViewMode::Feed => draw_feed_panel(f, areas.main, app),
        ViewMode::Write => draw_write_panel(f, areas.main, app),
    }
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size);
    }
}

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().fg(Color::DarkGray))
}

fn key_hint(key: &str) -> Span<'static> {
    Span::styled(key.to_string(), Style::default().fg(Color::LightCyan))
}

fn field_span(app: &App, field: Field, value: &str, disabled: bool) -> Span<'static> {
    let editing = app.input_mode == InputMode::Edit(field);
    let text = if editing {
        format!("{value}_")
    } else if value.is_empty() {
        "--".to_string()
    } else {
        value.to_string()
    };
    let style = if editing {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else if disabled {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(Color::White)
    };
    Span::styled(text, style)
}

fn toggle_span(on: bool, text: &str) -> Span<'static> {
    let mark = if on { "[x] " } else { "[ ] " };
    let style = if on {
        Style::default().fg(Color::LightGreen)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!("{mark}{text}"), style)
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let form = &app.form;
    let fields = Line::from(vec![
        Span::styled(
            "kvgarden",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        label("Contract "),
        field_span(app, Field::Contract, &form.contract, form.all_contracts),
        Span::raw("  "),
        label("Account "),
        field_span(app, Field::Account, &form.account, form.all_accounts),
        Span::raw("  "),
        label("Key "),
        field_span(app, Field::Query, &form.query, false),
    ]);
    let toggles = Line::from(vec![
        toggle_span(form.all_contracts, "all contracts"),
        Span::raw("  "),
        toggle_span(form.all_accounts, "all accounts"),
    ]);

    let mut crumbs = vec![label("Path ")];
    if app.nav.breadcrumb.is_empty() {
        crumbs.push(Span::raw("/"));
    }
    for (i, segment) in app.nav.breadcrumb.iter().enumerate() {
        if i > 0 {
            crumbs.push(label(" / "));
        }
        crumbs.push(Span::raw(segment.clone()));
    }

    let left = Paragraph::new(Text::from(vec![fields, toggles, Line::from(crumbs)]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let mut tabs = Vec::new();
    for mode in ViewMode::ALL {
        let style = if mode == app.nav.view_mode {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        tabs.push(Span::styled(format!(" {} {} ", mode.shortcut(), mode.as_str()), style));
    }
    let wallet = match &app.wallet {
        Some(session) => Line::from(vec![
            label("Wallet "),
            Span::styled(session.account_id.clone(), Style::default().fg(Color::LightGreen)),
            label(" on "),
            Span::raw(session.contract.clone()),
        ]),
        None => Line::from(vec![label("Wallet "), Span::raw("not connected")]),
    };
    let right = Paragraph::new(Text::from(vec![Line::from(tabs), wallet]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn tree_title(app: &App) -> String {
    match app.tree.scope() {
        Some(ExploreScope::Contracts { account: Some(account) }) => format!("Contracts of {account}"),
        Some(ExploreScope::Contracts { account: None }) => "Contracts".to_string(),
        Some(ExploreScope::Accounts { contract }) => format!("Accounts on {contract}"),
        Some(ExploreScope::Account {
            account, contract, ..
        }) => format!("{account} @ {contract}"),
        None => "Explorer".to_string(),
    }
}

fn focus_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn placeholder(f: &mut Frame, area: Rect, block: Block, lines: Vec<Line>) {
    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_tree_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(tree_title(app))
        .border_style(focus_style(app, Focus::Tree));

    match app.tree.status() {
        TreeStatus::Idle => {
            return placeholder(f, area, block, vec![Line::from("press e to explore")]);
        }
        TreeStatus::Loading => return placeholder(f, area, block, vec![Line::from("loading...")]),
        TreeStatus::Failed(message) => {
            let heading = if app.nav.is_contract_discovery() {
                "Failed to fetch contracts"
            } else {
                "Failed to fetch data"
            };
            let lines = vec![
                Line::from(Span::styled(heading, Style::default().fg(Color::LightRed))),
                Line::from(label(message)),
                Line::from(vec![key_hint("r"), Span::raw(" retry")]),
            ];
            return placeholder(f, area, block, lines);
        }
        TreeStatus::Empty(empty) => {
            let mut lines = vec![Line::from(Span::styled(
                empty.heading(),
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            if let Some(detail) = empty.detail() {
                lines.push(Line::from(label(&detail)));
            }
            return placeholder(f, area, block, lines);
        }
        TreeStatus::Ready => {}
    }

    let rows = app.visible_rows();
    let mut items: Vec<ListItem> = rows.iter().map(|row| tree_item(app, row)).collect();
    if let Some(notice) = app.tree.cap_notice() {
        items.push(ListItem::new(Line::from(Span::styled(
            notice,
            Style::default().fg(Color::LightYellow),
        ))));
    }
    if app.tree.is_truncated() {
        items.push(ListItem::new(Line::from(Span::styled(
            TRUNCATED_NOTICE,
            Style::default().fg(Color::LightYellow),
        ))));
    }

    let highlight_style = if app.focus == Focus::Tree {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style)
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(app.tree_cursor.min(rows.len() - 1)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn tree_item(app: &App, row: &TreeRow) -> ListItem<'static> {
    match row {
        TreeRow::Notice { depth, text } => ListItem::new(Line::from(Span::styled(
            format!("{}{}", "  ".repeat(*depth), text),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))),
        TreeRow::Node { id, depth } => {
            let Some(node) = app.tree.node(*id) else {
                return ListItem::new("");
            };
            let indent = "  ".repeat(*depth);
            let mut spans = Vec::new();
            match &node.kind {
                NodeKind::Branch { .. } => {
                    let marker = if node.expanded { "▾ " } else { "▸ " };
                    spans.push(Span::raw(format!("{indent}{marker}")));
                    let style = if node.is_account_like() {
                        Style::default().fg(Color::LightBlue)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    spans.push(Span::styled(node.name.clone(), style));
                }
                NodeKind::Leaf { value } => {
                    spans.push(Span::raw(format!("{indent}  ")));
                    spans.push(Span::styled(node.name.clone(), Style::default().fg(Color::LightGreen)));
                    spans.push(label(" = "));
                    spans.push(Span::raw(preview_value(value, 48)));
                }
            }
            ListItem::new(Line::from(spans))
        }
    }
}

fn entry_lines(entry: &KvEntry) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = entry.display_value().lines().map(|l| Line::from(l.to_string())).collect();
    if entry.is_deleted {
        lines.push(Line::from(Span::styled("(deleted)", Style::default().fg(Color::LightRed))));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![label("Block "), Span::raw(entry.block_height.to_string())]));
    if let Some(ts) = entry.block_timestamp {
        lines.push(Line::from(vec![
            label("Age "),
            Span::raw(crate::domain::feed::time_ago(ts, Utc::now())),
        ]));
    }
    if let Some(writer) = &entry.writer_account_id {
        lines.push(Line::from(vec![label("Writer "), Span::raw(writer.clone())]));
    }
    if let Some(tx) = &entry.tx_hash {
        lines.push(Line::from(vec![label("Tx "), Span::raw(tx.clone())]));
    }
    lines
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(Color::LightCyan)
            .add_modifier(Modifier::BOLD),
    ))
}

fn detail_lines(app: &App) -> Vec<Line<'static>> {
    let detail = &app.detail;
    let Some(key) = detail.key() else {
        return vec![Line::from("select a key to see its value")];
    };
    let mut lines = vec![
        Line::from(Span::styled(key.display(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(vec![label("on "), Span::raw(key.contract.clone())]),
        Line::from(""),
    ];

    let history_len = detail.history().ready().map_or(0, |page| page.entries.len());
    match detail.history_cursor() {
        Some(i) => lines.push(section(&format!("Version {} of {}", i + 1, history_len))),
        None => lines.push(section("Value")),
    }
    match (detail.displayed_entry(), detail.value()) {
        (Some(entry), _) => lines.extend(entry_lines(entry)),
        (None, Pane::Loading) => {
            if let Some(preview) = detail.preview() {
                lines.push(Line::from(preview_value(preview, 200)));
            }
            lines.push(Line::from(label("loading...")));
        }
        (None, Pane::Ready(None)) => lines.push(Line::from(label("(not found)"))),
        (None, Pane::Failed(message)) => lines.push(Line::from(Span::styled(
            format!("failed: {message}"),
            Style::default().fg(Color::LightRed),
        ))),
        (None, _) => {}
    }

    lines.push(Line::from(""));
    lines.push(section("History"));
    match detail.history() {
        Pane::Idle => {}
        Pane::Loading => lines.push(Line::from(label("loading..."))),
        Pane::Failed(message) => lines.push(Line::from(label(&format!("failed: {message}")))),
        Pane::Ready(page) if page.entries.is_empty() => lines.push(Line::from(label("no versions"))),
        Pane::Ready(page) => {
            for (i, entry) in page.entries.iter().enumerate() {
                let marker = if detail.history_cursor() == Some(i) { "▸ " } else { "  " };
                lines.push(Line::from(vec![
                    Span::raw(marker),
                    label(&format!("block {:<12}", entry.block_height)),
                    Span::raw(preview_value(&entry.value, 40)),
                ]));
            }
            if page.has_more {
                lines.push(Line::from(label("more versions exist (y copies the API URL)")));
            }
        }
    }

    let (a, b) = detail.diff_endpoints();
    if a.is_some() || b.is_some() {
        let show = |block: Option<u64>| block.map_or("--".to_string(), |b| b.to_string());
        lines.push(Line::from(""));
        lines.push(section("Diff"));
        lines.push(Line::from(vec![
            label("A "),
            Span::raw(show(a)),
            label("  B "),
            Span::raw(show(b)),
        ]));
        match detail.diff() {
            Pane::Idle => {}
            Pane::Loading => lines.push(Line::from(label("diffing..."))),
            Pane::Failed(message) => lines.push(Line::from(label(&format!("failed: {message}")))),
            Pane::Ready(diff) if diff.is_unchanged() => {
                lines.push(Line::from(label("no changes between these blocks")));
            }
            Pane::Ready(diff) => {
                lines.push(Line::from(Span::styled(
                    format!("- @{}: {}", diff.block_a, diff.a.render()),
                    Style::default().fg(Color::LightRed),
                )));
                lines.push(Line::from(Span::styled(
                    format!("+ @{}: {}", diff.block_b, diff.b.render()),
                    Style::default().fg(Color::LightGreen),
                )));
            }
        }
    }

    match detail.writers() {
        Pane::Idle => {}
        pane => {
            lines.push(Line::from(""));
            lines.push(section("Writers"));
            match pane {
                Pane::Loading => lines.push(Line::from(label("loading..."))),
                Pane::Failed(message) => lines.push(Line::from(label(&format!("failed: {message}")))),
                Pane::Ready(writers) if writers.is_empty() => lines.push(Line::from(label("none"))),
                Pane::Ready(writers) => {
                    for entry in writers {
                        lines.push(Line::from(vec![
                            Span::raw(entry.writer_account_id.clone().unwrap_or_default()),
                            label(&format!("  block {}  ", entry.block_height)),
                            Span::raw(preview_value(&entry.value, 32)),
                        ]));
                    }
                }
                Pane::Idle => {}
            }
        }
    }
    lines
}

fn draw_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let paragraph = Paragraph::new(Text::from(detail_lines(app)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Detail")
                .border_style(focus_style(app, Focus::Detail)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_json_panel(f: &mut Frame, area: Rect, app: &App) {
    let paragraph = Paragraph::new(app.json_text())
        .block(Block::default().borders(Borders::ALL).title("JSON"))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_feed_panel(f: &mut Frame, area: Rect, app: &App) {
    let title = match (app.nav.account(), app.nav.contract_id.as_deref()) {
        (Some(account), Some(contract)) => format!("Recent activity: {account} @ {contract}"),
        (None, Some(contract)) => format!("Recent activity on {contract}"),
        _ => "Recent activity".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    if let Some(message) = app.feed.message() {
        return placeholder(f, area, block, vec![Line::from(message)]);
    }
    let Some(entries) = app.feed.entries().ready() else {
        return placeholder(f, area, block, vec![Line::from("press 3 to load the feed")]);
    };

    let now = Utc::now();
    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            let (key, age, preview, block) = feed_line(entry, now);
            ListItem::new(Line::from(vec![
                Span::styled(key, Style::default().fg(Color::LightGreen)),
                Span::raw("  "),
                label(&age),
                Span::raw("  "),
                Span::raw(preview),
                Span::raw("  "),
                label(&block),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    let mut state = ListState::default();
    state.select(Some(app.feed.cursor()));
    f.render_stateful_widget(list, area, &mut state);
}

fn write_lines(app: &App) -> Vec<Line<'static>> {
    let form = &app.write.form;
    let mut lines = Vec::new();
    let contract = app.target_contract().unwrap_or_else(|| "--".to_string());
    lines.push(Line::from(vec![label("Contract "), Span::raw(contract)]));
    let mode = match form.mode {
        WriteMode::Single => "single key",
        WriteMode::Batch => "batch",
    };
    lines.push(Line::from(vec![label("Mode "), Span::raw(mode), label("  (m to switch)")]));
    lines.push(Line::from(""));

    match form.mode {
        WriteMode::Single => {
            lines.push(Line::from(vec![
                key_hint("k "),
                label("Key   "),
                field_span(app, Field::WriteKey, &form.key, false),
            ]));
            lines.push(Line::from(vec![
                key_hint("v "),
                label("Value "),
                field_span(app, Field::WriteValue, &form.value, false),
            ]));
        }
        WriteMode::Batch => {
            lines.push(Line::from(vec![
                key_hint("b "),
                label("JSON  "),
                field_span(app, Field::WriteBatch, &form.batch_json, false),
            ]));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        app.write_preview(),
        Style::default().fg(Color::LightBlue),
    )));
    if app.wallet.is_none() {
        lines.push(Line::from(label("connect a wallet with :connect <account> to sign")));
    }
    lines.push(Line::from(""));

    let phase = app.write.phase();
    let color = match phase {
        WritePhase::Invalid(_) | WritePhase::Failed(_) => Color::LightRed,
        WritePhase::Rejected | WritePhase::TimedOut => Color::LightYellow,
        WritePhase::Confirmed => Color::LightGreen,
        _ => Color::White,
    };
    let status = phase.status_line();
    if !status.is_empty() {
        lines.push(Line::from(Span::styled(status, Style::default().fg(color))));
    }
    if let Some(tx) = &app.last_tx {
        lines.push(Line::from(vec![label("Tx "), Span::raw(app.config.tx_link(tx))]));
    }
    if let Some(location) = app.write.written() {
        lines.push(Line::from(vec![
            key_hint("o"),
            Span::raw(format!(" view {} / {}", location.account, location.key)),
        ]));
    }
    lines
}

fn draw_write_panel(f: &mut Frame, area: Rect, app: &App) {
    let paragraph = Paragraph::new(Text::from(write_lines(app)))
        .block(Block::default().borders(Borders::ALL).title("Write"))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![label("View "), Span::raw(format!("{}  ", app.view_string()))];
    if app.inspector_open {
        spans.push(label("API "));
        spans.push(Span::raw(
            app.inspector_summary()
                .unwrap_or_else(|| "no calls yet".to_string()),
        ));
    }
    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("contract", "Explore a contract"),
        ("account", "Explore one account"),
        ("key", "Filter by key prefix (foo/**)"),
        ("all", "All accounts / all contracts"),
        ("view", "Switch view: tree json feed write"),
        ("open", "Open a view string"),
        ("diff", "Diff two block heights"),
        ("writers", "Who wrote this key"),
        ("connect", "Connect a wallet account"),
        ("disconnect", "Forget the wallet session"),
        ("curl", "Copy the last API call as curl"),
        ("share", "Copy the current view string"),
        ("quit", "Quit"),
    ];

    for (cmd, desc) in commands {
        if cmd.starts_with(&input) {
            return Some(desc);
        }
    }
    None
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint_text = command_hint(&app.command.input).unwrap_or("contract account key view open diff");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.clone()),
                Span::styled(
                    format!("  {}", hint_text),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        InputMode::Edit(field) => Line::from(vec![
            Span::styled(format!("> {} ", field.label()), Style::default().fg(Color::LightCyan)),
            Span::styled("(Enter=ok Esc=cancel)", Style::default().fg(Color::DarkGray)),
        ]),
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    StatusLevel::Info => Color::LightGreen,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text.to_string(), Style::default().fg(color)),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let mut spans = vec![
        key_hint("1-4"),
        Span::raw(" View  "),
        key_hint("c a /"),
        Span::raw(" Edit  "),
        key_hint(":"),
        Span::raw(" Command  "),
        key_hint("?"),
        Span::raw(" Help  "),
    ];
    match app.nav.view_mode {
        ViewMode::Tree if app.focus == Focus::Detail => spans.extend([
            key_hint("d"),
            Span::raw(" Diff  "),
            key_hint("w"),
            Span::raw(" Writers  "),
            key_hint("y/Y"),
            Span::raw(" Copy URL/curl  "),
        ]),
        ViewMode::Tree => spans.extend([
            key_hint("Enter"),
            Span::raw(" Open  "),
            key_hint("g"),
            Span::raw(" Go  "),
            key_hint("Tab"),
            Span::raw(" Focus  "),
        ]),
        ViewMode::Feed => spans.extend([key_hint("Enter"), Span::raw(" Open key  ")]),
        ViewMode::Write => spans.extend([
            key_hint("Enter"),
            Span::raw(" Sign  "),
            key_hint("m"),
            Span::raw(" Mode  "),
        ]),
        ViewMode::Json => {}
    }
    Line::from(spans)
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(72, 70, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Explore"),
        Line::from("  c / a / /  Edit contract / account / key"),
        Line::from("  C / A      Toggle all contracts / all accounts"),
        Line::from("  e / r      Explore / retry"),
        Line::from("  1-4        Tree / JSON / Feed / Write"),
        Line::from("  Backspace  Up one breadcrumb level"),
        Line::from(""),
        Line::from("Tree"),
        Line::from("  j / k      Move selection"),
        Line::from("  Enter / l  Expand or open value"),
        Line::from("  h          Collapse"),
        Line::from("  g          Go to contract / account"),
        Line::from("  Tab        Tree / detail focus"),
        Line::from(""),
        Line::from("Detail"),
        Line::from("  j / k      Step through history"),
        Line::from("  d          Diff selected versions"),
        Line::from("  [ / ]      Move A older / newer"),
        Line::from("  { / }      Move B older / newer"),
        Line::from("  w          Writers of this key"),
        Line::from("  y / Y      Copy API URL / curl"),
        Line::from(""),
        Line::from("Write"),
        Line::from("  k / v / b  Edit key / value / batch JSON"),
        Line::from("  m          Single / batch"),
        Line::from("  Enter      Sign and send"),
        Line::from("  o          View written data"),
        Line::from(""),
        Line::from("  i          API inspector"),
        Line::from("  s          Copy view string"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
