use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, InputMode, LoginField, Screen};
use crate::filter::{resolve, ViewFilter};
use crate::gateway::TodoGateway;
use crate::state::LoadPhase;

const ACCENT: Color = Color::Magenta;

pub fn ui<G: TodoGateway + 'static>(f: &mut Frame, app: &mut App<G>) {
    match app.screen {
        Screen::Checking => {
            let area = centered_rect(40, 3, f.area());
            let p = Paragraph::new("Checking session...")
                .style(Style::default().fg(ACCENT))
                .block(Block::default().borders(Borders::ALL).title("todust"));
            f.render_widget(p, area);
        }
        Screen::Login => draw_login(f, app),
        Screen::Tasks => draw_tasks(f, app),
    }
}

fn draw_login<G: TodoGateway + 'static>(f: &mut Frame, app: &App<G>) {
    let area = centered_rect(60, 11, f.area());
    f.render_widget(Clear, area);
    let outer = Block::default()
        .borders(Borders::ALL)
        .title("todust - Please log in to your account");
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Length(1), // Error
            Constraint::Length(1), // Help
        ])
        .split(inner);

    let field_style = |field: LoginField| {
        if app.login.field == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };
    let email = Paragraph::new(app.login.email.as_str())
        .style(field_style(LoginField::Email))
        .block(Block::default().borders(Borders::ALL).title("Email"));
    let masked = "*".repeat(app.login.password.chars().count());
    let password = Paragraph::new(masked)
        .style(field_style(LoginField::Password))
        .block(Block::default().borders(Borders::ALL).title("Password"));
    f.render_widget(email, rows[0]);
    f.render_widget(password, rows[1]);

    if let Some(err) = &app.login.error {
        f.render_widget(Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)), rows[2]);
    } else if app.login.pending {
        f.render_widget(Paragraph::new("Logging in...").style(Style::default().fg(ACCENT)), rows[2]);
    }
    f.render_widget(
        Paragraph::new("Tab: Switch Field | Enter: Login | Esc: Quit").style(Style::default().fg(Color::Gray)),
        rows[3],
    );
}

fn draw_tasks<G: TodoGateway + 'static>(f: &mut Frame, app: &mut App<G>) {
    let filter = app.filter();
    let spec = resolve(filter);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(20), Constraint::Min(0)])
        .split(f.area());

    draw_sidebar(f, columns[0], filter);

    let mut constraints = vec![Constraint::Length(4)]; // Heading
    if spec.shows_add {
        constraints.push(Constraint::Length(3)); // Add box
    }
    constraints.push(Constraint::Min(0)); // Tasks
    constraints.push(Constraint::Length(3)); // Help
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(columns[1]);

    let count = app.manager.list().tasks().len();
    let header = Paragraph::new(vec![
        Line::from(Span::styled(spec.heading, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(filter.summary(count)),
    ])
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let mut next = 1;
    if spec.shows_add {
        let (title, style) = if app.adding {
            ("Adding...", Style::default().fg(Color::DarkGray))
        } else if app.input_mode == InputMode::Adding {
            ("Add a new task (Enter: Add | Esc: Done)", Style::default().fg(Color::Yellow))
        } else {
            ("Add a new task (a)", Style::default().fg(Color::Gray))
        };
        let add = Paragraph::new(app.add_buffer.as_str())
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(add, chunks[next]);
        next += 1;
    }

    draw_task_table(f, chunks[next], app, filter);
    next += 1;

    let help_text = match app.input_mode {
        InputMode::Normal if filter == ViewFilter::Trash => {
            "q: Quit | 1-4/Tab: View | r: Restore | d: Delete Forever | L: Logout"
        }
        InputMode::Normal => "q: Quit | 1-4/Tab: View | a: Add | Space: Toggle | e: Edit | d: Delete | L: Logout",
        InputMode::Adding => "Enter: Add | Esc: Back",
        InputMode::Editing => "Enter: Save | Esc: Cancel | Up/Down: Save and Move",
        InputMode::ConfirmLogout => "y: Logout | n: Stay",
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[next]);

    if app.input_mode == InputMode::ConfirmLogout {
        let area = centered_rect(50, 3, f.area());
        f.render_widget(Clear, area);
        let confirm = Paragraph::new(format!("{} [y/N]", crate::manager::LOGOUT_PROMPT))
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("Logout"));
        f.render_widget(confirm, area);
    }
}

fn draw_sidebar(f: &mut Frame, area: Rect, active: ViewFilter) {
    let items: Vec<ListItem> = ViewFilter::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let style = if *v == active {
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(format!("{} {}", i + 1, v.label())).style(style)
        })
        .collect();
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("todust"));
    f.render_widget(list, area);
}

fn draw_task_table<G: TodoGateway + 'static>(f: &mut Frame, area: Rect, app: &mut App<G>, filter: ViewFilter) {
    let spec = resolve(filter);
    let block = Block::default().borders(Borders::ALL).title("Tasks");
    let (phase, tasks) = {
        let list = app.manager.list();
        (list.phase(), list.tasks().to_vec())
    };

    if phase == LoadPhase::Loading || phase == LoadPhase::Idle {
        let p = Paragraph::new("Loading your tasks...").style(Style::default().fg(ACCENT)).block(block);
        f.render_widget(p, area);
        return;
    }
    if tasks.is_empty() {
        let p = Paragraph::new(spec.empty_message).style(Style::default().fg(Color::Gray)).block(block);
        f.render_widget(p, area);
        return;
    }

    let trash = filter == ViewFilter::Trash;
    let rows: Vec<Row> = tasks
        .iter()
        .map(|t| {
            let check = if trash {
                ""
            } else if t.completed {
                "[x]"
            } else {
                "[ ]"
            };
            let (text, style) = match app.edit.buffer() {
                Some(buffer) if app.edit.is_editing(&t.id) => {
                    (format!("{buffer}_"), Style::default().fg(Color::Yellow))
                }
                _ if t.completed => (
                    t.text.clone(),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT),
                ),
                _ => (t.text.clone(), Style::default()),
            };
            Row::new(vec![Cell::from(check), Cell::from(text)]).style(style)
        })
        .collect();

    let widths = [Constraint::Length(4), Constraint::Min(20)];
    let table = Table::new(rows, widths)
        .block(block)
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
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
