use crate::application::{App, AppMode};
use crate::domain::{FieldDefinition, FieldKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_form(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);

    if matches!(app.mode, AppMode::Help) {
        render_help_popup(f, app);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let current = app.wizard.current_step();
    let mut spans = vec![Span::styled(
        format!("Job application | Step {} of {} |", current, app.wizard.step_count()),
        Style::default().fg(Color::Cyan),
    )];

    for step in app.wizard.steps().steps() {
        let style = if step.id < current {
            Style::default().fg(Color::Green)
        } else if step.id == current {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let marker = if step.id < current { "✓" } else { " " };
        spans.push(Span::styled(format!(" {}{} ", marker, step.id), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.wizard.current_step_definition() {
        Some(step) => format!(
            "Step {} of {}: {}",
            step.id,
            app.wizard.step_count(),
            step.title
        ),
        None => "Application".to_string(),
    };

    let mut lines = Vec::new();
    for (index, name) in app.wizard.current_fields().iter().enumerate() {
        let Some(field) = app.wizard.schema().field(name) else {
            continue;
        };
        let focused = index == app.focused;

        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let required = if field.required { " *" } else { "" };
        lines.push(Line::from(Span::styled(
            format!("{}{}", field.label, required),
            label_style,
        )));

        let input_style = if focused {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("  {}", input_text(app, field, focused)),
            input_style,
        )));

        if let Some(error) = app.wizard.error_for(name) {
            lines.push(Line::from(Span::styled(
                format!("  {}", error),
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::default());
    }

    let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(form, area);
}

/// How the value of `field` reads inside its input line.
fn input_text(app: &App, field: &FieldDefinition, focused: bool) -> String {
    let value = app.wizard.value(&field.name);
    match &field.kind {
        FieldKind::Boolean => {
            let checked = value.as_bool().unwrap_or(false);
            format!("[{}]", if checked { "x" } else { " " })
        }
        FieldKind::Enum { .. } => format!("< {} >", value.to_display_string()),
        FieldKind::Date => {
            let typed = app.display_value(&field.name);
            if typed.is_empty() && !focused {
                "dd.mm.yyyy".to_string()
            } else if focused {
                format!("{}_", typed)
            } else {
                typed
            }
        }
        _ => {
            let typed = app.display_value(&field.name);
            if focused { format!("{}_", typed) } else { typed }
        }
    }
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let status_text = match app.mode {
        AppMode::Form => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else if app.wizard.is_last_step() {
                "Enter: submit | Ctrl+B: back | Ctrl+R: clear form | F1: help | Esc: quit".to_string()
            } else {
                "Enter: next step | Ctrl+B: back | Ctrl+R: clear form | F1: help | Esc: quit".to_string()
            }
        }
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
    };

    let status_style = match app.mode {
        AppMode::Form if app.is_submitting() => Style::default().fg(Color::Magenta),
        AppMode::Form if !app.wizard.field_errors().is_empty() => Style::default().fg(Color::Red),
        AppMode::Form => Style::default(),
        AppMode::Help => Style::default().fg(Color::Cyan),
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style);
    f.render_widget(status, area);
}

/// Centered help over the form. The title names the step the help was opened from.
fn render_help_popup(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 8,
        y: area.height / 8,
        width: area.width * 3 / 4,
        height: area.height * 3 / 4,
    };

    let help_text = get_help_text();
    let visible_height = popup_area.height.saturating_sub(2) as usize;
    let max_scroll = help_text.lines().count().saturating_sub(visible_height);
    let scroll = app.help_scroll.min(max_scroll) as u16;

    let title = match app.wizard.current_step_definition() {
        Some(step) => format!("Help | step {}: {}", step.id, step.title),
        None => "Help".to_string(),
    };

    let help_widget = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White))
        .scroll((scroll, 0));

    f.render_widget(Clear, popup_area);
    f.render_widget(help_widget, popup_area);
}

fn get_help_text() -> String {
    r#"JOB APPLICATION WIZARD

=== FILLING IN THE FORM ===
Fields marked with * are required.
Your answers are saved as you type and restored the next time
the wizard starts. Navigation always starts again at step 1.

=== FIELD NAVIGATION ===
Tab / ↓         Focus next field of the step
Shift+Tab / ↑   Focus previous field of the step
Backspace       Delete the last character
Ctrl+V          Paste the first line of the clipboard

=== CHOICES ===
← / →           Previous / next option of a choice field
Space           Next option, or tick / untick a checkbox

=== DATES ===
Type dates as dd.mm.yyyy, e.g. 01.07.2030.
The start date cannot lie in the past.

=== STEPS ===
Enter           Validate this step and go to the next one
                On the last step: submit the application
Ctrl+B          Go back one step (no validation)
Ctrl+R          Clear the whole form and the saved draft

=== SUBMISSION ===
The application is sent in the background. While it is being
sent, pressing Enter again does not send it twice. If sending fails,
your answers are kept and you can press Enter again to retry.

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/q        Close this help window

Esc or Ctrl+Q quits. The draft stays saved."#.to_string()
}
