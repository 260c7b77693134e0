//! Auth screen rendering (login and register forms)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use ratatui::widgets::Padding;

use crate::model::{AuthField, AuthMode, SessionPhase, UiState};

pub fn render_auth_screen(frame: &mut Frame, ui_state: &UiState, phase: SessionPhase) {
    let area = frame.area();

    if phase == SessionPhase::Bootstrapping {
        let checking = Paragraph::new("Checking stored session...")
            .style(Style::default().fg(Color::Yellow))
            .centered()
            .block(Block::default().borders(Borders::ALL).title(" Cadence "));
        frame.render_widget(checking, centered_rect(area, 40, 3));
        return;
    }

    let form = &ui_state.auth_form;
    let is_register = form.mode == AuthMode::Register;

    // Email + password, plus username on the register form, plus the
    // remember/hint/error lines.
    let field_count: u16 = if is_register { 3 } else { 2 };
    let popup_height = field_count * 3 + 5;
    let popup_area = centered_rect(area, 52, popup_height);

    frame.render_widget(Clear, popup_area);

    let title = if is_register { " Create account " } else { " Sign in " };
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(title)
        .title_style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD));
    let inner_area = outer.inner(popup_area);
    frame.render_widget(outer, popup_area);

    let mut constraints = vec![Constraint::Length(3)]; // Email
    if is_register {
        constraints.push(Constraint::Length(3)); // Username
    }
    constraints.push(Constraint::Length(3)); // Password
    constraints.push(Constraint::Length(1)); // Remember me
    constraints.push(Constraint::Length(1)); // Error line
    constraints.push(Constraint::Length(1)); // Hints

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner_area);

    let mut chunk = 0;
    render_field(frame, chunks[chunk], "Email", &form.email, form.focus == AuthField::Email, false);
    chunk += 1;

    if is_register {
        render_field(
            frame,
            chunks[chunk],
            "Username",
            &form.username,
            form.focus == AuthField::Username,
            false,
        );
        chunk += 1;
    }

    render_field(
        frame,
        chunks[chunk],
        "Password",
        &form.password,
        form.focus == AuthField::Password,
        true,
    );
    chunk += 1;

    if !is_register {
        let remember = if form.remember { "[x]" } else { "[ ]" };
        let remember_line = Paragraph::new(format!(" {} Remember me (Ctrl+R)", remember))
            .style(Style::default().fg(Color::White));
        frame.render_widget(remember_line, chunks[chunk]);
    }
    chunk += 1;

    if let Some(error) = &form.error {
        let error_line = Paragraph::new(format!(" {}", error))
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
        frame.render_widget(error_line, chunks[chunk]);
    } else if form.submitting {
        let submitting = Paragraph::new(" Signing in...")
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(submitting, chunks[chunk]);
    }
    chunk += 1;

    let hint = if is_register {
        " Enter: register | Ctrl+T: sign in instead | Esc: quit"
    } else {
        " Enter: sign in | Ctrl+T: create account | Esc: quit"
    };
    let hints = Paragraph::new(hint).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hints, chunks[chunk]);
}

fn render_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    focused: bool,
    masked: bool,
) {
    let display = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let border_style = if focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let field = Paragraph::new(display)
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", label))
                .padding(Padding::horizontal(1))
                .border_style(border_style),
        );
    frame.render_widget(field, area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let popup_width = width.min(area.width.saturating_sub(4));
    let popup_height = height.min(area.height.saturating_sub(2));
    Rect {
        x: area.width.saturating_sub(popup_width) / 2,
        y: area.height.saturating_sub(popup_height) / 2,
        width: popup_width,
        height: popup_height,
    }
}
