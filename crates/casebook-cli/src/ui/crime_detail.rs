//! Crime detail pane — right panel.

use casebook_core::store::CrimeStore;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, Field, Screen};

// ─── Public entry ─────────────────────────────────────────────────────────────

/// Render the detail pane for the open session into `area`.
pub fn draw<S: CrimeStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let Some(session) = &app.session else {
    return;
  };
  let crime = session.crime();
  let focused = app.screen == Screen::CrimeDetail;

  let heading = if crime.title.is_empty() { "(untitled)" } else { crime.title.as_str() };
  let block = Block::default()
    .title(format!(" {heading} "))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }));

  let inner = block.inner(area);
  f.render_widget(block, area);

  let mut lines: Vec<Line> = Vec::new();

  for (i, field) in Field::ALL.into_iter().enumerate() {
    let selected = focused && i == app.field_cursor;
    let label_style = if selected {
      Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };

    let value = match &app.input {
      Some(input) if input.field == field => Span::styled(
        format!("{}_", input.buffer),
        Style::default().fg(Color::Yellow),
      ),
      _ => {
        let value = field.value(crime);
        if value.is_empty() {
          Span::styled("—", Style::default().fg(Color::DarkGray))
        } else {
          Span::raw(value)
        }
      }
    };

    lines.push(Line::from(vec![
      Span::styled(format!("{:<10}", field.label()), label_style),
      Span::raw(" "),
      value,
    ]));
  }

  // Photo slot.
  lines.push(Line::from(""));
  let photo = session.photo_path(&app.photos);
  let (marker, marker_style) = if app.photos.exists(crime.id) {
    ("present", Style::default().fg(Color::Green))
  } else {
    ("no photo", Style::default().fg(Color::DarkGray))
  };
  lines.push(Line::from(vec![
    Span::styled(format!("{:<10} ", "photo"), Style::default().fg(Color::Cyan)),
    Span::raw(photo.display().to_string()),
    Span::styled(format!("  [{marker}]"), marker_style),
  ]));

  let contact = if crime.can_contact_suspect() {
    Span::styled("c to call the suspect", Style::default().fg(Color::Green))
  } else {
    Span::styled("no suspect to call", Style::default().fg(Color::DarkGray))
  };
  lines.push(Line::from(vec![
    Span::styled(format!("{:<10} ", "contact"), Style::default().fg(Color::Cyan)),
    contact,
  ]));

  if let Some(report) = &app.report {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      casebook_core::crime::REPORT_SUBJECT,
      Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(report.as_str()));
  }

  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    "Enter edit  Space toggle  r report  c call  x clear suspect  w submit",
    Style::default().fg(Color::DarkGray),
  )));

  f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
