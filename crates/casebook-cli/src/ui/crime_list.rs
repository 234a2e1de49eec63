//! Crime list pane — left panel.

use casebook_core::store::CrimeStore;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::App;

/// Date format used for list rows, e.g. "Monday, March 4, 2024".
pub const ROW_DATE_FORMAT: &str = "%A, %B %-d, %Y";

/// Render the crime list into `area`.
pub fn draw<S: CrimeStore>(f: &mut Frame, area: Rect, app: &App<S>) {
  let filtered = app.filtered_crimes();
  let total = app.projection.len();

  // Title with count.
  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Crimes ({}/{}) ", filtered.len(), total)
  } else {
    format!(" Crimes ({total}) ")
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner_area = block.inner(area);
  f.render_widget(block, area);

  if total == 0 {
    f.render_widget(
      Paragraph::new(Span::styled(
        "No crimes yet. Press n to record one.",
        Style::default().fg(Color::DarkGray),
      )),
      inner_area,
    );
    return;
  }

  let items: Vec<ListItem> = filtered
    .iter()
    .map(|crime| {
      let mark = if crime.is_solved { "✔ " } else { "  " };
      let title = if crime.title.is_empty() {
        Span::styled("(untitled)", Style::default().fg(Color::DarkGray))
      } else {
        Span::raw(crime.title.clone())
      };
      let date = crime.date.format(ROW_DATE_FORMAT).to_string();

      ListItem::new(vec![
        Line::from(vec![Span::styled(mark, Style::default().fg(Color::Green)), title]),
        Line::from(Span::styled(
          format!("  {date}"),
          Style::default().fg(Color::DarkGray),
        )),
      ])
    })
    .collect();

  // Filter bar along the bottom of the pane.
  if (app.filter_active || !app.filter.is_empty()) && inner_area.height > 2 {
    let filter_area = Rect {
      x:      inner_area.x,
      y:      inner_area.y + inner_area.height - 1,
      width:  inner_area.width,
      height: 1,
    };
    inner_area.height = inner_area.height.saturating_sub(1);

    let filter_text = if app.filter_active {
      format!("/{}_", app.filter)
    } else {
      format!("/{}", app.filter)
    };
    f.render_widget(
      Paragraph::new(filter_text).style(Style::default().fg(Color::Yellow)),
      filter_area,
    );
  }

  let mut state = ListState::default();
  state.select((!filtered.is_empty()).then_some(app.list_cursor));

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner_area,
    &mut state,
  );
}
