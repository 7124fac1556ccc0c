pub mod components;
mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::TableState;

pub use renderfns::header::extract_domain;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  renderfns::draw_header(
    frame,
    chunks[0],
    &app.title(),
    &app.listing(),
    &app.shortcuts(),
  );

  app.render_view(frame, chunks[1]);

  renderfns::draw_footer(frame, chunks[2], &app.breadcrumb(), app.status());

  // Global overlays on top of the view
  app.command().render_overlay(frame, chunks[1]);
  app.toasts().render(frame, chunks[1]);
}

/// Clamp the table selection to `len` rows, selecting the first row when
/// nothing is selected yet.
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(i) if i >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    _ => {}
  }
}

/// A rect of `percent_x` of the width and a fixed `height`, centered in `area`
pub fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
  let width = (area.width * percent_x / 100).min(area.width);
  let height = height.min(area.height);
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ensure_valid_selection() {
    let mut state = TableState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(5));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }

  #[test]
  fn test_centered_rect() {
    let area = Rect::new(0, 0, 100, 40);
    assert_eq!(centered_rect(60, 10, area), Rect::new(20, 15, 60, 10));

    // Taller than the area gets clamped
    let small = Rect::new(5, 5, 20, 4);
    assert_eq!(centered_rect(50, 10, small), Rect::new(10, 5, 10, 4));
  }
}
