use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by search input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Enter pressed; the query becomes the applied filter (empty clears it)
  Submitted(String),
}

/// Search box that only applies its query on submit.
///
/// Typing edits a draft; Esc closes the box and discards the draft, leaving
/// the previously applied query in place.
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
  applied: String,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if search is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// The query currently applied as a filter
  pub fn query(&self) -> &str {
    &self.applied
  }

  /// Activate search mode, starting from the applied query
  pub fn activate(&mut self) {
    self.active = true;
    self.input.set_value(&self.applied);
  }

  /// Drop the applied query
  pub fn clear(&mut self) {
    self.applied.clear();
    self.input.clear();
  }

  /// Handle a key event
  /// Call this regardless of active state - it handles activation too
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.active {
      if key.code == KeyCode::Char('/') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(query) => {
        self.active = false;
        self.applied = query.clone();
        KeyResult::Event(SearchEvent::Submitted(query))
      }
      InputResult::Cancelled => {
        self.active = false;
        KeyResult::Handled
      }
      // Swallow everything else while the box is open
      InputResult::Consumed | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the search overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let height = 3u16.min(area.height);

    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height).intersection(area);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Search by title or body ")
      .title_bottom(Line::from(" Enter: search  Esc: cancel ").right_aligned());

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let mut spans = vec![Span::styled("/", Style::default().fg(Color::Yellow))];
    spans.extend(self.input.spans(true));
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(search: &mut SearchInput, s: &str) {
    for c in s.chars() {
      search.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_inactive_ignores_keys() {
    let mut search = SearchInput::new();
    assert_eq!(search.handle_key(key(KeyCode::Char('x'))), KeyResult::NotHandled);
    assert!(!search.is_active());
  }

  #[test]
  fn test_typing_does_not_apply_until_submit() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')));
    type_str(&mut search, "rust");
    assert_eq!(search.query(), "");

    let result = search.handle_key(key(KeyCode::Enter));
    assert_eq!(result, KeyResult::Event(SearchEvent::Submitted("rust".to_string())));
    assert_eq!(search.query(), "rust");
    assert!(!search.is_active());
  }

  #[test]
  fn test_cancel_keeps_applied_query() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')));
    type_str(&mut search, "rust");
    search.handle_key(key(KeyCode::Enter));

    search.handle_key(key(KeyCode::Char('/')));
    type_str(&mut search, "xyz");
    assert_eq!(search.handle_key(key(KeyCode::Esc)), KeyResult::Handled);
    assert_eq!(search.query(), "rust");
  }

  #[test]
  fn test_submitting_empty_clears() {
    let mut search = SearchInput::new();
    search.handle_key(key(KeyCode::Char('/')));
    type_str(&mut search, "a");
    search.handle_key(key(KeyCode::Enter));

    search.handle_key(key(KeyCode::Char('/')));
    search.handle_key(key(KeyCode::Backspace));
    search.handle_key(key(KeyCode::Enter));
    assert_eq!(search.query(), "");
  }
}
