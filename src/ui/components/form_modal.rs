use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::api::{Record, RecordFields};
use crate::sync::Ticket;
use crate::ui::centered_rect;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// What the form will do on submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
  Create,
  Edit { id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Title,
  Body,
}

/// Events emitted by the form that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Both fields passed validation
  Submit(FormMode, RecordFields),
  /// Form closed without submitting
  Cancelled,
}

/// Modal form for creating or editing a record
#[derive(Debug, Clone)]
pub struct FormModal {
  mode: FormMode,
  label: String,
  title: TextInput,
  body: TextInput,
  focus: Field,
  title_error: Option<String>,
  body_error: Option<String>,
  pending: Option<Ticket>,
}

impl FormModal {
  /// Empty form for a new record
  pub fn create(label: &str) -> Self {
    Self::build(FormMode::Create, label, "", "")
  }

  /// Form prefilled with an existing record
  pub fn edit(label: &str, record: &Record) -> Self {
    Self::build(
      FormMode::Edit { id: record.id },
      label,
      &record.title,
      &record.body,
    )
  }

  fn build(mode: FormMode, label: &str, title: &str, body: &str) -> Self {
    Self {
      mode,
      label: label.to_string(),
      title: TextInput::with_value(title),
      body: TextInput::with_value(body),
      focus: Field::Title,
      title_error: None,
      body_error: None,
      pending: None,
    }
  }

  /// Ticket of the in-flight submission, if any
  pub fn pending(&self) -> Option<Ticket> {
    self.pending
  }

  pub fn set_pending(&mut self, ticket: Ticket) {
    self.pending = Some(ticket);
  }

  /// Submission failed; allow editing and resubmitting
  pub fn clear_pending(&mut self) {
    self.pending = None;
  }

  fn heading(&self) -> String {
    match self.mode {
      FormMode::Create => format!(" Create New {} ", self.label),
      FormMode::Edit { .. } => format!(" Edit {} ", self.label),
    }
  }

  fn submit_label(&self) -> &'static str {
    match self.mode {
      FormMode::Create => "Create",
      FormMode::Edit { .. } => "Save",
    }
  }

  /// Both fields are required
  fn validate(&mut self) -> Option<RecordFields> {
    self.title_error = self
      .title
      .is_empty()
      .then(|| "Title is required".to_string());
    self.body_error = self
      .body
      .is_empty()
      .then(|| "Body is required".to_string());

    if self.title_error.is_some() || self.body_error.is_some() {
      return None;
    }
    Some(RecordFields::new(self.title.value(), self.body.value()))
  }

  fn focused_input(&mut self) -> &mut TextInput {
    match self.focus {
      Field::Title => &mut self.title,
      Field::Body => &mut self.body,
    }
  }

  fn toggle_focus(&mut self) {
    self.focus = match self.focus {
      Field::Title => Field::Body,
      Field::Body => Field::Title,
    };
  }

  /// Handle a key event. The form is modal: every key is consumed.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if key.code == KeyCode::Esc {
      return KeyResult::Event(FormEvent::Cancelled);
    }

    // Locked while saving
    if self.pending.is_some() {
      return KeyResult::Handled;
    }

    // Enter in the body starts a new line; Ctrl-S submits from anywhere
    if key.code == KeyCode::Enter && self.focus == Field::Body {
      self.body.insert('\n');
      self.body_error = None;
      return KeyResult::Handled;
    }

    let submit = key.code == KeyCode::Enter
      || (key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL));
    if submit {
      return match self.validate() {
        Some(fields) => KeyResult::Event(FormEvent::Submit(self.mode, fields)),
        None => KeyResult::Handled,
      };
    }

    match key.code {
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.toggle_focus();
      }
      _ => {
        if self.focused_input().handle_key(key) == InputResult::Consumed {
          // Re-validate lazily: clear the error of the field being fixed
          match self.focus {
            Field::Title => self.title_error = None,
            Field::Body => self.body_error = None,
          }
        }
      }
    }
    KeyResult::Handled
  }

  /// Render the form as a centered overlay
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let overlay_area = centered_rect(70, 16, area);
    frame.render_widget(Clear, overlay_area);

    let hint = if self.pending.is_some() {
      " Saving... ".to_string()
    } else {
      format!(" Ctrl-S: {}  Tab: next field  Esc: cancel ", self.submit_label())
    };

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(self.heading())
      .title_bottom(Line::from(hint).right_aligned());

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3), // Title
        Constraint::Length(1), // Title error
        Constraint::Min(3),    // Body
        Constraint::Length(1), // Body error
      ])
      .split(inner);

    self.render_field(frame, chunks[0], "Title", &self.title, Field::Title);
    render_error(frame, chunks[1], self.title_error.as_deref());
    self.render_field(frame, chunks[2], "Body", &self.body, Field::Body);
    render_error(frame, chunks[3], self.body_error.as_deref());
  }

  fn render_field(&self, frame: &mut Frame, area: Rect, label: &str, input: &TextInput, field: Field) {
    let focused = self.focus == field && self.pending.is_none();
    let border = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border))
      .title(format!(" {} ", label));

    let paragraph = Paragraph::new(input.lines(focused))
      .block(block)
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }
}

fn render_error(frame: &mut Frame, area: Rect, error: Option<&str>) {
  if let Some(error) = error {
    let paragraph = Paragraph::new(format!(" {}", error)).style(Style::default().fg(Color::Red));
    frame.render_widget(paragraph, area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn ctrl(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::CONTROL)
  }

  fn type_str(form: &mut FormModal, s: &str) {
    for c in s.chars() {
      form.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_empty_form_does_not_submit() {
    let mut form = FormModal::create("Post");
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert_eq!(form.title_error.as_deref(), Some("Title is required"));
    assert_eq!(form.body_error.as_deref(), Some("Body is required"));
  }

  #[test]
  fn test_body_required() {
    let mut form = FormModal::create("Post");
    type_str(&mut form, "Hello");
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert!(form.title_error.is_none());
    assert!(form.body_error.is_some());
  }

  #[test]
  fn test_create_submit() {
    let mut form = FormModal::create("Post");
    type_str(&mut form, "Hello");
    form.handle_key(key(KeyCode::Tab));
    type_str(&mut form, "World");

    assert_eq!(
      form.handle_key(ctrl(KeyCode::Char('s'))),
      KeyResult::Event(FormEvent::Submit(
        FormMode::Create,
        RecordFields::new("Hello", "World")
      ))
    );
  }

  #[test]
  fn test_edit_prefills_and_keeps_id() {
    let record = Record {
      id: 7,
      title: "Old".to_string(),
      body: "Body".to_string(),
    };
    let mut form = FormModal::edit("Post", &record);
    type_str(&mut form, "er");

    assert_eq!(
      form.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(FormEvent::Submit(
        FormMode::Edit { id: 7 },
        RecordFields::new("Older", "Body")
      ))
    );
  }

  #[test]
  fn test_enter_in_body_adds_newline() {
    let mut form = FormModal::create("Post");
    type_str(&mut form, "Hello");
    form.handle_key(key(KeyCode::Tab));
    type_str(&mut form, "line one");
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    type_str(&mut form, "line two");

    assert_eq!(
      form.handle_key(ctrl(KeyCode::Char('s'))),
      KeyResult::Event(FormEvent::Submit(
        FormMode::Create,
        RecordFields::new("Hello", "line one\nline two")
      ))
    );
  }

  #[test]
  fn test_typing_clears_field_error() {
    let mut form = FormModal::create("Post");
    form.handle_key(key(KeyCode::Enter));
    type_str(&mut form, "x");
    assert!(form.title_error.is_none());
    assert!(form.body_error.is_some());
  }

  #[test]
  fn test_pending_locks_form_but_allows_close() {
    let mut form = FormModal::create("Post");
    form.set_pending(3);
    type_str(&mut form, "ignored");
    assert_eq!(form.title.value(), "");
    assert_eq!(form.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert_eq!(
      form.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(FormEvent::Cancelled)
    );
  }

  #[test]
  fn test_headings() {
    assert_eq!(FormModal::create("Post").heading(), " Create New Post ");
    let record = Record {
      id: 1,
      title: String::new(),
      body: String::new(),
    };
    assert_eq!(FormModal::edit("User", &record).heading(), " Edit User ");
  }
}
