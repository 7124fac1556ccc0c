use super::KeyResult;
use crate::api::Record;
use crate::sync::Ticket;
use crate::ui::centered_rect;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by the delete confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmEvent {
  /// User confirmed deleting the record with this id
  Confirmed(u64),
  Cancelled,
}

/// "Are you sure?" dialog shown before deleting a record
#[derive(Debug, Clone)]
pub struct ConfirmModal {
  id: u64,
  label: String,
  record_title: String,
  pending: Option<Ticket>,
}

impl ConfirmModal {
  pub fn delete(label: &str, record: &Record) -> Self {
    Self {
      id: record.id,
      label: label.to_string(),
      record_title: record.title.clone(),
      pending: None,
    }
  }

  pub fn pending(&self) -> Option<Ticket> {
    self.pending
  }

  pub fn set_pending(&mut self, ticket: Ticket) {
    self.pending = Some(ticket);
  }

  pub fn clear_pending(&mut self) {
    self.pending = None;
  }

  fn question(&self) -> String {
    format!(
      "Are you sure you want to delete this {} titled \"{}\"?",
      self.label.to_lowercase(),
      self.record_title
    )
  }

  /// Handle a key event. Modal: every key is consumed.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ConfirmEvent> {
    match key.code {
      KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
        KeyResult::Event(ConfirmEvent::Cancelled)
      }
      KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') if self.pending.is_none() => {
        KeyResult::Event(ConfirmEvent::Confirmed(self.id))
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let overlay_area = centered_rect(60, 7, area);
    frame.render_widget(Clear, overlay_area);

    let hint = if self.pending.is_some() {
      " Deleting... "
    } else {
      " y: Yes  n: No "
    };

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(" Confirm Delete ")
      .title_bottom(Line::from(hint).right_aligned());

    let paragraph = Paragraph::new(self.question())
      .block(block)
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, overlay_area);
  }
}
