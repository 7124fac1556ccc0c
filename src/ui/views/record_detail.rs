use crate::config::ResourceConfig;
use crate::sync::Collection;
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Read-only view of a single record.
///
/// Holds only the id; the record itself is looked up in the collection on
/// every frame so edits and deletes made elsewhere show up immediately.
pub struct RecordDetailView {
  id: u64,
  scroll: u16,
}

impl RecordDetailView {
  pub fn new(id: u64) -> Self {
    Self { id, scroll: 0 }
  }

  fn render_detail(
    &self,
    frame: &mut Frame,
    area: Rect,
    collection: &Collection,
    resource: &ResourceConfig,
  ) {
    let title = if collection.is_loading() {
      format!(" {} #{} (loading...) ", resource.label(), self.id)
    } else {
      format!(" {} #{} ", resource.label(), self.id)
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let record = match collection.get(self.id) {
      Some(record) => record,
      None => {
        let paragraph = Paragraph::new(format!(
          "This {} no longer exists.\n\nPress 'q' to go back.",
          resource.label().to_lowercase()
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, inner);
        return;
      }
    };

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(2), // Id and title
        Constraint::Length(1), // Separator
        Constraint::Min(1),    // Body
      ])
      .split(inner);

    let header = vec![
      Line::from(vec![
        Span::styled("ID: ", Style::default().fg(Color::DarkGray)),
        Span::styled(record.id.to_string(), Style::default().fg(Color::Cyan)),
      ]),
      Line::from(vec![
        Span::styled("Title: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
          record.title.as_str(),
          Style::default().add_modifier(Modifier::BOLD),
        ),
      ]),
    ];
    frame.render_widget(Paragraph::new(header), chunks[0]);

    let sep =
      Paragraph::new("─".repeat(chunks[1].width as usize)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(sep, chunks[1]);

    let body = if record.body.is_empty() {
      "No body"
    } else {
      record.body.as_str()
    };
    let body_para = Paragraph::new(body)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(body_para, chunks[2]);
  }
}

impl View for RecordDetailView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut ViewContext) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
        ViewAction::None
      }
      KeyCode::Char('r') => {
        ctx.collection.load();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(
    &mut self,
    frame: &mut Frame,
    area: Rect,
    collection: &Collection,
    resource: &ResourceConfig,
  ) {
    self.render_detail(frame, area, collection, resource);
  }

  fn breadcrumb_label(&self, _resource: &ResourceConfig) -> String {
    format!("#{}", self.id)
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "scroll").with_priority(20),
      ShortcutInfo::new("r", "reload").with_priority(60),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::source::fake::FakeSource;
  use crossterm::event::KeyModifiers;
  use std::sync::Arc;

  #[tokio::test]
  async fn test_keys() {
    let mut collection = Collection::new("posts", Arc::new(FakeSource::with_records(Vec::new())));
    let resource = ResourceConfig::new("posts");
    let mut view = RecordDetailView::new(7);
    let mut ctx = ViewContext {
      collection: &mut collection,
      resource: &resource,
    };

    let down = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
    assert!(matches!(view.handle_key(down, &mut ctx), ViewAction::None));
    assert_eq!(view.scroll, 1);

    let reload = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE);
    view.handle_key(reload, &mut ctx);
    assert!(ctx.collection.is_loading());

    let back = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
    assert!(matches!(view.handle_key(back, &mut ctx), ViewAction::Pop));
    assert_eq!(view.breadcrumb_label(&resource), "#7");
  }
}
