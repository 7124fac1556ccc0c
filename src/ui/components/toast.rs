use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
  Success,
  Error,
}

/// A transient notification
#[derive(Debug, Clone)]
pub struct Toast {
  pub message: String,
  pub level: ToastLevel,
  shown_at: Instant,
}

/// Stack of notifications that expire on their own
#[derive(Debug, Clone)]
pub struct Toasts {
  items: VecDeque<Toast>,
  ttl: Duration,
  max: usize,
}

impl Default for Toasts {
  fn default() -> Self {
    Self {
      items: VecDeque::new(),
      ttl: Duration::from_secs(3),
      max: 4,
    }
  }
}

impl Toasts {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn success(&mut self, message: impl Into<String>) {
    self.push(message.into(), ToastLevel::Success, Instant::now());
  }

  pub fn error(&mut self, message: impl Into<String>) {
    self.push(message.into(), ToastLevel::Error, Instant::now());
  }

  fn push(&mut self, message: String, level: ToastLevel, now: Instant) {
    self.items.push_back(Toast {
      message,
      level,
      shown_at: now,
    });
    while self.items.len() > self.max {
      self.items.pop_front();
    }
  }

  /// Drop toasts older than the ttl
  pub fn prune(&mut self) {
    self.prune_at(Instant::now());
  }

  fn prune_at(&mut self, now: Instant) {
    let ttl = self.ttl;
    self
      .items
      .retain(|t| now.saturating_duration_since(t.shown_at) < ttl);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Toast> {
    self.items.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// Render stacked in the bottom-right corner of `area`
  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let mut bottom = area.y + area.height;
    for toast in self.items.iter().rev() {
      let width = toast_width(&toast.message, area.width);
      if bottom < area.y + 3 {
        break;
      }
      let rect = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        bottom - 3,
        width,
        3,
      )
      .intersection(area);
      bottom -= 3;

      let color = match toast.level {
        ToastLevel::Success => Color::Green,
        ToastLevel::Error => Color::Red,
      };

      frame.render_widget(Clear, rect);
      let paragraph = Paragraph::new(toast.message.as_str())
        .style(Style::default().fg(color))
        .block(
          Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
        );
      frame.render_widget(paragraph, rect);
    }
  }
}

/// Message width plus borders and padding, kept within `available`
fn toast_width(message: &str, available: u16) -> u16 {
  u16::try_from(message.chars().count())
    .unwrap_or(u16::MAX)
    .saturating_add(4)
    .min(available.saturating_sub(2))
    .max(10u16.min(available))
}
