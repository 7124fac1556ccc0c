use crate::commands::CommandAction;
use crate::config::ResourceConfig;
use crate::sync::{Collection, Completion};
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// What a view gets to work with while handling input
pub struct ViewContext<'a> {
  /// The active collection; views submit operations through it
  pub collection: &'a mut Collection,
  pub resource: &'a ResourceConfig,
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, forms, etc.) and return
/// actions for the App to execute. This creates a clean delegation chain:
/// App → View → Components
///
/// The collection is owned by the App and lent to views; views never keep
/// their own copy of the records.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut ViewContext) -> ViewAction;

  /// Render the view to the frame
  fn render(
    &mut self,
    frame: &mut Frame,
    area: Rect,
    collection: &Collection,
    resource: &ResourceConfig,
  );

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self, resource: &ResourceConfig) -> String;

  /// True while a text field or modal owns the keyboard, so global keys
  /// like `:` and `q` must be passed through
  fn is_capturing_input(&self) -> bool {
    false
  }

  /// Called for each finished remote operation
  fn on_completion(&mut self, _completion: &Completion) {}

  /// Handle a palette command; return false if this view does not support it
  fn run_command(&mut self, _action: &CommandAction, _ctx: &mut ViewContext) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  /// Override this to provide view-specific shortcuts
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
