use crate::api::{Operation, RecordSource, RestClient};
use crate::commands::{self, CommandAction};
use crate::config::{Config, ResourceConfig};
use crate::event::{Event, EventHandler};
use crate::sync::{Collection, Completion};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult, Toasts};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crate::ui::views::RecordListView;
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Builds the record source for a resource
type Connector = Box<dyn Fn(&ResourceConfig) -> Result<Arc<dyn RecordSource>>>;

/// Main application state
pub struct App {
  /// Application configuration
  config: Config,

  /// Resource currently being browsed
  resource: ResourceConfig,

  /// Cached collection for `resource`
  collection: Collection,

  connect: Connector,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Command palette (after pressing :)
  command: CommandInput,

  toasts: Toasts,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let client_config = config.clone();
    let connect: Connector = Box::new(move |resource| {
      let client = RestClient::new(&client_config, resource)?;
      Ok(Arc::new(client) as Arc<dyn RecordSource>)
    });
    Self::with_connector(config, connect)
  }

  /// Build the app with a custom way of reaching the API
  pub fn with_connector(config: Config, connect: Connector) -> Result<Self> {
    let resource = config
      .initial_resource()
      .cloned()
      .ok_or_else(|| eyre!("No resources configured"))?;
    let collection = Collection::new(resource.name.clone(), connect(&resource)?);
    let command = CommandInput::new(commands::command_list(&config.resources));

    Ok(Self {
      config,
      resource,
      collection,
      connect,
      view_stack: vec![Box::new(RecordListView::new())],
      command,
      toasts: Toasts::new(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(Duration::from_millis(100));

    info!(resource = %self.resource.name, "starting");
    self.collection.load();

    // Main loop
    while !self.should_quit() {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => {}
        None => break,
      }

      // Apply whatever finished, on every event so typing never stalls updates
      self.tick();
    }

    Ok(())
  }

  /// Apply finished requests, notify views, and expire old toasts
  pub fn tick(&mut self) {
    for completion in self.collection.poll() {
      for view in self.view_stack.iter_mut() {
        view.on_completion(&completion);
      }
      self.notify(&completion);
    }
    self.toasts.prune();
  }

  fn notify(&mut self, completion: &Completion) {
    match (&completion.error, completion.operation) {
      (Some(error), _) => self.toasts.error(error.clone()),
      (None, Operation::List) => {}
      (None, operation) => self.toasts.success(format!(
        "{} {} successfully",
        self.resource.label(),
        operation.past_tense()
      )),
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Palette gets first look unless a view owns the keyboard
    let view_capturing = self
      .view_stack
      .last()
      .is_some_and(|view| view.is_capturing_input());
    if self.command.is_active() || !view_capturing {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Run(action)) => {
          self.run_command(action);
          return;
        }
        KeyResult::Event(CommandEvent::Unknown(input)) => {
          self.toasts.error(format!("Unknown command: {}", input));
          return;
        }
        KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => {
        let mut ctx = ViewContext {
          collection: &mut self.collection,
          resource: &self.resource,
        };
        view.handle_key(key, &mut ctx)
      }
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn run_command(&mut self, action: CommandAction) {
    match action {
      CommandAction::Reload => {
        self.collection.load();
      }
      CommandAction::New => {
        // Creating happens from the listing
        self.view_stack.truncate(1);
        if let Some(root) = self.view_stack.first_mut() {
          let mut ctx = ViewContext {
            collection: &mut self.collection,
            resource: &self.resource,
          };
          if !root.run_command(&CommandAction::New, &mut ctx) {
            self.toasts.error("Cannot create from this view");
          }
        }
      }
      CommandAction::Resource(name) => {
        if let Err(e) = self.switch_resource(&name) {
          warn!(resource = %name, error = %e, "switch failed");
          self.toasts.error(e.to_string());
        }
      }
      CommandAction::Quit => self.should_quit = true,
    }
  }

  /// Replace the collection with a fresh one for `name` and reset navigation
  fn switch_resource(&mut self, name: &str) -> Result<()> {
    let resource = self
      .config
      .resource(name)
      .cloned()
      .ok_or_else(|| eyre!("Unknown resource: {}", name))?;
    let source = (self.connect)(&resource)?;

    info!(from = %self.resource.name, to = %resource.name, "switching resource");
    self.collection = Collection::new(resource.name.clone(), source);
    self.resource = resource;
    self.view_stack = vec![Box::new(RecordListView::new())];
    self.collection.load();
    Ok(())
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }

  /// Header title: configured title or the API host
  pub fn title(&self) -> String {
    match &self.config.title {
      Some(title) => title.clone(),
      None => ui::extract_domain(&self.config.api.base_url).to_string(),
    }
  }

  /// Heading for the current listing, e.g. "Post Listing"
  pub fn listing(&self) -> String {
    format!("{} Listing", self.resource.label())
  }

  pub fn shortcuts(&self) -> Vec<ShortcutInfo> {
    self
      .view_stack
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label(&self.resource))
      .collect()
  }

  /// Activity shown at the right of the footer
  pub fn status(&self) -> Option<&'static str> {
    if self.collection.is_loading() {
      Some("Loading...")
    } else if self.collection.is_pending() {
      Some("Saving...")
    } else {
      None
    }
  }

  pub fn render_view(&mut self, frame: &mut Frame, area: Rect) {
    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, area, &self.collection, &self.resource);
    }
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  pub fn toasts(&self) -> &Toasts {
    &self.toasts
  }
}
