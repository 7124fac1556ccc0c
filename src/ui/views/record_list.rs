use crate::api::Record;
use crate::commands::CommandAction;
use crate::config::ResourceConfig;
use crate::sync::{Collection, Completion, LoadState};
use crate::ui::components::{
  ConfirmEvent, ConfirmModal, FormEvent, FormModal, FormMode, KeyResult, SearchEvent, SearchInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{single_line, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};
use crate::ui::views::RecordDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};
use tracing::debug;

/// Modal currently shown over the table
#[derive(Debug)]
enum Overlay {
  Form(FormModal),
  Confirm(ConfirmModal),
}

/// Table of the active collection with search, create, edit and delete
pub struct RecordListView {
  table_state: TableState,
  search: SearchInput,
  overlay: Option<Overlay>,
}

impl Default for RecordListView {
  fn default() -> Self {
    Self::new()
  }
}

impl RecordListView {
  pub fn new() -> Self {
    Self {
      table_state: TableState::default(),
      search: SearchInput::new(),
      overlay: None,
    }
  }

  /// The currently applied search query
  pub fn filter(&self) -> &str {
    self.search.query()
  }

  fn selected<'a>(&self, collection: &'a Collection) -> Option<&'a Record> {
    let index = self.table_state.selected()?;
    collection.filtered(self.search.query()).get(index).copied()
  }

  fn open_create(&mut self, resource: &ResourceConfig) {
    self.overlay = Some(Overlay::Form(FormModal::create(&resource.label())));
  }

  fn handle_overlay_key(&mut self, key: KeyEvent, ctx: &mut ViewContext) {
    match &mut self.overlay {
      Some(Overlay::Form(form)) => match form.handle_key(key) {
        KeyResult::Event(FormEvent::Submit(mode, fields)) => {
          let ticket = match mode {
            FormMode::Create => ctx.collection.create(fields),
            FormMode::Edit { id } => ctx.collection.update(id, fields),
          };
          debug!(ticket, ?mode, "form submitted");
          form.set_pending(ticket);
        }
        KeyResult::Event(FormEvent::Cancelled) => self.overlay = None,
        KeyResult::Handled | KeyResult::NotHandled => {}
      },
      Some(Overlay::Confirm(confirm)) => match confirm.handle_key(key) {
        KeyResult::Event(ConfirmEvent::Confirmed(id)) => {
          let ticket = ctx.collection.delete(id);
          debug!(ticket, id, "delete confirmed");
          confirm.set_pending(ticket);
        }
        KeyResult::Event(ConfirmEvent::Cancelled) => self.overlay = None,
        KeyResult::Handled | KeyResult::NotHandled => {}
      },
      None => {}
    }
  }

  fn render_banner(&self, frame: &mut Frame, area: Rect, error: &str) {
    let block = Block::default()
      .title(" Error ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red));
    let paragraph = Paragraph::new(Line::from(vec![
      Span::styled(error.to_string(), Style::default().fg(Color::Red)),
      Span::styled("  (r to retry)", Style::default().fg(Color::DarkGray)),
    ]))
    .block(block)
    .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
  }

  fn render_table(
    &mut self,
    frame: &mut Frame,
    area: Rect,
    collection: &Collection,
    resource: &ResourceConfig,
  ) {
    let query = self.search.query().to_string();
    let records = collection.filtered(&query);
    ensure_valid_selection(&mut self.table_state, records.len());

    let mut title = format!(" {} Listing", resource.label());
    if !query.is_empty() {
      title.push_str(&format!(" [/{}]", query));
    }
    match collection.load_state() {
      LoadState::Loading => title.push_str(" (loading...) "),
      _ => title.push_str(&format!(" ({}) ", records.len())),
    }

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if records.is_empty() {
      let content = match collection.load_state() {
        LoadState::Idle | LoadState::Loading if !collection.store().is_loaded() => {
          "Loading...".to_string()
        }
        LoadState::Failed(_) if !collection.store().is_loaded() => {
          format!("Failed to load {}. Press 'r' to retry.", resource.name)
        }
        _ if !query.is_empty() => format!("No {} match \"{}\".", resource.name, query),
        _ => format!("No {} found. Press 'n' to create one.", resource.name),
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    // Title gets a third of the space, body the rest
    let inner_width = area.width.saturating_sub(2 + 2 + 8 + 2) as usize;
    let title_width = (inner_width / 3).max(10);
    let body_width = inner_width.saturating_sub(title_width).max(10);

    let rows: Vec<Row> = records
      .iter()
      .map(|record| {
        Row::new(vec![
          Cell::from(record.id.to_string()).style(Style::default().fg(Color::Cyan)),
          Cell::from(truncate(&single_line(&record.title), title_width)),
          Cell::from(truncate(&single_line(&record.body), body_width))
            .style(Style::default().fg(Color::Gray)),
        ])
      })
      .collect();

    let header = Row::new(vec!["ID", "Title", "Body"]).style(
      Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD),
    );

    let table = Table::new(
      rows,
      [
        Constraint::Length(8),
        Constraint::Percentage(33),
        Constraint::Fill(1),
      ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl View for RecordListView {
  fn handle_key(&mut self, key: KeyEvent, ctx: &mut ViewContext) -> ViewAction {
    if self.overlay.is_some() {
      self.handle_overlay_key(key, ctx);
      return ViewAction::None;
    }

    // Let search component try to handle first
    let search_result = self.search.handle_key(key);
    if let KeyResult::Event(SearchEvent::Submitted(query)) = &search_result {
      debug!(query = %query, "filter applied");
      self.table_state.select(Some(0));
    }
    if search_result.is_consumed() {
      return ViewAction::None;
    }

    let len = ctx.collection.filtered(self.search.query()).len();
    ensure_valid_selection(&mut self.table_state, len);

    // Normal mode key handling
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.table_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.table_state.select_last(),
      KeyCode::Char('r') => {
        ctx.collection.load();
      }
      KeyCode::Char('n') => self.open_create(ctx.resource),
      KeyCode::Char('e') => {
        if let Some(record) = self.selected(ctx.collection) {
          self.overlay = Some(Overlay::Form(FormModal::edit(&ctx.resource.label(), record)));
        }
      }
      KeyCode::Char('d') => {
        if let Some(record) = self.selected(ctx.collection) {
          self.overlay = Some(Overlay::Confirm(ConfirmModal::delete(
            &ctx.resource.label(),
            record,
          )));
        }
      }
      KeyCode::Enter => {
        if let Some(record) = self.selected(ctx.collection) {
          return ViewAction::Push(Box::new(RecordDetailView::new(record.id)));
        }
      }
      KeyCode::Esc if !self.search.query().is_empty() => {
        self.search.clear();
        self.table_state.select(Some(0));
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(
    &mut self,
    frame: &mut Frame,
    area: Rect,
    collection: &Collection,
    resource: &ResourceConfig,
  ) {
    let table_area = match collection.load_error() {
      Some(error) => {
        let chunks = Layout::default()
          .direction(Direction::Vertical)
          .constraints([Constraint::Length(3), Constraint::Min(1)])
          .split(area);
        self.render_banner(frame, chunks[0], error);
        chunks[1]
      }
      None => area,
    };

    self.render_table(frame, table_area, collection, resource);

    // Overlays on top
    self.search.render_overlay(frame, table_area);
    match &self.overlay {
      Some(Overlay::Form(form)) => form.render_overlay(frame, area),
      Some(Overlay::Confirm(confirm)) => confirm.render_overlay(frame, area),
      None => {}
    }
  }

  fn breadcrumb_label(&self, resource: &ResourceConfig) -> String {
    format!("{} Listing", resource.label())
  }

  fn is_capturing_input(&self) -> bool {
    self.overlay.is_some() || self.search.is_active()
  }

  fn on_completion(&mut self, completion: &Completion) {
    match &mut self.overlay {
      Some(Overlay::Form(form)) if form.pending() == Some(completion.ticket) => {
        if completion.is_success() {
          self.overlay = None;
        } else {
          form.clear_pending();
        }
      }
      Some(Overlay::Confirm(confirm)) if confirm.pending() == Some(completion.ticket) => {
        if completion.is_success() {
          self.overlay = None;
        } else {
          confirm.clear_pending();
        }
      }
      _ => {}
    }
  }

  fn run_command(&mut self, action: &CommandAction, ctx: &mut ViewContext) -> bool {
    match action {
      CommandAction::New => {
        self.open_create(ctx.resource);
        true
      }
      _ => false,
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("n", "new").with_priority(30),
      ShortcutInfo::new("e", "edit").with_priority(40),
      ShortcutInfo::new("d", "delete").with_priority(50),
      ShortcutInfo::new("r", "reload").with_priority(60),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
