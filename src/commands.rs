//! Available commands and autocomplete logic

use crate::config::ResourceConfig;

/// What running a command does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
  /// Re-fetch the active collection
  Reload,
  /// Open the create form
  New,
  /// Switch to another configured resource
  Resource(String),
  Quit,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub name: String,
  pub aliases: Vec<String>,
  pub description: String,
  pub action: CommandAction,
}

impl Command {
  fn new(name: &str, aliases: &[&str], description: &str, action: CommandAction) -> Self {
    Self {
      name: name.to_string(),
      aliases: aliases.iter().map(|a| a.to_string()).collect(),
      description: description.to_string(),
      action,
    }
  }
}

/// Built-in commands plus one per configured resource
pub fn command_list(resources: &[ResourceConfig]) -> Vec<Command> {
  let mut commands = vec![
    Command::new("reload", &["r", "refresh"], "Re-fetch the list", CommandAction::Reload),
    Command::new("new", &["n", "create"], "Create a new record", CommandAction::New),
  ];

  for resource in resources {
    commands.push(Command::new(
      &resource.name,
      &[],
      &format!("Browse {}", resource.path()),
      CommandAction::Resource(resource.name.clone()),
    ));
  }

  commands.push(Command::new("quit", &["q", "exit"], "Exit restdeck", CommandAction::Quit));
  commands
}

/// Whether `name` is taken by a built-in command or one of its aliases
pub fn is_reserved(name: &str) -> bool {
  command_list(&[])
    .iter()
    .any(|cmd| cmd.name == name || cmd.aliases.iter().any(|a| a == name))
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions<'a>(commands: &'a [Command], input: &str) -> Vec<&'a Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return commands.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in commands {
    let aliases = || cmd.aliases.iter().map(String::as_str);

    let priority = if cmd.name == input_lower {
      0
    } else if aliases().any(|a| a == input_lower) {
      1
    } else if cmd.name.starts_with(&input_lower) {
      2
    } else if aliases().any(|a| a.starts_with(&input_lower)) {
      3
    } else if cmd.name.contains(&input_lower) {
      4
    } else if aliases().any(|a| a.contains(&input_lower)) {
      5
    } else {
      continue;
    };

    matches.push((cmd, priority));
  }

  // Stable sort keeps declaration order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
