//! Command registry and line tokenizer.
//!
//! Commands are resolved by case-insensitive prefix so operators can type
//! memorable abbreviations (`st` for `sta`, `lev` for `level`). An exact
//! match always wins, even when the same text is a prefix of longer names.
//!
//! Handlers are pure: they validate arguments and return an [`Action`] that
//! the session carries out. Only the session touches the control channel.

pub mod builtin;

use crate::error::CommandError;

/// Maximum number of tokens split from one input line. The last token keeps
/// the unsplit remainder of the line.
pub const MAX_TOKENS: usize = 10;

/// What a command asks the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a protocol command and print the reply.
    Send(String),
    /// Enumerate and print every connected station.
    AllStations,
    /// Switch to the named interface, or list interfaces when `None`.
    Interface(Option<String>),
    /// Print the command table.
    Help,
    /// End the interactive loop.
    Quit,
}

/// Argument validation and formatting for one command.
pub type Handler = fn(&[String]) -> Result<Action, CommandError>;

/// A named command.
#[derive(Debug, Clone, Copy)]
pub struct Command {
    /// Name as typed by the operator.
    pub name: &'static str,
    /// Argument synopsis shown in help, e.g. `<addr>`.
    pub usage: &'static str,
    /// One-line description shown in help.
    pub summary: &'static str,
    /// Argument handler.
    pub handler: Handler,
}

impl Command {
    fn matches_prefix(&self, token: &str) -> bool {
        let name = self.name.as_bytes();
        let token = token.as_bytes();
        name.len() >= token.len() && name[..token.len()].eq_ignore_ascii_case(token)
    }
}

/// Outcome of resolving a typed token.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// Exactly one command matched (or one matched exactly).
    Found(&'a Command),
    /// Several commands share the prefix; names in registration order.
    Ambiguous(Vec<&'static str>),
    /// Nothing matched.
    Unknown,
}

/// Ordered table of commands with unique, case-insensitive names.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in command table.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for command in builtin::COMMANDS {
            // Built-in names are distinct; the tests below check it.
            if let Err(e) = registry.register(*command) {
                tracing::error!(error = %e, "skipping built-in command");
            }
        }
        registry
    }

    /// Adds a command at the end of the table.
    ///
    /// Fails with [`CommandError::Duplicate`] when the name (ignoring case)
    /// is already taken.
    pub fn register(&mut self, command: Command) -> Result<(), CommandError> {
        if self
            .commands
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(command.name))
        {
            return Err(CommandError::Duplicate { name: command.name });
        }
        self.commands.push(command);
        Ok(())
    }

    /// Returns all commands in registration order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Resolves `token` against the registered names.
    pub fn resolve(&self, token: &str) -> Resolution<'_> {
        if token.is_empty() {
            return Resolution::Unknown;
        }
        if let Some(exact) = self
            .commands
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(token))
        {
            return Resolution::Found(exact);
        }

        let matches: Vec<&Command> = self
            .commands
            .iter()
            .filter(|c| c.matches_prefix(token))
            .collect();
        match matches.as_slice() {
            [] => Resolution::Unknown,
            [only] => Resolution::Found(only),
            many => Resolution::Ambiguous(many.iter().map(|c| c.name).collect()),
        }
    }

    /// Resolves `token`, turning non-unique outcomes into errors.
    pub fn lookup(&self, token: &str) -> Result<&Command, CommandError> {
        match self.resolve(token) {
            Resolution::Found(command) => Ok(command),
            Resolution::Ambiguous(candidates) => Err(CommandError::Ambiguous {
                token: token.to_string(),
                candidates,
            }),
            Resolution::Unknown => Err(CommandError::Unknown {
                token: token.to_string(),
            }),
        }
    }

    /// Resolves the first token and runs its handler on the rest.
    ///
    /// `tokens` must not be empty.
    pub fn parse(&self, tokens: &[String]) -> Result<Action, CommandError> {
        let (first, args) = tokens.split_first().ok_or_else(|| CommandError::Unknown {
            token: String::new(),
        })?;
        let command = self.lookup(first)?;
        (command.handler)(args)
    }

    /// Renders the help table.
    pub fn help_text(&self) -> String {
        let mut text = String::from("Commands:\n");
        for command in &self.commands {
            let synopsis = if command.usage.is_empty() {
                command.name.to_string()
            } else {
                format!("{} {}", command.name, command.usage)
            };
            text.push_str(&format!("   {:<20} {}\n", synopsis, command.summary));
        }
        text
    }
}

/// Splits an input line on whitespace. No quoting.
///
/// At most [`MAX_TOKENS`] tokens are produced; the last one carries the rest
/// of the line unsplit.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_end_matches(['\r', '\n']);
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        if tokens.len() == MAX_TOKENS - 1 {
            tokens.push(rest.trim_end().to_string());
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                tokens.push(rest[..end].to_string());
                rest = &rest[end..];
            }
            None => {
                tokens.push(rest.to_string());
                break;
            }
        }
    }
    tokens
}
