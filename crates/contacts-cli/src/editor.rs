//! Interactive editing support
//!
//! Launches the user's editor for the contact template and handles the
//! small prompts (confirmation, picking one of several matches).

use anyhow::{bail, Result};
use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use contacts_core::{Config, EditorLauncher};

/// Runs an editor command on a file and waits for it
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
}

impl CommandLauncher {
    /// Build from an editor command line such as `code --wait`
    pub fn new(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let Some(program) = parts.next() else {
            bail!("Editor command is empty");
        };
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Use the configured editor or the first one found
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&find_editor(config)?)
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl EditorLauncher for CommandLauncher {
    fn launch(&self, path: &Path) -> io::Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()?;

        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "editor '{}' exited with {}. Check that your editor is configured correctly.",
                    self.program, status
                ),
            ))
        }
    }
}

/// Find the user's preferred editor
///
/// Uses the configured editor, $EDITOR, $VISUAL, or falls back to common
/// editors.
fn find_editor(config: &Config) -> Result<String> {
    if let Some(editor) = config.editor.as_deref().filter(|e| !e.trim().is_empty()) {
        return Ok(editor.to_string());
    }

    // Check environment variables
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = env::var(var) {
            if !editor.trim().is_empty() {
                return Ok(editor);
            }
        }
    }

    // Try common editors
    let common_editors = ["nano", "vim", "vi", "emacs"];

    for editor in common_editors {
        if command_exists(editor) {
            return Ok(editor.to_string());
        }
    }

    bail!(
        "No editor found. Set $EDITOR or the editor config key.\n\
         Example: contacts config set editor nano"
    )
}

/// Check if a command exists in PATH
fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    // Check if stdin is a TTY
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Let the user pick one of several entries
///
/// Returns the 0-based index of the chosen entry.
pub fn choose(prompt: &str, entries: &[String]) -> Result<usize> {
    if !atty::is(atty::Stream::Stdin) {
        bail!(
            "{} contacts match. Narrow the search to select one.",
            entries.len()
        );
    }

    for (index, entry) in entries.iter().enumerate() {
        println!("{:>3}  {}", index + 1, entry);
    }
    print!("{} [1-{}]: ", prompt, entries.len());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    match parse_selection(&input, entries.len()) {
        Some(index) => Ok(index),
        None => bail!("Invalid selection '{}'", input.trim()),
    }
}

/// Parse a 1-based selection into an index below `count`
fn parse_selection(input: &str, count: usize) -> Option<usize> {
    let number: usize = input.trim().parse().ok()?;
    if (1..=count).contains(&number) {
        Some(number - 1)
    } else {
        None
    }
}
