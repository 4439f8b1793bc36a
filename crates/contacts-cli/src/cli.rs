//! Command line definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use contacts_core::Query;

#[derive(Parser, Debug)]
#[command(name = "contacts")]
#[command(about = "Manage a directory of vCard contacts")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log debug output to stderr (or the configured log file)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this config file instead of the default
    #[arg(long = "config", global = true, value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new contact
    #[command(alias = "new")]
    Add(AddArgs),
    /// List contacts
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        selector: Selector,
        /// Print "nick: Name <mail>" lines for mail clients
        #[arg(long)]
        sup: bool,
    },
    /// Show details of one contact
    Show {
        #[command(flatten)]
        selector: Selector,
    },
    /// Edit one contact in the editor
    Edit {
        #[command(flatten)]
        selector: Selector,
    },
    /// Delete one contact
    #[command(alias = "delete", alias = "rm")]
    Del {
        #[command(flatten)]
        selector: Selector,
    },
    /// List categories with usage counts
    Categories,
    /// Show address book status
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Args, Debug, Default)]
pub struct AddArgs {
    /// First name
    #[arg(short, long)]
    pub first: Option<String>,
    /// Last name
    #[arg(short, long)]
    pub last: Option<String>,
    /// Nickname
    #[arg(short, long)]
    pub nick: Option<String>,
    /// Save without opening the editor
    #[arg(short = 'E', long)]
    pub no_edit: bool,
}

/// Search term and category filter shared by the contact commands
#[derive(Args, Debug, Default, Clone)]
pub struct Selector {
    /// Search term (name, nickname, mail or phone)
    pub query: Option<String>,
    /// Only contacts in these categories (comma separated)
    #[arg(short, long = "categories", value_delimiter = ',')]
    pub categories: Vec<String>,
}

impl Selector {
    pub fn to_query(&self) -> Query {
        let categories = self
            .categories
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        Query::new(self.query.clone().unwrap_or_default(), categories)
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (addressbook, editor, log_file)
        key: String,
        /// Configuration value (empty clears optional keys)
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_no_command() {
        let cli = parse(&["contacts"]);
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_add_flags() {
        let cli = parse(&["contacts", "add", "-f", "Ann", "-l", "Lee", "-n", "annie", "-E"]);
        match cli.command {
            Some(Commands::Add(args)) => {
                assert_eq!(args.first.as_deref(), Some("Ann"));
                assert_eq!(args.last.as_deref(), Some("Lee"));
                assert_eq!(args.nick.as_deref(), Some("annie"));
                assert!(args.no_edit);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = parse(&["contacts", "add", "--no-edit"]);
        assert!(matches!(cli.command, Some(Commands::Add(AddArgs { no_edit: true, .. }))));
    }

    #[test]
    fn test_list_with_categories() {
        let cli = parse(&["contacts", "list", "ann", "-c", "work, ,Friends", "--sup"]);
        match cli.command {
            Some(Commands::List { selector, sup }) => {
                assert!(sup);
                let query = selector.to_query();
                assert_eq!(query.term, "ann");
                assert_eq!(query.categories, vec!["work", "Friends"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_selector_without_query() {
        let cli = parse(&["contacts", "show"]);
        match cli.command {
            Some(Commands::Show { selector }) => assert_eq!(selector.to_query(), Query::all()),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_delete_aliases() {
        for name in ["del", "delete", "rm"] {
            let cli = parse(&["contacts", name, "bob"]);
            assert!(matches!(cli.command, Some(Commands::Del { .. })));
        }
    }

    #[test]
    fn test_global_flags_after_command() {
        let cli = parse(&["contacts", "list", "--json", "-v", "--config", "/tmp/c.toml"]);
        assert!(cli.json);
        assert!(cli.verbose);
        assert_eq!(cli.config_path, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn test_config_set() {
        let cli = parse(&["contacts", "config", "set", "editor", "vim"]);
        match cli.command {
            Some(Commands::Config {
                command: Some(ConfigCommands::Set { key, value }),
            }) => {
                assert_eq!(key, "editor");
                assert_eq!(value, "vim");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command_fails() {
        assert!(Cli::try_parse_from(["contacts", "frobnicate"]).is_err());
    }
}
