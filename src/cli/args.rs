//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands and override the
//! configuration file and environment:
//! - `--config <path>`: Read this config file instead of the default search
//! - `--url <url>`: Service document URL
//! - `--binding <name>`: `atompub` or `browser`
//! - `--user <name>`: Username (password from config or `CMIS_PASSWORD`)
//! - `--repository <id>`: Repository to open
//! - `--debug`: Enable debug logging

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cmis - Inspect CMIS repositories from the command line
#[derive(Parser, Debug)]
#[command(name = "cmis")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Service document URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Wire binding (atompub or browser)
    #[arg(long, global = true)]
    pub binding: Option<String>,

    /// Username for basic authentication
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Repository id; the first advertised repository otherwise
    #[arg(long, global = true)]
    pub repository: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the repositories advertised by the service
    Repos,

    /// Show repository information
    #[command(
        after_help = "\
EXAMPLES:
    cmis --url http://localhost:8080/cmis/atom info
    cmis --repository main info"
    )]
    Info,

    /// Show repository capabilities
    Caps,

    /// List a folder's children
    Ls {
        /// Folder path
        #[arg(default_value = "/")]
        path: String,

        /// Maximum number of items to list
        #[arg(long)]
        max_items: Option<u32>,
    },

    /// Print a document's content to stdout
    Cat {
        /// Document path
        path: String,
    },

    /// Run a CMIS query
    #[command(
        after_help = "\
EXAMPLES:
    cmis query \"SELECT * FROM cmis:document WHERE cmis:name LIKE 'report%'\"
    cmis query --max-items 5 \"SELECT cmis:name FROM cmis:folder\""
    )]
    Query {
        /// Query statement, passed to the server verbatim
        statement: String,

        /// Maximum number of results
        #[arg(long)]
        max_items: Option<u32>,
    },

    /// List base types, or the children of a type
    Types {
        /// Parent type id
        type_id: Option<String>,
    },

    /// List the versions of a document
    Versions {
        /// Document path
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cmis", "ls", "/Sites", "--url", "http://h/cmis/atom", "--debug",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://h/cmis/atom"));
        assert!(cli.debug);
        match cli.command {
            Command::Ls { path, max_items } => {
                assert_eq!(path, "/Sites");
                assert_eq!(max_items, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn ls_defaults_to_root() {
        let cli = Cli::try_parse_from(["cmis", "ls"]).unwrap();
        assert!(matches!(cli.command, Command::Ls { ref path, .. } if path == "/"));
    }

    #[test]
    fn query_requires_statement() {
        assert!(Cli::try_parse_from(["cmis", "query"]).is_err());
    }
}
