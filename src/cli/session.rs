//! Session command language
//!
//! Each shell or script line is split on whitespace and parsed with clap,
//! without a binary name. `help` and `<command> --help` come from clap.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::application::services::NetworkSession;
use crate::application::ApplicationError;
use crate::domain::{InsertOutcome, ProfileUpdate, Removal, UserInfo, UserSentiment};

#[derive(Parser, Debug)]
#[command(name = "socialtree", no_binary_name = true, disable_version_flag = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Add a user, optionally introduced by PARENT
    Add { name: String, parent: Option<String> },

    /// Remove a user; its children move up to its parent
    Remove { name: String },

    /// Show a user with parent, children and interactions
    Search { name: String },

    /// Render the hierarchy
    Tree,

    /// Record an interaction text for a user
    Interact {
        name: String,
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },

    /// Edit a profile; omitted fields keep their value
    Edit {
        name: String,
        /// New user name
        #[arg(long = "name")]
        new_name: Option<String>,
        /// Profile image reference
        #[arg(long)]
        image: Option<String>,
        /// Biography, may span several words
        #[arg(long, num_args = 1..)]
        bio: Vec<String>,
    },

    /// Write the hierarchy as a Graphviz .dot file
    Export { filename: Option<String> },

    /// Detect communities in the relationship graph
    Communities,

    /// Betweenness centrality of every user
    Centrality,

    /// Mean interaction polarity of one user, or of everyone
    Sentiment { name: Option<String> },

    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

/// Result of one executed session command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Inserted { name: String, outcome: InsertOutcome },
    Removed(Removal),
    Info(UserInfo),
    Tree(String),
    Interaction { name: String, total: usize },
    Edited(UserInfo),
    Exported(PathBuf),
    Communities(Vec<BTreeSet<String>>),
    Centrality(BTreeMap<String, f64>),
    Sentiment { name: String, score: f64 },
    Sentiments(Vec<UserSentiment>),
    Help(String),
    Quit,
}

#[derive(Debug)]
pub enum LineError {
    /// The line is not a valid command
    Parse(clap::Error),
    /// The command ran and was rejected
    Command(ApplicationError),
}

pub fn parse_line(line: &str) -> Result<SessionCommand, clap::Error> {
    SessionLine::try_parse_from(line.split_whitespace()).map(|parsed| parsed.command)
}

/// Parse and execute one line; help requests are a reply, not an error.
pub fn handle_line(session: &mut NetworkSession, line: &str) -> Result<Reply, LineError> {
    match parse_line(line) {
        Ok(command) => execute(session, command).map_err(LineError::Command),
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            Ok(Reply::Help(e.to_string()))
        }
        Err(e) => Err(LineError::Parse(e)),
    }
}

pub fn execute(
    session: &mut NetworkSession,
    command: SessionCommand,
) -> Result<Reply, ApplicationError> {
    debug!("execute: {:?}", command);
    let reply = match command {
        SessionCommand::Add { name, parent } => {
            let outcome = session.registry_mut().insert(&name, parent.as_deref())?;
            Reply::Inserted {
                name: name.trim().to_string(),
                outcome,
            }
        }
        SessionCommand::Remove { name } => Reply::Removed(session.registry_mut().remove(&name)?),
        SessionCommand::Search { name } => Reply::Info(session.registry().search(&name)?),
        SessionCommand::Tree => Reply::Tree(session.registry().render_tree()?.to_string()),
        SessionCommand::Interact { name, text } => {
            session.registry_mut().add_interaction(&name, &text.join(" "))?;
            let total = session
                .registry()
                .user(&name)
                .map_or(0, |user| user.interactions().len());
            Reply::Interaction { name, total }
        }
        SessionCommand::Edit {
            name,
            new_name,
            image,
            bio,
        } => {
            let mut update = ProfileUpdate::default();
            if let Some(new_name) = new_name {
                update = update.with_name(new_name);
            }
            if let Some(image) = image {
                update = update.with_profile_image(image);
            }
            if !bio.is_empty() {
                update = update.with_bio(bio.join(" "));
            }
            Reply::Edited(session.registry_mut().edit_profile(&name, &update)?)
        }
        SessionCommand::Export { filename } => {
            Reply::Exported(session.export_tree(filename.as_deref())?)
        }
        SessionCommand::Communities => Reply::Communities(session.communities()),
        SessionCommand::Centrality => Reply::Centrality(session.centrality()),
        SessionCommand::Sentiment { name: Some(name) } => {
            let score = session.sentiment(&name)?;
            Reply::Sentiment { name, score }
        }
        SessionCommand::Sentiment { name: None } => Reply::Sentiments(session.sentiments()),
        SessionCommand::Quit => Reply::Quit,
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_session_cli() {
        use clap::CommandFactory;
        SessionLine::command().debug_assert();
    }

    #[test]
    fn given_interact_line_then_text_words_are_collected() {
        let command = parse_line("interact Ana I love --this").unwrap();
        assert_eq!(
            command,
            SessionCommand::Interact {
                name: "Ana".to_string(),
                text: vec!["I".into(), "love".into(), "--this".into()],
            }
        );
    }

    #[test]
    fn given_exit_alias_then_parses_as_quit() {
        assert_eq!(parse_line("exit").unwrap(), SessionCommand::Quit);
    }

    #[test]
    fn given_unknown_command_then_parse_fails() {
        let err = parse_line("befriend Ana Bruno").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }
}
