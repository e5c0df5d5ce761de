//! Command dispatch

use std::io::{self, BufRead};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::{NetworkSession, SentimentLevel};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::session::{handle_line, LineError, Reply};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::InsertOutcome;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

/// Counts of a finished script run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub executed: usize,
    pub failed: usize,
}

/// Execute the CLI command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        None | Some(Commands::Shell) => {
            let container = create_container(cli)?;
            let mut session = container.new_session();
            let stdin = io::stdin();
            run_shell(&mut session, stdin.lock(), &container.settings.prompt)
        }
        Some(Commands::Run { script, fail_fast }) => {
            let container = create_container(cli)?;
            cmd_run(&container, script, *fail_fast).map(|_| ())
        }
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "socialtree", &mut io::stdout());
            Ok(())
        }
    }
}

fn create_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.config.as_deref())?;
    Ok(ServiceContainer::new(settings))
}

/// Read commands from `input` until EOF or `quit`.
///
/// Failing commands are reported and the session continues.
pub fn run_shell<R: BufRead>(
    session: &mut NetworkSession,
    mut input: R,
    prompt: &str,
) -> CliResult<()> {
    let mut line = String::new();
    loop {
        output::prompt(prompt);
        line.clear();
        let read = input
            .read_line(&mut line)
            .map_err(|e| InfraError::io("read command", e))?;
        if read == 0 {
            output::info("");
            return Ok(());
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match handle_line(session, trimmed) {
            Ok(Reply::Quit) => return Ok(()),
            Ok(reply) => print_reply(&reply),
            Err(e) => report_line_error(&e),
        }
    }
}

#[instrument(level = "debug", skip(container))]
fn cmd_run(container: &ServiceContainer, script: &Path, fail_fast: bool) -> CliResult<ScriptSummary> {
    if !container.fs.exists(script) {
        return Err(CliError::InvalidArgs(format!(
            "script not found: {}",
            script.display()
        )));
    }
    let content = container
        .fs
        .read_to_string(script)
        .map_err(|e| InfraError::io(format!("read script {}", script.display()), e))?;
    let mut session = container.new_session();
    let summary = run_script(&mut session, &content, fail_fast)?;
    if summary.failed > 0 {
        output::warning(&format!(
            "{} of {} commands failed",
            summary.failed, summary.executed
        ));
    }
    Ok(summary)
}

/// Execute every non-blank, non-comment line of a script.
///
/// Errors are reported with their line number; with `fail_fast` the first one aborts.
pub fn run_script(
    session: &mut NetworkSession,
    content: &str,
    fail_fast: bool,
) -> CliResult<ScriptSummary> {
    let mut summary = ScriptSummary::default();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = idx + 1;
        summary.executed += 1;
        debug!("script line {}: {}", line_no, line);
        match handle_line(session, line) {
            Ok(Reply::Quit) => break,
            Ok(reply) => print_reply(&reply),
            Err(e) => {
                summary.failed += 1;
                if fail_fast {
                    return Err(CliError::ScriptFailed {
                        line: line_no,
                        message: line_error_message(&e),
                    });
                }
                output::error(&format!("line {}: {}", line_no, line_error_message(&e)));
            }
        }
    }
    Ok(summary)
}

fn line_error_message(e: &LineError) -> String {
    match e {
        LineError::Parse(err) => err
            .to_string()
            .lines()
            .next()
            .unwrap_or_default()
            .trim_start_matches("error: ")
            .to_string(),
        LineError::Command(err) => err.to_string(),
    }
}

fn report_line_error(e: &LineError) {
    match e {
        LineError::Parse(err) => {
            let _ = err.print();
        }
        LineError::Command(err) => output::error(err),
    }
}

fn print_reply(reply: &Reply) {
    match reply {
        Reply::Inserted { name, outcome } => match outcome {
            InsertOutcome::Root => output::success(&format!("added {} as root", name)),
            InsertOutcome::Child { parent } => {
                output::success(&format!("added {} under {}", name, parent))
            }
            InsertOutcome::Fallback { reason } => {
                output::warning(&format!("{}; added {} without parent", reason, name))
            }
        },
        Reply::Removed(removal) => {
            output::success(&format!("removed {}", removal.name));
            let target = removal.former_parent.as_deref().unwrap_or("root level");
            for child in &removal.relocated {
                output::moved(&format!("{} -> {}", child, target));
            }
        }
        Reply::Info(info) => output::info(info),
        Reply::Tree(rendered) => output::info(rendered.trim_end()),
        Reply::Interaction { name, total } => output::success(&format!(
            "recorded interaction for {} ({} total)",
            name, total
        )),
        Reply::Edited(info) => {
            output::success(&format!("updated profile of {}", info.name));
            output::info(info);
        }
        Reply::Exported(path) => output::action("Exported", &path.display()),
        Reply::Communities(communities) => {
            output::header(&format!("{} communities", communities.len()));
            for (i, members) in communities.iter().enumerate() {
                output::detail(&format!("{}: {}", i + 1, members.iter().join(", ")));
            }
        }
        Reply::Centrality(scores) => {
            output::header("Betweenness centrality");
            for (name, score) in scores {
                output::detail(&format!("{}: {:.4}", name, score));
            }
        }
        Reply::Sentiment { name, score } => output::info(&format!(
            "{}: {:.4} ({})",
            name,
            score,
            SentimentLevel::from_score(*score)
        )),
        Reply::Sentiments(report) => {
            output::header("Sentiment");
            for entry in report {
                match entry.score {
                    Some(score) => output::detail(&format!(
                        "{}: {:.4} ({})",
                        entry.name,
                        score,
                        SentimentLevel::from_score(score)
                    )),
                    None => output::detail(&format!("{}: no interactions", entry.name)),
                }
            }
        }
        Reply::Help(text) => output::info(text.trim_end()),
        Reply::Quit => {}
    }
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            output::info(settings.to_toml()?.trim_end());
        }
        ConfigCommands::Path => {
            let fs = RealFileSystem;
            match global_config_path() {
                Some(path) => print_config_path(&fs, "Global", &path),
                None => output::action("Global", &"(no config directory)"),
            }
            let local = cli
                .config
                .clone()
                .unwrap_or_else(|| local_config_path(Path::new(".")));
            print_config_path(&fs, "Local", &local);
        }
        ConfigCommands::Init => output::info(Settings::template().trim_end()),
    }
    Ok(())
}

fn print_config_path(fs: &dyn FileSystem, label: &str, path: &Path) {
    let state = if fs.exists(path) { "" } else { " (not found)" };
    output::action(label, &format!("{}{}", path.display(), state));
}
