//! Interactive editing shell
//!
//! Joins a session (through the relay when one is configured, otherwise
//! locally) and reads `:commands` from stdin while applying events from
//! other participants as they arrive. Suggestion requests run on their own
//! task so a slow service never stalls incoming events.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

use nexus_core::files::{self, ProjectFiles};
use nexus_core::session::{EditOutcome, RollbackOutcome, Session, SessionUpdate};
use nexus_core::storage::VersionStore;
use nexus_core::suggest::{SuggestionError, SuggestionGateway, SuggestionKind};
use nexus_core::sync::{MemoryHub, RelayConfig, RelayTransport, Transport, TransportEvent};
use nexus_core::{Config, Document, Language};

use crate::commands::suggest::gateway;
use crate::output::Output;

const HELP: &str = "\
Commands:
  :show               Print the document
  :set TEXT           Replace the whole document
  :append TEXT        Append a line (plain input does the same)
  :line N TEXT        Replace line N
  :undo / :redo       Step through history
  :cursor LINE COL    Share your cursor position
  :who                List participants
  :save               Save a version
  :versions           List saved versions
  :rollback ID        Restore a saved version
  :open PATH          Load a project file
  :suggest [KIND]     Ask for a suggestion (suggest_improvements, explain_code,
                      add_comments, optimize_performance, fix_bugs)
  :accept             Append the last suggestion
  :export DIR         Write the document to DIR
  :help               Show this help
  :quit               Leave the session
Use \\n in TEXT for a newline.";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Show,
    Set(String),
    Append(String),
    Line(usize, String),
    Undo,
    Redo,
    Cursor(u32, u32),
    Who,
    Save,
    Versions,
    Rollback(i64),
    Open(PathBuf),
    Suggest(SuggestionKind),
    Accept,
    Export(PathBuf),
    Help,
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

type SuggestionResult = Result<String, SuggestionError>;

/// Options for `nexus edit`
pub struct EditOptions {
    pub file: Option<PathBuf>,
    pub session: String,
    pub name: Option<String>,
    pub relay: Option<String>,
}

/// Join a session and run the shell until `:quit` or end of input
pub async fn run(config: &Config, options: EditOptions, output: &Output) -> Result<()> {
    let origin_id = uuid::Uuid::new_v4().to_string();
    let display_name = options
        .name
        .clone()
        .or_else(|| config.display_name.clone())
        .unwrap_or_else(|| format!("User-{}", &origin_id[..4]));

    let project = ProjectFiles::new(
        std::env::current_dir().context("Failed to read current directory")?,
    );
    let versions = VersionStore::open_or_in_memory(config.versions_path());
    if versions.path().is_none() {
        output.warning("Version catalog unavailable; versions are kept for this session only.");
    }

    let relay_url = options
        .relay
        .clone()
        .or_else(|| config.active_relay_url().map(str::to_string));

    match relay_url {
        Some(url) => {
            output.message(&format!(
                "Joining session '{}' via {} as {}",
                options.session, url, display_name
            ));
            let (transport, events) =
                RelayTransport::join(RelayConfig::new(url), &options.session, &origin_id);
            let session = Session::new(transport, Document::untitled(), display_name, versions);
            run_shell(session, events, project, options.file, config, output).await
        }
        None => {
            output.message(&format!(
                "No relay configured; editing locally as {}",
                display_name
            ));
            let hub = MemoryHub::new();
            let (transport, events) = hub.join(&options.session, &origin_id);
            let session = Session::new(transport, Document::untitled(), display_name, versions);
            run_shell(session, events, project, options.file, config, output).await
        }
    }
}

async fn run_shell<T: Transport>(
    session: Session<T>,
    mut events: UnboundedReceiver<TransportEvent>,
    project: ProjectFiles,
    file: Option<PathBuf>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    let (suggestion_tx, mut suggestion_rx) = mpsc::unbounded_channel();
    let mut shell = Shell {
        session: session.with_validation(config.validate_edits),
        project,
        config,
        output,
        suggestion: None,
        suggestion_tx,
        suggestion_pending: false,
    };

    if let Some(file) = file {
        shell.open(&file)?;
    }
    output.message("Type :help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut events_open = true;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                if let Flow::Quit = shell.execute(&line) {
                    break;
                }
            }
            Some(result) = suggestion_rx.recv() => shell.suggestion_ready(result),
            event = events.recv(), if events_open => match event {
                Some(event) => {
                    let update = shell.session.handle_transport_event(event);
                    shell.report(update);
                }
                None => {
                    debug!("transport event channel closed");
                    events_open = false;
                }
            },
        }
    }

    shell.session.close();
    output.message("Left the session.");
    Ok(())
}

struct Shell<'a, T: Transport> {
    session: Session<T>,
    project: ProjectFiles,
    config: &'a Config,
    output: &'a Output,
    /// Last suggestion received, waiting for `:accept`
    suggestion: Option<String>,
    suggestion_tx: UnboundedSender<SuggestionResult>,
    suggestion_pending: bool,
}

impl<T: Transport> Shell<'_, T> {
    fn execute(&mut self, line: &str) -> Flow {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                self.output.warning(&e.to_string());
                return Flow::Continue;
            }
        };

        match self.apply(command) {
            Ok(flow) => flow,
            Err(e) => {
                self.output.warning(&format!("{:#}", e));
                Flow::Continue
            }
        }
    }

    fn apply(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::Show => {
                self.output.print_document(self.session.document());
                if let Some(held) = self.session.held_edit() {
                    self.output
                        .warning(&format!("Unshared edit held back: {}", held.error));
                }
            }
            ShellCommand::Set(text) => self.edit(text),
            ShellCommand::Append(text) => {
                let content = self.session.content();
                let text = if content.is_empty() {
                    text
                } else if content.ends_with('\n') {
                    format!("{}{}", content, text)
                } else {
                    format!("{}\n{}", content, text)
                };
                self.edit(text);
            }
            ShellCommand::Line(n, text) => {
                let text = replace_line(self.session.content(), n, &text);
                self.edit(text);
            }
            ShellCommand::Undo => match self.session.undo() {
                Some(_) => self.output.success("Undone"),
                None => self.output.message("Nothing to undo."),
            },
            ShellCommand::Redo => match self.session.redo() {
                Some(_) => self.output.success("Redone"),
                None => self.output.message("Nothing to redo."),
            },
            ShellCommand::Cursor(line, column) => {
                let position = self.session.move_cursor(line, column);
                self.output.message(&format!(
                    "Cursor at line {}, col {}",
                    position.line, position.column
                ));
            }
            ShellCommand::Who => self
                .output
                .print_participants(self.session.local(), self.session.presence()),
            ShellCommand::Save => match self.session.save_version() {
                Ok(version) => self.output.success(&format!("Saved version {}", version.id)),
                Err(e) => {
                    let hint = e
                        .recovery_suggestion()
                        .map(|s| format!("\n  {}", s))
                        .unwrap_or_default();
                    bail!("Failed to save version: {}{}", e, hint);
                }
            },
            ShellCommand::Versions => self.output.print_versions(self.session.versions().list()),
            ShellCommand::Rollback(id) => match self.session.rollback(id) {
                RollbackOutcome::Restored => {
                    self.output.success(&format!("Restored version {}", id))
                }
                RollbackOutcome::NotFound => bail!("Version not found: {}", id),
            },
            ShellCommand::Open(path) => self.open(&path)?,
            ShellCommand::Suggest(kind) => {
                if self.suggestion_pending {
                    bail!("A suggestion is already on its way.");
                }
                let gateway = gateway(self.config)?;
                self.output.message(&format!("Requesting {}...", kind));
                spawn_suggestion(
                    gateway,
                    self.session.content().to_string(),
                    self.session.document().language,
                    kind,
                    self.suggestion_tx.clone(),
                );
                self.suggestion_pending = true;
            }
            ShellCommand::Accept => {
                let Some(suggestion) = self.suggestion.take() else {
                    bail!("No suggestion to accept. Run :suggest first.");
                };
                self.session.accept_suggestion(&suggestion);
                self.output.success("Suggestion applied");
            }
            ShellCommand::Export(dir) => {
                let path = files::export(self.session.document(), &dir)?;
                self.output
                    .success(&format!("Exported to {}", path.display()));
            }
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn open(&mut self, path: &std::path::Path) -> Result<()> {
        let file = self
            .project
            .load(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        self.session.load_file(file);
        let document = self.session.document();
        self.output.success(&format!(
            "Opened {} ({}, {} lines)",
            document.file_name,
            document.language,
            document.line_count()
        ));
        Ok(())
    }

    fn edit(&mut self, content: String) {
        match self.session.edit(content) {
            EditOutcome::Applied => {}
            EditOutcome::Unchanged => self.output.message("No change."),
            EditOutcome::Held(error) => self.output.warning(&format!(
                "{}. The edit is kept locally and not shared.",
                error
            )),
        }
    }

    fn suggestion_ready(&mut self, result: SuggestionResult) {
        self.suggestion_pending = false;
        match result {
            Ok(suggestion) => {
                println!("{}", suggestion);
                self.output.message("Type :accept to append it to the document.");
                self.suggestion = Some(suggestion);
            }
            Err(e) => self.output.warning(&format!("Suggestion failed: {}", e)),
        }
    }

    fn report(&self, update: SessionUpdate) {
        match update {
            SessionUpdate::Subscribed => self.output.message("Connected."),
            SessionUpdate::Disconnected => self
                .output
                .warning("Disconnected from the relay. Edits stay local until it reconnects."),
            SessionUpdate::ContentReplaced { origin } => {
                let name = self
                    .session
                    .presence()
                    .participant(&origin)
                    .map(|p| p.display_name.clone())
                    .unwrap_or(origin);
                self.output
                    .message(&format!("{} updated the document.", name));
            }
            SessionUpdate::ParticipantJoined {
                participant,
                is_new: true,
            } => self
                .output
                .message(&format!("{} joined.", participant.display_name)),
            SessionUpdate::ParticipantLeft {
                participant: Some(participant),
                ..
            } => self
                .output
                .message(&format!("{} left.", participant.display_name)),
            _ => {}
        }
    }
}

/// Ask for a suggestion on a background task; the outcome arrives on `results`
fn spawn_suggestion(
    gateway: SuggestionGateway,
    code: String,
    language: Language,
    kind: SuggestionKind,
    results: UnboundedSender<SuggestionResult>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = gateway.request(&code, language, kind).await;
        if results.send(result).is_err() {
            debug!("shell closed before the suggestion arrived");
        }
    })
}

/// Parse one input line. Blank lines yield `None`; plain text appends.
fn parse_command(line: &str) -> Result<Option<ShellCommand>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }

    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Some(ShellCommand::Append(unescape(line))));
    };

    let (name, args) = match rest.split_once(' ') {
        Some((name, args)) => (name, args),
        None => (rest, ""),
    };

    let command = match name {
        "show" | "s" => ShellCommand::Show,
        "set" => ShellCommand::Set(unescape(args)),
        "append" | "a" => ShellCommand::Append(unescape(args)),
        "line" | "l" => {
            let (n, text) = args.split_once(' ').unwrap_or((args, ""));
            let n = parse_number::<usize>(n, "line number")?;
            if n == 0 {
                bail!("Line numbers start at 1");
            }
            ShellCommand::Line(n, unescape(text))
        }
        "undo" | "u" => ShellCommand::Undo,
        "redo" | "r" => ShellCommand::Redo,
        "cursor" => {
            let mut parts = args.split_whitespace();
            let line = parse_number(parts.next().unwrap_or(""), "line")?;
            let column = parse_number(parts.next().unwrap_or(""), "column")?;
            ShellCommand::Cursor(line, column)
        }
        "who" => ShellCommand::Who,
        "save" | "w" => ShellCommand::Save,
        "versions" => ShellCommand::Versions,
        "rollback" => ShellCommand::Rollback(parse_number(args.trim(), "version id")?),
        "open" | "o" => ShellCommand::Open(required_path(args, "open")?),
        "suggest" => {
            let kind = args.trim();
            if kind.is_empty() {
                ShellCommand::Suggest(SuggestionKind::default())
            } else {
                ShellCommand::Suggest(kind.parse()?)
            }
        }
        "accept" => ShellCommand::Accept,
        "export" => ShellCommand::Export(required_path(args, "export")?),
        "help" | "h" | "?" => ShellCommand::Help,
        "quit" | "q" | "exit" => ShellCommand::Quit,
        other => bail!("Unknown command ':{}'. Type :help for commands.", other),
    };
    Ok(Some(command))
}

fn parse_number<N: std::str::FromStr>(s: &str, what: &str) -> Result<N> {
    s.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid {}: '{}'", what, s.trim()))
}

fn required_path(args: &str, command: &str) -> Result<PathBuf> {
    let path = args.trim();
    if path.is_empty() {
        bail!("Usage: :{} PATH", command);
    }
    Ok(PathBuf::from(path))
}

/// Expand `\n`, `\t` and `\\`
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Replace 1-based line `n`, padding with empty lines if needed
fn replace_line(content: &str, n: usize, text: &str) -> String {
    let mut lines: Vec<&str> = content.split('\n').collect();
    if content.is_empty() {
        lines.clear();
    }
    while lines.len() < n {
        lines.push("");
    }
    lines[n - 1] = text;
    lines.join("\n")
}
