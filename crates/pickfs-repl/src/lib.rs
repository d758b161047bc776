//! pickfs console: drive the document provider by hand.
//!
//! Every command maps onto one provider operation, so the console exercises
//! the same code paths a file picker would:
//!
//! - Listing, lookup, search and recents (`ls`, `stat`, `find`, `recent`)
//! - Creation and mutation (`mkdir`, `touch`, `cp`, `mv`, `rename`, `rm`)
//! - Streaming or buffered transfers (`write`, `cat`)
//! - Control-surface actions (`reset`, `seed`) and debug toggles (`/buffer`, `/auth`)

use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Runtime;

use pickfs_kernel::store::{self, ROOT};
use pickfs_kernel::{
    CancellationToken, Change, ChangeLog, DocumentProvider, Node, ProviderConfig, paths,
};

/// Console state.
pub struct Repl {
    runtime: Runtime,
    provider: DocumentProvider,
    changes: Arc<ChangeLog>,
    done: bool,
}

impl Repl {
    /// Create a console using the user's config file, if any.
    pub fn new() -> Result<Self> {
        let config = ProviderConfig::load().context("Failed to load configuration")?;
        Self::with_config(config)
    }

    /// Create a console with an explicit configuration.
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start runtime")?;
        let changes = Arc::new(ChangeLog::new());
        let provider = DocumentProvider::new(&config, changes.clone());
        Ok(Self {
            runtime,
            provider,
            changes,
            done: false,
        })
    }

    /// True once `/quit` has been entered.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Process a single line of input.
    pub fn process_line(&mut self, line: &str) -> Result<Option<String>> {
        let trimmed = line.trim();

        if trimmed.starts_with('/') {
            return self.handle_meta_command(trimmed);
        }
        if trimmed.is_empty() {
            return Ok(None);
        }

        let words: Vec<&str> = trimmed.split_whitespace().collect();
        let (command, args) = match words.split_first() {
            Some((command, args)) => (*command, args),
            None => return Ok(None),
        };

        self.runtime.block_on(execute(&self.provider, command, args))
    }

    /// Handle a meta-command (starts with /).
    fn handle_meta_command(&mut self, cmd: &str) -> Result<Option<String>> {
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let command = parts.first().copied().unwrap_or("");
        let flags = self.provider.flags();

        match (command, parts.get(1).copied()) {
            ("/quit" | "/q" | "/exit", _) => {
                self.done = true;
                Ok(None)
            }
            ("/help" | "/h" | "/?", _) => Ok(Some(HELP_TEXT.to_string())),
            ("/buffer", Some(value)) => {
                flags.set_buffer_locally(parse_switch(value)?);
                Ok(Some(format!("buffer locally: {}", on_off(flags.buffer_locally()))))
            }
            ("/auth", Some(value)) => {
                flags.set_authenticated(parse_switch(value)?);
                Ok(Some(format!("authenticated: {}", on_off(flags.authenticated()))))
            }
            ("/flags", _) => Ok(Some(format!(
                "buffer locally: {}\nauthenticated: {}",
                on_off(flags.buffer_locally()),
                on_off(flags.authenticated())
            ))),
            ("/changes", _) => {
                let changes = self.changes.drain();
                if changes.is_empty() {
                    return Ok(Some("(no changes)".to_string()));
                }
                let lines: Vec<String> = changes
                    .iter()
                    .map(|c| match c {
                        Change::Document(path) => format!("changed {path}"),
                        Change::Roots => "changed <roots>".to_string(),
                    })
                    .collect();
                Ok(Some(lines.join("\n")))
            }
            _ => Ok(Some(format!(
                "Unknown command: {cmd}\nType /help for available commands."
            ))),
        }
    }
}

/// Run one document command against the provider.
async fn execute(
    provider: &DocumentProvider,
    command: &str,
    args: &[&str],
) -> Result<Option<String>> {
    match (command, args) {
        ("ls", []) => list(provider.query_children(ROOT).await?),
        ("ls", [path]) => list(provider.query_children(path).await?),
        ("stat", [path]) => Ok(Some(describe(&provider.query_document(path).await?))),
        ("mkdir", [path]) => {
            let created = provider
                .create_document(store::parent(path), store::name(path), true)
                .await?;
            Ok(Some(format!("created folder {created}")))
        }
        ("touch", [path]) => {
            let created = provider
                .create_document(store::parent(path), store::name(path), false)
                .await?;
            Ok(Some(format!("created file {created}")))
        }
        ("write", [path, text @ ..]) => {
            let text = text.join(" ");
            let mut writer = provider
                .open_document(path, "w", CancellationToken::new())
                .await?
                .into_writer()?;
            writer.write_all(text.as_bytes()).await?;
            writer.finish().await?;
            Ok(Some(format!("wrote {} bytes to {path}", text.len())))
        }
        ("cat", [path]) => {
            let mut reader = provider
                .open_document(path, "r", CancellationToken::new())
                .await?
                .into_reader()?;
            let data = reader.read_all().await?;
            Ok(Some(String::from_utf8_lossy(&data).into_owned()))
        }
        ("cp", [source, target]) => {
            let copied = provider.copy_document(source, target).await?;
            Ok(Some(format!("copied to {copied}")))
        }
        ("mv", [source, target]) => {
            let moved = provider.move_document(source, target).await?;
            Ok(Some(format!("moved to {moved}")))
        }
        ("rename", [path, name]) => {
            let renamed = provider.rename_document(path, name).await?;
            Ok(Some(format!("renamed to {renamed}")))
        }
        ("rm", [path]) => {
            provider.delete_document(path).await?;
            Ok(None)
        }
        ("find", [query]) => list(provider.query_search(ROOT, query).await?),
        ("find", [query, scope]) => list(provider.query_search(scope, query).await?),
        ("recent", []) => list(provider.query_recent().await?),
        ("reset", []) => {
            provider.reset_all().await;
            Ok(Some("store reset".to_string()))
        }
        ("seed", []) => seed(provider, provider.seed_count()).await,
        ("seed", [count]) => {
            let count: usize = count
                .parse()
                .with_context(|| format!("not a count: {count}"))?;
            seed(provider, count).await
        }
        (
            "ls" | "stat" | "mkdir" | "touch" | "write" | "cat" | "cp" | "mv" | "rename"
            | "rm" | "find" | "recent" | "reset" | "seed",
            _,
        ) => bail!("wrong arguments for {command}; type /help for usage"),
        _ => bail!("unknown command: {command}; type /help for commands"),
    }
}

async fn seed(provider: &DocumentProvider, count: usize) -> Result<Option<String>> {
    let report = provider.seed_synthetic_tree(count).await;
    Ok(Some(format!(
        "generated {} ({} folders, {} files)",
        report.root, report.folders, report.files
    )))
}

fn parse_switch(value: &str) -> Result<bool> {
    match value {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => bail!("expected on or off, got {other}"),
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn list(nodes: Vec<Node>) -> Result<Option<String>> {
    if nodes.is_empty() {
        return Ok(Some("(empty)".to_string()));
    }
    let lines: Vec<String> = nodes.iter().map(describe).collect();
    Ok(Some(lines.join("\n")))
}

/// One line per node: kind, size, modified time, path.
fn describe(node: &Node) -> String {
    match node {
        Node::Folder { path } => format!("d {:>8} {:19} {path}", "-", ""),
        Node::File {
            path,
            data,
            modified,
        } => format!("f {:>8} {} {path}", data.len(), format_time(*modified)),
    }
}

fn format_time(time: SystemTime) -> String {
    let local: chrono::DateTime<chrono::Local> = time.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

const HELP_TEXT: &str = r#"pickfs console

Documents:
  ls [path]                 List nodes one level below path (default /)
  stat <path>               Show one node
  mkdir <path>              Create a folder
  touch <path>              Create an empty file
  write <path> <text...>    Write text through the transfer bridge
  cat <path>                Read a file through the transfer bridge
  cp <src> <target-folder>  Copy into a folder, keeping the name
  mv <src> <target-folder>  Move into a folder, keeping the name
  rename <path> <name>      Rename within the same folder
  rm <path>                 Delete (missing paths are fine)
  find <query> [scope]      Substring search under scope (default /)
  recent                    First entries in insertion order

Control:
  reset                     Drop everything but the root
  seed [count]              Generate a random tree

Meta:
  /buffer on|off            Use temp files instead of streaming pipes
  /auth on|off              Open or close the authentication gate
  /flags                    Show both toggles
  /changes                  Show and clear change notifications
  /help, /h, /?             Show this help
  /quit, /q, /exit          Exit the console
"#;

/// Run the console.
pub fn run() -> Result<()> {
    println!("pickfs v{}", env!("CARGO_PKG_VERSION"));
    println!("Type /help for commands, /quit to exit.\n");

    let mut rl = DefaultEditor::new().context("Failed to create editor")?;

    let history_path = paths::history_file();
    if let Err(e) = rl.load_history(&history_path) {
        tracing::debug!(path = %history_path.display(), error = %e, "no history loaded");
    }

    let mut repl = Repl::new()?;

    loop {
        match rl.readline("pickfs> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                match repl.process_line(&line) {
                    Ok(Some(output)) => println!("{output}"),
                    Ok(None) => {}
                    Err(e) => eprintln!("Error: {e:#}"),
                }
                if repl.is_done() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = rl.save_history(&history_path) {
        tracing::warn!(path = %history_path.display(), error = %e, "failed to save history");
    }

    Ok(())
}
