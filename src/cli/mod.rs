//! CLI module: command parser, REPL and script runner

pub mod formatting;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::host::ClassRegistry;
use crate::script::Session;

/// Output marker telling the REPL loop to stop
pub const QUIT: &str = "__QUIT__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    ConfigShow,
    ListClasses,
    ListVars,
    RunScript(PathBuf),
    Statement(String),
    Empty,
}

pub fn parse_command(input: &str) -> Command {
    let line = input.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    if let Some(rest) = line.strip_prefix('/') {
        let mut parts = rest.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_lowercase();
        match cmd.as_str() {
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            "config" => match parts.next() {
                Some("show") => Command::ConfigShow,
                _ => Command::Help,
            },
            "classes" => Command::ListClasses,
            "vars" => Command::ListVars,
            "run" => {
                let path = parts.collect::<Vec<_>>().join(" ");
                if path.is_empty() {
                    Command::Help
                } else {
                    Command::RunScript(PathBuf::from(path))
                }
            }
            _ => Command::Help,
        }
    } else {
        Command::Statement(line.to_string())
    }
}

pub struct CliState {
    pub config: AppConfig,
    pub session: Session,
    line_no: usize,
}

impl CliState {
    /// Initialize from loaded config (AppConfig::load)
    pub fn initialize() -> Result<Self> {
        let mut config = AppConfig::load()?;
        config.apply_env_overrides();
        Self::new_with_config(config)
    }

    /// Create a CLI state from a provided config
    pub fn new_with_config(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let mut registry = ClassRegistry::new();
        if config.plugins.builtin {
            registry.register_builtin()?;
        }
        if config.plugins.enabled {
            let dir = config.plugins.resolved_dir();
            let stats = registry
                .load_directory(&dir)
                .with_context(|| format!("loading plugins from {}", dir.display()))?;
            if stats.failed > 0 {
                warn!(
                    "{} of {} plugin libraries failed to load",
                    stats.failed, stats.total
                );
            }
        }

        let classes = registry.class_names();
        if classes.is_empty() {
            warn!("No classes are bound; enable builtin bindings or add plugins");
        } else {
            info!("Bound classes: {}", classes.join(", "));
        }

        Ok(Self {
            config,
            session: Session::new(registry),
            line_no: 0,
        })
    }

    /// Handle a single line of input. Returns an optional output string.
    ///
    /// Script errors are reported as output so an interactive session keeps
    /// going; only I/O failures are returned as errors.
    pub async fn handle_line(&mut self, line: &str) -> Result<Option<String>> {
        match parse_command(line) {
            Command::Empty => Ok(None),
            Command::Help => Ok(Some(formatting::render_help())),
            Command::Quit => Ok(Some(QUIT.to_string())),
            Command::ConfigShow => {
                let summary = self.config.summary();
                Ok(Some(formatting::render_config(&summary)))
            }
            Command::ListClasses => {
                let registry = self.session.registry();
                let items: Vec<String> = registry
                    .classes()
                    .map(|class| {
                        let methods: Vec<&str> =
                            class.methods().iter().map(|m| m.name.as_str()).collect();
                        format!(
                            "{} ({}): {} [{}]",
                            class.name(),
                            class.plugin_name(),
                            class.description(),
                            methods.join(", ")
                        )
                    })
                    .collect();
                if items.is_empty() {
                    Ok(Some("No classes are bound.".to_string()))
                } else {
                    Ok(Some(formatting::render_list("Classes", items)))
                }
            }
            Command::ListVars => {
                let items: Vec<String> = self
                    .session
                    .variables()
                    .map(|(name, binding)| format!("{} = {}", name, binding))
                    .collect();
                if items.is_empty() {
                    Ok(Some("No variables defined.".to_string()))
                } else {
                    Ok(Some(formatting::render_list("Variables", items)))
                }
            }
            Command::RunScript(path) => match self.run_script(&path).await {
                Ok(lines) => Ok(Some(lines.join("\n")).filter(|s| !s.is_empty())),
                Err(e) => Ok(Some(format!("Error: {:#}", e))),
            },
            Command::Statement(text) => {
                self.line_no += 1;
                match self.session.run_line(self.line_no, &text) {
                    Ok(out) => Ok(out),
                    Err(e) => Ok(Some(format!("Error: {}", e))),
                }
            }
        }
    }

    /// Run a script file in the current session and return what it printed
    pub async fn run_script(&mut self, path: &Path) -> Result<Vec<String>> {
        let source = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading script {}", path.display()))?;
        info!("Running script {}", path.display());
        let printed = self
            .session
            .run_source(&source)
            .with_context(|| format!("in {}", path.display()))?;
        Ok(printed)
    }

    pub async fn run_repl(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();
        let mut stdout = tokio::io::stdout();

        stdout.write_all(self.config.summary().as_bytes()).await?;
        stdout.write_all(b"\nType /help for commands.\n").await?;
        stdout.flush().await?;

        loop {
            stdout.write_all(self.config.ui.prompt.as_bytes()).await?;
            stdout.flush().await?;

            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                break;
            } // EOF
            if let Some(out) = self.handle_line(&line).await? {
                if out == QUIT {
                    break;
                }
                stdout.write_all(out.as_bytes()).await?;
                if !out.ends_with('\n') {
                    stdout.write_all(b"\n").await?;
                }
                stdout.flush().await?;
            }
        }
        Ok(())
    }
}
