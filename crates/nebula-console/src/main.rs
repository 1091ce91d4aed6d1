//! Nebula Graph console
//!
//! Connects to a graph server, authenticates, and then runs queries either
//! interactively (history, keyword completion, namespace-aware prompt) or from
//! a script given with `-e` / `-f`.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::env;
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use nebula_console::completion::CompletionTree;
use nebula_console::{
    InputSource, InteractiveInput, PromptConfig, PromptStyle, ScriptInput, SessionLoop,
    CONSOLE_LABEL,
};
use nebula_console_client::Connection;

/// Server release announced in the welcome banner.
const SERVER_VERSION: &str = "2.0.0-alpha";
const HISTORY_FILE_NAME: &str = ".nebula_history";

#[derive(Parser)]
#[command(name = "nebula-console")]
#[command(author, version, about = "Interactive console for Nebula Graph")]
struct Cli {
    /// Graph server address
    #[arg(short, long, default_value = "127.0.0.1")]
    address: String,

    /// Graph server port
    #[arg(short = 'P', long, default_value_t = 3699)]
    port: u16,

    /// Username
    #[arg(short, long, default_value = "user")]
    username: String,

    /// Password
    #[arg(short, long, default_value = "password")]
    password: String,

    /// Run the given statements (one per line) and exit
    #[arg(short, long, conflicts_with = "file")]
    eval: Option<String>,

    /// Run statements from a file (`-` reads stdin) and exit
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Socket timeout in milliseconds (0 disables it)
    #[arg(long, default_value_t = 0)]
    timeout: u64,

    /// History file for interactive mode (default: ~/.nebula_history)
    #[arg(long)]
    history_file: Option<PathBuf>,
}

/// Everything the session needs that is fixed at startup.
struct ConsoleConfig {
    address: String,
    port: u16,
    timeout: Option<Duration>,
    history_path: PathBuf,
    prompt: PromptConfig,
}

impl ConsoleConfig {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            address: cli.address.clone(),
            port: cli.port,
            timeout: (cli.timeout > 0).then_some(Duration::from_millis(cli.timeout)),
            history_path: cli
                .history_file
                .clone()
                .unwrap_or_else(|| default_history_path(env::var_os("HOME"))),
            prompt: PromptConfig {
                user: cli.username.clone(),
                label: CONSOLE_LABEL.to_string(),
                is_tty: io::stdout().is_terminal(),
                style: PromptStyle::ansi(),
            },
        }
    }
}

/// `$HOME/.nebula_history`, or the temp dir when `HOME` is unset or empty.
fn default_history_path(home: Option<OsString>) -> PathBuf {
    home.filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir)
        .join(HISTORY_FILE_NAME)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_input(cli: &Cli, config: &ConsoleConfig) -> Result<Box<dyn InputSource>> {
    if let Some(script) = &cli.eval {
        return Ok(Box::new(ScriptInput::from_script(script)));
    }
    if let Some(path) = &cli.file {
        return Ok(Box::new(ScriptInput::from_path(path)?));
    }
    let input = InteractiveInput::new(config.history_path.clone(), &CompletionTree::nebula())?;
    debug!(path = %input.history_path().display(), "interactive mode");
    Ok(Box::new(input))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = ConsoleConfig::from_cli(&cli);

    let mut session = Connection::connect(&config.address, config.port, config.timeout)
        .with_context(|| format!("failed to connect to {}:{}", config.address, config.port))?
        .authenticate(&cli.username, &cli.password)
        .with_context(|| format!("failed to authenticate as {}", cli.username))?;

    let mut input = open_input(&cli, &config)?;
    let interactive = input.is_interactive();
    if interactive {
        println!(
            "{}",
            format!("Welcome to Nebula Graph v{SERVER_VERSION}!").bold()
        );
    }

    let mut repl = SessionLoop::new(&config.prompt);
    let result = repl.run(input.as_mut(), &mut session, &mut io::stdout());
    debug!(queries = repl.queries_sent(), "session loop finished");

    // Persist history before the farewell.
    drop(input);
    if interactive {
        println!();
        println!("{}", format!("Bye {}!", cli.username).bold());
    }

    match result {
        Ok(()) => {
            if let Err(e) = session.sign_out() {
                warn!(error = %e, "sign out failed");
            }
            Ok(())
        }
        // The session signs itself out best-effort on drop.
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_lives_in_home() {
        assert_eq!(
            default_history_path(Some(OsString::from("/home/ann"))),
            PathBuf::from("/home/ann/.nebula_history")
        );
    }

    #[test]
    fn history_falls_back_to_temp_dir() {
        let fallback = env::temp_dir().join(HISTORY_FILE_NAME);
        assert_eq!(default_history_path(None), fallback);
        assert_eq!(default_history_path(Some(OsString::new())), fallback);
    }

    #[test]
    fn history_flag_overrides_home() {
        let cli = Cli::parse_from(["nebula-console", "--history-file", "/tmp/h", "--timeout", "250"]);
        let config = ConsoleConfig::from_cli(&cli);
        assert_eq!(config.history_path, PathBuf::from("/tmp/h"));
        assert_eq!(config.timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.prompt.user, "user");
    }
}
