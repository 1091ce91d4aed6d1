//! Line sources for the session loop.
//!
//! The loop only sees [`InputSource`]. Two implementations exist:
//! [`InteractiveInput`] (rustyline: history, completion, prompt) and
//! [`ScriptInput`] (any buffered reader: an `-e` string, a file, or stdin).

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor};
use tracing::{debug, warn};

use crate::completion::{CompletionTree, ConsoleHelper};

/// Outcome of one successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    Line(String),
    /// Input is exhausted.
    Eof,
    /// The user pressed Ctrl-C while editing a line.
    Interrupted,
}

pub trait InputSource {
    /// Block until one line is available.
    fn read_line(&mut self) -> Result<ReadEvent>;

    /// Display `prompt` before the next read.
    fn show_prompt(&mut self, prompt: &str);

    fn is_interactive(&self) -> bool;
}

/// Terminal input with persistent history and keyword completion.
///
/// Lines entered during the session are appended to the history file when
/// the source is dropped.
pub struct InteractiveInput {
    editor: Editor<ConsoleHelper, DefaultHistory>,
    history_path: PathBuf,
    prompt: String,
}

impl InteractiveInput {
    pub fn new(history_path: PathBuf, grammar: &CompletionTree) -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .build();
        let mut editor: Editor<ConsoleHelper, DefaultHistory> =
            Editor::with_config(config).map_err(|e| anyhow!("failed to init rustyline: {e}"))?;
        editor.set_helper(Some(ConsoleHelper::new(*grammar)));

        match editor.load_history(&history_path) {
            Ok(()) => debug!(path = %history_path.display(), "loaded history"),
            Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %history_path.display(), "no history yet");
            }
            Err(e) => warn!(path = %history_path.display(), error = %e, "failed to load history"),
        }

        Ok(Self {
            editor,
            history_path,
            prompt: String::new(),
        })
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }
}

impl InputSource for InteractiveInput {
    fn read_line(&mut self) -> Result<ReadEvent> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        warn!(error = %e, "failed to record history entry");
                    }
                }
                Ok(ReadEvent::Line(line))
            }
            Err(ReadlineError::Eof) => Ok(ReadEvent::Eof),
            Err(ReadlineError::Interrupted) => Ok(ReadEvent::Interrupted),
            Err(e) => Err(anyhow!("readline error: {e}")),
        }
    }

    fn show_prompt(&mut self, prompt: &str) {
        // The blank separator line goes out now; rustyline draws the rest.
        println!();
        self.prompt = prompt.to_string();
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

impl Drop for InteractiveInput {
    fn drop(&mut self) {
        if let Err(e) = self.editor.append_history(&self.history_path) {
            warn!(path = %self.history_path.display(), error = %e, "failed to save history");
        }
    }
}

/// Non-interactive input: one query per line, no prompt.
pub struct ScriptInput {
    reader: Box<dyn BufRead>,
}

impl ScriptInput {
    pub fn new(reader: Box<dyn BufRead>) -> Self {
        Self { reader }
    }

    /// Read statements from an inline script string.
    pub fn from_script(script: &str) -> Self {
        Self::new(Box::new(Cursor::new(script.as_bytes().to_vec())))
    }

    /// Read statements from a file, or from stdin when `path` is `-`.
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.as_os_str() == "-" {
            return Ok(Self::new(Box::new(io::stdin().lock())));
        }
        let file = File::open(path)
            .with_context(|| format!("failed to open script file {}", path.display()))?;
        Ok(Self::new(Box::new(BufReader::new(file))))
    }
}

impl InputSource for ScriptInput {
    /// Bytes that are not valid UTF-8 are replaced, so one bad line never
    /// ends the script.
    fn read_line(&mut self) -> Result<ReadEvent> {
        let mut buf = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut buf)
            .context("failed to read script line")?;
        if n == 0 {
            return Ok(ReadEvent::Eof);
        }
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        Ok(ReadEvent::Line(String::from_utf8_lossy(&buf).into_owned()))
    }

    fn show_prompt(&mut self, _prompt: &str) {}

    fn is_interactive(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::History;
    use std::io::Write;

    fn drain(input: &mut dyn InputSource) -> Vec<ReadEvent> {
        let mut events = Vec::new();
        loop {
            let event = input.read_line().unwrap();
            let done = event == ReadEvent::Eof;
            events.push(event);
            if done {
                return events;
            }
        }
    }

    #[test]
    fn script_lines_are_split_and_unterminated() {
        let mut input = ScriptInput::from_script("SHOW SPACES\r\nUSE nba\n\nYIELD 1");
        assert!(!input.is_interactive());
        assert_eq!(
            drain(&mut input),
            vec![
                ReadEvent::Line("SHOW SPACES".to_string()),
                ReadEvent::Line("USE nba".to_string()),
                ReadEvent::Line(String::new()),
                ReadEvent::Line("YIELD 1".to_string()),
                ReadEvent::Eof,
            ]
        );
    }

    #[test]
    fn empty_script_is_immediately_exhausted() {
        let mut input = ScriptInput::from_script("");
        assert_eq!(input.read_line().unwrap(), ReadEvent::Eof);
        assert_eq!(input.read_line().unwrap(), ReadEvent::Eof);
    }

    #[test]
    fn script_file_is_read_line_by_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SHOW HOSTS").unwrap();
        writeln!(file, "exit").unwrap();

        let mut input = ScriptInput::from_path(file.path()).unwrap();
        assert_eq!(input.read_line().unwrap(), ReadEvent::Line("SHOW HOSTS".to_string()));
        assert_eq!(input.read_line().unwrap(), ReadEvent::Line("exit".to_string()));
        assert_eq!(input.read_line().unwrap(), ReadEvent::Eof);
    }

    #[test]
    fn missing_script_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = match ScriptInput::from_path(&dir.path().join("nope.ngql")) {
            Ok(_) => panic!("opening a missing file should fail"),
            Err(e) => e,
        };
        assert!(err.to_string().contains("nope.ngql"));
    }

    #[test]
    fn invalid_utf8_line_is_kept_and_reading_continues() {
        let mut input = ScriptInput::new(Box::new(Cursor::new(
            b"YIELD 1\nYIELD \"caf\xe9\"\nYIELD 3\n".to_vec(),
        )));
        assert_eq!(
            drain(&mut input),
            vec![
                ReadEvent::Line("YIELD 1".to_string()),
                ReadEvent::Line("YIELD \"caf\u{fffd}\"".to_string()),
                ReadEvent::Line("YIELD 3".to_string()),
                ReadEvent::Eof,
            ]
        );
    }

    #[test]
    fn history_is_appended_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".nebula_history");
        let tree = CompletionTree::nebula();

        {
            let mut input = InteractiveInput::new(path.clone(), &tree).unwrap();
            input.editor.add_history_entry("SHOW SPACES").unwrap();
        }
        {
            let mut input = InteractiveInput::new(path.clone(), &tree).unwrap();
            assert_eq!(input.editor.history().len(), 1);
            input.editor.add_history_entry(" USE nba").unwrap();
        }

        let input = InteractiveInput::new(path.clone(), &tree).unwrap();
        assert_eq!(input.history_path(), path.as_path());
        let entries: Vec<&str> = input.editor.history().iter().map(String::as_str).collect();
        assert_eq!(entries, vec!["SHOW SPACES", " USE nba"]);
    }

    #[test]
    fn missing_history_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let input =
            InteractiveInput::new(dir.path().join("fresh_history"), &CompletionTree::nebula())
                .unwrap();
        assert_eq!(input.editor.history().len(), 0);
    }
}
