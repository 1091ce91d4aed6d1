//! The session loop.
//!
//! One line is one query. Each iteration reads a line, classifies it, and
//! either stops, skips it, or sends it to the server and prints the result.
//! Server-side query errors are printed and the loop carries on; transport
//! errors and input errors (other than end of input / Ctrl-C) end the loop
//! with an error.

use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};
use nebula_console_client::{ExecutionResponse, Executor};
use tracing::{debug, error};

use crate::input::{InputSource, ReadEvent};
use crate::render::render_response;

/// Label shown after `user@` in the prompt.
pub const CONSOLE_LABEL: &str = "Nebula-Console";

/// Terminal escape sequences used by the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptStyle {
    pub bold: &'static str,
    pub error: &'static str,
    pub reset: &'static str,
}

impl PromptStyle {
    pub const fn ansi() -> Self {
        Self {
            bold: "\x1b[1m",
            error: "\x1b[31m",
            reset: "\x1b[0m",
        }
    }
}

/// Everything needed to draw a prompt, fixed for the whole session.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub user: String,
    pub label: String,
    pub is_tty: bool,
    pub style: PromptStyle,
}

impl PromptConfig {
    /// `({user}@{label}) [({space})]> `, wrapped in escapes on a TTY.
    pub fn render(&self, state: &SessionState) -> String {
        let mut out = String::new();
        if self.is_tty {
            out.push_str(self.style.bold);
            if state.last_call_was_error {
                out.push_str(self.style.error);
            }
        }
        out.push_str(&format!(
            "({}@{}) [({})]> ",
            self.user, self.label, state.current_space
        ));
        if self.is_tty {
            out.push_str(self.style.reset);
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current_space: String,
    pub last_call_was_error: bool,
}

impl SessionState {
    fn observe(&mut self, resp: &ExecutionResponse) {
        if let Some(space) = &resp.space_name {
            self.current_space = space.clone();
        }
        self.last_call_was_error = !resp.is_succeeded();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Exit,
    Query,
}

fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        LineKind::Exit
    } else {
        LineKind::Query
    }
}

/// Drives one console session until the input ends, the user exits, or a
/// fatal error occurs.
pub struct SessionLoop<'a> {
    prompt: &'a PromptConfig,
    state: SessionState,
    queries_sent: usize,
}

impl<'a> SessionLoop<'a> {
    pub fn new(prompt: &'a PromptConfig) -> Self {
        Self {
            prompt,
            state: SessionState::default(),
            queries_sent: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn queries_sent(&self) -> usize {
        self.queries_sent
    }

    /// Run until termination. `Ok(())` covers every graceful exit: `exit` /
    /// `quit`, end of input, and Ctrl-C while editing a line.
    pub fn run<I, E, W>(&mut self, input: &mut I, executor: &mut E, out: &mut W) -> Result<()>
    where
        I: InputSource + ?Sized,
        E: Executor + ?Sized,
        W: Write + ?Sized,
    {
        self.show_prompt(input);
        loop {
            let line = match input.read_line() {
                Ok(ReadEvent::Line(line)) => line,
                Ok(ReadEvent::Eof) => {
                    debug!("end of input");
                    return Ok(());
                }
                Ok(ReadEvent::Interrupted) => {
                    debug!("interrupted");
                    return Ok(());
                }
                Err(e) => {
                    error!(error = %e, "get line failed");
                    return Err(e.context("failed to read the next statement"));
                }
            };

            match classify(&line) {
                LineKind::Blank => {
                    self.show_prompt(input);
                    continue;
                }
                LineKind::Exit => return Ok(()),
                LineKind::Query => {}
            }

            let start = Instant::now();
            let resp = executor
                .execute(&line)
                .with_context(|| format!("failed to execute `{}`", line.trim()))?;
            let elapsed = start.elapsed();
            self.queries_sent += 1;
            debug!(
                error_code = resp.error_code,
                latency_us = resp.latency_in_us,
                elapsed_us = elapsed.as_micros() as u64,
                "statement executed"
            );

            out.write_all(render_response(&resp, elapsed).as_bytes())?;
            out.flush()?;

            self.state.observe(&resp);
            self.show_prompt(input);
        }
    }

    fn show_prompt<I: InputSource + ?Sized>(&self, input: &mut I) {
        if input.is_interactive() {
            input.show_prompt(&self.prompt.render(&self.state));
        }
    }
}
