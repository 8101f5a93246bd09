//! Terminal helpers shared by the demo programs.

use std::io::Write as _;
use std::sync::OnceLock;

use local_agent_core::AgentEvent;
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;

#[cfg(feature = "cli")]
pub use self::spinner::{ProgressReporter, Spinner};

/// Width of the horizontal rules.
pub const RULE_WIDTH: usize = 70;

/// Length of the answer previews in summaries.
pub const PREVIEW_CHARS: usize = 200;

const BAR_CHAR: &str = "▎";

/// Returns `ch` repeated over the rule width.
#[inline]
pub fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

/// Prints a title framed by `=` rules.
pub fn banner(title: &str) {
    let line = rule('=');
    println!("\n{}", line.bold().bright_magenta());
    println!("{}", format!("  {title}").bold().bright_magenta());
    println!("{}\n", line.bold().bright_magenta());
}

/// Prints a section heading.
pub fn section(title: &str) {
    println!("\n{}", rule('=').bright_blue());
    println!("{}", title.bold().bright_cyan());
    println!("{}", rule('=').bright_blue());
}

/// Prints a labelled block of model output.
pub fn print_response(label: &str, text: &str) {
    println!("\n{}", label.bold().bright_green());
    println!("{}", rule('-'));
    for line in text.lines() {
        println!("{}{}", BAR_CHAR.bright_cyan(), line.bright_white());
    }
    println!("{}", rule('-'));
}

/// Prints a failure line.
#[inline]
pub fn print_error(message: &str) {
    println!("{}", format!("❌ {message}").bright_red());
}

/// Cuts `text` to at most `max_chars` characters, marking the cut with
/// `...`.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_owned(),
    }
}

/// Describes an agent event in one line, or `None` for events that are not
/// worth printing.
pub fn format_event(event: &AgentEvent) -> Option<String> {
    match event {
        AgentEvent::TurnStarted { iteration } => {
            Some(format!("Iteration {iteration}"))
        }
        AgentEvent::ToolCall(call) => Some(format!(
            "🔧 Calling tool: {} with {}",
            call.name, call.arguments
        )),
        AgentEvent::ToolResult { name, observation } => {
            Some(format!("📋 {name}: {observation}"))
        }
        AgentEvent::ModelError(message) => Some(format!("⚠️  {message}")),
        AgentEvent::TranscriptDelta(_) | AgentEvent::Finished(_) => None,
    }
}

/// Prints an agent event, see [`format_event`].
pub fn print_event(event: &AgentEvent) {
    let Some(line) = format_event(event) else {
        return;
    };
    match event {
        AgentEvent::ToolCall(_) => println!("{}", line.bright_yellow()),
        AgentEvent::ToolResult { .. } => println!("{}", line.bright_blue()),
        AgentEvent::ModelError(_) => println!("{}", line.bright_red()),
        _ => println!("{}", line.dimmed()),
    }
}

/// Prints streamed text as it arrives.
pub fn print_delta(delta: &str) {
    print!("{delta}");
    std::io::stdout().flush().ok();
}

/// Prints `message` without a newline and reads one line from stdin.
///
/// Returns `None` at end of input.
pub async fn prompt(message: &str) -> Option<String> {
    print!("{message}");
    std::io::stdout().flush().ok();
    read_line().await
}

/// Reads one line from stdin, without the line break.
///
/// All callers share one buffered reader, so lines piped in ahead of the
/// prompts are not lost between calls.
pub async fn read_line() -> Option<String> {
    static STDIN: OnceLock<Mutex<io::BufReader<io::Stdin>>> = OnceLock::new();

    let stdin = STDIN.get_or_init(|| Mutex::new(io::BufReader::new(io::stdin())));
    read_line_from(&mut *stdin.lock().await).await
}

async fn read_line_from<R>(reader: &mut R) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();

    match reader.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_owned()),
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[cfg(feature = "cli")]
mod spinner {
    use std::borrow::Cow;
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use indicatif::{ProgressBar, ProgressStyle};
    use local_agent_core::AgentEvent;

    use super::print_event;

    /// A terminal spinner shown while waiting for the model.
    #[derive(Clone)]
    pub struct Spinner {
        bar: ProgressBar,
    }

    impl Spinner {
        /// Starts spinning with `message` next to the spinner.
        pub fn start(message: impl Into<Cow<'static, str>>) -> Self {
            let bar = ProgressBar::new_spinner();
            match ProgressStyle::with_template("{spinner} {wide_msg}") {
                Ok(style) => {
                    bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
                }
                Err(err) => warn!("invalid spinner template: {err}"),
            }
            bar.set_message(message);
            bar.enable_steady_tick(Duration::from_millis(100));
            Self { bar }
        }

        /// Replaces the message.
        #[inline]
        pub fn set_message(&self, message: impl Into<Cow<'static, str>>) {
            self.bar.set_message(message);
        }

        /// Hides the spinner while `f` writes to the terminal.
        #[inline]
        pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
            self.bar.suspend(f)
        }

        /// Stops and erases the spinner.
        #[inline]
        pub fn finish(&self) {
            self.bar.finish_and_clear();
        }
    }

    /// Shows agent progress: a spinner during every model call and a line
    /// for every tool call and failure.
    #[derive(Default)]
    pub struct ProgressReporter {
        spinner: Mutex<Option<Spinner>>,
    }

    impl ProgressReporter {
        /// Creates an idle reporter.
        #[inline]
        pub fn new() -> Self {
            Self::default()
        }

        /// Updates the terminal for `event`.
        pub fn handle(&self, event: &AgentEvent) {
            let mut spinner =
                self.spinner.lock().unwrap_or_else(PoisonError::into_inner);
            match event {
                AgentEvent::TranscriptDelta(_) => {}
                AgentEvent::TurnStarted { iteration } => {
                    if let Some(spinner) = spinner.take() {
                        spinner.finish();
                    }
                    *spinner = Some(Spinner::start(format!(
                        "🤔 Thinking... (iteration {iteration})"
                    )));
                }
                _ => {
                    if let Some(spinner) = spinner.take() {
                        spinner.finish();
                    }
                    print_event(event);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use local_agent_core::Termination;
    use local_agent_model::ToolCallRequest;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_read_line_keeps_buffered_input() {
        let mut input: &[u8] = b"Summarize the logs\r\nreact\n\nlast";

        assert_eq!(
            read_line_from(&mut input).await.as_deref(),
            Some("Summarize the logs")
        );
        assert_eq!(read_line_from(&mut input).await.as_deref(), Some("react"));
        assert_eq!(read_line_from(&mut input).await.as_deref(), Some(""));
        assert_eq!(read_line_from(&mut input).await.as_deref(), Some("last"));
        assert_eq!(read_line_from(&mut input).await, None);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 200), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("héllo wörld", 7), "héllo w...");
        assert_eq!(preview("exact", 5), "exact");
    }

    #[test]
    fn test_format_event() {
        let call = AgentEvent::ToolCall(ToolCallRequest {
            id: "call_0".to_owned(),
            name: "calculate".to_owned(),
            arguments: json!({ "expression": "2 + 2" }),
        });
        assert_eq!(
            format_event(&call).as_deref(),
            Some(r#"🔧 Calling tool: calculate with {"expression":"2 + 2"}"#)
        );
        assert_eq!(
            format_event(&AgentEvent::ToolResult {
                name: "calculate".to_owned(),
                observation: "Result: 4".to_owned(),
            })
            .as_deref(),
            Some("📋 calculate: Result: 4")
        );
        assert_eq!(
            format_event(&AgentEvent::Finished(Termination::Completed)),
            None
        );
        assert_eq!(
            format_event(&AgentEvent::TranscriptDelta("hi".to_owned())),
            None
        );
    }

    #[test]
    fn test_rule() {
        assert_eq!(rule('=').chars().count(), RULE_WIDTH);
    }
}
