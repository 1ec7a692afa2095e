//! Slash command parsing for the console.
//!
//! Lines starting with `/` control the console and are never sent to the
//! analysis service.

/// A parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Display help information.
    Help,

    /// Exit the console.
    Quit,

    /// Display session statistics.
    Stats,

    /// Print the session identity.
    WhoAmI,

    /// Download the evidence export to a file.
    Evidence(String),

    /// Download this identity's PDF report to a file.
    Report(String),

    /// Check service health.
    Health,

    /// List recorded cases.
    Cases,

    /// Save the transcript as JSON.
    SaveTranscript(String),

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ConsoleCommand)` if the input is a command,
/// or `None` if it should be sent as a message.
///
/// # Examples
///
/// ```
/// # use honeypot_console::console::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/evidence evidence.csv").is_some());
/// assert!(parse_command("Your account is blocked, share the OTP").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ConsoleCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        "stats" | "status" => ConsoleCommand::Stats,
        "whoami" | "id" => ConsoleCommand::WhoAmI,
        "health" => ConsoleCommand::Health,
        "cases" => ConsoleCommand::Cases,
        "evidence" => match argument {
            Some(path) => ConsoleCommand::Evidence(path.to_string()),
            None => ConsoleCommand::Invalid("/evidence requires a file path".to_string()),
        },
        "report" => match argument {
            Some(path) => ConsoleCommand::Report(path.to_string()),
            None => ConsoleCommand::Invalid("/report requires a file path".to_string()),
        },
        "save" => match argument {
            Some(path) => ConsoleCommand::SaveTranscript(path.to_string()),
            None => ConsoleCommand::Invalid("/save requires a file path".to_string()),
        },
        _ => ConsoleCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /whoami                Show the session identity
  /stats                 Show session statistics
  /cases                 List cases recorded by the service
  /health                Check the service (needs an API key)
  /evidence <file>       Download the evidence CSV
  /report <file>         Download the PDF report for this identity
  /save <file>           Save the transcript as JSON
  /help                  Show this help message
  /quit                  Exit the console"#
}
