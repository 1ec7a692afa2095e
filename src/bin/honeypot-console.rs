//! Interactive honeypot console.
//!
//! Plays the scammer's side of a conversation with the analysis service and
//! shows the decoy's reply together with the detected scam type, risk level
//! and persona.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local development server
//! honeypot-console
//!
//! # Point at a deployment and keep the identity in a specific file
//! honeypot-console --base-url https://honeypot.example.com/ --identity-file ./identity.json
//!
//! # Start a throwaway conversation
//! honeypot-console --ephemeral --no-color
//! ```
//!
//! Lines starting with `/` are console commands; `/help` lists them.

use std::fs;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use honeypot_console::console::{
    ConsoleArgs, ConsoleCommand, ConsoleConfig, TerminalRenderer, help_text, parse_command,
};
use honeypot_console::{
    CaseRecord, ChatSession, ConsoleState, HoneypotClient, IdentityStorage, IdentityStore, Tee,
};

type Session = ChatSession<HoneypotClient, Box<dyn IdentityStorage>>;

/// Main entry point for the honeypot-console application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, _) = ConsoleArgs::from_command_line_relaxed("honeypot-console [OPTIONS]");
    let config = ConsoleConfig::from(args);

    let client = HoneypotClient::with_options(
        config.base_url.clone(),
        config.api_key.clone(),
        config.timeout,
    )?;
    let mut session = ChatSession::new(client, IdentityStore::new(config.identity.open()));
    let mut state = ConsoleState::new();
    let mut renderer = TerminalRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    let identity = session.identity();
    println!(
        "Honeypot console ({}) as {}",
        session.transport().base_url(),
        identity
    );
    println!("Type /help for commands, /quit to exit\n");

    loop {
        match rl.readline("Scammer: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ConsoleCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ConsoleCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ConsoleCommand::Stats => print_stats(&session, &state),
                        ConsoleCommand::WhoAmI => {
                            renderer.print_info(&format!("Identity: {}", session.identity()));
                        }
                        ConsoleCommand::Evidence(path) => {
                            match session.transport().download_evidence().await {
                                Ok(bytes) => match fs::write(&path, &bytes) {
                                    Ok(()) => renderer.print_info(&format!(
                                        "Evidence saved to {} ({} bytes)",
                                        path,
                                        bytes.len()
                                    )),
                                    Err(err) => renderer
                                        .print_error(&format!("Failed to write {path}: {err}")),
                                },
                                Err(err) => renderer
                                    .print_error(&format!("Failed to download evidence: {err}")),
                            }
                        }
                        ConsoleCommand::Report(path) => {
                            let identity = session.identity();
                            match session.transport().download_report(&identity).await {
                                Ok(bytes) => match fs::write(&path, &bytes) {
                                    Ok(()) => renderer
                                        .print_info(&format!("Report saved to {}", path)),
                                    Err(err) => renderer
                                        .print_error(&format!("Failed to write {path}: {err}")),
                                },
                                Err(err) => renderer
                                    .print_error(&format!("Failed to download report: {err}")),
                            }
                        }
                        ConsoleCommand::Health => match session.transport().health().await {
                            Ok(health) if health.is_ok() => renderer.print_info(&format!(
                                "Service {} is up ({})",
                                health.service.as_deref().unwrap_or("(unnamed)"),
                                health.timestamp.as_deref().unwrap_or("no timestamp")
                            )),
                            Ok(health) => renderer.print_error(&format!(
                                "Service reported {}: {}",
                                health.status,
                                health.message.as_deref().unwrap_or("(no message)")
                            )),
                            Err(err) => renderer.print_error(&format!("Health check failed: {err}")),
                        },
                        ConsoleCommand::Cases => match session.transport().cases().await {
                            Ok(cases) => print_cases(&cases),
                            Err(err) => renderer.print_error(&format!("Failed to list cases: {err}")),
                        },
                        ConsoleCommand::SaveTranscript(path) => {
                            match state.save_transcript_to(&path) {
                                Ok(()) => {
                                    renderer.print_info(&format!("Transcript saved to {}", path))
                                }
                                Err(err) => renderer
                                    .print_error(&format!("Failed to save transcript: {}", err)),
                            }
                        }
                        ConsoleCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                let mut view = Tee::new(&mut state, &mut renderer);
                session.send(line, &mut view).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_stats(session: &Session, state: &ConsoleState) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Transcript entries: {}", state.transcript().len());
    println!("      Messages sent: {}", stats.sent);
    println!("      Replies: {}", stats.replies);
    println!(
        "      Failures: {} ({} transport, {} application)",
        stats.failures(),
        stats.transport_failures,
        stats.application_failures
    );
    println!("      Blank inputs ignored: {}", stats.ignored);
    println!("      Scam type: {}", state.scam_type());
    println!("      Risk: {}", state.risk().label);
    println!("      Persona: {}", state.persona());
}

fn print_cases(cases: &[CaseRecord]) {
    if cases.is_empty() {
        println!("    No cases recorded.");
        return;
    }
    for case in cases {
        let when = case
            .timestamp
            .map(|t| t.date().to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "    {} {} [{}] {} / {}: {}",
            when,
            case.scammer_id,
            case.risk().label,
            case.scam_type.as_deref().unwrap_or("-"),
            case.persona.as_deref().unwrap_or("-"),
            case.message.as_deref().unwrap_or("")
        );
    }
}
