//! Terminal rendering for the console.
//!
//! [`TerminalRenderer`] is a [`ViewSink`] that prints transcript lines and
//! facet updates to stdout, optionally with ANSI styling. The risk facet is
//! colored by tier.

use std::io::{self, Stdout, Write};

use crate::types::{RiskClassification, RiskTier, Speaker, TranscriptEntry};
use crate::view::ViewSink;

/// ANSI escape code for dim text (used for facet labels).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text.
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the decoy's replies).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for system lines and medium risk).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for green text (used for low risk).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for high risk and errors).
const ANSI_RED: &str = "\x1b[31m";

/// Color of the risk facet for each tier.
pub fn tier_color(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::High => ANSI_RED,
        RiskTier::Medium => ANSI_YELLOW,
        RiskTier::Low => ANSI_GREEN,
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct TerminalRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl TerminalRenderer {
    /// Creates a new TerminalRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new TerminalRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn print_facet(&mut self, label: &str, value: &str, style: &str) {
        let label = self.styled(ANSI_DIM, &format!("  {label}:"));
        let value = self.styled(style, value);
        println!("{label} {value}");
        self.flush();
    }

    /// Print an informational message.
    pub fn print_info(&mut self, info: &str) {
        let line = self.styled(ANSI_DIM, info);
        println!("{line}");
        self.flush();
    }

    /// Print an error message.
    pub fn print_error(&mut self, error: &str) {
        let line = self.styled(ANSI_RED, &format!("Error: {error}"));
        eprintln!("{line}");
    }

    /// Formats one transcript entry the way it is printed.
    pub fn format_entry(&self, entry: &TranscriptEntry) -> String {
        let style = match entry.speaker {
            Speaker::User => ANSI_BOLD,
            Speaker::Counterpart => ANSI_CYAN,
            Speaker::System => ANSI_YELLOW,
        };
        self.styled(style, &entry.to_string())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSink for TerminalRenderer {
    fn append_transcript_entry(&mut self, entry: &TranscriptEntry) {
        // The user's own line is already on screen from the prompt.
        if entry.speaker == Speaker::User {
            return;
        }
        let line = self.format_entry(entry);
        println!("{line}");
        self.flush();
    }

    fn set_scam_type(&mut self, scam_type: &str) {
        self.print_facet("scam type", scam_type, ANSI_BOLD);
    }

    fn set_risk(&mut self, risk: &RiskClassification) {
        self.print_facet("risk", &risk.label, tier_color(risk.tier));
    }

    fn set_persona(&mut self, persona: &str) {
        self.print_facet("persona", persona, ANSI_BOLD);
    }
}
