//! The write-only surface a chat session drives.
//!
//! A session never reads back from its view; correctness is entirely a matter
//! of which [`ViewSink`] calls are made, in what order, with what arguments.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{DASH_PLACEHOLDER, RiskClassification, TranscriptEntry};

/// Receives transcript and facet updates from a chat session.
///
/// Only the transcript is mandatory. A view without a scam-type, risk or
/// persona display keeps the default no-op for that facet and the session
/// carries on without it.
pub trait ViewSink: Send {
    /// Appends one entry to the end of the transcript.
    fn append_transcript_entry(&mut self, entry: &TranscriptEntry);

    /// Shows the detected scam type.
    fn set_scam_type(&mut self, scam_type: &str) {
        _ = scam_type;
    }

    /// Shows the risk label and its visual tier.
    fn set_risk(&mut self, risk: &RiskClassification) {
        _ = risk;
    }

    /// Shows the persona the decoy is playing.
    fn set_persona(&mut self, persona: &str) {
        _ = persona;
    }

    /// Clears whatever input the user typed.
    fn clear_input_buffer(&mut self) {}
}

/// In-memory view state: the transcript plus the last value of each facet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleState {
    transcript: Vec<TranscriptEntry>,
    scam_type: String,
    risk: RiskClassification,
    persona: String,
    input_clears: usize,
}

impl ConsoleState {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            scam_type: DASH_PLACEHOLDER.to_string(),
            risk: RiskClassification::default(),
            persona: DASH_PLACEHOLDER.to_string(),
            input_clears: 0,
        }
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn scam_type(&self) -> &str {
        &self.scam_type
    }

    pub fn risk(&self) -> &RiskClassification {
        &self.risk
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Number of times the input buffer was cleared.
    pub fn input_clears(&self) -> usize {
        self.input_clears
    }

    /// Writes the transcript to `path` as a JSON array.
    pub fn save_transcript_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.transcript)?;
        fs::write(path, json)
            .map_err(|err| Error::io(format!("cannot write {}", path.display()), err))
    }
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSink for ConsoleState {
    fn append_transcript_entry(&mut self, entry: &TranscriptEntry) {
        self.transcript.push(entry.clone());
    }

    fn set_scam_type(&mut self, scam_type: &str) {
        self.scam_type = scam_type.to_string();
    }

    fn set_risk(&mut self, risk: &RiskClassification) {
        self.risk = risk.clone();
    }

    fn set_persona(&mut self, persona: &str) {
        self.persona = persona.to_string();
    }

    fn clear_input_buffer(&mut self) {
        self.input_clears += 1;
    }
}

/// Fans every update out to two sinks, in order.
pub struct Tee<'a> {
    first: &'a mut dyn ViewSink,
    second: &'a mut dyn ViewSink,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a mut dyn ViewSink, second: &'a mut dyn ViewSink) -> Self {
        Self { first, second }
    }
}

impl ViewSink for Tee<'_> {
    fn append_transcript_entry(&mut self, entry: &TranscriptEntry) {
        self.first.append_transcript_entry(entry);
        self.second.append_transcript_entry(entry);
    }

    fn set_scam_type(&mut self, scam_type: &str) {
        self.first.set_scam_type(scam_type);
        self.second.set_scam_type(scam_type);
    }

    fn set_risk(&mut self, risk: &RiskClassification) {
        self.first.set_risk(risk);
        self.second.set_risk(risk);
    }

    fn set_persona(&mut self, persona: &str) {
        self.first.set_persona(persona);
        self.second.set_persona(persona);
    }

    fn clear_input_buffer(&mut self) {
        self.first.clear_input_buffer();
        self.second.clear_input_buffer();
    }
}
