//! Wire and transcript types shared by the session, the client and the views.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::identity::SessionIdentity;

/// Counterpart text shown when the service sends no reply.
pub const REPLY_PLACEHOLDER: &str = "...";

/// Facet text shown when the service sends no scam type or persona.
pub const DASH_PLACEHOLDER: &str = "-";

/// Risk label assumed when the service sends none.
pub const DEFAULT_RISK: &str = "LOW";

/// The one system message appended when a send fails for any reason.
pub const FAILURE_MESSAGE: &str = "⚠️ System error. Please try again.";

///////////////////////////////////////// Outgoing /////////////////////////////////////////

/// The request body for one send.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Identity of the conversation thread.
    #[serde(rename = "scammer_id")]
    pub session_id: String,

    /// Trimmed, non-empty message text.
    #[serde(rename = "message")]
    pub text: String,
}

impl OutgoingMessage {
    /// Builds a message from raw input, or `None` when the input is blank.
    pub fn new(identity: &SessionIdentity, raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            session_id: identity.as_str().to_string(),
            text: text.to_string(),
        })
    }
}

///////////////////////////////////////// Incoming /////////////////////////////////////////

/// A reply from the analysis service, exactly as received.
///
/// Every field is untrusted. Only a JSON object can supply fields; any other
/// JSON value (array, string, number, null) is a reply with every field
/// absent, the same as `{}`. Missing fields, nulls and non-string values never
/// fail deserialization; [`ServerReply::resolve`] applies the defaults.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ServerReply {
    pub reply: Option<String>,
    pub scam_type: Option<String>,
    pub risk_score: Option<String>,
    pub persona: Option<String>,
}

impl ServerReply {
    /// Reads the reply fields out of an already-parsed body.
    pub fn from_value(value: serde_json::Value) -> Self {
        let serde_json::Value::Object(map) = value else {
            return Self::default();
        };
        let field = |key: &str| map.get(key).and_then(lenient_string);
        Self {
            reply: field("reply"),
            scam_type: field("scam_type"),
            risk_score: field("risk_score"),
            persona: field("persona"),
        }
    }

    /// Substitutes the documented default for every missing, null or empty field.
    pub fn resolve(self) -> ResolvedReply {
        let risk = or_default(self.risk_score, DEFAULT_RISK);
        ResolvedReply {
            reply: or_default(self.reply, REPLY_PLACEHOLDER),
            scam_type: or_default(self.scam_type, DASH_PLACEHOLDER),
            risk: classify(&risk),
            persona: or_default(self.persona, DASH_PLACEHOLDER),
        }
    }
}

impl<'de> Deserialize<'de> for ServerReply {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Self::from_value)
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Accepts strings as-is and renders numbers and booleans as text; anything
/// else (null, arrays, objects) is treated as absent.
fn lenient_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A reply with all defaults applied, ready to fan out to the view facets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReply {
    pub reply: String,
    pub scam_type: String,
    pub risk: RiskClassification,
    pub persona: String,
}

///////////////////////////////////////// Risk /////////////////////////////////////////

/// Visual tier of the risk facet.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The label the service sent together with the tier it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskClassification {
    pub label: String,
    pub tier: RiskTier,
}

impl Default for RiskClassification {
    fn default() -> Self {
        classify(DEFAULT_RISK)
    }
}

/// Maps a risk label to its visual tier.
///
/// Matching is case-sensitive against `"HIGH"` and `"MEDIUM"`; every other
/// string, including the empty one, is [`RiskTier::Low`].
pub fn classify(risk: &str) -> RiskClassification {
    let tier = match risk {
        "HIGH" => RiskTier::High,
        "MEDIUM" => RiskTier::Medium,
        _ => RiskTier::Low,
    };
    RiskClassification {
        label: risk.to_string(),
        tier,
    }
}

///////////////////////////////////////// Transcript /////////////////////////////////////////

/// Who a transcript entry is attributed to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Speaker {
    /// The person at the console, playing the scammer.
    User,
    /// The decoy victim answering on behalf of the service.
    Counterpart,
    /// Messages generated locally by the console.
    System,
}

impl Speaker {
    /// Prefix shown in front of the entry text.
    pub fn prefix(&self) -> &'static str {
        match self {
            Speaker::User => "Scammer: ",
            Speaker::Counterpart => "Victim: ",
            Speaker::System => "",
        }
    }
}

/// One line of the conversation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    pub fn counterpart(text: impl Into<String>) -> Self {
        Self::new(Speaker::Counterpart, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Speaker::System, text)
    }
}

impl fmt::Display for TranscriptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.speaker.prefix(), self.text)
    }
}

///////////////////////////////////////// Service /////////////////////////////////////////

/// Body of the service's health endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// One recorded scam message from the service's case listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    pub scammer_id: String,
    #[serde(default, with = "crate::utils::time")]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(default)]
    pub scam_type: Option<String>,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub risk_score: Option<String>,
}

impl CaseRecord {
    /// Risk of this record, classified the same way as live replies.
    pub fn risk(&self) -> RiskClassification {
        classify(&or_default(self.risk_score.clone(), DEFAULT_RISK))
    }
}
