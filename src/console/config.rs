//! Configuration types for the console application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the binary builds its client and session from.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::identity::{FileStorage, IdentityStorage, MemoryStorage};

/// Command-line arguments for the honeypot-console tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ConsoleArgs {
    /// Base URL of the analysis service.
    #[arrrg(optional, "Service base URL (default: $HONEYPOT_URL or http://127.0.0.1:5000/)", "URL")]
    pub base_url: Option<String>,

    /// API key for the health endpoint.
    #[arrrg(optional, "API key for /health (default: $HONEYPOT_API_KEY)", "KEY")]
    pub api_key: Option<String>,

    /// Where the session identity is persisted.
    #[arrrg(optional, "File that persists the session identity", "PATH")]
    pub identity_file: Option<String>,

    /// Keep the identity in memory only.
    #[arrrg(flag, "Use a fresh identity that is not persisted")]
    pub ephemeral: bool,

    /// Transport timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECONDS")]
    pub timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Where the session identity lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityBackend {
    /// Nothing is persisted; the identity lasts for the process.
    Ephemeral,
    /// A JSON file on disk.
    File(PathBuf),
}

impl IdentityBackend {
    /// Opens the storage this backend describes.
    pub fn open(&self) -> Box<dyn IdentityStorage> {
        match self {
            IdentityBackend::Ephemeral => Box::new(MemoryStorage::new()),
            IdentityBackend::File(path) => Box::new(FileStorage::new(path.clone())),
        }
    }
}

/// Configuration for a console session.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Service base URL; `None` defers to the environment.
    pub base_url: Option<String>,

    /// API key for the health endpoint; `None` defers to the environment.
    pub api_key: Option<String>,

    /// Identity persistence.
    pub identity: IdentityBackend,

    /// Transport timeout; `None` uses the client default.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ConsoleConfig {
    /// Creates a new ConsoleConfig with default values.
    ///
    /// The identity is persisted under the user's data directory when one
    /// exists and kept in memory otherwise.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            identity: default_identity_backend(),
            timeout: None,
            use_color: true,
        }
    }

    /// Sets the service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the identity backend.
    pub fn with_identity(mut self, identity: IdentityBackend) -> Self {
        self.identity = identity;
        self
    }

    /// Sets the transport timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ConsoleArgs> for ConsoleConfig {
    fn from(args: ConsoleArgs) -> Self {
        let identity = match (args.identity_file, args.ephemeral) {
            (_, true) => IdentityBackend::Ephemeral,
            (Some(path), false) => IdentityBackend::File(PathBuf::from(path)),
            (None, false) => default_identity_backend(),
        };

        ConsoleConfig {
            base_url: args.base_url,
            api_key: args.api_key,
            identity,
            timeout: args.timeout.map(Duration::from_secs),
            use_color: !args.no_color,
        }
    }
}

fn default_identity_backend() -> IdentityBackend {
    FileStorage::default_path()
        .map(IdentityBackend::File)
        .unwrap_or(IdentityBackend::Ephemeral)
}
