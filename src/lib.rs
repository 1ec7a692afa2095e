// Public modules
pub mod client;
pub mod console;
pub mod diagnostics;
pub mod error;
pub mod identity;
pub mod observability;
pub mod render;
pub mod session;
pub mod types;
pub mod utils;
pub mod view;

// Re-exports
pub use client::{HoneypotClient, HoneypotTransport};
pub use diagnostics::{DiagnosticLogger, TracingLogger};
pub use error::{Error, Result};
pub use identity::{FileStorage, IdentityStorage, IdentityStore, MemoryStorage, SessionIdentity};
pub use observability::register_biometrics;
pub use session::{ChatSession, SendOutcome, SessionStats};
pub use types::*;
pub use view::{ConsoleState, Tee, ViewSink};
