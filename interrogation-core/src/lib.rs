//! LLM-powered suspect interrogation engine.
//!
//! This crate provides the core of a visual-novel interrogation mini-game:
//! - Per-suspect session state (clamped stats, bounded conversation log,
//!   evidence catalogue, story flags)
//! - System prompt assembly from hand-authored personas plus live state
//! - Total parsing of model output into a reply, follow-up suggestions, an
//!   emotional-state label, and inline stat-change markers
//! - An ask/answer controller over the Claude completion client
//!
//! # Quick Start
//!
//! ```ignore
//! use interrogation_core::{Interrogation, SuspectId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut interrogation = Interrogation::from_env()?;
//!
//!     let answer = interrogation
//!         .ask(SuspectId::Harper, "Where were you at 11 PM?", None)
//!         .await?;
//!     println!("{}", answer.reply);
//!     for suggestion in &answer.suggestions {
//!         println!("  > {suggestion}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod emotion;
pub mod parser;
pub mod persist;
pub mod prompt;
pub mod registry;
pub mod session;
pub mod state;
pub mod suspect;
pub mod testing;

// Primary public API
pub use claude::Usage;
pub use emotion::Emotion;
pub use persist::{PersistError, SavedInterrogation};
pub use registry::SessionRegistry;
pub use session::{Answer, Interrogation, InterrogationConfig, SessionError};
pub use state::{
    EvidenceItem, SessionState, Speaker, StatDeltas, SuspectStats, Turn, MAX_CONVERSATION_TURNS,
};
pub use suspect::SuspectId;
pub use testing::TestHarness;
