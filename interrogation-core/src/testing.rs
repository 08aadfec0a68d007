//! Deterministic test tooling.
//!
//! `TestHarness` replaces the network with queued raw completion texts and
//! runs them through the real parse/apply pipeline, so tests exercise the
//! same code path as a live interrogation.

use crate::parser::ParsedResponse;
use crate::registry::SessionRegistry;
use crate::session::ingest_reply;
use crate::state::{SessionState, Speaker, SuspectStats};
use crate::suspect::SuspectId;

/// Test harness for scripted interrogation scenarios.
pub struct TestHarness {
    registry: SessionRegistry,
    scripts: Vec<String>,
    script_index: usize,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            registry: SessionRegistry::new(),
            scripts: Vec::new(),
            script_index: 0,
        }
    }

    /// Queue the raw completion text the "model" returns next.
    pub fn expect_completion(&mut self, raw: impl Into<String>) -> &mut Self {
        self.scripts.push(raw.into());
        self
    }

    /// Ask a question; the next queued completion is the model's answer.
    ///
    /// Mirrors the live cycle: append question, mark evidence, parse the
    /// completion, apply stat markers, append the cleaned reply.
    pub fn ask(
        &mut self,
        suspect: SuspectId,
        question: &str,
        evidence_id: Option<&str>,
    ) -> ParsedResponse {
        let session = self.registry.session(suspect);
        session.append_turn(Speaker::Detective, question, evidence_id);
        if let Some(id) = evidence_id {
            session.mark_evidence_presented(id);
        }

        let raw = if self.script_index < self.scripts.len() {
            let r = self.scripts[self.script_index].clone();
            self.script_index += 1;
            r
        } else {
            "I have nothing more to say.".to_string()
        };

        ingest_reply(self.registry.session(suspect), &raw)
    }

    pub fn session(&mut self, suspect: SuspectId) -> &SessionState {
        self.registry.session(suspect)
    }

    pub fn stats(&mut self, suspect: SuspectId) -> SuspectStats {
        self.registry.session(suspect).stats
    }

    pub fn registry_mut(&mut self) -> &mut SessionRegistry {
        &mut self.registry
    }

    /// Replay queued scripts from the beginning.
    pub fn rewind(&mut self) {
        self.script_index = 0;
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert a suspect's stress and trust.
#[track_caller]
pub fn assert_stats(harness: &mut TestHarness, suspect: SuspectId, stress: i32, trust: i32) {
    let stats = harness.stats(suspect);
    assert_eq!(
        (stats.stress, stats.trust),
        (stress, trust),
        "Expected {suspect} at stress {stress}/trust {trust}, got {}/{}",
        stats.stress,
        stats.trust
    );
}

/// Assert a suspect's conversation log length.
#[track_caller]
pub fn assert_log_len(harness: &mut TestHarness, suspect: SuspectId, len: usize) {
    let actual = harness.session(suspect).turns().len();
    assert_eq!(actual, len, "Expected {suspect} log length {len}, got {actual}");
}

/// Assert the suspect's most recent reply contains a substring.
#[track_caller]
pub fn assert_last_reply_contains(harness: &mut TestHarness, suspect: SuspectId, needle: &str) {
    let session = harness.session(suspect);
    let last = session
        .turns()
        .iter()
        .rev()
        .find(|t| t.speaker == Speaker::Suspect)
        .unwrap_or_else(|| panic!("{suspect} has no reply turns"));
    assert!(
        last.text.contains(needle),
        "Expected last reply to contain {needle:?}, got {:?}",
        last.text
    );
}
