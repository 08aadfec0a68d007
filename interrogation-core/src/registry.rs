//! Session registry.
//!
//! One mutable `SessionState` per suspect, created lazily on first access.
//! The registry is an explicit object owned by whoever drives the
//! interrogation; there are no process-wide singletons.

use crate::state::{SessionState, Speaker, StatDeltas};
use crate::suspect::SuspectId;
use std::collections::HashMap;

/// Keyed store of per-suspect interrogation sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SuspectId, SessionState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-or-return the session for a suspect. Idempotent; distinct
    /// suspect ids never share storage.
    pub fn session(&mut self, id: SuspectId) -> &mut SessionState {
        self.sessions
            .entry(id)
            .or_insert_with(|| SessionState::new(id))
    }

    /// Read-only view; `None` if the suspect has not been questioned yet.
    pub fn peek(&self, id: SuspectId) -> Option<&SessionState> {
        self.sessions.get(&id)
    }

    /// Restore a suspect's initial snapshot.
    pub fn reset(&mut self, id: SuspectId) {
        self.sessions.insert(id, SessionState::new(id));
    }

    /// Apply clamped stat deltas and counter increments.
    pub fn update_stats(&mut self, id: SuspectId, deltas: &StatDeltas) {
        self.session(id).stats.apply(deltas);
    }

    pub fn append_turn(
        &mut self,
        id: SuspectId,
        speaker: Speaker,
        text: impl Into<String>,
        evidence_id: Option<&str>,
    ) {
        self.session(id).append_turn(speaker, text, evidence_id);
    }

    /// Returns false (and mutates nothing) if the evidence id is unknown.
    pub fn mark_evidence_presented(&mut self, id: SuspectId, evidence_id: &str) -> bool {
        self.session(id).mark_evidence_presented(evidence_id)
    }

    pub fn set_flag(&mut self, id: SuspectId, key: impl Into<String>, value: bool) {
        self.session(id).set_flag(key, value);
    }

    /// Snapshot every live session, ordered by suspect id, for persistence.
    pub fn export_sessions(&self) -> Vec<SessionState> {
        let mut sessions: Vec<_> = self.sessions.values().cloned().collect();
        sessions.sort_by_key(|s| s.suspect_id.as_str());
        sessions
    }

    /// Replace live sessions with restored ones.
    pub fn import_sessions(&mut self, sessions: Vec<SessionState>) {
        for session in sessions {
            self.sessions.insert(session.suspect_id, session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_creation_is_idempotent() {
        let mut registry = SessionRegistry::new();
        registry.session(SuspectId::Harper).stats.stress = 99;
        assert_eq!(registry.session(SuspectId::Harper).stats.stress, 99);
    }

    #[test]
    fn test_suspects_are_isolated() {
        let mut registry = SessionRegistry::new();

        registry.update_stats(SuspectId::Harper, &StatDeltas::stress(30));
        registry.append_turn(
            SuspectId::Harper,
            Speaker::Detective,
            "Where were you?",
            None,
        );

        let marcus = registry.session(SuspectId::Marcus);
        assert_eq!(marcus.stats, SuspectId::Marcus.initial_stats());
        assert!(marcus.turns().is_empty());

        let harper = registry.session(SuspectId::Harper);
        assert_eq!(harper.stats.stress, 65);
        assert_eq!(harper.turns().len(), 1);
    }

    #[test]
    fn test_reset_restores_initial_snapshot() {
        let mut registry = SessionRegistry::new();
        registry.update_stats(SuspectId::Rowan, &StatDeltas::trust(50));
        registry.mark_evidence_presented(SuspectId::Rowan, "wrist_burn");

        registry.reset(SuspectId::Rowan);

        let rowan = registry.session(SuspectId::Rowan);
        assert_eq!(rowan.stats, SuspectId::Rowan.initial_stats());
        assert!(rowan.presented_ids.is_empty());
    }

    #[test]
    fn test_unknown_evidence_mutates_nothing() {
        let mut registry = SessionRegistry::new();
        assert!(!registry.mark_evidence_presented(SuspectId::Harper, "warp_core"));
        assert!(registry.session(SuspectId::Harper).presented_ids.is_empty());
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut registry = SessionRegistry::new();
        registry.append_turn(SuspectId::Harper, Speaker::Detective, "Q1", None);
        registry.update_stats(SuspectId::Marcus, &StatDeltas::stress(10));

        let exported = registry.export_sessions();
        assert_eq!(exported.len(), 2);

        let mut restored = SessionRegistry::new();
        restored.import_sessions(exported);
        assert_eq!(restored.session(SuspectId::Harper).turns().len(), 1);
        assert_eq!(
            restored.session(SuspectId::Marcus).stats.stress,
            SuspectId::Marcus.initial_stats().stress + 10
        );
    }
}
