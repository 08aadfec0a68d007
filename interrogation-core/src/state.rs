//! Per-suspect interrogation state.
//!
//! One mutable record per suspect: clamped pressure stats, a bounded
//! conversation log used for prompt context, the evidence catalogue, and
//! free-form story flags.

use crate::suspect::SuspectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum number of conversation turns kept for prompt context.
///
/// The log is a ring, not an audit trail: the oldest turn is evicted first.
pub const MAX_CONVERSATION_TURNS: usize = 10;

/// Numeric pressure stats for a suspect.
///
/// `stress` and `trust` are clamped to `[0, 100]` on every update. `lies`
/// and `contradictions` are monotonic counters maintained by the caller,
/// never by response parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspectStats {
    pub stress: i32,
    pub trust: i32,
    pub lies: u32,
    pub contradictions: u32,
}

impl SuspectStats {
    pub fn new(stress: i32, trust: i32) -> Self {
        Self {
            stress: stress.clamp(0, 100),
            trust: trust.clamp(0, 100),
            lies: 0,
            contradictions: 0,
        }
    }

    /// Apply deltas, clamping stress and trust to their bounds.
    pub fn apply(&mut self, deltas: &StatDeltas) {
        if let Some(d) = deltas.stress {
            self.stress = (self.stress + d).clamp(0, 100);
        }
        if let Some(d) = deltas.trust {
            self.trust = (self.trust + d).clamp(0, 100);
        }
        self.lies += deltas.lies;
        self.contradictions += deltas.contradictions;
    }
}

/// Adjustments to suspect stats.
///
/// Stress and trust carry signed changes; lies and contradictions are
/// increment-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatDeltas {
    pub stress: Option<i32>,
    pub trust: Option<i32>,
    pub lies: u32,
    pub contradictions: u32,
}

impl StatDeltas {
    pub fn stress(amount: i32) -> Self {
        Self {
            stress: Some(amount),
            ..Self::default()
        }
    }

    pub fn trust(amount: i32) -> Self {
        Self {
            trust: Some(amount),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Who spoke a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Detective,
    Suspect,
}

/// One utterance in the interrogation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Evidence id presented alongside this question, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_id: Option<String>,
}

/// A fixed fact the detective may present to the suspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub presented: bool,
}

impl EvidenceItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            presented: false,
        }
    }
}

/// The full mutable record of one suspect's interrogation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub suspect_id: SuspectId,
    pub stats: SuspectStats,
    conversation_log: Vec<Turn>,
    pub evidence: Vec<EvidenceItem>,
    /// Evidence ids ordered by first presentation.
    pub presented_ids: Vec<String>,
    pub flags: HashMap<String, bool>,
}

impl SessionState {
    /// Create the initial snapshot for a suspect.
    pub fn new(suspect_id: SuspectId) -> Self {
        Self {
            suspect_id,
            stats: suspect_id.initial_stats(),
            conversation_log: Vec::new(),
            evidence: suspect_id.evidence_catalogue(),
            presented_ids: Vec::new(),
            flags: HashMap::new(),
        }
    }

    /// Restore the initial snapshot: initial stats, full evidence catalogue
    /// unpresented, empty log and flags.
    pub fn reset(&mut self) {
        *self = Self::new(self.suspect_id);
    }

    /// Append a turn, evicting the oldest once the ring is full.
    pub fn append_turn(
        &mut self,
        speaker: Speaker,
        text: impl Into<String>,
        evidence_id: Option<&str>,
    ) {
        self.conversation_log.push(Turn {
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
            evidence_id: evidence_id.map(str::to_owned),
        });
        while self.conversation_log.len() > MAX_CONVERSATION_TURNS {
            self.conversation_log.remove(0);
        }
    }

    /// The retained turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.conversation_log
    }

    pub fn evidence_item(&self, id: &str) -> Option<&EvidenceItem> {
        self.evidence.iter().find(|e| e.id == id)
    }

    /// Flip an evidence item to presented. Monotonic: a presented item never
    /// reverts, and repeat presentations keep the original ordering entry.
    /// Returns false if the id is not in the catalogue.
    pub fn mark_evidence_presented(&mut self, id: &str) -> bool {
        let Some(item) = self.evidence.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if !item.presented {
            item.presented = true;
            self.presented_ids.push(item.id.clone());
        }
        true
    }

    pub fn first_unpresented_evidence(&self) -> Option<&EvidenceItem> {
        self.evidence.iter().find(|e| !e.presented)
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.flags.insert(key.into(), value);
    }

    /// Stats formatted for the system prompt.
    pub fn stats_context(&self) -> String {
        format!(
            "Stress: {}/100, Trust: {}/100, Lies told: {}, Contradictions caught: {}",
            self.stats.stress, self.stats.trust, self.stats.lies, self.stats.contradictions
        )
    }

    /// Presented evidence formatted for the system prompt.
    pub fn evidence_context(&self) -> String {
        let presented: Vec<_> = self.evidence.iter().filter(|e| e.presented).collect();
        if presented.is_empty() {
            return "No evidence has been presented yet.".to_string();
        }

        let mut context = String::from("Evidence presented to suspect:\n");
        for item in presented {
            context.push_str(&format!("- {}: {}\n", item.name, item.description));
        }
        context.truncate(context.trim_end().len());
        context
    }

    /// Full conversation history formatted for the system prompt, numbered,
    /// in interrogation-turn order.
    pub fn conversation_context(&self) -> String {
        if self.conversation_log.is_empty() {
            return "Interrogation just beginning - no questions asked yet.".to_string();
        }

        self.conversation_log
            .iter()
            .enumerate()
            .map(|(i, turn)| {
                let label = match turn.speaker {
                    Speaker::Detective => "Detective",
                    Speaker::Suspect => self.suspect_id.display_name(),
                };
                let evidence_note = turn
                    .evidence_id
                    .as_deref()
                    .map(|id| format!(" [Evidence: {id}]"))
                    .unwrap_or_default();
                format!("{}. {}: {}{}", i + 1, label, turn.text, evidence_note)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
