//! Structured-response parsing.
//!
//! The model is asked to answer in a labeled `RESPONSE:` / `SUGGESTIONS:` /
//! `STATE:` format. Parsing is total: any input yields a well-formed result,
//! with malformed output degrading to a fallback branch that treats the
//! whole text as the reply and synthesizes suggestions from session state.
//!
//! Stat-change markers (`[+stress:10]`, `[-trust:5]`) are extracted
//! separately, on the pre-stripped reply, and stripped from the text shown
//! to the player.

use crate::state::{SessionState, StatDeltas};
use lazy_static::lazy_static;
use regex::Regex;

/// Upper bound on suggested follow-up questions surfaced to the player.
pub const MAX_SUGGESTIONS: usize = 4;

/// Fallback suggestions are capped lower; they are a degradation path.
const MAX_FALLBACK_SUGGESTIONS: usize = 3;

/// Emotional label used when the model supplies none.
pub const DEFAULT_EMOTIONAL_LABEL: &str = "nervous";

lazy_static! {
    // Label tokens delimit the segments; only the first occurrence counts.
    static ref REPLY_SEGMENT: Regex =
        Regex::new(r"(?s)RESPONSE:\s*(.*?)\s*\|?\s*SUGGESTIONS:").unwrap();
    static ref SUGGESTIONS_SEGMENT: Regex =
        Regex::new(r"(?s)SUGGESTIONS:\s*(.*?)\s*\|?\s*(?:STATE:|\z)").unwrap();
    static ref STATE_LABEL: Regex = Regex::new(r"STATE:\s*([A-Za-z_-]+)").unwrap();
    static ref STRESS_MARKER: Regex = Regex::new(r"\[([+-])stress:(\d+)\]").unwrap();
    static ref TRUST_MARKER: Regex = Regex::new(r"\[([+-])trust:(\d+)\]").unwrap();
    static ref ANY_MARKER: Regex = Regex::new(r"\[[+-](?:stress|trust):\d+\]").unwrap();
}

/// A parsed model response. `reply` still carries stat markers; strip them
/// with [`strip_stat_markers`] before showing the text to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub reply: String,
    pub suggestions: Vec<String>,
    /// Open label exactly as the model produced it (lower-cased). Mapping to
    /// a closed vocabulary happens at the presentation layer.
    pub emotional_state: String,
}

/// Parse raw completion text. Never fails; see the module docs for the
/// fallback behavior.
pub fn parse(raw: &str, state: &SessionState) -> ParsedResponse {
    let reply_match = REPLY_SEGMENT.captures(raw);
    let suggestions_match = SUGGESTIONS_SEGMENT.captures(raw);

    if let (Some(reply), Some(suggestions)) = (reply_match, suggestions_match) {
        let emotional_state = STATE_LABEL
            .captures(raw)
            .map(|c| c[1].to_lowercase())
            .unwrap_or_else(|| DEFAULT_EMOTIONAL_LABEL.to_string());

        return ParsedResponse {
            reply: reply[1].trim().to_string(),
            suggestions: split_suggestions(&suggestions[1]),
            emotional_state,
        };
    }

    // Labels absent or malformed: the whole text is the reply.
    ParsedResponse {
        reply: raw.to_string(),
        suggestions: fallback_suggestions(state),
        emotional_state: DEFAULT_EMOTIONAL_LABEL.to_string(),
    }
}

fn split_suggestions(segment: &str) -> Vec<String> {
    segment
        .split('|')
        .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Deterministic suggestions for when the structured grammar fails: a tactic
/// keyed on current stress, the first unpresented evidence item if any, and
/// generic follow-ups to pad. Always returns at least one entry.
pub fn fallback_suggestions(state: &SessionState) -> Vec<String> {
    let mut suggestions = Vec::new();

    if state.stats.stress < 50 {
        suggestions.push("Press harder on the timeline".to_string());
    } else {
        suggestions.push("Take a softer approach".to_string());
    }

    if let Some(item) = state.first_unpresented_evidence() {
        suggestions.push(format!("Present evidence: {}", item.name));
    }

    suggestions.push("Ask what they were doing when Elias disappeared".to_string());
    suggestions.push("Question the details of the alibi".to_string());

    suggestions.truncate(MAX_FALLBACK_SUGGESTIONS);
    suggestions
}

/// Scan text for stat-change markers. At most one delta per field; when a
/// field's marker appears more than once, the first wins.
pub fn extract_stat_deltas(text: &str) -> StatDeltas {
    let mut deltas = StatDeltas::default();

    if let Some(c) = STRESS_MARKER.captures(text) {
        deltas.stress = signed_magnitude(&c[1], &c[2]);
    }
    if let Some(c) = TRUST_MARKER.captures(text) {
        deltas.trust = signed_magnitude(&c[1], &c[2]);
    }

    deltas
}

fn signed_magnitude(sign: &str, digits: &str) -> Option<i32> {
    let magnitude: i32 = digits.parse().ok()?;
    Some(if sign == "+" { magnitude } else { -magnitude })
}

/// Remove all stat markers from text shown to the player.
pub fn strip_stat_markers(text: &str) -> String {
    ANY_MARKER.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionState;
    use crate::suspect::SuspectId;

    fn harper() -> SessionState {
        SessionState::new(SuspectId::Harper)
    }

    #[test]
    fn test_parse_well_formed() {
        let parsed = parse("RESPONSE: Hello SUGGESTIONS: Q1 | Q2 STATE: calm", &harper());
        assert_eq!(parsed.reply, "Hello");
        assert_eq!(parsed.suggestions, vec!["Q1", "Q2"]);
        assert_eq!(parsed.emotional_state, "calm");
    }

    #[test]
    fn test_parse_pipe_separated_sections() {
        let raw = "RESPONSE: [nervous] \"I was in my room.\" | SUGGESTIONS: \"Was anyone with you?\" | \"What time?\" | STATE: nervous";
        let parsed = parse(raw, &harper());
        assert_eq!(parsed.reply, "[nervous] \"I was in my room.\"");
        assert_eq!(
            parsed.suggestions,
            vec!["Was anyone with you?", "What time?"]
        );
        assert_eq!(parsed.emotional_state, "nervous");
    }

    #[test]
    fn test_parse_never_fails_on_empty_input() {
        let parsed = parse("", &harper());
        assert_eq!(parsed.reply, "");
        assert!(!parsed.suggestions.is_empty());
        assert_eq!(parsed.emotional_state, DEFAULT_EMOTIONAL_LABEL);
    }

    #[test]
    fn test_partial_labels_fall_back() {
        // RESPONSE without SUGGESTIONS is not the structured format.
        let raw = "RESPONSE: Just a reply, nothing else. STATE: angry";
        let parsed = parse(raw, &harper());
        assert_eq!(parsed.reply, raw);
        assert_eq!(parsed.emotional_state, DEFAULT_EMOTIONAL_LABEL);
        assert!(!parsed.suggestions.is_empty());
    }

    #[test]
    fn test_plain_text_falls_back_with_whole_reply() {
        let raw = "I don't know what you're talking about.";
        let parsed = parse(raw, &harper());
        assert_eq!(parsed.reply, raw);
        assert_eq!(parsed.emotional_state, DEFAULT_EMOTIONAL_LABEL);
    }

    #[test]
    fn test_empty_suggestion_list_is_valid() {
        let parsed = parse("RESPONSE: Fine. SUGGESTIONS: STATE: calm", &harper());
        assert_eq!(parsed.reply, "Fine.");
        assert!(parsed.suggestions.is_empty());
        assert_eq!(parsed.emotional_state, "calm");
    }

    #[test]
    fn test_suggestions_capped_at_four() {
        let parsed = parse(
            "RESPONSE: Ok SUGGESTIONS: a | b | c | d | e | f STATE: calm",
            &harper(),
        );
        assert_eq!(parsed.suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(parsed.suggestions, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_suggestions_trimmed_and_unquoted() {
        let parsed = parse(
            "RESPONSE: Ok SUGGESTIONS:  \"Press her\"  | 'Soften up' |   STATE: calm",
            &harper(),
        );
        assert_eq!(parsed.suggestions, vec!["Press her", "Soften up"]);
    }

    #[test]
    fn test_missing_state_defaults() {
        let parsed = parse("RESPONSE: Ok SUGGESTIONS: Q1 | Q2", &harper());
        assert_eq!(parsed.reply, "Ok");
        assert_eq!(parsed.suggestions, vec!["Q1", "Q2"]);
        assert_eq!(parsed.emotional_state, DEFAULT_EMOTIONAL_LABEL);
    }

    #[test]
    fn test_unknown_state_label_passes_through_lowercased() {
        let parsed = parse(
            "RESPONSE: Ok SUGGESTIONS: Q1 STATE: Flabbergasted",
            &harper(),
        );
        assert_eq!(parsed.emotional_state, "flabbergasted");
    }

    #[test]
    fn test_only_first_labeled_structure_honored() {
        let parsed = parse(
            "RESPONSE: First SUGGESTIONS: A STATE: calm RESPONSE: Second SUGGESTIONS: B STATE: angry",
            &harper(),
        );
        assert_eq!(parsed.reply, "First");
        assert_eq!(parsed.emotional_state, "calm");
    }

    #[test]
    fn test_extract_stat_deltas() {
        let deltas = extract_stat_deltas("foo [+stress:10] bar [-trust:5]");
        assert_eq!(deltas.stress, Some(10));
        assert_eq!(deltas.trust, Some(-5));
    }

    #[test]
    fn test_extract_first_marker_wins() {
        let deltas = extract_stat_deltas("[+stress:3] then later [+stress:40]");
        assert_eq!(deltas.stress, Some(3));
        assert_eq!(deltas.trust, None);
    }

    #[test]
    fn test_extract_no_markers() {
        assert!(extract_stat_deltas("nothing here").is_empty());
    }

    #[test]
    fn test_strip_stat_markers() {
        let cleaned = strip_stat_markers("I was home. [+stress:10] I swear. [-trust:5]");
        assert_eq!(cleaned, "I was home.  I swear.");
        assert!(!cleaned.contains("stress"));
    }

    #[test]
    fn test_deltas_apply_to_stats() {
        let mut state = harper();
        state.stats.stress = 50;
        state.stats.trust = 50;
        let deltas = extract_stat_deltas("foo [+stress:10] bar [-trust:5]");
        state.stats.apply(&deltas);
        assert_eq!(state.stats.stress, 60);
        assert_eq!(state.stats.trust, 45);
    }

    #[test]
    fn test_fallback_suggestions_reflect_stress() {
        let mut state = harper();
        assert_eq!(fallback_suggestions(&state)[0], "Press harder on the timeline");

        state.stats.stress = 80;
        assert_eq!(fallback_suggestions(&state)[0], "Take a softer approach");
    }

    #[test]
    fn test_fallback_suggestions_name_unpresented_evidence() {
        let mut state = harper();
        let suggestions = fallback_suggestions(&state);
        assert!(suggestions.len() <= 3 && !suggestions.is_empty());
        assert!(suggestions[1].starts_with("Present evidence: "));

        // All evidence presented: still at least one entry, no evidence line.
        let ids: Vec<String> = state.evidence.iter().map(|e| e.id.clone()).collect();
        for id in ids {
            state.mark_evidence_presented(&id);
        }
        let suggestions = fallback_suggestions(&state);
        assert!(!suggestions.is_empty());
        assert!(suggestions.iter().all(|s| !s.starts_with("Present evidence")));
    }
}
