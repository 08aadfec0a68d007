//! System prompt assembly.
//!
//! Pure string rendering: persona text plus the current session state, in a
//! fixed section order. No truncation and no reordering of the conversation
//! log; its ordering is interrogation-turn order and carries the narrative.

use crate::state::SessionState;

/// Build the complete system prompt for one completion call.
///
/// Deterministic and side-effect-free given the session state. When
/// `include_suggestion_format` is set, the structured-output grammar the
/// response parser expects is appended.
pub fn build_system_prompt(state: &SessionState, include_suggestion_format: bool) -> String {
    let mut prompt = String::new();

    prompt.push_str(state.suspect_id.persona().trim_end());

    prompt.push_str("\n\n# CURRENT EMOTIONAL DISPOSITION\n\n");
    prompt.push_str(stress_disposition(state.stats.stress));
    prompt.push('\n');
    prompt.push_str(trust_disposition(state.stats.trust));
    prompt.push('\n');

    prompt.push_str("\n# CURRENT INTERROGATION STATE\n\n");
    prompt.push_str("**Stats:** ");
    prompt.push_str(&state.stats_context());
    prompt.push_str("\n\n");
    prompt.push_str(&state.evidence_context());
    prompt.push('\n');

    prompt.push_str("\n**Complete Conversation History:**\n");
    prompt.push_str(&state.conversation_context());
    prompt.push('\n');

    prompt.push('\n');
    prompt.push_str(include_str!("prompts/interrogation_rules.txt").trim_end());

    if include_suggestion_format {
        prompt.push_str("\n\n");
        prompt.push_str(include_str!("prompts/suggestion_format.txt").trim_end());
    }

    prompt.push_str("\n\nNow respond to the detective's next question in character.\n");

    prompt
}

fn stress_disposition(stress: i32) -> &'static str {
    if stress < 30 {
        "You are currently calm and collected, sticking to your story."
    } else if stress < 60 {
        "You are feeling pressured and starting to show cracks."
    } else if stress < 80 {
        "You are very stressed and having trouble keeping your story straight."
    } else {
        "You are breaking down, close to confessing."
    }
}

fn trust_disposition(trust: i32) -> &'static str {
    if trust < 30 {
        "You do not trust the detective and answer defensively."
    } else if trust < 60 {
        "You are starting to trust the detective and considering opening up."
    } else {
        "You trust the detective and might reveal the truth if pushed."
    }
}
