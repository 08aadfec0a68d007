//! The interrogation controller - the primary public API.
//!
//! Wraps the Claude client, the session registry, and the parsing pipeline
//! into one question/answer cycle per call. A cycle: validate evidence,
//! append the question, build the system prompt, make exactly one completion
//! call, parse, apply stat markers, append the cleaned reply.

use crate::parser::{self, ParsedResponse};
use crate::prompt::build_system_prompt;
use crate::registry::SessionRegistry;
use crate::state::{SessionState, Speaker, StatDeltas, SuspectStats};
use crate::suspect::SuspectId;
use claude::{Claude, Message, Request, Usage};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from interrogation operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("completion client error: {0}")]
    Client(#[from] claude::Error),

    #[error("No API key configured - set ANTHROPIC_API_KEY environment variable")]
    NoApiKey,

    #[error("unknown evidence id for {suspect}: {evidence_id}")]
    UnknownEvidence {
        suspect: SuspectId,
        evidence_id: String,
    },
}

/// Configuration for the interrogation controller.
#[derive(Debug, Clone)]
pub struct InterrogationConfig {
    /// Model override; the client default is used when unset.
    pub model: Option<String>,

    /// Maximum tokens for suspect responses.
    pub max_tokens: usize,

    /// Temperature for generation.
    pub temperature: Option<f32>,

    /// Ask the model for the structured suggestion format.
    pub include_suggestions: bool,
}

impl Default for InterrogationConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 8000,
            temperature: Some(0.7),
            include_suggestions: true,
        }
    }
}

impl InterrogationConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_suggestions(mut self, include: bool) -> Self {
        self.include_suggestions = include;
        self
    }
}

/// One answered question.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The suspect's reply, stat markers stripped.
    pub reply: String,

    /// Suggested follow-up questions, at most 4.
    pub suggestions: Vec<String>,

    /// Open emotional label as the model produced it; map it to the closed
    /// vocabulary with [`crate::Emotion::from_label`] at the presentation
    /// layer.
    pub emotional_state: String,

    /// Stats after applying any markers from this reply.
    pub stats: SuspectStats,

    pub usage: Usage,
}

/// The interrogation engine.
///
/// Owns one session per suspect. `ask` takes `&mut self`, so a second
/// question cannot be issued anywhere until the current one resolves; the
/// single-request-in-flight rule is enforced by the borrow checker rather
/// than a runtime queue.
pub struct Interrogation {
    client: Claude,
    config: InterrogationConfig,
    registry: SessionRegistry,
}

impl Interrogation {
    /// Create a controller with an API key. A missing key fails here, at
    /// construction, never mid-interrogation.
    pub fn new(api_key: impl Into<String>) -> Result<Self, SessionError> {
        let client = Claude::new(api_key).map_err(|_| SessionError::NoApiKey)?;
        Ok(Self::with_client(client))
    }

    /// Create a controller from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self, SessionError> {
        let client = Claude::from_env().map_err(|_| SessionError::NoApiKey)?;
        Ok(Self::with_client(client))
    }

    /// Create a controller around a preconfigured client (custom model or
    /// deadline).
    pub fn with_client(client: Claude) -> Self {
        Self {
            client,
            config: InterrogationConfig::default(),
            registry: SessionRegistry::new(),
        }
    }

    pub fn with_config(mut self, config: InterrogationConfig) -> Self {
        self.config = config;
        self
    }

    /// Ask a suspect a question, optionally presenting evidence with it.
    pub async fn ask(
        &mut self,
        suspect: SuspectId,
        question: &str,
        evidence_id: Option<&str>,
    ) -> Result<Answer, SessionError> {
        self.run_cycle(suspect, question, evidence_id, None).await
    }

    /// Like [`Interrogation::ask`], streaming raw incremental text to
    /// `on_text` in arrival order. The streamed fragments still carry stat
    /// markers; the returned [`Answer::reply`] is the cleaned text.
    pub async fn ask_streaming<F>(
        &mut self,
        suspect: SuspectId,
        question: &str,
        evidence_id: Option<&str>,
        mut on_text: F,
    ) -> Result<Answer, SessionError>
    where
        F: FnMut(&str),
    {
        self.run_cycle(suspect, question, evidence_id, Some(&mut on_text))
            .await
    }

    /// Present evidence, defaulting the question text from the item itself.
    pub async fn present_evidence(
        &mut self,
        suspect: SuspectId,
        evidence_id: &str,
        custom_question: Option<&str>,
    ) -> Result<Answer, SessionError> {
        let question = match custom_question {
            Some(q) => q.to_string(),
            None => {
                let session = self.registry.session(suspect);
                let item = session.evidence_item(evidence_id).ok_or_else(|| {
                    SessionError::UnknownEvidence {
                        suspect,
                        evidence_id: evidence_id.to_string(),
                    }
                })?;
                format!(
                    "I have {} here. {}. What do you have to say about this?",
                    item.name, item.description
                )
            }
        };

        self.ask(suspect, &question, Some(evidence_id)).await
    }

    /// Read-only snapshot of a suspect's session (created on first access).
    pub fn session(&mut self, suspect: SuspectId) -> &SessionState {
        self.registry.session(suspect)
    }

    /// Restore a suspect's initial snapshot.
    pub fn reset(&mut self, suspect: SuspectId) {
        self.registry.reset(suspect);
    }

    pub fn set_flag(&mut self, suspect: SuspectId, key: impl Into<String>, value: bool) {
        self.registry.set_flag(suspect, key, value);
    }

    /// Record a caught lie. The parser never touches this counter; it is the
    /// caller's assessment.
    pub fn record_lie(&mut self, suspect: SuspectId) {
        self.registry.update_stats(
            suspect,
            &StatDeltas {
                lies: 1,
                ..StatDeltas::default()
            },
        );
    }

    /// Record a caught contradiction. Caller's assessment, like `record_lie`.
    pub fn record_contradiction(&mut self, suspect: SuspectId) {
        self.registry.update_stats(
            suspect,
            &StatDeltas {
                contradictions: 1,
                ..StatDeltas::default()
            },
        );
    }

    /// Apply manual stat adjustments (clamped).
    pub fn update_stats(&mut self, suspect: SuspectId, deltas: &StatDeltas) {
        self.registry.update_stats(suspect, deltas);
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SessionRegistry {
        &mut self.registry
    }

    /// Verify the completion backend is reachable with the configured key.
    pub async fn check_connection(&self) -> Result<(), SessionError> {
        self.client.check().await?;
        Ok(())
    }

    async fn run_cycle(
        &mut self,
        suspect: SuspectId,
        question: &str,
        evidence_id: Option<&str>,
        on_text: Option<&mut dyn FnMut(&str)>,
    ) -> Result<Answer, SessionError> {
        // Unknown evidence fails before any state is touched.
        if let Some(id) = evidence_id {
            if self.registry.session(suspect).evidence_item(id).is_none() {
                return Err(SessionError::UnknownEvidence {
                    suspect,
                    evidence_id: id.to_string(),
                });
            }
        }

        let session = self.registry.session(suspect);
        session.append_turn(Speaker::Detective, question, evidence_id);
        if let Some(id) = evidence_id {
            session.mark_evidence_presented(id);
        }

        let system_prompt = build_system_prompt(session, self.config.include_suggestions);

        let mut request = Request::new(vec![Message::user(question)])
            .with_system(system_prompt)
            .with_max_tokens(self.config.max_tokens);
        if let Some(ref model) = self.config.model {
            request = request.with_model(model);
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        debug!(suspect = %suspect, evidence = ?evidence_id, "asking question");

        // On failure the question stays in the log and no reply is appended;
        // retry policy belongs to the caller.
        let result = match on_text {
            Some(callback) => self.client.stream(request, |fragment| callback(fragment)).await,
            None => self.client.complete(request).await,
        };
        let response = result.inspect_err(|e| warn!(suspect = %suspect, error = %e, "completion failed"))?;

        let session = self.registry.session(suspect);
        let parsed = ingest_reply(session, &response.text);

        Ok(Answer {
            reply: parsed.reply,
            suggestions: parsed.suggestions,
            emotional_state: parsed.emotional_state,
            stats: session.stats,
            usage: response.usage,
        })
    }
}

/// Apply a raw completion to session state: parse it, apply any stat
/// markers (extracted from the pre-stripped reply), strip the markers, and
/// append the cleaned reply as the suspect's turn.
///
/// Shared between the live controller and the scripted test harness so both
/// run the same pipeline.
pub(crate) fn ingest_reply(session: &mut SessionState, raw: &str) -> ParsedResponse {
    let parsed = parser::parse(raw, session);

    let deltas = parser::extract_stat_deltas(&parsed.reply);
    session.stats.apply(&deltas);

    let reply = parser::strip_stat_markers(&parsed.reply);
    session.append_turn(Speaker::Suspect, reply.as_str(), None);

    ParsedResponse {
        reply,
        suggestions: parsed.suggestions,
        emotional_state: parsed.emotional_state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = InterrogationConfig::default();
        assert_eq!(config.max_tokens, 8000);
        assert_eq!(config.temperature, Some(0.7));
        assert!(config.include_suggestions);
    }

    #[test]
    fn test_config_builders() {
        let config = InterrogationConfig::default()
            .with_model("claude-3-5-haiku-20241022")
            .with_max_tokens(2048)
            .with_temperature(0.9)
            .with_suggestions(false);

        assert_eq!(config.model.as_deref(), Some("claude-3-5-haiku-20241022"));
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.temperature, Some(0.9));
        assert!(!config.include_suggestions);
    }

    #[test]
    fn test_missing_key_fails_at_construction() {
        assert!(matches!(Interrogation::new(""), Err(SessionError::NoApiKey)));
    }

    #[tokio::test]
    async fn test_unknown_evidence_rejected_before_any_mutation() {
        let mut interrogation = Interrogation::new("test-key").unwrap();

        let result = interrogation
            .ask(SuspectId::Harper, "Explain this.", Some("warp_core"))
            .await;

        assert!(matches!(
            result,
            Err(SessionError::UnknownEvidence { .. })
        ));
        let session = interrogation.session(SuspectId::Harper);
        assert!(session.turns().is_empty());
        assert!(session.presented_ids.is_empty());
    }

    #[tokio::test]
    async fn test_present_evidence_unknown_id() {
        let mut interrogation = Interrogation::new("test-key").unwrap();

        let result = interrogation
            .present_evidence(SuspectId::Rowan, "no_such_thing", None)
            .await;

        assert!(matches!(
            result,
            Err(SessionError::UnknownEvidence { .. })
        ));
        assert!(interrogation.session(SuspectId::Rowan).turns().is_empty());
    }

    #[test]
    fn test_ingest_structured_reply() {
        let mut session = SessionState::new(SuspectId::Harper);
        let parsed = ingest_reply(
            &mut session,
            "RESPONSE: [nervous] I dropped it earlier. [+stress:10] SUGGESTIONS: Ask when | Ask where STATE: nervous",
        );

        assert_eq!(parsed.reply, "[nervous] I dropped it earlier.");
        assert_eq!(parsed.suggestions.len(), 2);
        assert_eq!(session.stats.stress, 45); // 35 + 10
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].speaker, Speaker::Suspect);
        assert!(!session.turns()[0].text.contains("[+stress"));
    }

    #[test]
    fn test_ingest_fallback_reply_still_applies_markers() {
        let mut session = SessionState::new(SuspectId::Harper);
        let parsed = ingest_reply(&mut session, "I was home all night. [-trust:5]");

        assert_eq!(parsed.reply, "I was home all night.");
        assert_eq!(session.stats.trust, 20); // 25 - 5
        assert_eq!(parsed.emotional_state, "nervous");
        assert!(!parsed.suggestions.is_empty());
    }

    #[test]
    fn test_record_lie_and_contradiction() {
        let mut interrogation = Interrogation::new("test-key").unwrap();
        interrogation.record_lie(SuspectId::Marcus);
        interrogation.record_lie(SuspectId::Marcus);
        interrogation.record_contradiction(SuspectId::Marcus);

        let stats = interrogation.session(SuspectId::Marcus).stats;
        assert_eq!(stats.lies, 2);
        assert_eq!(stats.contradictions, 1);
    }
}
