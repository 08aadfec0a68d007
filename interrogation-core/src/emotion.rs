//! Presentation-layer emotional state mapping.
//!
//! The parser hands back whatever label the model produced. The closed
//! vocabulary lives here, at the presentation boundary: labels fold into a
//! fixed set of poses with per-suspect sprite lookups, and anything
//! unrecognized degrades to a default instead of failing.

use crate::suspect::SuspectId;

/// Closed emotional vocabulary for suspect portraits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Emotion {
    Calm,
    #[default]
    Nervous,
    Defensive,
    Angry,
    Breaking,
    Surprised,
    Neutral,
    Cold,
}

impl Emotion {
    /// Fold an open model-produced label into the closed vocabulary.
    /// Unknown labels map to [`Emotion::Nervous`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "calm" | "composed" | "controlled" | "measured" | "firm" => Emotion::Calm,
            "nervous" | "panicked" | "worried" | "scared" | "anxious" | "desperate" => {
                Emotion::Nervous
            }
            "defensive" | "guarded" | "evasive" | "tense" => Emotion::Defensive,
            "angry" | "hostile" | "explosive" | "bitter" => Emotion::Angry,
            "breaking" | "crying" | "tearful" | "defeated" | "ashamed" => Emotion::Breaking,
            "surprised" | "shocked" | "confused" => Emotion::Surprised,
            "neutral" | "thoughtful" | "honest" | "cooperative" | "agreeing" | "resigned" => {
                Emotion::Neutral
            }
            "cold" | "calculating" | "sharp" | "dismissive" => Emotion::Cold,
            _ => Emotion::Nervous,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Calm => "calm",
            Emotion::Nervous => "nervous",
            Emotion::Defensive => "defensive",
            Emotion::Angry => "angry",
            Emotion::Breaking => "breaking",
            Emotion::Surprised => "surprised",
            Emotion::Neutral => "neutral",
            Emotion::Cold => "cold",
        }
    }

    /// Sprite file name for a suspect in this emotional state.
    ///
    /// Each suspect's art set covers a different subset of poses; states a
    /// set lacks fall back to the nearest pose it carries.
    pub fn sprite(&self, suspect: SuspectId) -> String {
        let pose = match (suspect, self) {
            (SuspectId::Harper, Emotion::Cold) => "defensive",
            (SuspectId::Harper, Emotion::Neutral) => "calm",

            (SuspectId::Marcus, Emotion::Calm) => "controlled",
            (SuspectId::Marcus, Emotion::Cold) => "controlled",
            (SuspectId::Marcus, Emotion::Surprised) => "nervous",
            (SuspectId::Marcus, Emotion::Breaking) => "nervous",

            (SuspectId::Rowan, Emotion::Nervous) => "tense",
            (SuspectId::Rowan, Emotion::Defensive) => "controlled",
            (SuspectId::Rowan, Emotion::Angry) => "sharp",
            (SuspectId::Rowan, Emotion::Breaking) => "tense",
            (SuspectId::Rowan, Emotion::Surprised) => "neutral",

            _ => self.as_str(),
        };
        format!("{}_{}.png", suspect.as_str(), pose)
    }
}
