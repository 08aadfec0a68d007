//! The suspect roster.
//!
//! Fixed catalogue of interrogation subjects for the Elias Moore case:
//! identities, starting stats, per-suspect evidence, and the hand-authored
//! persona prompts.

use crate::state::{EvidenceItem, SuspectStats};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the interrogation subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspectId {
    Harper,
    Marcus,
    Rowan,
}

impl SuspectId {
    pub const ALL: [SuspectId; 3] = [SuspectId::Harper, SuspectId::Marcus, SuspectId::Rowan];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuspectId::Harper => "harper",
            SuspectId::Marcus => "marcus",
            SuspectId::Rowan => "rowan",
        }
    }

    /// Name used when labeling the suspect's lines in conversation context.
    pub fn display_name(&self) -> &'static str {
        match self {
            SuspectId::Harper => "Harper",
            SuspectId::Marcus => "Marcus",
            SuspectId::Rowan => "Rowan",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            SuspectId::Harper => "Harper Lin",
            SuspectId::Marcus => "Marcus Hale",
            SuspectId::Rowan => "Rowan Adler",
        }
    }

    /// Parse a lowercase suspect id.
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "harper" => Some(SuspectId::Harper),
            "marcus" => Some(SuspectId::Marcus),
            "rowan" => Some(SuspectId::Rowan),
            _ => None,
        }
    }

    /// Starting stress/trust for this suspect.
    pub fn initial_stats(&self) -> SuspectStats {
        match self {
            // Guarded but already frightened of what the night means for her.
            SuspectId::Harper => SuspectStats::new(35, 25),
            // Clinically anxious and distrustful of anyone official.
            SuspectId::Marcus => SuspectStats::new(45, 20),
            // Composed professional; pressure barely registers at first.
            SuspectId::Rowan => SuspectStats::new(20, 30),
        }
    }

    /// The fixed evidence catalogue for this suspect, all unpresented.
    pub fn evidence_catalogue(&self) -> Vec<EvidenceItem> {
        match self {
            SuspectId::Harper => vec![
                EvidenceItem::new(
                    "broken_wineglass",
                    "Broken Wineglass",
                    "Shattered glass near the fireplace with Harper's lipstick shade",
                ),
                EvidenceItem::new(
                    "unsent_texts",
                    "Unsent Text Messages",
                    "Harper's phone, 11:47 PM, vengeful messages never sent to Elias",
                ),
                EvidenceItem::new(
                    "insurance_policy",
                    "Life Insurance Policy",
                    "2 million dollar policy, Harper is 40% beneficiary",
                ),
                EvidenceItem::new(
                    "dock_timeline",
                    "Security Timeline",
                    "Harper seen at the dock at 11:15 PM, not in her room as claimed",
                ),
            ],
            SuspectId::Marcus => vec![
                EvidenceItem::new(
                    "boot_prints",
                    "Boot Prints at the Overlook",
                    "Size 11 Merrell tread in the mud at the cliff overlook, matched to Marcus's boots",
                ),
                EvidenceItem::new(
                    "phone_recording",
                    "Phone Recording",
                    "Two minutes of the 11:03 PM dock confrontation, captured by Marcus's own phone",
                ),
                EvidenceItem::new(
                    "pill_count",
                    "Tranquilizer Pill Count",
                    "Marcus's Lorazepam bottle is three pills short of the prescribed schedule",
                ),
                EvidenceItem::new(
                    "car_mileage",
                    "Car Mileage",
                    "Mud on Marcus's tires matches overlook soil; the odometer shows 4.2 unexplained miles",
                ),
            ],
            SuspectId::Rowan => vec![
                EvidenceItem::new(
                    "disabled_cameras",
                    "Disabled Camera System",
                    "Security system logs show a manual shutdown at 10:03 PM, not storm damage",
                ),
                EvidenceItem::new(
                    "wrist_burn",
                    "Wrist Burn",
                    "Fresh second-degree burn on Rowan's left wrist, hours old at the time of questioning",
                ),
                EvidenceItem::new(
                    "burner_phone",
                    "Burner Phone",
                    "Prepaid phone found at the dock with texts about a 2 AM pickup at the overlook",
                ),
                EvidenceItem::new(
                    "document_ashes",
                    "Document Ashes",
                    "Burned paper remains in the boathouse fireplace, consistent with policy paperwork",
                ),
            ],
        }
    }

    /// Hand-authored persona and backstory text for the system prompt.
    pub(crate) fn persona(&self) -> &'static str {
        match self {
            SuspectId::Harper => include_str!("prompts/harper.txt"),
            SuspectId::Marcus => include_str!("prompts/marcus.txt"),
            SuspectId::Rowan => include_str!("prompts/rowan.txt"),
        }
    }
}

impl fmt::Display for SuspectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
