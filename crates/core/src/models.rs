use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DISCLAIMER: &str = "Disclaimer: This is an AI-generated demo. Please verify all medical information with certified professionals before use.";

pub const DEFAULT_CITY: &str = "Mumbai";

/// Label the classifier reply resolves to. `Unrecognized` covers empty or
/// off-script replies; the router sends it down the general branch while the
/// advice table answers it with the consult-a-doctor line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomCategory {
    General,
    Emergency,
    MentalHealth,
    Unrecognized,
}

impl SymptomCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Emergency => "emergency",
            Self::MentalHealth => "mental_health",
            Self::Unrecognized => "unrecognized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    General,
    Emergency,
    MentalHealth,
}

impl Branch {
    pub const ALL: [Branch; 3] = [Branch::General, Branch::Emergency, Branch::MentalHealth];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Emergency => "emergency",
            Self::MentalHealth => "mental_health",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stages a single run walks through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    Classified,
    Branched(Branch),
    Advised,
    DietSuggested,
    FollowedUp,
    End,
}

impl PipelineStage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Classified => "classified",
            Self::Branched(branch) => branch.as_str(),
            Self::Advised => "advised",
            Self::DietSuggested => "diet_suggested",
            Self::FollowedUp => "followed_up",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageInput {
    pub symptom: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageRecord {
    pub symptom: String,
    pub city: String,
    /// Classifier reply, trimmed and lower-cased but otherwise unvalidated.
    pub category: String,
    pub classification: SymptomCategory,
    pub branch: Branch,
    pub answer: String,
    pub advice: String,
    pub diet: String,
    pub follow_up: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    SpeakToDoctor,
    SeeHospitals,
    Exit,
}

impl NextAction {
    pub const ALL: [NextAction; 3] = [
        NextAction::SpeakToDoctor,
        NextAction::SeeHospitals,
        NextAction::Exit,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "speak_to_doctor" | "doctor" => Some(Self::SpeakToDoctor),
            "see_hospitals" | "hospitals" => Some(Self::SeeHospitals),
            "exit" | "quit" => Some(Self::Exit),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::SpeakToDoctor => "speak_to_doctor",
            Self::SeeHospitals => "see_hospitals",
            Self::Exit => "exit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SpeakToDoctor => "Speak to doctor",
            Self::SeeHospitals => "See hospitals",
            Self::Exit => "Exit",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::SpeakToDoctor => "Connecting you to a doctor now...",
            Self::SeeHospitals => "Here are the hospitals recommended above.",
            Self::Exit => "Thank you! Wishing you good health.",
        }
    }
}
