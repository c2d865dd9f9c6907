use crate::models::{Branch, SymptomCategory};

/// Classifier replies are kept as text: trimmed, lower-cased, nothing else.
pub fn normalize_reply(reply: &str) -> String {
    reply.trim().to_lowercase()
}

impl SymptomCategory {
    /// Keyword order matters when a reply carries more than one label:
    /// "general" wins over "emergency", which wins over "mental".
    pub fn parse(category: &str) -> Self {
        let lower = category.to_lowercase();

        if lower.contains("general") {
            return Self::General;
        }

        if lower.contains("emergency") {
            return Self::Emergency;
        }

        if lower.contains("mental") {
            return Self::MentalHealth;
        }

        Self::Unrecognized
    }
}

pub fn route(category: SymptomCategory) -> Branch {
    match category {
        SymptomCategory::Emergency => Branch::Emergency,
        SymptomCategory::MentalHealth => Branch::MentalHealth,
        SymptomCategory::General | SymptomCategory::Unrecognized => Branch::General,
    }
}

pub fn route_text(category: &str) -> Branch {
    route(SymptomCategory::parse(category))
}
