use crate::models::{Branch, SymptomCategory};

pub fn compose_answer(branch: Branch, symptom: &str) -> String {
    match branch {
        Branch::General => general_answer(symptom),
        Branch::Emergency => emergency_answer(symptom),
        Branch::MentalHealth => mental_health_answer(symptom),
    }
}

pub fn general_answer(symptom: &str) -> String {
    format!("'{symptom}' seems general. We'll connect you to the General department.")
}

pub fn emergency_answer(symptom: &str) -> String {
    format!("'{symptom}' seems to be an emergency! Please act fast.")
}

pub fn mental_health_answer(symptom: &str) -> String {
    format!("'{symptom}' could be a mental health issue. Let's connect you to a counsellor.")
}

pub fn advice_for(category: SymptomCategory) -> &'static str {
    match category {
        SymptomCategory::General => "Please rest and monitor your symptoms.",
        SymptomCategory::Emergency => "Contact emergency services immediately.",
        SymptomCategory::MentalHealth => "Talk to someone you trust or a professional counsellor.",
        SymptomCategory::Unrecognized => "Consult a doctor for detailed advice.",
    }
}
