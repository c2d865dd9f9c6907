use crate::error::TriageError;
use crate::models::TriageInput;

pub const MAX_SYMPTOM_LEN: usize = 1_000;
pub const MAX_CITY_LEN: usize = 120;

/// Gate in front of the pipeline. A rejected submission runs no stage at all.
/// Only the ends are trimmed; inner text reaches every stage as typed.
pub fn validate_input(symptom: &str, city: &str) -> Result<TriageInput, TriageError> {
    let symptom = symptom.trim();
    let city = city.trim();

    if symptom.is_empty() || city.is_empty() {
        return Err(TriageError::EmptyInput);
    }

    check_len("symptom", symptom, MAX_SYMPTOM_LEN)?;
    check_len("city", city, MAX_CITY_LEN)?;

    Ok(TriageInput {
        symptom: symptom.to_string(),
        city: city.to_string(),
    })
}

/// Symptom-only gate for classification without a city.
pub fn validate_symptom(symptom: &str) -> Result<String, TriageError> {
    let symptom = symptom.trim();
    if symptom.is_empty() {
        return Err(TriageError::EmptyInput);
    }

    check_len("symptom", symptom, MAX_SYMPTOM_LEN)?;
    Ok(symptom.to_string())
}

fn check_len(field: &'static str, text: &str, max: usize) -> Result<(), TriageError> {
    if text.chars().count() > max {
        return Err(TriageError::InputTooLong { field, max });
    }
    Ok(())
}
