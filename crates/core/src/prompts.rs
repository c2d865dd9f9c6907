pub const DIET_PREFIX: &str = "Diet Suggestion:";

pub fn classifier_prompt(symptom: &str) -> String {
    format!(
        "You are a medical assistant. Classify the symptom: '{symptom}' \
         into one word: General, Emergency, or Mental Health."
    )
}

pub fn diet_prompt(symptom: &str) -> String {
    format!(
        "As a certified dietitian, suggest a short diet tip for: '{symptom}'. \
         Start with: {DIET_PREFIX}"
    )
}

pub fn follow_up_prompt(symptom: &str, city: &str) -> String {
    format!(
        "You are a hospital assistant AI.\n\
         Symptom: '{symptom}'\n\
         City: '{city}'\n\
         Suggest:\n\
         - Type of specialist doctor needed\n\
         - 2–3 well-known hospitals in this city with specialization\n\
         Return in markdown format like:\n\
         ### Specialist\n\
         Cardiologist\n\
         \n\
         ### Hospitals\n\
         - Lilavati Hospital, Bandra – Cardiology\n\
         - Kokilaben Hospital, Andheri – Emergency Cardiac Care\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_prompt_lists_the_three_labels() {
        let prompt = classifier_prompt("fever");
        assert!(prompt.contains("'fever'"));
        assert!(prompt.ends_with("General, Emergency, or Mental Health."));
    }

    #[test]
    fn diet_prompt_requests_prefix() {
        assert!(diet_prompt("nausea").ends_with("Start with: Diet Suggestion:"));
    }

    #[test]
    fn follow_up_prompt_names_city_and_markdown_shape() {
        let prompt = follow_up_prompt("chest pain", "Pune");
        assert!(prompt.starts_with("You are a hospital assistant AI.\nSymptom: 'chest pain'\nCity: 'Pune'\n"));
        assert!(prompt.contains("### Specialist\nCardiologist\n\n### Hospitals\n- "));
    }
}
