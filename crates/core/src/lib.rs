pub mod category;
pub mod error;
pub mod guard;
pub mod models;
pub mod prompts;
pub mod responders;

pub use category::{normalize_reply, route, route_text};
pub use error::{BoxError, TriageError};
pub use guard::{validate_input, validate_symptom, MAX_CITY_LEN, MAX_SYMPTOM_LEN};
pub use models::*;
pub use prompts::{classifier_prompt, diet_prompt, follow_up_prompt, DIET_PREFIX};
pub use responders::{advice_for, compose_answer};
