use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{GenerationError, TextGenerator};

/// Only the most recent prompts are kept so long offline sessions stay bounded.
const MAX_RECORDED_PROMPTS: usize = 64;

/// Deterministic stand-in for the remote model: the first rule whose needle
/// appears in the prompt supplies the completion.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    rules: Vec<(String, String)>,
    fallback: Option<String>,
    fail_on: Vec<String>,
    prompts: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned replies for running the triage flow without credentials.
    pub fn offline_demo() -> Self {
        Self::new()
            .with_rule("Classify the symptom", "General")
            .with_rule(
                "certified dietitian",
                "Diet Suggestion: Stay hydrated and keep meals light: soups, fruit and plain rice.",
            )
            .with_rule(
                "hospital assistant",
                "### Specialist\nGeneral Physician\n\n### Hospitals\n- City General Hospital – Internal Medicine\n- District Civil Hospital – Outpatient Care",
            )
    }

    pub fn with_rule(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((needle.into(), reply.into()));
        self
    }

    pub fn with_fallback(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Some(reply.into());
        self
    }

    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.fail_on.push(needle.into());
        self
    }

    /// Most recent prompts, oldest first, shared across clones.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().iter().cloned().collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn reply_for(&self, prompt: &str) -> Result<String, GenerationError> {
        if let Some(needle) = self.fail_on.iter().find(|needle| prompt.contains(needle.as_str())) {
            return Err(GenerationError::Scripted(needle.clone()));
        }

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .or_else(|| self.fallback.clone())
            .unwrap_or_default();

        Ok(reply)
    }
}

impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        {
            let mut prompts = self.prompts.lock();
            if prompts.len() == MAX_RECORDED_PROMPTS {
                prompts.pop_front();
            }
            prompts.push_back(prompt.to_string());
        }
        self.reply_for(prompt)
    }
}
