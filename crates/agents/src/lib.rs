use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use triage_core::{
    advice_for, classifier_prompt, compose_answer, diet_prompt, follow_up_prompt, normalize_reply,
    route, validate_input, validate_symptom, Branch, PipelineStage, SymptomCategory, TriageError, TriageInput,
    TriageRecord,
};
use triage_llm::TextGenerator;
use triage_observability::AppMetrics;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: String,
    pub classification: SymptomCategory,
    pub branch: Branch,
}

/// The classify, route, respond, advise, diet, follow-up workflow. Built once
/// at startup and shared by every request; each run owns its own record.
pub struct TriagePipeline<G>
where
    G: TextGenerator,
{
    generator: Arc<G>,
    metrics: Arc<AppMetrics>,
}

impl<G> Clone for TriagePipeline<G>
where
    G: TextGenerator,
{
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<G> TriagePipeline<G>
where
    G: TextGenerator,
{
    pub fn new(generator: Arc<G>, metrics: Arc<AppMetrics>) -> Self {
        Self { generator, metrics }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    /// Validates raw form input, then runs the pipeline. Rejected input runs
    /// no stage and makes no generation call.
    pub async fn submit(&self, symptom: &str, city: &str) -> Result<TriageRecord, TriageError> {
        self.metrics.inc_request();

        let input = validate_input(symptom, city).map_err(|err| self.reject(err))?;
        self.run(input).await
    }

    #[instrument(skip(self, input), fields(run_id = %Uuid::new_v4()))]
    pub async fn run(&self, input: TriageInput) -> Result<TriageRecord, TriageError> {
        let started = Instant::now();
        trace_stage(PipelineStage::Start);

        let classified = self.classify_validated(&input.symptom).await?;
        trace_stage(PipelineStage::Classified);

        let answer = compose_answer(classified.branch, &input.symptom);
        self.metrics.inc_branch(classified.branch);
        if classified.classification == SymptomCategory::Unrecognized {
            self.metrics.inc_unrecognized();
        }
        trace_stage(PipelineStage::Branched(classified.branch));

        let advice = advice_for(classified.classification).to_string();
        trace_stage(PipelineStage::Advised);

        // Diet and follow-up only read the input, so they are requested together.
        let (diet, follow_up) = futures::try_join!(
            self.generate_stage("diet", diet_prompt(&input.symptom)),
            self.generate_stage("follow_up", follow_up_prompt(&input.symptom, &input.city)),
        )?;
        trace_stage(PipelineStage::DietSuggested);
        trace_stage(PipelineStage::FollowedUp);

        let record = TriageRecord {
            symptom: input.symptom,
            city: input.city,
            category: classified.category,
            classification: classified.classification,
            branch: classified.branch,
            answer,
            advice,
            diet,
            follow_up,
            completed_at: Utc::now(),
        };

        let elapsed = started.elapsed();
        self.metrics.observe_completion(elapsed);
        trace_stage(PipelineStage::End);
        info!(
            branch = %record.branch,
            classification = record.classification.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "triage completed"
        );

        Ok(record)
    }

    /// Classify and route one symptom without running the rest of the
    /// pipeline. Blank or oversized symptoms make no generation call.
    pub async fn classify(&self, symptom: &str) -> Result<Classification, TriageError> {
        let symptom = validate_symptom(symptom).map_err(|err| self.reject(err))?;
        self.classify_validated(&symptom).await
    }

    fn reject(&self, err: TriageError) -> TriageError {
        self.metrics.inc_rejected_input();
        warn!(reason = err.code(), "triage input rejected");
        err
    }

    /// One generation call; the reply is trimmed and lower-cased and kept as
    /// text alongside the parsed category.
    async fn classify_validated(&self, symptom: &str) -> Result<Classification, TriageError> {
        let reply = self
            .generate_stage("classify", classifier_prompt(symptom))
            .await?;
        let category = normalize_reply(&reply);
        let classification = SymptomCategory::parse(&category);
        let branch = route(classification);

        info!(category = %category, branch = %branch, "Classified as: {}", category);

        Ok(Classification {
            category,
            classification,
            branch,
        })
    }

    async fn generate_stage(
        &self,
        stage: &'static str,
        prompt: String,
    ) -> Result<String, TriageError> {
        self.metrics.inc_generation_call();

        match self.generator.generate(&prompt).await {
            Ok(text) => Ok(text.trim().to_string()),
            Err(err) => {
                self.metrics.inc_generation_failure();
                error!(
                    stage,
                    generator = self.generator.name(),
                    error = %err,
                    "generation call failed"
                );
                Err(TriageError::generation(stage, err))
            }
        }
    }
}

fn trace_stage(stage: PipelineStage) {
    debug!(stage = stage.name(), "pipeline stage reached");
}
