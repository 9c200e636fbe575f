use studio_contracts::catalog::{AspectRatio, Resolution};
use studio_contracts::history::{GenerationKind, SessionHistory};
use studio_contracts::images::ImageResource;

use super::{
    CredentialGate, FailureMessages, PendingCall, PendingRequest, SubmitOutcome, SubmitSkip,
    Workflow, WorkflowCore, WorkflowStatus,
};
use crate::credentials::CredentialCheck;

pub const PRO_EMPTY_MESSAGE: &str = "Generation failed. Please try a different prompt.";
pub const PRO_FAILURE_MESSAGE: &str =
    "Failed to generate image. Ensure your selected project has billing enabled for Gemini 3 Pro.";

/// Text-to-image on the pro model. Every submit with a valid prompt runs the
/// credential check before the request starts.
#[derive(Debug, Clone)]
pub struct ProWorkflow {
    core: WorkflowCore,
    prompt: String,
    resolution: Resolution,
    aspect_ratio: AspectRatio,
}

impl Default for ProWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl ProWorkflow {
    pub fn new() -> Self {
        Self {
            core: WorkflowCore::new(
                GenerationKind::Pro,
                FailureMessages {
                    empty_result: PRO_EMPTY_MESSAGE,
                    service_failure: PRO_FAILURE_MESSAGE,
                },
                CredentialGate::EverySubmit,
            ),
            prompt: String::new(),
            resolution: Resolution::default(),
            aspect_ratio: AspectRatio::default(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
        self.core.form_edited();
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
        self.core.form_edited();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.aspect_ratio = aspect_ratio;
        self.core.form_edited();
    }
}

impl Workflow for ProWorkflow {
    fn kind(&self) -> GenerationKind {
        self.core.kind()
    }

    fn status(&self) -> &WorkflowStatus {
        self.core.status()
    }

    fn credential_confirmed(&self) -> bool {
        self.core.credential_confirmed()
    }

    fn confirm_credential(&mut self, check: CredentialCheck) {
        self.core.confirm_credential(check);
    }

    fn begin_submit(&mut self) -> Result<PendingRequest, SubmitSkip> {
        self.core.ensure_idle()?;
        if self.prompt.trim().is_empty() {
            return Err(SubmitSkip::EmptyPrompt);
        }
        self.core.ensure_credential()?;
        let call = PendingCall::Pro {
            prompt: self.prompt.clone(),
            resolution: self.resolution,
            aspect_ratio: self.aspect_ratio,
        };
        Ok(self.core.start(format!("Pro: {}", self.prompt), call))
    }

    fn receive_result(
        &mut self,
        images: Vec<ImageResource>,
        history: &mut SessionHistory,
    ) -> SubmitOutcome {
        self.core.receive_result(images, history)
    }

    fn receive_error(&mut self, err: &anyhow::Error) -> SubmitOutcome {
        self.core.receive_error(err)
    }

    /// Clears the form.
    fn reset(&mut self) {
        self.core.reset();
        self.prompt.clear();
        self.resolution = Resolution::default();
        self.aspect_ratio = AspectRatio::default();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use studio_contracts::catalog::Resolution;
    use studio_contracts::history::{GenerationKind, SessionHistory};

    use super::{ProWorkflow, PRO_EMPTY_MESSAGE, PRO_FAILURE_MESSAGE};
    use crate::adapter::{AdapterModels, GenerationAdapter};
    use crate::credentials::CredentialHost;
    use crate::failures::{WorkflowErrorKind, CREDENTIAL_FAILURE_MESSAGE};
    use crate::gemini::{ApiKeySource, GeminiConfig, GeminiService};
    use crate::service::ServiceRegistry;
    use crate::test_support::{image_response, scripted_adapter};
    use crate::workflows::{SubmitOutcome, SubmitSkip, Workflow, WorkflowPhase};

    /// Host that never has a credential selected and counts its prompts.
    struct UnselectedHost {
        prompts: Arc<AtomicUsize>,
    }

    impl CredentialHost for UnselectedHost {
        fn has_selected_credential(&self) -> bool {
            false
        }

        fn open_credential_selection(&self) {
            self.prompts.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn red_cube_at_4k_with_no_images_fails_softly() {
        let (adapter, script) = scripted_adapter(vec![Ok(image_response(&[]))]);
        let mut history = SessionHistory::new();
        let mut pro = ProWorkflow::new();
        pro.set_prompt("a red cube");
        pro.set_resolution(Resolution::FourK);

        match pro.submit(&adapter, &mut history) {
            SubmitOutcome::Failed(error) => {
                assert_eq!(error.kind(), WorkflowErrorKind::EmptyResult);
                assert_eq!(error.message(), PRO_EMPTY_MESSAGE);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(pro.status().phase(), WorkflowPhase::Failed);
        assert!(history.is_empty());
        assert_eq!(
            script.requests()[0].to_payload()["generationConfig"]["imageConfig"],
            json!({"imageSize": "4K", "aspectRatio": "1:1"})
        );
    }

    #[test]
    fn every_submit_checks_the_credential_after_the_prompt() -> anyhow::Result<()> {
        let (adapter, _script) = scripted_adapter(vec![Ok(image_response(&["Y3ViZQ=="]))]);
        let mut history = SessionHistory::new();
        let mut pro = ProWorkflow::new();
        assert!(!pro.credential_confirmed());

        pro.set_prompt("a red cube");
        assert_eq!(pro.begin_submit(), Err(SubmitSkip::CredentialUnconfirmed));
        assert_eq!(pro.status().phase(), WorkflowPhase::AwaitingInput);

        let outcome = pro.submit(&adapter, &mut history);
        assert!(!pro.credential_confirmed());
        let record = outcome.record().ok_or_else(|| anyhow::anyhow!("expected a record"))?;
        assert_eq!(record.kind(), GenerationKind::Pro);
        assert_eq!(record.prompt(), "Pro: a red cube");
        assert_eq!(pro.begin_submit(), Err(SubmitSkip::CredentialUnconfirmed));
        Ok(())
    }

    #[test]
    fn blank_prompt_is_skipped_before_the_credential_check() {
        let (adapter, script) = scripted_adapter(vec![]);
        let mut history = SessionHistory::new();
        let mut pro = ProWorkflow::new();
        pro.set_prompt("  ");
        assert_eq!(
            pro.submit(&adapter, &mut history),
            SubmitOutcome::Skipped(SubmitSkip::EmptyPrompt)
        );
        assert!(!pro.credential_confirmed());
        assert_eq!(script.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn service_failure_mentions_billing() {
        let (adapter, _script) =
            scripted_adapter(vec![Err("Gemini request failed (403): billing".to_string())]);
        let mut history = SessionHistory::new();
        let mut pro = ProWorkflow::new();
        pro.set_prompt("a red cube");
        match pro.submit(&adapter, &mut history) {
            SubmitOutcome::Failed(error) => assert_eq!(error.message(), PRO_FAILURE_MESSAGE),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(pro.status().phase(), WorkflowPhase::Failed);
    }

    #[test]
    fn missing_key_reprompts_on_every_submit() -> anyhow::Result<()> {
        let prompts = Arc::new(AtomicUsize::new(0));
        let mut services = ServiceRegistry::new();
        services.register(GeminiService::new(GeminiConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            api_key: ApiKeySource::Fixed(String::new()),
            request_timeout: None,
        })?);
        let adapter = GenerationAdapter::new(services, AdapterModels::defaults()?)
            .with_credential_host(UnselectedHost {
                prompts: Arc::clone(&prompts),
            });
        let mut history = SessionHistory::new();
        let mut pro = ProWorkflow::new();
        pro.set_prompt("a red cube");

        for attempt in 1..=3 {
            match pro.submit(&adapter, &mut history) {
                SubmitOutcome::Failed(error) => {
                    assert_eq!(error.kind(), WorkflowErrorKind::CredentialFailure);
                    assert_eq!(error.message(), CREDENTIAL_FAILURE_MESSAGE);
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
            assert_eq!(prompts.load(Ordering::SeqCst), attempt);
        }
        assert!(history.is_empty());
        Ok(())
    }
}
