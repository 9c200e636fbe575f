use studio_contracts::catalog::{default_product, ProductTemplate};
use studio_contracts::history::{GenerationKind, SessionHistory};
use studio_contracts::images::ImageResource;

use super::{
    CredentialGate, FailureMessages, PendingCall, PendingRequest, SubmitOutcome, SubmitSkip,
    Workflow, WorkflowCore, WorkflowStatus,
};
use crate::credentials::CredentialCheck;

pub const MOCKUP_EMPTY_MESSAGE: &str = "No image was generated. Please try again.";
pub const MOCKUP_FAILURE_MESSAGE: &str =
    "Failed to generate mockup. The API might be busy or the image format unsupported.";

/// Logo upload plus product pick; renders the logo onto the product.
#[derive(Debug, Clone)]
pub struct MockupWorkflow {
    core: WorkflowCore,
    logo: Option<ImageResource>,
    product: &'static ProductTemplate,
    custom_prompt: String,
}

impl Default for MockupWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl MockupWorkflow {
    pub fn new() -> Self {
        Self {
            core: WorkflowCore::new(
                GenerationKind::Mockup,
                FailureMessages {
                    empty_result: MOCKUP_EMPTY_MESSAGE,
                    service_failure: MOCKUP_FAILURE_MESSAGE,
                },
                CredentialGate::AfterFailure,
            ),
            logo: None,
            product: default_product(),
            custom_prompt: String::new(),
        }
    }

    pub fn logo(&self) -> Option<&ImageResource> {
        self.logo.as_ref()
    }

    pub fn product(&self) -> &'static ProductTemplate {
        self.product
    }

    pub fn custom_prompt(&self) -> &str {
        &self.custom_prompt
    }

    pub fn set_logo(&mut self, logo: ImageResource) {
        self.logo = Some(logo);
        self.core.form_edited();
    }

    pub fn set_product(&mut self, product: &'static ProductTemplate) {
        self.product = product;
        self.core.form_edited();
    }

    /// Blank text restores the product's own placement phrase.
    pub fn set_custom_prompt(&mut self, prompt: impl Into<String>) {
        self.custom_prompt = prompt.into();
        self.core.form_edited();
    }

    /// Instruction sent to the service for the current form.
    pub fn instruction(&self) -> String {
        let custom = self.custom_prompt.trim();
        if custom.is_empty() {
            self.product.placement_prompt()
        } else {
            custom.to_string()
        }
    }
}

impl Workflow for MockupWorkflow {
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
        let Some(logo) = self.logo.clone() else {
            return Err(SubmitSkip::MissingLogo);
        };
        self.core.ensure_credential()?;
        let call = PendingCall::Mockup {
            logo,
            product_name: self.product.display_name.to_string(),
            prompt: self.instruction(),
        };
        Ok(self.core.start(self.product.record_prompt(), call))
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

    fn reset(&mut self) {
        self.core.reset();
        self.logo = None;
        self.product = default_product();
        self.custom_prompt.clear();
    }
}
