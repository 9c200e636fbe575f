use studio_contracts::history::{GenerationKind, SessionHistory};
use studio_contracts::images::ImageResource;

use super::{
    CredentialGate, FailureMessages, PendingCall, PendingRequest, SubmitOutcome, SubmitSkip,
    Workflow, WorkflowCore, WorkflowStatus,
};
use crate::credentials::CredentialCheck;
use crate::router::SeedImage;

pub const EDIT_EMPTY_MESSAGE: &str = "Could not edit the image. Please try a different prompt.";
pub const EDIT_FAILURE_MESSAGE: &str =
    "Failed to edit image. The AI service might be temporarily unavailable.";

/// Instruction-driven edits of a working image. Each success replaces the
/// working image, so consecutive edits build on each other.
#[derive(Debug, Clone)]
pub struct EditWorkflow {
    core: WorkflowCore,
    working_image: Option<ImageResource>,
    instruction: String,
    adopted_seed: Option<u64>,
}

impl Default for EditWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl EditWorkflow {
    pub fn new() -> Self {
        Self {
            core: WorkflowCore::new(
                GenerationKind::Edit,
                FailureMessages {
                    empty_result: EDIT_EMPTY_MESSAGE,
                    service_failure: EDIT_FAILURE_MESSAGE,
                },
                CredentialGate::AfterFailure,
            ),
            working_image: None,
            instruction: String::new(),
            adopted_seed: None,
        }
    }

    pub fn working_image(&self) -> Option<&ImageResource> {
        self.working_image.as_ref()
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Loads an uploaded image as the new working image. Ignored while a
    /// request is outstanding, since its result becomes the working image.
    pub fn set_image(&mut self, image: ImageResource) -> bool {
        if self.core.status().is_busy() {
            return false;
        }
        self.working_image = Some(image);
        self.core.form_edited();
        true
    }

    pub fn set_instruction(&mut self, instruction: impl Into<String>) {
        self.instruction = instruction.into();
        self.core.form_edited();
    }

    /// Takes the seed as working image unless this handoff was already
    /// adopted. Returns whether the working image changed. While busy the
    /// handoff stays pending and can be adopted once the request settles.
    pub fn adopt_seed(&mut self, seed: &SeedImage) -> bool {
        if self.adopted_seed == Some(seed.token()) || !self.set_image(seed.image().clone()) {
            return false;
        }
        self.adopted_seed = Some(seed.token());
        true
    }
}

impl Workflow for EditWorkflow {
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
        let Some(image) = self.working_image.clone() else {
            return Err(SubmitSkip::MissingImage);
        };
        if self.instruction.trim().is_empty() {
            return Err(SubmitSkip::EmptyInstruction);
        }
        self.core.ensure_credential()?;
        let call = PendingCall::Edit {
            image,
            instruction: self.instruction.clone(),
        };
        Ok(self.core.start(format!("Edit: {}", self.instruction), call))
    }

    fn receive_result(
        &mut self,
        images: Vec<ImageResource>,
        history: &mut SessionHistory,
    ) -> SubmitOutcome {
        let outcome = self.core.receive_result(images, history);
        if let SubmitOutcome::Generated(record) = &outcome {
            self.working_image = Some(record.image().clone());
            self.instruction.clear();
        }
        outcome
    }

    fn receive_error(&mut self, err: &anyhow::Error) -> SubmitOutcome {
        self.core.receive_error(err)
    }

    /// Clears the form; the adopted handoff stays consumed.
    fn reset(&mut self) {
        self.core.reset();
        self.working_image = None;
        self.instruction.clear();
    }
}
