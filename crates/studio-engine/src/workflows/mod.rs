//! Per-mode workflow controllers.
//!
//! Each controller owns its form state and a [`WorkflowStatus`] that moves
//! through [`WorkflowPhase`] only via named operations. A submit is split in
//! two halves: `begin_submit` validates the form and marks the controller
//! busy, `receive_result`/`receive_error` settle it. [`Workflow::submit`] runs
//! both halves around one adapter call.

mod edit;
mod mockup;
mod pro;

use std::fmt;

use anyhow::Result;
use studio_contracts::catalog::{AspectRatio, Resolution};
use studio_contracts::history::{GeneratedImageRecord, GenerationKind, SessionHistory};
use studio_contracts::images::ImageResource;

use crate::adapter::GenerationAdapter;
use crate::credentials::CredentialCheck;
use crate::failures::WorkflowError;

pub use edit::{EditWorkflow, EDIT_EMPTY_MESSAGE, EDIT_FAILURE_MESSAGE};
pub use mockup::{MockupWorkflow, MOCKUP_EMPTY_MESSAGE, MOCKUP_FAILURE_MESSAGE};
pub use pro::{ProWorkflow, PRO_EMPTY_MESSAGE, PRO_FAILURE_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    AwaitingInput,
    Busy,
    Succeeded,
    Failed,
}

/// Phase plus whatever the last settled submit left on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowStatus {
    phase: WorkflowPhase,
    last_record: Option<GeneratedImageRecord>,
    last_error: Option<WorkflowError>,
}

impl Default for WorkflowStatus {
    fn default() -> Self {
        Self {
            phase: WorkflowPhase::Idle,
            last_record: None,
            last_error: None,
        }
    }
}

impl WorkflowStatus {
    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == WorkflowPhase::Busy
    }

    /// Most recent successful generation of this workflow.
    pub fn last_record(&self) -> Option<&GeneratedImageRecord> {
        self.last_record.as_ref()
    }

    pub fn last_error(&self) -> Option<&WorkflowError> {
        self.last_error.as_ref()
    }

    fn form_edited(&mut self) {
        if self.phase != WorkflowPhase::Busy {
            self.phase = WorkflowPhase::AwaitingInput;
        }
    }

    fn begin(&mut self) {
        self.phase = WorkflowPhase::Busy;
        self.last_error = None;
    }

    fn succeed(&mut self, record: GeneratedImageRecord) {
        self.phase = WorkflowPhase::Succeeded;
        self.last_record = Some(record);
        self.last_error = None;
    }

    fn fail(&mut self, error: WorkflowError) {
        self.phase = WorkflowPhase::Failed;
        self.last_error = Some(error);
    }
}

/// Why a submit did not start (or a result was not taken).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitSkip {
    Busy,
    MissingLogo,
    MissingImage,
    EmptyInstruction,
    EmptyPrompt,
    CredentialUnconfirmed,
    /// A result or error arrived while no request was outstanding.
    NotBusy,
}

impl SubmitSkip {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitSkip::Busy => "busy",
            SubmitSkip::MissingLogo => "missing_logo",
            SubmitSkip::MissingImage => "missing_image",
            SubmitSkip::EmptyInstruction => "empty_instruction",
            SubmitSkip::EmptyPrompt => "empty_prompt",
            SubmitSkip::CredentialUnconfirmed => "credential_unconfirmed",
            SubmitSkip::NotBusy => "not_busy",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            SubmitSkip::Busy => "A generation is already in progress.",
            SubmitSkip::MissingLogo => "Upload a logo first.",
            SubmitSkip::MissingImage => "Load an image to edit first.",
            SubmitSkip::EmptyInstruction => "Describe the edit you want.",
            SubmitSkip::EmptyPrompt => "Describe the image you want.",
            SubmitSkip::CredentialUnconfirmed => "Select an API key first.",
            SubmitSkip::NotBusy => "No generation was in progress.",
        }
    }
}

impl fmt::Display for SubmitSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Skipped(SubmitSkip),
    Generated(GeneratedImageRecord),
    Failed(WorkflowError),
}

impl SubmitOutcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, SubmitOutcome::Generated(_))
    }

    pub fn record(&self) -> Option<&GeneratedImageRecord> {
        match self {
            SubmitOutcome::Generated(record) => Some(record),
            _ => None,
        }
    }
}

/// The adapter call a started submit is waiting on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingCall {
    Mockup {
        logo: ImageResource,
        product_name: String,
        prompt: String,
    },
    Edit {
        image: ImageResource,
        instruction: String,
    },
    Pro {
        prompt: String,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    kind: GenerationKind,
    record_prompt: String,
    call: PendingCall,
}

impl PendingRequest {
    pub fn kind(&self) -> GenerationKind {
        self.kind
    }

    /// Prompt the history record will carry on success.
    pub fn record_prompt(&self) -> &str {
        &self.record_prompt
    }

    pub fn execute(&self, adapter: &GenerationAdapter) -> Result<Vec<ImageResource>> {
        match &self.call {
            PendingCall::Mockup {
                logo,
                product_name,
                prompt,
            } => adapter.generate_mockup(logo, product_name, Some(prompt)),
            PendingCall::Edit { image, instruction } => adapter.edit_image(image, instruction),
            PendingCall::Pro {
                prompt,
                resolution,
                aspect_ratio,
            } => adapter.generate_high_res_framed(prompt, *resolution, *aspect_ratio),
        }
    }
}

/// Operations shared by the three controllers.
pub trait Workflow {
    fn kind(&self) -> GenerationKind;
    fn status(&self) -> &WorkflowStatus;
    fn credential_confirmed(&self) -> bool;
    fn confirm_credential(&mut self, check: CredentialCheck);
    fn begin_submit(&mut self) -> Result<PendingRequest, SubmitSkip>;
    fn receive_result(
        &mut self,
        images: Vec<ImageResource>,
        history: &mut SessionHistory,
    ) -> SubmitOutcome;
    fn receive_error(&mut self, err: &anyhow::Error) -> SubmitOutcome;
    fn reset(&mut self);

    /// Runs one full submit cycle, performing the credential check first when
    /// the form is otherwise ready but the credential is unconfirmed.
    fn submit(
        &mut self,
        adapter: &GenerationAdapter,
        history: &mut SessionHistory,
    ) -> SubmitOutcome {
        let request = match self.begin_submit() {
            Ok(request) => request,
            Err(SubmitSkip::CredentialUnconfirmed) => {
                self.confirm_credential(adapter.ensure_credential_selected());
                match self.begin_submit() {
                    Ok(request) => request,
                    Err(skip) => return SubmitOutcome::Skipped(skip),
                }
            }
            Err(skip) => return SubmitOutcome::Skipped(skip),
        };
        match request.execute(adapter) {
            Ok(images) => self.receive_result(images, history),
            Err(err) => self.receive_error(&err),
        }
    }
}

/// User-facing texts for the two failure kinds a workflow words itself.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FailureMessages {
    pub(crate) empty_result: &'static str,
    pub(crate) service_failure: &'static str,
}

/// When a controller runs the credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CredentialGate {
    /// Before every submit; a started request consumes the confirmation.
    EverySubmit,
    /// Only after a submit failed on the credential.
    AfterFailure,
}

/// State common to every controller: status, credential flag and the record
/// prompt of the outstanding request.
#[derive(Debug, Clone)]
pub(crate) struct WorkflowCore {
    kind: GenerationKind,
    messages: FailureMessages,
    status: WorkflowStatus,
    gate: CredentialGate,
    credential_confirmed: bool,
    in_flight: Option<String>,
}

impl WorkflowCore {
    pub(crate) fn new(
        kind: GenerationKind,
        messages: FailureMessages,
        gate: CredentialGate,
    ) -> Self {
        Self {
            kind,
            messages,
            status: WorkflowStatus::default(),
            gate,
            credential_confirmed: gate == CredentialGate::AfterFailure,
            in_flight: None,
        }
    }

    pub(crate) fn kind(&self) -> GenerationKind {
        self.kind
    }

    pub(crate) fn status(&self) -> &WorkflowStatus {
        &self.status
    }

    pub(crate) fn credential_confirmed(&self) -> bool {
        self.credential_confirmed
    }

    pub(crate) fn confirm_credential(&mut self, check: CredentialCheck) {
        self.credential_confirmed = check.is_confirmed();
    }

    pub(crate) fn form_edited(&mut self) {
        self.status.form_edited();
    }

    pub(crate) fn ensure_idle(&self) -> Result<(), SubmitSkip> {
        if self.status.is_busy() {
            return Err(SubmitSkip::Busy);
        }
        Ok(())
    }

    pub(crate) fn ensure_credential(&self) -> Result<(), SubmitSkip> {
        if !self.credential_confirmed {
            return Err(SubmitSkip::CredentialUnconfirmed);
        }
        Ok(())
    }

    pub(crate) fn start(&mut self, record_prompt: String, call: PendingCall) -> PendingRequest {
        if self.gate == CredentialGate::EverySubmit {
            self.credential_confirmed = false;
        }
        self.status.begin();
        self.in_flight = Some(record_prompt.clone());
        PendingRequest {
            kind: self.kind,
            record_prompt,
            call,
        }
    }

    /// Records the first image, or fails with the empty-result message.
    pub(crate) fn receive_result(
        &mut self,
        images: Vec<ImageResource>,
        history: &mut SessionHistory,
    ) -> SubmitOutcome {
        let Some(prompt) = self.in_flight.take() else {
            return SubmitOutcome::Skipped(SubmitSkip::NotBusy);
        };
        let Some(image) = images.into_iter().next() else {
            let error = WorkflowError::empty_result(self.messages.empty_result);
            self.status.fail(error.clone());
            return SubmitOutcome::Failed(error);
        };
        let record = history.record(self.kind, prompt, image).clone();
        self.status.succeed(record.clone());
        SubmitOutcome::Generated(record)
    }

    pub(crate) fn receive_error(&mut self, err: &anyhow::Error) -> SubmitOutcome {
        if self.in_flight.take().is_none() {
            return SubmitOutcome::Skipped(SubmitSkip::NotBusy);
        }
        let error = WorkflowError::from_failure(err, self.messages.service_failure);
        if error.is_credential_failure() {
            self.credential_confirmed = false;
        }
        self.status.fail(error.clone());
        SubmitOutcome::Failed(error)
    }

    /// Back to Idle; a request still outstanding is forgotten and its
    /// eventual result ignored.
    pub(crate) fn reset(&mut self) {
        self.status = WorkflowStatus::default();
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use anyhow::anyhow;
    use studio_contracts::history::{GenerationKind, SessionHistory};

    use super::{ProWorkflow, SubmitOutcome, SubmitSkip, Workflow, WorkflowPhase};
    use crate::test_support::{image_response, scripted_adapter};

    #[test]
    fn phases_follow_named_operations() -> anyhow::Result<()> {
        let (adapter, _script) = scripted_adapter(vec![Ok(image_response(&["cHJv"]))]);
        let mut history = SessionHistory::new();
        let mut pro = ProWorkflow::new();
        assert_eq!(pro.status().phase(), WorkflowPhase::Idle);

        pro.set_prompt("a red cube");
        assert_eq!(pro.status().phase(), WorkflowPhase::AwaitingInput);

        let outcome = pro.submit(&adapter, &mut history);
        assert!(outcome.is_generated());
        assert_eq!(pro.status().phase(), WorkflowPhase::Succeeded);
        assert_eq!(pro.status().last_record(), history.latest());

        pro.set_prompt("a blue cube");
        assert_eq!(pro.status().phase(), WorkflowPhase::AwaitingInput);
        assert!(pro.status().last_record().is_some());

        pro.reset();
        assert_eq!(pro.status().phase(), WorkflowPhase::Idle);
        assert_eq!(pro.prompt(), "");
        Ok(())
    }

    #[test]
    fn results_without_an_outstanding_request_are_ignored() {
        let mut history = SessionHistory::new();
        let mut pro = ProWorkflow::new();
        assert_eq!(
            pro.receive_error(&anyhow!("late failure")),
            SubmitOutcome::Skipped(SubmitSkip::NotBusy)
        );
        assert!(pro.status().last_error().is_none());
        assert_eq!(
            pro.receive_result(Vec::new(), &mut history),
            SubmitOutcome::Skipped(SubmitSkip::NotBusy)
        );
        assert!(history.is_empty());
    }

    #[test]
    fn reset_while_busy_drops_the_late_result() -> anyhow::Result<()> {
        let (adapter, script) = scripted_adapter(vec![Ok(image_response(&["cHJv"]))]);
        let mut history = SessionHistory::new();
        let mut pro = ProWorkflow::new();
        pro.set_prompt("a red cube");
        pro.confirm_credential(adapter.ensure_credential_selected());

        let request = pro.begin_submit().map_err(|skip| anyhow!(skip))?;
        assert_eq!(request.kind(), GenerationKind::Pro);
        pro.reset();
        let images = request.execute(&adapter)?;
        assert_eq!(
            pro.receive_result(images, &mut history),
            SubmitOutcome::Skipped(SubmitSkip::NotBusy)
        );
        assert!(history.is_empty());
        assert_eq!(script.calls.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
