use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde_json::{json, Value};
use studio_contracts::events::EventWriter;
use studio_contracts::history::{save_history, SessionHistory};
use studio_contracts::images::ImageResource;

use crate::adapter::GenerationAdapter;
use crate::router::{ModeRouter, StudioMode};
use crate::workflows::{
    EditWorkflow, MockupWorkflow, ProWorkflow, SubmitOutcome, SubmitSkip, Workflow,
};

/// One user session: the adapter, the three workflows, the router between
/// them and the shared history. Every transition is mirrored to the event
/// log when one is attached.
///
/// Methods returning `Result` only fail on event-log I/O; the studio state is
/// fully updated before such an error is returned.
pub struct Studio {
    adapter: GenerationAdapter,
    router: ModeRouter,
    mockup: MockupWorkflow,
    edit: EditWorkflow,
    pro: ProWorkflow,
    history: SessionHistory,
    events: Option<EventWriter>,
}

impl Studio {
    pub fn new(adapter: GenerationAdapter) -> Self {
        Self {
            adapter,
            router: ModeRouter::new(),
            mockup: MockupWorkflow::new(),
            edit: EditWorkflow::new(),
            pro: ProWorkflow::new(),
            history: SessionHistory::new(),
            events: None,
        }
    }

    /// Attaches the event log and records `session_started`.
    pub fn with_event_log(mut self, events: EventWriter) -> Result<Self> {
        let models = self.adapter.models();
        events.emit_value(
            "session_started",
            json!({
                "mode": self.router.mode().as_str(),
                "models": {
                    "mockup": models.mockup.name,
                    "edit": models.edit.name,
                    "pro": models.pro.name,
                },
            }),
        )?;
        self.events = Some(events);
        Ok(self)
    }

    pub fn mode(&self) -> StudioMode {
        self.router.mode()
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn mockup(&self) -> &MockupWorkflow {
        &self.mockup
    }

    pub fn mockup_mut(&mut self) -> &mut MockupWorkflow {
        &mut self.mockup
    }

    pub fn edit(&self) -> &EditWorkflow {
        &self.edit
    }

    pub fn edit_mut(&mut self) -> &mut EditWorkflow {
        &mut self.edit
    }

    pub fn pro(&self) -> &ProWorkflow {
        &self.pro
    }

    pub fn pro_mut(&mut self) -> &mut ProWorkflow {
        &mut self.pro
    }

    pub fn workflow(&self, mode: StudioMode) -> &dyn Workflow {
        match mode {
            StudioMode::Mockup => &self.mockup,
            StudioMode::Edit => &self.edit,
            StudioMode::Pro => &self.pro,
        }
    }

    pub fn workflow_mut(&mut self, mode: StudioMode) -> &mut dyn Workflow {
        match mode {
            StudioMode::Mockup => &mut self.mockup,
            StudioMode::Edit => &mut self.edit,
            StudioMode::Pro => &mut self.pro,
        }
    }

    pub fn switch_to(&mut self, mode: StudioMode) -> Result<()> {
        let previous = self.router.mode();
        if self.router.switch_to(mode) {
            log_event(
                self.events.as_ref(),
                "mode_changed",
                json!({"mode": mode.as_str(), "previous": previous.as_str()}),
            )?;
        }
        self.sync_seed()
    }

    /// Hands `image` to the edit workflow and shows it.
    pub fn edit_existing_image(&mut self, image: ImageResource) -> Result<()> {
        self.hand_off(image, None)
    }

    /// Hands an earlier history entry to the edit workflow.
    pub fn edit_record(&mut self, id: &str) -> Result<()> {
        let Some(record) = self.history.get(id) else {
            bail!("no history record with id '{id}'");
        };
        let image = record.image().clone();
        self.hand_off(image, Some(id.to_string()))
    }

    pub fn submit_current(&mut self) -> Result<SubmitOutcome> {
        match self.router.mode() {
            StudioMode::Mockup => self.submit_mockup(),
            StudioMode::Edit => self.submit_edit(),
            StudioMode::Pro => self.submit_pro(),
        }
    }

    pub fn submit_mockup(&mut self) -> Result<SubmitOutcome> {
        drive(
            &mut self.mockup,
            &self.adapter,
            &mut self.history,
            self.events.as_ref(),
        )
    }

    pub fn submit_edit(&mut self) -> Result<SubmitOutcome> {
        let outcome = drive(
            &mut self.edit,
            &self.adapter,
            &mut self.history,
            self.events.as_ref(),
        );
        // A handoff that arrived while the request was outstanding.
        let synced = self.sync_seed();
        outcome.and_then(|outcome| synced.map(|()| outcome))
    }

    pub fn submit_pro(&mut self) -> Result<SubmitOutcome> {
        drive(
            &mut self.pro,
            &self.adapter,
            &mut self.history,
            self.events.as_ref(),
        )
    }

    /// Writes every history image plus the manifest into `dir`.
    pub fn save_history(&self, dir: &Path) -> Result<PathBuf> {
        let manifest = save_history(&self.history, dir)?;
        log_event(
            self.events.as_ref(),
            "history_saved",
            json!({"path": manifest.display().to_string(), "count": self.history.len()}),
        )?;
        Ok(manifest)
    }

    fn hand_off(&mut self, image: ImageResource, record_id: Option<String>) -> Result<()> {
        let previous = self.router.mode();
        let token = self.router.edit_existing_image(image).token();
        let logged = log_event(
            self.events.as_ref(),
            "seed_handoff",
            json!({"token": token, "record_id": record_id, "previous": previous.as_str()}),
        );
        let synced = self.sync_seed();
        logged.and(synced)
    }

    fn sync_seed(&mut self) -> Result<()> {
        if self.router.mode() != StudioMode::Edit {
            return Ok(());
        }
        let Some(seed) = self.router.seed() else {
            return Ok(());
        };
        if self.edit.adopt_seed(seed) {
            log_event(
                self.events.as_ref(),
                "seed_adopted",
                json!({"token": seed.token(), "mime_type": seed.image().mime_type()}),
            )?;
        }
        Ok(())
    }
}

/// Runs one submit of `workflow`, logging each step. Log failures are held
/// back until the cycle finishes so the workflow never stays busy.
fn drive(
    workflow: &mut dyn Workflow,
    adapter: &GenerationAdapter,
    history: &mut SessionHistory,
    events: Option<&EventWriter>,
) -> Result<SubmitOutcome> {
    let kind = workflow.kind().as_str();
    let mut log = DeferredLog::new(events);

    let request = match workflow.begin_submit() {
        Ok(request) => request,
        Err(SubmitSkip::CredentialUnconfirmed) => {
            let check = adapter.ensure_credential_selected();
            log.emit(
                "credential_check",
                json!({"kind": kind, "result": check.as_str(), "confirmed": check.is_confirmed()}),
            );
            workflow.confirm_credential(check);
            match workflow.begin_submit() {
                Ok(request) => request,
                Err(skip) => {
                    let outcome = skipped(kind, skip, &mut log);
                    return log.finish(outcome);
                }
            }
        }
        Err(skip) => {
            let outcome = skipped(kind, skip, &mut log);
            return log.finish(outcome);
        }
    };

    let model = adapter.models().for_kind(workflow.kind());
    log.emit(
        "generation_started",
        json!({"kind": kind, "model": model.name, "prompt": request.record_prompt()}),
    );
    let outcome = match request.execute(adapter) {
        Ok(images) => {
            let count = images.len();
            let outcome = workflow.receive_result(images, history);
            if let SubmitOutcome::Generated(record) = &outcome {
                log.emit(
                    "generation_succeeded",
                    json!({
                        "kind": kind,
                        "record_id": record.id(),
                        "prompt": record.prompt(),
                        "mime_type": record.image().mime_type(),
                        "images_returned": count,
                        "history_len": history.len(),
                    }),
                );
            }
            outcome
        }
        Err(err) => workflow.receive_error(&err),
    };
    if let SubmitOutcome::Failed(error) = &outcome {
        log.emit(
            "generation_failed",
            json!({
                "kind": kind,
                "error_kind": error.kind().as_str(),
                "message": error.message(),
                "detail": error.detail(),
            }),
        );
    }
    log.finish(outcome)
}

fn skipped(kind: &str, skip: SubmitSkip, log: &mut DeferredLog<'_>) -> SubmitOutcome {
    log.emit(
        "generation_skipped",
        json!({"kind": kind, "reason": skip.as_str(), "message": skip.message()}),
    );
    SubmitOutcome::Skipped(skip)
}

/// Event log wrapper that remembers the first write failure instead of
/// returning it immediately.
struct DeferredLog<'a> {
    events: Option<&'a EventWriter>,
    error: Option<anyhow::Error>,
}

impl<'a> DeferredLog<'a> {
    fn new(events: Option<&'a EventWriter>) -> Self {
        Self { events, error: None }
    }

    fn emit(&mut self, event_type: &str, payload: Value) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = log_event(self.events, event_type, payload) {
            self.error = Some(err);
        }
    }

    fn finish(self, outcome: SubmitOutcome) -> Result<SubmitOutcome> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(outcome),
        }
    }
}

fn log_event(events: Option<&EventWriter>, event_type: &str, payload: Value) -> Result<()> {
    if let Some(events) = events {
        events.emit_value(event_type, payload)?;
    }
    Ok(())
}
