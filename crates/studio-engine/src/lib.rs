pub mod adapter;
pub mod credentials;
pub mod dryrun;
pub mod extract;
pub mod failures;
pub mod gemini;
pub mod router;
pub mod service;
pub mod studio;
pub mod uploads;
pub mod workflows;

#[cfg(test)]
mod test_support;

pub use adapter::{default_mockup_prompt, AdapterModels, GenerationAdapter};
pub use credentials::{
    ensure_credential_selected, CredentialCheck, CredentialHost, NoCredentialHost,
};
pub use failures::{WorkflowError, WorkflowErrorKind, CREDENTIAL_FAILURE_MESSAGE};
pub use router::{ModeRouter, SeedImage, StudioMode};
pub use studio::Studio;
pub use uploads::load_image_file;
pub use workflows::{SubmitOutcome, SubmitSkip, Workflow, WorkflowPhase};
