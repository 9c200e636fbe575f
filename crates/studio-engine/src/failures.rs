use std::fmt;

/// Error text the service returns when the selected key or project cannot be
/// resolved. Matching on it is the only credential signal available.
const CREDENTIAL_NOT_FOUND_MARKER: &str = "Requested entity was not found";

pub const CREDENTIAL_FAILURE_MESSAGE: &str =
    "API Key Error: Please re-select your project API key.";

/// Raised before any request when none of the listed key variables is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingApiKey(pub &'static [&'static str]);

impl fmt::Display for MissingApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not set", self.0.join(" or "))
    }
}

impl std::error::Error for MissingApiKey {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Credential,
    Service,
}

/// Single place that decides whether a failed call was a credential problem:
/// either no key was available or the service could not resolve it.
pub fn classify_failure(err: &anyhow::Error) -> FailureClass {
    let credential = err.chain().any(|cause| {
        cause.is::<MissingApiKey>() || cause.to_string().contains(CREDENTIAL_NOT_FOUND_MARKER)
    });
    if credential {
        FailureClass::Credential
    } else {
        FailureClass::Service
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkflowErrorKind {
    EmptyResult,
    ServiceFailure,
    CredentialFailure,
}

impl WorkflowErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowErrorKind::EmptyResult => "empty_result",
            WorkflowErrorKind::ServiceFailure => "service_failure",
            WorkflowErrorKind::CredentialFailure => "credential_failure",
        }
    }
}

/// What a workflow shows after a failed submit: a user-facing message plus,
/// for raised errors, the rendered error chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowError {
    kind: WorkflowErrorKind,
    message: String,
    detail: Option<String>,
}

impl WorkflowError {
    pub fn empty_result(message: impl Into<String>) -> Self {
        Self {
            kind: WorkflowErrorKind::EmptyResult,
            message: message.into(),
            detail: None,
        }
    }

    /// Converts a raised adapter error, using `service_message` unless the
    /// error classifies as a credential failure.
    pub fn from_failure(err: &anyhow::Error, service_message: &str) -> Self {
        let detail = Some(error_chain_text(err, 600));
        match classify_failure(err) {
            FailureClass::Credential => Self {
                kind: WorkflowErrorKind::CredentialFailure,
                message: CREDENTIAL_FAILURE_MESSAGE.to_string(),
                detail,
            },
            FailureClass::Service => Self {
                kind: WorkflowErrorKind::ServiceFailure,
                message: service_message.to_string(),
                detail,
            },
        }
    }

    pub fn kind(&self) -> WorkflowErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_credential_failure(&self) -> bool {
        self.kind == WorkflowErrorKind::CredentialFailure
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

pub fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::{
        classify_failure, error_chain_text, truncate_text, FailureClass, MissingApiKey,
        WorkflowError, WorkflowErrorKind, CREDENTIAL_FAILURE_MESSAGE,
    };

    #[test]
    fn nested_entity_not_found_is_a_credential_failure() {
        let err = anyhow!("Requested entity was not found.").context("Gemini request failed (404)");
        assert_eq!(classify_failure(&err), FailureClass::Credential);

        let error = WorkflowError::from_failure(&err, "generic");
        assert_eq!(error.kind(), WorkflowErrorKind::CredentialFailure);
        assert_eq!(error.message(), CREDENTIAL_FAILURE_MESSAGE);
        assert!(error
            .detail()
            .unwrap_or_default()
            .contains("Requested entity was not found"));
    }

    #[test]
    fn missing_key_is_a_credential_failure_even_with_context() {
        let err = anyhow::Error::new(MissingApiKey(&["GEMINI_API_KEY", "API_KEY"]))
            .context("pro generation");
        assert_eq!(classify_failure(&err), FailureClass::Credential);

        let error = WorkflowError::from_failure(&err, "Failed to generate image. Check billing.");
        assert!(error.is_credential_failure());
        assert_eq!(error.message(), CREDENTIAL_FAILURE_MESSAGE);
        assert!(error
            .detail()
            .unwrap_or_default()
            .contains("GEMINI_API_KEY or API_KEY not set"));
    }

    #[test]
    fn other_failures_use_the_workflow_message() {
        let err = anyhow!("connection refused").context("Gemini request failed");
        assert_eq!(classify_failure(&err), FailureClass::Service);

        let error = WorkflowError::from_failure(&err, "Failed to edit image.");
        assert_eq!(error.kind(), WorkflowErrorKind::ServiceFailure);
        assert_eq!(error.to_string(), "Failed to edit image.");
        assert!(!error.is_credential_failure());
    }

    #[test]
    fn error_chain_text_preserves_nested_contexts() {
        let err = anyhow!("socket closed").context("Gemini request failed (https://example.test)");
        let rendered = error_chain_text(&err, 512);
        assert_eq!(
            rendered,
            "Gemini request failed (https://example.test) | caused by: socket closed"
        );
    }

    #[test]
    fn truncate_text_counts_chars() {
        assert_eq!(truncate_text("abcdef", 3), "abc…");
        assert_eq!(truncate_text("äö", 2), "äö");
    }
}
