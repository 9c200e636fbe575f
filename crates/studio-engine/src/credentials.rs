/// Host capability for choosing which credential the service calls use.
///
/// Front ends without such a mechanism use [`NoCredentialHost`], which always
/// reports a credential as selected.
pub trait CredentialHost: Send + Sync {
    /// `false` only for hosts without any selection mechanism.
    fn is_available(&self) -> bool {
        true
    }

    fn has_selected_credential(&self) -> bool;

    /// Shows the host's selection prompt and returns once it is dismissed.
    /// Whether the user actually picked something is not reported.
    fn open_credential_selection(&self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentialHost;

impl CredentialHost for NoCredentialHost {
    fn is_available(&self) -> bool {
        false
    }

    fn has_selected_credential(&self) -> bool {
        true
    }

    fn open_credential_selection(&self) {}
}

/// How [`ensure_credential_selected`] reached its (always optimistic) verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    NoHost,
    AlreadySelected,
    /// The prompt was shown and dismissed; the selection was not re-verified.
    PromptDismissed,
}

impl CredentialCheck {
    pub fn is_confirmed(self) -> bool {
        true
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CredentialCheck::NoHost => "no_host",
            CredentialCheck::AlreadySelected => "already_selected",
            CredentialCheck::PromptDismissed => "prompt_dismissed",
        }
    }
}

/// Best-effort check: prompts when the host reports no credential, then
/// assumes success.
pub fn ensure_credential_selected(host: &dyn CredentialHost) -> CredentialCheck {
    if !host.is_available() {
        return CredentialCheck::NoHost;
    }
    if host.has_selected_credential() {
        return CredentialCheck::AlreadySelected;
    }
    host.open_credential_selection();
    CredentialCheck::PromptDismissed
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::{ensure_credential_selected, CredentialCheck, CredentialHost, NoCredentialHost};

    #[derive(Default)]
    struct PromptingHost {
        selected: AtomicBool,
        prompts: AtomicUsize,
    }

    impl CredentialHost for PromptingHost {
        fn has_selected_credential(&self) -> bool {
            self.selected.load(Ordering::SeqCst)
        }

        fn open_credential_selection(&self) {
            self.prompts.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn null_host_is_optimistic() {
        let check = ensure_credential_selected(&NoCredentialHost);
        assert_eq!(check, CredentialCheck::NoHost);
        assert!(check.is_confirmed());
    }

    #[test]
    fn unselected_host_is_prompted_and_not_reverified() {
        let host = PromptingHost::default();
        let check = ensure_credential_selected(&host);
        assert_eq!(check, CredentialCheck::PromptDismissed);
        assert!(check.is_confirmed());
        assert_eq!(host.prompts.load(Ordering::SeqCst), 1);
        assert!(!host.has_selected_credential());
    }

    #[test]
    fn selected_host_skips_the_prompt() {
        let host = PromptingHost::default();
        host.selected.store(true, Ordering::SeqCst);
        assert_eq!(
            ensure_credential_selected(&host),
            CredentialCheck::AlreadySelected
        );
        assert_eq!(host.prompts.load(Ordering::SeqCst), 0);
    }
}
