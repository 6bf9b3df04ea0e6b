use std::fmt;

/// Registry credentials passed through to the scanner.
///
/// Both fields empty means "no credentials": the scanner then falls back to
/// its own auth resolution (anonymous pull or ambient docker config).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistryAuth {
    pub username: String,
    pub password: String,
}

impl RegistryAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// True only when both username and password are non-empty.
    pub fn is_present(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

// Keep the password out of logs.
impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
