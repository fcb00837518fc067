//! Branch manager configuration.

/// Which caller bindings a terminal operation clears.
///
/// `commit`, `rollback` and `forget` always clear the calling session's slot.
/// A branch can however be finished by a different session than the one that
/// started it, for example by a recovery session after a restart of the
/// transaction manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnbindPolicy {
    /// Clear only the calling session's slot.
    #[default]
    Caller,

    /// Also clear every other session still bound to the finished branch.
    AllSessions,
}

/// Configuration for an [`XaResource`](crate::XaResource).
#[derive(Debug, Clone)]
pub struct XaConfig {
    /// Name of the resource manager, recorded in log events.
    pub name: String,

    /// Bindings cleared by terminal operations.
    pub unbind_policy: UnbindPolicy,
}

impl Default for XaConfig {
    fn default() -> Self {
        Self { name: "xabranch".to_string(), unbind_policy: UnbindPolicy::Caller }
    }
}

impl XaConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource manager name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the unbind policy.
    #[must_use]
    pub const fn unbind_policy(mut self, policy: UnbindPolicy) -> Self {
        self.unbind_policy = policy;
        self
    }
}
