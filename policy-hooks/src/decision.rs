//! Decisions returned by before-deploy hooks.

use serde::{Deserialize, Serialize};

/// Whether a deploy may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookVerdict {
    /// The deploy may continue.
    Continue,
    /// The deploy must stop before touching the store.
    Reject,
}

/// Structured decision emitted by a hook or by the bus on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookDecision {
    verdict: HookVerdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hook: Option<String>,
}

impl HookDecision {
    /// Returns a decision letting the deploy continue.
    #[must_use]
    pub fn proceed() -> Self {
        Self {
            verdict: HookVerdict::Continue,
            reason: None,
            hook: None,
        }
    }

    /// Returns a rejection with an explanatory reason.
    #[must_use]
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            verdict: HookVerdict::Reject,
            reason: Some(reason.into()),
            hook: None,
        }
    }

    /// Attributes the decision to the named hook.
    #[must_use]
    pub fn attributed_to(mut self, hook: impl Into<String>) -> Self {
        self.hook = Some(hook.into());
        self
    }

    /// Returns the verdict.
    #[must_use]
    pub fn verdict(&self) -> HookVerdict {
        self.verdict
    }

    /// Returns true when the deploy may continue.
    #[must_use]
    pub fn is_continue(&self) -> bool {
        self.verdict == HookVerdict::Continue
    }

    /// Returns true when the deploy was vetoed.
    #[must_use]
    pub fn is_reject(&self) -> bool {
        self.verdict == HookVerdict::Reject
    }

    /// Returns the optional reason.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the name of the hook that produced the decision, if known.
    #[must_use]
    pub fn hook(&self) -> Option<&str> {
        self.hook.as_deref()
    }
}

impl Default for HookDecision {
    fn default() -> Self {
        Self::proceed()
    }
}
