use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The interactivity approach a sample was measured against.
///
/// Variants are declared in canonical order; [`Implementation::ALL`] follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Implementation {
    /// WebSocket live view pushing rendered fragments.
    RealtimePush,
    /// Classic full page reload after a form POST.
    ServerRendered,
    /// AJAX request swapping a partial HTML fragment.
    PartialUpdate,
    /// Reactive server-side component synced over AJAX.
    ReactiveComponent,
    /// Component-based WebSocket push with broadcast to all viewers.
    BroadcastPush,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown implementation label '{0}' (expected one of: realtime-push, server-rendered, partial-update, reactive-component, broadcast-push)")]
pub struct ParseImplementationError(String);

impl Implementation {
    pub const ALL: [Implementation; 5] = [
        Implementation::RealtimePush,
        Implementation::ServerRendered,
        Implementation::PartialUpdate,
        Implementation::ReactiveComponent,
        Implementation::BroadcastPush,
    ];

    /// Canonical label as stored in the table.
    pub fn label(&self) -> &'static str {
        match self {
            Implementation::RealtimePush => "realtime-push",
            Implementation::ServerRendered => "server-rendered",
            Implementation::PartialUpdate => "partial-update",
            Implementation::ReactiveComponent => "reactive-component",
            Implementation::BroadcastPush => "broadcast-push",
        }
    }

    /// Transport the approach uses for the create action.
    pub fn transport(&self) -> &'static str {
        match self {
            Implementation::RealtimePush | Implementation::BroadcastPush => "websocket",
            Implementation::ServerRendered => "full page reload",
            Implementation::PartialUpdate | Implementation::ReactiveComponent => "ajax",
        }
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Implementation {
    type Err = ParseImplementationError;

    /// Accepts canonical labels plus the names capture tools commonly emit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "realtime-push" | "liveview" | "live-view" => Ok(Implementation::RealtimePush),
            "server-rendered" | "ssr" => Ok(Implementation::ServerRendered),
            "partial-update" | "htmx" | "django-htmx" => Ok(Implementation::PartialUpdate),
            "reactive-component" | "unicorn" | "django-unicorn" => {
                Ok(Implementation::ReactiveComponent)
            }
            "broadcast-push" | "reactor" | "django-reactor" => Ok(Implementation::BroadcastPush),
            _ => Err(ParseImplementationError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Implementation {
    type Error = ParseImplementationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Implementation> for String {
    fn from(value: Implementation) -> Self {
        value.label().to_string()
    }
}

/// One measured trial of the create-alert action.
///
/// Field order matches the table's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub implementation: Implementation,
    /// 1-based trial number, unique within an implementation.
    pub trial_index: u32,
    pub response_time_ms: f64,
    pub request_count: u64,
    pub bytes_transferred: u64,
}

impl Sample {
    pub fn new(
        implementation: Implementation,
        trial_index: u32,
        response_time_ms: f64,
        request_count: u64,
        bytes_transferred: u64,
    ) -> Self {
        Self {
            implementation,
            trial_index,
            response_time_ms,
            request_count,
            bytes_transferred,
        }
    }

    /// Check the invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.trial_index == 0 {
            return Err(format!(
                "{}: trial_index must start at 1",
                self.implementation
            ));
        }
        if !self.response_time_ms.is_finite() || self.response_time_ms < 0.0 {
            return Err(format!(
                "{} trial {}: response_time_ms must be a non-negative number, got {}",
                self.implementation, self.trial_index, self.response_time_ms
            ));
        }
        Ok(())
    }

    pub fn key(&self) -> (Implementation, u32) {
        (self.implementation, self.trial_index)
    }
}
