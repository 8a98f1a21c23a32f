//! Progress events streamed to clients.
//!
//! Events serialize with an internal `type` tag in snake_case so that the
//! SSE layer can use the same name for the `event:` field.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assistant::IntentKind;
use crate::types::{
    candidate::Candidate,
    company::EnrichedCompany,
    run::RunSummary,
};

/// Anything that can travel through an [`EventSink`](crate::publisher::EventSink).
pub trait StreamEvent: Serialize + Send + Sync + 'static {
    /// Terminal events close the stream and are never dropped.
    fn is_terminal(&self) -> bool;

    /// Stable snake_case name of the event kind.
    fn name(&self) -> &'static str;
}

/// Lifecycle of one Discovery → Deep-Dive run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    DiscoveryStarted {
        run_id: Uuid,
        query: String,
    },
    DiscoveryCompleted {
        run_id: Uuid,
        candidates: Vec<Candidate>,
    },
    EnrichmentCompleted {
        run_id: Uuid,
        company: EnrichedCompany,
    },
    EnrichmentFailed {
        run_id: Uuid,
        candidate: Candidate,
        error: String,
    },
    RunCompleted(RunSummary),
    RunFailed {
        run_id: Uuid,
        code: String,
        error: String,
    },
}

impl StreamEvent for ProgressEvent {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::RunCompleted(_) | Self::RunFailed { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::DiscoveryStarted { .. } => "discovery_started",
            Self::DiscoveryCompleted { .. } => "discovery_completed",
            Self::EnrichmentCompleted { .. } => "enrichment_completed",
            Self::EnrichmentFailed { .. } => "enrichment_failed",
            Self::RunCompleted(_) => "run_completed",
            Self::RunFailed { .. } => "run_failed",
        }
    }
}

/// Events of a chat turn. Pipeline progress is nested, not terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Status {
        message: String,
    },
    Progress {
        event: ProgressEvent,
    },
    Complete {
        intent: IntentKind,
        response: String,
        companies: Vec<EnrichedCompany>,
    },
    Error {
        message: String,
    },
}

impl ChatEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }
}

impl From<ProgressEvent> for ChatEvent {
    fn from(event: ProgressEvent) -> Self {
        Self::Progress { event }
    }
}

impl StreamEvent for ChatEvent {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Progress { event } => event.name(),
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_matches_name() {
        let event = ProgressEvent::EnrichmentFailed {
            run_id: Uuid::nil(),
            candidate: Candidate::new("Acme", "https://acme.com", "DE"),
            error: "timeout".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.name());
        assert_eq!(json["candidate"]["name"], "Acme");
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_nested_progress_is_not_terminal_in_chat() {
        let failed = ProgressEvent::RunFailed {
            run_id: Uuid::nil(),
            code: "search_unavailable".into(),
            error: "down".into(),
        };
        assert!(failed.is_terminal());

        let chat: ChatEvent = failed.into();
        assert!(!chat.is_terminal());
        assert_eq!(chat.name(), "run_failed");
    }
}
