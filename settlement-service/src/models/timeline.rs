//! Purchase timeline events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventType {
    PaymentRecorded,
    PaymentVoided,
    ReturnApproved,
    RefundCompleted,
    RefundFailed,
    BalanceResolved,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub event_type: TimelineEventType,
    pub occurred_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TimelineEvent {
    pub fn new(event_type: TimelineEventType, occurred_utc: DateTime<Utc>) -> Self {
        Self {
            event_type,
            occurred_utc,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Whether an operator already marked the balance as resolved.
pub fn has_balance_resolved(events: &[TimelineEvent]) -> bool {
    events
        .iter()
        .any(|e| e.event_type == TimelineEventType::BalanceResolved)
}
