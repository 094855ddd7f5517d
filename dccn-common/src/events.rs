//! Event types for the DCCN event system
//!
//! Record changes that used to be handled by save hooks (status changes,
//! reviewer assignment, decision commits) are published on an [`EventBus`].
//! Listeners such as the notification composer and the SSE stream subscribe
//! independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::{DecisionKind, SubmissionStatus};

/// DCCN event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DccnEvent {
    /// Submission status changed
    ///
    /// Triggers:
    /// - Notifications: render the system message for the new status
    /// - SSE: refresh dashboards
    SubmissionStatusChanged {
        conference_id: i64,
        submission_id: i64,
        old_status: SubmissionStatus,
        new_status: SubmissionStatus,
        timestamp: DateTime<Utc>,
    },

    /// Reviewer assigned to a submission
    ReviewAssigned {
        conference_id: i64,
        submission_id: i64,
        review_id: i64,
        /// User id of the reviewer
        user_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// Review removed from a submission
    ReviewCancelled {
        conference_id: i64,
        submission_id: i64,
        review_id: i64,
        user_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// Reviewer submitted a completed review
    ReviewSubmitted {
        conference_id: i64,
        submission_id: i64,
        review_id: i64,
        timestamp: DateTime<Utc>,
    },

    /// Decision applied to the submission
    DecisionCommitted {
        conference_id: i64,
        submission_id: i64,
        /// None when the decision type was cleared
        decision: Option<DecisionKind>,
        timestamp: DateTime<Utc>,
    },
}

impl DccnEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            DccnEvent::SubmissionStatusChanged { .. } => "SubmissionStatusChanged",
            DccnEvent::ReviewAssigned { .. } => "ReviewAssigned",
            DccnEvent::ReviewCancelled { .. } => "ReviewCancelled",
            DccnEvent::ReviewSubmitted { .. } => "ReviewSubmitted",
            DccnEvent::DecisionCommitted { .. } => "DecisionCommitted",
        }
    }

    pub fn conference_id(&self) -> i64 {
        match self {
            DccnEvent::SubmissionStatusChanged { conference_id, .. }
            | DccnEvent::ReviewAssigned { conference_id, .. }
            | DccnEvent::ReviewCancelled { conference_id, .. }
            | DccnEvent::ReviewSubmitted { conference_id, .. }
            | DccnEvent::DecisionCommitted { conference_id, .. } => *conference_id,
        }
    }
}

/// Central event distribution for one service process
///
/// Thin wrapper over a `tokio::sync::broadcast` channel. Slow subscribers
/// lose the oldest events once `capacity` is exceeded.
pub struct EventBus {
    tx: broadcast::Sender<DccnEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use dccn_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DccnEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: DccnEvent,
    ) -> Result<usize, broadcast::error::SendError<DccnEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DccnEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event dropped: no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_changed() -> DccnEvent {
        DccnEvent::SubmissionStatusChanged {
            conference_id: 1,
            submission_id: 42,
            old_status: SubmissionStatus::Submitted,
            new_status: SubmissionStatus::UnderReview,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(status_changed()).unwrap();
        assert_eq!(json["type"], "SubmissionStatusChanged");
        assert_eq!(json["new_status"], "REVIEW");
        assert_eq!(json["submission_id"], 42);
    }

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(status_changed()).is_err());
        bus.emit_lossy(status_changed());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.emit(status_changed()).unwrap(), 1);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "SubmissionStatusChanged");
        assert_eq!(event.conference_id(), 1);
    }
}
