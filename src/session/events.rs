//! Typed session event broadcast, replacing a string-typed emitter.

use tokio::sync::broadcast;

use crate::executor::ExecutionResult;
use crate::session::Session;

/// One event per session lifecycle transition. Subscribers can rely on
/// exactly one terminal variant per session id per successful
/// `start_session` call.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Created(Session),
    Started(Session),
    Completed(Session, ExecutionResult),
    Failed(Session, String),
    Cancelled(Session),
}

impl SessionEvent {
    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::Created(s)
            | SessionEvent::Started(s)
            | SessionEvent::Completed(s, _)
            | SessionEvent::Failed(s, _)
            | SessionEvent::Cancelled(s) => &s.id,
        }
    }
}

/// Broadcast channel wrapper. Cloning shares the same underlying bus.
#[derive(Clone)]
pub struct SessionEventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Best-effort publish: no subscribers is not an error.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SecurityContext, SessionMetadata, SessionStatus, TriggerEventType};

    fn sample_session() -> Session {
        let now = chrono::Utc::now();
        Session {
            id: "s1".to_string(),
            issue_id: "i1".to_string(),
            issue_identifier: "ENG-1".to_string(),
            status: SessionStatus::Created,
            branch_name: None,
            working_dir: ".".to_string(),
            started_at: now,
            last_activity_at: now,
            completed_at: None,
            process_id: None,
            error: None,
            metadata: SessionMetadata {
                creator_id: "u1".to_string(),
                tenant_id: "t1".to_string(),
                trigger_comment_id: None,
                issue_title: "Title".to_string(),
                trigger_event_type: TriggerEventType::Issue,
                extra: Default::default(),
            },
            security_context: SecurityContext::default(),
        }
    }

    #[tokio::test]
    async fn test_publish_subscribe_roundtrip() {
        let bus = SessionEventBus::new(16);
        let mut rx = bus.subscribe();
        bus.publish(SessionEvent::Created(sample_session()));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.session_id(), "s1");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_panic() {
        let bus = SessionEventBus::new(16);
        bus.publish(SessionEvent::Created(sample_session()));
    }
}
