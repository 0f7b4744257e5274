use crate::models::NotificationEvent;
use crate::services::registry::{ConnectionRegistry, Frame, SendOutcome};
use std::sync::Arc;

/// Counts from one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    /// Channels whose queue was full
    pub dropped: usize,
    /// Dead channels removed from the registry during this publish
    pub purged: usize,
}

impl DeliveryReport {
    /// True when nobody received the event
    pub fn is_dropped(&self) -> bool {
        self.delivered == 0
    }
}

/// Best-effort fan-out of events to a recipient's open channels
///
/// Never blocks and never fails: events for users with no open channel are
/// discarded, a full channel loses this event without affecting others.
#[derive(Clone)]
pub struct NotificationDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn publish(&self, user_id: &str, event: &NotificationEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        let handles = self.registry.channels_for(user_id);
        if handles.is_empty() {
            tracing::debug!("Delivery dropped: no open channel for {} ({})", user_id, event.kind.as_str());
            return report;
        }

        let frame: Frame = match serde_json::to_string(event) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                tracing::error!("Failed to serialize {} event for {}: {}", event.kind.as_str(), user_id, e);
                return report;
            }
        };

        for handle in handles {
            match self.registry.try_send(user_id, handle, &frame) {
                SendOutcome::Delivered => report.delivered += 1,
                SendOutcome::Full => {
                    tracing::warn!("Channel {:?} for {} is full, dropping event", handle, user_id);
                    report.dropped += 1;
                }
                SendOutcome::Closed => {
                    if self.registry.unsubscribe(user_id, handle) {
                        report.purged += 1;
                    }
                }
                // Unsubscribed between listing and sending
                SendOutcome::Missing => {}
            }
        }

        tracing::debug!(
            "Published {} event to {}: delivered={}, dropped={}, purged={}",
            event.kind.as_str(),
            user_id,
            report.delivered,
            report.dropped,
            report.purged
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BriefProfile, NotificationKind};

    #[tokio::test]
    async fn test_fan_out_to_every_channel() {
        let registry = Arc::new(ConnectionRegistry::new(4, 8));
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));
        let mut tab1 = registry.subscribe("bob");
        let mut tab2 = registry.subscribe("bob");

        let event = NotificationEvent::like("bob", BriefProfile::id_only("alice"));
        let report = dispatcher.publish("bob", &event);
        assert_eq!(report.delivered, 2);

        for sub in [&mut tab1, &mut tab2] {
            let frame = sub.recv().await.unwrap();
            let parsed: NotificationEvent = serde_json::from_str(&frame).unwrap();
            assert_eq!(parsed.kind, NotificationKind::Like);
            assert_eq!(parsed.payload.id, "alice");
        }
    }

    #[test]
    fn test_no_channel_is_silently_dropped() {
        let registry = Arc::new(ConnectionRegistry::new(4, 8));
        let dispatcher = NotificationDispatcher::new(registry);

        let report = dispatcher.publish("nobody", &NotificationEvent::like("nobody", BriefProfile::id_only("x")));
        assert!(report.is_dropped());
        assert_eq!(report, DeliveryReport::default());
    }

    #[tokio::test]
    async fn test_full_channel_does_not_block_others() {
        let registry = Arc::new(ConnectionRegistry::new(1, 8));
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));
        let _stalled = registry.subscribe("bob");
        let mut live = registry.subscribe("bob");
        let event = NotificationEvent::like("bob", BriefProfile::id_only("alice"));

        assert_eq!(dispatcher.publish("bob", &event).delivered, 2);
        // `live` drains, `_stalled` does not
        live.recv().await.unwrap();

        let report = dispatcher.publish("bob", &event);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 1);
    }
}
