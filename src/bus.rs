use std::collections::HashMap;

/// Signal names carried by the session bus.
///
/// The bus is the exception channel for messages with no ancestor route;
/// property changes go through the root dispatcher instead.
pub mod events {
    /// A live camera frame was captured; detail is a data-URI string.
    pub const CAMERA_FRAME: &str = "camera-frame";
    /// The composite upload finished; detail is the service response body.
    pub const UPLOAD_COMPLETE: &str = "upload-complete";
    /// The composite upload failed; detail is null.
    pub const UPLOAD_FAILED: &str = "upload-failed";
}

/// Untagged signal payload.
pub type Detail = serde_json::Value;

type Handler = Box<dyn FnMut(&Detail)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Session-wide broadcast channel.
///
/// Constructed once per session and passed by reference to the components
/// that need it; lives until [`EventBus::shutdown`]. `publish` delivers
/// synchronously to every subscriber of the name, in registration order.
#[derive(Default)]
pub struct EventBus {
    channels: HashMap<String, Vec<(SubscriptionId, Handler)>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        event: &str,
        handler: impl FnMut(&Detail) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.channels
            .entry(event.to_string())
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Remove a subscription. Returns false when the id is unknown (already
    /// removed, or from another bus).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for handlers in self.channels.values_mut() {
            if let Some(pos) = handlers.iter().position(|(hid, _)| *hid == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Deliver `detail` to every current subscriber of `event`, in
    /// registration order. Returns the number of handlers invoked.
    pub fn publish(&mut self, event: &str, detail: &Detail) -> usize {
        let Some(handlers) = self.channels.get_mut(event) else {
            return 0;
        };
        let mut delivered = 0;
        for (_, handler) in handlers.iter_mut() {
            handler(detail);
            delivered += 1;
        }
        delivered
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.channels.get(event).map_or(0, Vec::len)
    }

    /// End-of-session teardown: drop every subscription.
    pub fn shutdown(&mut self) {
        self.channels.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_map();
        for (name, handlers) in &self.channels {
            d.entry(name, &handlers.len());
        }
        d.finish()
    }
}
