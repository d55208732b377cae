use crate::core::protocol::Response;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Handle returned by observer registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback = Arc<dyn Fn(&Response) + Send + Sync>;

/// Broadcast channel capacity for response subscribers.
const RESPONSE_CHANNEL_CAPACITY: usize = 64;

/// Subscribers interested in every response a session reads.
///
/// Callbacks run synchronously, in registration order, on the task that read
/// the response. Channel subscribers receive the same responses afterwards.
pub struct ObserverRegistry {
    next_id: u64,
    callbacks: Vec<(ObserverId, Callback)>,
    channel: broadcast::Sender<Response>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        let (channel, _) = broadcast::channel(RESPONSE_CHANNEL_CAPACITY);
        Self {
            next_id: 0,
            callbacks: Vec::new(),
            channel,
        }
    }

    pub fn register<F>(&mut self, callback: F) -> ObserverId
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Arc::new(callback)));
        id
    }

    /// Returns false if the observer was not registered.
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Response> {
        self.channel.subscribe()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn notify(&self, response: &Response) {
        for (_, callback) in &self.callbacks {
            callback(response);
        }
        // No receivers is fine
        if self.channel.send(response.clone()).is_err() {
            debug!("No channel subscribers for response");
        }
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::ResponseKind;
    use std::sync::Mutex;

    #[test]
    fn test_notify_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ObserverRegistry::new();

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            registry.register(move |response: &Response| {
                seen.lock().unwrap().push(format!("{}:{}", tag, response.text()));
            });
        }

        registry.notify(&Response::new(ResponseKind::Reply, b"ok"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:ok", "second:ok", "third:ok"]
        );
    }

    #[test]
    fn test_unregister() {
        let mut registry = ObserverRegistry::new();
        let id = registry.register(|_| {});
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_channel_subscribers_receive_responses() {
        let registry = ObserverRegistry::new();
        let mut rx = registry.subscribe();

        registry.notify(&Response::terminated());

        let response = rx.recv().await.unwrap();
        assert!(response.is_terminated());
    }
}
