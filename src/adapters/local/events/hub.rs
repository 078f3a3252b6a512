use super::AssetEvent;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<AssetEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Fails when nobody is subscribed.
    pub fn publish(
        &self,
        event: AssetEvent,
    ) -> Result<usize, broadcast::error::SendError<AssetEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AssetEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
