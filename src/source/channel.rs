//! Channel-based data source.
//!
//! Receives monitor updates pushed through a tokio mpsc channel. Useful for
//! embedding the dashboard behind a custom producer, and for tests.

use tokio::sync::mpsc;

use super::DataSource;
use crate::data::MonitorUpdate;

const CHANNEL_CAPACITY: usize = 64;

/// A data source fed by an mpsc channel.
///
/// # Example
///
/// ```
/// use chainwatch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("replay");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<MonitorUpdate>,
    description: String,
    last_error: Option<String>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<MonitorUpdate>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            last_error: None,
        }
    }

    /// Create a channel pair: push updates into the sender, hand the source
    /// to the dashboard.
    pub fn create(source_description: &str) -> (mpsc::Sender<MonitorUpdate>, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (tx, Self::new(rx, source_description))
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<MonitorUpdate> {
        match self.receiver.try_recv() {
            Ok(update) => Some(update),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.last_error = Some("Sender disconnected".to_string());
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HealthReport;

    #[test]
    fn test_channel_source_poll() {
        let (tx, mut source) = ChannelSource::create("test");
        assert_eq!(source.description(), "channel: test");
        assert!(source.poll().is_none());

        tx.try_send(MonitorUpdate::Health {
            seq: 1,
            report: HealthReport::unreachable(),
        })
        .unwrap();

        let update = source.poll().unwrap();
        assert_eq!(update.seq(), 1);
        assert!(source.poll().is_none());
        assert!(source.error().is_none());
    }

    #[test]
    fn test_channel_source_disconnect() {
        let (tx, mut source) = ChannelSource::create("test");
        drop(tx);
        assert!(source.poll().is_none());
        assert_eq!(source.error(), Some("Sender disconnected"));
    }
}
