//! Single-producer, multi-consumer fan-out of stream chunks.
use std::sync::Mutex;

use bytes::Bytes;
use tokio::sync::broadcast;

/// Destination for encoded stream chunks produced by the pipeline.
pub trait FrameSink: Send + Sync {
    fn emit(&self, chunk: Bytes);

    /// Ends every consumer's stream; later chunks are discarded.
    fn close(&self);
}

/// Fans every chunk out to all subscribed viewers.
///
/// Each viewer owns a bounded queue; a viewer that falls behind skips
/// frames instead of blocking the producer.
pub struct FrameBroadcaster {
    sender: Mutex<Option<broadcast::Sender<Bytes>>>,
}

impl FrameBroadcaster {
    /// `capacity` is the number of chunks buffered per viewer.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }

    /// A receiver that sees every chunk emitted from now on.
    ///
    /// After [`FrameSink::close`] the receiver is already closed.
    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        match self.sender.lock() {
            Ok(guard) => match guard.as_ref() {
                Some(sender) => sender.subscribe(),
                None => closed_receiver(),
            },
            Err(_) => closed_receiver(),
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.receiver_count()))
            .unwrap_or(0)
    }
}

fn closed_receiver() -> broadcast::Receiver<Bytes> {
    let (_, receiver) = broadcast::channel(1);
    receiver
}

impl FrameSink for FrameBroadcaster {
    fn emit(&self, chunk: Bytes) {
        if let Ok(guard) = self.sender.lock() {
            if let Some(sender) = guard.as_ref() {
                // No subscribers is fine: the frame is simply not watched.
                let _ = sender.send(chunk);
            }
        }
    }

    fn close(&self) {
        if let Ok(mut guard) = self.sender.lock() {
            if guard.take().is_some() {
                log::info!("Frame broadcaster closed");
            }
        }
    }
}
