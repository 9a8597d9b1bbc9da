//! Start/stop state shared between the frame pipeline and request handlers.
use std::sync::{Condvar, Mutex, MutexGuard};

use thiserror::Error;

use crate::emotion::domain::emotion_label::EmotionLabel;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error("capture failed: {0}")]
    Failed(String),
    #[error("stream controller is shut down")]
    ShutDown,
}

#[derive(Debug)]
struct Shared {
    state: StreamState,
    last_emotions: Vec<EmotionLabel>,
    failure: Option<String>,
    shutdown: bool,
}

/// Guards whether the pipeline produces frames, and the emotions it last saw.
///
/// Every operation takes the same lock, so state changes are linearized
/// and no reader sees emotions from a half-processed frame.
pub struct StreamController {
    shared: Mutex<Shared>,
    wake: Condvar,
}

impl Default for StreamController {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamController {
    pub fn new() -> Self {
        Self {
            shared: Mutex::new(Shared {
                state: StreamState::Idle,
                last_emotions: Vec::new(),
                failure: None,
                shutdown: false,
            }),
            wake: Condvar::new(),
        }
    }

    // Shared is plain data and stays consistent across a panic.
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Idle → Streaming. Idempotent; wakes the pipeline.
    pub fn start(&self) -> Result<(), StartError> {
        let mut shared = self.lock();
        if let Some(reason) = &shared.failure {
            return Err(StartError::Failed(reason.clone()));
        }
        if shared.shutdown {
            return Err(StartError::ShutDown);
        }
        if shared.state != StreamState::Streaming {
            shared.state = StreamState::Streaming;
            log::info!("Streaming started");
        }
        self.wake.notify_all();
        Ok(())
    }

    /// Streaming → Idle. Idempotent; takes effect before the next frame.
    pub fn stop(&self) {
        let mut shared = self.lock();
        if shared.state != StreamState::Idle {
            shared.state = StreamState::Idle;
            log::info!("Streaming stopped");
        }
    }

    pub fn state(&self) -> StreamState {
        self.lock().state
    }

    pub fn is_streaming(&self) -> bool {
        self.state() == StreamState::Streaming
    }

    /// Snapshot of the labels from the most recent fully processed frame.
    pub fn emotions(&self) -> Vec<EmotionLabel> {
        self.lock().last_emotions.clone()
    }

    pub fn failure(&self) -> Option<String> {
        self.lock().failure.clone()
    }

    /// Blocks while idle. Returns `true` once streaming, `false` if the
    /// controller was shut down or has failed.
    pub fn wait_until_streaming(&self) -> bool {
        let shared = self.lock();
        let shared = self
            .wake
            .wait_while(shared, |s| {
                s.state == StreamState::Idle && !s.shutdown && s.failure.is_none()
            })
            .unwrap_or_else(|e| e.into_inner());
        !shared.shutdown && shared.failure.is_none()
    }

    /// Replaces the published emotions with the labels of one frame.
    pub fn publish_emotions(&self, labels: Vec<EmotionLabel>) {
        self.lock().last_emotions = labels;
    }

    /// Records a terminal capture failure and returns to idle.
    pub fn mark_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let mut shared = self.lock();
        log::error!("Stream failed: {reason}");
        shared.state = StreamState::Idle;
        shared.failure = Some(reason);
        self.wake.notify_all();
    }

    /// Releases a pipeline blocked in [`Self::wait_until_streaming`].
    pub fn shutdown(&self) {
        let mut shared = self.lock();
        shared.shutdown = true;
        shared.state = StreamState::Idle;
        self.wake.notify_all();
    }
}
