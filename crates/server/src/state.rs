use std::sync::Arc;

use emotion_stream_core::control::stream_controller::StreamController;
use emotion_stream_core::streaming::frame_broadcaster::FrameBroadcaster;

/// Handles shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<StreamController>,
    pub broadcaster: Arc<FrameBroadcaster>,
}

impl AppState {
    pub fn new(controller: Arc<StreamController>, broadcaster: Arc<FrameBroadcaster>) -> Self {
        Self {
            controller,
            broadcaster,
        }
    }
}
