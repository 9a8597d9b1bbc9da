pub const CASCADE_FILE_NAME: &str = "haarcascade_frontalface_default.xml";

pub const EMOTION_MODEL_NAME: &str = "emotion-ferplus-8.onnx";
pub const EMOTION_MODEL_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/emotion_ferplus/model/emotion-ferplus-8.onnx";

pub const FACE_MODEL_NAME: &str = "blazeface.onnx";

pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Haar cascade search parameters for the geometric detector.
pub const CASCADE_SCALE_FACTOR: f64 = 1.1;
pub const CASCADE_MIN_NEIGHBORS: i32 = 5;
pub const CASCADE_MIN_SIZE: u32 = 30;

pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Frames buffered per viewer before a slow viewer starts skipping.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 4;

/// Multipart boundary token for the MJPEG feed.
pub const STREAM_BOUNDARY: &str = "frame";
