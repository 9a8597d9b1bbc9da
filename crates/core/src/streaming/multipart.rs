//! `multipart/x-mixed-replace` framing for the live video feed.
use bytes::{BufMut, Bytes, BytesMut};

use crate::shared::constants::STREAM_BOUNDARY;

/// `Content-Type` header value for the video feed response.
pub fn content_type() -> String {
    format!("multipart/x-mixed-replace; boundary={STREAM_BOUNDARY}")
}

/// Wraps one encoded image as a multipart part:
/// `--frame\r\nContent-Type: <type>\r\n\r\n<payload>\r\n`.
pub fn chunk(payload: &[u8], part_content_type: &str) -> Bytes {
    let header = format!("--{STREAM_BOUNDARY}\r\nContent-Type: {part_content_type}\r\n\r\n");
    let mut buf = BytesMut::with_capacity(header.len() + payload.len() + 2);
    buf.put_slice(header.as_bytes());
    buf.put_slice(payload);
    buf.put_slice(b"\r\n");
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_names_boundary() {
        assert_eq!(content_type(), "multipart/x-mixed-replace; boundary=frame");
    }

    #[test]
    fn test_chunk_layout() {
        let part = chunk(&[0xFF, 0xD8, 0xFF, 0xD9], "image/jpeg");
        let mut expected = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n".to_vec();
        expected.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xD9]);
        expected.extend_from_slice(b"\r\n");
        assert_eq!(&part[..], &expected[..]);
    }
}
