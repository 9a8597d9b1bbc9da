pub mod ffmpeg_capture_source;
