use crate::capture::domain::frame_source::{CaptureError, FrameSource};
use crate::shared::frame::Frame;

/// Where frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureTarget {
    /// Local camera by index (`/dev/videoN` on Linux, AVFoundation index on
    /// macOS, VfW driver index on Windows).
    Device(u32),
    /// Anything libavformat can open: file path, RTSP/HTTP URL, device spec.
    Url(String),
}

impl std::fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureTarget::Device(index) => write!(f, "camera #{index}"),
            CaptureTarget::Url(url) => f.write_str(url),
        }
    }
}

/// Pulls frames from a camera or stream via ffmpeg-next (libavdevice +
/// libavformat + libavcodec), scaling each one to a fixed RGB24 resolution.
pub struct FfmpegCaptureSource {
    input_ctx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    width: u32,
    height: u32,
    frame_index: usize,
    drained: bool,
}

// Safety: FfmpegCaptureSource is owned and used by the pipeline thread only.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegCaptureSource {}

impl FfmpegCaptureSource {
    /// Opens the capture target and prepares a decoder that outputs
    /// `width`×`height` RGB frames.
    pub fn open(target: &CaptureTarget, width: u32, height: u32) -> Result<Self, CaptureError> {
        let open_error = |reason: String| CaptureError::Open {
            source_name: target.to_string(),
            reason,
        };

        ffmpeg_next::init().map_err(|e| open_error(e.to_string()))?;

        let input_ctx = match target {
            CaptureTarget::Device(index) => open_device(*index, width, height),
            CaptureTarget::Url(url) => {
                ffmpeg_next::format::input_with_dictionary(url, ffmpeg_next::Dictionary::new())
            }
        }
        .map_err(|e| open_error(e.to_string()))?;

        let stream = input_ctx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| open_error("no video stream found".to_string()))?;
        let video_stream_index = stream.index();

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| open_error(e.to_string()))?;

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| open_error(e.to_string()))?;

        log::info!(
            "Opened {target}: {}x{} {:?} -> {width}x{height} RGB",
            decoder.width(),
            decoder.height(),
            decoder.format()
        );

        Ok(Self {
            input_ctx,
            decoder,
            scaler,
            video_stream_index,
            width,
            height,
            frame_index: 0,
            drained: false,
        })
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, CaptureError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(|e| CaptureError::Read(e.to_string()))?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

impl FrameSource for FfmpegCaptureSource {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        loop {
            if let Some(frame) = self.try_receive()? {
                return Ok(frame);
            }
            if self.drained {
                return Err(CaptureError::EndOfStream);
            }

            let next = self
                .input_ctx
                .packets()
                .next()
                .map(|(stream, packet)| (stream.index(), packet));

            match next {
                Some((index, packet)) if index == self.video_stream_index => {
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Dropping undecodable packet: {e}");
                    }
                }
                Some(_) => {}
                None => {
                    let _ = self.decoder.send_eof();
                    self.drained = true;
                }
            }
        }
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Opens a local camera through the platform's libavdevice input format.
fn open_device(
    index: u32,
    width: u32,
    height: u32,
) -> Result<ffmpeg_next::format::context::Input, ffmpeg_next::Error> {
    let (format_name, path) = device_input(index);
    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name().split(',').any(|n| n == format_name))
        .ok_or(ffmpeg_next::Error::DemuxerNotFound)?;

    let mut options = ffmpeg_next::Dictionary::new();
    options.set("video_size", &format!("{width}x{height}"));

    let ctx = ffmpeg_next::format::open_with(&path, &ffmpeg_next::Format::Input(format), options)?;
    Ok(ctx.input())
}

/// libavdevice input format and device path for camera `index`.
#[cfg(target_os = "macos")]
fn device_input(index: u32) -> (&'static str, String) {
    ("avfoundation", format!("{index}:none"))
}

#[cfg(target_os = "windows")]
fn device_input(index: u32) -> (&'static str, String) {
    ("vfwcap", index.to_string())
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn device_input(index: u32) -> (&'static str, String) {
    ("video4linux2", format!("/dev/video{index}"))
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may pad each row (stride > width*3); the padding is dropped.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
