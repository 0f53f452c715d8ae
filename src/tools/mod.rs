mod color;
mod color_math;
mod ffprobe_info;
mod file_fingerprint;
mod frame_decoder;
mod path_validator;

pub use color::{Color, ColorSpan, FrameColor, FrameResult, PixelBuffer, SpanEntry};
pub use color_math::{hsv_to_rgb, rgb_to_hsv};
pub use ffprobe_info::{VideoInfo, get_video_info};
pub use file_fingerprint::calculate_file_fingerprint;
pub use frame_decoder::{DecoderConfig, FfmpegDecoder, FrameSource};
pub use path_validator::{ensure_directory_exists, validate_file_exists};
