//! Frame pacing on top of [`crate::Canvas`].
//!
//! Foreground calls (`play_image`, `play_image_until`, `play_animation`) block the caller for
//! the whole presentation. `play_images`, `play_sequence` and `play_gif` start a background
//! session and return a [`PlaybackHandle`] that can cancel it or wait for it.

/// Programmatic, self-paced frame sources.
pub mod animation;
/// Multi-frame decoding.
pub mod decode;
/// Background sessions.
pub mod session;
/// The playback engine.
pub mod toolkit;
/// Stock per-frame transforms.
pub mod transform;

pub use animation::{Animation, AnimationFrame, ReadySignal};
pub use decode::{DecodedFrames, FrameDecoder, FrameSequence, GifFrameDecoder, decode_gif};
pub use session::{PlaybackHandle, PlaybackOutcome, PlaybackReport};
pub use toolkit::ToolKit;
pub use transform::{Rotation, Transform};
