//! rgbmatrix renders images and animations onto RGB LED matrices.
//!
//! The stack, bottom up:
//!
//! - a [`Matrix`] backend: a physical panel (feature `hardware`), an in-memory
//!   [`SimulatedMatrix`], or a [`RemoteMatrix`] talking to a [`MatrixServer`];
//! - a [`Canvas`] giving the matrix 2-D coordinates;
//! - a [`ToolKit`] pacing still images, animations and GIFs onto the canvas.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// 2-D canvas over a matrix.
pub mod canvas;
/// Backend contract and implementations.
pub mod matrix;
/// Frame pacing and playback sessions.
pub mod playback;
/// Network transparency.
pub mod remote;

pub use crate::canvas::Canvas;
pub use crate::foundation::core::{Geometry, Rect, Rgb8};
pub use crate::foundation::error::{MatrixError, MatrixResult};
pub use crate::matrix::config::{BackendKind, MatrixConfig, ScanMode};
pub use crate::matrix::simulated::{PreviewStyle, SimulatedMatrix, SimulatorView};
pub use crate::matrix::{Matrix, create_matrix};
pub use crate::playback::{
    Animation, AnimationFrame, FrameDecoder, FrameSequence, GifFrameDecoder, PlaybackHandle,
    PlaybackOutcome, PlaybackReport, ReadySignal, Rotation, ToolKit, Transform,
};
pub use crate::remote::{MatrixServer, RemoteMatrix};

#[cfg(feature = "hardware")]
pub use crate::matrix::native::NativeMatrix;
