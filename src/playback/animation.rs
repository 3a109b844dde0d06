use std::sync::mpsc;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::foundation::error::MatrixResult;

/// Pacing gate for one animation frame: presentation ends when it fires.
#[derive(Debug)]
pub enum ReadySignal {
    /// Fires at a wall-clock instant.
    At(Instant),
    /// Fires when a message arrives or every sender is dropped.
    Event(mpsc::Receiver<()>),
}

impl ReadySignal {
    /// Fire `d` from now. The clock starts here, not when the frame is drawn.
    pub fn after(d: Duration) -> Self {
        Self::At(Instant::now() + d)
    }

    /// Fire at `deadline`.
    pub fn at(deadline: Instant) -> Self {
        Self::At(deadline)
    }

    /// Fire on an external event.
    pub fn event(rx: mpsc::Receiver<()>) -> Self {
        Self::Event(rx)
    }

    /// Block until the signal fires.
    pub fn wait(self) {
        match self {
            Self::At(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if !left.is_zero() {
                    std::thread::sleep(left);
                }
            }
            Self::Event(rx) => {
                let _ = rx.recv();
            }
        }
    }
}

/// One frame produced by an [`Animation`].
#[derive(Debug)]
pub struct AnimationFrame {
    /// Image to present.
    pub image: RgbaImage,
    /// When presentation of this frame ends.
    pub ready: ReadySignal,
}

impl AnimationFrame {
    /// Frame shown until `ready` fires.
    pub fn new(image: RgbaImage, ready: ReadySignal) -> Self {
        Self { image, ready }
    }

    /// Frame shown for `d`, measured from now.
    pub fn for_duration(image: RgbaImage, d: Duration) -> Self {
        Self::new(image, ReadySignal::after(d))
    }
}

/// Programmatic frame source that paces itself.
///
/// `Ok(None)` means the animation is over; an error aborts playback.
pub trait Animation {
    /// Produce the next frame.
    fn next_frame(&mut self) -> MatrixResult<Option<AnimationFrame>>;
}

impl<F> Animation for F
where
    F: FnMut() -> MatrixResult<Option<AnimationFrame>>,
{
    fn next_frame(&mut self) -> MatrixResult<Option<AnimationFrame>> {
        self()
    }
}
