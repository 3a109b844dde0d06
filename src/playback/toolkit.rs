use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::canvas::Canvas;
use crate::foundation::error::{MatrixError, MatrixResult};
use crate::matrix::Matrix;
use crate::playback::animation::{Animation, ReadySignal};
use crate::playback::decode::{FrameDecoder, FrameSequence, GifFrameDecoder};
use crate::playback::session::PlaybackHandle;
use crate::playback::transform::Transform;

/// Draws frames on a shared canvas. Cloned into every background session.
pub(crate) struct Presenter<M: Matrix> {
    canvas: Arc<Mutex<Canvas<M>>>,
    transform: Option<Transform>,
}

impl<M: Matrix> Clone for Presenter<M> {
    fn clone(&self) -> Self {
        Self {
            canvas: Arc::clone(&self.canvas),
            transform: self.transform.clone(),
        }
    }
}

impl<M: Matrix> Presenter<M> {
    fn lock(&self) -> MatrixResult<MutexGuard<'_, Canvas<M>>> {
        self.canvas
            .lock()
            .map_err(|_| MatrixError::playback("canvas lock poisoned"))
    }

    /// Transform, draw and render one frame. The canvas lock is released on return.
    fn show(&self, img: &RgbaImage) -> MatrixResult<()> {
        let transformed;
        let img = match &self.transform {
            Some(t) => {
                transformed = t(img);
                &transformed
            }
            None => img,
        };

        let mut canvas = self.lock()?;
        canvas.draw_image(img);
        canvas.render()
    }

    /// Show `img`, then hold until `delay` has passed since the call began.
    pub(crate) fn play_image(&self, img: &RgbaImage, delay: Duration) -> MatrixResult<()> {
        let start = Instant::now();
        let res = self.show(img);
        let left = delay.saturating_sub(start.elapsed());
        if !left.is_zero() {
            std::thread::sleep(left);
        }
        res
    }

    pub(crate) fn play_image_until(&self, img: &RgbaImage, ready: ReadySignal) -> MatrixResult<()> {
        let res = self.show(img);
        ready.wait();
        res
    }
}

/// Playback engine: paces images, animations and decoded sequences onto a [`Canvas`].
///
/// The canvas is shared with background sessions; it is locked only while a frame is drawn and
/// rendered, never while waiting. Running two sessions on one toolkit at the same time is not
/// prevented, but their frames will interleave.
pub struct ToolKit<M: Matrix + 'static = Box<dyn Matrix>> {
    presenter: Presenter<M>,
}

impl<M: Matrix + 'static> ToolKit<M> {
    /// Wrap `matrix` in a new canvas.
    pub fn new(matrix: M) -> MatrixResult<Self> {
        Ok(Self::from_canvas(Canvas::new(matrix)?))
    }

    /// Use an existing canvas.
    pub fn from_canvas(canvas: Canvas<M>) -> Self {
        Self {
            presenter: Presenter {
                canvas: Arc::new(Mutex::new(canvas)),
                transform: None,
            },
        }
    }

    /// Apply `t` to every frame just before it is drawn. Sessions already running keep the
    /// transform they started with.
    pub fn set_transform(&mut self, t: Transform) {
        self.presenter.transform = Some(t);
    }

    /// Draw frames as they are.
    pub fn clear_transform(&mut self) {
        self.presenter.transform = None;
    }

    /// Run `f` with the canvas locked.
    pub fn with_canvas<R>(&self, f: impl FnOnce(&mut Canvas<M>) -> R) -> MatrixResult<R> {
        let mut canvas = self.presenter.lock()?;
        Ok(f(&mut *canvas))
    }

    /// Draw `img` and render, then block until `delay` has elapsed since the call began.
    ///
    /// Drawing time counts against `delay`; a slow render never adds extra waiting. The wait
    /// also happens when rendering fails, and the render error is returned afterwards.
    pub fn play_image(&self, img: &RgbaImage, delay: Duration) -> MatrixResult<()> {
        self.presenter.play_image(img, delay)
    }

    /// Draw `img` and render, then block until `ready` fires.
    pub fn play_image_until(&self, img: &RgbaImage, ready: ReadySignal) -> MatrixResult<()> {
        self.presenter.play_image_until(img, ready)
    }

    /// Pull frames from `anim` until it returns `Ok(None)`, presenting each until its ready
    /// signal fires. Runs on the calling thread.
    pub fn play_animation(&self, anim: &mut dyn Animation) -> MatrixResult<()> {
        while let Some(frame) = anim.next_frame()? {
            self.play_image_until(&frame.image, frame.ready)?;
        }
        Ok(())
    }

    /// Play `images` with their paired `delays` on a background thread.
    ///
    /// `loop_count` is the total number of passes over the list; `0` loops until cancelled.
    /// Returns as soon as the session has started.
    pub fn play_images(
        &self,
        images: Vec<RgbaImage>,
        delays: Vec<Duration>,
        loop_count: u32,
    ) -> MatrixResult<PlaybackHandle> {
        if images.is_empty() {
            return Err(MatrixError::validation("play_images needs at least one image"));
        }
        if images.len() != delays.len() {
            return Err(MatrixError::validation(format!(
                "play_images got {} images but {} delays",
                images.len(),
                delays.len()
            )));
        }
        PlaybackHandle::spawn(self.presenter.clone(), images, delays, loop_count)
    }

    /// Play a decoded sequence on a background thread.
    pub fn play_sequence(&self, seq: FrameSequence) -> MatrixResult<PlaybackHandle> {
        let (images, delays, loop_count) = seq.into_parts();
        self.play_images(images, delays, loop_count)
    }

    /// Decode a GIF from `reader` and play it on a background thread.
    ///
    /// Nothing is played when decoding fails.
    pub fn play_gif(&self, reader: &mut dyn Read) -> MatrixResult<PlaybackHandle> {
        self.play_gif_with(&GifFrameDecoder, reader)
    }

    /// [`ToolKit::play_gif`] with a custom decoder.
    #[tracing::instrument(skip_all)]
    pub fn play_gif_with(
        &self,
        decoder: &dyn FrameDecoder,
        reader: &mut dyn Read,
    ) -> MatrixResult<PlaybackHandle> {
        let seq = decoder.decode(reader)?.into_sequence()?;
        self.play_sequence(seq)
    }

    /// Blank and close the canvas and its matrix.
    pub fn close(&self) -> MatrixResult<()> {
        self.presenter.lock()?.close()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/toolkit.rs"]
mod tests;
