use std::sync::mpsc::{self, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

use image::RgbaImage;

use crate::foundation::error::{MatrixError, MatrixResult};
use crate::matrix::Matrix;
use crate::playback::toolkit::Presenter;

/// How a background playback session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every requested pass was played.
    Exhausted,
    /// [`PlaybackHandle::cancel`] stopped the session.
    Cancelled,
}

/// Summary returned by [`PlaybackHandle::wait`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Terminal state of the session.
    pub outcome: PlaybackOutcome,
    /// Frames rendered, across all passes.
    pub frames_played: u64,
    /// Complete passes over the frame list.
    pub passes_completed: u64,
}

/// Handle to a background playback session started by
/// [`crate::ToolKit::play_images`] or [`crate::ToolKit::play_gif`].
///
/// Dropping the handle detaches the session: it keeps playing until it runs out of passes.
#[derive(Debug)]
pub struct PlaybackHandle {
    cancel_tx: mpsc::Sender<()>,
    join: JoinHandle<MatrixResult<PlaybackReport>>,
}

impl PlaybackHandle {
    pub(crate) fn spawn<M: Matrix + 'static>(
        presenter: Presenter<M>,
        images: Vec<RgbaImage>,
        delays: Vec<Duration>,
        loop_count: u32,
    ) -> MatrixResult<Self> {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let join = std::thread::Builder::new()
            .name("rgbmatrix-playback".to_string())
            .spawn(move || {
                tracing::debug!(frames = images.len(), loop_count, "playback started");
                let res = run_session(&presenter, &images, &delays, loop_count, &cancel_rx);
                match &res {
                    Ok(report) => tracing::debug!(
                        outcome = ?report.outcome,
                        frames = report.frames_played,
                        passes = report.passes_completed,
                        "playback finished"
                    ),
                    Err(e) => tracing::warn!(error = %e, "playback aborted"),
                }
                res
            })
            .map_err(|e| MatrixError::playback(format!("spawn playback thread: {e}")))?;
        Ok(Self { cancel_tx, join })
    }

    /// Ask the session to stop at the next frame boundary. Idempotent; never blocks.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(());
    }

    /// Whether the session has ended.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Block until the session ends.
    ///
    /// Returns the error that aborted the session, if any.
    pub fn wait(self) -> MatrixResult<PlaybackReport> {
        self.join
            .join()
            .map_err(|_| MatrixError::playback("playback thread panicked"))?
    }

    /// [`PlaybackHandle::cancel`], then [`PlaybackHandle::wait`].
    pub fn stop(self) -> MatrixResult<PlaybackReport> {
        self.cancel();
        self.wait()
    }
}

fn run_session<M: Matrix>(
    presenter: &Presenter<M>,
    images: &[RgbaImage],
    delays: &[Duration],
    loop_count: u32,
    cancel_rx: &mpsc::Receiver<()>,
) -> MatrixResult<PlaybackReport> {
    let mut report = PlaybackReport {
        outcome: PlaybackOutcome::Exhausted,
        frames_played: 0,
        passes_completed: 0,
    };

    let mut i = 0;
    loop {
        // A dropped handle means detached, not cancelled.
        match cancel_rx.try_recv() {
            Ok(()) => {
                report.outcome = PlaybackOutcome::Cancelled;
                return Ok(report);
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => {}
        }

        presenter.play_image(&images[i], delays[i])?;
        report.frames_played += 1;

        i += 1;
        if i == images.len() {
            report.passes_completed += 1;
            if loop_count != 0 && report.passes_completed >= u64::from(loop_count) {
                return Ok(report);
            }
            i = 0;
        }
    }
}
