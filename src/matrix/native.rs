use std::sync::mpsc;
use std::thread::JoinHandle;

use rpi_led_matrix::{LedColor, LedMatrix, LedMatrixOptions};

use crate::foundation::core::{Geometry, Rgb8};
use crate::foundation::error::{MatrixError, MatrixResult};
use crate::matrix::config::MatrixConfig;
use crate::matrix::{Matrix, check_frame_len};

enum DriverCmd {
    Frame(Vec<Rgb8>),
    Close,
}

/// Physical panel backend.
///
/// The C driver handle cannot leave the thread that created it, so it is owned by a dedicated
/// driver thread. This handle keeps the pending buffer and hands whole frames to the driver,
/// which paints them on its offscreen canvas and swaps on vsync.
pub struct NativeMatrix {
    geometry: Geometry,
    pending: Vec<Rgb8>,
    tx: mpsc::SyncSender<DriverCmd>,
    done_rx: mpsc::Receiver<()>,
    driver: Option<JoinHandle<()>>,
}

fn driver_options(config: &MatrixConfig) -> MatrixResult<LedMatrixOptions> {
    let mut o = LedMatrixOptions::new();
    o.set_rows(config.rows as u32);
    o.set_cols(config.cols as u32);
    o.set_chain_length(config.chain_length as u32);
    o.set_parallel(config.parallel as u32);
    o.set_pwm_bits(config.pwm_bits)
        .map_err(|e| MatrixError::construction(format!("pwm_bits: {e}")))?;
    o.set_pwm_lsb_nanoseconds(config.pwm_lsb_nanoseconds);
    o.set_brightness(config.brightness)
        .map_err(|e| MatrixError::construction(format!("brightness: {e}")))?;
    o.set_scan_mode(config.scan_mode.as_driver_value());
    o.set_hardware_pulsing(!config.disable_hardware_pulsing);
    o.set_refresh_rate(config.show_refresh_rate);
    o.set_inverse_colors(config.inverse_colors);
    o.set_hardware_mapping(&config.hardware_mapping);
    Ok(o)
}

impl NativeMatrix {
    /// Open the panel described by `config`.
    pub fn new(config: &MatrixConfig) -> MatrixResult<Self> {
        config.validate()?;
        let geometry = config.geometry();
        let driver_config = config.clone();

        let (tx, rx) = mpsc::sync_channel::<DriverCmd>(1);
        let (ready_tx, ready_rx) = mpsc::sync_channel::<MatrixResult<()>>(1);
        let (done_tx, done_rx) = mpsc::sync_channel::<()>(1);

        let driver = std::thread::Builder::new()
            .name("rgbmatrix-driver".to_string())
            .spawn(move || {
                let matrix = match driver_options(&driver_config).and_then(|o| {
                    LedMatrix::new(Some(o), None).map_err(MatrixError::construction)
                }) {
                    Ok(m) => {
                        let _ = ready_tx.send(Ok(()));
                        m
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                drive(&matrix, geometry, rx, done_tx);
            })
            .map_err(|e| MatrixError::construction(format!("spawn driver thread: {e}")))?;

        ready_rx
            .recv()
            .map_err(|_| MatrixError::construction("driver thread exited during startup"))??;

        tracing::info!(
            width = geometry.width,
            height = geometry.height,
            mapping = %config.hardware_mapping,
            "native matrix ready"
        );

        Ok(Self {
            geometry,
            pending: geometry.blank_frame(),
            tx,
            done_rx,
            driver: Some(driver),
        })
    }

    fn submit(&mut self, frame: Vec<Rgb8>) -> MatrixResult<()> {
        self.tx
            .send(DriverCmd::Frame(frame))
            .map_err(|_| MatrixError::playback("matrix driver thread is gone"))?;
        self.done_rx
            .recv()
            .map_err(|_| MatrixError::playback("matrix driver thread is gone"))
    }
}

fn drive(
    matrix: &LedMatrix,
    geometry: Geometry,
    rx: mpsc::Receiver<DriverCmd>,
    done_tx: mpsc::SyncSender<()>,
) {
    let mut canvas = matrix.offscreen_canvas();
    while let Ok(cmd) = rx.recv() {
        let frame = match cmd {
            DriverCmd::Frame(frame) => frame,
            DriverCmd::Close => break,
        };
        for y in 0..geometry.height {
            for x in 0..geometry.width {
                let c = frame[x + y * geometry.width];
                canvas.set(
                    x as i32,
                    y as i32,
                    &LedColor {
                        red: c.r,
                        green: c.g,
                        blue: c.b,
                    },
                );
            }
        }
        canvas = matrix.swap(canvas);
        if done_tx.send(()).is_err() {
            break;
        }
    }
}

impl Matrix for NativeMatrix {
    fn geometry(&mut self) -> MatrixResult<Geometry> {
        Ok(self.geometry)
    }

    fn at(&self, position: usize) -> Rgb8 {
        self.pending[position]
    }

    fn set(&mut self, position: usize, color: Rgb8) {
        self.pending[position] = color;
    }

    fn apply(&mut self, colors: Vec<Rgb8>) -> MatrixResult<()> {
        check_frame_len(self.geometry, &colors)?;
        self.pending = self.geometry.blank_frame();
        self.submit(colors)
    }

    fn render(&mut self) -> MatrixResult<()> {
        let frame = std::mem::replace(&mut self.pending, self.geometry.blank_frame());
        self.submit(frame)
    }

    fn close(&mut self) -> MatrixResult<()> {
        let Some(driver) = self.driver.take() else {
            return Ok(());
        };
        let blank = self.submit(self.geometry.blank_frame());
        let _ = self.tx.send(DriverCmd::Close);
        driver
            .join()
            .map_err(|_| MatrixError::playback("matrix driver thread panicked"))?;
        blank
    }
}

impl Drop for NativeMatrix {
    fn drop(&mut self) {
        if self.driver.is_some()
            && let Err(e) = self.close()
        {
            tracing::warn!(error = %e, "closing native matrix on drop failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/matrix/native.rs"]
mod tests;
