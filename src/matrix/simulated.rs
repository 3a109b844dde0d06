use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context as _;
use image::{Rgba, RgbaImage};

use crate::foundation::core::{Geometry, Rgb8};
use crate::foundation::error::{MatrixError, MatrixResult};
use crate::matrix::config::MatrixConfig;
use crate::matrix::{Matrix, check_frame_len};

/// Published frames kept by default before the oldest is dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Matrix backend that keeps its output in memory.
///
/// The pending buffer lives in the matrix itself; rendered frames are published to shared
/// state that any number of [`SimulatorView`]s can read from other threads.
pub struct SimulatedMatrix {
    geometry: Geometry,
    pending: Vec<Rgb8>,
    published: Arc<Mutex<Published>>,
}

#[derive(Debug)]
struct Published {
    front: Vec<Rgb8>,
    history: VecDeque<Vec<Rgb8>>,
    history_limit: usize,
    renders: u64,
    closed: bool,
}

impl Published {
    fn publish(&mut self, frame: Vec<Rgb8>) {
        if self.history_limit > 0 {
            if self.history.len() == self.history_limit {
                self.history.pop_front();
            }
            self.history.push_back(frame.clone());
        }
        self.front = frame;
        self.renders += 1;
    }
}

impl SimulatedMatrix {
    /// Create a simulator of `width` x `height` pixels, initially black.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_history_limit(width, height, DEFAULT_HISTORY_LIMIT)
    }

    /// Create a simulator that retains at most `limit` published frames.
    pub fn with_history_limit(width: usize, height: usize, limit: usize) -> Self {
        let geometry = Geometry::new(width, height);
        Self {
            geometry,
            pending: geometry.blank_frame(),
            published: Arc::new(Mutex::new(Published {
                front: geometry.blank_frame(),
                history: VecDeque::new(),
                history_limit: limit,
                renders: 0,
                closed: false,
            })),
        }
    }

    /// Create a simulator sized like the panel described by `config`.
    pub fn from_config(config: &MatrixConfig) -> Self {
        let g = config.geometry();
        Self::new(g.width, g.height)
    }

    /// Observer handle over the published output.
    pub fn view(&self) -> SimulatorView {
        SimulatorView {
            geometry: self.geometry,
            published: Arc::clone(&self.published),
        }
    }

    fn publish(&mut self, frame: Vec<Rgb8>) -> MatrixResult<()> {
        lock(&self.published)?.publish(frame);
        Ok(())
    }
}

fn lock(published: &Mutex<Published>) -> MatrixResult<MutexGuard<'_, Published>> {
    published
        .lock()
        .map_err(|_| MatrixError::playback("simulator state lock poisoned"))
}

impl Matrix for SimulatedMatrix {
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
        self.publish(colors)
    }

    fn render(&mut self) -> MatrixResult<()> {
        let frame = std::mem::replace(&mut self.pending, self.geometry.blank_frame());
        self.publish(frame)
    }

    fn close(&mut self) -> MatrixResult<()> {
        let blank = self.geometry.blank_frame();
        let mut published = lock(&self.published)?;
        published.publish(blank);
        published.closed = true;
        Ok(())
    }
}

/// Read-only, cloneable view over a [`SimulatedMatrix`]'s published output.
#[derive(Clone)]
pub struct SimulatorView {
    geometry: Geometry,
    published: Arc<Mutex<Published>>,
}

impl SimulatorView {
    /// Surface size.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Most recently rendered frame.
    pub fn front(&self) -> MatrixResult<Vec<Rgb8>> {
        Ok(lock(&self.published)?.front.clone())
    }

    /// Number of frames rendered so far (including the blank frame published by `close`).
    pub fn renders(&self) -> MatrixResult<u64> {
        Ok(lock(&self.published)?.renders)
    }

    /// Retained published frames, oldest first.
    pub fn history(&self) -> MatrixResult<Vec<Vec<Rgb8>>> {
        Ok(lock(&self.published)?.history.iter().cloned().collect())
    }

    /// Whether the backend has been closed.
    pub fn is_closed(&self) -> MatrixResult<bool> {
        Ok(lock(&self.published)?.closed)
    }

    /// Draw the front frame the way a physical panel looks: square LEDs separated by gutters,
    /// framed by a margin.
    pub fn preview(&self, style: &PreviewStyle) -> MatrixResult<RgbaImage> {
        let front = self.front()?;
        Ok(style.draw(self.geometry, &front))
    }

    /// Write [`SimulatorView::preview`] to `path` as a PNG.
    pub fn save_preview(&self, path: impl AsRef<Path>, style: &PreviewStyle) -> MatrixResult<()> {
        let path = path.as_ref();
        let img = self.preview(style)?;
        img.save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write preview png '{}'", path.display()))?;
        Ok(())
    }
}

/// Layout of a simulated panel preview.
///
/// LED size is `pitch_to_gutter_ratio * gutter`; the LED at `(col, row)` starts at
/// `col * (pitch + gutter) + margin` horizontally (same for rows).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreviewStyle {
    /// Gap between LEDs in preview pixels.
    pub gutter: u32,
    /// LED size as a multiple of the gutter.
    pub pitch_to_gutter_ratio: u32,
    /// Border around the LED area.
    pub margin: u32,
    /// Color of the panel between LEDs.
    pub gutter_color: Rgba<u8>,
}

impl Default for PreviewStyle {
    fn default() -> Self {
        Self {
            gutter: 6,
            pitch_to_gutter_ratio: 2,
            margin: 10,
            gutter_color: Rgba([20, 20, 20, 255]),
        }
    }
}

impl PreviewStyle {
    /// Style whose LED size is as close as possible to `pixel_pitch`.
    pub fn with_pixel_pitch(pixel_pitch: u32) -> Self {
        let base = Self::default();
        Self {
            gutter: (pixel_pitch / base.pitch_to_gutter_ratio).max(1),
            ..base
        }
    }

    /// LED size in preview pixels.
    pub fn pixel_pitch(&self) -> u32 {
        self.pitch_to_gutter_ratio * self.gutter
    }

    /// Largest gutter for which a `geometry` panel fits in `width` x `height` preview pixels.
    pub fn gutter_for_area(&self, geometry: Geometry, width: u32, height: u32) -> u32 {
        fn fit(avail: u32, margin: u32, ratio: u32, leds: u32) -> u32 {
            let denom = ratio * leds + leds.saturating_sub(1);
            if denom == 0 {
                return 0;
            }
            avail.saturating_sub(2 * margin) / denom
        }

        let gx = fit(width, self.margin, self.pitch_to_gutter_ratio, geometry.width as u32);
        let gy = fit(height, self.margin, self.pitch_to_gutter_ratio, geometry.height as u32);
        gx.min(gy)
    }

    /// Preview image size for a `geometry` panel.
    pub fn image_size(&self, geometry: Geometry) -> (u32, u32) {
        let step = self.pixel_pitch() + self.gutter;
        let span = |leds: usize| {
            let leds = leds as u32;
            if leds == 0 {
                2 * self.margin
            } else {
                leds * step - self.gutter + 2 * self.margin
            }
        };
        (span(geometry.width), span(geometry.height))
    }

    fn led_origin(&self, col: usize, row: usize) -> (u32, u32) {
        let step = self.pixel_pitch() + self.gutter;
        (
            col as u32 * step + self.margin,
            row as u32 * step + self.margin,
        )
    }

    fn draw(&self, geometry: Geometry, frame: &[Rgb8]) -> RgbaImage {
        let (w, h) = self.image_size(geometry);
        let mut img = RgbaImage::from_pixel(w, h, self.gutter_color);

        let pitch = self.pixel_pitch();
        for row in 0..geometry.height {
            for col in 0..geometry.width {
                let color = frame[col + row * geometry.width].to_rgba();
                let (x0, y0) = self.led_origin(col, row);
                for y in y0..y0 + pitch {
                    for x in x0..x0 + pitch {
                        img.put_pixel(x, y, color);
                    }
                }
            }
        }
        img
    }
}

#[cfg(test)]
#[path = "../../tests/unit/matrix/simulated.rs"]
mod tests;
