use std::io::Read;
use std::time::Duration;

use image::{Rgba, RgbaImage};

use crate::foundation::error::{MatrixError, MatrixResult};

/// Milliseconds per decoder delay unit (GIF delays are hundredths of a second).
pub const DELAY_UNIT_MS: u64 = 10;

/// Frames ready for playback: images, their delays and how many passes to play.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    images: Vec<RgbaImage>,
    delays: Vec<Duration>,
    loop_count: u32,
}

impl FrameSequence {
    /// Build a sequence; `images` and `delays` must have the same length.
    ///
    /// `loop_count` is the total number of passes over the frames, `0` for forever.
    pub fn new(images: Vec<RgbaImage>, delays: Vec<Duration>, loop_count: u32) -> MatrixResult<Self> {
        if images.len() != delays.len() {
            return Err(MatrixError::validation(format!(
                "{} images but {} delays",
                images.len(),
                delays.len()
            )));
        }
        Ok(Self {
            images,
            delays,
            loop_count,
        })
    }

    /// Frame images in presentation order.
    pub fn images(&self) -> &[RgbaImage] {
        &self.images
    }

    /// Per-frame presentation delays.
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Total passes, `0` for forever.
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Number of frames in one pass.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Return `true` when there are no frames.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Split into `(images, delays, loop_count)`.
    pub fn into_parts(self) -> (Vec<RgbaImage>, Vec<Duration>, u32) {
        (self.images, self.delays, self.loop_count)
    }
}

/// Raw decoder output, with delays still in decoder units.
#[derive(Clone, Debug)]
pub struct DecodedFrames {
    /// Full-screen frames in order.
    pub images: Vec<RgbaImage>,
    /// Per-frame delays in hundredths of a second.
    pub delays: Vec<u16>,
    /// Total passes, `0` for forever.
    pub loop_count: u32,
}

impl DecodedFrames {
    /// Convert delay units to durations.
    pub fn into_sequence(self) -> MatrixResult<FrameSequence> {
        let delays = self
            .delays
            .iter()
            .map(|&units| Duration::from_millis(u64::from(units) * DELAY_UNIT_MS))
            .collect();
        FrameSequence::new(self.images, delays, self.loop_count)
    }
}

/// A multi-frame image decoder.
pub trait FrameDecoder {
    /// Decode every frame from `reader`.
    fn decode(&self, reader: &mut dyn Read) -> MatrixResult<DecodedFrames>;
}

/// GIF decoder producing composited full-screen frames.
///
/// Loop count mapping: a NETSCAPE "loop forever" extension gives `0`, a missing extension gives
/// a single pass, an explicit count `n` gives `n` passes.
#[derive(Clone, Copy, Debug, Default)]
pub struct GifFrameDecoder;

impl FrameDecoder for GifFrameDecoder {
    #[tracing::instrument(skip_all)]
    fn decode(&self, reader: &mut dyn Read) -> MatrixResult<DecodedFrames> {
        let mut opts = gif::DecodeOptions::new();
        opts.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = opts
            .read_info(reader)
            .map_err(|e| MatrixError::decode(format!("gif header: {e}")))?;

        let (sw, sh) = (u32::from(decoder.width()), u32::from(decoder.height()));
        let mut screen = RgbaImage::new(sw, sh);
        let mut images = Vec::new();
        let mut delays = Vec::new();

        while let Some(frame) = decoder
            .read_next_frame()
            .map_err(|e| MatrixError::decode(format!("gif frame {}: {e}", images.len())))?
        {
            let saved = (frame.dispose == gif::DisposalMethod::Previous).then(|| screen.clone());
            let rect = FrameRect {
                left: u32::from(frame.left),
                top: u32::from(frame.top),
                width: u32::from(frame.width),
                height: u32::from(frame.height),
            };
            paint_frame(&mut screen, rect, &frame.buffer)?;

            images.push(screen.clone());
            delays.push(frame.delay);

            match frame.dispose {
                gif::DisposalMethod::Background => clear_rect(&mut screen, rect),
                gif::DisposalMethod::Previous => {
                    if let Some(prev) = saved {
                        screen = prev;
                    }
                }
                gif::DisposalMethod::Keep | gif::DisposalMethod::Any => {}
            }
        }

        if images.is_empty() {
            return Err(MatrixError::decode("gif contains no frames"));
        }

        let loop_count = match decoder.repeat() {
            gif::Repeat::Infinite => 0,
            gif::Repeat::Finite(0) => 1,
            gif::Repeat::Finite(n) => u32::from(n),
        };

        tracing::debug!(
            frames = images.len(),
            width = sw,
            height = sh,
            loop_count,
            "decoded gif"
        );
        Ok(DecodedFrames {
            images,
            delays,
            loop_count,
        })
    }
}

#[derive(Clone, Copy, Debug)]
struct FrameRect {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
}

/// Draw a frame's RGBA sub-image onto the logical screen. Transparent pixels leave the screen
/// untouched; anything outside the screen is clipped.
fn paint_frame(screen: &mut RgbaImage, rect: FrameRect, rgba: &[u8]) -> MatrixResult<()> {
    let expected = rect.width as usize * rect.height as usize * 4;
    if rgba.len() != expected {
        return Err(MatrixError::decode(format!(
            "gif frame buffer has {} bytes, expected {expected}",
            rgba.len()
        )));
    }

    for (i, px) in rgba.chunks_exact(4).enumerate() {
        if px[3] == 0 {
            continue;
        }
        let x = rect.left + i as u32 % rect.width;
        let y = rect.top + i as u32 / rect.width;
        if x < screen.width() && y < screen.height() {
            screen.put_pixel(x, y, Rgba([px[0], px[1], px[2], px[3]]));
        }
    }
    Ok(())
}

fn clear_rect(screen: &mut RgbaImage, rect: FrameRect) {
    let x_end = (rect.left + rect.width).min(screen.width());
    let y_end = (rect.top + rect.height).min(screen.height());
    for y in rect.top..y_end {
        for x in rect.left..x_end {
            screen.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
}

/// Decode a GIF with [`GifFrameDecoder`] into a playable sequence.
pub fn decode_gif(reader: &mut dyn Read) -> MatrixResult<FrameSequence> {
    GifFrameDecoder.decode(reader)?.into_sequence()
}

#[cfg(test)]
#[path = "../../tests/unit/playback/decode.rs"]
mod tests;
