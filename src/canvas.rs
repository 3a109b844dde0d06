use image::{GenericImageView, Rgba, RgbaImage};

use crate::foundation::core::{Rect, Rgb8};
use crate::foundation::error::MatrixResult;
use crate::matrix::Matrix;

/// 2-D coordinate view over a [`Matrix`].
///
/// `(x, y)` maps to the linear position `x + y * width`: row-major, top-left origin, the same
/// order the matrix uses. Width and height are fetched from the matrix once, at construction.
pub struct Canvas<M: Matrix = Box<dyn Matrix>> {
    width: usize,
    height: usize,
    matrix: M,
    closed: bool,
}

impl<M: Matrix> Canvas<M> {
    /// Wrap `matrix`, caching its geometry.
    pub fn new(mut matrix: M) -> MatrixResult<Self> {
        let g = matrix.geometry()?;
        Ok(Self {
            width: g.width,
            height: g.height,
            matrix,
            closed: false,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The whole drawable area, anchored at the origin.
    pub fn bounds(&self) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        }
    }

    /// Color at `(x, y)`.
    ///
    /// # Panics
    ///
    /// When `(x, y)` is outside [`Canvas::bounds`].
    pub fn at(&self, x: usize, y: usize) -> Rgb8 {
        self.matrix.at(self.position(x, y))
    }

    /// Write `color` at `(x, y)`. Visible after the next render.
    ///
    /// # Panics
    ///
    /// When `(x, y)` is outside [`Canvas::bounds`].
    pub fn set(&mut self, x: usize, y: usize, color: Rgb8) {
        let pos = self.position(x, y);
        self.matrix.set(pos, color);
    }

    fn position(&self, x: usize, y: usize) -> usize {
        assert!(
            self.bounds().contains(x, y),
            "canvas coordinate ({x}, {y}) out of bounds {}x{}",
            self.width,
            self.height
        );
        x + y * self.width
    }

    /// Composite `img` over the canvas with its top-left corner at the origin.
    ///
    /// The image is clipped to the canvas; canvas pixels it does not cover are left as they
    /// are.
    pub fn draw_image(&mut self, img: &RgbaImage) {
        let w = self.width.min(img.width() as usize);
        let h = self.height.min(img.height() as usize);
        for y in 0..h {
            for x in 0..w {
                let src = *img.get_pixel(x as u32, y as u32);
                let pos = x + y * self.width;
                let dst = self.matrix.at(pos);
                self.matrix.set(pos, dst.blend_over(src));
            }
        }
    }

    /// Commit pending writes to the output.
    pub fn render(&mut self) -> MatrixResult<()> {
        self.matrix.render()
    }

    /// Set every pixel to black and render once.
    pub fn clear(&mut self) -> MatrixResult<()> {
        for pos in 0..self.width * self.height {
            self.matrix.set(pos, Rgb8::BLACK);
        }
        self.matrix.render()
    }

    /// Blank the output, then close the matrix.
    ///
    /// The matrix is closed even if blanking fails. A close failure takes priority in the
    /// returned error; otherwise a blanking failure is returned. Closing twice is a no-op.
    pub fn close(&mut self) -> MatrixResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let cleared = self.clear();
        if let Err(e) = &cleared {
            tracing::warn!(error = %e, "blanking before close failed");
        }
        self.matrix.close()?;
        cleared
    }

    /// Whether [`Canvas::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Borrow the wrapped matrix.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }

    /// Mutably borrow the wrapped matrix.
    pub fn matrix_mut(&mut self) -> &mut M {
        &mut self.matrix
    }

    /// Unwrap the matrix without closing it.
    pub fn into_inner(self) -> M {
        self.matrix
    }
}

impl<M: Matrix> GenericImageView for Canvas<M> {
    type Pixel = Rgba<u8>;

    fn dimensions(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    fn get_pixel(&self, x: u32, y: u32) -> Self::Pixel {
        self.at(x as usize, y as usize).to_rgba()
    }
}

#[cfg(test)]
#[path = "../tests/unit/canvas/canvas.rs"]
mod tests;
