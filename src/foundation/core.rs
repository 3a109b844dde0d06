use image::Rgba;

/// 24-bit RGB color, the only color model a matrix stores.
///
/// On the wire it travels as a packed `0xRRGGBB` integer.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(from = "u32", into = "u32")]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// The blank color.
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Full white.
    pub const WHITE: Self = Self::new(255, 255, 255);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into `0xRRGGBB`.
    pub fn to_u32(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }

    /// Unpack from `0xRRGGBB`; the top byte is ignored.
    pub fn from_u32(v: u32) -> Self {
        Self {
            r: ((v >> 16) & 0xff) as u8,
            g: ((v >> 8) & 0xff) as u8,
            b: (v & 0xff) as u8,
        }
    }

    /// Opaque RGBA view of this color.
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }

    /// Composite `src` over this color and return the result.
    ///
    /// The destination is always opaque, so this reduces to a per-channel lerp on the source
    /// alpha.
    pub fn blend_over(self, src: Rgba<u8>) -> Self {
        fn lerp(dst: u8, src: u8, a: u16) -> u8 {
            let v = u16::from(src) * a + u16::from(dst) * (255 - a);
            ((v + 127) / 255) as u8
        }

        let [r, g, b, a] = src.0;
        match a {
            0 => self,
            255 => Self::new(r, g, b),
            a => {
                let a = u16::from(a);
                Self::new(lerp(self.r, r, a), lerp(self.g, g, a), lerp(self.b, b, a))
            }
        }
    }
}

impl From<u32> for Rgb8 {
    fn from(v: u32) -> Self {
        Self::from_u32(v)
    }
}

impl From<Rgb8> for u32 {
    fn from(c: Rgb8) -> Self {
        c.to_u32()
    }
}

impl From<Rgba<u8>> for Rgb8 {
    fn from(px: Rgba<u8>) -> Self {
        let [r, g, b, _] = px.0;
        Self::new(r, g, b)
    }
}

impl From<image::Rgb<u8>> for Rgb8 {
    fn from(px: image::Rgb<u8>) -> Self {
        let [r, g, b] = px.0;
        Self::new(r, g, b)
    }
}

/// Matrix dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Geometry {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl Geometry {
    /// Create a geometry value.
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of addressable positions.
    pub fn len(self) -> usize {
        self.width * self.height
    }

    /// Return `true` when the surface has no pixels.
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// A fresh all-black frame buffer of this size.
    pub fn blank_frame(self) -> Vec<Rgb8> {
        vec![Rgb8::BLACK; self.len()]
    }
}

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: usize,
    /// Top edge.
    pub y: usize,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl Rect {
    /// Return `true` when `(x, y)` lies inside the rectangle.
    pub fn contains(self, x: usize, y: usize) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
