//! Pressed-effect compositing
//!
//! The composition engine (external) produces a button's rest-state
//! frame; this module derives the "pushed in" variant uploaded while
//! the key is held: the rest frame is shrunk by a size-proportional
//! inset, padded back out with an opaque black border, and any alpha
//! channel is dropped. Handlers cache the result so repeated redraws
//! while held (auto-repeat) cost nothing.

use alloc::vec;
use alloc::vec::Vec;

/// Per-side inset of the pressed effect, in percent of frame width.
pub const PRESS_INSET_PCT: u32 = 12;

/// Channel layout of a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelFormat {
    /// 3 bytes per pixel, R G B
    Rgb8,
    /// 4 bytes per pixel, R G B A
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Raw pixel buffer sized for one button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    /// Channel layout of `data`
    pub format: PixelFormat,
    /// Row-major pixel data, `width * height * bytes_per_pixel` bytes
    pub data: Vec<u8>,
}

impl Frame {
    /// Byte length `data` must have for the given dimensions and
    /// format.
    pub fn expected_len(width: u16, height: u16, format: PixelFormat) -> usize {
        width as usize * height as usize * format.bytes_per_pixel()
    }

    /// Create a frame, checking that `data` matches the dimensions.
    pub fn new(width: u16, height: u16, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        if data.len() != Self::expected_len(width, height, format) {
            return None;
        }
        Some(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Create an RGB frame filled with a single color.
    pub fn solid(width: u16, height: u16, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            format: PixelFormat::Rgb8,
            data,
        }
    }

    /// Read one pixel as RGB, ignoring any alpha channel.
    fn rgb_at(&self, x: usize, y: usize) -> [u8; 3] {
        let bpp = self.format.bytes_per_pixel();
        let off = (y * self.width as usize + x) * bpp;
        [self.data[off], self.data[off + 1], self.data[off + 2]]
    }
}

/// A render attempt for one button failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderError<E> {
    /// The composition engine rejected the image description
    Compose(E),
    /// The composition engine produced a frame of the wrong size
    WrongSize {
        /// Requested dimensions
        expected: (u16, u16),
        /// Dimensions actually produced
        got: (u16, u16),
    },
    /// The composition engine produced a buffer that does not match
    /// its claimed dimensions and format
    Malformed {
        /// Bytes required by the claimed dimensions
        expected: usize,
        /// Bytes actually produced
        got: usize,
    },
}

/// Derive the pressed-effect variant of a rest-state frame.
///
/// The inset is `round(width * 12%)` per side; the shrunk image is
/// centered on an opaque black background of the original size. The
/// output is always [`PixelFormat::Rgb8`].
pub fn pressed_frame(rest: &Frame) -> Frame {
    let w = rest.width as u32;
    let h = rest.height as u32;
    let inset = (w * PRESS_INSET_PCT + 50) / 100;
    let inner_w = w.saturating_sub(2 * inset).max(1) as u16;
    let inner_h = h.saturating_sub(2 * inset).max(1) as u16;

    let shrunk = scale_rgb(rest, inner_w, inner_h);

    let mut out = vec![0u8; w as usize * h as usize * 3];
    for row in 0..inner_h as usize {
        let dst_y = row + inset as usize;
        if dst_y >= h as usize {
            break;
        }
        let dst_off = (dst_y * w as usize + inset as usize) * 3;
        let src_off = row * inner_w as usize * 3;
        out[dst_off..dst_off + inner_w as usize * 3]
            .copy_from_slice(&shrunk.data[src_off..src_off + inner_w as usize * 3]);
    }

    Frame {
        width: rest.width,
        height: rest.height,
        format: PixelFormat::Rgb8,
        data: out,
    }
}

/// Resample `src` to `dst_w` x `dst_h` RGB using fixed-point bilinear
/// filtering (8 fractional bits). Alpha is dropped. Bilinear is a good
/// fit here because the pressed effect only shrinks mildly.
fn scale_rgb(src: &Frame, dst_w: u16, dst_h: u16) -> Frame {
    let sw = src.width as usize;
    let sh = src.height as usize;
    let dw = dst_w as usize;
    let dh = dst_h as usize;
    let mut data = Vec::with_capacity(dw * dh * 3);

    // Map a destination coordinate to a source coordinate with 8
    // fractional bits, endpoints aligned.
    let coord = |d: usize, dn: usize, sn: usize| -> (usize, usize, u32) {
        if dn <= 1 || sn <= 1 {
            return (0, 0, 0);
        }
        let fx = (d as u64 * (sn as u64 - 1) * 256 / (dn as u64 - 1)) as usize;
        let i0 = fx >> 8;
        let i1 = (i0 + 1).min(sn - 1);
        (i0, i1, (fx & 0xff) as u32)
    };

    for dy in 0..dh {
        let (y0, y1, fy) = coord(dy, dh, sh);
        for dx in 0..dw {
            let (x0, x1, fx) = coord(dx, dw, sw);
            let p00 = src.rgb_at(x0, y0);
            let p10 = src.rgb_at(x1, y0);
            let p01 = src.rgb_at(x0, y1);
            let p11 = src.rgb_at(x1, y1);
            for c in 0..3 {
                let top = p00[c] as u32 * (256 - fx) + p10[c] as u32 * fx;
                let bot = p01[c] as u32 * (256 - fx) + p11[c] as u32 * fx;
                let val = (top * (256 - fy) + bot * fy) >> 16;
                data.push(val as u8);
            }
        }
    }

    Frame {
        width: dst_w,
        height: dst_h,
        format: PixelFormat::Rgb8,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_frame_keeps_dimensions_and_drops_alpha() {
        let data = vec![200u8; 10 * 10 * 4];
        let rest = Frame::new(10, 10, PixelFormat::Rgba8, data).unwrap();
        let pressed = pressed_frame(&rest);
        assert_eq!(pressed.width, 10);
        assert_eq!(pressed.height, 10);
        assert_eq!(pressed.format, PixelFormat::Rgb8);
        assert_eq!(pressed.data.len(), 10 * 10 * 3);
    }

    #[test]
    fn pressed_frame_border_is_black_center_preserved() {
        let rest = Frame::solid(10, 10, [255, 255, 255]);
        let pressed = pressed_frame(&rest);
        // inset = round(10 * 0.12) = 1
        assert_eq!(pressed.rgb_at(0, 0), [0, 0, 0]);
        assert_eq!(pressed.rgb_at(9, 9), [0, 0, 0]);
        assert_eq!(pressed.rgb_at(0, 5), [0, 0, 0]);
        // Bilinear of a constant image is exact
        assert_eq!(pressed.rgb_at(5, 5), [255, 255, 255]);
        assert_eq!(pressed.rgb_at(1, 1), [255, 255, 255]);
    }

    #[test]
    fn inset_scales_with_width() {
        let rest = Frame::solid(72, 72, [10, 20, 30]);
        let pressed = pressed_frame(&rest);
        // inset = round(72 * 0.12) = 9
        assert_eq!(pressed.rgb_at(8, 36), [0, 0, 0]);
        assert_eq!(pressed.rgb_at(9, 36), [10, 20, 30]);
        assert_eq!(pressed.rgb_at(62, 36), [10, 20, 30]);
        assert_eq!(pressed.rgb_at(63, 36), [0, 0, 0]);
    }

    #[test]
    fn tiny_frames_do_not_panic() {
        let rest = Frame::solid(2, 2, [1, 2, 3]);
        let pressed = pressed_frame(&rest);
        assert_eq!(pressed.width, 2);
        assert_eq!(pressed.height, 2);
    }

    #[test]
    fn frame_new_rejects_bad_length() {
        assert!(Frame::new(4, 4, PixelFormat::Rgb8, vec![0; 47]).is_none());
        assert!(Frame::new(4, 4, PixelFormat::Rgb8, vec![0; 48]).is_some());
    }
}
