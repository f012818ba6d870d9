// Software drawing on a FrameBuffer: packed pixel helpers, source-over
// blending and a tiny 5x7 bitmap font for the watermark.

use crate::types::FrameBuffer;

/// Pack straight RGBA into the surface format (0xAARRGGBB).
#[inline]
pub fn pack_argb([r, g, b, a]: [u8; 4]) -> u32 {
    u32::from_be_bytes([a, r, g, b])
}

#[inline]
pub fn unpack_argb(px: u32) -> [u8; 4] {
    let [a, r, g, b] = px.to_be_bytes();
    [r, g, b, a]
}

/// Source-over in sRGB space with straight alpha, like a 2D canvas.
/// `opacity` multiplies the source alpha (globalAlpha).
pub fn blend_over(dst: u32, src: [u8; 4], opacity: f32) -> u32 {
    let sa = src[3] as f32 / 255.0 * opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return dst;
    }
    let d = unpack_argb(dst);
    let da = d[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= f32::EPSILON {
        return 0;
    }

    let blend = |s: u8, d: u8| -> u8 {
        (((s as f32 * sa) + (d as f32 * da * (1.0 - sa))) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    pack_argb([
        blend(src[0], d[0]),
        blend(src[1], d[1]),
        blend(src[2], d[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Blend one pixel onto the framebuffer if (x,y) is inside bounds.
#[inline]
pub fn blend_pixel(fb: &mut FrameBuffer, x: i32, y: i32, src: [u8; 4], opacity: f32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = blend_over(fb.pixels[idx], src, opacity);
}

/* ---------- 5x7 bitmap font ---------- */

pub const GLYPH_W: i32 = 5;
pub const GLYPH_H: i32 = 7;
const ADVANCE: i32 = GLYPH_W + 1; // 1 pixel spacing

/// Return a 5x7 glyph bitmap.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'a' => g!(0b00000,0b00000,0b01110,0b00001,0b01111,0b10001,0b01111),
        'b' => g!(0b10000,0b10000,0b10110,0b11001,0b10001,0b10001,0b11110),
        'c' => g!(0b00000,0b00000,0b01110,0b10000,0b10000,0b10001,0b01110),
        'd' => g!(0b00001,0b00001,0b01101,0b10011,0b10001,0b10001,0b01111),
        'e' => g!(0b00000,0b00000,0b01110,0b10001,0b11111,0b10000,0b01110),
        'f' => g!(0b00110,0b01001,0b01000,0b11100,0b01000,0b01000,0b01000),
        'g' => g!(0b00000,0b01111,0b10001,0b10001,0b01111,0b00001,0b01110),
        'h' => g!(0b10000,0b10000,0b10110,0b11001,0b10001,0b10001,0b10001),
        'i' => g!(0b00100,0b00000,0b01100,0b00100,0b00100,0b00100,0b01110),
        'j' => g!(0b00010,0b00000,0b00110,0b00010,0b00010,0b10010,0b01100),
        'k' => g!(0b10000,0b10000,0b10010,0b10100,0b11000,0b10100,0b10010),
        'l' => g!(0b01100,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'm' => g!(0b00000,0b00000,0b11010,0b10101,0b10101,0b10001,0b10001),
        'n' => g!(0b00000,0b00000,0b10110,0b11001,0b10001,0b10001,0b10001),
        'o' => g!(0b00000,0b00000,0b01110,0b10001,0b10001,0b10001,0b01110),
        'p' => g!(0b00000,0b00000,0b11110,0b10001,0b11110,0b10000,0b10000),
        'q' => g!(0b00000,0b00000,0b01101,0b10011,0b01111,0b00001,0b00001),
        'r' => g!(0b00000,0b00000,0b10110,0b11001,0b10000,0b10000,0b10000),
        's' => g!(0b00000,0b00000,0b01110,0b10000,0b01110,0b00001,0b11110),
        't' => g!(0b01000,0b01000,0b11100,0b01000,0b01000,0b01001,0b00110),
        'u' => g!(0b00000,0b00000,0b10001,0b10001,0b10001,0b10011,0b01101),
        'v' => g!(0b00000,0b00000,0b10001,0b10001,0b10001,0b01010,0b00100),
        'w' => g!(0b00000,0b00000,0b10001,0b10001,0b10101,0b10101,0b01010),
        'x' => g!(0b00000,0b00000,0b10001,0b01010,0b00100,0b01010,0b10001),
        'y' => g!(0b00000,0b00000,0b10001,0b10001,0b01111,0b00001,0b01110),
        'z' => g!(0b00000,0b00000,0b11111,0b00010,0b00100,0b01000,0b11111),

        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '_' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b11111),
        '@' => g!(0b01110,0b10001,0b10111,0b10101,0b10111,0b10000,0b01110),

        _ => None,
    }
}

/// Size in pixels of `text` at an integer `scale`, without trailing spacing.
/// Unknown characters still take up one cell.
pub fn text_size(text: &str, scale: i32) -> (i32, i32) {
    let n = text.chars().count() as i32;
    if n == 0 {
        return (0, 0);
    }
    ((n * ADVANCE - 1) * scale, GLYPH_H * scale)
}

/// Draw a string with its top-left cell at (x,y), each font pixel a
/// `scale`×`scale` block blended at `opacity`.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, rgb: [u8; 3], scale: i32, opacity: f32) {
    let src = [rgb[0], rgb[1], rgb[2], 255];
    for ch in text.chars() {
        if let Some(rows) = glyph5x7(ch) {
            for (ry, rowbits) in rows.iter().enumerate() {
                for rx in 0..GLYPH_W {
                    if (rowbits & (1 << (4 - rx))) == 0 { continue; }
                    let px = x + rx * scale;
                    let py = y + ry as i32 * scale;
                    for sy in 0..scale {
                        for sx in 0..scale {
                            blend_pixel(fb, px + sx, py + sy, src, opacity);
                        }
                    }
                }
            }
        }
        x += ADVANCE * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_red_over_gray() {
        let dst = pack_argb([100, 100, 100, 255]);
        let out = blend_over(dst, [200, 0, 0, 128], 1.0);
        assert_eq!(unpack_argb(out), [150, 50, 50, 255]);
    }

    #[test]
    fn opacity_over_transparent_keeps_source_color() {
        let out = blend_over(0, [128, 128, 128, 255], 0.75);
        assert_eq!(unpack_argb(out), [128, 128, 128, 191]);
        assert_eq!(blend_over(0x12345678, [1, 2, 3, 0], 1.0), 0x12345678);
    }

    #[test]
    fn text_size_counts_cells() {
        assert_eq!(text_size("", 2), (0, 0));
        assert_eq!(text_size("ab", 1), (11, 7));
        assert_eq!(text_size("bolmaker", 2), ((8 * 6 - 1) * 2, 14));
    }

    #[test]
    fn text_is_clipped_at_edges() {
        let mut fb = FrameBuffer::new(4, 4);
        draw_text_5x7(&mut fb, -2, -2, "M", [255, 255, 255], 1, 1.0);
        // 'M' row 2 col 2 is set → lands on (0,0).
        assert_eq!(unpack_argb(fb.pixel(0, 0)), [255, 255, 255, 255]);
    }
}
