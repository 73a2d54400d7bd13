use bytemuck::{cast_slice, cast_slice_mut};
use tiny_skia::Pixmap;

/// Packs a straight RGBA colour into one premultiplied pixel word.
pub fn premultiplied_word(rgba: [u8; 4]) -> u32 {
    let a = rgba[3] as u32;
    let mul = |c: u8| (c as u32 * a + 127) / 255;
    (a << 24) | (mul(rgba[2]) << 16) | (mul(rgba[1]) << 8) | mul(rgba[0])
}

pub fn fill(canvas: &mut Pixmap, rgba: [u8; 4]) {
    let word = premultiplied_word(rgba);
    cast_slice_mut::<u8, u32>(canvas.data_mut()).fill(word);
}

/// Source-over composite of `src` onto `dst` with its top-left at `(x, y)`.
/// Parts outside `dst` are clipped. Returns the touched area as
/// `(x, y, w, h)`, or `None` when nothing overlaps.
pub fn blit_over(dst: &mut Pixmap, src: &Pixmap, x: i32, y: i32) -> Option<(u32, u32, u32, u32)> {
    let (sw, sh) = (src.width() as i32, src.height() as i32);
    let (dw, dh) = (dst.width() as i32, dst.height() as i32);
    if x + sw <= 0 || y + sh <= 0 || x >= dw || y >= dh {
        return None;
    }

    let dst_x = x.max(0) as usize;
    let dst_y = y.max(0) as usize;
    let src_x = (-x).max(0) as usize;
    let src_y = (-y).max(0) as usize;
    let copy_w = (sw as usize - src_x).min(dw as usize - dst_x);
    let copy_h = (sh as usize - src_y).min(dh as usize - dst_y);

    let src_stride = sw as usize;
    let dst_stride = dw as usize;
    let src_px: &[u32] = cast_slice(src.data());
    let dst_px: &mut [u32] = cast_slice_mut(dst.data_mut());

    for row in 0..copy_h {
        let s_off = (src_y + row) * src_stride + src_x;
        let d_off = (dst_y + row) * dst_stride + dst_x;
        let s_row = &src_px[s_off..s_off + copy_w];
        let d_row = &mut dst_px[d_off..d_off + copy_w];

        if s_row.iter().all(|&s| s >> 24 == 0xFF) {
            d_row.copy_from_slice(s_row);
            continue;
        }
        for (d, &s) in d_row.iter_mut().zip(s_row) {
            *d = over(s, *d);
        }
    }

    Some((dst_x as u32, dst_y as u32, copy_w as u32, copy_h as u32))
}

// premultiplied: out = src + dst * (1 - src.a)
fn over(s: u32, d: u32) -> u32 {
    let sa = s >> 24;
    if sa == 0 {
        return d;
    }
    if sa == 0xFF {
        return s;
    }
    let inv = 255 - sa;
    let channel = |shift: u32| {
        let sc = (s >> shift) & 0xFF;
        let dc = (d >> shift) & 0xFF;
        (sc + (dc * inv + 127) / 255).min(255)
    };
    (channel(24) << 24) | (channel(16) << 16) | (channel(8) << 8) | channel(0)
}

/// Copies the finished canvas into the presentation buffer (RGBA8).
pub fn copy_to_frame(canvas: &Pixmap, frame: &mut [u8]) -> bool {
    let data = canvas.data();
    if frame.len() != data.len() {
        return false;
    }
    frame.copy_from_slice(data);
    true
}
