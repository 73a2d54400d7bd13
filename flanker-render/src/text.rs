use ab_glyph::{Font, FontArc, Glyph, PxScale, ScaleFont, point};
use std::collections::HashMap;
use std::sync::Arc;
use string_cache::DefaultAtom as Atom;
use tiny_skia::{Pixmap, PremultipliedColorU8};

const TAB: &str = "    ";

fn layout(font: &FontArc, size: f32, text: &str) -> (Vec<Glyph>, f32) {
    let scale = PxScale::from(size);
    let sf = font.as_scaled(scale);
    let mut pen_x = 0.0f32;
    let mut glyphs: Vec<Glyph> = Vec::new();
    for ch in text.replace('\t', TAB).chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }
    (glyphs, pen_x)
}

/// Advance width of a single line.
pub fn measure(font: &FontArc, size: f32, text: &str) -> f32 {
    layout(font, size, text).1
}

pub fn line_height(font: &FontArc, size: f32) -> f32 {
    let sf = font.as_scaled(PxScale::from(size));
    sf.height() + sf.line_gap()
}

/// Rasterises one line into a transparent pixmap the size of its line box,
/// baseline at the ascent. `None` for text without visible glyphs.
pub fn render_text_pixmap(
    text: &str,
    font_size: f32,
    font: &FontArc,
    color: [u8; 4],
) -> Option<Pixmap> {
    let (glyphs, advance) = layout(font, font_size, text);
    let sf = font.as_scaled(PxScale::from(font_size));
    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlines.is_empty() {
        return None;
    }

    let ink_right = outlines
        .iter()
        .map(|o| o.px_bounds().max.x)
        .fold(advance, f32::max);
    let w = ink_right.ceil().max(1.0) as u32;
    let h = (sf.ascent() - sf.descent()).ceil().max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();
    let alpha = color[3] as f32 / 255.0;

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x).floor() as i32;
            let iy = (y as f32 + b.min.y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            let a = (cov * alpha).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let premul = |c: u8| (c as f32 * a) as u8;
            let bg = dst[i];
            // glyphs may overlap, keep the stronger coverage
            if bg.alpha() >= sa {
                return;
            }
            if let Some(px) =
                PremultipliedColorU8::from_rgba(premul(color[0]), premul(color[1]), premul(color[2]), sa)
            {
                dst[i] = px;
            }
        });
    }
    Some(pm)
}

/// Greedy word wrap. Explicit newlines are kept, blank lines included; a
/// word wider than `max_width` gets a line of its own.
pub fn wrap_lines<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    for paragraph in text.trim_end_matches('\n').split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    text: Atom,
    size_bits: u32,
    color: [u8; 4],
}

/// Rasterised lines keyed by interned text, size and colour. Stimuli,
/// labels and instruction lines repeat every trial, so each is rendered once.
pub struct TextCache {
    font: FontArc,
    map: HashMap<TextKey, Option<Arc<Pixmap>>>,
}

impl TextCache {
    pub fn new(font: FontArc) -> Self {
        Self {
            font,
            map: HashMap::new(),
        }
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get_or_render(&mut self, text: &str, size: f32, color: [u8; 4]) -> Option<Arc<Pixmap>> {
        let key = TextKey {
            text: Atom::from(text),
            size_bits: size.to_bits(),
            color,
        };
        if let Some(hit) = self.map.get(&key) {
            return hit.clone();
        }
        let pm = render_text_pixmap(text, size, &self.font, color).map(Arc::new);
        self.map.insert(key, pm.clone());
        pm
    }
}
