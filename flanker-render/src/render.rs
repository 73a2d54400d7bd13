use crate::blit::{blit_over, copy_to_frame, fill};
use crate::scene::{Scene, SceneItem};
use crate::text::{TextCache, line_height, measure, wrap_lines};
use ab_glyph::FontArc;
use anyhow::{Context, Result, anyhow, bail};
use flanker_core::{Color, StyleConfig};
use flanker_timing::{HighPrecisionTimer, Timer};
use std::path::Path;
use std::time::Duration;
use tiny_skia::{Paint, Pixmap, Rect, Transform};

/// Share of the screen width instruction text may use.
const TEXT_WIDTH: f32 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub items: usize,
}

pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontArc::try_from_vec(bytes).map_err(|e| anyhow!("parsing font {}: {e}", path.display()))
}

/// Cross of two bars, `size` pixels across.
pub fn fixation_pixmap(size: f32, color: Color) -> Option<Pixmap> {
    let extent = size.max(1.0).round();
    let bar = (extent / 10.0).round().max(2.0);
    let mut pm = Pixmap::new(extent as u32, extent as u32)?;

    let [r, g, b, a] = color.rgba();
    let mut paint = Paint::default();
    paint.anti_alias = false;
    paint.set_color_rgba8(r, g, b, a);

    let offset = ((extent - bar) * 0.5).floor();
    let h = Rect::from_xywh(0.0, offset, extent, bar)?;
    let v = Rect::from_xywh(offset, 0.0, bar, extent)?;
    pm.fill_rect(h, &paint, Transform::identity(), None);
    pm.fill_rect(v, &paint, Transform::identity(), None);
    Some(pm)
}

/// Software renderer: composes a [`Scene`] on a tiny-skia canvas and copies
/// it into the presentation buffer.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    style: StyleConfig,
    canvas: Pixmap,
    fixation: Option<Pixmap>,
    text_cache: TextCache,
    timer: HighPrecisionTimer,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, style: StyleConfig) -> Result<Self> {
        let font = load_font(Path::new(&style.font_path))?;
        Self::with_font(width, height, style, font)
    }

    pub fn with_font(width: u32, height: u32, style: StyleConfig, font: FontArc) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        Ok(Self {
            width,
            height,
            fixation: fixation_pixmap(style.fix_cross_size, style.fix_cross_color),
            style,
            canvas,
            text_cache: TextCache::new(font),
            timer: HighPrecisionTimer::new(),
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn center(&self) -> (f32, f32) {
        (self.width as f32 * 0.5, self.height as f32 * 0.5)
    }

    fn blit_centered(canvas: &mut Pixmap, pm: &Pixmap, cx: f32, cy: f32) {
        let x = (cx - pm.width() as f32 * 0.5).floor() as i32;
        let y = (cy - pm.height() as f32 * 0.5).floor() as i32;
        blit_over(canvas, pm, x, y);
    }

    fn draw_line(&mut self, text: &str, size: f32, color: Color, pos: (f32, f32)) {
        if let Some(pm) = self.text_cache.get_or_render(text, size, color.rgba()) {
            Self::blit_centered(&mut self.canvas, &pm, pos.0, pos.1);
        }
    }

    fn draw_block(&mut self, text: &str) {
        let size = self.style.text_size;
        let color = self.style.stim_color;
        let font = self.text_cache.font().clone();
        let max_width = self.width as f32 * TEXT_WIDTH;
        let lines = wrap_lines(text, max_width, |line| measure(&font, size, line));
        let step = line_height(&font, size);

        let (cx, cy) = self.center();
        let top = cy - step * lines.len() as f32 * 0.5 + step * 0.5;
        for (i, line) in lines.iter().enumerate() {
            self.draw_line(line, size, color, (cx, top + step * i as f32));
        }
    }

    fn draw_item(&mut self, item: &SceneItem) {
        let center = self.center();
        match item {
            SceneItem::Fixation => {
                if let Some(cross) = &self.fixation {
                    Self::blit_centered(&mut self.canvas, cross, center.0, center.1);
                }
            }
            SceneItem::Stimulus(text) => {
                self.draw_line(text, self.style.stim_size, self.style.stim_color, center)
            }
            SceneItem::Feedback(text) => {
                self.draw_line(text, self.style.feedback_size, self.style.stim_color, center)
            }
            SceneItem::Reminder => {
                let text = self.style.reminder_text.clone();
                let size = self.style.reminder_size;
                let y = self.height as f32 - size * 2.0;
                self.draw_line(&text, size, Color::DIM_GRAY, (center.0, y));
            }
            SceneItem::Text(text) => self.draw_block(text),
        }
    }

    /// Draws `scene` over the background and copies the result to `frame`.
    pub fn render(&mut self, scene: &Scene, frame: &mut [u8]) -> Result<FrameStats> {
        let t0 = self.timer.now();
        fill(&mut self.canvas, self.style.background_color.rgba());
        for item in scene.items() {
            self.draw_item(item);
        }
        let draw = self.timer.elapsed(t0);

        let t1 = self.timer.now();
        if !copy_to_frame(&self.canvas, frame) {
            bail!(
                "frame buffer holds {} bytes, canvas {}x{} needs {}",
                frame.len(),
                self.width,
                self.height,
                self.canvas.data().len()
            );
        }
        let copy = self.timer.elapsed(t1);

        Ok(FrameStats {
            draw,
            copy,
            total: draw + copy,
            items: scene.items().len(),
        })
    }

    /// Rasterises the texts a session will show so the first trial does not
    /// pay for glyph rendering.
    pub fn prewarm<'a>(&mut self, stimuli: impl IntoIterator<Item = &'a str>, labels: &[&str]) {
        let style = self.style.clone();
        for s in stimuli {
            self.text_cache
                .get_or_render(s, style.stim_size, style.stim_color.rgba());
        }
        for l in labels {
            self.text_cache
                .get_or_render(l, style.feedback_size, style.stim_color.rgba());
        }
        self.text_cache.get_or_render(
            &style.reminder_text,
            style.reminder_size,
            Color::DIM_GRAY.rgba(),
        );
    }

    pub fn cached_texts(&self) -> usize {
        self.text_cache.len()
    }
}
