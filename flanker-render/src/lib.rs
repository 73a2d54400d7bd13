pub mod blit;
pub mod render;
pub mod scene;
pub mod text;

pub use render::{FrameStats, SkiaRenderer, fixation_pixmap, load_font};
pub use scene::{Scene, SceneItem};
pub use text::{TextCache, render_text_pixmap, wrap_lines};
