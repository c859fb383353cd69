//! Text measurement for scene labels.

use std::{
    fmt,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use log::info;

/// Measures rendered text width in scene units.
pub trait TextMeasure: Send + Sync + fmt::Debug {
    fn text_width(&self, text: &str, font_name: &str, font_size: f32) -> f32;
}

/// Width estimate from the character count.
///
/// Used when no font data is at hand and in tests, where results must not
/// depend on the fonts installed on the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateMeasure;

impl TextMeasure for ApproximateMeasure {
    fn text_width(&self, text: &str, _font_name: &str, font_size: f32) -> f32 {
        approximate_width(text, font_size)
    }
}

fn approximate_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.55
}

/// Shapes text with `cosmic-text` against the system fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosmicTextMeasure;

impl TextMeasure for CosmicTextMeasure {
    fn text_width(&self, text: &str, font_name: &str, font_size: f32) -> f32 {
        TEXT_MANAGER
            .get_or_init(TextManager::new)
            .text_width(text, font_name, font_size)
    }
}

/// The default measure.
pub fn default_measure() -> Arc<dyn TextMeasure> {
    Arc::new(CosmicTextMeasure)
}

/// Owns the shared `FontSystem`; loading the system fonts is expensive.
struct TextManager {
    font_system: Arc<Mutex<FontSystem>>,
}

impl fmt::Debug for TextManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextManager").finish_non_exhaustive()
    }
}

impl TextManager {
    fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Arc::new(Mutex::new(FontSystem::new())),
        }
    }

    /// Width of the widest line of `text` at `font_size` points.
    fn text_width(&self, text: &str, font_name: &str, font_size: f32) -> f32 {
        if text.is_empty() {
            return 0.0;
        }

        let mut font_system = self.font_system.lock().unwrap_or_else(PoisonError::into_inner);

        // Points to pixels at standard DPI.
        let font_size_px = font_size * 1.33;
        let metrics = Metrics::new(font_size_px, font_size_px * 1.15);

        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);
        let attrs = Attrs::new().family(Family::Name(font_name));
        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let width = buffer
            .layout_runs()
            .filter_map(|run| run.glyphs.last().map(|glyph| glyph.x + glyph.w))
            .fold(0.0_f32, f32::max);
        if width > 0.0 {
            width
        } else {
            approximate_width(text, font_size_px)
        }
    }
}

static TEXT_MANAGER: OnceLock<TextManager> = OnceLock::new();
