//! Text shaping for overlay panels.
//!
//! A [`TextEngine`] owns the Parley font and layout contexts for one job.
//! The overlay font is registered once at construction and every layout in
//! the job resolves against that single family, so panel text cannot drift
//! between frames if the host fontconfig changes mid-render.

use std::path::{Path, PathBuf};

use crate::foundation::error::{TrackburnError, TrackburnResult};

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TextBrush {
    /// Red channel.
    pub(crate) r: u8,
    /// Green channel.
    pub(crate) g: u8,
    /// Blue channel.
    pub(crate) b: u8,
    /// Alpha channel.
    pub(crate) a: u8,
}

impl TextBrush {
    pub(crate) const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Stateful helper for shaping panel text from one registered font.
pub(crate) struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl TextEngine {
    /// Registers `font_bytes` and keeps the first family it provides.
    pub(crate) fn new(font_bytes: Vec<u8>) -> TrackburnResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            TrackburnError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| TrackburnError::validation("registered font family has no name"))?
            .to_string();
        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
        })
    }

    /// The registered font in the form the glyph rasterizer consumes.
    pub(crate) fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Shape and lay out plain text in the registered family.
    ///
    /// With `max_width_px` the text wraps and aligns inside that width;
    /// without it the layout is a single unbroken line whose `width()` is
    /// used by callers to center or right-align.
    pub(crate) fn layout(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrush,
        max_width_px: Option<f32>,
    ) -> TrackburnResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(TrackburnError::validation("text size_px must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        if let Some(w) = max_width_px {
            layout.break_all_lines(Some(w));
            layout.align(
                Some(w),
                parley::Alignment::Start,
                parley::AlignmentOptions::default(),
            );
        } else {
            layout.break_all_lines(None);
        }

        Ok(layout)
    }
}

/// Well-known sans-serif font locations probed when no font is configured.
const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First overlay font present on this host, if any.
pub fn default_font_path() -> Option<PathBuf> {
    FONT_SEARCH_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Resolves the configured font path, falling back to the host defaults.
pub fn resolve_font_path(configured: Option<&Path>) -> TrackburnResult<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(TrackburnError::validation(format!(
            "overlay font not found: {}",
            path.display()
        )));
    }
    default_font_path().ok_or_else(|| {
        TrackburnError::validation(
            "no overlay font found; set the font path to a .ttf/.otf file",
        )
    })
}
