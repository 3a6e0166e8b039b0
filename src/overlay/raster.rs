//! Raster frames and the CPU painting surface.
//!
//! Panels are drawn with [`vello_cpu`] into premultiplied RGBA8 buffers.
//! The render context is reused across frames of a clip and reset between
//! draws; reallocating it per frame costs more than the draw itself for
//! panel-sized surfaces.

use crate::foundation::core::{Affine, BezPath, Point};
use crate::foundation::error::{TrackburnError, TrackburnResult};
use crate::overlay::text::TextBrush;

/// A straight (non-premultiplied) RGBA color.
pub(crate) type Rgba8 = [u8; 4];

/// A rendered frame: premultiplied RGBA8, row-major, tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data, `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl Raster {
    /// A zero-sized raster, produced by panels with nothing to show.
    pub fn empty() -> Self {
        Self { width: 0, height: 0, data: Vec::new() }
    }

    /// True when the raster has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The straight RGBA value at `(x, y)`, un-premultiplied for inspection.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = ((y * self.width + x) * 4) as usize;
        let [r, g, b, a]: [u8; 4] = self.data[at..at + 4].try_into().ok()?;
        if a == 0 {
            return Some([0, 0, 0, 0]);
        }
        let un = |c: u8| ((c as u16 * 255 + (a as u16 / 2)) / a as u16).min(255) as u8;
        Some([un(r), un(g), un(b), a])
    }
}

/// Reusable CPU painter. One instance serves every frame of a job.
pub(crate) struct Painter {
    ctx: Option<vello_cpu::RenderContext>,
}

impl Painter {
    pub(crate) fn new() -> Self {
        Self { ctx: None }
    }

    /// Runs `draw` against a cleared surface of the given size and returns
    /// the rendered frame. The underlying context is kept between calls and
    /// rebuilt only when the dimensions change.
    pub(crate) fn paint(
        &mut self,
        width: u32,
        height: u32,
        draw: impl FnOnce(&mut Surface<'_>),
    ) -> TrackburnResult<Raster> {
        let w: u16 = width
            .try_into()
            .map_err(|_| TrackburnError::validation(format!("panel width {width} out of range")))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| TrackburnError::validation(format!("panel height {height} out of range")))?;
        if w == 0 || h == 0 {
            return Ok(Raster::empty());
        }

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let mut surface = Surface { ctx: &mut ctx };
        draw(&mut surface);

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        let data = pixmap.data_as_u8_slice().to_vec();
        self.ctx = Some(ctx);

        Ok(Raster { width, height, data })
    }
}

/// Fill-only drawing surface handed to panel painters.
pub(crate) struct Surface<'a> {
    ctx: &'a mut vello_cpu::RenderContext,
}

impl Surface<'_> {
    /// Fills an arbitrary shape in a solid color.
    pub(crate) fn fill(&mut self, shape: &impl kurbo::Shape, color: Rgba8) {
        let path = shape_to_cpu(shape);
        self.set_solid(color);
        self.ctx.fill_path(&path);
    }

    /// Fills a pre-built path in a solid color.
    pub(crate) fn fill_path(&mut self, path: &BezPath, color: Rgba8) {
        let path = bezpath_to_cpu(path);
        self.set_solid(color);
        self.ctx.fill_path(&path);
    }

    /// Runs `draw` inside an opacity layer. `opacity` is clamped to `0..=1`.
    pub(crate) fn with_opacity(&mut self, opacity: f32, draw: impl FnOnce(&mut Surface<'_>)) {
        self.ctx.push_opacity_layer(opacity.clamp(0.0, 1.0));
        let mut inner = Surface { ctx: self.ctx };
        draw(&mut inner);
        self.ctx.pop_layer();
    }

    /// Paints a shaped text layout with its top-left corner at `origin`.
    /// Glyph colors come from the per-run brush recorded during layout.
    pub(crate) fn draw_layout(
        &mut self,
        layout: &parley::Layout<TextBrush>,
        font: &vello_cpu::peniko::FontData,
        origin: Point,
    ) {
        self.ctx.set_transform(affine_to_cpu(Affine::translate((origin.x, origin.y))));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    fn set_solid(&mut self, color: Rgba8) {
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color[0], color[1], color[2], color[3],
        ));
    }
}

fn affine_to_cpu(affine: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(affine.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    elements_to_cpu(path.elements().iter().copied())
}

fn shape_to_cpu(shape: &impl kurbo::Shape) -> vello_cpu::kurbo::BezPath {
    elements_to_cpu(shape.path_elements(0.1))
}

fn elements_to_cpu(elements: impl Iterator<Item = kurbo::PathEl>) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in elements {
        match el {
            kurbo::PathEl::MoveTo(p) => out.move_to((p.x, p.y)),
            kurbo::PathEl::LineTo(p) => out.line_to((p.x, p.y)),
            kurbo::PathEl::QuadTo(p1, p2) => out.quad_to((p1.x, p1.y), (p2.x, p2.y)),
            kurbo::PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to((p1.x, p1.y), (p2.x, p2.y), (p3.x, p3.y))
            }
            kurbo::PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/raster.rs"]
mod tests;
