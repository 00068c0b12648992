use std::collections::HashMap;
use std::sync::Arc;

use kurbo::Shape;

use crate::assets::decode::{PreparedImage, unpremultiply_rgba8_in_place};
use crate::foundation::core::{Affine, BezPath, Rect, Rgba8};
use crate::foundation::error::{MaskError, MaskResult};
use crate::render::backend::{RasterBackend, RasterImage};
use crate::render::text::{rasterize_text, system_fontdb};
use crate::surface::scene::{ObjectKind, Scene, TextObject};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TextKey {
    text: String,
    size_bits: u64,
    fill: Rgba8,
}

#[derive(Clone)]
struct TextPaint {
    paint: vello_cpu::Image,
    w: u32,
    h: u32,
}

/// Keyed by the address of the image's pixel buffer; the cached `Arc` keeps that address alive.
struct ImageCacheEntry {
    _pixels: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

/// CPU raster backend powered by `vello_cpu` for paths/images and `resvg` for text.
pub struct CpuRasterizer {
    ctx: Option<vello_cpu::RenderContext>,
    fontdb: Option<Arc<usvg::fontdb::Database>>,
    text_cache: HashMap<TextKey, TextPaint>,
    image_cache: HashMap<usize, ImageCacheEntry>,
}

impl Default for CpuRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuRasterizer {
    pub fn new() -> Self {
        Self {
            ctx: None,
            fontdb: None,
            text_cache: HashMap::new(),
            image_cache: HashMap::new(),
        }
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> MaskResult<R>,
    ) -> MaskResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    fn image_paint_for(&mut self, img: &PreparedImage) -> MaskResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&img.rgba8_premul) as usize;
        if let Some(entry) = self.image_cache.get(&key) {
            return Ok(entry.paint.clone());
        }
        let paint = premul_to_image(&img.rgba8_premul, img.width, img.height)?;
        self.image_cache.insert(
            key,
            ImageCacheEntry {
                _pixels: Arc::clone(&img.rgba8_premul),
                paint: paint.clone(),
            },
        );
        Ok(paint)
    }

    /// Drop cached image paints no longer referenced by `scene`.
    fn prune_image_cache(&mut self, scene: &Scene) {
        let live: Vec<usize> = scene
            .objects()
            .iter()
            .filter_map(|o| match &o.kind {
                ObjectKind::Image(img) => Some(Arc::as_ptr(&img.image.rgba8_premul) as usize),
                _ => None,
            })
            .collect();
        self.image_cache.retain(|k, _| live.contains(k));
    }

    fn text_paint_for(&mut self, text: &TextObject) -> MaskResult<TextPaint> {
        let key = TextKey {
            text: text.text.clone(),
            size_bits: text.font_size.to_bits(),
            fill: text.fill,
        };
        if let Some(p) = self.text_cache.get(&key) {
            return Ok(p.clone());
        }

        let fontdb = self.fontdb.get_or_insert_with(system_fontdb).clone();
        let raster = rasterize_text(text, fontdb)?;
        let paint = TextPaint {
            paint: premul_to_image(&raster.rgba8_premul, raster.width, raster.height)?,
            w: raster.width,
            h: raster.height,
        };
        self.text_cache.insert(key, paint.clone());
        Ok(paint)
    }

    fn draw_object(
        &mut self,
        kind: &ObjectKind,
        ctx: &mut vello_cpu::RenderContext,
    ) -> MaskResult<()> {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match kind {
            ObjectKind::Image(obj) => {
                let img = &obj.image;
                let sx = obj.dest.width() / f64::from(img.width);
                let sy = obj.dest.height() / f64::from(img.height);
                let tr = Affine::translate(obj.dest.origin().to_vec2())
                    * Affine::scale_non_uniform(sx, sy);
                ctx.set_transform(affine_to_cpu(tr));
                ctx.set_paint(self.image_paint_for(img)?);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(img.width),
                    f64::from(img.height),
                ));
            }
            ObjectKind::Rect(obj) => {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(color_to_cpu(obj.fill));
                ctx.fill_rect(&rect_to_cpu(obj.rect));
            }
            ObjectKind::Circle(obj) => {
                let circle = kurbo::Circle::new(obj.center, obj.radius);
                let mut p = BezPath::new();
                for el in circle.path_elements(0.1) {
                    p.push(el);
                }
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(color_to_cpu(obj.fill));
                ctx.fill_path(&bezpath_to_cpu(&p));
            }
            ObjectKind::Text(obj) => {
                let t = self.text_paint_for(obj)?;
                ctx.set_transform(affine_to_cpu(Affine::translate(obj.origin.to_vec2())));
                ctx.set_paint(t.paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(t.w),
                    f64::from(t.h),
                ));
            }
            ObjectKind::Stroke(obj) => {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_stroke(
                    vello_cpu::kurbo::Stroke::new(obj.width)
                        .with_caps(vello_cpu::kurbo::Cap::Round)
                        .with_join(vello_cpu::kurbo::Join::Round),
                );
                ctx.set_paint(color_to_cpu(obj.paint));
                ctx.stroke_path(&bezpath_to_cpu(&obj.path));
            }
        }
        Ok(())
    }
}

impl RasterBackend for CpuRasterizer {
    fn rasterize(&mut self, scene: &Scene) -> MaskResult<RasterImage> {
        let size = scene.size();
        let w: u16 = size
            .width
            .try_into()
            .map_err(|_| MaskError::render("canvas width exceeds u16"))?;
        let h: u16 = size
            .height
            .try_into()
            .map_err(|_| MaskError::render("canvas height exceeds u16"))?;

        self.prune_image_cache(scene);
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        self.with_ctx_mut(w, h, |this, ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(color_to_cpu(scene.background()));
            ctx.fill_rect(&rect_to_cpu(size.rect()));

            for obj in scene.objects().iter().filter(|o| o.visible) {
                this.draw_object(&obj.kind, ctx)?;
            }

            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(())
        })?;

        let mut data = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut data);
        Ok(RasterImage {
            width: size.width,
            height: size.height,
            data,
        })
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> MaskResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| MaskError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| MaskError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(MaskError::render("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn premul_to_image(bytes: &[u8], width: u32, height: u32) -> MaskResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
