use std::path::Path;

use anyhow::Context as _;

use crate::assets::decode::{PNG_MIME, PreparedImage, to_data_url};
use crate::assets::loader::{FsImageLoader, ImageLoader};
use crate::foundation::core::{CanvasSize, ObjectId, Point, Rect, Rgba8};
use crate::foundation::error::MaskResult;
use crate::palette::definition::{ColorDefinition, Palette};
use crate::render::backend::{BackendKind, RasterBackend, RasterImage, create_backend};
use crate::surface::brush::{DragState, FreehandBrush};
use crate::surface::config::SurfaceConfig;
use crate::surface::handle::SurfaceHandle;
use crate::surface::scene::{
    CanvasObject, CircleObject, ImageObject, ObjectKind, RectObject, Scene, TextObject,
};

const DEFAULT_RECT: Rect = Rect::new(100.0, 100.0, 200.0, 200.0);
const DEFAULT_RECT_FILL: Rgba8 = Rgba8::opaque(0x4F, 0x46, 0xE5);
const DEFAULT_CIRCLE_RADIUS: f64 = 50.0;
// Bounding box top-left, matching how the rectangle is positioned.
const DEFAULT_CIRCLE_ORIGIN: Point = Point::new(200.0, 200.0);
const DEFAULT_CIRCLE_FILL: Rgba8 = Rgba8::opaque(0x10, 0xB9, 0x81);
const DEFAULT_TEXT: &str = "Text";
const DEFAULT_TEXT_ORIGIN: Point = Point::new(100.0, 100.0);
const DEFAULT_TEXT_SIZE: f64 = 20.0;
const DEFAULT_TEXT_FILL: Rgba8 = Rgba8::opaque(0x11, 0x18, 0x27);

struct SurfaceState {
    handle: SurfaceHandle,
    scene: Scene,
    /// `Some` while annotation mode is active.
    brush: Option<FreehandBrush>,
    drag: Option<DragState>,
}

/// Owns one canvas: its object graph, the raster backend that draws it and the image loader
/// that feeds it.
///
/// Every operation that needs a live canvas is a silent no-op before [`DrawingSurface::initialize`]
/// and after [`DrawingSurface::dispose`]; callers that care check
/// [`DrawingSurface::is_initialized`].
pub struct DrawingSurface {
    config: SurfaceConfig,
    size: CanvasSize,
    palette: Palette,
    backend: Box<dyn RasterBackend>,
    loader: Box<dyn ImageLoader>,
    state: Option<SurfaceState>,
}

impl std::fmt::Debug for DrawingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingSurface")
            .field("size", &self.size)
            .field("initialized", &self.state.is_some())
            .field("objects", &self.objects().len())
            .finish_non_exhaustive()
    }
}

impl DrawingSurface {
    /// Build an uninitialized surface with the CPU backend and a filesystem image loader rooted
    /// at the working directory.
    pub fn new(config: SurfaceConfig) -> MaskResult<Self> {
        config.validate()?;
        Ok(Self {
            size: config.canvas_size()?,
            palette: config.palette(),
            config,
            backend: create_backend(BackendKind::Cpu),
            loader: Box::new(FsImageLoader::default()),
            state: None,
        })
    }

    pub fn with_backend(mut self, backend: Box<dyn RasterBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_loader(mut self, loader: Box<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    /// Bind to `handle`, create the scene and optionally load a background image scaled to fit.
    ///
    /// `on_ready` runs once loading has settled, also when no background was given or it failed
    /// to load. Calling this on an initialized surface does nothing.
    #[tracing::instrument(skip(self, handle, on_ready), fields(handle = handle.label()))]
    pub fn initialize(
        &mut self,
        handle: &SurfaceHandle,
        background_url: Option<&str>,
        on_ready: impl FnOnce(),
    ) {
        if self.state.is_some() {
            tracing::debug!("surface already initialized");
            return;
        }

        let mut scene = Scene::new(self.size, self.config.editing_background.0);
        if let Some(url) = background_url {
            match self.loader.load(url) {
                Ok(image) => {
                    let dest = fit_rect(self.size, &image);
                    scene.push(ObjectKind::Image(ImageObject { image, dest }));
                }
                Err(err) => tracing::warn!(%err, "background image failed to load"),
            }
        }

        handle.bind();
        self.state = Some(SurfaceState {
            handle: handle.clone(),
            scene,
            brush: None,
            drag: None,
        });
        on_ready();
    }

    /// Drop the scene and every object, releasing the host handle.
    pub fn dispose(&mut self) {
        if let Some(state) = self.state.take() {
            state.handle.release();
            tracing::debug!(
                objects = state.scene.objects().len(),
                "surface disposed"
            );
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.state.as_ref().map(|s| &s.scene)
    }

    /// Objects in paint order; empty when uninitialized.
    pub fn objects(&self) -> &[CanvasObject] {
        self.scene().map(Scene::objects).unwrap_or(&[])
    }

    pub fn stroke_count(&self) -> usize {
        self.scene().map_or(0, |s| s.strokes().count())
    }

    pub fn background(&self) -> Option<Rgba8> {
        self.scene().map(Scene::background)
    }

    pub fn add_rectangle(&mut self) -> Option<ObjectId> {
        self.push_object(ObjectKind::Rect(RectObject {
            rect: DEFAULT_RECT,
            fill: DEFAULT_RECT_FILL,
        }))
    }

    pub fn add_circle(&mut self) -> Option<ObjectId> {
        let r = DEFAULT_CIRCLE_RADIUS;
        self.push_object(ObjectKind::Circle(CircleObject {
            center: Point::new(DEFAULT_CIRCLE_ORIGIN.x + r, DEFAULT_CIRCLE_ORIGIN.y + r),
            radius: r,
            fill: DEFAULT_CIRCLE_FILL,
        }))
    }

    pub fn add_text(&mut self) -> Option<ObjectId> {
        self.push_object(ObjectKind::Text(TextObject {
            text: DEFAULT_TEXT.to_owned(),
            origin: DEFAULT_TEXT_ORIGIN,
            font_size: DEFAULT_TEXT_SIZE,
            fill: DEFAULT_TEXT_FILL,
        }))
    }

    fn push_object(&mut self, kind: ObjectKind) -> Option<ObjectId> {
        let state = self.state.as_mut()?;
        Some(state.scene.push(kind))
    }

    /// Toggle free-hand drawing.
    ///
    /// Enabling needs an active color and points the brush at that color's paint; disabling
    /// keeps every existing stroke.
    pub fn set_annotation_mode(&mut self, enabled: bool, color: Option<&ColorDefinition>) {
        let brush_width = self.config.brush_width;
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if !enabled {
            state.brush = None;
            state.drag = None;
            return;
        }
        let Some(color) = color else {
            tracing::debug!("annotation mode requested without an active color");
            return;
        };
        state.brush = Some(FreehandBrush::for_color(color, brush_width));
    }

    /// Point the brush at `color`; no-op unless annotation mode is active.
    pub fn update_brush_color(&mut self, color: &ColorDefinition) {
        if let Some(brush) = self.state.as_mut().and_then(|s| s.brush.as_mut()) {
            brush.retarget(color);
        }
    }

    pub fn annotation_mode(&self) -> bool {
        self.brush().is_some()
    }

    /// The free-hand brush while annotation mode is active.
    pub fn brush(&self) -> Option<&FreehandBrush> {
        self.state.as_ref().and_then(|s| s.brush.as_ref())
    }

    /// Start a drag. Ignored unless annotation mode is active.
    pub fn pointer_down(&mut self, p: Point) {
        if let Some(state) = self.state.as_mut()
            && state.brush.is_some()
        {
            state.drag = Some(DragState::start(p));
        }
    }

    pub fn pointer_move(&mut self, p: Point) {
        if let Some(drag) = self.state.as_mut().and_then(|s| s.drag.as_mut()) {
            drag.push(p);
        }
    }

    /// Finish the drag, turning it into a stroke painted with the brush as it is now.
    pub fn pointer_up(&mut self) -> Option<ObjectId> {
        let state = self.state.as_mut()?;
        let drag = state.drag.take()?;
        let stroke = state.brush.as_ref()?.finish(drag.points())?;
        Some(state.scene.push(ObjectKind::Stroke(stroke)))
    }

    /// One complete drag through `points`.
    pub fn draw_stroke(&mut self, points: &[Point]) -> Option<ObjectId> {
        let (&first, rest) = points.split_first()?;
        self.pointer_down(first);
        for &p in rest {
            self.pointer_move(p);
        }
        self.pointer_up()
    }

    /// Remove every annotation stroke, keeping content.
    pub fn clear_annotations(&mut self) -> usize {
        self.state
            .as_mut()
            .map_or(0, |s| s.scene.clear_strokes())
    }

    /// Rasterize the whole canvas as it is currently shown, strokes included.
    pub fn render(&mut self) -> MaskResult<Option<RasterImage>> {
        let Some(state) = self.state.as_ref() else {
            return Ok(None);
        };
        Ok(Some(self.backend.rasterize(&state.scene)?))
    }

    /// PNG `data:` URL of the full canvas.
    pub fn to_data_url(&mut self) -> MaskResult<Option<String>> {
        match self.render()? {
            Some(raster) => Ok(Some(raster.to_data_url()?)),
            None => Ok(None),
        }
    }

    /// Write the full canvas as PNG to `path` and return its `data:` URL.
    #[tracing::instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save_canvas(&mut self, path: impl AsRef<Path>) -> MaskResult<Option<String>> {
        let path = path.as_ref();
        let Some(raster) = self.render()? else {
            return Ok(None);
        };
        let png = raster.encode_png()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(path, &png).with_context(|| format!("write png '{}'", path.display()))?;
        tracing::debug!(bytes = png.len(), "canvas saved");

        Ok(Some(to_data_url(PNG_MIME, &png)))
    }

    /// Replace everything on the canvas with the image at `url`, scaled to the canvas width
    /// and centered vertically.
    ///
    /// With `keep_annotation_mode_active` and an `active_color` annotation mode is re-enabled
    /// with that color; otherwise it ends up off. A load failure leaves the canvas untouched.
    #[tracing::instrument(skip(self, active_color))]
    pub fn apply_replacement_image(
        &mut self,
        url: &str,
        keep_annotation_mode_active: bool,
        active_color: Option<&ColorDefinition>,
    ) -> MaskResult<()> {
        if self.state.is_none() {
            return Ok(());
        }
        let image = self.loader.load(url)?;
        let dest = width_fit_rect(self.size, &image);

        if let Some(state) = self.state.as_mut() {
            state.scene.clear();
            state.drag = None;
            state.scene.push(ObjectKind::Image(ImageObject { image, dest }));
        }
        let keep = keep_annotation_mode_active && active_color.is_some();
        self.set_annotation_mode(keep, active_color);
        Ok(())
    }

    pub(crate) fn extraction_parts(&mut self) -> Option<(&mut Scene, &mut dyn RasterBackend)> {
        let state = self.state.as_mut()?;
        Some((&mut state.scene, self.backend.as_mut()))
    }
}

impl Drop for DrawingSurface {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Uniform scale so the whole image fits, centered.
fn fit_rect(canvas: CanvasSize, image: &PreparedImage) -> Rect {
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let (iw, ih) = (f64::from(image.width), f64::from(image.height));
    let scale = (cw / iw).min(ch / ih);
    let (w, h) = (iw * scale, ih * scale);
    Rect::from_origin_size(((cw - w) / 2.0, (ch - h) / 2.0), (w, h))
}

/// Scale to the canvas width, centered vertically (may overflow top and bottom).
fn width_fit_rect(canvas: CanvasSize, image: &PreparedImage) -> Rect {
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let scale = cw / f64::from(image.width);
    let h = f64::from(image.height) * scale;
    Rect::from_origin_size((0.0, (ch - h) / 2.0), (cw, h))
}

#[cfg(test)]
#[path = "../../tests/unit/surface/controller.rs"]
mod tests;
