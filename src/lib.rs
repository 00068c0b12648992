//! maskforge turns colored free-hand annotations on a canvas into per-color edit masks.
//!
//! The public API is surface-oriented:
//!
//! - Create a [`DrawingSurface`] from a [`SurfaceConfig`] and [`DrawingSurface::initialize`] it
//! - Place content and draw annotation strokes with palette colors
//! - Call [`prepare_masks_for_edit`] to get a [`PreparedMaskBundle`] for a [`MultiMaskEditor`]
#![forbid(unsafe_code)]

mod assets;
mod edit;
mod extract;
mod foundation;
mod palette;
mod render;
mod surface;

pub use crate::foundation::core::{
    Affine, BezPath, CanvasSize, MAX_CANVAS_DIM, ObjectId, Point, Rect, Rgba8, Vec2,
};
pub use crate::foundation::error::{MaskError, MaskResult};

pub use crate::assets::decode::{
    PNG_MIME, PreparedImage, decode_data_url, decode_image, encode_png, split_data_url,
    to_data_url,
};
pub use crate::assets::loader::{FsImageLoader, ImageLoader};
pub use crate::edit::editor::{Candidate, MultiMaskEditor, apply_candidate, generate_candidates};
pub use crate::extract::bundle::{
    EditDefinitions, EncodedImage, PreparedMask, PreparedMaskBundle, ReferenceImages,
};
pub use crate::extract::engine::prepare_masks_for_edit;
pub use crate::palette::color::{HexColor, parse_hex};
pub use crate::palette::definition::{ColorDefinition, ColorId, PAINT_ALPHA, Palette};
pub use crate::render::backend::{BackendKind, RasterBackend, RasterImage, create_backend};
pub use crate::render::cpu::CpuRasterizer;
pub use crate::surface::brush::{FreehandBrush, smooth_polyline};
pub use crate::surface::config::SurfaceConfig;
pub use crate::surface::controller::DrawingSurface;
pub use crate::surface::handle::SurfaceHandle;
pub use crate::surface::scene::{
    CanvasObject, CircleObject, ImageObject, ObjectKind, RectObject, Scene, StrokeObject,
    TextObject,
};
