use crate::assets::decode::{PNG_MIME, encode_png, to_data_url};
use crate::foundation::error::MaskResult;
use crate::surface::scene::Scene;

/// A rasterized scene as straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major, not premultiplied.
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn encode_png(&self) -> MaskResult<Vec<u8>> {
        encode_png(&self.data, self.width, self.height)
    }

    /// PNG `data:` URL of this image.
    pub fn to_data_url(&self) -> MaskResult<String> {
        Ok(to_data_url(PNG_MIME, &self.encode_png()?))
    }
}

/// The rasterization primitive surfaces draw through.
///
/// Implementations must draw only visible objects, in order, over the scene background, and must
/// not retain references to the scene.
pub trait RasterBackend {
    /// Rasterize the visible scene at its logical size.
    fn rasterize(&mut self, scene: &Scene) -> MaskResult<RasterImage>;
}

/// Available backend kinds.
#[derive(Clone, Copy, Debug, Default)]
pub enum BackendKind {
    /// CPU raster backend powered by `vello_cpu`.
    #[default]
    Cpu,
}

/// Create a raster backend implementation.
pub fn create_backend(kind: BackendKind) -> Box<dyn RasterBackend> {
    match kind {
        BackendKind::Cpu => Box::new(crate::render::cpu::CpuRasterizer::new()),
    }
}
