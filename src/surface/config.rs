use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::{CanvasSize, Rgba8};
use crate::foundation::error::{MaskError, MaskResult};
use crate::palette::color::HexColor;
use crate::palette::definition::Palette;

/// Drawing-surface configuration. Every field has a default, so `{}` is a valid config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceConfig {
    /// Logical canvas width in pixels.
    pub width: u32,
    /// Logical canvas height in pixels.
    pub height: u32,
    /// Free-hand brush width in logical pixels.
    pub brush_width: f64,
    /// Background shown while editing.
    pub editing_background: HexColor,
    /// Backdrop for the base image and every mask.
    pub mask_background: HexColor,
    /// Color annotation strokes are repainted with inside a mask.
    pub mask_foreground: HexColor,
    /// Custom palette; the built-in one when absent.
    pub palette: Option<Palette>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            brush_width: 30.0,
            editing_background: HexColor(Rgba8::opaque(0xF3, 0xF4, 0xF6)),
            mask_background: HexColor(Rgba8::BLACK),
            mask_foreground: HexColor(Rgba8::WHITE),
            palette: None,
        }
    }
}

impl SurfaceConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> MaskResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| MaskError::config(format!("parse '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> MaskResult<()> {
        CanvasSize::new(self.width, self.height)
            .map_err(|e| MaskError::config(e.to_string()))?;
        if !self.brush_width.is_finite() || self.brush_width <= 0.0 {
            return Err(MaskError::config("brush_width must be finite and > 0"));
        }
        if self.mask_background == self.mask_foreground {
            return Err(MaskError::config(
                "mask_background and mask_foreground must differ",
            ));
        }
        Ok(())
    }

    pub fn canvas_size(&self) -> MaskResult<CanvasSize> {
        CanvasSize::new(self.width, self.height)
    }

    /// The configured palette, or the built-in one.
    pub fn palette(&self) -> Palette {
        self.palette.clone().unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/config.rs"]
mod tests;
