/// Convenience result type used across maskforge.
pub type MaskResult<T> = Result<T, MaskError>;

/// Top-level error taxonomy used by surface, extraction and editing APIs.
///
/// Precondition misses (an uninitialized surface, annotation mode being off) are never reported
/// through this type; those degrade to no-ops or `None`.
#[derive(thiserror::Error, Debug)]
pub enum MaskError {
    /// Invalid user-provided data (palettes, session documents, geometry).
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Errors while rasterizing a scene or encoding its pixels.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while loading or decoding an image asset.
    #[error("asset error: {0}")]
    Asset(String),

    /// Extraction produced no bundle: no active instruction has a matching stroke.
    #[error("nothing to edit: draw an annotation and describe the edit")]
    NothingToEdit,

    /// The external multi-mask editing collaborator failed.
    #[error("editor error: {0:#}")]
    Editor(anyhow::Error),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaskError {
    /// Build a [`MaskError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MaskError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`MaskError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MaskError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
