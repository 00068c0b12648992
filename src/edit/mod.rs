//! Seam to the external multi-mask image editor.

pub(crate) mod editor;
