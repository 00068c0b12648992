//! Annotation color palette.

pub(crate) mod color;
pub(crate) mod definition;
