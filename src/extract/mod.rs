//! Mask extraction: turns annotation strokes into a base image plus per-color masks.

pub(crate) mod bundle;
pub(crate) mod engine;
pub(crate) mod guard;
