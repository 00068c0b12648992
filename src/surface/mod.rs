//! The drawing surface: an owned object graph with primitive and free-hand brush tools.

pub(crate) mod brush;
pub(crate) mod config;
pub(crate) mod controller;
pub(crate) mod handle;
pub(crate) mod scene;
