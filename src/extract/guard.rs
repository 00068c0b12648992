use std::ops::{Deref, DerefMut};

use crate::foundation::core::Rgba8;
use crate::surface::scene::Scene;

/// Restores every object's visibility and the background color on drop.
///
/// The object list must not change length while the guard is alive.
pub(crate) struct SceneRestore<'a> {
    scene: &'a mut Scene,
    visibility: Vec<bool>,
    background: Rgba8,
}

impl<'a> SceneRestore<'a> {
    pub(crate) fn new(scene: &'a mut Scene) -> Self {
        let visibility = scene.objects().iter().map(|o| o.visible).collect();
        let background = scene.background();
        Self {
            scene,
            visibility,
            background,
        }
    }
}

impl Deref for SceneRestore<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        &*self.scene
    }
}

impl DerefMut for SceneRestore<'_> {
    fn deref_mut(&mut self) -> &mut Scene {
        &mut *self.scene
    }
}

impl Drop for SceneRestore<'_> {
    fn drop(&mut self) {
        for (obj, &visible) in self
            .scene
            .objects_mut()
            .iter_mut()
            .zip(self.visibility.iter())
        {
            obj.visible = visible;
        }
        self.scene.set_background(self.background);
    }
}

/// Repaints a set of strokes with one color, restoring each stroke's own paint on drop.
pub(crate) struct Restyle<'a> {
    scene: &'a mut Scene,
    saved: Vec<(usize, Rgba8)>,
}

impl<'a> Restyle<'a> {
    pub(crate) fn new(scene: &'a mut Scene, strokes: &[usize], paint: Rgba8) -> Self {
        let mut saved = Vec::with_capacity(strokes.len());
        for &i in strokes {
            if let Some(stroke) = scene
                .objects_mut()
                .get_mut(i)
                .and_then(|o| o.as_stroke_mut())
            {
                saved.push((i, stroke.paint));
                stroke.paint = paint;
            }
        }
        Self { scene, saved }
    }
}

impl Deref for Restyle<'_> {
    type Target = Scene;

    fn deref(&self) -> &Scene {
        &*self.scene
    }
}

impl Drop for Restyle<'_> {
    fn drop(&mut self) {
        for &(i, paint) in &self.saved {
            if let Some(stroke) = self
                .scene
                .objects_mut()
                .get_mut(i)
                .and_then(|o| o.as_stroke_mut())
            {
                stroke.paint = paint;
            }
        }
    }
}
