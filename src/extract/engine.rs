use crate::extract::bundle::{
    EditDefinitions, EncodedImage, PreparedMask, PreparedMaskBundle, ReferenceImages,
};
use crate::extract::guard::{Restyle, SceneRestore};
use crate::foundation::error::MaskResult;
use crate::render::backend::RasterBackend;
use crate::surface::controller::DrawingSurface;
use crate::surface::scene::Scene;

/// Turn the surface's annotation strokes into a base image plus one mask per instructed color.
///
/// Returns `Ok(None)` when the surface is not initialized, when every instruction is blank, or
/// when no instructed color has a stroke on the canvas. Visibility, background and stroke paint
/// are back to their pre-call values on every exit path, errors included.
#[tracing::instrument(skip_all, fields(definitions = definitions.len()))]
pub fn prepare_masks_for_edit(
    surface: &mut DrawingSurface,
    definitions: &EditDefinitions,
    references: &ReferenceImages,
) -> MaskResult<Option<PreparedMaskBundle>> {
    if !surface.is_initialized() {
        return Ok(None);
    }

    let active: Vec<_> = definitions
        .active(surface.palette())
        .into_iter()
        .map(|(color, prompt)| (color.clone(), prompt))
        .collect();
    if active.is_empty() {
        tracing::debug!("no active instructions");
        return Ok(None);
    }

    let backdrop = surface.config().mask_background.0;
    let ink = surface.config().mask_foreground.0;
    let Some((scene, backend)) = surface.extraction_parts() else {
        return Ok(None);
    };

    let strokes: Vec<usize> = scene
        .objects()
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.is_stroke().then_some(i))
        .collect();

    let mut scene = SceneRestore::new(scene);
    scene.set_background(backdrop);

    for &i in &strokes {
        scene.objects_mut()[i].visible = false;
    }
    let base_image = rasterize_png(backend, &scene)?;

    let mut masks = Vec::new();
    for (color, prompt) in &active {
        let color_paths: Vec<usize> = strokes
            .iter()
            .copied()
            .filter(|&i| {
                scene.objects()[i]
                    .as_stroke()
                    .is_some_and(|s| s.color_id == color.id)
            })
            .collect();
        if color_paths.is_empty() {
            tracing::debug!(color = %color.id, "instruction has no strokes, skipped");
            continue;
        }

        for obj in scene.objects_mut() {
            obj.visible = false;
        }
        for &i in &color_paths {
            scene.objects_mut()[i].visible = true;
        }

        let pass = Restyle::new(&mut scene, &color_paths, ink);
        let data = rasterize_png(backend, &pass)?;
        drop(pass);

        masks.push(PreparedMask {
            mime_type: data.mime_type,
            data: data.data,
            prompt: prompt.clone(),
            color_id: color.id.clone(),
            reference_image: references.get(&color.id).cloned(),
        });
    }
    drop(scene);

    if masks.is_empty() {
        tracing::debug!("no instructed color has strokes");
        return Ok(None);
    }
    tracing::debug!(masks = masks.len(), "masks prepared");
    Ok(Some(PreparedMaskBundle { base_image, masks }))
}

fn rasterize_png(backend: &mut dyn RasterBackend, scene: &Scene) -> MaskResult<EncodedImage> {
    let raster = backend.rasterize(scene)?;
    Ok(EncodedImage::png(&raster.encode_png()?))
}

impl DrawingSurface {
    /// See [`prepare_masks_for_edit`].
    pub fn prepare_masks_for_edit(
        &mut self,
        definitions: &EditDefinitions,
        references: &ReferenceImages,
    ) -> MaskResult<Option<PreparedMaskBundle>> {
        prepare_masks_for_edit(self, definitions, references)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/extract/engine.rs"]
mod tests;
