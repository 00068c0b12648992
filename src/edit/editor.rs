use serde::{Deserialize, Serialize};

use crate::extract::bundle::{EditDefinitions, PreparedMaskBundle, ReferenceImages};
use crate::foundation::error::{MaskError, MaskResult};
use crate::palette::definition::ColorDefinition;
use crate::surface::controller::DrawingSurface;

/// One edited image proposed by the editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    /// Anything the surface's image loader resolves: a `data:` URL or a path.
    pub url: String,
    pub prompt: String,
}

/// External editor that applies every mask's instruction to the base image.
///
/// Implementations own transport, retries and timeouts; the surface never sees them.
pub trait MultiMaskEditor {
    fn edit(&mut self, bundle: &PreparedMaskBundle) -> anyhow::Result<Vec<Candidate>>;
}

/// Extract masks from `surface` and hand them to `editor`.
///
/// Fails with [`MaskError::NothingToEdit`] when extraction yields no bundle, and with
/// [`MaskError::Editor`] when the editor does; neither is retried.
pub fn generate_candidates(
    surface: &mut DrawingSurface,
    definitions: &EditDefinitions,
    references: &ReferenceImages,
    editor: &mut dyn MultiMaskEditor,
) -> MaskResult<Vec<Candidate>> {
    let bundle = surface
        .prepare_masks_for_edit(definitions, references)?
        .ok_or(MaskError::NothingToEdit)?;

    let candidates = editor.edit(&bundle).map_err(MaskError::Editor)?;
    tracing::debug!(
        masks = bundle.masks.len(),
        candidates = candidates.len(),
        "editor returned"
    );
    Ok(candidates)
}

/// Put `candidate` on the canvas so it can be annotated again.
pub fn apply_candidate(
    surface: &mut DrawingSurface,
    candidate: &Candidate,
    keep_annotation_mode_active: bool,
    active_color: Option<&ColorDefinition>,
) -> MaskResult<()> {
    surface.apply_replacement_image(&candidate.url, keep_annotation_mode_active, active_color)
}

#[cfg(test)]
#[path = "../../tests/unit/edit/editor.rs"]
mod tests;
