use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use crate::assets::decode::PNG_MIME;
use crate::foundation::error::{MaskError, MaskResult};
use crate::palette::definition::{ColorDefinition, ColorId, Palette};

/// An encoded image: MIME type plus base64 payload (no `data:` prefix).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: general_purpose::STANDARD.encode(bytes),
        }
    }

    pub fn png(bytes: &[u8]) -> Self {
        Self::from_bytes(PNG_MIME, bytes)
    }

    /// Decode the base64 payload.
    pub fn to_bytes(&self) -> MaskResult<Vec<u8>> {
        general_purpose::STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| MaskError::validation(format!("invalid base64 payload: {e}")))
    }
}

/// Optional per-color reference images handed through to the editor untouched.
pub type ReferenceImages = BTreeMap<ColorId, EncodedImage>;

/// Per-color edit instructions, keyed by color id.
///
/// Entries whose instruction is blank after trimming are inert.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditDefinitions(BTreeMap<ColorId, String>);

impl EditDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: impl Into<ColorId>, prompt: impl Into<String>) -> &mut Self {
        self.0.insert(id.into(), prompt.into());
        self
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Palette colors with a non-blank instruction, in palette order.
    ///
    /// Blankness is judged on the trimmed text; the instruction itself is returned as given.
    pub fn active<'p>(&self, palette: &'p Palette) -> Vec<(&'p ColorDefinition, String)> {
        for id in self.0.keys().filter(|id| palette.get(id.as_str()).is_none()) {
            tracing::debug!(color = %id, "instruction for unknown color ignored");
        }

        palette
            .iter()
            .filter_map(|c| {
                let prompt = self.get(c.id.as_str())?;
                (!prompt.trim().is_empty()).then(|| (c, prompt.to_owned()))
            })
            .collect()
    }
}

impl<K: Into<ColorId>, V: Into<String>> FromIterator<(K, V)> for EditDefinitions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Mask for one annotation color plus the instruction scoped to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedMask {
    pub mime_type: String,
    /// Base64 PNG: the color's strokes in white on black.
    pub data: String,
    pub prompt: String,
    pub color_id: ColorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<EncodedImage>,
}

impl PreparedMask {
    /// The mask payload on its own.
    pub fn to_encoded(&self) -> EncodedImage {
        EncodedImage {
            mime_type: self.mime_type.clone(),
            data: self.data.clone(),
        }
    }
}

/// Everything the multi-mask editor needs: the clean base image and one mask per color.
///
/// Never constructed with an empty `masks` list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedMaskBundle {
    pub base_image: EncodedImage,
    pub masks: Vec<PreparedMask>,
}

impl PreparedMaskBundle {
    pub fn color_ids(&self) -> impl Iterator<Item = &ColorId> {
        self.masks.iter().map(|m| &m.color_id)
    }

    pub fn mask_for(&self, id: &str) -> Option<&PreparedMask> {
        self.masks.iter().find(|m| m.color_id.as_str() == id)
    }
}
