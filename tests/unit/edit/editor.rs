use anyhow::anyhow;

use super::*;
use crate::assets::decode::{PNG_MIME, encode_png, to_data_url};
use crate::foundation::core::{Point, Rect};
use crate::palette::definition::Palette;
use crate::surface::config::SurfaceConfig;
use crate::surface::handle::SurfaceHandle;
use crate::surface::scene::ObjectKind;

#[derive(Default)]
struct FakeEditor {
    seen: Vec<Vec<String>>,
    fail: bool,
}

impl MultiMaskEditor for FakeEditor {
    fn edit(&mut self, bundle: &PreparedMaskBundle) -> anyhow::Result<Vec<Candidate>> {
        self.seen
            .push(bundle.color_ids().map(|c| c.to_string()).collect());
        if self.fail {
            return Err(anyhow!("quota exceeded").context("calling editor"));
        }
        Ok(bundle
            .masks
            .iter()
            .enumerate()
            .map(|(i, m)| Candidate {
                id: format!("c{i}"),
                url: tiny_png_url(),
                prompt: m.prompt.clone(),
            })
            .collect())
    }
}

fn tiny_png_url() -> String {
    let png = encode_png(&[0, 128, 255, 255].repeat(4 * 2), 4, 2).unwrap();
    to_data_url(PNG_MIME, &png)
}

fn annotated_surface() -> (DrawingSurface, SurfaceHandle) {
    let palette = Palette::default_palette();
    let mut s = DrawingSurface::new(SurfaceConfig {
        width: 128,
        height: 128,
        ..SurfaceConfig::default()
    })
    .unwrap();
    let handle = SurfaceHandle::new("canvas");
    s.initialize(&handle, None, || {});
    s.set_annotation_mode(true, palette.get("orange"));
    s.draw_stroke(&[Point::new(10.0, 10.0), Point::new(90.0, 40.0)])
        .unwrap();
    (s, handle)
}

fn hat() -> EditDefinitions {
    [("orange", "add a hat")].into_iter().collect()
}

#[test]
fn candidates_come_from_the_editor() {
    let (mut s, _h) = annotated_surface();
    let mut editor = FakeEditor::default();

    let out = generate_candidates(&mut s, &hat(), &ReferenceImages::new(), &mut editor).unwrap();

    assert_eq!(editor.seen, vec![vec!["orange".to_owned()]]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].prompt, "add a hat");
}

#[test]
fn nothing_to_edit_skips_the_editor() {
    let (mut s, _h) = annotated_surface();
    let mut editor = FakeEditor::default();
    let defs: EditDefinitions = [("purple", "add a cat")].into_iter().collect();

    let err = generate_candidates(&mut s, &defs, &ReferenceImages::new(), &mut editor).unwrap_err();

    assert!(matches!(err, MaskError::NothingToEdit));
    assert!(err.to_string().contains("draw an annotation"));
    assert!(editor.seen.is_empty());
}

#[test]
fn editor_failure_is_wrapped_once() {
    let (mut s, _h) = annotated_surface();
    let mut editor = FakeEditor {
        fail: true,
        ..FakeEditor::default()
    };

    let err = generate_candidates(&mut s, &hat(), &ReferenceImages::new(), &mut editor).unwrap_err();

    assert!(matches!(err, MaskError::Editor(_)));
    assert!(err.to_string().contains("quota exceeded"));
    assert_eq!(editor.seen.len(), 1);
    assert_eq!(s.stroke_count(), 1);
}

#[test]
fn applied_candidate_replaces_the_canvas() {
    let palette = Palette::default_palette();
    let orange = palette.get("orange");
    let (mut s, _h) = annotated_surface();
    let mut editor = FakeEditor::default();
    let out = generate_candidates(&mut s, &hat(), &ReferenceImages::new(), &mut editor).unwrap();

    apply_candidate(&mut s, &out[0], true, orange).unwrap();

    assert_eq!(s.objects().len(), 1);
    match &s.objects()[0].kind {
        // 4x2 scaled to width 128 -> 128x64, centered in 128.
        ObjectKind::Image(img) => assert_eq!(img.dest, Rect::new(0.0, 32.0, 128.0, 96.0)),
        other => panic!("expected image, got {}", other.name()),
    }
    assert!(s.annotation_mode());

    // Second round of annotation on the replaced image.
    s.draw_stroke(&[Point::new(5.0, 60.0), Point::new(100.0, 60.0)])
        .unwrap();
    let again = generate_candidates(&mut s, &hat(), &ReferenceImages::new(), &mut editor).unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(editor.seen.len(), 2);
}
