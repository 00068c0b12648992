use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::foundation::core::{ObjectId, Point, Rgba8};
use crate::foundation::error::MaskError;
use crate::palette::definition::Palette;
use crate::render::backend::RasterImage;
use crate::surface::config::SurfaceConfig;
use crate::surface::handle::SurfaceHandle;

#[derive(Clone, Debug, PartialEq)]
struct Pass {
    background: Rgba8,
    /// Visible objects with their stroke paint, if any.
    visible: Vec<(ObjectId, Option<Rgba8>)>,
}

/// Records what every rasterization saw; fails on the call numbered `fail_at`.
struct Recorder {
    passes: Rc<RefCell<Vec<Pass>>>,
    fail_at: Option<usize>,
}

impl RasterBackend for Recorder {
    fn rasterize(&mut self, scene: &Scene) -> MaskResult<RasterImage> {
        let mut passes = self.passes.borrow_mut();
        if self.fail_at == Some(passes.len()) {
            return Err(MaskError::render("recorder refused"));
        }
        passes.push(Pass {
            background: scene.background(),
            visible: scene
                .objects()
                .iter()
                .filter(|o| o.visible)
                .map(|o| (o.id, o.as_stroke().map(|s| s.paint)))
                .collect(),
        });
        let size = scene.size();
        Ok(RasterImage {
            width: size.width,
            height: size.height,
            data: vec![0; (size.width * size.height * 4) as usize],
        })
    }
}

fn config() -> SurfaceConfig {
    SurfaceConfig {
        width: 256,
        height: 256,
        brush_width: 10.0,
        ..SurfaceConfig::default()
    }
}

fn recording_surface(fail_at: Option<usize>) -> (DrawingSurface, Rc<RefCell<Vec<Pass>>>) {
    let passes = Rc::new(RefCell::new(Vec::new()));
    let backend = Recorder {
        passes: Rc::clone(&passes),
        fail_at,
    };
    let s = DrawingSurface::new(config())
        .unwrap()
        .with_backend(Box::new(backend));
    (s, passes)
}

fn ready(s: &mut DrawingSurface) -> SurfaceHandle {
    let handle = SurfaceHandle::new("canvas");
    s.initialize(&handle, None, || {});
    handle
}

fn stroke(s: &mut DrawingSurface, color: &str, from: Point, to: Point) -> ObjectId {
    let palette = Palette::default_palette();
    let color = palette.get(color).unwrap();
    if s.annotation_mode() {
        s.update_brush_color(color);
    } else {
        s.set_annotation_mode(true, Some(color));
    }
    s.draw_stroke(&[from, to]).unwrap()
}

fn snapshot(s: &DrawingSurface) -> (Rgba8, Vec<bool>, Vec<Option<Rgba8>>) {
    let objs = s.objects();
    (
        s.background().unwrap(),
        objs.iter().map(|o| o.visible).collect(),
        objs.iter().map(|o| o.as_stroke().map(|st| st.paint)).collect(),
    )
}

fn defs(pairs: &[(&str, &str)]) -> EditDefinitions {
    pairs.iter().copied().collect()
}

fn decode(img: &EncodedImage) -> image::RgbaImage {
    assert_eq!(img.mime_type, "image/png");
    image::load_from_memory(&img.to_bytes().unwrap())
        .unwrap()
        .to_rgba8()
}

#[test]
fn uninitialized_surface_yields_nothing() {
    let (mut s, passes) = recording_surface(None);
    let out = s
        .prepare_masks_for_edit(&defs(&[("orange", "hat")]), &ReferenceImages::new())
        .unwrap();
    assert!(out.is_none());
    assert!(passes.borrow().is_empty());
}

#[test]
fn blank_instructions_never_touch_the_canvas() {
    let (mut s, passes) = recording_surface(None);
    let _h = ready(&mut s);
    stroke(&mut s, "orange", Point::new(10.0, 10.0), Point::new(60.0, 10.0));

    let out = s
        .prepare_masks_for_edit(
            &defs(&[("orange", "   "), ("purple", "")]),
            &ReferenceImages::new(),
        )
        .unwrap();
    assert!(out.is_none());
    assert!(passes.borrow().is_empty());
}

#[test]
fn colors_without_strokes_are_skipped() {
    let (mut s, _passes) = recording_surface(None);
    let _h = ready(&mut s);
    stroke(&mut s, "orange", Point::new(10.0, 10.0), Point::new(60.0, 10.0));

    let bundle = s
        .prepare_masks_for_edit(
            &defs(&[("orange", "  make it a hat "), ("purple", "add a cat")]),
            &ReferenceImages::new(),
        )
        .unwrap()
        .unwrap();

    assert_eq!(bundle.masks.len(), 1);
    let mask = &bundle.masks[0];
    assert_eq!(mask.color_id.as_str(), "orange");
    assert_eq!(mask.prompt, "  make it a hat ");
    assert!(mask.reference_image.is_none());
}

#[test]
fn no_instructed_color_with_strokes_yields_nothing() {
    let (mut s, _passes) = recording_surface(None);
    let _h = ready(&mut s);
    s.add_rectangle();
    stroke(&mut s, "green", Point::new(10.0, 10.0), Point::new(60.0, 10.0));
    let before = snapshot(&s);

    let out = s
        .prepare_masks_for_edit(&defs(&[("purple", "add a cat")]), &ReferenceImages::new())
        .unwrap();
    assert!(out.is_none());
    assert_eq!(snapshot(&s), before);
}

#[test]
fn masks_follow_palette_order_and_carry_references() {
    let (mut s, _passes) = recording_surface(None);
    let _h = ready(&mut s);
    stroke(&mut s, "blue", Point::new(10.0, 10.0), Point::new(60.0, 10.0));
    stroke(&mut s, "orange", Point::new(10.0, 50.0), Point::new(60.0, 50.0));
    stroke(&mut s, "blue", Point::new(10.0, 90.0), Point::new(60.0, 90.0));

    let mut refs = ReferenceImages::new();
    let reference = EncodedImage::png(b"not really a png");
    refs.insert("blue".into(), reference.clone());

    let bundle = s
        .prepare_masks_for_edit(
            &defs(&[("blue", "sky"), ("orange", "sun"), ("teal", "ignored")]),
            &refs,
        )
        .unwrap()
        .unwrap();

    let ids: Vec<_> = bundle.color_ids().map(|c| c.as_str()).collect();
    assert_eq!(ids, ["orange", "blue"]);
    assert_eq!(bundle.mask_for("blue").unwrap().reference_image, Some(reference));
    assert!(bundle.mask_for("orange").unwrap().reference_image.is_none());
}

#[test]
fn passes_isolate_content_and_each_color() {
    let (mut s, passes) = recording_surface(None);
    let _h = ready(&mut s);
    let rect = s.add_rectangle().unwrap();
    let o1 = stroke(&mut s, "orange", Point::new(10.0, 10.0), Point::new(60.0, 10.0));
    let p1 = stroke(&mut s, "purple", Point::new(10.0, 50.0), Point::new(60.0, 50.0));
    let o2 = stroke(&mut s, "orange", Point::new(10.0, 90.0), Point::new(60.0, 90.0));

    s.prepare_masks_for_edit(
        &defs(&[("orange", "a"), ("purple", "b")]),
        &ReferenceImages::new(),
    )
    .unwrap()
    .unwrap();

    let white = Some(Rgba8::WHITE);
    let expected = vec![
        Pass {
            background: Rgba8::BLACK,
            visible: vec![(rect, None)],
        },
        Pass {
            background: Rgba8::BLACK,
            visible: vec![(o1, white), (o2, white)],
        },
        Pass {
            background: Rgba8::BLACK,
            visible: vec![(p1, white)],
        },
    ];
    assert_eq!(*passes.borrow(), expected);
}

#[test]
fn hidden_content_stays_out_of_the_base_image() {
    let (mut s, passes) = recording_surface(None);
    let _h = ready(&mut s);
    let shown = s.add_circle().unwrap();
    s.add_text().unwrap();
    stroke(&mut s, "red", Point::new(10.0, 10.0), Point::new(60.0, 10.0));
    if let Some((scene, _)) = s.extraction_parts() {
        scene.objects_mut()[1].visible = false;
    }
    let before = snapshot(&s);

    s.prepare_masks_for_edit(&defs(&[("red", "remove")]), &ReferenceImages::new())
        .unwrap()
        .unwrap();

    assert_eq!(passes.borrow()[0].visible, vec![(shown, None)]);
    assert_eq!(snapshot(&s), before);
}

#[test]
fn canvas_state_is_restored_after_extraction() {
    let (mut s, _passes) = recording_surface(None);
    let _h = ready(&mut s);
    s.add_rectangle();
    stroke(&mut s, "orange", Point::new(10.0, 10.0), Point::new(60.0, 10.0));
    stroke(&mut s, "yellow", Point::new(10.0, 50.0), Point::new(60.0, 50.0));
    let before = snapshot(&s);

    s.prepare_masks_for_edit(
        &defs(&[("orange", "a"), ("yellow", "b")]),
        &ReferenceImages::new(),
    )
    .unwrap()
    .unwrap();

    assert_eq!(snapshot(&s), before);
    assert!(s.annotation_mode());
}

#[test]
fn canvas_state_is_restored_when_rasterization_fails() {
    // Base pass and first mask succeed, second mask fails.
    let (mut s, passes) = recording_surface(Some(2));
    let _h = ready(&mut s);
    s.add_circle();
    stroke(&mut s, "orange", Point::new(10.0, 10.0), Point::new(60.0, 10.0));
    stroke(&mut s, "green", Point::new(10.0, 50.0), Point::new(60.0, 50.0));
    let before = snapshot(&s);

    let err = s
        .prepare_masks_for_edit(
            &defs(&[("orange", "a"), ("green", "b")]),
            &ReferenceImages::new(),
        )
        .unwrap_err();

    assert!(matches!(err, MaskError::Render(_)));
    assert_eq!(passes.borrow().len(), 2);
    assert_eq!(snapshot(&s), before);
}

#[test]
fn rendered_masks_are_white_on_black_and_base_excludes_strokes() {
    let mut s = DrawingSurface::new(config()).unwrap();
    let _h = ready(&mut s);
    s.add_rectangle();
    stroke(&mut s, "orange", Point::new(20.0, 30.0), Point::new(200.0, 30.0));
    stroke(&mut s, "purple", Point::new(20.0, 230.0), Point::new(90.0, 230.0));

    let bundle = s
        .prepare_masks_for_edit(
            &defs(&[("orange", "a"), ("purple", "b")]),
            &ReferenceImages::new(),
        )
        .unwrap()
        .unwrap();

    let base = decode(&bundle.base_image);
    assert_eq!(base.dimensions(), (256, 256));
    assert_eq!(base.get_pixel(100, 30).0, [0, 0, 0, 255]);
    assert_eq!(base.get_pixel(150, 150).0, [0x4F, 0x46, 0xE5, 255]);

    let orange = decode(&bundle.mask_for("orange").unwrap().to_encoded());
    assert_eq!(orange.get_pixel(100, 30).0, [255, 255, 255, 255]);
    assert_eq!(orange.get_pixel(50, 230).0, [0, 0, 0, 255]);
    assert_eq!(orange.get_pixel(150, 150).0, [0, 0, 0, 255]);

    let purple = decode(&bundle.mask_for("purple").unwrap().to_encoded());
    assert_eq!(purple.get_pixel(50, 230).0, [255, 255, 255, 255]);
    assert_eq!(purple.get_pixel(100, 30).0, [0, 0, 0, 255]);

    // The on-screen canvas still shows the translucent brush paint.
    let shown = s.render().unwrap().unwrap();
    let px = shown.pixel(100, 30).unwrap();
    assert_ne!(px, [255, 255, 255, 255]);
    assert_eq!(px[3], 255);
}
