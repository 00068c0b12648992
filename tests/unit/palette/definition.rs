use super::*;

#[test]
fn default_palette_is_valid_and_ordered() {
    let p = Palette::default_palette();
    let revalidated = Palette::new(p.colors().to_vec()).unwrap();
    assert_eq!(revalidated, p);
    assert_eq!(p.colors()[0].id.as_str(), "orange");
    assert_eq!(p.colors()[1].id.as_str(), "purple");
}

#[test]
fn paint_value_is_display_color_at_half_alpha() {
    let p = Palette::default_palette();
    let orange = p.get("orange").unwrap();
    assert_eq!(orange.paint_value(), Rgba8::new(0xF9, 0x73, 0x16, 128));
    assert_eq!(orange.paint_css(), "rgba(249, 115, 22, 0.5)");
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = Palette::new(vec![
        ColorDefinition::new("a", "A", Rgba8::opaque(1, 2, 3)),
        ColorDefinition::new("a", "A again", Rgba8::opaque(4, 5, 6)),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("defined twice"));
}

#[test]
fn duplicate_paint_values_are_rejected() {
    // Alpha differs in the display color but the derived paint forces 0.5.
    let err = Palette::new(vec![
        ColorDefinition::new("a", "A", Rgba8::opaque(1, 2, 3)),
        ColorDefinition::new("b", "B", Rgba8::new(1, 2, 3, 10)),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("shares its paint value"));
}

#[test]
fn empty_palette_is_rejected() {
    assert!(Palette::new(Vec::new()).is_err());
}

#[test]
fn palette_json_roundtrip_validates() {
    let json = r##"[{"id":"teal","name":"Teal","hex":"#14B8A6"}]"##;
    let p: Palette = serde_json::from_str(json).unwrap();
    assert_eq!(p.len(), 1);
    assert_eq!(p.get("teal").unwrap().name, "Teal");

    let dup = r##"[{"id":"x","name":"X","hex":"#000000"},{"id":"x","name":"Y","hex":"#111111"}]"##;
    assert!(serde_json::from_str::<Palette>(dup).is_err());
}

#[test]
fn path_like_ids_are_rejected() {
    for id in ["../escaped", "a/b", "a\\b", ".."] {
        let err = Palette::new(vec![ColorDefinition::new(id, "X", Rgba8::opaque(1, 2, 3))])
            .unwrap_err();
        assert!(err.to_string().contains("path separators"), "{id}");
    }

    let json = r##"[{"id":"../escaped","name":"X","hex":"#000000"}]"##;
    assert!(serde_json::from_str::<Palette>(json).is_err());
    assert!(Palette::new(vec![ColorDefinition::new("sky.blue", "S", Rgba8::opaque(1, 2, 3))]).is_ok());
}
