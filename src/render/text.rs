use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{MaskError, MaskResult};
use crate::surface::scene::TextObject;

/// Premultiplied RGBA8 raster of one text line, to be drawn at the text origin.
pub(crate) struct TextRaster {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba8_premul: Vec<u8>,
}

/// Font database shared by every text raster of a backend.
pub(crate) fn system_fontdb() -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    Arc::new(db)
}

/// Conservative line box for `text`; glyphs past it are clipped.
pub(crate) fn text_box(text: &TextObject) -> (u32, u32) {
    let size = text.font_size.max(1.0);
    let chars = text.text.chars().count().max(1) as f64;
    let w = (size * 0.7 * chars + size).ceil() as u32;
    let h = (size * 1.4).ceil() as u32;
    (w.clamp(1, 16_384), h.clamp(1, 16_384))
}

/// Rasterize a text object through `usvg`/`resvg`.
///
/// Without any usable font the result is fully transparent.
pub(crate) fn rasterize_text(
    text: &TextObject,
    fontdb: Arc<usvg::fontdb::Database>,
) -> MaskResult<TextRaster> {
    let (width, height) = text_box(text);
    let c = text.fill;
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}"><text x="0" y="{baseline}" font-family="sans-serif" font-size="{size}" fill="rgb({r},{g},{b})" fill-opacity="{a}">{body}</text></svg>"#,
        baseline = text.font_size,
        size = text.font_size,
        r = c.r,
        g = c.g,
        b = c.b,
        a = c.alpha_f64(),
        body = escape_xml(&text.text),
    );

    let opts = usvg::Options {
        fontdb,
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opts).context("parse text svg")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| MaskError::render("failed to allocate text pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    Ok(TextRaster {
        width,
        height,
        rgba8_premul: pixmap.data().to_vec(),
    })
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
