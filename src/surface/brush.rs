use crate::foundation::core::{BezPath, Point, Rgba8, Vec2};
use crate::palette::definition::{ColorDefinition, ColorId};
use crate::surface::scene::StrokeObject;

/// Free-hand brush state while annotation mode is active.
#[derive(Clone, Debug, PartialEq)]
pub struct FreehandBrush {
    pub paint: Rgba8,
    pub color_id: ColorId,
    pub width: f64,
}

impl FreehandBrush {
    pub fn for_color(color: &ColorDefinition, width: f64) -> Self {
        Self {
            paint: color.paint_value(),
            color_id: color.id.clone(),
            width,
        }
    }

    pub(crate) fn retarget(&mut self, color: &ColorDefinition) {
        self.paint = color.paint_value();
        self.color_id = color.id.clone();
    }

    /// Turn a finished drag into a stroke carrying this brush's current paint.
    pub(crate) fn finish(&self, points: &[Point]) -> Option<StrokeObject> {
        Some(StrokeObject {
            path: smooth_polyline(points)?,
            paint: self.paint,
            color_id: self.color_id.clone(),
            width: self.width,
        })
    }
}

/// Collects pointer samples for the drag in progress.
#[derive(Clone, Debug, Default)]
pub(crate) struct DragState {
    points: Vec<Point>,
}

impl DragState {
    pub(crate) fn start(p: Point) -> Self {
        Self { points: vec![p] }
    }

    pub(crate) fn push(&mut self, p: Point) {
        // Coincident samples add nothing to the path.
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
    }

    pub(crate) fn points(&self) -> &[Point] {
        &self.points
    }
}

/// Build a smooth path through pointer samples.
///
/// Each sample becomes the control point of a quadratic segment ending at the midpoint to the
/// next sample. A single sample yields a tiny segment so round caps still paint a dot.
pub fn smooth_polyline(points: &[Point]) -> Option<BezPath> {
    let (&first, rest) = points.split_first()?;
    let mut path = BezPath::new();
    path.move_to(first);

    let Some(&last) = rest.last() else {
        path.line_to(first + Vec2::new(0.01, 0.0));
        return Some(path);
    };

    let mut prev = first;
    for &p in rest {
        path.quad_to(prev, prev.midpoint(p));
        prev = p;
    }
    path.line_to(last);
    Some(path)
}

#[cfg(test)]
#[path = "../../tests/unit/surface/brush.rs"]
mod tests;
