use crate::assets::decode::PreparedImage;
use crate::foundation::core::{BezPath, CanvasSize, ObjectId, Point, Rect, Rgba8};
use crate::palette::definition::ColorId;

/// Raster image placed into a destination rectangle (scaled to fill it).
#[derive(Clone, Debug)]
pub struct ImageObject {
    pub image: PreparedImage,
    pub dest: Rect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RectObject {
    pub rect: Rect,
    pub fill: Rgba8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CircleObject {
    pub center: Point,
    pub radius: f64,
    pub fill: Rgba8,
}

/// Single-line text. `origin` is the top-left corner of the line box.
#[derive(Clone, Debug, PartialEq)]
pub struct TextObject {
    pub text: String,
    pub origin: Point,
    pub font_size: f64,
    pub fill: Rgba8,
}

/// A free-hand annotation path.
///
/// `paint` and `color_id` are captured from the brush when the stroke is created and never
/// re-derived from later brush state.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeObject {
    pub path: BezPath,
    pub paint: Rgba8,
    pub color_id: ColorId,
    pub width: f64,
}

#[derive(Clone, Debug)]
pub enum ObjectKind {
    Image(ImageObject),
    Rect(RectObject),
    Circle(CircleObject),
    Text(TextObject),
    Stroke(StrokeObject),
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::Rect(_) => "rect",
            Self::Circle(_) => "circle",
            Self::Text(_) => "text",
            Self::Stroke(_) => "stroke",
        }
    }
}

/// One node of the surface's object graph.
#[derive(Clone, Debug)]
pub struct CanvasObject {
    pub id: ObjectId,
    pub visible: bool,
    pub kind: ObjectKind,
}

impl CanvasObject {
    pub fn is_stroke(&self) -> bool {
        matches!(self.kind, ObjectKind::Stroke(_))
    }

    pub fn as_stroke(&self) -> Option<&StrokeObject> {
        match &self.kind {
            ObjectKind::Stroke(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_stroke_mut(&mut self) -> Option<&mut StrokeObject> {
        match &mut self.kind {
            ObjectKind::Stroke(s) => Some(s),
            _ => None,
        }
    }
}

/// Object graph plus background color: everything a raster backend needs to draw a frame.
///
/// Objects are painted in insertion order over the background.
#[derive(Clone, Debug)]
pub struct Scene {
    size: CanvasSize,
    background: Rgba8,
    objects: Vec<CanvasObject>,
    next_id: u64,
}

impl Scene {
    pub fn new(size: CanvasSize, background: Rgba8) -> Self {
        Self {
            size,
            background,
            objects: Vec::new(),
            next_id: 1,
        }
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn background(&self) -> Rgba8 {
        self.background
    }

    pub fn set_background(&mut self, background: Rgba8) {
        self.background = background;
    }

    pub fn objects(&self) -> &[CanvasObject] {
        &self.objects
    }

    pub(crate) fn objects_mut(&mut self) -> &mut [CanvasObject] {
        &mut self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Append a visible object on top of the stack.
    pub fn push(&mut self, kind: ObjectKind) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push(CanvasObject {
            id,
            visible: true,
            kind,
        });
        id
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Remove every stroke, keeping content objects.
    pub fn clear_strokes(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(|o| !o.is_stroke());
        before - self.objects.len()
    }

    pub fn strokes(&self) -> impl Iterator<Item = &StrokeObject> {
        self.objects.iter().filter_map(CanvasObject::as_stroke)
    }
}
