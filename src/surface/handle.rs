use std::cell::Cell;
use std::rc::Rc;

/// The host drawable a surface binds to.
///
/// Clones share the same binding counter, so hosts can observe whether a surface is currently
/// attached to their element.
#[derive(Clone, Debug)]
pub struct SurfaceHandle {
    label: Rc<str>,
    bindings: Rc<Cell<u32>>,
}

impl SurfaceHandle {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self {
            label: Rc::from(label.as_ref()),
            bindings: Rc::new(Cell::new(0)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of live surfaces bound to this element.
    pub fn binding_count(&self) -> u32 {
        self.bindings.get()
    }

    pub(crate) fn bind(&self) {
        self.bindings.set(self.bindings.get() + 1);
    }

    pub(crate) fn release(&self) {
        self.bindings.set(self.bindings.get().saturating_sub(1));
    }
}
