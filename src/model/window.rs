use serde::{Deserialize, Serialize};

use crate::model::geometry::{Rect, Size};

/// Opaque display-server window identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u32);

/// Narrow surface the layout core needs from a real window. Implementations
/// live with the display-server glue; the core only reads outer geometry and
/// delegates geometry writes.
pub trait WindowHandle {
    fn outer_geometry(&self) -> Rect;

    fn move_and_resize(&mut self, frame: Rect);

    /// Constrains the window so later geometry writes cannot shrink it below
    /// a usable size. Applied before every `move_and_resize`.
    fn set_minimum_size(&mut self, min: Size);
}

/// Which edges of a window the user dragged during a resize gesture. A
/// diagonal drag sets one horizontal and one vertical flag at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DragDirections {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub top: bool,
    #[serde(default)]
    pub bottom: bool,
}

impl DragDirections {
    pub fn any(self) -> bool { self.left || self.right || self.top || self.bottom }
}
