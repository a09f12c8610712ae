pub mod client;
pub mod geometry;
pub mod window;

pub use client::{Client, ClientPool, Location, Proportions};
pub use geometry::{Rect, Size};
pub use window::{DragDirections, WindowHandle, WindowId};
