mod autotile;
pub mod columns;
mod systems;
mod workspaces;

pub use autotile::AutotileLayout;
pub use systems::{LayoutSystem, LayoutSystemKind};
pub use workspaces::{LayoutCommand, WorkspaceLayouts};
