use enum_dispatch::enum_dispatch;

use crate::layout_engine::autotile::AutotileLayout;
use crate::model::client::{Client, ClientPool};
use crate::model::geometry::Rect;
use crate::model::window::{DragDirections, WindowId};

/// The capability set a workspace controller drives a layout through. One
/// instance serves one workspace; the owning dispatcher must serialize
/// calls, since nothing here locks internally.
///
/// Desktop geometry is supplied per call by the dispatcher; the layout never
/// talks to the display server itself.
#[enum_dispatch]
pub trait LayoutSystem {
    /// Computes and writes one geometry per pooled window, in stacking
    /// order. A retiling trigger (focus change, open/close, drag end) maps
    /// to exactly one call.
    fn apply(&mut self, desktop: Rect);

    /// Resynchronizes capacities, proportions, and column state to the
    /// configured baseline.
    fn reset(&mut self);

    fn increase_master(&mut self);
    fn decrease_master(&mut self);
    fn increase_slave(&mut self);
    fn decrease_slave(&mut self);

    fn increase_column(&mut self);
    fn decrease_column(&mut self);
    fn reset_columns(&mut self);

    /// Grows the active window's column by the configured step.
    fn increase_proportion(&mut self, desktop: Rect);
    /// Shrinks the active window's column by the configured step.
    fn decrease_proportion(&mut self, desktop: Rect);
    fn reset_column_proportions(&mut self);

    /// Folds a finished drag-resize gesture into the proportion state. Only
    /// mutates proportions; the next `apply` realizes them.
    fn update_proportions(&mut self, window: WindowId, directions: DragDirections, desktop: Rect);

    /// Swaps the window into the master slot of the stacking order.
    fn make_master(&mut self, window: WindowId);

    fn add_client(&mut self, client: Client);
    fn remove_client(&mut self, window: WindowId) -> Option<Client>;

    fn active_client(&self) -> Option<&Client>;
    fn next_client(&mut self) -> Option<&Client>;
    fn previous_client(&mut self) -> Option<&Client>;

    fn name(&self) -> &'static str;

    fn manager(&self) -> &ClientPool;
    fn manager_mut(&mut self) -> &mut ClientPool;
}

/// Closed set of layout strategies a workspace can run. Controllers hold
/// this and never branch on the concrete kind.
#[enum_dispatch(LayoutSystem)]
pub enum LayoutSystemKind {
    Autotile(AutotileLayout),
}
