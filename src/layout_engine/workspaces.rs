use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::config::TilingSettings;
use crate::layout_engine::autotile::AutotileLayout;
use crate::layout_engine::systems::{LayoutSystem, LayoutSystemKind};
use crate::model::client::Location;
use crate::model::geometry::Rect;
use crate::model::window::{DragDirections, WindowId};

/// Operations a controller (or its IPC surface) can request against one
/// workspace's layout. Mirrors the `LayoutSystem` capability set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    Apply,
    Reset,
    IncreaseMaster,
    DecreaseMaster,
    IncreaseSlave,
    DecreaseSlave,
    IncreaseColumn,
    DecreaseColumn,
    ResetColumns,
    IncreaseProportion,
    DecreaseProportion,
    ResetColumnProportions,
    UpdateProportions {
        window: WindowId,
        directions: DragDirections,
    },
    MakeMaster {
        window: WindowId,
    },
    NextClient,
    PreviousClient,
}

/// One owned layout per (desktop, screen) pair, created the first time a
/// workspace is seen and dropped with it. Distinct locations share no
/// mutable state, so a controller may drive them from independent tasks.
#[derive(Default)]
pub struct WorkspaceLayouts {
    map: FxHashMap<Location, LayoutSystemKind>,
}

impl WorkspaceLayouts {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, location: Location) -> Option<&LayoutSystemKind> {
        self.map.get(&location)
    }

    pub fn layout_mut(
        &mut self,
        location: Location,
        settings: &TilingSettings,
    ) -> &mut LayoutSystemKind {
        self.map.entry(location).or_insert_with(|| {
            debug!(
                "Creating autotile layout for workspace-{}-{}",
                location.desktop, location.screen
            );
            LayoutSystemKind::Autotile(AutotileLayout::new(location, settings.clone()))
        })
    }

    pub fn remove(&mut self, location: Location) -> Option<LayoutSystemKind> {
        self.map.remove(&location)
    }

    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        self.map.keys().copied()
    }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    /// Routes a command into the workspace's layout, creating the layout on
    /// first contact. Returns the newly active window for focus-cycling
    /// commands, `None` otherwise.
    pub fn dispatch(
        &mut self,
        location: Location,
        settings: &TilingSettings,
        desktop: Rect,
        command: LayoutCommand,
    ) -> Option<WindowId> {
        let layout = self.layout_mut(location, settings);
        match command {
            LayoutCommand::Apply => layout.apply(desktop),
            LayoutCommand::Reset => layout.reset(),
            LayoutCommand::IncreaseMaster => layout.increase_master(),
            LayoutCommand::DecreaseMaster => layout.decrease_master(),
            LayoutCommand::IncreaseSlave => layout.increase_slave(),
            LayoutCommand::DecreaseSlave => layout.decrease_slave(),
            LayoutCommand::IncreaseColumn => layout.increase_column(),
            LayoutCommand::DecreaseColumn => layout.decrease_column(),
            LayoutCommand::ResetColumns => layout.reset_columns(),
            LayoutCommand::IncreaseProportion => layout.increase_proportion(desktop),
            LayoutCommand::DecreaseProportion => layout.decrease_proportion(desktop),
            LayoutCommand::ResetColumnProportions => layout.reset_column_proportions(),
            LayoutCommand::UpdateProportions { window, directions } => {
                layout.update_proportions(window, directions, desktop)
            }
            LayoutCommand::MakeMaster { window } => layout.make_master(window),
            LayoutCommand::NextClient => return layout.next_client().map(|c| c.id()),
            LayoutCommand::PreviousClient => return layout.previous_client().map(|c| c.id()),
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::model::client::Client;
    use crate::model::geometry::Size;
    use crate::model::window::WindowHandle;

    struct NullWindow;

    impl WindowHandle for NullWindow {
        fn outer_geometry(&self) -> Rect { Rect::default() }

        fn move_and_resize(&mut self, _frame: Rect) {}

        fn set_minimum_size(&mut self, _min: Size) {}
    }

    const DESKTOP: Rect = Rect { x: 0, y: 0, w: 1920, h: 1080 };

    #[test]
    fn layouts_are_created_on_first_sight() {
        let settings = TilingSettings::default();
        let mut workspaces = WorkspaceLayouts::new();
        assert!(workspaces.is_empty());

        let location = Location::new(2, 0);
        workspaces.layout_mut(location, &settings);
        assert_eq!(workspaces.len(), 1);
        assert!(workspaces.get(location).is_some());
        assert!(workspaces.get(Location::new(0, 0)).is_none());

        // a second sighting reuses the existing layout
        workspaces.layout_mut(location, &settings).increase_column();
        workspaces.layout_mut(location, &settings);
        assert_eq!(workspaces.len(), 1);
    }

    #[test]
    fn locations_keep_independent_state() {
        let settings = TilingSettings::default();
        let mut workspaces = WorkspaceLayouts::new();

        let a = Location::new(0, 0);
        let b = Location::new(0, 1);
        workspaces.dispatch(a, &settings, DESKTOP, LayoutCommand::IncreaseColumn);

        let cols_of = |kind: &LayoutSystemKind| match kind {
            LayoutSystemKind::Autotile(layout) => layout.columns(),
        };
        workspaces.layout_mut(b, &settings);
        assert_eq!(cols_of(workspaces.get(a).unwrap()), 3);
        assert_eq!(cols_of(workspaces.get(b).unwrap()), 2);
    }

    #[test]
    fn dispatch_cycles_focus_and_reports_the_new_active_window() {
        let settings = TilingSettings::default();
        let mut workspaces = WorkspaceLayouts::new();
        let location = Location::new(1, 0);

        let layout = workspaces.layout_mut(location, &settings);
        for id in 0..3 {
            layout.add_client(Client::new(WindowId(id), Box::new(NullWindow)));
        }

        let focused = workspaces.dispatch(location, &settings, DESKTOP, LayoutCommand::NextClient);
        assert_eq!(focused, Some(WindowId(0)));
        let focused = workspaces.dispatch(location, &settings, DESKTOP, LayoutCommand::NextClient);
        assert_eq!(focused, Some(WindowId(1)));
        let focused =
            workspaces.dispatch(location, &settings, DESKTOP, LayoutCommand::PreviousClient);
        assert_eq!(focused, Some(WindowId(0)));

        let none = workspaces.dispatch(location, &settings, DESKTOP, LayoutCommand::Apply);
        assert_eq!(none, None);
    }

    #[test]
    fn removing_a_workspace_drops_its_layout() {
        let settings = TilingSettings::default();
        let mut workspaces = WorkspaceLayouts::new();
        let location = Location::new(3, 1);

        workspaces.layout_mut(location, &settings);
        assert!(workspaces.remove(location).is_some());
        assert!(workspaces.get(location).is_none());
        assert!(workspaces.remove(location).is_none());
    }

    #[test]
    fn commands_round_trip_through_serde() {
        let command = LayoutCommand::UpdateProportions {
            window: WindowId(9),
            directions: DragDirections { right: true, bottom: true, ..Default::default() },
        };
        let json = serde_json::to_string(&command).unwrap();
        let back: LayoutCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, command);
    }
}
