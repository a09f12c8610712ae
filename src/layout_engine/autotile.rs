use tracing::{debug, info};

use crate::common::config::TilingSettings;
use crate::layout_engine::columns::{column_count, column_widths, master_column, rows_per_column};
use crate::layout_engine::systems::LayoutSystem;
use crate::model::client::{Client, ClientPool, Location, Proportions};
use crate::model::geometry::{Rect, Size};
use crate::model::window::{DragDirections, WindowId};

/// Sums within this distance of 1 are treated as already normalized.
const PROPORTION_TOLERANCE: f64 = 0.001;

/// Column-based autotiling for one workspace: windows are dealt into
/// columns in stacking order, the master region keeps visual dominance, and
/// column widths follow a user-adjustable proportion table.
pub struct AutotileLayout {
    name: &'static str,
    manager: ClientPool,
    columns: usize,
    columns_default: usize,
    column_props: Vec<f64>,
    settings: TilingSettings,
}

impl AutotileLayout {
    pub fn new(location: Location, settings: TilingSettings) -> Self {
        let columns_default = settings.columns_default.clamp(1, settings.columns_max.max(1));
        Self {
            name: "autotile",
            manager: ClientPool::new(location, &settings),
            columns: columns_default,
            columns_default,
            column_props: equal_column_props(settings.columns_max),
            settings,
        }
    }

    pub fn columns(&self) -> usize { self.columns }

    pub fn column_props(&self) -> &[f64] { &self.column_props[..self.columns.min(self.column_props.len())] }

    fn place(&mut self, desktop: Rect, cols: usize, csize: usize) {
        let (dx, dy, dw, dh) = desktop.pieces();
        let gap = self.settings.gap;

        let widths = column_widths(dw, cols, &self.column_props, self.settings.proportion_min);
        let master = master_column(cols);
        let rows = rows_per_column(csize, cols, master);

        let min = Size::new(
            ((dw - 2 * gap) as f64 * self.settings.proportion_min).round() as i32,
            ((dh - 2 * gap) as f64 * self.settings.proportion_min).round() as i32,
        );

        let mut current = 0usize;
        for (col, &row_count) in rows.iter().enumerate() {
            if row_count == 0 {
                continue;
            }

            let mut x = dx + widths[..col].iter().sum::<i32>();
            let mut width = widths[col];

            // half gap between columns, full gap at the screen edges
            if col > 0 {
                x += gap / 2;
                width -= gap / 2;
            }
            if col < cols - 1 {
                width -= gap / 2;
            }

            // rows divide the column height evenly; the first rows absorb
            // the remainder pixel by pixel
            let row_height = dh / row_count as i32;
            let row_remainder = dh % row_count as i32;
            let row_heights: Vec<i32> = (0..row_count)
                .map(|row| row_height + if (row as i32) < row_remainder { 1 } else { 0 })
                .collect();

            for row in 0..row_count {
                if current >= csize {
                    break;
                }

                let mut y = dy + row_heights[..row].iter().sum::<i32>();
                let mut height = row_heights[row];

                if row > 0 {
                    y += gap / 2;
                    height -= gap / 2;
                }
                if row < row_count - 1 {
                    height -= gap / 2;
                }

                let mut frame = Rect::new(x, y, width, height);
                if col == 0 {
                    frame.x += gap;
                    frame.w -= gap;
                }
                if col == cols - 1 {
                    frame.w -= gap;
                }
                if row == 0 {
                    frame.y += gap;
                    frame.h -= gap;
                }
                if row == row_count - 1 {
                    frame.h -= gap;
                }

                let client = &mut self.manager.stacked_mut()[current];
                client.set_minimum_size(min);
                client.move_and_resize(frame);

                current += 1;
            }
        }
    }

    fn adjust_active_column_proportion(&mut self, increase: bool, desktop: Rect) {
        let Some(active) = self.manager.active_client() else {
            return;
        };
        if self.columns < 2 {
            return;
        }

        let col = self.column_of(active.outer_geometry(), desktop);
        if col >= self.columns {
            return;
        }

        let step = if increase {
            self.settings.proportion_step
        } else {
            -self.settings.proportion_step
        };

        if col == 0 {
            // leftmost trades with its right neighbor
            self.column_props[col] += step;
            self.column_props[col + 1] -= step;
        } else if col == self.columns - 1 {
            // rightmost trades with its left neighbor
            self.column_props[col] += step;
            self.column_props[col - 1] -= step;
        } else {
            // interior columns trade half the step with each neighbor
            self.column_props[col] += step;
            self.column_props[col - 1] -= step / 2.0;
            self.column_props[col + 1] -= step / 2.0;
        }

        let min = self.settings.proportion_min;
        for prop in self.column_props.iter_mut().take(self.columns) {
            *prop = prop.clamp(min, 1.0 - min);
        }

        self.normalize_column_props();

        debug!(
            "Column {} proportion {} to {:.3}",
            col,
            if increase { "increased" } else { "decreased" },
            self.column_props[col]
        );
    }

    /// Equal-slice column lookup. This intentionally ignores the rendered
    /// widths from the proportion table, so a window hugging a boundary can
    /// be attributed to the neighbor column when proportions are unequal.
    fn column_of(&self, window: Rect, desktop: Rect) -> usize {
        if desktop.w <= 0 {
            return 0;
        }
        let rel = (window.x - desktop.x) as f64 / desktop.w as f64;
        let slice = 1.0 / self.columns as f64;
        for col in 0..self.columns {
            if rel < (col + 1) as f64 * slice {
                return col;
            }
        }
        self.columns - 1
    }

    fn normalize_column_props(&mut self) {
        if self.columns <= 1 {
            return;
        }
        let total: f64 = self.column_props.iter().take(self.columns).sum();
        if total > 0.0 && (total - 1.0).abs() > PROPORTION_TOLERANCE {
            for prop in self.column_props.iter_mut().take(self.columns) {
                *prop /= total;
            }
        }
    }

    /// Stacking index the first master window occupies, derived from the
    /// same row distribution `apply` would use for the current population.
    fn master_slot_index(&self) -> usize {
        let csize = self.manager.len();
        let cols = if csize <= 1 { 1 } else { csize.min(self.columns) };
        let master = master_column(cols);
        let rows = rows_per_column(csize, cols, master);
        rows[..master].iter().sum()
    }
}

impl LayoutSystem for AutotileLayout {
    fn apply(&mut self, desktop: Rect) {
        let csize = self.manager.len();
        if csize == 0 {
            return;
        }

        let cols = column_count(
            csize,
            self.columns,
            desktop.w,
            self.settings.ultrawide_threshold,
            self.settings.columns_max,
        );

        let location = self.manager.location();
        info!(
            "Tile {} windows with {} layout ({} columns) [workspace-{}-{}]",
            csize, self.name, cols, location.desktop, location.screen
        );

        self.place(desktop, cols, csize);
    }

    fn reset(&mut self) {
        let baseline = ClientPool::new(self.manager.location(), &self.settings);

        while self.manager.master_capacity() < baseline.master_capacity() {
            self.manager.increase_master();
        }
        while self.manager.master_capacity() > baseline.master_capacity() {
            self.manager.decrease_master();
        }

        while self.manager.slave_capacity() < baseline.slave_capacity() {
            self.manager.increase_slave();
        }
        while self.manager.slave_capacity() > baseline.slave_capacity() {
            self.manager.decrease_slave();
        }

        self.manager.set_proportions(Proportions::new(&self.settings));
        self.columns = self.columns_default;
        self.column_props = equal_column_props(self.settings.columns_max);
    }

    fn increase_master(&mut self) { self.manager.increase_master() }

    fn decrease_master(&mut self) { self.manager.decrease_master() }

    fn increase_slave(&mut self) { self.manager.increase_slave() }

    fn decrease_slave(&mut self) { self.manager.decrease_slave() }

    fn increase_column(&mut self) {
        if self.columns < self.settings.columns_max {
            self.columns += 1;
            info!("Increase columns to {}", self.columns);
        }
    }

    fn decrease_column(&mut self) {
        if self.columns > 1 {
            self.columns -= 1;
            info!("Decrease columns to {}", self.columns);
        }
    }

    fn reset_columns(&mut self) {
        self.columns = self.columns_default;
        info!("Reset columns to default: {}", self.columns);
    }

    fn increase_proportion(&mut self, desktop: Rect) {
        self.adjust_active_column_proportion(true, desktop)
    }

    fn decrease_proportion(&mut self, desktop: Rect) {
        self.adjust_active_column_proportion(false, desktop)
    }

    fn reset_column_proportions(&mut self) {
        self.column_props = equal_column_props(self.settings.columns_max);
        info!("Reset column proportions to equal distribution");
    }

    fn update_proportions(&mut self, window: WindowId, directions: DragDirections, desktop: Rect) {
        let Some(client) = self.manager.client(window) else {
            return;
        };
        let (_, _, cw, ch) = client.outer_geometry().pieces();
        let (_, _, dw, dh) = desktop.pieces();
        if dw <= 0 || dh <= 0 {
            return;
        }

        let gap = self.settings.gap;
        let px = (cw + gap) as f64 / dw as f64;
        let py = (ch + gap) as f64 / dh as f64;

        if directions.left {
            self.manager.proportions_mut().set_master_slave(2, px, 0, 1);
        } else if directions.right {
            self.manager.proportions_mut().set_master_slave(2, px, 1, 0);
        }

        if directions.top {
            self.manager.proportions_mut().set_master_slave(2, py, 0, 1);
        } else if directions.bottom {
            self.manager.proportions_mut().set_master_slave(2, py, 1, 0);
        }
    }

    fn make_master(&mut self, window: WindowId) {
        if self.manager.is_empty() {
            return;
        }
        let Some(current) = self.manager.index_of(window) else {
            return;
        };

        let master = self.master_slot_index().min(self.manager.len() - 1);
        if current != master {
            self.manager.swap(current, master);
        }
    }

    fn add_client(&mut self, client: Client) { self.manager.add_client(client) }

    fn remove_client(&mut self, window: WindowId) -> Option<Client> {
        self.manager.remove_client(window)
    }

    fn active_client(&self) -> Option<&Client> { self.manager.active_client() }

    fn next_client(&mut self) -> Option<&Client> { self.manager.next_client() }

    fn previous_client(&mut self) -> Option<&Client> { self.manager.previous_client() }

    fn name(&self) -> &'static str { self.name }

    fn manager(&self) -> &ClientPool { &self.manager }

    fn manager_mut(&mut self) -> &mut ClientPool { &mut self.manager }
}

fn equal_column_props(columns_max: usize) -> Vec<f64> {
    let columns_max = columns_max.max(1);
    vec![1.0 / columns_max as f64; columns_max]
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::model::window::WindowHandle;

    #[derive(Clone, Default)]
    struct Recorder {
        geometry: Rc<RefCell<Rect>>,
        frames: Rc<RefCell<Vec<Rect>>>,
        minimums: Rc<RefCell<Vec<Size>>>,
    }

    impl Recorder {
        fn at(geometry: Rect) -> Self {
            let recorder = Recorder::default();
            *recorder.geometry.borrow_mut() = geometry;
            recorder
        }

        fn last_frame(&self) -> Rect { *self.frames.borrow().last().expect("no frame written") }
    }

    impl WindowHandle for Recorder {
        fn outer_geometry(&self) -> Rect { *self.geometry.borrow() }

        fn move_and_resize(&mut self, frame: Rect) {
            self.frames.borrow_mut().push(frame);
            *self.geometry.borrow_mut() = frame;
        }

        fn set_minimum_size(&mut self, min: Size) { self.minimums.borrow_mut().push(min); }
    }

    fn settings() -> TilingSettings { TilingSettings::default() }

    fn layout() -> AutotileLayout { AutotileLayout::new(Location::new(1, 0), settings()) }

    fn add_windows(layout: &mut AutotileLayout, count: u32) -> Vec<Recorder> {
        (0..count)
            .map(|id| {
                let recorder = Recorder::at(Rect::new(0, 0, 400, 300));
                layout.add_client(Client::new(WindowId(id), Box::new(recorder.clone())));
                recorder
            })
            .collect()
    }

    const DESKTOP: Rect = Rect { x: 0, y: 0, w: 1200, h: 800 };

    #[test]
    fn apply_on_empty_pool_is_a_no_op() {
        let mut layout = layout();
        layout.apply(DESKTOP);
        assert!(layout.manager().is_empty());
    }

    #[test]
    fn two_columns_share_the_desktop_with_gaps() {
        let mut layout = layout();
        let windows = add_windows(&mut layout, 2);
        layout.apply(DESKTOP);

        // 600px columns, full outer gap at the edges, half gap between
        assert_eq!(windows[0].last_frame(), Rect::new(10, 10, 585, 780));
        assert_eq!(windows[1].last_frame(), Rect::new(605, 10, 585, 780));
    }

    #[test]
    fn single_window_fills_the_desktop_minus_outer_gaps() {
        let mut layout = layout();
        layout.increase_column();
        layout.increase_column();
        let windows = add_windows(&mut layout, 1);
        layout.apply(DESKTOP);

        assert_eq!(windows[0].last_frame(), Rect::new(10, 10, 1180, 780));
    }

    #[test]
    fn five_windows_on_a_standard_desktop_stack_two_and_three() {
        let mut layout = layout();
        let windows = add_windows(&mut layout, 5);
        layout.apply(DESKTOP);

        // column 0 holds two slave rows, column 1 holds the master plus two
        let left: Vec<Rect> = windows[..2].iter().map(Recorder::last_frame).collect();
        let right: Vec<Rect> = windows[2..].iter().map(Recorder::last_frame).collect();

        assert!(left.iter().all(|f| f.x == 10 && f.w == 585));
        assert!(right.iter().all(|f| f.x == 605 && f.w == 585));
        assert_eq!(left[0].y, 10);
        assert!(left[1].y > left[0].y + left[0].h);
        assert_eq!(right.len(), 3);

        // rows fill the column exactly: last row ends at the bottom gap
        let last = right[2];
        assert_eq!(last.y + last.h, DESKTOP.h - 10);
    }

    #[test]
    fn minimum_size_is_constrained_before_each_write() {
        let mut layout = layout();
        let windows = add_windows(&mut layout, 2);
        layout.apply(DESKTOP);

        // (1200 - 20) * 0.1 by (800 - 20) * 0.1
        assert_eq!(windows[0].minimums.borrow().last(), Some(&Size::new(118, 78)));
        let frames = windows[0].frames.borrow().len();
        let minimums = windows[0].minimums.borrow().len();
        assert_eq!(frames, minimums);
    }

    #[test]
    fn apply_is_deterministic_for_an_unchanged_pool() {
        let mut layout = layout();
        let windows = add_windows(&mut layout, 5);
        layout.apply(DESKTOP);
        let first: Vec<Rect> = windows.iter().map(Recorder::last_frame).collect();

        layout.apply(DESKTOP);
        let second: Vec<Rect> = windows.iter().map(Recorder::last_frame).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ultrawide_desktop_unlocks_more_columns() {
        let mut layout = layout();
        layout.increase_column();
        assert_eq!(layout.columns(), 3);
        let windows = add_windows(&mut layout, 3);

        let wide = Rect::new(0, 0, 3440, 1440);
        layout.apply(wide);
        let xs: Vec<i32> = windows.iter().map(|w| w.last_frame().x).collect();
        assert_eq!(xs.len(), 3);
        assert!(xs[0] < xs[1] && xs[1] < xs[2]);

        // the same population on a standard desktop collapses to 2 columns,
        // with the slave column taking the extra row
        layout.apply(DESKTOP);
        let xs: Vec<i32> = windows.iter().map(|w| w.last_frame().x).collect();
        assert_eq!(xs.iter().filter(|&&x| x == 10).count(), 2);
        assert_eq!(xs.iter().filter(|&&x| x == 605).count(), 1);
    }

    #[test]
    fn grow_shrink_trades_with_the_single_neighbor_at_the_edge() {
        let mut layout = layout();
        layout.increase_column();
        let windows = add_windows(&mut layout, 3);
        layout.column_props[..4].copy_from_slice(&[0.333, 0.333, 0.334, 0.25]);

        // place a window in the rightmost third and make it active
        *windows[2].geometry.borrow_mut() = Rect::new(900, 0, 280, 800);
        layout.manager_mut().set_active(WindowId(2));

        layout.increase_proportion(DESKTOP);

        let props = layout.column_props();
        assert!((props[0] - 0.333).abs() < 1e-9, "props {props:?}");
        assert!((props[1] - 0.283).abs() < 1e-9, "props {props:?}");
        assert!((props[2] - 0.384).abs() < 1e-9, "props {props:?}");

        layout.decrease_proportion(DESKTOP);
        let props = layout.column_props();
        assert!((props[1] - 0.333).abs() < 1e-9, "props {props:?}");
        assert!((props[2] - 0.334).abs() < 1e-9, "props {props:?}");
    }

    #[test]
    fn interior_column_trades_half_with_each_neighbor() {
        let mut layout = layout();
        layout.increase_column();
        let windows = add_windows(&mut layout, 3);
        layout.column_props[..4].copy_from_slice(&[0.333, 0.333, 0.334, 0.25]);

        *windows[1].geometry.borrow_mut() = Rect::new(500, 0, 280, 800);
        layout.manager_mut().set_active(WindowId(1));

        layout.increase_proportion(DESKTOP);

        let props = layout.column_props();
        assert!((props[0] - 0.308).abs() < 1e-9, "props {props:?}");
        assert!((props[1] - 0.383).abs() < 1e-9, "props {props:?}");
        assert!((props[2] - 0.309).abs() < 1e-9, "props {props:?}");
    }

    #[test]
    fn adjustments_keep_proportions_normalized_and_clamped() {
        let mut layout = layout();
        layout.increase_column();
        let windows = add_windows(&mut layout, 3);
        *windows[0].geometry.borrow_mut() = Rect::new(0, 0, 280, 800);
        layout.manager_mut().set_active(WindowId(0));

        for _ in 0..30 {
            layout.increase_proportion(DESKTOP);
        }

        // clamping happens before renormalization, so entries can settle a
        // little below the configured minimum but never collapse or invert
        let props = layout.column_props();
        let total: f64 = props.iter().sum();
        assert!((total - 1.0).abs() < 1e-6, "props {props:?}");
        for prop in props {
            assert!(*prop > 0.05 && *prop < 0.95, "props {props:?}");
        }
        assert!(props[0] > props[1], "props {props:?}");
    }

    #[test]
    fn proportion_commands_without_an_active_window_are_no_ops() {
        let mut layout = layout();
        add_windows(&mut layout, 3);
        let before = layout.column_props.clone();

        layout.increase_proportion(DESKTOP);
        layout.decrease_proportion(DESKTOP);
        assert_eq!(layout.column_props, before);
    }

    #[test]
    fn drag_gestures_write_the_legacy_master_slave_slot() {
        let mut layout = layout();
        let windows = add_windows(&mut layout, 2);
        *windows[0].geometry.borrow_mut() = Rect::new(0, 0, 580, 380);

        layout.update_proportions(
            WindowId(0),
            DragDirections { left: true, ..Default::default() },
            DESKTOP,
        );
        let slot = layout.manager().proportions().master_slave(2).unwrap().to_vec();
        assert!((slot[0] - 590.0 / 1200.0).abs() < 1e-9, "slot {slot:?}");
        assert!((slot[0] + slot[1] - 1.0).abs() < 1e-9, "slot {slot:?}");

        layout.update_proportions(
            WindowId(0),
            DragDirections { right: true, bottom: true, ..Default::default() },
            DESKTOP,
        );
        let slot = layout.manager().proportions().master_slave(2).unwrap().to_vec();
        // the vertical write lands last, favoring the bottom slot
        assert!((slot[1] - 390.0 / 800.0).abs() < 1e-9, "slot {slot:?}");

        // unknown windows leave the slot alone
        layout.update_proportions(
            WindowId(99),
            DragDirections { left: true, ..Default::default() },
            DESKTOP,
        );
        let unchanged = layout.manager().proportions().master_slave(2).unwrap().to_vec();
        assert_eq!(unchanged, slot);
    }

    #[test]
    fn make_master_swaps_into_the_master_slot() {
        let mut layout = layout();
        add_windows(&mut layout, 5);

        // 5 windows over 2 columns put the master slot at stacking index 2
        layout.make_master(WindowId(4));
        let ids: Vec<WindowId> = layout.manager().stacked().iter().map(Client::id).collect();
        assert_eq!(ids, vec![
            WindowId(0),
            WindowId(1),
            WindowId(4),
            WindowId(3),
            WindowId(2)
        ]);

        // promoting the occupant again changes nothing
        layout.make_master(WindowId(4));
        let again: Vec<WindowId> = layout.manager().stacked().iter().map(Client::id).collect();
        assert_eq!(again, ids);

        // unknown windows are ignored
        layout.make_master(WindowId(42));
        let still: Vec<WindowId> = layout.manager().stacked().iter().map(Client::id).collect();
        assert_eq!(still, ids);
    }

    #[test]
    fn reset_restores_the_constructed_baseline() {
        let mut layout = layout();
        add_windows(&mut layout, 4);

        layout.increase_column();
        layout.increase_master();
        layout.increase_slave();
        layout.column_props[0] = 0.7;

        layout.reset();
        assert_eq!(layout.columns(), 2);
        assert_eq!(layout.manager().master_capacity(), 1);
        assert_eq!(layout.manager().slave_capacity(), 2);
        assert_eq!(layout.column_props, vec![0.25, 0.25, 0.25, 0.25]);

        // resetting twice lands in the same state
        layout.reset();
        assert_eq!(layout.columns(), 2);
        assert_eq!(layout.manager().master_capacity(), 1);
        assert_eq!(layout.manager().slave_capacity(), 2);
        assert_eq!(layout.column_props, vec![0.25, 0.25, 0.25, 0.25]);
    }

    #[test]
    fn column_commands_clamp_to_the_configured_range() {
        let mut layout = layout();
        for _ in 0..10 {
            layout.increase_column();
        }
        assert_eq!(layout.columns(), 4);

        for _ in 0..10 {
            layout.decrease_column();
        }
        assert_eq!(layout.columns(), 1);

        layout.reset_columns();
        assert_eq!(layout.columns(), 2);
    }

    #[test]
    fn reset_column_proportions_restores_the_equal_split() {
        let mut layout = layout();
        layout.column_props[..2].copy_from_slice(&[0.6, 0.15]);
        layout.reset_column_proportions();
        assert_eq!(layout.column_props, vec![0.25, 0.25, 0.25, 0.25]);
    }
}
