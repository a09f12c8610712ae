use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::common::config::TilingSettings;
use crate::model::geometry::{Rect, Size};
use crate::model::window::{WindowHandle, WindowId};

/// One desktop × screen pair; the unit of independent tiling state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub desktop: u32,
    pub screen: u32,
}

impl Location {
    pub fn new(desktop: u32, screen: u32) -> Self { Self { desktop, screen } }
}

/// A tileable window: its identity plus the handle the placement engine
/// writes geometry through.
pub struct Client {
    id: WindowId,
    handle: Box<dyn WindowHandle>,
}

impl Client {
    pub fn new(id: WindowId, handle: Box<dyn WindowHandle>) -> Self { Self { id, handle } }

    pub fn id(&self) -> WindowId { self.id }

    pub fn outer_geometry(&self) -> Rect { self.handle.outer_geometry() }

    pub fn move_and_resize(&mut self, frame: Rect) { self.handle.move_and_resize(frame) }

    pub fn set_minimum_size(&mut self, min: Size) { self.handle.set_minimum_size(min) }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("geometry", &self.outer_geometry())
            .finish()
    }
}

/// Legacy master/slave split shares, keyed by the number of parts the split
/// has (2 for a plain master/slave divide, 3 for a master flanked by two
/// slave regions). Column-based placement keeps its own proportion table;
/// this one exists so non-column layouts sharing the pool stay consistent.
#[derive(Clone, Debug, PartialEq)]
pub struct Proportions {
    master_slave: FxHashMap<usize, Vec<f64>>,
    proportion_min: f64,
}

impl Proportions {
    pub fn new(settings: &TilingSettings) -> Self {
        let min = settings.proportion_min;
        let split = settings.master_split.clamp(min, 1.0 - min);

        let mut master_slave = FxHashMap::default();
        master_slave.insert(2, vec![split, 1.0 - split]);
        master_slave.insert(3, vec![split, (1.0 - split) / 2.0, (1.0 - split) / 2.0]);

        Self { master_slave, proportion_min: min }
    }

    pub fn master_slave(&self, parts: usize) -> Option<&[f64]> {
        self.master_slave.get(&parts).map(Vec::as_slice)
    }

    /// Writes `value` into the `favored` slot of the `parts`-way split and
    /// gives whatever share remains to the `other` slot. Both ends are
    /// clamped so neither side collapses below the configured minimum.
    pub fn set_master_slave(&mut self, parts: usize, value: f64, favored: usize, other: usize) {
        let min = self.proportion_min;
        let Some(slot) = self.master_slave.get_mut(&parts) else {
            return;
        };
        if favored == other || favored >= slot.len() || other >= slot.len() {
            return;
        }

        let rest: f64 = slot
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != favored && i != other)
            .map(|(_, v)| *v)
            .sum();

        slot[favored] = value.clamp(min, 1.0 - min);
        slot[other] = (1.0 - slot[favored] - rest).clamp(min, 1.0 - min);
    }
}

/// Ordered set of the workspace's tileable windows in stacking order.
///
/// Master/slave membership is the stacking sequence plus a derived partition
/// index (`min(master capacity, len)`); the two sets can never drift apart
/// because neither is stored separately.
pub struct ClientPool {
    location: Location,
    clients: Vec<Client>,
    master_capacity: usize,
    slave_capacity: usize,
    masters_max: usize,
    slaves_max: usize,
    active: Option<WindowId>,
    proportions: Proportions,
}

impl ClientPool {
    pub fn new(location: Location, settings: &TilingSettings) -> Self {
        Self {
            location,
            clients: Vec::new(),
            master_capacity: settings.masters_default.max(1),
            slave_capacity: settings.slaves_default.max(1),
            masters_max: settings.masters_max.max(1),
            slaves_max: settings.slaves_max.max(1),
            active: None,
            proportions: Proportions::new(settings),
        }
    }

    pub fn location(&self) -> Location { self.location }

    pub fn len(&self) -> usize { self.clients.len() }

    pub fn is_empty(&self) -> bool { self.clients.is_empty() }

    /// All clients in stacking order, masters first.
    pub fn stacked(&self) -> &[Client] { &self.clients }

    pub fn stacked_mut(&mut self) -> &mut [Client] { &mut self.clients }

    /// Index of the first slave slot.
    pub fn partition(&self) -> usize { self.master_capacity.min(self.clients.len()) }

    pub fn masters(&self) -> &[Client] { &self.clients[..self.partition()] }

    pub fn slaves(&self) -> &[Client] { &self.clients[self.partition()..] }

    pub fn master_capacity(&self) -> usize { self.master_capacity }

    pub fn slave_capacity(&self) -> usize { self.slave_capacity }

    pub fn increase_master(&mut self) {
        if self.master_capacity < self.masters_max {
            self.master_capacity += 1;
            info!("Increase masters to {}", self.master_capacity);
        }
    }

    pub fn decrease_master(&mut self) {
        if self.master_capacity > 1 {
            self.master_capacity -= 1;
            info!("Decrease masters to {}", self.master_capacity);
        }
    }

    pub fn increase_slave(&mut self) {
        if self.slave_capacity < self.slaves_max {
            self.slave_capacity += 1;
            info!("Increase slaves to {}", self.slave_capacity);
        }
    }

    pub fn decrease_slave(&mut self) {
        if self.slave_capacity > 1 {
            self.slave_capacity -= 1;
            info!("Decrease slaves to {}", self.slave_capacity);
        }
    }

    pub fn add_client(&mut self, client: Client) {
        if self.index_of(client.id()).is_some() {
            warn!("Client {:?} already tracked, ignoring add", client.id());
            return;
        }
        self.clients.push(client);
    }

    pub fn remove_client(&mut self, id: WindowId) -> Option<Client> {
        let index = self.index_of(id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.clients.remove(index))
    }

    pub fn client(&self, id: WindowId) -> Option<&Client> {
        self.index_of(id).map(|i| &self.clients[i])
    }

    pub fn index_of(&self, id: WindowId) -> Option<usize> {
        self.clients.iter().position(|c| c.id() == id)
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        if a < self.clients.len() && b < self.clients.len() {
            self.clients.swap(a, b);
        }
    }

    pub fn set_active(&mut self, id: WindowId) -> bool {
        if self.index_of(id).is_some() {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn active_client(&self) -> Option<&Client> {
        self.active.and_then(|id| self.client(id))
    }

    /// Advances the active window one step through the stacking order,
    /// wrapping at the end, and returns the newly active client.
    pub fn next_client(&mut self) -> Option<&Client> { self.cycle_active(1) }

    /// Steps the active window backwards through the stacking order,
    /// wrapping at the front, and returns the newly active client.
    pub fn previous_client(&mut self) -> Option<&Client> { self.cycle_active(-1) }

    fn cycle_active(&mut self, step: isize) -> Option<&Client> {
        if self.clients.is_empty() {
            return None;
        }
        let len = self.clients.len() as isize;
        let index = match self.active.and_then(|id| self.index_of(id)) {
            Some(current) => (current as isize + step).rem_euclid(len) as usize,
            None if step >= 0 => 0,
            None => len as usize - 1,
        };
        self.active = Some(self.clients[index].id());
        self.clients.get(index)
    }

    pub fn proportions(&self) -> &Proportions { &self.proportions }

    pub fn proportions_mut(&mut self) -> &mut Proportions { &mut self.proportions }

    pub fn set_proportions(&mut self, proportions: Proportions) { self.proportions = proportions; }
}

impl fmt::Debug for ClientPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientPool")
            .field("location", &self.location)
            .field("clients", &self.clients)
            .field("master_capacity", &self.master_capacity)
            .field("slave_capacity", &self.slave_capacity)
            .field("active", &self.active)
            .finish()
    }
}
