//! Nearest-target lookups used by entities deciding whom to follow.
//!
//! Two implementations of [`SpatialQuery`]: an exact [`LinearScan`] and a
//! uniform [`SpatialGrid`] that is rebuilt once per tick.

use arena_core::{Entity, FollowTarget, Players, WorldBounds};
use glam::Vec2;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

/// Result of a successful nearest-target lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestTarget {
    pub target: FollowTarget,
    pub distance: f32,
}

pub trait SpatialQuery {
    /// Finds the closest living entity or player within `max_radius` of
    /// `entities[origin]`, never returning the origin itself.
    ///
    /// Equal distances resolve by [`FollowTarget`] ordering, so the answer is
    /// deterministic for a given world state.
    fn find_nearest_target(
        &self,
        origin: usize,
        max_radius: f32,
        entities: &[Entity],
        players: &Players,
    ) -> Option<NearestTarget>;
}

/// Keeps whichever of `best` and the candidate sorts first by (distance, target).
fn keep_closer(best: &mut Option<NearestTarget>, target: &FollowTarget, distance: f32) {
    let better = match best {
        None => true,
        Some(current) => {
            (OrderedFloat(distance), target) < (OrderedFloat(current.distance), &current.target)
        }
    };
    if better {
        *best = Some(NearestTarget {
            target: target.clone(),
            distance,
        });
    }
}

/// Current position of a candidate, if it still exists, is alive, and isn't the origin.
fn candidate_position(
    target: &FollowTarget,
    origin: usize,
    entities: &[Entity],
    players: &Players,
) -> Option<Vec2> {
    match target {
        FollowTarget::Entity(index) if *index == origin => None,
        FollowTarget::Entity(index) => entities
            .get(*index)
            .filter(|e| e.is_alive)
            .map(|e| e.pos),
        FollowTarget::Player(id) => players.get(id).filter(|p| p.is_alive).map(|p| p.pos),
    }
}

/// Brute-force search over every actor. Exact, O(n) per query.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearScan;

impl SpatialQuery for LinearScan {
    fn find_nearest_target(
        &self,
        origin: usize,
        max_radius: f32,
        entities: &[Entity],
        players: &Players,
    ) -> Option<NearestTarget> {
        let from = entities.get(origin)?.pos;
        let mut best = None;

        let candidates = (0..entities.len())
            .map(FollowTarget::Entity)
            .chain(players.keys().cloned().map(FollowTarget::Player));

        for target in candidates {
            if let Some(pos) = candidate_position(&target, origin, entities, players) {
                let distance = from.distance(pos);
                if distance <= max_radius {
                    keep_closer(&mut best, &target, distance);
                }
            }
        }
        best
    }
}

/// Uniform bucket grid over the arena.
///
/// Buckets hold positions as of the last [`SpatialGrid::rebuild`]; queries
/// re-read live positions and search one extra ring of cells, so actors that
/// moved up to a cell width since the rebuild are still found. Actors created
/// after the rebuild are invisible until the next one.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<SmallVec<[FollowTarget; 8]>>,
}

impl SpatialGrid {
    pub fn new(bounds: &WorldBounds, cell_size: f32) -> Self {
        let cols = ((bounds.width / cell_size).ceil() as usize).max(1);
        let rows = ((bounds.height / cell_size).ceil() as usize).max(1);
        Self {
            cell_size,
            cols,
            rows,
            cells: vec![SmallVec::new(); cols * rows],
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Grid cell for a position, clamped so out-of-bounds actors land on the edge.
    fn cell_of(&self, pos: Vec2) -> (usize, usize) {
        let col = ((pos.x / self.cell_size).floor() as i64).clamp(0, self.cols as i64 - 1);
        let row = ((pos.y / self.cell_size).floor() as i64).clamp(0, self.rows as i64 - 1);
        (col as usize, row as usize)
    }

    /// Clear all buckets and re-insert every living entity and player.
    pub fn rebuild(&mut self, entities: &[Entity], players: &Players) {
        for cell in &mut self.cells {
            cell.clear();
        }

        for (index, entity) in entities.iter().enumerate() {
            if entity.is_alive {
                self.insert(entity.pos, FollowTarget::Entity(index));
            }
        }
        for (id, player) in players {
            if player.is_alive {
                self.insert(player.pos, FollowTarget::Player(id.clone()));
            }
        }
    }

    fn insert(&mut self, pos: Vec2, target: FollowTarget) {
        let (col, row) = self.cell_of(pos);
        self.cells[row * self.cols + col].push(target);
    }

    pub fn occupancy(&self) -> usize {
        self.cells.iter().map(|cell| cell.len()).sum()
    }
}

impl SpatialQuery for SpatialGrid {
    fn find_nearest_target(
        &self,
        origin: usize,
        max_radius: f32,
        entities: &[Entity],
        players: &Players,
    ) -> Option<NearestTarget> {
        let from = entities.get(origin)?.pos;
        let (col, row) = self.cell_of(from);
        let reach = (max_radius / self.cell_size).ceil() as usize + 1;

        let col_range = col.saturating_sub(reach)..=(col + reach).min(self.cols - 1);
        let row_range = row.saturating_sub(reach)..=(row + reach).min(self.rows - 1);

        let mut best = None;
        for r in row_range {
            for c in col_range.clone() {
                for target in &self.cells[r * self.cols + c] {
                    if let Some(pos) = candidate_position(target, origin, entities, players) {
                        let distance = from.distance(pos);
                        if distance <= max_radius {
                            keep_closer(&mut best, target, distance);
                        }
                    }
                }
            }
        }
        best
    }
}
