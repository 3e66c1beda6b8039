//! Collision underlay: a grid of categorized solid cells, separate from visuals.
//!
//! Every solid cell carries a `SurfaceCategory`. `Ground` cells can be grabbed
//! by a hook and count as footing; `Unhookable` cells block movement but make a
//! hook drop instead of attaching.
//!
//! Player movement uses **axis-separable move-and-slide**: resolve X first
//! against the grid, then Y using the corrected X. This prevents diagonal
//! tunneling and gives the usual slide-along-walls feel.
//!
//! Gameplay code talks to the level only through the `Environment` trait:
//! contact events (identity + category), closest-point and overlap queries.

use glam::Vec2;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct CollisionFile {
    pub version: String,
    pub collision_id: String,
    pub cell_size: f32,
    #[serde(default)]
    pub origin: GridOrigin,
    pub width: i32,
    pub height: i32,
    pub solids: Vec<GridCell>,
    #[serde(default)]
    pub unhookable: Vec<GridCell>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct GridOrigin {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceCategory {
    Ground,
    Unhookable,
}

impl SurfaceCategory {
    pub fn is_grabbable(self) -> bool {
        matches!(self, Self::Ground)
    }
}

/// Identity of something a hook or probe can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceId {
    Cell(GridCell),
    /// A moving body, by index into the session's drone list.
    Body(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub surface: SurfaceId,
    pub category: SurfaceCategory,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub fn from_center(center: Vec2, half_w: f32, half_h: f32) -> Self {
        Self {
            center_x: center.x,
            center_y: center.y,
            half_w,
            half_h,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x, self.center_y)
    }

    /// Midpoint of the bottom edge; the ground probe sits here.
    pub fn feet(&self) -> Vec2 {
        Vec2::new(self.center_x, self.center_y - self.half_h)
    }

    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point
                .x
                .clamp(self.center_x - self.half_w, self.center_x + self.half_w),
            point
                .y
                .clamp(self.center_y - self.half_h, self.center_y + self.half_h),
        )
    }

    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        self.closest_point(center).distance_squared(center) <= radius * radius
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionMoveResult {
    pub aabb: Aabb,
    pub collided_y: bool,
    pub blocked_left: bool,
    pub blocked_right: bool,
    pub blocked_down: bool,
    pub blocked_up: bool,
}

/// Queries gameplay makes against the level. Implemented by `CollisionGrid`
/// and by the session's stage view, which adds moving bodies on top.
pub trait Environment {
    /// Everything overlapping a circle, in a deterministic order.
    fn contacts_at(&self, point: Vec2, radius: f32) -> Vec<Contact>;

    /// Closest point on `surface` to `point`; the point itself when inside.
    fn closest_point(&self, surface: SurfaceId, point: Vec2) -> Option<Vec2>;

    fn overlap_circle(&self, center: Vec2, radius: f32, category: SurfaceCategory) -> bool;

    fn move_and_collide(&self, aabb: Aabb, dx: f32, dy: f32) -> CollisionMoveResult;

    /// Current position of a moving body; static levels have none.
    fn body_position(&self, _body: usize) -> Option<Vec2> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct CollisionGrid {
    pub version: String,
    pub collision_id: String,
    pub cell_size: f32,
    pub origin: GridOrigin,
    pub width: i32,
    pub height: i32,
    solids: HashMap<GridCell, SurfaceCategory>,
}

impl CollisionGrid {
    pub fn from_file(file: CollisionFile) -> Self {
        let mut solids: HashMap<GridCell, SurfaceCategory> = file
            .solids
            .into_iter()
            .map(|cell| (cell, SurfaceCategory::Ground))
            .collect();
        for cell in file.unhookable {
            solids.insert(cell, SurfaceCategory::Unhookable);
        }
        Self {
            version: file.version,
            collision_id: file.collision_id,
            cell_size: file.cell_size,
            origin: file.origin,
            width: file.width,
            height: file.height,
            solids,
        }
    }

    /// A flat floor one cell thick across the whole width, for defaults and tests.
    pub fn flat(width: i32, height: i32, cell_size: f32, origin: GridOrigin) -> Self {
        Self::from_file(CollisionFile {
            version: "0.1".to_string(),
            collision_id: "flat".to_string(),
            cell_size,
            origin,
            width,
            height,
            solids: (0..width).map(|x| GridCell { x, y: 0 }).collect(),
            unhookable: Vec::new(),
        })
    }

    pub fn category(&self, x: i32, y: i32) -> Option<SurfaceCategory> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return None;
        }
        self.solids.get(&GridCell { x, y }).copied()
    }

    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        self.category(x, y).is_some()
    }

    pub fn cell_count(&self) -> usize {
        self.solids.len()
    }

    pub fn cell_aabb(&self, cell: GridCell) -> Aabb {
        let half = self.cell_size * 0.5;
        Aabb {
            center_x: self.cell_left_world(cell.x) + half,
            center_y: self.cell_bottom_world(cell.y) + half,
            half_w: half,
            half_h: half,
        }
    }

    pub fn move_and_collide_detailed(&self, aabb: Aabb, dx: f32, dy: f32) -> CollisionMoveResult {
        const EPS: f32 = 0.0001;

        let resolved_x = self.resolve_axis_x(aabb, dx);
        let x_expected = aabb.center_x + dx;
        let collided_x = (resolved_x - x_expected).abs() > EPS;

        let mut moved = aabb;
        moved.center_x = resolved_x;
        let resolved_y = self.resolve_axis_y(moved, dy);
        let y_expected = aabb.center_y + dy;
        let collided_y = (resolved_y - y_expected).abs() > EPS;
        moved.center_y = resolved_y;

        CollisionMoveResult {
            aabb: moved,
            collided_y,
            blocked_left: collided_x && dx < 0.0,
            blocked_right: collided_x && dx > 0.0,
            blocked_down: collided_y && dy < 0.0,
            blocked_up: collided_y && dy > 0.0,
        }
    }

    fn resolve_axis_x(&self, aabb: Aabb, dx: f32) -> f32 {
        if dx == 0.0 {
            return aabb.center_x;
        }

        const EPS: f32 = 0.001;
        let mut candidate_x = aabb.center_x + dx;
        let y0 = self.world_to_cell_y(aabb.center_y - aabb.half_h + EPS);
        let y1 = self.world_to_cell_y(aabb.center_y + aabb.half_h - EPS);

        if dx > 0.0 {
            let x_cell = self.world_to_cell_x(candidate_x + aabb.half_w - EPS);
            for y in y0..=y1 {
                if self.is_solid(x_cell, y) {
                    candidate_x = candidate_x.min(self.cell_left_world(x_cell) - aabb.half_w);
                }
            }
            // Never push opposite to the motion.
            candidate_x = candidate_x.max(aabb.center_x);
        } else {
            let x_cell = self.world_to_cell_x(candidate_x - aabb.half_w + EPS);
            for y in y0..=y1 {
                if self.is_solid(x_cell, y) {
                    candidate_x = candidate_x.max(self.cell_right_world(x_cell) + aabb.half_w);
                }
            }
            candidate_x = candidate_x.min(aabb.center_x);
        }

        candidate_x
    }

    fn resolve_axis_y(&self, aabb: Aabb, dy: f32) -> f32 {
        if dy == 0.0 {
            return aabb.center_y;
        }

        const EPS: f32 = 0.001;
        let mut candidate_y = aabb.center_y + dy;
        let x0 = self.world_to_cell_x(aabb.center_x - aabb.half_w + EPS);
        let x1 = self.world_to_cell_x(aabb.center_x + aabb.half_w - EPS);

        if dy > 0.0 {
            let y_cell = self.world_to_cell_y(candidate_y + aabb.half_h - EPS);
            for x in x0..=x1 {
                if self.is_solid(x, y_cell) {
                    candidate_y = candidate_y.min(self.cell_bottom_world(y_cell) - aabb.half_h);
                }
            }
            candidate_y = candidate_y.max(aabb.center_y);
        } else {
            let y_cell = self.world_to_cell_y(candidate_y - aabb.half_h + EPS);
            for x in x0..=x1 {
                if self.is_solid(x, y_cell) {
                    candidate_y = candidate_y.max(self.cell_top_world(y_cell) + aabb.half_h);
                }
            }
            candidate_y = candidate_y.min(aabb.center_y);
        }

        candidate_y
    }

    /// Solid cells whose square overlaps the circle, sorted by cell coordinate.
    fn cells_in_circle(&self, center: Vec2, radius: f32) -> Vec<(GridCell, SurfaceCategory)> {
        let x0 = self.world_to_cell_x(center.x - radius);
        let x1 = self.world_to_cell_x(center.x + radius);
        let y0 = self.world_to_cell_y(center.y - radius);
        let y1 = self.world_to_cell_y(center.y + radius);

        let mut hits = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let Some(category) = self.category(x, y) else {
                    continue;
                };
                let cell = GridCell { x, y };
                if self.cell_aabb(cell).overlaps_circle(center, radius) {
                    hits.push((cell, category));
                }
            }
        }
        hits.sort_by_key(|(cell, _)| *cell);
        hits
    }

    fn world_to_cell_x(&self, world_x: f32) -> i32 {
        ((world_x - self.origin.x) / self.cell_size).floor() as i32
    }

    fn world_to_cell_y(&self, world_y: f32) -> i32 {
        ((world_y - self.origin.y) / self.cell_size).floor() as i32
    }

    fn cell_left_world(&self, x: i32) -> f32 {
        self.origin.x + x as f32 * self.cell_size
    }

    fn cell_right_world(&self, x: i32) -> f32 {
        self.origin.x + (x + 1) as f32 * self.cell_size
    }

    fn cell_bottom_world(&self, y: i32) -> f32 {
        self.origin.y + y as f32 * self.cell_size
    }

    fn cell_top_world(&self, y: i32) -> f32 {
        self.origin.y + (y + 1) as f32 * self.cell_size
    }
}

impl Environment for CollisionGrid {
    fn contacts_at(&self, point: Vec2, radius: f32) -> Vec<Contact> {
        self.cells_in_circle(point, radius)
            .into_iter()
            .map(|(cell, category)| Contact {
                surface: SurfaceId::Cell(cell),
                category,
            })
            .collect()
    }

    fn closest_point(&self, surface: SurfaceId, point: Vec2) -> Option<Vec2> {
        match surface {
            SurfaceId::Cell(cell) if self.is_solid(cell.x, cell.y) => {
                Some(self.cell_aabb(cell).closest_point(point))
            }
            _ => None,
        }
    }

    fn overlap_circle(&self, center: Vec2, radius: f32, category: SurfaceCategory) -> bool {
        self.cells_in_circle(center, radius)
            .iter()
            .any(|(_, c)| *c == category)
    }

    fn move_and_collide(&self, aabb: Aabb, dx: f32, dy: f32) -> CollisionMoveResult {
        self.move_and_collide_detailed(aabb, dx, dy)
    }
}

pub fn load_collision_from_path(path: &Path) -> Result<CollisionGrid, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let file: CollisionFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse collision JSON {}: {e}", path.display()))?;
    validate_collision_file(&file)?;
    Ok(CollisionGrid::from_file(file))
}

fn validate_collision_file(file: &CollisionFile) -> Result<(), String> {
    if file.cell_size <= 0.0 {
        return Err("Collision validation failed: cell_size must be > 0".to_string());
    }
    if file.width <= 0 || file.height <= 0 {
        return Err("Collision validation failed: width and height must be > 0".to_string());
    }

    let mut seen = HashSet::new();
    for cell in file.solids.iter().chain(file.unhookable.iter()) {
        if cell.x < 0 || cell.x >= file.width || cell.y < 0 || cell.y >= file.height {
            return Err(format!(
                "Collision validation failed: solid cell out of bounds ({}, {})",
                cell.x, cell.y
            ));
        }
        if !seen.insert(*cell) {
            return Err(format!(
                "Collision validation failed: duplicate solid cell ({}, {})",
                cell.x, cell.y
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tether_collision_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn wall_grid() -> CollisionGrid {
        CollisionGrid::from_file(CollisionFile {
            version: "0.1".to_string(),
            collision_id: "test".to_string(),
            cell_size: 1.0,
            origin: GridOrigin::default(),
            width: 8,
            height: 8,
            solids: vec![GridCell { x: 2, y: 1 }],
            unhookable: vec![GridCell { x: 5, y: 1 }],
        })
    }

    #[test]
    fn load_collision_valid_file_parses() {
        let path = temp_file_path("valid");
        fs::write(
            &path,
            r#"{
              "version":"0.1",
              "collision_id":"test",
              "cell_size":1.0,
              "origin":{"x":0.0,"y":0.0},
              "width":4,
              "height":4,
              "solids":[{"x":1,"y":1},{"x":2,"y":1}],
              "unhookable":[{"x":3,"y":3}]
            }"#,
        )
        .expect("write temp file");

        let grid = load_collision_from_path(&path).expect("valid collision should load");
        assert_eq!(grid.cell_count(), 3);
        assert_eq!(grid.category(1, 1), Some(SurfaceCategory::Ground));
        assert_eq!(grid.category(3, 3), Some(SurfaceCategory::Unhookable));
        assert!(!grid.is_solid(0, 0));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_collision_rejects_duplicate_cells_across_categories() {
        let path = temp_file_path("dup");
        fs::write(
            &path,
            r#"{
              "version":"0.1",
              "collision_id":"test",
              "cell_size":1.0,
              "width":4,
              "height":4,
              "solids":[{"x":1,"y":1}],
              "unhookable":[{"x":1,"y":1}]
            }"#,
        )
        .expect("write temp file");

        let err = load_collision_from_path(&path).expect_err("duplicate cells should fail");
        assert!(err.contains("duplicate solid cell"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn move_and_collide_blocks_motion_into_wall() {
        let grid = wall_grid();
        let start = Aabb::from_center(Vec2::new(1.25, 1.25), 0.25, 0.25);
        let moved = grid.move_and_collide(start, 1.25, 0.0);
        assert!(moved.blocked_right);
        assert!(!moved.blocked_left);
        assert!(!moved.collided_y);
        assert!(moved.aabb.center_x <= 2.0 - start.half_w + 0.001);
    }

    #[test]
    fn contacts_report_category_and_identity() {
        let grid = wall_grid();
        let contacts = grid.contacts_at(Vec2::new(2.05, 1.5), 0.1);
        assert_eq!(
            contacts,
            vec![Contact {
                surface: SurfaceId::Cell(GridCell { x: 2, y: 1 }),
                category: SurfaceCategory::Ground,
            }]
        );

        let contacts = grid.contacts_at(Vec2::new(5.5, 1.5), 0.1);
        assert_eq!(contacts[0].category, SurfaceCategory::Unhookable);
        assert!(grid.contacts_at(Vec2::new(4.0, 4.0), 0.1).is_empty());
    }

    #[test]
    fn closest_point_clamps_to_cell_or_returns_inside_point() {
        let grid = wall_grid();
        let cell = SurfaceId::Cell(GridCell { x: 2, y: 1 });
        let outside = grid.closest_point(cell, Vec2::new(0.5, 1.5));
        assert_eq!(outside, Some(Vec2::new(2.0, 1.5)));
        let inside = grid.closest_point(cell, Vec2::new(2.5, 1.5));
        assert_eq!(inside, Some(Vec2::new(2.5, 1.5)));
        assert_eq!(grid.closest_point(SurfaceId::Body(0), Vec2::ZERO), None);
    }

    #[test]
    fn overlap_probe_filters_by_category() {
        let grid = wall_grid();
        assert!(grid.overlap_circle(Vec2::new(2.5, 2.1), 0.3, SurfaceCategory::Ground));
        assert!(!grid.overlap_circle(Vec2::new(5.5, 2.1), 0.3, SurfaceCategory::Ground));
        assert!(grid.overlap_circle(Vec2::new(5.5, 2.1), 0.3, SurfaceCategory::Unhookable));
    }
}
