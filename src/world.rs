use crate::config;
use crate::types::{ActionKind, DumpKind, INFINITE, Orientation, Pose, is_infinite};
use std::collections::BTreeSet;

/// Per-run resource budgets enforced by the VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub max_instructions: u64,
    pub max_call_depth: u32,
    pub max_forward: Option<u64>,
    pub max_left: Option<u64>,
    pub max_pick_buzzer: Option<u64>,
    pub max_leave_buzzer: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_instructions: config::DEFAULT_MAX_INSTRUCTIONS,
            max_call_depth: config::DEFAULT_MAX_CALL_DEPTH,
            max_forward: None,
            max_left: None,
            max_pick_buzzer: None,
            max_leave_buzzer: None,
        }
    }
}

impl Limits {
    /// Cap for a single action kind; `None` means unlimited.
    pub fn action_cap(&self, action: ActionKind) -> Option<u64> {
        match action {
            ActionKind::Forward => self.max_forward,
            ActionKind::Left => self.max_left,
            ActionKind::PickBuzzer => self.max_pick_buzzer,
            ActionKind::LeaveBuzzer => self.max_leave_buzzer,
        }
    }

    pub fn set_action_cap(&mut self, action: ActionKind, cap: Option<u64>) {
        let slot = match action {
            ActionKind::Forward => &mut self.max_forward,
            ActionKind::Left => &mut self.max_left,
            ActionKind::PickBuzzer => &mut self.max_pick_buzzer,
            ActionKind::LeaveBuzzer => &mut self.max_leave_buzzer,
        };
        *slot = cap;
    }
}

// Represents the Karel grid world
//
// Cells are addressed 1-based as (row, column); row 1 is the southernmost
// row. Every query and mutator tolerates out-of-range coordinates: reads
// return 0 and writes are ignored.
#[derive(Debug, Clone)]
pub struct World {
    width: usize,
    height: usize,
    name: String,
    program_name: String,
    walls: Vec<u8>,
    buzzers: Vec<i32>,         // Persisted baseline piles
    current_buzzers: Vec<i32>, // Working copy mutated during a run
    dump_cells: BTreeSet<(i32, i32)>,
    dumps: BTreeSet<DumpKind>,
    pose: Pose,
    start_pose: Pose,
    bag: i32,
    start_bag: i32,
    pub limits: Limits,
}

impl Default for World {
    fn default() -> Self {
        World::new(config::DEFAULT_WORLD_WIDTH, config::DEFAULT_WORLD_HEIGHT)
    }
}

impl World {
    /// Creates an empty world enclosed by its border walls.
    /// Dimensions are clamped to `1..=MAX_WORLD_DIMENSION`.
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.clamp(1, config::MAX_WORLD_DIMENSION);
        let height = height.clamp(1, config::MAX_WORLD_DIMENSION);
        let cells = width * height;

        let mut world = World {
            width,
            height,
            name: config::DEFAULT_WORLD_NAME.to_string(),
            program_name: config::DEFAULT_PROGRAM_NAME.to_string(),
            walls: vec![0; cells],
            buzzers: vec![0; cells],
            current_buzzers: vec![0; cells],
            dump_cells: BTreeSet::new(),
            dumps: BTreeSet::new(),
            pose: Pose::default(),
            start_pose: Pose::default(),
            bag: 0,
            start_bag: 0,
            limits: Limits::default(),
        };
        world.add_border_walls();
        world
    }

    /// Whether a loader may build a world of this size.
    pub fn accepts_dimensions(width: usize, height: usize) -> bool {
        let range = 1..=config::MAX_WORLD_DIMENSION;
        range.contains(&width) && range.contains(&height)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    pub fn set_program_name(&mut self, name: impl Into<String>) {
        self.program_name = name.into();
    }

    fn index(&self, row: i32, col: i32) -> Option<usize> {
        if row < 1 || col < 1 || row as usize > self.height || col as usize > self.width {
            return None;
        }
        Some((row as usize - 1) * self.width + (col as usize - 1))
    }

    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        self.index(row, col).is_some()
    }

    // --- Walls ---

    /// Wall mask of a cell (bit 0 west, 1 north, 2 east, 3 south).
    pub fn walls(&self, row: i32, col: i32) -> u8 {
        self.index(row, col).map_or(0, |idx| self.walls[idx])
    }

    /// Whether the given side of a cell lies on the permanent border.
    pub fn is_border(&self, row: i32, col: i32, side: Orientation) -> bool {
        match side {
            Orientation::West => col == 1,
            Orientation::North => row as usize == self.height,
            Orientation::East => col as usize == self.width,
            Orientation::South => row == 1,
        }
    }

    // Index of the cell sharing the given side, or None across the border
    fn neighbor(&self, row: i32, col: i32, side: Orientation) -> Option<usize> {
        if self.is_border(row, col, side) {
            return None;
        }
        let (dr, dc) = side.delta();
        self.index(row + dr, col + dc)
    }

    /// Closes one side of a cell, mirroring the wall onto the neighbor.
    pub fn add_wall(&mut self, row: i32, col: i32, side: Orientation) {
        let Some(idx) = self.index(row, col) else {
            return;
        };
        self.walls[idx] |= side.bit();
        if let Some(other) = self.neighbor(row, col, side) {
            self.walls[other] |= side.opposite().bit();
        }
        crate::debug_world!("Wall added at ({}, {}) {}", row, col, side);
    }

    /// Flips one side of a cell and its mirror. Border sides cannot be toggled.
    pub fn toggle_wall(&mut self, row: i32, col: i32, side: Orientation) {
        let Some(idx) = self.index(row, col) else {
            return;
        };
        let Some(other) = self.neighbor(row, col, side) else {
            return;
        };
        self.walls[idx] ^= side.bit();
        self.walls[other] ^= side.opposite().bit();
        crate::debug_world!("Wall toggled at ({}, {}) {}", row, col, side);
    }

    fn add_border_walls(&mut self) {
        let (width, height) = (self.width as i32, self.height as i32);
        for col in 1..=width {
            self.add_wall(1, col, Orientation::South);
            self.add_wall(height, col, Orientation::North);
        }
        for row in 1..=height {
            self.add_wall(row, 1, Orientation::West);
            self.add_wall(row, width, Orientation::East);
        }
    }

    // --- Buzzers ---

    /// Current (working) pile at a cell; `INFINITE` for an endless pile.
    pub fn buzzers(&self, row: i32, col: i32) -> i32 {
        self.index(row, col).map_or(0, |idx| self.current_buzzers[idx])
    }

    /// Persisted pile at a cell, as restored by `reset`.
    pub fn start_buzzers(&self, row: i32, col: i32) -> i32 {
        self.index(row, col).map_or(0, |idx| self.buzzers[idx])
    }

    pub fn set_buzzers(&mut self, row: i32, col: i32, count: i32) {
        let Some(idx) = self.index(row, col) else {
            return;
        };
        let count = if count < 0 { INFINITE } else { count };
        self.buzzers[idx] = count;
        self.current_buzzers[idx] = count;
    }

    /// Moves one buzzer from the pile at (row, col) into the bag.
    ///
    /// Never fails: emptiness is checked by the program before picking. An
    /// empty finite pile or an off-grid cell leaves both pile and bag alone.
    pub fn pick_buzzer(&mut self, row: i32, col: i32) {
        let Some(idx) = self.index(row, col) else {
            return;
        };
        let pile = &mut self.current_buzzers[idx];
        if *pile == 0 {
            return;
        }
        if !is_infinite(*pile) {
            *pile -= 1;
        }
        if !is_infinite(self.bag) {
            self.bag = self.bag.saturating_add(1);
        }
    }

    /// Moves one buzzer from the bag onto the pile at (row, col).
    /// An empty finite bag or an off-grid cell changes nothing.
    pub fn leave_buzzer(&mut self, row: i32, col: i32) {
        let Some(idx) = self.index(row, col) else {
            return;
        };
        if self.bag == 0 {
            return;
        }
        let pile = &mut self.current_buzzers[idx];
        if !is_infinite(*pile) {
            *pile = pile.saturating_add(1);
        }
        if !is_infinite(self.bag) {
            self.bag -= 1;
        }
    }

    // --- Robot ---

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn start_pose(&self) -> Pose {
        self.start_pose
    }

    pub fn bag(&self) -> i32 {
        self.bag
    }

    pub fn start_bag(&self) -> i32 {
        self.start_bag
    }

    /// Places the robot, updating both the current and the baseline position.
    pub fn move_to(&mut self, row: i32, col: i32) {
        self.pose.row = row;
        self.pose.col = col;
        self.start_pose.row = row;
        self.start_pose.col = col;
    }

    pub fn rotate(&mut self, orientation: Orientation) {
        self.pose.orientation = orientation;
        self.start_pose.orientation = orientation;
    }

    pub fn set_bag(&mut self, count: i32) {
        let count = if count < 0 { INFINITE } else { count };
        self.bag = count;
        self.start_bag = count;
    }

    /// Runtime rotation; the baseline is left untouched.
    pub fn turn_left(&mut self) {
        self.pose.orientation = self.pose.orientation.rotate_left();
    }

    /// Runtime move one cell ahead. Walls are not consulted here; compiled
    /// programs test them explicitly before moving.
    pub fn step_forward(&mut self) {
        let (dr, dc) = self.pose.orientation.delta();
        self.pose.row = self.pose.row.wrapping_add(dr);
        self.pose.col = self.pose.col.wrapping_add(dc);
    }

    // --- Dumps ---

    pub fn set_dump(&mut self, kind: DumpKind, enabled: bool) {
        if enabled {
            self.dumps.insert(kind);
        } else {
            self.dumps.remove(&kind);
        }
    }

    pub fn has_dump(&self, kind: DumpKind) -> bool {
        self.dumps.contains(&kind)
    }

    pub fn dumps(&self) -> impl Iterator<Item = DumpKind> + '_ {
        self.dumps.iter().copied()
    }

    pub fn set_dump_cell(&mut self, row: i32, col: i32, enabled: bool) {
        if !self.in_bounds(row, col) {
            return;
        }
        if enabled {
            self.dump_cells.insert((row, col));
        } else {
            self.dump_cells.remove(&(row, col));
        }
    }

    pub fn is_dump_cell(&self, row: i32, col: i32) -> bool {
        self.dump_cells.contains(&(row, col))
    }

    /// Dump cells as (row, column), in row-major order.
    pub fn dump_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.dump_cells.iter().copied()
    }

    // --- Lifecycle ---

    /// Restores pose, bag and piles to their baselines.
    /// Walls, limits and dump settings are not touched.
    pub fn reset(&mut self) {
        self.pose = self.start_pose;
        self.bag = self.start_bag;
        self.current_buzzers.copy_from_slice(&self.buzzers);
        crate::debug_world!("World reset");
    }

    /// Removes interior walls, piles and dump cells, keeping dimensions.
    pub fn clear(&mut self) {
        self.walls.iter_mut().for_each(|w| *w = 0);
        self.buzzers.iter_mut().for_each(|b| *b = 0);
        self.current_buzzers.iter_mut().for_each(|b| *b = 0);
        self.dump_cells.clear();
        self.add_border_walls();
    }

    /// Changes the grid size, keeping walls, piles and dump cells that still
    /// fit. The robot is clamped into the new bounds.
    pub fn resize(&mut self, width: usize, height: usize) {
        let width = width.clamp(1, config::MAX_WORLD_DIMENSION);
        let height = height.clamp(1, config::MAX_WORLD_DIMENSION);
        if width == self.width && height == self.height {
            return;
        }

        let mut resized = World::new(width, height);
        let (old_width, old_height) = (self.width as i32, self.height as i32);
        for row in 1..=old_height.min(height as i32) {
            for col in 1..=old_width.min(width as i32) {
                let Some(src) = self.index(row, col) else {
                    continue;
                };
                let Some(dst) = resized.index(row, col) else {
                    continue;
                };
                let mut mask = self.walls[src];
                // Old border sides that became interior edges are dropped
                if col == old_width && col < width as i32 {
                    mask &= !Orientation::East.bit();
                }
                if row == old_height && row < height as i32 {
                    mask &= !Orientation::North.bit();
                }
                resized.walls[dst] |= mask;
                resized.buzzers[dst] = self.buzzers[src];
                resized.current_buzzers[dst] = self.current_buzzers[src];
            }
        }

        self.width = resized.width;
        self.height = resized.height;
        self.walls = resized.walls;
        self.buzzers = resized.buzzers;
        self.current_buzzers = resized.current_buzzers;
        self.dump_cells
            .retain(|&(row, col)| row as usize <= height && col as usize <= width);

        let clamp = |pose: &mut Pose| {
            pose.row = pose.row.clamp(1, height as i32);
            pose.col = pose.col.clamp(1, width as i32);
        };
        clamp(&mut self.pose);
        clamp(&mut self.start_pose);

        crate::debug_world!("World resized to {}x{}", width, height);
    }
}
