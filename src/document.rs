// Structured world configuration, also used as the save format

use crate::config;
use crate::error::WorldError;
use crate::types::{ActionKind, Amount, DumpKind, Orientation};
use crate::world::{Limits, World};
use serde::{Deserialize, Serialize};

/// Complete description of a world: limits, grid contents and robot setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldDocument {
    #[serde(default)]
    pub conditions: Conditions,
    pub world: WorldSection,
    #[serde(default)]
    pub program: ProgramSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditions {
    #[serde(default = "default_instructions_max")]
    pub instructions_max: u64,
    #[serde(default = "default_stack_depth_max")]
    pub stack_depth_max: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandLimit>,
}

fn default_instructions_max() -> u64 {
    config::DEFAULT_MAX_INSTRUCTIONS
}

fn default_stack_depth_max() -> u32 {
    config::DEFAULT_MAX_CALL_DEPTH
}

impl Default for Conditions {
    fn default() -> Self {
        Conditions {
            instructions_max: default_instructions_max(),
            stack_depth_max: default_stack_depth_max(),
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandLimit {
    pub name: ActionKind,
    pub max_executions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSection {
    #[serde(default = "default_world_name")]
    pub name: String,
    pub width: usize,
    pub height: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buzzers: Vec<Pile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub walls: Vec<WallSegment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dump_cells: Vec<Cell>,
}

fn default_world_name() -> String {
    config::DEFAULT_WORLD_NAME.to_string()
}

/// Buzzer pile at column `x`, row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pile {
    pub x: u32,
    pub y: u32,
    pub count: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

/// Unit wall segment between lattice corners.
///
/// Corners are 0-based: corner (x, y) is the south-west corner of cell
/// (column x + 1, row y + 1). Exactly one of `x2` and `y2` is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallSegment {
    pub x1: u32,
    pub y1: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<u32>,
}

impl WallSegment {
    /// Cell (row, column) and side closed by this segment.
    pub fn cell_side(&self) -> Result<(i32, i32, Orientation), WorldError> {
        let invalid = || WorldError::InvalidWall {
            x1: self.x1,
            y1: self.y1,
            x2: self.x2,
            y2: self.y2,
        };
        match (self.x2, self.y2) {
            (Some(x2), None) if self.x1.abs_diff(x2) == 1 => {
                Ok((coord(self.y1) + 1, coord(self.x1.min(x2)) + 1, Orientation::South))
            }
            (None, Some(y2)) if self.y1.abs_diff(y2) == 1 => {
                Ok((coord(self.y1.min(y2)) + 1, coord(self.x1) + 1, Orientation::West))
            }
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSection {
    #[serde(default = "default_program_name")]
    pub name: String,
    #[serde(default = "default_world_name")]
    pub world: String,
    #[serde(default = "one")]
    pub x: u32,
    #[serde(default = "one")]
    pub y: u32,
    #[serde(default = "default_orientation")]
    pub orientation: Orientation,
    #[serde(default = "empty_bag")]
    pub bag: Amount,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dumps: Vec<DumpKind>,
}

fn default_program_name() -> String {
    config::DEFAULT_PROGRAM_NAME.to_string()
}

fn one() -> u32 {
    1
}

fn default_orientation() -> Orientation {
    Orientation::North
}

fn empty_bag() -> Amount {
    Amount(0)
}

impl Default for ProgramSection {
    fn default() -> Self {
        ProgramSection {
            name: default_program_name(),
            world: default_world_name(),
            x: 1,
            y: 1,
            orientation: default_orientation(),
            bag: empty_bag(),
            dumps: Vec::new(),
        }
    }
}

// Document coordinates beyond i32 are simply out of range
fn coord(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX - 1)
}

impl WorldDocument {
    pub fn from_json(text: &str) -> Result<Self, WorldError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, WorldError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl World {
    /// Builds a world from a document.
    pub fn from_document(doc: &WorldDocument) -> Result<World, WorldError> {
        let section = &doc.world;
        if !World::accepts_dimensions(section.width, section.height) {
            return Err(WorldError::InvalidDimensions {
                width: section.width,
                height: section.height,
            });
        }

        let mut world = World::new(section.width, section.height);
        world.set_name(section.name.clone());

        let mut limits = Limits {
            max_instructions: doc.conditions.instructions_max,
            max_call_depth: doc.conditions.stack_depth_max,
            ..Limits::default()
        };
        for command in &doc.conditions.commands {
            limits.set_action_cap(command.name, Some(command.max_executions));
        }
        world.limits = limits;

        // Out-of-range piles, walls and dump cells are ignored by the world
        for pile in &section.buzzers {
            world.set_buzzers(coord(pile.y), coord(pile.x), pile.count.0);
        }
        for wall in &section.walls {
            let (row, col, side) = wall.cell_side()?;
            world.add_wall(row, col, side);
        }
        for cell in &section.dump_cells {
            world.set_dump_cell(coord(cell.y), coord(cell.x), true);
        }

        let program = &doc.program;
        let (row, col) = (coord(program.y), coord(program.x));
        if !world.in_bounds(row, col) {
            return Err(WorldError::InvalidCoordinate {
                x: program.x as i64,
                y: program.y as i64,
            });
        }
        world.set_program_name(program.name.clone());
        world.move_to(row, col);
        world.rotate(program.orientation);
        world.set_bag(program.bag.0);
        for &dump in &program.dumps {
            world.set_dump(dump, true);
        }

        Ok(world)
    }

    /// Replaces this world with the document's contents.
    /// On error the world is left unmodified.
    pub fn load(&mut self, doc: &WorldDocument) -> Result<(), WorldError> {
        *self = World::from_document(doc)?;
        crate::debug_world!(
            "Loaded world '{}' {}x{}",
            self.name(),
            self.width(),
            self.height()
        );
        Ok(())
    }

    pub fn load_json(&mut self, text: &str) -> Result<(), WorldError> {
        let doc = WorldDocument::from_json(text)?;
        self.load(&doc)
    }

    /// Document describing the baseline state, enough to rebuild this world.
    pub fn save(&self) -> WorldDocument {
        self.snapshot(false)
    }

    /// Like `save`, but with the pose, bag and piles left by the last run.
    pub fn save_current(&self) -> WorldDocument {
        self.snapshot(true)
    }

    fn snapshot(&self, current: bool) -> WorldDocument {
        let (width, height) = (self.width() as i32, self.height() as i32);
        let mut buzzers = Vec::new();
        let mut walls = Vec::new();

        for row in 1..=height {
            for col in 1..=width {
                let (x, y) = (col as u32, row as u32);
                let count = if current {
                    self.buzzers(row, col)
                } else {
                    self.start_buzzers(row, col)
                };
                if count != 0 {
                    buzzers.push(Pile {
                        x,
                        y,
                        count: Amount(count),
                    });
                }

                // Borders are implicit; each interior edge is written once
                let mask = self.walls(row, col);
                if row < height && mask & Orientation::North.bit() != 0 {
                    walls.push(WallSegment {
                        x1: x - 1,
                        y1: y,
                        x2: Some(x),
                        y2: None,
                    });
                }
                if col < width && mask & Orientation::East.bit() != 0 {
                    walls.push(WallSegment {
                        x1: x,
                        y1: y - 1,
                        x2: None,
                        y2: Some(y),
                    });
                }
            }
        }

        let commands = ActionKind::ALL
            .iter()
            .filter_map(|&action| {
                self.limits.action_cap(action).map(|cap| CommandLimit {
                    name: action,
                    max_executions: cap,
                })
            })
            .collect();

        let (pose, bag) = if current {
            (self.pose(), self.bag())
        } else {
            (self.start_pose(), self.start_bag())
        };

        WorldDocument {
            conditions: Conditions {
                instructions_max: self.limits.max_instructions,
                stack_depth_max: self.limits.max_call_depth,
                commands,
            },
            world: WorldSection {
                name: self.name().to_string(),
                width: self.width(),
                height: self.height(),
                buzzers,
                walls,
                dump_cells: self
                    .dump_cells()
                    .map(|(row, col)| Cell {
                        x: col as u32,
                        y: row as u32,
                    })
                    .collect(),
            },
            program: ProgramSection {
                name: self.program_name().to_string(),
                world: self.name().to_string(),
                // A runaway robot is saved clamped onto the grid
                x: pose.col.clamp(1, width) as u32,
                y: pose.row.clamp(1, height) as u32,
                orientation: pose.orientation,
                bag: Amount(bag),
                dumps: self.dumps().collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::INFINITE;

    const SAMPLE: &str = r#"{
        "conditions": {
            "instructionsMax": 500,
            "stackDepthMax": 30,
            "commands": [ { "name": "AVANZA", "maxExecutions": 3 } ]
        },
        "world": {
            "name": "sample",
            "width": 4,
            "height": 3,
            "buzzers": [
                { "x": 2, "y": 3, "count": 5 },
                { "x": 1, "y": 1, "count": "INFINITO" },
                { "x": 9, "y": 9, "count": 1 }
            ],
            "walls": [ { "x1": 0, "y1": 1, "x2": 1 }, { "x1": 2, "y1": 0, "y2": 1 } ],
            "dumpCells": [ { "x": 2, "y": 3 } ]
        },
        "program": {
            "name": "p1",
            "world": "sample",
            "x": 2,
            "y": 1,
            "orientation": "ESTE",
            "bag": "INFINITE",
            "dumps": [ "MUNDO", "POSITION" ]
        }
    }"#;

    fn setup() -> World {
        let mut world = World::default();
        world.load_json(SAMPLE).unwrap();
        world
    }

    fn assert_same_world(a: &World, b: &World) {
        assert_eq!(a.width(), b.width());
        assert_eq!(a.height(), b.height());
        for row in 1..=a.height() as i32 {
            for col in 1..=a.width() as i32 {
                assert_eq!(a.walls(row, col), b.walls(row, col), "walls at ({}, {})", row, col);
                assert_eq!(a.start_buzzers(row, col), b.start_buzzers(row, col));
                assert_eq!(a.is_dump_cell(row, col), b.is_dump_cell(row, col));
            }
        }
        assert_eq!(a.start_pose(), b.start_pose());
        assert_eq!(a.start_bag(), b.start_bag());
        assert_eq!(a.limits, b.limits);
        assert_eq!(a.dumps().collect::<Vec<_>>(), b.dumps().collect::<Vec<_>>());
    }

    #[test]
    fn test_load_sample() {
        let world = setup();
        assert_eq!(world.name(), "sample");
        assert_eq!((world.width(), world.height()), (4, 3));
        assert_eq!(world.limits.max_instructions, 500);
        assert_eq!(world.limits.max_call_depth, 30);
        assert_eq!(world.limits.max_forward, Some(3));
        assert_eq!(world.buzzers(3, 2), 5);
        assert_eq!(world.buzzers(1, 1), INFINITE);
        assert!(world.is_dump_cell(3, 2));
        assert_eq!(world.start_pose().orientation, Orientation::East);
        assert_eq!((world.pose().row, world.pose().col), (1, 2));
        assert_eq!(world.bag(), INFINITE);
        assert!(world.has_dump(DumpKind::World));
        assert!(world.has_dump(DumpKind::Position));
    }

    #[test]
    fn test_wall_segments() {
        let world = setup();
        // Horizontal (0,1)-(1,1): between rows 1 and 2 in column 1
        assert_ne!(world.walls(2, 1) & Orientation::South.bit(), 0);
        assert_ne!(world.walls(1, 1) & Orientation::North.bit(), 0);
        // Vertical (2,0)-(2,1): between columns 2 and 3 in row 1
        assert_ne!(world.walls(1, 3) & Orientation::West.bit(), 0);
        assert_ne!(world.walls(1, 2) & Orientation::East.bit(), 0);
    }

    #[test]
    fn test_invalid_wall_rejected() {
        let diagonal = WallSegment {
            x1: 1,
            y1: 1,
            x2: Some(2),
            y2: Some(2),
        };
        assert!(matches!(diagonal.cell_side(), Err(WorldError::InvalidWall { .. })));
        let long = WallSegment {
            x1: 1,
            y1: 1,
            x2: Some(3),
            y2: None,
        };
        assert!(long.cell_side().is_err());
    }

    #[test]
    fn test_failed_load_leaves_world_untouched() {
        let mut world = setup();
        let bad = SAMPLE.replace(r#""x2": 1 }"#, r#""x2": 1, "y2": 2 }"#);
        assert!(world.load_json(&bad).is_err());
        assert_eq!(world.name(), "sample");
        assert!(world.load_json("{ not json").is_err());
        assert_eq!(world.buzzers(3, 2), 5);
    }

    #[test]
    fn test_start_outside_world_rejected() {
        let mut doc = setup().save();
        doc.program.x = 10;
        assert!(matches!(
            World::from_document(&doc),
            Err(WorldError::InvalidCoordinate { x: 10, y: 1 })
        ));
        doc.world.width = 0;
        assert!(matches!(
            World::from_document(&doc),
            Err(WorldError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let mut world = setup();
        let result = world.load_json(r#"{"world": {"width": 4294967296, "height": 4294967296}}"#);
        assert!(matches!(result, Err(WorldError::InvalidDimensions { .. })));
        assert_eq!((world.width(), world.height()), (4, 3));

        let mut doc = setup().save();
        doc.world.width = crate::config::MAX_WORLD_DIMENSION + 1;
        assert!(matches!(
            World::from_document(&doc),
            Err(WorldError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut world = World::new(6, 5);
        world.add_wall(2, 2, Orientation::North);
        world.add_wall(3, 4, Orientation::East);
        world.add_wall(5, 1, Orientation::East);
        world.set_buzzers(2, 3, 4);
        world.set_buzzers(5, 6, INFINITE);
        world.set_dump_cell(2, 3, true);
        world.move_to(4, 5);
        world.rotate(Orientation::South);
        world.set_bag(7);
        world.limits.max_left = Some(9);
        world.limits.max_instructions = 1234;
        world.set_dump(DumpKind::Bag, true);

        let json = world.save().to_json().unwrap();
        let mut restored = World::default();
        restored.load_json(&json).unwrap();
        assert_same_world(&world, &restored);
        assert_eq!(restored.save(), world.save());
    }

    #[test]
    fn test_save_current_reflects_run_state() {
        let mut world = setup();
        world.step_forward();
        world.pick_buzzer(3, 2);

        let baseline = world.save();
        let current = world.save_current();
        assert_eq!(baseline.program.x, 2);
        assert_eq!(current.program.x, 3);
        let pile = |doc: &WorldDocument| {
            doc.world
                .buzzers
                .iter()
                .find(|p| (p.x, p.y) == (2, 3))
                .map(|p| p.count)
        };
        assert_eq!(pile(&baseline), Some(Amount(5)));
        assert_eq!(pile(&current), Some(Amount(4)));
    }

    #[test]
    fn test_minimal_document_uses_defaults() {
        let mut world = World::default();
        world
            .load_json(r#"{ "world": { "width": 3, "height": 3 } }"#)
            .unwrap();
        assert_eq!(world.name(), config::DEFAULT_WORLD_NAME);
        assert_eq!(world.limits, Limits::default());
        assert_eq!(world.start_pose().orientation, Orientation::North);
        assert_eq!(world.bag(), 0);
    }
}
