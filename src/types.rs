// Shared value types: orientation, pose, buzzer amounts, action and dump kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel used for infinite buzzer piles and an infinite bag.
pub const INFINITE: i32 = -1;

pub fn is_infinite(count: i32) -> bool {
    count == INFINITE
}

/// Cardinal orientation. The discriminant doubles as the wall-mask bit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
    #[serde(alias = "OESTE")]
    West = 0,
    #[serde(alias = "NORTE")]
    North = 1,
    #[serde(alias = "ESTE")]
    East = 2,
    #[serde(alias = "SUR")]
    South = 3,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::West,
        Orientation::North,
        Orientation::East,
        Orientation::South,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Maps any integer onto an orientation, modulo 4.
    pub fn from_index(value: i32) -> Self {
        Self::ALL[value.rem_euclid(4) as usize]
    }

    pub fn rotate_left(self) -> Self {
        Self::from_index(self as i32 - 1)
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self as i32 + 2)
    }

    /// Wall-mask bit for this side of a cell.
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// (row, column) step of one forward move. North increases the row.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Orientation::West => (0, -1),
            Orientation::North => (1, 0),
            Orientation::East => (0, 1),
            Orientation::South => (-1, 0),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::West => "WEST",
            Orientation::North => "NORTH",
            Orientation::East => "EAST",
            Orientation::South => "SOUTH",
        };
        f.write_str(name)
    }
}

/// Robot position (1-based row/column) and heading.
///
/// Coordinates are signed: a program that skips its wall checks can walk the
/// robot off the grid, where every world query reads as empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pose {
    pub row: i32,
    pub col: i32,
    pub orientation: Orientation,
}

impl Default for Pose {
    fn default() -> Self {
        Pose {
            row: 1,
            col: 1,
            orientation: Orientation::North,
        }
    }
}

/// Actions with a dedicated per-run counter and optional cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    #[serde(alias = "AVANZA")]
    Forward,
    #[serde(alias = "GIRA_IZQUIERDA")]
    Left,
    #[serde(alias = "COGE_ZUMBADOR")]
    PickBuzzer,
    #[serde(alias = "DEJA_ZUMBADOR")]
    LeaveBuzzer,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Forward,
        ActionKind::Left,
        ActionKind::PickBuzzer,
        ActionKind::LeaveBuzzer,
    ];
}

/// Opt-in diagnostics for the outcome report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DumpKind {
    #[serde(alias = "MUNDO")]
    World,
    #[serde(alias = "UNIVERSO")]
    AllBuzzers,
    #[serde(alias = "POSICION")]
    Position,
    #[serde(alias = "ORIENTACION")]
    Orientation,
    #[serde(alias = "MOCHILA")]
    Bag,
    #[serde(alias = "AVANZA")]
    Forward,
    #[serde(alias = "GIRA_IZQUIERDA")]
    Left,
    #[serde(alias = "COGE_ZUMBADOR")]
    PickBuzzer,
    #[serde(alias = "DEJA_ZUMBADOR")]
    LeaveBuzzer,
}

impl DumpKind {
    /// Dump flag reporting the counter of `action`.
    pub fn for_action(action: ActionKind) -> Self {
        match action {
            ActionKind::Forward => DumpKind::Forward,
            ActionKind::Left => DumpKind::Left,
            ActionKind::PickBuzzer => DumpKind::PickBuzzer,
            ActionKind::LeaveBuzzer => DumpKind::LeaveBuzzer,
        }
    }
}

/// A buzzer amount as written in documents: a count or the `INFINITE` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AmountRepr", into = "AmountRepr")]
pub struct Amount(pub i32);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Count(u32),
    Token(String),
}

impl TryFrom<AmountRepr> for Amount {
    type Error = String;

    fn try_from(repr: AmountRepr) -> Result<Self, Self::Error> {
        match repr {
            AmountRepr::Count(n) => i32::try_from(n)
                .map(Amount)
                .map_err(|_| format!("buzzer count {} out of range", n)),
            AmountRepr::Token(token) if token == "INFINITE" || token == "INFINITO" => {
                Ok(Amount(INFINITE))
            }
            AmountRepr::Token(token) => Err(format!("invalid buzzer amount '{}'", token)),
        }
    }
}

impl From<Amount> for AmountRepr {
    fn from(amount: Amount) -> Self {
        if is_infinite(amount.0) {
            AmountRepr::Token("INFINITE".to_string())
        } else {
            AmountRepr::Count(amount.0.max(0) as u32)
        }
    }
}
