// Outcome report: terminal status plus the diagnostics selected by the dump flags

use crate::types::{ActionKind, Amount, DumpKind, Orientation};
use crate::vm::error::VMFault;
use crate::vm::state::VMState;
use crate::world::World;
use serde::{Deserialize, Serialize};

// Infinite piles are reported through a 16-bit mask, as the legacy tools did
const COUNT_MASK: u32 = 0xFFFF;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world: Option<WorldReport>,
    pub program: ProgramReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldReport {
    pub name: String,
    pub lines: Vec<DumpLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpLine {
    pub row: i32,
    pub zero_compression: bool,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramReport {
    pub name: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub karel: Option<KarelReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<InstructionReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KarelReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bag: Option<Amount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pick_buzzer: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave_buzzer: Option<u64>,
}

/// Fixed human-readable phrase for a run's terminal status.
pub fn status_phrase(fault: Option<VMFault>) -> &'static str {
    match fault {
        None => "FIN PROGRAMA",
        Some(VMFault::Wall) => "MOVIMIENTO INVALIDO",
        Some(VMFault::WorldUnderflow) | Some(VMFault::BagUnderflow) => "ZUMBADOR INVALIDO",
        Some(VMFault::Instruction) => "LIMITE DE INSTRUCCIONES",
        Some(VMFault::Stack) => "STACK OVERFLOW",
        Some(VMFault::InvalidOpcode) => "INSTRUCCION INVALIDA",
    }
}

/// Buzzer dump, one line per row from the top down.
///
/// Only dump cells are reported, or every cell when `all` is set. A column
/// prefix `(col) ` is written before a non-zero pile unless the previously
/// reported cell in the row also held buzzers. Rows without text are omitted.
pub fn buzzer_lines(world: &World, all: bool) -> Vec<DumpLine> {
    let mut lines = Vec::new();
    for row in (1..=world.height() as i32).rev() {
        let mut text = String::new();
        let mut print_column = true;
        for col in 1..=world.width() as i32 {
            if !all && !world.is_dump_cell(row, col) {
                continue;
            }
            let count = world.buzzers(row, col);
            if count != 0 {
                if print_column {
                    text.push_str(&format!("({}) ", col));
                }
                text.push_str(&format!("{} ", count as u32 & COUNT_MASK));
            }
            print_column = count == 0;
        }
        if !text.is_empty() {
            lines.push(DumpLine {
                row,
                zero_compression: true,
                text,
            });
        }
    }
    lines
}

impl OutcomeDocument {
    /// Builds the report for the world's current state after a run.
    pub fn build(world: &World, state: &VMState) -> Self {
        let dump = |kind| world.has_dump(kind);

        let world_report = if dump(DumpKind::World) || dump(DumpKind::AllBuzzers) {
            Some(WorldReport {
                name: world.name().to_string(),
                lines: buzzer_lines(world, dump(DumpKind::AllBuzzers)),
            })
        } else {
            None
        };

        let pose = world.pose();
        let karel = KarelReport {
            x: dump(DumpKind::Position).then_some(pose.col),
            y: dump(DumpKind::Position).then_some(pose.row),
            orientation: dump(DumpKind::Orientation).then_some(pose.orientation),
            bag: dump(DumpKind::Bag).then_some(Amount(world.bag())),
        };

        let counter = |action| {
            dump(DumpKind::for_action(action)).then(|| state.counters.get(action))
        };
        let instructions = InstructionReport {
            forward: counter(ActionKind::Forward),
            left: counter(ActionKind::Left),
            pick_buzzer: counter(ActionKind::PickBuzzer),
            leave_buzzer: counter(ActionKind::LeaveBuzzer),
        };

        OutcomeDocument {
            world: world_report,
            program: ProgramReport {
                name: world.program_name().to_string(),
                status: status_phrase(state.fault).to_string(),
                karel: (karel != KarelReport::default()).then_some(karel),
                instructions: (instructions != InstructionReport::default())
                    .then_some(instructions),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::INFINITE;

    fn setup() -> World {
        let mut world = World::new(5, 4);
        world.set_buzzers(3, 1, 2);
        world.set_buzzers(3, 2, 7);
        world.set_buzzers(3, 4, INFINITE);
        world.set_buzzers(1, 5, 1);
        world
    }

    #[test]
    fn test_status_phrases() {
        assert_eq!(status_phrase(None), "FIN PROGRAMA");
        assert_eq!(status_phrase(Some(VMFault::Wall)), "MOVIMIENTO INVALIDO");
        assert_eq!(status_phrase(Some(VMFault::BagUnderflow)), "ZUMBADOR INVALIDO");
        assert_eq!(status_phrase(Some(VMFault::WorldUnderflow)), "ZUMBADOR INVALIDO");
        assert_eq!(status_phrase(Some(VMFault::Instruction)), "LIMITE DE INSTRUCCIONES");
        assert_eq!(status_phrase(Some(VMFault::Stack)), "STACK OVERFLOW");
    }

    #[test]
    fn test_all_buzzers_dump() {
        let lines = buzzer_lines(&setup(), true);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].row, 3);
        // Adjacent piles share one prefix; the empty column 3 restarts it
        assert_eq!(lines[0].text, "(1) 2 7 (4) 65535 ");
        assert_eq!(lines[1].row, 1);
        assert_eq!(lines[1].text, "(5) 1 ");
        assert!(lines.iter().all(|line| line.zero_compression));
    }

    #[test]
    fn test_dump_cells_only() {
        let mut world = setup();
        world.set_dump_cell(3, 2, true);
        world.set_dump_cell(3, 4, true);
        world.set_dump_cell(2, 2, true);
        let lines = buzzer_lines(&world, false);
        // Unreported cells do not break the run
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "(2) 7 65535 ");
    }

    #[test]
    fn test_gated_sections() {
        let mut world = setup();
        let mut state = VMState::new(4);
        state.counters.forward = 3;
        state.counters.left = 1;
        state.set_fault(VMFault::Wall);

        let plain = OutcomeDocument::build(&world, &state);
        assert!(plain.world.is_none());
        assert!(plain.program.karel.is_none());
        assert!(plain.program.instructions.is_none());
        assert_eq!(plain.program.status, "MOVIMIENTO INVALIDO");

        world.set_dump(DumpKind::Position, true);
        world.set_dump(DumpKind::Bag, true);
        world.set_dump(DumpKind::Forward, true);
        world.set_dump(DumpKind::World, true);
        world.set_bag(INFINITE);
        let report = OutcomeDocument::build(&world, &state);

        let karel = report.program.karel.unwrap();
        assert_eq!((karel.x, karel.y), (Some(1), Some(1)));
        assert_eq!(karel.orientation, None);
        assert_eq!(karel.bag, Some(Amount(INFINITE)));
        let instructions = report.program.instructions.unwrap();
        assert_eq!(instructions.forward, Some(3));
        assert_eq!(instructions.left, None);
        assert!(report.world.unwrap().lines.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let mut world = World::new(2, 2);
        world.set_dump(DumpKind::PickBuzzer, true);
        let state = VMState::new(4);
        let json = OutcomeDocument::build(&world, &state).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["program"]["status"], "FIN PROGRAMA");
        assert_eq!(value["program"]["instructions"]["pickBuzzer"], 0);
        assert!(value.get("world").is_none());
    }
}
