use crate::world::World;
use std::collections::VecDeque;

use super::processor::InstructionProcessor;
use crate::vm::error::VMFault;
use crate::vm::events::RuntimeEvent;
use crate::vm::instruction::Instruction;
use crate::vm::state::VMState;

/// Processor for miscellaneous operations (HALT, LINE)
pub struct MiscellaneousOperations;

impl MiscellaneousOperations {
    pub fn new() -> Self {
        MiscellaneousOperations
    }
}

impl InstructionProcessor for MiscellaneousOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(instruction, Instruction::Halt | Instruction::Line(_))
    }

    fn process(
        &self,
        state: &mut VMState,
        _world: &mut World,
        instruction: &Instruction,
        _events: &mut VecDeque<RuntimeEvent>,
    ) -> Result<(), VMFault> {
        match instruction {
            Instruction::Halt => {
                state.halt();
                Ok(())
            }
            Instruction::Line(line) => {
                state.line = *line;
                Ok(())
            }
            _ => Err(VMFault::InvalidOpcode),
        }
    }
}
