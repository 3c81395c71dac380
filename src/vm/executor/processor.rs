use crate::vm::error::VMFault;
use crate::vm::events::RuntimeEvent;
use crate::vm::instruction::Instruction;
use crate::vm::state::VMState;
use crate::world::World;
use std::collections::VecDeque;

/// A family of instructions the executor can delegate to.
///
/// `process` runs with `state.pc` already pointing past the instruction.
/// Returning `Err` records the fault and stops the run; halting cleanly is
/// done through `VMState::halt`.
pub trait InstructionProcessor {
    fn can_process(&self, instruction: &Instruction) -> bool;

    fn process(
        &self,
        state: &mut VMState,
        world: &mut World,
        instruction: &Instruction,
        events: &mut VecDeque<RuntimeEvent>,
    ) -> Result<(), VMFault>;
}
