use crate::config::FRAME_SIZE;
use crate::world::World;
use std::collections::VecDeque;

use super::processor::InstructionProcessor;
use crate::vm::error::VMFault;
use crate::vm::events::RuntimeEvent;
use crate::vm::instruction::Instruction;
use crate::vm::state::VMState;

// Offset of the parameter slot within a call frame
const PARAM_SLOT: usize = FRAME_SIZE - 1;

/// Processor for stack manipulation instructions
pub struct StackOperations;

impl StackOperations {
    pub fn new() -> Self {
        StackOperations
    }
}

impl InstructionProcessor for StackOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
            Instruction::Load(_)
                | Instruction::Pop
                | Instruction::Dup
                | Instruction::Dec
                | Instruction::Inc
                | Instruction::Param(_)
        )
    }

    fn process(
        &self,
        state: &mut VMState,
        _world: &mut World,
        instruction: &Instruction,
        _events: &mut VecDeque<RuntimeEvent>,
    ) -> Result<(), VMFault> {
        match instruction {
            Instruction::Load(value) => Ok(state.stack.push(*value)?),
            Instruction::Pop => state.stack.pop().map(|_| ()).map_err(VMFault::from),
            Instruction::Dup => Ok(state.stack.dup()?),
            Instruction::Dec => Ok(state.stack.map_top(|v| v.wrapping_sub(1))?),
            Instruction::Inc => Ok(state.stack.map_top(|v| v.wrapping_add(1))?),
            Instruction::Param(k) => {
                // Parameters only exist inside a call frame
                let fp = state.fp.ok_or(VMFault::InvalidOpcode)?;
                let slot = fp + PARAM_SLOT + *k as usize;
                let value = state.stack.get(slot)?;
                Ok(state.stack.push(value)?)
            }
            _ => Err(VMFault::InvalidOpcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (VMState, World) {
        (VMState::new(8), World::new(3, 3))
    }

    fn run(state: &mut VMState, world: &mut World, instruction: Instruction) -> Result<(), VMFault> {
        let mut events = VecDeque::new();
        StackOperations::new().process(state, world, &instruction, &mut events)
    }

    #[test]
    fn test_can_process() {
        let processor = StackOperations::new();
        assert!(processor.can_process(&Instruction::Load(1)));
        assert!(processor.can_process(&Instruction::Param(0)));
        assert!(!processor.can_process(&Instruction::Forward));
    }

    #[test]
    fn test_load_dup_inc_dec_pop() {
        let (mut state, mut world) = setup();
        run(&mut state, &mut world, Instruction::Load(5)).unwrap();
        run(&mut state, &mut world, Instruction::Dup).unwrap();
        run(&mut state, &mut world, Instruction::Inc).unwrap();
        assert_eq!(state.stack.view(), &[5, 6]);
        run(&mut state, &mut world, Instruction::Dec).unwrap();
        run(&mut state, &mut world, Instruction::Dec).unwrap();
        run(&mut state, &mut world, Instruction::Pop).unwrap();
        assert_eq!(state.stack.view(), &[5]);
    }

    #[test]
    fn test_underflow_is_invalid_opcode() {
        let (mut state, mut world) = setup();
        assert_eq!(run(&mut state, &mut world, Instruction::Pop), Err(VMFault::InvalidOpcode));
        assert_eq!(run(&mut state, &mut world, Instruction::Inc), Err(VMFault::InvalidOpcode));
    }

    #[test]
    fn test_param_reads_frame_slot() {
        let (mut state, mut world) = setup();
        // Frame at slot 1: [saved fp, saved sp, return pc, param]
        for value in [99, -1, 1, 4, 42] {
            state.stack.push(value).unwrap();
        }
        state.fp = Some(1);
        run(&mut state, &mut world, Instruction::Param(0)).unwrap();
        assert_eq!(state.stack.peek().unwrap(), 42);
    }

    #[test]
    fn test_param_without_frame() {
        let (mut state, mut world) = setup();
        assert_eq!(
            run(&mut state, &mut world, Instruction::Param(0)),
            Err(VMFault::InvalidOpcode)
        );
    }
}
