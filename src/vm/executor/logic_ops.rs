use crate::world::World;
use std::collections::VecDeque;

use super::processor::InstructionProcessor;
use crate::vm::error::VMFault;
use crate::vm::events::RuntimeEvent;
use crate::vm::instruction::Instruction;
use crate::vm::state::VMState;

/// Processor for boolean and wall-bit operations on the stack top
///
/// Compiled conditions read a wall mask, turn the robot's orientation into a
/// bit with `ROTL`/`ROTR`/`MASK` and combine them; `EZ` turns a false result
/// into the matching fault.
pub struct LogicOperations;

impl LogicOperations {
    pub fn new() -> Self {
        LogicOperations
    }
}

fn flag(value: bool) -> i32 {
    value as i32
}

impl InstructionProcessor for LogicOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
            Instruction::Rotl
                | Instruction::Rotr
                | Instruction::Mask
                | Instruction::Not
                | Instruction::And
                | Instruction::Or
                | Instruction::Eq
                | Instruction::Ez(_)
        )
    }

    fn process(
        &self,
        state: &mut VMState,
        _world: &mut World,
        instruction: &Instruction,
        _events: &mut VecDeque<RuntimeEvent>,
    ) -> Result<(), VMFault> {
        let stack = &mut state.stack;
        match instruction {
            Instruction::Rotl => Ok(stack.map_top(|v| v.wrapping_add(3) & 3)?),
            Instruction::Rotr => Ok(stack.map_top(|v| v.wrapping_add(1) & 3)?),
            Instruction::Mask => Ok(stack.map_top(|v| {
                u32::try_from(v)
                    .ok()
                    .and_then(|shift| 1i32.checked_shl(shift))
                    .unwrap_or(0)
            })?),
            Instruction::Not => Ok(stack.map_top(|v| flag(v == 0))?),
            Instruction::And | Instruction::Or | Instruction::Eq => {
                let rhs = stack.pop()?;
                let lhs = stack.pop()?;
                let result = match instruction {
                    Instruction::And => (lhs & rhs) != 0,
                    Instruction::Or => (lhs | rhs) != 0,
                    _ => lhs == rhs,
                };
                Ok(stack.push(flag(result))?)
            }
            Instruction::Ez(condition) => {
                // A failed check leaves its operand in place
                if stack.peek()? == 0 {
                    crate::debug_vm!(
                        at state.pc, state.instruction_count =>
                        "EZ {} failed",
                        condition.mnemonic()
                    );
                    return Err(condition.fault());
                }
                stack.pop()?;
                Ok(())
            }
            _ => Err(VMFault::InvalidOpcode),
        }
    }
}
