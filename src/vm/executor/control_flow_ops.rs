use crate::world::World;
use std::collections::VecDeque;

use super::processor::InstructionProcessor;
use crate::vm::error::VMFault;
use crate::vm::events::RuntimeEvent;
use crate::vm::instruction::Instruction;
use crate::vm::state::VMState;

// Frame layout, relative to fp
const SAVED_FP: usize = 0;
const SAVED_SP: usize = 1;
const RETURN_PC: usize = 2;

/// Processor for jumps and subroutine calls
pub struct ControlFlowOperations;

impl ControlFlowOperations {
    pub fn new() -> Self {
        ControlFlowOperations
    }
}

// Jumps are relative to the instruction after the jump
fn jump(state: &mut VMState, offset: i32) -> Result<(), VMFault> {
    let target = state.pc as i64 + offset as i64;
    state.pc = usize::try_from(target).map_err(|_| VMFault::InvalidOpcode)?;
    Ok(())
}

fn to_word(value: usize) -> Result<i32, VMFault> {
    i32::try_from(value).map_err(|_| VMFault::InvalidOpcode)
}

fn to_index(word: i32) -> Result<usize, VMFault> {
    usize::try_from(word).map_err(|_| VMFault::InvalidOpcode)
}

impl InstructionProcessor for ControlFlowOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
            Instruction::Jz(_) | Instruction::Jmp(_) | Instruction::Call { .. } | Instruction::Ret
        )
    }

    fn process(
        &self,
        state: &mut VMState,
        world: &mut World,
        instruction: &Instruction,
        events: &mut VecDeque<RuntimeEvent>,
    ) -> Result<(), VMFault> {
        match instruction {
            Instruction::Jmp(offset) => jump(state, *offset),
            Instruction::Jz(offset) => {
                let value = state.stack.pop()?;
                crate::debug_instructions!(
                    at state.pc, state.instruction_count =>
                    "JZ: value = {}, jumping? {}",
                    value,
                    value == 0
                );
                if value == 0 {
                    jump(state, *offset)?;
                }
                Ok(())
            }
            Instruction::Call { target, function } => {
                let param = state.stack.pop()?;
                let sp_before = state.sp();
                let saved_fp = match state.fp {
                    Some(fp) => to_word(fp)?,
                    None => -1,
                };
                for word in [saved_fp, to_word(sp_before)?, to_word(state.pc)?, param] {
                    state.stack.push(word)?;
                }
                state.fp = Some(sp_before);
                state.pc = *target;
                state.call_depth += 1;

                if state.call_depth >= world.limits.max_call_depth {
                    return Err(VMFault::Stack);
                }
                events.push_back(RuntimeEvent::Call {
                    function: *function,
                    param,
                    line: state.line,
                });
                Ok(())
            }
            Instruction::Ret => {
                // Returning from the entry point ends the program
                let Some(fp) = state.fp else {
                    state.halt();
                    return Ok(());
                };
                let saved_fp = state.stack.get(fp + SAVED_FP)?;
                let saved_sp = to_index(state.stack.get(fp + SAVED_SP)?)?;
                let return_pc = to_index(state.stack.get(fp + RETURN_PC)?)?;

                state.pc = return_pc;
                state.stack.truncate(saved_sp);
                state.fp = if saved_fp < 0 {
                    None
                } else {
                    Some(to_index(saved_fp)?)
                };
                state.call_depth = state.call_depth.saturating_sub(1);
                events.push_back(RuntimeEvent::Return { line: state.line });
                Ok(())
            }
            _ => Err(VMFault::InvalidOpcode),
        }
    }
}
