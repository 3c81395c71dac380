use crate::vm::error::VMFault;
use crate::vm::events::RuntimeEvent;
use crate::vm::state::VMState;
use crate::world::World;
use std::collections::VecDeque;

use super::control_flow_ops::ControlFlowOperations;
use super::logic_ops::LogicOperations;
use super::misc_ops::MiscellaneousOperations;
use super::processor::InstructionProcessor;
use super::stack_ops::StackOperations;
use super::world_ops::WorldOperations;
use crate::vm::instruction::Instruction;

/// A struct that holds all instruction processors
pub struct InstructionExecutor {
    processors: Vec<Box<dyn InstructionProcessor>>,
}

impl Default for InstructionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionExecutor {
    /// Create a new executor with all processors registered
    pub fn new() -> Self {
        let processors: Vec<Box<dyn InstructionProcessor>> = vec![
            Box::new(StackOperations::new()),
            Box::new(LogicOperations::new()),
            Box::new(WorldOperations::new()),
            Box::new(ControlFlowOperations::new()),
            Box::new(MiscellaneousOperations::new()),
        ];

        InstructionExecutor { processors }
    }

    /// Execute a single instruction, delegating to the appropriate processor.
    /// A fault is recorded in `state` and also returned.
    pub fn execute_instruction(
        &self,
        state: &mut VMState,
        world: &mut World,
        instr: &Instruction,
        events: &mut VecDeque<RuntimeEvent>,
    ) -> Result<(), VMFault> {
        // Unknown mnemonics fall through every processor
        let result = match self.processors.iter().find(|p| p.can_process(instr)) {
            Some(processor) => processor.process(state, world, instr, events),
            None => Err(VMFault::InvalidOpcode),
        };

        if let Err(fault) = result {
            state.set_fault(fault);
        }
        result
    }
}
