// VM Instruction execution: dispatches instructions to processors that update VM state and the world

pub mod control_flow_ops;
pub mod instruction_executor;
pub mod logic_ops;
pub mod misc_ops;
pub mod processor;
pub mod stack_ops;
pub mod world_ops;

pub use crate::vm::instruction::Instruction;
pub use instruction_executor::InstructionExecutor;
pub use processor::InstructionProcessor;
