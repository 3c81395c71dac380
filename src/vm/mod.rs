// VM module entry point

pub mod error;
pub mod events;
pub mod executor;
pub mod instruction;
pub mod program;
pub mod runtime;
pub mod stack;
pub mod state;

pub use error::{ProgramError, VMFault};
pub use events::{CallStackRecorder, RuntimeObserver};
pub use instruction::Instruction;
pub use program::Program;
pub use runtime::Runtime;
pub use state::VMState;
