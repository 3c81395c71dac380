// VM Error types: stack errors, VM faults, program decoding errors

use thiserror::Error;

/// Stack Errors
#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum StackError {
    #[error("Stack overflow")]
    Overflow,
    #[error("Stack underflow")]
    Underflow,
}

/// Terminal VM faults. A run that halts without one finished cleanly.
#[derive(Error, Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum VMFault {
    #[error("Attempted to move through a wall")]
    Wall,
    #[error("Attempted to pick a buzzer from an empty cell")]
    WorldUnderflow,
    #[error("Attempted to leave a buzzer with an empty bag")]
    BagUnderflow,
    #[error("Instruction limit exceeded")]
    Instruction,
    #[error("Call depth limit exceeded")]
    Stack,
    #[error("Invalid opcode")]
    InvalidOpcode,
}

impl VMFault {
    /// Numeric result code, also used as the process exit status (0 is a clean finish).
    pub fn code(self) -> i32 {
        match self {
            VMFault::Instruction => 1,
            VMFault::Wall => 2,
            VMFault::WorldUnderflow => 3,
            VMFault::BagUnderflow => 4,
            VMFault::Stack => 5,
            VMFault::InvalidOpcode => 6,
        }
    }
}

impl From<StackError> for VMFault {
    fn from(err: StackError) -> Self {
        match err {
            StackError::Overflow => VMFault::Stack,
            // Only a corrupt program can drain the stack
            StackError::Underflow => VMFault::InvalidOpcode,
        }
    }
}

/// Errors raised while decoding a program.
#[derive(Error, Debug)]
pub enum ProgramError {
    #[error("malformed program: {0}")]
    Json(#[from] serde_json::Error),
    #[error("program must be a list of instructions")]
    NotAList,
    #[error("instruction {index}: expected a non-empty list")]
    Malformed { index: usize },
    #[error("instruction {index}: {mnemonic} takes {expected} operand(s), got {actual}")]
    Arity {
        index: usize,
        mnemonic: String,
        expected: usize,
        actual: usize,
    },
    #[error("instruction {index}: invalid operand {operand} for {mnemonic}")]
    Operand {
        index: usize,
        mnemonic: String,
        operand: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_codes() {
        assert_eq!(VMFault::Instruction.code(), 1);
        assert_eq!(VMFault::Wall.code(), 2);
        assert_eq!(VMFault::Stack.code(), 5);
    }

    #[test]
    fn test_stack_error_mapping() {
        assert_eq!(VMFault::from(StackError::Overflow), VMFault::Stack);
        assert_eq!(VMFault::from(StackError::Underflow), VMFault::InvalidOpcode);
    }
}
