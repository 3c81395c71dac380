use crate::types::ActionKind;
use crate::vm::error::VMFault;
use std::fmt;

/// Index into a program's function-name table.
pub type FunctionId = usize;

/// Condition checked by `EZ`; a zero on the stack raises the matching fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Wall,
    WorldUnderflow,
    BagUnderflow,
}

impl Condition {
    pub fn fault(self) -> VMFault {
        match self {
            Condition::Wall => VMFault::Wall,
            Condition::WorldUnderflow => VMFault::WorldUnderflow,
            Condition::BagUnderflow => VMFault::BagUnderflow,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Condition::Wall => "WALL",
            Condition::WorldUnderflow => "WORLDUNDERFLOW",
            Condition::BagUnderflow => "BAGUNDERFLOW",
        }
    }

    pub fn from_mnemonic(name: &str) -> Option<Self> {
        match name {
            "WALL" => Some(Condition::Wall),
            "WORLDUNDERFLOW" => Some(Condition::WorldUnderflow),
            "BAGUNDERFLOW" => Some(Condition::BagUnderflow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    // Control
    Halt,
    Line(i32),
    // Robot actions
    Left,
    Forward,
    PickBuzzer,
    LeaveBuzzer,
    // World queries
    WorldWalls,
    Orientation,
    WorldBuzzers,
    BagBuzzers,
    // Logic on the stack top
    Rotl,
    Rotr,
    Mask,
    Not,
    And,
    Or,
    Eq,
    Ez(Condition),
    // Jumps, relative to the next instruction
    Jz(i32),
    Jmp(i32),
    // Stack ops
    Load(i32),
    Pop,
    Dup,
    Dec,
    Inc,
    // Subroutines
    Call { target: usize, function: FunctionId },
    Ret,
    Param(u32),
    // Decoded but not executable
    Unknown(String),
}

impl Instruction {
    pub fn mnemonic(&self) -> &str {
        use Instruction::*;
        match self {
            Halt => "HALT",
            Line(_) => "LINE",
            Left => "LEFT",
            Forward => "FORWARD",
            PickBuzzer => "PICKBUZZER",
            LeaveBuzzer => "LEAVEBUZZER",
            WorldWalls => "WORLDWALLS",
            Orientation => "ORIENTATION",
            WorldBuzzers => "WORLDBUZZERS",
            BagBuzzers => "BAGBUZZERS",
            Rotl => "ROTL",
            Rotr => "ROTR",
            Mask => "MASK",
            Not => "NOT",
            And => "AND",
            Or => "OR",
            Eq => "EQ",
            Ez(_) => "EZ",
            Jz(_) => "JZ",
            Jmp(_) => "JMP",
            Load(_) => "LOAD",
            Pop => "POP",
            Dup => "DUP",
            Dec => "DEC",
            Inc => "INC",
            Call { .. } => "CALL",
            Ret => "RET",
            Param(_) => "PARAM",
            Unknown(name) => name,
        }
    }

    /// Whether executing this instruction uses one unit of the instruction budget.
    pub fn consumes_budget(&self) -> bool {
        matches!(
            self,
            Instruction::Left
                | Instruction::Forward
                | Instruction::PickBuzzer
                | Instruction::LeaveBuzzer
                | Instruction::Jz(_)
                | Instruction::Jmp(_)
                | Instruction::Call { .. }
        )
    }

    /// Robot action performed by this instruction, if any.
    pub fn action(&self) -> Option<ActionKind> {
        match self {
            Instruction::Forward => Some(ActionKind::Forward),
            Instruction::Left => Some(ActionKind::Left),
            Instruction::PickBuzzer => Some(ActionKind::PickBuzzer),
            Instruction::LeaveBuzzer => Some(ActionKind::LeaveBuzzer),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Line(n) | Instruction::Jz(n) | Instruction::Jmp(n) | Instruction::Load(n) => {
                write!(f, "{} {}", self.mnemonic(), n)
            }
            Instruction::Param(k) => write!(f, "PARAM {}", k),
            Instruction::Ez(condition) => write!(f, "EZ {}", condition.mnemonic()),
            Instruction::Call { target, function } => write!(f, "CALL {} #{}", target, function),
            _ => f.write_str(self.mnemonic()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_consumers() {
        assert!(Instruction::Forward.consumes_budget());
        assert!(Instruction::Jmp(-3).consumes_budget());
        assert!(Instruction::Call { target: 0, function: 0 }.consumes_budget());
        assert!(!Instruction::Line(4).consumes_budget());
        assert!(!Instruction::Ret.consumes_budget());
        assert!(!Instruction::Ez(Condition::Wall).consumes_budget());
    }

    #[test]
    fn test_display() {
        assert_eq!(Instruction::Jz(-2).to_string(), "JZ -2");
        assert_eq!(Instruction::Ez(Condition::BagUnderflow).to_string(), "EZ BAGUNDERFLOW");
        assert_eq!(Instruction::Call { target: 7, function: 1 }.to_string(), "CALL 7 #1");
        assert_eq!(Instruction::Unknown("FLY".to_string()).to_string(), "FLY");
    }

    #[test]
    fn test_actions() {
        assert_eq!(Instruction::PickBuzzer.action(), Some(ActionKind::PickBuzzer));
        assert_eq!(Instruction::Jz(1).action(), None);
    }
}
