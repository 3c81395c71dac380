// VM State: pc, frame pointer, operand/frame stack, counters, fault status

use super::error::VMFault;
use super::stack::Stack;
use crate::config;
use crate::types::ActionKind;

/// Per-run action counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionCounters {
    pub forward: u64,
    pub left: u64,
    pub pick_buzzer: u64,
    pub leave_buzzer: u64,
}

impl ActionCounters {
    pub fn get(&self, action: ActionKind) -> u64 {
        match action {
            ActionKind::Forward => self.forward,
            ActionKind::Left => self.left,
            ActionKind::PickBuzzer => self.pick_buzzer,
            ActionKind::LeaveBuzzer => self.leave_buzzer,
        }
    }

    /// Increments the counter for `action` and returns the new value.
    pub fn bump(&mut self, action: ActionKind) -> u64 {
        let slot = match action {
            ActionKind::Forward => &mut self.forward,
            ActionKind::Left => &mut self.left,
            ActionKind::PickBuzzer => &mut self.pick_buzzer,
            ActionKind::LeaveBuzzer => &mut self.leave_buzzer,
        };
        *slot += 1;
        *slot
    }
}

/// Execution state of one program run
#[derive(Debug, Clone)]
pub struct VMState {
    pub pc: usize,                   // Index of the next instruction
    pub fp: Option<usize>,           // Base of the active call frame
    pub line: i32,                   // Source line of the last LINE marker, 0 before any
    pub stack: Stack,                // Operands and call frames
    pub call_depth: u32,             // Active CALL frames
    pub instruction_count: u64,      // Budget-consuming instructions executed
    pub counters: ActionCounters,    // Per-action counts
    pub running: bool,
    pub fault: Option<VMFault>,
}

impl VMState {
    pub fn new(max_call_depth: u32) -> Self {
        VMState {
            pc: 0,
            fp: None,
            line: 0,
            stack: Stack::with_size(config::stack_capacity(max_call_depth)),
            call_depth: 0,
            instruction_count: 0,
            counters: ActionCounters::default(),
            running: true,
            fault: None,
        }
    }

    pub fn sp(&self) -> usize {
        self.stack.len()
    }

    pub fn halt(&mut self) {
        self.running = false;
    }

    /// Records a terminal fault. The first fault of a run wins.
    pub fn set_fault(&mut self, fault: VMFault) {
        if self.fault.is_none() {
            self.fault = Some(fault);
        }
        self.running = false;
    }

    /// Numeric result of the run so far: 0 unless faulted.
    pub fn result_code(&self) -> i32 {
        self.fault.map_or(0, VMFault::code)
    }
}
