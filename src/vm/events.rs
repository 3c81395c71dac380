// Call/return notifications for front ends that render a call stack

use super::instruction::FunctionId;
use std::cell::RefCell;
use std::rc::Rc;

/// Raw event queued by the instruction processors during one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEvent {
    Call {
        function: FunctionId,
        param: i32,
        line: i32,
    },
    Return {
        line: i32,
    },
}

/// Receives call/return notifications from a running `Runtime`.
pub trait RuntimeObserver {
    fn on_call(&mut self, function: &str, param: i32, line: i32);
    fn on_return(&mut self, line: i32);
}

// Lets a caller keep a handle on the observer it installed
impl<O: RuntimeObserver> RuntimeObserver for Rc<RefCell<O>> {
    fn on_call(&mut self, function: &str, param: i32, line: i32) {
        self.borrow_mut().on_call(function, param, line);
    }

    fn on_return(&mut self, line: i32) {
        self.borrow_mut().on_return(line);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    pub function: String,
    pub param: i32,
    pub line: i32,
}

/// Mirrors the program's call stack from notifications.
#[derive(Debug, Clone, Default)]
pub struct CallStackRecorder {
    frames: Vec<CallFrame>,
    pub calls: u64,
    pub returns: u64,
    pub max_depth: usize,
}

impl CallStackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active frames, innermost last.
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl RuntimeObserver for CallStackRecorder {
    fn on_call(&mut self, function: &str, param: i32, line: i32) {
        self.calls += 1;
        self.frames.push(CallFrame {
            function: function.to_string(),
            param,
            line,
        });
        self.max_depth = self.max_depth.max(self.frames.len());
    }

    fn on_return(&mut self, _line: i32) {
        self.returns += 1;
        self.frames.pop();
    }
}
