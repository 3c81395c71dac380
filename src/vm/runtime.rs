// Runtime: fetch/dispatch loop, budget checks and notification delivery

use super::error::VMFault;
use super::events::{RuntimeEvent, RuntimeObserver};
use super::executor::InstructionExecutor;
use super::instruction::Instruction;
use super::program::Program;
use super::state::VMState;
use crate::world::World;
use std::collections::VecDeque;

fn budget_fault(state: &mut VMState, fault: VMFault) {
    crate::debug_vm!(
        at state.pc, state.instruction_count =>
        "Budget exhausted: {}",
        fault
    );
    state.set_fault(fault);
}

/// Executes one program against a world.
///
/// The world is borrowed per call, so a caller can inspect or render it
/// between steps.
pub struct Runtime {
    program: Program,
    state: VMState,
    executor: InstructionExecutor,
    events: VecDeque<RuntimeEvent>,
    observer: Option<Box<dyn RuntimeObserver>>,
    notifications: bool,
}

impl Runtime {
    pub fn new(program: Program, world: &World) -> Self {
        Runtime {
            program,
            state: VMState::new(world.limits.max_call_depth),
            executor: InstructionExecutor::new(),
            events: VecDeque::new(),
            observer: None,
            notifications: true,
        }
    }

    /// Replaces the program and starts over.
    pub fn load(&mut self, program: Program, world: &World) {
        self.program = program;
        self.reset(world);
    }

    /// Back to pc 0 with an empty stack, zeroed counters and no fault.
    pub fn reset(&mut self, world: &World) {
        self.state = VMState::new(world.limits.max_call_depth);
        self.events.clear();
    }

    pub fn state(&self) -> &VMState {
        &self.state
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn set_observer(&mut self, observer: impl RuntimeObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Enables or suppresses call/return notifications.
    pub fn set_notifications(&mut self, enabled: bool) {
        self.notifications = enabled;
    }

    /// Executes a single instruction. Returns whether the program is still running.
    pub fn next(&mut self, world: &mut World) -> bool {
        if !self.state.running {
            return false;
        }

        let pc = self.state.pc;
        let Some(instr) = self.program.get(pc) else {
            // Falling off the end is a normal finish
            self.state.halt();
            return false;
        };

        // Budgets are checked before anything else happens
        if self.state.instruction_count >= world.limits.max_instructions {
            budget_fault(&mut self.state, VMFault::Instruction);
            return false;
        }
        if self.state.call_depth >= world.limits.max_call_depth {
            budget_fault(&mut self.state, VMFault::Stack);
            return false;
        }

        crate::debug_instructions!(
            at pc, self.state.instruction_count =>
            "Executing {}",
            instr
        );

        self.state.pc += 1;
        if instr.consumes_budget() {
            self.state.instruction_count += 1;
        }

        let result = self
            .executor
            .execute_instruction(&mut self.state, world, instr, &mut self.events);
        if let Err(fault) = result {
            crate::debug_vm!(
                at pc, self.state.instruction_count =>
                "Fault {:?} ({}) executing {}",
                fault,
                fault,
                instr
            );
        }

        self.deliver_events();
        self.state.running
    }

    /// Runs until the program halts or reaches the next source line.
    /// Returns whether the program is still running.
    pub fn step(&mut self, world: &mut World) -> bool {
        while self.next(world) {
            if let Some(Instruction::Line(line)) = self.program.get(self.state.pc) {
                self.state.line = *line;
                return true;
            }
        }
        false
    }

    /// Runs to completion and returns the fault, if any.
    pub fn run(&mut self, world: &mut World) -> Option<VMFault> {
        while self.step(world) {}
        crate::debug_vm!(
            "Program finished: fault = {:?}, instructions = {}",
            self.state.fault,
            self.state.instruction_count
        );
        self.state.fault
    }

    fn deliver_events(&mut self) {
        while let Some(event) = self.events.pop_front() {
            if !self.notifications {
                continue;
            }
            let Some(observer) = self.observer.as_mut() else {
                continue;
            };
            match event {
                RuntimeEvent::Call {
                    function,
                    param,
                    line,
                } => observer.on_call(self.program.function_name(function), param, line),
                RuntimeEvent::Return { line } => observer.on_return(line),
            }
        }
    }
}
