// Session: one world and the runtime executing a program against it

use crate::outcome::OutcomeDocument;
use crate::vm::error::VMFault;
use crate::vm::program::Program;
use crate::vm::runtime::Runtime;
use crate::world::World;

pub struct Session {
    world: World,
    runtime: Runtime,
}

impl Session {
    pub fn new(world: World, program: Program) -> Self {
        let runtime = Runtime::new(program, &world);
        Session { world, runtime }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access for editors. Call `reset` afterwards so the VM picks up
    /// changed limits.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    pub fn load_program(&mut self, program: Program) {
        self.runtime.load(program, &self.world);
    }

    /// Restores the world baselines and restarts the VM.
    pub fn reset(&mut self) {
        self.world.reset();
        self.runtime.reset(&self.world);
    }

    pub fn next(&mut self) -> bool {
        self.runtime.next(&mut self.world)
    }

    pub fn step(&mut self) -> bool {
        self.runtime.step(&mut self.world)
    }

    pub fn run(&mut self) -> Option<VMFault> {
        self.runtime.run(&mut self.world)
    }

    pub fn outcome(&self) -> OutcomeDocument {
        OutcomeDocument::build(&self.world, self.runtime.state())
    }
}
