use crate::types::ActionKind;
use crate::world::World;
use std::collections::VecDeque;

use super::processor::InstructionProcessor;
use crate::vm::error::VMFault;
use crate::vm::events::RuntimeEvent;
use crate::vm::instruction::Instruction;
use crate::vm::state::VMState;

/// Processor for robot actions and world queries
pub struct WorldOperations;

impl WorldOperations {
    pub fn new() -> Self {
        WorldOperations
    }
}

// Counts an action that has already happened and enforces its cap.
// The side effect is never undone when the cap trips.
fn count_action(state: &mut VMState, world: &World, action: ActionKind) -> Result<(), VMFault> {
    let count = state.counters.bump(action);
    match world.limits.action_cap(action) {
        Some(cap) if count > cap => {
            crate::debug_vm!(
                at state.pc, state.instruction_count =>
                "{:?} cap {} exceeded",
                action,
                cap
            );
            Err(VMFault::Instruction)
        }
        _ => Ok(()),
    }
}

impl InstructionProcessor for WorldOperations {
    fn can_process(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction,
            Instruction::Left
                | Instruction::Forward
                | Instruction::PickBuzzer
                | Instruction::LeaveBuzzer
                | Instruction::WorldWalls
                | Instruction::Orientation
                | Instruction::WorldBuzzers
                | Instruction::BagBuzzers
        )
    }

    fn process(
        &self,
        state: &mut VMState,
        world: &mut World,
        instruction: &Instruction,
        _events: &mut VecDeque<RuntimeEvent>,
    ) -> Result<(), VMFault> {
        let pose = world.pose();
        match instruction {
            Instruction::Left => {
                world.turn_left();
                count_action(state, world, ActionKind::Left)
            }
            Instruction::Forward => {
                world.step_forward();
                count_action(state, world, ActionKind::Forward)
            }
            Instruction::PickBuzzer => {
                world.pick_buzzer(pose.row, pose.col);
                count_action(state, world, ActionKind::PickBuzzer)
            }
            Instruction::LeaveBuzzer => {
                world.leave_buzzer(pose.row, pose.col);
                count_action(state, world, ActionKind::LeaveBuzzer)
            }
            Instruction::WorldWalls => Ok(state.stack.push(world.walls(pose.row, pose.col) as i32)?),
            Instruction::Orientation => Ok(state.stack.push(pose.orientation.index() as i32)?),
            Instruction::WorldBuzzers => Ok(state.stack.push(world.buzzers(pose.row, pose.col))?),
            Instruction::BagBuzzers => Ok(state.stack.push(world.bag())?),
            _ => Err(VMFault::InvalidOpcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{INFINITE, Orientation};

    fn setup() -> (VMState, World) {
        let mut world = World::new(3, 3);
        world.move_to(1, 1);
        world.rotate(Orientation::North);
        (VMState::new(8), world)
    }

    fn run(state: &mut VMState, world: &mut World, instruction: Instruction) -> Result<(), VMFault> {
        let mut events = VecDeque::new();
        WorldOperations::new().process(state, world, &instruction, &mut events)
    }

    #[test]
    fn test_forward_and_left_count() {
        let (mut state, mut world) = setup();
        run(&mut state, &mut world, Instruction::Forward).unwrap();
        run(&mut state, &mut world, Instruction::Left).unwrap();
        assert_eq!((world.pose().row, world.pose().col), (2, 1));
        assert_eq!(world.pose().orientation, Orientation::West);
        assert_eq!(state.counters.forward, 1);
        assert_eq!(state.counters.left, 1);
    }

    #[test]
    fn test_cap_trips_after_side_effect() {
        let (mut state, mut world) = setup();
        world.limits.max_forward = Some(1);
        run(&mut state, &mut world, Instruction::Forward).unwrap();
        assert_eq!(
            run(&mut state, &mut world, Instruction::Forward),
            Err(VMFault::Instruction)
        );
        assert_eq!(world.pose().row, 3);
        assert_eq!(state.counters.forward, 2);
    }

    #[test]
    fn test_zero_cap() {
        let (mut state, mut world) = setup();
        world.set_buzzers(1, 1, 2);
        world.limits.max_pick_buzzer = Some(0);
        assert_eq!(
            run(&mut state, &mut world, Instruction::PickBuzzer),
            Err(VMFault::Instruction)
        );
        assert_eq!(world.buzzers(1, 1), 1);
        assert_eq!(world.bag(), 1);
    }

    #[test]
    fn test_pick_and_leave_at_robot_cell() {
        let (mut state, mut world) = setup();
        world.set_buzzers(1, 1, 1);
        run(&mut state, &mut world, Instruction::PickBuzzer).unwrap();
        assert_eq!(world.buzzers(1, 1), 0);
        run(&mut state, &mut world, Instruction::Forward).unwrap();
        run(&mut state, &mut world, Instruction::LeaveBuzzer).unwrap();
        assert_eq!(world.buzzers(2, 1), 1);
        assert_eq!(world.bag(), 0);
        assert_eq!(state.counters.leave_buzzer, 1);
    }

    #[test]
    fn test_queries() {
        let (mut state, mut world) = setup();
        world.set_buzzers(1, 1, INFINITE);
        world.set_bag(4);
        for instruction in [
            Instruction::WorldWalls,
            Instruction::Orientation,
            Instruction::WorldBuzzers,
            Instruction::BagBuzzers,
        ] {
            run(&mut state, &mut world, instruction).unwrap();
        }
        assert_eq!(state.stack.view(), &[0b1001, 1, INFINITE, 4]);
    }
}
