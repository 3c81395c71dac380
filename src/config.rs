// Configuration constants for the Karel world and virtual machine

// World defaults
pub const DEFAULT_WORLD_WIDTH: usize = 100; // Columns of a freshly created world
pub const DEFAULT_WORLD_HEIGHT: usize = 100; // Rows of a freshly created world
pub const DEFAULT_WORLD_NAME: &str = "mundo_0";
pub const DEFAULT_PROGRAM_NAME: &str = "p1";
pub const MAX_WORLD_DIMENSION: usize = 10_000; // Largest accepted row or column count

// Execution budgets
pub const DEFAULT_MAX_INSTRUCTIONS: u64 = 10_000_000; // Total budget-consuming opcodes per run
pub const DEFAULT_MAX_CALL_DEPTH: u32 = 65_000; // Nested CALLs before STACK

// VM configuration
pub const FRAME_SIZE: usize = 4; // saved fp, saved sp, return pc, parameter
pub const FRAME_OPERANDS: usize = 64; // Expression temporaries allowed per active frame
pub const OPERAND_HEADROOM: usize = 1024; // Extra operand slots for the outermost level

// Legacy import
pub const LEGACY_WORLD_MIN_WORDS: usize = 20; // .mdo header size
pub const LEGACY_LIMITS_MIN_WORDS: usize = 30; // .kec header size
pub const LEGACY_INFINITE: u16 = 0xFFFF;

/// Capacity of the combined operand/frame stack for a given call-depth cap.
///
/// Every frame the depth cap allows gets room for its own temporaries, so
/// recursion trips the call-depth budget before the stack fills up. The stack
/// grows on demand; this is only its ceiling.
pub fn stack_capacity(max_call_depth: u32) -> usize {
    (max_call_depth as usize + 1)
        .saturating_mul(FRAME_SIZE + FRAME_OPERANDS)
        .saturating_add(OPERAND_HEADROOM)
}
