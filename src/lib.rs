// Karel execution engine: a grid world, the bytecode VM that drives the robot
// through it, and the document formats around them.

pub mod config;
pub mod document;
pub mod error;
pub mod importer;
pub mod logging;
pub mod outcome;
pub mod session;
pub mod types;
pub mod vm;
pub mod world;

pub use document::WorldDocument;
pub use error::WorldError;
pub use outcome::OutcomeDocument;
pub use session::Session;
pub use types::{ActionKind, DumpKind, INFINITE, Orientation, Pose};
pub use world::{Limits, World};
