//! Testing utilities and harness for Fibril

pub mod host;
pub mod slicer;
pub mod testing;

pub use host::{HostOp, NodeHandle, RecordingHost};
pub use slicer::{Expired, ManualSlicer, Unbounded, UnitBudget};
pub use testing::*;

pub mod prelude {
    pub use crate::host::*;
    pub use crate::slicer::*;
    pub use crate::testing::*;
}
