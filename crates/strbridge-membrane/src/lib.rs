//! Runtime membrane for strbridge.
//!
//! The conversion kernels in `strbridge-core` are pure and carry no policy.
//! Everything stateful that sits around them at the C boundary lives here:
//!
//! - **Configuration** (`config`): runtime mode from `STRBRIDGE_MODE`
//! - **Self-healing engine** (`heal`): deterministic repairs applied in hardened mode
//! - **Allocation registry** (`registry`): extents of buffers handed out by the ABI layer

#![deny(unsafe_code)]

pub mod config;
pub mod heal;
pub mod registry;

pub use config::{SafetyLevel, safety_level};
pub use heal::{HealingAction, HealingPolicy, global_healing_policy};
pub use registry::{AllocationRegistry, FreeOutcome, LiveBuffer, global_registry};
