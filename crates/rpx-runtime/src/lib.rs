//! RPX runtime services
//!
//! Everything the evaluators lean on that is not the dispatch loop itself:
//! the matrix engine, the polymorphic elem arithmetic layer, shared math
//! helpers, the physical-constant table, the xorshift RNG and the per-mode
//! session state (history ring + registers).

pub mod constants;
pub mod diagnostics;
pub mod elem;
pub mod mathfn;
pub mod matrix;
pub mod rng;
pub mod session;

pub use diagnostics::{report, ErrorCode};
pub use matrix::*;
