//! RPX expression evaluators
//!
//! Two character-driven RPN machines over the shared runtime: a real-mode
//! stack machine with lambdas, named functions and comparison folds, and a
//! complex/matrix-mode evaluator whose operators dispatch through the elem
//! arithmetic layer. Both read their session state at entry and write it
//! back at exit, so results, history and registers persist across calls on
//! the same thread.

mod lex;

pub mod complex;
pub mod real;

pub use complex::eval_complex;
pub use real::eval_real;
