//! Per-mode runtime session state
//!
//! Each evaluation mode owns a bounded history ring, 26 registers and (in
//! real mode) 26 named-function bodies. Evaluators read a copy at entry and
//! write it back at exit, mirroring the get/set pairs of the runtime-config
//! collaborator. Storage is thread-local: evaluation is single-threaded and
//! this keeps parallel test runs independent.

use std::cell::RefCell;
use std::collections::VecDeque;

use rpx_builtins::Value;

/// Capacity of the history ring; the oldest entry is dropped on overflow.
pub const HISTORY_CAP: usize = 64;
/// One register per lowercase letter.
pub const REGISTERS: usize = 26;

/// Index of a lowercase register letter, if valid.
pub fn register_index(letter: char) -> Option<usize> {
    letter
        .is_ascii_lowercase()
        .then(|| letter as usize - 'a' as usize)
}

/// Real-mode session: history, registers and named functions.
#[derive(Debug, Clone, Default)]
pub struct RealRuntimeInfo {
    pub hist: VecDeque<f64>,
    pub regs: [f64; REGISTERS],
    /// Named-function bodies for `!` + letter; empty means undefined.
    pub functions: [String; REGISTERS],
}

impl RealRuntimeInfo {
    pub fn push_history(&mut self, v: f64) {
        if self.hist.len() == HISTORY_CAP {
            self.hist.pop_front();
        }
        self.hist.push_back(v);
    }

    /// N-th most recent result; 0 is the last one. Out-of-range reads are
    /// NaN.
    pub fn history_back(&self, n: usize) -> f64 {
        self.hist
            .len()
            .checked_sub(n + 1)
            .and_then(|i| self.hist.get(i))
            .copied()
            .unwrap_or(f64::NAN)
    }
}

/// Complex-mode session: element-typed history and registers.
#[derive(Debug, Clone, Default)]
pub struct ComplexRuntimeInfo {
    pub hist: VecDeque<Value>,
    pub regs: [Value; REGISTERS],
}

impl ComplexRuntimeInfo {
    pub fn push_history(&mut self, v: Value) {
        if self.hist.len() == HISTORY_CAP {
            self.hist.pop_front();
        }
        self.hist.push_back(v);
    }

    pub fn history_back(&self, n: usize) -> Value {
        self.hist
            .len()
            .checked_sub(n + 1)
            .and_then(|i| self.hist.get(i))
            .cloned()
            .unwrap_or(Value::Complex(num_complex::Complex64::new(
                f64::NAN,
                f64::NAN,
            )))
    }
}

thread_local! {
    static REAL_INFO: RefCell<RealRuntimeInfo> = RefCell::new(RealRuntimeInfo::default());
    static COMPLEX_INFO: RefCell<ComplexRuntimeInfo> = RefCell::new(ComplexRuntimeInfo::default());
}

pub fn real_runtime_info() -> RealRuntimeInfo {
    REAL_INFO.with(|info| info.borrow().clone())
}

pub fn set_real_runtime_info(info: RealRuntimeInfo) {
    REAL_INFO.with(|slot| *slot.borrow_mut() = info);
}

pub fn complex_runtime_info() -> ComplexRuntimeInfo {
    COMPLEX_INFO.with(|info| info.borrow().clone())
}

pub fn set_complex_runtime_info(info: ComplexRuntimeInfo) {
    COMPLEX_INFO.with(|slot| *slot.borrow_mut() = info);
}

/// Define (or clear) a real-mode named function.
pub fn define_function(letter: char, body: &str) {
    if let Some(idx) = register_index(letter) {
        REAL_INFO.with(|info| info.borrow_mut().functions[idx] = body.to_string());
    }
}

/// Drop all session state on this thread; test hook.
pub fn reset_session() {
    REAL_INFO.with(|info| *info.borrow_mut() = RealRuntimeInfo::default());
    COMPLEX_INFO.with(|info| *info.borrow_mut() = ComplexRuntimeInfo::default());
}
