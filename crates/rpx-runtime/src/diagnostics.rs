//! Non-fatal error reporting
//!
//! Malformed expressions and structurally invalid matrix operations are
//! reported here and evaluation continues with a substitute value; nothing
//! in this module unwinds. The store is thread-local because evaluation is
//! single-threaded by design and a process-global store makes parallel test
//! runs interfere with each other.

use std::cell::RefCell;

use thiserror::Error;

/// Taxonomy of recoverable runtime faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorCode {
    #[error("unknown character")]
    UnknownChar,
    #[error("unknown function")]
    UnknownFn,
    #[error("dimension mismatch")]
    DimensionMismatch,
    #[error("non-square matrix")]
    NonSquareMatrix,
    #[error("irregular matrix")]
    IrregularMatrix,
    #[error("type mismatch")]
    TypeMismatch,
    #[error("buffer depletion")]
    BufferDepletion,
    #[error("character not found")]
    CharNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Operation that raised the fault, e.g. `"matrix_mul"`.
    pub context: String,
    pub code: ErrorCode,
    pub detail: String,
}

thread_local! {
    static DIAGNOSTICS: RefCell<Vec<Diagnostic>> = const { RefCell::new(Vec::new()) };
}

/// Record a recoverable fault and continue.
pub fn report(context: &str, code: ErrorCode, detail: impl Into<String>) {
    let detail = detail.into();
    log::warn!("{context}: {code}: {detail}");
    DIAGNOSTICS.with(|store| {
        store.borrow_mut().push(Diagnostic {
            context: context.to_string(),
            code,
            detail,
        });
    });
}

/// Drain every diagnostic recorded on this thread since the last call.
pub fn take_all() -> Vec<Diagnostic> {
    DIAGNOSTICS.with(|store| store.borrow_mut().drain(..).collect())
}

pub fn reset() {
    DIAGNOSTICS.with(|store| store.borrow_mut().clear());
}
