//! Complex/matrix-mode evaluator
//!
//! Same dispatch-loop design as the real-mode machine, but the operand
//! stack holds tagged values and binary operators fold through the elem
//! arithmetic layer, so matrices and complex scalars mix freely. Matrix
//! literals evaluate each comma-delimited entry by recursing into the
//! evaluator itself.

use std::cell::Cell;

use num_complex::Complex64;
use rpx_builtins::{Matrix, Value};
use rpx_runtime::constants::constant;
use rpx_runtime::diagnostics::{report, ErrorCode};
use rpx_runtime::elem::{elem_add, elem_div, elem_eq, elem_mul, elem_pow, elem_sub};
use rpx_runtime::matrix::matrix_inverse;
use rpx_runtime::rng;
use rpx_runtime::session::{self, ComplexRuntimeInfo};

/// Operand stack capacity.
pub const STACK_CAP: usize = 64;
/// Initial matrix-literal entry buffer capacity.
const MAT_INIT_SIZE: usize = 32;
/// Host-recursion guard for matrix-literal entries.
const MAX_RECURSION: usize = 64;

const CONTEXT: &str = "eval_complex";
const CNAN: Complex64 = Complex64::new(f64::NAN, f64::NAN);

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Evaluate a complex/matrix-mode RPN expression.
///
/// Returns the final top of stack (Complex, Matrix, or Lambda); the caller
/// owns any matrix or lambda payload. The result is also cloned into the
/// history ring. Malformed input never panics.
pub fn eval_complex(expr: &str) -> Value {
    let depth = DEPTH.with(|d| d.get());
    if depth >= MAX_RECURSION {
        report(CONTEXT, ErrorCode::BufferDepletion, "recursion limit reached");
        return Value::Complex(CNAN);
    }
    DEPTH.with(|d| d.set(depth + 1));

    log::trace!("eval_complex: {expr:?}");
    let mut vm = ComplexVm::new(session::complex_runtime_info());
    vm.eval(expr);
    let result = vm.stack.last().cloned().unwrap_or(Value::Complex(CNAN));
    vm.info.push_history(result.clone());
    session::set_complex_runtime_info(vm.info);

    DEPTH.with(|d| d.set(depth));
    result
}

struct ComplexVm {
    stack: Vec<Value>,
    /// Index of the first slot belonging to the current group.
    rbp: usize,
    /// Saved `rbp` per open `(` group.
    groups: Vec<usize>,
    info: ComplexRuntimeInfo,
}

impl ComplexVm {
    fn new(info: ComplexRuntimeInfo) -> Self {
        ComplexVm {
            stack: Vec::with_capacity(STACK_CAP),
            rbp: 0,
            groups: Vec::new(),
            info,
        }
    }

    fn push(&mut self, value: Value) {
        if self.stack.len() >= STACK_CAP {
            report(CONTEXT, ErrorCode::BufferDepletion, "operand stack full");
            return;
        }
        self.stack.push(value);
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().unwrap_or(Value::Complex(CNAN))
    }

    /// Overwrite a complex top of stack with `f` applied to it; other
    /// variants report a type mismatch and stay put.
    fn apply(&mut self, f: impl Fn(Complex64) -> Complex64) {
        match self.stack.last_mut() {
            Some(Value::Complex(c)) => *c = f(*c),
            Some(other) => report(
                CONTEXT,
                ErrorCode::TypeMismatch,
                format!("complex operand expected, got {}", other.type_name()),
            ),
            None => {}
        }
    }

    /// Fold every value above the frame base through an elem-layer
    /// operator, consuming from the top down.
    fn fold(&mut self, op: fn(&mut Value, Value)) {
        while self.stack.len() > self.rbp + 1 {
            let Some(rhs) = self.stack.pop() else { break };
            op(&mut self.stack[self.rbp], rhs);
        }
    }

    /// Chain-compare the group with type-aware equality; collapses to the
    /// NaN/1.0 sentinel.
    fn fold_eq(&mut self) {
        let mut holds = true;
        while self.stack.len() > self.rbp + 1 {
            let len = self.stack.len();
            if elem_eq(&self.stack[len - 2], &self.stack[len - 1]) {
                self.stack.pop();
            } else {
                holds = false;
                break;
            }
        }
        let sentinel = if holds { 1.0 } else { f64::NAN };
        self.stack.truncate(self.rbp);
        self.push(Value::Complex(Complex64::new(sentinel, 0.0)));
    }

    fn group_begin(&mut self) {
        self.groups.push(self.rbp);
        self.push(Value::default()); // frame marker placeholder
        self.rbp = self.stack.len();
    }

    fn group_end(&mut self) {
        let Some(saved) = self.groups.pop() else {
            report(CONTEXT, ErrorCode::UnknownChar, "unmatched ')'");
            return;
        };
        let top = self.pop();
        self.stack.truncate(self.rbp.saturating_sub(1));
        self.stack.push(top);
        self.rbp = saved;
    }

    /// Parse a matrix literal starting at the `[` at `i`; returns the index
    /// of the closing `]` (or end of input).
    fn matrix_literal(&mut self, expr: &str, bytes: &[u8], i: usize) -> usize {
        let (cols, mut k) = crate::lex::scan_usize(bytes, i + 1);
        if cols == 0 {
            report(
                CONTEXT,
                ErrorCode::DimensionMismatch,
                "matrix literal with zero columns",
            );
            self.push(Value::Complex(CNAN));
            while k < bytes.len() && bytes[k] != b']' {
                k += 1;
            }
            return k;
        }

        let mut entries: Vec<Complex64> = Vec::with_capacity(MAT_INIT_SIZE);
        loop {
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k >= bytes.len() || bytes[k] == b']' {
                break;
            }
            // Each entry is a full sub-expression, evaluated recursively.
            let end = bytes[k..]
                .iter()
                .position(|&c| c == b',' || c == b']')
                .map(|off| k + off)
                .unwrap_or(bytes.len());
            let entry = expr.get(k..end).unwrap_or_default();
            entries.push(eval_complex(entry).as_complex());
            k = if bytes.get(end) == Some(&b',') { end + 1 } else { end };
        }

        let rows = entries.len() / cols;
        entries.truncate(rows * cols);
        self.push(Value::Matrix(Matrix::new(entries, rows, cols).unwrap())); // Always valid
        k
    }

    fn sysfn(&mut self, selector: u8) {
        match selector {
            b'a' => {
                let v = self.info.history_back(0);
                self.push(v);
            }
            b'h' => {
                let n = self.pop().as_real();
                let v = if n >= 0.0 {
                    self.info.history_back(n as usize)
                } else {
                    Value::Complex(CNAN)
                };
                self.push(v);
            }
            b'p' => {
                let top = self.stack.last().cloned().unwrap_or(Value::Complex(CNAN));
                self.push(top);
            }
            b's' => {
                let n = self.pop().as_real();
                let v = if n >= 0.0 {
                    self.stack
                        .len()
                        .checked_sub(n as usize + 1)
                        .and_then(|idx| self.stack.get(idx))
                        .cloned()
                        .unwrap_or(Value::Complex(CNAN))
                } else {
                    Value::Complex(CNAN)
                };
                self.push(v);
            }
            b'r' => self.push(Value::Complex(Complex64::new(rng::uniform(), 0.0))),
            b'd' => {
                if let Some(top) = self.stack.last() {
                    println!("{top}");
                }
            }
            b'n' => self.push(Value::Complex(CNAN)),
            other => report(
                CONTEXT,
                ErrorCode::UnknownFn,
                format!("unknown system function: {}", other as char),
            ),
        }
    }

    fn eval(&mut self, expr: &str) {
        let bytes = expr.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            match c {
                b' ' | b'\t' | b'\n' | b'\r' => {}
                b',' | b';' => break,
                b'0'..=b'9' => {
                    let (v, next) = crate::lex::scan_number(bytes, i);
                    self.push(Value::Complex(Complex64::new(v, 0.0)));
                    i = next;
                    continue;
                }
                b'[' => i = self.matrix_literal(expr, bytes, i),
                b'(' => self.group_begin(),
                b')' => self.group_end(),
                b'+' => self.fold(elem_add),
                b'-' => self.fold(elem_sub),
                b'*' => self.fold(elem_mul),
                b'/' => self.fold(elem_div),
                b'^' => self.fold(elem_pow),
                b'=' => self.fold_eq(),
                b'~' => match self.stack.last_mut() {
                    Some(Value::Matrix(m)) => {
                        let inv = matrix_inverse(m);
                        *m = inv;
                    }
                    Some(other) => report(
                        CONTEXT,
                        ErrorCode::TypeMismatch,
                        format!("matrix operand expected, got {}", other.type_name()),
                    ),
                    None => {}
                },
                b'{' => {
                    let (body, close) = crate::lex::scan_lambda(expr, bytes, i);
                    self.push(Value::Lambda(body));
                    i = close;
                }
                b'A' => self.apply(|c| Complex64::new(c.norm(), 0.0)),
                b's' => self.apply(|c| c.sin()),
                b'c' => self.apply(|c| c.cos()),
                b't' => self.apply(|c| c.tan()),
                b'l' => self.apply(|c| c.ln()),
                b'L' => {
                    let base = self.pop().as_real();
                    self.apply(|c| c.ln() / base.ln());
                }
                b'r' => self.apply(|c| c * (std::f64::consts::PI / 180.0)),
                b'd' => self.apply(|c| c * (180.0 / std::f64::consts::PI)),
                b'm' => self.apply(|c| -c),
                b'i' => self.apply(|c| c * Complex64::i()),
                b'p' => {
                    let theta = self.pop().as_complex();
                    self.apply(|c| c * theta.cos() + Complex64::i() * c * theta.sin());
                }
                b'a' => {
                    match bytes.get(i + 1).copied() {
                        Some(b's') => self.apply(|c| c.asin()),
                        Some(b'c') => self.apply(|c| c.acos()),
                        Some(b't') => self.apply(|c| c.atan()),
                        other => unknown_fn("arc", other),
                    }
                    i += 1;
                }
                b'h' => {
                    match bytes.get(i + 1).copied() {
                        Some(b's') => self.apply(|c| c.sinh()),
                        Some(b'c') => self.apply(|c| c.cosh()),
                        Some(b't') => self.apply(|c| c.tanh()),
                        other => unknown_fn("hyperbolic", other),
                    }
                    i += 1;
                }
                b'@' => {
                    let selector = bytes.get(i + 1).copied().unwrap_or(0);
                    self.sysfn(selector);
                    i += 1;
                }
                b'\\' => {
                    let letter = bytes.get(i + 1).copied().unwrap_or(0);
                    self.push(Value::Complex(Complex64::new(constant(letter as char), 0.0)));
                    i += 1;
                }
                b'$' => {
                    let selector = bytes.get(i + 1).copied().unwrap_or(0);
                    if selector.is_ascii_lowercase() {
                        let v = self.info.regs[(selector - b'a') as usize].clone();
                        self.push(v);
                    } else {
                        panic!("register '{}' not found", selector as char);
                    }
                    i += 1;
                }
                b'&' => {
                    let selector = bytes.get(i + 1).copied().unwrap_or(0);
                    if selector.is_ascii_lowercase() {
                        let v = self.stack.last().cloned().unwrap_or(Value::Complex(CNAN));
                        self.info.regs[(selector - b'a') as usize] = v;
                    } else {
                        panic!("register '{}' not found", selector as char);
                    }
                    i += 1;
                }
                other => report(
                    CONTEXT,
                    ErrorCode::UnknownChar,
                    format!("unknown char: {}", other as char),
                ),
            }
            i += 1;
        }
    }
}

fn unknown_fn(family: &str, suffix: Option<u8>) {
    let suffix = suffix.map(|c| c as char).unwrap_or('\0');
    report(
        CONTEXT,
        ErrorCode::UnknownFn,
        format!("unknown {family} fn: {suffix}"),
    );
}
