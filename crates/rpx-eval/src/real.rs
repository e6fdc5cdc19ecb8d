//! Real-mode stack machine
//!
//! Character-driven RPN evaluator over a fixed-capacity operand stack of
//! real numbers and captured lambda bodies. Arithmetic and comparison
//! opcodes fold every value pushed since the current frame base, groups and
//! lambda calls save that base on explicit frame stacks, and `$1..$8` read
//! the argument window of the innermost call. Malformed input is reported
//! and evaluation continues; only an unknown register or argument selector
//! panics, since that is a caller bug rather than user input.

use rpx_builtins::Value;
use rpx_runtime::constants::constant;

use crate::lex::{scan_lambda, scan_number};
use rpx_runtime::diagnostics::{report, ErrorCode};
use rpx_runtime::mathfn::{combination, gamma, gcd, lcm, permutation};
use rpx_runtime::rng;
use rpx_runtime::session::{self, RealRuntimeInfo};

/// Operand stack capacity.
pub const STACK_CAP: usize = 100;
/// Positional arguments reachable inside a lambda body.
pub const ARG_WINDOW: usize = 8;
/// Maximum concurrent lambda/function call frames.
pub const CALL_DEPTH: usize = 8;
/// Host-recursion guard for nested lambda bodies.
const MAX_RECURSION: usize = 64;

const CONTEXT: &str = "eval_real";

/// One operand-stack slot. Group markers are parked as NaN placeholders so
/// stack offsets stay aligned with the frame layout.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Num(f64),
    Lambda(String),
}

impl Slot {
    fn num(&self) -> f64 {
        match self {
            Slot::Num(n) => *n,
            Slot::Lambda(_) => f64::NAN,
        }
    }

    fn value(&self) -> Value {
        match self {
            Slot::Num(n) => Value::Real(*n),
            Slot::Lambda(body) => Value::Lambda(body.clone()),
        }
    }
}

/// Saved argument window of a suspended call frame.
struct DumpFrame {
    arg_base: usize,
    max_arg: usize,
}

struct RealVm {
    stack: Vec<Slot>,
    /// Index of the first slot belonging to the current group.
    rbp: usize,
    /// Saved `rbp` per open `(` group.
    groups: Vec<usize>,
    /// Saved argument windows of suspended calls.
    dump: Vec<DumpFrame>,
    /// `$k` reads `stack[arg_base - k]`.
    arg_base: usize,
    /// Highest argument index the current frame has referenced.
    max_arg: usize,
    info: RealRuntimeInfo,
    continuing: bool,
    depth: usize,
}

/// Evaluate a real-mode RPN expression.
///
/// The result is the final top of stack, `Real` or `Lambda`; it is also
/// appended to the history ring. Malformed input never panics.
pub fn eval_real(expr: &str) -> Value {
    log::trace!("eval_real: {expr:?}");
    let mut vm = RealVm::new(session::real_runtime_info());
    vm.eval(expr);
    let result = vm.stack.last().cloned().unwrap_or(Slot::Num(f64::NAN));
    vm.info.push_history(result.num());
    session::set_real_runtime_info(vm.info);
    result.value()
}

impl RealVm {
    fn new(info: RealRuntimeInfo) -> Self {
        RealVm {
            stack: Vec::with_capacity(STACK_CAP),
            rbp: 0,
            groups: Vec::new(),
            dump: Vec::new(),
            arg_base: 0,
            max_arg: 0,
            info,
            continuing: true,
            depth: 0,
        }
    }

    fn push(&mut self, slot: Slot) {
        if self.stack.len() >= STACK_CAP {
            report(CONTEXT, ErrorCode::BufferDepletion, "operand stack full");
            return;
        }
        self.stack.push(slot);
    }

    fn pop_num(&mut self) -> f64 {
        self.stack.pop().map(|s| s.num()).unwrap_or(f64::NAN)
    }

    /// Overwrite the top of the stack with `f` applied to it.
    fn apply(&mut self, f: impl Fn(f64) -> f64) {
        if let Some(top) = self.stack.last_mut() {
            *top = Slot::Num(f(top.num()));
        }
    }

    /// Pop the top as rhs and apply a two-argument function to the new top.
    fn apply2(&mut self, f: impl Fn(f64, f64) -> f64) {
        let rhs = self.pop_num();
        self.apply(|lhs| f(lhs, rhs));
    }

    /// Fold every value above the frame base into one, consuming from the
    /// top down.
    fn fold(&mut self, op: impl Fn(f64, f64) -> f64) {
        while self.stack.len() > self.rbp + 1 {
            let rhs = self.pop_num();
            let acc = self.stack[self.rbp].num();
            self.stack[self.rbp] = Slot::Num(op(acc, rhs));
        }
    }

    /// Chain-compare the group top-down; the whole group collapses to one
    /// boolean sentinel (NaN = false, 1.0 = true).
    fn fold_compare(&mut self, pred: impl Fn(f64, f64) -> bool) {
        let mut holds = true;
        while self.stack.len() > self.rbp + 1 {
            let len = self.stack.len();
            let upper = self.stack[len - 1].num();
            let lower = self.stack[len - 2].num();
            if pred(lower, upper) {
                self.stack.pop();
            } else {
                holds = false;
                break;
            }
        }
        let sentinel = if holds { 1.0 } else { f64::NAN };
        self.stack.truncate(self.rbp);
        self.push(Slot::Num(sentinel));
    }

    fn group_begin(&mut self) {
        self.groups.push(self.rbp);
        self.push(Slot::Num(f64::NAN)); // frame marker placeholder
        self.rbp = self.stack.len();
    }

    fn group_end(&mut self) {
        let Some(saved) = self.groups.pop() else {
            report(CONTEXT, ErrorCode::UnknownChar, "unmatched ')'");
            return;
        };
        let top = self.stack.pop().unwrap_or(Slot::Num(f64::NAN));
        // Compact the surviving value into the marker slot.
        self.stack.truncate(self.rbp.saturating_sub(1));
        self.stack.push(top);
        self.rbp = saved;
    }

    /// Invoke a lambda body (or named-function body) as a new call frame.
    fn call_lambda(&mut self, body: &str) {
        if self.dump.len() >= CALL_DEPTH {
            report(CONTEXT, ErrorCode::BufferDepletion, "call depth exceeded");
            self.push(Slot::Num(f64::NAN));
            return;
        }
        self.dump.push(DumpFrame {
            arg_base: self.arg_base,
            max_arg: self.max_arg,
        });
        self.arg_base = self.stack.len();
        self.max_arg = 0;
        let saved_rbp = self.rbp;
        let saved_groups = self.groups.len();
        self.rbp = self.stack.len();

        self.eval(body);

        // Trim exactly the argument slots the body referenced, then seat
        // the result where the deepest consumed argument was.
        let used = self.max_arg;
        let result = self.stack.pop().unwrap_or(Slot::Num(f64::NAN));
        self.groups.truncate(saved_groups);
        self.stack.truncate(self.arg_base.saturating_sub(used));
        self.stack.push(result);
        self.rbp = saved_rbp;
        if let Some(frame) = self.dump.pop() {
            self.arg_base = frame.arg_base;
            self.max_arg = frame.max_arg;
        }
    }

    fn invoke(&mut self, bytes: &[u8], i: usize) -> usize {
        match self.stack.pop() {
            Some(Slot::Lambda(body)) => {
                self.call_lambda(&body);
                i
            }
            top => {
                if let Some(slot) = top {
                    self.stack.push(slot);
                }
                match bytes.get(i + 1).copied() {
                    Some(c) if c.is_ascii_lowercase() => {
                        let body = self.info.functions[(c - b'a') as usize].clone();
                        if body.is_empty() {
                            report(
                                CONTEXT,
                                ErrorCode::UnknownFn,
                                format!("function '{}' is undefined", c as char),
                            );
                        } else {
                            self.call_lambda(&body);
                        }
                        i + 1
                    }
                    _ => {
                        report(CONTEXT, ErrorCode::UnknownFn, "nothing to invoke");
                        i
                    }
                }
            }
        }
    }

    /// Read a positional argument or register after `$`.
    fn read_var(&mut self, selector: u8) {
        if selector.is_ascii_digit() {
            let k = (selector - b'0') as usize;
            if (1..=ARG_WINDOW).contains(&k) {
                if k > self.max_arg {
                    self.max_arg = k;
                }
                let slot = self
                    .arg_base
                    .checked_sub(k)
                    .and_then(|idx| self.stack.get(idx))
                    .cloned()
                    .unwrap_or(Slot::Num(f64::NAN));
                self.push(slot);
            } else {
                self.push(Slot::Num(f64::NAN));
            }
        } else if selector.is_ascii_lowercase() {
            let v = self.info.regs[(selector - b'a') as usize];
            self.push(Slot::Num(v));
        } else {
            panic!("register '{}' not found", selector as char);
        }
    }

    fn write_var(&mut self, selector: u8) {
        if selector.is_ascii_lowercase() {
            let v = self.stack.last().map(|s| s.num()).unwrap_or(f64::NAN);
            self.info.regs[(selector - b'a') as usize] = v;
        } else {
            panic!("register '{}' not found", selector as char);
        }
    }

    fn sysfn(&mut self, selector: u8) {
        match selector {
            b'a' => {
                let v = self.info.history_back(0);
                self.push(Slot::Num(v));
            }
            b'h' => {
                let n = self.pop_num();
                let v = if n >= 0.0 {
                    self.info.history_back(n as usize)
                } else {
                    f64::NAN
                };
                self.push(Slot::Num(v));
            }
            b'p' => {
                let top = self.stack.last().cloned().unwrap_or(Slot::Num(f64::NAN));
                self.push(top);
            }
            b's' => {
                let n = self.pop_num();
                let slot = if n >= 0.0 {
                    self.stack
                        .len()
                        .checked_sub(n as usize + 1)
                        .and_then(|idx| self.stack.get(idx))
                        .cloned()
                        .unwrap_or(Slot::Num(f64::NAN))
                } else {
                    Slot::Num(f64::NAN)
                };
                self.push(slot);
            }
            b'r' => self.push(Slot::Num(rng::uniform())),
            b'd' => {
                if let Some(top) = self.stack.last() {
                    println!("{}", top.value());
                }
            }
            b'n' => self.push(Slot::Num(f64::NAN)),
            other => report(
                CONTEXT,
                ErrorCode::UnknownFn,
                format!("unknown system function: {}", other as char),
            ),
        }
    }

    fn eval(&mut self, expr: &str) {
        if self.depth >= MAX_RECURSION {
            report(CONTEXT, ErrorCode::BufferDepletion, "recursion limit reached");
            self.push(Slot::Num(f64::NAN));
            return;
        }
        self.depth += 1;

        let bytes = expr.as_bytes();
        let mut i = 0;
        while i < bytes.len() && self.continuing {
            let c = bytes[i];
            match c {
                b' ' | b'\t' | b'\n' | b'\r' => {}
                b',' | b';' => self.continuing = false,
                b'0'..=b'9' => {
                    let (v, next) = scan_number(bytes, i);
                    self.push(Slot::Num(v));
                    i = next;
                    continue;
                }
                b'(' => self.group_begin(),
                b')' => self.group_end(),
                b'+' => self.fold(|a, b| a + b),
                b'-' => self.fold(|a, b| a - b),
                b'*' => self.fold(|a, b| a * b),
                b'/' => self.fold(|a, b| a / b),
                b'%' => self.fold(|a, b| a % b),
                b'^' => self.fold(f64::powf),
                b'=' => self.fold_compare(rpx_builtins::approx_eq),
                b'<' => self.fold_compare(|a, b| a < b),
                b'>' => self.fold_compare(|a, b| a > b),
                b'?' => {
                    let cond = self.pop_num();
                    let if_false = self.pop_num();
                    let if_true = self.pop_num();
                    self.push(Slot::Num(if cond.is_nan() { if_false } else { if_true }));
                }
                b'{' => {
                    let (body, close) = scan_lambda(expr, bytes, i);
                    self.push(Slot::Lambda(body));
                    i = close;
                }
                b'!' => i = self.invoke(bytes, i),
                b'$' => {
                    let selector = bytes.get(i + 1).copied().unwrap_or(0);
                    self.read_var(selector);
                    i += 1;
                }
                b'&' => {
                    let selector = bytes.get(i + 1).copied().unwrap_or(0);
                    self.write_var(selector);
                    i += 1;
                }
                b'@' => {
                    let selector = bytes.get(i + 1).copied().unwrap_or(0);
                    self.sysfn(selector);
                    i += 1;
                }
                b'\\' => {
                    let letter = bytes.get(i + 1).copied().unwrap_or(0);
                    self.push(Slot::Num(constant(letter as char)));
                    i += 1;
                }
                b'A' => self.apply(f64::abs),
                b'C' => self.apply(f64::ceil),
                b'F' => self.apply(f64::floor),
                b'R' => self.apply(f64::round),
                b's' => self.apply(f64::sin),
                b'c' => self.apply(f64::cos),
                b't' => self.apply(f64::tan),
                b'g' => self.apply(gamma),
                b'm' => self.apply(|x| -x),
                b'r' => self.apply(|x| x * std::f64::consts::PI / 180.0),
                b'd' => self.apply(|x| x * 180.0 / std::f64::consts::PI),
                b'a' => {
                    match bytes.get(i + 1).copied() {
                        Some(b's') => self.apply(f64::asin),
                        Some(b'c') => self.apply(f64::acos),
                        Some(b't') => self.apply(f64::atan),
                        other => unknown_fn("arc", other),
                    }
                    i += 1;
                }
                b'h' => {
                    match bytes.get(i + 1).copied() {
                        Some(b's') => self.apply(f64::sinh),
                        Some(b'c') => self.apply(f64::cosh),
                        Some(b't') => self.apply(f64::tanh),
                        other => unknown_fn("hyperbolic", other),
                    }
                    i += 1;
                }
                b'l' => {
                    match bytes.get(i + 1).copied() {
                        Some(b'2') => self.apply(f64::log2),
                        Some(b'c') => self.apply(f64::log10),
                        Some(b'e') => self.apply(f64::ln),
                        other => unknown_fn("log", other),
                    }
                    i += 1;
                }
                b'i' => {
                    match bytes.get(i + 1).copied() {
                        Some(b'g') => self.apply2(gcd),
                        Some(b'l') => self.apply2(lcm),
                        Some(b'p') => self.apply2(permutation),
                        Some(b'c') => self.apply2(combination),
                        other => unknown_fn("integer", other),
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

        self.depth -= 1;
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

