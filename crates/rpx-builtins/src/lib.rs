//! Core value model for the RPX calculator
//!
//! Defines the tagged `Value` union shared by both evaluation modes and the
//! dense row-major complex `Matrix` behind matrix literals and linear
//! algebra. Heap payloads (matrix buffers, lambda bodies) are owned by their
//! variant, so overwriting a register or history slot releases the previous
//! occupant through ordinary drop semantics.

use std::fmt;

use num_complex::Complex64;

/// Tolerance used by the engine's approximate comparisons.
pub const EPSILON: f64 = 1e-5;

/// Relative-epsilon comparison with an absolute floor near zero.
///
/// NaN and infinite operands never compare equal.
pub fn approx_eq(a: f64, b: f64) -> bool {
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    let diff = (a - b).abs();
    let scale = a.abs().max(b.abs());
    if scale < 1.0 {
        diff < EPSILON
    } else {
        diff / scale < EPSILON
    }
}

/// Entrywise approximate comparison of two complex numbers.
pub fn complex_approx_eq(a: Complex64, b: Complex64) -> bool {
    approx_eq(a.re, b.re) && approx_eq(a.im, b.im)
}

/// Result of evaluating one RPX expression or opcode.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Real(f64),
    Complex(Complex64),
    Matrix(Matrix),
    /// Captured lambda body text, stored verbatim and evaluated on call.
    Lambda(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Complex(Complex64::new(0.0, 0.0))
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Real(_) => "real",
            Value::Complex(_) => "complex",
            Value::Matrix(_) => "matrix",
            Value::Lambda(_) => "lambda",
        }
    }

    /// Real projection used by stack-offset opcodes; non-numeric values
    /// read as NaN.
    pub fn as_real(&self) -> f64 {
        match self {
            Value::Real(r) => *r,
            Value::Complex(c) => c.re,
            _ => f64::NAN,
        }
    }

    /// Complex projection used by matrix-literal entries.
    pub fn as_complex(&self) -> Complex64 {
        match self {
            Value::Real(r) => Complex64::new(*r, 0.0),
            Value::Complex(c) => *c,
            _ => Complex64::new(f64::NAN, f64::NAN),
        }
    }
}

/// Dense row-major matrix of complex entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Complex64>,
}

impl Matrix {
    pub fn new(data: Vec<Complex64>, rows: usize, cols: usize) -> Result<Self, String> {
        if data.len() != rows * cols {
            return Err(format!(
                "Matrix data length {} doesn't match dimensions {}x{}",
                data.len(),
                rows,
                cols
            ));
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![Complex64::new(0.0, 0.0); rows * cols],
        }
    }

    /// NaN-filled matrix of the given shape, used as the graceful
    /// degradation result of structurally invalid operations.
    pub fn nan(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![Complex64::new(f64::NAN, f64::NAN); rows * cols],
        }
    }

    pub fn identity(dim: usize) -> Self {
        let mut m = Matrix::zeros(dim, dim);
        for i in 0..dim {
            m.data[i * dim + i] = Complex64::new(1.0, 0.0);
        }
        m
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[self.cols * row + col]
    }

    pub fn set(&mut self, row: usize, col: usize, v: Complex64) {
        self.data[self.cols * row + col] = v;
    }
}

fn fmt_real(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        write!(f, "{}", x as i64)
    } else {
        write!(f, "{x}")
    }
}

fn fmt_complex(f: &mut fmt::Formatter<'_>, c: Complex64) -> fmt::Result {
    if c.im == 0.0 {
        fmt_real(f, c.re)
    } else {
        fmt_real(f, c.re)?;
        write!(f, " + ")?;
        fmt_real(f, c.im)?;
        write!(f, "i")
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            for col in 0..self.cols {
                write!(f, "\t")?;
                fmt_complex(f, self.get(row, col))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Real(r) => fmt_real(f, *r),
            Value::Complex(c) => fmt_complex(f, *c),
            Value::Matrix(m) => write!(f, "{m}"),
            Value::Lambda(body) => write!(f, "{{{body}}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_length_invariant() {
        let ok = Matrix::new(vec![Complex64::new(1.0, 0.0); 6], 2, 3);
        assert!(ok.is_ok());
        let bad = Matrix::new(vec![Complex64::new(1.0, 0.0); 5], 2, 3);
        assert!(bad.is_err());
    }

    #[test]
    fn identity_diagonal() {
        let id = Matrix::identity(3);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(id.get(i, j).re, expected);
            }
        }
    }

    #[test]
    fn approx_eq_handles_scales() {
        assert!(approx_eq(1.0, 1.0 + 1e-7));
        assert!(approx_eq(1e12, 1e12 * (1.0 + 1e-7)));
        assert!(!approx_eq(1.0, 1.1));
        assert!(approx_eq(0.0, 1e-9));
        assert!(!approx_eq(f64::NAN, f64::NAN));
        assert!(!approx_eq(f64::INFINITY, f64::INFINITY));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Real(4.0).to_string(), "4");
        assert_eq!(Value::Real(2.5).to_string(), "2.5");
        assert_eq!(Value::Complex(Complex64::new(1.0, 2.0)).to_string(), "1 + 2i");
        assert_eq!(Value::Lambda("$1 2 *".to_string()).to_string(), "{$1 2 *}");
    }
}
