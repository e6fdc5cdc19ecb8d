//! Polymorphic arithmetic over tagged values
//!
//! Dispatches the binary operators of the complex/matrix evaluator on the
//! operand type pair and hands matrix operands to the matrix engine. All
//! functions take the lhs in place and consume the rhs, so matrix and
//! lambda payloads move rather than copy; a reported type mismatch leaves
//! the lhs untouched.

use num_complex::Complex64;
use rpx_builtins::{approx_eq, complex_approx_eq, Value};

use crate::diagnostics::{report, ErrorCode};
use crate::matrix::{matrix_add, matrix_eq, matrix_inverse, matrix_mul, matrix_scale, matrix_sub};

fn mismatch(context: &str, lhs_type: &str, rhs_type: &str) {
    report(
        context,
        ErrorCode::TypeMismatch,
        format!("{lhs_type} && {rhs_type}"),
    );
}

/// Type-aware equality; distinct types never compare equal.
pub fn elem_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Real(a), Value::Real(b)) => approx_eq(*a, *b),
        (Value::Complex(a), Value::Complex(b)) => complex_approx_eq(*a, *b),
        (Value::Matrix(a), Value::Matrix(b)) => matrix_eq(a, b),
        (Value::Lambda(a), Value::Lambda(b)) => a == b,
        _ => false,
    }
}

pub fn elem_add(lhs: &mut Value, rhs: Value) {
    let (lt, rt) = (lhs.type_name(), rhs.type_name());
    match (&mut *lhs, rhs) {
        (Value::Real(a), Value::Real(b)) => *a += b,
        (Value::Complex(a), Value::Complex(b)) => *a += b,
        (Value::Matrix(a), Value::Matrix(b)) => *a = matrix_add(a, &b),
        _ => mismatch("elem_add", lt, rt),
    }
}

pub fn elem_sub(lhs: &mut Value, rhs: Value) {
    let (lt, rt) = (lhs.type_name(), rhs.type_name());
    match (&mut *lhs, rhs) {
        (Value::Real(a), Value::Real(b)) => *a -= b,
        (Value::Complex(a), Value::Complex(b)) => *a -= b,
        (Value::Matrix(a), Value::Matrix(b)) => *a = matrix_sub(a, &b),
        _ => mismatch("elem_sub", lt, rt),
    }
}

pub fn elem_mul(lhs: &mut Value, rhs: Value) {
    let (lt, rt) = (lhs.type_name(), rhs.type_name());
    match (&mut *lhs, rhs) {
        (Value::Real(a), Value::Real(b)) => *a *= b,
        (Value::Complex(a), Value::Complex(b)) => *a *= b,
        (Value::Matrix(a), Value::Matrix(b)) => *a = matrix_mul(a, &b),
        (Value::Matrix(a), Value::Complex(s)) => matrix_scale(a, s),
        (Value::Complex(s), Value::Matrix(mut m)) => {
            let s = *s;
            matrix_scale(&mut m, s);
            *lhs = Value::Matrix(m);
        }
        _ => mismatch("elem_mul", lt, rt),
    }
}

/// Division is defined for scalar/scalar and matrix/scalar only.
pub fn elem_div(lhs: &mut Value, rhs: Value) {
    let (lt, rt) = (lhs.type_name(), rhs.type_name());
    match (&mut *lhs, rhs) {
        (Value::Real(a), Value::Real(b)) => *a /= b,
        (Value::Complex(a), Value::Complex(b)) => *a /= b,
        (Value::Matrix(a), Value::Complex(s)) => {
            matrix_scale(a, Complex64::new(1.0, 0.0) / s);
        }
        _ => mismatch("elem_div", lt, rt),
    }
}

/// Scalar power goes through the complex power function; a matrix raised to
/// an integer exponent multiplies repeatedly (`n-1` products for exponent
/// `n`, so exponents 0 and 1 both leave the base unchanged, as in the
/// original engine). A negative exponent inverts once first.
pub fn elem_pow(lhs: &mut Value, rhs: Value) {
    let (lt, rt) = (lhs.type_name(), rhs.type_name());
    match (&mut *lhs, rhs) {
        (Value::Real(a), Value::Real(b)) => *a = a.powf(b),
        (Value::Complex(a), Value::Complex(b)) => *a = a.powc(b),
        (Value::Matrix(a), Value::Complex(mut e)) => {
            if e.re < 0.0 {
                *a = matrix_inverse(a);
                e = -e;
            }
            let n = e.re as u64;
            let base = a.clone();
            for _ in 1..n {
                *a = matrix_mul(a, &base);
            }
        }
        _ => mismatch("elem_pow", lt, rt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics;
    use rpx_builtins::Matrix;

    fn mat(entries: &[f64], rows: usize, cols: usize) -> Matrix {
        let data = entries.iter().map(|x| Complex64::new(*x, 0.0)).collect();
        Matrix::new(data, rows, cols).unwrap()
    }

    #[test]
    fn scalar_scalar() {
        let mut v = Value::Complex(Complex64::new(2.0, 0.0));
        elem_add(&mut v, Value::Complex(Complex64::new(0.0, 3.0)));
        assert_eq!(v, Value::Complex(Complex64::new(2.0, 3.0)));
    }

    #[test]
    fn matrix_scalar_scale_both_orders() {
        let mut v = Value::Matrix(mat(&[1.0, 2.0, 3.0, 4.0], 2, 2));
        elem_mul(&mut v, Value::Complex(Complex64::new(2.0, 0.0)));
        let Value::Matrix(m) = &v else { panic!("expected matrix") };
        assert_eq!(m.data[3].re, 8.0);

        let mut v = Value::Complex(Complex64::new(3.0, 0.0));
        elem_mul(&mut v, Value::Matrix(mat(&[1.0, 2.0], 1, 2)));
        let Value::Matrix(m) = &v else { panic!("expected matrix") };
        assert_eq!(m.data[1].re, 6.0);
    }

    #[test]
    fn type_mismatch_reported_and_lhs_kept() {
        diagnostics::reset();
        let mut v = Value::Complex(Complex64::new(1.0, 0.0));
        elem_add(&mut v, Value::Matrix(mat(&[1.0], 1, 1)));
        assert_eq!(v, Value::Complex(Complex64::new(1.0, 0.0)));
        let diags = diagnostics::take_all();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, ErrorCode::TypeMismatch);
    }

    #[test]
    fn matrix_power_counts_multiplications() {
        // n-1 products: exponent 0 and 1 both leave the base unchanged.
        let base = mat(&[2.0, 0.0, 0.0, 2.0], 2, 2);
        for e in [0.0, 1.0] {
            let mut v = Value::Matrix(base.clone());
            elem_pow(&mut v, Value::Complex(Complex64::new(e, 0.0)));
            assert_eq!(v, Value::Matrix(base.clone()));
        }
        let mut v = Value::Matrix(base.clone());
        elem_pow(&mut v, Value::Complex(Complex64::new(3.0, 0.0)));
        let Value::Matrix(m) = &v else { panic!("expected matrix") };
        assert_eq!(m.data[0].re, 8.0);
    }

    #[test]
    fn negative_exponent_inverts() {
        let mut v = Value::Matrix(mat(&[2.0, 0.0, 0.0, 4.0], 2, 2));
        elem_pow(&mut v, Value::Complex(Complex64::new(-1.0, 0.0)));
        let Value::Matrix(m) = &v else { panic!("expected matrix") };
        assert!(approx_eq(m.data[0].re, 0.5));
        assert!(approx_eq(m.data[3].re, 0.25));
    }

    #[test]
    fn eq_is_type_aware() {
        let a = Value::Complex(Complex64::new(1.0, 0.0));
        let b = Value::Real(1.0);
        assert!(!elem_eq(&a, &b));
        assert!(elem_eq(&a, &Value::Complex(Complex64::new(1.0, 1e-9))));
        assert!(elem_eq(
            &Value::Lambda("$1".into()),
            &Value::Lambda("$1".into())
        ));
    }
}
