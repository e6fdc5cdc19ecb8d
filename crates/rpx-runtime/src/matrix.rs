//! Matrix engine
//!
//! Dense row-major complex matrix arithmetic: add/sub/mul, Gauss-Jordan
//! inversion, determinant and in-place scalar scaling. Structural errors
//! (dimension mismatch, singular input) are reported through the
//! diagnostics store and degrade to a substitute result; they never abort
//! evaluation.

use num_complex::Complex64;
use rpx_builtins::{complex_approx_eq, Matrix};

use crate::diagnostics::{report, ErrorCode};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const CNAN: Complex64 = Complex64::new(f64::NAN, f64::NAN);

/// Entrywise approximate equality; shapes must match exactly.
pub fn matrix_eq(a: &Matrix, b: &Matrix) -> bool {
    if a.rows != b.rows || a.cols != b.cols {
        return false;
    }
    a.data
        .iter()
        .zip(b.data.iter())
        .all(|(x, y)| complex_approx_eq(*x, *y))
}

fn check_same_shape(context: &str, a: &Matrix, b: &Matrix) -> bool {
    if a.rows == b.rows && a.cols == b.cols {
        return true;
    }
    report(
        context,
        ErrorCode::DimensionMismatch,
        format!("{}x{} && {}x{}", a.rows, a.cols, b.rows, b.cols),
    );
    false
}

/// Matrix addition; mismatched shapes yield a NaN-filled matrix of the
/// lhs's shape.
pub fn matrix_add(a: &Matrix, b: &Matrix) -> Matrix {
    if !check_same_shape("matrix_add", a, b) {
        return Matrix::nan(a.rows, a.cols);
    }
    let data = a.data.iter().zip(b.data.iter()).map(|(x, y)| x + y).collect();
    Matrix::new(data, a.rows, a.cols).unwrap() // Always valid
}

/// Matrix subtraction; same degradation rule as [`matrix_add`].
pub fn matrix_sub(a: &Matrix, b: &Matrix) -> Matrix {
    if !check_same_shape("matrix_sub", a, b) {
        return Matrix::nan(a.rows, a.cols);
    }
    let data = a.data.iter().zip(b.data.iter()).map(|(x, y)| x - y).collect();
    Matrix::new(data, a.rows, a.cols).unwrap() // Always valid
}

/// Matrix multiplication, O(n^3) triple loop.
///
/// The dimension check deliberately combines both inequalities with AND,
/// matching the historical behavior: a product is rejected only when
/// `lhs.rows != rhs.cols` and `lhs.cols != rhs.rows` both hold. Entries the
/// inner loop would read past the rhs buffer read as NaN instead.
pub fn matrix_mul(a: &Matrix, b: &Matrix) -> Matrix {
    if a.rows != b.cols && a.cols != b.rows {
        report(
            "matrix_mul",
            ErrorCode::DimensionMismatch,
            format!("{}x{} && {}x{}", a.rows, a.cols, b.rows, b.cols),
        );
        return Matrix::nan(a.rows, b.cols);
    }

    let rows = a.rows;
    let cols = b.cols;
    let mut data = vec![ZERO; rows * cols];
    for i in 0..rows {
        for j in 0..cols {
            let mut sum = ZERO;
            for k in 0..a.cols {
                let lhs = a.data[a.cols * i + k];
                let rhs = b.data.get(b.cols * k + j).copied().unwrap_or(CNAN);
                sum += lhs * rhs;
            }
            data[cols * i + j] = sum;
        }
    }
    Matrix::new(data, rows, cols).unwrap() // Always valid
}

/// Inverse by Gauss-Jordan elimination with wrap-around pivot search and
/// swap-with-negate row exchanges.
///
/// Non-square or singular input is reported and the original matrix is
/// returned unchanged.
pub fn matrix_inverse(a: &Matrix) -> Matrix {
    if !a.is_square() {
        report(
            "matrix_inverse",
            ErrorCode::NonSquareMatrix,
            format!("{}x{}", a.rows, a.cols),
        );
        return a.clone();
    }

    let dim = a.rows;
    let mut m = a.data.clone();
    let mut inv = Matrix::identity(dim).data;

    // Eliminate every off-diagonal entry of column i.
    for i in 0..dim {
        if m[i * dim + i] == ZERO {
            let mut j = (i + 1) % dim;
            while m[j * dim + i] == ZERO {
                if j == i {
                    report("matrix_inverse", ErrorCode::IrregularMatrix, "no usable pivot");
                    return a.clone();
                }
                j = (j + 1) % dim;
            }
            for k in 0..dim {
                let tmp = m[i * dim + k];
                m[i * dim + k] = m[j * dim + k];
                m[j * dim + k] = -tmp;
                let tmp = inv[i * dim + k];
                inv[i * dim + k] = inv[j * dim + k];
                inv[j * dim + k] = -tmp;
            }
        }

        let mut j = (i + 1) % dim;
        while j != i {
            let coef = m[j * dim + i] / m[i * dim + i];
            for k in 0..dim {
                let id = (k + i) % dim;
                let sub = coef * m[i * dim + id];
                m[j * dim + id] -= sub;
                let sub = coef * inv[i * dim + id];
                inv[j * dim + id] -= sub;
            }
            j = (j + 1) % dim;
        }
    }

    // Divide each row by its surviving diagonal entry.
    for i in 0..dim {
        let pivot = m[i * dim + i];
        if pivot == ZERO {
            report("matrix_inverse", ErrorCode::IrregularMatrix, "zero diagonal");
            return a.clone();
        }
        for j in 0..dim {
            inv[i * dim + j] /= pivot;
        }
    }

    Matrix::new(inv, dim, dim).unwrap() // Always valid
}

/// Determinant via elimination to upper-triangular form on a scratch copy;
/// returns 0 for singular matrices and NaN for non-square input.
pub fn matrix_det(a: &Matrix) -> Complex64 {
    if !a.is_square() {
        report(
            "matrix_det",
            ErrorCode::NonSquareMatrix,
            format!("{}x{}", a.rows, a.cols),
        );
        return CNAN;
    }

    let dim = a.rows;
    let mut m = a.data.clone();
    for i in 0..dim {
        if m[i * dim + i] == ZERO {
            let Some(r) = (i + 1..dim).find(|r| m[r * dim + i] != ZERO) else {
                return ZERO;
            };
            // Swap-with-negate keeps the determinant's sign intact.
            for k in i..dim {
                let tmp = m[i * dim + k];
                m[i * dim + k] = m[r * dim + k];
                m[r * dim + k] = -tmp;
            }
        }
        for j in i + 1..dim {
            let coef = m[j * dim + i] / m[i * dim + i];
            for k in i..dim {
                let sub = coef * m[i * dim + k];
                m[j * dim + k] -= sub;
            }
        }
    }

    (0..dim).map(|i| m[i * dim + i]).product()
}

/// In-place scalar multiplication.
pub fn matrix_scale(a: &mut Matrix, s: Complex64) {
    for entry in &mut a.data {
        *entry *= s;
    }
}
