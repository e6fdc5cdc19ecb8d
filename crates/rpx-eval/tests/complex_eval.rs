use num_complex::Complex64;
use rpx_builtins::{approx_eq, complex_approx_eq, Matrix, Value};
use rpx_eval::eval_complex;
use rpx_runtime::diagnostics::{self, ErrorCode};
use rpx_runtime::matrix_eq;

fn as_matrix(v: Value) -> Matrix {
    match v {
        Value::Matrix(m) => m,
        other => panic!("expected matrix, got {}", other.type_name()),
    }
}

fn mat(entries: &[f64], rows: usize, cols: usize) -> Matrix {
    let data = entries.iter().map(|x| Complex64::new(*x, 0.0)).collect();
    Matrix::new(data, rows, cols).unwrap()
}

#[test]
fn scalar_arithmetic() {
    assert_eq!(
        eval_complex("1 2i +"),
        Value::Complex(Complex64::new(1.0, 2.0))
    );
    assert_eq!(
        eval_complex("(3 4i +) (1 2i +) -"),
        Value::Complex(Complex64::new(2.0, 2.0))
    );
    assert_eq!(eval_complex("2i 3i *"), Value::Complex(Complex64::new(-6.0, 0.0)));
}

#[test]
fn complex_power() {
    let v = eval_complex("4i 5 ^").as_complex();
    assert!(complex_approx_eq(v, Complex64::new(0.0, 1024.0)));
}

#[test]
fn matrix_literal_shape() {
    let m = as_matrix(eval_complex("[2 1,2,3,4,]"));
    assert_eq!((m.rows, m.cols), (2, 2));
    assert!(matrix_eq(&m, &mat(&[1.0, 2.0, 3.0, 4.0], 2, 2)));
}

#[test]
fn matrix_literal_entries_are_expressions() {
    let m = as_matrix(eval_complex("[2 1 1 +, 2i, 3 4 *, 0,]"));
    assert!(complex_approx_eq(m.data[0], Complex64::new(2.0, 0.0)));
    assert!(complex_approx_eq(m.data[1], Complex64::new(0.0, 2.0)));
    assert!(complex_approx_eq(m.data[2], Complex64::new(12.0, 0.0)));
}

#[test]
fn matrix_product() {
    let m = as_matrix(eval_complex("[2 1,2,3,4,][2 5,6,7,8,]*"));
    assert!(matrix_eq(&m, &mat(&[19.0, 22.0, 43.0, 50.0], 2, 2)));
}

#[test]
fn matrix_inverse_literal() {
    let m = as_matrix(eval_complex("[2 1,2,3,4,]~"));
    assert!(matrix_eq(&m, &mat(&[-2.0, 1.0, 1.5, -0.5], 2, 2)));
}

#[test]
fn matrix_inverse_round_trip() {
    let m = as_matrix(eval_complex("[2 1,2,3,4,]~~"));
    assert!(matrix_eq(&m, &mat(&[1.0, 2.0, 3.0, 4.0], 2, 2)));
}

#[test]
fn shape_preserving_scale() {
    let m = as_matrix(eval_complex("[3 5,6,7,] 5 *"));
    assert_eq!((m.rows, m.cols), (1, 3));
    assert!(matrix_eq(&m, &mat(&[25.0, 30.0, 35.0], 1, 3)));
}

#[test]
fn add_dimension_mismatch_degrades_to_nan() {
    diagnostics::reset();
    let m = as_matrix(eval_complex("[2 1,2,3,4,][3 1,2,3,4,5,6,7,8,9,]+"));
    assert_eq!((m.rows, m.cols), (2, 2));
    assert!(m.data.iter().all(|e| e.re.is_nan()));
    let diags = diagnostics::take_all();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, ErrorCode::DimensionMismatch);
}

#[test]
fn zero_column_literal_reports() {
    diagnostics::reset();
    let v = eval_complex("[0 1,2,]");
    assert!(v.as_complex().re.is_nan());
    assert_eq!(diagnostics::take_all()[0].code, ErrorCode::DimensionMismatch);
}

#[test]
fn equality_fold() {
    assert_eq!(
        eval_complex("[2 1,2,3,4,][2 1,2,3,4,]="),
        Value::Complex(Complex64::new(1.0, 0.0))
    );
    assert!(eval_complex("1 2 =").as_real().is_nan());
    assert!(eval_complex("[2 1,2,3,4,] 1 =").as_real().is_nan());
}

#[test]
fn register_holds_matrix() {
    eval_complex("[2 1,2,3,4,]&m");
    let m = as_matrix(eval_complex("$m ~ $m *"));
    assert!(matrix_eq(&m, &Matrix::identity(2)));
}

#[test]
fn modulus_and_negate() {
    assert!(approx_eq(eval_complex("3 4i + A").as_real(), 5.0));
    assert_eq!(
        eval_complex("1 2i + m"),
        Value::Complex(Complex64::new(-1.0, -2.0))
    );
}

#[test]
fn polar_rotation() {
    let v = eval_complex("1 (\\P 2 /) p").as_complex();
    assert!(complex_approx_eq(v, Complex64::new(0.0, 1.0)));
}

#[test]
fn transcendental_functions() {
    assert!(approx_eq(eval_complex("\\E l").as_real(), 1.0));
    assert!(approx_eq(eval_complex("8 2 L").as_real(), 3.0));
    let v = eval_complex("0 s").as_complex();
    assert!(complex_approx_eq(v, Complex64::new(0.0, 0.0)));
}

#[test]
fn history_holds_values() {
    eval_complex("5 5 *");
    assert!(approx_eq(eval_complex("@a").as_real(), 25.0));
}

#[test]
fn apply_on_matrix_reports_type_mismatch() {
    diagnostics::reset();
    let m = as_matrix(eval_complex("[2 1,2,3,4,]s"));
    assert!(matrix_eq(&m, &mat(&[1.0, 2.0, 3.0, 4.0], 2, 2)));
    assert_eq!(diagnostics::take_all()[0].code, ErrorCode::TypeMismatch);
}

#[test]
fn inverse_of_scalar_reports_type_mismatch() {
    diagnostics::reset();
    assert!(approx_eq(eval_complex("5 ~").as_real(), 5.0));
    assert_eq!(diagnostics::take_all()[0].code, ErrorCode::TypeMismatch);
}

#[test]
fn lambda_literal_is_inert() {
    assert_eq!(eval_complex("{1 2 +}"), Value::Lambda("1 2 +".to_string()));
}

#[test]
fn semicolon_terminates() {
    assert!(approx_eq(eval_complex("7 ; 9").as_real(), 7.0));
}
