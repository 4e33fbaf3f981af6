//! Tests for variable domains.

use super::*;
use crate::error::RegionError;

#[test]
fn test_invalid_bounds_rejected() {
    let err = Variable::real("x", 2.0, 1.0).unwrap_err();
    assert!(matches!(err, RegionError::InvalidBounds { .. }));

    let err = Variable::real("x", f64::NAN, 1.0).unwrap_err();
    assert!(matches!(err, RegionError::InvalidBounds { .. }));
}

#[test]
fn test_integer_range_rounds_inward() {
    let x = Variable::integer("x", 0.5, 3.7).unwrap();
    assert_eq!(x.integer_range(), Some((1, 3)));
    assert_eq!(x.measure(), 3.0);

    let empty = Variable::integer("y", 0.2, 0.8).unwrap();
    assert_eq!(empty.integer_range(), None);
    assert_eq!(empty.measure(), 0.0);
}

#[test]
fn test_real_measure() {
    let x = Variable::real("x", -1.0, 1.0).unwrap();
    assert_eq!(x.measure(), 2.0);

    let fixed = Variable::real("y", 3.0, 3.0).unwrap();
    assert_eq!(fixed.measure(), 1.0);
}

#[test]
fn test_contains_checks_integrality() {
    let x = Variable::integer("x", 0.0, 5.0).unwrap();
    assert!(x.contains(4.0000001, 1e-6));
    assert!(!x.contains(4.5, 1e-6));
    assert!(!x.contains(6.0, 1e-6));

    let y = Variable::real("y", 0.0, 1.0).unwrap();
    assert!(y.contains(0.5, 1e-6));
    assert!(!y.contains(f64::NAN, 1e-6));
}

#[test]
fn test_require_finite() {
    let x = Variable::real("x", 0.0, f64::INFINITY).unwrap();
    assert_eq!(
        x.require_finite(),
        Err(RegionError::UnboundedVariable("x".to_string()))
    );
}

#[test]
fn test_set_kind_and_bounds() {
    let mut x = Variable::real("x", 0.0, 1.0).unwrap();
    x.set_kind(DomainKind::Integer);
    x.set_bounds(2.0, 2.0).unwrap();
    assert!(x.is_integer());
    assert_eq!((x.lower(), x.upper()), (2.0, 2.0));
    assert!(x.set_bounds(3.0, 1.0).is_err());
}
