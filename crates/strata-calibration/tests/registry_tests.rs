//! Integration tests for curve loading from a curve directory

use std::fs;
use std::sync::Arc;
use strata_calibration::{CurveConfig, CurveError, CurveRegistry};

const TOY_CURVE: &str = "\
##  toy curve in IntCal layout
#   CAL BP, 14C age, Sigma, Delta14C, Sigma
2000, 2050, 20, 0.0, 1.0
1000, 1040, 15, 0.0, 1.0
0, 10, 10, 0.0, 1.0
";

fn registry_with_curve(dir: &tempfile::TempDir) -> CurveRegistry {
    fs::write(dir.path().join("toy.14c"), TOY_CURVE).unwrap();
    CurveRegistry::new(CurveConfig::with_directory(dir.path())).unwrap()
}

#[test]
fn test_load_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_with_curve(&dir);

    let curve = registry.load("toy").unwrap();
    assert_eq!(curve.name(), "toy");
    // calBP 2000..0 maps to calendar years -50..1950
    assert_eq!(curve.first_year(), -50);
    assert_eq!(curve.last_year(), 1950);
    assert_eq!(curve.len(), 2001);
}

#[test]
fn test_lazy_load_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_with_curve(&dir);

    assert!(!registry.is_cached("toy"));
    let first = registry.load("toy").unwrap();
    assert!(registry.is_cached("toy"));

    // Removing the file does not matter once cached
    fs::remove_file(dir.path().join("toy.14c")).unwrap();
    let second = registry.load("toy").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_unknown_curve_is_resource_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_with_curve(&dir);

    assert!(matches!(
        registry.load("shcal20"),
        Err(CurveError::ResourceNotFound(_))
    ));
    assert!(matches!(
        registry.load("../toy"),
        Err(CurveError::ResourceNotFound(_))
    ));
}

#[test]
fn test_malformed_file_reports_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.14c"), "100, 100, 5\n50, x, 5\n").unwrap();
    let registry = CurveRegistry::new(CurveConfig::with_directory(dir.path())).unwrap();

    assert!(matches!(
        registry.load("broken"),
        Err(CurveError::Parse { line: 2, .. })
    ));
    assert!(!registry.is_cached("broken"));
}

#[test]
fn test_available_lists_files_and_registered() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_with_curve(&dir);
    fs::write(dir.path().join("notes.txt"), "not a curve").unwrap();

    let extra = strata_calibration::CalibrationCurve::from_points(
        "linear",
        &[(0.0, 1950.0, 10.0), (100.0, 1850.0, 10.0)],
    )
    .unwrap();
    registry.register(extra);

    assert_eq!(registry.available(), vec!["linear".to_string(), "toy".to_string()]);
}
