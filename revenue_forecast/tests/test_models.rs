use revenue_forecast::models::gradient_boost::GradientBoost;
use revenue_forecast::models::spline_trend::SplineTrend;
use revenue_forecast::models::{load_model, save_model, FeatureMatrix, Regressor};
use tempfile::NamedTempFile;

/// Linear series y = intercept + slope * t for t = 1..=n.
fn linear_series(n: usize, intercept: f64, slope: f64) -> (FeatureMatrix, Vec<f64>) {
    let positions: Vec<f64> = (1..=n).map(|i| i as f64).collect();
    let target: Vec<f64> = positions.iter().map(|t| intercept + slope * t).collect();
    (FeatureMatrix::from_column(&positions), target)
}

#[test]
fn test_spline_trend_recovers_linear_trend() {
    let (features, target) = linear_series(30, 100.0, 10.0);
    let mut model = SplineTrend::new(7, 7).unwrap();
    model.fit(&features, &target).unwrap();

    // The centered rolling mean of a line is the line itself, so the
    // in-sample fit should be essentially exact.
    let fitted = model.predict(&features).unwrap();
    for (t, value) in (1..=30).zip(fitted) {
        assert!((value - (100.0 + 10.0 * t as f64)).abs() < 1e-6);
    }
}

#[test]
fn test_spline_trend_extrapolates_linearly() {
    let (features, target) = linear_series(30, 2.0e6, 5.0e4);
    let mut model = SplineTrend::new(7, 7).unwrap();
    model.fit(&features, &target).unwrap();

    // Out-of-sample positions continue the final segment's slope instead
    // of clamping at the last fitted value.
    let future = FeatureMatrix::from_column(&[31.0, 32.0, 36.0, 60.0]);
    let predicted = model.predict(&future).unwrap();
    for (t, value) in [31.0, 32.0, 36.0, 60.0].iter().zip(predicted) {
        assert!((value - (2.0e6 + 5.0e4 * t)).abs() < 1.0);
    }
}

#[test]
fn test_spline_trend_requires_fit_before_predict() {
    let model = SplineTrend::new(7, 7).unwrap();
    let features = FeatureMatrix::from_column(&[1.0, 2.0]);
    assert!(model.predict(&features).is_err());
}

#[test]
fn test_spline_trend_parameter_validation() {
    assert!(SplineTrend::new(1, 7).is_err());
    assert!(SplineTrend::new(7, 1).is_err());
}

#[test]
fn test_spline_trend_rejects_multi_column_features() {
    let mut model = SplineTrend::new(7, 7).unwrap();
    let features = FeatureMatrix::new(vec![vec![1.0, 2.0], vec![2.0, 3.0]]).unwrap();
    assert!(model.fit(&features, &[1.0, 2.0]).is_err());
}

#[test]
fn test_spline_trend_needs_enough_smoothed_history() {
    // Eight points leave only two smoothed observations for seven knots
    let (features, target) = linear_series(8, 0.0, 1.0);
    let mut model = SplineTrend::new(7, 7).unwrap();
    assert!(model.fit(&features, &target).is_err());
}

/// Step-function sample the booster should separate cleanly.
fn step_data() -> (FeatureMatrix, Vec<f64>) {
    let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 / 20.0, 1.0]).collect();
    let target: Vec<f64> = (0..20)
        .map(|i| if i < 10 { 10.0 } else { 20.0 })
        .collect();
    (FeatureMatrix::new(rows).unwrap(), target)
}

#[test]
fn test_gradient_boost_learns_step_function() {
    let (features, target) = step_data();
    let mut model = GradientBoost::new(40, 0.1).unwrap();
    model.fit(&features, &target).unwrap();

    let predicted = model.predict(&features).unwrap();
    for (p, y) in predicted.iter().zip(target.iter()) {
        assert!((p - y).abs() < 0.5, "prediction {} too far from {}", p, y);
    }
}

#[test]
fn test_gradient_boost_is_deterministic() {
    let (features, target) = step_data();

    let mut first = GradientBoost::new(25, 0.1)
        .unwrap()
        .with_subsample(0.8)
        .unwrap();
    let mut second = GradientBoost::new(25, 0.1)
        .unwrap()
        .with_subsample(0.8)
        .unwrap();

    first.fit(&features, &target).unwrap();
    second.fit(&features, &target).unwrap();

    // Same pinned seed, same data: bit-identical predictions
    assert_eq!(
        first.predict(&features).unwrap(),
        second.predict(&features).unwrap()
    );
}

#[test]
fn test_gradient_boost_seed_changes_subsampled_fit() {
    let (features, target) = step_data();

    let mut first = GradientBoost::new(25, 0.1)
        .unwrap()
        .with_subsample(0.5)
        .unwrap()
        .with_seed(1);
    let mut second = GradientBoost::new(25, 0.1)
        .unwrap()
        .with_subsample(0.5)
        .unwrap()
        .with_seed(2);

    first.fit(&features, &target).unwrap();
    second.fit(&features, &target).unwrap();

    assert_ne!(
        first.predict(&features).unwrap(),
        second.predict(&features).unwrap()
    );
}

#[test]
fn test_gradient_boost_requires_fit_before_predict() {
    let model = GradientBoost::new(10, 0.1).unwrap();
    let features = FeatureMatrix::from_column(&[1.0]);
    assert!(model.predict(&features).is_err());
}

#[test]
fn test_gradient_boost_parameter_validation() {
    assert!(GradientBoost::new(0, 0.1).is_err());
    assert!(GradientBoost::new(10, 0.0).is_err());
    assert!(GradientBoost::new(10, 1.5).is_err());
    assert!(GradientBoost::new(10, 0.1)
        .unwrap()
        .with_subsample(1.5)
        .is_err());
}

#[test]
fn test_model_json_round_trip() {
    let (features, target) = step_data();
    let mut booster = GradientBoost::new(15, 0.1).unwrap();
    booster.fit(&features, &target).unwrap();

    let file = NamedTempFile::new().unwrap();
    save_model(&booster, file.path()).unwrap();
    let loaded: GradientBoost = load_model(file.path()).unwrap();

    assert_eq!(
        booster.predict(&features).unwrap(),
        loaded.predict(&features).unwrap()
    );

    let (positions, trend_target) = linear_series(30, 100.0, 10.0);
    let mut trend = SplineTrend::new(7, 7).unwrap();
    trend.fit(&positions, &trend_target).unwrap();

    let file = NamedTempFile::new().unwrap();
    save_model(&trend, file.path()).unwrap();
    let loaded: SplineTrend = load_model(file.path()).unwrap();

    assert_eq!(
        trend.predict(&positions).unwrap(),
        loaded.predict(&positions).unwrap()
    );
}
