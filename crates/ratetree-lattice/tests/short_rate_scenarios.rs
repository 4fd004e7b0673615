//! Integration tests for curve-fitted short-rate lattices.

use approx::assert_relative_eq;
use ratetree_lattice::prelude::*;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn build(model: ShortRateModel, curve: &ZeroCurve, a: f64, s: f64) -> ShortRateTree {
    ShortRateTreeBuilder::new(model)
        .mean_reversion(a)
        .volatility(s)
        .step_size(0.125)
        .horizon(32.0)
        .curve(curve)
        .build()
        .unwrap()
}

fn market_curve() -> ZeroCurve {
    ZeroCurve::new(&[
        (0.125, 0.0410),
        (0.5, 0.0425),
        (1.0, 0.0440),
        (2.0, 0.0452),
        (5.0, 0.0470),
        (10.0, 0.0490),
        (30.0, 0.0510),
    ])
    .unwrap()
}

// =============================================================================
// FLAT CURVE SCENARIOS
// =============================================================================

#[test]
fn hull_white_flat_curve_root_discount() {
    let curve = ZeroCurve::flat(0.03).unwrap();
    let tree = build(ShortRateModel::HullWhite, &curve, 0.1, 0.01);

    assert_eq!(tree.num_steps(), 256);
    assert_eq!(tree.saturation_bound(), 15);
    assert_relative_eq!(
        tree.implied_discount_factor(0).unwrap(),
        (-0.03f64 * 0.125).exp(),
        epsilon = 1e-6
    );
    assert_relative_eq!(tree.root().rate, 0.03, epsilon = 1e-12);
}

#[test]
fn hull_white_reprices_every_step() {
    let curve = ZeroCurve::flat(0.03).unwrap();
    let tree = build(ShortRateModel::HullWhite, &curve, 0.1, 0.01);

    for m in 0..=tree.num_steps() {
        assert_relative_eq!(
            tree.implied_discount_factor(m).unwrap(),
            tree.discount_factor(m + 1).unwrap(),
            epsilon = 1e-8
        );
    }
    assert!(tree.drift_converged());
}

#[test]
fn black_karasinski_rates_positive() {
    let curve = ZeroCurve::flat(0.03).unwrap();
    let tree = build(ShortRateModel::BlackKarasinski, &curve, 0.1, 0.01);

    assert!(tree.lattice().nodes().iter().all(|node| node.rate > 0.0));
}

#[test]
fn black_karasinski_reprices_every_step() {
    let curve = ZeroCurve::flat(0.03).unwrap();
    for s in [0.01, 0.2] {
        let tree = build(ShortRateModel::BlackKarasinski, &curve, 0.1, s);
        assert!(tree.drift_converged());
        for m in 0..=tree.num_steps() {
            let error = tree.implied_discount_factor(m).unwrap() - tree.discount_factor(m + 1).unwrap();
            assert!(error.abs() < 1e-8, "s={s}, step {m}: error {error:e}");
        }
    }
}

#[test]
fn low_rates_go_negative_only_under_hull_white() {
    let curve = ZeroCurve::flat(0.001).unwrap();

    let hw = build(ShortRateModel::HullWhite, &curve, 0.1, 0.01);
    let (low, _) = hw.rate_range(hw.num_steps()).unwrap();
    assert!(low < 0.0);

    let bk = build(ShortRateModel::BlackKarasinski, &curve, 0.1, 0.2);
    let (low, high) = bk.rate_range(bk.num_steps()).unwrap();
    assert!(low > 0.0);
    assert!(high > low);
}

// =============================================================================
// MARKET CURVE
// =============================================================================

#[test]
fn sloped_curve_fit_for_both_models() {
    let curve = market_curve();
    for (model, s) in [
        (ShortRateModel::HullWhite, 0.012),
        (ShortRateModel::BlackKarasinski, 0.25),
    ] {
        let tree = build(model, &curve, 0.05, s);
        assert!(tree.drift_converged());
        for m in 0..=tree.num_steps() {
            let target = curve.discount_factor((m + 1) as f64 * 0.125).unwrap();
            assert_relative_eq!(tree.implied_discount_factor(m).unwrap(), target, epsilon = 1e-8);
        }
    }
}

#[test]
fn drift_fits_are_reported_per_level() {
    let curve = market_curve();
    let tree = build(ShortRateModel::BlackKarasinski, &curve, 0.05, 0.25);

    let fits = tree.drift_fits();
    assert_eq!(fits.len(), tree.num_steps() + 1);
    for (m, fit) in fits.iter().enumerate() {
        assert_eq!(fit.step, m);
        assert_eq!(fit.drift, tree.drift(m).unwrap());
        assert!(fit.converged);
        assert!(fit.residual.abs() < 1e-10);
    }
}

#[test]
fn strict_mode_accepts_converged_fits() {
    let curve = market_curve();
    let tree = ShortRateTreeBuilder::new(ShortRateModel::BlackKarasinski)
        .mean_reversion(0.05)
        .volatility(0.25)
        .step_size(0.25)
        .horizon(10.0)
        .curve(&curve)
        .strict_drift(true)
        .build();
    assert!(tree.is_ok());
}

// =============================================================================
// CURVE BOUNDARIES
// =============================================================================

#[test]
fn three_point_curve_builds() {
    let curve = ZeroCurve::new(&[(0.125, 0.02), (5.0, 0.03), (10.0, 0.035)]).unwrap();
    let tree = ShortRateTreeBuilder::new(ShortRateModel::HullWhite)
        .step_size(0.125)
        .horizon(10.0)
        .curve(&curve)
        .build()
        .unwrap();

    // Linear interpolation between the first two tenors
    let t: f64 = 2.5;
    let z = 0.02 + (0.03 - 0.02) * (t - 0.125) / (5.0 - 0.125);
    assert_relative_eq!(tree.discount_factor(20).unwrap(), (-z * t).exp(), epsilon = 1e-14);
}

#[test]
fn two_point_curve_fails() {
    let err = ZeroCurve::new(&[(1.0, 0.02), (5.0, 0.03)]).unwrap_err();
    assert!(matches!(err, LatticeError::InvalidParameter { .. }));
}

// =============================================================================
// TOPOLOGY
// =============================================================================

#[test]
fn recombination_and_links() {
    let curve = ZeroCurve::flat(0.03).unwrap();
    let tree = build(ShortRateModel::HullWhite, &curve, 0.1, 0.01);
    let lattice = tree.lattice();

    let mut total = 0;
    for t in 0..=tree.num_steps() {
        let j_max = tree.j_max(t).unwrap();
        assert_eq!(lattice.level(t).unwrap().len(), (2 * j_max + 1) as usize);
        total += lattice.level(t).unwrap().len();
    }
    assert_eq!(total, lattice.len());

    for node in lattice.nodes() {
        let Some(children) = node.children else {
            assert_eq!(node.time_step, tree.num_steps());
            continue;
        };
        let (up, mid, down) = node.branch.child_offsets(node.offset).unwrap();
        for (index, offset) in [(children.up, up), (children.mid, mid), (children.down, down)] {
            let child = lattice.get(index).unwrap();
            assert_eq!(child.time_step, node.time_step + 1);
            assert_eq!(child.offset, offset);
        }
        assert_relative_eq!(node.probabilities.total(), 1.0, epsilon = 1e-12);
        assert!(node.arrow_debreu > 0.0);
    }
}

#[test]
fn node_addressing_errors() {
    let curve = ZeroCurve::flat(0.03).unwrap();
    let tree = build(ShortRateModel::HullWhite, &curve, 0.1, 0.01);

    assert!(matches!(
        tree.node(2, 3),
        Err(LatticeError::IndexOutOfRange { .. })
    ));
    assert!(matches!(
        tree.node(257, 0),
        Err(LatticeError::TimeStepOutOfRange { .. })
    ));
    assert!(tree.node(256, -15).is_ok());
}
