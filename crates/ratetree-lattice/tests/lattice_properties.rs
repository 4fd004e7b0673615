//! Property-based tests for lattice invariants.
//!
//! - Branching probabilities sum to one for every fork type
//! - Level widths grow by at most one and saturate at the bound
//! - Every fitted level reprices the next discount factor, under both models

use proptest::prelude::*;
use ratetree_lattice::prelude::*;
use ratetree_lattice::{saturation_bound, Probabilities, RecombinantTree};

// =============================================================================
// PROBABILITIES
// =============================================================================

proptest! {
    #[test]
    fn probabilities_sum_to_one(a in 0.001f64..2.0, dt in 0.01f64..1.0, frac in 0.0f64..=1.0) {
        let bound = saturation_bound(a, dt).unwrap();
        let j = (frac * f64::from(2 * bound)).round() as i32 - bound;
        let branch = Branch::classify(j, bound);
        let p = Probabilities::trinomial(branch, a * f64::from(j) * dt);

        prop_assert!((p.total() - 1.0).abs() < 1e-12, "sum {} at j={}", p.total(), j);
    }

    #[test]
    fn probabilities_valid_within_bound(a in 0.001f64..0.5, dt in 0.01f64..1.0, frac in 0.0f64..=1.0) {
        let bound = saturation_bound(a, dt).unwrap();
        let j = (frac * f64::from(2 * bound)).round() as i32 - bound;
        let branch = Branch::classify(j, bound);
        let p = Probabilities::trinomial(branch, a * f64::from(j) * dt);

        prop_assert!(p.up >= 0.0 && p.mid >= 0.0 && p.down >= 0.0, "{:?} at j={}", p, j);
    }
}

// =============================================================================
// TOPOLOGY
// =============================================================================

proptest! {
    #[test]
    fn width_grows_by_at_most_one(bound in 1i32..20, levels in 1usize..60) {
        let mut tree = RecombinantTree::new();
        for _ in 0..levels {
            tree.add_level(bound).unwrap();
        }

        let mut total = 0;
        for t in 0..=levels {
            let j = tree.j_max(t).unwrap();
            prop_assert_eq!(j, (t as i32).min(bound));
            prop_assert_eq!(tree.level_len(t).unwrap(), (2 * j + 1) as usize);
            total += tree.level_len(t).unwrap();
            if t < levels {
                let growth = tree.j_max(t + 1).unwrap() - j;
                prop_assert!(growth == 0 || growth == 1);
            }
        }
        prop_assert_eq!(total, tree.len());
    }
}

// =============================================================================
// CURVE FIT
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn hull_white_reprices_curve(
        a in 0.02f64..0.5,
        s in 0.001f64..0.03,
        short in 0.0f64..0.05,
        slope in -0.002f64..0.004,
    ) {
        let points: Vec<(f64, f64)> = [0.25, 1.0, 2.0, 3.0, 5.0, 7.0]
            .iter()
            .map(|&t| (t, short + slope * t))
            .collect();
        let curve = ZeroCurve::new(&points).unwrap();

        let tree = ShortRateTreeBuilder::new(ShortRateModel::HullWhite)
            .mean_reversion(a)
            .volatility(s)
            .step_size(0.25)
            .horizon(6.0)
            .curve(&curve)
            .build()
            .unwrap();

        for m in 0..=tree.num_steps() {
            let implied = tree.implied_discount_factor(m).unwrap();
            let target = tree.discount_factor(m + 1).unwrap();
            prop_assert!((implied - target).abs() < 1e-8, "step {}: {} vs {}", m, implied, target);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn black_karasinski_reprices_curve(
        a in 0.02f64..0.3,
        s in 0.05f64..0.35,
        short in 0.005f64..0.05,
        slope in -0.001f64..0.004,
    ) {
        let points: Vec<(f64, f64)> = [0.125, 1.0, 2.0, 5.0, 10.0, 20.0]
            .iter()
            .map(|&t: &f64| (t, short + slope * t.min(10.0)))
            .collect();
        let curve = ZeroCurve::new(&points).unwrap();

        let tree = ShortRateTreeBuilder::new(ShortRateModel::BlackKarasinski)
            .mean_reversion(a)
            .volatility(s)
            .step_size(0.125)
            .horizon(20.0)
            .curve(&curve)
            .build()
            .unwrap();

        prop_assert!(tree.drift_converged());
        for m in 0..=tree.num_steps() {
            let implied = tree.implied_discount_factor(m).unwrap();
            let target = tree.discount_factor(m + 1).unwrap();
            prop_assert!((implied - target).abs() < 1e-8, "step {}: {} vs {}", m, implied, target);
        }
    }
}
