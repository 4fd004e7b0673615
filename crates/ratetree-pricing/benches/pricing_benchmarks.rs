//! Benchmarks for instrument pricing and calibration trials.
//!
//! Run with: cargo bench -p ratetree-pricing

use std::collections::BTreeMap;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use ratetree_pricing::prelude::*;
use ratetree_pricing::OasCurve;

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

fn cap_target() -> CalibrationTarget {
    CalibrationTarget::Caps {
        start: 0.25,
        period: 0.25,
        quotes: [1.0, 2.0, 3.0, 5.0, 7.0, 10.0]
            .iter()
            .map(|&tenor| CapQuote {
                tenor,
                strike: 0.045,
                premium: 0.004 * tenor,
            })
            .collect(),
    }
}

fn bench_cap(c: &mut Criterion) {
    let curve = market_curve();
    let mut tree = Calibrator::new(ShortRateModel::HullWhite, &curve)
        .horizon(10.0)
        .build_tree(0.1, 0.01)
        .unwrap();
    let cap = Cap::new(0.045, 0.25, 0.25, 10.0);

    c.bench_function("cap/10y_quarterly", |b| {
        b.iter(|| black_box(cap.price(&mut tree).unwrap()));
    });
}

fn bench_calibration_trial(c: &mut Criterion) {
    let curve = market_curve();
    let target = cap_target();
    let mut group = c.benchmark_group("calibration_trial");

    for (model, s) in [
        (ShortRateModel::HullWhite, 0.01),
        (ShortRateModel::BlackKarasinski, 0.2),
    ] {
        let calibrator = Calibrator::new(model, &curve).horizon(10.0);
        group.bench_function(model.name(), |b| {
            b.iter(|| black_box(calibrator.evaluate(&target, 0.1, s).unwrap()));
        });
    }

    group.finish();
}

fn bench_bond(c: &mut Criterion) {
    let curve = market_curve();
    let mut tree = Calibrator::new(ShortRateModel::HullWhite, &curve)
        .horizon(10.0)
        .build_tree(0.1, 0.01)
        .unwrap();
    let coupons: BTreeMap<usize, Payment> = (1..=20)
        .map(|k| (4 * k, Payment::fixed(0.055, 0.5)))
        .collect();
    let calls: BTreeMap<usize, f64> = [(24, 1.02), (32, 1.01), (40, 1.0)].into_iter().collect();
    let bond = CallableBond::new(80, coupons, calls).unwrap();

    c.bench_function("bond/callable_value", |b| {
        b.iter(|| black_box(bond.value(&mut tree, 0.0, 0.01).unwrap()));
    });

    c.bench_function("bond/oas_curve", |b| {
        b.iter(|| black_box(OasCurve::build(&bond, &mut tree).unwrap()));
    });
}

criterion_group!(benches, bench_cap, bench_calibration_trial, bench_bond);
criterion_main!(benches);
