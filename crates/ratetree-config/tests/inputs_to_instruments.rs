//! End-to-end conversion of input files into lattices and bonds.

use std::io::Write;

use ratetree_config::prelude::*;
use ratetree_lattice::ShortRateTreeBuilder;
use tempfile::Builder;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

const MARKET_TOML: &str = r#"
evaluation_date = "2014-05-15"

[[currencies]]
id = "USD"

[currencies.yield_curve]
tenors = [0.125, 1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 20.0, 30.0]
zero_rates = [0.0020, 0.002545, 0.0050721, 0.0093085, 0.0167937, 0.0220818, 0.0271769, 0.0337747, 0.0349814]

[currencies.cap]
forward_start = 0.25
payment_period = "Q"
tenors = [3.0, 4.0, 5.0, 7.0, 10.0]
strikes = [0.03, 0.03, 0.03, 0.03, 0.03]
premiums = [0.00244, 0.00859, 0.0165, 0.0383, 0.07671]
"#;

const BONDS_JSON: &str = r#"{
    "bonds": [{
        "id": "US67054LAA52",
        "name": "NUMFP 4 7/8 05/15/19",
        "currency": "USD",
        "issue_date": "2014-05-08",
        "maturity": "2019-05-15",
        "coupons": [{"rate": 0.04875, "start": "2014-05-08", "end": "2019-05-15", "period": "S"}],
        "call_schedule": {
            "dates": ["2016-05-15", "2017-05-15", "2018-05-15"],
            "prices": [1.03656, 1.01828, 1.0]
        }
    }]
}"#;

fn write_temp(suffix: &str, text: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

// =============================================================================
// CONVERSION
// =============================================================================

#[test]
fn market_file_builds_a_tree_and_prices_the_bond() {
    let market_file = write_temp(".toml", MARKET_TOML);
    let bonds_file = write_temp(".json", BONDS_JSON);

    let market = MarketData::from_file(market_file.path()).unwrap();
    let portfolio = BondPortfolio::from_file(bonds_file.path()).unwrap();
    let bond_data = portfolio.bond("US67054LAA52").unwrap();
    let usd = market.currency(&bond_data.currency).unwrap();

    let settings = TreeSettings::default().with_horizon(10.0);
    let curve = usd.curve().unwrap();
    let mut tree = ShortRateTreeBuilder::new(settings.model)
        .mean_reversion(0.1)
        .volatility(0.01)
        .step_size(settings.step_size)
        .horizon(settings.horizon)
        .curve(&curve)
        .build()
        .unwrap();

    let bond = bond_data
        .builder(market.evaluation_date)
        .unwrap()
        .build(&tree)
        .unwrap();
    assert_eq!(bond.payments().len(), 10);
    assert_eq!(bond.calls().len(), 3);

    let value = bond.value(&mut tree, 0.0, 0.0).unwrap();
    assert!(value > 1.05 && value < 1.16, "value = {value}");
}

#[test]
fn cap_target_matches_file() {
    let market = MarketData::from_toml_str(MARKET_TOML).unwrap();
    let target = market
        .currency("USD")
        .unwrap()
        .target(TargetKind::Cap)
        .unwrap();
    assert_eq!(target.len(), 5);
}

#[test]
fn invalid_file_reports_every_problem() {
    let broken = MARKET_TOML
        .replace("strikes = [0.03, 0.03, 0.03, 0.03, 0.03]", "strikes = [0.03]")
        .replace("premiums = [0.00244, 0.00859, 0.0165, 0.0383, 0.07671]", "premiums = []");
    let file = write_temp(".toml", &broken);

    let err = MarketData::from_file(file.path()).unwrap_err();
    match err {
        ConfigError::MultipleValidationErrors(errors) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
}
