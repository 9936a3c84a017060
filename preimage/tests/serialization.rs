use preimage::{integer, rational, RealSet, Symbol, Transform};
use serde_json::json;

#[test]
fn real_set_serializes_bounds_with_exact_values() {
    let set = RealSet::left_open(rational(1, 2), 4)
        .unwrap()
        .union(&RealSet::greater_than(10));
    let value = serde_json::to_value(&set).unwrap();
    assert_eq!(
        value,
        json!({
            "intervals": [
                {
                    "min": {"type": "exclusive", "value": "1/2", "exact": true, "approx": 0.5},
                    "max": {"type": "inclusive", "value": "4", "exact": true, "approx": 4.0}
                },
                {
                    "min": {"type": "exclusive", "value": "10", "exact": true, "approx": 10.0},
                    "max": {"type": "unbounded"}
                }
            ]
        })
    );
}

#[test]
fn irrational_endpoints_carry_an_approximation() {
    let square = Transform::pow(Transform::identity(Symbol::new("x")), integer(2)).unwrap();
    let set = square.solve(&RealSet::at_most(2)).unwrap();
    let value = serde_json::to_value(&set).unwrap();
    let max = &value["intervals"][0]["max"];
    assert_eq!(max["type"], "inclusive");
    assert_eq!(max["exact"], false);
    let approx = max["approx"].as_f64().unwrap();
    assert!((approx - std::f64::consts::SQRT_2).abs() < 1e-12);
    assert_eq!(max["value"], "≈1.414214");
}

#[test]
fn empty_set_serializes_to_no_intervals() {
    let value = serde_json::to_value(RealSet::empty()).unwrap();
    assert_eq!(value, json!({"intervals": []}));
}
