use delivery_dispatch::data::{parse_json_input, parse_yaml_input};
use delivery_dispatch::dispatch::{
    distance, process, DelaySource, DispatchError, FixedDelay, Location, LocationTable, NoDelay,
    Package, PackageValidation, UniformDelay, DELAY_MAX, DELAY_MIN,
};

fn table(entries: &[(&str, f64, f64)]) -> LocationTable {
    entries
        .iter()
        .map(|&(key, x, y)| (key, Location::new(x, y)))
        .collect()
}

fn approx_eq(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "expected {b}, got {a}");
}

/// Counts how many delays were drawn.
struct CountingDelay {
    calls: usize,
}

impl DelaySource for CountingDelay {
    fn next_delay(&mut self) -> f64 {
        self.calls += 1;
        0.0
    }
}

#[test]
fn single_package_goes_to_closest_agent() {
    let warehouses = table(&[("W1", 0.0, 0.0)]);
    let agents = table(&[("A1", 0.0, 0.0), ("A2", 10.0, 10.0)]);
    let packages = vec![Package::new("W1", Location::new(1.0, 0.0))];

    let report = process(&warehouses, &agents, &packages, NoDelay).expect("valid input");

    let a1 = report.agent("A1").expect("A1 in report");
    assert_eq!(a1.packages_delivered, 1);
    assert_eq!(a1.total_distance, 1.0);
    assert_eq!(a1.efficiency, 1.0);

    let a2 = report.agent("A2").expect("A2 in report");
    assert_eq!(a2.packages_delivered, 0);
    assert_eq!(a2.total_distance, 0.0);
    assert_eq!(a2.efficiency, 0.0);

    assert_eq!(report.best_agent(), Some("A1"));
    assert_eq!(report.best_agent_row(), Some(("A1", 1.0)));
    assert_eq!(report.validation(), PackageValidation::Successful);
}

#[test]
fn equidistant_agents_resolve_to_first_in_table_order() {
    let warehouses = table(&[("W", 0.0, 0.0)]);
    let packages = vec![Package::new("W", Location::new(0.0, 3.0)); 4];

    // Key order is deliberately the reverse of alphabetical/numeric order.
    let agents = table(&[("Z9", 2.0, 0.0), ("A1", -2.0, 0.0), ("M5", 0.0, 2.0)]);
    for _ in 0..3 {
        let report = process(&warehouses, &agents, &packages, NoDelay).expect("valid input");
        assert_eq!(report.agent("Z9").map(|s| s.packages_delivered), Some(4));
        assert_eq!(report.agent("A1").map(|s| s.packages_delivered), Some(0));
        assert_eq!(report.agent("M5").map(|s| s.packages_delivered), Some(0));
        assert_eq!(report.best_agent(), Some("Z9"));
    }

    let reordered = table(&[("A1", -2.0, 0.0), ("Z9", 2.0, 0.0), ("M5", 0.0, 2.0)]);
    let report = process(&warehouses, &reordered, &packages, NoDelay).expect("valid input");
    assert_eq!(report.agent("A1").map(|s| s.packages_delivered), Some(4));
}

#[test]
fn empty_package_list_yields_zeroed_report_without_best_agent() {
    let warehouses = table(&[("W1", 0.0, 0.0)]);
    let agents = table(&[("A1", 0.0, 0.0), ("A2", 5.0, 5.0)]);

    let report = process(&warehouses, &agents, &[], NoDelay).expect("empty packages are valid");

    assert_eq!(report.agents().len(), 2);
    for summary in report.agents() {
        assert_eq!(summary.packages_delivered, 0);
        assert_eq!(summary.total_distance, 0.0);
        assert_eq!(summary.efficiency, 0.0);
    }
    assert_eq!(report.best_agent(), None);
    assert_eq!(report.total_delivered(), 0);
    assert!(report.validation().is_successful());
}

#[test]
fn unknown_warehouse_is_a_descriptive_error() {
    let warehouses = table(&[("W1", 0.0, 0.0)]);
    let agents = table(&[("A1", 0.0, 0.0)]);
    let packages = vec![
        Package::new("W1", Location::new(1.0, 0.0)),
        Package::new("W404", Location::new(2.0, 0.0)),
        Package::new("W1", Location::new(3.0, 0.0)),
    ];
    let mut delay = CountingDelay { calls: 0 };

    let err = process(&warehouses, &agents, &packages, &mut delay).expect_err("W404 is unknown");

    assert_eq!(
        err,
        DispatchError::UnknownWarehouse {
            package_index: 1,
            warehouse: "W404".to_string(),
        }
    );
    assert!(err.to_string().contains("W404"));
    assert!(err.to_string().contains("#1"));
    // Rejected before the pass starts: no delivery was costed.
    assert_eq!(delay.calls, 0);
}

#[test]
fn empty_agent_set_is_rejected() {
    let warehouses = table(&[("W1", 0.0, 0.0)]);
    let packages = vec![Package::new("W1", Location::new(1.0, 0.0))];

    let err = process(&warehouses, &LocationTable::new(), &packages, NoDelay)
        .expect_err("no agents to assign to");
    assert_eq!(err, DispatchError::NoAgents);

    let err = process(&warehouses, &LocationTable::new(), &[], NoDelay)
        .expect_err("no agents even without packages");
    assert_eq!(err, DispatchError::NoAgents);
}

#[test]
fn delivered_counts_sum_to_package_count() {
    let warehouses = table(&[("N", 0.0, 50.0), ("S", 0.0, -50.0), ("E", 50.0, 0.0)]);
    let agents = table(&[("a", 0.0, 40.0), ("b", 0.0, -45.0), ("c", 10.0, 0.0), ("d", 45.0, 1.0)]);
    let keys = ["N", "S", "E"];
    let packages: Vec<Package> = (0..97)
        .map(|i| {
            Package::new(
                keys[i % keys.len()],
                Location::new(i as f64 * 0.5, -(i as f64)),
            )
        })
        .collect();

    let mut delay = CountingDelay { calls: 0 };
    let report = process(&warehouses, &agents, &packages, &mut delay).expect("valid input");

    assert_eq!(report.total_delivered(), packages.len() as u64);
    assert_eq!(delay.calls, packages.len());
    assert!(report.validation().is_successful());
    assert_eq!(report.agent("a").map(|s| s.packages_delivered), Some(33));
    assert_eq!(report.agent("b").map(|s| s.packages_delivered), Some(32));
    assert_eq!(report.agent("d").map(|s| s.packages_delivered), Some(32));
    assert_eq!(report.agent("c").map(|s| s.packages_delivered), Some(0));
}

#[test]
fn delivery_distance_combines_both_legs_and_delay() {
    let warehouses = table(&[("W", 3.0, 4.0)]);
    let agents = table(&[("A", 0.0, 0.0)]);
    let packages = vec![Package::new("W", Location::new(3.0, 10.0))];

    let report = process(&warehouses, &agents, &packages, FixedDelay(1.25)).expect("valid input");
    // 5 (agent to warehouse) + 6 (warehouse to destination) + 1.25 delay
    assert_eq!(report.agent("A").map(|s| s.total_distance), Some(12.25));
}

#[test]
fn report_values_are_rounded_to_two_decimals() {
    let warehouses = table(&[("W", 0.0, 0.0)]);
    let agents = table(&[("A1", 10.0, 10.0), ("A2", 50.0, 50.0)]);
    let packages = vec![
        Package::new("W", Location::new(1.0, 1.0)),
        Package::new("W", Location::new(2.0, 0.0)),
        Package::new("W", Location::new(0.0, 0.0)),
    ];

    let report = process(&warehouses, &agents, &packages, NoDelay).expect("valid input");
    let a1 = report.agent("A1").expect("A1 in report");

    let leg = distance(Location::new(10.0, 10.0), Location::new(0.0, 0.0));
    let raw_total = 3.0 * leg + 2.0_f64.sqrt() + 2.0;
    approx_eq(a1.total_distance, raw_total, 0.005);
    approx_eq(a1.efficiency, raw_total / 3.0, 0.005);
    for value in [a1.total_distance, a1.efficiency] {
        assert_eq!(value, (value * 100.0).round() / 100.0);
    }
}

#[test]
fn best_agent_has_lowest_efficiency_among_active_agents() {
    let warehouses = table(&[("near", 0.0, 0.0), ("far", 100.0, 0.0)]);
    let agents = table(&[("idle", -500.0, -500.0), ("slow", 90.0, 0.0), ("fast", 1.0, 0.0)]);
    let packages = vec![
        Package::new("far", Location::new(100.0, 30.0)),
        Package::new("near", Location::new(0.0, 1.0)),
        Package::new("near", Location::new(0.0, 2.0)),
    ];

    let report = process(&warehouses, &agents, &packages, NoDelay).expect("valid input");
    assert_eq!(report.agent("slow").map(|s| s.efficiency), Some(40.0));
    assert_eq!(report.agent("fast").map(|s| s.efficiency), Some(2.5));
    assert_eq!(report.best_agent(), Some("fast"));
}

#[test]
fn seeded_uniform_delay_makes_runs_reproducible() {
    let input = parse_json_input(
        r#"{
            "warehouses": {"W1": [0, 0], "W2": [20, 5]},
            "agents": {"A1": [1, 1], "A2": [18, 6]},
            "packages": [
                {"warehouse": "W1", "destination": [4, 4]},
                {"warehouse": "W2", "destination": [25, 5]},
                {"warehouse": "W2", "destination": [20, 0]}
            ]
        }"#,
    )
    .expect("sample should parse");

    let first = input.dispatch(UniformDelay::from_seed(99)).expect("valid input");
    let second = input.dispatch(UniformDelay::from_seed(99)).expect("valid input");
    assert_eq!(first, second);

    let baseline = input.dispatch(NoDelay).expect("valid input");
    for (with_delay, without) in first.agents().iter().zip(baseline.agents()) {
        let added = with_delay.total_distance - without.total_distance;
        let n = with_delay.packages_delivered as f64;
        assert!(added >= DELAY_MIN * n - 0.011, "added {added} below minimum");
        assert!(added <= DELAY_MAX * n + 0.011, "added {added} above maximum");
    }
}

#[test]
fn exact_half_cent_totals_round_to_even() {
    let warehouses = table(&[("W1", 0.0, 0.0)]);
    let agents = table(&[("A1", 0.0, 0.0)]);
    let packages = vec![Package::new("W1", Location::new(2.125, 0.0))];

    let report = process(&warehouses, &agents, &packages, NoDelay).expect("valid input");
    let a1 = report.agent("A1").expect("A1 in report");
    assert_eq!(a1.total_distance, 2.12);
    assert_eq!(a1.efficiency, 2.12);
}

#[test]
fn nan_agent_location_from_yaml_is_rejected() {
    let input = parse_yaml_input(
        "warehouses:\n  W1: [0, 0]\nagents:\n  A1: [0, 1]\n  A2: [.nan, 0]\npackages:\n  - warehouse: W1\n    destination: [1, 0]\n",
    )
    .expect("yaml should parse");
    assert!(input.agents.get("A2").map_or(false, |location| location.x.is_nan()));

    let err = input.dispatch(NoDelay).expect_err("NaN agent must not be dispatched to");
    assert_eq!(
        err,
        DispatchError::NonFiniteLocation {
            entity: "agent",
            key: "A2".to_string(),
        }
    );
    assert!(err.to_string().contains("agent 'A2'"));
}

#[test]
fn agent_named_best_agent_is_rejected() {
    let input = parse_json_input(
        r#"{"warehouses": {"W1": [0, 0]}, "agents": {"A1": [0, 0], "best_agent": [1, 1]}, "packages": []}"#,
    )
    .expect("sample should parse");
    assert_eq!(
        input.validate(),
        Err(DispatchError::ReservedAgentKey("best_agent".to_string()))
    );
}
