//! Table-driven plot selections from `tests/testdata/scenarios.json`.

use serde::Deserialize;

use matcha_plot::{render, PlotError, PlotSpec};
use matcha_tests::compute_coarse;

#[derive(Deserialize)]
struct Scenarios {
    #[allow(dead_code)]
    description: String,
    z0: f64,
    samples: usize,
    cases: Vec<Case>,
}

#[derive(Deserialize)]
struct Case {
    name: String,
    plot: PlotSpec,
    #[serde(default)]
    error: Option<String>,
}

fn load() -> Scenarios {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/testdata/scenarios.json");
    let data = std::fs::read_to_string(path).expect("failed to read scenarios");
    serde_json::from_str(&data).expect("failed to parse scenarios")
}

fn variant(err: &PlotError) -> &'static str {
    match err {
        PlotError::KeyMismatch { .. } => "KeyMismatch",
        PlotError::ColorCountMismatch { .. } => "ColorCountMismatch",
        PlotError::UnknownColormap(_) => "UnknownColormap",
        PlotError::InvalidColor(_) => "InvalidColor",
        PlotError::Reference(_) => "Reference",
        PlotError::Export(_) => "Export",
    }
}

#[test]
fn every_case_behaves_as_recorded() {
    let scenarios = load();
    let results = compute_coarse("Behroozi", scenarios.z0, scenarios.samples).unwrap();

    for case in &scenarios.cases {
        match (render(&results, &case.plot), &case.error) {
            (Ok(figures), None) => {
                assert_eq!(figures.colors.len(), case.plot.keys.len(), "{}", case.name);
                for (key, _) in &figures.colors {
                    assert!(case.plot.keys.contains(key), "{}: {key}", case.name);
                }
                for figure in figures.figures() {
                    assert_eq!(figure.series.len(), case.plot.keys.len(), "{}", case.name);
                    for series in &figure.series {
                        assert_eq!(series.points.len(), scenarios.samples, "{}", case.name);
                    }
                }
            }
            (Err(err), Some(expected)) => {
                assert_eq!(variant(&err), expected, "{}", case.name);
            }
            (Ok(_), Some(expected)) => panic!("{}: expected {expected}", case.name),
            (Err(err), None) => panic!("{}: unexpected {err}", case.name),
        }
    }
}

#[test]
fn explicit_colors_are_kept_in_order() {
    let scenarios = load();
    let results = compute_coarse("Behroozi", scenarios.z0, scenarios.samples).unwrap();
    let case = &scenarios.cases[1];
    let figures = render(&results, &case.plot).unwrap();
    assert_eq!(figures.colors[0].1.to_hex(), "#1f77b4");
    assert_eq!(figures.colors[1].1.to_hex(), "#cc1a1a");
}
