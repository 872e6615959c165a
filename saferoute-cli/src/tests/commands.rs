//! End-to-end coverage of the subcommands over a temporary dataset directory.

use super::*;
use super::helpers::{OGDEN_CSV, Workspace};
use crate::datasets::{DescribeConfig, describe_dataset, list_datasets};
use crate::score::{ScoreConfig, execute_score};
use crate::settings::DatasetSettings;
use rstest::{fixture, rstest};
use saferoute_core::{DatasetOrigin, SamplePolicy, StoreError};
use saferoute_scorer::{Category, ScoringError, ScoringPreset};
use serde_json::Value;

#[fixture]
fn workspace() -> Workspace {
    let workspace = Workspace::new();
    workspace.write_dataset("ogden", OGDEN_CSV);
    workspace
}

fn settings(workspace: &Workspace, sample_policy: SamplePolicy) -> DatasetSettings {
    DatasetSettings {
        data_dir: workspace.data_dir(),
        fallback: None,
        sample_policy,
    }
}

fn score_config(workspace: &Workspace, dataset: &str, preset: ScoringPreset) -> ScoreConfig {
    ScoreConfig {
        request_path: workspace.route_request(dataset),
        datasets: settings(workspace, SamplePolicy::Disabled),
        preset,
    }
}

#[rstest]
#[case(ScoringPreset::SqrtWeighted)]
#[case(ScoringPreset::LinearWeighted)]
fn score_counts_only_nearby_incidents(workspace: Workspace, #[case] preset: ScoringPreset) {
    let result = execute_score(&score_config(&workspace, "ogden", preset)).expect("score");
    assert_eq!(result.affecting_incident_count, 1);
    assert_eq!(result.category, Category::Safe);
    assert!(result.is_safe);
    assert!(result.safety_score < 100.0);
}

#[rstest]
fn score_output_uses_camel_case_fields(workspace: Workspace) {
    let result = execute_score(&score_config(&workspace, "ogden", ScoringPreset::SqrtWeighted))
        .expect("score");
    let mut buffer = Vec::new();
    write_json(&mut buffer, &result).expect("write output");

    let value: Value = serde_json::from_slice(&buffer).expect("output is JSON");
    assert_eq!(value["affectingIncidentCount"], 1);
    assert_eq!(value["category"], "safe");
    assert_eq!(value["isSafe"], true);
    for field in ["safetyScore", "routeLength", "totalImpact", "normalizedImpact"] {
        assert!(value[field].is_number(), "{field} should be numeric");
    }
    assert!(buffer.ends_with(b"\n"));
}

#[rstest]
fn score_rejects_single_point_route(workspace: Workspace) {
    let request_path = workspace.write_request(
        "short.json",
        r#"{"route": [{"lat": 41.22, "lng": -111.98}], "dataset": "ogden"}"#,
    );
    let config = ScoreConfig {
        request_path,
        datasets: settings(&workspace, SamplePolicy::Disabled),
        preset: ScoringPreset::SqrtWeighted,
    };

    let err = execute_score(&config).expect_err("one point is not a route");
    match err {
        CliError::Scoring(ScoringError::Validation(_)) => {}
        other => panic!("expected a validation error, found {other:?}"),
    }
}

#[rstest]
fn score_reports_unknown_dataset_when_sample_disabled(workspace: Workspace) {
    let config = score_config(&workspace, "atlantis", ScoringPreset::SqrtWeighted);

    let err = execute_score(&config).expect_err("dataset should be missing");
    match err {
        CliError::Scoring(ScoringError::Store(StoreError::NotFound { key })) => {
            assert_eq!(key, "atlantis");
        }
        other => panic!("expected NotFound, found {other:?}"),
    }
}

#[rstest]
fn score_uses_builtin_sample_for_unknown_dataset(workspace: Workspace) {
    let config = ScoreConfig {
        datasets: settings(&workspace, SamplePolicy::BuiltInSample),
        ..score_config(&workspace, "atlantis", ScoringPreset::SqrtWeighted)
    };

    // The sample lies in Los Angeles, far from the Ogden route.
    let result = execute_score(&config).expect("score");
    assert_eq!(result.affecting_incident_count, 0);
    assert_eq!(result.category, Category::Safe);
}

#[rstest]
fn missing_data_dir_fails_to_open(workspace: Workspace) {
    let settings = DatasetSettings {
        data_dir: workspace.root().join("nowhere"),
        fallback: None,
        sample_policy: SamplePolicy::Disabled,
    };

    let err = list_datasets(&settings).expect_err("directory is missing");
    assert!(matches!(err, CliError::OpenDatasets(_)), "{err:?}");
}

#[rstest]
fn datasets_lists_csv_stems(workspace: Workspace) {
    workspace.write_dataset("boise", OGDEN_CSV);
    let keys = list_datasets(&settings(&workspace, SamplePolicy::Disabled)).expect("list");
    assert_eq!(keys, vec!["boise".to_owned(), "ogden".to_owned()]);
}

#[rstest]
fn describe_reports_summary(workspace: Workspace) {
    let config = DescribeConfig {
        key: "ogden".to_owned(),
        datasets: settings(&workspace, SamplePolicy::Disabled),
    };

    let summary = describe_dataset(&config).expect("describe");
    assert_eq!(summary.count, 2);
    assert_eq!(summary.origin, DatasetOrigin::Source);
    assert_eq!(summary.skipped_records, 0);
}

#[rstest]
fn datasets_command_runs_through_clap(workspace: Workspace) {
    let data_dir = workspace.data_dir();
    let cli = Cli::try_parse_from(["saferoute", "datasets", "--data-dir", data_dir.as_str()])
        .expect("arguments should parse");
    let mut buffer = Vec::new();
    run_command(cli.command, &mut buffer).expect("command should succeed");

    let keys: Vec<String> = serde_json::from_slice(&buffer).expect("output is JSON");
    assert_eq!(keys, vec!["ogden".to_owned()]);
}
