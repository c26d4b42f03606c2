// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sampling configuration types.
//!
//! Each sampling method carries its own parameter struct; on the wire the
//! method is written as `{"method": "<name>", "parameters": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DatalensError;
use crate::explore::FilterCondition;
use crate::types::RoundResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RandomParams {
    pub sample_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StratifiedParams {
    pub strata_columns: Vec<String>,
    /// Total rows to draw, allocated proportionally across strata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,
    /// Fraction of each stratum to draw; used when `sample_size` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_per_stratum: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystematicParams {
    pub interval: u64,
    #[serde(default)]
    pub start: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterParams {
    pub cluster_column: String,
    pub num_clusters: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_within_clusters: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedParams {
    pub weight_column: String,
    pub sample_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// A sampling method with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "parameters", rename_all = "snake_case")]
pub enum SamplingMethod {
    Random(RandomParams),
    Stratified(StratifiedParams),
    Systematic(SystematicParams),
    Cluster(ClusterParams),
    Weighted(WeightedParams),
}

impl SamplingMethod {
    /// Wire name of the method.
    pub fn name(&self) -> &'static str {
        match self {
            SamplingMethod::Random(_) => "random",
            SamplingMethod::Stratified(_) => "stratified",
            SamplingMethod::Systematic(_) => "systematic",
            SamplingMethod::Cluster(_) => "cluster",
            SamplingMethod::Weighted(_) => "weighted",
        }
    }

    /// Checks parameters before they reach the backend.
    pub fn validate(&self) -> Result<(), DatalensError> {
        match self {
            SamplingMethod::Random(p) => positive("random.sample_size", p.sample_size),
            SamplingMethod::Stratified(p) => {
                if p.strata_columns.iter().all(|c| c.trim().is_empty()) {
                    return Err(DatalensError::invalid(
                        "stratified sampling needs at least one strata column",
                    ));
                }
                match (p.sample_size, p.sample_fraction) {
                    (Some(size), _) => positive("stratified.sample_size", size),
                    (None, Some(frac)) if frac > 0.0 && frac <= 1.0 => Ok(()),
                    (None, Some(frac)) => Err(DatalensError::invalid(format!(
                        "stratified.sample_fraction must be in (0, 1], got {frac}"
                    ))),
                    (None, None) => Err(DatalensError::invalid(
                        "stratified sampling needs sample_size or sample_fraction",
                    )),
                }
            }
            SamplingMethod::Systematic(p) => positive("systematic.interval", p.interval),
            SamplingMethod::Cluster(p) => {
                non_empty("cluster.cluster_column", &p.cluster_column)?;
                positive("cluster.num_clusters", p.num_clusters)
            }
            SamplingMethod::Weighted(p) => {
                non_empty("weighted.weight_column", &p.weight_column)?;
                positive("weighted.sample_size", p.sample_size)
            }
        }
    }
}

fn positive(field: &str, value: u64) -> Result<(), DatalensError> {
    if value == 0 {
        Err(DatalensError::invalid(format!("{field} must be positive")))
    } else {
        Ok(())
    }
}

fn non_empty(field: &str, value: &str) -> Result<(), DatalensError> {
    if value.trim().is_empty() {
        Err(DatalensError::invalid(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

/// Row filter and column selection applied before sampling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSelection {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

/// Body for `POST /sampling/{dataset_id}/{version_id}/execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingRequest {
    #[serde(flatten)]
    pub method: SamplingMethod,
    #[serde(flatten)]
    pub selection: DataSelection,
}

/// One round of a multi-round run. Each round samples from what the previous
/// rounds left behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingRound {
    pub round_number: u32,
    #[serde(flatten)]
    pub method: SamplingMethod,
    pub output_name: String,
    #[serde(flatten)]
    pub selection: DataSelection,
}

/// Body for the multi-round execute and run endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiRoundSamplingRequest {
    pub rounds: Vec<SamplingRound>,
    #[serde(default)]
    pub export_residual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_output_name: Option<String>,
}

impl MultiRoundSamplingRequest {
    /// Rounds must be numbered 1..=n in order, with unique output names and
    /// valid method parameters.
    pub fn validate(&self) -> Result<(), DatalensError> {
        if self.rounds.is_empty() {
            return Err(DatalensError::invalid("at least one sampling round is required"));
        }
        let mut names = std::collections::HashSet::new();
        for (i, round) in self.rounds.iter().enumerate() {
            let expected = i as u32 + 1;
            if round.round_number != expected {
                return Err(DatalensError::invalid(format!(
                    "round {} is numbered {}, expected {expected}",
                    i + 1,
                    round.round_number
                )));
            }
            non_empty(&format!("rounds[{i}].output_name"), &round.output_name)?;
            if !names.insert(round.output_name.as_str()) {
                return Err(DatalensError::invalid(format!(
                    "duplicate output name `{}`",
                    round.output_name
                )));
            }
            round.method.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(default, alias = "type")]
    pub dtype: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique_count: Option<u64>,
    #[serde(default)]
    pub null_count: Option<u64>,
}

/// Response of `GET /sampling/{dataset_id}/{version_id}/columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnsResponse {
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub total_rows: Option<u64>,
}

/// Rows produced by a single sampling call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingResult {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub sample_size: Option<u64>,
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of the synchronous multi-round endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiRoundResult {
    #[serde(default, alias = "round_results")]
    pub rounds: Vec<RoundResult>,
    #[serde(default)]
    pub residual_size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// All rounds of a finished job merged into one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedSample {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round(n: u32, name: &str, size: u64) -> SamplingRound {
        SamplingRound {
            round_number: n,
            method: SamplingMethod::Random(RandomParams {
                sample_size: size,
                seed: Some(7),
            }),
            output_name: name.into(),
            selection: DataSelection::default(),
        }
    }

    #[test]
    fn method_is_adjacently_tagged() {
        let method = SamplingMethod::Systematic(SystematicParams { interval: 10, start: 2 });
        assert_eq!(
            serde_json::to_value(&method).unwrap(),
            json!({"method": "systematic", "parameters": {"interval": 10, "start": 2}})
        );
        let back: SamplingMethod = serde_json::from_value(json!({
            "method": "weighted",
            "parameters": {"weight_column": "w", "sample_size": 5}
        }))
        .unwrap();
        assert_eq!(back.name(), "weighted");
    }

    #[test]
    fn request_flattens_method_and_selection() {
        let request = SamplingRequest {
            method: SamplingMethod::Random(RandomParams { sample_size: 100, seed: None }),
            selection: DataSelection {
                columns: Some(vec!["a".into(), "b".into()]),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "method": "random",
                "parameters": {"sample_size": 100},
                "columns": ["a", "b"]
            })
        );
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let m = SamplingMethod::Random(RandomParams { sample_size: 0, seed: None });
        assert!(m.validate().is_err());
        let m = SamplingMethod::Systematic(SystematicParams { interval: 0, start: 0 });
        assert!(m.validate().is_err());
        let m = SamplingMethod::Cluster(ClusterParams {
            cluster_column: " ".into(),
            num_clusters: 3,
            ..Default::default()
        });
        assert!(m.validate().is_err());
    }

    #[test]
    fn stratified_needs_size_or_fraction() {
        let mut params = StratifiedParams {
            strata_columns: vec!["region".into()],
            ..Default::default()
        };
        assert!(SamplingMethod::Stratified(params.clone()).validate().is_err());
        params.sample_fraction = Some(0.2);
        assert!(SamplingMethod::Stratified(params.clone()).validate().is_ok());
        params.sample_fraction = Some(2.0);
        assert!(SamplingMethod::Stratified(params).validate().is_err());
    }

    #[test]
    fn multi_round_numbering_and_names() {
        let ok = MultiRoundSamplingRequest {
            rounds: vec![round(1, "train", 100), round(2, "test", 20)],
            export_residual: true,
            residual_output_name: Some("rest".into()),
        };
        assert!(ok.validate().is_ok());

        let gap = MultiRoundSamplingRequest {
            rounds: vec![round(1, "a", 1), round(3, "b", 1)],
            export_residual: false,
            residual_output_name: None,
        };
        assert!(gap.validate().unwrap_err().to_string().contains("expected 2"));

        let dup = MultiRoundSamplingRequest {
            rounds: vec![round(1, "a", 1), round(2, "a", 1)],
            export_residual: false,
            residual_output_name: None,
        };
        assert!(dup.validate().unwrap_err().to_string().contains("duplicate"));

        let empty = MultiRoundSamplingRequest {
            rounds: vec![],
            export_residual: false,
            residual_output_name: None,
        };
        assert!(empty.validate().is_err());
    }
}
