// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exploration requests: an ordered pipeline of operations applied by the
//! backend to one dataset version, optionally followed by profiling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DatalensError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    In,
    IsNull,
    NotNull,
}

impl FilterOperator {
    /// Null checks take no operand.
    pub fn takes_value(self) -> bool {
        !matches!(self, FilterOperator::IsNull | FilterOperator::NotNull)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    #[serde(default)]
    pub descending: bool,
}

/// One step of an exploration pipeline, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExploreOperation {
    Filter {
        conditions: Vec<FilterCondition>,
        #[serde(default)]
        logic: FilterLogic,
    },
    Sample {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        n: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frac: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },
    Derive {
        column: String,
        expression: String,
    },
    Rename {
        mapping: BTreeMap<String, String>,
    },
    Sort {
        by: Vec<SortKey>,
    },
}

impl ExploreOperation {
    pub fn validate(&self) -> Result<(), DatalensError> {
        match self {
            ExploreOperation::Filter { conditions, .. } => {
                if conditions.is_empty() {
                    return Err(DatalensError::invalid("filter needs at least one condition"));
                }
                for cond in conditions {
                    if cond.column.trim().is_empty() {
                        return Err(DatalensError::invalid("filter column must not be empty"));
                    }
                    if cond.operator.takes_value() && cond.value.is_none() {
                        return Err(DatalensError::invalid(format!(
                            "filter on `{}` needs a value",
                            cond.column
                        )));
                    }
                }
                Ok(())
            }
            ExploreOperation::Sample { n, frac, .. } => match (n, frac) {
                (Some(_), Some(_)) => Err(DatalensError::invalid(
                    "sample takes either `n` or `frac`, not both",
                )),
                (None, None) => Err(DatalensError::invalid("sample needs `n` or `frac`")),
                (Some(0), None) => Err(DatalensError::invalid("sample `n` must be positive")),
                (None, Some(f)) if !(*f > 0.0 && *f <= 1.0) => Err(DatalensError::invalid(
                    format!("sample `frac` must be in (0, 1], got {f}"),
                )),
                _ => Ok(()),
            },
            ExploreOperation::Derive { column, expression } => {
                if column.trim().is_empty() || expression.trim().is_empty() {
                    Err(DatalensError::invalid("derive needs a column name and an expression"))
                } else {
                    Ok(())
                }
            }
            ExploreOperation::Rename { mapping } => {
                if mapping.is_empty() {
                    Err(DatalensError::invalid("rename mapping is empty"))
                } else {
                    Ok(())
                }
            }
            ExploreOperation::Sort { by } => {
                if by.is_empty() {
                    Err(DatalensError::invalid("sort needs at least one column"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Body for `POST /explore/{dataset_id}/{version_id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExploreRequest {
    pub operations: Vec<ExploreOperation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(default)]
    pub run_profiling: bool,
}

impl ExploreRequest {
    pub fn validate(&self) -> Result<(), DatalensError> {
        self.operations.iter().try_for_each(ExploreOperation::validate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreResponse {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub total_rows: Option<u64>,
    /// Profiling report, present when `run_profiling` was requested.
    #[serde(default)]
    pub profile: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
