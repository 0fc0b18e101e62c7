//! Workflow configuration from YAML

use crate::core::condition::Condition;
use crate::core::error::PlanError;
use crate::core::job::{JobTemplate, MatrixAxis, StepSpec};
use crate::core::workflow::Workflow;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashSet;
use std::path::Path;

/// Top-level workflow document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Workflow name
    pub name: String,

    /// Cancel not-yet-started instances after the first failure
    #[serde(default)]
    pub fail_fast: bool,

    /// Worker pool width; defaults to the number of job instances
    #[serde(default)]
    pub workers: Option<usize>,

    /// Job templates in declaration order
    pub jobs: Vec<JobConfig>,
}

/// Job template as declared in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Unique job name
    pub name: String,

    /// Upstream job names
    #[serde(default)]
    pub needs: Vec<String>,

    /// Gating expression; absent means "all upstreams succeeded"
    #[serde(default)]
    pub condition: Option<String>,

    /// Job-level sugar: sets continue_on_error on every step
    #[serde(default)]
    pub continue_on_error: bool,

    /// Matrix axes: axis name -> sequence of values
    #[serde(default)]
    pub matrix: Option<serde_yaml::Mapping>,

    /// Ordered steps
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// Step as declared in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,

    /// Opaque action reference handed to the step runner
    pub action: String,

    /// Per-step gating expression
    #[serde(default)]
    pub condition: Option<String>,

    /// A failure of this step does not fail the job
    #[serde(default)]
    pub continue_on_error: bool,

    /// Deadline in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl WorkflowConfig {
    /// Load a workflow document from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a workflow document from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: WorkflowConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Lower the document into a validated plan.
    ///
    /// All taxonomy errors (duplicate names, unknown needs, cycles,
    /// malformed conditions or matrices) surface here, before any job
    /// executes.
    pub fn to_workflow(&self) -> Result<Workflow, PlanError> {
        let mut seen = HashSet::new();
        for job in &self.jobs {
            if !seen.insert(job.name.as_str()) {
                return Err(PlanError::DuplicateJob(job.name.clone()));
            }
        }

        let mut templates = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            templates.push(job.to_template()?);
        }

        Workflow::assemble(&self.name, self.fail_fast, self.workers, templates)
    }
}

impl JobConfig {
    fn to_template(&self) -> Result<JobTemplate, PlanError> {
        let condition = match &self.condition {
            Some(expr) => {
                let cond = Condition::parse(expr)?;
                self.check_named_upstreams(expr, &cond)?;
                Some(cond)
            }
            None => None,
        };

        let matrix = match &self.matrix {
            Some(mapping) => self.parse_matrix(mapping)?,
            None => Vec::new(),
        };

        let mut steps = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let step_condition = match &step.condition {
                Some(expr) => {
                    let cond = Condition::parse(expr)?;
                    self.check_named_upstreams(expr, &cond)?;
                    Some(cond)
                }
                None => None,
            };
            steps.push(StepSpec {
                name: step.name.clone(),
                action: step.action.clone(),
                condition: step_condition,
                // job-level continue_on_error is sugar for all steps
                continue_on_error: step.continue_on_error || self.continue_on_error,
                timeout_secs: step.timeout_secs,
            });
        }

        Ok(JobTemplate {
            name: self.name.clone(),
            needs: self.needs.clone(),
            condition,
            matrix,
            steps,
        })
    }

    /// Named upstream predicates may only reference declared needs;
    /// anything else would read a status the job never waits for.
    fn check_named_upstreams(&self, expr: &str, cond: &Condition) -> Result<(), PlanError> {
        for name in cond.named_upstreams() {
            if !self.needs.iter().any(|n| n == name) {
                return Err(PlanError::InvalidCondition {
                    expr: expr.to_string(),
                    reason: format!(
                        "references job '{}' which is not in needs of '{}'",
                        name, self.name
                    ),
                });
            }
        }
        Ok(())
    }

    fn parse_matrix(&self, mapping: &serde_yaml::Mapping) -> Result<Vec<MatrixAxis>, PlanError> {
        let invalid = |reason: String| PlanError::InvalidMatrix {
            job: self.name.clone(),
            reason,
        };

        let mut axes = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let name = key
                .as_str()
                .ok_or_else(|| invalid("axis names must be strings".to_string()))?
                .to_string();

            let values = match value {
                Value::Sequence(seq) => {
                    let mut out = Vec::with_capacity(seq.len());
                    for item in seq {
                        out.push(scalar_to_string(item).ok_or_else(|| {
                            invalid(format!("axis '{}' values must be scalars", name))
                        })?);
                    }
                    out
                }
                other => {
                    return Err(invalid(format!(
                        "axis '{}' must be a sequence, found {}",
                        name,
                        yaml_kind(other)
                    )))
                }
            };

            axes.push(MatrixAxis { name, values });
        }
        Ok(axes)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn yaml_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
