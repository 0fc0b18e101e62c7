//! Workflow plan - templates, dependency graph, and expanded instances

use crate::core::error::PlanError;
use crate::core::graph::DependencyGraph;
use crate::core::job::{JobInstance, JobTemplate};
use crate::core::matrix;

/// A validated, immutable execution plan.
///
/// Built once from a workflow document; the scheduler consumes it
/// together with the run context.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub name: String,

    /// Cancel not-yet-started instances after the first failure
    pub fail_fast: bool,

    /// Declared worker pool width, if any
    pub workers: Option<usize>,

    /// Templates in declaration order
    pub templates: Vec<JobTemplate>,

    pub graph: DependencyGraph,

    /// Instances in expansion order: jobs by declaration order, matrix
    /// coordinates axis-major. Templates whose matrix expanded to nothing
    /// contribute a single already-skipped placeholder.
    pub instances: Vec<JobInstance>,
}

impl Workflow {
    pub(crate) fn assemble(
        name: &str,
        fail_fast: bool,
        workers: Option<usize>,
        templates: Vec<JobTemplate>,
    ) -> Result<Self, PlanError> {
        let graph = DependencyGraph::build(&templates)?;

        let mut instances = Vec::new();
        for template in &templates {
            let expanded = matrix::expand(template);
            if expanded.is_empty() {
                instances.push(JobInstance::skipped_empty_matrix(&template.name));
            } else {
                instances.extend(expanded);
            }
        }

        Ok(Self {
            name: name.to_string(),
            fail_fast,
            workers,
            templates,
            graph,
            instances,
        })
    }

    pub fn template(&self, name: &str) -> Option<&JobTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Pool width: declared value, or wide enough for every instance
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| self.instances.len().max(1))
    }
}
