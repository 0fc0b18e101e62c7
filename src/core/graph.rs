//! Dependency graph - validates the needs relation and orders dispatch

use crate::core::error::PlanError;
use crate::core::job::JobTemplate;
use std::collections::{HashMap, HashSet};

/// The needs-DAG over job templates.
///
/// Nodes are template names; edges point from dependent to dependency.
/// Built once at plan time and immutable thereafter.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// name -> declared upstream names
    needs: HashMap<String, Vec<String>>,
    /// Stable topological order, dependencies first, ties broken by
    /// declaration order. Used as the scheduler's dispatch priority.
    order: Vec<String>,
}

impl DependencyGraph {
    /// Validate the needs relation and compute the topological order.
    pub fn build(templates: &[JobTemplate]) -> Result<Self, PlanError> {
        let declared: HashSet<&str> = templates.iter().map(|t| t.name.as_str()).collect();

        for template in templates {
            for need in &template.needs {
                if !declared.contains(need.as_str()) {
                    return Err(PlanError::UnknownDependency {
                        job: template.name.clone(),
                        needs: need.clone(),
                    });
                }
            }
        }

        let needs: HashMap<String, Vec<String>> = templates
            .iter()
            .map(|t| (t.name.clone(), t.needs.clone()))
            .collect();

        // Cycle check, walking jobs in declaration order so the reported
        // members are in detection order.
        let mut visited = HashSet::new();
        for template in templates {
            if !visited.contains(&template.name) {
                let mut path = Vec::new();
                Self::visit(&template.name, &needs, &mut visited, &mut path)?;
            }
        }

        let order = Self::topological_order(templates);

        Ok(Self { needs, order })
    }

    fn visit(
        name: &str,
        needs: &HashMap<String, Vec<String>>,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> Result<(), PlanError> {
        if let Some(start) = path.iter().position(|n| n == name) {
            let mut members = path[start..].to_vec();
            members.push(name.to_string());
            return Err(PlanError::CycleDetected { members });
        }
        if visited.contains(name) {
            return Ok(());
        }

        path.push(name.to_string());
        if let Some(deps) = needs.get(name) {
            for dep in deps {
                Self::visit(dep, needs, visited, path)?;
            }
        }
        path.pop();
        visited.insert(name.to_string());

        Ok(())
    }

    /// Repeatedly take the first declared job whose upstreams are all
    /// placed. The input is acyclic at this point, so the scan always
    /// makes progress.
    fn topological_order(templates: &[JobTemplate]) -> Vec<String> {
        let mut order: Vec<String> = Vec::with_capacity(templates.len());
        let mut placed: HashSet<&str> = HashSet::new();

        while order.len() < templates.len() {
            for template in templates {
                if placed.contains(template.name.as_str()) {
                    continue;
                }
                if template
                    .needs
                    .iter()
                    .all(|need| placed.contains(need.as_str()))
                {
                    placed.insert(&template.name);
                    order.push(template.name.clone());
                }
            }
        }

        order
    }

    pub fn topo_order(&self) -> &[String] {
        &self.order
    }

    pub fn needs_of(&self, name: &str) -> &[String] {
        self.needs.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
