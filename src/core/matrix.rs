//! Matrix expansion - fans a job template out into concrete instances

use crate::core::job::{Coordinate, InstanceId, JobInstance, JobTemplate};

/// Expand a template into one instance per matrix coordinate.
///
/// Enumeration is axis-major over declared axis order, then value order,
/// so the resulting sequence is identical across runs. A template without
/// a matrix yields exactly one instance with an empty coordinate. An axis
/// with zero values yields zero instances; the caller records the template
/// as skipped.
pub fn expand(template: &JobTemplate) -> Vec<JobInstance> {
    if template.matrix.is_empty() {
        return vec![JobInstance::new(InstanceId::new(
            &template.name,
            Coordinate::empty(),
        ))];
    }

    if template.matrix.iter().any(|axis| axis.values.is_empty()) {
        return Vec::new();
    }

    let mut coordinates: Vec<Vec<(String, String)>> = vec![Vec::new()];
    for axis in &template.matrix {
        let mut next = Vec::with_capacity(coordinates.len() * axis.values.len());
        for prefix in &coordinates {
            for value in &axis.values {
                let mut pairs = prefix.clone();
                pairs.push((axis.name.clone(), value.clone()));
                next.push(pairs);
            }
        }
        coordinates = next;
    }

    coordinates
        .into_iter()
        .map(|pairs| JobInstance::new(InstanceId::new(&template.name, Coordinate(pairs))))
        .collect()
}
