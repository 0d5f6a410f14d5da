//! Dependency DAG over a stack's logical resources.
//!
//! Edges come from explicit `DependsOn` entries and from references found in
//! properties. The deploy order is computed with Kahn's algorithm using
//! alphabetical tie-breaking, so it is deterministic.

use crate::error::{Result, SynthError};
use crate::resources::template::CfnResource;
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Topological order of `resources` for stack `stack`.
pub fn build_deploy_order(
    stack: &str,
    resources: &IndexMap<String, CfnResource>,
) -> Result<Vec<String>> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

    for id in resources.keys() {
        in_degree.insert(id.as_str(), 0);
        adjacency.insert(id.as_str(), Vec::new());
    }

    for (id, resource) in resources {
        for dep in resource.prerequisites() {
            let Some((dep_key, _)) = resources.get_key_value(dep.as_str()) else {
                return Err(SynthError::composition(
                    stack,
                    format!("resource '{}' depends on unknown '{}'", id, dep),
                ));
            };
            if let Some(targets) = adjacency.get_mut(dep_key.as_str()) {
                targets.push(id.as_str());
            }
            if let Some(degree) = in_degree.get_mut(id.as_str()) {
                *degree += 1;
            }
        }
    }

    let mut zero_degree: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(id, _)| *id)
        .collect();
    zero_degree.sort_unstable();
    let mut queue: VecDeque<&str> = zero_degree.into();

    let mut order = Vec::with_capacity(resources.len());
    while let Some(current) = queue.pop_front() {
        order.push(current.to_string());

        let mut next_ready = Vec::new();
        if let Some(neighbors) = adjacency.get(current) {
            for &neighbor in neighbors {
                if let Some(degree) = in_degree.get_mut(neighbor) {
                    *degree -= 1;
                    if *degree == 0 {
                        next_ready.push(neighbor);
                    }
                }
            }
        }
        next_ready.sort_unstable();
        queue.extend(next_ready);
    }

    if order.len() != resources.len() {
        let ordered: BTreeSet<&str> = order.iter().map(String::as_str).collect();
        let members: Vec<&str> = resources
            .keys()
            .map(String::as_str)
            .filter(|id| !ordered.contains(id))
            .collect();
        return Err(SynthError::Cycle {
            stack: stack.to_string(),
            members: members.join(", "),
        });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::template::reference;
    use serde_json::json;

    fn resource(refs: &[&str], depends_on: &[&str]) -> CfnResource {
        let props: Vec<_> = refs.iter().map(|r| reference(r)).collect();
        CfnResource::new("AWS::S3::Bucket", json!({ "Refs": props }))
            .depends_on(depends_on.iter().copied())
    }

    fn resources(entries: Vec<(&str, CfnResource)>) -> IndexMap<String, CfnResource> {
        entries
            .into_iter()
            .map(|(id, r)| (id.to_string(), r))
            .collect()
    }

    #[test]
    fn test_linear() {
        let r = resources(vec![
            ("C", resource(&["B"], &[])),
            ("B", resource(&[], &["A"])),
            ("A", resource(&[], &[])),
        ]);
        assert_eq!(build_deploy_order("s", &r).unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_parallel_alphabetical() {
        let r = resources(vec![("beta", resource(&[], &[])), ("alpha", resource(&[], &[]))]);
        assert_eq!(build_deploy_order("s", &r).unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_diamond() {
        let r = resources(vec![
            ("Top", resource(&[], &[])),
            ("Right", resource(&["Top"], &[])),
            ("Left", resource(&["Top"], &[])),
            ("Bottom", resource(&["Left"], &["Right"])),
        ]);
        assert_eq!(
            build_deploy_order("s", &r).unwrap(),
            vec!["Top", "Left", "Right", "Bottom"]
        );
    }

    #[test]
    fn test_cycle() {
        let r = resources(vec![("A", resource(&["B"], &[])), ("B", resource(&[], &["A"]))]);
        let err = build_deploy_order("s", &r).unwrap_err();
        assert!(matches!(err, SynthError::Cycle { .. }));
        assert!(err.to_string().contains("A, B"));
    }

    #[test]
    fn test_unknown_dependency() {
        let r = resources(vec![("A", resource(&["Ghost"], &[]))]);
        let err = build_deploy_order("s", &r).unwrap_err();
        assert!(err.to_string().contains("unknown 'Ghost'"));
    }
}
