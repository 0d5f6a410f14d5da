//! Change planning: diff synthesized stacks against the previous manifest.

use super::digest;
use super::synth::SynthesizedStack;
use super::types::*;
use crate::error::Result;

/// Compare `stacks` to the manifest of the previous run.
///
/// Resources are listed per stack in deploy order; resources and stacks the
/// previous run had but this one lacks are planned for destruction last.
pub fn plan(stacks: &[SynthesizedStack], previous: Option<&SynthManifest>) -> Result<ExecutionPlan> {
    let mut plan = ExecutionPlan::default();

    for stack in stacks {
        let recorded = previous.and_then(|m| m.stacks.get(&stack.stack_name));
        for id in &stack.deploy_order {
            let Some(resource) = stack.template.resources.get(id) else {
                continue;
            };
            let hash = digest::hash_resource(resource)?;
            let action = match recorded.and_then(|entry| entry.resources.get(id)) {
                None => PlanAction::Create,
                Some(entry) if entry.hash == hash => PlanAction::NoOp,
                Some(_) => PlanAction::Update,
            };
            push(
                &mut plan,
                PlannedChange {
                    stack: stack.stack_name.clone(),
                    logical_id: id.clone(),
                    resource_type: resource.resource_type.clone(),
                    description: describe_action(id, &resource.resource_type, action),
                    action,
                },
            );
        }
    }

    if let Some(previous) = previous {
        for (stack_name, entry) in &previous.stacks {
            let current = stacks.iter().find(|s| &s.stack_name == stack_name);
            for (id, resource) in entry.resources.iter().rev() {
                let kept = current.is_some_and(|s| s.template.resources.contains_key(id));
                if kept {
                    continue;
                }
                push(
                    &mut plan,
                    PlannedChange {
                        stack: stack_name.clone(),
                        logical_id: id.clone(),
                        resource_type: resource.resource_type.clone(),
                        description: describe_action(id, &resource.resource_type, PlanAction::Destroy),
                        action: PlanAction::Destroy,
                    },
                );
            }
        }
    }

    Ok(plan)
}

fn push(plan: &mut ExecutionPlan, change: PlannedChange) {
    match change.action {
        PlanAction::Create => plan.to_create += 1,
        PlanAction::Update => plan.to_update += 1,
        PlanAction::Destroy => plan.to_destroy += 1,
        PlanAction::NoOp => plan.unchanged += 1,
    }
    plan.changes.push(change);
}

fn describe_action(id: &str, resource_type: &str, action: PlanAction) -> String {
    match action {
        PlanAction::Create => format!("{}: create {}", id, resource_type),
        PlanAction::Update => format!("{}: update (definition changed)", id),
        PlanAction::Destroy => format!("{}: destroy {}", id, resource_type),
        PlanAction::NoOp => format!("{}: no changes", id),
    }
}
