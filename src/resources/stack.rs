//! Stack: an ordered set of logical resources and outputs.
//!
//! Resources must be added after everything they reference, so the
//! declaration order is always a valid dependency order.

use super::template::{CfnOutput, CfnResource, Template, TEMPLATE_FORMAT_VERSION};
use crate::core::rules;
use crate::error::{Result, SynthError};
use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    description: String,
    resources: IndexMap<String, CfnResource>,
    outputs: IndexMap<String, CfnOutput>,
}

impl Stack {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            resources: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resources(&self) -> &IndexMap<String, CfnResource> {
        &self.resources
    }

    pub fn outputs(&self) -> &IndexMap<String, CfnOutput> {
        &self.outputs
    }

    pub fn resource(&self, id: &str) -> Option<&CfnResource> {
        self.resources.get(id)
    }

    /// Logical IDs of every resource of the given type, in declaration order.
    pub fn ids_of_type(&self, resource_type: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, r)| r.resource_type == resource_type)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Declare a resource. Every reference and `DependsOn` entry must name
    /// a resource that is already declared.
    pub fn add(&mut self, id: &str, resource: CfnResource) -> Result<()> {
        if !rules::is_logical_id(id) {
            return Err(SynthError::composition(
                &self.name,
                format!("invalid logical ID '{}'", id),
            ));
        }
        if self.resources.contains_key(id) {
            return Err(SynthError::composition(
                &self.name,
                format!("resource '{}' declared twice", id),
            ));
        }
        for prerequisite in resource.prerequisites() {
            if prerequisite == id {
                return Err(SynthError::composition(
                    &self.name,
                    format!("resource '{}' references itself", id),
                ));
            }
            if !self.resources.contains_key(&prerequisite) {
                return Err(SynthError::composition(
                    &self.name,
                    format!(
                        "resource '{}' references '{}' before it is declared",
                        id, prerequisite
                    ),
                ));
            }
        }
        tracing::trace!(stack = %self.name, resource = id, kind = %resource.resource_type, "declared");
        self.resources.insert(id.to_string(), resource);
        Ok(())
    }

    /// Declare a named output over already-declared resources.
    pub fn add_output(&mut self, name: &str, description: &str, value: Value) -> Result<()> {
        if !rules::is_logical_id(name) {
            return Err(SynthError::composition(
                &self.name,
                format!("invalid output name '{}'", name),
            ));
        }
        if let Some(missing) = super::template::referenced_ids(&value)
            .into_iter()
            .find(|r| !self.resources.contains_key(r))
        {
            return Err(SynthError::composition(
                &self.name,
                format!("output '{}' references unknown resource '{}'", name, missing),
            ));
        }
        self.outputs.insert(
            name.to_string(),
            CfnOutput {
                description: Some(description.to_string()),
                value,
            },
        );
        Ok(())
    }

    /// Render as a CloudFormation template.
    pub fn to_template(&self) -> Template {
        Template {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: Some(self.description.clone()),
            resources: self.resources.clone(),
            outputs: self.outputs.clone(),
        }
    }
}
