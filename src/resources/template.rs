//! CloudFormation template model and intrinsic-function helpers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// A complete CloudFormation template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Resources in declaration order
    #[serde(rename = "Resources")]
    pub resources: IndexMap<String, CfnResource>,

    #[serde(rename = "Outputs", default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, CfnOutput>,
}

/// One logical resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfnResource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(rename = "Properties")]
    pub properties: Value,

    /// Explicit ordering edges
    #[serde(rename = "DependsOn", default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(rename = "DeletionPolicy", default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,

    #[serde(rename = "UpdateReplacePolicy", default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,
}

impl CfnResource {
    pub fn new(resource_type: &str, properties: Value) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    /// Add explicit `DependsOn` edges.
    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            let id = id.into();
            if !self.depends_on.contains(&id) {
                self.depends_on.push(id);
            }
        }
        self
    }

    /// Apply the same policy on stack deletion and on replacement.
    pub fn removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }

    /// Every logical ID this resource needs declared first: `DependsOn` plus
    /// references found in its properties.
    pub fn prerequisites(&self) -> BTreeSet<String> {
        let mut ids = referenced_ids(&self.properties);
        ids.extend(self.depends_on.iter().cloned());
        ids
    }
}

/// Resource lifecycle on deletion/replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalPolicy {
    Delete,
    Retain,
}

/// A stack output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfnOutput {
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Value")]
    pub value: Value,
}

// ============================================================================
// Intrinsic functions
// ============================================================================

/// `{"Ref": id}`
pub fn reference(id: &str) -> Value {
    json!({ "Ref": id })
}

/// `{"Fn::GetAtt": [id, attribute]}`
pub fn get_att(id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id, attribute] })
}

/// `{"Fn::Join": ["", parts]}`
pub fn join(parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": ["", parts] })
}

/// `{"Fn::Sub": text}`
pub fn sub(text: &str) -> Value {
    json!({ "Fn::Sub": text })
}

/// Logical IDs referenced through `Ref`, `Fn::GetAtt` and `Fn::Sub`.
/// Pseudo parameters (`AWS::*`) are not resource references.
pub fn referenced_ids(value: &Value) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    collect_refs(value, &mut ids);
    ids
}

fn collect_refs(value: &Value, ids: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("Ref") {
                if !target.starts_with("AWS::") {
                    ids.insert(target.clone());
                }
            }
            if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                if let Some(Value::String(target)) = args.first() {
                    ids.insert(target.clone());
                }
            }
            match map.get("Fn::Sub") {
                Some(Value::String(text)) => sub_placeholders(text, &[], ids),
                Some(Value::Array(args)) => {
                    let local: Vec<&str> = args
                        .get(1)
                        .and_then(Value::as_object)
                        .map(|m| m.keys().map(String::as_str).collect())
                        .unwrap_or_default();
                    if let Some(Value::String(text)) = args.first() {
                        sub_placeholders(text, &local, ids);
                    }
                }
                _ => {}
            }
            for child in map.values() {
                collect_refs(child, ids);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, ids);
            }
        }
        _ => {}
    }
}

/// Extract `${Name}` / `${Name.Attr}` targets; `${!Literal}` is an escape.
fn sub_placeholders(text: &str, local: &[&str], ids: &mut BTreeSet<String>) {
    let mut rest = text;
    while let Some(open) = rest.find("${") {
        let after = &rest[open + 2..];
        let Some(close) = after.find('}') else {
            break;
        };
        let name = &after[..close];
        rest = &after[close + 1..];
        if name.starts_with('!') || name.starts_with("AWS::") {
            continue;
        }
        let target = name.split('.').next().unwrap_or(name);
        if !target.is_empty() && !local.contains(&target) {
            ids.insert(target.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsics_shape() {
        assert_eq!(reference("WebBucket"), json!({"Ref": "WebBucket"}));
        assert_eq!(
            get_att("Distribution", "DomainName"),
            json!({"Fn::GetAtt": ["Distribution", "DomainName"]})
        );
        assert_eq!(
            join(vec![json!("a/"), reference("X")]),
            json!({"Fn::Join": ["", ["a/", {"Ref": "X"}]]})
        );
    }

    #[test]
    fn test_referenced_ids_nested() {
        let props = json!({
            "Bucket": reference("WebBucket"),
            "Policy": {
                "Principal": {"CanonicalUser": get_att("OriginAccessIdentity", "S3CanonicalUserId")},
                "Region": {"Ref": "AWS::Region"}
            },
            "List": [join(vec![json!("x"), reference("Other")])]
        });
        let ids: Vec<_> = referenced_ids(&props).into_iter().collect();
        assert_eq!(ids, vec!["OriginAccessIdentity", "Other", "WebBucket"]);
    }

    #[test]
    fn test_sub_placeholders() {
        let ids = referenced_ids(&sub(
            "arn:aws:cloudfront::${AWS::AccountId}:distribution/${Distribution} ${Project.Arn} ${!Literal}",
        ));
        let ids: Vec<_> = ids.into_iter().collect();
        assert_eq!(ids, vec!["Distribution", "Project"]);
    }

    #[test]
    fn test_sub_with_local_variables() {
        let value = json!({"Fn::Sub": ["${Local}-${Bucket}", {"Local": "x"}]});
        let ids: Vec<_> = referenced_ids(&value).into_iter().collect();
        assert_eq!(ids, vec!["Bucket"]);
    }

    #[test]
    fn test_prerequisites_include_depends_on() {
        let r = CfnResource::new("AWS::CodePipeline::Pipeline", json!({"X": reference("A")}))
            .depends_on(["B", "A"]);
        assert_eq!(r.depends_on, vec!["B", "A"]);
        let ids: Vec<_> = r.prerequisites().into_iter().collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_resource_serialization() {
        let r = CfnResource::new("AWS::S3::Bucket", json!({"BucketName": "b"}))
            .removal_policy(RemovalPolicy::Delete);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["Type"], "AWS::S3::Bucket");
        assert_eq!(v["DeletionPolicy"], "Delete");
        assert_eq!(v["UpdateReplacePolicy"], "Delete");
        assert!(v.get("DependsOn").is_none());
    }
}
