//! S3 buckets: the static website root and the pipeline artifact store.

use super::stack::Stack;
use super::template::{get_att, join, reference, CfnResource, RemovalPolicy};
use crate::core::types::EnvironmentConfig;
use crate::error::Result;
use serde_json::{json, Value};

pub const WEB_BUCKET_ID: &str = "WebBucket";
pub const ARTIFACT_BUCKET_ID: &str = "ArtifactBucket";
pub const BUCKET_TYPE: &str = "AWS::S3::Bucket";

/// Handle to a declared bucket; composers take this instead of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub logical_id: String,
    pub bucket_name: String,
}

impl Bucket {
    pub fn reference(&self) -> Value {
        reference(&self.logical_id)
    }

    pub fn arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }

    /// ARN matching objects under `pattern`, e.g. `*`.
    pub fn arn_for_objects(&self, pattern: &str) -> Value {
        join(vec![self.arn(), json!(format!("/{}", pattern))])
    }

    pub fn regional_domain_name(&self) -> Value {
        get_att(&self.logical_id, "RegionalDomainName")
    }

    pub fn website_url(&self) -> Value {
        get_att(&self.logical_id, "WebsiteURL")
    }
}

fn sse_s3() -> Value {
    json!({
        "ServerSideEncryptionConfiguration": [
            { "ServerSideEncryptionByDefault": { "SSEAlgorithm": "AES256" } }
        ]
    })
}

/// Declare the website bucket.
///
/// ACL-based public access is always blocked. `public_access` only lifts
/// the block on public *policies*; no public grant is ever written.
pub fn compose_web_bucket(stack: &mut Stack, env: &EnvironmentConfig) -> Result<Bucket> {
    let restrict_policies = !env.public_access;
    let properties = json!({
        "BucketName": env.bucket_name,
        "WebsiteConfiguration": {
            "IndexDocument": env.index_file,
            "ErrorDocument": env.error_file,
        },
        "AccessControl": "BucketOwnerFullControl",
        "OwnershipControls": { "Rules": [ { "ObjectOwnership": "ObjectWriter" } ] },
        "BucketEncryption": sse_s3(),
        "PublicAccessBlockConfiguration": {
            "BlockPublicAcls": true,
            "IgnorePublicAcls": true,
            "BlockPublicPolicy": restrict_policies,
            "RestrictPublicBuckets": restrict_policies,
        },
        "Tags": [ { "Key": "environment", "Value": env.environment_type } ],
    });

    stack.add(
        WEB_BUCKET_ID,
        CfnResource::new(BUCKET_TYPE, properties).removal_policy(RemovalPolicy::Delete),
    )?;

    Ok(Bucket {
        logical_id: WEB_BUCKET_ID.to_string(),
        bucket_name: env.bucket_name.clone(),
    })
}

/// Declare the private artifact store used between pipeline stages.
pub fn compose_artifact_bucket(stack: &mut Stack, env: &EnvironmentConfig) -> Result<Bucket> {
    let properties = json!({
        "BucketName": env.pipeline_bucket,
        "BucketEncryption": sse_s3(),
        "PublicAccessBlockConfiguration": {
            "BlockPublicAcls": true,
            "IgnorePublicAcls": true,
            "BlockPublicPolicy": true,
            "RestrictPublicBuckets": true,
        },
        "Tags": [ { "Key": "environment", "Value": env.environment_type } ],
    });

    stack.add(
        ARTIFACT_BUCKET_ID,
        CfnResource::new(BUCKET_TYPE, properties).removal_policy(RemovalPolicy::Delete),
    )?;

    Ok(Bucket {
        logical_id: ARTIFACT_BUCKET_ID.to_string(),
        bucket_name: env.pipeline_bucket.clone(),
    })
}
