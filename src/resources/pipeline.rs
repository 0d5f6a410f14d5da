//! CodePipeline with three sequential stages: Source → Build → Deploy.
//!
//! Declares the artifact store, the CodeBuild project and both service
//! roles before the pipeline itself. The pipeline's `DependsOn` names the
//! website bucket and the distribution explicitly; neither is implied by the
//! stage actions alone.

use super::bucket::{compose_artifact_bucket, Bucket};
use super::buildspec::BuildSpec;
use super::distribution::Distribution;
use super::stack::Stack;
use super::template::{get_att, reference, sub, CfnResource};
use crate::core::types::{BuildVariables, EnvironmentConfig};
use crate::error::{Result, SynthError};
use serde::Serialize;
use serde_json::{json, Value};

pub const BUILD_ROLE_ID: &str = "BuildRole";
pub const BUILD_ROLE_POLICY_ID: &str = "BuildRolePolicy";
pub const BUILD_PROJECT_ID: &str = "BuildProject";
pub const PIPELINE_ROLE_ID: &str = "PipelineRole";
pub const PIPELINE_ROLE_POLICY_ID: &str = "PipelineRolePolicy";
pub const PIPELINE_ID: &str = "Pipeline";
pub const WEBHOOK_ID: &str = "PipelineWebhook";
pub const PIPELINE_TYPE: &str = "AWS::CodePipeline::Pipeline";

pub const SOURCE_ACTION: &str = "GitHub";
pub const BUILD_ACTION: &str = "CodeBuild";
pub const DEPLOY_ACTION: &str = "DeployToS3";

const SOURCE_ARTIFACT: &str = "SourceOutput";
const BUILD_ARTIFACT: &str = "BuildOutput";

/// Amazon Linux 2 standard 5.0 image.
pub const BUILD_IMAGE: &str = "aws/codebuild/amazonlinux2-x86_64-standard:5.0";

/// Handle to the declared pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub logical_id: String,
    pub project_id: String,
    pub pipeline_name: String,
}

// ============================================================================
// Stage model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stage {
    pub name: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Action {
    pub name: String,
    pub action_type_id: ActionTypeId,
    pub configuration: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_artifacts: Vec<ArtifactRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output_artifacts: Vec<ArtifactRef>,
    pub run_order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionTypeId {
    pub category: String,
    pub owner: String,
    pub provider: String,
    pub version: String,
}

impl ActionTypeId {
    fn new(category: &str, owner: &str, provider: &str) -> Self {
        Self {
            category: category.to_string(),
            owner: owner.to_string(),
            provider: provider.to_string(),
            version: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ArtifactRef {
    pub name: String,
}

fn artifact(name: &str) -> Vec<ArtifactRef> {
    vec![ArtifactRef {
        name: name.to_string(),
    }]
}

/// Source stage: checkout of `branch` from GitHub. The token is a dynamic reference.
pub fn source_stage(env: &EnvironmentConfig) -> Stage {
    Stage {
        name: "Source".to_string(),
        actions: vec![Action {
            name: SOURCE_ACTION.to_string(),
            action_type_id: ActionTypeId::new("Source", "ThirdParty", "GitHub"),
            configuration: json!({
                "Owner": env.github_repo_owner,
                "Repo": env.github_repo_name,
                "Branch": env.branch,
                "OAuthToken": env.github_access_token_ref.dynamic_reference(),
                "PollForSourceChanges": false,
            }),
            input_artifacts: Vec::new(),
            output_artifacts: artifact(SOURCE_ARTIFACT),
            run_order: 1,
        }],
    }
}

/// Build stage: runs the CodeBuild project on the source artifact.
pub fn build_stage(project_id: &str) -> Stage {
    Stage {
        name: "Build".to_string(),
        actions: vec![Action {
            name: BUILD_ACTION.to_string(),
            action_type_id: ActionTypeId::new("Build", "AWS", "CodeBuild"),
            configuration: json!({ "ProjectName": reference(project_id) }),
            input_artifacts: artifact(SOURCE_ARTIFACT),
            output_artifacts: artifact(BUILD_ARTIFACT),
            run_order: 1,
        }],
    }
}

/// Deploy stage: extracts the build artifact into the website bucket.
pub fn deploy_stage(bucket: &Bucket) -> Stage {
    Stage {
        name: "Deploy".to_string(),
        actions: vec![Action {
            name: DEPLOY_ACTION.to_string(),
            action_type_id: ActionTypeId::new("Deploy", "AWS", "S3"),
            configuration: json!({
                "BucketName": bucket.reference(),
                "Extract": "true",
            }),
            input_artifacts: artifact(BUILD_ARTIFACT),
            output_artifacts: Vec::new(),
            run_order: 1,
        }],
    }
}

// ============================================================================
// IAM
// ============================================================================

fn service_role(service: &str) -> CfnResource {
    CfnResource::new(
        "AWS::IAM::Role",
        json!({
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [
                    {
                        "Effect": "Allow",
                        "Principal": { "Service": service },
                        "Action": "sts:AssumeRole",
                    }
                ],
            }
        }),
    )
}

fn allow(actions: &[&str], resource: Value) -> Value {
    json!({
        "Effect": "Allow",
        "Action": actions,
        "Resource": resource,
    })
}

fn role_policy(name: String, role_id: &str, statements: Vec<Value>) -> CfnResource {
    CfnResource::new(
        "AWS::IAM::Policy",
        json!({
            "PolicyName": name,
            "Roles": [reference(role_id)],
            "PolicyDocument": {
                "Version": "2012-10-17",
                "Statement": statements,
            },
        }),
    )
}

fn artifact_access(artifacts: &Bucket) -> Value {
    allow(
        &[
            "s3:GetObject*",
            "s3:GetBucket*",
            "s3:List*",
            "s3:PutObject",
            "s3:DeleteObject*",
        ],
        json!([artifacts.arn(), artifacts.arn_for_objects("*")]),
    )
}

/// CodeBuild environment variables, one `PLAINTEXT` entry per key.
pub fn environment_variables(vars: &BuildVariables) -> Vec<Value> {
    vars.iter()
        .map(|(name, var)| {
            json!({
                "Name": name,
                "Type": "PLAINTEXT",
                "Value": var.value,
            })
        })
        .collect()
}

// ============================================================================
// Composition
// ============================================================================

/// Declare the CI/CD pipeline and everything it needs.
///
/// `vars` must already be loaded; nothing here touches the filesystem.
pub fn compose_pipeline(
    stack: &mut Stack,
    site: &Bucket,
    cdn: &Distribution,
    env: &EnvironmentConfig,
    vars: &BuildVariables,
) -> Result<Pipeline> {
    let project_name = env.build_project_name();
    let artifacts = compose_artifact_bucket(stack, env)?;

    stack.add(BUILD_ROLE_ID, service_role("codebuild.amazonaws.com"))?;
    stack.add(
        BUILD_ROLE_POLICY_ID,
        role_policy(
            format!("{}-build-policy", env.stack_name),
            BUILD_ROLE_ID,
            vec![
                allow(
                    &["logs:CreateLogGroup", "logs:CreateLogStream", "logs:PutLogEvents"],
                    sub(&format!(
                        "arn:${{AWS::Partition}}:logs:${{AWS::Region}}:${{AWS::AccountId}}:log-group:/aws/codebuild/{}:*",
                        project_name
                    )),
                ),
                artifact_access(&artifacts),
                allow(
                    &["cloudfront:CreateInvalidation"],
                    sub(&format!(
                        "arn:${{AWS::Partition}}:cloudfront::${{AWS::AccountId}}:distribution/${{{}}}",
                        cdn.logical_id
                    )),
                ),
                allow(
                    &["codebuild:StartBuild", "codebuild:BatchGetBuilds"],
                    sub(&format!(
                        "arn:${{AWS::Partition}}:codebuild:${{AWS::Region}}:${{AWS::AccountId}}:project/{}",
                        project_name
                    )),
                ),
            ],
        ),
    )?;

    let buildspec = BuildSpec::static_site(&format!("${{{}}}", cdn.logical_id))
        .to_yaml()
        .map_err(|e| SynthError::composition(&env.stack_name, format!("buildspec: {}", e)))?;

    stack.add(
        BUILD_PROJECT_ID,
        CfnResource::new(
            "AWS::CodeBuild::Project",
            json!({
                "Name": project_name,
                "ServiceRole": get_att(BUILD_ROLE_ID, "Arn"),
                "Source": {
                    "Type": "CODEPIPELINE",
                    "BuildSpec": sub(&buildspec),
                },
                "Artifacts": { "Type": "CODEPIPELINE" },
                "Environment": {
                    "Type": "LINUX_CONTAINER",
                    "ComputeType": "BUILD_GENERAL1_SMALL",
                    "Image": BUILD_IMAGE,
                    "PrivilegedMode": true,
                    "EnvironmentVariables": environment_variables(vars),
                },
            }),
        )
        .depends_on([BUILD_ROLE_POLICY_ID]),
    )?;

    stack.add(PIPELINE_ROLE_ID, service_role("codepipeline.amazonaws.com"))?;
    stack.add(
        PIPELINE_ROLE_POLICY_ID,
        role_policy(
            format!("{}-pipeline-policy", env.stack_name),
            PIPELINE_ROLE_ID,
            vec![
                artifact_access(&artifacts),
                allow(
                    &[
                        "s3:PutObject*",
                        "s3:DeleteObject*",
                        "s3:GetBucket*",
                        "s3:List*",
                        "s3:Abort*",
                    ],
                    json!([site.arn(), site.arn_for_objects("*")]),
                ),
                allow(
                    &[
                        "codebuild:StartBuild",
                        "codebuild:BatchGetBuilds",
                        "codebuild:StopBuild",
                    ],
                    get_att(BUILD_PROJECT_ID, "Arn"),
                ),
            ],
        ),
    )?;

    let stages = [
        source_stage(env),
        build_stage(BUILD_PROJECT_ID),
        deploy_stage(site),
    ];

    stack.add(
        PIPELINE_ID,
        CfnResource::new(
            PIPELINE_TYPE,
            json!({
                "Name": env.pipeline_name,
                "RoleArn": get_att(PIPELINE_ROLE_ID, "Arn"),
                "ArtifactStore": {
                    "Type": "S3",
                    "Location": artifacts.reference(),
                },
                "Stages": serde_json::to_value(stages)?,
                "RestartExecutionOnUpdate": false,
            }),
        )
        .depends_on([
            PIPELINE_ROLE_POLICY_ID,
            site.logical_id.as_str(),
            cdn.logical_id.as_str(),
        ]),
    )?;

    stack.add(
        WEBHOOK_ID,
        CfnResource::new(
            "AWS::CodePipeline::Webhook",
            json!({
                "Authentication": "GITHUB_HMAC",
                "AuthenticationConfiguration": {
                    "SecretToken": env.github_access_token_ref.dynamic_reference(),
                },
                "Filters": [
                    { "JsonPath": "$.ref", "MatchEquals": format!("refs/heads/{}", env.branch) }
                ],
                "TargetAction": SOURCE_ACTION,
                "TargetPipeline": reference(PIPELINE_ID),
                "TargetPipelineVersion": get_att(PIPELINE_ID, "Version"),
                "RegisterWithThirdParty": true,
            }),
        ),
    )?;

    Ok(Pipeline {
        logical_id: PIPELINE_ID.to_string(),
        project_id: BUILD_PROJECT_ID.to_string(),
        pipeline_name: env.pipeline_name.clone(),
    })
}
