//! CloudFront distribution in front of the website bucket.
//!
//! The bucket is read through an origin access identity; the bucket policy
//! grants `s3:GetObject` to that identity's canonical user and nobody else.
//! Origin 404 and 403 both fall back to the SPA entry page, each with its
//! own configured status.

use super::bucket::Bucket;
use super::stack::Stack;
use super::template::{get_att, join, reference, CfnResource};
use crate::core::types::EnvironmentConfig;
use crate::error::Result;
use serde_json::{json, Value};

pub const ORIGIN_ACCESS_IDENTITY_ID: &str = "OriginAccessIdentity";
pub const BUCKET_POLICY_ID: &str = "WebBucketPolicy";
pub const DISTRIBUTION_ID: &str = "Distribution";
pub const DISTRIBUTION_TYPE: &str = "AWS::CloudFront::Distribution";

/// Page served for intercepted origin errors.
pub const SPA_FALLBACK_PAGE: &str = "/index.html";

/// Edge cache lifetime of a rewritten error response, in seconds.
pub const ERROR_CACHING_MIN_TTL: u64 = 300;

/// Origin status codes rewritten to the fallback page.
pub const INTERCEPTED_STATUS_CODES: [u16; 2] = [404, 403];

/// Managed "CachingOptimized" cache policy.
const CACHING_OPTIMIZED_POLICY_ID: &str = "658327ea-f89d-4fab-a63d-7e88639e58f6";

const ORIGIN_ID: &str = "WebBucketOrigin";

/// Handle to the declared distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub logical_id: String,
    pub identity_id: String,
}

impl Distribution {
    /// Distribution ID (`Ref`).
    pub fn distribution_id(&self) -> Value {
        reference(&self.logical_id)
    }

    pub fn domain_name(&self) -> Value {
        get_att(&self.logical_id, "DomainName")
    }
}

/// Error-response rewrites for the SPA fallback, in [`INTERCEPTED_STATUS_CODES`] order.
pub fn error_responses(env: &EnvironmentConfig) -> Vec<Value> {
    INTERCEPTED_STATUS_CODES
        .iter()
        .map(|&code| {
            let status = if code == 404 {
                env.fallback_status_404
            } else {
                env.fallback_status_403
            };
            json!({
                "ErrorCode": code,
                "ResponseCode": status,
                "ResponsePagePath": SPA_FALLBACK_PAGE,
                "ErrorCachingMinTTL": ERROR_CACHING_MIN_TTL,
            })
        })
        .collect()
}

/// Declare the origin access identity, the bucket read policy and the
/// distribution, in that order.
pub fn compose_distribution(
    stack: &mut Stack,
    bucket: &Bucket,
    env: &EnvironmentConfig,
) -> Result<Distribution> {
    stack.add(
        ORIGIN_ACCESS_IDENTITY_ID,
        CfnResource::new(
            "AWS::CloudFront::CloudFrontOriginAccessIdentity",
            json!({
                "CloudFrontOriginAccessIdentityConfig": {
                    "Comment": format!("Origin access identity for {}", env.stack_name),
                }
            }),
        ),
    )?;

    stack.add(
        BUCKET_POLICY_ID,
        CfnResource::new(
            "AWS::S3::BucketPolicy",
            json!({
                "Bucket": bucket.reference(),
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [
                        {
                            "Effect": "Allow",
                            "Action": "s3:GetObject",
                            "Resource": bucket.arn_for_objects("*"),
                            "Principal": {
                                "CanonicalUser": get_att(ORIGIN_ACCESS_IDENTITY_ID, "S3CanonicalUserId"),
                            },
                        }
                    ],
                },
            }),
        ),
    )?;

    let properties = json!({
        "DistributionConfig": {
            "Enabled": true,
            "Comment": env.stack_name,
            "DefaultRootObject": env.index_file,
            "HttpVersion": "http2",
            "IPV6Enabled": true,
            "PriceClass": "PriceClass_100",
            "Origins": [
                {
                    "Id": ORIGIN_ID,
                    "DomainName": bucket.regional_domain_name(),
                    "S3OriginConfig": {
                        "OriginAccessIdentity": join(vec![
                            json!("origin-access-identity/cloudfront/"),
                            reference(ORIGIN_ACCESS_IDENTITY_ID),
                        ]),
                    },
                }
            ],
            "DefaultCacheBehavior": {
                "TargetOriginId": ORIGIN_ID,
                "ViewerProtocolPolicy": "redirect-to-https",
                "CachePolicyId": CACHING_OPTIMIZED_POLICY_ID,
                "Compress": true,
            },
            "CustomErrorResponses": error_responses(env),
        }
    });

    stack.add(
        DISTRIBUTION_ID,
        CfnResource::new(DISTRIBUTION_TYPE, properties).depends_on([BUCKET_POLICY_ID]),
    )?;

    Ok(Distribution {
        logical_id: DISTRIBUTION_ID.to_string(),
        identity_id: ORIGIN_ACCESS_IDENTITY_ID.to_string(),
    })
}
