//! Stack outputs: the public URLs of the distribution and the bucket.

use super::bucket::Bucket;
use super::distribution::Distribution;
use super::stack::Stack;
use crate::error::Result;

pub const CLOUDFRONT_URL_OUTPUT: &str = "CloudfrontWebUrl";
pub const BUCKET_URL_OUTPUT: &str = "S3BucketWebUrl";

pub fn emit_outputs(stack: &mut Stack, site: &Bucket, cdn: &Distribution) -> Result<()> {
    stack.add_output(
        CLOUDFRONT_URL_OUTPUT,
        "cloudfront website url",
        cdn.domain_name(),
    )?;
    stack.add_output(BUCKET_URL_OUTPUT, "s3 bucket website url", site.website_url())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::env_config;
    use crate::resources::bucket::compose_web_bucket;
    use crate::resources::distribution::compose_distribution;
    use serde_json::json;

    #[test]
    fn test_two_named_outputs() {
        let env = env_config("dev");
        let mut stack = Stack::new(&env.stack_name, "d");
        let site = compose_web_bucket(&mut stack, &env).unwrap();
        let cdn = compose_distribution(&mut stack, &site, &env).unwrap();
        emit_outputs(&mut stack, &site, &cdn).unwrap();

        let names: Vec<_> = stack.outputs().keys().map(String::as_str).collect();
        assert_eq!(names, vec![CLOUDFRONT_URL_OUTPUT, BUCKET_URL_OUTPUT]);
        assert_eq!(
            stack.outputs()[CLOUDFRONT_URL_OUTPUT].value,
            json!({"Fn::GetAtt": ["Distribution", "DomainName"]})
        );
        assert_eq!(
            stack.outputs()[BUCKET_URL_OUTPUT].value,
            json!({"Fn::GetAtt": ["WebBucket", "WebsiteURL"]})
        );
        assert_eq!(
            stack.outputs()[BUCKET_URL_OUTPUT].description.as_deref(),
            Some("s3 bucket website url")
        );
    }

    #[test]
    fn test_outputs_require_declared_resources() {
        let env = env_config("dev");
        let mut stack = Stack::new(&env.stack_name, "d");
        let site = Bucket {
            logical_id: "WebBucket".to_string(),
            bucket_name: env.bucket_name.clone(),
        };
        let cdn = Distribution {
            logical_id: "Distribution".to_string(),
            identity_id: "OriginAccessIdentity".to_string(),
        };
        assert!(emit_outputs(&mut stack, &site, &cdn).is_err());
    }
}
