//! sitestack: static site infrastructure as code.
//!
//! One S3 website bucket, one CloudFront distribution and one three-stage
//! CodePipeline per deploy-flagged environment, synthesized into
//! CloudFormation templates with BLAKE3-tracked manifests.

pub mod cli;
pub mod core;
pub mod error;
pub mod resources;
