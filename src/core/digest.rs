//! BLAKE3 digests for templates, resources and files on disk.

use crate::error::{Result, SynthError};
use crate::resources::template::{CfnResource, Template};
use std::io::Read;
use std::path::Path;

const STREAM_BUF_SIZE: usize = 65536;

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

/// Hash a resource's JSON form. Property maps serialize with sorted keys.
pub fn hash_resource(resource: &CfnResource) -> Result<String> {
    Ok(hash_string(&serde_json::to_string(resource)?))
}

/// Hash the pretty-printed template exactly as it is written to disk.
pub fn hash_template(template: &Template) -> Result<String> {
    Ok(hash_string(&render_template(template)?))
}

/// Template JSON as written to disk.
pub fn render_template(template: &Template) -> Result<String> {
    let mut json = serde_json::to_string_pretty(template)?;
    json.push('\n');
    Ok(json)
}

/// Hash a file's contents. Returns `"blake3:{hex}"`.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| SynthError::io(path, e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; STREAM_BUF_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(|e| SynthError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("blake3:{}", hasher.finalize().to_hex()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_string_format() {
        let h = hash_string("hello");
        assert!(h.starts_with("blake3:"));
        assert_eq!(h.len(), "blake3:".len() + 64);
        assert_eq!(h, hash_string("hello"));
        assert_ne!(h, hash_string("hello!"));
    }

    #[test]
    fn test_resource_hash_ignores_key_order() {
        let a = CfnResource::new("AWS::S3::Bucket", json!({"A": 1, "B": 2}));
        let b = CfnResource::new("AWS::S3::Bucket", json!({"B": 2, "A": 1}));
        assert_eq!(hash_resource(&a).unwrap(), hash_resource(&b).unwrap());
    }

    #[test]
    fn test_resource_hash_sees_depends_on() {
        let a = CfnResource::new("AWS::S3::Bucket", json!({}));
        let b = a.clone().depends_on(["Other"]);
        assert_ne!(hash_resource(&a).unwrap(), hash_resource(&b).unwrap());
    }

    #[test]
    fn test_template_hash_matches_written_file() {
        let template = Template {
            format_version: "2010-09-09".to_string(),
            description: None,
            resources: indexmap::IndexMap::new(),
            outputs: indexmap::IndexMap::new(),
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, render_template(&template).unwrap()).unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_template(&template).unwrap());
    }

    #[test]
    fn test_hash_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(hash_file(&dir.path().join("missing")).is_err());
    }
}
