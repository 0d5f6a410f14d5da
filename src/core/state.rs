//! Output directory management: template files and the synth manifest.
//!
//! Layout of an output directory:
//!
//! ```text
//! synth.out/
//!   manifest.yaml
//!   <stack>.template.json
//! ```

use super::digest;
use super::synth::SynthesizedStack;
use super::types::{ResourceEntry, StackEntry, SynthManifest};
use crate::error::{Result, SynthError};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.yaml";
pub const MANIFEST_SCHEMA: &str = "1.0";

/// Manifest path within an output directory.
pub fn manifest_path(out_dir: &Path) -> PathBuf {
    out_dir.join(MANIFEST_FILE)
}

/// Template file name for a stack.
pub fn template_file_name(stack_name: &str) -> String {
    format!("{}.template.json", stack_name)
}

/// Load the manifest of a previous run. Returns None if there is none.
pub fn load_manifest(out_dir: &Path) -> Result<Option<SynthManifest>> {
    let path = manifest_path(out_dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| SynthError::io(&path, e))?;
    let manifest: SynthManifest = serde_yaml_ng::from_str(&content)?;
    Ok(Some(manifest))
}

/// Build the manifest describing `stacks`.
pub fn build_manifest(app_name: &str, stacks: &[SynthesizedStack]) -> Result<SynthManifest> {
    let mut entries = indexmap::IndexMap::new();
    for stack in stacks {
        let mut resources = indexmap::IndexMap::new();
        for (id, resource) in &stack.template.resources {
            resources.insert(
                id.clone(),
                ResourceEntry {
                    resource_type: resource.resource_type.clone(),
                    hash: digest::hash_resource(resource)?,
                },
            );
        }
        entries.insert(
            stack.stack_name.clone(),
            StackEntry {
                environment_type: stack.environment_type.clone(),
                template_file: template_file_name(&stack.stack_name),
                template_hash: digest::hash_template(&stack.template)?,
                resources,
                outputs: stack.template.outputs.keys().cloned().collect(),
            },
        );
    }
    Ok(SynthManifest {
        schema: MANIFEST_SCHEMA.to_string(),
        generator: format!("sitestack {}", env!("CARGO_PKG_VERSION")),
        app: app_name.to_string(),
        stacks: entries,
    })
}

/// Write every template and the manifest into `out_dir`.
///
/// All content is rendered before the first file is touched. Each file is
/// written to a temp path and renamed into place; the manifest goes last.
/// Templates recorded by a previous manifest that no longer correspond to a
/// synthesized stack are removed.
pub fn write_output(
    out_dir: &Path,
    app_name: &str,
    stacks: &[SynthesizedStack],
) -> Result<SynthManifest> {
    let manifest = build_manifest(app_name, stacks)?;
    let mut rendered = Vec::with_capacity(stacks.len());
    for stack in stacks {
        rendered.push((
            template_file_name(&stack.stack_name),
            digest::render_template(&stack.template)?,
        ));
    }
    let manifest_yaml = serde_yaml_ng::to_string(&manifest)?;
    let previous = load_manifest(out_dir)?;

    std::fs::create_dir_all(out_dir).map_err(|e| SynthError::io(out_dir, e))?;
    for (file_name, json) in &rendered {
        write_atomic(&out_dir.join(file_name), json)?;
        tracing::info!(file = %file_name, "wrote template");
    }

    if let Some(previous) = previous {
        for (stack_name, entry) in &previous.stacks {
            if manifest.stacks.contains_key(stack_name) {
                continue;
            }
            if entry.template_file != template_file_name(stack_name) {
                tracing::warn!(stack = %stack_name, file = %entry.template_file, "manifest entry names an unexpected template file; leaving it in place");
                continue;
            }
            let stale = out_dir.join(template_file_name(stack_name));
            if stale.exists() {
                std::fs::remove_file(&stale).map_err(|e| SynthError::io(&stale, e))?;
                tracing::info!(stack = %stack_name, "removed stale template");
            }
        }
    }

    write_atomic(&manifest_path(out_dir), &manifest_yaml)?;
    Ok(manifest)
}

/// Stacks whose template on disk no longer matches the manifest hash.
pub fn detect_drift(out_dir: &Path, manifest: &SynthManifest) -> Vec<String> {
    manifest
        .stacks
        .iter()
        .filter(|(name, entry)| {
            match digest::hash_file(&out_dir.join(template_file_name(name))) {
                Ok(hash) => hash != entry.template_hash,
                Err(_) => true,
            }
        })
        .map(|(name, _)| name.clone())
        .collect()
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, contents).map_err(|e| SynthError::io(&tmp_path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        SynthError::io(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixtures::env_config;
    use crate::core::synth::compose_with_variables;
    use crate::core::types::BuildVariables;

    fn stacks(envs: &[&str]) -> Vec<SynthesizedStack> {
        envs.iter()
            .map(|e| compose_with_variables(&env_config(e), &BuildVariables::new()).unwrap())
            .collect()
    }

    #[test]
    fn test_manifest_path() {
        assert_eq!(
            manifest_path(Path::new("/out")),
            PathBuf::from("/out/manifest.yaml")
        );
        assert_eq!(template_file_name("site-dev"), "site-dev.template.json");
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_output(dir.path(), "site", &stacks(&["dev", "prod"])).unwrap();

        let loaded = load_manifest(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.app, "site");
        assert_eq!(loaded.stacks.len(), 2);
        assert_eq!(loaded.stacks["site-dev"].template_hash, written.stacks["site-dev"].template_hash);
        assert_eq!(
            loaded.stacks["site-dev"].outputs,
            vec!["CloudfrontWebUrl", "S3BucketWebUrl"]
        );
        assert!(dir.path().join("site-prod.template.json").exists());
        assert!(!dir.path().join("manifest.yaml.tmp").exists());
    }

    #[test]
    fn test_template_file_is_valid_json() {
        let dir = tempfile::tempdir().unwrap();
        write_output(dir.path(), "site", &stacks(&["dev"])).unwrap();
        let raw = std::fs::read_to_string(dir.path().join("site-dev.template.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["AWSTemplateFormatVersion"], "2010-09-09");
        assert!(value["Resources"]["Distribution"].is_object());
    }

    #[test]
    fn test_load_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_manifest(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_stale_template_removed() {
        let dir = tempfile::tempdir().unwrap();
        write_output(dir.path(), "site", &stacks(&["dev", "prod"])).unwrap();
        write_output(dir.path(), "site", &stacks(&["dev"])).unwrap();
        assert!(dir.path().join("site-dev.template.json").exists());
        assert!(!dir.path().join("site-prod.template.json").exists());
        let loaded = load_manifest(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.stacks.len(), 1);
    }

    #[test]
    fn test_rewrite_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_output(dir.path(), "site", &stacks(&["dev"])).unwrap();
        let second = write_output(dir.path(), "site", &stacks(&["dev"])).unwrap();
        assert_eq!(
            first.stacks["site-dev"].template_hash,
            second.stacks["site-dev"].template_hash
        );
    }

    #[test]
    fn test_drift_detection() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_output(dir.path(), "site", &stacks(&["dev", "prod"])).unwrap();
        assert!(detect_drift(dir.path(), &manifest).is_empty());

        std::fs::write(dir.path().join("site-dev.template.json"), "{}").unwrap();
        std::fs::remove_file(dir.path().join("site-prod.template.json")).unwrap();
        assert_eq!(detect_drift(dir.path(), &manifest), vec!["site-dev", "site-prod"]);
    }

    #[test]
    fn test_stale_removal_ignores_foreign_paths() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let victim = outside.path().join("keep.json");
        std::fs::write(&victim, "{}").unwrap();

        let mut manifest = build_manifest("site", &stacks(&["dev"])).unwrap();
        let mut gone = manifest.stacks["site-dev"].clone();
        gone.template_file = victim.to_string_lossy().into_owned();
        manifest.stacks.insert("site-gone".to_string(), gone.clone());
        gone.template_file = "../keep.json".to_string();
        manifest.stacks.insert("site-up".to_string(), gone);
        std::fs::write(
            manifest_path(dir.path()),
            serde_yaml_ng::to_string(&manifest).unwrap(),
        )
        .unwrap();

        write_output(dir.path(), "site", &stacks(&["dev"])).unwrap();
        assert!(victim.exists());
        let loaded = load_manifest(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.stacks.len(), 1);
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("sub");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("inner"), "x").unwrap();

        assert!(write_atomic(&target, "{}").is_err());
        assert!(!dir.path().join("sub.tmp").exists());
        assert!(target.join("inner").exists());
    }

    #[test]
    fn test_corrupt_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(manifest_path(dir.path()), "stacks: [not, a, map").unwrap();
        assert!(load_manifest(dir.path()).is_err());
    }
}
