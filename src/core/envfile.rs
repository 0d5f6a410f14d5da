//! Build-variable loading from a dotenv file.
//!
//! Values are read once, at composition time, and baked into the build
//! project definition. The process environment is never modified.

use super::types::{BuildVariable, BuildVariables};
use crate::error::{Result, SynthError};
use std::io::Read;
use std::path::Path;

/// Load every key of a dotenv file as a build variable, in file order.
///
/// A missing file or a malformed line is fatal.
pub fn load_env_file(path: &Path) -> Result<BuildVariables> {
    let file = std::fs::File::open(path).map_err(|e| env_error(path, dotenvy::Error::Io(e)))?;
    let vars = parse_env(file, path)?;
    tracing::debug!(path = %path.display(), count = vars.len(), "loaded build variables");
    Ok(vars)
}

/// Parse dotenv content from any reader. `origin` is used in error messages.
///
/// Values are taken literally. An unescaped `$` outside single quotes is
/// rejected, since the dotenv reader would expand it from earlier keys or
/// from the process environment.
pub fn parse_env<R: Read>(mut reader: R, origin: &Path) -> Result<BuildVariables> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .map_err(|e| env_error(origin, dotenvy::Error::Io(e)))?;

    if let Some((line, index)) = find_expansion(&contents) {
        tracing::error!(
            path = %origin.display(),
            line = %line,
            "variable expansion is not supported; write '$' as \\$ or inside single quotes"
        );
        return Err(env_error(origin, dotenvy::Error::LineParse(line, index)));
    }

    let mut vars = BuildVariables::new();
    for item in dotenvy::from_read_iter(contents.as_bytes()) {
        let (key, value) = item.map_err(|e| env_error(origin, e))?;
        vars.insert(key, BuildVariable { value });
    }
    Ok(vars)
}

fn env_error(path: &Path, source: dotenvy::Error) -> SynthError {
    SynthError::EnvFile {
        path: path.to_path_buf(),
        source,
    }
}

/// First line holding a `$` the dotenv reader would substitute, with the
/// character index of that `$`. Quote state carries across lines so
/// multi-line quoted values are scanned as one.
fn find_expansion(contents: &str) -> Option<(String, usize)> {
    let mut strong = false;
    let mut weak = false;

    for line in contents.lines() {
        let value = if strong || weak {
            line
        } else {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match line.split_once('=') {
                Some((_, value)) => value,
                None => continue,
            }
        };
        let offset = line.len() - value.len();

        let mut escaped = false;
        let mut after_blank = false;
        for (i, c) in value.char_indices() {
            if escaped {
                escaped = false;
            } else if strong {
                if c == '\'' {
                    strong = false;
                }
            } else {
                match c {
                    '\\' => escaped = true,
                    '$' => {
                        let index = line[..offset + i].chars().count();
                        return Some((line.to_string(), index));
                    }
                    '"' => weak = !weak,
                    '\'' if !weak => strong = true,
                    '#' if !weak && after_blank => break,
                    _ => {}
                }
            }
            after_blank = c == ' ' || c == '\t';
        }
    }
    None
}
