//! Cargo.toml / Cargo.lock rewriting
//!
//! Edits are made line by line so formatting, comments and key order in
//! the original files survive the update.

use super::{CARGO_LOCK, CARGO_TOML};
use crate::domain::{Dependency, DependencyFile, Requirement};
use crate::ecosystem::{FileUpdater, UpdaterArgs};
use crate::error::{AppError, ManifestError};
use regex::Regex;
use std::sync::LazyLock;

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\[+([^\]]+)\]+").unwrap());
static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"?([A-Za-z0-9_\-]+)"?\s*="#).unwrap());
static PACKAGE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"package\s*=\s*"([^"]+)""#).unwrap());

/// Rewrites Cargo files for a set of updated dependencies
pub struct CargoUpdater {
    args: UpdaterArgs,
}

impl CargoUpdater {
    /// Create a new updater
    pub fn new(args: UpdaterArgs) -> Self {
        Self { args }
    }
}

/// Returns the dependency name a `[...dependencies.<name>]` header opens
fn dependency_section_name(section: &str) -> Option<&str> {
    let (table, name) = section.trim().rsplit_once('.')?;
    if table.ends_with("dependencies") {
        Some(name.trim_matches('"'))
    } else {
        None
    }
}

fn is_dependency_table(section: &str) -> bool {
    section.trim().ends_with("dependencies")
}

/// Replaces the quoted `old` requirement after `prefix_re` on one line
fn replace_quoted(line: &str, prefix: &str, old: &str, new: &str) -> Option<String> {
    let pattern = format!(r#"({}\s*=\s*)"{}""#, prefix, regex::escape(old));
    let re = Regex::new(&pattern).ok()?;
    if !re.is_match(line) {
        return None;
    }
    let replacement = format!(r#"${{1}}"{}""#, new);
    Some(re.replacen(line, 1, replacement.as_str()).to_string())
}

/// Rewrites every declaration of `name` from `old` to `new`, returning the
/// number of declarations changed
pub(crate) fn update_manifest_requirement(
    content: &str,
    name: &str,
    old: &str,
    new: &str,
) -> (String, usize) {
    let mut section = String::new();
    let mut changed = 0;
    let mut lines = Vec::new();

    for line in content.split_inclusive('\n') {
        if let Some(caps) = SECTION_RE.captures(line) {
            section = caps[1].to_string();
            lines.push(line.to_string());
            continue;
        }

        let rewritten = if dependency_section_name(&section) == Some(name) {
            // [dependencies.name]
            // version = "1.0"
            replace_quoted(line, r"^\s*version", old, new)
        } else if is_dependency_table(&section) {
            let key = KEY_RE.captures(line).map(|c| c[1].to_string());
            let renamed_to = PACKAGE_KEY_RE.captures(line).map(|c| c[1].to_string());
            let declares = match renamed_to {
                Some(package) => package == name,
                None => key.as_deref() == Some(name),
            };
            if declares {
                // name = "1.0" or name = { version = "1.0", ... }
                replace_quoted(line, r"^(?:\s*[^=]+)", old, new)
                    .or_else(|| replace_quoted(line, r"version", old, new))
            } else {
                None
            }
        } else {
            None
        };

        match rewritten {
            Some(updated) => {
                changed += 1;
                lines.push(updated);
            }
            None => lines.push(line.to_string()),
        }
    }

    (lines.concat(), changed)
}

/// Moves `name` from `old` to `new` in Cargo.lock, dropping the stale
/// checksum and fixing references from other packages
pub(crate) fn update_lockfile_version(content: &str, name: &str, old: &str, new: &str) -> String {
    let mut output = Vec::new();
    let mut block: Vec<String> = Vec::new();
    let reference_old = format!("\"{} {}", name, old);
    let reference_new = format!("\"{} {}", name, new);

    let flush = |block: &mut Vec<String>, output: &mut Vec<String>| {
        let name_line = format!("name = \"{}\"", name);
        let version_line = format!("version = \"{}\"", old);
        let is_target = block.iter().any(|l| l.trim() == name_line)
            && block.iter().any(|l| l.trim() == version_line);
        for line in block.drain(..) {
            if is_target && line.trim() == version_line {
                output.push(line.replacen(old, new, 1));
            } else if is_target && line.trim_start().starts_with("checksum =") {
                continue;
            } else {
                output.push(line);
            }
        }
    };

    for line in content.split_inclusive('\n') {
        if line.trim() == "[[package]]" {
            flush(&mut block, &mut output);
        }
        let line = if line.contains(&reference_old) {
            let exact = format!("{}\"", reference_old);
            let with_source = format!("{} ", reference_old);
            if line.contains(&exact) || line.contains(&with_source) {
                line.replacen(&reference_old, &reference_new, 1)
            } else {
                line.to_string()
            }
        } else {
            line.to_string()
        };
        block.push(line);
    }
    flush(&mut block, &mut output);

    output.concat()
}

fn changed_requirements(dependency: &Dependency) -> Vec<(&Requirement, &Requirement)> {
    let Some(previous) = &dependency.previous_requirements else {
        return Vec::new();
    };
    dependency
        .requirements
        .iter()
        .filter_map(|new| {
            let old = previous
                .iter()
                .find(|p| p.file == new.file && p.groups == new.groups && p.source == new.source)?;
            (old.requirement != new.requirement).then_some((old, new))
        })
        .collect()
}

impl CargoUpdater {
    fn updated_manifest(&self, file: &DependencyFile) -> Result<String, AppError> {
        let mut content = file.content.clone();
        for dependency in &self.args.dependencies {
            for (old, new) in changed_requirements(dependency) {
                let (Some(old_req), Some(new_req)) = (&old.requirement, &new.requirement) else {
                    continue;
                };
                let (updated, changed) =
                    update_manifest_requirement(&content, &dependency.name, old_req, new_req);
                if changed == 0 && !content.contains(&format!("\"{}\"", new_req)) {
                    return Err(ManifestError::invalid_version_spec(
                        file.repo_path(),
                        old_req.clone(),
                        format!("declaration of {} not found", dependency.name),
                    )
                    .into());
                }
                content = updated;
            }
        }
        Ok(content)
    }

    fn updated_lockfile(&self, file: &DependencyFile) -> String {
        let mut content = file.content.clone();
        for dependency in &self.args.dependencies {
            let (Some(old), Some(new)) = (&dependency.previous_version, &dependency.version) else {
                continue;
            };
            if old != new {
                content = update_lockfile_version(&content, &dependency.name, old, new);
            }
        }
        content
    }
}

impl FileUpdater for CargoUpdater {
    fn updated_dependency_files(&self) -> Result<Vec<DependencyFile>, AppError> {
        let mut updated = Vec::new();
        for file in &self.args.dependency_files {
            let content = match file.name.as_str() {
                CARGO_TOML => self.updated_manifest(file)?,
                CARGO_LOCK => self.updated_lockfile(file),
                _ => continue,
            };
            if content != file.content {
                log::debug!("updated {}", file.repo_path());
                updated.push(file.with_content(content));
            }
        }
        Ok(updated)
    }
}
