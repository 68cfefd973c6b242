//! Resolution of `runqc` names to QC definition files.

use crate::config::loader::load_qc_definition;
use crate::deployment::Deployment;
use crate::error::ConfigError;
use gliderqc_core::config::QcDefinition;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A `runqc` name resolved and loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQc {
    /// Name as listed in `runqc`
    pub name: String,
    /// File the name resolved to
    pub path: PathBuf,
    /// Parsed definition
    pub definition: QcDefinition,
}

/// A definition file found in a search directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QcDefinitionFile {
    /// File name (what `runqc` refers to)
    pub name: String,
    /// Full path
    pub path: PathBuf,
}

/// Looks up QC definition files in an ordered list of directories.
///
/// The deployment's own `config/qc` directory comes first so a deployment
/// can override the shared definitions in the data home's `qc/config`.
#[derive(Debug, Clone, Default)]
pub struct QcResolver {
    search_dirs: Vec<PathBuf>,
}

impl QcResolver {
    /// Creates a resolver over `search_dirs`, searched in order.
    #[must_use]
    pub const fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Creates a resolver for a deployment, followed by `extra` directories.
    #[must_use]
    pub fn for_deployment(deployment: &Deployment, extra: &[PathBuf]) -> Self {
        let mut dirs = vec![
            deployment.qc_config_dir(),
            deployment.global_qc_config_dir(),
        ];
        dirs.extend_from_slice(extra);
        Self::new(dirs)
    }

    /// Appends a search directory.
    pub fn push_dir(&mut self, dir: impl Into<PathBuf>) {
        self.search_dirs.push(dir.into());
    }

    /// Directories searched, in order.
    #[must_use]
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Returns the first existing file named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for names that contain `..` or
    /// escape the search directories, and [`ConfigError::MissingFile`] when
    /// no directory holds the file.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, ConfigError> {
        if name.contains("..") {
            return Err(ConfigError::InvalidValue {
                field: "runqc".to_string(),
                value: name.to_string(),
                expected: "file name without '..' traversal".to_string(),
            });
        }

        let path = Path::new(name);
        if path.is_absolute() {
            if !path.is_file() {
                return Err(ConfigError::MissingFile {
                    path: path.to_path_buf(),
                });
            }
            return if self.search_dirs.iter().any(|dir| is_within(path, dir)) {
                Ok(path.to_path_buf())
            } else {
                Err(ConfigError::InvalidValue {
                    field: "runqc".to_string(),
                    value: name.to_string(),
                    expected: "path within a QC search directory".to_string(),
                })
            };
        }

        for dir in &self.search_dirs {
            let candidate = dir.join(path);
            if candidate.is_file() && is_within(&candidate, dir) {
                tracing::debug!(name, path = %candidate.display(), "resolved QC definition");
                return Ok(candidate);
            }
        }

        Err(ConfigError::MissingFile {
            path: PathBuf::from(name),
        })
    }

    /// Resolves and parses `name`.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, or a [`ConfigError::ParseError`] if the
    /// file is not a valid QC definition.
    pub fn load(&self, name: &str) -> Result<ResolvedQc, ConfigError> {
        let path = self.resolve(name)?;
        let definition = load_qc_definition(&path)?;
        Ok(ResolvedQc {
            name: name.to_string(),
            path,
            definition,
        })
    }

    /// Lists definition files (`*.yml`, `*.yaml`) per search directory.
    ///
    /// Directories that do not exist are listed with no files.
    #[must_use]
    pub fn list(&self) -> Vec<(PathBuf, Vec<QcDefinitionFile>)> {
        self.search_dirs
            .iter()
            .map(|dir| (dir.clone(), list_definitions(dir)))
            .collect()
    }
}

fn list_definitions(dir: &Path) -> Vec<QcDefinitionFile> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let mut files: Vec<QcDefinitionFile> = ["yml", "yaml"]
        .iter()
        .filter_map(|ext| glob::glob(&format!("{escaped}/*.{ext}")).ok())
        .flatten()
        .filter_map(Result::ok)
        .filter(|p| p.is_file())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            Some(QcDefinitionFile { name, path })
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

/// Returns `true` if `path` resolves to a location under `base`.
///
/// Both sides are canonicalized so symlinks cannot escape the base.
fn is_within(path: &Path, base: &Path) -> bool {
    let Ok(canonical) = path.canonicalize() else {
        return false;
    };
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    canonical.starts_with(canonical_base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DEFINITION: &str = "qartod:\n  gross_range_test:\n    fail_span: [0, 14]\n";

    fn two_dirs() -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let deployment = tmp.path().join("deployment");
        let global = tmp.path().join("global");
        fs::create_dir_all(&deployment).unwrap();
        fs::create_dir_all(&global).unwrap();
        (tmp, deployment, global)
    }

    #[test]
    fn test_first_directory_wins() {
        let (_tmp, deployment, global) = two_dirs();
        fs::write(deployment.join("ph_qartod.yml"), DEFINITION).unwrap();
        fs::write(global.join("ph_qartod.yml"), DEFINITION).unwrap();

        let resolver = QcResolver::new(vec![deployment.clone(), global]);
        let path = resolver.resolve("ph_qartod.yml").unwrap();
        assert_eq!(path, deployment.join("ph_qartod.yml"));
    }

    #[test]
    fn test_falls_back_to_later_directory() {
        let (_tmp, deployment, global) = two_dirs();
        fs::write(global.join("ta_qartod.yml"), DEFINITION).unwrap();

        let resolver = QcResolver::new(vec![deployment, global.clone()]);
        assert_eq!(
            resolver.resolve("ta_qartod.yml").unwrap(),
            global.join("ta_qartod.yml")
        );
    }

    #[test]
    fn test_missing_file() {
        let (_tmp, deployment, global) = two_dirs();
        let resolver = QcResolver::new(vec![deployment, global]);
        assert!(matches!(
            resolver.resolve("nope.yml"),
            Err(ConfigError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_rejects_traversal() {
        let (_tmp, deployment, _global) = two_dirs();
        let resolver = QcResolver::new(vec![deployment]);
        assert!(matches!(
            resolver.resolve("../global/ph_qartod.yml"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_rejects_absolute_path_outside_search_dirs() {
        let (tmp, deployment, _global) = two_dirs();
        let outside = tmp.path().join("outside.yml");
        fs::write(&outside, DEFINITION).unwrap();

        let resolver = QcResolver::new(vec![deployment.clone()]);
        assert!(matches!(
            resolver.resolve(outside.to_str().unwrap()),
            Err(ConfigError::InvalidValue { .. })
        ));

        let inside = deployment.join("inside.yml");
        fs::write(&inside, DEFINITION).unwrap();
        assert_eq!(resolver.resolve(inside.to_str().unwrap()).unwrap(), inside);
    }

    #[test]
    fn test_load_parses_definition() {
        let (_tmp, deployment, _global) = two_dirs();
        fs::write(deployment.join("ph_qartod.yml"), DEFINITION).unwrap();
        let resolver = QcResolver::new(vec![deployment]);

        let resolved = resolver.load("ph_qartod.yml").unwrap();
        assert_eq!(resolved.name, "ph_qartod.yml");
        assert_eq!(resolved.definition.test_count(), 1);
    }

    #[test]
    fn test_list_definitions() {
        let (_tmp, deployment, global) = two_dirs();
        fs::write(deployment.join("b.yaml"), DEFINITION).unwrap();
        fs::write(deployment.join("a.yml"), DEFINITION).unwrap();
        fs::write(deployment.join("notes.txt"), "x").unwrap();

        let resolver = QcResolver::new(vec![deployment, global.join("missing")]);
        let listing = resolver.list();
        let names: Vec<_> = listing[0].1.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.yml", "b.yaml"]);
        assert!(listing[1].1.is_empty());
    }
}
