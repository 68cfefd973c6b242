//! Glider data-home layout.
//!
//! Deployments live under `$GLIDER_DATA_HOME/deployments/<year>/<name>`,
//! where `<name>` is `<glider>-<YYYYmmddTHHMM>`. NetCDF output for a
//! deployment is under `data/out/nc/<level>-<cdm_data_type>/<mode>`, and its
//! QC definitions under `config/qc`. Shared QC definitions live in
//! `$GLIDER_DATA_HOME/qc/config`.

use crate::error::DeploymentError;
use chrono::{Datelike, NaiveDateTime};
use gliderqc_core::config::{CdmDataType, DatasetLevel, DatasetMode};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Data home variable for production runs.
pub const DATA_HOME_VAR: &str = "GLIDER_DATA_HOME";

/// Data home variable for test runs.
pub const DATA_HOME_TEST_VAR: &str = "GLIDER_DATA_HOME_TEST";

const TRAJECTORY_FORMAT: &str = "%Y%m%dT%H%M";

static DEPLOYMENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)-(\d{8}T\d{4})").expect("valid regex"));

// ============================================================================
// Deployment Name
// ============================================================================

/// A deployment name: glider and trajectory start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentName {
    glider: String,
    trajectory: NaiveDateTime,
}

impl DeploymentName {
    /// Parses `ru30-20210503T1929`.
    ///
    /// Anything after the timestamp is ignored, so
    /// `ru30-20210503T1929-delayed` names the same deployment.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentError::InvalidName`] if no glider name and
    /// timestamp can be extracted, or the timestamp is not a valid time.
    pub fn parse(name: &str) -> Result<Self, DeploymentError> {
        let captures = DEPLOYMENT_NAME
            .captures(name)
            .ok_or_else(|| DeploymentError::InvalidName {
                name: name.to_string(),
                reason: "cannot pull glider name".to_string(),
            })?;

        let glider = captures[1].to_string();
        let trajectory = NaiveDateTime::parse_from_str(&captures[2], TRAJECTORY_FORMAT)
            .map_err(|e| DeploymentError::InvalidName {
                name: name.to_string(),
                reason: format!("invalid trajectory date {}: {e}", &captures[2]),
            })?;

        Ok(Self { glider, trajectory })
    }

    /// Glider name.
    #[must_use]
    pub fn glider(&self) -> &str {
        &self.glider
    }

    /// Trajectory start time.
    #[must_use]
    pub const fn trajectory(&self) -> NaiveDateTime {
        self.trajectory
    }

    /// Path of the deployment relative to `deployments/`.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.trajectory.year().to_string()).join(self.to_string())
    }
}

impl fmt::Display for DeploymentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.glider,
            self.trajectory.format(TRAJECTORY_FORMAT)
        )
    }
}

// ============================================================================
// Data Home
// ============================================================================

/// Root of the glider data tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataHome {
    root: PathBuf,
}

impl DataHome {
    /// Reads the data home from `GLIDER_DATA_HOME`, or
    /// `GLIDER_DATA_HOME_TEST` when `test` is set.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentError::DataHomeUnset`] if the variable is unset or
    /// empty, otherwise the errors of [`Self::open`].
    pub fn from_env(test: bool) -> Result<Self, DeploymentError> {
        let var = if test { DATA_HOME_TEST_VAR } else { DATA_HOME_VAR };
        let root = std::env::var_os(var)
            .filter(|v| !v.is_empty())
            .ok_or(DeploymentError::DataHomeUnset { var })?;
        Self::open(root)
    }

    /// Opens a data home at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentError::InvalidDirectory`] if `root` or its
    /// `deployments` directory does not exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DeploymentError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DeploymentError::InvalidDirectory {
                what: "data home",
                path: root,
            });
        }
        let home = Self { root };
        let deployments = home.deployments_root();
        if !deployments.is_dir() {
            return Err(DeploymentError::InvalidDirectory {
                what: "deployments root",
                path: deployments,
            });
        }
        Ok(home)
    }

    /// The data home directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<data home>/deployments`.
    #[must_use]
    pub fn deployments_root(&self) -> PathBuf {
        self.root.join("deployments")
    }

    /// Shared QC definitions, `<data home>/qc/config`.
    #[must_use]
    pub fn qc_config_dir(&self) -> PathBuf {
        self.root.join("qc").join("config")
    }

    /// Locates a deployment and its NetCDF data directory.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentError::LocationNotFound`] or
    /// [`DeploymentError::DataPathNotFound`] when the directories are
    /// missing.
    pub fn locate(
        &self,
        name: &DeploymentName,
        level: DatasetLevel,
        cdm_data_type: CdmDataType,
        mode: DatasetMode,
    ) -> Result<Deployment, DeploymentError> {
        let location = self.deployments_root().join(name.relative_path());
        if !location.is_dir() {
            return Err(DeploymentError::LocationNotFound { path: location });
        }

        let data_path = location
            .join("data")
            .join("out")
            .join("nc")
            .join(format!("{}-{}", level.as_str(), cdm_data_type.as_str()))
            .join(mode.as_str());
        if !data_path.is_dir() {
            return Err(DeploymentError::DataPathNotFound {
                deployment: name.to_string(),
                path: data_path,
            });
        }

        tracing::debug!(
            deployment = %name,
            location = %location.display(),
            data_path = %data_path.display(),
            "located deployment"
        );

        Ok(Deployment {
            name: name.clone(),
            location,
            data_path,
            global_qc_dir: self.qc_config_dir(),
        })
    }
}

// ============================================================================
// Deployment
// ============================================================================

/// A located deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    name: DeploymentName,
    location: PathBuf,
    data_path: PathBuf,
    global_qc_dir: PathBuf,
}

impl Deployment {
    /// Deployment name.
    #[must_use]
    pub const fn name(&self) -> &DeploymentName {
        &self.name
    }

    /// Deployment directory.
    #[must_use]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// NetCDF data directory for the selected level, data type and mode.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Deployment-specific QC definitions, `<location>/config/qc`.
    #[must_use]
    pub fn qc_config_dir(&self) -> PathBuf {
        self.location.join("config").join("qc")
    }

    /// Shared QC definitions of the data home.
    #[must_use]
    pub fn global_qc_config_dir(&self) -> PathBuf {
        self.global_qc_dir.clone()
    }
}
