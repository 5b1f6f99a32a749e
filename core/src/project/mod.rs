//! Project file records and the role taxonomy.

pub mod scan;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub use scan::{scan_project, ScanError, ScanOptions};
pub use store::{FileClassificationList, StoreError};

/// The bounded set of labels a file can be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "source")]
    Source,
    #[serde(rename = "configuration")]
    Configuration,
    #[serde(rename = "build or deployment")]
    BuildOrDeployment,
    #[serde(rename = "documentation")]
    Documentation,
    #[serde(rename = "testing")]
    Testing,
    #[serde(rename = "database")]
    Database,
    #[serde(rename = "utility scripts")]
    UtilityScripts,
    #[serde(rename = "assets or data")]
    AssetsOrData,
    #[serde(rename = "specifications")]
    Specifications,
    #[serde(rename = "other")]
    Other,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::Source,
        Role::Configuration,
        Role::BuildOrDeployment,
        Role::Documentation,
        Role::Testing,
        Role::Database,
        Role::UtilityScripts,
        Role::AssetsOrData,
        Role::Specifications,
        Role::Other,
    ];

    /// The label as it appears in the project map and in model responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Configuration => "configuration",
            Role::BuildOrDeployment => "build or deployment",
            Role::Documentation => "documentation",
            Role::Testing => "testing",
            Role::Database => "database",
            Role::UtilityScripts => "utility scripts",
            Role::AssetsOrData => "assets or data",
            Role::Specifications => "specifications",
            Role::Other => "other",
        }
    }

    /// One-line description shown to the model and in `diary roles`.
    pub fn description(self) -> &'static str {
        match self {
            Role::Source => "application or library code that implements the project's behavior",
            Role::Configuration => "settings, manifests and tool configuration",
            Role::BuildOrDeployment => "build scripts, CI pipelines, containers and packaging",
            Role::Documentation => "READMEs, guides, changelogs and other prose for humans",
            Role::Testing => "test code, fixtures and test harnesses",
            Role::Database => "schemas, migrations and queries",
            Role::UtilityScripts => "standalone helper scripts not part of the main program",
            Role::AssetsOrData => "images, fonts, datasets and other static content",
            Role::Specifications => "API definitions, protocol specs and design documents",
            Role::Other => "anything that fits none of the other roles",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| UnknownRole(s.to_owned()))
    }
}

/// A single file in the project and the role assigned to it, if any.
///
/// Field order is the serialized order in the project map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    pub path: PathBuf,
    pub modified: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl ProjectFile {
    pub fn new(path: impl Into<PathBuf>, modified: i64) -> Self {
        Self {
            path: path.into(),
            modified,
            role: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Whether `previous` can be reused for this file without asking the model again.
    pub fn is_unchanged_from(&self, previous: &ProjectFile) -> bool {
        previous.path == self.path && previous.modified == self.modified && previous.role.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("Source".parse::<Role>().unwrap(), Role::Source);
        assert_eq!(
            "  build or deployment ".parse::<Role>().unwrap(),
            Role::BuildOrDeployment
        );
        assert!("sauce".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_as_label() {
        let json = serde_json::to_string(&Role::UtilityScripts).unwrap();
        assert_eq!(json, "\"utility scripts\"");
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn test_project_file_omits_missing_role() {
        let file = ProjectFile::new("/README.md", 0);
        let json = serde_json::to_string(&file).unwrap();
        assert_eq!(json, r#"{"path":"/README.md","modified":0}"#);

        let file = file.with_role(Role::Documentation);
        let json = serde_json::to_string(&file).unwrap();
        assert_eq!(
            json,
            r#"{"path":"/README.md","modified":0,"role":"documentation"}"#
        );
    }

    #[test]
    fn test_is_unchanged_from() {
        let current = ProjectFile::new("src/main.rs", 10);
        let classified = ProjectFile::new("src/main.rs", 10).with_role(Role::Source);
        assert!(current.is_unchanged_from(&classified));

        // A map entry without a role still needs a model call
        assert!(!current.is_unchanged_from(&ProjectFile::new("src/main.rs", 10)));

        let touched = ProjectFile::new("src/main.rs", 11);
        assert!(!touched.is_unchanged_from(&classified));
    }
}
