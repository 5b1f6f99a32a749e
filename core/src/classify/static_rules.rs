//! Static role classifier using path-based rules.
//!
//! Decides a role from directory names, file names and extensions without
//! any external calls. Used for offline runs and as a deterministic model.

use super::{ClassifyError, FileDescriptor, RoleClassifier};
use crate::project::Role;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "testdata", "fixtures"];

const BUILD_FILE_NAMES: &[&str] = &[
    "Dockerfile",
    "Containerfile",
    "Makefile",
    "CMakeLists.txt",
    "Jenkinsfile",
    "Procfile",
    "Justfile",
    "build.rs",
    "build.gradle",
    "pom.xml",
    "docker-compose.yml",
    "docker-compose.yaml",
    "Cargo.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
];

const BUILD_DIRS: &[&str] = &[".github", ".circleci", "ci", "deploy", "k8s", "helm"];

const DOC_FILE_STEMS: &[&str] = &["README", "CHANGELOG", "LICENSE", "CONTRIBUTING", "AUTHORS"];

const DOC_DIRS: &[&str] = &["docs", "doc"];

const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "adoc", "txt"];

const SPEC_EXTENSIONS: &[&str] = &["proto", "graphql", "gql", "thrift", "avsc", "wsdl"];

const SPEC_FILE_STEMS: &[&str] = &["openapi", "swagger", "asyncapi"];

const DATABASE_EXTENSIONS: &[&str] = &["sql", "prisma", "db", "sqlite"];

const DATABASE_DIRS: &[&str] = &["migrations", "migration", "schema"];

const SCRIPT_EXTENSIONS: &[&str] = &["sh", "bash", "zsh", "ps1", "bat", "cmd"];

const SCRIPT_DIRS: &[&str] = &["scripts", "bin", "tools"];

const CONFIG_EXTENSIONS: &[&str] = &[
    "toml", "yaml", "yml", "json", "ini", "cfg", "conf", "env", "properties", "editorconfig",
];

const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "rs", "js", "jsx", "ts", "tsx", "mjs", "cjs", "go", "java", "kt", "scala", "c", "h",
    "cc", "cpp", "hpp", "cs", "rb", "php", "swift", "m", "ex", "exs", "erl", "hs", "ml", "clj",
    "lua", "r", "jl", "dart", "vue", "svelte", "html", "css", "scss", "sass", "less", "zig",
];

const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "bmp", "ttf", "otf", "woff", "woff2",
    "mp3", "wav", "mp4", "csv", "tsv", "parquet", "xlsx", "pdf", "zip", "bin",
];

const ASSET_DIRS: &[&str] = &["assets", "static", "data"];

/// Assign a role from the path alone.
pub fn classify_path(path: &Path) -> Role {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let dirs: Vec<String> = path
        .parent()
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
                .collect()
        })
        .unwrap_or_default();
    let in_dir = |names: &[&str]| dirs.iter().any(|d| names.contains(&d.as_str()));
    // Code under bin/ or schema/ is still source
    let is_source = SOURCE_EXTENSIONS.contains(&ext.as_str());

    if in_dir(TEST_DIRS) || is_test_file_name(&file_name) {
        return Role::Testing;
    }
    if BUILD_FILE_NAMES.contains(&file_name.as_str()) || in_dir(BUILD_DIRS) {
        return Role::BuildOrDeployment;
    }
    if SPEC_EXTENSIONS.contains(&ext.as_str())
        || SPEC_FILE_STEMS.contains(&stem.to_lowercase().as_str())
    {
        return Role::Specifications;
    }
    if DOC_FILE_STEMS.contains(&stem.to_uppercase().as_str())
        || DOC_EXTENSIONS.contains(&ext.as_str())
        || in_dir(DOC_DIRS)
    {
        return Role::Documentation;
    }
    if DATABASE_EXTENSIONS.contains(&ext.as_str()) || (!is_source && in_dir(DATABASE_DIRS)) {
        return Role::Database;
    }
    if SCRIPT_EXTENSIONS.contains(&ext.as_str()) || (!is_source && in_dir(SCRIPT_DIRS)) {
        return Role::UtilityScripts;
    }
    if CONFIG_EXTENSIONS.contains(&ext.as_str()) || file_name.starts_with('.') {
        return Role::Configuration;
    }
    if is_source {
        return Role::Source;
    }
    if ASSET_EXTENSIONS.contains(&ext.as_str()) || in_dir(ASSET_DIRS) {
        return Role::AssetsOrData;
    }
    Role::Other
}

fn is_test_file_name(file_name: &str) -> bool {
    file_name.starts_with("test_")
        || file_name.contains("_test.")
        || file_name.contains(".test.")
        || file_name.contains(".spec.")
        || file_name.starts_with("conftest.")
}

/// A [`RoleClassifier`] that never leaves the process.
#[derive(Debug, Clone)]
pub struct StaticRoleClassifier {
    context_tokens: usize,
}

impl StaticRoleClassifier {
    pub fn new(context_tokens: usize) -> Self {
        Self { context_tokens }
    }
}

impl Default for StaticRoleClassifier {
    fn default() -> Self {
        Self::new(usize::MAX / 2)
    }
}

impl RoleClassifier for StaticRoleClassifier {
    fn name(&self) -> &str {
        "static"
    }

    fn context_tokens(&self) -> usize {
        self.context_tokens
    }

    fn classify(&self, files: &[FileDescriptor]) -> Result<HashMap<PathBuf, Role>, ClassifyError> {
        Ok(files
            .iter()
            .map(|f| (f.path.clone(), classify_path(&f.path)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(path: &str) -> Role {
        classify_path(Path::new(path))
    }

    #[test]
    fn test_source_files() {
        assert_eq!(role("/foo/bar.py"), Role::Source);
        assert_eq!(role("/foo/helloworld.py"), Role::Source);
        assert_eq!(role("src/lib.rs"), Role::Source);
        assert_eq!(role("web/App.tsx"), Role::Source);
        assert_eq!(role("src/bin/main.rs"), Role::Source);
        assert_eq!(role("src/schema/user.rs"), Role::Source);
        assert_eq!(role("tools/gen.py"), Role::Source);
    }

    #[test]
    fn test_documentation() {
        assert_eq!(role("/README.md"), Role::Documentation);
        assert_eq!(role("LICENSE"), Role::Documentation);
        assert_eq!(role("docs/architecture.png"), Role::Documentation);
        assert_eq!(role("notes.txt"), Role::Documentation);
    }

    #[test]
    fn test_testing_takes_priority() {
        assert_eq!(role("tests/test_classifier.py"), Role::Testing);
        assert_eq!(role("pkg/parser_test.go"), Role::Testing);
        assert_eq!(role("src/app.test.ts"), Role::Testing);
        assert_eq!(role("tests/fixtures/map.json"), Role::Testing);
    }

    #[test]
    fn test_build_and_config() {
        assert_eq!(role("Dockerfile"), Role::BuildOrDeployment);
        assert_eq!(role(".github/workflows/ci.yml"), Role::BuildOrDeployment);
        assert_eq!(role("Cargo.lock"), Role::BuildOrDeployment);
        assert_eq!(role("Cargo.toml"), Role::Configuration);
        assert_eq!(role("config/settings.yaml"), Role::Configuration);
        assert_eq!(role(".gitignore"), Role::Configuration);
    }

    #[test]
    fn test_remaining_roles() {
        assert_eq!(role("migrations/0001_init.sql"), Role::Database);
        assert_eq!(role("scripts/release.sh"), Role::UtilityScripts);
        assert_eq!(role("api/openapi.yaml"), Role::Specifications);
        assert_eq!(role("proto/service.proto"), Role::Specifications);
        assert_eq!(role("assets/logo.png"), Role::AssetsOrData);
        assert_eq!(role("data/train.csv"), Role::AssetsOrData);
        assert_eq!(role("mystery.xyz"), Role::Other);
    }

    #[test]
    fn test_classifier_returns_every_path() {
        let files = vec![FileDescriptor::new("a.py"), FileDescriptor::new("b.md")];
        let roles = StaticRoleClassifier::default().classify(&files).unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[Path::new("a.py")], Role::Source);
        assert_eq!(roles[Path::new("b.md")], Role::Documentation);
    }
}
