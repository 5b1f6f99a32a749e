//! [`RoleClassifier`] backed by the `claude` CLI.

use super::prompt::build_prompt;
use super::{ClassifyError, FileDescriptor, RoleClassifier};
use crate::config::ClassifierConfig;
use crate::project::Role;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Check if the claude CLI is available
pub fn check_claude_available() -> bool {
    find_claude_executable().is_some()
}

/// Locate the claude executable on `PATH`, then in `~/.local/bin`.
pub fn find_claude_executable() -> Option<PathBuf> {
    let (lookup, names): (&str, &[&str]) = if cfg!(target_os = "windows") {
        ("where", &["claude.exe", "claude.cmd", "claude.bat"])
    } else {
        ("which", &["claude"])
    };

    names
        .iter()
        .find_map(|name| {
            let output = Command::new(lookup).arg(name).output().ok()?;
            if !output.status.success() {
                return None;
            }
            let stdout = String::from_utf8_lossy(&output.stdout);
            let first = stdout.lines().next()?.trim();
            (!first.is_empty()).then(|| PathBuf::from(first))
        })
        .or_else(local_bin_claude)
}

// GUI launchers often start with a PATH that misses ~/.local/bin
#[cfg(not(target_os = "windows"))]
fn local_bin_claude() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os("HOME")?).join(".local/bin/claude");
    path.is_file().then_some(path)
}

#[cfg(target_os = "windows")]
fn local_bin_claude() -> Option<PathBuf> {
    None
}

/// Classifies files by prompting a Claude model.
#[derive(Debug, Clone)]
pub struct ClaudeRoleClassifier {
    model: String,
    context_tokens: usize,
    custom_command: Option<String>,
    cwd: PathBuf,
}

impl ClaudeRoleClassifier {
    pub fn new(model: impl Into<String>, context_tokens: usize) -> Self {
        Self {
            model: model.into(),
            context_tokens,
            custom_command: None,
            cwd: PathBuf::from("."),
        }
    }

    /// Run `command` instead of the claude CLI. The prompt arrives on stdin.
    ///
    /// The command is split on whitespace and executed directly, not through a
    /// shell. Only set it from trusted configuration.
    #[must_use]
    pub fn with_custom_command(mut self, command: Option<String>) -> Self {
        self.custom_command = command;
        self
    }

    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// The default-context model from `config`.
    pub fn default_context(config: &ClassifierConfig) -> Self {
        Self::from_config(config, &config.model, config.context_tokens)
    }

    /// The long-context model from `config`.
    pub fn long_context(config: &ClassifierConfig) -> Self {
        Self::from_config(config, &config.long_context_model, config.long_context_tokens)
    }

    fn from_config(config: &ClassifierConfig, model: &str, context_tokens: usize) -> Self {
        let classifier = Self::new(model, context_tokens)
            .with_custom_command(config.custom_command.clone());
        match &config.project_root {
            Some(root) => classifier.with_cwd(root),
            None => classifier,
        }
    }
}

impl RoleClassifier for ClaudeRoleClassifier {
    fn name(&self) -> &str {
        &self.model
    }

    fn context_tokens(&self) -> usize {
        self.context_tokens
    }

    fn classify(&self, files: &[FileDescriptor]) -> Result<HashMap<PathBuf, Role>, ClassifyError> {
        if files.is_empty() {
            return Ok(HashMap::new());
        }
        let prompt = build_prompt(files);
        let mut command = model_command(&self.model, self.custom_command.as_deref())?;
        let output = run_with_stdin(command.current_dir(&self.cwd), &prompt)?;
        parse_roles(&output, files)
    }
}

/// The process to run for one batch: the custom command split on
/// whitespace, or `claude --print` for `model`.
fn model_command(model: &str, custom_command: Option<&str>) -> Result<Command, ClassifyError> {
    if let Some(custom) = custom_command {
        let mut parts = custom.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ClassifyError::CommandFailed("Custom command is empty".to_owned()))?;
        let mut command = Command::new(program);
        command.args(parts);
        return Ok(command);
    }

    let claude = find_claude_executable().ok_or(ClassifyError::ClaudeNotFound)?;
    let mut command = Command::new(claude);
    command
        .args(["--print", "--model", model, "--setting-sources", ""])
        .args(["--disable-slash-commands", "--strict-mcp-config"])
        .env_remove("CLAUDECODE");
    Ok(command)
}

/// Pipe `prompt` into `command` and return its stdout.
///
/// The prompt goes over stdin so large batches never hit argument length
/// limits.
fn run_with_stdin(command: &mut Command, prompt: &str) -> Result<String, ClassifyError> {
    debug!(
        "[run_with_stdin] {:?}, prompt_chars={}",
        command.get_program(),
        prompt.len()
    );

    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ClassifyError::CommandFailed(e.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(prompt.as_bytes()).map_err(|e| {
            ClassifyError::CommandFailed(format!("Failed to write prompt to stdin: {e}"))
        })?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| ClassifyError::CommandFailed(e.to_string()))?;
    if !output.status.success() {
        return Err(ClassifyError::CommandFailed(failure_detail(&output)));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        warn!("[run_with_stdin] stderr from a successful run: {}", stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if stdout.trim().is_empty() {
        return Err(ClassifyError::EmptyResponse);
    }
    Ok(stdout)
}

/// Best description of a failed run: stderr, else stdout, else the exit status.
fn failure_detail(output: &Output) -> String {
    [&output.stderr, &output.stdout]
        .into_iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_owned())
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| match output.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "killed by signal".to_owned(),
        })
}

/// Slice the JSON object out of model output that may wrap it in a
/// markdown fence or prose.
fn json_object(output: &str) -> Result<&str, ClassifyError> {
    let body = fenced_body(output)
        .filter(|body| body.contains('{'))
        .unwrap_or(output);
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&body[start..=end]),
        _ => Err(ClassifyError::ParseError(format!(
            "No JSON object in output: {}",
            truncate(output.trim(), 200)
        ))),
    }
}

/// Contents of the first ``` fence, without its info string line.
fn fenced_body(output: &str) -> Option<&str> {
    let (_, rest) = output.split_once("```")?;
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    Some(rest.split_once("```").map_or(rest, |(body, _)| body))
}

/// Parse a `{ "path": "role" }` response for the requested `files`.
///
/// Paths that were not requested are skipped before their role is checked.
fn parse_roles(
    output: &str,
    files: &[FileDescriptor],
) -> Result<HashMap<PathBuf, Role>, ClassifyError> {
    let json = json_object(output)?;
    let parsed: HashMap<String, String> = serde_json::from_str(json).map_err(|e| {
        ClassifyError::ParseError(format!("JSON parse error: {e}. Input: {}", truncate(json, 500)))
    })?;

    let requested: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
    let mut roles = HashMap::with_capacity(files.len());
    for (path, role) in parsed {
        let path = PathBuf::from(path);
        if !requested.contains(path.as_path()) {
            debug!("[parse_roles] skipping unrequested path {}", path.display());
            continue;
        }
        match role.parse::<Role>() {
            Ok(parsed_role) => {
                roles.insert(path, parsed_role);
            }
            Err(_) => return Err(ClassifyError::InvalidRole { path, role }),
        }
    }
    Ok(roles)
}

/// Truncate on a character boundary.
fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requested(paths: &[&str]) -> Vec<FileDescriptor> {
        paths.iter().map(|p| FileDescriptor::new(*p)).collect()
    }

    #[test]
    fn test_parse_roles_plain_json() {
        let output = r#"{"src/main.rs": "source", "README.md": "documentation"}"#;
        let roles = parse_roles(output, &requested(&["src/main.rs", "README.md"])).unwrap();
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[Path::new("src/main.rs")], Role::Source);
        assert_eq!(roles[Path::new("README.md")], Role::Documentation);
    }

    #[test]
    fn test_parse_roles_from_markdown() {
        let output = r#"Here are the roles:

```json
{
  "/foo/bar.py": "source",
  "Dockerfile": "build or deployment"
}
```

Done."#;
        let roles = parse_roles(output, &requested(&["/foo/bar.py", "Dockerfile"])).unwrap();
        assert_eq!(roles[Path::new("/foo/bar.py")], Role::Source);
        assert_eq!(roles[Path::new("Dockerfile")], Role::BuildOrDeployment);
    }

    #[test]
    fn test_parse_roles_surrounded_by_prose() {
        let output = r#"Sure. {"tests/test_a.py": "Testing"} Let me know."#;
        let roles = parse_roles(output, &requested(&["tests/test_a.py"])).unwrap();
        assert_eq!(roles[Path::new("tests/test_a.py")], Role::Testing);
    }

    #[test]
    fn test_parse_roles_from_fence_without_language() {
        let output = "```\n{\"Makefile\": \"build or deployment\"}\n```";
        let roles = parse_roles(output, &requested(&["Makefile"])).unwrap();
        assert_eq!(roles[Path::new("Makefile")], Role::BuildOrDeployment);
    }

    #[test]
    fn test_parse_roles_skips_unrequested_paths() {
        let output = r#"{"a.rs": "source", "extra.rs": "rust code"}"#;
        let roles = parse_roles(output, &requested(&["a.rs"])).unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[Path::new("a.rs")], Role::Source);
    }

    #[test]
    fn test_parse_roles_rejects_unknown_role() {
        let err = parse_roles(r#"{"a.rs": "rust code"}"#, &requested(&["a.rs"])).unwrap_err();
        match err {
            ClassifyError::InvalidRole { path, role } => {
                assert_eq!(path, PathBuf::from("a.rs"));
                assert_eq!(role, "rust code");
            }
            other => panic!("Wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_parse_roles_no_json() {
        let err = parse_roles("I cannot help with that.", &requested(&["a.rs"])).unwrap_err();
        assert!(matches!(err, ClassifyError::ParseError(_)));
    }

    #[test]
    fn test_parse_roles_wrong_shape() {
        let err = parse_roles(r#"{"a.rs": ["source"]}"#, &requested(&["a.rs"])).unwrap_err();
        assert!(matches!(err, ClassifyError::ParseError(_)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn test_empty_custom_command() {
        let classifier = ClaudeRoleClassifier::new("haiku", 4_096)
            .with_custom_command(Some("   ".to_owned()));
        let err = classifier
            .classify(&[FileDescriptor::new("a.rs")])
            .unwrap_err();
        assert!(matches!(err, ClassifyError::CommandFailed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_custom_command_receives_prompt_on_stdin() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("fake-model.sh");
        // Answers for the one path the prompt mentions, proving stdin was read
        std::fs::write(
            &script,
            "#!/bin/sh\nif grep -q 'lib/util.rs'; then echo '{\"lib/util.rs\": \"source\"}'; fi\n",
        )
        .unwrap();

        let classifier = ClaudeRoleClassifier::new("unused", 4_096)
            .with_custom_command(Some(format!("sh {}", script.display())))
            .with_cwd(dir.path());
        let roles = classifier
            .classify(&[FileDescriptor::new("lib/util.rs")])
            .unwrap();
        assert_eq!(roles[Path::new("lib/util.rs")], Role::Source);
    }

    #[cfg(unix)]
    #[test]
    fn test_custom_command_failure_is_reported() {
        let classifier = ClaudeRoleClassifier::new("unused", 4_096)
            .with_custom_command(Some("sh -c false".to_owned()));
        let err = classifier
            .classify(&[FileDescriptor::new("a.rs")])
            .unwrap_err();
        assert!(matches!(err, ClassifyError::CommandFailed(_)));
    }
}
