use crate::classify::{
    check_claude_available, classify_files, ClaudeRoleClassifier, RoleClassifier,
    StaticRoleClassifier,
};
use crate::cli::OutputFormat;
use crate::config::{ClassifierConfig, DEFAULT_CONFIG_FILE};
use crate::error::AppError;
use crate::project::scan::{scan_project, ScanOptions};
use crate::project::{store, ProjectFile, Role};
use colored::Colorize;
use log::info;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Flag values from `diary classify`; `None` keeps the config value.
#[derive(Debug, Default)]
pub struct ClassifyArgs {
    pub config: Option<String>,
    pub model: Option<String>,
    pub long_model: Option<String>,
    pub concurrency: Option<usize>,
    pub batch_size: Option<usize>,
    pub excerpt_chars: Option<usize>,
    pub command: Option<String>,
    pub offline: bool,
    pub hidden: bool,
}

impl ClassifyArgs {
    fn resolve_config(&self, root: &Path) -> Result<ClassifierConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => ClassifierConfig::load(Path::new(path))?,
            None => ClassifierConfig::load_for_project(root)?,
        };
        config.project_root = Some(root.to_path_buf());

        if let Some(model) = &self.model {
            config.model.clone_from(model);
        }
        if let Some(long_model) = &self.long_model {
            config.long_context_model.clone_from(long_model);
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrent = concurrency;
        }
        if let Some(batch_size) = self.batch_size {
            config.max_batch_files = batch_size;
        }
        if let Some(excerpt_chars) = self.excerpt_chars {
            config.excerpt_chars = excerpt_chars;
        }
        if self.command.is_some() {
            config.custom_command.clone_from(&self.command);
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn run(
    root: &Path,
    map_path: &Path,
    args: ClassifyArgs,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = args.resolve_config(root)?;

    let (model, long_context_model): (Arc<dyn RoleClassifier>, Arc<dyn RoleClassifier>) =
        if args.offline {
            let rules: Arc<dyn RoleClassifier> = Arc::new(StaticRoleClassifier::default());
            (Arc::clone(&rules), rules)
        } else {
            if config.custom_command.is_none() && !check_claude_available() {
                return Err(AppError::classification(
                    "Claude CLI not found. Please install: npm install -g @anthropic-ai/claude-code, or use --offline",
                ));
            }
            (
                Arc::new(ClaudeRoleClassifier::default_context(&config)),
                Arc::new(ClaudeRoleClassifier::long_context(&config)),
            )
        };

    let options = ScanOptions {
        exclude: vec![map_path.to_path_buf(), root.join(DEFAULT_CONFIG_FILE)],
        include_hidden: args.hidden,
    };
    let files = scan_project(root, &options)?;
    let total = files.len();

    // Loaded up front only to report how many entries were reused
    let previous: HashMap<_, _> = store::load(map_path)?
        .into_iter()
        .map(|f| (f.path.clone(), f))
        .collect();
    let reused = files
        .iter()
        .filter(|f| previous.get(&f.path).is_some_and(|p| f.is_unchanged_from(p)))
        .count();

    info!(
        "[classify] root={}, map={}, model={}, long_context_model={}",
        root.display(),
        map_path.display(),
        model.name(),
        long_context_model.name()
    );

    let rt = tokio::runtime::Runtime::new()?;
    let project_map = rt.block_on(classify_files(
        map_path,
        files,
        model,
        long_context_model,
        &config,
    ))?;

    let counts = count_roles(&project_map);

    if format == OutputFormat::Json {
        let output = serde_json::json!({
            "message": "Classification complete",
            "map": map_path.display().to_string(),
            "total": total,
            "classified": total - reused,
            "reused": reused,
            "roles": counts.iter().map(|(role, count)| (role.as_str(), *count)).collect::<BTreeMap<_, _>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).map_err(|e| AppError::io(e.to_string()))?
        );
    } else {
        println!(
            "{} Classified {} files ({} reused from {})",
            "✓".green(),
            total - reused,
            reused,
            map_path.display()
        );

        if !counts.is_empty() {
            println!();
            println!("{}", "Roles:".bold());
            let mut sorted: Vec<_> = counts.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (role, count) in sorted {
                println!("  {} {}", role.as_str().cyan(), format!("({count})").dimmed());
            }
        }
    }

    Ok(())
}

fn count_roles(files: &[ProjectFile]) -> BTreeMap<Role, usize> {
    let mut counts = BTreeMap::new();
    for role in files.iter().filter_map(|f| f.role) {
        *counts.entry(role).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"{"model": "opus", "max_concurrent": 8}"#,
        )
        .unwrap();

        let args = ClassifyArgs {
            model: Some("haiku".to_owned()),
            batch_size: Some(3),
            ..ClassifyArgs::default()
        };
        let config = args.resolve_config(dir.path()).unwrap();
        assert_eq!(config.model, "haiku");
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.max_batch_files, 3);
        assert_eq!(config.project_root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = TempDir::new().unwrap();
        let args = ClassifyArgs {
            concurrency: Some(0),
            ..ClassifyArgs::default()
        };
        assert!(matches!(
            args.resolve_config(dir.path()),
            Err(AppError::Config { .. })
        ));
    }

    #[test]
    fn test_offline_run_writes_map() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(dir.path().join("README.md"), "# demo\n").unwrap();
        let map_path = dir.path().join("project_map.json");

        let args = ClassifyArgs {
            offline: true,
            ..ClassifyArgs::default()
        };
        run(dir.path(), &map_path, args, OutputFormat::Json).unwrap();

        let map = store::load(&map_path).unwrap();
        assert_eq!(
            map,
            vec![
                ProjectFile {
                    role: Some(Role::Documentation),
                    ..map[0].clone()
                },
                ProjectFile {
                    role: Some(Role::Source),
                    ..map[1].clone()
                },
            ]
        );
        assert_eq!(map[0].path, Path::new("README.md"));
        assert_eq!(map[1].path, Path::new("src").join("main.rs"));
    }

    #[test]
    fn test_hidden_flag_classifies_dotfiles() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.py"), "print(1)\n").unwrap();
        fs::write(dir.path().join(".editorconfig"), "root = true\n").unwrap();
        let map_path = dir.path().join("project_map.json");

        let args = ClassifyArgs {
            offline: true,
            hidden: true,
            ..ClassifyArgs::default()
        };
        run(dir.path(), &map_path, args, OutputFormat::Json).unwrap();

        let map = store::load(&map_path).unwrap();
        assert_eq!(
            map,
            vec![
                ProjectFile {
                    role: Some(Role::Configuration),
                    ..map[0].clone()
                },
                ProjectFile {
                    role: Some(Role::Source),
                    ..map[1].clone()
                },
            ]
        );
        assert_eq!(map[0].path, Path::new(".editorconfig"));
    }
}
