use crate::cli::OutputFormat;
use crate::error::AppError;
use crate::project::{store, ProjectFile, Role};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::Path;

pub fn run(map_path: &Path, role: Option<&str>, format: OutputFormat) -> Result<(), AppError> {
    let wanted = role
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|e| AppError::config(e.to_string()))?;

    if !map_path.exists() {
        return Err(AppError::storage(format!(
            "No project map at {}. Run 'diary classify' first.",
            map_path.display()
        )));
    }

    let files: Vec<ProjectFile> = store::load(map_path)?
        .into_iter()
        .filter(|f| wanted.is_none() || f.role == wanted)
        .collect();

    if format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&files).map_err(|e| AppError::io(e.to_string()))?
        );
        return Ok(());
    }

    let mut by_role: BTreeMap<Option<Role>, Vec<&ProjectFile>> = BTreeMap::new();
    for file in &files {
        by_role.entry(file.role).or_default().push(file);
    }

    for (i, (role, entries)) in by_role.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let heading = role.map_or("unclassified", Role::as_str);
        println!(
            "{} {}",
            heading.bold(),
            format!("({})", entries.len()).dimmed()
        );
        for file in entries {
            println!("  {}", file.path.display());
        }
    }

    Ok(())
}
