use crate::cli::OutputFormat;
use crate::error::AppError;
use crate::project::Role;
use colored::Colorize;

pub fn run(format: OutputFormat) -> Result<(), AppError> {
    if format == OutputFormat::Json {
        let output: Vec<_> = Role::ALL
            .iter()
            .map(|role| {
                serde_json::json!({
                    "id": role.as_str(),
                    "description": role.description(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output).map_err(|e| AppError::io(e.to_string()))?
        );
        return Ok(());
    }

    for role in Role::ALL {
        println!("  {} {}", role.as_str().cyan(), role.description().dimmed());
    }
    Ok(())
}
