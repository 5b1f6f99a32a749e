use super::FileDescriptor;
use crate::project::Role;
use std::fmt::Write;

/// Build a flat list of all valid roles with descriptions.
fn build_roles_string() -> String {
    let mut result = String::new();
    for role in Role::ALL {
        let _ = writeln!(result, "- `{}`: {}", role.as_str(), role.description());
    }
    result
}

/// Render the prompt section for a single file.
pub fn render_descriptor(descriptor: &FileDescriptor) -> String {
    let path = descriptor.path.to_string_lossy();
    match &descriptor.excerpt {
        Some(excerpt) => format!("### {path}\n```\n{excerpt}\n```\n\n"),
        None => format!("- {path}\n"),
    }
}

/// Build a prompt asking for one role per file.
pub fn build_prompt(files: &[FileDescriptor]) -> String {
    let roles = build_roles_string();

    let mut files_section = String::new();
    for descriptor in files {
        files_section.push_str(&render_descriptor(descriptor));
    }

    format!(
        r#"Classify each file of a software project by the role it plays in the project.

# Valid Roles (use ONLY these exact strings)

{roles}
# Rules

1. Assign exactly ONE role to EVERY file listed below.
2. Judge by the path first; use the content excerpt, when given, to break ties.
3. Use the file's path exactly as written as the JSON key.
4. Use ONLY the exact role strings listed above. When unsure, use `other`.

# Files

{files_section}
# Response

Return a single JSON object mapping each file path to its role, and nothing else:
{{
  "path/to/file": "role",
  ...
}}"#
    )
}
