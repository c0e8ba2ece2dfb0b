use std::process::Command;

use anyhow::{Context, Result, bail};
use tempfile::Builder;

const TEMPLATE: &str = "# \n\n\
<!-- First heading line is the title, the rest becomes the description. -->\n";

/// A task drafted in $EDITOR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
}

/// Opens $EDITOR on a markdown template. `None` means the user saved nothing.
pub fn draft_task() -> Result<Option<TaskDraft>> {
    match edit_in_editor(TEMPLATE, "md")? {
        Some(content) => Ok(parse_draft(&content)),
        None => Ok(None),
    }
}

pub fn edit_in_editor(initial_content: &str, file_extension: &str) -> Result<Option<String>> {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    let temp_file = Builder::new()
        .prefix("bimboard-")
        .suffix(&format!(".{}", file_extension))
        .tempfile()?;
    std::fs::write(temp_file.path(), initial_content)?;

    let status = Command::new(&editor)
        .arg(temp_file.path())
        .status()
        .with_context(|| format!("failed to launch editor '{}'", editor))?;

    if !status.success() {
        bail!("editor '{}' exited with {}", editor, status);
    }

    let content = std::fs::read_to_string(temp_file.path())?;
    if content.trim() == initial_content.trim() {
        return Ok(None);
    }

    Ok(Some(content))
}

pub fn parse_draft(content: &str) -> Option<TaskDraft> {
    let mut lines = content
        .lines()
        .filter(|line| !line.trim_start().starts_with("<!--"));

    let title = lines
        .by_ref()
        .map(|line| line.trim().trim_start_matches('#').trim())
        .find(|line| !line.is_empty())?
        .to_string();

    let description = lines.collect::<Vec<_>>().join("\n").trim().to_string();

    Some(TaskDraft {
        title,
        description: (!description.is_empty()).then_some(description),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_title_and_description() {
        let draft = parse_draft("# Pour slab L3\n\nCheck rebar first.\nThen pour.\n").unwrap();
        assert_eq!(draft.title, "Pour slab L3");
        assert_eq!(draft.description.as_deref(), Some("Check rebar first.\nThen pour."));
    }

    #[test]
    fn test_untouched_template_has_no_title() {
        assert_eq!(parse_draft(TEMPLATE), None);
    }

    #[test]
    fn test_plain_first_line_is_title() {
        let draft = parse_draft("\n  Fix clash report  \n").unwrap();
        assert_eq!(draft.title, "Fix clash report");
        assert_eq!(draft.description, None);
    }
}
