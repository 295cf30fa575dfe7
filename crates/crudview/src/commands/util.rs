//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde_json::Value;

use crate::cli::{DataArgs, PageArgs};
use crate::error::CliError;
use crudview_core::{HttpMethod, RequestInput};

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: "delete".into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Record content from `--data` or `--from-file`, if either was given.
pub fn read_content(args: &DataArgs) -> Result<Option<Value>, CliError> {
    if let Some(ref raw) = args.data {
        return serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| CliError::Validation {
                field: "data".into(),
                reason: format!("invalid JSON: {e}"),
            });
    }
    args.from_file.as_deref().map(read_json_file).transpose()
}

/// Like [`read_content`], but the command cannot run without it.
pub fn require_content(args: &DataArgs) -> Result<Value, CliError> {
    read_content(args)?.ok_or_else(|| CliError::Validation {
        field: "data".into(),
        reason: "pass --data '<json>' or --from-file <path>".into(),
    })
}

/// Paging flags as a request input.
pub fn paged_input(paging: &PageArgs) -> RequestInput {
    let mut input = RequestInput::new().page(paging.page);
    if let Some(size) = paging.size {
        input = input.size(size);
    }
    if paging.get {
        input = input.method(HttpMethod::Get);
    }
    if let Some(ref target) = paging.target {
        input = input.target(target.clone());
    }
    input
}

pub fn with_target(input: RequestInput, target: Option<&str>) -> RequestInput {
    match target {
        Some(target) => input.target(target),
        None => input,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inline_data_is_parsed() {
        let args = DataArgs {
            data: Some(r#"{"id": 7}"#.into()),
            from_file: None,
        };
        assert_eq!(require_content(&args).unwrap()["id"], 7);
    }

    #[test]
    fn file_data_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");
        std::fs::write(&path, r#"{"name": "A"}"#).unwrap();
        let args = DataArgs {
            data: None,
            from_file: Some(path),
        };
        assert_eq!(read_content(&args).unwrap().unwrap()["name"], "A");
    }

    #[test]
    fn missing_data_is_a_validation_error() {
        let args = DataArgs {
            data: None,
            from_file: None,
        };
        assert!(matches!(
            require_content(&args),
            Err(CliError::Validation { .. })
        ));
        let bad = DataArgs {
            data: Some("{nope".into()),
            from_file: None,
        };
        assert!(read_content(&bad).is_err());
    }

    #[test]
    fn paging_flags_fill_the_input() {
        let paging = PageArgs {
            page: 3,
            size: Some(25),
            get: true,
            target: None,
        };
        let input = paged_input(&paging);
        assert_eq!(input.page, Some(3));
        assert_eq!(input.size, Some(25));
        assert_eq!(input.method, Some(HttpMethod::Get));
    }
}
