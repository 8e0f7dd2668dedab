use serde_json::{json, Value};

use crate::errors::EngineError;
use crate::models::ToolResult;
use crate::workspace::{DirEntry, Sandbox, WorkspaceBuffer, WorkspaceState};
use crate::workspace_tools::args::{optional_bool, optional_usize, required_str};
use crate::workspace_tools::safety::{normalize_file_path, normalize_path, truncate_string};

pub const MAX_CONTENT_CHARS: usize = 200_000;

pub fn create_file(state: &mut WorkspaceState, sandbox: &dyn Sandbox, args: &Value) -> Result<ToolResult, EngineError> {
    let path = normalize_file_path(required_str(args, "file_path")?)?;
    let content = required_str(args, "content")?;

    let old_content = state.buffer.write(&path, content);
    match old_content {
        Some(_) => sandbox.update_file(&path, content),
        None => sandbox.add_file(&path, content),
    }
    sandbox.rebuild();
    let marked = state.ledger.mark_dirty(&path, content);

    let created = old_content.is_none();
    let message = if created { format!("Created {}", path) } else { format!("Overwrote {}", path) };
    Ok(ToolResult::success(
        message,
        json!({
            "file_path": path,
            "created": created,
            "old_content": old_content,
            "new_content": content,
            "changed": marked,
        }),
    ))
}

pub fn edit_file(state: &mut WorkspaceState, sandbox: &dyn Sandbox, args: &Value) -> Result<ToolResult, EngineError> {
    let path = normalize_file_path(required_str(args, "file_path")?)?;
    let content = required_str(args, "content")?;

    if !state.buffer.contains(&path) {
        return Err(EngineError::not_found(format!("File not found: {}", path)));
    }

    let old_content = state.buffer.write(&path, content);
    sandbox.update_file(&path, content);
    sandbox.rebuild();
    let marked = state.ledger.mark_dirty(&path, content);

    Ok(ToolResult::success(
        format!("Edited {}", path),
        json!({
            "file_path": path,
            "old_content": old_content,
            "new_content": content,
            "changed": marked,
        }),
    ))
}

pub fn delete_file(state: &mut WorkspaceState, sandbox: &dyn Sandbox, args: &Value) -> Result<ToolResult, EngineError> {
    let path = normalize_file_path(required_str(args, "file_path")?)?;

    if !state.buffer.contains(&path) {
        return Err(EngineError::not_found(format!("File not found: {}", path)));
    }

    // Marked while the path still exists in the buffer.
    state.ledger.mark_deleted(&path);
    let old_content = state.buffer.remove(&path);
    sandbox.delete_file(&path);
    sandbox.rebuild();

    Ok(ToolResult::success(
        format!("Deleted {}", path),
        json!({
            "file_path": path,
            "old_content": old_content,
        }),
    ))
}

pub fn read_file(buffer: &WorkspaceBuffer, args: &Value) -> Result<ToolResult, EngineError> {
    let path = normalize_file_path(required_str(args, "target_file")?)?;
    let whole = optional_bool(args, "should_read_entire_file")?.unwrap_or(false);
    let start = optional_usize(args, "start_line_one_indexed")?;
    let end = optional_usize(args, "end_line_one_indexed_inclusive")?;

    let content = buffer
        .get(&path)
        .ok_or_else(|| EngineError::not_found(format!("File not found: {}", path)))?;
    let lines: Vec<&str> = content.lines().collect();
    let total_lines = lines.len();

    if whole || (start.is_none() && end.is_none()) {
        let (text, truncated) = truncate_string(content, MAX_CONTENT_CHARS);
        return Ok(ToolResult::success(
            format!("Read {} ({} lines)", path, total_lines),
            json!({
                "file_path": path,
                "content": text,
                "total_lines": total_lines,
                "truncated": truncated,
            }),
        ));
    }

    let start = start.unwrap_or(1);
    let end = end.unwrap_or(total_lines);
    if start == 0 {
        return Err(EngineError::validation("start_line_one_indexed must be at least 1"));
    }
    if end < start {
        return Err(EngineError::validation(format!(
            "end_line_one_indexed_inclusive ({}) is before start_line_one_indexed ({})",
            end, start
        )));
    }
    if end > total_lines {
        return Err(EngineError::validation(format!(
            "line range {}-{} is outside {} which has {} lines",
            start, end, path, total_lines
        )));
    }

    let selected = lines[start - 1..end].join("\n");
    let (text, truncated) = truncate_string(&selected, MAX_CONTENT_CHARS);
    Ok(ToolResult::success(
        format!("Read lines {}-{} of {}", start, end, path),
        json!({
            "file_path": path,
            "content": text,
            "start_line": start,
            "end_line": end,
            "total_lines": total_lines,
            "truncated": truncated,
        }),
    ))
}

pub fn list_dir(buffer: &WorkspaceBuffer, args: &Value) -> Result<ToolResult, EngineError> {
    let raw = args.get("relative_workspace_path").and_then(Value::as_str).unwrap_or("/");
    let path = normalize_path(raw)?;

    let entries = buffer.list_dir(&path);
    if entries.is_empty() && path != "/" {
        if buffer.contains(&path) {
            return Err(EngineError::validation(format!("{} is a file, not a directory", path)));
        }
        return Err(EngineError::not_found(format!("Directory not found: {}", path)));
    }

    let listed: Vec<Value> = entries
        .iter()
        .map(|entry| match entry {
            DirEntry::File { name, size } => json!({ "name": name, "type": "file", "size": size }),
            DirEntry::Directory { name } => json!({ "name": name, "type": "directory" }),
        })
        .collect();

    Ok(ToolResult::success(
        format!("{} entries in {}", listed.len(), path),
        json!({
            "path": path,
            "entries": listed,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::NullSandbox;

    fn state_with(files: &[(&str, &str)]) -> WorkspaceState {
        let mut state = WorkspaceState::default();
        for (path, content) in files {
            state.buffer.write(path, content);
            state.ledger.record_baseline(path, content);
        }
        state
    }

    #[test]
    fn create_then_edit_reports_created_content_as_old() {
        let mut state = WorkspaceState::default();
        create_file(&mut state, &NullSandbox, &json!({ "file_path": "/a.js", "content": "x" })).unwrap();
        let result = edit_file(&mut state, &NullSandbox, &json!({ "file_path": "a.js", "content": "y" })).unwrap();
        assert_eq!(result.detail("old_content"), Some(&json!("x")));
        assert_eq!(result.detail("new_content"), Some(&json!("y")));
        assert_eq!(state.ledger.dirty_paths(), vec!["/a.js".to_string()]);
    }

    #[test]
    fn edit_missing_file_is_not_found_and_leaves_ledger() {
        let mut state = WorkspaceState::default();
        let err = edit_file(&mut state, &NullSandbox, &json!({ "file_path": "/nope.js", "content": "y" })).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
        assert!(!state.ledger.has_pending());
        assert!(!state.buffer.contains("/nope.js"));
    }

    #[test]
    fn rewriting_identical_content_does_not_dirty() {
        let mut state = state_with(&[("/a.js", "same")]);
        let result = edit_file(&mut state, &NullSandbox, &json!({ "file_path": "/a.js", "content": "same" })).unwrap();
        assert_eq!(result.detail("changed"), Some(&json!(false)));
        assert!(!state.ledger.has_pending());
    }

    #[test]
    fn delete_requires_existing_file() {
        let mut state = state_with(&[("/a.js", "x")]);
        let err = delete_file(&mut state, &NullSandbox, &json!({ "file_path": "/b.js" })).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));

        let result = delete_file(&mut state, &NullSandbox, &json!({ "file_path": "/a.js" })).unwrap();
        assert_eq!(result.detail("old_content"), Some(&json!("x")));
        assert!(!state.buffer.contains("/a.js"));
        assert!(state.ledger.is_dirty("/a.js"));
    }

    #[test]
    fn read_file_line_ranges() {
        let state = state_with(&[("/a.js", "one\ntwo\nthree\n")]);
        let result = read_file(
            &state.buffer,
            &json!({ "target_file": "/a.js", "start_line_one_indexed": 2, "end_line_one_indexed_inclusive": 3 }),
        )
        .unwrap();
        assert_eq!(result.detail("content"), Some(&json!("two\nthree")));
        assert_eq!(result.detail("total_lines"), Some(&json!(3)));

        let whole = read_file(&state.buffer, &json!({ "target_file": "/a.js", "should_read_entire_file": true })).unwrap();
        assert_eq!(whole.detail("content"), Some(&json!("one\ntwo\nthree\n")));
    }

    #[test]
    fn read_file_rejects_inverted_and_out_of_range() {
        let state = state_with(&[("/a.js", "one\ntwo\n")]);
        let inverted = read_file(
            &state.buffer,
            &json!({ "target_file": "/a.js", "start_line_one_indexed": 2, "end_line_one_indexed_inclusive": 1 }),
        );
        assert!(matches!(inverted, Err(EngineError::Validation(_))));

        let beyond = read_file(
            &state.buffer,
            &json!({ "target_file": "/a.js", "start_line_one_indexed": 1, "end_line_one_indexed_inclusive": 9 }),
        );
        assert!(matches!(beyond, Err(EngineError::Validation(_))));

        let zero = read_file(
            &state.buffer,
            &json!({ "target_file": "/a.js", "start_line_one_indexed": 0, "end_line_one_indexed_inclusive": 1 }),
        );
        assert!(matches!(zero, Err(EngineError::Validation(_))));
    }

    #[test]
    fn list_dir_root_and_missing() {
        let state = state_with(&[("/a.js", "x"), ("/src/b.js", "y")]);
        let result = list_dir(&state.buffer, &json!({ "relative_workspace_path": "." })).unwrap();
        let entries = result.detail("entries").unwrap().as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["type"], "directory");

        let missing = list_dir(&state.buffer, &json!({ "relative_workspace_path": "lib" }));
        assert!(matches!(missing, Err(EngineError::NotFound(_))));
    }
}
