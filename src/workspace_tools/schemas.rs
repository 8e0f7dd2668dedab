use serde_json::{json, Value};

use crate::llm::ToolSchema;

pub fn workspace_tool_schemas() -> Vec<ToolSchema> {
    vec![
        edit_file_schema(),
        create_file_schema(),
        delete_file_schema(),
        read_file_schema(),
        list_dir_schema(),
        grep_search_schema(),
        file_search_schema(),
        codebase_search_schema(),
        run_terminal_cmd_schema(),
        web_search_schema(),
        diff_history_schema(),
        reapply_schema(),
    ]
}

fn schema(name: &str, description: &str, input_schema: Value) -> ToolSchema {
    ToolSchema { name: name.to_string(), description: description.to_string(), input_schema }
}

fn edit_file_schema() -> ToolSchema {
    schema(
        "edit_file",
        "Replace the full contents of an existing file in the workspace.",
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to edit, relative to the workspace root"
                },
                "content": {
                    "type": "string",
                    "description": "The complete new contents of the file"
                }
            },
            "required": ["file_path", "content"]
        }),
    )
}

fn create_file_schema() -> ToolSchema {
    schema(
        "create_file",
        "Create a file in the workspace, overwriting it if it already exists.",
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to create, relative to the workspace root"
                },
                "content": {
                    "type": "string",
                    "description": "Contents of the new file"
                }
            },
            "required": ["file_path", "content"]
        }),
    )
}

fn delete_file_schema() -> ToolSchema {
    schema(
        "delete_file",
        "Delete an existing file from the workspace.",
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path of the file to delete"
                }
            },
            "required": ["file_path"]
        }),
    )
}

fn read_file_schema() -> ToolSchema {
    schema(
        "read_file",
        "Read a file, either entirely or an inclusive 1-indexed line range. Large files are truncated.",
        json!({
            "type": "object",
            "properties": {
                "target_file": {
                    "type": "string",
                    "description": "Path of the file to read"
                },
                "start_line_one_indexed": {
                    "type": "integer",
                    "description": "First line to read (1-indexed)"
                },
                "end_line_one_indexed_inclusive": {
                    "type": "integer",
                    "description": "Last line to read (1-indexed, inclusive)"
                },
                "should_read_entire_file": {
                    "type": "boolean",
                    "description": "Read the whole file and ignore the line range"
                }
            },
            "required": ["target_file", "start_line_one_indexed", "end_line_one_indexed_inclusive", "should_read_entire_file"]
        }),
    )
}

fn list_dir_schema() -> ToolSchema {
    schema(
        "list_dir",
        "List the files and directories directly inside a workspace directory.",
        json!({
            "type": "object",
            "properties": {
                "relative_workspace_path": {
                    "type": "string",
                    "description": "Directory to list, relative to the workspace root"
                }
            },
            "required": ["relative_workspace_path"]
        }),
    )
}

fn grep_search_schema() -> ToolSchema {
    schema(
        "grep_search",
        "Regex search over file contents. Returns matching lines grouped by file.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Regular expression to search for"
                },
                "include_pattern": {
                    "type": "string",
                    "description": "Glob of files to include, e.g. '*.ts'"
                },
                "exclude_pattern": {
                    "type": "string",
                    "description": "Glob of files to exclude"
                },
                "case_sensitive": {
                    "type": "boolean",
                    "description": "Match case exactly (default false)"
                }
            },
            "required": ["query"]
        }),
    )
}

fn file_search_schema() -> ToolSchema {
    schema(
        "file_search",
        "Fuzzy search for files by path. Returns at most 10 paths.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Fuzzy file name or path fragment"
                }
            },
            "required": ["query"]
        }),
    )
}

fn codebase_search_schema() -> ToolSchema {
    schema(
        "codebase_search",
        "Search file contents for a phrase and return each hit with two lines of context on either side.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Text to search for"
                },
                "target_directories": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional directories to restrict the search to"
                }
            },
            "required": ["query"]
        }),
    )
}

fn run_terminal_cmd_schema() -> ToolSchema {
    schema(
        "run_terminal_cmd",
        "Propose a terminal command to run in the workspace.",
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command to run"
                },
                "is_background": {
                    "type": "boolean",
                    "description": "Whether the command should run in the background"
                },
                "require_user_approval": {
                    "type": "boolean",
                    "description": "Whether the user must approve the command first"
                }
            },
            "required": ["command", "is_background", "require_user_approval"]
        }),
    )
}

fn web_search_schema() -> ToolSchema {
    schema(
        "web_search",
        "Search the web for up-to-date information.",
        json!({
            "type": "object",
            "properties": {
                "search_term": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["search_term"]
        }),
    )
}

fn diff_history_schema() -> ToolSchema {
    schema(
        "diff_history",
        "Retrieve the history of recent changes made to files in the workspace.",
        json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
    )
}

fn reapply_schema() -> ToolSchema {
    schema(
        "reapply",
        "Ask for the last edit to a file to be applied again.",
        json!({
            "type": "object",
            "properties": {
                "target_file": {
                    "type": "string",
                    "description": "File whose last edit should be reapplied"
                }
            },
            "required": ["target_file"]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace_tools::dispatcher::TOOL_NAMES;

    #[test]
    fn schema_set_matches_dispatch_table() {
        let names: Vec<String> = workspace_tool_schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, TOOL_NAMES.iter().map(|n| n.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn required_fields_are_declared_properties() {
        for tool in workspace_tool_schemas() {
            let props = tool.input_schema["properties"].as_object().unwrap();
            for req in tool.input_schema["required"].as_array().unwrap() {
                assert!(props.contains_key(req.as_str().unwrap()), "{} requires undeclared {}", tool.name, req);
            }
        }
    }
}
