use serde_json::Value;

use crate::db::{Database, DbError};
use crate::models::*;
use crate::workspace_tools::safety::truncate_string;

const MAX_RESULT_CHARS: usize = 200_000;

pub fn log_tool_call(
    db: &Database,
    run_id: &str,
    name: &str,
    args: &Value,
    result: &ToolResult,
) -> Result<(), DbError> {
    let conn = db.connect()?;
    let id = new_id();
    let created_at = now_iso();

    // Truncate result if too large
    let result_str = serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string());
    let (truncated_content, truncated) = truncate_string(&result_str, MAX_RESULT_CHARS);
    let final_result = if truncated {
        serde_json::json!({
            "_truncated": true,
            "_original_size": result_str.len(),
            "_content": truncated_content
        })
        .to_string()
    } else {
        result_str
    };

    conn.execute(
        "INSERT INTO tool_calls (id, run_id, name, args_json, result_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (&id, run_id, name, &args.to_string(), &final_result, &created_at),
    )?;

    Ok(())
}

pub fn list_tool_calls(db: &Database, run_id: &str) -> Result<Vec<ToolCallRow>, DbError> {
    let conn = db.connect()?;
    let mut stmt = conn.prepare(
        "SELECT id, run_id, name, args_json, result_json, created_at
         FROM tool_calls WHERE run_id = ?1 ORDER BY seq ASC",
    )?;

    let rows = stmt.query_map([run_id], |r| {
        Ok(ToolCallRow {
            id: r.get(0)?,
            run_id: r.get(1)?,
            name: r.get(2)?,
            args_json: r.get(3)?,
            result_json: r.get(4)?,
            created_at: r.get(5)?,
        })
    })?;

    let mut out = vec![];
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn tool_calls_are_listed_in_insertion_order() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("db.sqlite")).unwrap();

        log_tool_call(&db, "run-1", "read_file", &json!({ "target_file": "/a" }), &ToolResult::error("not_found", "x")).unwrap();
        log_tool_call(&db, "run-1", "list_dir", &json!({}), &ToolResult::success("ok", json!({}))).unwrap();
        log_tool_call(&db, "run-2", "list_dir", &json!({}), &ToolResult::success("ok", json!({}))).unwrap();

        let rows = list_tool_calls(&db, "run-1").unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["read_file", "list_dir"]);
        let first: Value = serde_json::from_str(&rows[0].result_json).unwrap();
        assert_eq!(first["status"], "error");
    }

    #[test]
    fn oversized_results_are_wrapped() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("db.sqlite")).unwrap();
        let big = "x".repeat(MAX_RESULT_CHARS + 10);
        log_tool_call(&db, "run", "read_file", &json!({}), &ToolResult::success("ok", json!({ "content": big }))).unwrap();

        let rows = list_tool_calls(&db, "run").unwrap();
        let stored: Value = serde_json::from_str(&rows[0].result_json).unwrap();
        assert_eq!(stored["_truncated"], true);
    }
}
