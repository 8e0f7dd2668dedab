use ignore::overrides::{Override, OverrideBuilder};
use regex::RegexBuilder;
use serde_json::{json, Value};

use crate::errors::EngineError;
use crate::models::ToolResult;
use crate::workspace::WorkspaceBuffer;
use crate::workspace_tools::args::{optional_bool, optional_str, optional_str_list, required_str};
use crate::workspace_tools::safety::normalize_path;

const MAX_RESULTS_DEFAULT: usize = 200;
const MAX_LINE_CHARS: usize = 200;
const MAX_FILE_SEARCH_RESULTS: usize = 10;
const CONTEXT_LINES: usize = 2;

/// Gitignore-style glob set. Several globs may be given comma separated.
struct GlobFilter {
    matcher: Override,
}

impl GlobFilter {
    fn parse(patterns: &str, arg_name: &str) -> Result<Self, EngineError> {
        let mut builder = OverrideBuilder::new("/");
        for glob in patterns.split(',').map(str::trim).filter(|g| !g.is_empty()) {
            builder
                .add(glob)
                .map_err(|e| EngineError::validation(format!("invalid {} '{}': {}", arg_name, glob, e)))?;
        }
        let matcher = builder
            .build()
            .map_err(|e| EngineError::validation(format!("invalid {}: {}", arg_name, e)))?;
        Ok(Self { matcher })
    }

    fn matches(&self, path: &str) -> bool {
        self.matcher.matched(path.trim_start_matches('/'), false).is_whitelist()
    }
}

fn clip(line: &str) -> String {
    line.chars().take(MAX_LINE_CHARS).collect()
}

pub fn grep_search(buffer: &WorkspaceBuffer, args: &Value) -> Result<ToolResult, EngineError> {
    let query = required_str(args, "query")?;
    let case_sensitive = optional_bool(args, "case_sensitive")?.unwrap_or(false);
    let include = optional_str(args, "include_pattern")?
        .map(|p| GlobFilter::parse(p, "include_pattern"))
        .transpose()?;
    let exclude = optional_str(args, "exclude_pattern")?
        .map(|p| GlobFilter::parse(p, "exclude_pattern"))
        .transpose()?;

    let pattern = RegexBuilder::new(query)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| EngineError::validation(format!("invalid regular expression: {}", e)))?;

    let mut files = vec![];
    let mut total = 0usize;
    let mut truncated = false;

    'files: for (path, content) in buffer.files() {
        if include.as_ref().is_some_and(|f| !f.matches(path)) || exclude.as_ref().is_some_and(|f| f.matches(path)) {
            continue;
        }

        let mut matches = vec![];
        for (idx, line) in content.lines().enumerate() {
            if pattern.is_match(line) {
                if total >= MAX_RESULTS_DEFAULT {
                    truncated = true;
                    if !matches.is_empty() {
                        files.push(json!({ "file": path, "matches": matches }));
                    }
                    break 'files;
                }
                matches.push(json!({ "line_number": idx + 1, "line": clip(line) }));
                total += 1;
            }
        }
        if !matches.is_empty() {
            files.push(json!({ "file": path, "matches": matches }));
        }
    }

    Ok(ToolResult::success(
        format!("{} matches in {} files", total, files.len()),
        json!({
            "query": query,
            "results": files,
            "total_matches": total,
            "truncated": truncated,
        }),
    ))
}

pub fn codebase_search(buffer: &WorkspaceBuffer, args: &Value) -> Result<ToolResult, EngineError> {
    let query = required_str(args, "query")?.trim();
    if query.is_empty() {
        return Err(EngineError::validation("query must not be empty"));
    }
    let targets = optional_str_list(args, "target_directories")?
        .iter()
        .map(|d| normalize_path(d).map(|p| if p == "/" { p } else { format!("{}/", p) }))
        .collect::<Result<Vec<String>, _>>()?;

    let needle = query.to_lowercase();
    let mut files = vec![];
    let mut total = 0usize;
    let mut truncated = false;

    'files: for (path, content) in buffer.files() {
        if !targets.is_empty() && !targets.iter().any(|t| path.starts_with(t.as_str())) {
            continue;
        }

        let lines: Vec<&str> = content.lines().collect();
        let mut matches = vec![];
        for (idx, line) in lines.iter().enumerate() {
            if !line.to_lowercase().contains(&needle) {
                continue;
            }
            if total >= MAX_RESULTS_DEFAULT {
                truncated = true;
                if !matches.is_empty() {
                    files.push(json!({ "file": path, "matches": matches }));
                }
                break 'files;
            }
            let from = idx.saturating_sub(CONTEXT_LINES);
            let to = (idx + CONTEXT_LINES).min(lines.len() - 1);
            let context: Vec<String> = lines[from..=to].iter().map(|l| clip(l)).collect();
            matches.push(json!({
                "line_number": idx + 1,
                "line": clip(line),
                "context": {
                    "start_line": from + 1,
                    "end_line": to + 1,
                    "lines": context,
                },
            }));
            total += 1;
        }
        if !matches.is_empty() {
            files.push(json!({ "file": path, "matches": matches }));
        }
    }

    Ok(ToolResult::success(
        format!("{} matches in {} files", total, files.len()),
        json!({
            "query": query,
            "results": files,
            "total_matches": total,
            "truncated": truncated,
        }),
    ))
}

pub fn file_search(buffer: &WorkspaceBuffer, args: &Value) -> Result<ToolResult, EngineError> {
    let query = required_str(args, "query")?.trim();
    if query.is_empty() {
        return Err(EngineError::validation("query must not be empty"));
    }
    let needle = query.to_lowercase();

    let mut scored: Vec<(i64, &str)> = buffer
        .files()
        .filter_map(|(path, _)| fuzzy_score(&path.to_lowercase(), &needle).map(|s| (s, path)))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    let total = scored.len();
    let files: Vec<&str> = scored.into_iter().take(MAX_FILE_SEARCH_RESULTS).map(|(_, p)| p).collect();

    Ok(ToolResult::success(
        format!("{} files match '{}'", total, query),
        json!({
            "query": query,
            "files": files,
            "truncated": total > MAX_FILE_SEARCH_RESULTS,
        }),
    ))
}

/// Ordered-subsequence match of `query` in `path`, both lowercased. Higher is
/// better: contiguous and file-name hits outrank scattered ones.
fn fuzzy_score(path: &str, query: &str) -> Option<i64> {
    let mut score: i64 = 100;
    let mut last: Option<usize> = None;
    let mut search_from = 0;

    for qc in query.chars() {
        let found = path[search_from..].find(qc)? + search_from;
        if let Some(prev) = last {
            score -= (found - prev - 1) as i64;
        }
        last = Some(found);
        search_from = found + qc.len_utf8();
    }

    let file_name = path.rsplit('/').next().unwrap_or(path);
    if file_name.contains(query) {
        score += 75;
    } else if path.contains(query) {
        score += 50;
    }
    score -= (path.len() / 10) as i64;
    Some(score)
}
