use commentary_base::{CommentaryResult, err};
use commentary_engine::ExtractionReport;

/// Pretty-printed report JSON with a trailing newline.
pub fn render_json(report: &ExtractionReport) -> CommentaryResult<String> {
    let mut json = serde_json::to_string_pretty(report)
        .map_err(|e| err!("JSON serialization error: {}", e))?;
    json.push('\n');
    Ok(json)
}

/// One `file:line [category] text` line per comment.
pub fn render_text(report: &ExtractionReport) -> String {
    report
        .comments
        .iter()
        .map(|comment| format!("{}\n", comment))
        .collect()
}
