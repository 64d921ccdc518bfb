//! Output formatting for fetched comments.

use crate::cli::OutputFormat;
use crate::models::CommentRecord;

/// Renders comments in the requested format.
pub fn format_comments(comments: &[CommentRecord], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_as_json(comments),
        OutputFormat::Jsonl => format_as_json_lines(comments),
        OutputFormat::Text => format_as_text(comments),
    }
}

/// Formats comments as a pretty-printed JSON array.
pub fn format_as_json(comments: &[CommentRecord]) -> String {
    let mut output =
        serde_json::to_string_pretty(comments).unwrap_or_else(|_| "[]".to_string());
    output.push('\n');
    output
}

/// Formats comments as one compact JSON object per line.
pub fn format_as_json_lines(comments: &[CommentRecord]) -> String {
    comments
        .iter()
        .filter_map(|c| serde_json::to_string(c).ok())
        .map(|line| line + "\n")
        .collect()
}

/// Formats comments as "author: text", replies indented under their thread.
pub fn format_as_text(comments: &[CommentRecord]) -> String {
    let mut output = String::new();

    for comment in comments {
        let indent = if comment.is_reply() { "  " } else { "" };
        // Keep one comment per line
        let text = comment.text.replace('\n', " ");

        output.push_str(&format!("{indent}{}: {text}", comment.author));
        if let Some(sentiment) = comment.sentiment {
            output.push_str(&format!(
                " [{} {:+.2}]",
                sentiment.label(),
                sentiment.score
            ));
        }
        output.push('\n');
    }

    output
}
