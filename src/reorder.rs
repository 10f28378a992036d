//! Line reordering that biases ISBN searches toward front and back matter.
//!
//! Copyright and colophon pages sit near the start or the end of a book, so the
//! text is rearranged as: the first `scan_first` lines, then the last
//! `reverse_last` lines in reverse order, then everything in between.

use std::path::Path;
use tokio::fs;

use crate::error::Result;
use crate::types::ReorderLines;

/// Reorders `text` according to `order`, or returns it unchanged when `order` is `None`.
pub fn reorder_content(text: &str, order: Option<ReorderLines>) -> String {
    let Some(order) = order else {
        return text.to_string();
    };

    let lines: Vec<&str> = text.lines().collect();
    let head_len = order.scan_first.min(lines.len());
    let (head, rest) = lines.split_at(head_len);
    let tail_len = order.reverse_last.min(rest.len());
    let (middle, tail) = rest.split_at(rest.len() - tail_len);

    let mut reordered: Vec<&str> = Vec::with_capacity(lines.len());
    reordered.extend_from_slice(head);
    reordered.extend(tail.iter().rev());
    reordered.extend_from_slice(middle);

    let mut out = reordered.join("\n");
    if !out.is_empty() && text.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Reads a text file and reorders its content.
///
/// Invalid UTF-8 is replaced rather than rejected: converted ebooks and raw
/// text files regularly contain stray bytes.
pub async fn reorder_file_content(path: &Path, order: Option<ReorderLines>) -> Result<String> {
    let bytes = fs::read(path).await?;
    let text = String::from_utf8_lossy(&bytes);

    if let Some(order) = order {
        log::debug!(
            "Reordering {:?}: first {} lines, then last {} lines reversed, then the rest",
            path,
            order.scan_first,
            order.reverse_last
        );
    }
    Ok(reorder_content(&text, order))
}
