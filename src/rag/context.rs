//! Context formatting for report synthesis.

use crate::chunking::{truncate_chars, truncate_with_marker};
use crate::vector_store::Chunk;
use url::Url;

/// Characters kept from each retrieved chunk.
pub const MAX_CHUNK_CHARS: usize = 1500;

/// Hard cap on the formatted context, excluding the marker.
pub const MAX_CONTEXT_CHARS: usize = 6000;

/// Appended when the context was cut.
pub const TRUNCATION_MARKER: &str = "...(truncated)";

/// Number the chunks as `[Source N] (origin):` blocks and enforce the budget.
pub fn format_context(chunks: &[Chunk]) -> String {
    let mut context = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        context.push_str(&format!(
            "[Source {}] ({}):\n{}\n\n",
            i + 1,
            chunk.source(),
            truncate_chars(&chunk.text, MAX_CHUNK_CHARS)
        ));
    }
    truncate_with_marker(&context, MAX_CONTEXT_CHARS, TRUNCATION_MARKER)
}

/// How a source is shown in the references section.
///
/// Web sources become markdown links labelled with their host; anything else
/// is treated as an uploaded file and labelled by its file name.
pub fn reference_label(source: &str) -> String {
    if source.starts_with("http://") || source.starts_with("https://") {
        let host = Url::parse(source)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| source.to_string());
        return format!("[{}]({})", host, source);
    }

    let file_name = source
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(source);
    format!("`{}` (uploaded document)", file_name)
}

/// Numbered reference list matching the `[Source N]` numbering.
pub fn format_references(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| format!("{}. [Source {}] {}", i + 1, i + 1, reference_label(chunk.source())))
        .collect::<Vec<_>>()
        .join("\n")
}
