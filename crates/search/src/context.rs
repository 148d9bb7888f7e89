use kale_text_chunker::Chunk;

/// Body of the context message injected after a user turn. Chunks are joined
/// with a newline in retrieval order; no chunks gives an empty body.
#[must_use]
pub fn format_context(chunks: &[Chunk]) -> String {
    let body = chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    format!("Relevant context:\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_chunks_in_order() {
        let chunks = vec![
            Chunk::new("first".to_string(), "pykale.xml", 0, 0),
            Chunk::new("second".to_string(), "pykale.xml", 1, 900),
        ];
        assert_eq!(format_context(&chunks), "Relevant context:\nfirst\nsecond");
    }

    #[test]
    fn empty_block_without_chunks() {
        assert_eq!(format_context(&[]), "Relevant context:\n");
    }
}
