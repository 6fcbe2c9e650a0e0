//! Context block for the generation step.
//!
//! Selected documents are rendered as source-tagged blocks:
//!
//! ```text
//! ---
//! Source: src/app.py
//!
//! Content:
//! print("hi")
//! ```
//!
//! Blocks are separated by a blank line, in selection order.

use readmegen_core::models::Document;

pub fn format_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|d| format!("---\nSource: {}\n\nContent:\n{}\n", d.path, d.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use readmegen_core::models::DocumentKind;

    #[test]
    fn renders_blocks_in_order() {
        let docs = vec![
            Document::new("a.py", "print(1)".to_string(), DocumentKind::Source, false),
            Document::new(".env", "KEY=<YOUR_VALUE>".to_string(), DocumentKind::Env, false),
        ];
        assert_eq!(
            format_context(&docs),
            "---\nSource: a.py\n\nContent:\nprint(1)\n\n\n---\nSource: .env\n\nContent:\nKEY=<YOUR_VALUE>\n"
        );
    }

    #[test]
    fn empty_selection_renders_nothing() {
        assert_eq!(format_context(&[]), "");
    }
}
