use crate::pipeline::knowledge::KnowledgeMatch;

pub const NO_KNOWLEDGE_FALLBACK: &str = "No specific TCM knowledge found for this case.";

/// Render retrieved passages as `title:\ntext` blocks separated by blank
/// lines. Untitled passages contribute their text only.
pub fn build_knowledge_context(matches: &[KnowledgeMatch]) -> String {
    if matches.is_empty() {
        return NO_KNOWLEDGE_FALLBACK.to_string();
    }
    matches
        .iter()
        .map(|m| match m.title.as_deref().filter(|t| !t.is_empty()) {
            Some(title) => format!("{title}:\n{}", m.text),
            None => m.text.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
