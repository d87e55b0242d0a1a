//! Content reconstruction strategies for the editor → form direction

use types::{render_container_sections, EditorStateSnapshot, ParagraphBlock, TransformationStrategy};

/// Content produced by a strategy and the strategy that actually produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOutcome {
    pub content: String,
    /// Never [`TransformationStrategy::Auto`]
    pub strategy: TransformationStrategy,
}

/// Reuse the snapshot's generated content verbatim
///
/// When requested explicitly the trimmed content must be longer than
/// `min_len` characters; under auto selection any non-blank content counts.
pub fn existing_content(snapshot: &EditorStateSnapshot, min_len: usize, explicit: bool) -> String {
    let trimmed_len = snapshot.completed_content.trim().chars().count();
    let usable = if explicit {
        trimmed_len > min_len
    } else {
        trimmed_len > 0
    };

    if usable {
        snapshot.completed_content.clone()
    } else {
        String::new()
    }
}

/// Render containers in order, each under a heading, skipping empty ones
pub fn rebuild_from_containers(snapshot: &EditorStateSnapshot) -> String {
    render_container_sections(&snapshot.containers, &snapshot.paragraphs)
}

/// Join unassigned paragraphs in order, separated by a blank line
pub fn paragraph_fallback(snapshot: &EditorStateSnapshot) -> String {
    let mut unassigned: Vec<&ParagraphBlock> = snapshot.unassigned_paragraphs().collect();
    unassigned.sort_by_key(|p| p.order);

    unassigned
        .iter()
        .map(|p| p.content.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Run the requested strategy, resolving `Auto` to a concrete one
pub fn apply(
    snapshot: &EditorStateSnapshot,
    requested: TransformationStrategy,
    min_existing_len: usize,
) -> StrategyOutcome {
    let (content, strategy) = match requested {
        TransformationStrategy::ExistingContent => (
            existing_content(snapshot, min_existing_len, true),
            TransformationStrategy::ExistingContent,
        ),
        TransformationStrategy::RebuildFromContainers => (
            rebuild_from_containers(snapshot),
            TransformationStrategy::RebuildFromContainers,
        ),
        TransformationStrategy::ParagraphFallback => (
            paragraph_fallback(snapshot),
            TransformationStrategy::ParagraphFallback,
        ),
        TransformationStrategy::Auto => {
            let existing = existing_content(snapshot, min_existing_len, false);
            if existing.is_empty() {
                (
                    rebuild_from_containers(snapshot),
                    TransformationStrategy::RebuildFromContainers,
                )
            } else {
                (existing, TransformationStrategy::ExistingContent)
            }
        }
    };

    StrategyOutcome { content, strategy }
}
