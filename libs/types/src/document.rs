//! Document-domain collaborators: content generation, structural checks and statistics
//!
//! Both the editor adapter and the transformation engine render container
//! sections through [`render_container_sections`], so for a document without
//! unassigned paragraphs the content a store shows and the content the engine
//! rebuilds agree byte for byte.

use crate::editor::{Container, ParagraphBlock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Failures raised while generating document content
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Two containers share an id, so paragraph ownership is ambiguous
    #[error("Duplicate container id: {0}")]
    DuplicateContainerId(String),

    /// Generation failed for another reason
    #[error("Content generation failed: {0}")]
    Generation(String),
}

/// Render containers in `order`, each as `## name` followed by its ordered,
/// trimmed, non-empty paragraphs; containers without content are skipped
pub fn render_container_sections(containers: &[Container], paragraphs: &[ParagraphBlock]) -> String {
    let mut sorted: Vec<&Container> = containers.iter().collect();
    sorted.sort_by_key(|c| c.order);

    let mut sections = Vec::with_capacity(sorted.len());
    for container in sorted {
        let mut owned: Vec<&ParagraphBlock> = paragraphs
            .iter()
            .filter(|p| p.belongs_to(&container.id))
            .collect();
        if owned.is_empty() {
            continue;
        }
        owned.sort_by_key(|p| p.order);

        let body: Vec<&str> = owned
            .iter()
            .map(|p| p.content.trim())
            .filter(|text| !text.is_empty())
            .collect();
        if body.is_empty() {
            continue;
        }

        sections.push(format!("## {}\n\n{}", container.name.trim(), body.join("\n\n")));
    }

    sections.join("\n\n")
}

/// Produces the completed document content from its parts
pub trait ContentGenerator: Send + Sync {
    fn generate(
        &self,
        containers: &[Container],
        paragraphs: &[ParagraphBlock],
    ) -> Result<String, DocumentError>;
}

/// Default generator: container sections via [`render_container_sections`],
/// then unassigned paragraphs in order
///
/// Refuses documents with duplicate container ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionedContentGenerator;

impl ContentGenerator for SectionedContentGenerator {
    fn generate(
        &self,
        containers: &[Container],
        paragraphs: &[ParagraphBlock],
    ) -> Result<String, DocumentError> {
        let mut seen = HashSet::with_capacity(containers.len());
        for container in containers {
            if !seen.insert(container.id.as_str()) {
                return Err(DocumentError::DuplicateContainerId(container.id.clone()));
            }
        }

        let mut unassigned: Vec<&ParagraphBlock> =
            paragraphs.iter().filter(|p| !p.is_assigned()).collect();
        unassigned.sort_by_key(|p| p.order);

        let mut blocks = Vec::with_capacity(unassigned.len() + 1);
        let sections = render_container_sections(containers, paragraphs);
        if !sections.is_empty() {
            blocks.push(sections);
        }
        blocks.extend(
            unassigned
                .iter()
                .map(|p| p.content.trim())
                .filter(|text| !text.is_empty())
                .map(str::to_string),
        );

        Ok(blocks.join("\n\n"))
    }
}

/// Structural defect found in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentIssue {
    DuplicateContainerId { id: String },
    DuplicateContainerOrder { order: i64 },
    DuplicateParagraphId { id: String },
    UnknownContainer { paragraph_id: String, container_id: String },
    DuplicateParagraphOrder { container_id: String, order: i64 },
}

impl DocumentIssue {
    /// Duplicated identities are errors; dangling references and order
    /// collisions inside a container only degrade rendering
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            DocumentIssue::DuplicateContainerId { .. }
                | DocumentIssue::DuplicateContainerOrder { .. }
                | DocumentIssue::DuplicateParagraphId { .. }
        )
    }

    /// Short machine-readable key for reports
    pub fn key(&self) -> &'static str {
        match self {
            DocumentIssue::DuplicateContainerId { .. } => "duplicateContainerId",
            DocumentIssue::DuplicateContainerOrder { .. } => "duplicateContainerOrder",
            DocumentIssue::DuplicateParagraphId { .. } => "duplicateParagraphId",
            DocumentIssue::UnknownContainer { .. } => "unknownContainer",
            DocumentIssue::DuplicateParagraphOrder { .. } => "duplicateParagraphOrder",
        }
    }
}

impl fmt::Display for DocumentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentIssue::DuplicateContainerId { id } => {
                write!(f, "duplicate container id '{}'", id)
            }
            DocumentIssue::DuplicateContainerOrder { order } => {
                write!(f, "duplicate container order {}", order)
            }
            DocumentIssue::DuplicateParagraphId { id } => {
                write!(f, "duplicate paragraph id '{}'", id)
            }
            DocumentIssue::UnknownContainer {
                paragraph_id,
                container_id,
            } => write!(
                f,
                "paragraph '{}' references unknown container '{}'",
                paragraph_id, container_id
            ),
            DocumentIssue::DuplicateParagraphOrder {
                container_id,
                order,
            } => write!(
                f,
                "container '{}' has several paragraphs with order {}",
                container_id, order
            ),
        }
    }
}

/// Aggregate counts over a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatistics {
    pub container_count: usize,
    pub paragraph_count: usize,
    pub assigned_paragraph_count: usize,
    pub unassigned_paragraph_count: usize,
    pub empty_container_count: usize,
    pub word_count: usize,
    pub character_count: usize,
}

/// Structural validation and statistics for editor documents
pub trait DocumentValidator: Send + Sync {
    /// Whole-document checks
    fn validate(&self, containers: &[Container], paragraphs: &[ParagraphBlock]) -> Vec<DocumentIssue>;

    /// Checks scoped to the paragraphs of one container
    fn validate_container(&self, container_id: &str, paragraphs: &[ParagraphBlock]) -> Vec<DocumentIssue>;

    fn statistics(&self, containers: &[Container], paragraphs: &[ParagraphBlock]) -> DocumentStatistics;
}

/// Default validator: duplicate ids and orders, dangling container references
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralValidator;

impl DocumentValidator for StructuralValidator {
    fn validate(&self, containers: &[Container], paragraphs: &[ParagraphBlock]) -> Vec<DocumentIssue> {
        let mut issues = Vec::new();

        let mut container_ids = HashSet::new();
        let mut container_orders = HashSet::new();
        for container in containers {
            if !container_ids.insert(container.id.as_str()) {
                issues.push(DocumentIssue::DuplicateContainerId {
                    id: container.id.clone(),
                });
            }
            if !container_orders.insert(container.order) {
                issues.push(DocumentIssue::DuplicateContainerOrder {
                    order: container.order,
                });
            }
        }

        let mut paragraph_ids = HashSet::new();
        for paragraph in paragraphs {
            if !paragraph_ids.insert(paragraph.id.as_str()) {
                issues.push(DocumentIssue::DuplicateParagraphId {
                    id: paragraph.id.clone(),
                });
            }
            if let Some(container_id) = &paragraph.container_id {
                if !container_ids.contains(container_id.as_str()) {
                    issues.push(DocumentIssue::UnknownContainer {
                        paragraph_id: paragraph.id.clone(),
                        container_id: container_id.clone(),
                    });
                }
            }
        }

        for container_id in container_ids {
            issues.extend(self.validate_container(container_id, paragraphs));
        }

        issues
    }

    fn validate_container(&self, container_id: &str, paragraphs: &[ParagraphBlock]) -> Vec<DocumentIssue> {
        let mut per_order: HashMap<i64, usize> = HashMap::new();
        for paragraph in paragraphs.iter().filter(|p| p.belongs_to(container_id)) {
            *per_order.entry(paragraph.order).or_default() += 1;
        }

        let mut duplicated: Vec<i64> = per_order
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(order, _)| order)
            .collect();
        duplicated.sort_unstable();

        duplicated
            .into_iter()
            .map(|order| DocumentIssue::DuplicateParagraphOrder {
                container_id: container_id.to_string(),
                order,
            })
            .collect()
    }

    fn statistics(&self, containers: &[Container], paragraphs: &[ParagraphBlock]) -> DocumentStatistics {
        let assigned = paragraphs.iter().filter(|p| p.is_assigned()).count();
        let empty_containers = containers
            .iter()
            .filter(|c| !paragraphs.iter().any(|p| p.belongs_to(&c.id)))
            .count();

        DocumentStatistics {
            container_count: containers.len(),
            paragraph_count: paragraphs.len(),
            assigned_paragraph_count: assigned,
            unassigned_paragraph_count: paragraphs.len() - assigned,
            empty_container_count: empty_containers,
            word_count: paragraphs
                .iter()
                .map(|p| p.content.split_whitespace().count())
                .sum(),
            character_count: paragraphs.iter().map(|p| p.content.chars().count()).sum(),
        }
    }
}
