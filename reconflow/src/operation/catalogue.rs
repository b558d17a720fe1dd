//! Catalogue of supported operations and their quota profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::eligibility::BatchLimit;

/// The supported external operations.
///
/// Default batch limits are sized so one batch fits inside a typical
/// wall-clock budget under the provider's published request-rate
/// quotas; generative operations run far fewer rows per minute than
/// embedding or translation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Embedding generation for text rows.
    GenerateEmbedding,
    /// Free-form text generation from a prompt.
    GenerateText,
    /// Machine translation.
    Translate,
    /// Text and entity understanding (classification, extraction).
    UnderstandText,
    /// Image annotation (labels, objects, OCR).
    AnnotateImage,
    /// Audio transcription.
    Transcribe,
    /// Document layout and content parsing.
    ParseDocument,
}

impl OperationKind {
    /// All catalogue entries.
    #[must_use]
    pub fn all() -> [Self; 7] {
        [
            Self::GenerateEmbedding,
            Self::GenerateText,
            Self::Translate,
            Self::UnderstandText,
            Self::AnnotateImage,
            Self::Transcribe,
            Self::ParseDocument,
        ]
    }

    /// The operation's invocation name.
    #[must_use]
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::GenerateEmbedding => "generate_embedding",
            Self::GenerateText => "generate_text",
            Self::Translate => "translate",
            Self::UnderstandText => "understand_text",
            Self::AnnotateImage => "annotate_image",
            Self::Transcribe => "transcribe",
            Self::ParseDocument => "parse_document",
        }
    }

    /// The per-row status column the operation annotates results with.
    #[must_use]
    pub fn status_column(&self) -> &'static str {
        match self {
            Self::GenerateEmbedding => "generate_embedding_status",
            Self::GenerateText => "generate_text_status",
            Self::Translate => "translate_status",
            Self::UnderstandText => "understand_text_status",
            Self::AnnotateImage => "annotate_image_status",
            Self::Transcribe => "transcribe_status",
            Self::ParseDocument => "parse_document_status",
        }
    }

    /// The column carrying the operation's primary result payload.
    #[must_use]
    pub fn result_column(&self) -> &'static str {
        match self {
            Self::GenerateEmbedding => "embedding",
            Self::GenerateText => "generated_text",
            Self::Translate => "translated_text",
            Self::UnderstandText => "understanding",
            Self::AnnotateImage => "annotations",
            Self::Transcribe => "transcript",
            Self::ParseDocument => "parsed_document",
        }
    }

    /// Default rows-per-iteration cap for this operation.
    #[must_use]
    pub fn default_batch_limit(&self) -> BatchLimit {
        match self {
            Self::GenerateEmbedding => BatchLimit::Rows(5000),
            Self::GenerateText => BatchLimit::Rows(100),
            Self::Translate => BatchLimit::Rows(2000),
            Self::UnderstandText => BatchLimit::Rows(1000),
            Self::AnnotateImage => BatchLimit::Rows(500),
            Self::Transcribe => BatchLimit::Rows(100),
            Self::ParseDocument => BatchLimit::Rows(100),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function_name())
    }
}
