//! Span annotations
//!
//! An annotation covers the half-open character interval `[start, end)` of
//! its document's content. Offsets count Unicode scalar values, not bytes.

use super::features::FeatureMap;

/// Ordinal of an annotation within its document
pub type Ordinal = u64;

/// A labeled character span carrying a feature map
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    ordinal: Ordinal,
    label: String,
    start: usize,
    end: usize,
    features: FeatureMap,
}

impl Annotation {
    pub(crate) fn new(
        ordinal: Ordinal,
        label: String,
        start: usize,
        end: usize,
        features: FeatureMap,
    ) -> Self {
        Self {
            ordinal,
            label,
            start,
            end,
            features,
        }
    }

    /// Creation ordinal, unique within the owning document
    pub fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Inclusive start offset
    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end offset
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false: zero-width spans are rejected at creation
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn features(&self) -> &FeatureMap {
        &self.features
    }

    pub(crate) fn features_mut(&mut self) -> &mut FeatureMap {
        &mut self.features
    }

    /// Returns the handle that addresses this annotation
    pub fn handle(&self) -> AnnotationHandle {
        AnnotationHandle {
            ordinal: self.ordinal,
            label: self.label.clone(),
        }
    }
}

/// Value handle returned by `Document::annotate`
///
/// The handle is not a live reference; it addresses an annotation by
/// ordinal within the document that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationHandle {
    ordinal: Ordinal,
    label: String,
}

impl AnnotationHandle {
    pub fn ordinal(&self) -> Ordinal {
        self.ordinal
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
