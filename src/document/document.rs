//! Documents: immutable text plus an ordered collection of annotations

use uuid::Uuid;

use super::annotation::{Annotation, AnnotationHandle, Ordinal};
use super::errors::{DocumentError, DocumentResult};
use super::features::FeatureMap;

/// A named text with document-level features and span annotations.
///
/// Content never changes after creation. Annotations are appended with
/// strictly increasing ordinals and are only reachable through the
/// document that owns them.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    name: String,
    content: String,
    char_len: usize,
    features: FeatureMap,
    annotations: Vec<Annotation>,
    next_ordinal: Ordinal,
}

impl Document {
    /// Creates a document with a generated name (`Document_<8 hex>`).
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_name(text, generate_name())
    }

    /// Creates a named document. A blank name is treated as absent and
    /// replaced by a generated one.
    pub fn with_name(text: impl Into<String>, name: impl Into<String>) -> Self {
        let content = text.into();
        let char_len = content.chars().count();
        let name = name.into();
        Self {
            name: if name.trim().is_empty() {
                generate_name()
            } else {
                name
            },
            content,
            char_len,
            features: FeatureMap::new(),
            annotations: Vec::new(),
            next_ordinal: 0,
        }
    }

    /// Starts a builder for documents assembled from optional parts.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    /// Reassembles a document from stored parts, re-checking every
    /// annotation invariant.
    pub(crate) fn from_parts(
        name: String,
        content: String,
        features: FeatureMap,
        annotations: Vec<Annotation>,
    ) -> DocumentResult<Self> {
        let mut document = Self::with_name(content, name);
        document.features = features;

        for annotation in annotations {
            document.check_span(annotation.start(), annotation.end())?;
            if annotation.ordinal() < document.next_ordinal {
                return Err(DocumentError::invalid_input(format!(
                    "annotation ordinal {} is not greater than its predecessor",
                    annotation.ordinal()
                )));
            }
            document.next_ordinal = annotation.ordinal().checked_add(1).ok_or_else(|| {
                DocumentError::invalid_input(format!(
                    "annotation ordinal {} leaves no room for another annotation",
                    annotation.ordinal()
                ))
            })?;
            document.annotations.push(annotation);
        }

        Ok(document)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Content length in characters; the upper bound for span offsets.
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn features(&self) -> &FeatureMap {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureMap {
        &mut self.features
    }

    /// Attaches a new annotation covering `[start, end)`.
    ///
    /// # Errors
    ///
    /// - `RangeError` if `start >= end` or `end` exceeds the content length.
    ///   Zero-width spans are rejected.
    /// - `InvalidInput` if `label` is blank.
    pub fn annotate(
        &mut self,
        start: usize,
        end: usize,
        label: impl Into<String>,
        features: FeatureMap,
    ) -> DocumentResult<AnnotationHandle> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(DocumentError::invalid_input("annotation label must not be blank"));
        }
        self.check_span(start, end)?;

        let annotation = Annotation::new(self.next_ordinal, label, start, end, features);
        let handle = annotation.handle();
        self.next_ordinal += 1;
        self.annotations.push(annotation);
        Ok(handle)
    }

    /// Annotations in creation order.
    pub fn annotations_in_order(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations carrying `label`, in creation order.
    pub fn annotations_with_label<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.annotations.iter().filter(move |a| a.label() == label)
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    /// Looks up the annotation a handle refers to.
    pub fn annotation(&self, handle: &AnnotationHandle) -> Option<&Annotation> {
        self.position(handle).map(|idx| &self.annotations[idx])
    }

    /// Mutable access to the feature map of one annotation.
    ///
    /// Label and span stay fixed; only the features an annotation holds
    /// can be edited after creation.
    pub fn annotation_features_mut(&mut self, handle: &AnnotationHandle) -> Option<&mut FeatureMap> {
        let idx = self.position(handle)?;
        Some(self.annotations[idx].features_mut())
    }

    /// Text covered by an annotation of this document.
    pub fn span_text(&self, annotation: &Annotation) -> Option<&str> {
        if annotation.end() > self.char_len {
            return None;
        }
        let start = self.byte_offset(annotation.start());
        let end = self.byte_offset(annotation.end());
        self.content.get(start..end)
    }

    fn position(&self, handle: &AnnotationHandle) -> Option<usize> {
        let idx = self
            .annotations
            .binary_search_by_key(&handle.ordinal(), |a| a.ordinal())
            .ok()?;
        (self.annotations[idx].label() == handle.label()).then_some(idx)
    }

    fn check_span(&self, start: usize, end: usize) -> DocumentResult<()> {
        if start >= end || end > self.char_len {
            return Err(DocumentError::RangeError {
                start,
                end,
                len: self.char_len,
            });
        }
        Ok(())
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_idx)
            .map(|(byte, _)| byte)
            .unwrap_or(self.content.len())
    }
}

fn generate_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("Document_{}", &id[..8])
}

/// Builder for documents whose parts arrive separately (e.g. parsed input).
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    name: Option<String>,
    text: Option<String>,
    features: FeatureMap,
}

impl DocumentBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn features(mut self, features: FeatureMap) -> Self {
        self.features.merge(&features);
        self
    }

    /// Builds the document.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if no text was supplied. A missing or blank name is
    /// generated, as in [`Document::with_name`].
    pub fn build(self) -> DocumentResult<Document> {
        let text = self
            .text
            .ok_or_else(|| DocumentError::invalid_input("document text is required"))?;

        let mut document = match self.name {
            Some(name) => Document::with_name(text, name),
            None => Document::new(text),
        };
        document.features = self.features;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FeatureValue;

    fn cat_doc() -> Document {
        Document::with_name("The cat sat.", "doc1")
    }

    #[test]
    fn test_annotate_valid_span() {
        let mut doc = cat_doc();
        let handle = doc
            .annotate(4, 7, "ANIMAL", FeatureMap::from([("species", "cat")]))
            .unwrap();

        assert_eq!(handle.ordinal(), 0);
        assert_eq!(handle.label(), "ANIMAL");

        let annotation = doc.annotation(&handle).unwrap();
        assert_eq!(annotation.start(), 4);
        assert_eq!(annotation.end(), 7);
        assert_eq!(doc.span_text(annotation), Some("cat"));
    }

    #[test]
    fn test_inverted_span_rejected() {
        let mut doc = cat_doc();
        let err = doc.annotate(5, 3, "X", FeatureMap::new()).unwrap_err();
        assert!(matches!(err, DocumentError::RangeError { start: 5, end: 3, .. }));
    }

    #[test]
    fn test_span_past_end_rejected() {
        let mut doc = cat_doc();
        let len = doc.char_len();
        let err = doc.annotate(0, len + 1, "X", FeatureMap::new()).unwrap_err();
        assert!(matches!(err, DocumentError::RangeError { .. }));

        // Full-length span is fine
        assert!(doc.annotate(0, len, "X", FeatureMap::new()).is_ok());
    }

    #[test]
    fn test_zero_width_span_rejected() {
        let mut doc = cat_doc();
        let err = doc.annotate(0, 0, "X", FeatureMap::new()).unwrap_err();
        assert!(matches!(err, DocumentError::RangeError { start: 0, end: 0, .. }));
        assert_eq!(doc.annotation_count(), 0);
    }

    #[test]
    fn test_blank_label_rejected() {
        let mut doc = cat_doc();
        let err = doc.annotate(0, 3, "  ", FeatureMap::new()).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidInput(_)));
    }

    #[test]
    fn test_failed_annotate_does_not_consume_ordinal() {
        let mut doc = cat_doc();
        assert!(doc.annotate(3, 3, "X", FeatureMap::new()).is_err());
        let handle = doc.annotate(0, 3, "X", FeatureMap::new()).unwrap();
        assert_eq!(handle.ordinal(), 0);
    }

    #[test]
    fn test_order_is_creation_order_not_span_order() {
        let mut doc = cat_doc();
        doc.annotate(8, 11, "C", FeatureMap::new()).unwrap();
        doc.annotate(0, 3, "A", FeatureMap::new()).unwrap();
        doc.annotate(0, 3, "B", FeatureMap::new()).unwrap();

        let labels: Vec<_> = doc.annotations_in_order().iter().map(|a| a.label()).collect();
        assert_eq!(labels, vec!["C", "A", "B"]);

        let ordinals: Vec<_> = doc.annotations_in_order().iter().map(|a| a.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
    }

    #[test]
    fn test_offsets_count_characters() {
        let mut doc = Document::with_name("Zoë und Käthe", "umlauts");
        assert_eq!(doc.char_len(), 13);

        let handle = doc.annotate(8, 13, "PERSON", FeatureMap::new()).unwrap();
        let annotation = doc.annotation(&handle).unwrap();
        assert_eq!(doc.span_text(annotation), Some("Käthe"));
    }

    #[test]
    fn test_empty_text_is_valid_but_unannotatable() {
        let mut doc = Document::new("");
        assert_eq!(doc.char_len(), 0);
        assert!(doc.name().starts_with("Document_"));
        assert!(doc.annotate(0, 1, "X", FeatureMap::new()).is_err());
    }

    #[test]
    fn test_features_mut_through_handle() {
        let mut doc = cat_doc();
        let handle = doc.annotate(4, 7, "ANIMAL", FeatureMap::new()).unwrap();

        doc.annotation_features_mut(&handle).unwrap().put("species", "cat");

        let annotation = doc.annotation(&handle).unwrap();
        assert_eq!(annotation.features().get("species"), Some(&FeatureValue::from("cat")));
    }

    #[test]
    fn test_handle_with_wrong_label_misses() {
        let mut doc = cat_doc();
        doc.annotate(4, 7, "ANIMAL", FeatureMap::new()).unwrap();

        let mut other = cat_doc();
        let foreign = other.annotate(0, 3, "DET", FeatureMap::new()).unwrap();
        assert!(doc.annotation(&foreign).is_none());
    }

    #[test]
    fn test_builder_requires_text() {
        let err = Document::builder().name("doc").build().unwrap_err();
        assert!(matches!(err, DocumentError::InvalidInput(_)));

        let doc = Document::builder()
            .text("")
            .name("empty")
            .features(FeatureMap::from([("source", "test")]))
            .build()
            .unwrap();
        assert_eq!(doc.name(), "empty");
        assert_eq!(doc.content(), "");
        assert_eq!(doc.features().len(), 1);
    }

    #[test]
    fn test_from_parts_rejects_out_of_order_ordinals() {
        let annotations = vec![
            Annotation::new(3, "A".into(), 0, 1, FeatureMap::new()),
            Annotation::new(2, "B".into(), 0, 1, FeatureMap::new()),
        ];
        let result = Document::from_parts("d".into(), "abc".into(), FeatureMap::new(), annotations);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_parts_rejects_exhausted_ordinal() {
        let annotations = vec![Annotation::new(u64::MAX, "A".into(), 0, 1, FeatureMap::new())];
        let err = Document::from_parts("d".into(), "abc".into(), FeatureMap::new(), annotations)
            .unwrap_err();
        assert!(matches!(err, DocumentError::InvalidInput(_)));
    }

    #[test]
    fn test_blank_name_is_generated_on_every_path() {
        let direct = Document::with_name("x", "  ");
        assert!(direct.name().starts_with("Document_"));

        let built = Document::builder().text("x").name("").build().unwrap();
        assert!(built.name().starts_with("Document_"));
    }

    #[test]
    fn test_from_parts_continues_ordinals() {
        let annotations = vec![Annotation::new(4, "A".into(), 0, 1, FeatureMap::new())];
        let mut doc =
            Document::from_parts("d".into(), "abc".into(), FeatureMap::new(), annotations).unwrap();
        let handle = doc.annotate(1, 2, "B", FeatureMap::new()).unwrap();
        assert_eq!(handle.ordinal(), 5);
    }
}
