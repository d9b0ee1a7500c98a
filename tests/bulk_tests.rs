//! Search hits feeding the bulk operator, checked through the diff.

use concord::bulk::{BulkAction, BulkOperator, BulkOptions};
use concord::diff::{diff, FeatureValues};
use concord::search::{AnnotationIndex, IndexRegistry};
use concord::{AnnotatedDocument, AnnotationId, FeatureValue, LayerSpec, Offsets};

const TEXT: &str = "Paris is nice. Berlin is big. Paris again.";

fn curator_docs() -> Vec<AnnotatedDocument> {
    let mut d1 = AnnotatedDocument::new("d1", "curator", TEXT);
    d1.add_span("ne", 0, 5, "value", "LOC").unwrap();
    d1.add_span("ne", 15, 21, "value", "LOC").unwrap();
    d1.add_span("ne", 30, 35, "value", "PER").unwrap();

    let mut d2 = AnnotatedDocument::new("d2", "curator", TEXT);
    d2.add_span("ne", 30, 35, "value", "PER").unwrap();
    vec![d1, d2]
}

fn state(value: &str) -> FeatureValues {
    let mut s = FeatureValues::new();
    s.insert("value".into(), FeatureValue::from(value));
    s
}

#[test]
fn relabel_search_hits() {
    let layer = LayerSpec::span("ne", ["value"]);
    let mut docs = curator_docs();

    let registry = IndexRegistry::new();
    let index = registry
        .open(42, || Ok(AnnotationIndex::from_documents(&docs)))
        .unwrap();
    let hits = index.search("ne", "value", &FeatureValue::from("PER"));
    assert_eq!(hits.values().map(Vec::len).sum::<usize>(), 2);

    let op = BulkOperator::new(&layer, BulkAction::CreateOrOverride, state("LOC"))
        .unwrap()
        .with_options(BulkOptions {
            override_existing: true,
            ..BulkOptions::default()
        });
    let report = op.apply(&mut docs, &hits).unwrap();
    assert_eq!(report.total.updated, 2);
    assert_eq!(report.total.created, 0);
    assert_eq!(report.documents.len(), 2);

    // The stale index still answers the old query until it is rebuilt.
    assert!(!registry.lookup(42).unwrap().search("ne", "value", &FeatureValue::from("PER")).is_empty());
    registry.replace(42, AnnotationIndex::from_documents(&docs));
    assert!(registry.lookup(42).unwrap().search("ne", "value", &FeatureValue::from("PER")).is_empty());
}

#[test]
fn bulk_created_annotations_align_with_another_annotator() {
    let layer = LayerSpec::span("ne", ["value"]);
    let mut mine = vec![AnnotatedDocument::new("d1", "alice", TEXT)];
    let mut theirs = AnnotatedDocument::new("d1", "bob", TEXT);
    theirs.add_span("ne", 0, 5, "value", "LOC").unwrap();
    theirs.add_span("ne", 36, 41, "value", "LOC").unwrap();

    // Copy bob's LOC hits into alice's document.
    let index = AnnotationIndex::from_documents([&theirs]);
    let hits = index.search("ne", "value", &FeatureValue::from("LOC"));
    let op = BulkOperator::new(&layer, BulkAction::CreateOrOverride, state("LOC")).unwrap();
    let report = op.apply(&mut mine, &hits).unwrap();
    assert_eq!(report.total.created, 2);

    let result = diff(&[layer], &[&mine[0], &theirs]).unwrap();
    assert_eq!(result.size(), 2);
    assert_eq!(result.summary().complete_agreeing, 2);
}

#[test]
fn repeated_create_without_stacking_is_idempotent() {
    let layer = LayerSpec::span("ne", ["value"]);
    let mut docs = curator_docs();
    let index = AnnotationIndex::from_documents(&docs);
    let hits = index.search("ne", "value", &FeatureValue::from("LOC"));
    let op = BulkOperator::new(&layer, BulkAction::CreateOrOverride, state("LOC")).unwrap();

    let before = docs[0].len();
    let report = op.apply(&mut docs, &hits).unwrap();
    assert_eq!(report.total.changed(), 0);
    assert_eq!(report.total.skipped, 2);
    assert_eq!(docs[0].len(), before);
}

#[test]
fn delete_only_matching() {
    let layer = LayerSpec::span("ne", ["value"]);
    let mut docs = curator_docs();
    let mut hits = concord::search::HitsByDocument::new();
    hits.insert("d1".into(), vec![Offsets::new(0, 5), Offsets::new(30, 35)]);

    let op = BulkOperator::new(&layer, BulkAction::Delete, state("LOC"))
        .unwrap()
        .with_options(BulkOptions {
            only_matching_features: true,
            ..BulkOptions::default()
        });
    let report = op.apply(&mut docs, &hits).unwrap();
    assert_eq!(report.total.deleted, 1);
    assert_eq!(report.total.skipped, 1);
    assert_eq!(docs[0].select_at("ne", Offsets::new(30, 35)).len(), 1);
    assert!(docs[0].select_at("ne", Offsets::new(0, 5)).is_empty());
}

#[test]
fn unresolved_reference_leaves_every_document_unchanged() {
    let layer = LayerSpec::span("ne", ["value"]);
    let mut d1 = AnnotatedDocument::new("d1", "curator", TEXT);
    d1.add_span("ne", 0, 5, "value", "LOC").unwrap();
    let d2 = AnnotatedDocument::new("d2", "curator", TEXT);
    let mut docs = vec![d1, d2];
    let before: Vec<String> = docs.iter().map(|d| d.to_json().unwrap()).collect();

    let mut linked = state("PER");
    linked.insert("link".into(), FeatureValue::Ref { target: AnnotationId(1) });
    let mut hits = concord::search::HitsByDocument::new();
    hits.insert("d1".into(), vec![Offsets::new(15, 21)]);
    hits.insert("d2".into(), vec![Offsets::new(15, 21)]);

    let op = BulkOperator::new(&layer, BulkAction::CreateOrOverride, linked).unwrap();
    assert!(op.apply(&mut docs, &hits).is_err());
    let after: Vec<String> = docs.iter().map(|d| d.to_json().unwrap()).collect();
    assert_eq!(before, after);
}
