//! Invariants of the multi-annotator diff.
//!
//! - identical annotations: one agreeing set per distinct position
//! - one label change: exactly one differing set
//! - incomplete count equals positions some annotator missed
//! - summary partitions the sets without double counting

use concord::diff::{diff, AdapterSet, ArcDiffAdapter, Differ, SpanDiffAdapter};
use concord::{AnnotatedDocument, Error, LayerSpec, Position};
use std::collections::BTreeSet;

const TEXT: &str = "Alice saw Bob in Paris on Monday";

fn spans(annotator: &str, items: &[(usize, usize, &str)]) -> AnnotatedDocument {
    let mut doc = AnnotatedDocument::new("doc", annotator, TEXT);
    for (b, e, v) in items {
        doc.add_span("ne", *b, *e, "value", *v).unwrap();
    }
    doc
}

fn ne() -> Vec<LayerSpec> {
    vec![LayerSpec::span("ne", ["value"])]
}

const GOLD: [(usize, usize, &str); 4] = [(0, 5, "PER"), (10, 13, "PER"), (17, 22, "LOC"), (26, 32, "DATE")];

#[test]
fn identical_annotators_agree_everywhere() {
    for n in 1..=5 {
        let docs: Vec<AnnotatedDocument> = (0..n).map(|i| spans(&format!("ann{}", i), &GOLD)).collect();
        let refs: Vec<&AnnotatedDocument> = docs.iter().collect();
        let result = diff(&ne(), &refs).unwrap();
        assert_eq!(result.size(), GOLD.len());
        assert!(result.differing_configuration_sets().is_empty());
        assert!(result.incomplete_configuration_sets().is_empty());
        for set in result.configuration_sets() {
            assert_eq!(set.configurations().len(), 1);
            assert_eq!(set.annotators().len(), n);
        }
    }
}

#[test]
fn one_label_change_is_one_differing_set() {
    let a = spans("a", &GOLD);
    let mut changed = GOLD;
    changed[2].2 = "GPE";
    let b = spans("b", &changed);
    let result = diff(&ne(), &[&a, &b]).unwrap();
    let differing = result.differing_configuration_sets();
    assert_eq!(differing.len(), 1);
    assert_eq!(differing[0].position(), &Position::span("ne", 17, 22).unwrap());
    assert_eq!(
        differing[0].value_for("b", "value").and_then(|v| v.as_str()),
        Some("GPE")
    );
}

#[test]
fn boundary_change_splits_positions() {
    let a = spans("a", &GOLD);
    let mut shifted = GOLD;
    shifted[0] = (0, 9, "PER");
    let b = spans("b", &shifted);
    let result = diff(&ne(), &[&a, &b]).unwrap();
    assert_eq!(result.size(), 5);
    assert_eq!(result.incomplete_configuration_sets().len(), 2);
    assert!(result.differing_configuration_sets().is_empty());
}

#[test]
fn incomplete_count_and_partition() {
    let a = spans("a", &GOLD);
    let b = spans("b", &GOLD[1..]);
    let c = spans("c", &[(0, 5, "PER"), (10, 13, "ORG"), (17, 22, "LOC")]);
    let result = diff(&ne(), &[&a, &b, &c]).unwrap();

    let expected_missing: BTreeSet<_> = result
        .configuration_sets()
        .filter(|s| ["a", "b", "c"].iter().any(|x| !s.has_annotator(x)))
        .map(|s| s.position().clone())
        .collect();
    assert_eq!(result.incomplete_configuration_sets().len(), expected_missing.len());
    assert_eq!(expected_missing.len(), 2);

    let s = result.summary();
    assert_eq!(s.total, result.size());
    assert_eq!(s.complete_agreeing + s.complete_differing + s.incomplete, s.total);
    assert_eq!(s.complete_differing, 1);
}

#[test]
fn stacked_set_counted_once() {
    let a = spans("a", &GOLD);
    let mut b = spans("b", &GOLD);
    b.add_span("ne", 0, 5, "value", "ORG").unwrap();
    let result = diff(&ne(), &[&a, &b]).unwrap();
    let s = result.summary();
    assert_eq!(s.total, 4);
    assert_eq!(s.stacked, 1);
    assert_eq!(s.complete_agreeing + s.complete_differing + s.incomplete, 4);
    assert_eq!(result.stacked_configuration_sets().len(), 1);
}

#[test]
fn empty_inputs_give_empty_results() {
    let a = spans("a", &[]);
    let b = spans("b", &[]);
    let result = diff(&ne(), &[&a, &b]).unwrap();
    assert!(result.is_empty());
    assert!(diff(&ne(), &[]).unwrap().is_empty());
}

#[test]
fn missing_adapter_fails_fast() {
    let differ = Differ::new(AdapterSet::new().with(SpanDiffAdapter::new("ne", ["value"])));
    let a = spans("a", &GOLD);
    let err = differ.diff(&["ne", "pos"], &[&a]).unwrap_err();
    assert!(matches!(err, Error::MissingAdapter(_)));
}

#[test]
fn dangling_relation_endpoint_fails() {
    let mut a = AnnotatedDocument::new("doc", "a", TEXT);
    let alice = a.add_span("ne", 0, 5, "value", "PER").unwrap();
    let bob = a.add_span("ne", 10, 13, "value", "PER").unwrap();
    a.add_relation("rel", ("Arg1", alice), ("Arg2", bob), "label", "sees").unwrap();
    a.remove(bob).unwrap();

    let differ = Differ::new(AdapterSet::new().with(ArcDiffAdapter::new("rel", "Arg1", "Arg2", "label")));
    assert!(differ.diff(&["rel"], &[&a]).is_err());
}

#[test]
fn relation_endpoint_on_another_relation_fails() {
    let mut a = AnnotatedDocument::new("doc", "a", TEXT);
    let alice = a.add_span("ne", 0, 5, "value", "PER").unwrap();
    let bob = a.add_span("ne", 10, 13, "value", "PER").unwrap();
    let coref = a.add_relation("coref", ("Arg1", alice), ("Arg2", bob), "label", "same").unwrap();
    a.add_relation("dep", ("Governor", coref), ("Dependent", alice), "DependencyType", "nsubj")
        .unwrap();

    let specs = vec![LayerSpec::relation("dep", "Governor", "Dependent", "DependencyType")];
    let err = diff(&specs, &[&a]).unwrap_err();
    assert!(err.to_string().contains("not a span"));
}

#[test]
fn relation_labels_are_compared() {
    let build = |annotator: &str, label: &str| {
        let mut d = AnnotatedDocument::new("doc", annotator, TEXT);
        let alice = d.add_span("ne", 0, 5, "value", "PER").unwrap();
        let bob = d.add_span("ne", 10, 13, "value", "PER").unwrap();
        let paris = d.add_span("ne", 17, 22, "value", "LOC").unwrap();
        d.add_relation("rel", ("Arg1", alice), ("Arg2", bob), "label", label).unwrap();
        d.add_relation("rel", ("Arg1", bob), ("Arg2", paris), "label", "in").unwrap();
        d
    };
    let a = build("a", "sees");
    let b = build("b", "meets");
    let specs = vec![
        LayerSpec::span("ne", ["value"]),
        LayerSpec::relation("rel", "Arg1", "Arg2", "label"),
    ];
    let result = diff(&specs, &[&a, &b]).unwrap();
    assert_eq!(result.configuration_sets_for("rel").count(), 2);
    assert_eq!(result.configuration_sets_for("ne").count(), 3);
    let differing = result.differing_configuration_sets();
    assert_eq!(differing.len(), 1);
    assert!(differing[0].position().is_arc());
}
