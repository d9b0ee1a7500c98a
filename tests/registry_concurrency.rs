//! Concurrency tests for the index registry and for diffing shared inputs.

use concord::diff::{diff, Differ};
use concord::search::{AnnotationIndex, IndexRegistry};
use concord::{AnnotatedDocument, LayerSpec};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn registry_and_differ_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<IndexRegistry>();
    assert_send_sync::<AnnotationIndex>();
    assert_send_sync::<Differ>();
}

#[test]
fn concurrent_open_builds_once() {
    let registry = Arc::new(IndexRegistry::new());
    let builds = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let builds = Arc::clone(&builds);
            thread::spawn(move || {
                registry
                    .open(1, || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Ok(AnnotationIndex::new())
                    })
                    .unwrap()
            })
        })
        .collect();

    let indexes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    for index in &indexes[1..] {
        assert!(Arc::ptr_eq(&indexes[0], index));
    }
}

#[test]
fn open_close_churn_across_projects() {
    let registry = Arc::new(IndexRegistry::new());
    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for round in 0..50u64 {
                    let project = t * 1000 + round % 5;
                    registry.open(project, || Ok(AnnotationIndex::new())).unwrap();
                    assert!(registry.is_open(project));
                    if round % 2 == 0 {
                        registry.close(project);
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let open = registry.open_projects();
    let mut sorted = open.clone();
    sorted.sort_unstable();
    assert_eq!(open, sorted);
    for p in open {
        assert!(registry.lookup(p).is_some());
    }
}

#[test]
fn shared_documents_diffed_from_many_threads() {
    let mut a = AnnotatedDocument::new("doc", "a", "one two three");
    let mut b = AnnotatedDocument::new("doc", "b", "one two three");
    for (i, (b0, e0)) in [(0, 3), (4, 7), (8, 13)].into_iter().enumerate() {
        a.add_span("pos", b0, e0, "PosValue", "NN").unwrap();
        b.add_span("pos", b0, e0, "PosValue", if i == 1 { "VB" } else { "NN" }).unwrap();
    }
    let docs = Arc::new((a, b));
    let specs = Arc::new(vec![LayerSpec::span("pos", ["PosValue"])]);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let docs = Arc::clone(&docs);
            let specs = Arc::clone(&specs);
            thread::spawn(move || {
                let result = diff(&specs, &[&docs.0, &docs.1]).unwrap();
                result.differing_configuration_sets().len()
            })
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), 1);
    }
}
