use mesh_validation_runtime::{
    core::ObjectKind,
    k8s::RegistryService,
    loader,
    watch::{self, Loaded, Source},
    Event,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::PathBuf;

const BASE: &str = r#"
apiVersion: v1
kind: Namespace
metadata:
  name: bookinfo
---
apiVersion: networking.istio.io/v1
kind: VirtualService
metadata:
  name: reviews
  namespace: bookinfo
spec:
  hosts: [reviews]
---
apiVersion: networking.istio.io/v1
kind: DestinationRule
metadata:
  name: reviews
  namespace: bookinfo
spec:
  host: reviews
"#;

fn mk_loaded(source: &str) -> Loaded {
    Loaded {
        documents: loader::parse_documents(source).expect("documents must parse"),
        registry: Vec::new(),
    }
}

/// Summarizes events as (action, kind, name).
fn describe(events: &[Event]) -> Vec<(&'static str, ObjectKind, String)> {
    events
        .iter()
        .map(|event| match event {
            Event::Apply(obj) => {
                let key = obj
                    .key("Kubernetes")
                    .expect("applied objects are validated")
                    .expect("applied objects have identities");
                ("apply", key.kind, key.name)
            }
            Event::Delete { kind, name, .. } => ("delete", *kind, name.clone()),
            Event::Reset(_) => panic!("unexpected reset"),
        })
        .collect()
}

#[test]
fn unchanged_manifests_produce_no_events() {
    let events = watch::diff(&mk_loaded(BASE), &mk_loaded(BASE), "Kubernetes");
    assert_eq!(events.map(|e| e.len()), Some(0));
}

#[test]
fn changed_and_removed_objects_produce_events() {
    let next = BASE
        .replace("hosts: [reviews]", "hosts: [reviews, ratings]")
        .replace("kind: DestinationRule", "kind: ServiceEntry")
        .replace("host: reviews", "hosts: [reviews.example.com]");

    let events =
        watch::diff(&mk_loaded(BASE), &mk_loaded(&next), "Kubernetes").expect("no reset needed");
    assert_eq!(
        describe(&events),
        vec![
            ("delete", ObjectKind::DestinationRule, "reviews".to_string()),
            ("apply", ObjectKind::ServiceEntry, "reviews".to_string()),
            ("apply", ObjectKind::VirtualService, "reviews".to_string()),
        ]
    );
}

#[rstest]
#[case::namespace_added(format!("{BASE}---\napiVersion: v1\nkind: Namespace\nmetadata:\n  name: other\n"))]
#[case::namespace_removed(BASE.replacen("name: bookinfo", "name: other", 1))]
#[case::missing_identity(BASE.replace("  namespace: bookinfo\nspec:\n  host", "spec:\n  host"))]
fn context_changes_need_a_reset(#[case] next: String) {
    assert!(watch::diff(&mk_loaded(BASE), &mk_loaded(&next), "Kubernetes").is_none());
}

#[test]
fn registry_changes_need_a_reset() {
    let prev = mk_loaded(BASE);
    let mut next = mk_loaded(BASE);
    next.registry = vec![RegistryService::new(
        "ratings.bookinfo.svc.cluster.local",
        "bookinfo",
    )];
    assert!(watch::diff(&prev, &next, "Kubernetes").is_none());
}

#[test]
fn sources_build_snapshots_with_registry_services() {
    let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let source = Source {
        manifests: vec![fixtures.join("bookinfo")],
        registry: Some(fixtures.join("registry.json")),
    };
    let snapshot = source.load().expect("fixtures must load").snapshot();
    assert_eq!(snapshot.namespaces.len(), 2);
    assert_eq!(snapshot.services.len(), 1);
    assert_eq!(snapshot.workloads.len(), 1);
    assert_eq!(snapshot.registry_services.len(), 2);
}
