use mesh_validation_runtime::{
    checks::{Object, Registry as CheckRegistry, Snapshot, ValidationConfig},
    core::{KeyError, ObjectKind, Validation, ValidationKey},
    loader, Engine, EngineError, EngineMetrics, Event, Reconciler, ValidationStore,
};
use pretty_assertions::assert_eq;
use prometheus_client::registry::Registry;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::mpsc;

fn mk_snapshot() -> Snapshot {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/bookinfo");
    loader::load_paths(&[path])
        .expect("fixtures must load")
        .into_iter()
        .map(|doc| doc.object)
        .collect()
}

fn mk_object(yaml: &str) -> Object {
    let mut docs = loader::parse_documents(yaml).expect("document must parse");
    assert_eq!(docs.len(), 1);
    docs.remove(0).object
}

fn mk_key(kind: ObjectKind, name: &str) -> ValidationKey {
    ValidationKey::new("Kubernetes", Some("bookinfo"), kind, Some(name)).expect("valid key")
}

async fn mk_reconciler() -> (Reconciler, ValidationStore) {
    let snapshot = mk_snapshot();
    let config = Arc::new(ValidationConfig::default());
    let engine = Engine::new(
        CheckRegistry::default(),
        EngineMetrics::register(&mut Registry::default()),
    );
    let validations = engine
        .evaluate(Arc::new(snapshot.clone()), config.clone(), None)
        .await
        .expect("snapshot must validate");

    let store = ValidationStore::default();
    store.reset(validations);
    (
        Reconciler::new(engine, config, snapshot, store.clone()),
        store,
    )
}

const CUSTOMER: &str = r#"
apiVersion: v1
kind: Service
metadata:
  name: customer
  namespace: bookinfo
spec:
  selector:
    app: customer
  ports:
  - name: http
    port: 9080
"#;

#[tokio::test(flavor = "multi_thread")]
async fn applies_revalidate_only_the_applied_object() {
    let (mut reconciler, store) = mk_reconciler().await;
    assert_eq!(store.len(), 4);
    let vs_key = mk_key(ObjectKind::VirtualService, "reviews");
    assert!(!store.get(&vs_key).expect("must exist").valid);

    reconciler
        .reconcile(Event::Apply(mk_object(CUSTOMER)))
        .await
        .expect("service must apply");
    assert_eq!(store.len(), 5);
    assert_eq!(
        store.get(&mk_key(ObjectKind::Service, "customer")),
        Some(Validation::default())
    );
    // The virtual service keeps its previous result until it is applied.
    assert!(!store.get(&vs_key).expect("must exist").valid);

    let vs = reconciler.snapshot().virtual_services[0].clone();
    reconciler
        .reconcile(Event::Apply(Object::VirtualService(vs)))
        .await
        .expect("virtual service must apply");
    assert_eq!(store.get(&vs_key), Some(Validation::default()));
    assert_eq!(store.len(), 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn deletes_remove_results() {
    let (mut reconciler, store) = mk_reconciler().await;
    let key = mk_key(ObjectKind::DestinationRule, "reviews");
    assert!(store.get(&key).is_some());

    reconciler
        .reconcile(Event::Delete {
            kind: ObjectKind::DestinationRule,
            namespace: "bookinfo".to_string(),
            name: "reviews".to_string(),
        })
        .await
        .expect("delete must succeed");
    assert_eq!(store.get(&key), None);
    assert!(reconciler.snapshot().destination_rules.is_empty());
    assert_eq!(store.for_namespace("Kubernetes", "bookinfo").len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn objects_without_namespace_are_rejected() {
    let (mut reconciler, store) = mk_reconciler().await;
    let error = reconciler
        .reconcile(Event::Apply(mk_object(
            r#"
apiVersion: networking.istio.io/v1
kind: VirtualService
metadata:
  name: ratings
spec:
  hosts: [ratings]
"#,
        )))
        .await
        .unwrap_err();
    assert!(
        matches!(
            error,
            EngineError::Identity(KeyError::MissingNamespace {
                kind: ObjectKind::VirtualService,
                ..
            })
        ),
        "{error}"
    );
    assert_eq!(store.len(), 4);
    assert_eq!(reconciler.snapshot().virtual_services.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn resets_reevaluate_everything() {
    let (mut reconciler, store) = mk_reconciler().await;
    let mut snapshot = reconciler.snapshot().clone();
    snapshot.apply(mk_object(CUSTOMER));

    reconciler
        .reconcile(Event::Reset(snapshot))
        .await
        .expect("reset must succeed");
    assert_eq!(store.len(), 5);
    assert_eq!(
        store.get(&mk_key(ObjectKind::VirtualService, "reviews")),
        Some(Validation::default())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn runs_until_the_sender_is_dropped() {
    let (reconciler, store) = mk_reconciler().await;
    let (tx, rx) = mpsc::channel(8);
    let task = tokio::spawn(reconciler.run(rx));

    tx.send(Event::Apply(mk_object(CUSTOMER)))
        .await
        .expect("reconciler must be running");
    tx.send(Event::Delete {
        kind: ObjectKind::Service,
        namespace: "bookinfo".to_string(),
        name: "reviews".to_string(),
    })
    .await
    .expect("reconciler must be running");
    drop(tx);
    task.await.expect("reconciler must not panic");

    assert!(store.get(&mk_key(ObjectKind::Service, "customer")).is_some());
    assert_eq!(store.get(&mk_key(ObjectKind::Service, "reviews")), None);
    let summary = store.summarize();
    assert_eq!(
        summary[&("Kubernetes".to_string(), "bookinfo".to_string())].object_count,
        3
    );
}
