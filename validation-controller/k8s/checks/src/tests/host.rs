use super::*;
use crate::host::{covers, overlaps, Host};
use k8s::{
    networking::{ServiceEntry, ServiceEntrySpec},
    RegistryService,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn mk_snapshot() -> Snapshot {
    Snapshot {
        namespaces: vec![
            Namespace::from("bookinfo"),
            Namespace::from("other"),
            Namespace::new(
                "ambient",
                Labels::from(mk_labels(&[(k8s::namespace::DATAPLANE_MODE_LABEL, "ambient")])),
            ),
        ],
        services: vec![mk_service("bookinfo", "reviews")],
        ..Default::default()
    }
}

fn service(name: &str, namespace: &str) -> Host {
    Host::Service {
        name: name.to_string(),
        namespace: namespace.to_string(),
    }
}

#[rstest]
#[case::short_name("reviews", service("reviews", "bookinfo"))]
#[case::namespaced("reviews.other", service("reviews", "other"))]
#[case::svc("reviews.other.svc", service("reviews", "other"))]
#[case::qualified("reviews.other.svc.cluster.local", service("reviews", "other"))]
#[case::foreign_domain("reviews.other.svc.cluster.remote", Host::External("reviews.other.svc.cluster.remote".to_string()))]
#[case::dns_name("wikipedia.org", Host::External("wikipedia.org".to_string()))]
#[case::mesh_wildcard("*.local", Host::Wildcard("*.local".to_string()))]
#[case::any("*", Host::Wildcard("*".to_string()))]
fn parse(#[case] host: &str, #[case] expected: Host) {
    let snapshot = mk_snapshot();
    let config = ValidationConfig::default();
    let ctx = Context::new(&snapshot, &config);
    assert_eq!(ctx.hosts().parse(host, "bookinfo"), expected);
}

#[rstest]
#[case::exact("reviews.example.com", "reviews.example.com", true)]
#[case::any("*", "reviews.example.com", true)]
#[case::suffix("*.example.com", "reviews.example.com", true)]
#[case::narrower_wildcard("*.com", "*.example.com", true)]
#[case::broader_wildcard("*.example.com", "*.com", false)]
#[case::bare_domain("*.example.com", "example.com", false)]
#[case::different("ratings.example.com", "reviews.example.com", false)]
fn wildcard_coverage(#[case] pattern: &str, #[case] host: &str, #[case] expected: bool) {
    assert_eq!(covers(pattern, host), expected);
    if expected {
        assert!(overlaps(pattern, host));
        assert!(overlaps(host, pattern));
    }
}

#[rstest]
#[case::short_name("reviews", true)]
#[case::qualified("reviews.bookinfo.svc.cluster.local", true)]
#[case::missing_service("customer", false)]
#[case::namespace_wildcard("*.bookinfo.svc.cluster.local", true)]
#[case::covering_wildcard("*.svc.cluster.local", true)]
#[case::external("wikipedia.org", false)]
fn resolution(#[case] host: &str, #[case] resolves: bool) {
    let snapshot = mk_snapshot();
    let config = ValidationConfig::default();
    let ctx = Context::new(&snapshot, &config);
    assert_eq!(ctx.hosts().resolves(host, "bookinfo"), resolves);
}

#[rstest]
#[case::local_cluster(None, &[], "bookinfo", true)]
#[case::same_cluster(Some("Kubernetes"), &[], "bookinfo", true)]
#[case::remote_cluster(Some("east"), &[], "bookinfo", false)]
#[case::exported_locally(None, &["."], "bookinfo", false)]
#[case::exported_locally_same_namespace(None, &["."], "mesh2-bookinfo", true)]
#[case::exported_to_namespace(None, &["bookinfo"], "bookinfo", true)]
fn registry_hosts(
    #[case] cluster: Option<&str>,
    #[case] export_to: &[&str],
    #[case] from_ns: &str,
    #[case] resolves: bool,
) {
    let mut snapshot = mk_snapshot();
    snapshot.namespaces.push(Namespace::from("mesh2-bookinfo"));
    snapshot.registry_services = vec![RegistryService {
        cluster: cluster.map(Into::into),
        ..RegistryService::new("ratings.mesh2-bookinfo.svc.mesh1-imports.local", "mesh2-bookinfo")
            .exported_to(export_to.iter().copied())
    }];
    let config = ValidationConfig::default();
    let ctx = Context::new(&snapshot, &config);
    assert_eq!(
        ctx.hosts()
            .resolves("ratings.mesh2-bookinfo.svc.mesh1-imports.local", from_ns),
        resolves
    );
}

#[test]
fn service_entry_short_hosts_expand_in_their_namespace() {
    let mut snapshot = mk_snapshot();
    snapshot.service_entries = vec![ServiceEntry {
        metadata: mk_meta("other", "legacy"),
        spec: ServiceEntrySpec {
            hosts: vec!["legacy".to_string()],
            ..Default::default()
        },
    }];
    let config = ValidationConfig::default();
    let ctx = Context::new(&snapshot, &config);
    assert!(ctx.hosts().resolves("legacy.other", "bookinfo"));
    assert!(!ctx.hosts().resolves("legacy", "bookinfo"));
}

#[test]
fn ambient_objects_are_visible_locally() {
    let mut snapshot = mk_snapshot();
    snapshot.services.push(mk_service("ambient", "ratings"));
    let config = ValidationConfig::default();
    let ctx = Context::new(&snapshot, &config);

    let ratings = &snapshot.services[1];
    assert!(ctx.is_visible(ratings, "ambient"));
    assert!(!ctx.is_visible(ratings, "bookinfo"));
    assert!(ctx.hosts().resolves("ratings", "ambient"));
    assert!(!ctx.hosts().resolves("ratings.ambient.svc.cluster.local", "bookinfo"));
}

#[rstest]
#[case::everywhere(&[], "other", true)]
#[case::any(&["*"], "other", true)]
#[case::local(&["."], "bookinfo", true)]
#[case::local_elsewhere(&["."], "other", false)]
#[case::named(&["other"], "other", true)]
#[case::named_elsewhere(&["other"], "bookinfo", false)]
fn export_to_visibility(#[case] export_to: &[&str], #[case] from_ns: &str, #[case] visible: bool) {
    assert_eq!(crate::is_exported_to("bookinfo", export_to, from_ns), visible);
}

#[test]
fn mutual_visibility() {
    let mut a = mk_destination_rule("bookinfo", "a", "reviews");
    a.spec.export_to = vec![".".to_string()];
    let mut b = mk_destination_rule("other", "b", "reviews.bookinfo.svc.cluster.local");
    b.spec.export_to = vec!["bookinfo".to_string()];
    let mut c = mk_destination_rule("other", "c", "reviews.bookinfo.svc.cluster.local");
    c.spec.export_to = vec![".".to_string()];

    let snapshot = mk_snapshot();
    let config = ValidationConfig::default();
    let ctx = Context::new(&snapshot, &config);
    assert!(ctx.mutually_visible(&a, &b));
    assert!(!ctx.mutually_visible(&a, &c));

    // An empty namespace set places no restriction.
    let empty = Snapshot::default();
    let ctx = Context::new(&empty, &config);
    assert!(ctx.mutually_visible(&a, &c));
}

#[rstest]
#[case::known_service("reviews.bookinfo", true)]
#[case::unknown_service("ratings.bookinfo", false)]
fn namespaced_hosts_resolve_without_namespaces(#[case] host: &str, #[case] resolves: bool) {
    let snapshot = Snapshot {
        services: vec![mk_service("bookinfo", "reviews")],
        virtual_services: vec![mk_virtual_service(
            "bookinfo",
            "reviews",
            VirtualServiceSpec {
                hosts: vec!["reviews".to_string()],
                http: vec![mk_http_route(&[(host, None, None)])],
                ..Default::default()
            },
        )],
        ..Default::default()
    };

    let validations = run_kind(&snapshot, &Default::default(), ObjectKind::VirtualService);
    let vs = result(&validations, ObjectKind::VirtualService, "bookinfo", "reviews");
    let expected = if resolves {
        vec![]
    } else {
        vec![(
            MessageId::VsHostNotFound.code(),
            Severity::Warning,
            "spec/http[0]/route[0]/destination/host".to_string(),
        )]
    };
    assert_eq!(findings(&vs), expected);
    assert_eq!(vs.valid, resolves);
}

#[test]
fn namespaced_registry_hosts_expand_without_namespaces() {
    let snapshot = Snapshot {
        registry_services: vec![RegistryService::new(
            "reviews.test.svc.cluster.local",
            "test",
        )],
        ..Default::default()
    };
    let config = ValidationConfig::default();
    let ctx = Context::new(&snapshot, &config);
    assert_eq!(ctx.hosts().parse("reviews.test", "test"), service("reviews", "test"));
    assert_eq!(
        ctx.hosts().parse("host1.test", "test2"),
        Host::External("host1.test".to_string())
    );
    assert!(ctx.hosts().resolves("reviews.test", "test"));
}
