use super::*;
use crate::mtls::Scope;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn manual_mtls() -> ValidationConfig {
    ValidationConfig {
        auto_mtls: false,
        ..Default::default()
    }
}

fn mk_mesh() -> Snapshot {
    Snapshot {
        namespaces: mk_namespaces(&["bookinfo", "istio-system", "other"]),
        workloads: vec![
            mk_workload("bookinfo", "reviews-v1", &[("app", "reviews")]),
            mk_workload("bookinfo", "ratings-v1", &[("app", "ratings")]),
        ],
        ..Default::default()
    }
}

#[test]
fn strict_mesh_policy_needs_mesh_rule() {
    let mut snapshot = mk_mesh();
    snapshot.peer_authentications = vec![mk_peer_authentication(
        "istio-system",
        "default",
        None,
        MtlsMode::Strict,
    )];

    let validations = run_kind(&snapshot, &manual_mtls(), ObjectKind::PeerAuthentication);
    let pa = result(&validations, ObjectKind::PeerAuthentication, "istio-system", "default");
    assert_eq!(findings(&pa), vec![finding(MessageId::MeshPaDrMissing, "spec/mtls")]);
    assert!(!pa.valid);

    snapshot.destination_rules = vec![mk_tls_destination_rule(
        "istio-system",
        "default",
        "*.local",
        TlsMode::IstioMutual,
    )];
    let validations = run_kind(&snapshot, &manual_mtls(), ObjectKind::PeerAuthentication);
    let pa = result(&validations, ObjectKind::PeerAuthentication, "istio-system", "default");
    assert_eq!(pa, Validation::default());
}

#[rstest]
#[case::no_rule(vec![], true)]
#[case::namespace_rule(
    vec![mk_tls_destination_rule("bookinfo", "default", "*.bookinfo.svc.cluster.local", TlsMode::IstioMutual)],
    false
)]
#[case::mesh_rule(
    vec![mk_tls_destination_rule("istio-system", "default", "*.cluster.local", TlsMode::IstioMutual)],
    false
)]
#[case::other_namespace_rule(
    vec![mk_tls_destination_rule("other", "default", "*.other.svc.cluster.local", TlsMode::IstioMutual)],
    true
)]
#[case::simple_tls_rule(
    vec![mk_tls_destination_rule("bookinfo", "default", "*.bookinfo.svc.cluster.local", TlsMode::Simple)],
    true
)]
fn strict_namespace_policy_needs_rule(
    #[case] rules: Vec<DestinationRule>,
    #[case] missing: bool,
) {
    let mut snapshot = mk_mesh();
    snapshot.destination_rules = rules;
    snapshot.peer_authentications = vec![mk_peer_authentication(
        "bookinfo",
        "default",
        None,
        MtlsMode::Strict,
    )];

    let validations = run_kind(&snapshot, &manual_mtls(), ObjectKind::PeerAuthentication);
    let pa = result(&validations, ObjectKind::PeerAuthentication, "bookinfo", "default");
    let expected = if missing {
        vec![finding(MessageId::NamespacePaDrMissing, "spec/mtls")]
    } else {
        vec![]
    };
    assert_eq!(findings(&pa), expected);
}

#[test]
fn strict_workload_policy_accepts_host_rule() {
    let mut snapshot = mk_mesh();
    snapshot.services = vec![mk_service("bookinfo", "reviews")];
    snapshot.peer_authentications = vec![mk_peer_authentication(
        "bookinfo",
        "reviews",
        Some(&[("app", "reviews")]),
        MtlsMode::Strict,
    )];

    let validations = run_kind(&snapshot, &manual_mtls(), ObjectKind::PeerAuthentication);
    let pa = result(&validations, ObjectKind::PeerAuthentication, "bookinfo", "reviews");
    assert_eq!(findings(&pa), vec![finding(MessageId::NamespacePaDrMissing, "spec/mtls")]);

    snapshot.destination_rules = vec![mk_tls_destination_rule(
        "bookinfo",
        "reviews",
        "reviews",
        TlsMode::IstioMutual,
    )];
    let validations = run_kind(&snapshot, &manual_mtls(), ObjectKind::PeerAuthentication);
    let pa = result(&validations, ObjectKind::PeerAuthentication, "bookinfo", "reviews");
    assert_eq!(pa, Validation::default());
}

#[test]
fn rules_are_not_required_under_auto_mtls() {
    let mut snapshot = mk_mesh();
    snapshot.peer_authentications = vec![
        mk_peer_authentication("istio-system", "default", None, MtlsMode::Strict),
        mk_peer_authentication("bookinfo", "default", None, MtlsMode::Strict),
    ];

    let validations = run_kind(&snapshot, &Default::default(), ObjectKind::PeerAuthentication);
    assert!(validations.iter().all(|(_, v)| *v == Validation::default()));
}

#[test]
fn scopes() {
    let snapshot = Snapshot {
        peer_authentications: vec![
            mk_peer_authentication("istio-system", "mesh", None, MtlsMode::Strict),
            mk_peer_authentication("bookinfo", "namespace", Some(&[]), MtlsMode::Strict),
            mk_peer_authentication("istio-system", "ingress", Some(&[("app", "ingress")]), MtlsMode::Strict),
        ],
        ..Default::default()
    };
    let config = ValidationConfig::default();
    let ctx = Context::new(&snapshot, &config);
    let scopes = snapshot
        .peer_authentications
        .iter()
        .map(|pa| ctx.mtls().scope(pa))
        .collect::<Vec<_>>();
    assert_eq!(scopes, vec![Scope::Mesh, Scope::Namespace, Scope::Workload]);
}

#[test]
fn most_specific_mode_wins() {
    let mut snapshot = mk_mesh();
    snapshot.peer_authentications = vec![
        mk_peer_authentication("istio-system", "default", None, MtlsMode::Strict),
        mk_peer_authentication("bookinfo", "default", None, MtlsMode::Permissive),
        mk_peer_authentication("bookinfo", "reviews", Some(&[("app", "reviews")]), MtlsMode::Disable),
        mk_peer_authentication("other", "default", None, MtlsMode::Unset),
    ];
    let config = ValidationConfig::default();
    let ctx = Context::new(&snapshot, &config);
    let mtls = ctx.mtls();

    let reviews = &snapshot.workloads[0];
    let ratings = &snapshot.workloads[1];
    assert_eq!(mtls.effective_mode("bookinfo", Some(reviews)), MtlsMode::Disable);
    assert_eq!(mtls.effective_mode("bookinfo", Some(ratings)), MtlsMode::Permissive);
    assert_eq!(mtls.effective_mode("bookinfo", None), MtlsMode::Permissive);
    // UNSET inherits from the mesh.
    assert_eq!(mtls.effective_mode("other", None), MtlsMode::Strict);
    assert_eq!(mtls.effective_mode("istio-system", None), MtlsMode::Strict);
}

#[test]
fn unset_everywhere_is_unset() {
    let snapshot = mk_mesh();
    let config = ValidationConfig::default();
    let ctx = Context::new(&snapshot, &config);
    assert_eq!(ctx.mtls().effective_mode("bookinfo", None), MtlsMode::Unset);
    assert_eq!(ctx.mtls().mesh_mode(), None);
    assert!(!ctx.mtls().namespace_enabled_by_rule("bookinfo"));
}
