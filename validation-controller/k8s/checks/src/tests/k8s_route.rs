use super::*;
use k8s::{
    gateway::{
        grpc_route::GrpcRouteRule,
        http_route::HttpRouteRule,
        reference_grant::{ReferenceGrantFrom, ReferenceGrantTo},
        BackendRef, K8sGrpcRoute, K8sGrpcRouteSpec, K8sHttpRoute, K8sHttpRouteSpec,
        K8sReferenceGrant, K8sReferenceGrantSpec, ParentReference,
    },
    RegistryService,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn mk_parent(name: &str) -> ParentReference {
    ParentReference {
        name: name.to_string(),
        ..Default::default()
    }
}

fn mk_backend(name: &str, ns: Option<&str>) -> BackendRef {
    BackendRef {
        name: name.to_string(),
        namespace: ns.map(Into::into),
        port: Some(9080),
        ..Default::default()
    }
}

fn mk_grant(ns: &str, from_kind: &str, from_ns: &str) -> K8sReferenceGrant {
    K8sReferenceGrant {
        metadata: mk_meta(ns, "allow-routes"),
        spec: K8sReferenceGrantSpec {
            from: vec![ReferenceGrantFrom {
                group: k8s::gateway::GROUP.to_string(),
                kind: from_kind.to_string(),
                namespace: from_ns.to_string(),
            }],
            to: vec![ReferenceGrantTo {
                group: String::new(),
                kind: "Service".to_string(),
                name: None,
            }],
        },
    }
}

fn mk_http_route(backends: Vec<BackendRef>) -> K8sHttpRoute {
    K8sHttpRoute {
        metadata: mk_meta("bookinfo", "reviews"),
        spec: K8sHttpRouteSpec {
            parent_refs: vec![
                mk_parent("gateway"),
                mk_parent("missing"),
                ParentReference {
                    group: Some(String::new()),
                    kind: Some("Service".to_string()),
                    ..mk_parent("reviews")
                },
            ],
            rules: vec![HttpRouteRule {
                backend_refs: backends,
            }],
            ..Default::default()
        },
    }
}

fn mk_snapshot() -> Snapshot {
    Snapshot {
        namespaces: mk_namespaces(&["bookinfo", "backends"]),
        services: vec![mk_service("bookinfo", "reviews"), mk_service("backends", "ratings")],
        k8s_gateways: vec![mk_k8s_gateway("bookinfo", "gateway", "istio")],
        ..Default::default()
    }
}

#[test]
fn http_route_references() {
    let mut snapshot = mk_snapshot();
    snapshot.k8s_http_routes = vec![mk_http_route(vec![
        mk_backend("reviews", None),
        mk_backend("missing", None),
        mk_backend("ratings", Some("backends")),
    ])];

    let validations = run_kind(&snapshot, &Default::default(), ObjectKind::K8sHttpRoute);
    let route = result(&validations, ObjectKind::K8sHttpRoute, "bookinfo", "reviews");
    assert_eq!(
        findings(&route),
        vec![
            finding(MessageId::RouteNoK8sGateway, "spec/parentRefs[1]/name"),
            finding(MessageId::RouteBackendNotFound, "spec/rules[0]/backendRefs[1]/name"),
            finding(MessageId::RouteBackendNotFound, "spec/rules[0]/backendRefs[2]/name"),
        ]
    );
    assert!(!route.valid);
}

#[rstest]
#[case::granted(mk_grant("backends", "HTTPRoute", "bookinfo"), true)]
#[case::other_kind(mk_grant("backends", "GRPCRoute", "bookinfo"), false)]
#[case::other_source(mk_grant("backends", "HTTPRoute", "other"), false)]
#[case::grant_in_route_namespace(mk_grant("bookinfo", "HTTPRoute", "bookinfo"), false)]
fn cross_namespace_backends_need_grant(#[case] grant: K8sReferenceGrant, #[case] allowed: bool) {
    let mut snapshot = mk_snapshot();
    snapshot.k8s_reference_grants = vec![grant];
    let mut route = mk_http_route(vec![mk_backend("ratings", Some("backends"))]);
    route.spec.parent_refs.truncate(1);
    snapshot.k8s_http_routes = vec![route];

    let validations = run_kind(&snapshot, &Default::default(), ObjectKind::K8sHttpRoute);
    let route = result(&validations, ObjectKind::K8sHttpRoute, "bookinfo", "reviews");
    assert_eq!(route.valid, allowed, "{:?}", route.checks);
}

#[test]
fn grpc_routes_need_their_own_grant() {
    let mut snapshot = mk_snapshot();
    snapshot.k8s_reference_grants = vec![mk_grant("backends", "HTTPRoute", "bookinfo")];
    snapshot.k8s_grpc_routes = vec![K8sGrpcRoute {
        metadata: mk_meta("bookinfo", "ratings"),
        spec: K8sGrpcRouteSpec {
            parent_refs: vec![mk_parent("gateway")],
            rules: vec![GrpcRouteRule {
                backend_refs: vec![mk_backend("ratings", Some("backends"))],
            }],
            ..Default::default()
        },
    }];

    let validations = run_kind(&snapshot, &Default::default(), ObjectKind::K8sGrpcRoute);
    let route = result(&validations, ObjectKind::K8sGrpcRoute, "bookinfo", "ratings");
    assert_eq!(
        findings(&route),
        vec![finding(MessageId::RouteBackendNotFound, "spec/rules[0]/backendRefs[0]/name")]
    );
}

#[rstest]
#[case::local_cluster(None, true)]
#[case::same_cluster(Some("Kubernetes"), true)]
#[case::remote_cluster(Some("east"), false)]
fn backends_resolve_through_registry(#[case] cluster: Option<&str>, #[case] found: bool) {
    let mut snapshot = mk_snapshot();
    snapshot.registry_services = vec![RegistryService {
        cluster: cluster.map(Into::into),
        ..RegistryService::new("details.bookinfo.svc.cluster.local", "bookinfo")
    }];
    let mut route = mk_http_route(vec![mk_backend("details", None)]);
    route.spec.parent_refs.truncate(1);
    snapshot.k8s_http_routes = vec![route];

    let validations = run_kind(&snapshot, &Default::default(), ObjectKind::K8sHttpRoute);
    let route = result(&validations, ObjectKind::K8sHttpRoute, "bookinfo", "reviews");
    assert_eq!(route.valid, found);
}

#[test]
fn reference_grant_source_namespaces_must_exist() {
    let mut grant = mk_grant("backends", "HTTPRoute", "bookinfo");
    grant.spec.from.push(ReferenceGrantFrom {
        group: k8s::gateway::GROUP.to_string(),
        kind: "HTTPRoute".to_string(),
        namespace: "missing".to_string(),
    });
    let snapshot = Snapshot {
        namespaces: mk_namespaces(&["bookinfo", "backends"]),
        k8s_reference_grants: vec![grant],
        ..Default::default()
    };

    let validations = run_kind(&snapshot, &Default::default(), ObjectKind::K8sReferenceGrant);
    let grant = result(&validations, ObjectKind::K8sReferenceGrant, "backends", "allow-routes");
    assert_eq!(
        findings(&grant),
        vec![finding(MessageId::ReferenceGrantNamespaceNotFound, "spec/from[1]/namespace")]
    );
    assert!(!grant.valid);
}
