use super::*;
use maplit::btreemap;

#[test]
fn virtual_service_routes() {
    let vs: networking::VirtualService = serde_yaml::from_str(
        r#"
apiVersion: networking.istio.io/v1
kind: VirtualService
metadata:
  name: reviews
  namespace: bookinfo
spec:
  hosts: [reviews]
  http:
  - route:
    - destination:
        host: reviews
        subset: v1
      weight: 75
    - destination:
        host: reviews
        subset: v2
      weight: 25
  tcp:
  - route:
    - destination:
        host: ratings
"#,
    )
    .expect("virtual service must parse");

    let routes = vs
        .spec
        .routes()
        .map(|(proto, i, dests)| (proto.as_str(), i, dests.len()))
        .collect::<Vec<_>>();
    assert_eq!(routes, vec![("http", 0, 2), ("tcp", 0, 1)]);
    assert_eq!(vs.spec.http[0].route[1].weight, Some(25));
    assert!(vs.spec.gateways.is_empty());
}

#[test]
fn destination_rule_tls() {
    let dr: networking::DestinationRule = serde_yaml::from_str(
        r#"
apiVersion: networking.istio.io/v1
kind: DestinationRule
metadata:
  name: default
  namespace: istio-system
spec:
  host: "*.local"
  trafficPolicy:
    tls:
      mode: ISTIO_MUTUAL
  subsets:
  - name: v1
    labels:
      version: v1
"#,
    )
    .expect("destination rule must parse");

    assert_eq!(
        dr.spec.tls_mode(),
        Some(networking::destination_rule::TlsMode::IstioMutual)
    );
    assert!(dr.spec.has_tls_settings());
    assert_eq!(
        dr.spec.subsets[0].labels,
        btreemap! { "version".to_string() => "v1".to_string() }
    );
}

#[test]
fn peer_authentication_mode_defaults_to_unset() {
    let pa: security::PeerAuthentication = serde_yaml::from_str(
        r#"
apiVersion: security.istio.io/v1
kind: PeerAuthentication
metadata:
  name: default
  namespace: bookinfo
spec:
  selector:
    matchLabels:
      app: reviews
"#,
    )
    .expect("peer authentication must parse");

    assert_eq!(
        pa.spec.mode(),
        security::peer_authentication::MtlsMode::Unset
    );
    let selector = pa.spec.selector.expect("selector must be set").match_labels;
    assert!(selector.matches(&Labels::from_iter([("app", "reviews")])));
}

#[test]
fn route_references_default_kinds() {
    let route: gateway::K8sHttpRoute = serde_yaml::from_str(
        r#"
apiVersion: gateway.networking.k8s.io/v1
kind: HTTPRoute
metadata:
  name: http
  namespace: bookinfo
spec:
  parentRefs:
  - name: gateway
  - name: mesh-svc
    kind: Service
    group: ""
  rules:
  - backendRefs:
    - name: reviews
      port: 9080
"#,
    )
    .expect("route must parse");

    assert!(route.spec.parent_refs[0].targets_gateway());
    assert!(!route.spec.parent_refs[1].targets_gateway());
    assert!(route.spec.rules[0].backend_refs[0].targets_service());
}

#[test]
fn reference_grant_allows_service() {
    let grant: gateway::K8sReferenceGrant = serde_yaml::from_str(
        r#"
apiVersion: gateway.networking.k8s.io/v1beta1
kind: ReferenceGrant
metadata:
  name: allow
  namespace: backends
spec:
  from:
  - group: gateway.networking.k8s.io
    kind: HTTPRoute
    namespace: bookinfo
  to:
  - group: ""
    kind: Service
"#,
    )
    .expect("grant must parse");

    assert!(grant.spec.allows_service("HTTPRoute", "bookinfo", "reviews"));
    assert!(!grant.spec.allows_service("GRPCRoute", "bookinfo", "reviews"));
    assert!(!grant.spec.allows_service("HTTPRoute", "other", "reviews"));
}

#[test]
fn ambient_namespace() {
    let ns = Namespace::new(
        "bookinfo",
        Labels::from_iter([(namespace::DATAPLANE_MODE_LABEL, "ambient")]),
    );
    assert!(ns.is_ambient());
    assert!(!Namespace::from("bookinfo").is_ambient());
}
