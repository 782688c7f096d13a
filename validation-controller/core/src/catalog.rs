use crate::Severity;
use std::{fmt, str::FromStr};

macro_rules! catalog {
    ($( $variant:ident => ($id:literal, $code:literal, $severity:ident, $text:literal), )+) => {
        /// Stable message identifiers. Each resolves to a KIA code, a
        /// human-readable message and a default severity.
        #[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub enum MessageId {
            $( $variant, )+
        }

        impl MessageId {
            pub const ALL: &'static [MessageId] = &[ $( MessageId::$variant, )+ ];

            /// The dotted message key, e.g. `generic.exportto.namespacenotfound`.
            pub fn id(&self) -> &'static str {
                match self { $( Self::$variant => $id, )+ }
            }

            /// The KIA code, e.g. `KIA0005`.
            pub fn code(&self) -> &'static str {
                match self { $( Self::$variant => $code, )+ }
            }

            pub fn text(&self) -> &'static str {
                match self { $( Self::$variant => $text, )+ }
            }

            pub fn default_severity(&self) -> Severity {
                match self { $( Self::$variant => Severity::$severity, )+ }
            }
        }
    };
}

catalog! {
    UnableCrossNamespace => ("validation.unable.cross-namespace", "KIA0001", Unknown,
        "Unable to verify the validity, cross-namespace validation is not supported for this field"),
    MultiMatchSelectorless => ("generic.multimatch.selectorless", "KIA0002", Error,
        "More than one selector-less object in the same namespace"),
    MultiMatchSelector => ("generic.multimatch.selector", "KIA0003", Error,
        "More than one object applied to the same workload"),
    SelectorWorkloadNotFound => ("generic.selector.workloadnotfound", "KIA0004", Warning,
        "No matching workload found for the selector in this namespace"),
    ExportToNamespaceNotFound => ("generic.exportto.namespacenotfound", "KIA0005", Error,
        "No matching namespace found or namespace is not accessible"),

    AuthzSourceNamespaceNotFound => ("authorizationpolicy.source.namespacenotfound", "KIA0101", Warning,
        "Namespace not found for this rule"),
    AuthzWrongMethod => ("authorizationpolicy.to.wrongmethod", "KIA0102", Warning,
        "Method must be one of the HTTP verbs or a fully-qualified gRPC method name"),
    AuthzNoDestination => ("authorizationpolicy.nodest.matchingregistry", "KIA0104", Error,
        "This host has no matching entry in the service registry"),
    AuthzMtlsNeeded => ("authorizationpolicy.mtls.needstobeenabled", "KIA0105", Error,
        "Mesh-wide or namespace-wide mTLS needs to be enabled for principals or namespaces to work"),
    AuthzPrincipalNotFound => ("authorizationpolicy.source.principalnotfound", "KIA0106", Error,
        "Service Account not found for this principal"),
    AuthzPrincipalRemote => ("authorizationpolicy.source.principalremote", "KIA0107", Warning,
        "Principal belongs to a different trust domain and cannot be verified"),

    DrMultiMatch => ("destinationrules.multimatch", "KIA0201", Warning,
        "More than one DestinationRules for the same host subset combination"),
    DrNoDestination => ("destinationrules.nodest.matchingregistry", "KIA0202", Error,
        "This host has no matching entry in the service registry (service, workload or service entries)"),
    DrSubsetLabels => ("destinationrules.nodest.subsetlabels", "KIA0203", Error,
        "This subset's labels are not found in any matching host"),
    DrNoTlsSettings => ("destinationrules.trafficpolicy.notlssettings", "KIA0204", Warning,
        "mTLS settings of a non-local Destination Rule are overridden"),
    DrMeshPolicyMissing => ("destinationrules.mtls.meshpolicymissing", "KIA0205", Error,
        "PeerAuthentication enabling mTLS at mesh level is missing"),
    DrNamespacePolicyMissing => ("destinationrules.mtls.nspolicymissing", "KIA0206", Error,
        "PeerAuthentication enabling namespace-wide mTLS is missing"),
    DrPolicyMtlsEnabled => ("destinationrules.mtls.policymtlsenabled", "KIA0207", Error,
        "PeerAuthentication with TLS strict mode found, it should be permissive"),
    DrMeshPolicyMtlsEnabled => ("destinationrules.mtls.meshpolicymtlsenabled", "KIA0208", Error,
        "Mesh-wide PeerAuthentication with TLS strict mode found, it should be permissive"),
    DrSubsetNoLabels => ("destinationrules.nodest.subsetnolabels", "KIA0209", Warning,
        "This subset has no labels"),

    GatewayMultiMatch => ("gateways.multimatch", "KIA0301", Warning,
        "More than one Gateway for the same host port combination"),
    GatewaySelector => ("gateways.selector", "KIA0302", Warning,
        "No matching workload found for gateway selector in this namespace"),

    MeshPaDrMissing => ("peerauthentication.mtls.destinationrulemissing", "KIA0401", Error,
        "Mesh-wide Destination Rule enabling mTLS is missing"),
    NamespacePaDrMissing => ("peerauthentications.mtls.destinationrulemissing", "KIA0501", Error,
        "Destination Rule enabling namespace-wide mTLS is missing"),

    PortNameMismatch => ("port.name.mismatch", "KIA0601", Error,
        "Port name must follow <protocol>[-suffix] form"),
    PortAppProtocolMismatch => ("port.appprotocol.mismatch", "KIA0602", Error,
        "Port appProtocol must follow <protocol> form"),
    ServiceDeploymentPortMismatch => ("service.deployment.port.mismatch", "KIA0701", Warning,
        "Deployment exposing same port as Service not found"),

    SidecarEgressServiceNotFound => ("sidecar.egress.servicenotfound", "KIA1004", Warning,
        "This host has no matching entry in the service registry"),
    SidecarGlobalSelector => ("sidecar.global.selector", "KIA1006", Warning,
        "Global default sidecar should not have workloadSelector"),

    VsHostNotFound => ("virtualservices.nohost.hostnotfound", "KIA1101", Error,
        "DestinationWeight on route doesn't have a valid service (host not found)"),
    VsNoGateway => ("virtualservices.nogateway", "KIA1102", Error,
        "VirtualService is pointing to a non-existent gateway"),
    VsSingleWeight => ("virtualservices.route.singleweight", "KIA1104", Warning,
        "The weight is assumed to be 100 because there is only one route destination"),
    VsRepeatedSubset => ("virtualservices.route.repeatedsubset", "KIA1105", Warning,
        "This host subset combination is already referenced in another route destination"),
    VsSingleHost => ("virtualservices.singlehost", "KIA1106", Warning,
        "More than one Virtual Service for same host"),
    VsSubsetNotFound => ("virtualservices.subsetpresent.subsetnotfound", "KIA1107", Warning,
        "Subset not found"),
    VsGatewayOldNomenclature => ("virtualservices.gateway.oldnomenclature", "KIA1108", Unknown,
        "Preferred nomenclature: <gateway namespace>/<gateway name>"),

    ServiceEntryAddressMatch => ("serviceentries.workloadentries.addressmatch", "KIA1201", Warning,
        "Missing one or more addresses from matching WorkloadEntries"),

    WorkloadNotCovered => ("workload.authorizationpolicy.needstobecovered", "KIA1301", Warning,
        "This workload is not covered by any authorization policy"),

    RouteNoK8sGateway => ("k8sroutes.nok8sgateway", "KIA1401", Error,
        "Route is pointing to a non-existent or inaccessible K8s gateway"),
    RouteBackendNotFound => ("k8sroutes.nohost.namenotfound", "KIA1402", Error,
        "Reference doesn't have a valid service (Service name not found)"),

    K8sGatewayListenerMultiMatch => ("k8sgateways.multimatch.listener", "KIA1501", Warning,
        "More than one K8s Gateway for the same host port combination"),
    K8sGatewayAddressMultiMatch => ("k8sgateways.multimatch.ip", "KIA1502", Warning,
        "More than one K8s Gateway for the same address and type combination"),
    K8sGatewayUniqueListener => ("k8sgateways.unique.listener", "KIA1503", Error,
        "Each listener must have a unique combination of Hostname, Port, and Protocol"),
    K8sGatewayClassNotFound => ("k8sgateways.gatewayclassnotfound", "KIA1504", Error,
        "Gateway API Class not found in Istio configuration"),

    ReferenceGrantNamespaceNotFound => ("k8sreferencegrants.from.namespacenotfound", "KIA1601", Error,
        "Namespace is not found or is not accessible"),

    WorkloadGroupServiceAccountNotFound => ("workloadgroups.serviceaccount.notfound", "KIA1701", Warning,
        "Service Account not found for this WorkloadGroup"),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown message id: {0}")]
pub struct UnknownMessage(pub String);

// === impl MessageId ===

impl MessageId {
    /// Looks a message up by its KIA code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.code() == code)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MessageId {
    type Err = UnknownMessage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.id() == s)
            .ok_or_else(|| UnknownMessage(s.to_string()))
    }
}
