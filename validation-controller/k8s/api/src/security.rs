//! `security.istio.io` resources.

pub mod authorization_policy;
pub mod peer_authentication;
pub mod request_authentication;

pub use self::{
    authorization_policy::{AuthorizationPolicy, AuthorizationPolicySpec},
    peer_authentication::{PeerAuthentication, PeerAuthenticationSpec},
    request_authentication::{RequestAuthentication, RequestAuthenticationSpec},
};
use crate::labels::Selector;

/// `selector: { matchLabels: {...} }` as used by the security resources.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicySelector {
    #[serde(default)]
    pub match_labels: Selector,
}
