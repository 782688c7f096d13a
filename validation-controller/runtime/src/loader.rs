//! Reads manifests into snapshot objects.
//!
//! Files hold one or more YAML documents. Each document is dispatched on its
//! `apiVersion` group and `kind`; `List` documents are flattened. Kinds the
//! checkers do not consume are skipped with a warning.

use crate::{
    checks::Object,
    core::ObjectKind,
    k8s::{
        self,
        api::core::v1::{Container, PodSpec},
        Labels, ObjectMeta, RegistryService, ResourceExt, Workload,
    },
};
use kube::core::TypeMeta;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Label or annotation controlling sidecar injection.
pub const INJECT_LABEL: &str = "sidecar.istio.io/inject";

const PROXY_CONTAINER: &str = "istio-proxy";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document {index} is missing apiVersion or kind")]
    Untyped { index: usize },
}

/// A parsed document and the object it describes.
#[derive(Clone, Debug)]
pub struct Document {
    pub value: serde_yaml::Value,
    pub object: Object,
}

/// Reads every manifest under `paths`. Directories are walked in name order
/// and only `.yaml`, `.yml` and `.json` files are read.
pub fn load_paths(paths: &[PathBuf]) -> Result<Vec<Document>, LoadError> {
    let mut docs = Vec::new();
    for path in paths {
        for file in manifest_files(path)? {
            let source = read(&file)?;
            let parsed = parse_documents(&source)?;
            debug!(file = %file.display(), documents = parsed.len(), "Loaded manifests");
            docs.extend(parsed);
        }
    }
    Ok(docs)
}

/// Parses a multi-document YAML stream.
pub fn parse_documents(source: &str) -> Result<Vec<Document>, LoadError> {
    let mut docs = Vec::new();
    for (index, de) in serde_yaml::Deserializer::from_str(source).enumerate() {
        let value = serde_yaml::Value::deserialize(de)?;
        if value.is_null() {
            continue;
        }
        parse_value(index, value, &mut docs)?;
    }
    Ok(docs)
}

/// Reads a JSON array of registry services.
pub fn load_registry(path: &Path) -> Result<Vec<RegistryService>, LoadError> {
    let source = read(path)?;
    Ok(serde_json::from_str(&source)?)
}

fn parse_value(
    index: usize,
    value: serde_yaml::Value,
    docs: &mut Vec<Document>,
) -> Result<(), LoadError> {
    let types = serde_yaml::from_value::<TypeMeta>(value.clone())
        .map_err(|_| LoadError::Untyped { index })?;

    if types.kind == "List" {
        if let Some(items) = value.get("items").and_then(|i| i.as_sequence()) {
            for item in items {
                parse_value(index, item.clone(), docs)?;
            }
        }
        return Ok(());
    }

    let group = types
        .api_version
        .rsplit_once('/')
        .map_or("", |(group, _)| group);
    match to_object(group, &types.kind, value.clone())? {
        Some(object) => docs.push(Document { value, object }),
        None => {
            warn!(apiVersion = %types.api_version, kind = %types.kind, "Skipping unsupported document");
        }
    }
    Ok(())
}

fn to_object(
    group: &str,
    kind: &str,
    value: serde_yaml::Value,
) -> Result<Option<Object>, LoadError> {
    use serde_yaml::from_value;

    let obj = match (group, kind) {
        ("", "Namespace") => Object::Namespace(namespace(from_value(value)?)),
        ("", "ServiceAccount") => Object::ServiceAccount(from_value(value)?),
        ("", "Service") => Object::Service(from_value(value)?),
        ("", "Pod") => {
            let pod = from_value::<k8s::Pod>(value)?;
            Object::Workload(workload(
                "Pod",
                &pod.metadata,
                Some(&pod.metadata),
                pod.spec.as_ref(),
            ))
        }
        ("apps", "Deployment") => {
            let deploy = from_value::<k8s::Deployment>(value)?;
            let template = deploy.spec.as_ref().map(|s| &s.template);
            Object::Workload(workload(
                kind,
                &deploy.metadata,
                template.and_then(|t| t.metadata.as_ref()),
                template.and_then(|t| t.spec.as_ref()),
            ))
        }
        ("apps", "StatefulSet") => {
            let sts = from_value::<k8s::StatefulSet>(value)?;
            let template = sts.spec.as_ref().map(|s| &s.template);
            Object::Workload(workload(
                kind,
                &sts.metadata,
                template.and_then(|t| t.metadata.as_ref()),
                template.and_then(|t| t.spec.as_ref()),
            ))
        }
        ("apps", "DaemonSet") => {
            let ds = from_value::<k8s::DaemonSet>(value)?;
            let template = ds.spec.as_ref().map(|s| &s.template);
            Object::Workload(workload(
                kind,
                &ds.metadata,
                template.and_then(|t| t.metadata.as_ref()),
                template.and_then(|t| t.spec.as_ref()),
            ))
        }
        _ => match ObjectKind::from_group_kind(group, kind) {
            Some(ObjectKind::VirtualService) => Object::VirtualService(from_value(value)?),
            Some(ObjectKind::DestinationRule) => Object::DestinationRule(from_value(value)?),
            Some(ObjectKind::Gateway) => Object::Gateway(from_value(value)?),
            Some(ObjectKind::Sidecar) => Object::Sidecar(from_value(value)?),
            Some(ObjectKind::ServiceEntry) => Object::ServiceEntry(from_value(value)?),
            Some(ObjectKind::WorkloadEntry) => Object::WorkloadEntry(from_value(value)?),
            Some(ObjectKind::WorkloadGroup) => Object::WorkloadGroup(from_value(value)?),
            Some(ObjectKind::PeerAuthentication) => {
                Object::PeerAuthentication(from_value(value)?)
            }
            Some(ObjectKind::RequestAuthentication) => {
                Object::RequestAuthentication(from_value(value)?)
            }
            Some(ObjectKind::AuthorizationPolicy) => {
                Object::AuthorizationPolicy(from_value(value)?)
            }
            Some(ObjectKind::K8sGateway) => Object::K8sGateway(from_value(value)?),
            Some(ObjectKind::K8sHttpRoute) => Object::K8sHttpRoute(from_value(value)?),
            Some(ObjectKind::K8sGrpcRoute) => Object::K8sGrpcRoute(from_value(value)?),
            Some(ObjectKind::K8sReferenceGrant) => Object::K8sReferenceGrant(from_value(value)?),
            Some(ObjectKind::Service) | Some(ObjectKind::Workload) | None => return Ok(None),
        },
    };
    Ok(Some(obj))
}

fn namespace(ns: k8s::K8sNamespace) -> k8s::Namespace {
    let name = ns.name_any();
    k8s::Namespace::new(name, Labels::from(ns.metadata.labels))
}

/// Builds a workload from a controller's metadata and its pod template.
/// Pods pass their own metadata as the template metadata.
pub fn workload(
    kind: &str,
    meta: &ObjectMeta,
    template: Option<&ObjectMeta>,
    spec: Option<&PodSpec>,
) -> Workload {
    let labels = template.and_then(|t| t.labels.clone());
    let containers = spec.map(|s| s.containers.as_slice()).unwrap_or_default();

    let mut workload = Workload::new(
        meta.namespace.clone().unwrap_or_default(),
        meta.name.clone().unwrap_or_default(),
        Labels::from(labels),
    );
    workload.kind = kind.to_string();
    workload.istio_sidecar = has_sidecar(template, containers);
    workload.service_account = spec.and_then(|s| s.service_account_name.clone());
    workload.ports = containers
        .iter()
        .flat_map(|c| c.ports.iter().flatten())
        .map(|p| k8s::ContainerPort {
            name: p.name.clone(),
            port: p.container_port,
            protocol: p.protocol.clone().unwrap_or_else(|| "TCP".to_string()),
        })
        .collect();
    workload
}

fn has_sidecar(template: Option<&ObjectMeta>, containers: &[Container]) -> bool {
    let injected = |map: Option<&std::collections::BTreeMap<String, String>>| {
        map.and_then(|m| m.get(INJECT_LABEL))
            .map_or(false, |v| v.eq_ignore_ascii_case("true"))
    };
    if let Some(meta) = template {
        if injected(meta.labels.as_ref()) || injected(meta.annotations.as_ref()) {
            return true;
        }
    }
    containers.iter().any(|c| c.name == PROXY_CONTAINER)
}

fn manifest_files(path: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut entries = std::fs::read_dir(path)
        .map_err(io)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io)?;
    entries.sort();

    let mut files = Vec::new();
    for entry in entries {
        if entry.is_dir() {
            files.extend(manifest_files(&entry)?);
        } else if is_manifest(&entry) {
            files.push(entry);
        }
    }
    Ok(files)
}

fn is_manifest(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
