use crate::{host::HostResolver, mtls::MtlsResolver, ConfigObject, Snapshot, ValidationConfig};
use mesh_validation_core::ValidationKey;

/// Everything a checker may consult: the snapshot under evaluation and the
/// mesh-wide settings.
#[derive(Copy, Clone, Debug)]
pub struct Context<'a> {
    pub snapshot: &'a Snapshot,
    pub config: &'a ValidationConfig,
}

// === impl Context ===

impl<'a> Context<'a> {
    pub fn new(snapshot: &'a Snapshot, config: &'a ValidationConfig) -> Self {
        Self { snapshot, config }
    }

    pub fn key<T: ConfigObject>(&self, obj: &T) -> ValidationKey {
        obj.key(&self.config.cluster)
    }

    pub fn hosts(&self) -> HostResolver<'a> {
        HostResolver::new(*self)
    }

    pub fn mtls(&self) -> MtlsResolver<'a> {
        MtlsResolver::new(*self)
    }

    /// Whether `obj` may be referenced from `from_ns`.
    ///
    /// Objects in ambient namespaces are only visible locally; everything
    /// else follows its exportTo list.
    pub fn is_visible<T: ConfigObject>(&self, obj: &T, from_ns: &str) -> bool {
        if self.snapshot.is_ambient(obj.namespace()) {
            return obj.namespace() == from_ns;
        }
        is_exported_to(obj.namespace(), &obj.export_to(), from_ns)
    }

    /// Whether some namespace can see both objects.
    pub fn mutually_visible<A: ConfigObject, B: ConfigObject>(&self, a: &A, b: &B) -> bool {
        if self.snapshot.namespaces.is_empty() {
            return true;
        }
        self.snapshot
            .namespaces
            .iter()
            .map(|ns| ns.name.as_str())
            .chain([a.namespace(), b.namespace()])
            .any(|ns| self.is_visible(a, ns) && self.is_visible(b, ns))
    }
}

/// Evaluates an exportTo list owned by an object in `owner_ns`.
pub fn is_exported_to(owner_ns: &str, export_to: &[&str], from_ns: &str) -> bool {
    if export_to.is_empty() {
        return true;
    }
    export_to.iter().any(|e| match *e {
        "*" => true,
        "." => owner_ns == from_ns,
        ns => ns == from_ns,
    })
}
