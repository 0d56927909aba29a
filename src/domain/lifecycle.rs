//! Lifecycle events from the deployment tooling.
//!
//! Create and Update mean "apply the desired state"; Delete is accepted and
//! ignored: migrations are never rolled back and credentials never revoked.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent<P> {
    pub request_type: RequestType,
    pub resource_properties: P,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
}

/// The operation a lifecycle event asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation<P> {
    Apply(P),
    Remove(Option<String>),
}

impl<P> LifecycleEvent<P> {
    pub fn into_operation(self) -> Operation<P> {
        match self.request_type {
            RequestType::Create | RequestType::Update => Operation::Apply(self.resource_properties),
            RequestType::Delete => Operation::Remove(self.physical_resource_id),
        }
    }
}

/// Properties of the migration resource.
///
/// `fingerprint` is the deployer's view of the tree and only forces a new
/// invocation; `previous_fingerprint` is the idempotency key that skips
/// the run when it matches the tree on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MigrationProperties {
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub previous_fingerprint: Option<String>,
}

/// Body of a migration invocation: a lifecycle event or `{ "hash": ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MigrationInvocation {
    Lifecycle(LifecycleEvent<MigrationProperties>),
    Direct {
        #[serde(default)]
        hash: Option<String>,
        #[serde(default, rename = "previousFingerprint")]
        previous_fingerprint: Option<String>,
    },
}

impl MigrationInvocation {
    pub fn into_operation(self) -> Operation<MigrationProperties> {
        match self {
            MigrationInvocation::Lifecycle(event) => event.into_operation(),
            MigrationInvocation::Direct {
                hash,
                previous_fingerprint,
            } => Operation::Apply(MigrationProperties {
                fingerprint: hash,
                previous_fingerprint,
            }),
        }
    }
}
