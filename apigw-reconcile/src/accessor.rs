//! Seams between the reconcilers, the declared state and the remote service.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::RemoteError;
use crate::patch::PatchOp;
use crate::state::Directive;

/// A record as returned by the remote collection.
pub trait RemoteResource:
    Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Body sent to the collection to create a record.
    type Create: Debug + Send + Sync + Serialize;

    /// Human-readable kind used in logs and error messages.
    const KIND: &'static str;
    /// Key under which the record is reported.
    const RESULT_KEY: &'static str;
    /// Whether the identifying key doubles as the remote id, so a direct get
    /// can replace a full listing.
    const KEY_IS_ID: bool = false;

    /// Opaque remote identifier.
    fn id(&self) -> &str;

    /// Identifying attribute matched against the desired state.
    fn key(&self) -> &str;

    /// Key under which the record is created with a `PUT` to its own
    /// address, for kinds the service does not create by `POST` to the
    /// collection.
    fn put_key(_request: &Self::Create) -> Option<&str> {
        None
    }
}

/// Declared target configuration for one resource.
pub trait DesiredState: Debug + Send + Sync {
    type Resource: RemoteResource;

    fn key(&self) -> &str;

    fn directive(&self) -> Directive;

    /// Checks the input before any remote call.
    fn validate(&self) -> crate::error::Result<()> {
        Ok(())
    }

    /// Patches converging `remote` to this state. Empty when nothing differs.
    fn patches(&self, remote: &Self::Resource) -> Vec<PatchOp>;

    fn create_request(&self) -> <Self::Resource as RemoteResource>::Create;
}

/// Capability set the reconcilers need from a remote collection.
///
/// Implementations own transport concerns: pagination, timeouts and any
/// retry policy live here, not in the reconcilers.
#[async_trait]
pub trait RemoteAccessor: Send + Sync {
    type Resource: RemoteResource;

    /// Every record of the collection, across all pages.
    async fn list(&self) -> Result<Vec<Self::Resource>, RemoteError>;

    /// The record whose key equals `key`, if any.
    async fn find(&self, key: &str) -> Result<Option<Self::Resource>, RemoteError> {
        let items = self.list().await?;
        Ok(first_match(items, key))
    }

    async fn create(
        &self,
        request: &<Self::Resource as RemoteResource>::Create,
    ) -> Result<Self::Resource, RemoteError>;

    async fn update(&self, id: &str, patches: &[PatchOp]) -> Result<Self::Resource, RemoteError>;

    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

/// First record matching `key`. Later duplicates are ignored with a warning.
pub fn first_match<R: RemoteResource>(items: Vec<R>, key: &str) -> Option<R> {
    let mut matches = items.into_iter().filter(|item| item.key() == key);
    let first = matches.next()?;
    let duplicates = matches.count();
    if duplicates > 0 {
        warn!(
            kind = R::KIND,
            key,
            duplicates,
            "Multiple remote resources share a key, using the first one"
        );
    }
    Some(first)
}
