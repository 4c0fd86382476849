//! Business logic between the HTTP handlers and the database layer

pub mod catalog;
pub mod delivery;
pub mod drivers;
pub mod orders;
pub mod payments;

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::TtlCache;
use crate::error::{ServiceError, ServiceResult};

/// Read-through cache for a typed value stored as JSON.
pub(crate) async fn cached<T, F, Fut>(
    cache: &TtlCache<serde_json::Value>,
    key: &str,
    load: F,
) -> ServiceResult<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ServiceResult<T>>,
{
    let json = cache
        .get_or_load(key, || async {
            let value = load().await?;
            serde_json::to_value(value).map_err(|e| ServiceError::Db(e.into()))
        })
        .await?;
    serde_json::from_value(json).map_err(|e| ServiceError::Db(e.into()))
}
