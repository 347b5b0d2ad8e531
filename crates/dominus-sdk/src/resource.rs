//! Generic Resource Access
//!
//! Typed doorway to the `/api/app/{resource}[/{id}]` interface. Entity
//! schemas live with the caller; the service only fixes the routing and
//! paging conventions.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{ListParams, PagedResult};

/// CRUD operations against one REST resource.
pub struct ResourceService<T> {
    client: ApiClient,
    base_path: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ResourceService<T>
where
    T: DeserializeOwned + Send + Sync,
{
    pub(crate) fn new(client: ApiClient, name: &str) -> Self {
        Self {
            client,
            base_path: format!("/api/app/{name}"),
            _marker: PhantomData,
        }
    }

    /// `GET /api/app/{resource}` with `filter`/`skipCount`/`maxResultCount`.
    pub async fn list(&self, params: ListParams) -> Result<PagedResult<T>> {
        self.client
            .get(&self.base_path, Some(&params.to_query()))
            .await
    }

    /// `GET /api/app/{resource}/{id}`
    pub async fn get(&self, id: &str) -> Result<T> {
        self.client
            .get(&format!("{}/{}", self.base_path, id), None)
            .await
    }

    /// `POST /api/app/{resource}`
    pub async fn create<B: Serialize + Sync + ?Sized>(&self, body: &B) -> Result<T> {
        self.client.post(&self.base_path, body).await
    }

    /// `PUT /api/app/{resource}/{id}`
    pub async fn update<B: Serialize + Sync + ?Sized>(&self, id: &str, body: &B) -> Result<T> {
        self.client
            .put(&format!("{}/{}", self.base_path, id), body)
            .await
    }

    /// `DELETE /api/app/{resource}/{id}`
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete(&format!("{}/{}", self.base_path, id))
            .await
    }
}
