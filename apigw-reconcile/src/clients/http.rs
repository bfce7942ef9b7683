//! JSON-over-HTTP collections.
//!
//! A collection lives at `{endpoint}/{collection}`:
//!
//! | call   | request                                              |
//! |--------|------------------------------------------------------|
//! | list   | `GET {collection}?limit=N[&position=P]` -> `{items, position?}` |
//! | find   | `GET {collection}/{key}` (only when the key is the id) |
//! | create | `POST {collection}`, or `PUT {collection}/{key}` for kinds with a put key |
//! | update | `PATCH {collection}/{id}` with `{"patchOperations": [...]}` |
//! | delete | `DELETE {collection}/{id}`                           |
//!
//! Listing follows `position` until the service stops returning one.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accessor::{RemoteAccessor, RemoteResource, first_match};
use crate::error::RemoteError;
use crate::patch::PatchOp;
use crate::resources::{Deployment, DomainName, Method, PathResource, RestApi};

/// Upper bound on pages followed by a single listing.
const MAX_PAGES: usize = 1000;

/// Shared connection settings for every collection of one gateway.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: String,
    page_size: u32,
}

impl HttpBackend {
    pub fn new(endpoint: &str, timeout: Duration, page_size: u32) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            page_size: page_size.max(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Collection of `R` at `{endpoint}/{collection}`.
    pub fn collection<R: RemoteResource>(&self, collection: &str) -> HttpCollection<R> {
        HttpCollection {
            backend: self.clone(),
            collection: collection.trim_matches('/').to_string(),
            _marker: PhantomData,
        }
    }

    pub fn rest_apis(&self) -> HttpCollection<RestApi> {
        self.collection("restapis")
    }

    pub fn domain_names(&self) -> HttpCollection<DomainName> {
        self.collection("domainnames")
    }

    pub fn resources(&self, rest_api_id: &str) -> HttpCollection<PathResource> {
        self.collection(&format!("restapis/{}/resources", rest_api_id))
    }

    pub fn methods(&self, rest_api_id: &str, resource_id: &str) -> HttpCollection<Method> {
        self.collection(&format!(
            "restapis/{}/resources/{}/methods",
            rest_api_id, resource_id
        ))
    }

    pub fn deployments(&self, rest_api_id: &str) -> HttpCollection<Deployment> {
        self.collection(&format!("restapis/{}/deployments", rest_api_id))
    }
}

/// One remote collection reached over HTTP.
pub struct HttpCollection<R> {
    backend: HttpBackend,
    collection: String,
    _marker: PhantomData<fn() -> R>,
}

#[derive(Deserialize)]
struct Page<R> {
    #[serde(default = "Vec::new")]
    items: Vec<R>,
    #[serde(default)]
    position: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PatchRequest<'a> {
    patch_operations: &'a [PatchOp],
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

impl<R: RemoteResource> HttpCollection<R> {
    fn collection_url(&self) -> Result<Url, RemoteError> {
        let raw = format!("{}/{}", self.backend.endpoint, self.collection);
        Url::parse(&raw).map_err(|e| RemoteError::Transport(format!("invalid url '{}': {}", raw, e)))
    }

    fn item_url(&self, id: &str) -> Result<Url, RemoteError> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Transport(format!("cannot address '{}'", id)))?
            .push(id);
        Ok(url)
    }

    async fn fetch_page(&self, position: Option<&str>) -> Result<Page<R>, RemoteError> {
        let mut query = vec![("limit", self.backend.page_size.to_string())];
        if let Some(position) = position {
            query.push(("position", position.to_string()));
        }

        let response = self
            .backend
            .client
            .get(self.collection_url()?)
            .query(&query)
            .send()
            .await
            .map_err(transport)?;
        decode(check(response).await?).await
    }
}

#[async_trait]
impl<R: RemoteResource> RemoteAccessor for HttpCollection<R> {
    type Resource = R;

    async fn list(&self) -> Result<Vec<R>, RemoteError> {
        let mut items = Vec::new();
        let mut position: Option<String> = None;

        for page_number in 1..=MAX_PAGES {
            let page = self.fetch_page(position.as_deref()).await?;
            debug!(
                "Fetched page {} of {} ({} items)",
                page_number,
                self.collection,
                page.items.len()
            );
            items.extend(page.items);

            match page.position {
                Some(next) if !next.is_empty() && position.as_deref() != Some(next.as_str()) => {
                    position = Some(next);
                }
                _ => return Ok(items),
            }
        }

        Err(RemoteError::Service {
            status: 0,
            message: format!(
                "listing {} did not finish within {} pages",
                self.collection, MAX_PAGES
            ),
        })
    }

    async fn find(&self, key: &str) -> Result<Option<R>, RemoteError> {
        if !R::KEY_IS_ID {
            return Ok(first_match(self.list().await?, key));
        }

        let response = self
            .backend
            .client
            .get(self.item_url(key)?)
            .send()
            .await
            .map_err(transport)?;
        match check(response).await {
            Ok(response) => decode(response).await.map(Some),
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, request: &R::Create) -> Result<R, RemoteError> {
        let builder = match R::put_key(request) {
            Some(key) => {
                debug!("PUT {}/{}/{}", self.backend.endpoint, self.collection, key);
                self.backend.client.put(self.item_url(key)?)
            }
            None => {
                debug!("POST {}/{}", self.backend.endpoint, self.collection);
                self.backend.client.post(self.collection_url()?)
            }
        };
        let response = builder.json(request).send().await.map_err(transport)?;
        decode(check(response).await?).await
    }

    async fn update(&self, id: &str, patches: &[PatchOp]) -> Result<R, RemoteError> {
        debug!("PATCH {}/{}/{}", self.backend.endpoint, self.collection, id);
        let response = self
            .backend
            .client
            .patch(self.item_url(id)?)
            .json(&PatchRequest {
                patch_operations: patches,
            })
            .send()
            .await
            .map_err(transport)?;
        decode(check(response).await?).await
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        debug!("DELETE {}/{}/{}", self.backend.endpoint, self.collection, id);
        let response = self
            .backend
            .client
            .delete(self.item_url(id)?)
            .send()
            .await
            .map_err(transport)?;
        check(response).await?;
        Ok(())
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

/// Maps non-success statuses to [`RemoteError`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);

    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound(url));
    }
    Err(RemoteError::Service {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, RemoteError> {
    response
        .json::<T>()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))
}
