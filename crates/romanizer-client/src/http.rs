//! `reqwest` implementation of [`RomanizerApi`].

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use romanizer_api_models::{
    MutationResponse, PlaylistSummary, PrimeDispatchResponse, PrimingStatusResponse,
    TrackStatusResponse,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::api::{JobStatusReply, MutationRequest, RomanizerApi};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Header used to correlate requests with the command that issued them.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// HTTP transport backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    /// Build a transport from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ClientError::transport("http.build", err))?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Backend origin requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint<'a>(
        &self,
        operation: &'static str,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidRequest {
                operation,
                reason: "base URL cannot carry a path",
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match romanizer_telemetry::current_request_id()
            .and_then(|id| HeaderValue::from_str(&id).ok())
        {
            Some(value) => builder.header(HEADER_REQUEST_ID, value),
            None => builder,
        }
    }

    async fn send(&self, operation: &'static str, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|err| ClientError::transport(operation, err))?;
        debug!(operation, status = response.status().as_u16(), "response received");
        Ok(response)
    }
}

#[async_trait]
impl RomanizerApi for HttpApi {
    async fn track_status(&self, track_id: &str) -> ClientResult<TrackStatusResponse> {
        const OPERATION: &str = "track.status";
        let url = self.endpoint(OPERATION, ["api", "track", "status", track_id])?;
        let response = self.send(OPERATION, self.request(Method::GET, url)).await?;
        match response.status() {
            status if status.is_success() => decode(OPERATION, response).await,
            StatusCode::NOT_FOUND => Err(ClientError::NotFound {
                operation: OPERATION,
                resource: track_id.to_string(),
            }),
            _ => Err(rejection(OPERATION, response).await),
        }
    }

    async fn priming_status(&self, job_id: &str) -> ClientResult<JobStatusReply> {
        const OPERATION: &str = "priming.status";
        let url = self.endpoint(OPERATION, ["api", "priming", "status", job_id])?;
        let response = self.send(OPERATION, self.request(Method::GET, url)).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(JobStatusReply::Absent);
        }
        if !status.is_success() {
            return Ok(JobStatusReply::Unavailable {
                status: status.as_u16(),
            });
        }
        let body: PrimingStatusResponse = decode(OPERATION, response).await?;
        if body.is_unknown() {
            Ok(JobStatusReply::Absent)
        } else {
            Ok(JobStatusReply::Progress {
                completed: body.completed,
            })
        }
    }

    async fn dispatch_priming(&self, playlist_id: &str) -> ClientResult<PrimeDispatchResponse> {
        const OPERATION: &str = "priming.dispatch";
        let url = self.endpoint(OPERATION, ["api", "playlist", "prime_cache", playlist_id])?;
        let response = self.send(OPERATION, self.request(Method::POST, url)).await?;
        decode_any_status(OPERATION, response).await
    }

    async fn list_playlists(&self) -> ClientResult<Vec<PlaylistSummary>> {
        const OPERATION: &str = "playlists.list";
        let url = self.endpoint(OPERATION, ["api", "playlists"])?;
        let response = self.send(OPERATION, self.request(Method::GET, url)).await?;
        if response.status().is_success() {
            decode(OPERATION, response).await
        } else {
            Err(rejection(OPERATION, response).await)
        }
    }

    async fn submit_mutation(&self, request: &MutationRequest) -> ClientResult<MutationResponse> {
        let operation = request.operation();
        let url = self.endpoint(
            operation,
            request.path().split('/').filter(|part| !part.is_empty()),
        )?;
        let builder = self.request(Method::POST, url);
        let builder = match request {
            MutationRequest::AddFavorite(body) | MutationRequest::RemoveFavorite(body) => {
                builder.json(body)
            }
            MutationRequest::AddFavorites(body) | MutationRequest::RemoveFavorites(body) => {
                builder.json(body)
            }
            MutationRequest::AddTracks(body) => builder.json(body),
            MutationRequest::CreatePlaylist(body) => builder.json(body),
            MutationRequest::DeleteCacheItem(body) => builder.json(body),
            MutationRequest::DeletePlaylist(body) => builder.json(body),
            MutationRequest::RemovePlaylistTrack(body) => builder.json(body),
            MutationRequest::RenamePlaylist(body) => builder.json(body),
            MutationRequest::ReorderPlaylistItem(body) => builder.json(body),
            MutationRequest::SavePlaylistOrder(body) => builder.json(body),
        };
        let response = self.send(operation, builder).await?;
        let succeeded = response.status().is_success();
        let mut body: MutationResponse = decode_any_status(operation, response).await?;
        if !succeeded {
            body.success = false;
        }
        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

async fn decode<T: DeserializeOwned>(operation: &'static str, response: Response) -> ClientResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|err| ClientError::transport(operation, err))
}

/// Decode the JSON body whatever the status code; the backend reports
/// rejections as `{success:false, error}` with 4xx/5xx codes.
async fn decode_any_status<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> ClientResult<T> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|err| ClientError::transport(operation, err))?;
    match serde_json::from_slice::<T>(&bytes) {
        Ok(body) => Ok(body),
        Err(_) if !status.is_success() => Err(ClientError::Server {
            operation,
            status: Some(status.as_u16()),
            message: None,
        }),
        Err(err) => Err(ClientError::transport(operation, err)),
    }
}

async fn rejection(operation: &'static str, response: Response) -> ClientError {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.error.or(body.message));
    ClientError::Server {
        operation,
        status: Some(status.as_u16()),
        message,
    }
}
