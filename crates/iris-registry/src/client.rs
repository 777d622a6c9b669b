//! OCI Distribution API client.
//!
//! Speaks the tag listing and manifest endpoints of OCI-compatible
//! registries. One HTTP client is kept per registry host, built from that
//! host's [`RegistryConfig`] or from defaults when none was configured.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, LINK, LOCATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{RegistryAuth, RegistryConfig, TlsMode};
use crate::error::RegistryError;
use crate::oci::{empty_config, ErrorResponse, Manifest, TagList};
use crate::reference::Reference;
use crate::registry::TagRegistry;

/// HTTP client and settings for one registry host.
#[derive(Debug, Clone)]
struct HostClient {
    config: RegistryConfig,
    http: reqwest::Client,
}

/// Client for OCI-compatible registries.
#[derive(Debug, Default)]
pub struct OciClient {
    configs: HashMap<String, RegistryConfig>,
    hosts: Mutex<HashMap<String, Arc<HostClient>>>,
}

impl OciClient {
    /// Creates a client with no host-specific settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers settings for the host named in `config`.
    ///
    /// # Examples
    ///
    /// ```
    /// use iris_registry::{OciClient, RegistryAuth, RegistryConfig};
    ///
    /// let client = OciClient::new().with_config(
    ///     RegistryConfig::new("registry.example.com").with_auth(RegistryAuth::bearer("t")),
    /// );
    /// assert!(client.config("registry.example.com").is_some());
    /// ```
    #[must_use]
    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.configs.insert(config.host.clone(), config);
        self
    }

    /// Returns the settings registered for `host`, if any.
    #[must_use]
    pub fn config(&self, host: &str) -> Option<&RegistryConfig> {
        self.configs.get(host)
    }

    /// Returns the cached client for the reference's registry, building it
    /// on first use.
    fn host(&self, reference: &Reference) -> Result<Arc<HostClient>, RegistryError> {
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(host) = hosts.get(&reference.registry) {
            return Ok(Arc::clone(host));
        }

        let config = self
            .configs
            .get(&reference.registry)
            .cloned()
            .unwrap_or_else(|| RegistryConfig::new(&reference.registry));
        let http = build_http_client(&config)?;
        let host = Arc::new(HostClient { config, http });
        hosts.insert(reference.registry.clone(), Arc::clone(&host));
        Ok(host)
    }

    /// Uploads a blob with a monolithic POST then PUT.
    async fn upload_blob(
        &self,
        host: &HostClient,
        repository: &Reference,
        data: &[u8],
        digest: &str,
        cancel: &CancellationToken,
    ) -> Result<(), RegistryError> {
        let start_url = format!(
            "{}/v2/{}/blobs/uploads/",
            host.config.url, repository.repository
        );
        let response = send(cancel, host.http.post(&start_url).headers(auth_headers(&host.config)?)).await?;

        if response.status() != StatusCode::ACCEPTED && !response.status().is_success() {
            return Err(RegistryError::UploadFailed {
                message: format!("Failed to start upload: {}", response.status()),
            });
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| RegistryError::UploadFailed {
                message: "No upload location returned".to_string(),
            })?;

        let mut upload_url = Url::parse(&start_url)?.join(location)?;
        upload_url.query_pairs_mut().append_pair("digest", digest);

        let response = send(
            cancel,
            host.http
                .put(upload_url)
                .headers(auth_headers(&host.config)?)
                .header(CONTENT_TYPE, "application/octet-stream")
                .body(data.to_vec()),
        )
        .await?;

        if !response.status().is_success() {
            return Err(RegistryError::UploadFailed {
                message: format!("Failed to upload blob: {}", response.status()),
            });
        }

        Ok(())
    }

    /// Pushes a manifest under `reference`'s tag and returns its digest.
    async fn push_manifest(
        &self,
        host: &HostClient,
        reference: &Reference,
        manifest: &Manifest,
        cancel: &CancellationToken,
    ) -> Result<String, RegistryError> {
        let tag = reference.tag.as_deref().unwrap_or_default();
        let url = format!(
            "{}/v2/{}/manifests/{tag}",
            host.config.url, reference.repository
        );
        let (body, desc) = manifest.to_descriptor()?;

        let response = send(
            cancel,
            host.http
                .put(&url)
                .headers(auth_headers(&host.config)?)
                .header(CONTENT_TYPE, manifest.media_type.as_str())
                .body(body),
        )
        .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(RegistryError::ManifestPushFailed {
                reference: reference.common_name(),
                message: format!("{status}: {}", error_text(response, cancel).await?),
            });
        }

        Ok(desc.digest)
    }

    /// Issues `DELETE /v2/<repo>/manifests/<reference>`.
    async fn delete_manifest(
        &self,
        host: &HostClient,
        reference: &Reference,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<Response, RegistryError> {
        let url = format!(
            "{}/v2/{}/manifests/{target}",
            host.config.url, reference.repository
        );
        send(cancel, host.http.delete(&url).headers(auth_headers(&host.config)?)).await
    }

    /// Drops a tag on registries that refuse deletion by tag.
    ///
    /// The tag is repointed at a manifest nothing else references, which is
    /// then deleted by digest. Manifests shared with other tags survive.
    async fn delete_tag_via_placeholder(
        &self,
        host: &HostClient,
        tag: &Reference,
        cancel: &CancellationToken,
    ) -> Result<(), RegistryError> {
        let name = tag.tag.as_deref().unwrap_or_default();
        let manifest = Manifest::placeholder(name, &chrono::Utc::now().to_rfc3339());

        let config = empty_config();
        if let Some(data) = config.data.as_deref() {
            self.upload_blob(host, tag, data, &config.digest, cancel).await?;
        }
        let digest = self.push_manifest(host, tag, &manifest, cancel).await?;
        tracing::debug!(tag = %tag, digest = %digest, "Repointed tag at placeholder manifest");

        let response = self.delete_manifest(host, tag, &digest, cancel).await?;
        if !response.status().is_success() {
            return Err(status_error(response, cancel).await);
        }
        Ok(())
    }
}

#[async_trait]
impl TagRegistry for OciClient {
    async fn list_tags(
        &self,
        repository: &Reference,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, RegistryError> {
        let host = self.host(repository)?;
        let mut next = Some(Url::parse(&format!(
            "{}/v2/{}/tags/list",
            host.config.url, repository.repository
        ))?);
        let mut tags = Vec::new();

        while let Some(url) = next.take() {
            let response = send(
                cancel,
                host.http
                    .get(url.clone())
                    .headers(auth_headers(&host.config)?)
                    .header(ACCEPT, "application/json"),
            )
            .await?;

            if !response.status().is_success() {
                return Err(status_error(response, cancel).await);
            }

            next = next_link(response.headers(), &url);
            let page: TagList = serde_json::from_slice(&body_bytes(response, cancel).await?)?;
            tags.extend(page.tags.unwrap_or_default());
        }

        tracing::debug!(repository = %repository, count = tags.len(), "Listed tags");
        Ok(tags)
    }

    async fn delete_tag(
        &self,
        tag: &Reference,
        cancel: &CancellationToken,
    ) -> Result<(), RegistryError> {
        let Some(name) = tag.tag.as_deref() else {
            return Err(RegistryError::InvalidReference {
                reference: tag.common_name(),
                reason: "tag required".to_string(),
            });
        };

        let host = self.host(tag)?;
        let response = self.delete_manifest(&host, tag, name, cancel).await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(RegistryError::TagNotFound {
                reference: tag.common_name(),
            }),
            StatusCode::BAD_REQUEST | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                tracing::debug!(tag = %tag, status = %response.status(), "Tag delete refused, using placeholder manifest");
                self.delete_tag_via_placeholder(&host, tag, cancel).await
            }
            _ => Err(status_error(response, cancel).await),
        }
    }
}

/// Sends a request unless `cancel` fires first.
async fn send(cancel: &CancellationToken, request: RequestBuilder) -> Result<Response, RegistryError> {
    if cancel.is_cancelled() {
        return Err(RegistryError::Canceled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(RegistryError::Canceled),
        result = request.send() => result.map_err(Into::into),
    }
}

async fn body_bytes(response: Response, cancel: &CancellationToken) -> Result<Vec<u8>, RegistryError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(RegistryError::Canceled),
        result = response.bytes() => Ok(result?.to_vec()),
    }
}

/// Reads an error body, preferring the registry's structured error list.
async fn error_text(response: Response, cancel: &CancellationToken) -> Result<String, RegistryError> {
    let body = body_bytes(response, cancel).await?;
    Ok(match serde_json::from_slice::<ErrorResponse>(&body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.summary(),
        _ => String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Converts an unsuccessful response into an error.
async fn status_error(response: Response, cancel: &CancellationToken) -> RegistryError {
    let status = response.status();
    let message = match error_text(response, cancel).await {
        Ok(message) => message,
        Err(err) => return err,
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RegistryError::AuthenticationFailed { message }
        }
        _ => RegistryError::HttpError {
            status: status.as_u16(),
            message,
        },
    }
}

/// Extracts the `rel="next"` target of a `Link` header, resolved against `current`.
fn next_link(headers: &HeaderMap, current: &Url) -> Option<Url> {
    headers.get_all(LINK).iter().find_map(|value| {
        let value = value.to_str().ok()?;
        value.split(',').find_map(|link| {
            let (target, params) = link.split_once(';')?;
            let is_next = params
                .split(';')
                .any(|p| matches!(p.trim(), "rel=\"next\"" | "rel=next"));
            if !is_next {
                return None;
            }
            let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
            current.join(target).ok()
        })
    })
}

/// Builds the HTTP client with proper configuration.
fn build_http_client(config: &RegistryConfig) -> Result<reqwest::Client, RegistryError> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent);

    if config.tls == TlsMode::Insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(ref ca_cert) = config.ca_cert {
        let cert_pem = std::fs::read(ca_cert).map_err(|e| RegistryError::IoError {
            path: ca_cert.clone(),
            source: e,
        })?;
        let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|e| {
            RegistryError::InvalidCertificate {
                path: ca_cert.clone(),
                message: e.to_string(),
            }
        })?;
        builder = builder.add_root_certificate(cert);
    }

    builder.build().map_err(|e| RegistryError::ConnectionFailed {
        url: config.url.clone(),
        source: e,
    })
}

/// Creates authentication headers based on configuration.
fn auth_headers(config: &RegistryConfig) -> Result<HeaderMap, RegistryError> {
    let mut headers = HeaderMap::new();

    match &config.auth {
        RegistryAuth::None => {}
        RegistryAuth::Basic { username, password } => {
            let credentials = base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                format!("{username}:{password}"),
            );
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|_| {
                    RegistryError::AuthenticationFailed {
                        message: "Invalid credentials".to_string(),
                    }
                })?,
            );
        }
        RegistryAuth::Bearer { token } => {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    RegistryError::AuthenticationFailed {
                        message: "Invalid token".to_string(),
                    }
                })?,
            );
        }
    }

    Ok(headers)
}
