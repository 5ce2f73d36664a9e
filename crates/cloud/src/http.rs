//! Request plumbing shared by the Datastore and BigQuery clients.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::TokenProvider;
use crate::error::CloudError;

/// Google API error envelope: `{ "error": { "code", "message", "status" } }`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Turn an emulator host override into a base URL.
///
/// Emulators are usually configured as `host:port`; a value that already
/// carries a scheme is used as-is.
pub(crate) fn emulator_base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// Attach credentials and send the request.
pub(crate) async fn send(
    tokens: &TokenProvider,
    request: RequestBuilder,
) -> Result<Response, CloudError> {
    let request = tokens.authorize(request).await?;
    Ok(request.send().await?)
}

/// Fail with [`CloudError::Api`] unless the response is a success.
pub(crate) async fn check(service: &'static str, response: Response) -> Result<Response, CloudError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let raw = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&raw) {
        Ok(envelope) if !envelope.error.status.is_empty() => {
            format!("{} ({})", envelope.error.message, envelope.error.status)
        }
        Ok(envelope) => envelope.error.message,
        Err(_) => raw,
    };

    tracing::warn!(service, status = status.as_u16(), %message, "Cloud API call failed");
    Err(CloudError::Api {
        service,
        status: status.as_u16(),
        message,
    })
}

/// Check the status and decode a JSON body.
pub(crate) async fn json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> Result<T, CloudError> {
    let response = check(service, response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| CloudError::Decode(format!("{service}: {e}")))
}

/// `Ok(false)` on 404, `Ok(true)` on success, error otherwise.
pub(crate) async fn exists(service: &'static str, response: Response) -> Result<bool, CloudError> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(false);
    }
    check(service, response).await.map(|_| true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_http_scheme() {
        assert_eq!(emulator_base_url("localhost:8081"), "http://localhost:8081");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        assert_eq!(
            emulator_base_url("https://emulator.internal:9050/"),
            "https://emulator.internal:9050"
        );
    }
}
