use std::time::Instant;

use kvdump_core::StoreError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

/// Percent-encodes each segment of a slash-separated path.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<String>>()
        .join("/")
}

pub(crate) fn transport_error(err: reqwest::Error) -> StoreError {
    StoreError::Transport {
        message: err.to_string(),
    }
}

pub(crate) async fn send_json<T: DeserializeOwned>(
    builder: reqwest::RequestBuilder,
    url: &str,
    path: &str,
) -> Result<T, StoreError> {
    debug!(url = %url, "http request");
    let start = Instant::now();
    let response = builder.send().await.map_err(transport_error)?;
    let status = response.status();
    debug!(
        url = %url,
        status = %status,
        elapsed_ms = start.elapsed().as_millis(),
        "http response"
    );
    if !status.is_success() {
        let body = error_body(response.text().await);
        return Err(status_error(status, &body, path));
    }
    response.json::<T>().await.map_err(|err| StoreError::Decode {
        message: format!("{url}: {err}"),
    })
}

pub(crate) fn status_error(status: StatusCode, body: &str, path: &str) -> StoreError {
    let message = error_message(body);
    match status {
        StatusCode::NOT_FOUND => StoreError::invalid_path(path),
        StatusCode::BAD_REQUEST => StoreError::InvalidRequest { message },
        StatusCode::UNAUTHORIZED => StoreError::Unauthorized { message },
        StatusCode::FORBIDDEN => StoreError::Forbidden { message },
        StatusCode::SERVICE_UNAVAILABLE => StoreError::Sealed { message },
        other => StoreError::Unexpected {
            status: other.as_u16(),
            message,
        },
    }
}

/// Body of a failed response, or a marker naming why it could not be read.
fn error_body(body: Result<String, reqwest::Error>) -> String {
    match body {
        Ok(body) => body,
        Err(err) => format!("<unreadable body: {err}>"),
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ => body.trim().to_string(),
    }
}
