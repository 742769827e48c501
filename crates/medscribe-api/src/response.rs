// Response handling shared by every upstream client.
//
// The three upstreams disagree on error envelopes:
//   store:  { "message": "...", "code": "PGRST116", "details": ..., "hint": ... }
//   gemini: { "error": { "code": 400, "message": "...", "status": "INVALID_ARGUMENT" } }
//   speech: { "error": { "message": "...", "type": "...", "code": "..." } }
// `ErrorBody` accepts all of them.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Nested { error: NestedError },
    Plain { error: String },
    Flat {
        message: Option<String>,
        #[serde(default)]
        code: Option<Value>,
    },
}

#[derive(serde::Deserialize)]
struct NestedError {
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

fn code_string(code: Option<Value>) -> Option<String> {
    match code? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode a successful JSON body or turn a failure into an [`Error`].
pub(crate) async fn json<T: DeserializeOwned>(
    service: &'static str,
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status();
    if !status.is_success() {
        return Err(error_from(service, status, resp).await);
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

/// Map a non-2xx response into a typed error, preserving the upstream message.
pub(crate) async fn error_from(
    service: &'static str,
    status: StatusCode,
    resp: reqwest::Response,
) -> Error {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Error::InvalidApiKey { service };
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1);
        return Error::RateLimited {
            service,
            retry_after_secs,
        };
    }

    let raw = resp.text().await.unwrap_or_default();

    let (message, code) = match serde_json::from_str::<ErrorBody>(&raw) {
        Ok(ErrorBody::Nested { error }) => {
            let code = error.status.or_else(|| code_string(error.code));
            (error.message, code)
        }
        Ok(ErrorBody::Flat { message, code }) => (message, code_string(code)),
        Ok(ErrorBody::Plain { error }) => (Some(error), None),
        Err(_) => ((!raw.is_empty()).then_some(raw), None),
    };

    Error::Upstream {
        service,
        status: status.as_u16(),
        message: message.unwrap_or_else(|| status.to_string()),
        code,
    }
}
