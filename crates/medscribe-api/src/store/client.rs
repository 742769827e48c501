// Managed-store HTTP client
//
// Wraps `reqwest::Client` with table URL construction, PostgREST filter
// encoding, and `Content-Range` count parsing. Auth is the project key sent
// both as `apikey` and as a bearer token.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::response;
use crate::store::models::{
    CONSULTATIONS_TABLE, PATIENTS_TABLE, SUBSCRIPTIONS_TABLE, SubscriptionRow,
};
use crate::transport::{TransportConfig, normalize_base_url};

const SERVICE: &str = "store";

/// Async client for the store's REST interface.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: Url,
}

impl StoreClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from the project URL and API key.
    ///
    /// Injects `apikey` and `Authorization: Bearer` as default headers.
    /// `base_url` may be the project root or already end in `/rest/v1`.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();

        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid store key header value: {e}"),
            })?;
        key_value.set_sensitive(true);
        headers.insert("apikey", key_value);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid store key header value: {e}"),
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = normalize_base_url(base_url, "rest/v1")?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = normalize_base_url(base_url, "rest/v1")?;
        Ok(Self { http, base_url })
    }

    /// The normalized `/rest/v1/` base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(table)?)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Find the user's active subscription, newest expiry first.
    ///
    /// `GET /rest/v1/subscriptions?user_id=eq.{id}&is_active=eq.true&order=expires_at.desc&limit=1`
    ///
    /// Returns `None` when the user has no active row.
    pub async fn find_active_subscription(
        &self,
        user_id: &str,
    ) -> Result<Option<SubscriptionRow>, Error> {
        let url = self.table_url(SUBSCRIPTIONS_TABLE)?;
        let params = [
            ("select", "*".to_owned()),
            ("user_id", format!("eq.{user_id}")),
            ("is_active", "eq.true".to_owned()),
            ("order", "expires_at.desc".to_owned()),
            ("limit", "1".to_owned()),
        ];
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(&params).send().await?;
        let mut rows: Vec<SubscriptionRow> = response::json(SERVICE, resp).await?;
        Ok(rows.pop())
    }

    // ── Usage counts ─────────────────────────────────────────────────

    /// Count the patients owned by `user_id`.
    pub async fn count_patients(&self, user_id: &str) -> Result<u32, Error> {
        self.count_owned(PATIENTS_TABLE, user_id).await
    }

    /// Count the consultations owned by `user_id`.
    pub async fn count_consultations(&self, user_id: &str) -> Result<u32, Error> {
        self.count_owned(CONSULTATIONS_TABLE, user_id).await
    }

    /// Exact count of rows in `table` whose `user_id` matches.
    ///
    /// `GET /rest/v1/{table}?user_id=eq.{id}&select=id` with
    /// `Prefer: count=exact` and `Range: 0-0`; the total is the part of
    /// `Content-Range` after the slash.
    pub async fn count_owned(&self, table: &str, user_id: &str) -> Result<u32, Error> {
        let url = self.table_url(table)?;
        let params = [
            ("select", "id".to_owned()),
            ("user_id", format!("eq.{user_id}")),
        ];
        debug!("GET {url} params={params:?} (count)");

        let resp = self
            .http
            .get(url)
            .query(&params)
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0")
            .send()
            .await?;

        let status = resp.status();
        // 206 is the normal answer to a ranged count; 416 means the range
        // starts past an empty result, which still carries the total.
        if !status.is_success() && status != reqwest::StatusCode::RANGE_NOT_SATISFIABLE {
            return Err(response::error_from(SERVICE, status, resp).await);
        }

        resp.headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or(Error::MissingHeader {
                header: "content-range",
            })
    }
}

/// Extract the total from a PostgREST `Content-Range` value.
///
/// Accepts `0-0/12`, `*/0`, and `0-24/*` (the last yields `None`: no exact count).
pub fn parse_content_range_total(value: &str) -> Option<u32> {
    let (_, total) = value.trim().split_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_with_rows() {
        assert_eq!(parse_content_range_total("0-0/12"), Some(12));
    }

    #[test]
    fn content_range_empty_result() {
        assert_eq!(parse_content_range_total("*/0"), Some(0));
    }

    #[test]
    fn content_range_without_exact_count() {
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
