//! Blocking client for the 42 intra API

use crate::config::ApiConfig;
use crate::data::{EvaluationQuery, Record, RecordSource};
use crate::error::FetchError;
use reqwest::blocking::{Client, Response};
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::Deserialize;
use std::thread;
use std::time::Duration;

const SCALE_TEAMS_PATH: &str = "/v2/scale_teams";
const TOKEN_PATH: &str = "/oauth/token";
const TOTAL_HEADER: &str = "x-total";
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
const BODY_EXCERPT_CHARS: usize = 200;

/// Largest `page[size]` the API honours
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// One page of records plus the collection size the API advertised
struct Page {
    records: Vec<Record>,
    total: Option<usize>,
}

/// Intra API client that follows `page[number]` pagination
pub struct IntraClient {
    config: ApiConfig,
    http: Client,
}

impl IntraClient {
    /// Page sizes outside `1..=MAX_PAGE_SIZE` are clamped into that range
    pub fn new(mut config: ApiConfig) -> Result<Self, FetchError> {
        let page_size = config.page_size.clamp(1, MAX_PAGE_SIZE);
        if page_size != config.page_size {
            log::warn!("Page size {} clamped to {}", config.page_size, page_size);
            config.page_size = page_size;
        }

        let http = Client::builder()
            .user_agent(concat!("peer-review-graph/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_root.trim_end_matches('/'), path)
    }

    /// Use the configured token, or trade client credentials for one
    fn access_token(&self) -> Result<String, FetchError> {
        if let Some(token) = &self.config.token {
            return Ok(token.clone());
        }

        let (Some(client_id), Some(client_secret)) =
            (&self.config.client_id, &self.config.client_secret)
        else {
            return Err(FetchError::MissingCredentials);
        };

        let url = self.url(TOKEN_PATH);
        log::debug!("Requesting access token from {}", url);

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()?;

        let body = checked_body(&url, response)?;
        let token: TokenResponse = serde_json::from_str(&body).map_err(FetchError::MalformedToken)?;

        Ok(token.access_token)
    }

    fn fetch_page(&self, token: &str, query: &EvaluationQuery, page: u32) -> Result<Page, FetchError> {
        let url = self.url(SCALE_TEAMS_PATH);
        let params = [
            ("filter[campus_id]", query.campus_id.to_string()),
            ("filter[cursus_id]", query.cursus_id.to_string()),
            ("range[begin_at]", query.range.to_string()),
            ("page[size]", self.config.page_size.to_string()),
            ("page[number]", page.to_string()),
        ];

        let mut retries = 0;
        loop {
            let response = self
                .http
                .get(&url)
                .bearer_auth(token)
                .query(&params)
                .send()?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if retries >= self.config.max_retries {
                    return Err(FetchError::RateLimited { page, retries });
                }
                let delay = retry_delay(&response);
                log::warn!("Rate limited on page {}, retrying in {:?}", page, delay);
                thread::sleep(delay);
                retries += 1;
                continue;
            }

            let total = response
                .headers()
                .get(TOTAL_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<usize>().ok());

            let body = checked_body(&url, response)?;
            let records = serde_json::from_str(&body)
                .map_err(|source| FetchError::MalformedPage { page, source })?;

            return Ok(Page { records, total });
        }
    }
}

impl RecordSource for IntraClient {
    fn fetch_records(&self, query: &EvaluationQuery) -> Result<Vec<Record>, FetchError> {
        log::info!(
            "Fetching evaluations for campus {} cursus {} in {}",
            query.campus_id,
            query.cursus_id,
            query.range
        );

        let token = self.access_token()?;
        let page_size = self.config.page_size as usize;

        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let Page { records: batch, total } = self.fetch_page(&token, query, page)?;
            let batch_len = batch.len();
            records.extend(batch);

            match total {
                Some(total) => log::info!("Fetched page {} ({}/{} records)", page, records.len(), total),
                None => log::info!("Fetched page {} ({} records)", page, records.len()),
            }

            // Trust the advertised total over page lengths when there is one
            let exhausted = match total {
                Some(total) => batch_len == 0 || records.len() >= total,
                None => batch_len < page_size,
            };
            if exhausted {
                break;
            }
            page += 1;
        }

        log::info!("Fetched {} evaluation records", records.len());
        Ok(records)
    }
}

/// Read a response body, turning non-success statuses into errors
fn checked_body(url: &str, response: Response) -> Result<String, FetchError> {
    let status = response.status();
    let body = response.text()?;

    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body: body.chars().take(BODY_EXCERPT_CHARS).collect(),
        });
    }

    Ok(body)
}

fn retry_delay(response: &Response) -> Duration {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_DELAY)
}
