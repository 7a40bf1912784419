use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::runtime::SessionEvent;

static QUOTES_DIR: Dir = include_dir!("src/quotes");

pub const DEFAULT_API_URL: &str = "https://baconipsum.com/api/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where quote text comes from. Returned text is not yet normalized.
pub trait QuoteSource: Send + Sync {
    fn fetch(&self) -> Result<String, FetchError>;
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum QuoteType {
    MeatAndFiller,
    AllMeat,
}

/// The public Bacon Ipsum text API
#[derive(Debug, Clone)]
pub struct BaconIpsum {
    client: Client,
    api_url: String,
    quote_type: QuoteType,
    paragraphs: u8,
}

impl BaconIpsum {
    pub fn new(api_url: impl Into<String>, quote_type: QuoteType, paragraphs: u8) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url: api_url.into(),
            quote_type,
            paragraphs: paragraphs.max(1),
        }
    }

    pub fn request_url(&self) -> String {
        format!(
            "{}?type={}&paras={}",
            self.api_url, self.quote_type, self.paragraphs
        )
    }
}

impl QuoteSource for BaconIpsum {
    fn fetch(&self) -> Result<String, FetchError> {
        let url = self.request_url();
        debug!(%url, "requesting quote");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text()?;
        paragraphs_from_json(&body)
    }
}

/// The service answers with a JSON array of paragraphs.
fn paragraphs_from_json(body: &str) -> Result<String, FetchError> {
    let paragraphs: Vec<String> = serde_json::from_str(body)?;
    let text = paragraphs.join("  ");
    if text.trim().is_empty() {
        return Err(FetchError::EmptyResponse);
    }
    Ok(text)
}

/// Fixed text, e.g. from the command line
#[derive(Debug, Clone)]
pub struct StaticQuote(pub String);

impl QuoteSource for StaticQuote {
    fn fetch(&self) -> Result<String, FetchError> {
        if self.0.trim().is_empty() {
            return Err(FetchError::EmptyResponse);
        }
        Ok(self.0.clone())
    }
}

#[derive(Deserialize, Clone, Debug)]
struct QuoteCollection {
    #[allow(dead_code)]
    name: String,
    quotes: Vec<String>,
}

/// Quotes compiled into the binary, for playing offline
#[derive(Debug, Clone)]
pub struct BundledQuotes {
    quotes: Vec<String>,
}

impl BundledQuotes {
    pub fn new() -> Result<Self, FetchError> {
        let mut quotes = Vec::new();
        for file in QUOTES_DIR.files() {
            let Some(contents) = file.contents_utf8() else {
                warn!(path = %file.path().display(), "skipping non-utf8 quote file");
                continue;
            };
            let collection: QuoteCollection = serde_json::from_str(contents)?;
            quotes.extend(collection.quotes);
        }

        if quotes.is_empty() {
            return Err(FetchError::NoBundledQuotes);
        }
        Ok(Self { quotes })
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl QuoteSource for BundledQuotes {
    fn fetch(&self) -> Result<String, FetchError> {
        self.quotes
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(FetchError::NoBundledQuotes)
    }
}

/// Fetch on a helper thread and deliver the outcome as `SessionEvent::QuoteFetched`.
pub fn spawn_fetch(source: Arc<dyn QuoteSource>, request: u64, sink: Sender<SessionEvent>) {
    thread::spawn(move || {
        let result = source.fetch();
        match &result {
            Ok(text) => info!(request, chars = text.chars().count(), "quote fetched"),
            Err(err) => warn!(request, %err, "quote fetch failed"),
        }
        let _ = sink.send(SessionEvent::QuoteFetched { request, result });
    });
}
