use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use reqwest::multipart::Form;

use crate::composer::{self, StreamKind, ThreadDetail, ThreadSummary};

// ── Client ────────────────────────────────────────────────────────────────────

/// HTTP client for the drafting assistant's API.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    pub base_url: String,
}

impl Client {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tonecoach/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// `GET /api/threads?q=<query>`: thread summaries in server order.
    pub async fn threads(&self, query: &str) -> Result<Vec<ThreadSummary>> {
        let url = self.url(&format!("/api/threads?q={}", urlencoding::encode(query)));
        let resp = self.http.get(&url).send().await?;
        let resp = check_status(resp).await?;
        resp.json::<Vec<ThreadSummary>>()
            .await
            .context("Malformed thread list")
    }

    /// `GET /api/thread/<id>`: full text of one thread.
    ///
    /// The id is percent-encoded into the path segment. Ids made of URL-safe
    /// characters go out unchanged; anything else (`/`, spaces, `?`) stays one
    /// segment instead of reshaping the route.
    pub async fn thread(&self, id: &str) -> Result<ThreadDetail> {
        let url = self.url(&format!("/api/thread/{}", urlencoding::encode(id)));
        let resp = self.http.get(&url).send().await?;
        let resp = check_status(resp).await?;
        resp.json::<ThreadDetail>()
            .await
            .context("Malformed thread detail")
    }

    /// POST the form fields to the endpoint for `kind` and stream the plain-text
    /// reply. `on_text` is called once per decoded chunk, in arrival order.
    pub async fn stream(
        &self,
        kind: StreamKind,
        fields: Vec<(&'static str, String)>,
        mut on_text: impl FnMut(&str),
    ) -> Result<()> {
        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        let resp = self
            .http
            .post(self.url(kind.path()))
            .multipart(form)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let mut stream = resp.bytes_stream();
        let mut decoder = Utf8Decoder::default();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            let text = decoder.decode(&bytes);
            if !text.is_empty() {
                on_text(&text);
            }
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            on_text(&tail);
        }
        Ok(())
    }

    pub async fn coach(
        &self,
        draft: &str,
        goal: &str,
        thread_id: &str,
        on_text: impl FnMut(&str),
    ) -> Result<()> {
        let fields = composer::coach_fields(draft, goal, thread_id);
        self.stream(StreamKind::Coach, fields, on_text).await
    }

    pub async fn madlibs(&self, thread_id: &str, on_text: impl FnMut(&str)) -> Result<()> {
        let fields = composer::madlibs_fields(thread_id);
        self.stream(StreamKind::Madlibs, fields, on_text).await
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    Err(anyhow!("API error {}: {}", status, text))
}

// ── Incremental UTF-8 decoding ────────────────────────────────────────────────

/// Decodes a byte stream chunk by chunk. A multi-byte character split across
/// two chunks is held back until its remaining bytes arrive; bytes that can
/// never form valid UTF-8 come out as U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let split = self.pending.len() - incomplete_tail(&self.pending);
        let text = String::from_utf8_lossy(&self.pending[..split]).into_owned();
        self.pending.drain(..split);
        text
    }

    /// Flush whatever is still held back at end-of-stream.
    pub fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Length of a trailing, not-yet-complete UTF-8 sequence (0 if none).
fn incomplete_tail(buf: &[u8]) -> usize {
    for back in 1..=buf.len().min(4) {
        let b = buf[buf.len() - back];
        if b & 0xC0 == 0x80 {
            continue;
        }
        let need = match b {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if need > back { back } else { 0 };
    }
    0
}
