/// Client-side state for the thread browser and draft composer.
///
/// `Composer` owns everything the user sees: the search query, the thread
/// list, the selected thread's text, the draft/goal fields, and the streamed
/// assistant output. Network work happens elsewhere; results come back here
/// through the `apply_*` entry points together with the `Ticket` that was
/// issued when the request started. Only the most recent ticket on each
/// channel is honoured, so a slow response can never overwrite a newer one.
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUERY: &str = "in:inbox";
pub const THREAD_PLACEHOLDER: &str = "Thread will appear here.";
pub const OUTPUT_PLACEHOLDER: &str = "Model output will appear here.";

// ── Wire entities ─────────────────────────────────────────────────────────────

/// One entry of the `/api/threads` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub snippet: String,
}

/// Body of the `/api/thread/<id>` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadDetail {
    pub thread: String,
}

// ── Tickets ───────────────────────────────────────────────────────────────────

/// Which piece of state a request writes to. Each channel has its own
/// ticket sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Threads,
    Thread,
    Output,
}

/// Monotonic request token. Issued by a `begin_*` call, echoed back with
/// every result for that request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(pub u64);

#[derive(Debug, Default)]
struct Fence {
    issued: u64,
}

impl Fence {
    fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }
}

// ── Output pane ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Coach,
    Madlibs,
}

impl StreamKind {
    pub fn label(self) -> &'static str {
        match self {
            StreamKind::Coach => "coach",
            StreamKind::Madlibs => "identify",
        }
    }

    /// Endpoint path, relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            StreamKind::Coach => "/coach",
            StreamKind::Madlibs => "/madlibs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamStatus {
    #[default]
    Idle,
    Streaming(StreamKind),
}

// ── Composer ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Composer {
    pub query: String,
    pub draft: String,
    pub goal: String,
    threads: Vec<ThreadSummary>,
    thread_id: String,
    thread_text: String,
    output: String,
    status: StreamStatus,
    threads_fence: Fence,
    thread_fence: Fence,
    output_fence: Fence,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY)
    }
}

impl Composer {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            draft: String::new(),
            goal: String::new(),
            threads: Vec::new(),
            thread_id: String::new(),
            thread_text: String::new(),
            output: String::new(),
            status: StreamStatus::Idle,
            threads_fence: Fence::default(),
            thread_fence: Fence::default(),
            output_fence: Fence::default(),
        }
    }

    pub fn threads(&self) -> &[ThreadSummary] {
        &self.threads
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn thread_text(&self) -> &str {
        &self.thread_text
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.status, StreamStatus::Streaming(_))
    }

    /// Text for the thread pane, with the empty-state placeholder.
    pub fn thread_display(&self) -> &str {
        if self.thread_text.is_empty() { THREAD_PLACEHOLDER } else { &self.thread_text }
    }

    /// Text for the output pane, with the empty-state placeholder.
    pub fn output_display(&self) -> &str {
        if self.output.is_empty() { OUTPUT_PLACEHOLDER } else { &self.output }
    }

    // ── Search ────────────────────────────────────────────────────────────────

    pub fn begin_search(&mut self) -> Ticket {
        self.threads_fence.issue()
    }

    /// Replace the thread list with a search response, in response order.
    /// Returns the id of the first thread, which the caller should select.
    pub fn apply_threads(&mut self, ticket: Ticket, threads: Vec<ThreadSummary>) -> Option<String> {
        if !self.threads_fence.is_current(ticket) {
            return None;
        }
        self.threads = threads;
        self.threads.first().map(|t| t.id.clone())
    }

    // ── Selection ─────────────────────────────────────────────────────────────

    /// Mark `id` as the selected thread. The text pane keeps its current
    /// content until the detail response arrives.
    pub fn begin_select(&mut self, id: &str) -> Ticket {
        self.thread_id = id.to_string();
        self.thread_fence.issue()
    }

    pub fn apply_thread(&mut self, ticket: Ticket, detail: ThreadDetail) {
        if self.thread_fence.is_current(ticket) {
            self.thread_text = detail.thread;
        }
    }

    // ── Streaming output ──────────────────────────────────────────────────────

    /// Discard any previous output and enter the streaming state.
    pub fn begin_stream(&mut self, kind: StreamKind) -> Ticket {
        self.output.clear();
        self.status = StreamStatus::Streaming(kind);
        self.output_fence.issue()
    }

    pub fn apply_chunk(&mut self, ticket: Ticket, chunk: &str) {
        if self.output_fence.is_current(ticket) {
            self.output.push_str(chunk);
        }
    }

    pub fn finish_stream(&mut self, ticket: Ticket) {
        if self.output_fence.is_current(ticket) {
            self.status = StreamStatus::Idle;
        }
    }

    /// A request failed. Whatever state it already produced stays as is;
    /// a failed stream just stops streaming.
    pub fn abandon(&mut self, ticket: Ticket, channel: Channel) {
        if channel == Channel::Output {
            self.finish_stream(ticket);
        }
    }

    // ── Form payloads ─────────────────────────────────────────────────────────

    pub fn coach_form(&self) -> Vec<(&'static str, String)> {
        coach_fields(&self.draft, &self.goal, &self.thread_id)
    }

    pub fn madlibs_form(&self) -> Vec<(&'static str, String)> {
        madlibs_fields(&self.thread_id)
    }

    pub fn form_for(&self, kind: StreamKind) -> Vec<(&'static str, String)> {
        match kind {
            StreamKind::Coach => self.coach_form(),
            StreamKind::Madlibs => self.madlibs_form(),
        }
    }
}

/// Multipart fields for `POST /coach`.
pub fn coach_fields(draft: &str, goal: &str, thread_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("draft", draft.to_string()),
        ("goal", goal.to_string()),
        ("thread_id", thread_id.to_string()),
    ]
}

/// Multipart fields for `POST /madlibs`.
pub fn madlibs_fields(thread_id: &str) -> Vec<(&'static str, String)> {
    vec![("thread_id", thread_id.to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, snippet: &str) -> ThreadSummary {
        ThreadSummary { id: id.to_string(), snippet: snippet.to_string() }
    }

    #[test]
    fn test_search_replaces_list_in_response_order() {
        let mut c = Composer::default();
        let t = c.begin_search();
        let first = c.apply_threads(t, vec![summary("b", "Second?"), summary("a", "First?")]);
        assert_eq!(first.as_deref(), Some("b"));
        assert_eq!(c.threads().len(), 2);
        assert_eq!(c.threads()[0].snippet, "Second?");

        let t = c.begin_search();
        let first = c.apply_threads(t, vec![summary("1", "Hi")]);
        assert_eq!(first.as_deref(), Some("1"));
        assert_eq!(c.threads(), &[summary("1", "Hi")]);
    }

    #[test]
    fn test_empty_search_selects_nothing() {
        let mut c = Composer::default();
        let t = c.begin_search();
        assert_eq!(c.apply_threads(t, vec![]), None);
        assert!(c.threads().is_empty());
    }

    #[test]
    fn test_stale_search_is_dropped() {
        let mut c = Composer::default();
        let old = c.begin_search();
        let new = c.begin_search();
        assert_eq!(c.apply_threads(new, vec![summary("2", "new")]).as_deref(), Some("2"));
        assert_eq!(c.apply_threads(old, vec![summary("1", "old")]), None);
        assert_eq!(c.threads()[0].id, "2");
    }

    #[test]
    fn test_select_overwrites_thread_text() {
        let mut c = Composer::default();
        assert_eq!(c.thread_display(), THREAD_PLACEHOLDER);

        let t = c.begin_select("1");
        assert_eq!(c.thread_id(), "1");
        c.apply_thread(t, ThreadDetail { thread: "hello".into() });
        assert_eq!(c.thread_display(), "hello");

        let t = c.begin_select("2");
        // old text stays until the new response lands
        assert_eq!(c.thread_text(), "hello");
        c.apply_thread(t, ThreadDetail { thread: "second".into() });
        assert_eq!(c.thread_text(), "second");
    }

    #[test]
    fn test_out_of_order_selection_keeps_latest() {
        let mut c = Composer::default();
        let first = c.begin_select("1");
        let second = c.begin_select("2");
        c.apply_thread(second, ThreadDetail { thread: "two".into() });
        c.apply_thread(first, ThreadDetail { thread: "one".into() });
        assert_eq!(c.thread_id(), "2");
        assert_eq!(c.thread_text(), "two");
    }

    #[test]
    fn test_stream_resets_then_accumulates() {
        let mut c = Composer::default();
        let t = c.begin_stream(StreamKind::Madlibs);
        c.apply_chunk(t, "previous run");
        c.finish_stream(t);
        assert_eq!(c.output(), "previous run");

        let t = c.begin_stream(StreamKind::Coach);
        assert_eq!(c.output(), "");
        assert_eq!(c.status(), StreamStatus::Streaming(StreamKind::Coach));
        assert_eq!(c.output_display(), OUTPUT_PLACEHOLDER);

        c.apply_chunk(t, "Great");
        assert_eq!(c.output(), "Great");
        c.apply_chunk(t, " draft.");
        assert_eq!(c.output(), "Great draft.");
        c.finish_stream(t);
        assert_eq!(c.status(), StreamStatus::Idle);
        assert_eq!(c.output(), "Great draft.");
    }

    #[test]
    fn test_superseded_stream_chunks_are_ignored() {
        let mut c = Composer::default();
        let old = c.begin_stream(StreamKind::Coach);
        c.apply_chunk(old, "a");
        let new = c.begin_stream(StreamKind::Madlibs);
        c.apply_chunk(old, "b");
        c.finish_stream(old);
        assert!(c.is_streaming());
        c.apply_chunk(new, "c");
        assert_eq!(c.output(), "c");
    }

    #[test]
    fn test_failed_stream_keeps_partial_output() {
        let mut c = Composer::default();
        let t = c.begin_stream(StreamKind::Coach);
        c.apply_chunk(t, "half a sen");
        c.abandon(t, Channel::Output);
        assert_eq!(c.status(), StreamStatus::Idle);
        assert_eq!(c.output(), "half a sen");
    }

    #[test]
    fn test_failed_select_keeps_prior_text() {
        let mut c = Composer::default();
        let t = c.begin_select("1");
        c.apply_thread(t, ThreadDetail { thread: "kept".into() });
        let t = c.begin_select("2");
        c.abandon(t, Channel::Thread);
        assert_eq!(c.thread_text(), "kept");
    }

    #[test]
    fn test_forms() {
        let mut c = Composer::default();
        c.draft = "Sounds good".into();
        c.goal = "under 50 words".into();
        c.begin_select("1");
        assert_eq!(
            c.coach_form(),
            vec![
                ("draft", "Sounds good".to_string()),
                ("goal", "under 50 words".to_string()),
                ("thread_id", "1".to_string()),
            ]
        );
        assert_eq!(c.form_for(StreamKind::Madlibs), vec![("thread_id", "1".to_string())]);
    }
}
