/// Network operations for the composer, run as background tasks.
///
/// Every operation follows the same shape: a `begin_*` call on `Composer`
/// issues a ticket synchronously, a task talks to the API, and results come
/// back over the UI channel tagged with that ticket. `apply` folds them into
/// the state holder on the UI side.
use tokio::sync::mpsc::UnboundedSender;

use crate::client::Client;
use crate::composer::{Channel, Composer, StreamKind, Ticket};
use crate::tui::UiEvent;

// ── Launchers (called from the UI task) ───────────────────────────────────────

pub fn launch_search(client: &Client, composer: &mut Composer, tx: &UnboundedSender<UiEvent>) {
    let ticket = composer.begin_search();
    let query = composer.query.clone();
    tracing::debug!(ticket = ticket.0, %query, "search");
    tokio::spawn(search(client.clone(), ticket, query, tx.clone()));
}

pub fn launch_select(
    client: &Client,
    composer: &mut Composer,
    id: &str,
    tx: &UnboundedSender<UiEvent>,
) {
    let ticket = composer.begin_select(id);
    tracing::debug!(ticket = ticket.0, id, "select thread");
    tokio::spawn(select_thread(client.clone(), ticket, id.to_string(), tx.clone()));
}

pub fn launch_stream(
    client: &Client,
    composer: &mut Composer,
    kind: StreamKind,
    tx: &UnboundedSender<UiEvent>,
) {
    let fields = composer.form_for(kind);
    let ticket = composer.begin_stream(kind);
    tracing::debug!(ticket = ticket.0, kind = kind.label(), "stream");
    tokio::spawn(stream(client.clone(), ticket, kind, fields, tx.clone()));
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

pub async fn search(client: Client, ticket: Ticket, query: String, tx: UnboundedSender<UiEvent>) {
    let ev = match client.threads(&query).await {
        Ok(threads) => UiEvent::ThreadsLoaded { ticket, threads },
        Err(e) => failed(ticket, Channel::Threads, e),
    };
    let _ = tx.send(ev);
}

pub async fn select_thread(client: Client, ticket: Ticket, id: String, tx: UnboundedSender<UiEvent>) {
    let ev = match client.thread(&id).await {
        Ok(detail) => UiEvent::ThreadLoaded { ticket, detail },
        Err(e) => failed(ticket, Channel::Thread, e),
    };
    let _ = tx.send(ev);
}

pub async fn stream(
    client: Client,
    ticket: Ticket,
    kind: StreamKind,
    fields: Vec<(&'static str, String)>,
    tx: UnboundedSender<UiEvent>,
) {
    let chunk_tx = tx.clone();
    let result = client
        .stream(kind, fields, |text| {
            let _ = chunk_tx.send(UiEvent::Chunk { ticket, text: text.to_string() });
        })
        .await;
    let ev = match result {
        Ok(()) => UiEvent::StreamDone { ticket },
        Err(e) => failed(ticket, Channel::Output, e),
    };
    let _ = tx.send(ev);
}

fn failed(ticket: Ticket, channel: Channel, e: anyhow::Error) -> UiEvent {
    tracing::warn!(ticket = ticket.0, ?channel, "request failed: {e:#}");
    UiEvent::Failed { ticket, channel }
}

// ── Applying results ──────────────────────────────────────────────────────────

/// Fold one event into the composer. Returns the id of a thread that should
/// now be selected (the first result of a fresh search).
pub fn apply(composer: &mut Composer, ev: UiEvent) -> Option<String> {
    match ev {
        UiEvent::ThreadsLoaded { ticket, threads } => composer.apply_threads(ticket, threads),
        UiEvent::ThreadLoaded { ticket, detail } => {
            composer.apply_thread(ticket, detail);
            None
        }
        UiEvent::Chunk { ticket, text } => {
            composer.apply_chunk(ticket, &text);
            None
        }
        UiEvent::StreamDone { ticket } => {
            composer.finish_stream(ticket);
            None
        }
        UiEvent::Failed { ticket, channel } => {
            composer.abandon(ticket, channel);
            None
        }
    }
}

/// Fold one event into the composer and, when a fresh search produced a
/// first thread, start loading it. Returns true if a selection was launched.
pub fn dispatch(
    client: &Client,
    composer: &mut Composer,
    ev: UiEvent,
    tx: &UnboundedSender<UiEvent>,
) -> bool {
    match apply(composer, ev) {
        Some(id) => {
            launch_select(client, composer, &id, tx);
            true
        }
        None => false,
    }
}
