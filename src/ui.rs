/// UI helpers shared between the TUI and plain-stdout modes.
use crate::composer::StreamKind;

// ── Glyphs ────────────────────────────────────────────────────────────────────

pub fn stream_glyph(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::Coach   => "✎",
        StreamKind::Madlibs => "⌕",
    }
}

pub fn thread_bullet(current: bool) -> &'static str {
    if current { "●" } else { "○" }
}
