use crate::types::Chunk;

/// How far back from the window end to look for a natural break.
const BREAK_SEARCH_WINDOW: usize = 200;

/// Sliding-window chunker.
///
/// Windows prefer to end on a natural break (paragraph > sentence > line >
/// word), and the next window always restarts `chunk_overlap` bytes before
/// the previous end, so the chunks cover every byte of the input with no
/// gaps. Chunk text is the exact slice of the input, never trimmed, and a
/// chunk never exceeds `chunk_size` bytes.
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        debug_assert!(chunk_overlap < chunk_size);
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }
        if text.len() <= self.chunk_size {
            return vec![Chunk {
                index: 0,
                text: text.to_string(),
                start: 0,
                end: text.len(),
            }];
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while start < text.len() {
            let raw_end = (start + self.chunk_size).min(text.len());
            let window_end = snap_to_char_boundary(text, raw_end);

            let end = if window_end < text.len() {
                self.find_break_point(text, start, window_end)
            } else {
                window_end
            };

            chunks.push(Chunk {
                index,
                text: text[start..end].to_string(),
                start,
                end,
            });
            index += 1;

            if end >= text.len() {
                break;
            }

            let mut next = snap_to_char_boundary(text, end.saturating_sub(self.chunk_overlap));
            if next <= start {
                // Overlap would revisit the current start; restart flush at
                // the break instead of stalling.
                next = end;
            }
            start = next;
        }

        chunks
    }

    fn find_break_point(&self, text: &str, start: usize, preferred_end: usize) -> usize {
        let raw_search_start = preferred_end
            .saturating_sub(BREAK_SEARCH_WINDOW)
            .max(start);
        let search_start = snap_to_char_boundary(text, raw_search_start);
        let safe_end = snap_to_char_boundary(text, preferred_end);

        if search_start >= safe_end {
            return safe_end;
        }

        let search_region = &text[search_start..safe_end];

        // Priority: paragraph break > sentence end > line break > word break
        if let Some(pos) = search_region.rfind("\n\n") {
            return search_start + pos + 2;
        }
        if let Some(pos) = search_region.rfind(". ") {
            return search_start + pos + 2;
        }
        if let Some(pos) = search_region.rfind(".\n") {
            return search_start + pos + 2;
        }
        if let Some(pos) = search_region.rfind('\n') {
            return search_start + pos + 1;
        }
        if let Some(pos) = search_region.rfind(' ') {
            return search_start + pos + 1;
        }

        safe_end
    }
}

/// Snap a byte offset to the nearest valid UTF-8 char boundary (rounding down).
/// If `pos` is already on a boundary, returns `pos` unchanged.
/// If `pos` is beyond text length, returns `text.len()`.
fn snap_to_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut p = pos;
    while p > 0 && !text.is_char_boundary(p) {
        p -= 1;
    }
    p
}
