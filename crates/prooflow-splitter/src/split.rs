//! The splitting algorithm.
//!
//! Walks the text in character space so multi-byte scripts behave the same
//! as ASCII. At each step the cut is placed at the strongest breakpoint
//! found in a bounded look-back window below the hard size limit; the
//! breakpoint marker stays in the emitted chunk.

use prooflow_core::{Breakpoint, Chunk, SplitConfig, SplitError, SplitPlan};
use tracing::debug;
use uuid::Uuid;

/// How far below the hard limit a preferred breakpoint is searched for.
const LOOK_BACK_WINDOW: usize = 200;

/// Span of the whitespace fallback around the hard limit.
const WHITESPACE_FALLBACK_SPAN: usize = 50;

/// Split `text` into a chunk plan under `config`.
///
/// Fails if the input is empty or whitespace-only, exceeds the configured
/// input ceiling, or the configuration itself is inconsistent.
pub fn split(text: &str, config: &SplitConfig) -> Result<SplitPlan, SplitError> {
    config.validate()?;

    if text.trim().is_empty() {
        return Err(SplitError::EmptyInput);
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    if total > config.max_input_chars {
        return Err(SplitError::InputTooLarge {
            chars: total,
            max: config.max_input_chars,
        });
    }

    if total <= config.max_chunk_size {
        let chunk = package_chunk(&chars, 0, total, true);
        return Ok(SplitPlan {
            chunks: vec![chunk],
            total_characters: total,
            chunk_count: 1,
            max_chunk_size: config.max_chunk_size,
        });
    }

    let breakpoints = config.effective_breakpoints();
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let hard_limit = start + config.max_chunk_size;
        if hard_limit >= total {
            chunks.push(package_chunk(&chars, start, total, true));
            break;
        }

        let boundary = find_boundary(&chars, start, hard_limit, total, &breakpoints);
        chunks.push(package_chunk(&chars, start, boundary, false));

        // Rewind for overlap, but always advance past the previous start.
        start = boundary
            .saturating_sub(config.overlap_size)
            .max(start + 1);
    }

    debug!(
        total_characters = total,
        chunk_count = chunks.len(),
        max_chunk_size = config.max_chunk_size,
        "split plan produced"
    );

    Ok(SplitPlan {
        total_characters: total,
        chunk_count: chunks.len(),
        max_chunk_size: config.max_chunk_size,
        chunks,
    })
}

/// Pick the cut position for the chunk starting at `start`.
///
/// Tries each breakpoint class in order, scanning backward from the hard
/// limit within the look-back window; the first class with a hit wins. With
/// no hit, falls back to the nearest whitespace within the fallback span of
/// the hard limit, then to a hard cut.
fn find_boundary(
    chars: &[char],
    start: usize,
    hard_limit: usize,
    total: usize,
    breakpoints: &[Breakpoint],
) -> usize {
    let floor = hard_limit.saturating_sub(LOOK_BACK_WINDOW).max(start);

    for class in breakpoints {
        for i in (floor..hard_limit).rev() {
            if let Some(boundary) = boundary_after(*class, chars, i) {
                if boundary <= hard_limit {
                    return boundary;
                }
            }
        }
    }

    // Nearest whitespace at or below the hard limit.
    let back_floor = hard_limit.saturating_sub(WHITESPACE_FALLBACK_SPAN).max(start);
    for i in (back_floor..hard_limit).rev() {
        if chars[i].is_whitespace() {
            return i + 1;
        }
    }

    // Then the nearest whitespace just above it.
    let fwd_ceil = (hard_limit + WHITESPACE_FALLBACK_SPAN).min(total);
    for (offset, c) in chars[hard_limit..fwd_ceil].iter().enumerate() {
        if c.is_whitespace() {
            return hard_limit + offset + 1;
        }
    }

    // No natural break anywhere near the limit: hard cut.
    hard_limit
}

/// If a marker of `class` starts at position `i`, the cut position that
/// keeps the marker in the emitted chunk.
fn boundary_after(class: Breakpoint, chars: &[char], i: usize) -> Option<usize> {
    let c = chars[i];
    match class {
        Breakpoint::Paragraph => {
            (c == '\n' && chars.get(i + 1) == Some(&'\n')).then_some(i + 2)
        }
        Breakpoint::Line => (c == '\n').then_some(i + 1),
        Breakpoint::Sentence => match c {
            '。' | '！' | '？' => Some(i + 1),
            '.' | '!' | '?' if followed_by_whitespace(chars, i) => Some(i + 1),
            _ => None,
        },
        Breakpoint::Clause => match c {
            '，' | '；' | '：' | '、' => Some(i + 1),
            ',' | ';' | ':' if followed_by_whitespace(chars, i) => Some(i + 1),
            _ => None,
        },
        Breakpoint::Space => (c == ' ').then_some(i + 1),
    }
}

/// ASCII punctuation only counts as a boundary when whitespace (or the end
/// of the text) follows, so decimals and abbreviations stay intact.
fn followed_by_whitespace(chars: &[char], i: usize) -> bool {
    chars.get(i + 1).map_or(true, |next| next.is_whitespace())
}

/// Package `chars[start..end]` as a chunk: trimmed content, pre-trim offsets.
fn package_chunk(chars: &[char], start: usize, end: usize, is_final: bool) -> Chunk {
    let raw: String = chars[start..end].iter().collect();
    let content = raw.trim().to_string();
    let length = content.chars().count();

    Chunk {
        id: Uuid::new_v4(),
        content,
        original_range: start..end,
        length,
        is_final,
    }
}
