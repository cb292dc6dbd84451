//! Chunker
//!
//! Splits prepared text into an ordered, lazy, one-shot sequence of
//! overlapping chunks. Sizes are measured in characters; offsets are byte
//! offsets into the source.

pub mod separators;

use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::error::{AppError, Result};
use separators::{Piece, split_pieces};

/// A text chunk with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Start byte offset in the source
    pub start: usize,
    /// End byte offset in the source
    pub end: usize,
    /// Position in the sequence
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(AppError::Config("chunk size must be positive".into()));
        }
        if overlap >= size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Builds the chunk stream. Piece boundaries are computed up front; chunk
    /// text is only materialized as the stream is pulled.
    pub fn chunk(&self, text: String) -> ChunkStream {
        let pieces = split_pieces(&text, self.size);
        ChunkStream {
            text,
            pieces,
            cursor: 0,
            window: VecDeque::new(),
            window_chars: 0,
            fresh: false,
            emitted: 0,
            size: self.size,
            overlap: self.overlap,
        }
    }
}

/// Forward-only chunk sequence. Consuming a chunk advances the stream for good.
#[derive(Debug)]
pub struct ChunkStream {
    text: String,
    pieces: Vec<Piece>,
    cursor: usize,
    window: VecDeque<Piece>,
    window_chars: usize,
    /// window holds pieces not yet emitted
    fresh: bool,
    emitted: usize,
    size: usize,
    overlap: usize,
}

impl ChunkStream {
    /// True when the source produced no chunks at all.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Number of chunks handed out so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn emit(&mut self) -> Option<Chunk> {
        let (start, end) = (self.window.front()?.start, self.window.back()?.end);
        let chunk = Chunk {
            text: self.text[start..end].to_string(),
            start,
            end,
            index: self.emitted,
        };
        self.emitted += 1;
        self.fresh = false;
        Some(chunk)
    }

    /// Drops pieces from the front until only the overlap remains and `incoming` fits.
    fn slide(&mut self, incoming: usize) {
        while let Some(front) = self.window.front() {
            if self.window_chars > self.overlap || self.window_chars + incoming > self.size {
                self.window_chars -= front.chars;
                self.window.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Iterator for ChunkStream {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        while let Some(&piece) = self.pieces.get(self.cursor) {
            if !self.window.is_empty() && self.window_chars + piece.chars > self.size {
                let chunk = if self.fresh { self.emit() } else { None };
                self.slide(piece.chars);
                if chunk.is_some() {
                    return chunk;
                }
                continue;
            }
            self.window.push_back(piece);
            self.window_chars += piece.chars;
            self.cursor += 1;
            self.fresh = true;
        }

        if self.fresh { self.emit() } else { None }
    }
}

/// Joins a chunk sequence back into the source, dropping each chunk's overlap
/// with its predecessor.
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    let mut covered: usize = 0;
    for chunk in chunks {
        let skip = covered.saturating_sub(chunk.start);
        out.push_str(&chunk.text[skip..]);
        covered = chunk.end;
    }
    out
}
