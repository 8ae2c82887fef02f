//! Recursive character text splitter.
//!
//! Splits text on a ranked list of separators (paragraph break, line
//! break, space, then single characters), merging the pieces back into
//! chunks of at most `chunk_size` characters. When a chunk is closed,
//! the trailing pieces worth up to `chunk_overlap` characters are
//! carried into the next chunk so that sentence fragments stay
//! retrievable across chunk boundaries.
//!
//! Lengths are measured in characters, not bytes, so multi-byte input
//! never splits inside a code point.

/// Character-based splitter with overlap.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    /// Creates a splitter with the standard separator ladder
    /// (`"\n\n"`, `"\n"`, `" "`, `""`).
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }

    /// Splits `text` into trimmed, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_with(text, &self.separators)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, rest) = match separators.split_first() {
            Some((s, rest)) => (s.as_str(), rest),
            None => return vec![text.to_string()],
        };

        // Fall through to a finer separator when this one never occurs.
        if !separator.is_empty() && !text.contains(separator) && !rest.is_empty() {
            return self.split_with(text, rest);
        }

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(|c| c.to_string()).collect()
        } else {
            text.split(separator).map(str::to_string).collect()
        };

        let sep_len = separator.chars().count();
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0usize;

        for piece in pieces {
            let piece_len = piece.chars().count();

            // A piece that alone exceeds the budget gets re-split at the
            // next separator level before merging continues.
            if piece_len > self.chunk_size {
                if !current.is_empty() {
                    chunks.push(current.join(separator));
                }
                if rest.is_empty() {
                    chunks.push(piece);
                } else {
                    chunks.extend(self.split_with(&piece, rest));
                }
                current = Vec::new();
                current_len = 0;
                continue;
            }

            let extra = if current.is_empty() {
                piece_len
            } else {
                piece_len + sep_len
            };
            if !current.is_empty() && current_len + extra > self.chunk_size {
                chunks.push(current.join(separator));
                current = self.carry_overlap(current, sep_len);
                current_len = joined_len(&current, sep_len);
            }

            if !current.is_empty() {
                current_len += sep_len;
            }
            current_len += piece_len;
            current.push(piece);
        }

        if !current.is_empty() {
            chunks.push(current.join(separator));
        }
        chunks
    }

    /// Keeps the trailing pieces of a closed chunk, up to
    /// `chunk_overlap` characters, to seed the next chunk.
    fn carry_overlap(&self, pieces: Vec<String>, sep_len: usize) -> Vec<String> {
        if self.chunk_overlap == 0 {
            return Vec::new();
        }
        let mut kept: Vec<String> = Vec::new();
        let mut total = 0usize;
        for piece in pieces.into_iter().rev() {
            let cost = piece.chars().count() + if kept.is_empty() { 0 } else { sep_len };
            if total + cost > self.chunk_overlap {
                break;
            }
            total += cost;
            kept.push(piece);
        }
        kept.reverse();
        kept
    }
}

fn joined_len(pieces: &[String], sep_len: usize) -> usize {
    if pieces.is_empty() {
        return 0;
    }
    let chars: usize = pieces.iter().map(|p| p.chars().count()).sum();
    chars + sep_len * (pieces.len() - 1)
}
