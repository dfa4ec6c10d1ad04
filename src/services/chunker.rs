/// Default chunk size in words (roughly 1500 model tokens).
pub const DEFAULT_CHUNK_WORDS: usize = 1000;

/// Split text into chunks of at most `chunk_words` whitespace-separated words.
/// Only the last chunk may be shorter. Empty text yields no chunks.
pub fn chunk_words(text: &str, chunk_words: usize) -> Vec<String> {
    let size = chunk_words.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    words.chunks(size).map(|chunk| chunk.join(" ")).collect()
}

/// Cards to request per chunk so the whole document lands near `desired_total`.
pub fn cards_per_chunk(desired_total: u32, chunk_count: usize) -> u32 {
    if chunk_count == 0 {
        return desired_total.max(1);
    }
    let per_chunk = desired_total as usize / chunk_count;
    per_chunk.max(1) as u32
}
