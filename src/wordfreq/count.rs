use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map;
use std::sync::LazyLock;

use regex::Regex;

/// Token pattern, compiled once and shared read-only by every worker.
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9']+").expect("word pattern is valid"));

/// How segment bytes are turned into text before tokenizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8; invalid sequences are dropped.
    #[default]
    Utf8,
    /// One byte per character (ISO-8859-1). Never fails.
    Latin1,
}

impl TextEncoding {
    /// Best-effort decode. Valid UTF-8 is borrowed without copying.
    pub fn decode<'a>(self, data: &'a [u8]) -> Cow<'a, str> {
        match self {
            TextEncoding::Utf8 => decode_utf8_dropping(data),
            TextEncoding::Latin1 => decode_latin1(data),
        }
    }
}

fn decode_utf8_dropping(data: &[u8]) -> Cow<'_, str> {
    if let Ok(s) = std::str::from_utf8(data) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(data.len());
    for chunk in data.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    Cow::Owned(out)
}

fn decode_latin1(data: &[u8]) -> Cow<'_, str> {
    if data.is_ascii() {
        // ASCII is valid UTF-8 and identical in both encodings
        return Cow::Borrowed(std::str::from_utf8(data).unwrap_or_default());
    }
    Cow::Owned(data.iter().map(|&b| b as char).collect())
}

/// Word → occurrence count for one segment, or for a merged total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordCounts {
    counts: HashMap<String, u64>,
}

impl WordCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Count for `word`; absent words count zero.
    pub fn get(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn add(&mut self, word: &str, n: u64) {
        if let Some(c) = self.counts.get_mut(word) {
            *c += n;
        } else {
            self.counts.insert(word.to_owned(), n);
        }
    }

    /// Entries ordered by descending count, then ascending word.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> =
            self.counts.iter().map(|(w, &c)| (w.as_str(), c)).collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

impl<'a> IntoIterator for &'a WordCounts {
    type Item = (&'a String, &'a u64);
    type IntoIter = hash_map::Iter<'a, String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.iter()
    }
}

impl<S: AsRef<str>> FromIterator<(S, u64)> for WordCounts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut wc = WordCounts::new();
        for (w, n) in iter {
            wc.add(w.as_ref(), n);
        }
        wc
    }
}

/// Count the words of one segment's bytes.
///
/// Decoding never fails: malformed bytes only cost tokens. The text is
/// lowercased before matching, so `The` and `THE` count as one word.
pub fn count_words(data: &[u8], encoding: TextEncoding) -> WordCounts {
    let text = encoding.decode(data).to_lowercase();
    let mut counts = WordCounts::new();
    for m in WORD_RE.find_iter(&text) {
        counts.add(m.as_str(), 1);
    }
    counts
}

/// Words of `data` in order of appearance, lowercased.
pub fn tokenize(data: &[u8], encoding: TextEncoding) -> Vec<String> {
    let text = encoding.decode(data).to_lowercase();
    WORD_RE
        .find_iter(&text)
        .map(|m| m.as_str().to_owned())
        .collect()
}
