/// Word-byte lookup table: ASCII letters, digits, and the apostrophe.
/// Classification is on raw bytes, so a UTF-8 continuation byte is never a
/// word byte even when the character it belongs to is a letter.
const fn make_word_table() -> [bool; 256] {
    let mut t = [false; 256];
    let mut b = 0;
    while b < 256 {
        let c = b as u8;
        t[b] = c.is_ascii_alphanumeric() || c == b'\'';
        b += 1;
    }
    t
}

/// Precomputed table: `WORD_TABLE[byte]` is true for word bytes.
const WORD_TABLE: [bool; 256] = make_word_table();

/// True iff `b` is an ASCII letter, ASCII digit, or `'`.
#[inline]
pub fn is_word_byte(b: u8) -> bool {
    WORD_TABLE[b as usize]
}
