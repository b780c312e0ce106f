//! RADIX-50 filename codec.
//!
//! MK-90 filenames are nine characters (6-char base + 3-char extension,
//! space-padded, uppercase) packed three characters per 16-bit word into a
//! fixed triple of words, using the RT-11 RADIX-50 charset.

use crate::PAD_WORD;

/// RADIX-50 charset; a character's index in this table is its code.
pub const CHARSET: &[u8; 40] = b" ABCDEFGHIJKLMNOPQRSTUVWXYZ$.%0123456789";

const RADIX: u16 = 40;

/// Packed filename length, in 16-bit words.
pub const RADIX_LENGTH: usize = 3;

/// Padded ASCII filename length: 6-char base plus 3-char extension.
pub const ASCII_LENGTH: usize = 9;

/// Where the extension starts in the padded ASCII form.
const EXT_POS: usize = 6;

fn char_code(c: u8) -> u16 {
    // Characters outside the charset fall back to the pad (space) code.
    CHARSET.iter().position(|&x| x == c).unwrap_or(0) as u16
}

/// Pack a 9-char padded ASCII name into three RADIX-50 words.
pub fn encode(ascii: &str) -> [u16; RADIX_LENGTH] {
    let bytes = ascii.as_bytes();
    let mut words = [0u16; RADIX_LENGTH];

    for (i, word) in words.iter_mut().enumerate() {
        let chunk = &bytes[i * 3..i * 3 + 3];
        *word = char_code(chunk[0]) * RADIX * RADIX
            + char_code(chunk[1]) * RADIX
            + char_code(chunk[2]);
    }

    words
}

/// Unpack three RADIX-50 words into the 9-char padded ASCII form.
/// Never fails: out-of-range codes wrap around the charset.
pub fn decode(words: &[u16; RADIX_LENGTH]) -> String {
    let mut ascii = String::with_capacity(ASCII_LENGTH);

    for &word in words {
        ascii.push(CHARSET[(word / (RADIX * RADIX) % RADIX) as usize] as char);
        ascii.push(CHARSET[(word / RADIX % RADIX) as usize] as char);
        ascii.push(CHARSET[(word % RADIX) as usize] as char);
    }

    ascii
}

/// A volume filename in both its packed and padded ASCII forms.
///
/// Immutable once constructed; both forms always agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filename {
    radix50: [u16; RADIX_LENGTH],
    ascii: String,
}

impl Filename {
    /// Build from a host-style name (`BASE.EXT`, `BASE`, or the raw 9-char
    /// padded layout). Lowercase is uppercased, overlong parts truncated.
    pub fn from_ascii(name: &str) -> Self {
        let ascii = normalize(name);
        let radix50 = encode(&ascii);
        Self { radix50, ascii }
    }

    /// Build from an on-disk word triple.
    pub fn from_radix50(words: [u16; RADIX_LENGTH]) -> Self {
        Self {
            ascii: decode(&words),
            radix50: words,
        }
    }

    /// The cleared-name triple carried by empty directory entries.
    pub fn pad_triple() -> [u16; RADIX_LENGTH] {
        [PAD_WORD; RADIX_LENGTH]
    }

    pub fn radix50(&self) -> [u16; RADIX_LENGTH] {
        self.radix50
    }

    /// The padded 9-char form (no dot).
    pub fn ascii(&self) -> &str {
        &self.ascii
    }

    /// Printable `BASE.EXT` form with padding elided.
    pub fn print_ascii(&self) -> String {
        let base = self.ascii[..EXT_POS].trim_end();
        let ext = self.ascii[EXT_POS..].trim_end();
        if ext.is_empty() {
            base.to_string()
        } else {
            format!("{}.{}", base, ext)
        }
    }
}

/// Normalize a host name to the padded 9-char layout.
fn normalize(name: &str) -> String {
    let upper: String = name
        .to_uppercase()
        .chars()
        .map(|c| if c.is_ascii() { c } else { ' ' })
        .collect();

    let (base, ext) = match upper.find('.') {
        Some(pos) => (&upper[..pos], &upper[pos + 1..]),
        // No dot: the input is already in the 9-char layout (or shorter).
        None => (upper.as_str(), ""),
    };

    let mut ascii = String::with_capacity(ASCII_LENGTH);
    if ext.is_empty() && base.len() > EXT_POS {
        for c in base.chars().chain(std::iter::repeat(' ')).take(ASCII_LENGTH) {
            ascii.push(c);
        }
    } else {
        for c in base.chars().chain(std::iter::repeat(' ')).take(EXT_POS) {
            ascii.push(c);
        }
        for c in ext.chars().chain(std::iter::repeat(' ')).take(ASCII_LENGTH - EXT_POS) {
            ascii.push(c);
        }
    }

    // Characters outside the charset pack as the pad code; fold them to
    // spaces here so both forms stay in agreement.
    ascii
        .bytes()
        .map(|b| if CHARSET.contains(&b) { b as char } else { ' ' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_words() {
        // H=8 E=5 L=12 L=12 O=15 ' '=0, B=2 A=1 S=19
        assert_eq!(
            encode("HELLO BAS"),
            [
                8 * 1600 + 5 * 40 + 12,
                12 * 1600 + 15 * 40,
                2 * 1600 + 40 + 19
            ]
        );
    }

    #[test]
    fn test_decode_is_encode_inverse() {
        for name in ["HELLO BAS", "A        ", "PRG123BAS", "FILE$. 99"] {
            assert_eq!(decode(&encode(name)), name);
        }
    }

    #[test]
    fn test_from_ascii_normalizes() {
        let f = Filename::from_ascii("hello.bas");
        assert_eq!(f.ascii(), "HELLO BAS");
        assert_eq!(f.print_ascii(), "HELLO.BAS");

        // Overlong parts are truncated.
        let f = Filename::from_ascii("VERYLONGNAME.EXTENSION");
        assert_eq!(f.ascii(), "VERYLOEXT");

        // Dotless input is taken as the padded layout.
        let f = Filename::from_ascii("DIZZY BAS");
        assert_eq!(f.print_ascii(), "DIZZY.BAS");

        // Short dotless input is a bare base name.
        let f = Filename::from_ascii("noext");
        assert_eq!(f.ascii(), "NOEXT    ");
        assert_eq!(f.print_ascii(), "NOEXT");
    }

    #[test]
    fn test_roundtrip_through_words() {
        let f = Filename::from_ascii("DIZZY.BAS");
        let g = Filename::from_radix50(f.radix50());
        assert_eq!(f, g);
        assert_eq!(g.ascii(), "DIZZY BAS");
    }

    #[test]
    fn test_unsupported_chars_map_to_pad() {
        let f = Filename::from_ascii("A_B.C");
        assert_eq!(f.ascii(), "A B   C  ");
    }
}
