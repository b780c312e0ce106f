//! KOI-7 text transcoding.
//!
//! MK-90 BASIC sources are stored in KOI-7 N2: plain 7-bit ASCII with the
//! 0x60..=0x7F range holding uppercase Cyrillic. The volume core itself
//! only moves payload bytes around; this module is the boundary where host
//! UTF-8 text becomes target bytes and back.

/// Cyrillic letters at codes 0x60..=0x7F, in KOI order.
const CYRILLIC: [char; 32] = [
    'Ю', 'А', 'Б', 'Ц', 'Д', 'Е', 'Ф', 'Г', 'Х', 'И', 'Й', 'К', 'Л', 'М', 'Н', 'О', 'П', 'Я',
    'Р', 'С', 'Т', 'У', 'Ж', 'В', 'Ь', 'Ы', 'З', 'Ш', 'Э', 'Щ', 'Ч', 'Ъ',
];

const KOI_BASE: u8 = 0x60;

fn koi_code(c: char) -> Option<u8> {
    CYRILLIC
        .iter()
        .position(|&x| x == c)
        .map(|i| KOI_BASE + i as u8)
}

/// Encode one line of host text to KOI-7 bytes.
///
/// Cyrillic maps into 0x60..=0x7F; since that range is not available for
/// Latin, lowercase ASCII is uppercased. Anything unrepresentable becomes
/// `?`.
pub fn utf_to_koi(line: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());

    for c in line.chars() {
        let c = match c {
            'ё' | 'Ё' => 'Е',
            _ => c.to_ascii_uppercase(),
        };

        if c.is_ascii() && (c as u8) < KOI_BASE {
            out.push(c as u8);
        } else if let Some(code) = koi_code(c.to_uppercase().next().unwrap_or(c)) {
            out.push(code);
        } else {
            out.push(b'?');
        }
    }

    out
}

/// Decode KOI-7 bytes to host text.
pub fn koi_to_utf(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            KOI_BASE..=0x7F => CYRILLIC[(b - KOI_BASE) as usize],
            _ => (b & 0x7F) as char,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through_uppercased() {
        assert_eq!(utf_to_koi("10 PRINT \"HI\""), b"10 PRINT \"HI\"");
        assert_eq!(utf_to_koi("print"), b"PRINT");
    }

    #[test]
    fn test_cyrillic_roundtrip() {
        let koi = utf_to_koi("ПРИВЕТ, МИР!");
        assert_eq!(koi_to_utf(&koi), "ПРИВЕТ, МИР!");
    }

    #[test]
    fn test_known_codes() {
        assert_eq!(utf_to_koi("Ю"), vec![0x60]);
        assert_eq!(utf_to_koi("А"), vec![0x61]);
        assert_eq!(utf_to_koi("Ъ"), vec![0x7F]);
        assert_eq!(koi_to_utf(&[0x70, 0x72, 0x69, 0x77, 0x65, 0x74]), "ПРИВЕТ");
    }

    #[test]
    fn test_unrepresentable_becomes_question_mark() {
        assert_eq!(utf_to_koi("漢"), vec![b'?']);
    }
}
