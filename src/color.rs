//! Label colours shared by the host page markers and the sidebar legend.
//!
//! Both surfaces call [`color_for_label`] independently; identical labels always
//! land on identical colours because the mapping depends on the label alone.

/// Label that always renders in [`RESERVED_COLOR`].
pub const RESERVED_LABEL: &str = "Dramatisierung";
pub const RESERVED_COLOR: &str = "#90ee90";

pub const PALETTE: [&str; 10] = [
    "#FFDDC1", "#C1E1FF", "#D4FFC1", "#F0C1FF", "#FFFFC1", "#C1FFF4", "#FFC1C1", "#E1C1FF",
    "#C1F4FF", "#E8FFC1",
];

/// `hash = unit + hash * 31` over the UTF-16 code units of `label`, wrapping at 32 bits.
pub fn label_hash(label: &str) -> i32 {
    label.encode_utf16().fold(0i32, |hash, unit| {
        (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

pub fn palette_index(label: &str) -> usize {
    // Remainder first: `i32::MIN.abs()` would overflow.
    (label_hash(label) % PALETTE.len() as i32).unsigned_abs() as usize
}

pub fn color_for_label(label: &str) -> &'static str {
    if label == RESERVED_LABEL {
        return RESERVED_COLOR;
    }
    PALETTE[palette_index(label)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_label_has_fixed_color() {
        assert_eq!(color_for_label("Dramatisierung"), "#90ee90");
        assert_ne!(color_for_label("dramatisierung"), RESERVED_COLOR);
    }

    #[test]
    fn hash_matches_reference_fixtures() {
        let fixtures: [(&str, i32, usize); 14] = [
            ("", 0, 0),
            ("a", 97, 7),
            ("A", 65, 5),
            ("Framing", 1057404618, 8),
            ("Ironie", -2096342012, 2),
            ("Alarmismus", 1046134480, 0),
            ("Whataboutism", 967026874, 4),
            ("Emotionalisierung", 1878808488, 8),
            ("Pauschalisierung", -1812354751, 1),
            ("Übertreibung", 1451736865, 5),
            ("Strohmann-Argument", -1836790068, 8),
            ("Emotionale Sprache und Übertreibung", 50338979, 9),
            ("Rhetorische Frage", -1880919039, 9),
            ("😀", 1772899, 9),
        ];
        for (label, hash, index) in fixtures {
            assert_eq!(label_hash(label), hash, "hash of {label:?}");
            assert_eq!(palette_index(label), index, "palette index of {label:?}");
            assert_eq!(color_for_label(label), PALETTE[index]);
        }
    }

    #[test]
    fn empty_label_uses_first_palette_entry() {
        assert_eq!(color_for_label(""), "#FFDDC1");
    }

    #[test]
    fn coloring_is_deterministic() {
        for label in ["Framing", "Angstmacherei", "Metapher", "x", "Schwarz-Weiß-Denken"] {
            assert_eq!(color_for_label(label), color_for_label(&label.to_string()));
        }
    }

    #[test]
    fn minimum_hash_does_not_overflow_index() {
        assert_eq!((i32::MIN % 10).unsigned_abs(), 8);
    }
}
