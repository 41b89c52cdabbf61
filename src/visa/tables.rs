use ratatui::style::Color;

/// Short kind codes, index 0 is empty
pub const KINDS: [&str; 5] = ["", "vf", "voa", "eta", "vr"];

/// Human readable kind labels, parallel to `KINDS`
pub const FULL_KINDS: [&str; 5] = ["", "visa free", "visa on arrival", "eTA", "visa required"];

/// Visa sub-type labels, index 0 means "no sub-type"
pub const TYPES: [&str; 17] = [
    "",
    "eVisa",
    "eVisitors",
    "free visa on arrival",
    "tourist card",
    "tourist registration",
    "trump ban",
    "pre-enrollment",
    "visa on arrival / eVisa",
    "EVW",
    "free eVisa",
    "visa waiver registration",
    "pre-visa on arrival",
    "not admitted",
    "eVisa by email",
    "visa on arrival (by email)",
    "eVisa (fast track)",
];

/// Validity terms. `None` marks the two slots the dataset never defined.
pub const TERMS: [Option<&str>; 19] = [
    Some(""),
    Some("7 days"),
    Some("14 days"),
    Some("90 days"),
    Some("28 days"),
    Some("30 days"),
    Some("180 days"),
    Some("360 days"),
    Some("31 days"),
    Some("-"),
    None,
    None,
    Some("60 days"),
    Some("15 days"),
    Some("120 days"),
    Some("240 days"),
    Some("45 days"),
    Some("21 days"),
    Some("42 days"),
];

/// Fill for unselected countries and for the selected passport itself
pub const NEUTRAL: Color = Color::Rgb(128, 128, 128);

/// Requirement category, one per non-empty entry of `KINDS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisaKind {
    VisaFree,
    VisaOnArrival,
    Eta,
    VisaRequired,
}

impl VisaKind {
    pub const ALL: [VisaKind; 4] = [
        VisaKind::VisaFree,
        VisaKind::VisaOnArrival,
        VisaKind::Eta,
        VisaKind::VisaRequired,
    ];

    /// Resolve a kind index. Index 0 and anything past the table are `None`.
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(VisaKind::VisaFree),
            2 => Some(VisaKind::VisaOnArrival),
            3 => Some(VisaKind::Eta),
            4 => Some(VisaKind::VisaRequired),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            VisaKind::VisaFree => 1,
            VisaKind::VisaOnArrival => 2,
            VisaKind::Eta => 3,
            VisaKind::VisaRequired => 4,
        }
    }

    /// Short code ("vf", "voa", "eta", "vr")
    pub fn code(self) -> &'static str {
        KINDS[self.index()]
    }

    pub fn label(self) -> &'static str {
        FULL_KINDS[self.index()]
    }

    /// Map fill color: #0c0, #00f, #f80, #f00
    pub fn color(self) -> Color {
        match self {
            VisaKind::VisaFree => Color::Rgb(0x00, 0xcc, 0x00),
            VisaKind::VisaOnArrival => Color::Rgb(0x00, 0x00, 0xff),
            VisaKind::Eta => Color::Rgb(0xff, 0x88, 0x00),
            VisaKind::VisaRequired => Color::Rgb(0xff, 0x00, 0x00),
        }
    }
}

/// Look up the fill color for a short kind code. The empty code has no color.
pub fn color_for_code(code: &str) -> Option<Color> {
    VisaKind::ALL
        .iter()
        .find(|kind| kind.code() == code)
        .map(|kind| kind.color())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_index_round_trip() {
        for kind in VisaKind::ALL {
            assert_eq!(VisaKind::from_index(kind.index() as u32), Some(kind));
        }
        assert_eq!(VisaKind::from_index(0), None);
        assert_eq!(VisaKind::from_index(5), None);
    }

    #[test]
    fn test_every_non_empty_kind_has_color() {
        for code in &KINDS[1..] {
            assert!(color_for_code(code).is_some(), "no color for {code}");
        }
        assert_eq!(color_for_code(KINDS[0]), None);
    }

    #[test]
    fn test_terms_gap() {
        assert_eq!(TERMS[9], Some("-"));
        assert_eq!(TERMS[10], None);
        assert_eq!(TERMS[11], None);
        assert_eq!(TERMS[12], Some("60 days"));
    }
}
