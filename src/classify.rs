//! Visit count → intensity tier for region coloring.

use serde::{Deserialize, Serialize};

/// An sRGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb`
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Visit-intensity bucket. Ordering follows intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisitTier {
    None,
    Low,
    Mid,
    High,
    VeryHigh,
}

impl VisitTier {
    /// Tiers that appear in the legend, lowest first
    pub const LEGEND: [VisitTier; 4] = [
        VisitTier::Low,
        VisitTier::Mid,
        VisitTier::High,
        VisitTier::VeryHigh,
    ];

    /// Classify a visit count; `None` means the country has no record.
    pub fn classify(visits: Option<u64>) -> Self {
        match visits {
            None | Some(0) => VisitTier::None,
            Some(1..=4) => VisitTier::Low,
            Some(5..=9) => VisitTier::Mid,
            Some(10..=19) => VisitTier::High,
            Some(_) => VisitTier::VeryHigh,
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            VisitTier::None => Rgb(0xf0, 0xf0, 0xf0),
            VisitTier::Low => Rgb(0x90, 0xca, 0xf9),
            VisitTier::Mid => Rgb(0x42, 0xa5, 0xf5),
            VisitTier::High => Rgb(0x19, 0x76, 0xd2),
            VisitTier::VeryHigh => Rgb(0x0d, 0x47, 0xa1),
        }
    }

    /// Visit range shown in the legend
    pub fn label(self) -> &'static str {
        match self {
            VisitTier::None => "0",
            VisitTier::Low => "1-4",
            VisitTier::Mid => "5-9",
            VisitTier::High => "10-19",
            VisitTier::VeryHigh => "20+",
        }
    }
}
