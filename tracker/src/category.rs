use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse garment category. Garment identity is tracked per person and
/// category, so two tops on the same person share one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Top,
    Bottom,
    Dress,
    Outerwear,
    Shoes,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Top,
        Category::Bottom,
        Category::Dress,
        Category::Outerwear,
        Category::Shoes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Top => "top",
            Category::Bottom => "bottom",
            Category::Dress => "dress",
            Category::Outerwear => "outerwear",
            Category::Shoes => "shoes",
        }
    }

    /// Maps a detector class label (DeepFashion2 naming) to its coarse
    /// category. Coarse names map to themselves; unknown labels are tops.
    pub fn from_label(label: &str) -> Category {
        let label = label.trim().to_ascii_lowercase();
        if let Ok(c) = label.parse() {
            return c;
        }
        match label.as_str() {
            "short_sleeve_top" | "long_sleeve_top" | "vest" | "sling" => Category::Top,
            "short_sleeve_outwear" | "long_sleeve_outwear" => Category::Outerwear,
            "shorts" | "trousers" | "skirt" => Category::Bottom,
            "short_sleeve_dress" | "long_sleeve_dress" | "vest_dress" | "sling_dress" => {
                Category::Dress
            }
            "shoe" => Category::Shoes,
            _ => Category::Top,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Parses a coarse category name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown category {s:?}"))
    }
}
