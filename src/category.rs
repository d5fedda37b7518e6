//! The closed set of waste categories and their disposal suggestions

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A waste category the classifier can predict. Variants are declared in
/// label order, so ordered collections keyed by `Category` iterate (and
/// serialize) alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Battery,
    Biological,
    Cardboard,
    Clothes,
    Glass,
    Metal,
    Paper,
    Plastic,
    Shoes,
    Trash,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Battery,
        Category::Biological,
        Category::Cardboard,
        Category::Clothes,
        Category::Glass,
        Category::Metal,
        Category::Paper,
        Category::Plastic,
        Category::Shoes,
        Category::Trash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Battery => "battery",
            Category::Biological => "biological",
            Category::Cardboard => "cardboard",
            Category::Clothes => "clothes",
            Category::Glass => "glass",
            Category::Metal => "metal",
            Category::Paper => "paper",
            Category::Plastic => "plastic",
            Category::Shoes => "shoes",
            Category::Trash => "trash",
        }
    }

    /// How to dispose of an item in this category
    pub fn suggestion(&self) -> &'static str {
        match self {
            Category::Battery => "Take to battery recycling points. Contains hazardous materials - never dispose in regular trash!",
            Category::Biological => "Dispose in organic waste bins. Can be composted to create nutrient-rich soil.",
            Category::Cardboard => "Flatten and place in recycling bin. Remove any tape or metal staples.",
            Category::Clothes => "Donate if in good condition, or take to textile recycling points.",
            Category::Glass => "Clean and separate by color. Take to glass recycling containers.",
            Category::Metal => "Clean and crush if possible. Check if local recycling accepts the type of metal.",
            Category::Paper => "Keep dry and clean. Bundle together for paper recycling.",
            Category::Plastic => "Clean, check recycling number, and sort according to local guidelines.",
            Category::Shoes => "Donate wearable shoes. For worn-out shoes, check specialty recycling programs.",
            Category::Trash => "If not recyclable or reusable, dispose in general waste as last resort.",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A label outside the known category set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Matches a lowercase label exactly; callers normalize case first
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_suggestion() {
        for category in Category::ALL {
            assert!(
                !category.suggestion().is_empty(),
                "{category} has no suggestion"
            );
        }
    }

    #[test]
    fn test_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn test_unknown_label() {
        let err = "styrofoam".parse::<Category>().unwrap_err();
        assert_eq!(err, UnknownCategory("styrofoam".into()));
        assert_eq!(err.to_string(), "unknown category \"styrofoam\"");
    }

    #[test]
    fn test_labels_are_sorted() {
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);

        let labels: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        let mut sorted_labels = labels.clone();
        sorted_labels.sort();
        assert_eq!(labels, sorted_labels);
    }

    #[test]
    fn test_serializes_as_label() {
        let json = serde_json::to_string(&Category::Cardboard).unwrap();
        assert_eq!(json, "\"cardboard\"");
    }
}
