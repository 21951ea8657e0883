//! Card definitions and per-player scores.
//!
//! Enum names are lowercase on the wire (`"attack"`, `"red"`, `"circle"`)
//! and parse case-insensitively from catalog rows via [`FromStr`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CardId, ProtocolError};

/// What a card does when played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Attack,
    Defend,
    /// Loaded from the catalog but never playable.
    Trivia,
}

/// Score category. `Wild` is not scored; it only widens counter eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardCategory {
    Red,
    Orange,
    Blue,
    Wild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubCategory {
    Square,
    Triangle,
    Circle,
}

macro_rules! parse_enum {
    ($ty:ident, $what:literal, { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ProtocolError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.trim();
                match raw.to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(ProtocolError::InvalidMessage(format!(
                        "unknown {}: {raw:?}",
                        $what
                    ))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let name = match self {
                    $($ty::$variant => $name,)+
                };
                f.write_str(name)
            }
        }
    };
}

parse_enum!(CardType, "card type", {
    "attack" => Attack,
    "defend" => Defend,
    "trivia" => Trivia,
});

parse_enum!(CardCategory, "card category", {
    "red" => Red,
    "orange" => Orange,
    "blue" => Blue,
    "wild" => Wild,
});

parse_enum!(SubCategory, "card subcategory", {
    "square" => Square,
    "triangle" => Triangle,
    "circle" => Circle,
});

/// An immutable card definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    pub image: String,
    pub description: String,
    #[serde(rename = "cardType")]
    pub card_type: CardType,
    #[serde(rename = "cardCategory")]
    pub category: CardCategory,
    #[serde(rename = "cardSubCategories")]
    pub sub_categories: Vec<SubCategory>,
}

impl Card {
    /// Whether the two cards have at least one subcategory in common.
    pub fn shares_sub_category(&self, other: &Card) -> bool {
        self.sub_categories
            .iter()
            .any(|sub| other.sub_categories.contains(sub))
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// One player's score in each scored category. Values may go negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub red: i32,
    pub orange: i32,
    pub blue: i32,
}

impl Scores {
    /// Score for `category`. `Wild` has no score and reads as 0.
    pub fn get(&self, category: CardCategory) -> i32 {
        match category {
            CardCategory::Red => self.red,
            CardCategory::Orange => self.orange,
            CardCategory::Blue => self.blue,
            CardCategory::Wild => 0,
        }
    }

    /// Adds `delta` to `category`. Returns false (and changes nothing)
    /// for `Wild`.
    pub fn add(&mut self, category: CardCategory, delta: i32) -> bool {
        let slot = match category {
            CardCategory::Red => &mut self.red,
            CardCategory::Orange => &mut self.orange,
            CardCategory::Blue => &mut self.blue,
            CardCategory::Wild => return false,
        };
        *slot += delta;
        true
    }

    /// True when every scored category has reached `threshold`.
    pub fn has_won(&self, threshold: i32) -> bool {
        self.red >= threshold && self.orange >= threshold && self.blue >= threshold
    }
}

/// Score snapshot keyed by display name, as broadcast in `playersScores`.
pub type PlayersScores = BTreeMap<String, Scores>;

#[cfg(test)]
mod tests {
    use super::*;

    fn card(category: CardCategory, subs: &[SubCategory]) -> Card {
        Card {
            id: CardId(1),
            title: "Phishing".into(),
            image: "phishing.png".into(),
            description: "Bait".into(),
            card_type: CardType::Attack,
            category,
            sub_categories: subs.to_vec(),
        }
    }

    #[test]
    fn test_card_type_from_str_is_case_insensitive() {
        assert_eq!("ATTACK".parse::<CardType>().unwrap(), CardType::Attack);
        assert_eq!(" Defend ".parse::<CardType>().unwrap(), CardType::Defend);
        assert_eq!("trivia".parse::<CardType>().unwrap(), CardType::Trivia);
    }

    #[test]
    fn test_category_from_str_rejects_unknown() {
        let err = "PURPLE".parse::<CardCategory>().unwrap_err();
        assert!(err.to_string().contains("PURPLE"));
    }

    #[test]
    fn test_sub_category_from_str_reports_input_as_written() {
        let err = "  Hexagon ".parse::<SubCategory>().unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"invalid message: unknown card subcategory: "Hexagon""#
        );
    }

    #[test]
    fn test_card_serializes_with_wire_field_names() {
        let c = card(CardCategory::Red, &[SubCategory::Circle, SubCategory::Square]);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "title": "Phishing",
                "image": "phishing.png",
                "description": "Bait",
                "cardType": "attack",
                "cardCategory": "red",
                "cardSubCategories": ["circle", "square"],
            })
        );
    }

    #[test]
    fn test_shares_sub_category() {
        let a = card(CardCategory::Red, &[SubCategory::Circle]);
        let b = card(CardCategory::Red, &[SubCategory::Square, SubCategory::Circle]);
        let c = card(CardCategory::Red, &[SubCategory::Triangle]);
        assert!(a.shares_sub_category(&b));
        assert!(!a.shares_sub_category(&c));
    }

    #[test]
    fn test_scores_add_ignores_wild() {
        let mut s = Scores::default();
        assert!(s.add(CardCategory::Blue, 2));
        assert!(!s.add(CardCategory::Wild, 5));
        assert_eq!(s, Scores { red: 0, orange: 0, blue: 2 });
        assert_eq!(s.get(CardCategory::Wild), 0);
    }

    #[test]
    fn test_scores_can_go_negative() {
        let mut s = Scores::default();
        s.add(CardCategory::Red, -1);
        assert_eq!(s.get(CardCategory::Red), -1);
    }

    #[test]
    fn test_has_won_requires_every_category() {
        let mut s = Scores { red: 1, orange: 1, blue: 0 };
        assert!(!s.has_won(1));
        s.add(CardCategory::Blue, 1);
        assert!(s.has_won(1));
    }
}
