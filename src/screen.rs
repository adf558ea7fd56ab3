//! Screen identifiers and the coarse screen-family classifier.
//!
//! A [`ScreenState`] is an opaque, value-comparable name for one screen or
//! sub-screen of the driven application (`"main_city"`, `"mail_wars"`, ...).
//! Nothing inside the navigation engine interprets its contents.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::fuzzy::fuzzy_substring_match;

/// Opaque identifier for one screen of the driven application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ScreenState(String);

impl ScreenState {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ScreenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScreenState {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ScreenState {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for ScreenState {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

impl Borrow<str> for ScreenState {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ScreenState {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ScreenState {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Coarse context classifier read from a small, reliably rendered indicator.
///
/// The analyzer produces this instead of a raw string so the verifier never
/// compares magic words itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FamilyHint {
    #[default]
    Unknown,
    /// The world map.
    #[serde(alias = "world")]
    WorldFamily,
    /// Inside the player's city.
    #[serde(alias = "city")]
    CityFamily,
}

impl FamilyHint {
    /// Classify the label of the city/world toggle button.
    ///
    /// The toggle always offers the *other* context: it reads "World" while
    /// the player is in the city and "City" while on the world map.
    pub fn classify(indicator: &str) -> Self {
        if indicator.trim().is_empty() {
            return FamilyHint::Unknown;
        }
        if fuzzy_substring_match(indicator, "world", 1) {
            FamilyHint::CityFamily
        } else if fuzzy_substring_match(indicator, "city", 1) {
            FamilyHint::WorldFamily
        } else {
            FamilyHint::Unknown
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FamilyHint::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FamilyHint::Unknown => "unknown",
            FamilyHint::WorldFamily => "world",
            FamilyHint::CityFamily => "city",
        }
    }
}

impl fmt::Display for FamilyHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FamilyHint {
    type Err = anyhow::Error;

    /// Parse a family name: where the player is, not the toggle label.
    /// Tolerates one edit, so `wrld` reads as the world map.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        let name = name.trim_end_matches("_family");
        let close = |word: &str| strsim::levenshtein(name, word) <= 1;
        if name.is_empty() || name == "unknown" {
            Ok(FamilyHint::Unknown)
        } else if close("world") {
            Ok(FamilyHint::WorldFamily)
        } else if close("city") {
            Ok(FamilyHint::CityFamily)
        } else {
            anyhow::bail!(
                "Invalid family hint '{}'. Valid values: unknown, world, city",
                s
            )
        }
    }
}

/// Screen ids used by the compiled-in catalog.
pub mod known {
    pub const MAIN_CITY: &str = "main_city";
    pub const WORLD: &str = "world";
    pub const EXPLORATION: &str = "exploration";
    pub const EXPLORATION_BATTLE: &str = "exploration_battle";
    pub const ALLIANCE_MANAGE: &str = "alliance_manage";
    pub const ALLIANCE_TECH: &str = "alliance_tech";
    pub const ALLIANCE_CHESTS: &str = "alliance_chests";
    pub const ALLIANCE_CHEST_GIFT: &str = "alliance_chest_gift";
    pub const ALLIANCE_CHEST_LOOT: &str = "alliance_chest_loot";
    pub const ALLIANCE_WAR: &str = "alliance_war";
    pub const ALLIANCE_WAR_AUTO_JOIN: &str = "alliance_war_auto_join";
    pub const CHIEF_PROFILE: &str = "chief_profile";
    pub const CHIEF_PROFILE_SETTING: &str = "chief_profile_setting";
    pub const CHIEF_CHARACTERS: &str = "chief_characters";
    pub const CHIEF_PROFILE_ACCOUNT: &str = "chief_profile_account";
    pub const CHANGE_ACCOUNT: &str = "chief_profile_account_change_account";
    pub const CHANGE_GOOGLE: &str = "chief_profile_account_change_account_google";
    pub const CHANGE_GOOGLE_CONFIRM: &str = "chief_profile_account_change_account_google_continue";
    pub const MAIL: &str = "mail";
    pub const MAIL_WARS: &str = "mail_wars";
    pub const MAIL_ALLIANCE: &str = "mail_alliance";
    pub const MAIL_SYSTEM: &str = "mail_system";
    pub const MAIL_REPORTS: &str = "mail_reports";
    pub const MAIL_STARRED: &str = "mail_starred";
    pub const BACKPACK: &str = "backpack";
    pub const CHAT: &str = "chat";
    pub const HEROES: &str = "heroes";
    pub const EVENTS: &str = "events";
    pub const DEALS: &str = "deals";
    pub const VIP: &str = "vip";
    pub const MAIN_MENU_CITY: &str = "main_menu_city";
    pub const MAIN_MENU_WILDERNESS: &str = "main_menu_wilderness";
    pub const MAIN_MENU_TECH_RESEARCH: &str = "main_menu_tech_research";
    pub const INFANTRY_CITY_VIEW: &str = "infantry_city_view";
    pub const LANCER_CITY_VIEW: &str = "lancer_city_view";
    pub const MARKSMAN_CITY_VIEW: &str = "marksman_city_view";
    pub const TUNDRA_ADVENTURE: &str = "tundra_adventure";
    pub const TUNDRA_ADVENTURE_MAIN: &str = "tundra_adventure_main";
    pub const TUNDRA_ADVENTURE_DRILL: &str = "tundra_adventure_drill";
    pub const TUNDRA_ADVENTURE_ODESSEY: &str = "tundra_adventure_odessey";
    pub const TUNDRA_ADVENTURE_CARAVAN: &str = "tundra_adventure_caravan";
    pub const TUNDRA_ADVENTURER_DRILL: &str = "tundra_adventurer_drill";
    pub const TUNDRA_ADVENTURER_DAILY_MISSIONS: &str = "tundra_adventurer_daily_missions";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_state_equality() {
        let a = ScreenState::from("main_city");
        let b = ScreenState::new("main_city".to_string());
        assert_eq!(a, b);
        assert_eq!(a, "main_city");
        assert_ne!(a, ScreenState::from("world"));
    }

    #[test]
    fn test_screen_state_serializes_as_plain_string() {
        let json = serde_json::to_string(&ScreenState::from("mail")).unwrap();
        assert_eq!(json, "\"mail\"");
    }

    #[test]
    fn test_family_classify_toggle_label() {
        assert_eq!(FamilyHint::classify("World"), FamilyHint::CityFamily);
        assert_eq!(FamilyHint::classify("Wrld"), FamilyHint::CityFamily);
        assert_eq!(FamilyHint::classify("CITY"), FamilyHint::WorldFamily);
        assert_eq!(FamilyHint::classify(""), FamilyHint::Unknown);
        assert_eq!(FamilyHint::classify("Backpack"), FamilyHint::Unknown);
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("city".parse::<FamilyHint>().unwrap(), FamilyHint::CityFamily);
        assert_eq!("WORLD".parse::<FamilyHint>().unwrap(), FamilyHint::WorldFamily);
        assert!("ocean".parse::<FamilyHint>().is_err());
        assert!("moon".parse::<FamilyHint>().is_err());
    }

    #[test]
    fn test_family_from_str_tolerates_one_edit() {
        assert_eq!("Wrld".parse::<FamilyHint>().unwrap(), FamilyHint::WorldFamily);
        assert_eq!("cty".parse::<FamilyHint>().unwrap(), FamilyHint::CityFamily);
        assert_eq!("city_family".parse::<FamilyHint>().unwrap(), FamilyHint::CityFamily);
        // a family name, unlike the toggle label classify() reads
        assert_eq!("World".parse::<FamilyHint>().unwrap(), FamilyHint::WorldFamily);
        assert_eq!(FamilyHint::classify("World"), FamilyHint::CityFamily);
    }
}
