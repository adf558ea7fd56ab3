//! Title groups: which screens render which OCR-visible header.
//!
//! Several sub-screens share one header ("Mail" covers every mail tab), so a
//! title reading narrows the candidates to a group rather than a screen.
//! Groups are searched in registration order; register specific titles
//! before titles they contain ("Chief Profile" before "Profile").

use crate::fuzzy::fuzzy_substring_match;
use crate::screen::known::*;
use crate::screen::{FamilyHint, ScreenState};

/// Screens sharing one header text.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleGroup {
    pub title: String,
    pub screens: Vec<ScreenState>,
}

impl TitleGroup {
    pub fn contains(&self, screen: &ScreenState) -> bool {
        self.screens.contains(screen)
    }
}

/// Ordered title groups plus the two family groups.
#[derive(Debug, Clone, Default)]
pub struct TitleRegistry {
    groups: Vec<TitleGroup>,
    city: Vec<ScreenState>,
    world: Vec<ScreenState>,
}

impl TitleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group<I, S>(mut self, title: impl Into<String>, screens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ScreenState>,
    {
        self.add_group(title, screens);
        self
    }

    pub fn with_family<I, S>(mut self, family: FamilyHint, screens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ScreenState>,
    {
        self.set_family(family, screens);
        self
    }

    /// Append a group; a title registered twice extends its group.
    pub fn add_group<I, S>(&mut self, title: impl Into<String>, screens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<ScreenState>,
    {
        let title = title.into();
        let screens: Vec<ScreenState> = screens.into_iter().map(Into::into).collect();
        match self.groups.iter_mut().find(|g| g.title == title) {
            Some(group) => {
                for screen in screens {
                    if !group.screens.contains(&screen) {
                        group.screens.push(screen);
                    }
                }
            }
            None => self.groups.push(TitleGroup { title, screens }),
        }
    }

    pub fn set_family<I, S>(&mut self, family: FamilyHint, screens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<ScreenState>,
    {
        let screens = screens.into_iter().map(Into::into).collect();
        match family {
            FamilyHint::CityFamily => self.city = screens,
            FamilyHint::WorldFamily => self.world = screens,
            FamilyHint::Unknown => {}
        }
    }

    pub fn clear_groups(&mut self) {
        self.groups.clear();
    }

    pub fn groups(&self) -> &[TitleGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Screens of a family, first element being its representative.
    pub fn family_group(&self, family: FamilyHint) -> &[ScreenState] {
        match family {
            FamilyHint::CityFamily => &self.city,
            FamilyHint::WorldFamily => &self.world,
            FamilyHint::Unknown => &[],
        }
    }

    /// First group whose title fuzzily occurs in `ocr_title`.
    pub fn match_title(&self, ocr_title: &str, max_distance: usize) -> Option<&TitleGroup> {
        if ocr_title.trim().is_empty() {
            return None;
        }
        self.groups
            .iter()
            .find(|group| fuzzy_substring_match(ocr_title, &group.title, max_distance))
    }

    /// Header text a screen renders, if any.
    pub fn title_of(&self, screen: &ScreenState) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.contains(screen))
            .map(|g| g.title.as_str())
    }

    /// Family a screen belongs to.
    pub fn family_of(&self, screen: &ScreenState) -> FamilyHint {
        if self.city.contains(screen) {
            FamilyHint::CityFamily
        } else if self.world.contains(screen) {
            FamilyHint::WorldFamily
        } else {
            FamilyHint::Unknown
        }
    }

    /// Whether two screens render the same header.
    pub fn same_group(&self, a: &ScreenState, b: &ScreenState) -> bool {
        self.groups.iter().any(|g| g.contains(a) && g.contains(b))
    }

    /// The compiled-in title vocabulary.
    pub fn default_catalog() -> Self {
        TitleRegistry::new()
            .with_group("Chief Profile", [CHIEF_PROFILE])
            .with_group("Settings", [CHIEF_PROFILE_SETTING])
            .with_group("Account", [CHIEF_PROFILE_ACCOUNT])
            .with_group("Tech", [ALLIANCE_TECH])
            .with_group(
                "Chests",
                [ALLIANCE_CHESTS, ALLIANCE_CHEST_GIFT, ALLIANCE_CHEST_LOOT],
            )
            .with_group("War", [ALLIANCE_WAR, ALLIANCE_WAR_AUTO_JOIN])
            .with_group("Alliance", [ALLIANCE_MANAGE])
            .with_group("Exploration", [EXPLORATION])
            .with_group(
                "Mail",
                [MAIL, MAIL_WARS, MAIL_ALLIANCE, MAIL_SYSTEM, MAIL_REPORTS, MAIL_STARRED],
            )
            .with_group(
                "Backpack",
                [
                    BACKPACK,
                    "backpack_resources",
                    "backpack_speedups",
                    "backpack_bonus",
                    "backpack_gear",
                    "backpack_other",
                ],
            )
            .with_group(
                "Chat",
                [CHAT, "chat_alliance", "chat_world", "chat_personal"],
            )
            .with_group("Heroes", [HEROES])
            .with_group("Events", [EVENTS])
            .with_group("Deals", [DEALS])
            .with_group("VIP", [VIP])
            .with_family(FamilyHint::CityFamily, [MAIN_CITY])
            .with_family(FamilyHint::WorldFamily, [WORLD])
    }
}
