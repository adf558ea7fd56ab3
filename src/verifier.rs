//! Post-step state verification.
//!
//! After a tap the verifier captures the screen, asks the analyzer for a
//! title and a family hint, and works out which screen the device is
//! actually on:
//!
//! 1. A known family hint with a registered family group short-circuits:
//!    the hint comes from a small, reliably read indicator.
//! 2. Otherwise the title picks the first matching [`TitleGroup`] in
//!    registration order.
//! 3. `expected` is confirmed when it belongs to the resolved group; any
//!    other member means the device went somewhere else, and the group's
//!    first member is reported.
//! 4. Nothing resolved means the reading was inconclusive, which counts as
//!    confirmation. A false mismatch costs a whole replan.
//!
//! [`TitleGroup`]: crate::titles::TitleGroup

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::actor::ActorState;
use crate::device::{DeviceController, ScreenAnalyzer, ScreenReading};
use crate::errors::NavError;
use crate::screen::{FamilyHint, ScreenState};
use crate::titles::TitleRegistry;

/// Which part of the reading decided the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum Basis {
    Family { family: FamilyHint },
    Title { title: String },
    Inconclusive,
}

/// Result of one verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub expected: ScreenState,
    pub actual: ScreenState,
    #[serde(flatten)]
    pub basis: Basis,
    #[serde(skip)]
    pub reading: ScreenReading,
}

impl Verification {
    pub fn confirmed(&self) -> bool {
        self.expected == self.actual
    }
}

/// Resolve a reading against the title registry.
pub fn resolve(
    titles: &TitleRegistry,
    reading: &ScreenReading,
    expected: &ScreenState,
    max_distance: usize,
) -> (ScreenState, Basis) {
    let family_group = titles.family_group(reading.family);
    if let Some(first) = family_group.first() {
        let actual = if family_group.contains(expected) {
            expected.clone()
        } else {
            first.clone()
        };
        return (
            actual,
            Basis::Family {
                family: reading.family,
            },
        );
    }

    let Some(group) = titles.match_title(&reading.title, max_distance) else {
        return (expected.clone(), Basis::Inconclusive);
    };
    let basis = Basis::Title {
        title: group.title.clone(),
    };
    if group.contains(expected) {
        return (expected.clone(), basis);
    }
    match group.screens.first() {
        Some(first) => (first.clone(), basis),
        None => (expected.clone(), Basis::Inconclusive),
    }
}

/// Captures and classifies the current screen.
pub struct StateVerifier {
    device: Arc<dyn DeviceController>,
    analyzer: Arc<dyn ScreenAnalyzer>,
    titles: Arc<TitleRegistry>,
    capture_path: PathBuf,
    max_distance: usize,
}

impl StateVerifier {
    pub fn new(
        device: Arc<dyn DeviceController>,
        analyzer: Arc<dyn ScreenAnalyzer>,
        titles: Arc<TitleRegistry>,
    ) -> Self {
        Self {
            device,
            analyzer,
            titles,
            capture_path: PathBuf::from("out/check_state.png"),
            max_distance: 1,
        }
    }

    pub fn with_capture_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.capture_path = path.into();
        self
    }

    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Which screen the device is on, given it should be on `expected`.
    ///
    /// The raw reading is recorded into `state`; the resolved screen is not,
    /// that is the caller's decision.
    pub async fn verify(
        &self,
        expected: &ScreenState,
        state: &mut ActorState,
    ) -> Result<Verification, NavError> {
        let screenshot = self.device.capture(&self.capture_path).await?;
        let reading = self.analyzer.analyze(&screenshot, expected, state).await?;
        state.record_reading(&reading.title, reading.family);

        let (actual, basis) = resolve(&self.titles, &reading, expected, self.max_distance);
        debug!(
            %expected,
            %actual,
            title = %reading.title,
            family = %reading.family,
            ?basis,
            "Verified screen"
        );
        if actual != *expected {
            warn!(%expected, %actual, title = %reading.title, "Screen differs from plan");
        }

        Ok(Verification {
            expected: expected.clone(),
            actual,
            basis,
            reading,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Screenshot;
    use crate::errors::AnalysisError;
    use crate::errors::DeviceError;
    use crate::graph::Swipe;
    use crate::regions::PixelRect;
    use async_trait::async_trait;
    use std::path::Path;

    fn titles() -> TitleRegistry {
        TitleRegistry::new()
            .with_group("Mail", ["mail", "mail_wars", "mail_alliance"])
            .with_group("Alliance", ["alliance_manage"])
            .with_group("Empty", Vec::<ScreenState>::new())
            .with_family(FamilyHint::CityFamily, ["main_city"])
    }

    fn reading(title: &str, family: FamilyHint) -> ScreenReading {
        ScreenReading::new(title, family)
    }

    fn s(name: &str) -> ScreenState {
        ScreenState::from(name)
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    #[test]
    fn test_member_of_group_is_confirmed() {
        let (actual, basis) = resolve(&titles(), &reading("Mail", FamilyHint::Unknown), &s("mail_wars"), 1);
        assert_eq!(actual, "mail_wars");
        assert_eq!(basis, Basis::Title { title: "Mail".into() });
    }

    #[test]
    fn test_non_member_resolves_to_first_of_group() {
        let (actual, _) = resolve(&titles(), &reading("Mail", FamilyHint::Unknown), &s("mail_unknown"), 1);
        assert_eq!(actual, "mail");
    }

    #[test]
    fn test_unmatched_title_keeps_expected() {
        let (actual, basis) = resolve(&titles(), &reading("Leaderboard", FamilyHint::Unknown), &s("mail_wars"), 1);
        assert_eq!(actual, "mail_wars");
        assert_eq!(basis, Basis::Inconclusive);

        let (actual, _) = resolve(&titles(), &reading("", FamilyHint::Unknown), &s("exploration"), 1);
        assert_eq!(actual, "exploration");
    }

    #[test]
    fn test_fuzzy_title_reading() {
        let (actual, _) = resolve(&titles(), &reading("A1liance", FamilyHint::Unknown), &s("mail"), 1);
        assert_eq!(actual, "alliance_manage");
    }

    #[test]
    fn test_family_short_circuits_title() {
        let (actual, basis) = resolve(&titles(), &reading("Mail", FamilyHint::CityFamily), &s("mail"), 1);
        assert_eq!(actual, "main_city");
        assert_eq!(basis, Basis::Family { family: FamilyHint::CityFamily });

        let (actual, _) = resolve(&titles(), &reading("", FamilyHint::CityFamily), &s("main_city"), 1);
        assert_eq!(actual, "main_city");
    }

    #[test]
    fn test_unregistered_family_falls_back_to_title() {
        let (actual, basis) = resolve(&titles(), &reading("Mail", FamilyHint::WorldFamily), &s("alliance_manage"), 1);
        assert_eq!(actual, "mail");
        assert!(matches!(basis, Basis::Title { .. }));
    }

    #[test]
    fn test_empty_group_is_inconclusive() {
        let (actual, basis) = resolve(&titles(), &reading("Empty", FamilyHint::Unknown), &s("mail"), 1);
        assert_eq!(actual, "mail");
        assert_eq!(basis, Basis::Inconclusive);
    }

    #[test]
    fn test_verification_serializes_basis_inline() {
        let v = Verification {
            expected: s("mail"),
            actual: s("main_city"),
            basis: Basis::Family { family: FamilyHint::CityFamily },
            reading: ScreenReading::default(),
        };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["basis"], "family");
        assert_eq!(json["family"], "city_family");
        assert!(!v.confirmed());
    }

    // ========================================================================
    // Capture + analysis
    // ========================================================================

    struct FixedScreen(ScreenReading);

    #[async_trait]
    impl DeviceController for FixedScreen {
        async fn capture(&self, path: &Path) -> Result<Screenshot, DeviceError> {
            Ok(Screenshot::new(path))
        }
        async fn tap(&self, _region: &str, _rect: PixelRect) -> Result<(), DeviceError> {
            Ok(())
        }
        async fn swipe(&self, _swipe: &Swipe) -> Result<(), DeviceError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ScreenAnalyzer for FixedScreen {
        async fn analyze(
            &self,
            _screenshot: &Screenshot,
            _expected: &ScreenState,
            _state: &ActorState,
        ) -> Result<ScreenReading, AnalysisError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_verify_records_reading_but_not_screen() {
        let fixed = Arc::new(FixedScreen(reading("Alliance", FamilyHint::Unknown)));
        let verifier = StateVerifier::new(fixed.clone(), fixed, Arc::new(titles()));
        let mut state = ActorState::new("a1").at("main_city");

        let v = verifier.verify(&s("mail"), &mut state).await.unwrap();
        assert!(!v.confirmed());
        assert_eq!(v.actual, "alliance_manage");
        assert_eq!(state.screen.title_fact, "Alliance");
        assert_eq!(state.current_screen(), "main_city");
    }
}
