//! Compiled-in navigation catalog.
//!
//! Hand-authored click orders for the screens the bot visits most. Each tap
//! step settles for 300ms before jitter is added.

use std::time::Duration;

use super::{ScreenGraph, ScreenGraphBuilder, TransitionStep};
use crate::errors::GraphError;
use crate::screen::known::*;

const SETTLE: Duration = Duration::from_millis(300);

fn tap(region: &str) -> Vec<TransitionStep> {
    vec![TransitionStep::tap(region).with_wait(SETTLE)]
}

fn guarded_tap(region: &str, guard: &str) -> Vec<TransitionStep> {
    vec![
        TransitionStep::tap(region)
            .with_wait(SETTLE)
            .with_guard(guard),
    ]
}

/// Builder pre-loaded with the whole catalog, for callers that extend it.
pub fn builder() -> ScreenGraphBuilder {
    let builder = ScreenGraphBuilder::new()
        .screen(WORLD)
        .edges_from(
            MAIN_CITY,
            [
                (EXPLORATION, tap("to_exploration")),
                (ALLIANCE_MANAGE, tap("to_alliance_manage")),
                (CHIEF_PROFILE, tap("to_chief_profile")),
                (MAIL, tap("to_mail")),
            ],
        )
        .edges_from(
            CHIEF_PROFILE,
            [
                (CHIEF_PROFILE_SETTING, tap("to_chief_profile_setting")),
                (MAIN_CITY, tap("from_chief_profile_back")),
            ],
        )
        .edges_from(
            CHIEF_PROFILE_SETTING,
            [
                (CHIEF_PROFILE_ACCOUNT, tap("to_chief_profile_account")),
                (CHIEF_CHARACTERS, tap("to_chief_characters")),
            ],
        )
        .edge(CHIEF_PROFILE_ACCOUNT, CHANGE_ACCOUNT, tap("to_change_account"))
        .edge(CHANGE_ACCOUNT, CHANGE_GOOGLE, tap("to_google_account"))
        .edge(CHANGE_GOOGLE, CHANGE_GOOGLE_CONFIRM, tap("to_google_continue"))
        .edges_from(
            ALLIANCE_MANAGE,
            [
                (ALLIANCE_TECH, tap("to_alliance_tech")),
                (MAIN_CITY, tap("from_alliance_back")),
            ],
        )
        .edges_from(
            EXPLORATION,
            [
                (EXPLORATION_BATTLE, tap("to_exploration_battle")),
                (MAIN_CITY, tap("from_exploration_back")),
            ],
        )
        .edges_from(
            MAIL,
            [
                (MAIL_WARS, tap("to_mail_wars")),
                (MAIL_ALLIANCE, tap("to_mail_alliance")),
                (MAIL_SYSTEM, tap("to_mail_system")),
                (MAIL_REPORTS, tap("to_mail_reports")),
                (MAIL_STARRED, tap("to_mail_starred")),
                (MAIN_CITY, tap("from_mail_back")),
            ],
        );

    tundra_adventure(main_menu(builder))
}

fn main_menu(builder: ScreenGraphBuilder) -> ScreenGraphBuilder {
    builder.edges_from(
        MAIN_MENU_CITY,
        [
            (MAIN_CITY, tap("from_main_menu_city_to_main_city")),
            (MAIN_MENU_WILDERNESS, tap("to_main_menu_wilderness")),
            ("main_menu_building_1", tap("to_main_menu_building_1")),
            ("main_menu_building_2", tap("to_main_menu_building_2")),
            (
                INFANTRY_CITY_VIEW,
                guarded_tap("to_main_menu_infantry", "troops.infantry.state.isAvailable"),
            ),
            (
                LANCER_CITY_VIEW,
                guarded_tap("to_main_menu_lancer", "troops.lancer.state.isAvailable"),
            ),
            (
                MARKSMAN_CITY_VIEW,
                guarded_tap("to_main_menu_marksman", "troops.marksman.state.isAvailable"),
            ),
            (MAIN_MENU_TECH_RESEARCH, tap("to_main_menu_tech_research")),
            (VIP, tap("to_vip")),
            (EXPLORATION, tap("to_exploration")),
            (ALLIANCE_MANAGE, tap("to_alliance_manage")),
        ],
    )
}

fn tundra_adventure(builder: ScreenGraphBuilder) -> ScreenGraphBuilder {
    let back = || tap("to_tundra_adventure_back");

    builder
        .edges_from(
            TUNDRA_ADVENTURE,
            [
                (TUNDRA_ADVENTURE_MAIN, tap("to_tundra_adventure_main")),
                (TUNDRA_ADVENTURE_DRILL, tap("to_tundra_adventure_drill")),
                (TUNDRA_ADVENTURE_ODESSEY, tap("to_tundra_adventure_odessey")),
                (TUNDRA_ADVENTURE_CARAVAN, tap("to_tundra_adventure_caravan")),
                (MAIN_CITY, back()),
            ],
        )
        .edges_from(
            TUNDRA_ADVENTURE_MAIN,
            [
                (TUNDRA_ADVENTURE_DRILL, tap("to_tundra_adventure_drill")),
                (TUNDRA_ADVENTURE_ODESSEY, tap("to_tundra_adventure_odessey")),
                (TUNDRA_ADVENTURE_CARAVAN, tap("to_tundra_adventure_caravan")),
                (MAIN_CITY, back()),
            ],
        )
        .edges_from(
            TUNDRA_ADVENTURE_DRILL,
            [
                (TUNDRA_ADVENTURER_DRILL, tap("to_tundra_adventurer_drill")),
                (
                    TUNDRA_ADVENTURER_DAILY_MISSIONS,
                    tap("to_tundra_adventurer_daily_missions"),
                ),
                (TUNDRA_ADVENTURE_MAIN, back()),
            ],
        )
        .edges_from(
            TUNDRA_ADVENTURER_DRILL,
            [
                (MAIN_CITY, back()),
                (
                    TUNDRA_ADVENTURER_DAILY_MISSIONS,
                    tap("to_tundra_adventurer_daily_missions"),
                ),
                (TUNDRA_ADVENTURE_ODESSEY, tap("to_tundra_adventure_odessey")),
                (TUNDRA_ADVENTURE_CARAVAN, tap("to_tundra_adventure_caravan")),
            ],
        )
        .edges_from(
            TUNDRA_ADVENTURER_DAILY_MISSIONS,
            [
                (MAIN_CITY, back()),
                (TUNDRA_ADVENTURER_DRILL, tap("to_tundra_adventurer_drill")),
                (TUNDRA_ADVENTURE_ODESSEY, tap("to_tundra_adventure_odessey")),
                (TUNDRA_ADVENTURE_CARAVAN, tap("to_tundra_adventure_caravan")),
            ],
        )
        .edges_from(
            TUNDRA_ADVENTURE_ODESSEY,
            [
                (TUNDRA_ADVENTURE_MAIN, back()),
                (TUNDRA_ADVENTURE_DRILL, tap("to_tundra_adventure_drill")),
                (TUNDRA_ADVENTURE_CARAVAN, tap("to_tundra_adventure_caravan")),
            ],
        )
        .edges_from(
            TUNDRA_ADVENTURE_CARAVAN,
            [
                (TUNDRA_ADVENTURE_MAIN, back()),
                (TUNDRA_ADVENTURE_DRILL, tap("to_tundra_adventure_drill")),
                (TUNDRA_ADVENTURE_ODESSEY, tap("to_tundra_adventure_odessey")),
            ],
        )
}

/// The compiled-in screen graph.
pub fn default_graph() -> Result<ScreenGraph, GraphError> {
    builder().build()
}
