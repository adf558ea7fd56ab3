//! Several actors navigating concurrently.
//!
//! Each actor owns its controller and state; they share nothing mutable
//! beyond the `Arc` registry and counters their controllers were built with.

use tokio::task::JoinSet;
use tracing::error;

use super::NavigationOutcome;
use super::controller::NavigationController;
use crate::actor::ActorState;
use crate::errors::NavError;
use crate::screen::ScreenState;

/// One actor's assignment.
pub struct FleetMember {
    pub controller: NavigationController,
    pub state: ActorState,
    pub target: ScreenState,
}

/// How one actor's navigation ended.
#[derive(Debug)]
pub struct FleetReport {
    pub nickname: String,
    pub result: Result<NavigationOutcome, NavError>,
    pub final_screen: ScreenState,
}

/// Run every member to its target and report in member order.
///
/// A panicking actor is logged and left out of the reports.
pub async fn run_fleet(members: Vec<FleetMember>) -> Vec<FleetReport> {
    let mut set = JoinSet::new();
    for (index, member) in members.into_iter().enumerate() {
        set.spawn(async move {
            let FleetMember {
                mut controller,
                mut state,
                target,
            } = member;
            let result = controller.navigate_to(&target, &mut state).await;
            (
                index,
                FleetReport {
                    nickname: state.nickname.clone(),
                    final_screen: state.current_screen().clone(),
                    result,
                },
            )
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => error!(error = %e, "Actor task failed"),
        }
    }
    reports.sort_by_key(|(index, _)| *index);
    reports.into_iter().map(|(_, report)| report).collect()
}
