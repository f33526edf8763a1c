use chrono::Utc;
use tracing::info;

use crate::error::AppError;
use crate::models::actor::{Actor, UserId};
use crate::models::driver::{CheckIn, CheckInOutcome, DriverRouteState, RouteView};
use crate::state::AppState;

pub fn route_state(state: &AppState, actor: &Actor) -> Result<DriverRouteState, AppError> {
    if let Some(existing) = state.drivers.get(&actor.user_id) {
        return Ok(existing.value().clone());
    }

    let seeded = seed(state, actor)?;
    let stored = state
        .drivers
        .entry(actor.user_id)
        .or_insert(seeded)
        .value()
        .clone();
    Ok(stored)
}

fn seed(state: &AppState, actor: &Actor) -> Result<DriverRouteState, AppError> {
    let route_id = actor
        .route_id
        .ok_or_else(|| AppError::Forbidden("transit driver has no route assigned".to_string()))?;
    let route = state.routes.get(route_id).ok_or_else(|| {
        AppError::RoutingConfiguration(format!("driver route {route_id} is not configured"))
    })?;

    let route = match actor.current_direction {
        Some(direction) if direction != route.direction => {
            state.routes.companion(route_id).ok_or_else(|| {
                AppError::RoutingConfiguration(format!("route {route_id} has no companion"))
            })?
        }
        _ => route,
    };

    Ok(DriverRouteState {
        driver_id: actor.user_id,
        route_id: route.route_id,
        current_direction: route.direction,
        position: 0,
        last_checkin_county: None,
        updated_at: Utc::now(),
    })
}

pub fn check_in(state: &AppState, actor: &Actor, location: &str) -> Result<CheckInOutcome, AppError> {
    let location = location.trim();
    if location.is_empty() {
        return Err(AppError::validation("county", "check-in county is required"));
    }

    route_state(state, actor)?;

    let mut entry = state
        .drivers
        .get_mut(&actor.user_id)
        .ok_or_else(|| AppError::Internal("driver route state vanished".to_string()))?;

    let route = state.routes.get(entry.route_id).ok_or_else(|| {
        AppError::RoutingConfiguration(format!("driver route {} is not configured", entry.route_id))
    })?;
    let waypoints = route.waypoints();
    let index = waypoints
        .iter()
        .position(|county| county.eq_ignore_ascii_case(location))
        .ok_or_else(|| {
            AppError::validation(
                "county",
                format!("{location} is not on route {}", route.route_id),
            )
        })?;
    let county = waypoints[index].clone();
    let reversed = index + 1 == waypoints.len();
    let companion = if reversed {
        let companion = state.routes.companion(entry.route_id).ok_or_else(|| {
            AppError::RoutingConfiguration(format!("route {} has no companion", entry.route_id))
        })?;
        Some((companion.route_id, companion.direction))
    } else {
        None
    };
    let now = Utc::now();

    state
        .checkins
        .entry(actor.user_id)
        .or_default()
        .push(CheckIn {
            driver_id: actor.user_id,
            county: county.clone(),
            checked_in_at: now,
        });

    entry.position = index;
    entry.last_checkin_county = Some(county.clone());
    entry.updated_at = now;

    if let Some((route_id, direction)) = companion {
        entry.route_id = route_id;
        entry.current_direction = direction;
        entry.position = 0;
    }

    info!(
        driver_id = actor.user_id,
        county = %county,
        route_id = entry.route_id,
        direction = entry.current_direction.as_str(),
        reversed,
        "transit driver checked in"
    );

    let route = view(state, &entry)?;
    Ok(CheckInOutcome {
        county,
        reversed,
        route,
    })
}

pub fn check_out(state: &AppState, actor: &Actor) -> Result<RouteView, AppError> {
    route_state(state, actor)?;

    let mut entry = state
        .drivers
        .get_mut(&actor.user_id)
        .ok_or_else(|| AppError::Internal("driver route state vanished".to_string()))?;

    let last = state
        .routes
        .get(entry.route_id)
        .map(|route| route.sequence_order.len().saturating_sub(1))
        .unwrap_or_default();
    entry.position = (entry.position + 1).min(last);
    entry.updated_at = Utc::now();

    info!(
        driver_id = actor.user_id,
        route_id = entry.route_id,
        position = entry.position,
        "transit driver checked out"
    );

    view(state, &entry)
}

pub fn route_view(state: &AppState, actor: &Actor) -> Result<RouteView, AppError> {
    let current = route_state(state, actor)?;
    view(state, &current)
}

/// County of the driver's latest check-in, if any.
pub fn current_county(state: &AppState, driver_id: UserId) -> Option<String> {
    state.checkins.get(&driver_id).and_then(|history| {
        history
            .iter()
            .max_by_key(|checkin| checkin.checked_in_at)
            .map(|checkin| checkin.county.clone())
    })
}

pub fn checkin_history(state: &AppState, driver_id: UserId) -> Vec<CheckIn> {
    let mut history = state
        .checkins
        .get(&driver_id)
        .map(|entry| entry.value().clone())
        .unwrap_or_default();
    history.reverse();
    history.sort_by(|a, b| b.checked_in_at.cmp(&a.checked_in_at));
    history
}

fn view(state: &AppState, driver: &DriverRouteState) -> Result<RouteView, AppError> {
    let route = state.routes.get(driver.route_id).ok_or_else(|| {
        AppError::RoutingConfiguration(format!("driver route {} is not configured", driver.route_id))
    })?;
    let waypoints = route.waypoints();
    let current_location = waypoints
        .get(driver.position)
        .or_else(|| waypoints.last())
        .cloned()
        .unwrap_or_default();
    let destination = waypoints.last().cloned().unwrap_or_default();

    Ok(RouteView {
        driver_id: driver.driver_id,
        route_id: driver.route_id,
        direction: driver.current_direction,
        waypoints,
        current_location,
        destination,
        last_checkin_county: driver.last_checkin_county.clone(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{check_in, check_out, checkin_history, current_county, route_view};
    use crate::config::Config;
    use crate::engine::lifecycle::tests::test_state;
    use crate::engine::routing::RouteDirectory;
    use crate::error::AppError;
    use crate::models::actor::{Actor, ActorRole};
    use crate::models::route::{Direction, RouteRecord};
    use crate::state::AppState;

    pub(crate) fn transit_driver(user_id: u64, route_id: u32) -> Actor {
        Actor {
            user_id,
            role: ActorRole::TransitDriver,
            county: None,
            route_id: Some(route_id),
            current_direction: None,
            email: None,
        }
    }

    #[test]
    fn fresh_driver_starts_at_the_head_of_their_route() {
        let state = test_state();
        let view = route_view(&state, &transit_driver(40, 1)).unwrap();

        assert_eq!(view.current_location, "Mombasa");
        assert_eq!(view.destination, "Kisumu");
        assert_eq!(view.direction, Direction::Forward);
    }

    #[test]
    fn identity_direction_selects_the_companion_route() {
        let state = test_state();
        let mut driver = transit_driver(41, 1);
        driver.current_direction = Some(Direction::Reverse);

        let view = route_view(&state, &driver).unwrap();
        assert_eq!(view.route_id, 2);
        assert_eq!(view.current_location, "Kisumu");
    }

    #[test]
    fn check_out_walks_forward_and_stops_at_the_terminus() {
        let state = test_state();
        let driver = transit_driver(42, 5);

        assert_eq!(check_out(&state, &driver).unwrap().current_location, "Machakos");
        assert_eq!(check_out(&state, &driver).unwrap().current_location, "Kitui");
        let view = check_out(&state, &driver).unwrap();
        assert_eq!(view.current_location, "Kitui");
        assert_eq!(view.direction, Direction::Forward);
    }

    #[test]
    fn checking_in_at_the_terminus_reverses_onto_the_companion() {
        let state = test_state();
        let driver = transit_driver(43, 5);

        let outcome = check_in(&state, &driver, "Machakos").unwrap();
        assert!(!outcome.reversed);

        let outcome = check_in(&state, &driver, "kitui").unwrap();
        assert!(outcome.reversed);
        assert_eq!(outcome.county, "Kitui");
        assert_eq!(outcome.route.route_id, 6);
        assert_eq!(outcome.route.direction, Direction::Reverse);
        assert_eq!(outcome.route.current_location, "Kitui");
        assert_eq!(outcome.route.destination, "Nairobi");

        let view = route_view(&state, &driver).unwrap();
        assert_eq!(view.route_id, 6);
    }

    #[test]
    fn current_county_is_the_latest_check_in() {
        let state = test_state();
        let driver = transit_driver(44, 1);
        assert_eq!(current_county(&state, 44), None);

        check_in(&state, &driver, "Mombasa").unwrap();
        check_in(&state, &driver, "Voi").unwrap();

        assert_eq!(current_county(&state, 44).as_deref(), Some("Voi"));
        let history = checkin_history(&state, 44);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].county, "Voi");
    }

    #[test]
    fn check_in_off_route_is_rejected() {
        let state = test_state();
        let err = check_in(&state, &transit_driver(45, 1), "Meru").unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(current_county(&state, 45), None);
    }

    #[test]
    fn terminus_without_companion_records_nothing() {
        let routes = RouteDirectory::unchecked(vec![RouteRecord {
            route_id: 5,
            route_name: "Eastern".to_string(),
            direction: Direction::Forward,
            sequence_order: vec![
                "Nairobi".to_string(),
                "Machakos".to_string(),
                "Kitui".to_string(),
            ],
        }]);
        let (state, _rx) = AppState::new(routes, &Config::default());
        let driver = transit_driver(47, 5);
        check_in(&state, &driver, "Machakos").unwrap();

        let err = check_in(&state, &driver, "Kitui").unwrap_err();

        assert!(matches!(err, AppError::RoutingConfiguration(_)));
        assert_eq!(current_county(&state, 47).as_deref(), Some("Machakos"));
        assert_eq!(checkin_history(&state, 47).len(), 1);
        let view = route_view(&state, &driver).unwrap();
        assert_eq!(view.route_id, 5);
        assert_eq!(view.current_location, "Machakos");
    }

    #[test]
    fn driver_without_route_is_forbidden() {
        let state = test_state();
        let mut driver = transit_driver(46, 1);
        driver.route_id = None;
        assert!(matches!(route_view(&state, &driver), Err(AppError::Forbidden(_))));
    }
}
