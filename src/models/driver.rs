use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::actor::UserId;
use crate::models::route::Direction;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverRouteState {
    pub driver_id: UserId,
    pub route_id: u32,
    pub current_direction: Direction,
    pub position: usize,
    pub last_checkin_county: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    pub driver_id: UserId,
    pub county: String,
    pub checked_in_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteView {
    pub driver_id: UserId,
    pub route_id: u32,
    pub direction: Direction,
    pub waypoints: Vec<String>,
    pub current_location: String,
    pub destination: String,
    pub last_checkin_county: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInOutcome {
    pub county: String,
    pub reversed: bool,
    pub route: RouteView,
}
