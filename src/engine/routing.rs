use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::models::route::{Direction, RouteRecord};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RouteAssignment {
    pub route_id: u32,
    pub direction: Direction,
    pub hops: usize,
}

#[derive(Debug, Clone)]
pub struct RouteDirectory {
    routes: Vec<RouteRecord>,
}

impl RouteDirectory {
    #[cfg(test)]
    pub(crate) fn unchecked(routes: Vec<RouteRecord>) -> Self {
        Self { routes }
    }

    pub fn new(mut routes: Vec<RouteRecord>) -> Result<Self, AppError> {
        routes.sort_by_key(|route| route.route_id);

        let mut seen_ids = HashSet::new();
        for route in &routes {
            if !seen_ids.insert(route.route_id) {
                return Err(AppError::RoutingConfiguration(format!(
                    "duplicate route_id {}",
                    route.route_id
                )));
            }

            if route.sequence_order.len() < 2 {
                return Err(AppError::RoutingConfiguration(format!(
                    "route {} needs at least two counties",
                    route.route_id
                )));
            }

            let mut counties = HashSet::new();
            for county in &route.sequence_order {
                if county.trim().is_empty() || !counties.insert(county.to_ascii_lowercase()) {
                    return Err(AppError::RoutingConfiguration(format!(
                        "route {} has an empty or repeated county {county:?}",
                        route.route_id
                    )));
                }
            }
        }

        let directory = Self { routes };
        for route in &directory.routes {
            if directory.companion(route.route_id).is_none() {
                return Err(AppError::RoutingConfiguration(format!(
                    "route {} has no companion route in the {} direction",
                    route.route_id,
                    route.direction.flipped().as_str()
                )));
            }
        }

        Ok(directory)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AppError::RoutingConfiguration(format!("failed to read {}: {err}", path.display()))
        })?;
        let routes: Vec<RouteRecord> = serde_json::from_str(&raw).map_err(|err| {
            AppError::RoutingConfiguration(format!("failed to parse {}: {err}", path.display()))
        })?;

        let directory = Self::new(routes)?;
        info!(path = %path.display(), routes = directory.len(), "route directory loaded");
        Ok(directory)
    }

    pub fn builtin() -> Self {
        let pairs: [(&str, &[&str]); 3] = [
            (
                "Coast - Lake",
                &["Mombasa", "Voi", "Makueni", "Machakos", "Nairobi", "Nakuru", "Kisumu"],
            ),
            ("Central", &["Nairobi", "Kiambu", "Murang'a", "Nyeri", "Meru"]),
            ("Eastern", &["Nairobi", "Machakos", "Kitui"]),
        ];

        let mut routes = Vec::with_capacity(pairs.len() * 2);
        for (index, (name, counties)) in pairs.iter().enumerate() {
            let sequence_order: Vec<String> = counties.iter().map(|c| c.to_string()).collect();
            let forward_id = (index as u32) * 2 + 1;
            routes.push(RouteRecord {
                route_id: forward_id,
                route_name: name.to_string(),
                direction: Direction::Forward,
                sequence_order: sequence_order.clone(),
            });
            routes.push(RouteRecord {
                route_id: forward_id + 1,
                route_name: name.to_string(),
                direction: Direction::Reverse,
                sequence_order,
            });
        }

        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn all(&self) -> &[RouteRecord] {
        &self.routes
    }

    pub fn get(&self, route_id: u32) -> Option<&RouteRecord> {
        self.routes.iter().find(|route| route.route_id == route_id)
    }

    pub fn companion(&self, route_id: u32) -> Option<&RouteRecord> {
        let route = self.get(route_id)?;
        self.routes.iter().find(|candidate| {
            candidate.direction == route.direction.flipped()
                && candidate.sequence_order == route.sequence_order
        })
    }

    /// Picks the route an order between two counties travels on.
    ///
    /// Direction follows the counties' positions in the canonical sequence.
    /// When several routes of that direction contain both counties the one
    /// with the fewest hops wins, then the lowest `route_id`.
    pub fn assign(&self, sender_county: &str, receiver_county: &str) -> Result<RouteAssignment, AppError> {
        let sender_county = sender_county.trim();
        let receiver_county = receiver_county.trim();

        if sender_county.is_empty() {
            return Err(AppError::validation("sender.county", "county is required"));
        }
        if receiver_county.is_empty() {
            return Err(AppError::validation("receiver.county", "county is required"));
        }
        if sender_county.eq_ignore_ascii_case(receiver_county) {
            return Err(AppError::validation(
                "receiver.county",
                "receiver county must differ from sender county",
            ));
        }

        let mut connected = false;
        let best = self
            .routes
            .iter()
            .filter_map(|route| {
                let sender_index = route.position(sender_county)?;
                let receiver_index = route.position(receiver_county)?;
                connected = true;

                let direction = if sender_index < receiver_index {
                    Direction::Forward
                } else {
                    Direction::Reverse
                };

                (route.direction == direction).then(|| RouteAssignment {
                    route_id: route.route_id,
                    direction,
                    hops: sender_index.abs_diff(receiver_index),
                })
            })
            .min_by_key(|assignment| (assignment.hops, assignment.route_id));

        match best {
            Some(assignment) => Ok(assignment),
            None if connected => Err(AppError::RoutingConfiguration(format!(
                "routes connect {sender_county} and {receiver_county} but none runs in the needed direction"
            ))),
            None => Err(AppError::RoutingConfiguration(format!(
                "no route connects {sender_county} and {receiver_county}"
            ))),
        }
    }
}
