use serde::{Deserialize, Serialize};

use crate::models::route::Direction;

pub type UserId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Cashier,
    CountyDriver,
    TransitDriver,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Customer => "customer",
            ActorRole::Cashier => "cashier",
            ActorRole::CountyDriver => "county_driver",
            ActorRole::TransitDriver => "transit_driver",
        }
    }

    pub fn resolve(role: &str, driver_type: Option<&str>) -> Result<Self, String> {
        let normalized = role.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "customer" => Ok(ActorRole::Customer),
            "cashier" | "order_manager" | "office_manager" | "manager" => Ok(ActorRole::Cashier),
            "county_driver" => Ok(ActorRole::CountyDriver),
            "transit_driver" => Ok(ActorRole::TransitDriver),
            "driver" => match driver_type.map(|t| t.trim().to_ascii_lowercase()) {
                Some(t) if t == "county" => Ok(ActorRole::CountyDriver),
                Some(t) if t == "transit" => Ok(ActorRole::TransitDriver),
                _ => Err("driver role requires a driver type of county or transit".to_string()),
            },
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: ActorRole,
    pub county: Option<String>,
    pub route_id: Option<u32>,
    pub current_direction: Option<Direction>,
    pub email: Option<String>,
}
