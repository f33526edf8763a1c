use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(Direction::Forward),
            "reverse" => Ok(Direction::Reverse),
            other => Err(format!("unknown direction: {other}, expected forward/reverse")),
        }
    }
}

/// A stored route. `sequence_order` is always kept in canonical (forward)
/// order; a reverse route is travelled back to front.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteRecord {
    pub route_id: u32,
    pub route_name: String,
    pub direction: Direction,
    pub sequence_order: Vec<String>,
}

impl RouteRecord {
    pub fn position(&self, county: &str) -> Option<usize> {
        self.sequence_order
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(county))
    }

    pub fn contains(&self, county: &str) -> bool {
        self.position(county).is_some()
    }

    pub fn waypoints(&self) -> Vec<String> {
        match self.direction {
            Direction::Forward => self.sequence_order.clone(),
            Direction::Reverse => self.sequence_order.iter().rev().cloned().collect(),
        }
    }
}
