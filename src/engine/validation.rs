use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::order::{Parcel, Party};

#[derive(Debug, Clone, Deserialize)]
pub struct ParcelInput {
    pub content: String,
    pub weight: Decimal,
    pub pieces: u32,
    #[serde(default)]
    pub cost: Option<Decimal>,
}

pub fn validate_party(prefix: &str, party: &Party, require_address_details: bool) -> Result<(), AppError> {
    let field = |name: &str| format!("{prefix}.{name}");

    if party.name.trim().chars().count() < 2 {
        return Err(AppError::validation(
            field("name"),
            "name should be at least two characters long",
        ));
    }

    let email = party.email.trim();
    if email.is_empty() {
        return Err(AppError::validation(field("email"), "email is required"));
    }
    if !is_plausible_email(email) {
        return Err(AppError::validation(field("email"), "invalid email address"));
    }

    let phone = party.phone.trim();
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(
            field("phone"),
            "phone number must be exactly 10 digits",
        ));
    }

    if party.county.trim().is_empty() {
        return Err(AppError::validation(field("county"), "county is required"));
    }
    if party.building.trim().is_empty() {
        return Err(AppError::validation(field("building"), "building name is required"));
    }

    if require_address_details {
        if is_blank(&party.street) {
            return Err(AppError::validation(field("street"), "street name is required"));
        }
        if is_blank(&party.landmark) {
            return Err(AppError::validation(field("landmark"), "nearest landmark is required"));
        }
    }

    Ok(())
}

pub fn validate_parcels(parcels: &[ParcelInput]) -> Result<(), AppError> {
    if parcels.is_empty() {
        return Err(AppError::validation("parcels", "at least one parcel is required"));
    }

    for (index, parcel) in parcels.iter().enumerate() {
        if parcel.content.trim().is_empty() {
            return Err(AppError::validation(
                format!("parcels[{index}].content"),
                "content description is required",
            ));
        }
        if parcel.weight <= Decimal::ZERO {
            return Err(AppError::validation(
                format!("parcels[{index}].weight"),
                "weight must be > 0",
            ));
        }
        if parcel.pieces == 0 {
            return Err(AppError::validation(
                format!("parcels[{index}].pieces"),
                "piece count must be > 0",
            ));
        }
    }

    Ok(())
}

pub fn positive_cost(field: String, cost: Option<Decimal>) -> Result<Decimal, AppError> {
    match cost {
        Some(cost) if cost > Decimal::ZERO => Ok(cost),
        Some(_) => Err(AppError::validation(field, "cost must be > 0")),
        None => Err(AppError::validation(field, "cost is required")),
    }
}

pub fn into_parcels(inputs: Vec<ParcelInput>, keep_costs: bool) -> Vec<Parcel> {
    inputs
        .into_iter()
        .map(|input| Parcel {
            content: input.content.trim().to_string(),
            weight: input.weight,
            pieces: input.pieces,
            cost: if keep_costs { input.cost } else { None },
        })
        .collect()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let Some(tld) = labels.last() else {
        return false;
    };

    labels.len() >= 2
        && labels.iter().all(|label| !label.is_empty())
        && (2..=6).contains(&tld.len())
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}
