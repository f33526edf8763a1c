use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::AppError;
use crate::models::actor::{Actor, ActorRole};
use crate::models::route::Direction;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";
pub const DRIVER_TYPE_HEADER: &str = "x-driver-type";
pub const COUNTY_HEADER: &str = "x-county";
pub const ROUTE_HEADER: &str = "x-route-id";
pub const DIRECTION_HEADER: &str = "x-direction";
pub const EMAIL_HEADER: &str = "x-user-email";

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)
    }
}

pub struct OptionalActor(pub Option<Actor>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let anonymous = !parts.headers.contains_key(USER_ID_HEADER)
            && !parts.headers.contains_key(ROLE_HEADER);
        if anonymous {
            return Ok(Self(None));
        }
        actor_from_headers(&parts.headers).map(|actor| Self(Some(actor)))
    }
}

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let user_id = header(headers, USER_ID_HEADER)?
        .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?
        .parse::<u64>()
        .map_err(|_| AppError::Unauthorized(format!("invalid {USER_ID_HEADER} header")))?;

    let role = header(headers, ROLE_HEADER)?
        .ok_or_else(|| AppError::Unauthorized(format!("missing {ROLE_HEADER} header")))?;
    let role = ActorRole::resolve(role, header(headers, DRIVER_TYPE_HEADER)?)
        .map_err(AppError::Unauthorized)?;

    let route_id = header(headers, ROUTE_HEADER)?
        .map(|raw| raw.parse::<u32>())
        .transpose()
        .map_err(|_| AppError::Unauthorized(format!("invalid {ROUTE_HEADER} header")))?;

    let current_direction = header(headers, DIRECTION_HEADER)?
        .map(|raw| raw.parse::<Direction>())
        .transpose()
        .map_err(AppError::Unauthorized)?;

    Ok(Actor {
        user_id,
        role,
        county: header(headers, COUNTY_HEADER)?.map(str::to_string),
        route_id,
        current_direction,
        email: header(headers, EMAIL_HEADER)?.map(str::to_string),
    })
}

pub fn require_role(actor: &Actor, role: ActorRole) -> Result<(), AppError> {
    if actor.role == role {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} cannot act as {}",
            actor.role.as_str(),
            role.as_str()
        )))
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|raw| Some(raw.trim()).filter(|raw| !raw.is_empty()))
            .map_err(|_| AppError::Unauthorized(format!("invalid {name} header"))),
    }
}
