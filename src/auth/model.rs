//! Role and JWT claim shapes for the bearer-token auth surface (spec.md §6,
//! SPEC_FULL.md §4.7), grounded on the teacher's `Claims { sub, exp, iat }`
//! and generalized with the `role` binding spec.md's role-band enforcement
//! needs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The three actor roles that bind to an endpoint's role band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Shop,
    Rider,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Shop => "shop",
            Self::Rider => "rider",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "shop" => Some(Self::Shop),
            "rider" => Some(Self::Rider),
            _ => None,
        }
    }
}

/// JWT claims. `sub` is the actor's id within its own role's id space
/// (`UserId`/`ShopId`/`RiderId` — they are distinct sequences, so `role`
/// disambiguates which). `jti` is the revocation handle checked against
/// `token_blacklist` on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

/// An authenticated caller, injected into request extensions by the auth
/// middleware once claims are verified and the role band checked.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedActor {
    pub id: i64,
    pub role: Role,
}

impl From<&Claims> for AuthenticatedActor {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
        }
    }
}
