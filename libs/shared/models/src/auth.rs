use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Dentist,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Dentist => write!(f, "dentist"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "dentist" => Ok(Role::Dentist),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::Forbidden(format!("Unsupported role: {}", other))),
        }
    }
}

/// An authenticated caller whose role has already been resolved.
///
/// Built once at the request boundary; domain services take `&Actor` and
/// never look at raw role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "id", rename_all = "snake_case")]
pub enum Actor {
    Patient(Uuid),
    Dentist(Uuid),
    Admin(Uuid),
}

impl Actor {
    pub fn from_user(user: &User) -> Result<Self, AppError> {
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Auth(format!("Invalid user id: {}", user.id)))?;

        let role = user
            .role
            .as_deref()
            .ok_or_else(|| AppError::Forbidden("User has no role assigned".to_string()))?
            .parse::<Role>()?;

        Ok(match role {
            Role::Patient => Actor::Patient(id),
            Role::Dentist => Actor::Dentist(id),
            Role::Admin => Actor::Admin(id),
        })
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin(_))
    }

    pub fn is_patient(&self, patient_id: Uuid) -> bool {
        matches!(self, Actor::Patient(id) if *id == patient_id)
    }

    pub fn is_dentist(&self, dentist_id: Uuid) -> bool {
        matches!(self, Actor::Dentist(id) if *id == dentist_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Option<&str>) -> User {
        User {
            id: id.to_string(),
            email: None,
            role: role.map(str::to_string),
            metadata: None,
            created_at: None,
        }
    }

    #[test]
    fn actor_is_resolved_from_role_claim() {
        let id = Uuid::new_v4();
        let actor = Actor::from_user(&user(&id.to_string(), Some("Dentist"))).unwrap();
        assert_eq!(actor, Actor::Dentist(id));
        assert!(actor.is_dentist(id));
        assert!(!actor.is_patient(id));
    }

    #[test]
    fn unknown_role_is_forbidden() {
        let id = Uuid::new_v4().to_string();
        let err = Actor::from_user(&user(&id, Some("receptionist"))).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = Actor::from_user(&user(&id, None)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let err = Actor::from_user(&user("not-a-uuid", Some("patient"))).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }
}
