use serde::{Deserialize, Serialize};

use crate::contract::model::{NewUser, User, UserPatch};

/// REST DTO for user representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub email_visibility: bool,
    pub verified: bool,
    pub name: String,
    pub avatar: String,
    pub created: String,
    pub updated: String,
}

/// REST DTO for creating a new user. `email` is required; the rest default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserReq {
    pub email: String,
    #[serde(default)]
    pub email_visibility: bool,
    #[serde(default)]
    pub name: String,
}

/// REST DTO for a partial update. Omitted keys stay `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_visibility: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            email_visibility: user.email_visibility,
            verified: user.verified,
            name: user.name,
            avatar: user.avatar,
            created: user.created,
            updated: user.updated,
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            email: req.email,
            email_visibility: req.email_visibility,
            name: req.name,
        }
    }
}

impl From<UpdateUserReq> for UserPatch {
    fn from(req: UpdateUserReq) -> Self {
        Self {
            email: req.email,
            email_visibility: req.email_visibility,
            name: req.name,
        }
    }
}
