//! Partial-update statement builder.
//!
//! A patch is turned into an ordered list of `(column, placeholder, value)`
//! assignments, one per present field, and rendered into a single
//! `UPDATE ... SET col = :placeholder, ... WHERE id = :userId`. Values only
//! ever travel through the parameter bag.

use thiserror::Error;
use userbase_db::{NamedQuery, Params, SqlValue};

use crate::contract::model::UserPatch;
use crate::domain::error::DomainError;
use crate::infra::storage::schema::USERS_TABLE;

pub const ID_PARAM: &str = "userId";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpdateBuildError {
    #[error("empty update request")]
    EmptyUpdate,
    #[error("user id is required")]
    MissingId,
}

impl From<UpdateBuildError> for DomainError {
    fn from(e: UpdateBuildError) -> Self {
        match e {
            UpdateBuildError::EmptyUpdate => DomainError::EmptyUpdate,
            UpdateBuildError::MissingId => DomainError::MissingId,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: &'static str,
    pub placeholder: &'static str,
    pub value: SqlValue,
}

/// Present fields in declared order: email, emailVisibility, name.
pub fn assignments(patch: &UserPatch) -> Vec<Assignment> {
    let candidates = [
        ("email", patch.email.clone().map(SqlValue::from)),
        (
            "emailVisibility",
            patch.email_visibility.map(SqlValue::from),
        ),
        ("name", patch.name.clone().map(SqlValue::from)),
    ];

    candidates
        .into_iter()
        .filter_map(|(column, value)| {
            value.map(|value| Assignment {
                column,
                placeholder: column,
                value,
            })
        })
        .collect()
}

pub fn build_update(id: &str, patch: &UserPatch) -> Result<NamedQuery, UpdateBuildError> {
    if id.trim().is_empty() {
        return Err(UpdateBuildError::MissingId);
    }

    let assignments = assignments(patch);
    if assignments.is_empty() {
        return Err(UpdateBuildError::EmptyUpdate);
    }

    let set_clause = assignments
        .iter()
        .map(|a| format!("{} = :{}", a.column, a.placeholder))
        .collect::<Vec<_>>()
        .join(", ");

    let mut params = Params::new();
    for a in assignments {
        params.insert(a.placeholder, a.value);
    }
    params.insert(ID_PARAM, id);

    Ok(NamedQuery::with_params(
        format!("UPDATE {USERS_TABLE} SET {set_clause} WHERE id = :{ID_PARAM}"),
        params,
    ))
}
