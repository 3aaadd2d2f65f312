#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use users::contract::model::{NewUser, User, UserPatch};
use users::domain::repo::UsersRepository;
use users::domain::service::Service;

pub const TS: &str = "2024-01-01 00:00:00.000Z";

pub fn sample_user(id: &str, email: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        email_visibility: false,
        verified: false,
        name: name.to_string(),
        avatar: String::new(),
        created: TS.to_string(),
        updated: TS.to_string(),
    }
}

/// Vec-backed repository. Mirrors the storage rules the service relies on:
/// unique emails, generated ids, update/delete report matched rows.
#[derive(Default)]
pub struct MockUsersRepository {
    users: Mutex<Vec<User>>,
    next_id: AtomicU64,
    fail_with: Option<String>,
    update_calls: AtomicU64,
    vanishing_inserts: bool,
}

impl MockUsersRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Self::default()
        }
    }

    /// Every call fails with `message`, as a broken engine would.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Inserts report success but the row is gone before it can be read back,
    /// as when a concurrent delete lands between the insert and the fetch.
    pub fn vanishing_inserts() -> Self {
        Self {
            vanishing_inserts: true,
            ..Self::default()
        }
    }

    pub fn update_calls(&self) -> u64 {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if let Some(msg) = &self.fail_with {
            bail!("{msg}");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UsersRepository for MockUsersRepository {
    async fn list(&self) -> Result<Vec<User>> {
        self.check()?;
        Ok(self.snapshot())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.check()?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert(&self, new_user: &NewUser) -> Result<()> {
        self.check()?;
        if self.vanishing_inserts {
            return Ok(());
        }
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            bail!("UNIQUE constraint failed: users.email");
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut user = sample_user(&format!("r{n:014x}"), &new_user.email, &new_user.name);
        user.email_visibility = new_user.email_visibility;
        users.push(user);
        Ok(())
    }

    async fn update(&self, id: &str, patch: &UserPatch) -> Result<u64> {
        self.check()?;
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(0);
        };
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }
        if let Some(vis) = patch.email_visibility {
            user.email_visibility = vis;
        }
        if let Some(name) = &patch.name {
            user.name = name.clone();
        }
        Ok(1)
    }

    async fn delete(&self, id: &str) -> Result<u64> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok((before - users.len()) as u64)
    }
}

pub fn service_over(repo: Arc<MockUsersRepository>) -> Service {
    Service::new(repo)
}

/// Send one request through `app` and decode the JSON envelope.
pub async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    call_raw(app, method, uri, body.map(|v| v.to_string())).await
}

pub async fn call_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(raw) => {
            builder = builder.header("content-type", "application/json");
            Body::from(raw)
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
