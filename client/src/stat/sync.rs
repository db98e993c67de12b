use anyhow::{Result, bail};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use shoe_ledger::stat::{Shoe, ShoeId, ShoePatch, ShoeStore, StoreError};
use tracing::{debug, info};
use uuid::Uuid;

/// A shoe as the server returns it; `created_at` is server-side bookkeeping.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredShoe {
    #[serde(flatten)]
    pub shoe: Shoe,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RegisterResp {
    user_id: Uuid,
}

#[derive(Deserialize)]
struct LoginResp {
    token: String,
    user_id: Uuid,
}

/// A signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub email: String,
    pub user_id: Uuid,
    pub token: String,
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

pub async fn register(base_url: &str, email: &str, password: &str, timeout: Duration) -> Result<Uuid> {
    let resp = http_client(timeout)?
        .post(endpoint(base_url, "/auth/register"))
        .json(&Credentials { email, password })
        .send()
        .await?;
    match resp.status() {
        StatusCode::CONFLICT => bail!("{email} is already registered"),
        s if !s.is_success() => bail!("registration failed: {}", resp.text().await.unwrap_or_default()),
        _ => {}
    }
    let body: RegisterResp = resp.json().await?;
    info!(user_id = %body.user_id, "registered");
    Ok(body.user_id)
}

pub async fn login(base_url: &str, email: &str, password: &str, timeout: Duration) -> Result<Session> {
    let resp = http_client(timeout)?
        .post(endpoint(base_url, "/auth/login"))
        .json(&Credentials { email, password })
        .send()
        .await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
        bail!("invalid email or password");
    }
    let body: LoginResp = resp.error_for_status()?.json().await?;
    info!(user_id = %body.user_id, "signed in");
    Ok(Session {
        email: email.to_string(),
        user_id: body.user_id,
        token: body.token,
    })
}

/// `ShoeStore` backed by the shoe backend.
pub struct HttpStore {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpStore {
    /// Requests taking longer than `timeout` fail with `StoreError::Unavailable`.
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn shoes_url(&self, id: Option<ShoeId>) -> String {
        match id {
            Some(id) => format!("{}/shoes/{id}", self.base_url),
            None => format!("{}/shoes", self.base_url),
        }
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    if e.is_connect() || e.is_timeout() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Transport(e.to_string())
    }
}

/// Maps a non-success status onto the store's error vocabulary.
pub fn status_error(status: StatusCode, id: Option<ShoeId>, body: String) -> StoreError {
    match (status, id) {
        (StatusCode::UNAUTHORIZED, _) => StoreError::Unauthorized,
        (StatusCode::NOT_FOUND, Some(id)) => StoreError::NotFound(id),
        (StatusCode::BAD_REQUEST, _) => StoreError::Rejected(body),
        (s, _) if s.is_server_error() => StoreError::Unavailable(format!("{s}: {body}")),
        (s, _) => StoreError::Transport(format!("{s}: {body}")),
    }
}

async fn checked(resp: Response, id: Option<ShoeId>) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(status_error(status, id, body))
}

impl ShoeStore for HttpStore {
    async fn create_record(&self, shoe: &Shoe) -> Result<ShoeId, StoreError> {
        let resp = self
            .client
            .post(self.shoes_url(None))
            .bearer_auth(&self.token)
            .json(shoe)
            .send()
            .await
            .map_err(transport)?;
        let created: StoredShoe = checked(resp, None).await?.json().await.map_err(transport)?;
        let id = created
            .shoe
            .id
            .ok_or_else(|| StoreError::Transport("server returned a shoe without an id".into()))?;
        debug!(%id, created_at = ?created.created_at, "created remote shoe");
        Ok(id)
    }

    async fn update_record(&self, id: ShoeId, patch: &ShoePatch) -> Result<(), StoreError> {
        let resp = self
            .client
            .patch(self.shoes_url(Some(id)))
            .bearer_auth(&self.token)
            .json(patch)
            .send()
            .await
            .map_err(transport)?;
        checked(resp, Some(id)).await?;
        debug!(%id, "patched remote shoe");
        Ok(())
    }

    async fn delete_record(&self, id: ShoeId) -> Result<(), StoreError> {
        let resp = self
            .client
            .delete(self.shoes_url(Some(id)))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        checked(resp, Some(id)).await?;
        debug!(%id, "deleted remote shoe");
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<Shoe>, StoreError> {
        let resp = self
            .client
            .get(self.shoes_url(None))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        let shoes: Vec<StoredShoe> = checked(resp, None).await?.json().await.map_err(transport)?;
        Ok(shoes.into_iter().map(|i| i.shoe).collect())
    }
}
