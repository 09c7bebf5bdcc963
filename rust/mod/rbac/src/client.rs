//! REST implementation of [`RbacBackend`].
//!
//! Authentication is pluggable through [`TokenSource`]; every request asks
//! it for a bearer token first. All endpoints live under
//! `{base_url}/admin/rbac`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use openerp_core::{ConsoleConfig, ListParams, ListResult, ServiceError};

use crate::backend::{RbacBackend, Scope};
use crate::model::wire::{RawCandidate, RawMenu, RawPage, RawRoleBindings, RawTeam};
use crate::model::{Candidate, Id, Menu, PermissionBundle, RoleBindings, Team, UserAssignment};

// ── TokenSource ─────────────────────────────────────────────────────

/// Pluggable token provider. Called before every API request.
///
/// Returns `Ok(None)` to skip the Authorization header.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, ServiceError>;
}

/// Anonymous requests.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ServiceError> {
        Ok(None)
    }
}

/// Bearer token obtained elsewhere (e.g. the console's login page).
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ServiceError> {
        Ok(Some(self.0.clone()))
    }
}

// ── HttpBackend ─────────────────────────────────────────────────────

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, token_source: Arc<dyn TokenSource>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token_source)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token_source: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_source,
        }
    }

    /// Client with the configured timeout and token.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ServiceError::Internal(format!("http client: {}", e)))?;
        let token_source: Arc<dyn TokenSource> = match &config.access_token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(NoAuth),
        };
        Ok(Self::with_client(http, &config.api_base, token_source))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/admin/rbac{}", self.base_url, path)
    }

    /// Attach the bearer token, if any.
    async fn authed(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ServiceError> {
        match self.token_source.token().await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ServiceError> {
        let req = self.authed(builder).await?;
        let resp = req.send().await.map_err(network)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceError::from_status(status.as_u16(), body));
        }
        Ok(resp)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<R, ServiceError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let resp = self.send(self.http.get(&url).query(query)).await?;
        resp.json::<R>()
            .await
            .map_err(|e| ServiceError::Decode(format!("response body: {}", e)))
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ServiceError> {
        let url = self.url(path);
        debug!(%url, "PUT");
        self.send(self.http.put(&url).json(body)).await?;
        Ok(())
    }
}

fn network(e: reqwest::Error) -> ServiceError {
    ServiceError::Network(e.to_string())
}

fn scope_query(key: &str, id: Option<Id>) -> Vec<(&str, String)> {
    id.map(|v| vec![(key, v.to_string())]).unwrap_or_default()
}

#[async_trait::async_trait]
impl RbacBackend for HttpBackend {
    async fn list_menus(&self, scope: &Scope) -> Result<Vec<Menu>, ServiceError> {
        let page: RawPage<RawMenu> = self
            .get("/menus", &scope_query("systemId", scope.system_id))
            .await?;
        page.into_parts().0.into_iter().map(RawMenu::normalize).collect()
    }

    async fn list_teams(&self, scope: &Scope) -> Result<Vec<Team>, ServiceError> {
        let page: RawPage<RawTeam> = self
            .get("/teams", &scope_query("organizationId", scope.organization_id))
            .await?;
        page.into_parts().0.into_iter().map(RawTeam::normalize).collect()
    }

    async fn get_role_bindings(&self, role_id: Id) -> Result<RoleBindings, ServiceError> {
        let raw: RawRoleBindings = self.get(&format!("/roles/{}/bindings", role_id), &[]).await?;
        raw.normalize()
    }

    async fn assign_users(&self, role_id: Id, user_ids: &[Id]) -> Result<(), ServiceError> {
        let body = UserAssignment {
            user_ids: user_ids.to_vec(),
        };
        self.put(&format!("/roles/{}/users", role_id), &body).await
    }

    async fn assign_permissions(
        &self,
        role_id: Id,
        bundle: &PermissionBundle,
    ) -> Result<(), ServiceError> {
        self.put(&format!("/roles/{}/permissions", role_id), bundle).await
    }

    async fn search_candidate_users(
        &self,
        keyword: &str,
        params: &ListParams,
        exclude_hint: &[Id],
    ) -> Result<ListResult<Candidate>, ServiceError> {
        let mut query = vec![
            ("keyword", keyword.to_string()),
            ("page", params.page_number().to_string()),
            ("pageSize", params.limit.to_string()),
        ];
        if !exclude_hint.is_empty() {
            let ids: Vec<String> = exclude_hint.iter().map(Id::to_string).collect();
            query.push(("exclude", ids.join(",")));
        }
        let page: RawPage<RawCandidate> = self.get("/candidates/users", &query).await?;
        let (items, total) = page.into_parts();
        Ok(ListResult {
            items: items
                .into_iter()
                .map(RawCandidate::normalize)
                .collect::<Result<_, _>>()?,
            total,
        })
    }

    async fn search_candidate_interfaces(
        &self,
        drs_id: Id,
        keyword: &str,
    ) -> Result<Vec<Candidate>, ServiceError> {
        let page: RawPage<RawCandidate> = self
            .get(
                &format!("/data-resources/{}/interfaces", drs_id),
                &[("keyword", keyword.to_string())],
            )
            .await?;
        page.into_parts().0.into_iter().map(RawCandidate::normalize).collect()
    }
}
