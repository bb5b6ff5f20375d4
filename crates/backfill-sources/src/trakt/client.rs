use crate::error::SourceError;
use crate::traits::ShowCatalog;
use crate::trakt::api;
use crate::trakt::auth;
use anyhow::Result;
use async_trait::async_trait;
use backfill_config::CredentialStore;
use backfill_models::{Episode, Season, ShowCandidate};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct TraktClient {
    client: Arc<Client>,
    access_token: Option<String>,
    client_id: String,
    client_secret: String,
    encoded_username: Option<String>,
}

impl TraktClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client: Arc::new(auth::create_trakt_client()),
            access_token: None,
            client_id,
            client_secret,
            encoded_username: None,
        }
    }

    /// Reuse the saved token while it has more than five minutes left,
    /// otherwise refresh or run the authorization code flow and persist
    /// the new tokens.
    pub async fn authenticate<F>(&mut self, cred_store: &mut CredentialStore, read_code: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<String>,
    {
        cred_store.load()?;

        if let Some(saved_token) = cred_store.get_trakt_access_token().cloned() {
            let fresh = cred_store
                .get_trakt_token_expires()
                .map(|expires_at| expires_at > Utc::now() + Duration::minutes(5))
                .unwrap_or(true);

            if fresh {
                match api::get_encoded_username(&self.client, &saved_token, &self.client_id).await {
                    Ok(encoded_username) => {
                        self.access_token = Some(saved_token);
                        self.encoded_username = Some(encoded_username);
                        info!("Using saved Trakt access token");
                        return Ok(());
                    }
                    Err(e) => {
                        info!("Saved Trakt token was rejected ({}), attempting refresh", e);
                    }
                }
            } else {
                info!("Trakt access token expired or expiring soon, refreshing");
            }
        }

        let refresh_token = cred_store.get_trakt_refresh_token().cloned();
        let token_info = auth::authenticate(
            &self.client_id,
            &self.client_secret,
            refresh_token.as_deref(),
            read_code,
        )
        .await?;

        let encoded_username =
            api::get_encoded_username(&self.client, &token_info.access_token, &self.client_id).await?;

        cred_store.set_trakt_access_token(token_info.access_token.clone());
        cred_store.set_trakt_refresh_token(token_info.refresh_token);
        cred_store.set_trakt_token_expires(token_info.expires_at);
        cred_store.save()?;

        self.access_token = Some(token_info.access_token);
        self.encoded_username = Some(encoded_username);

        info!("Authenticated to Trakt");
        Ok(())
    }

    pub fn username(&self) -> Option<&str> {
        self.encoded_username.as_deref()
    }

    fn access_token(&self) -> Result<&str, SourceError> {
        self.access_token.as_deref().ok_or(SourceError::NotAuthenticated)
    }
}

#[async_trait]
impl ShowCatalog for TraktClient {
    fn catalog_name(&self) -> &str {
        "trakt"
    }

    fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.encoded_username.is_some()
    }

    async fn search_shows(&self, title: &str) -> Result<Vec<ShowCandidate>, SourceError> {
        let access_token = self.access_token()?;
        api::search_shows(&self.client, access_token, &self.client_id, title).await
    }

    async fn seasons(&self, show: &ShowCandidate) -> Result<Vec<Season>, SourceError> {
        let access_token = self.access_token()?;
        let seasons = api::get_seasons(&self.client, access_token, &self.client_id, show).await?;
        debug!("Fetched {} seasons for '{}'", seasons.len(), show.title);
        Ok(seasons)
    }

    async fn mark_watched(
        &self,
        show: &ShowCandidate,
        season: u32,
        episode: &Episode,
        watched_at: Option<DateTime<Utc>>,
    ) -> Result<(), SourceError> {
        let access_token = self.access_token()?;
        debug!("Adding {} S{:02}E{:02} to Trakt history", show.title, season, episode.number);
        api::add_episode_to_history(&self.client, access_token, &self.client_id, episode, watched_at).await
    }
}
