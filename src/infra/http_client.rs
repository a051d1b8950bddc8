use crate::app::ports::HtmlSource;
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::types::Sport;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetches schedule pages from the FairPlay portal
pub struct FairplayHttp {
    client: reqwest::Client,
    config: Arc<Config>,
}

impl FairplayHttp {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.site.user_agent.clone())
            .timeout(Duration::from_secs(config.site.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    /// `{base}/{page}?responsive=false[&d=token]`
    pub fn schedule_url(&self, sport: Sport, day_token: Option<&str>) -> Result<Url> {
        let page = format!(
            "{}/{}",
            self.config.site.base_url.trim_end_matches('/'),
            self.config.profile(sport).page
        );
        let mut query = vec![("responsive", "false")];
        if let Some(d) = day_token {
            query.push(("d", d));
        }
        Url::parse_with_params(&page, &query)
            .map_err(|e| SyncError::Config(format!("invalid schedule URL '{}': {}", page, e)))
    }
}

#[async_trait]
impl HtmlSource for FairplayHttp {
    #[instrument(skip(self))]
    async fn fetch_schedule(&self, sport: Sport, day_token: Option<&str>) -> Result<String> {
        let url = self.schedule_url(sport, day_token)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/html")
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched schedule page");
        Ok(body)
    }
}
