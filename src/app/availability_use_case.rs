use crate::app::ports::HtmlSource;
use crate::config::Config;
use crate::error::Result;
use crate::parser::parse_schedule;
use crate::types::{AvailabilityModel, Sport};
use std::sync::Arc;
use tracing::instrument;

/// Fetches a sport/day schedule page and parses it into an [`AvailabilityModel`]
pub struct AvailabilityUseCase {
    source: Arc<dyn HtmlSource>,
    config: Arc<Config>,
}

impl AvailabilityUseCase {
    pub fn new(source: Arc<dyn HtmlSource>, config: Arc<Config>) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse an already fetched page with this sport's profile
    pub fn parse_page(
        &self,
        sport: Sport,
        html: &str,
        display_name: Option<&str>,
    ) -> AvailabilityModel {
        let profile = self.config.profile(sport);
        parse_schedule(html, sport, &profile, &self.config.site, display_name)
    }

    #[instrument(skip(self))]
    pub async fn availability(
        &self,
        sport: Sport,
        day_token: Option<&str>,
        display_name: Option<&str>,
    ) -> Result<AvailabilityModel> {
        let html = self.source.fetch_schedule(sport, day_token).await?;
        Ok(self.parse_page(sport, &html, display_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::types::SlotStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedPage {
        html: String,
        requests: Mutex<Vec<(Sport, Option<String>)>>,
    }

    #[async_trait]
    impl HtmlSource for FixedPage {
        async fn fetch_schedule(&self, sport: Sport, day_token: Option<&str>) -> Result<String> {
            self.requests.lock().unwrap().push((sport, day_token.map(str::to_string)));
            Ok(self.html.clone())
        }
    }

    struct Offline;

    #[async_trait]
    impl HtmlSource for Offline {
        async fn fetch_schedule(&self, _sport: Sport, _day_token: Option<&str>) -> Result<String> {
            Err(SyncError::Config("offline".into()))
        }
    }

    const SQUASH_PAGE: &str = r#"
        <div class="barre-top"><div class="btn-bar btn-bar-active">Ma 3</div></div>
        <div class="col-heures"><div class="heures"><span class="heures">18h00</span></div></div>
        <div class="courts">
          <div class="cases squash_base"><div class="tableau_entetes">Squash 2</div></div>
          <div class="cases squash_occupe" title="P Dupont&#10;C Berchier"></div>
        </div>"#;

    #[tokio::test]
    async fn fetches_requested_day_and_parses_with_sport_profile() {
        let source = Arc::new(FixedPage {
            html: SQUASH_PAGE.to_string(),
            requests: Mutex::new(Vec::new()),
        });
        let use_case = AvailabilityUseCase::new(source.clone(), Arc::new(Config::default()));

        let model = use_case
            .availability(Sport::Squash, Some("tok"), Some("Berchier"))
            .await
            .unwrap();

        assert_eq!(model.courts, vec!["Squash 2"]);
        assert_eq!(model.slots[0].status, SlotStatus::Mine);
        assert_eq!(model.slots[0].occupants.as_deref(), Some("P Dupont / C Berchier"));
        assert_eq!(
            source.requests.lock().unwrap().as_slice(),
            &[(Sport::Squash, Some("tok".to_string()))]
        );
    }

    #[tokio::test]
    async fn transport_errors_are_passed_through() {
        let use_case = AvailabilityUseCase::new(Arc::new(Offline), Arc::new(Config::default()));
        let err = use_case.availability(Sport::Padel, None, None).await.unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }
}
