// ── Advisor facade ──
//
// Owns the API client, its session and the query cache. Views read through
// the typed methods here (cached) and write through the mutation methods
// (validated, then invalidating every dependent key on success).

use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use agrisage_api::{ApiClient, ImageUpload, Session, SessionState, TokenStore};

use crate::cache::{Mutation, QueryCache, QueryKey};
use crate::config::AdvisorConfig;
use crate::convert;
use crate::error::CoreError;
use crate::model::{
    CropId, Crop, Dashboard, Detection, Farm, FarmId, FarmOverview, Farmer, Forecast,
    Recommendation, Weather,
};
use crate::requests::{CreateCropRequest, FarmRequest, NewFarmer};
use crate::stream::SessionStream;

/// The forecast endpoint covers at most five days.
pub const MAX_FORECAST_DAYS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Cached,
    Refresh,
}

/// Entry point for reading and changing advisory data.
///
/// Cheaply cloneable via `Arc<AdvisorInner>`. Every clone shares the same
/// session and cache.
#[derive(Clone)]
pub struct Advisor {
    inner: Arc<AdvisorInner>,
}

struct AdvisorInner {
    api: ApiClient,
    cache: QueryCache,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Advisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Advisor")
            .field("server", &self.inner.api.base_url().as_str())
            .field("session", &self.inner.api.session().state())
            .field("cache", &self.inner.cache)
            .finish()
    }
}

impl Advisor {
    /// Build an advisor, restoring any token persisted in `store`.
    pub fn new(config: &AdvisorConfig, store: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        let session = Session::restore(store)?;
        let api = ApiClient::new(config.url.as_str(), session, &config.transport())?;
        debug!(server = %config.url, signed_in = api.session().is_signed_in(), "advisor created");
        Ok(Self::from_client(api, config))
    }

    /// Wrap an already configured client.
    pub fn from_client(api: ApiClient, config: &AdvisorConfig) -> Self {
        let cancel = CancellationToken::new();
        let cache = QueryCache::with_cancellation(config.stale_time, cancel.child_token());
        Self {
            inner: Arc::new(AdvisorInner { api, cache, cancel }),
        }
    }

    /// Build, run `f`, then shut down background work.
    pub async fn oneshot<F, Fut, T>(
        config: &AdvisorConfig,
        store: Arc<dyn TokenStore>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Advisor) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let advisor = Advisor::new(config, store)?;
        let result = f(advisor.clone()).await;
        advisor.shutdown();
        result
    }

    /// Stop background refreshes.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn session(&self) -> &Session {
        self.inner.api.session()
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to session state changes (signed in, out, expired).
    pub fn session_state(&self) -> watch::Receiver<SessionState> {
        self.session().subscribe()
    }

    pub fn session_stream(&self) -> SessionStream {
        SessionStream::new(self.session().subscribe())
    }

    // ── Reads ────────────────────────────────────────────────────

    async fn query<T, Fut>(&self, key: QueryKey, mode: Mode, fut: Fut) -> Result<Arc<T>, CoreError>
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        // A 401 from any request, awaited or background, clears the cache
        // inside `QueryCache` itself.
        match mode {
            Mode::Cached => self.inner.cache.fetch(key, fut).await,
            Mode::Refresh => self.inner.cache.refetch(key, fut).await,
        }
    }

    pub async fn current_user(&self) -> Result<Arc<Farmer>, CoreError> {
        self.current_user_with(Mode::Cached).await
    }

    async fn current_user_with(&self, mode: Mode) -> Result<Arc<Farmer>, CoreError> {
        let api = self.api().clone();
        self.query(QueryKey::CurrentUser, mode, async move {
            Ok(Farmer::from(api.me().await?))
        })
        .await
    }

    /// All farms of the signed-in farmer, crops embedded.
    pub async fn farms(&self) -> Result<Arc<Vec<Farm>>, CoreError> {
        self.farms_with(Mode::Cached).await
    }

    async fn farms_with(&self, mode: Mode) -> Result<Arc<Vec<Farm>>, CoreError> {
        let api = self.api().clone();
        self.query(QueryKey::Farms, mode, async move {
            let farms = api.list_farms().await?;
            Ok(farms.into_iter().map(Farm::from).collect::<Vec<_>>())
        })
        .await
    }

    pub async fn farm(&self, id: FarmId) -> Result<Arc<Farm>, CoreError> {
        self.farm_with(id, Mode::Cached).await
    }

    async fn farm_with(&self, id: FarmId, mode: Mode) -> Result<Arc<Farm>, CoreError> {
        let api = self.api().clone();
        self.query(QueryKey::Farm(id), mode, async move {
            Ok(Farm::from(api.get_farm(id.get()).await?))
        })
        .await
    }

    pub async fn farm_crops(&self, farm: FarmId) -> Result<Arc<Vec<Crop>>, CoreError> {
        self.farm_crops_with(farm, Mode::Cached).await
    }

    async fn farm_crops_with(&self, farm: FarmId, mode: Mode) -> Result<Arc<Vec<Crop>>, CoreError> {
        let api = self.api().clone();
        self.query(QueryKey::FarmCrops(farm), mode, async move {
            let crops = api.farm_crops(farm.get()).await?;
            Ok(crops.into_iter().map(Crop::from).collect::<Vec<_>>())
        })
        .await
    }

    pub async fn weather(&self, farm: FarmId) -> Result<Arc<Weather>, CoreError> {
        self.weather_with(farm, Mode::Cached).await
    }

    async fn weather_with(&self, farm: FarmId, mode: Mode) -> Result<Arc<Weather>, CoreError> {
        let api = self.api().clone();
        self.query(QueryKey::FarmWeather(farm), mode, async move {
            Ok(Weather::from(api.farm_weather(farm.get()).await?))
        })
        .await
    }

    /// Forecast for 1 to [`MAX_FORECAST_DAYS`] days.
    pub async fn forecast(&self, farm: FarmId, days: u8) -> Result<Arc<Forecast>, CoreError> {
        self.forecast_with(farm, days, Mode::Cached).await
    }

    async fn forecast_with(
        &self,
        farm: FarmId,
        days: u8,
        mode: Mode,
    ) -> Result<Arc<Forecast>, CoreError> {
        if !(1..=MAX_FORECAST_DAYS).contains(&days) {
            return Err(CoreError::invalid(
                "days",
                format!("forecast days must be between 1 and {MAX_FORECAST_DAYS}, got {days}"),
            ));
        }
        let api = self.api().clone();
        self.query(QueryKey::FarmForecast { farm, days }, mode, async move {
            Ok(Forecast::from(api.farm_forecast(farm.get(), days).await?))
        })
        .await
    }

    /// Stored recommendations for a farm, most urgent first.
    pub async fn recommendations(
        &self,
        farm: FarmId,
    ) -> Result<Arc<Vec<Recommendation>>, CoreError> {
        self.recommendations_with(farm, Mode::Cached).await
    }

    async fn recommendations_with(
        &self,
        farm: FarmId,
        mode: Mode,
    ) -> Result<Arc<Vec<Recommendation>>, CoreError> {
        let api = self.api().clone();
        self.query(QueryKey::FarmRecommendations(farm), mode, async move {
            let mut recs: Vec<Recommendation> = api
                .farm_recommendations(farm.get())
                .await?
                .into_iter()
                .map(Recommendation::from)
                .collect();
            recs.sort_by_key(|r| r.priority);
            Ok(recs)
        })
        .await
    }

    pub async fn disease_history(&self, farm: FarmId) -> Result<Arc<Vec<Detection>>, CoreError> {
        self.disease_history_with(farm, Mode::Cached).await
    }

    async fn disease_history_with(
        &self,
        farm: FarmId,
        mode: Mode,
    ) -> Result<Arc<Vec<Detection>>, CoreError> {
        let api = self.api().clone();
        self.query(QueryKey::DiseaseHistory(farm), mode, async move {
            let history = api.disease_history(farm.get()).await?;
            Ok(history.into_iter().map(Detection::from).collect::<Vec<_>>())
        })
        .await
    }

    /// Irrigation advice for one crop, as a pending recommendation.
    pub async fn irrigation(
        &self,
        farm: FarmId,
        crop: CropId,
    ) -> Result<Arc<Recommendation>, CoreError> {
        self.irrigation_with(farm, crop, Mode::Cached).await
    }

    async fn irrigation_with(
        &self,
        farm: FarmId,
        crop: CropId,
        mode: Mode,
    ) -> Result<Arc<Recommendation>, CoreError> {
        let api = self.api().clone();
        self.query(QueryKey::Irrigation { farm, crop }, mode, async move {
            let advice = api.irrigation_advice(farm.get(), crop.get()).await?;
            Ok(convert::irrigation_recommendation(farm, crop, advice))
        })
        .await
    }

    /// Fertilizer advice for one crop, as a pending recommendation.
    pub async fn fertilizer(
        &self,
        farm: FarmId,
        crop: CropId,
    ) -> Result<Arc<Recommendation>, CoreError> {
        self.fertilizer_with(farm, crop, Mode::Cached).await
    }

    async fn fertilizer_with(
        &self,
        farm: FarmId,
        crop: CropId,
        mode: Mode,
    ) -> Result<Arc<Recommendation>, CoreError> {
        let api = self.api().clone();
        self.query(QueryKey::Fertilizer { farm, crop }, mode, async move {
            let advice = api.fertilizer_advice(farm.get(), crop.get()).await?;
            Ok(convert::fertilizer_recommendation(farm, crop, advice))
        })
        .await
    }

    // ── Overviews ────────────────────────────────────────────────

    /// Totals across every farm, built from the cached farm list.
    pub async fn dashboard(&self) -> Result<Dashboard, CoreError> {
        Ok(Dashboard::from_farms(&self.farms().await?))
    }

    /// Crop, recommendation and temperature stats for one farm. The reads
    /// run concurrently through the cache. A failed weather lookup leaves
    /// the temperature empty; a rejected session still fails the call.
    pub async fn farm_overview(&self, id: FarmId) -> Result<FarmOverview, CoreError> {
        let (farm, crops, recs, weather) = tokio::join!(
            self.farm(id),
            self.farm_crops(id),
            self.recommendations(id),
            self.weather(id),
        );
        let (farm, crops, recs) = (farm?, crops?, recs?);
        let weather = match weather {
            Ok(weather) => Some(weather),
            Err(err) if err.is_unauthorized() => return Err(err),
            Err(err) => {
                warn!(farm = %id, error = %err, "weather unavailable for overview");
                None
            }
        };
        Ok(FarmOverview::new(&farm, crops.len(), &recs, weather.as_deref()))
    }

    /// Manual refresh of one key, whatever its freshness.
    pub async fn refresh(&self, key: QueryKey) -> Result<(), CoreError> {
        match key {
            QueryKey::CurrentUser => self.current_user_with(Mode::Refresh).await.map(drop),
            QueryKey::Farms => self.farms_with(Mode::Refresh).await.map(drop),
            QueryKey::Farm(id) => self.farm_with(id, Mode::Refresh).await.map(drop),
            QueryKey::FarmCrops(id) => self.farm_crops_with(id, Mode::Refresh).await.map(drop),
            QueryKey::FarmWeather(id) => self.weather_with(id, Mode::Refresh).await.map(drop),
            QueryKey::FarmForecast { farm, days } => {
                self.forecast_with(farm, days, Mode::Refresh).await.map(drop)
            }
            QueryKey::FarmRecommendations(id) => {
                self.recommendations_with(id, Mode::Refresh).await.map(drop)
            }
            QueryKey::DiseaseHistory(id) => {
                self.disease_history_with(id, Mode::Refresh).await.map(drop)
            }
            QueryKey::Irrigation { farm, crop } => {
                self.irrigation_with(farm, crop, Mode::Refresh).await.map(drop)
            }
            QueryKey::Fertilizer { farm, crop } => {
                self.fertilizer_with(farm, crop, Mode::Refresh).await.map(drop)
            }
        }
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Sign in and drop everything cached for the previous identity.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), CoreError> {
        self.api().login(email, password).await?;
        self.inner.cache.invalidate_for(Mutation::SignIn);
        info!(email, "signed in");
        Ok(())
    }

    pub fn logout(&self) -> Result<(), CoreError> {
        self.session().sign_out()?;
        self.inner.cache.invalidate_for(Mutation::SignOut);
        info!("signed out");
        Ok(())
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, farmer: NewFarmer) -> Result<Farmer, CoreError> {
        let body = farmer.into_body()?;
        Ok(Farmer::from(self.api().register(&body).await?))
    }

    pub async fn create_farm(&self, request: FarmRequest) -> Result<Farm, CoreError> {
        let body = request.into_body()?;
        let farm = Farm::from(self.api().create_farm(&body).await?);
        self.inner.cache.invalidate_for(Mutation::CreateFarm);
        info!(farm = %farm.id, name = %farm.name, "farm created");
        Ok(farm)
    }

    pub async fn update_farm(&self, id: FarmId, request: FarmRequest) -> Result<Farm, CoreError> {
        let body = request.into_body()?;
        let farm = Farm::from(self.api().update_farm(id.get(), &body).await?);
        self.inner.cache.invalidate_for(Mutation::UpdateFarm(id));
        info!(farm = %id, "farm updated");
        Ok(farm)
    }

    pub async fn create_crop(&self, request: CreateCropRequest) -> Result<Crop, CoreError> {
        let farm = request.farm;
        let body = request.into_body()?;
        let crop = Crop::from(self.api().create_crop(&body).await?);
        self.inner.cache.invalidate_for(Mutation::CreateCrop { farm });
        info!(farm = %farm, crop = %crop.id, name = %crop.name, "crop created");
        Ok(crop)
    }

    /// Classify a crop photo and record it in the farm's history.
    pub async fn detect_disease(
        &self,
        farm: FarmId,
        crop: CropId,
        image: ImageUpload,
    ) -> Result<Detection, CoreError> {
        if image.is_empty() {
            return Err(CoreError::invalid("image", "image file is empty"));
        }
        let result = self
            .api()
            .detect_disease(farm.get(), crop.get(), image)
            .await?;
        self.inner
            .cache
            .invalidate_for(Mutation::DetectDisease { farm, crop });
        Ok(convert::detection_result(farm, crop, result))
    }
}
