//! Domain model, query cache, and facade between `agrisage-api` and views.
//!
//! - **[`Advisor`]**: owns the API client, its [`Session`](agrisage_api::Session)
//!   and the [`QueryCache`]. Typed reads go through the cache; mutations
//!   validate their request, call the server, then invalidate dependent
//!   keys.
//!
//! - **[`QueryCache`]**: per-[`QueryKey`] entries with one shared in-flight
//!   request, stale-while-revalidate reads, and generation-checked
//!   settling so invalidation never lets an older response win.
//!
//! - **[`Mutation`]**: the typed invalidation graph.
//!
//! - **Domain model** ([`model`]): `Farm`, `Crop`, `Recommendation`,
//!   `Detection`, `Weather`, `Forecast`, `Farmer`, with id newtypes, plus the
//!   `Dashboard` and `FarmOverview` aggregates.

pub mod advisor;
pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod requests;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use advisor::{Advisor, MAX_FORECAST_DAYS};
pub use cache::{CacheEvent, KeyPattern, Mutation, QueryCache, QueryKey, QueryKind, QueryState};
pub use config::{AdvisorConfig, TlsVerification};
pub use error::CoreError;
pub use requests::{CreateCropRequest, FarmRequest, NewFarmer};
pub use stream::{CacheEvents, SessionStream};

pub use agrisage_api::{ImageUpload, MemoryTokenStore, SessionState, TokenStore, TokenStoreError};

pub use model::{
    Advice, Confidence, Crop, CropId, Dashboard, Detection, DetectionId, Farm, FarmId,
    FarmOverview, FarmTotals, Farmer, FarmerId, Forecast, ForecastEntry, GeoPoint, GrowthStage,
    Priority, Recommendation, RecommendationId, RecommendationKind, RecommendationStatus, Severity,
    SoilType, Weather, WeatherSource,
};
