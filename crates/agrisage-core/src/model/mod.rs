// ── Domain model ──
//
// Canonical types handed to views. Built from wire types in `convert`;
// enumerated server strings are parsed leniently there.

pub mod crop;
pub mod disease;
pub mod farm;
pub mod ids;
pub mod overview;
pub mod recommendation;
pub mod user;
pub mod weather;

pub use crop::{Crop, GrowthStage};
pub use disease::{Confidence, Detection, Severity};
pub use farm::{Farm, GeoPoint, SoilType};
pub use ids::{CropId, DetectionId, FarmId, FarmerId, RecommendationId};
pub use overview::{Dashboard, FarmOverview, FarmTotals};
pub use recommendation::{
    Advice, Priority, Recommendation, RecommendationKind, RecommendationStatus,
};
pub use user::Farmer;
pub use weather::{Forecast, ForecastEntry, Weather, WeatherSource};
