// ── Mutation → invalidation graph ──
//
// Each successful mutation names the reads it makes stale. The mapping is
// an exhaustive match: a new mutation does not compile until its
// dependents are declared here.

use crate::model::{CropId, FarmId};

use super::key::{KeyPattern, QueryKey};

/// A successful write against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateFarm,
    UpdateFarm(FarmId),
    CreateCrop { farm: FarmId },
    DetectDisease { farm: FarmId, crop: CropId },
    SignIn,
    SignOut,
}

impl Mutation {
    /// The keys this mutation invalidates.
    pub fn invalidates(self) -> Vec<KeyPattern> {
        match self {
            Self::CreateFarm => vec![QueryKey::Farms.into()],
            Self::UpdateFarm(farm) => vec![QueryKey::Farms.into(), KeyPattern::Farm(farm)],
            Self::CreateCrop { farm } => vec![
                QueryKey::Farms.into(),
                QueryKey::Farm(farm).into(),
                QueryKey::FarmCrops(farm).into(),
                QueryKey::FarmRecommendations(farm).into(),
            ],
            Self::DetectDisease { farm, .. } => vec![QueryKey::DiseaseHistory(farm).into()],
            Self::SignIn | Self::SignOut => vec![KeyPattern::All],
        }
    }

    /// Whether cached data belongs to a different identity afterwards and
    /// must be dropped rather than merely marked stale.
    pub const fn changes_identity(self) -> bool {
        matches!(self, Self::SignIn | Self::SignOut)
    }
}
