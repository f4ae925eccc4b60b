// ── Account types ──

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ids::FarmerId;

/// The signed-in account.
#[derive(Debug, Clone, Serialize)]
pub struct Farmer {
    pub id: FarmerId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}
