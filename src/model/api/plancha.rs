use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::plancha::{Committee, PlanchaStatus, Slate},
    db::plancha::Plancha,
};

/// A plancha application as shown to its leader and to admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanchaDescription {
    pub id: String,
    pub committee: Committee,
    #[serde(flatten)]
    pub slate: Slate,
    pub status: PlanchaStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Plancha> for PlanchaDescription {
    fn from(plancha: Plancha) -> Self {
        let core = plancha.plancha;
        Self {
            id: plancha.id.to_string(),
            committee: core.committee,
            slate: core.slate,
            status: core.status,
            created_at: core.created_at,
            updated_at: core.updated_at,
        }
    }
}
