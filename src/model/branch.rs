use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::attendance::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 3,
        "name": "Chennai Central",
        "location": "12 Anna Salai, Chennai",
        "latitude": 13.0827,
        "longitude": 80.2707,
        "geo_fence_radius": 100.0
    })
)]
pub struct Branch {
    #[schema(example = 3)]
    pub id: u64,

    #[schema(example = "Chennai Central")]
    pub name: String,

    /// Free-text address shown on the dashboard.
    #[schema(example = "12 Anna Salai, Chennai")]
    pub location: String,

    #[schema(example = 13.0827)]
    pub latitude: f64,

    #[schema(example = 80.2707)]
    pub longitude: f64,

    /// Geo-fence radius in meters.
    #[schema(example = 100.0)]
    pub geo_fence_radius: f64,
}

impl Branch {
    pub fn coordinates(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}
