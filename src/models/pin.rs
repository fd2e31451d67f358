use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const BOUNDING_BOX_HALF_WIDTH: f64 = 1.0;
pub const BOUNDING_BOX_HALF_HEIGHT: f64 = 1.0;
pub const LAT_MIN: f64 = -90.0;
pub const LAT_MAX: f64 = 90.0;
pub const LON_MIN: f64 = -180.0;
pub const LON_MAX: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (LAT_MIN..=LAT_MAX).contains(&self.latitude)
            && (LON_MIN..=LON_MAX).contains(&self.longitude)
    }

    /// Search box around the coordinate, clamped to valid latitudes and longitudes.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox {
            min_longitude: (self.longitude - BOUNDING_BOX_HALF_WIDTH).max(LON_MIN),
            min_latitude: (self.latitude - BOUNDING_BOX_HALF_HEIGHT).max(LAT_MIN),
            max_longitude: (self.longitude + BOUNDING_BOX_HALF_WIDTH).min(LON_MAX),
            max_latitude: (self.latitude + BOUNDING_BOX_HALF_HEIGHT).min(LAT_MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_longitude: f64,
    pub min_latitude: f64,
    pub max_longitude: f64,
    pub max_latitude: f64,
}

impl BoundingBox {
    /// `minLon,minLat,maxLon,maxLat`, the order the search API expects.
    pub fn to_query_value(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_longitude, self.min_latitude, self.max_longitude, self.max_latitude
        )
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Pin {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Number of result pages reported by the last successful search.
    pub page_count: Option<i64>,
    pub created_at: String,
}

impl Pin {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            page_count: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
