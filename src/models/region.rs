use serde::{Deserialize, Serialize};

use super::pin::{Coordinate, LAT_MAX};
use crate::error::{AppError, AppResult};

const METERS_PER_DEGREE_LATITUDE: f64 = 111_320.0;

/// Visible map viewport: center plus span deltas in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    pub center: Coordinate,
    pub span_latitude_delta: f64,
    pub span_longitude_delta: f64,
}

impl MapRegion {
    pub fn new(center: Coordinate, span_latitude_delta: f64, span_longitude_delta: f64) -> AppResult<Self> {
        let region = Self {
            center,
            span_latitude_delta,
            span_longitude_delta,
        };
        region.validate()?;
        Ok(region)
    }

    /// Region of roughly `meters` by `meters` centered on `center`.
    pub fn around(center: Coordinate, meters: f64) -> Self {
        let span_latitude_delta = meters / METERS_PER_DEGREE_LATITUDE;
        // Clamp near the poles where the cosine goes to zero.
        let cos_lat = center.latitude.to_radians().cos().max(0.01);
        let span_longitude_delta = (meters / (METERS_PER_DEGREE_LATITUDE * cos_lat)).min(360.0);
        Self {
            center,
            span_latitude_delta,
            span_longitude_delta,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !self.center.is_valid() {
            return Err(AppError::InvalidInput(format!(
                "region center out of range: {}, {}",
                self.center.latitude, self.center.longitude
            )));
        }
        let spans_ok = self.span_latitude_delta.is_finite()
            && self.span_longitude_delta.is_finite()
            && self.span_latitude_delta > 0.0
            && self.span_longitude_delta > 0.0
            && self.span_latitude_delta <= 2.0 * LAT_MAX
            && self.span_longitude_delta <= 360.0;
        if !spans_ok {
            return Err(AppError::InvalidInput(format!(
                "region span out of range: {}, {}",
                self.span_latitude_delta, self.span_longitude_delta
            )));
        }
        Ok(())
    }
}
