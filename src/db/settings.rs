use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::{Coordinate, MapRegion};

pub const CENTER_LATITUDE_KEY: &str = "map.center_latitude";
pub const CENTER_LONGITUDE_KEY: &str = "map.center_longitude";
pub const SPAN_LATITUDE_DELTA_KEY: &str = "map.span_latitude_delta";
pub const SPAN_LONGITUDE_DELTA_KEY: &str = "map.span_longitude_delta";

pub async fn get_setting<'e, E>(executor: E, key: &str) -> Result<Option<f64>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, f64>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(executor)
        .await
}

pub async fn set_setting<'e, E>(executor: E, key: &str, value: f64) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(executor)
    .await?;
    Ok(())
}

/// Saved map region, if all four values are present.
pub async fn load_region(pool: &SqlitePool) -> Result<Option<MapRegion>, sqlx::Error> {
    let latitude = get_setting(pool, CENTER_LATITUDE_KEY).await?;
    let longitude = get_setting(pool, CENTER_LONGITUDE_KEY).await?;
    let span_lat = get_setting(pool, SPAN_LATITUDE_DELTA_KEY).await?;
    let span_lon = get_setting(pool, SPAN_LONGITUDE_DELTA_KEY).await?;

    Ok(match (latitude, longitude, span_lat, span_lon) {
        (Some(latitude), Some(longitude), Some(span_lat), Some(span_lon)) => Some(MapRegion {
            center: Coordinate::new(latitude, longitude),
            span_latitude_delta: span_lat,
            span_longitude_delta: span_lon,
        }),
        _ => None,
    })
}

pub async fn save_region(pool: &SqlitePool, region: &MapRegion) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    set_setting(&mut *tx, CENTER_LATITUDE_KEY, region.center.latitude).await?;
    set_setting(&mut *tx, CENTER_LONGITUDE_KEY, region.center.longitude).await?;
    set_setting(&mut *tx, SPAN_LATITUDE_DELTA_KEY, region.span_latitude_delta).await?;
    set_setting(&mut *tx, SPAN_LONGITUDE_DELTA_KEY, region.span_longitude_delta).await?;
    tx.commit().await
}
