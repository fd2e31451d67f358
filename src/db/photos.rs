use sqlx::{Executor, Sqlite};

use crate::models::Photo;

pub async fn insert_photo<'e, E>(executor: E, photo: &Photo) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO photos (id, pin_id, url, image_path, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&photo.id)
    .bind(&photo.pin_id)
    .bind(&photo.url)
    .bind(&photo.image_path)
    .bind(&photo.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_photo<'e, E>(executor: E, photo_id: &str) -> Result<Option<Photo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Photo>("SELECT * FROM photos WHERE id = ?")
        .bind(photo_id)
        .fetch_optional(executor)
        .await
}

/// Photos of a pin in insertion order.
pub async fn photos_for_pin<'e, E>(executor: E, pin_id: &str) -> Result<Vec<Photo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Photo>("SELECT * FROM photos WHERE pin_id = ? ORDER BY rowid")
        .bind(pin_id)
        .fetch_all(executor)
        .await
}

pub async fn set_image_path<'e, E>(
    executor: E,
    photo_id: &str,
    image_path: Option<&str>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE photos SET image_path = ? WHERE id = ?")
        .bind(image_path)
        .bind(photo_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_photo<'e, E>(executor: E, photo_id: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM photos WHERE id = ?")
        .bind(photo_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_photos_for_pin<'e, E>(executor: E, pin_id: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM photos WHERE pin_id = ?")
        .bind(pin_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Number of photos whose stored image is `image_path`.
pub async fn count_path_references<'e, E>(executor: E, image_path: &str) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM photos WHERE image_path = ?")
        .bind(image_path)
        .fetch_one(executor)
        .await
}

/// Photos whose download has not finished yet.
pub async fn pending_photos<'e, E>(executor: E) -> Result<Vec<Photo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Photo>("SELECT * FROM photos WHERE image_path IS NULL")
        .fetch_all(executor)
        .await
}
