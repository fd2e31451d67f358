use sqlx::{Executor, Sqlite};

use crate::models::Pin;

pub async fn insert_pin<'e, E>(executor: E, pin: &Pin) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO pins (id, latitude, longitude, page_count, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&pin.id)
    .bind(pin.latitude)
    .bind(pin.longitude)
    .bind(pin.page_count)
    .bind(&pin.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn get_pin<'e, E>(executor: E, pin_id: &str) -> Result<Option<Pin>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Pin>("SELECT * FROM pins WHERE id = ?")
        .bind(pin_id)
        .fetch_optional(executor)
        .await
}

/// All pins, oldest first.
pub async fn list_pins<'e, E>(executor: E) -> Result<Vec<Pin>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Pin>("SELECT * FROM pins ORDER BY rowid")
        .fetch_all(executor)
        .await
}

pub async fn update_page_count<'e, E>(
    executor: E,
    pin_id: &str,
    page_count: i64,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE pins SET page_count = ? WHERE id = ?")
        .bind(page_count)
        .bind(pin_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Delete the pin row only. Its photos must be removed first.
pub async fn delete_pin<'e, E>(executor: E, pin_id: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM pins WHERE id = ?")
        .bind(pin_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
