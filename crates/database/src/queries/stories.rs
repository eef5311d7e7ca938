//! Story database operations

use crate::DbPool;
use sqlx::Row;
use std::path::PathBuf;
use storynook_core::{AppError, NewStory, Story, StoryId, StoryKind};

/// Inserts a story and returns the persisted record with its assigned id
pub async fn insert_story(pool: &DbPool, story: &NewStory) -> Result<Story, AppError> {
    let result = sqlx::query(
        r#"
        INSERT INTO story (title, voiced_by, type, image_uri, audio_uri)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&story.title)
    .bind(&story.voiced_by)
    .bind(story.kind.as_i64())
    .bind(story.image_path.as_ref().and_then(|p| p.to_str()))
    .bind(story.audio_path.to_str())
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to insert story", e))?;

    let id = StoryId::from_i64(result.last_insert_rowid());
    Ok(story.clone().into_story(id))
}

/// Gets a story by id
pub async fn get_story(pool: &DbPool, id: StoryId) -> Result<Story, AppError> {
    let row = sqlx::query(
        "SELECT id, title, voiced_by, type, image_uri, audio_uri FROM story WHERE id = ?",
    )
    .bind(id.as_i64())
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::database("Failed to fetch story", e))?
    .ok_or_else(|| AppError::not_found("Story", id))?;

    row_to_story(row)
}

/// Lists all stories in insertion order
pub async fn list_stories(pool: &DbPool) -> Result<Vec<Story>, AppError> {
    let rows = sqlx::query(
        "SELECT id, title, voiced_by, type, image_uri, audio_uri FROM story ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::database("Failed to list stories", e))?;

    rows.into_iter().map(row_to_story).collect()
}

/// Updates an existing story
pub async fn update_story(pool: &DbPool, story: &Story) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE story SET title = ?, voiced_by = ?, type = ?, image_uri = ?, audio_uri = ?
        WHERE id = ?
        "#,
    )
    .bind(&story.title)
    .bind(&story.voiced_by)
    .bind(story.kind.as_i64())
    .bind(story.image_path.as_ref().and_then(|p| p.to_str()))
    .bind(story.audio_path.to_str())
    .bind(story.id.as_i64())
    .execute(pool)
    .await
    .map_err(|e| AppError::database("Failed to update story", e))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Story", story.id));
    }

    Ok(())
}

/// Deletes a story
pub async fn delete_story(pool: &DbPool, id: StoryId) -> Result<(), AppError> {
    sqlx::query("DELETE FROM story WHERE id = ?")
        .bind(id.as_i64())
        .execute(pool)
        .await
        .map_err(|e| AppError::database("Failed to delete story", e))?;

    Ok(())
}

/// Deletes a batch of stories in one transaction, returning the count removed
///
/// The reconciler uses this to purge stories whose audio file is gone.
pub async fn delete_stories(pool: &DbPool, ids: &[StoryId]) -> Result<u64, AppError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin delete transaction", e))?;

    let mut removed = 0;
    for id in ids {
        let result = sqlx::query("DELETE FROM story WHERE id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("Failed to delete story batch", e))?;
        removed += result.rows_affected();
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit delete transaction", e))?;

    Ok(removed)
}

/// Clears the image reference of a batch of stories in one transaction
///
/// Records are retained; only the dangling thumbnail reference goes away.
pub async fn clear_image_paths(pool: &DbPool, ids: &[StoryId]) -> Result<u64, AppError> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database("Failed to begin update transaction", e))?;

    let mut cleared = 0;
    for id in ids {
        let result = sqlx::query("UPDATE story SET image_uri = NULL WHERE id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("Failed to clear image reference", e))?;
        cleared += result.rows_affected();
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database("Failed to commit update transaction", e))?;

    Ok(cleared)
}

/// Converts a database row to a Story
fn row_to_story(row: sqlx::sqlite::SqliteRow) -> Result<Story, AppError> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| AppError::database("Missing story id", e))?;

    let kind_value: i64 = row
        .try_get("type")
        .map_err(|e| AppError::database("Missing story type", e))?;
    let kind = StoryKind::from_i64(kind_value).ok_or_else(|| AppError::InvalidRecord {
        reason: format!("Unknown story type {}", kind_value),
    })?;

    let audio_uri: String = row
        .try_get("audio_uri")
        .map_err(|e| AppError::database("Missing audio reference", e))?;
    let image_uri: Option<String> = row
        .try_get("image_uri")
        .map_err(|e| AppError::database("Missing image reference", e))?;

    Ok(Story {
        id: StoryId::from_i64(id),
        title: row
            .try_get("title")
            .map_err(|e| AppError::database("Missing title", e))?,
        voiced_by: row
            .try_get("voiced_by")
            .map_err(|e| AppError::database("Missing narrator", e))?,
        kind,
        image_path: image_uri.map(PathBuf::from),
        audio_path: PathBuf::from(audio_uri),
    })
}
