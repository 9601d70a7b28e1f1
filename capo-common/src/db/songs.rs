//! Song store
//!
//! Every query is scoped to the owning user. Drafts are expected to be
//! validated by the caller ([`SongDraft::validate`]).

use crate::time::now;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::song::{compare_titles, Song, SongCategory, SongDraft};
use crate::{Error, Result};

fn decode_error<E>(e: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::Store(sqlx::Error::Decode(Box::new(e)))
}

fn song_from_row(row: &SqliteRow) -> Result<Song> {
    let id: String = row.get("id");
    let owner_id: String = row.get("owner_id");
    let category: String = row.get("category");

    Ok(Song {
        id: Uuid::parse_str(&id).map_err(decode_error)?,
        title: row.get("title"),
        category: category.parse::<SongCategory>().map_err(decode_error)?,
        mnemonic: row.get("mnemonic"),
        lyrics: row.get("lyrics"),
        media_link: row.get("media_link"),
        owner_id: Uuid::parse_str(&owner_id).map_err(decode_error)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn new_song(owner_id: Uuid, draft: &SongDraft) -> Song {
    let timestamp = now();
    Song {
        id: Uuid::new_v4(),
        title: draft.title.clone(),
        category: draft.category,
        mnemonic: draft.mnemonic.clone(),
        lyrics: draft.lyrics.clone(),
        media_link: draft.media_link.clone(),
        owner_id,
        created_at: timestamp,
        updated_at: timestamp,
    }
}

async fn insert_row(conn: &mut SqliteConnection, song: &Song) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO songs (id, owner_id, title, category, mnemonic, lyrics, media_link, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(song.id.to_string())
    .bind(song.owner_id.to_string())
    .bind(&song.title)
    .bind(song.category.as_str())
    .bind(&song.mnemonic)
    .bind(&song.lyrics)
    .bind(&song.media_link)
    .bind(song.created_at)
    .bind(song.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Store one song for `owner_id` and return the stored record
pub async fn insert(db: &SqlitePool, owner_id: Uuid, draft: &SongDraft) -> Result<Song> {
    let song = new_song(owner_id, draft);
    let mut conn = db.acquire().await?;
    insert_row(&mut conn, &song).await?;

    debug!(song_id = %song.id, owner_id = %owner_id, "Inserted song");
    Ok(song)
}

/// Store all drafts in one transaction; nothing is kept if any insert fails
pub async fn insert_many(db: &SqlitePool, owner_id: Uuid, drafts: &[SongDraft]) -> Result<Vec<Song>> {
    let mut tx = db.begin().await?;
    let mut songs = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let song = new_song(owner_id, draft);
        insert_row(&mut tx, &song).await?;
        songs.push(song);
    }

    tx.commit().await?;
    info!(owner_id = %owner_id, count = songs.len(), "Inserted songs");
    Ok(songs)
}

/// Fetch one of the owner's songs
pub async fn get(db: &SqlitePool, owner_id: Uuid, id: Uuid) -> Result<Song> {
    let row = sqlx::query("SELECT * FROM songs WHERE id = ? AND owner_id = ?")
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Song {}", id)))?;

    song_from_row(&row)
}

/// All of the owner's songs, sorted by title
pub async fn list_by_owner(db: &SqlitePool, owner_id: Uuid) -> Result<Vec<Song>> {
    let rows = sqlx::query("SELECT * FROM songs WHERE owner_id = ?")
        .bind(owner_id.to_string())
        .fetch_all(db)
        .await?;

    let mut songs = rows.iter().map(song_from_row).collect::<Result<Vec<_>>>()?;
    songs.sort_by(|a, b| compare_titles(&a.title, &b.title));
    Ok(songs)
}

pub async fn count_by_owner(db: &SqlitePool, owner_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs WHERE owner_id = ?")
        .bind(owner_id.to_string())
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// Replace the editable fields of one of the owner's songs
pub async fn update(db: &SqlitePool, owner_id: Uuid, id: Uuid, draft: &SongDraft) -> Result<Song> {
    let result = sqlx::query(
        r#"
        UPDATE songs
        SET title = ?, category = ?, mnemonic = ?, lyrics = ?, media_link = ?, updated_at = ?
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(&draft.title)
    .bind(draft.category.as_str())
    .bind(&draft.mnemonic)
    .bind(&draft.lyrics)
    .bind(&draft.media_link)
    .bind(now())
    .bind(id.to_string())
    .bind(owner_id.to_string())
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Song {}", id)));
    }

    get(db, owner_id, id).await
}

/// Delete one of the owner's songs
pub async fn delete(db: &SqlitePool, owner_id: Uuid, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM songs WHERE id = ? AND owner_id = ?")
        .bind(id.to_string())
        .bind(owner_id.to_string())
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Song {}", id)));
    }
    Ok(())
}

/// Delete every song the owner has; returns the number removed
pub async fn delete_all(db: &SqlitePool, owner_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM songs WHERE owner_id = ?")
        .bind(owner_id.to_string())
        .execute(db)
        .await?;

    info!(owner_id = %owner_id, count = result.rows_affected(), "Deleted all songs");
    Ok(result.rows_affected())
}

/// Delete the owner's songs among `ids`; ids owned by others are ignored
pub async fn delete_ids(db: &SqlitePool, owner_id: Uuid, ids: &[Uuid]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "DELETE FROM songs WHERE owner_id = ? AND id IN ({})",
        placeholders
    );

    let mut query = sqlx::query(&sql).bind(owner_id.to_string());
    for id in ids {
        query = query.bind(id.to_string());
    }
    let result = query.execute(db).await?;
    debug!(owner_id = %owner_id, requested = ids.len(), deleted = result.rows_affected(), "Deleted selected songs");
    Ok(result.rows_affected())
}

/// Insert songs kept in an older local store, only when the owner has none yet
///
/// Returns the number of songs inserted (0 when the owner already had songs).
pub async fn migrate_legacy(db: &SqlitePool, owner_id: Uuid, drafts: &[SongDraft]) -> Result<usize> {
    let mut tx = db.begin().await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs WHERE owner_id = ?")
        .bind(owner_id.to_string())
        .fetch_one(&mut *tx)
        .await?;
    if existing > 0 {
        debug!(owner_id = %owner_id, existing, "Skipping legacy migration");
        return Ok(0);
    }

    for draft in drafts {
        insert_row(&mut tx, &new_song(owner_id, draft)).await?;
    }
    tx.commit().await?;

    info!(owner_id = %owner_id, count = drafts.len(), "Migrated legacy songs");
    Ok(drafts.len())
}
