//! Breakroom repository - dashboard blocks and per-column-count positions

use std::collections::HashSet;

use breakroom_core::{
    merge_placements, validate_placements, BlockFootprint, BlockId, Dashboard, GridRect, Placement,
    SavedPositions,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};

use super::DbError;

const BLOCK_COLUMNS: &str =
    "id, block_type, content_id, x, y, w, h, title, settings, created_at, updated_at";

/// A dashboard block with its default geometry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Block {
    pub id: i64,
    pub block_type: String,
    pub content_id: Option<i64>,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub title: Option<String>,
    pub settings: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Block {
    pub fn footprint(&self) -> BlockFootprint {
        BlockFootprint::new(
            self.id,
            cell(self.x),
            cell(self.y),
            cell(self.w),
            cell(self.h),
        )
    }
}

fn cell(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn column(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[derive(Debug, Clone)]
pub struct NewBlock {
    pub block_type: String,
    pub content_id: Option<i64>,
    pub rect: GridRect,
    pub title: Option<String>,
    pub settings: Option<serde_json::Value>,
}

/// Partial block update. Outer `None` keeps the stored value; for nullable
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct BlockPatch {
    pub block_type: Option<String>,
    pub content_id: Option<Option<i64>>,
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub title: Option<Option<String>>,
    pub settings: Option<Option<serde_json::Value>>,
}

#[derive(FromRow)]
struct PositionRow {
    block_id: i64,
    col_count: i32,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl PositionRow {
    fn entry(self) -> (BlockId, u32, GridRect) {
        (
            self.block_id,
            cell(self.col_count),
            GridRect::new(cell(self.x), cell(self.y), cell(self.w), cell(self.h)),
        )
    }
}

pub struct BreakroomRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BreakroomRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's blocks in default visual order.
    pub async fn blocks(&self, user_id: i64) -> Result<Vec<Block>, DbError> {
        fetch_blocks(self.pool, user_id, false).await
    }

    /// Every saved position of the user's blocks.
    pub async fn positions(&self, user_id: i64) -> Result<SavedPositions, DbError> {
        fetch_positions(self.pool, user_id, None).await
    }

    /// The dashboard with every block positioned at each of `columns`.
    ///
    /// Blocks without a position at a column count get the one the packer
    /// gives them, and it is stored, so blocks added later pack around
    /// them. Runs with the user's block rows locked, like
    /// [`save_positions`](Self::save_positions).
    pub async fn settle(&self, user_id: i64, columns: &[u32]) -> Result<Dashboard, DbError> {
        let mut tx = self.pool.begin().await?;

        let blocks = fetch_blocks(&mut *tx, user_id, true).await?;
        let positions = fetch_positions(&mut *tx, user_id, None).await?;
        let footprints = blocks.iter().map(Block::footprint).collect();
        let mut dashboard = Dashboard::new(footprints, positions);

        let mut cached = 0;
        for &cols in columns {
            let derived = dashboard.cache_layout(cols)?;
            if derived.is_empty() {
                continue;
            }

            let ids: Vec<i64> = derived.iter().map(|p| p.id).collect();
            let xs: Vec<i32> = derived.iter().map(|p| column(p.rect.x)).collect();
            let ys: Vec<i32> = derived.iter().map(|p| column(p.rect.y)).collect();
            let ws: Vec<i32> = derived.iter().map(|p| column(p.rect.w)).collect();
            let hs: Vec<i32> = derived.iter().map(|p| column(p.rect.h)).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO breakroom_block_positions (block_id, col_count, x, y, w, h)
                SELECT t.id, $1, t.x, t.y, t.w, t.h
                FROM UNNEST($2::BIGINT[], $3::INT[], $4::INT[], $5::INT[], $6::INT[])
                    AS t(id, x, y, w, h)
                ON CONFLICT (block_id, col_count) DO NOTHING
                "#,
            )
            .bind(column(cols))
            .bind(&ids)
            .bind(&xs)
            .bind(&ys)
            .bind(&ws)
            .bind(&hs)
            .execute(&mut *tx)
            .await?;
            cached += result.rows_affected();
        }

        tx.commit().await?;
        if cached > 0 {
            tracing::debug!(user_id, cached, "derived positions cached");
        }
        Ok(dashboard)
    }

    /// Upsert positions for one column count in a single transaction.
    ///
    /// Every placement must name one of the user's blocks, otherwise
    /// nothing is written and the first unknown id is `NotFound`. The
    /// placements are validated together with the positions already stored
    /// at `columns` for the user's other blocks. The user's block rows stay
    /// locked until commit, so concurrent writers for one user run in turn.
    pub async fn save_positions(
        &self,
        user_id: i64,
        columns: u32,
        placements: &[Placement],
    ) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let owned: HashSet<i64> = fetch_blocks(&mut *tx, user_id, true)
            .await?
            .into_iter()
            .map(|b| b.id)
            .collect();
        if let Some(unknown) = placements.iter().find(|p| !owned.contains(&p.id)) {
            return Err(DbError::not_found("block", unknown.id));
        }

        let stored = fetch_positions(&mut *tx, user_id, Some(columns)).await?;
        validate_placements(columns, &merge_placements(&stored, columns, placements))?;

        for placement in placements {
            sqlx::query(
                r#"
                INSERT INTO breakroom_block_positions (block_id, col_count, x, y, w, h)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (block_id, col_count) DO UPDATE
                SET x = EXCLUDED.x, y = EXCLUDED.y, w = EXCLUDED.w, h = EXCLUDED.h,
                    updated_at = NOW()
                "#,
            )
            .bind(placement.id)
            .bind(column(columns))
            .bind(column(placement.rect.x))
            .bind(column(placement.rect.y))
            .bind(column(placement.rect.w))
            .bind(column(placement.rect.h))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(user_id, columns, saved = placements.len(), "positions saved");
        Ok(())
    }

    /// Overwrite default geometry of the user's blocks. Blocks that aren't
    /// theirs are skipped. Returns the number updated.
    pub async fn update_defaults(&self, user_id: i64, placements: &[Placement]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for placement in placements {
            let result = sqlx::query(
                r#"
                UPDATE breakroom_blocks
                SET x = $1, y = $2, w = $3, h = $4, updated_at = NOW()
                WHERE id = $5 AND user_id = $6
                "#,
            )
            .bind(column(placement.rect.x))
            .bind(column(placement.rect.y))
            .bind(column(placement.rect.w))
            .bind(column(placement.rect.h))
            .bind(placement.id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn create_block(&self, user_id: i64, block: &NewBlock) -> Result<Block, DbError> {
        let sql = format!(
            r#"
            INSERT INTO breakroom_blocks (user_id, block_type, content_id, x, y, w, h, title, settings)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {BLOCK_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Block>(&sql)
            .bind(user_id)
            .bind(&block.block_type)
            .bind(block.content_id)
            .bind(column(block.rect.x))
            .bind(column(block.rect.y))
            .bind(column(block.rect.w))
            .bind(column(block.rect.h))
            .bind(&block.title)
            .bind(&block.settings)
            .fetch_one(self.pool)
            .await?;
        Ok(row)
    }

    /// Apply a partial update; `None` if the block isn't the user's.
    pub async fn update_block(
        &self,
        user_id: i64,
        id: i64,
        patch: &BlockPatch,
    ) -> Result<Option<Block>, DbError> {
        let sql = format!(
            r#"
            UPDATE breakroom_blocks SET
                block_type = COALESCE($3, block_type),
                content_id = CASE WHEN $4 THEN $5 ELSE content_id END,
                x = COALESCE($6, x),
                y = COALESCE($7, y),
                w = COALESCE($8, w),
                h = COALESCE($9, h),
                title = CASE WHEN $10 THEN $11 ELSE title END,
                settings = CASE WHEN $12 THEN $13 ELSE settings END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {BLOCK_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Block>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(&patch.block_type)
            .bind(patch.content_id.is_some())
            .bind(patch.content_id.flatten())
            .bind(patch.x.map(column))
            .bind(patch.y.map(column))
            .bind(patch.w.map(column))
            .bind(patch.h.map(column))
            .bind(patch.title.is_some())
            .bind(patch.title.clone().flatten())
            .bind(patch.settings.is_some())
            .bind(patch.settings.clone().flatten())
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Delete a block; its saved positions go with it.
    pub async fn delete_block(&self, user_id: i64, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM breakroom_blocks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// `lock` holds the rows `FOR UPDATE` until the transaction ends.
async fn fetch_blocks<'e, E>(executor: E, user_id: i64, lock: bool) -> Result<Vec<Block>, DbError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {BLOCK_COLUMNS} FROM breakroom_blocks WHERE user_id = $1 ORDER BY y, x, id{}",
        if lock { " FOR UPDATE" } else { "" }
    );
    let rows = sqlx::query_as::<_, Block>(&sql)
        .bind(user_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// Positions of the user's blocks, at one column count or all of them.
async fn fetch_positions<'e, E>(
    executor: E,
    user_id: i64,
    columns: Option<u32>,
) -> Result<SavedPositions, DbError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, PositionRow>(
        r#"
        SELECT p.block_id, p.col_count, p.x, p.y, p.w, p.h
        FROM breakroom_block_positions p
        JOIN breakroom_blocks b ON b.id = p.block_id
        WHERE b.user_id = $1 AND ($2::INT IS NULL OR p.col_count = $2)
        "#,
    )
    .bind(user_id)
    .bind(columns.map(column))
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(PositionRow::entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::users::fixtures;

    fn block(id: i64, x: i32, y: i32, w: i32, h: i32) -> Block {
        Block {
            id,
            block_type: "notes".into(),
            content_id: None,
            x,
            y,
            w,
            h,
            title: None,
            settings: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn footprint_from_row() {
        assert_eq!(block(3, 1, 2, 2, 1).footprint(), BlockFootprint::new(3, 1, 2, 2, 1));
        // Negative values never reach the packer
        assert_eq!(block(4, -1, 0, 2, 2).footprint().x, 0);
    }

    #[test]
    fn block_serializes_settings_as_json() {
        let mut b = block(1, 0, 0, 2, 2);
        b.settings = Some(serde_json::json!({ "color": "teal" }));
        let value = serde_json::to_value(&b).unwrap();
        assert_eq!(value["settings"]["color"], "teal");
        assert_eq!(value["content_id"], serde_json::Value::Null);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn positions_saved_per_column_count() {
        let pool = fixtures::pool().await;
        let user = fixtures::user(&pool, "breakroom").await;
        let other = fixtures::user(&pool, "breakroom").await;
        let repo = BreakroomRepo::new(&pool);

        let created = repo
            .create_block(
                user.id,
                &NewBlock {
                    block_type: "notes".into(),
                    content_id: None,
                    rect: GridRect::new(0, 0, 2, 2),
                    title: None,
                    settings: None,
                },
            )
            .await
            .unwrap();

        let placement = Placement::new(created.id, GridRect::new(1, 0, 2, 2));
        repo.save_positions(user.id, 3, &[placement]).await.unwrap();

        let positions = repo.positions(user.id).await.unwrap();
        assert_eq!(positions.get(created.id, 3), Some(GridRect::new(1, 0, 2, 2)));
        assert_eq!(positions.get(created.id, 5), None);

        // Someone else's block is rejected as a whole
        let foreign = repo.save_positions(other.id, 3, &[placement]).await;
        assert!(matches!(foreign, Err(DbError::NotFound { .. })));

        assert!(repo.delete_block(user.id, created.id).await.unwrap());
        assert!(repo.positions(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn patch_keeps_and_clears_fields() {
        let pool = fixtures::pool().await;
        let user = fixtures::user(&pool, "patch").await;
        let repo = BreakroomRepo::new(&pool);

        let created = repo
            .create_block(
                user.id,
                &NewBlock {
                    block_type: "rss".into(),
                    content_id: Some(9),
                    rect: GridRect::new(0, 0, 2, 2),
                    title: Some("Feed".into()),
                    settings: None,
                },
            )
            .await
            .unwrap();

        let patch = BlockPatch {
            w: Some(3),
            title: Some(None),
            ..BlockPatch::default()
        };
        let updated = repo.update_block(user.id, created.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.w, 3);
        assert_eq!(updated.title, None);
        assert_eq!(updated.content_id, Some(9));
        assert_eq!(updated.block_type, "rss");
    }

    fn notes(rect: GridRect) -> NewBlock {
        NewBlock {
            block_type: "notes".into(),
            content_id: None,
            rect,
            title: None,
            settings: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn partial_saves_cannot_overlap_earlier_ones() {
        let pool = fixtures::pool().await;
        let user = fixtures::user(&pool, "overlap").await;
        let repo = BreakroomRepo::new(&pool);

        let a = repo.create_block(user.id, &notes(GridRect::new(0, 0, 2, 2))).await.unwrap();
        let b = repo.create_block(user.id, &notes(GridRect::new(2, 0, 1, 1))).await.unwrap();

        repo.save_positions(user.id, 3, &[Placement::new(a.id, GridRect::new(0, 0, 2, 2))])
            .await
            .unwrap();

        let clash = Placement::new(b.id, GridRect::new(1, 1, 2, 2));
        let err = repo.save_positions(user.id, 3, &[clash]).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Layout(breakroom_core::LayoutError::Overlap { .. })
        ));
        assert_eq!(repo.positions(user.id).await.unwrap().get(b.id, 3), None);

        // Moving both at once is fine
        let moved = [
            Placement::new(a.id, GridRect::new(0, 2, 2, 2)),
            Placement::new(b.id, GridRect::new(1, 0, 2, 2)),
        ];
        repo.save_positions(user.id, 3, &moved).await.unwrap();
        let positions = repo.positions(user.id).await.unwrap();
        assert_eq!(positions.get(a.id, 3), Some(GridRect::new(0, 2, 2, 2)));
        assert_eq!(positions.get(b.id, 3), Some(GridRect::new(1, 0, 2, 2)));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn settled_blocks_stay_put_when_blocks_are_added() {
        let pool = fixtures::pool().await;
        let user = fixtures::user(&pool, "settle").await;
        let repo = BreakroomRepo::new(&pool);

        let first = repo.create_block(user.id, &notes(GridRect::new(0, 1, 2, 2))).await.unwrap();
        let before = repo.settle(user.id, &[3]).await.unwrap().layout_for(3).unwrap();
        let cached = repo.positions(user.id).await.unwrap().get(first.id, 3);
        assert_eq!(cached, Some(before[0].rect));

        let second = repo.create_block(user.id, &notes(GridRect::new(0, 0, 2, 2))).await.unwrap();
        let after = repo.settle(user.id, &[3]).await.unwrap().layout_for(3).unwrap();

        let rect_of = |id| after.iter().find(|item| item.id == id).map(|item| item.rect);
        assert_eq!(rect_of(first.id), cached);
        let placed = rect_of(second.id).unwrap();
        assert!(!placed.overlaps(&cached.unwrap()));

        // Settling again writes nothing new and changes nothing
        let again = repo.settle(user.id, &[3]).await.unwrap().layout_for(3).unwrap();
        assert_eq!(again, after);
    }
}
