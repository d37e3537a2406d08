use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use splitpot_storage::{
    Group, GroupDraft, GroupId, GroupStore, Membership, MembershipRemoval, MembershipRole,
    NewMembership, StoreError, UserDirectory, UserId, UserProfile,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct PostgresStore {
    pool: PgPool,
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    let msg = e.to_string();
    if msg.contains("duplicate key") {
        StoreError::AlreadyExists
    } else if msg.contains("foreign key") {
        // The parent group vanished between the existence check and the
        // insert.
        StoreError::NotFound
    } else {
        StoreError::Backend(msg)
    }
}

impl PostgresStore {
    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(backend)?;

        MIGRATOR.run(&pool).await.map_err(backend)?;

        Ok(Self { pool })
    }

    /// Write path for user profiles, owned by the identity subsystem.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users(id, email, display_name, created_at) VALUES($1, $2, $3, $4)
             ON CONFLICT(id) DO UPDATE SET email = EXCLUDED.email,
                                           display_name = EXCLUDED.display_name",
        )
        .bind(profile.user_id.0)
        .bind(&profile.email)
        .bind(&profile.display_name)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl GroupStore for PostgresStore {
    // ───────────────────────────── Groups ─────────────────────────────

    async fn save_group(&self, draft: &GroupDraft) -> Result<Group, StoreError> {
        match draft.id {
            None => {
                let id = Uuid::now_v7();
                let row = sqlx::query_as::<_, (Uuid, String, Uuid, DateTime<Utc>)>(
                    "INSERT INTO groups(id, name, created_by) VALUES($1, $2, $3)
                     RETURNING id, name, created_by, created_at",
                )
                .bind(id)
                .bind(&draft.name)
                .bind(draft.created_by.0)
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;

                Ok(group_from_row(row))
            }
            Some(id) => {
                let row = sqlx::query_as::<_, (Uuid, String, Uuid, DateTime<Utc>)>(
                    "UPDATE groups SET name = $1 WHERE id = $2
                     RETURNING id, name, created_by, created_at",
                )
                .bind(&draft.name)
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?
                .ok_or(StoreError::NotFound)?;

                Ok(group_from_row(row))
            }
        }
    }

    async fn find_group(&self, group_id: &GroupId) -> Result<Option<Group>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, Uuid, DateTime<Utc>)>(
            "SELECT id, name, created_by, created_at FROM groups WHERE id = $1",
        )
        .bind(group_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(group_from_row))
    }

    async fn delete_group_cascade(&self, group_id: &GroupId) -> Result<bool, StoreError> {
        // ON DELETE CASCADE removes the membership rows.
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_group_if_orphaned(&self, group_id: &GroupId) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        // Lock the group row so a concurrent enrollment cannot slip between
        // the emptiness check and the delete.
        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM groups WHERE id = $1 FOR UPDATE")
                .bind(group_id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;

        if locked.is_none() {
            return Ok(false);
        }

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM group_members WHERE group_id = $1")
                .bind(group_id.0)
                .fetch_one(&mut *tx)
                .await
                .map_err(backend)?;

        if count > 0 {
            return Ok(false);
        }

        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id.0)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    // ───────────────────────────── Memberships ─────────────────────────────

    async fn save_membership(&self, params: &NewMembership) -> Result<Membership, StoreError> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "INSERT INTO group_members(group_id, user_id, role)
             SELECT $1, $2, $3 WHERE EXISTS(SELECT 1 FROM groups WHERE id = $1)
             RETURNING joined_at",
        )
        .bind(params.group_id.0)
        .bind(params.user_id.0)
        .bind(params.role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_insert_error)?;

        let (joined_at,) = row.ok_or(StoreError::NotFound)?;

        Ok(Membership {
            group_id: params.group_id,
            user_id: params.user_id,
            role: params.role,
            joined_at,
        })
    }

    async fn delete_membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<MembershipRemoval, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM groups WHERE id = $1 FOR UPDATE")
                .bind(group_id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;

        if locked.is_none() {
            return Ok(MembershipRemoval {
                removed: false,
                remaining: 0,
            });
        }

        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id.0)
            .bind(user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let (remaining,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM group_members WHERE group_id = $1")
                .bind(group_id.0)
                .fetch_one(&mut *tx)
                .await
                .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        Ok(MembershipRemoval {
            removed: result.rows_affected() > 0,
            remaining,
        })
    }

    async fn find_memberships_by_group(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<Membership>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, String, DateTime<Utc>)>(
            "SELECT group_id, user_id, role, joined_at FROM group_members
             WHERE group_id = $1 ORDER BY joined_at, user_id",
        )
        .bind(group_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut out = Vec::with_capacity(rows.len());
        for (group_id, user_id, role, joined_at) in rows {
            out.push(Membership {
                group_id: GroupId(group_id),
                user_id: UserId(user_id),
                role: MembershipRole::from_str(&role).map_err(backend)?,
                joined_at,
            });
        }
        Ok(out)
    }

    async fn find_group_ids_by_user(&self, user_id: &UserId) -> Result<Vec<GroupId>, StoreError> {
        let rows = sqlx::query_as::<_, (Uuid,)>(
            "SELECT group_id FROM group_members WHERE user_id = $1 ORDER BY joined_at",
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(|(id,)| GroupId(id)).collect())
    }
}

fn group_from_row((id, name, created_by, created_at): (Uuid, String, Uuid, DateTime<Utc>)) -> Group {
    Group {
        id: GroupId(id),
        name,
        created_by: UserId(created_by),
        created_at,
    }
}

#[async_trait::async_trait]
impl UserDirectory for PostgresStore {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query_as::<_, (Uuid, String, Option<String>, DateTime<Utc>)>(
            "SELECT id, email, display_name, created_at FROM users WHERE id = $1",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(|(id, email, display_name, created_at)| UserProfile {
            user_id: UserId(id),
            email,
            display_name,
            created_at,
        }))
    }

    async fn find_users(&self, user_ids: &[UserId]) -> Result<Vec<UserProfile>, StoreError> {
        let mut out = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            if let Some(profile) = self.find_user(user_id).await? {
                out.push(profile);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests;
