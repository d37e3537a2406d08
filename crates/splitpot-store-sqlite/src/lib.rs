use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use uuid::Uuid;

use splitpot_storage::{
    Group, GroupDraft, GroupId, GroupStore, Membership, MembershipRemoval, MembershipRole,
    NewMembership, StoreError, UserDirectory, UserId, UserProfile,
};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct SqliteStore {
    pool: SqlitePool,
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    Uuid::try_parse(s).map_err(backend)
}

fn datetime_from_secs(secs: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StoreError::Backend(format!("timestamp out of range: {secs}")))
}

impl SqliteStore {
    /// `~/.splitpot/store.db` (creates dir with 0700 perms on unix)
    pub async fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::home_dir()
            .ok_or_else(|| StoreError::Backend("no home dir".into()))?
            .join(".splitpot");
        std::fs::create_dir_all(&dir).map_err(backend)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(backend)?;
        }
        let path = dir.join("store.db");
        let url = format!("sqlite://{}", path.to_string_lossy());
        Self::open(&url).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open("sqlite::memory:").await
    }

    pub async fn open(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(backend)?
            .create_if_missing(true)
            .foreign_keys(true);

        // A single connection keeps multi-statement sequences serialized.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(backend)?;

        MIGRATOR.run(&pool).await.map_err(backend)?;

        Ok(Self { pool })
    }

    /// Write path for user profiles, owned by the identity subsystem.
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users(id, email, display_name, created_at) VALUES(?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET email = excluded.email,
                                           display_name = excluded.display_name",
        )
        .bind(profile.user_id.0.to_string())
        .bind(&profile.email)
        .bind(&profile.display_name)
        .bind(profile.created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl GroupStore for SqliteStore {
    // ───────────────────────────── Groups ─────────────────────────────

    async fn save_group(&self, draft: &GroupDraft) -> Result<Group, StoreError> {
        match draft.id {
            None => {
                let id = Uuid::now_v7();
                let created_at = Utc::now().timestamp();
                sqlx::query(
                    "INSERT INTO groups(id, name, created_by, created_at) VALUES(?, ?, ?, ?)",
                )
                .bind(id.to_string())
                .bind(&draft.name)
                .bind(draft.created_by.0.to_string())
                .bind(created_at)
                .execute(&self.pool)
                .await
                .map_err(backend)?;

                Ok(Group {
                    id: GroupId(id),
                    name: draft.name.clone(),
                    created_by: draft.created_by,
                    created_at: datetime_from_secs(created_at)?,
                })
            }
            Some(id) => {
                let result = sqlx::query("UPDATE groups SET name = ? WHERE id = ?")
                    .bind(&draft.name)
                    .bind(id.0.to_string())
                    .execute(&self.pool)
                    .await
                    .map_err(backend)?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound);
                }

                self.find_group(&id).await?.ok_or(StoreError::NotFound)
            }
        }
    }

    async fn find_group(&self, group_id: &GroupId) -> Result<Option<Group>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, i64)>(
            "SELECT id, name, created_by, created_at FROM groups WHERE id = ?",
        )
        .bind(group_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Ok(None),
            Some((id, name, created_by, created_at)) => Ok(Some(Group {
                id: GroupId(parse_uuid(&id)?),
                name,
                created_by: UserId(parse_uuid(&created_by)?),
                created_at: datetime_from_secs(created_at)?,
            })),
        }
    }

    async fn delete_group_cascade(&self, group_id: &GroupId) -> Result<bool, StoreError> {
        // ON DELETE CASCADE removes the membership rows.
        let result = sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(group_id.0.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_group_if_orphaned(&self, group_id: &GroupId) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM group_members WHERE group_id = ?")
                .bind(group_id.0.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(backend)?;

        if count > 0 {
            return Ok(false);
        }

        let result = sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(group_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    // ───────────────────────────── Memberships ─────────────────────────────

    async fn save_membership(&self, params: &NewMembership) -> Result<Membership, StoreError> {
        let joined_at = Utc::now().timestamp();

        // The EXISTS guard turns "group vanished" into a clean NotFound
        // instead of a foreign-key violation.
        let result = sqlx::query(
            "INSERT INTO group_members(group_id, user_id, role, joined_at)
             SELECT ?, ?, ?, ? WHERE EXISTS(SELECT 1 FROM groups WHERE id = ?)",
        )
        .bind(params.group_id.0.to_string())
        .bind(params.user_id.0.to_string())
        .bind(params.role.as_str())
        .bind(joined_at)
        .bind(params.group_id.0.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint") {
                StoreError::AlreadyExists
            } else {
                backend(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(Membership {
            group_id: params.group_id,
            user_id: params.user_id,
            role: params.role,
            joined_at: datetime_from_secs(joined_at)?,
        })
    }

    async fn delete_membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<MembershipRemoval, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let result = sqlx::query("DELETE FROM group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id.0.to_string())
            .bind(user_id.0.to_string())
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let (remaining,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM group_members WHERE group_id = ?")
                .bind(group_id.0.to_string())
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
        let rows = sqlx::query_as::<_, (String, String, String, i64)>(
            "SELECT group_id, user_id, role, joined_at FROM group_members
             WHERE group_id = ? ORDER BY rowid",
        )
        .bind(group_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut out = Vec::with_capacity(rows.len());
        for (group_id, user_id, role, joined_at) in rows {
            out.push(Membership {
                group_id: GroupId(parse_uuid(&group_id)?),
                user_id: UserId(parse_uuid(&user_id)?),
                role: MembershipRole::from_str(&role).map_err(backend)?,
                joined_at: datetime_from_secs(joined_at)?,
            });
        }
        Ok(out)
    }

    async fn find_group_ids_by_user(&self, user_id: &UserId) -> Result<Vec<GroupId>, StoreError> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT group_id FROM group_members WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id.0.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        let mut out = Vec::with_capacity(rows.len());
        for (id,) in rows {
            out.push(GroupId(parse_uuid(&id)?));
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl UserDirectory for SqliteStore {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, Option<String>, i64)>(
            "SELECT id, email, display_name, created_at FROM users WHERE id = ?",
        )
        .bind(user_id.0.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            None => Ok(None),
            Some((id, email, display_name, created_at)) => Ok(Some(UserProfile {
                user_id: UserId(parse_uuid(&id)?),
                email,
                display_name,
                created_at: datetime_from_secs(created_at)?,
            })),
        }
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
