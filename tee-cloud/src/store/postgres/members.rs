//! Member account queries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::Member;
use uuid::Uuid;

use super::PgStore;
use crate::store::{MemberCredentials, MemberStore, StoreResult};

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    name: String,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<MemberRow> for MemberCredentials {
    fn from(row: MemberRow) -> Self {
        Self {
            member: Member {
                id: row.id,
                name: row.name,
                username: row.username,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        }
    }
}

#[async_trait]
impl MemberStore for PgStore {
    async fn insert_member(&self, member: &Member, password_hash: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO members (id, name, username, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(member.id)
        .bind(&member.name)
        .bind(&member.username)
        .bind(password_hash)
        .bind(member.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_credentials(&self, username: &str) -> StoreResult<Option<MemberCredentials>> {
        let row: Option<MemberRow> = sqlx::query_as(
            "SELECT id, name, username, password_hash, created_at FROM members WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(MemberCredentials::from))
    }
}
