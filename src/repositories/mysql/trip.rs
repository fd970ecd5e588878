//! TripRepository e TripMemberRepository su MySQL

use super::MySqlExecutor;
use crate::dtos::CreateTripMemberDTO;
use crate::entities::{Trip, TripMember, TripRole, TripStatus};
use crate::repositories::traits::{Executor, TripMemberRepository, TripRepository};
use chrono::{DateTime, Utc};
use sqlx::Error;
use tracing::warn;

impl TripRepository for MySqlExecutor {
    async fn create_trip(&mut self, title: &str, created_at: DateTime<Utc>) -> Result<Trip, Error> {
        let status = TripStatus::NotStarted;
        let result = sqlx::query("INSERT INTO trips (title, status, created_at) VALUES (?, ?, ?)")
            .bind(title)
            .bind(status)
            .bind(created_at)
            .execute(self.conn())
            .await?;

        Ok(Trip {
            trip_id: result.last_insert_id() as i32,
            title: title.to_string(),
            status,
            created_at,
        })
    }

    async fn read_trip(&mut self, trip_id: i32) -> Result<Option<Trip>, Error> {
        let trip = sqlx::query_as::<_, Trip>(
            "SELECT trip_id, title, status, created_at FROM trips WHERE trip_id = ?",
        )
        .bind(trip_id)
        .fetch_optional(self.conn())
        .await?;

        Ok(trip)
    }

    async fn lock_trip_for_update(&mut self, trip_id: i32) -> Result<Option<Trip>, Error> {
        if !self.in_transaction() {
            // in autocommit il lock viene rilasciato subito dopo la select
            warn!("lock_trip_for_update called outside a transaction, trip {}", trip_id);
        }

        let trip = sqlx::query_as::<_, Trip>(
            "SELECT trip_id, title, status, created_at FROM trips WHERE trip_id = ? FOR UPDATE",
        )
        .bind(trip_id)
        .fetch_optional(self.conn())
        .await?;

        Ok(trip)
    }
}

impl TripMemberRepository for MySqlExecutor {
    async fn is_user_in_trip(&mut self, trip_id: i32, user_id: i32) -> Result<bool, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM trip_members WHERE trip_id = ? AND user_id = ? AND deleted_at IS NULL",
        )
        .bind(trip_id)
        .bind(user_id)
        .fetch_one(self.conn())
        .await?;

        Ok(count > 0)
    }

    async fn is_user_trip_admin(&mut self, trip_id: i32, user_id: i32) -> Result<bool, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM trip_members
            WHERE trip_id = ? AND user_id = ? AND role = ? AND deleted_at IS NULL
            "#,
        )
        .bind(trip_id)
        .bind(user_id)
        .bind(TripRole::Administrator)
        .fetch_one(self.conn())
        .await?;

        Ok(count > 0)
    }

    async fn create_member(&mut self, data: &CreateTripMemberDTO) -> Result<TripMember, Error> {
        sqlx::query(
            r#"
            INSERT INTO trip_members (trip_id, user_id, role, member_since)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(data.trip_id)
        .bind(data.user_id)
        .bind(data.role)
        .bind(data.member_since)
        .execute(self.conn())
        .await?;

        Ok(TripMember {
            trip_id: data.trip_id,
            user_id: data.user_id,
            role: data.role,
            member_since: data.member_since,
            deleted_at: None,
        })
    }

    async fn delete_member(
        &mut self,
        trip_id: i32,
        user_id: i32,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE trip_members SET deleted_at = ? WHERE trip_id = ? AND user_id = ? AND deleted_at IS NULL",
        )
        .bind(deleted_at)
        .bind(trip_id)
        .bind(user_id)
        .execute(self.conn())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_members_by_trip(&mut self, trip_id: i32) -> Result<Vec<TripMember>, Error> {
        let members = sqlx::query_as::<_, TripMember>(
            r#"
            SELECT trip_id, user_id, role, member_since, deleted_at
            FROM trip_members
            WHERE trip_id = ? AND deleted_at IS NULL
            ORDER BY member_since ASC, user_id ASC
            "#,
        )
        .bind(trip_id)
        .fetch_all(self.conn())
        .await?;

        Ok(members)
    }
}
