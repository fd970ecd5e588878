//! UserRepository su MySQL

use super::MySqlExecutor;
use crate::entities::{User, canonical_pair};
use crate::repositories::traits::UserRepository;
use sqlx::Error;

impl UserRepository for MySqlExecutor {
    async fn read_user(&mut self, user_id: i32) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, email, username FROM users WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.conn())
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, email, username FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.conn())
        .await?;

        Ok(user)
    }

    async fn lock_user_pair(&mut self, user_a: i32, user_b: i32) -> Result<(), Error> {
        let (low, high) = canonical_pair(user_a, user_b);
        sqlx::query("SELECT user_id FROM users WHERE user_id IN (?, ?) ORDER BY user_id FOR UPDATE")
            .bind(low)
            .bind(high)
            .fetch_all(self.conn())
            .await?;

        Ok(())
    }
}
