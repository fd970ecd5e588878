//! FriendRepository, FriendInvitationRepository e CooldownRepository su MySQL

use super::MySqlExecutor;
use crate::dtos::{CreateFriendInvitationDTO, CreateInvitationCooldownDTO};
use crate::entities::{Friend, FriendInvitation, InvitationCooldown, canonical_pair};
use crate::repositories::traits::{
    CooldownRepository, FriendInvitationRepository, FriendRepository,
};
use chrono::{DateTime, Utc};
use sqlx::Error;

impl FriendRepository for MySqlExecutor {
    async fn are_friends(&mut self, user_a: i32, user_b: i32) -> Result<bool, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM friends
            WHERE (user_id_1 = ? AND user_id_2 = ?) OR (user_id_1 = ? AND user_id_2 = ?)
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_one(self.conn())
        .await?;

        Ok(count > 0)
    }

    async fn create_friend(
        &mut self,
        user_a: i32,
        user_b: i32,
        created_at: DateTime<Utc>,
    ) -> Result<Friend, Error> {
        let (low, high) = canonical_pair(user_a, user_b);
        sqlx::query("INSERT INTO friends (user_id_1, user_id_2, created_at) VALUES (?, ?, ?)")
            .bind(low)
            .bind(high)
            .bind(created_at)
            .execute(self.conn())
            .await?;

        Ok(Friend {
            user_id_1: low,
            user_id_2: high,
            created_at,
        })
    }

    async fn delete_friend(&mut self, user_a: i32, user_b: i32) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM friends
            WHERE (user_id_1 = ? AND user_id_2 = ?) OR (user_id_1 = ? AND user_id_2 = ?)
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .execute(self.conn())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_friends_of(&mut self, user_id: i32) -> Result<Vec<Friend>, Error> {
        let friends = sqlx::query_as::<_, Friend>(
            r#"
            SELECT user_id_1, user_id_2, created_at FROM friends
            WHERE user_id_1 = ? OR user_id_2 = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(self.conn())
        .await?;

        Ok(friends)
    }
}

impl FriendInvitationRepository for MySqlExecutor {
    async fn create_friend_invitation(
        &mut self,
        data: &CreateFriendInvitationDTO,
    ) -> Result<FriendInvitation, Error> {
        let result = sqlx::query(
            "INSERT INTO friend_invitations (sender_id, receiver_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(data.sender_id)
        .bind(data.receiver_id)
        .bind(data.created_at)
        .execute(self.conn())
        .await?;

        Ok(FriendInvitation {
            invitation_id: result.last_insert_id() as i32,
            sender_id: data.sender_id,
            receiver_id: data.receiver_id,
            created_at: data.created_at,
        })
    }

    async fn lock_friend_invitation(
        &mut self,
        invitation_id: i32,
    ) -> Result<Option<FriendInvitation>, Error> {
        let invitation = sqlx::query_as::<_, FriendInvitation>(
            r#"
            SELECT invitation_id, sender_id, receiver_id, created_at
            FROM friend_invitations WHERE invitation_id = ? FOR UPDATE
            "#,
        )
        .bind(invitation_id)
        .fetch_optional(self.conn())
        .await?;

        Ok(invitation)
    }

    async fn find_friend_invitation_between(
        &mut self,
        user_a: i32,
        user_b: i32,
    ) -> Result<Option<FriendInvitation>, Error> {
        let invitation = sqlx::query_as::<_, FriendInvitation>(
            r#"
            SELECT invitation_id, sender_id, receiver_id, created_at
            FROM friend_invitations
            WHERE (sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?)
            LIMIT 1
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_optional(self.conn())
        .await?;

        Ok(invitation)
    }

    async fn find_friend_invitations_for_receiver(
        &mut self,
        receiver_id: i32,
    ) -> Result<Vec<FriendInvitation>, Error> {
        let invitations = sqlx::query_as::<_, FriendInvitation>(
            r#"
            SELECT invitation_id, sender_id, receiver_id, created_at
            FROM friend_invitations WHERE receiver_id = ?
            ORDER BY created_at DESC, invitation_id DESC
            "#,
        )
        .bind(receiver_id)
        .fetch_all(self.conn())
        .await?;

        Ok(invitations)
    }

    async fn delete_friend_invitation(&mut self, invitation_id: i32) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM friend_invitations WHERE invitation_id = ?")
            .bind(invitation_id)
            .execute(self.conn())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl CooldownRepository for MySqlExecutor {
    async fn create_cooldown(
        &mut self,
        data: &CreateInvitationCooldownDTO,
    ) -> Result<InvitationCooldown, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO invitation_cooldowns (user_id_1, user_id_2, start_cooldown_millis, cooldown_duration)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(data.user_id_1)
        .bind(data.user_id_2)
        .bind(data.start_cooldown_millis)
        .bind(data.cooldown_duration)
        .execute(self.conn())
        .await?;

        Ok(InvitationCooldown {
            cooldown_id: result.last_insert_id() as i32,
            user_id_1: data.user_id_1,
            user_id_2: data.user_id_2,
            start_cooldown_millis: data.start_cooldown_millis,
            cooldown_duration: data.cooldown_duration,
        })
    }

    async fn latest_cooldown_between(
        &mut self,
        user_a: i32,
        user_b: i32,
    ) -> Result<Option<InvitationCooldown>, Error> {
        let cooldown = sqlx::query_as::<_, InvitationCooldown>(
            r#"
            SELECT cooldown_id, user_id_1, user_id_2, start_cooldown_millis, cooldown_duration
            FROM invitation_cooldowns
            WHERE (user_id_1 = ? AND user_id_2 = ?) OR (user_id_1 = ? AND user_id_2 = ?)
            ORDER BY cooldown_id DESC
            LIMIT 1
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(user_b)
        .bind(user_a)
        .fetch_optional(self.conn())
        .await?;

        Ok(cooldown)
    }
}
