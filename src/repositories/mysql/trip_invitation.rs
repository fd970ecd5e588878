//! TripInvitationRepository su MySQL

use super::MySqlExecutor;
use crate::dtos::CreateTripInvitationDTO;
use crate::entities::{InvitationStatus, TripInvitation};
use crate::repositories::traits::TripInvitationRepository;
use sqlx::Error;

const SELECT_TRIP_INVITATION: &str = r#"
    SELECT invitation_id, trip_id, sender_id, receiver_id, status, created_at
    FROM trip_invitations
"#;

impl TripInvitationRepository for MySqlExecutor {
    async fn create_trip_invitation(
        &mut self,
        data: &CreateTripInvitationDTO,
    ) -> Result<TripInvitation, Error> {
        let status = InvitationStatus::Pending;
        let result = sqlx::query(
            r#"
            INSERT INTO trip_invitations (trip_id, sender_id, receiver_id, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.trip_id)
        .bind(data.sender_id)
        .bind(data.receiver_id)
        .bind(status)
        .bind(data.created_at)
        .execute(self.conn())
        .await?;

        Ok(TripInvitation {
            invitation_id: result.last_insert_id() as i32,
            trip_id: data.trip_id,
            sender_id: data.sender_id,
            receiver_id: data.receiver_id,
            status,
            created_at: data.created_at,
        })
    }

    async fn read_trip_invitation(
        &mut self,
        invitation_id: i32,
    ) -> Result<Option<TripInvitation>, Error> {
        let query = format!("{SELECT_TRIP_INVITATION} WHERE invitation_id = ?");
        let invitation = sqlx::query_as::<_, TripInvitation>(&query)
            .bind(invitation_id)
            .fetch_optional(self.conn())
            .await?;

        Ok(invitation)
    }

    async fn lock_trip_invitation(
        &mut self,
        invitation_id: i32,
    ) -> Result<Option<TripInvitation>, Error> {
        let query = format!("{SELECT_TRIP_INVITATION} WHERE invitation_id = ? FOR UPDATE");
        let invitation = sqlx::query_as::<_, TripInvitation>(&query)
            .bind(invitation_id)
            .fetch_optional(self.conn())
            .await?;

        Ok(invitation)
    }

    async fn find_live_trip_invitation(
        &mut self,
        trip_id: i32,
        receiver_id: i32,
    ) -> Result<Option<TripInvitation>, Error> {
        let query = format!("{SELECT_TRIP_INVITATION} WHERE trip_id = ? AND receiver_id = ?");
        let invitation = sqlx::query_as::<_, TripInvitation>(&query)
            .bind(trip_id)
            .bind(receiver_id)
            .fetch_optional(self.conn())
            .await?;

        Ok(invitation)
    }

    async fn find_trip_invitations_for_receiver(
        &mut self,
        receiver_id: i32,
    ) -> Result<Vec<TripInvitation>, Error> {
        let query = format!(
            "{SELECT_TRIP_INVITATION} WHERE receiver_id = ? ORDER BY created_at DESC, invitation_id DESC"
        );
        let invitations = sqlx::query_as::<_, TripInvitation>(&query)
            .bind(receiver_id)
            .fetch_all(self.conn())
            .await?;

        Ok(invitations)
    }

    async fn delete_trip_invitation(&mut self, invitation_id: i32) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM trip_invitations WHERE invitation_id = ?")
            .bind(invitation_id)
            .execute(self.conn())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
