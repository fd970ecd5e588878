//! User entity - Entità utente (gestita dal servizio di autenticazione esterno)

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub user_id: i32,
    pub email: String,
    pub username: String,
}
