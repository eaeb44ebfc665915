//! Recipient lookup — maps a user id to a contact address and display name.

use sqlx::PgPool;
use uuid::Uuid;

use courier_common::types::Recipient;

use crate::retry::DispatchError;

/// Contact lookup interface. A not-found result is a permanent failure for
/// every record addressed to that user.
#[allow(async_fn_in_trait)]
pub trait RecipientResolver {
    async fn resolve(&self, user_id: Uuid) -> Result<Recipient, DispatchError>;
}

/// Resolves recipients from the platform's `users` table.
#[derive(Clone)]
pub struct PgRecipientResolver {
    pool: PgPool,
}

impl PgRecipientResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RecipientResolver for PgRecipientResolver {
    async fn resolve(&self, user_id: Uuid) -> Result<Recipient, DispatchError> {
        let row: Option<(Option<String>, String)> =
            sqlx::query_as("SELECT email, display_name FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DispatchError::ResolveTransient(e.to_string()))?;

        match row {
            None => Err(DispatchError::RecipientNotFound(user_id)),
            Some((None, _)) => Err(DispatchError::NoAddress(user_id)),
            Some((Some(email), display_name)) => Ok(Recipient {
                email,
                display_name,
            }),
        }
    }
}
