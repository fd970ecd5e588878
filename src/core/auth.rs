use crate::core::{AppError, AppState};
use crate::entities::User;
use crate::repositories::{UnitOfWork, UserRepository};
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: i32,
    pub username: String,
}

/// Il login è gestito da un servizio esterno: qui il token viene solo firmato
/// (tool di sviluppo e test) e verificato.
#[instrument(skip(secret), fields(username = %username, id = %id))]
pub fn encode_jwt(username: String, id: i32, secret: &str) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let expire: chrono::TimeDelta = Duration::hours(24);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        username,
        id,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    debug!("Decoding JWT token");
    decode(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// Verifica il bearer token e inserisce l'utente corrente (`User`) nelle extension
#[instrument(skip(state, req, next))]
pub async fn authentication_middleware<U: UnitOfWork>(
    State(state): State<Arc<AppState<U>>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    // 1. header Authorization: Bearer <token>
    let auth_header = match req.headers().get(http::header::AUTHORIZATION) {
        Some(header) => header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::unauthorized("Invalid authorization header")
        })?,
        None => {
            warn!("Missing authorization header");
            return Err(AppError::unauthorized(
                "Please add the JWT token to the header",
            ));
        }
    };
    let mut header = auth_header.split_whitespace();
    let token = match (header.next(), header.next()) {
        (Some("Bearer"), Some(token)) => token,
        _ => {
            warn!("Malformed bearer token");
            return Err(AppError::unauthorized("Malformed bearer token"));
        }
    };

    // 2. verifica della firma e della scadenza
    let token_data = decode_jwt(token, &state.jwt_secret)
        .map_err(|_| AppError::unauthorized("Unable to decode token"))?;

    // 3. l'utente deve esistere; la connessione viene rilasciata prima di proseguire
    let current_user: User = {
        let mut conn = state.store.connect().await?;
        match conn.read_user(token_data.claims.id).await? {
            Some(user) => user,
            None => {
                warn!("User not found in database: {}", token_data.claims.id);
                return Err(AppError::unauthorized("You are not an authorized user"));
            }
        }
    };
    info!("User authenticated: {}", current_user.username);

    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}
