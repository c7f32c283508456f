use spots_db::repository;
use spots_db::store::Query;
use spots_types::api::{LoginRequest, RegisterRequest, TokenResponse};
use spots_types::models::{ROLE_USER, User};
use tracing::{info, warn};

use crate::auth::AppStateInner;
use crate::error::{Error, Result};

/// Create an account and sign it in. Email and name must both be unused;
/// the checks are not atomic with the insert.
pub fn register(state: &AppStateInner, req: RegisterRequest) -> Result<TokenResponse> {
    if find_by_email(state, &req.email)?.is_some() {
        return Err(Error::Conflict("email is already registered".into()));
    }
    let same_name = Query::new().eq("name", req.name.as_str()).limit(1);
    if !repository::find_all::<User>(state.store(), &same_name)?.is_empty() {
        return Err(Error::Conflict("name is already taken".into()));
    }

    let password = state
        .passwords
        .hash(&req.password)
        .map_err(|e| Error::Internal(e.to_string()))?;
    let user = User {
        id: String::new(),
        name: req.name,
        email: req.email,
        password,
        role: ROLE_USER.to_string(),
    };
    let user = repository::add(state.store(), user)?;
    info!("Registered user {} ({})", user.name, user.id);
    sign_in(state, &user)
}

pub fn login(state: &AppStateInner, req: LoginRequest) -> Result<TokenResponse> {
    let user = find_by_email(state, &req.email)?
        .ok_or_else(|| Error::Unauthenticated("no account with this email".into()))?;
    if !state.passwords.verify(&req.password, &user.password) {
        warn!("Failed login for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }
    sign_in(state, &user)
}

/// Delete an account. Allowed for the account itself and for admins.
/// Spots and reviews the user created are kept.
pub fn delete(state: &AppStateInner, id: &str, token: &str) -> Result<()> {
    let claims = state.authorizer.authenticate(token)?;
    let user: User = repository::find_by_id(state.store(), id)?;
    claims.authorize_self_or_admin(&user.id)?;

    repository::delete_by_id::<User>(state.store(), id)?;
    info!("Deleted user {} ({})", user.name, user.id);
    Ok(())
}

fn find_by_email(state: &AppStateInner, email: &str) -> Result<Option<User>> {
    let query = Query::new().eq_ignore_case("email", email).limit(1);
    Ok(repository::find_all(state.store(), &query)?.into_iter().next())
}

fn sign_in(state: &AppStateInner, user: &User) -> Result<TokenResponse> {
    let token = state
        .authorizer
        .issue_token(user)
        .map_err(|e| Error::Internal(e.to_string()))?;
    Ok(TokenResponse {
        token,
        local_id: user.id.clone(),
    })
}
