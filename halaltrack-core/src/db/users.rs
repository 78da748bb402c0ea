use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

use super::{fmt_time, parse_enum, parse_time, parse_uuid, Database};
use crate::models::{CreateUserInput, Role, Session, UserAccount};

/// Usernames sign in through a synthetic address on this domain.
pub const EMAIL_DOMAIN: &str = "halaltrack.com";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("username must be 1-64 characters of letters, digits, '.', '_' or '-'")]
    InvalidUsername,
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub fn synthetic_email(username: &str) -> String {
    format!("{}@{}", username.trim().to_lowercase(), EMAIL_DOMAIN)
}

fn valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= 64
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Sessions older than this are treated as signed out.
pub const SESSION_TTL_DAYS: i64 = 30;

/// Argon2id hash in PHC string form; the salt is embedded.
fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to encode salt: {}", e))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

fn session_cutoff(now: DateTime<Utc>) -> String {
    fmt_time(now - Duration::days(SESSION_TTL_DAYS))
}

impl Database {
    /// Provision a credential plus its profile row.
    pub fn sign_up(&self, input: CreateUserInput) -> Result<UserAccount, AuthError> {
        let username = input.username.trim().to_string();
        if !valid_username(&username) {
            return Err(AuthError::InvalidUsername);
        }
        if input.password.is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        let mut conn = self.lock()?;
        let email = synthetic_email(&username);
        let taken: Option<String> = conn
            .query_row(
                "SELECT id FROM credentials WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(AuthError::UsernameTaken(username));
        }

        let account = UserAccount {
            id: Uuid::new_v4(),
            username,
            role: input.role,
            created_at: Utc::now(),
        };
        let password_hash = hash_password(&input.password)?;

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO credentials (id, username, email, password_hash, role_meta, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                account.id.to_string(),
                account.username,
                email,
                password_hash,
                account.role.as_str(),
                fmt_time(account.created_at),
            ],
        )?;
        insert_profile(&tx, &account)?;
        tx.commit()?;

        tracing::info!("Created {} account '{}'", account.role.as_str(), account.username);
        Ok(account)
    }

    pub fn sign_in(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let conn = self.lock()?;
        let credential: Option<(String, String)> = conn
            .query_row(
                "SELECT id, password_hash FROM credentials WHERE email = ?1",
                params![synthetic_email(username)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((id, stored_hash)) = credential else {
            tracing::warn!("Sign-in failed for unknown user '{}'", username.trim());
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(password, &stored_hash) {
            tracing::warn!("Sign-in failed for '{}': wrong password", username.trim());
            return Err(AuthError::InvalidCredentials);
        }

        let user_id = parse_uuid(0, id)?;
        let user = resolve_profile(&conn, user_id)?.ok_or(AuthError::InvalidCredentials)?;

        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            user,
            created_at: Utc::now(),
        };
        conn.execute(
            "DELETE FROM sessions WHERE created_at < ?1",
            params![session_cutoff(session.created_at)],
        )?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![session.token, user_id.to_string(), fmt_time(session.created_at)],
        )?;

        tracing::info!("User '{}' signed in", session.user.username);
        Ok(session)
    }

    /// Invalidate a session. Returns whether it existed.
    pub fn sign_out(&self, token: &str) -> anyhow::Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
            Ok(removed > 0)
        })
    }

    /// The account behind a session token, if the session is live.
    ///
    /// Sessions older than [`SESSION_TTL_DAYS`] are deleted on lookup.
    pub fn session_user(&self, token: &str) -> anyhow::Result<Option<UserAccount>> {
        self.with_conn(|conn| {
            let session: Option<(String, String)> = conn
                .query_row(
                    "SELECT user_id, created_at FROM sessions WHERE token = ?1",
                    params![token],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((user_id, created_at)) = session else {
                return Ok(None);
            };
            if created_at < session_cutoff(Utc::now()) {
                conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
                tracing::debug!("Session for user {} expired", user_id);
                return Ok(None);
            }
            Ok(resolve_profile(conn, parse_uuid(0, user_id)?)?)
        })
    }

    pub fn list_users(&self) -> anyhow::Result<Vec<UserAccount>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, role, created_at FROM profiles ORDER BY created_at",
            )?;
            let users = stmt
                .query_map([], profile_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }

    pub fn get_user(&self, id: Uuid) -> anyhow::Result<Option<UserAccount>> {
        self.with_conn(|conn| resolve_profile(conn, id))
    }

    /// Remove an account with its profile and sessions.
    pub fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM credentials WHERE id = ?1", params![id.to_string()])?;
            if deleted > 0 {
                tracing::info!("Deleted user {}", id);
            }
            Ok(deleted > 0)
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, AuthError> {
        self.conn
            .lock()
            .map_err(|e| AuthError::Other(anyhow::anyhow!("Database lock poisoned: {}", e)))
    }
}

fn insert_profile(conn: &Connection, account: &UserAccount) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO profiles (id, username, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            account.id.to_string(),
            account.username,
            account.role.as_str(),
            fmt_time(account.created_at),
        ],
    )?;
    Ok(())
}

/// Load the profile for a credential, rebuilding it from the credential's
/// sign-up metadata when the profile row is missing.
fn resolve_profile(conn: &Connection, id: Uuid) -> anyhow::Result<Option<UserAccount>> {
    let profile = conn
        .query_row(
            "SELECT id, username, role, created_at FROM profiles WHERE id = ?1",
            params![id.to_string()],
            profile_from_row,
        )
        .optional()?;
    if profile.is_some() {
        return Ok(profile);
    }

    let credential: Option<(String, String, String)> = conn
        .query_row(
            "SELECT username, role_meta, created_at FROM credentials WHERE id = ?1",
            params![id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    let Some((username, role_meta, created_at)) = credential else {
        return Ok(None);
    };

    let account = UserAccount {
        id,
        username,
        role: Role::from_str(&role_meta).unwrap_or(Role::User),
        created_at: parse_time(2, created_at)?,
    };
    insert_profile(conn, &account)?;
    tracing::warn!("Profile for '{}' was missing; rebuilt from credential", account.username);
    Ok(Some(account))
}

fn profile_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserAccount> {
    let created_at: DateTime<Utc> = parse_time(3, row.get(3)?)?;
    Ok(UserAccount {
        id: parse_uuid(0, row.get(0)?)?,
        username: row.get(1)?,
        role: parse_enum(2, row.get(2)?, Role::from_str)?,
        created_at,
    })
}
