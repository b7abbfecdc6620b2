//! OAuth token exchange and stored-credential lookups
//!
//! Refresh tokens live in the `auth` table, one row per account email.
//! Access tokens are minted per invocation from the stored refresh
//! token and passed explicitly to each API client.

use anyhow::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use tokio_rusqlite::Connection;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes covering mail reads, sheet appends, and the Vision/Storage
/// calls, so one user credential serves every outbound call.
pub const OAUTH_SCOPES: &str = "https://www.googleapis.com/auth/gmail.modify https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/cloud-platform";

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

/// Exchange an authorization code for tokens. Only used by the `auth`
/// CLI flow; the response's refresh token is what gets persisted.
pub async fn exchange_code_for_token(
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<OAuthToken> {
    let client = Client::new();
    let res = client
        .post(TOKEN_URL)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("Code exchange failed: {} ({})", status, text);
    }
    let token: OAuthToken = serde_json::from_str(&text)?;
    Ok(token)
}

/// Mint a fresh access token from a stored refresh token.
pub async fn refresh_access_token(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<OAuthToken> {
    let client = Client::new();
    let res = client
        .post(TOKEN_URL)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("Token refresh failed: {} ({})", status, text);
    }
    let token: OAuthToken = serde_json::from_str(&text)?;
    Ok(token)
}

pub async fn save_refresh_token(
    db: &Connection,
    email: &str,
    service: &str,
    refresh_token: &str,
) -> Result<()> {
    let email = email.to_string();
    let service = service.to_string();
    let refresh_token = refresh_token.to_string();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO auth (id, service, refresh_token) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET service = excluded.service, refresh_token = excluded.refresh_token",
            (&email, &service, &refresh_token),
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn find_refresh_token(db: &Connection, email: &str) -> Result<Option<String>> {
    use rusqlite::OptionalExtension;

    let email = email.to_string();
    let token = db
        .call(move |conn| {
            let result = conn
                .prepare("SELECT refresh_token FROM auth WHERE id = ?1")
                .and_then(|mut stmt| stmt.query_row([&email], |row| row.get(0)).optional())?;
            Ok(result)
        })
        .await?;
    Ok(token)
}

pub async fn find_all_gmail_auth_emails(db: &Connection) -> Result<Vec<String>, Error> {
    let emails = db.call(|conn| {
        let mut stmt = conn.prepare("SELECT id FROM auth WHERE service = 'gmail'")?;
        let rows = stmt
            .query_map([], |row| row.get(0))?
            .filter_map(Result::ok)
            .collect::<Vec<String>>();
        Ok(rows)
    });
    Ok(emails.await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::{async_db, initialize_db};

    async fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let db = async_db(dir.path().to_str().unwrap()).await.unwrap();
        db.call(|conn| Ok(initialize_db(conn)?)).await.unwrap();
        (dir, db)
    }

    #[test]
    fn test_token_response_parsing() {
        let json = r#"{
            "access_token": "ya29.a0AfH6",
            "expires_in": 3599,
            "refresh_token": "1//0gabcdef",
            "scope": "https://www.googleapis.com/auth/gmail.modify",
            "token_type": "Bearer"
        }"#;
        let token: OAuthToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "ya29.a0AfH6");
        assert_eq!(token.refresh_token.as_deref(), Some("1//0gabcdef"));
        assert_eq!(token.expires_in, Some(3599));
    }

    #[test]
    fn test_refresh_response_has_no_refresh_token() {
        let json = r#"{"access_token": "ya29.fresh", "expires_in": 3599, "token_type": "Bearer"}"#;
        let token: OAuthToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.refresh_token, None);
    }

    #[tokio::test]
    async fn test_save_and_find_refresh_token() {
        let (_dir, db) = test_db().await;

        assert_eq!(find_refresh_token(&db, "a@x.com").await.unwrap(), None);

        save_refresh_token(&db, "a@x.com", "gmail", "tok_1")
            .await
            .unwrap();
        assert_eq!(
            find_refresh_token(&db, "a@x.com").await.unwrap().as_deref(),
            Some("tok_1")
        );

        // Re-authorizing replaces the stored token
        save_refresh_token(&db, "a@x.com", "gmail", "tok_2")
            .await
            .unwrap();
        assert_eq!(
            find_refresh_token(&db, "a@x.com").await.unwrap().as_deref(),
            Some("tok_2")
        );
    }

    #[tokio::test]
    async fn test_find_all_gmail_auth_emails() {
        let (_dir, db) = test_db().await;
        save_refresh_token(&db, "a@x.com", "gmail", "tok_a")
            .await
            .unwrap();
        save_refresh_token(&db, "b@x.com", "gmail", "tok_b")
            .await
            .unwrap();

        let mut emails = find_all_gmail_auth_emails(&db).await.unwrap();
        emails.sort();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);
    }
}
