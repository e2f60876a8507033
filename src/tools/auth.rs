//! Authentication tool catalog.
//!
//! Four tools let the model drive authentication: `check_auth_status`,
//! `login`, `get_user_info` and `logout`. Every outcome the model should be
//! able to talk about (already signed in, wrong password, ...) is a normal
//! payload; only broken arguments surface as a [`ToolError`].

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::{ParameterSchema, Tool, ToolContext, ToolError, ToolHandler, ToolRegistry};
use crate::session::{AuthError, Session};
use crate::Result;

pub const CHECK_AUTH_STATUS: &str = "check_auth_status";
pub const LOGIN: &str = "login";
pub const GET_USER_INFO: &str = "get_user_info";
pub const LOGOUT: &str = "logout";

/// The catalog, in the order it is offered to the model.
pub fn auth_tools() -> Vec<Tool> {
    vec![
        Tool::new(
            CHECK_AUTH_STATUS,
            "Check if the user is currently authenticated",
            ParameterSchema::object(),
            Arc::new(CheckAuthStatus),
        ),
        Tool::new(
            LOGIN,
            "Submit user credentials for authentication. Use this after getting email and password from the user.",
            ParameterSchema::object()
                .required_property("email", "string", "The user's email address")
                .required_property("password", "string", "The user's password"),
            Arc::new(Login),
        ),
        Tool::new(
            GET_USER_INFO,
            "Get the authenticated user's personal information. Only use if the user is authenticated.",
            ParameterSchema::object(),
            Arc::new(GetUserInfo),
        )
        .requires_auth(),
        Tool::new(
            LOGOUT,
            "Log the user out of their account",
            ParameterSchema::object(),
            Arc::new(Logout),
        )
        .requires_auth(),
    ]
}

/// Registry holding exactly the auth catalog.
pub fn auth_registry() -> Result<ToolRegistry> {
    ToolRegistry::builder().register_all(auth_tools()).build()
}

fn user_summary(session: &Session) -> Value {
    json!({
        "name": session.user.name,
        "email": session.user.email,
    })
}

struct CheckAuthStatus;

#[async_trait]
impl ToolHandler for CheckAuthStatus {
    async fn call(&self, _args: Value, ctx: &ToolContext) -> std::result::Result<Value, ToolError> {
        Ok(match ctx.session().current_session().await {
            Some(session) => json!({
                "authenticated": true,
                "user": user_summary(&session),
            }),
            None => json!({
                "authenticated": false,
                "message": "User is not authenticated. To login, ask for their email and password, then use the login tool.",
            }),
        })
    }
}

#[derive(Debug, Deserialize)]
struct LoginArgs {
    email: String,
    password: String,
}

struct Login;

#[async_trait]
impl ToolHandler for Login {
    async fn call(&self, args: Value, ctx: &ToolContext) -> std::result::Result<Value, ToolError> {
        let LoginArgs { email, password } = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        info!(
            email = %email,
            password_provided = !password.is_empty(),
            "login attempt"
        );

        let store = ctx.session();
        if let Some(session) = store.current_session().await {
            info!("user already authenticated");
            return Ok(json!({
                "status": "already_authenticated",
                "message": "User is already logged in.",
                "user": user_summary(&session),
            }));
        }

        match store.sign_in(&email, &password).await {
            Ok(session) => {
                info!(email = %email, "login successful");
                Ok(json!({
                    "success": true,
                    "message": "Login successful! The user is now authenticated.",
                    "user": user_summary(&session),
                }))
            }
            Err(AuthError::CredentialsRejected) => {
                info!(email = %email, "login failed: invalid credentials");
                let mut payload = json!({
                    "success": false,
                    "message": "Invalid credentials. Please try again.",
                });
                if let Some(hint) = store.credential_hint() {
                    payload["hint"] = Value::String(hint);
                }
                Ok(payload)
            }
            Err(err) => {
                warn!(error = %err, "sign-in backend failed");
                Ok(json!({
                    "success": false,
                    "message": "Authentication system error",
                    "error": err.to_string(),
                }))
            }
        }
    }
}

struct GetUserInfo;

#[async_trait]
impl ToolHandler for GetUserInfo {
    async fn call(&self, _args: Value, ctx: &ToolContext) -> std::result::Result<Value, ToolError> {
        let Some(session) = ctx.session().current_session().await else {
            return Ok(json!({
                "error": "not_authenticated",
                "message": "The user must be logged in to access personal information.",
                "suggestion": "Please use the login tool to authenticate first.",
            }));
        };

        let user = &session.user;
        Ok(json!({
            "profile": {
                "name": user.name.as_deref().unwrap_or("Demo User"),
                "email": user.email.as_deref().unwrap_or("user@example.com"),
                "id": user.id,
            },
            "account": {
                "type": "Premium",
                "status": "Active",
                "member_since": "January 15, 2023",
                "subscription": {
                    "plan": "Premium Annual",
                    "price": "$99/year",
                    "next_billing_date": "January 15, 2025",
                    "features": ["Unlimited access", "Priority support", "Advanced analytics"],
                },
            },
            "preferences": {
                "theme": "Dark",
                "notifications": true,
                "language": "English",
                "timezone": "UTC-8 (Pacific Time)",
            },
            "activity": {
                "last_login": Utc::now().to_rfc3339(),
                "login_count": 42,
                "last_actions": [
                    "Updated profile picture",
                    "Changed notification settings",
                    "Viewed account summary",
                ],
            },
        }))
    }
}

struct Logout;

#[async_trait]
impl ToolHandler for Logout {
    async fn call(&self, _args: Value, ctx: &ToolContext) -> std::result::Result<Value, ToolError> {
        let store = ctx.session();
        if store.current_session().await.is_none() {
            return Ok(json!({
                "status": "not_authenticated",
                "message": "User is not currently logged in.",
            }));
        }

        store
            .sign_out()
            .await
            .map_err(|e| ToolError::handler(e.to_string()))?;
        Ok(json!({
            "status": "success",
            "message": "The user has been logged out.",
            "redirect_url": "/api/auth/signout",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{InMemorySessionStore, SessionStore, DEMO_EMAIL, DEMO_PASSWORD};

    fn ctx() -> (Arc<InMemorySessionStore>, ToolContext) {
        let store = Arc::new(InMemorySessionStore::demo());
        (store.clone(), ToolContext::new(store))
    }

    #[test]
    fn test_catalog_order() {
        let registry = auth_registry().unwrap();
        assert_eq!(
            registry.names(),
            vec![CHECK_AUTH_STATUS, LOGIN, GET_USER_INFO, LOGOUT]
        );
        let anon: Vec<_> = registry
            .tools_for_context(false)
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(anon, vec![CHECK_AUTH_STATUS, LOGIN]);
    }

    #[tokio::test]
    async fn test_check_status_reflects_session() {
        let (store, ctx) = ctx();
        let out = CheckAuthStatus.call(json!({}), &ctx).await.unwrap();
        assert_eq!(out["authenticated"], false);

        store.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        let out = CheckAuthStatus.call(json!({}), &ctx).await.unwrap();
        assert_eq!(out["authenticated"], true);
        assert_eq!(out["user"]["email"], DEMO_EMAIL);
    }

    #[tokio::test]
    async fn test_login_missing_password_is_argument_error() {
        let (_, ctx) = ctx();
        let err = Login
            .call(json!({ "email": DEMO_EMAIL }), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_is_reported() {
        #[derive(Debug)]
        struct Broken;

        #[async_trait]
        impl SessionStore for Broken {
            async fn current_session(&self) -> Option<Session> {
                None
            }
            async fn sign_in(&self, _: &str, _: &str) -> std::result::Result<Session, AuthError> {
                Err(AuthError::Backend("jwt secret missing".into()))
            }
            async fn sign_out(&self) -> std::result::Result<(), AuthError> {
                Ok(())
            }
        }

        let ctx = ToolContext::new(Arc::new(Broken));
        let out = Login
            .call(json!({ "email": DEMO_EMAIL, "password": DEMO_PASSWORD }), &ctx)
            .await
            .unwrap();
        assert_eq!(out["success"], false);
        assert_eq!(out["message"], "Authentication system error");
        assert!(out["error"].as_str().unwrap().contains("jwt secret missing"));
    }

    #[tokio::test]
    async fn test_user_info_requires_session() {
        let (store, ctx) = ctx();
        let out = GetUserInfo.call(json!({}), &ctx).await.unwrap();
        assert_eq!(out["error"], "not_authenticated");

        store.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        let out = GetUserInfo.call(json!({}), &ctx).await.unwrap();
        assert_eq!(out["profile"]["name"], "Demo User");
        assert_eq!(out["profile"]["id"], "1");
        assert!(out["activity"]["last_login"].is_string());
    }

    #[tokio::test]
    async fn test_logout_signs_out() {
        let (store, ctx) = ctx();
        let out = Logout.call(json!({}), &ctx).await.unwrap();
        assert_eq!(out["status"], "not_authenticated");

        store.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap();
        let out = Logout.call(json!({}), &ctx).await.unwrap();
        assert_eq!(out["status"], "success");
        assert_eq!(out["redirect_url"], "/api/auth/signout");
        assert!(store.current_session().await.is_none());
    }
}
