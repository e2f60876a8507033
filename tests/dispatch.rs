//! Auth tools driven through the dispatcher against the demo session store.

use std::sync::Arc;

use serde_json::json;

use llm_auth_router::session::{InMemorySessionStore, SessionStore};
use llm_auth_router::tools::auth::{auth_tools, auth_registry};
use llm_auth_router::tools::{
    handler_fn, ParameterSchema, Tool, ToolContext, ToolDispatcher, ToolError, ToolRegistry,
};
use llm_auth_router::ToolCall;

fn demo() -> (Arc<InMemorySessionStore>, ToolDispatcher) {
    let store = Arc::new(InMemorySessionStore::demo());
    let dispatcher = ToolDispatcher::new(
        Arc::new(auth_registry().unwrap()),
        ToolContext::new(store.clone()),
    );
    (store, dispatcher)
}

fn login(id: &str, email: &str, password: &str) -> ToolCall {
    ToolCall::new(
        id,
        "login",
        json!({ "email": email, "password": password }).to_string(),
    )
}

#[tokio::test]
async fn test_login_then_already_authenticated() {
    let (store, dispatcher) = demo();

    let first = dispatcher
        .execute(&login("c1", "user@example.com", "password123"))
        .await;
    assert_eq!(first.tool_call_id, "c1");
    assert!(!first.is_error());
    assert_eq!(first.payload()["success"], true);
    assert_eq!(first.payload()["user"]["email"], "user@example.com");
    assert!(store.current_session().await.is_some());

    let second = dispatcher
        .execute(&login("c2", "user@example.com", "password123"))
        .await;
    assert_eq!(second.payload()["status"], "already_authenticated");
}

#[tokio::test]
async fn test_wrong_password_leaves_no_session() {
    let (store, dispatcher) = demo();
    let result = dispatcher
        .execute(&login("c1", "user@example.com", "wrong-password"))
        .await;
    assert_eq!(result.payload()["success"], false);
    assert_eq!(
        result.payload()["message"],
        "Invalid credentials. Please try again."
    );
    assert!(result.payload()["hint"]
        .as_str()
        .unwrap()
        .contains("user@example.com"));
    assert!(store.current_session().await.is_none());
}

#[tokio::test]
async fn test_user_info_requires_session() {
    let (_store, dispatcher) = demo();
    let info = ToolCall::new("c1", "get_user_info", "{}");

    let before = dispatcher.execute(&info).await;
    assert_eq!(before.payload()["error"], "not_authenticated");

    dispatcher
        .execute(&login("c2", "user@example.com", "password123"))
        .await;
    let after = dispatcher.execute(&info).await;
    assert_eq!(after.payload()["profile"]["name"], "Demo User");
    assert!(after.payload()["activity"]["last_login"].is_string());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (store, dispatcher) = demo();
    dispatcher
        .execute(&login("c1", "user@example.com", "password123"))
        .await;

    let out = dispatcher
        .execute(&ToolCall::new("c2", "logout", ""))
        .await;
    assert_eq!(out.payload()["status"], "success");
    assert_eq!(out.payload()["redirect_url"], "/api/auth/signout");
    assert!(store.current_session().await.is_none());

    let status = dispatcher
        .execute(&ToolCall::new("c3", "check_auth_status", "{}"))
        .await;
    assert_eq!(status.payload()["authenticated"], false);
}

#[tokio::test]
async fn test_unknown_tool_names_the_catalog() {
    let (_store, dispatcher) = demo();
    let result = dispatcher
        .execute(&ToolCall::new("c9", "delete_account", "{}"))
        .await;
    assert!(result.is_error());
    assert_eq!(result.tool_call_id, "c9");
    assert_eq!(result.payload()["error"], "Tool 'delete_account' not found");
    assert_eq!(
        result.payload()["available_tools"],
        json!(["check_auth_status", "login", "get_user_info", "logout"])
    );
}

#[tokio::test]
async fn test_batch_keeps_order_and_isolates_failures() {
    let broken = Tool::new(
        "broken",
        "Always fails",
        ParameterSchema::object(),
        handler_fn(|_, _| async { Err(ToolError::handler("backend unavailable")) }),
    );
    let registry = ToolRegistry::builder()
        .register_all(auth_tools())
        .register(broken)
        .build()
        .unwrap();
    let dispatcher = ToolDispatcher::new(
        Arc::new(registry),
        ToolContext::new(Arc::new(InMemorySessionStore::demo())),
    );

    let calls = vec![
        ToolCall::new("a", "check_auth_status", "{}"),
        ToolCall::new("b", "broken", "{}"),
        login("c", "user@example.com", "password123"),
    ];
    let results = dispatcher.execute_all(&calls).await;

    let ids: Vec<_> = results.iter().map(|r| r.tool_call_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert!(!results[0].is_error());
    assert!(results[1].is_error());
    assert_eq!(results[1].payload()["error"], "Tool execution failed");
    assert_eq!(results[1].payload()["details"], "backend unavailable");
    assert_eq!(results[2].payload()["success"], true);
}

#[test]
fn test_unauthenticated_catalog_subset() {
    let registry = auth_registry().unwrap();
    let names = |authed| {
        registry
            .tools_for_context(authed)
            .iter()
            .map(|t| t.name.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(false), vec!["check_auth_status", "login"]);
    assert_eq!(names(true).len(), 4);
}
