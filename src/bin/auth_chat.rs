//! auth-chat: terminal front end for the authentication assistant.
//!
//! Usage:
//!   auth-chat chat [--provider <id>] [--model <name>]   Interactive conversation
//!   auth-chat tools [--authenticated]                   List the tool catalog
//!   auth-chat call <name> [<json-args>]                 Run one tool directly
//!   auth-chat replay <file>                             Process a saved router envelope
//!   auth-chat providers                                 List configured providers

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use llm_auth_router::chat::{prompt::system_message, welcome_message, ChatService};
use llm_auth_router::config::RouterConfig;
use llm_auth_router::session::{InMemorySessionStore, SessionStore};
use llm_auth_router::tools::{auth::auth_registry, ToolContext, ToolDispatcher};
use llm_auth_router::{logging, LlmRouter, Message, MessageRole, ToolCall};

/// Tool rounds allowed per user line before control returns to the user.
const MAX_ROUNDS: usize = 4;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Talk to the assistant
    Chat {
        /// Provider id (defaults to the configured default)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model name (defaults to the configured default)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print the tool catalog as JSON
    Tools {
        /// Show the tools offered to a signed-in user
        #[arg(long)]
        authenticated: bool,
    },

    /// Execute a single tool call against the demo session store
    Call {
        name: String,

        /// JSON-encoded arguments
        #[arg(default_value = "{}")]
        arguments: String,
    },

    /// Feed a saved router reply through the tool dispatcher
    Replay { file: PathBuf },

    /// List providers and their models
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = RouterConfig::from_env().context("loading configuration")?;
    let registry = Arc::new(auth_registry()?);
    let session = Arc::new(InMemorySessionStore::demo());
    let ctx = ToolContext::new(session.clone());

    match args.command {
        Command::Chat { provider, model } => {
            let provider = provider.unwrap_or_else(|| config.default_provider.clone());
            let model = model.unwrap_or_else(|| config.default_model.clone());
            let router = LlmRouter::from_config(&config, registry)?;
            let service = ChatService::new(Arc::new(router));
            run_chat(&service, session.as_ref(), &ctx, &provider, &model).await
        }
        Command::Tools { authenticated } => {
            let tools: Vec<_> = registry
                .tools_for_context(authenticated)
                .into_iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters.to_value(),
                        "requiresAuth": t.requires_auth,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&tools)?);
            Ok(())
        }
        Command::Call { name, arguments } => {
            let dispatcher = ToolDispatcher::new(registry, ctx);
            let call = ToolCall::new(format!("cli_{}", uuid::Uuid::new_v4()), name, arguments);
            let result = dispatcher.execute(&call).await;
            println!("{}", serde_json::to_string_pretty(&result.payload())?);
            if result.is_error() {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Replay { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let router = LlmRouter::from_config(&config, registry)?;
            let service = ChatService::new(Arc::new(router));
            let reply = service.ingest_envelope(&raw, &ctx).await;
            for m in &reply.messages {
                print_message(m);
            }
            Ok(())
        }
        Command::Providers => {
            let router = LlmRouter::from_config(&config, registry)?;
            for p in router.providers() {
                let marker = if p.id == config.default_provider { "*" } else { " " };
                let tools = if p.supports_tools { "" } else { " (no tool support)" };
                println!("{} {} - {}{}", marker, p.id, p.name, tools);
                for m in &p.models {
                    println!("      {}", m);
                }
            }
            Ok(())
        }
    }
}

async fn run_chat(
    service: &ChatService,
    session: &dyn SessionStore,
    ctx: &ToolContext,
    provider: &str,
    model: &str,
) -> Result<()> {
    let welcome = welcome_message(session.current_session().await.as_ref());
    print_message(&welcome);
    let mut history = vec![system_message(), welcome];

    eprintln!("[{} / {}] type 'exit' to quit", provider, model);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        history.push(Message::user(line));
        match service
            .converse(&mut history, provider, model, ctx, MAX_ROUNDS)
            .await
        {
            Ok(added) => added.iter().for_each(print_message),
            Err(err) => {
                // Drop the line so the next attempt starts from a clean history.
                history.pop();
                eprintln!("error: {}", err);
            }
        }
    }
    Ok(())
}

fn print_message(m: &Message) {
    match m.role {
        MessageRole::Assistant => {
            if !m.content.is_empty() {
                println!("assistant> {}", m.content);
            }
            for call in m.tool_calls() {
                println!("  -> {}({})", call.name(), call.function.arguments);
            }
        }
        MessageRole::Tool => println!("  <- {}", m.content),
        _ => println!("{}> {}", m.role.as_str(), m.content),
    }
}
