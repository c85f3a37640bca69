//! Agent console binary
//!
//! Interactive terminal front end for a live-agent session: a line-based
//! command loop over stdin drives the session coordinator, while the
//! service clients answer knowledge-base, presence, and AI queries.
//!
//! Commands:
//!   /select <customer>   pick up a customer
//!   /drop                release the selected customer
//!   /roster              list known customers
//!   /active              list customers currently online
//!   /docs                list knowledge-base documents
//!   /kb <doc>            list entries of a document
//!   /kbset <id> <text>   replace the content of an entry
//!   /kbdel <id>          delete an entry
//!   /tenant <alias>      look up a tenant by alias
//!   /ask <question>      query the AI collaborator
//!   /summary <customer>  summarize a customer's conversation
//!   /upload <path>       upload a knowledge-base document
//!   /quit                end the session
//!   anything else        send as a chat message

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing_subscriber::EnvFilter;

use relaydesk_console::clients::{AiClient, ChatClient, TenantClient};
use relaydesk_console::session::tasks::{watch_task_channel, TaskTracker};
use relaydesk_console::session::{run_session, UserAction};
use relaydesk_console::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        tenant_id = %config.tenant_id,
        agent_id = %config.agent_id,
        broker = %config.broker_url,
        "Starting agent console"
    );

    let tenant = TenantClient::new(config.tenant_service_url.clone());
    let chat = ChatClient::new(config.chat_service_url.clone());
    let ai = AiClient::new(config.ai_service_url.clone());
    let tasks = Arc::new(Mutex::new(TaskTracker::new()));

    let (actions, actions_rx) = mpsc::unbounded_channel();
    let session = {
        let config = config.clone();
        tokio::spawn(async move { run_session(&config, actions_rx).await })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        match command {
            "/select" if !rest.is_empty() => {
                actions.send(UserAction::Select(rest.to_string())).ok();
            }
            "/drop" => {
                actions.send(UserAction::DropSelected).ok();
            }
            "/roster" => {
                actions.send(UserAction::ShowRoster).ok();
            }
            "/active" => match chat.active_users(&config.tenant_id).await {
                Ok(users) => {
                    println!("online:");
                    for user in users {
                        println!("  {}", user.user_id);
                    }
                }
                Err(e) => eprintln!("active users unavailable: {e}"),
            },
            "/docs" => match tenant.fetch_doc_names(&config.tenant_id).await {
                Ok(docs) if docs.is_empty() => println!("no documents uploaded yet"),
                Ok(docs) => {
                    println!("documents:");
                    for doc in docs {
                        println!("  {doc}");
                    }
                }
                Err(e) => eprintln!("document list unavailable: {e}"),
            },
            "/kb" if !rest.is_empty() => {
                match tenant.list_kb_entries(&config.tenant_id, rest).await {
                    Ok(entries) => {
                        for entry in entries {
                            println!("[{}] {}", entry.id, entry.content);
                        }
                    }
                    Err(e) => eprintln!("knowledge base unavailable: {e}"),
                }
            }
            "/kbset" if !rest.is_empty() => match rest.split_once(' ') {
                Some((entry_id, content)) if !content.trim().is_empty() => {
                    match tenant
                        .update_kb_entry(&config.tenant_id, entry_id, content.trim())
                        .await
                    {
                        Ok(()) => println!("updated {entry_id}"),
                        Err(e) => eprintln!("update failed: {e}"),
                    }
                }
                _ => eprintln!("usage: /kbset <id> <text>"),
            },
            "/kbdel" if !rest.is_empty() => {
                match tenant.delete_kb_entry(&config.tenant_id, rest).await {
                    Ok(()) => println!("deleted {rest}"),
                    Err(e) => eprintln!("delete failed: {e}"),
                }
            }
            "/tenant" if !rest.is_empty() => match tenant.get_tenant(rest).await {
                Ok(info) => println!(
                    "{} (id {}){}",
                    info.alias,
                    info.tenant_id,
                    info.name.map(|n| format!(": {n}")).unwrap_or_default()
                ),
                Err(e) => eprintln!("tenant lookup failed: {e}"),
            },
            "/ask" if !rest.is_empty() => match ai.rag_query(&config.tenant_id, rest).await {
                Ok(answer) => println!("{answer}"),
                Err(e) => eprintln!("query failed: {e}"),
            },
            "/summary" if !rest.is_empty() => {
                match ai.conversation_summary(&config.tenant_id, rest).await {
                    Ok(summary) => println!("{summary}"),
                    Err(e) => eprintln!("summary failed: {e}"),
                }
            }
            "/upload" if !rest.is_empty() => {
                if let Err(e) = upload(&tenant, &config, &tasks, rest).await {
                    eprintln!("upload failed: {e}");
                }
            }
            "/quit" => {
                actions.send(UserAction::Quit).ok();
                break;
            }
            _ if command.starts_with('/') => {
                eprintln!("unknown command: {command}");
            }
            _ => {
                actions.send(UserAction::Say(line.to_string())).ok();
            }
        }
    }

    // A closed action channel reads as Quit in the session loop, so EOF on
    // stdin also shuts down cleanly
    drop(actions);
    session.await.context("Session task panicked")?;
    Ok(())
}

/// Upload a document and register it with the task tracker. The first
/// pending task opens the completion channel subscription.
async fn upload(
    tenant: &TenantClient,
    config: &Config,
    tasks: &Arc<Mutex<TaskTracker>>,
    path: &str,
) -> anyhow::Result<()> {
    let file_name = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .context("Path has no file name")?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {path}"))?;

    tenant
        .upload_file(&config.tenant_id, &file_name, bytes)
        .await
        .context("Upload rejected")?;
    println!("uploaded {file_name}; indexing in progress");

    let channel_was_idle = tasks.lock().await.add(&file_name);
    if channel_was_idle {
        let broker_url = config.broker_url.clone();
        let tenant_id = config.tenant_id.clone();
        let reconnect_delay = config.reconnect_delay;
        let tracker = Arc::clone(tasks);
        tokio::spawn(async move {
            watch_task_channel(&broker_url, &tenant_id, reconnect_delay, tracker).await;
        });
    }
    Ok(())
}
