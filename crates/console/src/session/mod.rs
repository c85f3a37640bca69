//! Live-agent chat session
//!
//! One `Session` per active agent console: a broker connection, the
//! coordinator state machine, and the dispatch loop that serializes
//! inbound broker frames and user actions onto a single thread of control.
//! Reconnection runs on a fixed delay, indefinitely, until the session is
//! shut down.

pub mod ack;
pub mod connection;
pub mod coordinator;
pub mod events;
pub mod handoff;
pub mod ledger;
pub mod log;
pub mod tasks;

pub use connection::ConnectionManager;
pub use coordinator::{Coordinator, SessionIdentity};
pub use events::{BrokerEvent, Command, Notice};

use relaydesk_stomp::{AckMode, Frame, SessionEvent, StompError};
use tokio::sync::mpsc;
use tokio_retry::strategy::FixedInterval;

use crate::config::Config;
use events::topics;

/// Actions flowing from the console UI into the session
#[derive(Debug)]
pub enum UserAction {
    /// View a customer, claiming them for this agent
    Select(String),
    /// Release the currently viewed customer back to the pool
    DropSelected,
    /// Send a chat message to the selected customer
    Say(String),
    /// Print the customer roster and conversation view
    ShowRoster,
    /// End the session
    Quit,
}

/// Execute a coordinator transition's commands: publishes go through the
/// connection manager (queued while disconnected), notices are rendered
/// as non-blocking notifications.
pub fn execute(commands: Vec<Command>, conn: &mut ConnectionManager) {
    for command in commands {
        match command {
            Command::Publish { destination, body } => {
                conn.dispatch(Frame::send_text(&destination, body));
            }
            Command::Notice(notice) => render_notice(&notice),
        }
    }
}

fn render_notice(notice: &Notice) {
    match notice {
        Notice::Info(text) => tracing::info!("{text}"),
        Notice::Warn(text) => tracing::warn!("{text}"),
    }
}

enum LoopOutcome {
    Reconnect,
    Quit,
}

/// Run one agent session until the user quits. The broker connection is
/// re-established on a fixed delay after any transport failure; user
/// actions issued while disconnected still mutate the coordinator and
/// their frames queue for the next connect.
pub async fn run_session(config: &Config, mut actions: mpsc::UnboundedReceiver<UserAction>) {
    let identity = SessionIdentity {
        tenant_id: config.tenant_id.clone(),
        agent_id: config.agent_id.clone(),
        agent_name: config.agent_name.clone(),
    };
    let mut coordinator = Coordinator::new(identity, config.forget_dropped_customers);
    let mut conn = ConnectionManager::new();

    loop {
        // --- connect, retrying indefinitely on a fixed delay ---
        let mut delays = FixedInterval::new(config.reconnect_delay);
        let (mut broker, mut inbound) = loop {
            match relaydesk_stomp::connect(&config.broker_url).await {
                Ok(pair) => break pair,
                Err(e) => {
                    let delay = delays.next().unwrap_or(config.reconnect_delay);
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Broker unreachable; disconnected"
                    );
                    let sleep = tokio::time::sleep(delay);
                    tokio::pin!(sleep);
                    loop {
                        tokio::select! {
                            _ = &mut sleep => break,
                            action = actions.recv() => {
                                if handle_action(action, &mut coordinator, &mut conn) {
                                    conn.shutdown();
                                    return;
                                }
                            }
                        }
                    }
                }
            }
        };

        // --- session establishment: subscriptions, JOIN, queued frames ---
        if let Err(e) = establish(&mut broker, &coordinator, &config.tenant_id) {
            tracing::warn!(error = %e, "Session establishment failed");
            continue;
        }
        conn.attach(broker.sender());
        tracing::info!(
            tenant_id = %config.tenant_id,
            agent_id = %config.agent_id,
            "Connected to broker"
        );

        // --- single-threaded dispatch: broker frames and user actions ---
        let outcome = loop {
            tokio::select! {
                event = inbound.recv() => match event {
                    None | Some(SessionEvent::Closed) => break LoopOutcome::Reconnect,
                    Some(SessionEvent::ProtocolError { message, body }) => {
                        // Non-fatal: the connection stays nominally active
                        tracing::warn!(message = %message, body = %body, "Broker reported error");
                        render_notice(&Notice::Warn(format!("broker error: {message}")));
                    }
                    Some(SessionEvent::Message(msg)) => match events::decode(msg) {
                        Ok(event) => {
                            render_inbound(&coordinator, &event);
                            let commands = coordinator.handle_event(event);
                            execute(commands, &mut conn);
                        }
                        Err(e) => tracing::warn!(error = %e, "Dropping undecodable frame"),
                    },
                },
                action = actions.recv() => {
                    if handle_action(action, &mut coordinator, &mut conn) {
                        break LoopOutcome::Quit;
                    }
                }
            }
        };

        match outcome {
            LoopOutcome::Reconnect => {
                conn.detach();
                coordinator.on_disconnect();
                tracing::warn!("Broker connection lost; disconnected");
            }
            LoopOutcome::Quit => {
                // handle_action has already dropped the selection; now
                // deactivate the transport and discard unsent frames
                if let Err(e) = broker.disconnect() {
                    tracing::debug!(error = %e, "Broker already gone at disconnect");
                }
                conn.shutdown();
                return;
            }
        }
    }
}

/// Subscribe to the tenant topics and announce this agent. The waiting
/// topic uses client-individual ack for at-least-once delivery.
fn establish(
    broker: &mut relaydesk_stomp::BrokerSession,
    coordinator: &Coordinator,
    tenant_id: &str,
) -> Result<(), StompError> {
    broker.subscribe(&topics::scoped(tenant_id, topics::NEW_CUSTOMER), AckMode::Auto)?;
    broker.subscribe(&topics::scoped(tenant_id, topics::CUSTOMER_MESSAGE), AckMode::Auto)?;
    broker.subscribe(
        &topics::scoped(tenant_id, topics::CUSTOMER_WAITING),
        AckMode::ClientIndividual,
    )?;

    // JOIN goes out ahead of any frames queued while disconnected
    for command in coordinator.join_announcement() {
        if let Command::Publish { destination, body } = command {
            broker.send(Frame::send_text(&destination, body))?;
        }
    }
    Ok(())
}

/// Apply one user action; returns true when the session should end
fn handle_action(
    action: Option<UserAction>,
    coordinator: &mut Coordinator,
    conn: &mut ConnectionManager,
) -> bool {
    match action {
        None | Some(UserAction::Quit) => {
            execute(coordinator.shutdown(), conn);
            return true;
        }
        Some(UserAction::Select(customer_id)) => {
            execute(coordinator.select_customer(&customer_id), conn);
            for message in coordinator.conversation() {
                print_message(coordinator, message);
            }
        }
        Some(UserAction::DropSelected) => {
            execute(coordinator.drop_selected(), conn);
        }
        Some(UserAction::Say(text)) => {
            execute(coordinator.send_message(&text), conn);
        }
        Some(UserAction::ShowRoster) => {
            print_roster(coordinator);
        }
    }
    false
}

/// Print a just-arrived message when it belongs to the active conversation
fn render_inbound(coordinator: &Coordinator, event: &BrokerEvent) {
    if let BrokerEvent::CustomerMessage(message) = event {
        if coordinator.selected() == Some(message.sender.as_str()) {
            print_message(coordinator, message);
        }
    }
}

fn print_message(coordinator: &Coordinator, message: &relaydesk_shared::ChatMessage) {
    let who = if message.sender == coordinator.identity().agent_id {
        "you"
    } else {
        message.sender.as_str()
    };
    println!("[{who}] {}", message.content.as_deref().unwrap_or(""));
}

fn print_roster(coordinator: &Coordinator) {
    println!("customers:");
    for (customer, presence) in coordinator.roster() {
        let marker = if coordinator.selected() == Some(customer) {
            "*"
        } else {
            " "
        };
        println!("  {marker} {customer} ({presence:?})");
    }
}
