//! Inbox Copilot - console driver for the simulated workspace
//!
//! Reads commands from stdin and prints the inbox and copilot panel.
//! Logs go to stderr as JSON.

use inbox_copilot::inbox::{ConversationId, MessageId};
use inbox_copilot::runtime::PanelEvent;
use inbox_copilot::state_machine::Stage;
use inbox_copilot::{Workspace, WorkspaceConfig};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
commands:
  list              conversations, newest first
  open <id>         open a conversation (marks it read)
  read <id> <msg>   mark one message read
  show              messages of the open conversation and the copilot panel
  ask <question>    ask the copilot about the open conversation
  suggest [n]       ask a suggested question
  cancel            dismiss the answer being typed
  insert            put the last answer into the composer
  type <text>       append to the composer
  send              send the composer text
  quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inbox_copilot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Configuration
    let config = WorkspaceConfig::from_env()?;
    let mut workspace = Workspace::from_config(config)?;

    let profile = workspace.profile();
    println!("{} ({}): {}", profile.name, profile.avatar, profile.greeting);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let (command, rest) = line
            .trim()
            .split_once(' ')
            .map_or((line.trim(), ""), |(c, r)| (c, r.trim()));

        match command {
            "" => {}
            "list" => list(&workspace),
            "open" => {
                if workspace.select_conversation(&ConversationId::new(rest)) {
                    show(&workspace);
                } else {
                    println!("no conversation named {rest:?}");
                }
            }
            "read" => {
                let marked = rest
                    .split_once(' ')
                    .and_then(|(id, msg)| Some((id, msg.trim().parse().ok()?)))
                    .is_some_and(|(id, msg)| {
                        workspace.mark_message_read(&ConversationId::new(id), MessageId(msg))
                    });
                if !marked {
                    println!("no unread message {rest:?}");
                }
            }
            "show" => show(&workspace),
            "ask" => {
                let mut panel = workspace.subscribe_panel();
                if workspace.submit_question(rest).await?.is_some() {
                    follow(&mut panel).await;
                } else {
                    println!("open a conversation and ask a non-empty question");
                }
            }
            "suggest" => {
                let index = rest.parse::<usize>().unwrap_or(1).saturating_sub(1);
                let mut panel = workspace.subscribe_panel();
                if workspace.submit_suggestion(index).await?.is_some() {
                    follow(&mut panel).await;
                } else {
                    for (i, question) in workspace.suggestions().iter().enumerate() {
                        println!("  {}. {question}", i + 1);
                    }
                }
            }
            "cancel" => workspace.cancel_copilot().await?,
            "insert" => {
                if workspace.insert_latest_response() && workspace.sync_composer() {
                    println!("composer: {}", workspace.composer().text());
                } else {
                    println!("nothing to insert");
                }
            }
            "type" => {
                workspace.composer_mut().push_str(rest);
                println!("composer: {}", workspace.composer().text());
            }
            "send" => {
                if !workspace.send_composer() {
                    println!("nothing to send");
                }
            }
            "quit" | "exit" => break,
            _ => println!("{HELP}"),
        }
    }

    Ok(())
}

fn list(workspace: &Workspace) {
    let snapshot = workspace.snapshot();
    for conversation in snapshot.newest_first() {
        let preview = conversation
            .last_message()
            .map(|m| m.content().chars().take(48).collect::<String>())
            .unwrap_or_default();
        let unread = conversation.unread_count();
        let marker = if unread > 0 { format!(" ({unread})") } else { String::new() };
        println!("{:<10} {}{marker}: {preview}", conversation.id(), conversation.name());
    }
    println!("total unread: {}", snapshot.total_unread());
}

fn show(workspace: &Workspace) {
    let snapshot = workspace.snapshot();
    let Some(conversation) = workspace
        .active_conversation()
        .and_then(|id| snapshot.conversation(id))
    else {
        println!("no conversation open");
        return;
    };

    println!("== {} ==", conversation.name());
    for message in conversation.thread() {
        println!(
            "[{}] {:?}: {}",
            message.received_time().format("%H:%M"),
            message.sender(),
            message.content()
        );
    }

    let view = workspace.copilot_view();
    println!("-- copilot --");
    if view.show_greeting {
        println!("{}", workspace.profile().instruction);
    }
    if view.dropped > 0 {
        println!("({} earlier notes)", view.dropped);
    }
    for note in &view.history {
        println!("{:?}: {}", note.sender(), note.content());
        for source in note.sources() {
            println!("    source: {}", source.title);
        }
    }
}

/// Print typing frames until the answer is committed or abandoned
async fn follow(panel: &mut tokio::sync::broadcast::Receiver<PanelEvent>) {
    let mut printed = 0;
    loop {
        match panel.recv().await {
            Ok(PanelEvent::Frame(frame)) => {
                if frame.awaiting {
                    print!("Fin is thinking...");
                    let _ = std::io::stdout().flush();
                    continue;
                }
                if frame.stage == Stage::Typing {
                    if printed == 0 {
                        print!("\r                  \r");
                    }
                    let new: String = frame.text.chars().skip(printed).collect();
                    printed += new.chars().count();
                    print!("{new}");
                    let _ = std::io::stdout().flush();
                }
                if frame.stage == Stage::Complete {
                    println!();
                    for source in &frame.sources {
                        println!("    source: {} ({:?})", source.title, source.kind);
                    }
                    if frame.offers_insert {
                        println!("    type `insert` to use this answer");
                    }
                    return;
                }
            }
            Ok(PanelEvent::Cancelled { .. }) => {
                println!();
                return;
            }
            Ok(PanelEvent::Committed { .. }) => {}
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Panel output lagged");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
        }
    }
}
