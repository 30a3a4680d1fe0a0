use crate::chat::{ChatSession, Message, MessageRole, SessionStore};
use crate::cli::SessionCommand;
use crate::commands::AppContext;
use crate::error::Result;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle saved-session commands
pub async fn handle_sessions(ctx: &AppContext, command: SessionCommand) -> Result<()> {
    let auth = ctx.require_account(false).await?;
    let mut store = ctx.session_store(&auth)?;

    match command {
        SessionCommand::List => print_session_table(&store),
        SessionCommand::Show { index } => match store.sessions().get(index.saturating_sub(1)) {
            Some(session) if index > 0 => print_transcript(session),
            _ => println!("{}", format!("No conversation number {}", index).yellow()),
        },
        SessionCommand::Delete { index } => {
            let id = store
                .sessions()
                .get(index.saturating_sub(1))
                .filter(|_| index > 0)
                .map(|s| s.id.clone());
            match id {
                Some(id) => {
                    store.delete_session(&id);
                    println!("{}", format!("Deleted conversation {}", index).green());
                }
                None => println!("{}", format!("No conversation number {}", index).yellow()),
            }
        }
    }

    Ok(())
}

/// Print the session list as a table, marking the current one
pub fn print_session_table(store: &SessionStore) {
    if store.sessions().is_empty() {
        println!("{}", "No conversations yet. Ask a question to start one.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "#".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for (i, session) in store.sessions().iter().enumerate() {
        let marker = if store.current_id() == Some(session.id.as_str()) {
            format!("{}*", i + 1).cyan()
        } else {
            (i + 1).to_string().normal()
        };
        let updated = session
            .updated_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();

        table.add_row(prettytable::row![marker, session.title, session.len(), updated]);
    }

    println!("\nConversations:");
    table.printstd();
    println!();
    println!(
        "Use {} to continue one ({} marks the current conversation).",
        "/switch <#>".cyan(),
        "*".cyan()
    );
    println!();
}

/// Print every message of a session
pub fn print_transcript(session: &ChatSession) {
    println!("\n{}\n", session.title.bold());
    if session.is_empty() {
        println!("{}", "(no messages yet)".dimmed());
        return;
    }
    for message in &session.messages {
        print_message(message);
    }
}

/// Print one message with its role and provenance
pub fn print_message(message: &Message) {
    let time = message
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M")
        .to_string();

    match message.role {
        MessageRole::User => {
            println!("{} {}", format!("[{}] You:", time).blue().bold(), message.content);
        }
        MessageRole::Assistant => {
            println!("{}", format!("[{}] AstraVaani:", time).magenta().bold());
            println!("{}", message.content);
            if let Some(meta) = &message.metadata {
                if !meta.data_points_used.is_empty() {
                    println!(
                        "{} {}",
                        "Based on:".dimmed(),
                        meta.data_points_used.join(", ").dimmed()
                    );
                }
                if !meta.validation_passed {
                    println!(
                        "{}",
                        "Note: this answer did not pass every accuracy check.".yellow()
                    );
                }
            }
        }
    }
    println!();
}
