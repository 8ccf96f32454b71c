// SPDX-FileCopyrightText: 2026 DbChat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dbchat shell` command implementation.
//!
//! Launches an interactive REPL with a colored prompt and readline history.
//! Plain input sends a question in the current query mode; slash commands
//! navigate threads, folders, and bookmarks.

use std::path::PathBuf;

use colored::Colorize;
use dbchat_chat::{ChatSession, SendOutcome};
use dbchat_client::DbChatClient;
use dbchat_config::model::DbChatConfig;
use dbchat_core::{DbChatError, QueryType};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

/// Runs the `dbchat shell` interactive REPL.
pub async fn run_shell(config: DbChatConfig) -> Result<(), DbChatError> {
    let client = DbChatClient::new(&config)?;
    let mut session = ChatSession::new(client.clone(), config.user.id.clone());
    let downloads = PathBuf::from(&config.downloads.dir);

    let mut rl = DefaultEditor::new()
        .map_err(|e| DbChatError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "dbchat shell".bold().green());
    println!(
        "Ask a question, or type {} for commands and {} to exit.\n",
        "/help".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", "dbchat".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if let Err(e) =
                    handle_line(&client, &mut session, &config, &downloads, trimmed).await
                {
                    eprintln!("{}: {e}", "error".red());
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                // Ctrl+C / Ctrl+D
                break;
            }
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Handles one line of shell input: a slash command or a question to send.
async fn handle_line(
    client: &DbChatClient,
    session: &mut ChatSession,
    config: &DbChatConfig,
    downloads: &PathBuf,
    line: &str,
) -> Result<(), DbChatError> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "/help" => {
            print_help();
            Ok(())
        }
        "/mode" => {
            let mode = match rest {
                "chat" => QueryType::Chat,
                "db" => QueryType::DbQuery,
                "scrap" => QueryType::Scrap,
                other => {
                    eprintln!("unknown mode `{other}`; expected chat, db, or scrap");
                    return Ok(());
                }
            };
            session.set_query_type(mode);
            println!("query mode set to {}", mode.to_string().yellow());
            Ok(())
        }
        "/new" => {
            session.new_chat();
            println!("started a new conversation");
            Ok(())
        }
        "/history" => {
            let entries = client.history(&config.user.id).await?;
            if entries.is_empty() {
                println!("no conversations yet");
            }
            for entry in entries {
                let title = if entry.title.is_empty() {
                    "(untitled)".to_string()
                } else {
                    entry.title.clone()
                };
                println!("{}  {title}", entry.thread_id.yellow());
            }
            Ok(())
        }
        "/open" => {
            session.load_thread(rest).await?;
            render_all(session, downloads);
            Ok(())
        }
        "/tables" => {
            let tables = client.ai_tables(&config.user.id).await?;
            if tables.is_empty() {
                println!("no AI tables yet");
            }
            for table in tables {
                println!("{}  {}", table.id.yellow(), table.name);
            }
            Ok(())
        }
        "/table" => {
            session.load_ai_table(rest).await?;
            render_all(session, downloads);
            Ok(())
        }
        "/bookmarks" => {
            let bookmarks = client.bookmarks(&config.user.id).await?;
            if bookmarks.is_empty() {
                println!("no bookmarks yet");
            }
            for bookmark in bookmarks {
                println!(
                    "{}  {} ({} queries)",
                    bookmark.bookmark_id.yellow(),
                    bookmark.bookmarkname,
                    bookmark.query_ids.iter().count()
                );
            }
            Ok(())
        }
        "/bookmark" => {
            let Some((query_id, name)) = rest.split_once(char::is_whitespace) else {
                eprintln!("usage: /bookmark <query_id> <name>");
                return Ok(());
            };
            session.bookmark_query(query_id, name.trim()).await?;
            println!("bookmarked {}", query_id.yellow());
            Ok(())
        }
        "/openbookmark" => {
            session.load_bookmark(rest).await?;
            render_all(session, downloads);
            Ok(())
        }
        "/unbookmark" => {
            session.remove_bookmark(rest).await?;
            println!("removed bookmark {}", rest.yellow());
            Ok(())
        }
        "/rename" => {
            let Some((thread_id, name)) = rest.split_once(char::is_whitespace) else {
                eprintln!("usage: /rename <thread_id> <name>");
                return Ok(());
            };
            client.rename_thread(thread_id, name.trim()).await?;
            println!("renamed {}", thread_id.yellow());
            Ok(())
        }
        "/delete" => {
            client.delete_thread(rest).await?;
            println!("deleted {}", rest.yellow());
            Ok(())
        }
        "/reply" => {
            let Some((message_id, text)) = rest.split_once(char::is_whitespace) else {
                eprintln!("usage: /reply <message_id> <question>");
                return Ok(());
            };
            send_and_render(session, downloads, text.trim(), Some(message_id)).await;
            Ok(())
        }
        "/dismiss" => {
            session.dismiss_error();
            Ok(())
        }
        _ if command.starts_with('/') => {
            eprintln!("unknown command {command}; type /help");
            Ok(())
        }
        _ => {
            send_and_render(session, downloads, line, None).await;
            Ok(())
        }
    }
}

/// Sends a question and prints everything appended by the exchange.
async fn send_and_render(
    session: &mut ChatSession,
    downloads: &PathBuf,
    text: &str,
    reply_to: Option<&str>,
) {
    let before = session.messages().len();
    match session.send(text, reply_to).await {
        SendOutcome::Sent => {
            for message in &session.messages()[before..] {
                crate::render::print_message(message, downloads);
            }
            if let Some(error) = session.last_error() {
                eprintln!(
                    "{}: {error} ({} to clear)",
                    "backend error".red(),
                    "/dismiss".yellow()
                );
            }
        }
        SendOutcome::Dropped => {
            debug!("send dropped while a request is in flight");
            eprintln!("{}", "still waiting on the previous question".dimmed());
        }
        SendOutcome::Stale => {}
    }
}

fn render_all(session: &ChatSession, downloads: &PathBuf) {
    for message in session.messages() {
        crate::render::print_message(message, downloads);
    }
}

fn print_help() {
    println!("commands:");
    println!("  /mode <chat|db|scrap>        set the query mode");
    println!("  /new                         start a new conversation");
    println!("  /history                     list your conversations");
    println!("  /open <thread_id>            open a conversation");
    println!("  /tables                      list AI tables");
    println!("  /table <table_id>            open an AI table (folder)");
    println!("  /bookmarks                   list bookmarks");
    println!("  /bookmark <query_id> <name>  bookmark a query");
    println!("  /openbookmark <bookmark_id>  open a bookmark");
    println!("  /unbookmark <bookmark_id>    delete a bookmark");
    println!("  /reply <message_id> <text>   reply to an earlier message");
    println!("  /rename <thread_id> <name>   rename a conversation");
    println!("  /delete <thread_id>          delete a conversation");
    println!("  /dismiss                     clear the error banner");
    println!("  /quit                        exit");
}
