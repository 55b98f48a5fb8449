//! Interactive streaming chat against a ragline deployment.
//!
//! This binary provides a streaming REPL over the RAG chat endpoint:
//! deltas print as they arrive, and citations print when the terminal
//! record carries them.
//!
//! # Usage
//!
//! ```bash
//! # Chat against RAGLINE_BASE_URL with a selected collection
//! ragline-chat --collection 61850
//!
//! # Specify a model and persist history
//! ragline-chat --collection 61850 --model llama3.1:latest --history chats.json
//! ```
//!
//! Credentials come from the RAGLINE_USERNAME and RAGLINE_PASSWORD
//! environment variables.
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/models` - List available models
//! - `/model <name>` - Change the model
//! - `/collection <name>` - Change the collection
//! - `/clear` - Start a new conversation
//! - `/quit` - Exit the application

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arrrg::CommandLine;
use futures::StreamExt;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use ragline::{
    Chat, ChatArgs, ChatHistory, ChatMessage, ChatRequest, ClientConfig, Ragline,
};

/// Main entry point for the ragline-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("ragline-chat [OPTIONS]");
    let mut config = ClientConfig::from_args(args)?;

    let client = Ragline::with_options(
        config.base_url.clone(),
        Some(Duration::from_secs(config.timeout_secs)),
    )?;

    match (
        std::env::var("RAGLINE_USERNAME").ok(),
        std::env::var("RAGLINE_PASSWORD").ok(),
    ) {
        (Some(username), Some(password)) => {
            client.sign_in(&username, &password).await?;
            println!("Signed in as {username}.");
        }
        _ => {
            println!("RAGLINE_USERNAME/RAGLINE_PASSWORD not set; requests will be anonymous.");
        }
    }

    let mut history = match &config.history_path {
        Some(path) => ChatHistory::open_or_default(path)?,
        None => ChatHistory::new(),
    };
    let mut chat = Chat::new(format!(
        "chat-{}",
        time::OffsetDateTime::now_utc().unix_timestamp_nanos()
    ));

    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!(
        "ragline chat (collection: {})",
        config.collection.as_deref().unwrap_or("<none>")
    );
    println!("Type /help for commands, /quit to exit\n");

    loop {
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(command) = line.strip_prefix('/') {
                    let (command, argument) = match command.split_once(' ') {
                        Some((command, argument)) => (command, Some(argument.trim())),
                        None => (command, None),
                    };
                    match (command, argument) {
                        ("quit", _) | ("exit", _) => {
                            println!("Goodbye!");
                            break;
                        }
                        ("help", _) => {
                            println!("    /help                 Show this help");
                            println!("    /models               List available models");
                            println!("    /model <name>         Change the model");
                            println!("    /collection <name>    Change the collection");
                            println!("    /clear                Start a new conversation");
                            println!("    /quit                 Exit");
                        }
                        ("models", _) => match client.models().await {
                            Ok(models) => {
                                for model in models {
                                    println!("    {model}");
                                }
                            }
                            Err(err) => eprintln!("Error: {err}"),
                        },
                        ("model", Some(name)) if !name.is_empty() => {
                            config.model = Some(name.to_string());
                            println!("Model changed to: {name}");
                        }
                        ("collection", Some(name)) if !name.is_empty() => {
                            config.collection = Some(name.to_string());
                            println!("Collection changed to: {name}");
                        }
                        ("clear", _) => {
                            chat = Chat::new(format!(
                                "chat-{}",
                                time::OffsetDateTime::now_utc().unix_timestamp_nanos()
                            ));
                            println!("Conversation cleared.");
                        }
                        _ => {
                            println!("Unknown command: /{command}");
                        }
                    }
                    continue;
                }

                let Some(collection) = config.collection.clone() else {
                    eprintln!("No collection selected. Use /collection <name> first.");
                    continue;
                };

                let mut request = ChatRequest::new(line, collection);
                if let Some(model) = &config.model {
                    request = request.with_model(model.clone());
                }

                chat.push(ChatMessage::User {
                    content: line.to_string(),
                });

                match client.chat_stream(&request).await {
                    Ok(deltas) => {
                        futures::pin_mut!(deltas);
                        let mut answer = String::new();
                        print!("Assistant: ");
                        std::io::stdout().flush()?;
                        while let Some(item) = deltas.next().await {
                            if interrupted.load(Ordering::Relaxed) {
                                println!("\n[interrupted]");
                                break;
                            }
                            match item {
                                Ok(delta) => {
                                    if let Some(text) = delta.as_text() {
                                        print!("{text}");
                                        std::io::stdout().flush()?;
                                        answer.push_str(text);
                                    } else if let Some(sources) = delta.as_sources() {
                                        println!("\n\nSources: {sources}");
                                    }
                                }
                                Err(err) => {
                                    eprintln!("\nError: {err}");
                                    chat.push(ChatMessage::Error {
                                        content: err.to_string(),
                                    });
                                    break;
                                }
                            }
                        }
                        println!();
                        if !answer.is_empty() {
                            chat.push(ChatMessage::Assistant {
                                content: answer,
                                reasoning: None,
                                model: config.model.clone(),
                            });
                        }
                    }
                    Err(err) => {
                        eprintln!("Error: {err}");
                        chat.push(ChatMessage::Error {
                            content: err.to_string(),
                        });
                    }
                }

                if let Some(path) = &config.history_path {
                    history.upsert(chat.clone());
                    history.save_to(path)?;
                }
            }
            Err(ReadlineError::Interrupted) => {
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    Ok(())
}
