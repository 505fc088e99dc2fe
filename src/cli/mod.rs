//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments, dispatching
//! subcommands, and running the interactive chat loop. It is deliberately a
//! thin shell: all persistence and gateway logic lives in [`crate::core`].

use std::error::Error;
use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};

use crate::core::config::{AddModelOutcome, RemoveModelOutcome};
use crate::core::gateway::{GatewayClient, OPENROUTER_BASE_URL};
use crate::core::session::Session;

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "A terminal chat client with tandem-reasoning prompts")]
#[command(
    long_about = "Tandem is a terminal chat client for model-routing APIs such as OpenRouter. \
It stores your API key encrypted on disk and keeps a user-editable model list.\n\n\
Before sending a question you can ask the model to pick two complementary reasoning \
frameworks for it; the resulting hybrid prompt is spliced into your next message.\n\n\
Getting started:\n\
  tandem set-key            Store your gateway API key (encrypted at rest)\n\
  tandem models add <id>    Add a model such as openai/gpt-4o\n\
  tandem                    Start chatting\n\n\
Chat commands:\n\
  /reason <question>        Ask for a reasoning approach before sending\n\
  /image <path>             Attach a JPEG image to your next message\n\
  /models                   List configured models\n\
  /clear                    Start a fresh conversation\n\
  /quit                     Exit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for chat (defaults to the first configured model)
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Base URL of the chat-completions gateway
    #[arg(long, value_name = "URL", default_value = OPENROUTER_BASE_URL)]
    pub base_url: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Store the gateway API key, encrypted at rest; an empty key clears it
    SetKey {
        /// The key; prompted for interactively when omitted
        key: Option<String>,
    },
    /// Manage the model list
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },
}

#[derive(Subcommand)]
pub enum ModelsAction {
    /// List configured models
    List,
    /// Add a model identifier such as openai/gpt-4o
    Add { name: String },
    /// Remove a model identifier (the last one cannot be removed)
    Remove { name: String },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let mut session = Session::initialize()?;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::SetKey { key } => {
            let key = match key {
                Some(key) => key,
                None => prompt_line("Enter API key (blank to clear): ")?,
            };
            set_key(&mut session, key.trim());
            Ok(())
        }
        Commands::Models { action } => {
            handle_models(&mut session, action);
            Ok(())
        }
        Commands::Chat => {
            let model = args
                .model
                .unwrap_or_else(|| session.config.first_model().to_string());
            let gateway = GatewayClient::new(&args.base_url);
            run_chat(&mut session, &gateway, &model).await
        }
    }
}

fn set_key(session: &mut Session, key: &str) {
    session.config.api_key = key.to_string();
    match session.persist() {
        Ok(()) if key.is_empty() => println!("✅ API key cleared."),
        Ok(()) => println!("✅ API key saved."),
        Err(e) => eprintln!("❌ Failed to save config: {e}"),
    }
}

fn handle_models(session: &mut Session, action: ModelsAction) {
    match action {
        ModelsAction::List => {
            for model in &session.config.models {
                println!("{model}");
            }
        }
        ModelsAction::Add { name } => match session.config.add_model(&name) {
            AddModelOutcome::Added => match session.persist() {
                Ok(()) => println!("✅ Model {} added.", name.trim()),
                Err(e) => eprintln!("❌ Failed to save config: {e}"),
            },
            AddModelOutcome::AlreadyExists => println!("Model {} already exists.", name.trim()),
            AddModelOutcome::InvalidName => eprintln!("❌ Please enter a valid model name."),
        },
        ModelsAction::Remove { name } => match session.config.remove_model(&name) {
            RemoveModelOutcome::Removed => match session.persist() {
                Ok(()) => println!("✅ Model {name} removed."),
                Err(e) => eprintln!("❌ Failed to save config: {e}"),
            },
            RemoveModelOutcome::LastModel => eprintln!("❌ Cannot remove the last model."),
            RemoveModelOutcome::NotFound => eprintln!("❌ Model {name} not found."),
        },
    }
}

async fn run_chat(
    session: &mut Session,
    gateway: &GatewayClient,
    model: &str,
) -> Result<(), Box<dyn Error>> {
    println!("tandem — chatting with {model} (/help for commands)");
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if let Some(command) = line.strip_prefix('/') {
            if !handle_chat_command(session, gateway, model, command).await {
                break;
            }
            continue;
        }

        // Whitespace-only input changes nothing and sends nothing.
        if !session.conversation.append_user(line) {
            continue;
        }
        let turn = session.conversation.take_pending_turn();
        let reply = match gateway
            .send_chat(&session.config.api_key, model, session.conversation.messages(), &turn)
            .await
        {
            Ok(reply) => reply,
            Err(e) => e.user_message(),
        };
        session.conversation.append_assistant(&reply);
        println!("{reply}\n");
    }
    Ok(())
}

/// Handle a slash command inside the chat loop; returns false to exit.
async fn handle_chat_command(
    session: &mut Session,
    gateway: &GatewayClient,
    model: &str,
    command: &str,
) -> bool {
    let (name, rest) = match command.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    match name {
        "quit" | "exit" => return false,
        "help" => {
            println!(
                "/reason <question>  ask for a reasoning approach before sending\n\
                 /image <path>       attach a JPEG image to your next message\n\
                 /models             list configured models\n\
                 /clear              start a fresh conversation\n\
                 /quit               exit"
            );
        }
        "clear" => {
            session.conversation.clear();
            println!("Conversation cleared.");
        }
        "models" => {
            for name in &session.config.models {
                println!("{name}");
            }
        }
        "image" => {
            if rest.is_empty() {
                eprintln!("Usage: /image <path-to-jpeg>");
            } else {
                match std::fs::read(rest) {
                    Ok(bytes) => {
                        session.conversation.set_image(bytes);
                        println!("Image attached to your next message.");
                    }
                    Err(e) => eprintln!("❌ Could not read {rest}: {e}"),
                }
            }
        }
        "reason" => {
            if rest.is_empty() {
                eprintln!("Usage: /reason <question>");
            } else {
                match gateway
                    .request_reasoning_approach(&session.config.api_key, model, rest)
                    .await
                {
                    Ok(approach) => {
                        println!("{}\n", approach.explanation);
                        match approach.hybrid_prompt {
                            Some(prompt) => {
                                session.conversation.set_hybrid_prompt(prompt);
                                println!("Hybrid prompt ready; it will prefix your next message.");
                            }
                            None => {
                                println!("No hybrid prompt found in the response; sending as-is.")
                            }
                        }
                    }
                    Err(e) => eprintln!("{}", e.user_message()),
                }
            }
        }
        _ => eprintln!("Unknown command: /{name} (try /help)"),
    }
    true
}

fn prompt_line(prompt: &str) -> Result<String, Box<dyn Error>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
