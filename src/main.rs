use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crm_assistant_lib::activity_log;
use crm_assistant_lib::error::ExchangeError;
use crm_assistant_lib::models::{MessageKind, RecordField};
use crm_assistant_lib::store::SUGGESTED_FOLLOW_UPS;
use crm_assistant_lib::{lock_store, Assistant, ChatBackend, Config, ExchangeOutcome, HttpBackend};

/// Log HCP interactions by chatting with the CRM assistant
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file (default: ~/.crm_assistant/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(short, long)]
    backend_url: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log to the console only
    #[arg(long)]
    no_file_log: bool,
}

/// One line of REPL input
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Chat(String),
    Form,
    Set { field: String, value: String },
    Material(String),
    Unmaterial(usize),
    Samples(String),
    Suggest(usize),
    Submit,
    History,
    Clear,
    ClearChat,
    Status,
    Help,
    Quit,
    Invalid(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Chat(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "form" => Command::Form,
        "set" => match arg.split_once(char::is_whitespace) {
            Some((field, value)) => Command::Set {
                field: field.to_string(),
                value: value.trim().to_string(),
            },
            // An empty value clears a text field
            None if !arg.is_empty() => Command::Set {
                field: arg.to_string(),
                value: String::new(),
            },
            None => Command::Invalid("usage: /set <field> <value>".to_string()),
        },
        "material" if !arg.is_empty() => Command::Material(arg.to_string()),
        "material" => Command::Invalid("usage: /material <name>".to_string()),
        "unmaterial" => match arg.parse() {
            Ok(index) => Command::Unmaterial(index),
            Err(_) => Command::Invalid("usage: /unmaterial <index>".to_string()),
        },
        "samples" => Command::Samples(arg.to_string()),
        "suggest" => match arg.parse::<usize>() {
            Ok(n) if (1..=SUGGESTED_FOLLOW_UPS.len()).contains(&n) => Command::Suggest(n),
            _ => Command::Invalid(format!(
                "usage: /suggest <1-{}>",
                SUGGESTED_FOLLOW_UPS.len()
            )),
        },
        "submit" => Command::Submit,
        "history" => Command::History,
        "clear" => Command::Clear,
        "clear-chat" => Command::ClearChat,
        "status" => Command::Status,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command: /{}", other)),
    };
    Some(command)
}

fn print_help() {
    println!("Type a note about your HCP interaction to chat, or use a command:");
    println!("  /form                  show the interaction record");
    println!("  /set <field> <value>   edit one field");
    println!("  /material <name>       add a shared material");
    println!("  /unmaterial <index>    remove a shared material");
    println!("  /samples <a, b>        replace distributed samples");
    println!("  /suggest <n>           add a suggested follow-up:");
    for (i, suggestion) in SUGGESTED_FOLLOW_UPS.iter().enumerate() {
        println!("                           {}. {}", i + 1, suggestion);
    }
    println!("  /submit                log the interaction");
    println!("  /history               show the chat transcript");
    println!("  /clear                 reset the record");
    println!("  /clear-chat            clear the chat transcript");
    println!("  /status                show exchange status");
    println!("  /quit                  exit");
    let fields: Vec<&str> = RecordField::ALL.iter().map(|f| f.name()).collect();
    println!("Fields: {}", fields.join(", "));
}

fn print_outcome(outcome: &ExchangeOutcome) {
    println!("\nAssistant: {}", outcome.reply.response);
    if let Some(tools) = &outcome.reply.tools_used {
        if !tools.is_empty() {
            println!("  tools: {}", tools.join(", "));
        }
    }
    let filled: Vec<&str> = outcome.fields_filled.iter().map(|f| f.name()).collect();
    if !filled.is_empty() {
        println!("  filled: {}", filled.join(", "));
    }
    println!();
}

fn print_exchange_result(result: Result<ExchangeOutcome, ExchangeError>) {
    match result {
        Ok(outcome) => print_outcome(&outcome),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn print_form<B: ChatBackend>(assistant: &Assistant<B>) {
    let record = lock_store(&assistant.store()).snapshot();
    match serde_json::to_string_pretty(&record) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to render record: {}", e),
    }
}

fn print_history<B: ChatBackend>(assistant: &Assistant<B>) {
    let store = assistant.store();
    let store = lock_store(&store);
    if store.messages().is_empty() {
        println!("(no messages)");
        return;
    }
    for message in store.messages() {
        let who = match message.kind {
            MessageKind::User => "You",
            MessageKind::Ai => "Assistant",
            MessageKind::Error => "Error",
        };
        println!(
            "[{}] {}: {}",
            message.timestamp.format("%H:%M:%S"),
            who,
            message.content
        );
    }
}

/// Run one line of input. Returns false when the REPL should exit.
async fn handle_command<B: ChatBackend>(assistant: &Assistant<B>, command: Command) -> bool {
    match command {
        Command::Chat(text) => print_exchange_result(assistant.submit(&text).await),
        Command::Submit => print_exchange_result(assistant.submit_form().await),
        Command::Form => print_form(assistant),
        Command::Set { field, value } => {
            let result = lock_store(&assistant.store()).set_field_named(&field, value.into());
            match result {
                Ok(()) => println!("Updated {}", field),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Command::Material(name) => {
            if let Err(e) = lock_store(&assistant.store()).add_material(&name) {
                eprintln!("Error: {}", e);
            }
        }
        Command::Unmaterial(index) => {
            let result = lock_store(&assistant.store()).remove_material(index);
            match result {
                Ok(removed) => println!("Removed {}", removed),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Command::Samples(text) => {
            if let Err(e) = lock_store(&assistant.store()).set_samples_from_text(&text) {
                eprintln!("Error: {}", e);
            }
        }
        Command::Suggest(n) => {
            let suggestion = SUGGESTED_FOLLOW_UPS[n - 1];
            match lock_store(&assistant.store()).add_follow_up(suggestion) {
                Ok(()) => println!("Added follow-up: {}", suggestion),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Command::History => print_history(assistant),
        Command::Clear => {
            lock_store(&assistant.store()).reset();
            println!("Record cleared");
        }
        Command::ClearChat => {
            lock_store(&assistant.store()).clear_messages();
            println!("Chat cleared");
        }
        Command::Status => {
            let status = lock_store(&assistant.store()).status();
            match serde_json::to_string_pretty(&status) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        Command::Help => print_help(),
        Command::Invalid(message) => eprintln!("{}", message),
        Command::Quit => return false,
    }
    true
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(),
    };
    if let Some(url) = &args.backend_url {
        config.backend_url = url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout_secs = timeout;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    let log_dir = if args.no_file_log {
        None
    } else {
        Some(config.log_dir()?)
    };
    activity_log::init_logging(log_dir.as_deref(), log_level)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!("CRM assistant starting...");
    info!("Backend: {}", config.backend_url);

    let backend = HttpBackend::new(&config)?;
    if backend.check_connection().await {
        println!("Connected to backend at {}", config.backend_url);
    } else {
        warn!("Backend not reachable at startup");
        println!(
            "Backend at {} is not reachable. Messages will fail until it is up.",
            config.backend_url
        );
    }

    let assistant = Assistant::new(backend);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_command(&line) else {
            continue;
        };
        if !handle_command(&assistant, command).await {
            break;
        }
    }

    info!("CRM assistant exiting");
    Ok(())
}
