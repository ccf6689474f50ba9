//! Notes CLI - Command-line client for the Notes API

use std::time::Duration;

use clap::{Parser, Subcommand};
use notes_lib::{NoteDraft, NotesClient, ResearchAgent, ResearchOutcome, SearchFilter};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Command-line client for the Notes API", long_about = None)]
struct Cli {
    /// Base URL of the Notes API
    #[arg(long, env = "NOTES_API_URL", value_name = "URL")]
    base_url: Url,

    /// API key sent as the X-API-Key header
    #[arg(long, env = "NOTES_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    log_verbosity: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new note
    Create {
        /// The title of the note
        title: String,

        /// The content of the note
        content: String,

        /// Tags for categorization (repeatable: -t rust -t async)
        #[arg(short = 't', long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// The category folder
        #[arg(long, default_value = "topics")]
        category: String,
    },

    /// Search for notes
    Search {
        /// Text to search for in note content
        #[arg(short, long)]
        keyword: Option<String>,

        /// Tags to filter by (repeatable: -t rust -t async)
        #[arg(short = 't', long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Category to filter by
        #[arg(long)]
        category: Option<String>,
    },

    /// Append content to an existing note
    Append {
        /// The id of the note to append to
        note_id: String,

        /// The content to append
        content: String,
    },

    /// Record research findings: append to an existing note on the topic,
    /// or create a new one
    Research {
        /// The topic to research
        topic: String,

        /// The findings to record
        findings: String,
    },
}

/// Initialize tracing subscriber based on verbosity and output format
fn init_tracing(verbose: u8, json: bool) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,notes_lib=info".to_string(),
            2 => "info,notes_lib=debug".to_string(),
            _ => "debug,notes_lib=trace".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_verbosity, cli.json);

    let client = match NotesClient::builder(cli.base_url, cli.api_key)
        .agent_label("notes-cli")
        .timeout(Duration::from_secs(cli.timeout))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to build client: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(base_url = %client.base_url(), "Notes CLI starting");

    match cli.command {
        Commands::Create {
            title,
            content,
            tags,
            category,
        } => {
            let draft = NoteDraft::new(title, content).tags(tags).category(category);
            match client.try_create(&draft).await {
                Ok(note) => {
                    println!("{}", serde_json::to_string_pretty(&note).unwrap_or_default());
                }
                Err(e) => {
                    eprintln!("Create failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Search {
            keyword,
            tags,
            category,
        } => {
            let mut filter = SearchFilter::new().tags(tags);
            if let Some(keyword) = keyword {
                filter = filter.keyword(keyword);
            }
            if let Some(category) = category {
                filter = filter.category(category);
            }

            match client.try_search(&filter).await {
                Ok(notes) => {
                    println!("{}", serde_json::to_string_pretty(&notes).unwrap_or_default());
                    eprintln!("{} note(s) found", notes.len());
                }
                Err(e) => {
                    eprintln!("Search failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Append { note_id, content } => {
            match client.try_append(&note_id, &content).await {
                Ok(()) => {
                    println!("Appended to note {}", note_id);
                }
                Err(e) => {
                    eprintln!("Append failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Research { topic, findings } => {
            let agent = ResearchAgent::new(client);
            match agent.research_topic(&topic, &findings).await {
                ResearchOutcome::Updated { note_id } => {
                    println!("Updated existing note {} on '{}'", note_id, topic);
                }
                ResearchOutcome::Created { note_id } => match note_id {
                    Some(id) => println!("Created note {} on '{}'", id, topic),
                    None => println!("Created note on '{}'", topic),
                },
                ResearchOutcome::Failed => {
                    eprintln!("Research failed: could not store findings for '{}'", topic);
                    std::process::exit(1);
                }
            }
        }
    }
}
