use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::env;
use std::path::PathBuf;

mod commands;
mod runtime;

pub use runtime::Settings;

#[derive(Parser)]
#[command(name = "kale-assistant")]
#[command(about = "Retrieval-augmented chat assistant for the PyKale portal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Directory holding persisted collections
    #[arg(long, global = true, env = "KALE_PERSIST_DIR", default_value = kale_vector_store::DEFAULT_PERSIST_DIR)]
    persist_dir: PathBuf,

    /// Collection name inside the persistence directory
    #[arg(long, global = true, env = "KALE_COLLECTION", default_value = kale_vector_store::DEFAULT_COLLECTION)]
    collection: String,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Override embedding model id
    #[arg(long, global = true)]
    embed_model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, embed and persist a reference document
    Index(IndexArgs),

    /// Show the chunks retrieved for a query
    Search(SearchArgs),

    /// Interactive chat session
    Chat(ChatArgs),

    /// Ask a single question and exit
    Ask(AskArgs),
}

#[derive(Args)]
pub(crate) struct IndexArgs {
    /// Source document
    pub document: PathBuf,

    /// Clear the collection before indexing (otherwise chunks are appended)
    #[arg(long)]
    pub reset: bool,

    /// Window size in characters
    #[arg(long, default_value_t = kale_text_chunker::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Characters shared by consecutive windows
    #[arg(long, default_value_t = kale_text_chunker::DEFAULT_OVERLAP)]
    pub overlap: usize,
}

#[derive(Args)]
pub(crate) struct SearchArgs {
    /// Query text
    pub query: String,

    /// Number of chunks to return
    #[arg(short = 'k', long, default_value_t = kale_search::DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct ChatArgs {
    /// System prompt file (overrides KALE_SYSTEM_PROMPT)
    #[arg(long)]
    pub prompt: Option<PathBuf>,

    /// Chat model id (overrides KALE_CHAT_MODEL)
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Args)]
pub(crate) struct AskArgs {
    /// The question
    pub question: String,

    #[command(flatten)]
    pub chat: ChatArgs,
}

#[derive(Copy, Clone, ValueEnum)]
enum EmbedMode {
    Openai,
    Stub,
}

impl EmbedMode {
    const fn as_str(self) -> &'static str {
        match self {
            EmbedMode::Openai => "openai",
            EmbedMode::Stub => "stub",
        }
    }
}

fn init_logger(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // HTTP internals are noisy at debug level
    builder.filter_module("hyper", log::LevelFilter::Warn);
    builder.filter_module("reqwest", log::LevelFilter::Warn);
    builder.target(env_logger::Target::Stderr).init();
}

pub async fn main_entry() -> Result<()> {
    // A missing .env is the common case
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Some(mode) = cli.embed_mode {
        env::set_var("KALE_EMBEDDING_MODE", mode.as_str());
    }
    if let Some(model) = &cli.embed_model {
        env::set_var("KALE_EMBEDDING_MODEL", model);
    }

    init_logger(&cli);

    let settings = Settings {
        persist_dir: cli.persist_dir.clone(),
        collection: cli.collection.clone(),
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Index(args) => commands::index::run(&settings, args).await,
        Commands::Search(args) => commands::search::run(&settings, args).await,
        Commands::Chat(args) => commands::chat::run_repl(&settings, args).await,
        Commands::Ask(args) => commands::chat::run_ask(&settings, args).await,
    }
}
