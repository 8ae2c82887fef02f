//! manta - document-grounded chat over a local Ollama server.
//!
//! Three subcommands:
//! - `index`: walk a docs folder, chunk and embed its text, and persist
//!   the vector index
//! - `chat`: interactive REPL driving the agent turn loop
//! - `health`: check the Ollama server and list installed models

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

use manta_agent::{Agent, EscalationPolicy};
use manta_core::Tool;
use manta_llm::{OllamaChatModel, OllamaConfig, OllamaEmbeddings, DEFAULT_BASE_URL};
use manta_rag::{
    BuildOutcome, DocumentSearchTool, IndexBuilder, PopplerExtractor, PopplerRenderer, RagConfig,
    RetrieverCache, VisionPdfTool, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_DOCS_DIR,
    DEFAULT_EMBED_MODEL, DEFAULT_IMAGE_DIR, DEFAULT_MAX_PAGES, DEFAULT_RENDER_DPI,
    DEFAULT_STORE_DIR, DEFAULT_TOP_K, DOCUMENT_SEARCH_TOOL, NO_CONTEXT_MARKER, VISION_TOOL,
};

const DEFAULT_CHAT_MODEL: &str = "gemma3:4b-it-qat";
const DEFAULT_VISION_MODEL: &str = "PetrosStav/gemma3-tools:4b";
const CHAT_TEMPERATURE: f32 = 0.7;
const DEFAULT_SESSION: &str = "user-session-1";

#[derive(Parser)]
#[command(name = "manta")]
#[command(about = "Document-grounded chat over a local Ollama server", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent in an interactive REPL
    Chat {
        /// Session id the conversation is logged under
        #[arg(long, default_value = DEFAULT_SESSION)]
        session: String,

        /// Print the state trace after each turn
        #[arg(long)]
        trace: bool,

        /// Chat model name
        #[arg(long, default_value = DEFAULT_CHAT_MODEL)]
        model: String,

        /// Vision model name for the PDF page fallback
        #[arg(long, default_value = DEFAULT_VISION_MODEL)]
        vision_model: String,

        /// Embedding model name; must match the one the index was built with
        #[arg(long, env = "RAG_EMBED_MODEL", default_value = DEFAULT_EMBED_MODEL)]
        embed_model: String,

        /// Ollama server URL
        #[arg(long, env = "OLLAMA_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Folder holding the persisted index
        #[arg(long, env = "RAG_STORE_DIR", default_value = DEFAULT_STORE_DIR)]
        store: PathBuf,

        /// Folder scanned for PDFs by the vision fallback
        #[arg(long, env = "RAG_DOCS_DIR", default_value = DEFAULT_DOCS_DIR)]
        docs: PathBuf,

        /// Snippets returned per retrieval
        #[arg(long, env = "RAG_TOP_K", default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// Folder for rendered PDF page images
        #[arg(long, env = "PAGE_IMG_DIR", default_value = DEFAULT_IMAGE_DIR)]
        image_dir: PathBuf,

        /// Cap on pages rendered per PDF
        #[arg(long, env = "MAX_PAGES_PER_PDF", default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: usize,

        /// Render resolution in dots per inch
        #[arg(long, env = "RENDER_DPI", default_value_t = DEFAULT_RENDER_DPI)]
        dpi: u32,
    },

    /// Build the vector index from a folder of txt/md/pdf documents
    Index {
        /// Folder scanned for source documents
        #[arg(long, env = "RAG_DOCS_DIR", default_value = DEFAULT_DOCS_DIR)]
        docs: PathBuf,

        /// Folder the index is written to
        #[arg(long, env = "RAG_STORE_DIR", default_value = DEFAULT_STORE_DIR)]
        store: PathBuf,

        /// Chunk size in characters
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Overlap between adjacent chunks in characters
        #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
        chunk_overlap: usize,

        /// Embedding model name
        #[arg(long, env = "RAG_EMBED_MODEL", default_value = DEFAULT_EMBED_MODEL)]
        embed_model: String,

        /// Ollama server URL
        #[arg(long, env = "OLLAMA_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },

    /// Check the Ollama server and list installed models
    Health {
        /// Ollama server URL
        #[arg(long, env = "OLLAMA_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    match cli.command {
        Commands::Chat {
            session,
            trace,
            model,
            vision_model,
            embed_model,
            base_url,
            store,
            docs,
            top_k,
            image_dir,
            max_pages,
            dpi,
        } => {
            let rag_config = RagConfig::new()
                .with_docs_dir(docs)
                .with_store_dir(store)
                .with_top_k(top_k)
                .with_image_dir(image_dir)
                .with_max_pages(max_pages)
                .with_dpi(dpi);
            run_chat(ChatSetup {
                session,
                trace,
                model,
                vision_model,
                embed_model,
                base_url,
                rag_config,
            })
            .await
        }
        Commands::Index {
            docs,
            store,
            chunk_size,
            chunk_overlap,
            embed_model,
            base_url,
        } => run_index(&docs, &store, chunk_size, chunk_overlap, &embed_model, &base_url).await,
        Commands::Health { base_url } => run_health(&base_url).await,
    }
}

struct ChatSetup {
    session: String,
    trace: bool,
    model: String,
    vision_model: String,
    embed_model: String,
    base_url: String,
    rag_config: RagConfig,
}

async fn run_chat(setup: ChatSetup) -> anyhow::Result<()> {
    let chat_model = OllamaChatModel::new(
        OllamaConfig::new(&setup.model).with_base_url(&setup.base_url),
    );
    let vision_model = OllamaChatModel::new(
        OllamaConfig::new(&setup.vision_model).with_base_url(&setup.base_url),
    );
    let embeddings = OllamaEmbeddings::new(
        OllamaConfig::new(&setup.embed_model).with_base_url(&setup.base_url),
    );

    let search_tool = DocumentSearchTool::new(
        &setup.rag_config,
        Arc::new(embeddings),
        RetrieverCache::new(),
    );
    let vision_tool = VisionPdfTool::new(
        &setup.rag_config,
        Arc::new(PopplerRenderer),
        Arc::new(vision_model),
    );

    let agent = Agent::builder()
        .with_model(Arc::new(chat_model))
        .with_tool(Arc::new(search_tool) as Arc<dyn Tool>)
        .with_tool(Arc::new(vision_tool) as Arc<dyn Tool>)
        .with_escalation(EscalationPolicy {
            retrieval_tool: DOCUMENT_SEARCH_TOOL.to_string(),
            vision_tool: VISION_TOOL.to_string(),
            no_context_marker: NO_CONTEXT_MARKER.to_string(),
        })
        .with_temperature(CHAT_TEMPERATURE)
        .build()
        .context("failed to assemble the agent")?;

    println!("Chatbot is ready!");
    println!("(Type quit/exit/q to stop.)");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("You: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            // stdin closed
            println!();
            println!("Goodbye!");
            break;
        };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_quit(input) {
            println!("Goodbye!");
            break;
        }

        let outcome = agent.run_turn(&setup.session, input).await;
        println!("Assistant: {}", outcome.reply);
        if setup.trace {
            println!("{}", outcome.trace.render());
        }
    }

    Ok(())
}

async fn run_index(
    docs: &PathBuf,
    store: &PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
    embed_model: &str,
    base_url: &str,
) -> anyhow::Result<()> {
    let embeddings = OllamaEmbeddings::new(
        OllamaConfig::new(embed_model).with_base_url(base_url),
    );
    let builder = IndexBuilder::new(Arc::new(embeddings), Arc::new(PopplerExtractor))
        .with_chunk_size(chunk_size)
        .with_chunk_overlap(chunk_overlap);

    println!("Indexing {} ...", docs.display());
    match builder.build(docs, store).await? {
        BuildOutcome::Written { chunks } => {
            println!("Indexed {} chunks into {}", chunks, store.display());
        }
        BuildOutcome::NoText => {
            println!("No extractable text found under {}.", docs.display());
            println!(
                "If the documents are scanned PDFs, the chat's vision fallback \
                 can still read them; no index was written."
            );
        }
    }
    Ok(())
}

async fn run_health(base_url: &str) -> anyhow::Result<()> {
    let model = OllamaChatModel::new(
        OllamaConfig::new(DEFAULT_CHAT_MODEL).with_base_url(base_url),
    );

    if !model.check_health().await {
        println!("Ollama server at {} is not reachable.", base_url);
        std::process::exit(1);
    }

    println!("Ollama server at {} is up.", base_url);
    let models = model.list_models().await?;
    if models.is_empty() {
        println!("No models installed.");
    } else {
        println!("Installed models:");
        for name in models {
            println!("  {}", name);
        }
    }
    Ok(())
}

/// True when the input asks to leave the REPL.
fn is_quit(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_commands() {
        assert!(is_quit("quit"));
        assert!(is_quit("EXIT"));
        assert!(is_quit("Q"));
        assert!(!is_quit("quit please"));
        assert!(!is_quit("hello"));
    }

    #[test]
    fn test_cli_parses_chat_defaults() {
        let cli = Cli::try_parse_from(["manta", "chat"]).unwrap();
        match cli.command {
            Commands::Chat {
                session,
                trace,
                model,
                top_k,
                ..
            } => {
                assert_eq!(session, DEFAULT_SESSION);
                assert!(!trace);
                assert_eq!(model, DEFAULT_CHAT_MODEL);
                assert_eq!(top_k, DEFAULT_TOP_K);
            }
            _ => panic!("expected chat subcommand"),
        }
    }

    #[test]
    fn test_cli_parses_index_overrides() {
        let cli = Cli::try_parse_from([
            "manta",
            "index",
            "--docs",
            "/tmp/docs",
            "--chunk-size",
            "800",
            "--chunk-overlap",
            "100",
        ])
        .unwrap();
        match cli.command {
            Commands::Index {
                docs,
                chunk_size,
                chunk_overlap,
                ..
            } => {
                assert_eq!(docs, PathBuf::from("/tmp/docs"));
                assert_eq!(chunk_size, 800);
                assert_eq!(chunk_overlap, 100);
            }
            _ => panic!("expected index subcommand"),
        }
    }
}
