use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::auth::{self, Role, Session};
use crate::config::{Config, get_config_dir};
use crate::database::Database;
use crate::database::sqlite::models::NewDocumentLogEntry;
use crate::embeddings::ollama::OllamaEmbedder;
use crate::generation::ollama::OllamaGenerator;
use crate::pipeline::QaPipeline;

fn load_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    Config::load(config_dir)
}

async fn open_database(config: &Config) -> Result<Database> {
    Database::initialize_from_config_dir(&config.base_dir)
        .await
        .context("Failed to initialize database")
}

fn build_pipeline(config: Config) -> Result<QaPipeline<OllamaEmbedder, OllamaGenerator>> {
    let embedder = OllamaEmbedder::new(&config.ollama)?;
    embedder.ping().with_context(|| {
        format!(
            "Cannot reach the Ollama server at {}:{}; check `docqa config`",
            config.ollama.host, config.ollama.port
        )
    })?;

    let generator = OllamaGenerator::new(&config.ollama)?;
    Ok(QaPipeline::new(config, embedder, generator))
}

fn read_document(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read document: {}", path.display()))
}

fn document_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("unknown")
        .to_string()
}

fn prompt_password(confirm: bool) -> Result<String> {
    let mut prompt = dialoguer::Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    prompt.interact().context("Failed to read password")
}

async fn login(database: &Database, username: &str) -> Result<Session> {
    let password = prompt_password(false)?;
    let session = auth::authenticate(database, username, &password).await?;
    Ok(session)
}

/// Print the active configuration as TOML
#[inline]
pub fn show_config() -> Result<()> {
    let config = load_config()?;

    println!("Configuration ({})", config.config_file_path().display());
    println!();
    println!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to render configuration")?
    );

    Ok(())
}

/// Write the default configuration file so it can be edited by hand
#[inline]
pub fn write_default_config() -> Result<()> {
    let config = load_config()?;
    config.save()?;

    println!("Wrote configuration to {}", config.config_file_path().display());

    Ok(())
}

/// Register a new account. The first account ever registered becomes Admin;
/// every later account is Employee.
#[inline]
pub async fn register(username: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;

    let password = prompt_password(true)?;
    let user = auth::register(&database, &username, &password).await?;

    println!("Registered {} with role {}", user.username, user.role);

    Ok(())
}

/// Summarize a PDF document and append it to the document history log
#[inline]
pub async fn summarize(file: std::path::PathBuf, username: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let session = login(&database, &username).await?;

    let bytes = read_document(&file)?;
    let pipeline = build_pipeline(config)?;

    info!("Summarizing {}", file.display());
    let summary = pipeline.summarize(&bytes)?;

    database
        .insert_document_log(&NewDocumentLogEntry {
            filename: document_name(&file),
            username: session.username.clone(),
            role: session.role,
        })
        .await
        .context("Failed to record document in history log")?;

    println!("{}", summary);

    Ok(())
}

/// Answer a question about a PDF document using retrieval over its chunks
#[inline]
pub async fn ask(file: std::path::PathBuf, question: String, username: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    login(&database, &username).await?;

    let bytes = read_document(&file)?;
    let pipeline = build_pipeline(config)?;

    info!("Answering question about {}", file.display());
    let answer = pipeline.answer(&bytes, &question)?;

    println!("{}", answer);

    Ok(())
}

/// Extract keywords from a PDF document
#[inline]
pub async fn keywords(file: std::path::PathBuf, username: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    login(&database, &username).await?;

    let bytes = read_document(&file)?;
    let pipeline = build_pipeline(config)?;

    let keywords = pipeline.keywords(&bytes)?;

    println!("{}", keywords);

    Ok(())
}

/// Build the persistent similarity index from a PDF document, replacing any
/// previous snapshot
#[inline]
pub async fn index(file: std::path::PathBuf, username: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    login(&database, &username).await?;

    let bytes = read_document(&file)?;
    let index_path = config.index_path();
    let pipeline = build_pipeline(config)?;

    let chunk_count = pipeline.build_persistent_index(&bytes)?;

    println!(
        "Indexed {} chunks from {} into {}",
        chunk_count,
        file.display(),
        index_path.display()
    );

    Ok(())
}

/// Answer a question against the persistent index snapshot
#[inline]
pub async fn query(question: String, username: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    login(&database, &username).await?;

    let pipeline = build_pipeline(config)?;
    let answer = pipeline.query_persistent_index(&question)?;

    println!("{}", answer);

    Ok(())
}

/// Show the document history log. Admin only.
#[inline]
pub async fn history(username: String) -> Result<()> {
    let config = load_config()?;
    let database = open_database(&config).await?;
    let session = login(&database, &username).await?;

    session.require(Role::Admin)?;

    let entries = database
        .list_document_log()
        .await
        .context("Failed to load document history")?;

    if entries.is_empty() {
        println!("No documents have been summarized yet.");
        return Ok(());
    }

    println!("Document History ({} total):", entries.len());
    println!();

    for entry in &entries {
        println!(
            "  {}  {}  by {} ({})",
            entry.logged_at.format("%Y-%m-%d %H:%M:%S"),
            entry.filename,
            entry.username,
            entry.role
        );
    }

    Ok(())
}
