use anyhow::{Context, Result};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{AnalysisBackend, BackendClient};
use crate::config::Config;
use crate::conversation::{Message, MessageKind};
use crate::session::{ChatSession, SendOutcome};

/// Submit one query, wait for the analysis, and print it to stdout.
pub async fn ask(config: &Config, query: &str) -> Result<SendOutcome> {
    let client = BackendClient::from_config(config).context("Failed to create backend client")?;
    ask_with(Arc::new(client), config.poll_interval(), query, &mut std::io::stdout()).await
}

/// Same as [`ask`] with an explicit backend and output sink.
pub async fn ask_with<W: Write>(
    backend: Arc<dyn AnalysisBackend>,
    poll_interval: Duration,
    query: &str,
    out: &mut W,
) -> Result<SendOutcome> {
    if query.trim().is_empty() {
        anyhow::bail!("Query cannot be empty");
    }

    let mut session = ChatSession::new(backend, poll_interval);
    session.send(query);
    let outcome = session
        .settle()
        .await
        .context("Analysis ended without a result")?;

    let mut out = BufWriter::new(out);
    // Skip the echoed user message.
    for message in session.conversation().messages().iter().skip(1) {
        write_message(&mut out, message)?;
    }

    if outcome == SendOutcome::PollFailed {
        writeln!(out, "❌ Lost contact with the analysis service while waiting for a result.")?;
    }
    out.flush()?;

    Ok(outcome)
}

fn write_message<W: Write>(out: &mut W, message: &Message) -> Result<()> {
    match message.kind() {
        MessageKind::Agent => {
            writeln!(
                out,
                "🤖 {} [{}]",
                message.author().unwrap_or_default(),
                message.timestamp_label()
            )?;
            for line in message.text().lines() {
                writeln!(out, "   {}", line)?;
            }
            writeln!(out)?;
        }
        MessageKind::Error => writeln!(out, "❌ {}", message.text())?,
        MessageKind::User => writeln!(out, "👤 {}", message.text())?,
    }
    Ok(())
}

/// Print the resolved configuration, or write it out with `init`.
pub fn config(config: &Config, path: Option<&Path>, init: bool) -> Result<()> {
    if !init {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    if path.exists() {
        println!("⚠️  Config already exists at {}", path.display());
        return Ok(());
    }

    config.save(&path)?;
    println!("✅ Wrote config to {}", path.display());
    Ok(())
}
