//! Uploads an exam sheet to a running relay and prints the scores.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use exam_score_reader::{provider::mime_for_path, scores::SelectedImage, ScoreClient, ScoreView};

#[derive(Parser)]
#[command(name = "grade", about = "Read handwritten exam scores through the relay")]
struct Args {
    /// relay base URL
    #[arg(short, long, default_value = "http://localhost:3000")]
    server: String,

    /// photo of the exam sheet
    image: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    let file_name = args
        .image
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "exam".to_string());

    let mut view = ScoreView::new();
    view.select(SelectedImage {
        file_name,
        content_type: mime_for_path(&args.image).to_string(),
        bytes,
    });

    let client = ScoreClient::new(&args.server);
    if let Some(image) = view.begin_submit() {
        let outcome = client.submit(&image).await;
        view.finish(outcome);
    }

    if let Some(message) = view.error() {
        anyhow::bail!("{message}");
    }
    if let Some(scores) = view.scores() {
        print!("{}", scores.render());
    }

    Ok(())
}
