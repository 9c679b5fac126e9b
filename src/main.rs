// ABOUTME: Entry point for the postforge binary.
// ABOUTME: Parses CLI arguments, initializes tracing, runs the pipeline and prints progress plus the final post.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use postforge_agent::{PipelineConfig, PostSummary, RunControl, Supervisor, create_services};
use postforge_core::{ContentRequest, ImageRef, Language, StatusEvent, StatusPayload};

/// Build a social post in your own voice: tone analysis and topic research
/// run side by side, then the post is written and illustrated.
#[derive(Parser, Debug)]
#[command(name = "postforge", version)]
struct Args {
    /// Writing sample whose voice the post should match
    #[arg(long, conflicts_with = "tone_file", required_unless_present = "tone_file")]
    tone_sample: Option<String>,

    /// Read the writing sample from a file instead
    #[arg(long)]
    tone_file: Option<PathBuf>,

    /// What the post should be about
    #[arg(short, long)]
    topic: String,

    /// Output language: en or es
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Print the final summary as JSON
    #[arg(long)]
    json: bool,

    /// Write the generated image to this file
    #[arg(long)]
    image_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("postforge=info")),
        )
        .init();

    let args = Args::parse();
    let request = build_request(&args)?;

    let config = PipelineConfig::from_env()?;
    let services = create_services(&config)?;
    let supervisor = Supervisor::from_services(&services, &config);

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<StatusEvent>();
    let control = RunControl::with_events(tx);

    let cancel = control.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight stages");
            cancel.cancel();
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Some(line) = render_event(&event) {
                eprintln!("{}", line);
            }
        }
    });

    let report = supervisor.run_with(&request, control).await?;
    printer.await.context("event printer task failed")?;

    let summary = report.summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", render_summary(&summary));
    }
    if let Some(path) = &args.image_out {
        save_image(&summary, path)?;
    }

    Ok(if report.state.has_usable_output() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Input checks run before any service is configured, so bad input is
/// reported ahead of missing keys.
fn build_request(args: &Args) -> anyhow::Result<ContentRequest> {
    let tone_sample = read_tone_sample(args)?;
    let language = parse_language(&args.language)?;
    let request = ContentRequest::new(tone_sample, args.topic.clone())
        .with_language(language)
        .validate()?;
    Ok(request)
}

fn read_tone_sample(args: &Args) -> anyhow::Result<String> {
    match (&args.tone_sample, &args.tone_file) {
        (Some(sample), _) => Ok(sample.clone()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read tone sample from {}", path.display())),
        (None, None) => anyhow::bail!("provide --tone-sample or --tone-file"),
    }
}

fn parse_language(code: &str) -> anyhow::Result<Language> {
    Language::from_code(code)
        .ok_or_else(|| anyhow::anyhow!("unsupported language {:?} (expected en or es)", code))
}

fn save_image(summary: &PostSummary, path: &Path) -> anyhow::Result<()> {
    let Some(data) = &summary.image_data else {
        tracing::warn!(path = %path.display(), "no image was kept, nothing written");
        return Ok(());
    };
    let bytes = data.bytes().context("kept image is not valid base64")?;
    std::fs::write(path, &bytes)
        .with_context(|| format!("failed to write image to {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "image saved");
    Ok(())
}

fn render_event(event: &StatusEvent) -> Option<String> {
    match &event.payload {
        StatusPayload::RunStarted { topic } => Some(format!("starting run for \"{}\"", topic)),
        StatusPayload::StageChanged {
            stage,
            status,
            error,
        } => Some(match error {
            Some(error) => format!("[{}] {}: {}", stage, status, error.message),
            None => format!("[{}] {}", stage, status),
        }),
        StatusPayload::RunFinished { .. } => None,
    }
}

fn render_summary(summary: &PostSummary) -> String {
    let mut out = vec![format!("Run {}: {}", summary.run_id, summary.state)];
    if let Some(tone) = &summary.tone {
        out.push(format!("Tone: {}", tone));
    }
    if let Some(research) = &summary.research {
        out.push(format!("Research: {}", research));
    }

    if let Some(text) = &summary.text {
        out.push(String::new());
        out.push(text.clone());
        out.push(String::new());
    }
    if !summary.calls_to_action.is_empty() {
        out.push(format!(
            "Calls to action: {}",
            summary.calls_to_action.join(" | ")
        ));
    }
    if let Some(line) = &summary.image_summary {
        out.push(line.clone());
    }
    match &summary.image {
        Some(ImageRef::Url { url }) => out.push(format!("Image: {}", url)),
        Some(ImageRef::Inline { base64 }) => {
            out.push(format!("Image: inline, {} base64 characters", base64.len()))
        }
        None => {}
    }
    for error in &summary.errors {
        out.push(format!("Error: {}", error));
    }
    out.join("\n")
}
