use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use khamsang_engine::backend::Backend;
use khamsang_engine::cli::{self, FileOptions, OutputHandlers, ReplOptions, Session};
use khamsang_engine::config::{ConfigLoader, KhamsangConfig};
use khamsang_engine::evidence::{
    EvidenceCollector, EvidenceSet, HttpEvidenceCollector, StaticEvidence, TemplateLibrary,
};
use khamsang_engine::pipeline::Pipeline;
use khamsang_engine::protocol::Instruction;
use khamsang_engine::resolution::{rank, resolve};
use khamsang_h::{HeadlessBackend, LaunchOptions};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "khamsang", version, about = "Drive a browser with Thai/English instructions")]
struct Args {
    /// Config file (default: $KHAMSANG_CONFIG, ./khamsang.yaml, then ~/.khamsang/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Print the analysis of one instruction as JSON
    Parse {
        text: String,
        /// Declare the instruction as Thai
        #[arg(long)]
        thai: bool,
    },
    /// Rank recognized text against a description
    Resolve {
        description: String,
        /// JSON array of evidence hits
        #[arg(long)]
        evidence: PathBuf,
    },
    /// Launch Chromium and process instructions interactively or from a file
    Run {
        /// Launch browser in visible mode (not headless)
        #[arg(long)]
        visible: bool,
        /// One instruction per line; '#' starts a comment
        #[arg(long)]
        file: Option<String>,
        /// Directory for screenshot results
        #[arg(long)]
        screenshot_dir: Option<PathBuf>,
        #[arg(long)]
        thai: bool,
    },
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<KhamsangConfig> {
    match path {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(ConfigLoader::load_default().await?),
    }
}

fn collector_for(config: &KhamsangConfig) -> anyhow::Result<Box<dyn EvidenceCollector>> {
    match HttpEvidenceCollector::from_config(&config.evidence)? {
        Some(collector) => Ok(Box::new(collector)),
        None => {
            warn!("No evidence endpoint configured; on-screen targets will not resolve");
            Ok(Box::new(StaticEvidence::default()))
        }
    }
}

fn parse_command(config: &KhamsangConfig, text: String, thai: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_config(config, Box::new(StaticEvidence::default()))?;
    let instruction = if thai {
        Instruction::thai(text)
    } else {
        Instruction::new(text)
    };
    let analysis = pipeline.analyze(&instruction);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

async fn resolve_command(description: &str, evidence: &Path) -> anyhow::Result<()> {
    let hits = StaticEvidence::load(evidence)
        .await
        .with_context(|| format!("reading {}", evidence.display()))?;
    let evidence = EvidenceSet::new(0, hits.hits().to_vec());

    let report = serde_json::json!({
        "candidates": rank(description, &evidence),
        "target": resolve(description, &evidence),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_command(
    config: &KhamsangConfig,
    visible: bool,
    file: Option<String>,
    screenshot_dir: Option<PathBuf>,
    thai: bool,
) -> anyhow::Result<()> {
    let templates = TemplateLibrary::load(&config.evidence.templates)
        .await
        .context("loading templates")?;
    let pipeline = Pipeline::from_config(config, collector_for(config)?)?.with_templates(templates);

    let mut backend = HeadlessBackend::with_options(LaunchOptions {
        visible,
        viewport: config.viewport,
    });
    backend
        .launch()
        .await
        .map_err(|e| anyhow!("Failed to launch backend: {}", e))?;
    info!("Browser ready");

    let session = Session {
        pipeline: &pipeline,
        screenshot_dir,
        thai,
    };
    let output = OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| println!("{}", msg),
    };

    let result = match file {
        Some(path) => cli::run_file(
            &mut backend,
            &session,
            output,
            &path,
            FileOptions {
                stop_on_error: true,
            },
        )
        .await
        .map_err(|e| anyhow!("Error executing file {}: {}", path, e)),
        None => cli::run_repl(
            &mut backend,
            &session,
            output,
            ReplOptions {
                banner_lines: &[
                    "Browser launched. Enter instructions, e.g. 'เปิดเว็บ Google' or 'คลิก ปุ่ม ค้นหา'.",
                    "Type text with quotes: พิมพ์ \"รองเท้า\" ในช่องค้นหา",
                    "Type 'exit', 'quit' or 'ออก' to close.",
                ],
                prompt: "> ",
                exit_commands: &["exit", "quit", "ออก"],
                handle_ctrl_c: true,
                ctrl_c_message: Some("Interrupted"),
            },
        )
        .await
        .map_err(|e| anyhow!("Error during session: {}", e)),
    };

    backend
        .close()
        .await
        .map_err(|e| anyhow!("Failed to close backend: {}", e))?;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries JSON and outcomes.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref()).await?;

    match args.mode {
        Mode::Parse { text, thai } => parse_command(&config, text, thai),
        Mode::Resolve {
            description,
            evidence,
        } => resolve_command(&description, &evidence).await,
        Mode::Run {
            visible,
            file,
            screenshot_dir,
            thai,
        } => run_command(&config, visible, file, screenshot_dir, thai).await,
    }
}
