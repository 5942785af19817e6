use crate::backend::Backend;
use crate::pipeline::Pipeline;
use khamsang_common::protocol::{ActionOutcome, Instruction};
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

/// State shared by every line of a session.
pub struct Session<'a> {
    pub pipeline: &'a Pipeline,
    /// Where `screenshot` results are written; discarded when `None`.
    pub screenshot_dir: Option<PathBuf>,
    pub thai: bool,
}

pub struct FileOptions {
    pub stop_on_error: bool,
}

pub struct ReplOptions<'a> {
    pub banner_lines: &'a [&'a str],
    pub prompt: &'a str,
    pub exit_commands: &'a [&'a str],
    pub handle_ctrl_c: bool,
    pub ctrl_c_message: Option<&'a str>,
}

/// One-line summary of an outcome.
pub fn format_outcome(outcome: &ActionOutcome) -> String {
    let detail = outcome.detail.as_deref().unwrap_or("");
    match outcome.last_error {
        None => format!("ok ({} attempt(s)): {}", outcome.attempts, detail),
        Some(kind) if detail.is_empty() => {
            format!("{} ({} attempt(s))", kind, outcome.attempts)
        }
        Some(kind) => format!("{} ({} attempt(s)): {}", kind, outcome.attempts, detail),
    }
}

async fn save_screenshot(dir: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let path = dir.join(format!("screenshot-{}.png", millis));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

async fn execute_line<B: Backend + ?Sized>(
    backend: &mut B,
    session: &Session<'_>,
    line: &str,
) -> Result<String, String> {
    let instruction = if session.thai {
        Instruction::thai(line)
    } else {
        Instruction::new(line)
    };
    let outcome = session.pipeline.run_instruction(&instruction, backend).await;
    let mut summary = format_outcome(&outcome);

    if let (Some(bytes), Some(dir)) = (&outcome.screenshot, &session.screenshot_dir) {
        match save_screenshot(dir, bytes).await {
            Ok(path) => summary.push_str(&format!(" -> {}", path.display())),
            Err(e) => return Err(format!("{} (saving screenshot failed: {})", summary, e)),
        }
    }

    if outcome.succeeded {
        Ok(summary)
    } else {
        Err(summary)
    }
}

pub async fn run_file<B: Backend + ?Sized>(
    backend: &mut B,
    session: &Session<'_>,
    output: OutputHandlers,
    path: &str,
    options: FileOptions,
) -> Result<(), Box<dyn Error>> {
    let content = tokio::fs::read_to_string(path).await?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match execute_line(backend, session, trimmed).await {
            Ok(result) => (output.out)(&result),
            Err(err) => {
                (output.err)(&format!("Error executing line '{}': {}", trimmed, err));
                if options.stop_on_error {
                    return Err(io::Error::other(err).into());
                }
            }
        }
    }
    Ok(())
}

/// Possible outcomes from reading a single REPL line.
enum ReadLineResult {
    Input(String),
    /// Empty line; re-prompt.
    Skip,
    /// EOF or exit command.
    Exit,
    Error(io::Error),
}

async fn read_line(
    reader: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    options: &ReplOptions<'_>,
    output: OutputHandlers,
) -> ReadLineResult {
    if options.handle_ctrl_c {
        tokio::select! {
            line = reader.next_line() => classify_line(line, options.exit_commands),
            _ = tokio::signal::ctrl_c() => {
                if let Some(message) = options.ctrl_c_message {
                    (output.out)(message);
                }
                ReadLineResult::Exit
            }
        }
    } else {
        classify_line(reader.next_line().await, options.exit_commands)
    }
}

fn classify_line(
    result: Result<Option<String>, io::Error>,
    exit_commands: &[&str],
) -> ReadLineResult {
    match result {
        Ok(Some(input)) => {
            let trimmed = input.trim().to_string();
            if trimmed.is_empty() {
                ReadLineResult::Skip
            } else if exit_commands.contains(&trimmed.as_str()) {
                ReadLineResult::Exit
            } else {
                ReadLineResult::Input(trimmed)
            }
        }
        Ok(None) => ReadLineResult::Exit,
        Err(e) => ReadLineResult::Error(e),
    }
}

pub async fn run_repl<B: Backend + ?Sized>(
    backend: &mut B,
    session: &Session<'_>,
    output: OutputHandlers,
    options: ReplOptions<'_>,
) -> Result<(), Box<dyn Error>> {
    for line in options.banner_lines {
        (output.out)(line);
    }

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin).lines();
    let mut stdout = io::stdout();

    loop {
        print!("{}", options.prompt);
        stdout.flush()?;

        match read_line(&mut reader, &options, output).await {
            ReadLineResult::Input(line) => match execute_line(backend, session, &line).await {
                Ok(result) => (output.out)(&result),
                Err(err) => (output.err)(&format!("Error: {}", err)),
            },
            ReadLineResult::Skip => continue,
            ReadLineResult::Exit => break,
            ReadLineResult::Error(e) => return Err(e.into()),
        }
    }
    Ok(())
}
