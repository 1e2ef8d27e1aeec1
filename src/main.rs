mod actions;
mod backdrop;
mod client;
mod composer;
mod config;
mod logging;
mod tui;
mod ui;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use config::{ConfigFile, ResolvedConfig};

#[derive(Parser, Debug)]
#[command(
    name = "tonecoach",
    about = "Browse email threads and stream coaching feedback on your draft replies",
    long_about = None,
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Profile to use from config file
    #[arg(short, long, env = "TONECOACH_PROFILE", global = true)]
    profile: Option<String>,

    /// Override the assistant's base URL
    #[arg(long, env = "TONECOACH_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Override the startup search query
    #[arg(short, long, env = "TONECOACH_QUERY")]
    query: Option<String>,

    /// Write a default config file to ~/.config/tonecoach/config.toml and exit
    #[arg(long)]
    init: bool,

    /// Generate shell completions and print to stdout (bash, zsh, fish, elvish)
    #[arg(long, value_name = "SHELL")]
    completions: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List threads matching a query
    Threads {
        /// Search query (defaults to the profile's query)
        query: Option<String>,
    },
    /// Print the full text of one thread
    Thread { id: String },
    /// Stream feedback on a draft reply
    Coach {
        #[arg(short, long)]
        thread: String,
        #[arg(short, long)]
        draft: String,
        #[arg(short, long, default_value = "")]
        goal: String,
    },
    /// Stream the assistant's classification of a thread
    Madlibs {
        #[arg(short, long)]
        thread: String,
    },
    /// Generate background images for a page and print the stylesheet
    Backdrop {
        /// HTML document to inspect for .bg-grid / .bg-sunset elements
        #[arg(long)]
        html: PathBuf,
        /// Stylesheets declaring --sun-core / --sun-rim
        #[arg(long)]
        css: Vec<PathBuf>,
        /// Write the stylesheet here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ── --init ────────────────────────────────────────────────────────────────
    if args.init {
        let path = ConfigFile::write_default_if_missing()?;
        println!("Config written to: {}", path.display());
        println!("Edit it, then run: tonecoach");
        return Ok(());
    }

    // ── --completions ─────────────────────────────────────────────────────────
    if let Some(shell_name) = &args.completions {
        return generate_completions(shell_name);
    }

    let log_path = config::log_path();
    if let Err(e) = logging::init(&log_path) {
        eprintln!("  logging disabled: {e:#}");
    }

    let file = ConfigFile::load()?;
    let resolved = ResolvedConfig::resolve(
        &file,
        args.profile.as_deref(),
        args.base_url.as_deref(),
        args.query.as_deref(),
    );
    tracing::info!(profile = %resolved.profile_name, base_url = %resolved.base_url, "config resolved");

    match args.command {
        // ── Interactive TUI mode ──────────────────────────────────────────────
        None => {
            let client = client::Client::new(resolved.base_url.clone())?;
            tui::run(client, resolved).await
        }
        Some(cmd) => run_plain(cmd, &resolved).await,
    }
}

// ── Plain mode (stdout, no TUI) ───────────────────────────────────────────────

async fn run_plain(cmd: Command, resolved: &ResolvedConfig) -> Result<()> {
    let client = || client::Client::new(resolved.base_url.clone());
    match cmd {
        Command::Threads { query } => {
            let query = query.unwrap_or_else(|| resolved.query.clone());
            let threads = client()?.threads(&query).await?;
            println!();
            println!("  Threads  {query}  ({})", threads.len());
            for t in &threads {
                println!("  {} {:<18} {}", ui::thread_bullet(false), t.id, t.snippet.replace('\n', " "));
            }
            println!();
        }
        Command::Thread { id } => {
            let detail = client()?.thread(&id).await?;
            println!("{}", detail.thread);
        }
        Command::Coach { thread, draft, goal } => {
            print_stream_header(composer::StreamKind::Coach, &thread);
            client()?.coach(&draft, &goal, &thread, print_chunk).await?;
            println!();
        }
        Command::Madlibs { thread } => {
            print_stream_header(composer::StreamKind::Madlibs, &thread);
            client()?.madlibs(&thread, print_chunk).await?;
            println!();
        }
        Command::Backdrop { html, css, out } => run_backdrop(&html, &css, out.as_deref())?,
    }
    Ok(())
}

fn print_stream_header(kind: composer::StreamKind, thread: &str) {
    println!();
    println!("  {} tonecoach {}  ·  thread {thread}", ui::stream_glyph(kind), kind.label());
    println!();
}

fn print_chunk(chunk: &str) {
    print!("{chunk}");
    let _ = std::io::stdout().flush();
}

// ── Backdrop ──────────────────────────────────────────────────────────────────

fn run_backdrop(html: &std::path::Path, css: &[PathBuf], out: Option<&std::path::Path>) -> Result<()> {
    let html_src = std::fs::read_to_string(html)
        .with_context(|| format!("Failed to read {}", html.display()))?;
    let sheets = css
        .iter()
        .map(|p| std::fs::read_to_string(p).with_context(|| format!("Failed to read {}", p.display())))
        .collect::<Result<Vec<_>>>()?;
    let sheet_refs: Vec<&str> = sheets.iter().map(String::as_str).collect();

    let page = backdrop::Page::parse(&html_src, &sheet_refs);
    let decorations = backdrop::decorate(&page)?;
    let stylesheet = decorations.to_css();

    match out {
        Some(path) => {
            std::fs::write(path, &stylesheet)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if decorations.is_empty() {
                eprintln!("  no .bg-grid or .bg-sunset elements in {}", html.display());
            } else {
                eprintln!("  ✓ backdrop written to {}", path.display());
            }
        }
        None => print!("{stylesheet}"),
    }
    Ok(())
}

// ── Shell completions ─────────────────────────────────────────────────────────

fn generate_completions(shell_name: &str) -> Result<()> {
    use clap_complete::{Shell, generate};

    let shell: Shell = match shell_name.to_lowercase().as_str() {
        "bash"    => Shell::Bash,
        "zsh"     => Shell::Zsh,
        "fish"    => Shell::Fish,
        "elvish"  => Shell::Elvish,
        _ => {
            eprintln!("Unknown shell: {shell_name}");
            eprintln!("Supported: bash, zsh, fish, elvish");
            std::process::exit(1);
        }
    };

    let mut cmd = Args::command();
    generate(shell, &mut cmd, "tonecoach", &mut std::io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_coach_subcommand() {
        let args = Args::try_parse_from([
            "tonecoach", "--base-url", "http://x", "coach",
            "--thread", "1", "--draft", "Sounds good", "--goal", "under 50 words",
        ])
        .unwrap();
        assert_eq!(args.base_url.as_deref(), Some("http://x"));
        match args.command {
            Some(Command::Coach { thread, draft, goal }) => {
                assert_eq!(thread, "1");
                assert_eq!(draft, "Sounds good");
                assert_eq!(goal, "under 50 words");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_backdrop_writes_stylesheet() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("index.html");
        let css = dir.path().join("site.css");
        let out = dir.path().join("bg.css");
        std::fs::write(&html, r#"<body><div class="bg-sunset"></div></body>"#).unwrap();
        std::fs::write(&css, ":root { --sun-core: #ffeeaa; }").unwrap();

        run_backdrop(&html, &[css], Some(&out)).unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.starts_with(".bg-sunset {"));
        assert!(written.contains("data:image/png;base64,"));
        assert!(!written.contains(".bg-grid"));
    }
}
