mod reports;
mod runner;
mod script;
mod util;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use runner::{PlaythroughRunner, ScenarioResult};
use script::PlaythroughScript;
use slideweave_game::{EngineConfig, SlideCatalog, read_catalog_from_path};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "slideweave-tester", version = "0.1.0")]
#[command(about = "Replays scripted playthroughs against a Slideweave slide graph")]
struct Args {
    /// Slide graph to load
    #[arg(long, default_value = "slideweave-game/assets/slides.json")]
    slides: PathBuf,

    /// Script files or directories of scripts (comma-separated)
    #[arg(long, default_value = "slideweave-tester/scripts")]
    scripts: String,

    /// List the slides in the graph and exit
    #[arg(long)]
    list_slides: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail when the slide graph has dangling references
    #[arg(long)]
    validate: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).await?;
    let catalog = load_catalog(&args.slides).await?;

    if maybe_list_slides(&args, &catalog)? {
        return Ok(());
    }

    announce_banner();
    check_catalog(&args, &catalog)?;

    let start_time = Instant::now();
    let scripts = load_scripts(&args.scripts)?;
    log::debug!("loaded {} playthrough scripts", scripts.len());
    let runner = PlaythroughRunner::new(catalog, config, args.verbose);
    let results = runner.run_all(&scripts);

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

async fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_json(&json).with_context(|| format!("malformed config {}", path.display()))
}

async fn load_catalog(path: &Path) -> Result<Arc<SlideCatalog>> {
    let catalog = read_catalog_from_path(path).await?;
    Ok(Arc::new(catalog))
}

fn maybe_list_slides(args: &Args, catalog: &SlideCatalog) -> Result<bool> {
    if !args.list_slides {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available slides:")?;
    for (id, slide) in catalog.iter() {
        let mut description = format!("{} buttons", slide.buttons.len());
        if slide.is_minigame() {
            description.push_str(", minigame");
        }
        if let Some(fallback) = &slide.fallback_slide {
            write!(description, ", falls back to {fallback}")?;
        }
        writeln!(output_target.writer(), "  {id:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎞️ Slideweave Playthrough Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn check_catalog(args: &Args, catalog: &SlideCatalog) -> Result<()> {
    let issues = catalog.validate();
    for issue in &issues {
        log::warn!("{}: {issue}", args.slides.display());
        eprintln!("⚠️  {}", issue.to_string().yellow());
    }
    if args.validate && !issues.is_empty() {
        bail!(
            "{} has {} graph issue(s)",
            args.slides.display(),
            issues.len()
        );
    }
    Ok(())
}

fn load_scripts(scripts_arg: &str) -> Result<Vec<PlaythroughScript>> {
    let mut scripts = Vec::new();
    for entry in split_csv(scripts_arg) {
        let path = PathBuf::from(entry);
        for file in script_files(&path)? {
            scripts.extend(PlaythroughScript::load_file(&file)?);
        }
    }
    if scripts.is_empty() {
        bail!("no playthrough scripts found in `{scripts_arg}`");
    }
    Ok(scripts)
}

fn script_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in
        std::fs::read_dir(path).with_context(|| format!("failed to list {}", path.display()))?
    {
        let file = entry?.path();
        if file.extension().is_some_and(|ext| ext == "json") {
            files.push(file);
        }
    }
    files.sort();
    Ok(files)
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Slideweave Playthrough Results\n\n_No scripts executed._"
                )?;
            } else {
                reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(&mut output_target, "No scripts executed.")?;
            } else {
                reports::generate_console_report(
                    &mut output_target,
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
