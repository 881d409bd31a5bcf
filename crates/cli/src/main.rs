//! CLI tool for embedding narration scripts into PowerPoint speaker notes.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use deck_core::{Deck, NarrationPipeline, Pacing, PresentationFormat, Slide, TranscriptSource};
use deck_pptx::{ContentTypePolicy, NotesOptions, NotesPatcher, Package, SlideExtractor};
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Embed narration scripts into PowerPoint decks as speaker notes.
#[derive(Parser, Debug)]
#[command(name = "deck-notes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the slides of a deck (title, body, existing notes) as JSON
    Extract {
        /// Input PowerPoint file (.pptx)
        input: PathBuf,

        /// Write JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split a transcript into per-slide scripts and print the slides as JSON
    Split {
        /// Transcript text file
        transcript: PathBuf,

        /// Deck the transcript narrates
        #[arg(short, long)]
        deck: PathBuf,
    },

    /// Write narration into a copy of the deck as speaker notes
    Attach(AttachArgs),
}

#[derive(Args, Debug)]
struct AttachArgs {
    /// Input PowerPoint file (.pptx)
    input: PathBuf,

    /// Slides JSON (as printed by `extract`/`split`) supplying the scripts
    #[arg(short, long, conflicts_with = "transcript")]
    slides: Option<PathBuf>,

    /// Transcript text file supplying the scripts
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// Output file (default: <input>.notes.pptx next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace notes the deck already has
    #[arg(long)]
    overwrite: bool,

    /// Register a content type override for every notes part
    #[arg(long)]
    per_part_content_types: bool,

    /// Cross-reference notes from the slide list in presentation.xml
    #[arg(long)]
    link_presentation: bool,

    /// Deflate level for the output archive (0-9)
    #[arg(long, default_value = "6")]
    compression_level: i32,

    /// Pause between narration calls, in milliseconds
    #[arg(long, default_value = "0")]
    pace_ms: u64,

    /// Attempts per slide before narration fails
    #[arg(long, default_value = "1")]
    max_attempts: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match &cli.command {
        Command::Extract { input, output } => {
            let deck = read_deck(input)?;
            let json = serde_json::to_string_pretty(&deck)?;
            match output {
                Some(path) => write_output(path, json.as_bytes())?,
                None => println!("{}", json),
            }
        }
        Command::Split { transcript, deck } => {
            let mut deck = read_deck(deck)?;
            let text = fs::read_to_string(transcript)
                .with_context(|| format!("Failed to read {}", transcript.display()))?;
            let pipeline = NarrationPipeline::new(TranscriptSource::new(&text, deck.slides.len()))
                .with_pacing(Pacing::immediate())
                .with_overwrite(true);
            pipeline.run(&mut deck.slides)?;
            println!("{}", serde_json::to_string_pretty(&deck)?);
        }
        Command::Attach(args) => attach(args, cli.verbose)?,
    }

    Ok(())
}

/// Embed notes into a copy of the input deck.
fn attach(args: &AttachArgs, verbose: bool) -> Result<()> {
    let data = fs::read(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    ensure_pptx(&args.input, &data)?;

    let package = Package::from_bytes(&data)?;
    let mut deck = SlideExtractor::new().extract_package(&package, &file_name(&args.input))?;

    if let Some(path) = &args.slides {
        let supplied = read_slides_json(path)?;
        merge_narration(&mut deck.slides, supplied, args.overwrite);
    }
    if let Some(path) = &args.transcript {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let pacing = Pacing::default()
            .with_delay(Duration::from_millis(args.pace_ms))
            .with_max_attempts(args.max_attempts);
        NarrationPipeline::new(TranscriptSource::new(&text, deck.slides.len()))
            .with_pacing(pacing)
            .with_overwrite(args.overwrite)
            .run(&mut deck.slides)?;
    }

    if verbose {
        eprintln!(
            "  {} slides, {} with narration",
            deck.slides.len(),
            deck.narrated_count()
        );
    }

    let policy = if args.per_part_content_types {
        ContentTypePolicy::PerPart
    } else {
        ContentTypePolicy::AnyPresent
    };
    let options = NotesOptions::new()
        .with_content_type_policy(policy)
        .with_link_presentation(args.link_presentation)
        .with_compression_level(args.compression_level);

    let mut package = package;
    let report = NotesPatcher::new(options.clone()).apply(&mut package, &deck.slides)?;
    let bytes = package.to_bytes(options.compression_level)?;

    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&args.input),
    };
    write_output(&output_path, &bytes)?;

    if verbose {
        eprintln!(
            "  Wrote {} notes slides to {}",
            report.notes_parts,
            output_path.display()
        );
    }
    Ok(())
}

/// Open a deck and extract its slides.
fn read_deck(input: &Path) -> Result<Deck> {
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let mut reader = BufReader::new(file);

    // Read magic bytes to detect format
    let mut magic = [0u8; 8];
    reader
        .read_exact(&mut magic)
        .with_context(|| "Failed to read file header")?;
    ensure_pptx(input, &magic)?;

    // Re-open file for parsing
    let file = File::open(input)?;
    let deck = SlideExtractor::new().extract(BufReader::new(file), &file_name(input))?;
    log::debug!("Extracted {} slides from {}", deck.slides.len(), input.display());
    Ok(deck)
}

/// Reject anything that is not a PPTX package.
fn ensure_pptx(path: &Path, header: &[u8]) -> Result<()> {
    let format = PresentationFormat::from_magic(header).or_else(|| {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(PresentationFormat::from_extension)
    });
    match format {
        Some(PresentationFormat::Pptx) => Ok(()),
        Some(PresentationFormat::Ppt) => bail!(
            "{} is a legacy .ppt file; save it as .pptx first",
            path.display()
        ),
        None => bail!("Could not detect file format of {}", path.display()),
    }
}

/// Read slides from JSON: either a bare array or an `extract` document.
fn read_slides_json(path: &Path) -> Result<Vec<Slide>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if let Ok(slides) = serde_json::from_str::<Vec<Slide>>(&text) {
        return Ok(slides);
    }
    let deck: Deck = serde_json::from_str(&text)
        .with_context(|| format!("{} is neither a slide array nor a deck", path.display()))?;
    Ok(deck.slides)
}

/// Copy narration from `supplied` onto the extracted slides by ordinal.
fn merge_narration(slides: &mut [Slide], supplied: Vec<Slide>, overwrite: bool) {
    for incoming in supplied {
        let Some(narration) = incoming.narration else {
            continue;
        };
        match slides.iter_mut().find(|s| s.ordinal == incoming.ordinal) {
            Some(slide) if overwrite || !slide.has_narration() => slide.narration = Some(narration),
            Some(_) => {}
            None => log::warn!("Slide {} not in deck, script ignored", incoming.ordinal),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// `talk.pptx` becomes `talk.notes.pptx` in the same directory.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{}.notes.pptx", stem))
}

/// Write output to a file, creating its directory if needed.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    }

    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
