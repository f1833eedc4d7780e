//! Mash up two local images without touching the network, handy for eyeballing
//! the compositing and the text overlay.

use anyhow::{Context, Result};
use clap::Parser;
use frankenbot::annotate::{CaptionFont, annotate};
use frankenbot::compose::{Strategy, compose_pair};
use frankenbot::config::setup_logging;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

#[derive(Parser, Debug)]
/// Mash up two local images
struct MashupOptions {
    /// First image, the base for overlays
    first: PathBuf,
    /// Second image
    second: PathBuf,
    #[clap(long, short, value_enum)]
    /// Compositing strategy, random when not given
    strategy: Option<Strategy>,
    #[clap(long, short)]
    /// Text to draw onto the result
    text: Option<String>,
    #[clap(long)]
    /// TrueType font for `--text`
    font: Option<PathBuf>,
    #[clap(long)]
    /// Seed for the random choices
    seed: Option<u64>,
    #[clap(long, short, default_value = "mashup.png")]
    /// Where to write the result
    output: PathBuf,
    #[clap(long)]
    /// Enable debug logging
    debug: bool,
}

fn main() -> Result<()> {
    let options = MashupOptions::parse();
    let _ = setup_logging(options.debug);

    let first = image::open(&options.first)
        .with_context(|| format!("Failed to open {}", options.first.display()))?
        .into_rgb8();
    let second = image::open(&options.second)
        .with_context(|| format!("Failed to open {}", options.second.display()))?
        .into_rgb8();

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let strategy = options
        .strategy
        .unwrap_or_else(|| Strategy::random(&mut rng));

    let mut mixed = compose_pair(&first, &second, strategy, &mut rng)?;
    if let Some(text) = options.text.as_deref() {
        let font = CaptionFont::load(options.font.as_deref());
        mixed = annotate(mixed, text, &font)?;
    }
    mixed
        .save(&options.output)
        .with_context(|| format!("Failed to write {}", options.output.display()))?;

    println!(
        "Wrote {} ({}x{}, {}).",
        options.output.display(),
        mixed.width(),
        mixed.height(),
        strategy
    );
    Ok(())
}
