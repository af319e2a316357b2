use ab_glyph::FontVec;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;
use threshold_lab::io::save_raster;
use threshold_lab::synthetic::{generate_sample_image, SampleImageSpec};

/// Fonts tried in order when SAMPLE_FONT is not set
const FONT_CANDIDATES: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn load_font() -> Result<Option<FontVec>> {
    let explicit = env::var("SAMPLE_FONT").ok().map(PathBuf::from);

    let path = match explicit {
        Some(path) => Some(path),
        None => FONT_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists()),
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let font_data =
        fs::read(&path).with_context(|| format!("Failed to read font {}", path.display()))?;
    let font = FontVec::try_from_vec(font_data).context("Failed to load font")?;
    Ok(Some(font))
}

fn main() -> Result<()> {
    let output = env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_image.png".to_string());

    let seed = match env::var("SAMPLE_SEED") {
        Ok(value) => Some(
            value
                .parse::<u64>()
                .context("SAMPLE_SEED must be a valid unsigned integer")?,
        ),
        Err(_) => None,
    };

    let font = load_font()?;
    if font.is_none() {
        eprintln!("Warning: no font found, generating the sample image without text");
    }

    let spec = SampleImageSpec {
        seed,
        ..Default::default()
    };
    let image = generate_sample_image(&spec, font.as_ref());
    save_raster(&output, &image)?;

    println!("Created {}", output);
    Ok(())
}
