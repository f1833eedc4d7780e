//! Shared constants for the pipeline
//!

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

/// Where the final image lands unless told otherwise
pub static DEFAULT_OUTPUT_PATH: LazyLock<PathBuf> = LazyLock::new(|| PathBuf::from("output.png"));

/// Every composited image is rescaled to this height before mixing.
pub const TARGET_HEIGHT: u32 = 800;

/// Widest an image may get once rescaled to [TARGET_HEIGHT]. Anything
/// flatter than 8:1 is a banner, not a picture.
pub const MAX_SCALED_WIDTH: u32 = 8 * TARGET_HEIGHT;

/// Timeout for downloading a source image.
pub const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Timeout for JSON lookups against the image APIs.
pub const IMAGE_API_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for the quote APIs.
pub const QUOTE_API_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the publish calls.
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest image body we will read into memory.
pub const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

/// How many source images a run asks for.
pub const IMAGES_PER_RUN: usize = 2;

/// Column width for wrapping overlay text.
pub const WRAP_COLUMNS: usize = 30;

/// Padding between the panel and the image edge.
pub const PANEL_MARGIN: u32 = 20;

/// Extra padding added to each edge of the panel when drawn.
pub const PANEL_PADDING: u32 = 10;

/// Vertical gap between wrapped lines.
pub const LINE_SPACING: u32 = 6;

/// Alpha of the black panel behind the text.
pub const PANEL_ALPHA: u8 = 180;

/// Pixel size used with a TrueType font.
pub const FONT_SIZE_PX: f32 = 34.0;

/// Scale applied to the built-in 8x8 font.
pub const BITMAP_FONT_SCALE: u32 = 4;

/// Preferred font file, looked up in [FONT_DIRS].
pub const PREFERRED_FONT: &str = "DejaVuSans-Bold.ttf";

/// Directories searched for [PREFERRED_FONT].
pub const FONT_DIRS: &[&str] = &[
    ".",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/TTF",
    "/usr/local/share/fonts",
    "/Library/Fonts",
];

/// Captions are cut to this many characters.
pub const CAPTION_MAX_CHARS: usize = 250;

/// Appended to a caption that was cut.
pub const ELLIPSIS: &str = "...";

/// Emoji sprinkled in front of each caption.
pub const EMOJI_POOL: &[&str] = &[
    "🔥", "💀", "😳", "✨", "🤡", "🍆", "🍑", "🤖", "😈", "🥴", "🤣", "🙃", "🌶️", "🌈", "👑",
];

/// Hashtags, one of which is sometimes appended.
pub const HASHTAGS: &[&str] = &["#FrankensteinBot", "#meme", "#chaos", "#cats"];

/// Nonsense phrases, one of which is sometimes appended.
pub const NONSENSE: &[&str] = &["I demand tea.", "This one me.", "Deploy the muffins."];

/// Used when every quote API lets us down.
pub const FALLBACK_QUOTES: &[&str] = &[
    "Life is short, smile while you still have teeth.",
    "I came. I saw. I made it weird.",
];

/// Hosts that serve animal pictures, refused in unrestricted mode.
pub const ANIMAL_DOMAINS: &[&str] = &["thecatapi.com", "placekitten.com", "dog.ceo"];

/// Chance that the quote is drawn onto the image.
pub const TEXT_OVERLAY_CHANCE: f64 = 0.6;

/// Chance that the caption carries the real quote rather than a blank.
pub const CAPTION_QUOTE_CHANCE: f64 = 0.9;

/// Chance that a hashtag is appended to the caption.
pub const HASHTAG_CHANCE: f64 = 0.6;

/// Chance that a nonsense phrase is appended to the caption.
pub const NONSENSE_CHANCE: f64 = 0.35;
