use crate::annotation::{AnnotationSpec, DEFAULT_COLOR, DEFAULT_FONT_SIZE, PageSelection, Position};
use crate::signing::SignatureAlgorithm;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Styling and placement shared by `watermark` and `sign`.
#[derive(Debug, Clone, Args)]
pub struct AnnotationArgs {
    /// Font size in points
    #[arg(long = "font-size", default_value_t = DEFAULT_FONT_SIZE)]
    pub font_size: f64,

    /// Named color or hex value (#RGB or #RRGGBB)
    #[arg(long = "color", default_value = DEFAULT_COLOR)]
    pub color: String,

    /// Named placement: top-left, top-right, bottom-left, bottom-right, center
    #[arg(long = "position", default_value = "bottom-right")]
    pub position: Position,

    /// Explicit x coordinate (requires --y)
    #[arg(long = "x", requires = "y", allow_hyphen_values = true)]
    pub x: Option<f64>,

    /// Explicit y coordinate (requires --x)
    #[arg(long = "y", requires = "x", allow_hyphen_values = true)]
    pub y: Option<f64>,

    /// Pages to mark: all, even, odd or a comma-separated list
    #[arg(long = "pages", default_value = "all")]
    pub pages: String,

    /// Rotation in degrees, counter-clockwise
    #[arg(long = "rotation", default_value_t = 0.0, allow_hyphen_values = true)]
    pub rotation: f64,

    /// Fill opacity between 0 and 1
    #[arg(long = "opacity", default_value_t = 1.0)]
    pub opacity: f64,
}

impl AnnotationArgs {
    pub fn to_spec(&self, text: &str) -> AnnotationSpec {
        let pages: PageSelection = match self.pages.parse() {
            Ok(pages) => pages,
            Err(never) => match never {},
        };
        let mut spec = AnnotationSpec::new(text)
            .with_font_size(self.font_size)
            .with_color(self.color.clone())
            .with_position(self.position)
            .with_pages(pages)
            .with_rotation(self.rotation)
            .with_opacity(self.opacity);
        if let (Some(x), Some(y)) = (self.x, self.y) {
            spec = spec.with_coordinates(x, y);
        }
        spec
    }
}

#[derive(Debug, Subcommand)]
pub enum DocumentCommands {
    /// Print the number of pages
    Pages {
        /// PDF file
        file: PathBuf,
    },
    /// Print page count, PDF version, size and checksum
    Info {
        /// PDF file
        file: PathBuf,
    },
    /// Print the SHA-256 checksum of a file
    Checksum {
        /// File to hash
        file: PathBuf,

        /// Print only the first 16 hex characters
        #[arg(long = "short")]
        short: bool,
    },
    /// Overlay text on selected pages
    Watermark {
        /// Input PDF
        input: PathBuf,

        /// Text to draw
        #[arg(long = "text")]
        text: String,

        /// Output PDF (default: <input>-watermarked.pdf)
        #[arg(long = "output", short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        appearance: AnnotationArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum KeyCommands {
    /// Generate a new key pair
    Generate {
        /// Where to write the key-pair JSON
        #[arg(long = "output", short = 'o', default_value = "pdfseal-key.json")]
        output: PathBuf,

        /// Signature algorithm: ECDSA_P256_SHA256 or ED25519
        #[arg(long = "algorithm", default_value = "ECDSA_P256_SHA256")]
        algorithm: SignatureAlgorithm,

        /// Overwrite an existing file
        #[arg(long = "force")]
        force: bool,
    },
    /// Show fingerprint and algorithm of a key-pair file
    Info {
        /// Key-pair JSON file
        file: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum SignatureCommands {
    /// Sign a PDF and write a marked copy plus a signature record
    Sign {
        /// Input PDF
        input: PathBuf,

        /// Key-pair JSON or private key file (default: $PDFSEAL_KEY)
        #[arg(long = "key", short = 'k')]
        key: Option<PathBuf>,

        /// Output PDF (default: <input>-signed.pdf)
        #[arg(long = "output", short = 'o')]
        output: Option<PathBuf>,

        /// Signature record JSON (default: <output>.sig.json)
        #[arg(long = "record")]
        record: Option<PathBuf>,

        /// Visible text (default: $PDFSEAL_VISIBLE_TEXT or "DIGITALLY SIGNED")
        #[arg(long = "text")]
        text: Option<String>,

        #[command(flatten)]
        appearance: AnnotationArgs,
    },
    /// Verify a PDF against a signature record
    Verify {
        /// PDF to check; this must be the file that was signed, not the marked copy
        input: PathBuf,

        /// Signature record JSON
        #[arg(long = "record")]
        record: PathBuf,

        /// Key-pair JSON or public key file (default: $PDFSEAL_KEY)
        #[arg(long = "key", short = 'k')]
        key: Option<PathBuf>,

        /// Print the full verification result as JSON
        #[arg(long = "json")]
        json: bool,
    },
}
