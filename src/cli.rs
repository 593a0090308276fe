use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::{FIELD_SEPARATOR, INDENT_TOKEN};
use crate::ocr::OcrConfig;

#[derive(Parser, Debug)]
#[command(
    name = "tocmark",
    version,
    about = "Turn photographed table-of-contents pages into PDF bookmarks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recognize table-of-contents images into a title/page line file
    Ocr(OcrArgs),
    /// Indent a line file by inferred heading depth
    Indent(IndentArgs),
    /// Shift every page number by a signed offset
    Offset(OffsetArgs),
    /// Give page-less entries the page of the next numbered entry
    FillPages(FillPagesArgs),
    /// Write an outline file into a PDF as bookmarks
    Apply(ApplyArgs),
    /// Print a PDF's bookmarks in outline file format
    Export(ExportArgs),
    /// Run ocr, indent, offset and fill-pages in one go
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct OcrServiceArgs {
    #[arg(long, env = "TOCMARK_OCR_URL")]
    pub api_url: String,

    #[arg(long, env = "TOCMARK_OCR_SECRET", hide_env_values = true)]
    pub secret_key: String,

    #[arg(long, default_value = "ko")]
    pub lang: String,

    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
}

impl OcrServiceArgs {
    pub fn config(&self) -> OcrConfig {
        OcrConfig {
            api_url: self.api_url.clone(),
            secret_key: self.secret_key.clone(),
            lang: self.lang.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct OcrArgs {
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub service: OcrServiceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct IndentArgs {
    pub input: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct OffsetArgs {
    pub input: PathBuf,

    #[arg(long, allow_hyphen_values = true)]
    pub offset: i64,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FillPagesArgs {
    pub input: PathBuf,

    /// 0 copies the next entry's page, -1 uses the page before it
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub offset: i64,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long)]
    pub outline: PathBuf,

    /// Indentation token repeated once per depth level (`\t` is accepted)
    #[arg(long, default_value = INDENT_TOKEN, value_parser = parse_token)]
    pub indent: String,

    /// Separator between title and page (`\t` is accepted)
    #[arg(long, default_value = FIELD_SEPARATOR, value_parser = parse_token)]
    pub separator: String,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    pub pdf: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long, default_value = ".cache/tocmark")]
    pub work_dir: PathBuf,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub page_offset: i64,

    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub fill_offset: i64,

    #[arg(long)]
    pub pdf: Option<PathBuf>,

    #[command(flatten)]
    pub service: OcrServiceArgs,
}

fn parse_token(raw: &str) -> Result<String, String> {
    let token = raw.replace("\\t", "\t");
    if token.is_empty() {
        return Err("token must not be empty".to_string());
    }
    Ok(token)
}
