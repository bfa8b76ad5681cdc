use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::options::FootnoteHandling;

/// Command-line arguments for the vault-copy binary.
#[derive(Debug, Parser)]
#[command(
    name = "vault-copy",
    version,
    about = "Export vault notes as self-contained HTML documents"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VAULT_COPY_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Copy one note as an HTML document.
    Copy(Box<CopyArgs>),
    /// Re-copy notes whenever they change on disk.
    Watch(WatchArgs),
}

#[derive(Debug, Args, Clone)]
pub struct CopyArgs {
    /// Markdown note to copy.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Write the document here instead of standard output.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Treat the input as a selection rather than the whole note.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub selection: bool,

    #[command(flatten)]
    pub overrides: CopyOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct WatchArgs {
    /// File the latest copied document is written to.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    #[command(flatten)]
    pub vault: VaultOverride,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub export: ExportOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct VaultOverride {
    /// Override the vault root directory.
    #[arg(long = "vault", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CopyOverrides {
    #[command(flatten)]
    pub vault: VaultOverride,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(flatten)]
    pub export: ExportOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ExportOverrides {
    /// Render code blocks and callouts as tables.
    #[arg(long = "format-as-tables", action = clap::ArgAction::SetTrue)]
    pub format_as_tables: bool,

    /// Footnote handling (remove-all|leave-link|remove-link|title-attribute).
    #[arg(long = "footnotes", value_name = "MODE")]
    pub footnotes: Option<FootnoteHandling>,

    /// Keep the front matter block in the output.
    #[arg(long = "keep-front-matter", action = clap::ArgAction::SetTrue)]
    pub keep_front_matter: bool,

    /// Keep vector graphics as they are instead of drawing them to bitmaps.
    #[arg(long = "no-svg-to-bitmap", action = clap::ArgAction::SetTrue)]
    pub no_svg_to_bitmap: bool,

    /// Inline remote images as well.
    #[arg(long = "embed-external-links", action = clap::ArgAction::SetTrue)]
    pub embed_external_links: bool,

    /// Blank inline `key:: value` metadata lines before rendering.
    #[arg(long = "remove-dataview-metadata", action = clap::ArgAction::SetTrue)]
    pub remove_dataview_metadata: bool,

    /// Emit only the rendered fragment, without the document shell.
    #[arg(long = "bare-html", action = clap::ArgAction::SetTrue)]
    pub bare_html: bool,

    /// Start the document with the file name as a heading.
    #[arg(long = "file-name-as-header", action = clap::ArgAction::SetTrue)]
    pub file_name_as_header: bool,

    /// Use this stylesheet instead of the built-in one.
    #[arg(long = "style-sheet", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub style_sheet_path: Option<PathBuf>,
}
