//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::options::{FootnoteHandling, RenderOptions};

pub use cli::{
    CliArgs, Command, CopyArgs, CopyOverrides, ExportOverrides, LoggingOverrides, VaultOverride,
    WatchArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vault-copy";
const ENV_PREFIX: &str = "VAULT_COPY";
const DEFAULT_VAULT_ROOT: &str = ".";
const DEFAULT_SETTLE_DELAY_MS: u64 = 100;
const DEFAULT_SETTLE_MAX_WAIT_MS: u64 = 5_000;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub vault: VaultSettings,
    pub render: RenderSettings,
    pub export: RenderOptions,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub settle_delay: Duration,
    pub settle_max_wait: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Copy(args) => raw.apply_copy_overrides(&args.overrides),
        Command::Watch(args) => {
            raw.apply_vault_override(&args.vault);
            raw.apply_logging_overrides(&args.logging);
            raw.apply_export_overrides(&args.export);
        }
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    vault: RawVaultSettings,
    render: RawRenderSettings,
    export: RawExportSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawVaultSettings {
    root: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    settle_delay_ms: Option<u64>,
    settle_max_wait_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawExportSettings {
    remove_front_matter: Option<bool>,
    remove_link_text: Option<bool>,
    convert_svg_to_bitmap: Option<bool>,
    format_as_tables: Option<bool>,
    embed_external_links: Option<bool>,
    remove_dataview_metadata_lines: Option<bool>,
    footnote_handling: Option<String>,
    use_custom_stylesheet: Option<bool>,
    style_sheet: Option<String>,
    style_sheet_path: Option<PathBuf>,
    bare_html_only: Option<bool>,
    file_name_as_header: Option<bool>,
}

impl RawSettings {
    fn apply_copy_overrides(&mut self, overrides: &CopyOverrides) {
        self.apply_vault_override(&overrides.vault);
        self.apply_logging_overrides(&overrides.logging);
        self.apply_export_overrides(&overrides.export);
    }

    fn apply_vault_override(&mut self, overrides: &VaultOverride) {
        if let Some(root) = overrides.root.as_ref() {
            self.vault.root = Some(root.clone());
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_export_overrides(&mut self, overrides: &ExportOverrides) {
        let export = &mut self.export;
        if overrides.format_as_tables {
            export.format_as_tables = Some(true);
        }
        if let Some(mode) = overrides.footnotes {
            export.footnote_handling = Some(mode.as_str().to_string());
        }
        if overrides.keep_front_matter {
            export.remove_front_matter = Some(false);
        }
        if overrides.no_svg_to_bitmap {
            export.convert_svg_to_bitmap = Some(false);
        }
        if overrides.embed_external_links {
            export.embed_external_links = Some(true);
        }
        if overrides.remove_dataview_metadata {
            export.remove_dataview_metadata_lines = Some(true);
        }
        if overrides.bare_html {
            export.bare_html_only = Some(true);
        }
        if overrides.file_name_as_header {
            export.file_name_as_header = Some(true);
        }
        if let Some(path) = overrides.style_sheet_path.as_ref() {
            export.style_sheet_path = Some(path.clone());
            export.use_custom_stylesheet = Some(true);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            vault,
            render,
            export,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let vault = build_vault_settings(vault)?;
        let render = build_render_settings(render)?;
        let export = build_export_settings(export)?;

        Ok(Self {
            logging,
            vault,
            render,
            export,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_vault_settings(vault: RawVaultSettings) -> Result<VaultSettings, LoadError> {
    let root = vault
        .root
        .unwrap_or_else(|| PathBuf::from(DEFAULT_VAULT_ROOT));
    if root.as_os_str().is_empty() {
        return Err(LoadError::invalid("vault.root", "must not be empty"));
    }
    Ok(VaultSettings { root })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let delay_ms = render.settle_delay_ms.unwrap_or(DEFAULT_SETTLE_DELAY_MS);
    if delay_ms == 0 {
        return Err(LoadError::invalid(
            "render.settle_delay_ms",
            "must be greater than zero",
        ));
    }

    let max_wait_ms = render
        .settle_max_wait_ms
        .unwrap_or(DEFAULT_SETTLE_MAX_WAIT_MS);
    if max_wait_ms < delay_ms {
        return Err(LoadError::invalid(
            "render.settle_max_wait_ms",
            format!("must be at least the settle delay ({delay_ms} ms)"),
        ));
    }

    Ok(RenderSettings {
        settle_delay: Duration::from_millis(delay_ms),
        settle_max_wait: Duration::from_millis(max_wait_ms),
    })
}

fn build_export_settings(export: RawExportSettings) -> Result<RenderOptions, LoadError> {
    let defaults = RenderOptions::default();

    let footnote_handling = match export.footnote_handling {
        Some(value) => FootnoteHandling::from_str(value.trim())
            .map_err(|err| LoadError::invalid("export.footnote_handling", err.to_string()))?,
        None => defaults.footnote_handling,
    };

    let custom_sheet = match (export.style_sheet_path, export.style_sheet) {
        (Some(path), _) => Some(std::fs::read_to_string(&path).map_err(|err| {
            LoadError::invalid(
                "export.style_sheet_path",
                format!("cannot read `{}`: {err}", path.display()),
            )
        })?),
        (None, sheet) => sheet,
    };
    let use_custom_stylesheet = export
        .use_custom_stylesheet
        .unwrap_or(custom_sheet.is_some());
    if use_custom_stylesheet && custom_sheet.is_none() {
        return Err(LoadError::invalid(
            "export.use_custom_stylesheet",
            "requires `export.style_sheet` or `export.style_sheet_path`",
        ));
    }

    Ok(RenderOptions {
        remove_front_matter: export
            .remove_front_matter
            .unwrap_or(defaults.remove_front_matter),
        remove_link_text: export.remove_link_text.unwrap_or(defaults.remove_link_text),
        convert_svg_to_bitmap: export
            .convert_svg_to_bitmap
            .unwrap_or(defaults.convert_svg_to_bitmap),
        format_as_tables: export.format_as_tables.unwrap_or(defaults.format_as_tables),
        embed_external_links: export
            .embed_external_links
            .unwrap_or(defaults.embed_external_links),
        remove_dataview_metadata_lines: export
            .remove_dataview_metadata_lines
            .unwrap_or(defaults.remove_dataview_metadata_lines),
        footnote_handling,
        use_custom_stylesheet,
        style_sheet: custom_sheet.unwrap_or(defaults.style_sheet),
        bare_html_only: export.bare_html_only.unwrap_or(defaults.bare_html_only),
        file_name_as_header: export
            .file_name_as_header
            .unwrap_or(defaults.file_name_as_header),
    })
}

/// Parse CLI arguments and resolve settings.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
