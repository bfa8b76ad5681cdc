use super::*;

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.vault.root, PathBuf::from("."));
    assert_eq!(settings.render.settle_delay, Duration::from_millis(100));
    assert_eq!(settings.render.settle_max_wait, Duration::from_millis(5_000));
    assert_eq!(settings.export, RenderOptions::default());
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.vault.root = Some(PathBuf::from("/from/file"));
    raw.export.format_as_tables = Some(false);
    raw.export.remove_front_matter = Some(true);

    let overrides = CopyOverrides {
        vault: VaultOverride {
            root: Some(PathBuf::from("/from/cli")),
        },
        logging: LoggingOverrides {
            log_level: Some("debug".to_string()),
            log_json: Some(true),
        },
        export: ExportOverrides {
            format_as_tables: true,
            keep_front_matter: true,
            footnotes: Some(FootnoteHandling::RemoveAll),
            ..Default::default()
        },
    };

    raw.apply_copy_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
    assert_eq!(settings.vault.root, PathBuf::from("/from/cli"));
    assert!(settings.export.format_as_tables);
    assert!(!settings.export.remove_front_matter);
    assert_eq!(settings.export.footnote_handling, FootnoteHandling::RemoveAll);
}

#[test]
fn unset_cli_flags_leave_file_values_alone() {
    let mut raw = RawSettings::default();
    raw.export.convert_svg_to_bitmap = Some(false);
    raw.export.embed_external_links = Some(true);

    raw.apply_copy_overrides(&CopyOverrides::default());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(!settings.export.convert_svg_to_bitmap);
    assert!(settings.export.embed_external_links);
}

#[test]
fn invalid_values_name_their_key() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());
    let err = Settings::from_raw(raw).expect_err("invalid level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));

    let mut raw = RawSettings::default();
    raw.export.footnote_handling = Some("sideways".to_string());
    let err = Settings::from_raw(raw).expect_err("invalid footnotes");
    assert!(matches!(err, LoadError::Invalid { key: "export.footnote_handling", .. }));

    let mut raw = RawSettings::default();
    raw.render.settle_delay_ms = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero delay");
    assert!(matches!(err, LoadError::Invalid { key: "render.settle_delay_ms", .. }));

    let mut raw = RawSettings::default();
    raw.render.settle_delay_ms = Some(200);
    raw.render.settle_max_wait_ms = Some(100);
    let err = Settings::from_raw(raw).expect_err("ceiling below delay");
    assert!(matches!(err, LoadError::Invalid { key: "render.settle_max_wait_ms", .. }));
}

#[test]
fn footnote_modes_accept_snake_case() {
    let mut raw = RawSettings::default();
    raw.export.footnote_handling = Some("leave_link".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.export.footnote_handling, FootnoteHandling::LeaveLink);
}

#[test]
fn style_sheet_path_enables_the_custom_sheet() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("export.css");
    std::fs::write(&path, "body { color: teal; }").expect("write css");

    let mut raw = RawSettings::default();
    raw.export.style_sheet_path = Some(path);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.export.use_custom_stylesheet);
    assert_eq!(settings.export.selected_stylesheet(), "body { color: teal; }");
}

#[test]
fn custom_sheet_flag_without_a_sheet_is_rejected() {
    let mut raw = RawSettings::default();
    raw.export.use_custom_stylesheet = Some(true);
    let err = Settings::from_raw(raw).expect_err("missing sheet");
    assert!(matches!(err, LoadError::Invalid { key: "export.use_custom_stylesheet", .. }));
}

#[test]
fn missing_style_sheet_file_is_reported() {
    let mut raw = RawSettings::default();
    raw.export.style_sheet_path = Some(PathBuf::from("/no/such/sheet.css"));
    let err = Settings::from_raw(raw).expect_err("unreadable sheet");
    assert!(matches!(err, LoadError::Invalid { key: "export.style_sheet_path", .. }));
}

#[test]
fn parse_copy_arguments() {
    let args = CliArgs::parse_from([
        "vault-copy",
        "copy",
        "notes/today.md",
        "--vault",
        "/home/me/vault",
        "--output",
        "/tmp/today.html",
        "--selection",
        "--footnotes",
        "remove-all",
        "--no-svg-to-bitmap",
        "--log-json",
        "yes",
    ]);

    match args.command {
        Command::Copy(copy) => {
            assert_eq!(copy.file, PathBuf::from("notes/today.md"));
            assert_eq!(copy.output, Some(PathBuf::from("/tmp/today.html")));
            assert!(copy.selection);
            assert_eq!(
                copy.overrides.vault.root,
                Some(PathBuf::from("/home/me/vault"))
            );
            assert_eq!(
                copy.overrides.export.footnotes,
                Some(FootnoteHandling::RemoveAll)
            );
            assert!(copy.overrides.export.no_svg_to_bitmap);
            assert!(!copy.overrides.export.format_as_tables);
            assert_eq!(copy.overrides.logging.log_json, Some(true));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_watch_arguments() {
    let args = CliArgs::parse_from([
        "vault-copy",
        "--config-file",
        "/etc/vault-copy.toml",
        "watch",
        "--vault",
        "/home/me/vault",
        "--output",
        "/tmp/preview.html",
        "--format-as-tables",
    ]);

    assert_eq!(
        args.config_file,
        Some(PathBuf::from("/etc/vault-copy.toml"))
    );
    match args.command {
        Command::Watch(watch) => {
            assert_eq!(watch.output, PathBuf::from("/tmp/preview.html"));
            assert_eq!(watch.vault.root, Some(PathBuf::from("/home/me/vault")));
            assert!(watch.export.format_as_tables);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn watch_requires_an_output() {
    let result = CliArgs::try_parse_from(["vault-copy", "watch"]);
    assert!(result.is_err());
}
