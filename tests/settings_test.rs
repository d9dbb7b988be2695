//! Layered settings loading: defaults, TOML file, environment, CLI.
//!
//! Every test runs inside `figment::Jail` so environment changes stay
//! serialized and are rolled back afterwards.

use figment::Jail;
use labstage::config::{Overrides, Settings, DEFAULT_PORT};
use labstage::logging::OutputFormat;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

fn load(path: Option<&Path>) -> figment::error::Result<Settings> {
    Settings::load(path).map_err(|e| format!("{e:#}").into())
}

#[test]
fn defaults_without_file_or_env() {
    Jail::expect_with(|_jail| {
        let settings = load(None)?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.stage.port, DEFAULT_PORT);
        assert_eq!(settings.logging.format, OutputFormat::Compact);
        Ok(())
    });
}

#[test]
fn file_values_merge_over_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "labstage.toml",
            r#"
                [stage]
                port = "/dev/ttyUSB3"
                ready_timeout_secs = 5

                [logging]
                level = "debug"
                format = "json"
            "#,
        )?;

        let settings = load(Some(Path::new("labstage.toml")))?;
        assert_eq!(settings.stage.port, "/dev/ttyUSB3");
        assert_eq!(settings.stage.baud_rate, 38400);
        assert_eq!(settings.stage.poll_settings().timeout, Duration::from_secs(5));
        assert_eq!(settings.stage.poll_settings().interval, Duration::from_millis(200));
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, OutputFormat::Json);
        Ok(())
    });
}

#[test]
fn environment_beats_file() {
    Jail::expect_with(|jail| {
        let mut file = tempfile::NamedTempFile::new().map_err(|e| e.to_string())?;
        writeln!(file, "[stage]\nport = \"COM1\"\nbaud_rate = 9600").map_err(|e| e.to_string())?;

        jail.set_env("LABSTAGE_STAGE__PORT", "COM7");
        jail.set_env("LABSTAGE_LOGGING__LEVEL", "warn");

        let settings = load(Some(file.path()))?;
        assert_eq!(settings.stage.port, "COM7");
        assert_eq!(settings.stage.baud_rate, 9600);
        assert_eq!(settings.logging.level, "warn");
        Ok(())
    });
}

#[test]
fn command_line_beats_environment() {
    Jail::expect_with(|jail| {
        jail.set_env("LABSTAGE_STAGE__PORT", "COM7");

        let mut settings = load(None)?;
        settings.apply(&Overrides {
            port: Some("COM9".into()),
            baud_rate: Some(19200),
            log_level: None,
        });

        assert_eq!(settings.stage.port, "COM9");
        assert_eq!(settings.stage.baud_rate, 19200);
        assert_eq!(settings.logging.level, "info");
        Ok(())
    });
}

#[test]
fn named_file_must_exist() {
    Jail::expect_with(|_jail| {
        let err = Settings::load(Some(Path::new("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));
        Ok(())
    });
}

#[test]
fn bad_values_fail_to_load_or_validate() {
    Jail::expect_with(|jail| {
        jail.create_file("bad_type.toml", "[stage]\nbaud_rate = \"fast\"")?;
        assert!(Settings::load(Some(Path::new("bad_type.toml"))).is_err());

        jail.create_file("zero_baud.toml", "[stage]\nbaud_rate = 0")?;
        let settings = load(Some(Path::new("zero_baud.toml")))?;
        assert!(settings.validate().is_err());
        Ok(())
    });
}
