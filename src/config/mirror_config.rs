use std::path::{Path, PathBuf};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::debug;

use crate::{application::data::OnError, ext::BestEffortPathExt};

/// Optional defaults read from a YAML file, e.g.
///
/// ```yaml
/// source: /srv/data
/// replica: /mnt/backup/data
/// interval: 300
/// log_file: /var/log/treemirror.log
/// on_error: continue
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorConfig {
    pub source: Option<PathBuf>,
    pub replica: Option<PathBuf>,
    pub interval: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub on_error: Option<OnError>,
}

impl MirrorConfig {
    pub async fn read(path: &Path) -> Result<Self, MirrorConfigError> {
        debug!("Reading config file: {}", path.best_effort_path_display());
        let bytes = fs::read(path).await.context(ReadSnafu {
            file_path: path.best_effort_path_display(),
        })?;
        let contents = String::from_utf8(bytes).map_err(|_| MirrorConfigError::NotUtf8 {
            file_path: path.best_effort_path_display(),
        })?;
        contents.as_str().try_into()
    }

    fn from_mapping(top_level: &LinkedHashMap<Yaml, Yaml>) -> Result<Self, MirrorConfigError> {
        let mut config = MirrorConfig::default();

        for (key, value) in top_level {
            let key = key.as_str().ok_or(MirrorConfigError::NonStringKey)?;
            match key {
                "source" => config.source = Some(path_value(key, value)?),
                "replica" => config.replica = Some(path_value(key, value)?),
                "log_file" => config.log_file = Some(path_value(key, value)?),
                "interval" => config.interval = Some(interval_value(value)?),
                "on_error" => {
                    config.on_error = Some(
                        value
                            .as_str()
                            .and_then(OnError::from_config_value)
                            .context(InvalidValueSnafu {
                                key,
                                expected: "either 'abort' or 'continue'",
                            })?,
                    )
                }
                _ => return UnknownKeySnafu { key }.fail(),
            }
        }

        debug!("Parsed config file: {:?}", config);
        Ok(config)
    }
}

fn path_value(key: &str, value: &Yaml) -> Result<PathBuf, MirrorConfigError> {
    value
        .as_str()
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .context(InvalidValueSnafu {
            key,
            expected: "a non-empty path",
        })
}

fn interval_value(value: &Yaml) -> Result<u64, MirrorConfigError> {
    match value {
        Yaml::Value(Scalar::Integer(seconds)) if *seconds > 0 => Ok(*seconds as u64),
        _ => InvalidValueSnafu {
            key: "interval",
            expected: "a positive number of seconds",
        }
        .fail(),
    }
}

impl TryFrom<&str> for MirrorConfig {
    type Error = MirrorConfigError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let document = documents
            .first()
            .ok_or(MirrorConfigError::MalformedConfig)?;

        let top_level = document
            .as_mapping()
            .ok_or(MirrorConfigError::TopLevelNotMap)?;

        Self::from_mapping(top_level)
    }
}

#[derive(Debug, Snafu)]
pub enum MirrorConfigError {
    #[snafu(display("Failed to read the config file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The config file {} is not valid UTF-8", file_path))]
    NotUtf8 { file_path: String },
    #[snafu(display("Failed to parse the config file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted config file"))]
    MalformedConfig,
    #[snafu(display("Top level of config should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Config keys should be strings"))]
    NonStringKey,
    #[snafu(display("Unknown config key '{}'", key))]
    UnknownKey { key: String },
    #[snafu(display("Config key '{}' should be {}", key, expected))]
    InvalidValue { key: String, expected: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use tempfile::TempDir;

    #[test]
    fn parses_every_key() {
        let yaml = r#"
source: /srv/data
replica: /mnt/backup/data
interval: 300
log_file: /var/log/treemirror.log
on_error: continue
"#;
        let config: MirrorConfig = yaml.try_into().expect("Failed to parse config");

        assert_eq!(
            config,
            MirrorConfig {
                source: Some(PathBuf::from("/srv/data")),
                replica: Some(PathBuf::from("/mnt/backup/data")),
                interval: Some(300),
                log_file: Some(PathBuf::from("/var/log/treemirror.log")),
                on_error: Some(OnError::Continue),
            }
        );
    }

    #[test]
    fn missing_keys_stay_unset() {
        let config: MirrorConfig = "interval: 5".try_into().expect("Failed to parse config");

        assert_eq!(
            config,
            MirrorConfig {
                interval: Some(5),
                ..MirrorConfig::default()
            }
        );
    }

    #[test]
    fn empty_file_is_malformed() {
        let result: Result<MirrorConfig, _> = "".try_into();
        assert!(matches!(result, Err(MirrorConfigError::MalformedConfig)));
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        let result: Result<MirrorConfig, _> = "source: [unclosed".try_into();
        assert!(matches!(result, Err(MirrorConfigError::ParseError { .. })));
    }

    #[rstest]
    #[case("- source\n- replica")]
    #[case("just a string")]
    fn top_level_must_be_a_map(#[case] yaml: &str) {
        let result: Result<MirrorConfig, _> = yaml.try_into();
        assert!(matches!(result, Err(MirrorConfigError::TopLevelNotMap)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<MirrorConfig, _> = "sync_everything: true".try_into();
        assert!(matches!(
            result,
            Err(MirrorConfigError::UnknownKey { key }) if key == "sync_everything"
        ));
    }

    #[rstest]
    #[case("interval: 0", "interval")]
    #[case("interval: -3", "interval")]
    #[case("interval: soon", "interval")]
    #[case("source: 12", "source")]
    #[case("replica: \"\"", "replica")]
    #[case("on_error: ignore", "on_error")]
    fn invalid_values_name_their_key(#[case] yaml: &str, #[case] expected_key: &str) {
        let result: Result<MirrorConfig, _> = yaml.try_into();
        match result {
            Err(MirrorConfigError::InvalidValue { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("Expected InvalidValue, got {other:?}"),
        }
    }

    #[compio::test]
    async fn reads_from_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("mirror.yaml");
        std::fs::write(&path, "on_error: abort\n").expect("Failed to write config");

        let config = MirrorConfig::read(&path).await.expect("Failed to read config");

        assert_eq!(config.on_error, Some(OnError::Abort));
    }

    #[compio::test]
    async fn missing_file_is_a_read_error() {
        let result = MirrorConfig::read(Path::new("nonexistent.yaml")).await;
        assert!(matches!(result, Err(MirrorConfigError::ReadError { .. })));
    }
}
