//! 설정 관리.
//!
//! 구성 요소별 설정 구조체는 각 크레이트에 정의되고,
//! 이 모듈은 파일과 환경 변수를 겹쳐 읽는 공통 로더를 제공합니다.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::TraderResult;

/// 환경 변수 오버라이드의 기본 접두사.
///
/// `FEATURES__SPLIT__TRAIN_RATIO=0.8` 형식으로 중첩 키를 지정합니다.
pub const ENV_PREFIX: &str = "FEATURES";

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 파일과 환경 변수에서 설정을 로드합니다.
///
/// 파일 형식은 확장자로 결정되며, 이후 `{prefix}__` 환경 변수가 값을 덮어씁니다.
/// 파일에 없는 키는 대상 타입의 `#[serde(default)]`로 채워집니다.
pub fn load_layered<T, P>(path: P, env_prefix: &str) -> TraderResult<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let config = config::Config::builder()
        .add_source(config::File::from(path.as_ref()))
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

/// TOML 문자열에서 설정을 로드합니다. 환경 변수 오버라이드는 적용하지 않습니다.
pub fn load_toml_str<T>(contents: &str) -> TraderResult<T>
where
    T: DeserializeOwned,
{
    let config = config::Config::builder()
        .add_source(config::File::from_str(contents, config::FileFormat::Toml))
        .build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "pretty");
    }

    #[test]
    fn test_load_toml_str() {
        let config: LoggingConfig = load_toml_str(
            r#"
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, "json");
    }

    #[test]
    fn test_load_toml_str_missing_key_fails() {
        let result: TraderResult<LoggingConfig> = load_toml_str("level = \"warn\"");
        assert!(result.unwrap_err().is_config_error());
    }

    #[test]
    fn test_load_layered_missing_file() {
        let result: TraderResult<LoggingConfig> =
            load_layered("does/not/exist.toml", ENV_PREFIX);
        assert!(result.is_err());
    }
}
