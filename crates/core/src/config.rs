//! 설정 관리 — dbwatch.toml 파싱 및 런타임 설정
//!
//! [`DbwatchConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`DBWATCH_MONITOR_POLL_INTERVAL_MS=200` 형식)
//! 2. 설정 파일 (`dbwatch.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), dbwatch_core::error::DbwatchError> {
//! use dbwatch_core::config::DbwatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = DbwatchConfig::load("dbwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = DbwatchConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, DbwatchError};

/// dbwatch 통합 설정
///
/// `dbwatch.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 로그 모니터 설정
    #[serde(default)]
    pub monitor: MonitorSection,
}

impl DbwatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DbwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DbwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DbwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                DbwatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, DbwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            DbwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `DBWATCH_{SECTION}_{FIELD}`
    /// 예: `DBWATCH_MONITOR_POLL_INTERVAL_MS=200`
    pub fn apply_env_overrides(&mut self) {
        override_string(&mut self.general.log_level, "DBWATCH_GENERAL_LOG_LEVEL");
        override_bool(&mut self.monitor.enabled, "DBWATCH_MONITOR_ENABLED");
        override_bool(
            &mut self.monitor.from_beginning,
            "DBWATCH_MONITOR_FROM_BEGINNING",
        );
        override_u64(
            &mut self.monitor.poll_interval_ms,
            "DBWATCH_MONITOR_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.monitor.reactor_stall_tolerance_ms,
            "DBWATCH_MONITOR_REACTOR_STALL_TOLERANCE_MS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DbwatchError> {
        if self.monitor.poll_interval_ms == 0 {
            return Err(DbwatchError::Config(ConfigError::InvalidValue {
                field: "monitor.poll_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }));
        }
        if self.monitor.event_channel_capacity == 0 {
            return Err(DbwatchError::Config(ConfigError::InvalidValue {
                field: "monitor.event_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }));
        }
        if self.monitor.enabled && self.monitor.watch_paths.is_empty() {
            return Err(DbwatchError::Config(ConfigError::InvalidValue {
                field: "monitor.watch_paths".to_owned(),
                reason: "at least one path must be configured when enabled".to_owned(),
            }));
        }
        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
        }
    }
}

/// 로그 모니터 설정 섹션
///
/// 모니터 크레이트는 이 섹션에서 자체 `MonitorConfig`를 파생시키며,
/// 여기에 없는 확장 필드는 기본값이 적용됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    /// 활성화 여부
    pub enabled: bool,
    /// 감시할 데이터베이스 로그 파일 경로 목록 (노드당 하나)
    pub watch_paths: Vec<String>,
    /// 새 라인 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// true면 파일 처음부터 다시 읽고 중복 제거 상태를 초기화합니다
    pub from_beginning: bool,
    /// 분류 전에 조용히 건너뛸 라인 부분 문자열 목록
    pub exclude_patterns: Vec<String>,
    /// reactor stall 허용 임계값 (밀리초) — 이 값 이상이면 ERROR로 상향
    pub reactor_stall_tolerance_ms: u64,
    /// 이벤트 버스 채널 용량
    pub event_channel_capacity: usize,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            enabled: true,
            watch_paths: vec!["/var/log/scylla/scylla.log".to_owned()],
            poll_interval_ms: 100,
            from_beginning: false,
            exclude_patterns: Vec::new(),
            reactor_stall_tolerance_ms: 1000,
            event_channel_capacity: 1024,
        }
    }
}

/// 환경변수 값으로 문자열 필드를 오버라이드합니다.
fn override_string(field: &mut String, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        *field = value;
    }
}

/// 환경변수 값으로 bool 필드를 오버라이드합니다.
fn override_bool(field: &mut bool, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse::<bool>() {
            Ok(parsed) => *field = parsed,
            Err(_) => warn!(env = env_key, value, "ignoring invalid bool env override"),
        }
    }
}

/// 환경변수 값으로 u64 필드를 오버라이드합니다.
fn override_u64(field: &mut u64, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse::<u64>() {
            Ok(parsed) => *field = parsed,
            Err(_) => warn!(env = env_key, value, "ignoring invalid u64 env override"),
        }
    }
}
