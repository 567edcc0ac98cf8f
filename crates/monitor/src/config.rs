//! 로그 모니터 설정
//!
//! [`MonitorConfig`]는 core의 [`MonitorSection`](dbwatch_core::config::MonitorSection)을
//! 기반으로 모니터 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use dbwatch_core::config::DbwatchConfig;
//! use dbwatch_monitor::config::MonitorConfig;
//!
//! let core_config = DbwatchConfig::default();
//! let config = MonitorConfig::from_core(&core_config.monitor);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

/// 감시 대상 하나 — 노드와 로그 파일의 쌍
///
/// 태스크 하나가 감시 대상 하나를 전담합니다. 재개(resume)용
/// 오프셋/라인 번호는 대상별로 지정합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchTarget {
    /// 모니터링 대상 노드/호스트 식별자 (이벤트의 sourceIdentifier)
    pub node: String,
    /// 감시할 로그 파일 경로
    pub path: String,
    /// true면 바이트 0, 라인 0부터 읽고 중복 제거 상태를 초기화합니다
    #[serde(default)]
    pub from_beginning: bool,
    /// 재개 시작 바이트 오프셋 (from_beginning이면 무시)
    #[serde(default)]
    pub start_offset: u64,
    /// 마지막으로 처리한 라인 번호 — 다음 라인은 start_line_index + 1
    /// (from_beginning이면 무시)
    #[serde(default)]
    pub start_line_index: u64,
}

impl WatchTarget {
    /// 처음부터 읽는 새 감시 대상을 생성합니다.
    pub fn new(node: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            path: path.into(),
            from_beginning: false,
            start_offset: 0,
            start_line_index: 0,
        }
    }

    /// 파일 처음부터 전체 재생(replay)하도록 설정합니다.
    pub fn from_beginning(mut self) -> Self {
        self.from_beginning = true;
        self
    }

    /// 재개 위치를 설정합니다.
    pub fn resume_at(mut self, offset: u64, line_index: u64) -> Self {
        self.start_offset = offset;
        self.start_line_index = line_index;
        self
    }
}

/// 로그 모니터 설정
///
/// core의 `MonitorSection`에서 파생되며, 모니터 내부에서
/// 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 감시 대상 목록 (노드당 하나의 태스크)
    pub targets: Vec<WatchTarget>,
    /// 새 라인 폴링 주기 (밀리초) — 협조적 정지 지연의 상한이기도 합니다
    pub poll_interval_ms: u64,
    /// 분류/백트레이스 누적 전에 조용히 건너뛸 부분 문자열 목록
    pub exclude_patterns: Vec<String>,
    /// reactor stall 허용 임계값 (밀리초)
    pub reactor_stall_tolerance_ms: u64,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 이벤트 버스 채널 용량
    pub event_channel_capacity: usize,
    /// 최대 라인 길이 (바이트) — 초과분은 잘라서 처리
    pub max_line_length: usize,
    /// 중복 제거 정책이 추적하는 최대 라인 번호 개수
    pub dedup_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            poll_interval_ms: 100,
            exclude_patterns: Vec::new(),
            reactor_stall_tolerance_ms: 1000,
            event_channel_capacity: 1024,
            max_line_length: 64 * 1024, // 64KB
            dedup_capacity: 100_000,
        }
    }
}

impl MonitorConfig {
    /// core의 `MonitorSection`에서 모니터 설정을 생성합니다.
    ///
    /// 노드 식별자는 파일 경로에서 파생되며, core 설정에 없는
    /// 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &dbwatch_core::config::MonitorSection) -> Self {
        let targets = core
            .watch_paths
            .iter()
            .map(|path| {
                let node = node_name_from_path(path);
                let mut target = WatchTarget::new(node, path.clone());
                target.from_beginning = core.from_beginning;
                target
            })
            .collect();

        Self {
            targets,
            poll_interval_ms: core.poll_interval_ms,
            exclude_patterns: core.exclude_patterns.clone(),
            reactor_stall_tolerance_ms: core.reactor_stall_tolerance_ms,
            event_channel_capacity: core.event_channel_capacity,
            ..Self::default()
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), MonitorError> {
        const MAX_POLL_INTERVAL_MS: u64 = 60_000; // 1 minute
        const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(MonitorError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: format!("must be 1-{}", MAX_POLL_INTERVAL_MS),
            });
        }

        if self.event_channel_capacity == 0 {
            return Err(MonitorError::Config {
                field: "event_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_line_length == 0 || self.max_line_length > MAX_LINE_LENGTH {
            return Err(MonitorError::Config {
                field: "max_line_length".to_owned(),
                reason: format!("must be 1-{}", MAX_LINE_LENGTH),
            });
        }

        if self.dedup_capacity == 0 {
            return Err(MonitorError::Config {
                field: "dedup_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        for target in &self.targets {
            if target.node.is_empty() {
                return Err(MonitorError::Config {
                    field: "targets.node".to_owned(),
                    reason: "node identifier must not be empty".to_owned(),
                });
            }
            if target.path.is_empty() {
                return Err(MonitorError::Config {
                    field: "targets.path".to_owned(),
                    reason: "watch path must not be empty".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// 파일 경로에서 노드 식별자를 파생합니다.
fn node_name_from_path(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_owned()
}

/// 모니터 설정 빌더
#[derive(Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 감시 대상을 추가합니다.
    pub fn target(mut self, target: WatchTarget) -> Self {
        self.config.targets.push(target);
        self
    }

    /// 폴링 주기(밀리초)를 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 제외 패턴 목록을 설정합니다.
    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.exclude_patterns = patterns;
        self
    }

    /// reactor stall 허용 임계값(밀리초)을 설정합니다.
    pub fn reactor_stall_tolerance_ms(mut self, ms: u64) -> Self {
        self.config.reactor_stall_tolerance_ms = ms;
        self
    }

    /// 이벤트 채널 용량을 설정합니다.
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.event_channel_capacity = capacity;
        self
    }

    /// 중복 제거 추적 용량을 설정합니다.
    pub fn dedup_capacity(mut self, capacity: usize) -> Self {
        self.config.dedup_capacity = capacity;
        self
    }

    /// 설정을 검증하고 `MonitorConfig`를 생성합니다.
    pub fn build(self) -> Result<MonitorConfig, MonitorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
