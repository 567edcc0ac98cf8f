//! 에러 타입 — 도메인별 에러 정의

/// dbwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum DbwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중인 파이프라인을 다시 시작하려 함
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 파이프라인을 정지하려 함
    #[error("pipeline is not running")]
    NotRunning,

    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "poll_interval_ms".to_owned(),
            reason: "must be greater than 0".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("poll_interval_ms"));
        assert!(msg.contains("greater than 0"));
    }

    #[test]
    fn config_error_converts_to_dbwatch_error() {
        let err = ConfigError::FileNotFound {
            path: "/etc/dbwatch/dbwatch.toml".to_owned(),
        };
        let top: DbwatchError = err.into();
        assert!(matches!(top, DbwatchError::Config(_)));
        assert!(top.to_string().contains("dbwatch.toml"));
    }

    #[test]
    fn pipeline_error_converts_to_dbwatch_error() {
        let top: DbwatchError = PipelineError::AlreadyRunning.into();
        assert!(matches!(top, DbwatchError::Pipeline(_)));
        assert!(top.to_string().contains("already running"));
    }

    #[test]
    fn io_error_converts_to_dbwatch_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let top: DbwatchError = io.into();
        assert!(matches!(top, DbwatchError::Io(_)));
    }
}
