//! 로그 모니터 에러 타입
//!
//! [`MonitorError`]는 모니터 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<MonitorError> for DbwatchError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use dbwatch_core::error::{DbwatchError, PipelineError};

/// 로그 모니터 도메인 에러
///
/// 택소노미 컴파일, 테일링, 설정, 채널 통신 등 모니터 내부의
/// 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// 택소노미 정의 에러 (정규식 컴파일 실패 등)
    #[error("taxonomy error: kind '{kind}': {reason}")]
    Taxonomy {
        /// 문제가 된 이벤트 종류명
        kind: String,
        /// 에러 사유
        reason: String,
    },

    /// 테일링 에러 (파일 I/O)
    #[error("tail error: {path}: {reason}")]
    Tail {
        /// 감시 대상 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<MonitorError> for DbwatchError {
    fn from(err: MonitorError) -> Self {
        DbwatchError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}
