//! 기본 시스템 에러 카탈로그
//!
//! 데이터베이스 서버 로그에서 알려진 장애/생명주기 시그니처를 등록 순서
//! 그대로 나열합니다. 분류는 첫 매칭에서 멈추므로 순서가 의미를 가집니다.

use std::sync::Arc;

use regex::Regex;
use tracing::warn;

use dbwatch_core::types::Severity;

use super::types::{EventDefinition, SeverityAdjuster};
use crate::error::MonitorError;

/// reactor stall 허용 임계값 기본값 (밀리초)
pub const DEFAULT_STALL_TOLERANCE_MS: u64 = 1000;

/// 일반 백트레이스 이벤트 종류명
///
/// 처리기가 보류 이벤트의 연속 라인과 독립 이벤트를 구분할 때
/// 참조합니다.
pub const KIND_BACKTRACE: &str = "BACKTRACE";

/// reactor stall 심각도 조정기
///
/// 라인에서 "ms" 단위 앞의 첫 정수를 추출하여 허용 임계값 이상이면
/// 심각도를 ERROR로 상향합니다. 추출에 실패하면 경고만 남기고
/// 기본 심각도를 유지합니다 — 조정 실패는 분류를 중단시키지 않습니다.
pub struct ReactorStallAdjuster {
    /// 이 값(밀리초) 이상 멈춘 stall은 ERROR로 보고합니다
    tolerance_ms: u64,
    /// "<n> ms" 추출용 정규식
    milli_re: Regex,
}

impl ReactorStallAdjuster {
    /// 지정한 허용 임계값으로 조정기를 생성합니다.
    pub fn new(tolerance_ms: u64) -> Result<Self, MonitorError> {
        let milli_re = Regex::new(r"(\d+) ms").map_err(|e| MonitorError::Taxonomy {
            kind: "REACTOR_STALLED".to_owned(),
            reason: format!("failed to compile millisecond pattern: {e}"),
        })?;
        Ok(Self {
            tolerance_ms,
            milli_re,
        })
    }
}

impl SeverityAdjuster for ReactorStallAdjuster {
    fn adjust(&self, line: &str, default: Severity) -> Severity {
        let parsed = self
            .milli_re
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok());

        match parsed {
            Some(stall_ms) if stall_ms >= self.tolerance_ms => {
                metrics::counter!(dbwatch_core::metrics::MONITOR_STALL_ESCALATIONS_TOTAL)
                    .increment(1);
                Severity::Error
            }
            Some(_) => default,
            None => {
                warn!(line, "failed to read stall duration from REACTOR_STALLED line");
                default
            }
        }
    }
}

/// 시스템 에러 카탈로그를 등록 순서대로 생성합니다.
///
/// 순서가 곧 우선순위입니다: 더 구체적인 시그니처가 자신을 포함하는
/// 일반 시그니처보다 먼저 옵니다. REACTOR_STALLED는 메시지에
/// "Backtrace"가 포함되므로 BACKTRACE보다 반드시 위에 있어야 합니다.
pub fn system_error_catalog(
    stall_tolerance_ms: u64,
) -> Result<Vec<EventDefinition>, MonitorError> {
    let stall_adjuster: Arc<dyn SeverityAdjuster> =
        Arc::new(ReactorStallAdjuster::new(stall_tolerance_ms)?);

    Ok(vec![
        EventDefinition::new("NO_SPACE_ERROR", "No space left on device", Severity::Error),
        EventDefinition::new("UNKNOWN_VERB", "unknown verb exception", Severity::Warning),
        EventDefinition::new(
            "CLIENT_DISCONNECT",
            r"\!INFO.*cql_server - exception while processing connection:.*",
            Severity::Warning,
        ),
        EventDefinition::new("SEMAPHORE_TIME_OUT", "semaphore_timed_out", Severity::Warning),
        // 이 WARNING 라인은 "Exception" 단어를 포함해 DATABASE_ERROR로 잘못
        // 분류될 수 있으므로 반드시 DATABASE_ERROR보다 먼저 등록합니다.
        EventDefinition::new(
            "SYSTEM_PAXOS_TIMEOUT",
            ".*mutation_write_*|.*Operation timed out for system.paxos.*|.*Operation failed for system.paxos.*",
            Severity::Warning,
        ),
        EventDefinition::new(
            "RESTARTED_DUE_TO_TIME_OUT",
            "scylla-server.service.*State 'stop-sigterm' timed out.*Killing",
            Severity::Warning,
        ),
        EventDefinition::new(
            "EMPTY_NESTED_EXCEPTION",
            r"cql_server - exception while processing connection: seastar::nested_exception \(seastar::nested_exception\)$",
            Severity::Warning,
        ),
        EventDefinition::new("DATABASE_ERROR", "Exception ", Severity::Error),
        EventDefinition::new("BAD_ALLOC", "std::bad_alloc", Severity::Error),
        EventDefinition::new("SCHEMA_FAILURE", "Failed to load schema version", Severity::Error),
        EventDefinition::new("RUNTIME_ERROR", "std::runtime_error", Severity::Error),
        EventDefinition::new("FILESYSTEM_ERROR", "filesystem_error", Severity::Error),
        EventDefinition::new("STACKTRACE", "stacktrace", Severity::Error),
        // REACTOR_STALLED는 메시지에 "Backtrace"가 포함되므로 BACKTRACE보다 위에 있어야 합니다
        EventDefinition::new("REACTOR_STALLED", "Reactor stalled", Severity::Debug)
            .with_adjuster(stall_adjuster),
        EventDefinition::new(KIND_BACKTRACE, "backtrace", Severity::Error),
        EventDefinition::new("ABORTING_ON_SHARD", "Aborting on shard", Severity::Error),
        EventDefinition::new("SEGMENTATION", "segmentation", Severity::Error),
        EventDefinition::new("INTEGRITY_CHECK", "integrity check failed", Severity::Error),
        EventDefinition::new("BOOT", "Starting Scylla Server", Severity::Normal),
        EventDefinition::new("STOP", "Stopping Scylla Server", Severity::Normal),
        EventDefinition::new("SUPPRESSED_MESSAGES", "journal: Suppressed", Severity::Warning),
        EventDefinition::new("STREAM_EXCEPTION", "stream_exception", Severity::Error),
        EventDefinition::new("POWER_OFF", "Powering Off", Severity::Critical),
    ])
}
