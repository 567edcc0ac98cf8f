//! 이벤트 시스템 — 모듈 간 통신의 기본 단위
//!
//! 모니터가 생성한 이벤트는 `tokio::mpsc` 채널(이벤트 버스)을 통해
//! 다운스트림으로 전달됩니다. [`EventMetadata`]는 모든 이벤트에 공통으로
//! 포함되는 메타데이터이며, [`Event`] trait은 모든 이벤트 타입이 구현해야
//! 하는 인터페이스입니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::Severity;

// --- 모듈명 상수 ---

/// 로그 모니터 모듈명
pub const MODULE_MONITOR: &str = "monitor";

// --- 이벤트 타입 상수 ---

/// 데이터베이스 로그 이벤트 타입
pub const EVENT_TYPE_DB_LOG: &str = "db_log";

/// 이벤트 메타데이터 — 모든 이벤트에 공통으로 포함되는 추적 정보
///
/// 각 이벤트의 발생 시각, 생성 모듈, 추적 ID를 담고 있어
/// 이벤트 흐름을 추적하고 디버깅할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// 이벤트 발생 시각
    pub timestamp: SystemTime,
    /// 이벤트를 생성한 모듈명 (예: "monitor")
    pub source_module: String,
    /// 추적 ID — 같은 흐름의 이벤트를 연결합니다
    pub trace_id: String,
}

impl EventMetadata {
    /// 기존 trace_id를 사용하여 새 메타데이터를 생성합니다.
    pub fn new(source_module: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: trace_id.into(),
        }
    }

    /// 새로운 UUID v4 trace_id를 생성하여 메타데이터를 만듭니다.
    ///
    /// 새로운 이벤트 체인의 시작점에서 사용합니다.
    pub fn with_new_trace(source_module: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source_module: source_module.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for EventMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] source={} trace={}",
            unix_timestamp_str(self.timestamp),
            self.source_module,
            self.trace_id,
        )
    }
}

/// 모든 이벤트가 구현해야 하는 기본 trait
///
/// `Send + Sync + 'static` 바운드로 `tokio::mpsc` 채널을 통한
/// 안전한 전송을 보장합니다.
pub trait Event: Send + Sync + 'static {
    /// 이벤트 고유 ID (UUID v4)
    fn event_id(&self) -> &str;

    /// 이벤트 메타데이터 (timestamp, source_module, trace_id)
    fn metadata(&self) -> &EventMetadata;

    /// 이벤트 타입명 (로깅 및 라우팅에 사용)
    fn event_type(&self) -> &str;
}

/// 데이터베이스 로그 라인에서 분류된 이벤트
///
/// 택소노미 패턴에 매칭된 로그 라인 하나당 정확히 하나 생성됩니다.
/// 매칭 직후의 백트레이스 라인들은 `backtrace` 필드에 누적되며,
/// 이벤트 버스로 전달(publish)된 이후에는 수정되지 않습니다 —
/// 모니터는 아직 전달하지 않은 pending 이벤트만 변경합니다.
#[derive(Debug, Clone)]
pub struct DbLogEvent {
    /// 이벤트 고유 ID
    pub id: String,
    /// 이벤트 메타데이터
    pub metadata: EventMetadata,
    /// 이벤트 종류명 (택소노미에 등록된 이름, 예: "NO_SPACE_ERROR")
    pub kind: &'static str,
    /// 심각도 — 생성 시점에 확정되며 이후 변경되지 않습니다
    pub severity: Severity,
    /// 모니터링 대상 노드/호스트 식별자
    pub node: String,
    /// 매칭된 로그 라인 번호 (1부터 시작)
    pub line_number: u64,
    /// 매칭된 원본 로그 라인
    pub line: String,
    /// 재구성된 백트레이스 (프레임/주소 순서 유지, 없으면 비어 있음)
    pub backtrace: Vec<String>,
}

impl DbLogEvent {
    /// 매칭된 라인에서 새 이벤트를 생성합니다.
    ///
    /// 템플릿 복제 없이 매번 새 값을 구성합니다.
    pub fn new(
        kind: &'static str,
        severity: Severity,
        node: impl Into<String>,
        line_number: u64,
        line: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            metadata: EventMetadata::with_new_trace(MODULE_MONITOR),
            kind,
            severity,
            node: node.into(),
            line_number,
            line: line.into(),
            backtrace: Vec::new(),
        }
    }
}

impl Event for DbLogEvent {
    fn event_id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn event_type(&self) -> &str {
        EVENT_TYPE_DB_LOG
    }
}

impl fmt::Display for DbLogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DbLogEvent[{}] kind={} severity={} node={} line_number={}",
            &self.id[..8.min(self.id.len())],
            self.kind,
            self.severity,
            self.node,
            self.line_number,
        )
    }
}

/// SystemTime을 사람이 읽을 수 있는 형태로 변환합니다.
fn unix_timestamp_str(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => {
            let secs = duration.as_secs();
            format!("{secs}")
        }
        Err(_) => "unknown".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> DbLogEvent {
        DbLogEvent::new(
            "BAD_ALLOC",
            Severity::Error,
            "db-node-1",
            42,
            "ERROR: std::bad_alloc",
        )
    }

    #[test]
    fn event_metadata_new_preserves_trace_id() {
        let meta = EventMetadata::new("test-module", "trace-abc-123");
        assert_eq!(meta.source_module, "test-module");
        assert_eq!(meta.trace_id, "trace-abc-123");
        assert!(meta.timestamp <= SystemTime::now());
    }

    #[test]
    fn event_metadata_with_new_trace_generates_uuid() {
        let meta = EventMetadata::with_new_trace("test-module");
        assert_eq!(meta.source_module, "test-module");
        // UUID v4 형식 확인: 8-4-4-4-12
        assert_eq!(meta.trace_id.len(), 36);
        assert_eq!(meta.trace_id.chars().filter(|c| *c == '-').count(), 4);
    }

    #[test]
    fn event_metadata_display() {
        let meta = EventMetadata::new("monitor", "trace-xyz");
        let display = meta.to_string();
        assert!(display.contains("monitor"));
        assert!(display.contains("trace-xyz"));
    }

    #[test]
    fn db_log_event_implements_event_trait() {
        let event = sample_event();
        assert_eq!(event.event_type(), "db_log");
        assert!(!event.event_id().is_empty());
        assert_eq!(event.metadata().source_module, "monitor");
    }

    #[test]
    fn db_log_event_starts_with_empty_backtrace() {
        let event = sample_event();
        assert!(event.backtrace.is_empty());
    }

    #[test]
    fn db_log_event_display() {
        let event = sample_event();
        let display = event.to_string();
        assert!(display.contains("BAD_ALLOC"));
        assert!(display.contains("Error"));
        assert!(display.contains("db-node-1"));
        assert!(display.contains("line_number=42"));
    }

    #[test]
    fn each_event_gets_unique_id() {
        let a = sample_event();
        let b = sample_event();
        assert_ne!(a.id, b.id);
        assert_ne!(a.metadata.trace_id, b.metadata.trace_id);
    }

    #[test]
    fn events_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<DbLogEvent>();
    }
}
