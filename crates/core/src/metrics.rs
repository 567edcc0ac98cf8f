//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `dbwatch_`
//! - 모듈명: `monitor_`
//! - 접미어: `_total` (counter)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(dbwatch_core::metrics::MONITOR_LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 심각도 레이블 키 (debug, normal, warning, error, critical)
pub const LABEL_SEVERITY: &str = "severity";

/// 이벤트 종류 레이블 키 (예: NO_SPACE_ERROR)
pub const LABEL_KIND: &str = "kind";

/// 모니터링 대상 노드 레이블 키
pub const LABEL_NODE: &str = "node";

// ─── Monitor 메트릭 ────────────────────────────────────────────────

/// Monitor: 테일러가 읽은 전체 라인 수 (counter)
pub const MONITOR_LINES_READ_TOTAL: &str = "dbwatch_monitor_lines_read_total";

/// Monitor: 제외 패턴으로 건너뛴 라인 수 (counter)
pub const MONITOR_LINES_EXCLUDED_TOTAL: &str = "dbwatch_monitor_lines_excluded_total";

/// Monitor: 중복 제거 정책이 거부한 라인 수 (counter)
pub const MONITOR_LINES_DEDUPLICATED_TOTAL: &str = "dbwatch_monitor_lines_deduplicated_total";

/// Monitor: 버스로 전달된 이벤트 수 (counter, label: kind, severity)
pub const MONITOR_EVENTS_EMITTED_TOTAL: &str = "dbwatch_monitor_events_emitted_total";

/// Monitor: reactor stall 심각도 상향 횟수 (counter)
pub const MONITOR_STALL_ESCALATIONS_TOTAL: &str = "dbwatch_monitor_stall_escalations_total";

/// Monitor: 테일링 중 발생한 일시적 I/O 에러 수 (counter)
pub const MONITOR_TAIL_ERRORS_TOTAL: &str = "dbwatch_monitor_tail_errors_total";

/// 모든 메트릭의 설명을 레코더에 등록합니다.
///
/// 익스포터를 설치한 쪽(수퍼바이저)에서 한 번 호출합니다.
pub fn describe_metrics() {
    use metrics::describe_counter;

    describe_counter!(
        MONITOR_LINES_READ_TOTAL,
        "Total log lines read by the file tailers"
    );
    describe_counter!(
        MONITOR_LINES_EXCLUDED_TOTAL,
        "Total log lines skipped by the exclusion filter"
    );
    describe_counter!(
        MONITOR_LINES_DEDUPLICATED_TOTAL,
        "Total log lines rejected by the replay/dedup policy"
    );
    describe_counter!(
        MONITOR_EVENTS_EMITTED_TOTAL,
        "Total classified events handed to the event bus"
    );
    describe_counter!(
        MONITOR_STALL_ESCALATIONS_TOTAL,
        "Total reactor-stall events escalated to error severity"
    );
    describe_counter!(
        MONITOR_TAIL_ERRORS_TOTAL,
        "Total transient I/O errors observed while tailing"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_have_prefix_and_suffix() {
        let counters = [
            MONITOR_LINES_READ_TOTAL,
            MONITOR_LINES_EXCLUDED_TOTAL,
            MONITOR_LINES_DEDUPLICATED_TOTAL,
            MONITOR_EVENTS_EMITTED_TOTAL,
            MONITOR_STALL_ESCALATIONS_TOTAL,
            MONITOR_TAIL_ERRORS_TOTAL,
        ];
        for name in counters {
            assert!(name.starts_with("dbwatch_monitor_"), "bad prefix: {name}");
            assert!(name.ends_with("_total"), "bad suffix: {name}");
        }
    }

    #[test]
    fn describe_metrics_does_not_panic_without_recorder() {
        describe_metrics();
    }
}
