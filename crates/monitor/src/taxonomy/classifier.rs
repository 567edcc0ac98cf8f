//! 분류기 — 등록 순서 우선 패턴 매칭
//!
//! 카탈로그의 정규식을 생성 시 한 번만 컴파일하여 캐싱하고,
//! 라인마다 등록 순서대로 탐색해 첫 매칭에서 멈춥니다.

use regex::RegexBuilder;

use dbwatch_core::types::Severity;

use super::catalog::system_error_catalog;
use super::types::EventDefinition;
use crate::error::MonitorError;

/// 분류 결과 — 매칭된 이벤트 종류와 확정된 심각도
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// 매칭된 이벤트 종류명
    pub kind: &'static str,
    /// 조정기 적용 후 확정된 심각도
    pub severity: Severity,
}

/// 택소노미 분류기
///
/// 생성 시 모든 패턴을 대소문자 구분 없는 정규식으로 컴파일합니다.
/// 컴파일 실패는 카탈로그 결함이므로 즉시 에러로 반환합니다.
pub struct Classifier {
    /// 컴파일된 (정규식, 정의) 쌍 — 등록 순서 유지
    patterns: Vec<(regex::Regex, EventDefinition)>,
}

impl Classifier {
    /// 주어진 카탈로그로 분류기를 생성합니다.
    pub fn new(catalog: Vec<EventDefinition>) -> Result<Self, MonitorError> {
        let mut patterns = Vec::with_capacity(catalog.len());
        for def in catalog {
            let regex = RegexBuilder::new(def.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| MonitorError::Taxonomy {
                    kind: def.kind.to_owned(),
                    reason: format!("invalid pattern '{}': {e}", def.pattern),
                })?;
            patterns.push((regex, def));
        }
        Ok(Self { patterns })
    }

    /// 기본 시스템 에러 카탈로그로 분류기를 생성합니다.
    pub fn with_defaults(stall_tolerance_ms: u64) -> Result<Self, MonitorError> {
        Self::new(system_error_catalog(stall_tolerance_ms)?)
    }

    /// 라인을 분류합니다.
    ///
    /// 등록 순서대로 각 패턴을 라인 어디서든 탐색하고, 처음 매칭된
    /// 정의에서 멈춥니다 — 한 라인에 여러 패턴이 매칭되더라도 이벤트는
    /// 최대 하나만 생성됩니다. 조정기가 있으면 심각도를 확정한 뒤
    /// 반환하며, 아무 패턴도 매칭되지 않으면 `None`입니다.
    pub fn classify(&self, line: &str) -> Option<Classification> {
        for (regex, def) in &self.patterns {
            if regex.is_match(line) {
                let severity = match &def.adjuster {
                    Some(adjuster) => adjuster.adjust(line, def.default_severity),
                    None => def.default_severity,
                };
                return Some(Classification {
                    kind: def.kind,
                    severity,
                });
            }
        }
        None
    }

    /// 등록 순서 그대로의 정의 목록을 반환합니다.
    pub fn definitions(&self) -> impl Iterator<Item = &EventDefinition> {
        self.patterns.iter().map(|(_, def)| def)
    }

    /// 등록된 정의 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// 정의가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::catalog::DEFAULT_STALL_TOLERANCE_MS;

    fn classifier() -> Classifier {
        Classifier::with_defaults(DEFAULT_STALL_TOLERANCE_MS).unwrap()
    }

    #[test]
    fn no_space_line_classifies_as_error() {
        let c = classifier();
        let result = c
            .classify("[shard 0] commitlog - No space left on device")
            .unwrap();
        assert_eq!(result.kind, "NO_SPACE_ERROR");
        assert_eq!(result.severity, Severity::Error);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let c = classifier();
        let result = c.classify("NO SPACE LEFT ON DEVICE").unwrap();
        assert_eq!(result.kind, "NO_SPACE_ERROR");
    }

    #[test]
    fn stall_line_with_backtrace_word_classifies_as_stall() {
        // 등록 순서 불변식: stall 메시지에 "Backtrace"가 있어도
        // BACKTRACE가 아닌 REACTOR_STALLED로 분류되어야 합니다.
        let c = classifier();
        let result = c
            .classify("Reactor stalled for 100 ms on shard 3. Backtrace: 0x1 0x2")
            .unwrap();
        assert_eq!(result.kind, "REACTOR_STALLED");
    }

    #[test]
    fn short_stall_keeps_default_severity() {
        let c = classifier();
        let result = c.classify("Reactor stalled for 950 ms on shard 1").unwrap();
        assert_eq!(result.kind, "REACTOR_STALLED");
        assert_eq!(result.severity, Severity::Debug);
    }

    #[test]
    fn long_stall_escalates_to_error() {
        let c = classifier();
        let result = c.classify("Reactor stalled for 1500 ms on shard 1").unwrap();
        assert_eq!(result.kind, "REACTOR_STALLED");
        assert_eq!(result.severity, Severity::Error);
    }

    #[test]
    fn unparseable_stall_keeps_default_severity() {
        let c = classifier();
        let result = c.classify("Reactor stalled badly, no duration here").unwrap();
        assert_eq!(result.kind, "REACTOR_STALLED");
        assert_eq!(result.severity, Severity::Debug);
    }

    #[test]
    fn bare_backtrace_line_classifies_as_backtrace() {
        let c = classifier();
        let result = c.classify("seastar - Exceptional future ignored, backtrace:").unwrap();
        // "Exceptional future" 역시 "Exception " 패턴과는 매칭되지 않습니다
        assert_eq!(result.kind, "BACKTRACE");
        assert_eq!(result.severity, Severity::Error);
    }

    #[test]
    fn paxos_timeout_wins_over_database_error() {
        let c = classifier();
        let line = "storage_proxy - Failed to apply mutation from 10.0.2.108#8: \
                    exceptions::mutation_write_timeout_exception \
                    (Operation timed out for system.paxos - received only 0 responses)";
        let result = c.classify(line).unwrap();
        assert_eq!(result.kind, "SYSTEM_PAXOS_TIMEOUT");
        assert_eq!(result.severity, Severity::Warning);
    }

    #[test]
    fn lifecycle_markers_classify_as_normal() {
        let c = classifier();
        assert_eq!(c.classify("Starting Scylla Server").unwrap().kind, "BOOT");
        let stop = c.classify("Stopping Scylla Server").unwrap();
        assert_eq!(stop.kind, "STOP");
        assert_eq!(stop.severity, Severity::Normal);
    }

    #[test]
    fn power_off_is_critical() {
        let c = classifier();
        let result = c.classify("node3 systemd: Powering Off").unwrap();
        assert_eq!(result.kind, "POWER_OFF");
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn unmatched_line_returns_none() {
        let c = classifier();
        assert!(c.classify("compaction - Compacted 3 sstables").is_none());
        assert!(c.classify("").is_none());
    }

    #[test]
    fn at_most_one_classification_per_line() {
        // "std::bad_alloc"과 "backtrace" 둘 다 포함해도 첫 매칭 하나만 반환합니다.
        let c = classifier();
        let result = c.classify("std::bad_alloc thrown, backtrace follows").unwrap();
        assert_eq!(result.kind, "BAD_ALLOC");
    }

    #[test]
    fn invalid_pattern_fails_construction() {
        let catalog = vec![EventDefinition::new("BROKEN", "[invalid", Severity::Error)];
        let result = Classifier::new(catalog);
        assert!(matches!(result, Err(MonitorError::Taxonomy { .. })));
    }

    #[test]
    fn definitions_preserve_registration_order() {
        let c = classifier();
        let kinds: Vec<&str> = c.definitions().map(|d| d.kind).collect();
        assert_eq!(kinds.first(), Some(&"NO_SPACE_ERROR"));
        assert!(!c.is_empty());
        assert_eq!(kinds.len(), c.len());
    }
}
