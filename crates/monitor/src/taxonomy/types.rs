//! 택소노미 데이터 타입
//!
//! 이벤트 정의는 프로세스 시작 시 생성되어 변경되지 않는 값 레코드입니다.
//! 심각도 상향은 [`SeverityAdjuster`] capability를 등록한 정의에만 허용됩니다.

use std::fmt;
use std::sync::Arc;

use dbwatch_core::types::Severity;

/// 라인 내용에 따라 심각도를 조정하는 capability trait
///
/// 정의의 기본 심각도를 인스턴스 단위로 덮어쓸 수 있습니다.
/// 구현은 절대 실패를 전파해서는 안 됩니다 — 파싱에 실패하면
/// 경고를 남기고 기본 심각도를 그대로 반환해야 합니다.
pub trait SeverityAdjuster: Send + Sync {
    /// 매칭된 원본 라인을 검사하여 이 인스턴스의 심각도를 결정합니다.
    fn adjust(&self, line: &str, default: Severity) -> Severity;
}

/// 이벤트 정의 — 택소노미의 한 항목
///
/// 이벤트 종류명, 트리거 패턴, 기본 심각도, 그리고 선택적
/// 심각도 조정 capability를 묶은 불변 값 레코드입니다.
#[derive(Clone)]
pub struct EventDefinition {
    /// 이벤트 종류명 (카탈로그 내에서 유일)
    pub kind: &'static str,
    /// 대소문자 구분 없이 라인 어디서든 탐색되는 정규식 패턴
    pub pattern: &'static str,
    /// 기본 심각도
    pub default_severity: Severity,
    /// 선택적 심각도 조정기 — 카탈로그에서 정확히 한 종류만 등록합니다
    pub adjuster: Option<Arc<dyn SeverityAdjuster>>,
}

impl EventDefinition {
    /// 조정기 없는 정의를 생성합니다.
    pub fn new(kind: &'static str, pattern: &'static str, default_severity: Severity) -> Self {
        Self {
            kind,
            pattern,
            default_severity,
            adjuster: None,
        }
    }

    /// 심각도 조정기를 부착합니다.
    pub fn with_adjuster(mut self, adjuster: Arc<dyn SeverityAdjuster>) -> Self {
        self.adjuster = Some(adjuster);
        self
    }
}

impl fmt::Debug for EventDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDefinition")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern)
            .field("default_severity", &self.default_severity)
            .field("adjuster", &self.adjuster.is_some())
            .finish()
    }
}
