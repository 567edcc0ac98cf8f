//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 모든 모듈이 공유하는 데이터 구조를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 심각도 레벨
///
/// 로그 이벤트의 심각도를 나타냅니다.
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Debug < Normal < Warning < Error < Critical`).
///
/// 기본 심각도는 이벤트 정의(택소노미)에 고정되어 있으며,
/// `SeverityAdjuster`를 등록한 이벤트 종류만 라인 내용에 따라 상향할 수 있습니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// 디버그 — 보고만 하고 판정에 영향 없음
    Debug,
    /// 정상 동작 (기본값)
    #[default]
    Normal,
    /// 경고
    Warning,
    /// 에러
    Error,
    /// 치명적 — 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "normal" | "info" => Some(Self::Normal),
            "warning" | "warn" => Some(Self::Warning),
            "error" => Some(Self::Error),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "Debug"),
            Self::Normal => write!(f, "Normal"),
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}
