//! 이벤트 택소노미 — 장애/생명주기 시그니처 카탈로그와 분류기
//!
//! 프로세스 시작 시 고정되는 정적 이벤트 정의 목록을 등록 순서 그대로
//! 평가하여, 로그 라인 하나당 최대 하나의 이벤트를 만들어 냅니다.
//!
//! # 아키텍처
//! - [`types`]: [`EventDefinition`] 값 레코드와 [`SeverityAdjuster`] capability trait
//! - [`catalog`]: 알려진 시스템 에러 시그니처의 순서 있는 기본 카탈로그
//! - [`classifier`]: 등록 순서 우선(first-match-wins) 분류기
//!
//! # 순서 불변식
//! 등록 순서가 곧 우선순위입니다. 더 구체적인 패턴(예: 메시지에
//! "Backtrace"를 포함하는 reactor stall)은 더 일반적인 패턴(예: BACKTRACE)
//! 보다 반드시 먼저 등록되어야 하며, 이 불변식은 테스트로 검증합니다.

pub mod catalog;
pub mod classifier;
pub mod types;

pub use catalog::{KIND_BACKTRACE, ReactorStallAdjuster, system_error_catalog};
pub use classifier::{Classification, Classifier};
pub use types::{EventDefinition, SeverityAdjuster};
