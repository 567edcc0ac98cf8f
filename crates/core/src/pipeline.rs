//! 파이프라인 trait — 모듈 생명주기 정의
//!
//! 장시간 실행되는 모듈(로그 모니터 등)은 [`Pipeline`] trait을 구현하여
//! 상위 수퍼바이저가 start/stop/health_check의 동일한 생명주기로
//! 관리할 수 있도록 합니다.

use crate::error::DbwatchError;

/// 파이프라인 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상 동작 중
    Healthy,
    /// 동작 중이지만 주의 필요 (사유 포함)
    Degraded(String),
    /// 동작 불가 (사유 포함)
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불가 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 장시간 실행 모듈의 생명주기 trait
///
/// 구현체는 `start`에서 백그라운드 태스크를 스폰하고,
/// `stop`에서 협조적으로 종료해야 합니다.
pub trait Pipeline: Send {
    /// 파이프라인을 시작합니다. 이미 실행 중이면 에러를 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), DbwatchError>> + Send;

    /// 파이프라인을 정지합니다. 실행 중이 아니면 에러를 반환합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), DbwatchError>> + Send;

    /// 현재 헬스 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}
