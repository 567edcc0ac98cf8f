//! 재생/중복 제거 정책
//!
//! 모니터가 재시작 후 같은 파일을 다시 읽을 때 이미 보고한 라인을
//! 다시 이벤트로 만들지 않도록, 처리한 라인 번호를 추적합니다.
//! 전체 재생(from_beginning) 모드에서는 추적을 초기화하고 모든
//! 라인을 통과시킵니다.

use std::collections::BTreeSet;

/// 라인 번호 기반 재생 필터
///
/// 추적 집합은 용량 상한을 가지며, 가득 차면 가장 작은(가장 오래된)
/// 라인 번호부터 제거합니다. 라인 번호는 단조 증가하므로 작은 번호가
/// 다시 관찰될 가능성은 재개 직후로 한정됩니다.
pub struct ReplayFilter {
    /// true면 모든 라인을 무조건 통과시킵니다
    from_beginning: bool,
    /// 이 번호 이하의 라인은 이미 처리한 것으로 간주합니다
    start_line_index: u64,
    /// 통과시킨 라인 번호 집합
    seen: BTreeSet<u64>,
    /// 추적 집합 용량 상한
    capacity: usize,
}

impl ReplayFilter {
    /// 재생 필터를 생성합니다.
    ///
    /// `from_beginning`이 true면 `start_line_index`는 무시되고
    /// 추적 상태도 비어 있는 채로 시작합니다.
    pub fn new(from_beginning: bool, start_line_index: u64, capacity: usize) -> Self {
        Self {
            from_beginning,
            start_line_index: if from_beginning { 0 } else { start_line_index },
            seen: BTreeSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// 라인 번호를 검사하여 처리 허용 여부를 반환합니다.
    ///
    /// 전체 재생 모드에서는 항상 허용합니다. 그 외에는 재개 지점
    /// 이하이거나 이미 관찰한 번호를 거부합니다. 허용된 번호는
    /// 관찰 집합에 기록됩니다.
    pub fn admit(&mut self, line_index: u64) -> bool {
        if self.from_beginning {
            self.record(line_index);
            return true;
        }

        if line_index <= self.start_line_index && self.start_line_index > 0 {
            return false;
        }
        if self.seen.contains(&line_index) {
            return false;
        }

        self.record(line_index);
        true
    }

    fn record(&mut self, line_index: u64) {
        self.seen.insert(line_index);
        while self.seen.len() > self.capacity {
            if let Some(oldest) = self.seen.first().copied() {
                self.seen.remove(&oldest);
            }
        }
    }

    /// 현재 추적 중인 라인 번호 개수를 반환합니다.
    pub fn tracked(&self) -> usize {
        self.seen.len()
    }
}
