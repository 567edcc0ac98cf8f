//! 라인 처리기 — 분류와 백트레이스 누적의 접합부
//!
//! 태스크당 하나씩 존재하며, 아직 발행하지 않은 보류(pending) 이벤트를
//! 최대 하나 들고 있습니다. 새 이벤트가 만들어지거나 백트레이스 문법이
//! 아닌 라인이 나타나면 보류 이벤트가 확정되어 발행 대상으로 반환됩니다.
//! 발행된 이벤트는 이후 절대 변경되지 않습니다.

use std::sync::Arc;

use tracing::trace;

use dbwatch_core::event::DbLogEvent;

use crate::backtrace::{BacktraceFragment, BacktraceParser};
use crate::taxonomy::{Classifier, KIND_BACKTRACE};

/// 단일 감시 대상의 라인 스트림을 이벤트로 변환합니다.
pub struct LineProcessor {
    classifier: Arc<Classifier>,
    parser: BacktraceParser,
    /// 이벤트의 sourceIdentifier로 쓰이는 노드 이름
    node: String,
    /// 아직 발행되지 않아 백트레이스를 받을 수 있는 이벤트
    pending: Option<DbLogEvent>,
}

impl LineProcessor {
    /// 처리기를 생성합니다.
    pub fn new(classifier: Arc<Classifier>, parser: BacktraceParser, node: String) -> Self {
        Self {
            classifier,
            parser,
            node,
            pending: None,
        }
    }

    /// 라인 하나를 처리하고, 확정된 이벤트가 있으면 반환합니다.
    ///
    /// - 보류 이벤트가 있는 동안 백트레이스 문법 라인(프레임, 주소,
    ///   눌러 담긴 한 줄)은 분류 대상이 아니라 연속 라인입니다 —
    ///   보류 이벤트의 백트레이스에 덧붙입니다. 단, BACKTRACE 이외의
    ///   종류에 매칭되는 라인(예: 백트레이스를 눌러 담은 stall 메시지)은
    ///   자신의 이벤트를 만듭니다.
    /// - 라인이 택소노미에 매칭되면 새 보류 이벤트를 만들고, 이전
    ///   보류 이벤트를 확정하여 반환합니다.
    /// - 보류 이벤트 없이 나타난 문법 라인은 버립니다.
    /// - 그 외의 라인은 보류 이벤트를 확정하여 반환합니다 —
    ///   백트레이스는 비문법 라인에서 끝납니다.
    pub fn offer(&mut self, line_number: u64, line: &str) -> Option<DbLogEvent> {
        if self.pending.is_some()
            && let Some(fragment) = self.parser.parse(line)
            && !self.claims_own_event(line)
        {
            if let Some(event) = self.pending.as_mut() {
                event.backtrace.extend(fragment.into_frames());
            }
            return None;
        }

        if let Some(classification) = self.classifier.classify(line) {
            let mut event = DbLogEvent::new(
                classification.kind,
                classification.severity,
                self.node.clone(),
                line_number,
                line.to_owned(),
            );
            // 한 라인에 눌러 담긴 백트레이스는 즉시 자신의 이벤트에 붙입니다
            if let Some(BacktraceFragment::Packed(frames)) = self.parser.parse(line) {
                event.backtrace = frames;
            }
            return self.pending.replace(event);
        }

        match self.parser.parse(line) {
            Some(_) => {
                // 앞선 이벤트 없이 나타난 프레임은 붙일 곳이 없습니다
                trace!(line_number, "orphan backtrace line dropped");
                None
            }
            None => self.flush(),
        }
    }

    /// 문법 라인이 연속 라인이 아니라 독립 이벤트가 되어야 하는지
    /// 판정합니다. 일반 BACKTRACE 매칭만으로는 독립 이벤트가 아닙니다.
    fn claims_own_event(&self, line: &str) -> bool {
        self.classifier
            .classify(line)
            .is_some_and(|c| c.kind != KIND_BACKTRACE)
    }

    /// 보류 이벤트를 확정하여 반환합니다.
    ///
    /// 폴링이 한가할 때와 정지 시에 호출되어, 후속 라인이 더 오지
    /// 않는 이벤트가 무기한 보류되지 않도록 합니다.
    pub fn flush(&mut self) -> Option<DbLogEvent> {
        self.pending.take()
    }

    /// 보류 이벤트 존재 여부
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}
