//! 로그 모니터 파이프라인
//!
//! 감시 대상(파일)마다 독립적인 tokio 태스크를 스폰하여 테일링,
//! 중복 제거, 분류, 백트레이스 누적을 수행하고, 확정된 이벤트를
//! 이벤트 버스(mpsc 채널)로 전달합니다. 모든 태스크는 하나의
//! [`CancellationToken`]을 공유하며 정지 요청에 협조적으로 응답합니다.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use dbwatch_core::error::{DbwatchError, PipelineError};
use dbwatch_core::event::DbLogEvent;
use dbwatch_core::metrics::{
    LABEL_KIND, LABEL_NODE, LABEL_SEVERITY, MONITOR_EVENTS_EMITTED_TOTAL,
    MONITOR_LINES_DEDUPLICATED_TOTAL,
};
use dbwatch_core::pipeline::{HealthStatus, Pipeline};

use crate::backtrace::BacktraceParser;
use crate::config::{MonitorConfig, WatchTarget};
use crate::dedup::ReplayFilter;
use crate::error::MonitorError;
use crate::processor::LineProcessor;
use crate::tailer::FileTailer;
use crate::taxonomy::Classifier;

/// 파이프라인 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorState {
    Initialized,
    Running,
    Stopped,
}

/// 데이터베이스 로그 모니터
///
/// [`LogMonitorBuilder`]로 생성하고 [`Pipeline`] trait으로 제어합니다.
pub struct LogMonitor {
    config: MonitorConfig,
    classifier: Arc<Classifier>,
    event_tx: mpsc::Sender<DbLogEvent>,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
    state: MonitorState,
}

impl LogMonitor {
    /// 감시 대상 하나를 전담하는 태스크를 스폰합니다.
    fn spawn_watch_task(&self, target: WatchTarget) -> Result<JoinHandle<()>, MonitorError> {
        let tailer = FileTailer::new(
            &target,
            self.config.exclude_patterns.clone(),
            self.config.max_line_length,
        );
        let filter = ReplayFilter::new(
            target.from_beginning,
            target.start_line_index,
            self.config.dedup_capacity,
        );
        let processor = LineProcessor::new(
            Arc::clone(&self.classifier),
            BacktraceParser::new()?,
            target.node.clone(),
        );

        let cancel = self.cancel.clone();
        let event_tx = self.event_tx.clone();
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        Ok(tokio::spawn(watch_loop(
            target, tailer, filter, processor, cancel, event_tx, poll_interval,
        )))
    }
}

/// 감시 태스크 본체 — 정지 신호가 올 때까지 폴링을 반복합니다.
async fn watch_loop(
    target: WatchTarget,
    mut tailer: FileTailer,
    mut filter: ReplayFilter,
    mut processor: LineProcessor,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<DbLogEvent>,
    poll_interval: Duration,
) {
    info!(node = %target.node, path = %target.path, "watch task started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(node = %target.node, "watch task cancelled");
                break;
            }
            _ = tokio::time::sleep(poll_interval) => {
                match tailer.poll_chunk().await {
                    Ok(lines) if lines.is_empty() => {
                        // 새 라인이 없으면 보류 이벤트를 더 기다리지 않습니다
                        if let Some(event) = processor.flush()
                            && !publish(&event_tx, event).await
                        {
                            return;
                        }
                    }
                    Ok(lines) => {
                        for line in lines {
                            if !filter.admit(line.index) {
                                metrics::counter!(MONITOR_LINES_DEDUPLICATED_TOTAL).increment(1);
                                continue;
                            }
                            if let Some(event) = processor.offer(line.index, &line.text)
                                && !publish(&event_tx, event).await
                            {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(node = %target.node, error = %e, "failed to poll log file");
                    }
                }
            }
        }
    }

    // 정지 시 보류 이벤트를 유실하지 않습니다
    if let Some(event) = processor.flush() {
        publish(&event_tx, event).await;
    }
    info!(node = %target.node, "watch task stopped");
}

/// 이벤트를 버스로 전달합니다. 수신자가 닫혔으면 false를 반환합니다.
async fn publish(event_tx: &mpsc::Sender<DbLogEvent>, event: DbLogEvent) -> bool {
    metrics::counter!(
        MONITOR_EVENTS_EMITTED_TOTAL,
        LABEL_KIND => event.kind,
        LABEL_SEVERITY => event.severity.to_string(),
        LABEL_NODE => event.node.clone(),
    )
    .increment(1);
    debug!(%event, "publishing event");

    if event_tx.send(event).await.is_err() {
        error!("event bus receiver closed, dropping event and shutting down task");
        return false;
    }
    true
}

impl Pipeline for LogMonitor {
    async fn start(&mut self) -> Result<(), DbwatchError> {
        if self.state == MonitorState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!(
            targets = self.config.targets.len(),
            poll_interval_ms = self.config.poll_interval_ms,
            "starting log monitor"
        );

        let targets = self.config.targets.clone();
        for target in targets {
            let handle = self.spawn_watch_task(target)?;
            self.handles.push(handle);
        }

        self.state = MonitorState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DbwatchError> {
        if self.state != MonitorState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping log monitor");
        self.cancel.cancel();
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "watch task terminated abnormally");
            }
        }

        self.state = MonitorState::Stopped;
        info!("log monitor stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            MonitorState::Initialized => {
                HealthStatus::Unhealthy("monitor not started".to_owned())
            }
            MonitorState::Stopped => HealthStatus::Unhealthy("monitor stopped".to_owned()),
            MonitorState::Running => {
                let finished = self.handles.iter().filter(|h| h.is_finished()).count();
                if finished == 0 {
                    HealthStatus::Healthy
                } else if finished < self.handles.len() {
                    HealthStatus::Degraded(format!(
                        "{finished}/{} watch tasks exited",
                        self.handles.len()
                    ))
                } else {
                    HealthStatus::Unhealthy("all watch tasks exited".to_owned())
                }
            }
        }
    }
}

/// 로그 모니터 빌더
///
/// 이벤트 버스 송신단을 직접 주입하거나, 생략하면 채널을 내부에서
/// 생성하고 수신단을 반환합니다.
pub struct LogMonitorBuilder {
    config: MonitorConfig,
    event_tx: Option<mpsc::Sender<DbLogEvent>>,
}

impl LogMonitorBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
            event_tx: None,
        }
    }

    /// 모니터 설정을 지정합니다.
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부에서 만든 이벤트 버스 송신단을 주입합니다.
    ///
    /// 지정하면 `build`는 수신단을 반환하지 않습니다.
    pub fn event_sender(mut self, sender: mpsc::Sender<DbLogEvent>) -> Self {
        self.event_tx = Some(sender);
        self
    }

    /// 내부 생성 채널의 용량을 지정합니다.
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.event_channel_capacity = capacity;
        self
    }

    /// 설정을 검증하고 모니터를 생성합니다.
    ///
    /// 송신단을 주입하지 않았다면 채널을 만들어 수신단을 함께 반환합니다.
    pub fn build(
        self,
    ) -> Result<(LogMonitor, Option<mpsc::Receiver<DbLogEvent>>), MonitorError> {
        self.config.validate()?;

        let classifier = Arc::new(Classifier::with_defaults(
            self.config.reactor_stall_tolerance_ms,
        )?);

        let (event_tx, event_rx) = match self.event_tx {
            Some(tx) => (tx, None),
            None => {
                let (tx, rx) = mpsc::channel(self.config.event_channel_capacity);
                (tx, Some(rx))
            }
        };

        let monitor = LogMonitor {
            config: self.config,
            classifier,
            event_tx,
            cancel: CancellationToken::new(),
            handles: Vec::new(),
            state: MonitorState::Initialized,
        };
        Ok((monitor, event_rx))
    }
}

impl Default for LogMonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
