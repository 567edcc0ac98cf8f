//! 로그 파일 테일러
//!
//! 파일 하나를 바이트 오프셋 커서로 추적하며, 폴링 때마다 커서 이후에
//! 추가된 내용을 읽어 완성된 라인 단위로 반환합니다. 파일이 아직
//! 없으면 빈 청크를 반환하고 다음 폴링에서 다시 시도합니다 —
//! 파일 부재는 오류가 아니라 정상 대기 상태입니다.

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tracing::{debug, warn};

use dbwatch_core::metrics::{
    MONITOR_LINES_EXCLUDED_TOTAL, MONITOR_LINES_READ_TOTAL, MONITOR_TAIL_ERRORS_TOTAL,
};

use crate::config::WatchTarget;
use crate::error::MonitorError;

/// 읽어 들인 라인 하나 — 파일 내 라인 번호(1부터)와 트리밍된 내용
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailedLine {
    /// 파일 내 라인 번호 (1부터 시작)
    pub index: u64,
    /// 앞뒤 공백이 제거된 라인 내용
    pub text: String,
}

/// 파일 하나를 전담하는 테일러
pub struct FileTailer {
    /// 감시할 파일 경로
    path: String,
    /// 다음 읽기를 시작할 바이트 오프셋
    cursor: u64,
    /// 다음에 완성될 라인의 번호 (1부터)
    next_line_index: u64,
    /// 개행 없이 끝난 미완성 꼬리 — 다음 청크와 이어 붙입니다.
    /// 멀티바이트 문자가 폴링 경계에서 잘릴 수 있으므로 바이트로 보관합니다.
    partial: Vec<u8>,
    /// 이 부분 문자열을 포함하는 라인은 조용히 건너뜁니다
    exclude_patterns: Vec<String>,
    /// 라인 길이 상한 (바이트) — 초과분은 잘라냅니다
    max_line_length: usize,
    /// 파일을 한 번이라도 열었는지 여부 (부재 로그 중복 억제용)
    observed: bool,
}

impl FileTailer {
    /// 감시 대상으로부터 테일러를 생성합니다.
    ///
    /// 전체 재생 모드면 파일 처음부터, 아니면 지정한 재개 오프셋부터
    /// 읽기 시작합니다.
    pub fn new(
        target: &WatchTarget,
        exclude_patterns: Vec<String>,
        max_line_length: usize,
    ) -> Self {
        let (cursor, next_line_index) = if target.from_beginning {
            (0, 1)
        } else {
            (target.start_offset, target.start_line_index + 1)
        };
        Self {
            path: target.path.clone(),
            cursor,
            next_line_index,
            partial: Vec::new(),
            exclude_patterns,
            max_line_length,
            observed: false,
        }
    }

    /// 커서 이후에 추가된 완성 라인들을 읽어 반환합니다.
    ///
    /// 파일이 없으면 빈 목록을 반환합니다. 파일이 커서보다 작아졌으면
    /// 잘린(truncate) 것으로 보고 처음부터 다시 읽되, 라인 번호는
    /// 계속 증가시킵니다 — 중복 제거는 라인 번호 기준이므로 번호를
    /// 되감으면 새 내용이 버려집니다.
    pub async fn poll_chunk(&mut self) -> Result<Vec<TailedLine>, MonitorError> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if !self.observed {
                    debug!(path = %self.path, "log file not present yet, waiting");
                }
                return Ok(Vec::new());
            }
            Err(e) => {
                metrics::counter!(MONITOR_TAIL_ERRORS_TOTAL).increment(1);
                return Err(MonitorError::Tail {
                    path: self.path.clone(),
                    reason: e.to_string(),
                });
            }
        };
        self.observed = true;

        let len = file
            .metadata()
            .await
            .map_err(|e| self.tail_error(&e))?
            .len();
        if len < self.cursor {
            warn!(path = %self.path, cursor = self.cursor, len, "file shrank, re-reading from start");
            self.cursor = 0;
            self.partial.clear();
        }
        if len == self.cursor {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.cursor))
            .await
            .map_err(|e| self.tail_error(&e))?;
        let mut buf = Vec::with_capacity((len - self.cursor) as usize);
        let read = file
            .read_to_end(&mut buf)
            .await
            .map_err(|e| self.tail_error(&e))?;
        self.cursor += read as u64;

        Ok(self.split_lines(&buf))
    }

    /// 바이트 청크를 완성 라인들로 분해합니다.
    ///
    /// 마지막 개행 이후의 꼬리는 바이트로 보관했다가 다음 청크 앞에
    /// 붙이고, 문자열 변환은 라인이 완성된 뒤에만 수행합니다.
    fn split_lines(&mut self, chunk: &[u8]) -> Vec<TailedLine> {
        let mut lines = Vec::new();

        for &byte in chunk {
            if byte == b'\n' {
                let raw = std::mem::take(&mut self.partial);
                let index = self.next_line_index;
                self.next_line_index += 1;
                metrics::counter!(MONITOR_LINES_READ_TOTAL).increment(1);

                let text = String::from_utf8_lossy(&raw);
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if self.is_excluded(trimmed) {
                    metrics::counter!(MONITOR_LINES_EXCLUDED_TOTAL).increment(1);
                    continue;
                }
                lines.push(TailedLine {
                    index,
                    text: trimmed.to_owned(),
                });
            } else if self.partial.len() < self.max_line_length {
                self.partial.push(byte);
            }
            // 상한을 넘는 바이트는 버립니다 — 라인 번호 계산은 개행 기준이라 영향이 없습니다
        }

        lines
    }

    fn is_excluded(&self, line: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && line.contains(pattern.as_str()))
    }

    fn tail_error(&self, e: &std::io::Error) -> MonitorError {
        metrics::counter!(MONITOR_TAIL_ERRORS_TOTAL).increment(1);
        MonitorError::Tail {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }

    /// 현재 커서 위치 (바이트)
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// 마지막으로 완성한 라인 번호
    pub fn last_line_index(&self) -> u64 {
        self.next_line_index - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tailer_for(path: &str) -> FileTailer {
        FileTailer::new(&WatchTarget::new("node1", path), Vec::new(), 64 * 1024)
    }

    #[tokio::test]
    async fn missing_file_yields_empty_chunk() {
        let mut tailer = tailer_for("/nonexistent/dbwatch-test.log");
        let lines = tailer.poll_chunk().await.unwrap();
        assert!(lines.is_empty());
        assert_eq!(tailer.cursor(), 0);
    }

    #[tokio::test]
    async fn reads_complete_lines_with_indices() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "first").unwrap();
        writeln!(file, "second").unwrap();
        file.flush().unwrap();

        let mut tailer = tailer_for(file.path().to_str().unwrap());
        let lines = tailer.poll_chunk().await.unwrap();
        assert_eq!(
            lines,
            vec![
                TailedLine { index: 1, text: "first".to_owned() },
                TailedLine { index: 2, text: "second".to_owned() },
            ]
        );
        assert_eq!(tailer.last_line_index(), 2);
    }

    #[tokio::test]
    async fn partial_line_carries_over_between_polls() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "hello wo").unwrap();
        file.flush().unwrap();

        let mut tailer = tailer_for(file.path().to_str().unwrap());
        assert!(tailer.poll_chunk().await.unwrap().is_empty());

        writeln!(file, "rld").unwrap();
        file.flush().unwrap();
        let lines = tailer.poll_chunk().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "hello world");
        assert_eq!(lines[0].index, 1);
    }

    #[tokio::test]
    async fn multibyte_char_split_across_polls_is_preserved() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let bytes = "café line\n".as_bytes();
        // 'é'의 두 바이트 사이에서 끊어 씁니다
        file.write_all(&bytes[..4]).unwrap();
        file.flush().unwrap();

        let mut tailer = tailer_for(file.path().to_str().unwrap());
        assert!(tailer.poll_chunk().await.unwrap().is_empty());

        file.write_all(&bytes[4..]).unwrap();
        file.flush().unwrap();
        let lines = tailer.poll_chunk().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "café line");
    }

    #[tokio::test]
    async fn excluded_lines_consume_index_but_are_dropped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "keep me").unwrap();
        writeln!(file, "noisy heartbeat tick").unwrap();
        writeln!(file, "keep me too").unwrap();
        file.flush().unwrap();

        let mut tailer = FileTailer::new(
            &WatchTarget::new("node1", file.path().to_str().unwrap()),
            vec!["heartbeat".to_owned()],
            64 * 1024,
        );
        let lines = tailer.poll_chunk().await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].index, 1);
        // 제외된 라인도 라인 번호는 차지합니다
        assert_eq!(lines[1].index, 3);
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "one").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "two").unwrap();
        file.flush().unwrap();

        let mut tailer = tailer_for(file.path().to_str().unwrap());
        let lines = tailer.poll_chunk().await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].index, 4);
    }

    #[tokio::test]
    async fn resume_target_skips_to_offset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "old line").unwrap();
        let offset = file.as_file().metadata().unwrap().len();
        writeln!(file, "new line").unwrap();
        file.flush().unwrap();

        let target = WatchTarget::new("node1", file.path().to_str().unwrap()).resume_at(offset, 1);
        let mut tailer = FileTailer::new(&target, Vec::new(), 64 * 1024);
        let lines = tailer.poll_chunk().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].index, 2);
        assert_eq!(lines[0].text, "new line");
    }

    #[tokio::test]
    async fn over_long_lines_are_truncated() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", "x".repeat(100)).unwrap();
        writeln!(file, "short").unwrap();
        file.flush().unwrap();

        let mut tailer = FileTailer::new(
            &WatchTarget::new("node1", file.path().to_str().unwrap()),
            Vec::new(),
            16,
        );
        let lines = tailer.poll_chunk().await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text.len(), 16);
        assert_eq!(lines[1].text, "short");
        assert_eq!(lines[1].index, 2);
    }

    #[tokio::test]
    async fn truncated_file_is_reread_with_fresh_indices() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_owned();
        std::fs::write(&path, "first generation\n").unwrap();

        let mut tailer = tailer_for(&path);
        let lines = tailer.poll_chunk().await.unwrap();
        assert_eq!(lines.len(), 1);

        // 더 짧은 내용으로 덮어쓰면 처음부터 다시 읽습니다
        std::fs::write(&path, "rotated\n").unwrap();
        let lines = tailer.poll_chunk().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "rotated");
        assert_eq!(lines[0].index, 2);
    }
}
