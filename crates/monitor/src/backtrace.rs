//! 멀티라인 백트레이스 재구성
//!
//! 데이터베이스 서버는 크래시/스톨 이벤트 직후 스택 프레임을 후속
//! 라인으로 흘려보내거나, 전체 백트레이스를 한 라인에 눌러 담아
//! 출력합니다. 이 모듈은 개별 라인이 백트레이스 문법에 속하는지
//! 판별하고, 한 라인에 눌러 담긴 형태에서 프레임 토큰을 추출합니다.

use regex::Regex;

use crate::error::MonitorError;

/// 저널 줄바꿈 마커 — 한 라인에 눌러 담긴 백트레이스에서 프레임을 구분합니다
const PACKED_NEWLINE_MARKER: &str = "#012";

/// 백트레이스 판별 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BacktraceFragment {
    /// 공유 라이브러리 프레임 한 줄 (예: `/lib/libc.so.6+0x98a32`)
    Frame(String),
    /// 원시 주소 한 줄 (예: `0x1b4816d`)
    Address(String),
    /// 한 라인에 눌러 담긴 백트레이스에서 추출한 프레임 토큰들
    Packed(Vec<String>),
}

impl BacktraceFragment {
    /// 프레임을 문자열 목록으로 펼칩니다.
    pub fn into_frames(self) -> Vec<String> {
        match self {
            Self::Frame(frame) | Self::Address(frame) => vec![frame],
            Self::Packed(frames) => frames,
        }
    }
}

/// 백트레이스 문법 판별기
///
/// 정규식은 생성 시 한 번만 컴파일합니다. 판별 자체는 실패하지
/// 않습니다 — 문법에 속하지 않는 라인은 `None`으로 처리합니다.
pub struct BacktraceParser {
    /// `<모듈 경로>+0x<hex>` 형태의 프레임 라인
    frame_re: Regex,
    /// `0x<hex>` 단독 주소 라인
    address_re: Regex,
}

impl BacktraceParser {
    /// 판별기를 생성합니다.
    pub fn new() -> Result<Self, MonitorError> {
        let compile = |name: &str, pattern: &str| {
            Regex::new(pattern).map_err(|e| MonitorError::Taxonomy {
                kind: "BACKTRACE".to_owned(),
                reason: format!("failed to compile {name} pattern: {e}"),
            })
        };
        Ok(Self {
            frame_re: compile("frame", r"(?i)^\s*(/[^\s+]+\+)0x[0-9a-f]+\s*$")?,
            address_re: compile("address", r"(?i)^\s*0x[0-9a-f]+\s*$")?,
        })
    }

    /// 라인이 백트레이스 문법에 속하는지 판별합니다.
    ///
    /// 다음 세 형태를 인식합니다:
    /// - 공유 라이브러리 프레임 한 줄 → [`BacktraceFragment::Frame`]
    /// - 원시 주소 한 줄 → [`BacktraceFragment::Address`]
    /// - "backtrace:" 뒤에 `0x` 토큰을 포함하는 눌러 담긴 한 줄
    ///   → [`BacktraceFragment::Packed`]
    ///
    /// 어느 형태에도 속하지 않으면 `None`입니다.
    pub fn parse(&self, line: &str) -> Option<BacktraceFragment> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        if self.frame_re.is_match(trimmed) {
            return Some(BacktraceFragment::Frame(trimmed.to_owned()));
        }
        if self.address_re.is_match(trimmed) {
            return Some(BacktraceFragment::Address(trimmed.to_owned()));
        }

        self.parse_packed(trimmed)
    }

    /// 한 라인에 눌러 담긴 백트레이스에서 프레임 토큰을 추출합니다.
    ///
    /// "backtrace:" 마커(대소문자 무관) 뒤의 꼬리를 `#012` 마커와
    /// 공백으로 나눈 뒤, `0x`로 시작하거나 `/lib`를 포함하는 토큰만
    /// 프레임으로 인정합니다.
    fn parse_packed(&self, line: &str) -> Option<BacktraceFragment> {
        // ASCII 소문자화는 바이트 길이를 보존하므로 찾은 오프셋을
        // 원본 라인 슬라이스에 그대로 쓸 수 있습니다
        let marker_at = line.to_ascii_lowercase().find("backtrace:")?;
        let tail = &line[marker_at + "backtrace:".len()..];
        if !tail.contains("0x") {
            return None;
        }

        let frames: Vec<String> = tail
            .split(PACKED_NEWLINE_MARKER)
            .flat_map(str::split_whitespace)
            .filter(|token| token.starts_with("0x") || token.contains("/lib"))
            .map(str::to_owned)
            .collect();

        if frames.is_empty() {
            None
        } else {
            Some(BacktraceFragment::Packed(frames))
        }
    }
}
