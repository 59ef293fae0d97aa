//! 차트 형태(가격 패턴) 분석 타입.
//!
//! 형태 감지기가 캔들 구간마다 생성하는 결과 레코드를 정의합니다.
//! 레코드는 불변으로 다루며, 최근성 보정은 새 레코드를 반환합니다.

use crate::domain::{clamp_score, Direction};
use crate::types::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 차트 형태 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    // === 반전 형태 ===
    /// 머리어깨형 (하락 반전)
    HeadAndShoulders,
    /// 역머리어깨형 (상승 반전)
    InverseHeadAndShoulders,
    /// 이중 천장
    DoubleTop,
    /// 이중 바닥
    DoubleBottom,
    /// 삼중 천장
    TripleTop,
    /// 삼중 바닥
    TripleBottom,
    // === 지속 형태 ===
    /// 상승 삼각형
    AscendingTriangle,
    /// 하락 삼각형
    DescendingTriangle,
    /// 대칭 삼각형
    SymmetricalTriangle,
    /// 상승 쐐기 (하락 반전)
    RisingWedge,
    /// 하락 쐐기 (상승 반전)
    FallingWedge,
    /// 박스권
    Rectangle,
    /// 깃발형
    Flag,
    /// 페넌트
    Pennant,
    // === 기타 ===
    /// 컵앤핸들
    CupAndHandle,
    /// 둥근 바닥
    RoundingBottom,
    /// 둥근 천장
    RoundingTop,
}

impl PatternType {
    /// 리포트에 표시할 식별자.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::HeadAndShoulders => "head_and_shoulders",
            PatternType::InverseHeadAndShoulders => "inverse_head_and_shoulders",
            PatternType::DoubleTop => "double_top",
            PatternType::DoubleBottom => "double_bottom",
            PatternType::TripleTop => "triple_top",
            PatternType::TripleBottom => "triple_bottom",
            PatternType::AscendingTriangle => "ascending_triangle",
            PatternType::DescendingTriangle => "descending_triangle",
            PatternType::SymmetricalTriangle => "symmetrical_triangle",
            PatternType::RisingWedge => "rising_wedge",
            PatternType::FallingWedge => "falling_wedge",
            PatternType::Rectangle => "rectangle",
            PatternType::Flag => "flag",
            PatternType::Pennant => "pennant",
            PatternType::CupAndHandle => "cup_and_handle",
            PatternType::RoundingBottom => "rounding_bottom",
            PatternType::RoundingTop => "rounding_top",
        }
    }
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 형태 진행 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternStatus {
    /// 형성 중
    Forming,
    /// 완성되었으나 돌파 미확인
    Completed,
    /// 돌파 확인
    Confirmed,
    /// 형성 후 실패
    Failed,
}

/// 피크/밸리 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotKind {
    /// 고점
    Peak,
    /// 저점
    Valley,
}

/// 피크/밸리 지점.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakValley {
    /// 캔들 배열 내 인덱스
    pub index: usize,
    /// 가격 (고점이면 고가, 저점이면 저가)
    pub price: Price,
    /// 캔들 시간
    pub timestamp: DateTime<Utc>,
    /// 고점/저점 구분
    pub kind: PivotKind,
}

/// 형태 구성 요소.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternComponent {
    /// 형태 시작 인덱스
    pub start_index: usize,
    /// 형태 종료 인덱스
    pub end_index: usize,
    /// 핵심 지점
    pub key_points: Vec<PeakValley>,
    /// 형태 높이 (최고점 - 최저점)
    pub pattern_height: Price,
    /// 돌파 가격 (넥라인)
    pub breakout_level: Price,
    /// 거래량 특징 (increasing / decreasing / flat)
    pub volume_pattern: String,
}

/// 형태 분석 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysisResult {
    /// 형태 유형
    pub pattern_type: PatternType,
    /// 진행 상태
    pub status: PatternStatus,
    /// 형태 방향
    pub direction: Direction,
    /// 신뢰도 (0 ~ 100)
    pub reliability: f64,
    /// 중요도 (0 ~ 100, 최근성 보정 후 100 초과 가능)
    pub significance: f64,
    /// 구성 요소
    pub component: PatternComponent,
    /// 목표가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_target: Option<Price>,
    /// 권장 손절가
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Price>,
    /// 돌파 임박 여부
    #[serde(default)]
    pub breakout_expected: bool,
    /// 형태 설명
    pub description: String,
}

impl PatternAnalysisResult {
    /// 순위 점수 (신뢰도 × 중요도).
    pub fn rank_score(&self) -> f64 {
        self.reliability * self.significance
    }

    /// 감지기 경계에서 신뢰도/중요도를 0~100으로 고정한 사본.
    pub fn clamped(mut self) -> Self {
        self.reliability = clamp_score(self.reliability);
        self.significance = clamp_score(self.significance);
        self
    }

    /// 중요도만 바꾼 새 레코드를 반환합니다.
    pub fn with_significance(&self, significance: f64) -> Self {
        Self {
            significance,
            ..self.clone()
        }
    }
}
