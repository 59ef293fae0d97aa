//! 추세 반전 신호 필터.
//!
//! 1시간봉이 일봉 추세 방향으로 복귀하는 반전 신호를 강도 임계값으로
//! 걸러내고 요약 문구를 만듭니다.

use serde::{Deserialize, Serialize};
use signal_core::{clamp_score, ReversalDirection, ReversalSignal};

/// 기본 신호 강도 임계값.
pub const DEFAULT_SIGNAL_THRESHOLD: f64 = 40.0;

/// 반전 신호 판정 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReversalVerdict {
    /// 유효 신호 여부
    pub has_signal: bool,
    /// 유효 신호일 때의 원본 신호
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_signal: Option<ReversalSignal>,
    /// 요약
    pub summary: String,
    /// 목표가별 손익비 (유효 신호이고 목표가가 있을 때)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_reward_ratios: Option<[f64; 3]>,
}

impl TrendReversalVerdict {
    /// 신호가 없는 판정.
    pub fn no_signal(summary: impl Into<String>) -> Self {
        Self {
            has_signal: false,
            primary_signal: None,
            summary: summary.into(),
            risk_reward_ratios: None,
        }
    }
}

fn action_text(direction: ReversalDirection) -> (&'static str, &'static str) {
    match direction {
        ReversalDirection::Up => ("상승", "매수(롱)"),
        ReversalDirection::Down => ("하락", "매도(숏)"),
    }
}

/// 반전 신호를 임계값으로 평가합니다.
///
/// `is_reversal`이고 강도가 `threshold` 이상이면 유효 신호입니다.
/// 강도는 0 ~ 100으로 고정한 뒤 비교하며, 반환되는 신호에도 고정값이 들어갑니다.
pub fn evaluate(signal: &ReversalSignal, threshold: f64) -> TrendReversalVerdict {
    let strength = clamp_score(signal.reversal_strength);
    let has_signal = signal.is_reversal && strength >= threshold;

    if !has_signal {
        let summary = if signal.is_reversal {
            format!(
                "약한 1시간봉-일봉 추세 복귀 반전 신호가 감지되었으나 강도가 {} 미만입니다. 더 명확한 신호를 기다리십시오.",
                threshold
            )
        } else {
            "1시간봉-일봉 추세 복귀 반전 신호가 감지되지 않았습니다.".to_string()
        };
        return TrendReversalVerdict::no_signal(summary);
    }

    let (trend, action) = action_text(signal.direction);
    let mut summary = format!(
        "1시간봉-일봉 추세 복귀 반전 신호 감지: 1시간봉이 역추세 조정을 마치고 일봉 {} 추세로 복귀, 신호 강도: {:.1}/100, {} 권장",
        trend, strength, action
    );

    if let Some(entry) = signal.entry_price {
        summary.push_str(&format!(", 진입가: {:.2}", entry));
    }

    if let Some(targets) = &signal.targets {
        summary.push_str(&format!(
            ", 목표가1: {:.2}, 목표가2: {:.2}, 목표가3: {:.2}",
            targets.target1, targets.target2, targets.target3
        ));
    }

    let risk_reward_ratios = signal.targets.as_ref().map(|t| {
        [
            t.risk_reward_ratio1,
            t.risk_reward_ratio2,
            t.risk_reward_ratio3,
        ]
    });

    TrendReversalVerdict {
        has_signal,
        primary_signal: Some(ReversalSignal {
            reversal_strength: strength,
            ..signal.clone()
        }),
        summary,
        risk_reward_ratios,
    }
}
