//! 다중 타임프레임 매물대 결합.
//!
//! 타임프레임별 매물대 분석을 가중 평균하여 하나의 매매 의견을 만듭니다.
//!
//! # 결합 단계
//!
//! 1. 주요 타임프레임 분석 확인 (없으면 실패)
//! 2. 매수/공매도 강도 가중 평균 (반올림)
//! 3. 방향 태그 다수결로 타임프레임 정렬 판단
//! 4. 타임프레임별 추세 판단 후 다수결, 일관성 비율 계산
//! 5. 지지/저항 레벨 집계 (돌파 감지기 스냅샷 포함 가능)
//! 6. 의견, 진입/청산 전략, 손절/익절 레벨 결정
//! 7. 타임프레임 충돌과 기간별 전망을 코멘트에 추가
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use signal_analytics::chip_combiner::ChipCombiner;
//! use signal_core::{ChipConfig, Timeframe};
//!
//! let combiner = ChipCombiner::new(ChipConfig::default());
//! let result = combiner.combine(weighted_analyses, Timeframe::D1)?;
//! println!("{}: {}", result.combined_recommendation, result.recommendation_comment);
//! ```

use crate::conflicts::{detect_conflicts, TimeframeConflict};
use crate::levels::{group_nearby_levels, nearest_above, nearest_below};
use serde::{Deserialize, Serialize};
use signal_core::{
    clamp_score, AnalysisError, AnalysisResult, BreakSignal, BreakoutSnapshot, ChipAnalysis,
    ChipConfig, Direction, Price, Timeframe, WeightedTimeframeAnalysis,
};
use std::fmt;
use tracing::debug;

/// 손절 레벨 최대 개수.
const STOP_LOSS_COUNT: usize = 2;
/// 익절 레벨 최대 개수.
const TAKE_PROFIT_COUNT: usize = 3;

// ==================== 결과 타입 ====================

/// 타임프레임 정렬 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeframeAlignment {
    /// 상승 관점 우세
    Bullish,
    /// 하락 관점 우세
    Bearish,
    /// 중립 우세
    Neutral,
    /// 혼조
    Mixed,
}

impl TimeframeAlignment {
    /// 표시용 이름.
    pub fn label(&self) -> &'static str {
        match self {
            TimeframeAlignment::Bullish => "상승 관점",
            TimeframeAlignment::Bearish => "하락 관점",
            TimeframeAlignment::Neutral => "중립",
            TimeframeAlignment::Mixed => "혼조",
        }
    }
}

/// 추세 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// 상승 추세
    Uptrend,
    /// 하락 추세
    Downtrend,
    /// 박스권 횡보
    Ranging,
}

impl TrendDirection {
    /// 표시용 이름.
    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Uptrend => "상승 추세",
            TrendDirection::Downtrend => "하락 추세",
            TrendDirection::Ranging => "박스권 횡보",
        }
    }

    /// 매수/공매도 강도 차이로 추세를 판단합니다.
    pub fn classify(buy: f64, short: f64, margin: f64) -> Self {
        if buy > short + margin {
            TrendDirection::Uptrend
        } else if short > buy + margin {
            TrendDirection::Downtrend
        } else {
            TrendDirection::Ranging
        }
    }
}

/// 추세 일관성.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendConsistency {
    /// 80% 이상 일치
    Strong,
    /// 50% 이상 일치
    Moderate,
    /// 그 외
    Weak,
}

impl TrendConsistency {
    /// 일치 비율로 일관성을 판단합니다.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.8 {
            TrendConsistency::Strong
        } else if ratio >= 0.5 {
            TrendConsistency::Moderate
        } else {
            TrendConsistency::Weak
        }
    }

    /// 표시용 이름.
    pub fn label(&self) -> &'static str {
        match self {
            TrendConsistency::Strong => "강함",
            TrendConsistency::Moderate => "보통",
            TrendConsistency::Weak => "약함",
        }
    }
}

/// 종합 매매 의견.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    /// 매수 (롱)
    Long,
    /// 매도 (숏)
    Short,
    /// 관망
    Watch,
}

impl Recommendation {
    /// 표시용 문구.
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::Long => "종합 의견: 매수",
            Recommendation::Short => "종합 의견: 매도",
            Recommendation::Watch => "종합 의견: 관망",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 단일 타임프레임 전망.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outlook {
    /// 강한 상승
    StrongBullish,
    /// 상승
    Bullish,
    /// 강한 하락
    StrongBearish,
    /// 하락
    Bearish,
    /// 상승 우위
    LeanBullish,
    /// 하락 우위
    LeanBearish,
    /// 중립
    Neutral,
    /// 데이터 부족
    InsufficientData,
}

impl Outlook {
    /// 분석 결과로 전망을 판단합니다. 분석이 없으면 데이터 부족.
    pub fn from_analysis(analysis: Option<&ChipAnalysis>) -> Self {
        let Some(analysis) = analysis else {
            return Outlook::InsufficientData;
        };

        let buy = analysis.buy_signal_strength;
        let short = analysis.short_signal_strength;

        if buy > 75.0 {
            Outlook::StrongBullish
        } else if buy > 60.0 {
            Outlook::Bullish
        } else if short > 75.0 {
            Outlook::StrongBearish
        } else if short > 60.0 {
            Outlook::Bearish
        } else if buy > short + 10.0 {
            Outlook::LeanBullish
        } else if short > buy + 10.0 {
            Outlook::LeanBearish
        } else {
            Outlook::Neutral
        }
    }

    /// 표시용 이름.
    pub fn label(&self) -> &'static str {
        match self {
            Outlook::StrongBullish => "강한 상승 관점",
            Outlook::Bullish => "상승 관점",
            Outlook::StrongBearish => "강한 하락 관점",
            Outlook::Bearish => "하락 관점",
            Outlook::LeanBullish => "상승 우위",
            Outlook::LeanBearish => "하락 우위",
            Outlook::Neutral => "중립",
            Outlook::InsufficientData => "데이터 부족으로 분석 불가",
        }
    }
}

/// 다중 타임프레임 매물대 결합 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedChipResult {
    /// 종목 심볼
    pub symbol: String,
    /// 현재가 (주요 타임프레임 기준)
    pub current_price: Price,
    /// 타임프레임별 가중 분석
    pub timeframes: Vec<WeightedTimeframeAnalysis>,
    /// 결합 매수 강도 (0 ~ 100)
    pub combined_buy_signal_strength: f64,
    /// 결합 공매도 강도 (0 ~ 100)
    pub combined_short_signal_strength: f64,
    /// 타임프레임 정렬 상태
    pub timeframe_alignment: TimeframeAlignment,
    /// 정렬 강도 (0 ~ 100)
    pub alignment_strength: f64,
    /// 주요 타임프레임
    pub primary_timeframe: Timeframe,
    /// 주요 타임프레임 분석 의견
    pub primary_timeframe_recommendation: String,
    /// 종합 의견
    pub recommendation: Recommendation,
    /// 종합 의견 문구
    pub combined_recommendation: String,
    /// 의견 코멘트
    pub recommendation_comment: String,
    /// 추세 일관성
    pub trend_consistency: TrendConsistency,
    /// 추세 방향
    pub trend_direction: TrendDirection,
    /// 집계 지지선 (오름차순)
    pub aggregated_support_levels: Vec<Price>,
    /// 집계 저항선 (오름차순)
    pub aggregated_resistance_levels: Vec<Price>,
    /// 진입 전략
    pub entry_strategy: String,
    /// 청산 전략
    pub exit_strategy: String,
    /// 손절 레벨
    pub stop_loss_levels: Vec<Price>,
    /// 익절 레벨
    pub take_profit_levels: Vec<Price>,
    /// 타임프레임 충돌
    pub timeframe_conflicts: Vec<TimeframeConflict>,
    /// 단기(1시간봉) 전망
    pub short_term_outlook: Outlook,
    /// 중기(일봉) 전망
    pub medium_term_outlook: Outlook,
    /// 장기(주봉) 전망
    pub long_term_outlook: Outlook,
    /// 거래량이 확인된 최근 돌파 신호 (스냅샷이 있을 때)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_breakout: Option<BreakSignal>,
}

/// 의견 확신 수준.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conviction {
    Strong,
    Moderate,
    Cautious,
}

// ==================== 결합기 ====================

/// 다중 타임프레임 매물대 결합기.
///
/// 호출 간 상태를 갖지 않으므로 여러 심볼에 대해 동시에 사용할 수 있습니다.
#[derive(Debug, Clone, Default)]
pub struct ChipCombiner {
    config: ChipConfig,
    breakout: Option<BreakoutSnapshot>,
}

impl ChipCombiner {
    /// 새 결합기를 생성합니다.
    pub fn new(config: ChipConfig) -> Self {
        Self {
            config,
            breakout: None,
        }
    }

    /// 돌파 감지기 스냅샷의 동적 지지/저항을 레벨 집계에 포함합니다.
    pub fn with_breakout(mut self, snapshot: BreakoutSnapshot) -> Self {
        self.breakout = Some(snapshot);
        self
    }

    /// 설정 참조.
    pub fn config(&self) -> &ChipConfig {
        &self.config
    }

    /// 타임프레임별 가중 분석을 결합합니다.
    ///
    /// # 오류
    ///
    /// 주요 타임프레임 분석이 없으면 [`AnalysisError::MissingPrimaryTimeframe`].
    pub fn combine(
        &self,
        analyses: Vec<WeightedTimeframeAnalysis>,
        primary: Timeframe,
    ) -> AnalysisResult<CombinedChipResult> {
        let analyses: Vec<WeightedTimeframeAnalysis> = analyses
            .into_iter()
            .map(|w| WeightedTimeframeAnalysis {
                analysis: w.analysis.clamped(),
                ..w
            })
            .collect();

        let primary_analysis = analyses
            .iter()
            .find(|w| w.timeframe == primary)
            .map(|w| &w.analysis)
            .ok_or(AnalysisError::MissingPrimaryTimeframe(primary))?;

        let (combined_buy, combined_short) = weighted_strengths(&analyses);
        let (alignment, alignment_strength) = alignment_vote(&analyses);
        let (trend_direction, trend_consistency) =
            trend_vote(&analyses, self.config.signal_margin);

        debug!(
            symbol = %primary_analysis.symbol,
            combined_buy,
            combined_short,
            alignment = ?alignment,
            alignment_strength,
            trend = ?trend_direction,
            "Chip timeframes combined"
        );

        let reference_price = primary_analysis.current_price;
        let (support_pool, resistance_pool) = self.pooled_levels(&analyses);
        let aggregated_support =
            group_nearby_levels(&support_pool, reference_price, self.config.proximity_threshold);
        let aggregated_resistance = group_nearby_levels(
            &resistance_pool,
            reference_price,
            self.config.proximity_threshold,
        );

        let conflicts = detect_conflicts(&analyses);

        let find = |tf: Timeframe| analyses.iter().find(|w| w.timeframe == tf).map(|w| &w.analysis);
        let short_term_outlook = Outlook::from_analysis(find(Timeframe::H1));
        let medium_term_outlook = Outlook::from_analysis(find(Timeframe::D1));
        let long_term_outlook = Outlook::from_analysis(find(Timeframe::W1));

        let margin = self.config.signal_margin;
        let recommendation = if combined_buy > combined_short + margin {
            Recommendation::Long
        } else if combined_short > combined_buy + margin {
            Recommendation::Short
        } else {
            Recommendation::Watch
        };

        let conviction = self.conviction(recommendation, alignment, alignment_strength);
        let (comment, entry_strategy, exit_strategy) = strategy_texts(recommendation, conviction);

        let mut recommendation_comment = comment.to_string();
        recommendation_comment.push_str(&format!(
            " 추세 분석 결과 시장은 {} 상태이며 일관성은 {}.",
            trend_direction.label(),
            trend_consistency.label()
        ));
        if !conflicts.is_empty() {
            let notes: Vec<String> = conflicts.iter().map(|c| c.message()).collect();
            recommendation_comment.push_str(&format!(" 주의: {}", notes.join(" ")));
        }
        recommendation_comment.push_str(&format!(
            " 단기(1시간봉) {}, 중기(일봉) {}, 장기(주봉) {}.",
            short_term_outlook.label(),
            medium_term_outlook.label(),
            long_term_outlook.label()
        ));

        let (stop_loss_levels, take_profit_levels) = exit_levels(
            recommendation,
            reference_price,
            &aggregated_support,
            &aggregated_resistance,
        );

        let symbol = primary_analysis.symbol.clone();
        let primary_timeframe_recommendation = primary_analysis.overall_recommendation.clone();
        let latest_breakout = self
            .breakout
            .as_ref()
            .and_then(|snapshot| snapshot.latest_confirmed())
            .cloned();

        Ok(CombinedChipResult {
            symbol,
            current_price: reference_price,
            primary_timeframe_recommendation,
            combined_buy_signal_strength: combined_buy,
            combined_short_signal_strength: combined_short,
            timeframe_alignment: alignment,
            alignment_strength,
            primary_timeframe: primary,
            recommendation,
            combined_recommendation: recommendation.label().to_string(),
            recommendation_comment,
            trend_consistency,
            trend_direction,
            aggregated_support_levels: aggregated_support,
            aggregated_resistance_levels: aggregated_resistance,
            entry_strategy: entry_strategy.to_string(),
            exit_strategy: exit_strategy.to_string(),
            stop_loss_levels,
            take_profit_levels,
            timeframe_conflicts: conflicts,
            short_term_outlook,
            medium_term_outlook,
            long_term_outlook,
            latest_breakout,
            timeframes: analyses,
        })
    }

    fn pooled_levels(&self, analyses: &[WeightedTimeframeAnalysis]) -> (Vec<Price>, Vec<Price>) {
        let mut supports: Vec<Price> = analyses
            .iter()
            .flat_map(|w| w.analysis.support_levels())
            .collect();
        let mut resistances: Vec<Price> = analyses
            .iter()
            .flat_map(|w| w.analysis.resistance_levels())
            .collect();

        if let Some(snapshot) = &self.breakout {
            supports.extend(snapshot.dynamic_support.iter().copied());
            resistances.extend(snapshot.dynamic_resistance.iter().copied());
        }

        (supports, resistances)
    }

    fn conviction(
        &self,
        recommendation: Recommendation,
        alignment: TimeframeAlignment,
        alignment_strength: f64,
    ) -> Conviction {
        let aligned = matches!(
            (recommendation, alignment),
            (Recommendation::Long, TimeframeAlignment::Bullish)
                | (Recommendation::Short, TimeframeAlignment::Bearish)
        );

        if aligned && alignment_strength > self.config.strong_alignment {
            Conviction::Strong
        } else if aligned {
            Conviction::Moderate
        } else {
            Conviction::Cautious
        }
    }
}

// ==================== 결합 단계 ====================

/// 매수/공매도 강도의 가중 평균 (반올림).
///
/// 가중치 합이 0 이하이면 동일 가중치로 계산합니다.
fn weighted_strengths(analyses: &[WeightedTimeframeAnalysis]) -> (f64, f64) {
    if analyses.is_empty() {
        return (0.0, 0.0);
    }

    let total_weight: f64 = analyses.iter().map(|w| w.weight).sum();
    let use_equal = !(total_weight.is_finite() && total_weight > 0.0);

    let (mut buy, mut short, mut total) = (0.0, 0.0, 0.0);
    for weighted in analyses {
        let weight = if use_equal { 1.0 } else { weighted.weight };
        buy += weighted.analysis.buy_signal_strength * weight;
        short += weighted.analysis.short_signal_strength * weight;
        total += weight;
    }

    (
        clamp_score((buy / total).round()),
        clamp_score((short / total).round()),
    )
}

/// 방향 태그 다수결.
fn alignment_vote(analyses: &[WeightedTimeframeAnalysis]) -> (TimeframeAlignment, f64) {
    let total = analyses.len();
    if total == 0 {
        return (TimeframeAlignment::Mixed, 0.0);
    }

    let count = |direction: Direction| {
        analyses
            .iter()
            .filter(|w| w.analysis.bias == direction)
            .count()
    };
    let bullish = count(Direction::Bullish);
    let bearish = count(Direction::Bearish);
    let neutral = total - bullish - bearish;

    let share = |n: usize| clamp_score((100.0 * n as f64 / total as f64).round());

    if bullish > bearish && bullish > neutral {
        (TimeframeAlignment::Bullish, share(bullish))
    } else if bearish > bullish && bearish > neutral {
        (TimeframeAlignment::Bearish, share(bearish))
    } else if neutral >= bullish && neutral >= bearish {
        (TimeframeAlignment::Neutral, share(neutral))
    } else {
        (TimeframeAlignment::Mixed, 0.0)
    }
}

/// 타임프레임별 추세 다수결과 일관성.
fn trend_vote(
    analyses: &[WeightedTimeframeAnalysis],
    margin: f64,
) -> (TrendDirection, TrendConsistency) {
    if analyses.is_empty() {
        return (TrendDirection::Ranging, TrendConsistency::Weak);
    }

    let trends: Vec<TrendDirection> = analyses
        .iter()
        .map(|w| {
            TrendDirection::classify(
                w.analysis.buy_signal_strength,
                w.analysis.short_signal_strength,
                margin,
            )
        })
        .collect();

    let count = |t: TrendDirection| trends.iter().filter(|&&x| x == t).count();
    let up = count(TrendDirection::Uptrend);
    let down = count(TrendDirection::Downtrend);
    let ranging = count(TrendDirection::Ranging);

    let direction = if up > down && up > ranging {
        TrendDirection::Uptrend
    } else if down > up && down > ranging {
        TrendDirection::Downtrend
    } else {
        TrendDirection::Ranging
    };

    let dominant = up.max(down).max(ranging);
    let consistency = TrendConsistency::from_ratio(dominant as f64 / trends.len() as f64);

    (direction, consistency)
}

/// 의견과 확신 수준에 따른 (코멘트, 진입 전략, 청산 전략).
fn strategy_texts(
    recommendation: Recommendation,
    conviction: Conviction,
) -> (&'static str, &'static str, &'static str) {
    match recommendation {
        Recommendation::Long => {
            let (comment, entry) = match conviction {
                Conviction::Strong => (
                    "여러 타임프레임이 일제히 상승 관점으로 적극 매수를 권장합니다.",
                    "적극 진입 가능하며 지지선 부근 분할 매수를 권장합니다.",
                ),
                Conviction::Moderate => (
                    "여러 타임프레임이 상승 쪽으로 기울어 매수를 권장합니다.",
                    "지지선까지 눌림이 나올 때 매수를 권장합니다.",
                ),
                Conviction::Cautious => (
                    "종합 지표는 상승 쪽이나 타임프레임 일치도가 낮아 신중한 매수를 권장합니다.",
                    "소량으로 시험 매수 후 추가 확인을 기다리십시오.",
                ),
            };
            (
                comment,
                entry,
                "주요 저항선 부근 또는 단기 타임프레임에서 매도 신호가 나올 때 청산합니다.",
            )
        }
        Recommendation::Short => {
            let (comment, entry) = match conviction {
                Conviction::Strong => (
                    "여러 타임프레임이 일제히 하락 관점으로 적극 매도/공매도를 권장합니다.",
                    "적극 진입 가능하며 저항선 부근 분할 공매도를 권장합니다.",
                ),
                Conviction::Moderate => (
                    "여러 타임프레임이 하락 쪽으로 기울어 매도/공매도를 권장합니다.",
                    "저항선까지 반등이 나올 때 공매도를 권장합니다.",
                ),
                Conviction::Cautious => (
                    "종합 지표는 하락 쪽이나 타임프레임 일치도가 낮아 신중한 공매도를 권장합니다.",
                    "소량으로 시험 공매도 후 추가 확인을 기다리십시오.",
                ),
            };
            (
                comment,
                entry,
                "주요 지지선 부근 또는 단기 타임프레임에서 매수 신호가 나올 때 청산합니다.",
            )
        }
        Recommendation::Watch => (
            "타임프레임별 신호가 엇갈리거나 중립이므로 당분간 관망을 권장합니다.",
            "더 명확한 신호가 나온 뒤 진입을 권장합니다.",
            "보유 포지션은 소폭 수익에서 정리하여 위험을 관리합니다.",
        ),
    }
}

/// 의견별 (손절 레벨, 익절 레벨).
fn exit_levels(
    recommendation: Recommendation,
    price: Price,
    supports: &[Price],
    resistances: &[Price],
) -> (Vec<Price>, Vec<Price>) {
    match recommendation {
        Recommendation::Long => (
            nearest_below(supports, price, STOP_LOSS_COUNT),
            nearest_above(resistances, price, TAKE_PROFIT_COUNT),
        ),
        Recommendation::Short => (
            nearest_above(resistances, price, STOP_LOSS_COUNT),
            nearest_below(supports, price, TAKE_PROFIT_COUNT),
        ),
        Recommendation::Watch => {
            let stop_loss = nearest_below(supports, price, 1)
                .into_iter()
                .chain(nearest_above(resistances, price, 1))
                .collect();
            (stop_loss, Vec::new())
        }
    }
}
