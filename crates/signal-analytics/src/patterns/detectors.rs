//! 기본 차트 형태 감지기.
//!
//! 피크/밸리 목록과 캔들로 형태 계열별 후보를 찾습니다.
//!
//! # 상태 판정
//!
//! 형태의 상단/하단 경계를 기준으로 마지막 종가를 비교합니다.
//!
//! - **confirmed**: 형태 방향으로 돌파 레벨을 넘어섬
//! - **failed**: 반대쪽 경계(무효화 레벨)를 이탈
//! - **forming**: 수렴형 구조가 아직 열려 있음 (돌파 레벨 근처면 `breakout_expected`)
//! - **completed**: 그 외

use super::pivots::{peaks, valleys};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use signal_core::{
    Candle, Direction, PatternAnalysisResult, PatternComponent, PatternConfig,
    PatternDetector, PatternStatus, PatternType, PeakValley, PivotKind, Price,
};

/// 수평선으로 보는 상대 기울기 허용치 (캔들당 0.1%).
pub const DEFAULT_SLOPE_TOLERANCE: f64 = 0.001;

/// 거래량 증감 판단 비율.
const VOLUME_CHANGE_RATIO: f64 = 0.1;

/// 기본 감지기 목록을 생성합니다.
pub fn default_detectors(config: &PatternConfig) -> Vec<Box<dyn PatternDetector>> {
    let tolerance = config.price_tolerance;
    vec![
        Box::new(HeadAndShouldersDetector::new(tolerance)),
        Box::new(DoubleTripleDetector::new(tolerance)),
        Box::new(TriangleDetector::new(tolerance, DEFAULT_SLOPE_TOLERANCE)),
        Box::new(WedgeDetector::new(tolerance, DEFAULT_SLOPE_TOLERANCE)),
        Box::new(FlagPennantDetector {
            tolerance,
            ..Default::default()
        }),
        Box::new(CupAndHandleDetector::new(tolerance)),
        Box::new(RoundingDetector::new(tolerance)),
    ]
}

// ==================== 공통 헬퍼 ====================

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// 두 가격이 평균 대비 `tolerance` 이내인지 확인.
fn similar(a: Price, b: Price, tolerance: f64) -> bool {
    let avg = (a + b) / Decimal::TWO;
    if avg <= Decimal::ZERO {
        return false;
    }
    to_f64((a - b).abs() / avg) <= tolerance
}

/// 캔들당 상대 기울기.
fn relative_slope(p1: &PeakValley, p2: &PeakValley) -> f64 {
    let bars = p2.index as f64 - p1.index as f64;
    if bars == 0.0 || p1.price <= Decimal::ZERO {
        return 0.0;
    }
    to_f64((p2.price - p1.price) / p1.price) / bars
}

/// 구간 전반부와 후반부의 평균 거래량 비교.
fn volume_pattern(candles: &[Candle], start: usize, end: usize) -> &'static str {
    let end = end.min(candles.len().saturating_sub(1));
    if start >= end {
        return "flat";
    }

    let segment = &candles[start..=end];
    let (first, second) = segment.split_at(segment.len() / 2);
    let average = |part: &[Candle]| {
        let sum: Decimal = part.iter().map(|c| c.volume).sum();
        to_f64(sum) / part.len().max(1) as f64
    };

    let before = average(first);
    let after = average(second);
    if before <= 0.0 {
        return "flat";
    }

    let change = after / before - 1.0;
    if change > VOLUME_CHANGE_RATIO {
        "increasing"
    } else if change < -VOLUME_CHANGE_RATIO {
        "decreasing"
    } else {
        "flat"
    }
}

fn pattern_name(pattern_type: PatternType) -> &'static str {
    match pattern_type {
        PatternType::HeadAndShoulders => "머리어깨형",
        PatternType::InverseHeadAndShoulders => "역머리어깨형",
        PatternType::DoubleTop => "이중 천장",
        PatternType::DoubleBottom => "이중 바닥",
        PatternType::TripleTop => "삼중 천장",
        PatternType::TripleBottom => "삼중 바닥",
        PatternType::AscendingTriangle => "상승 삼각형",
        PatternType::DescendingTriangle => "하락 삼각형",
        PatternType::SymmetricalTriangle => "대칭 삼각형",
        PatternType::RisingWedge => "상승 쐐기",
        PatternType::FallingWedge => "하락 쐐기",
        PatternType::Rectangle => "박스권",
        PatternType::Flag => "깃발형",
        PatternType::Pennant => "페넌트",
        PatternType::CupAndHandle => "컵앤핸들",
        PatternType::RoundingBottom => "둥근 바닥",
        PatternType::RoundingTop => "둥근 천장",
    }
}

fn status_name(status: PatternStatus) -> &'static str {
    match status {
        PatternStatus::Forming => "형성 중",
        PatternStatus::Completed => "완성",
        PatternStatus::Confirmed => "돌파 확인",
        PatternStatus::Failed => "실패",
    }
}

/// 감지기가 채우는 형태 후보.
struct Draft {
    pattern_type: PatternType,
    direction: Direction,
    start_index: usize,
    end_index: usize,
    key_points: Vec<PeakValley>,
    /// 상단 경계
    upper: Price,
    /// 하단 경계
    lower: Price,
    price_target: Option<Price>,
    /// 수렴형 구조 여부 (미돌파 시 forming)
    converging: bool,
    base_reliability: f64,
}

impl Draft {
    /// 상태, 신뢰도, 중요도를 계산해 결과 레코드를 만듭니다.
    fn build(self, candles: &[Candle], tolerance: f64) -> Option<PatternAnalysisResult> {
        if self.upper <= self.lower || self.lower < Decimal::ZERO {
            return None;
        }
        let last_close = candles.last()?.close;

        let status = match self.direction {
            Direction::Bullish if last_close > self.upper => PatternStatus::Confirmed,
            Direction::Bullish if last_close < self.lower => PatternStatus::Failed,
            Direction::Bearish if last_close < self.lower => PatternStatus::Confirmed,
            Direction::Bearish if last_close > self.upper => PatternStatus::Failed,
            Direction::Neutral if last_close > self.upper || last_close < self.lower => {
                PatternStatus::Completed
            }
            _ if self.converging => PatternStatus::Forming,
            _ => PatternStatus::Completed,
        };

        let breakout_level = match self.direction {
            Direction::Bearish => self.lower,
            _ => self.upper,
        };

        let near = |level: Price| {
            last_close > Decimal::ZERO && to_f64((last_close - level).abs() / last_close) <= tolerance
        };
        let breakout_expected = status == PatternStatus::Forming
            && (near(breakout_level) || (self.direction == Direction::Neutral && near(self.lower)));

        let volume = volume_pattern(candles, self.start_index, self.end_index);

        let mut reliability = self.base_reliability;
        if status == PatternStatus::Confirmed && volume == "increasing" {
            reliability += 5.0;
        }
        if status == PatternStatus::Failed {
            reliability *= 0.5;
        }

        // 상대 높이 10%면 중요도 80
        let pattern_height = self.upper - self.lower;
        let height_pct = if self.lower > Decimal::ZERO {
            to_f64(pattern_height / self.lower) * 100.0
        } else {
            0.0
        };
        let significance = 40.0 + 4.0 * height_pct;

        let stop_loss = match self.direction {
            Direction::Bullish => Some(self.lower),
            Direction::Bearish => Some(self.upper),
            Direction::Neutral => None,
        };

        let description = format!(
            "{} {}, 돌파 레벨 {:.2}",
            pattern_name(self.pattern_type),
            status_name(status),
            breakout_level
        );

        Some(
            PatternAnalysisResult {
                pattern_type: self.pattern_type,
                status,
                direction: self.direction,
                reliability,
                significance,
                component: PatternComponent {
                    start_index: self.start_index,
                    end_index: self.end_index,
                    key_points: self.key_points,
                    pattern_height,
                    breakout_level,
                    volume_pattern: volume.to_string(),
                },
                price_target: self.price_target,
                stop_loss,
                breakout_expected,
                description,
            }
            .clamped(),
        )
    }
}

// ==================== 머리어깨형 ====================

/// 머리어깨형 / 역머리어깨형 감지기.
#[derive(Debug, Clone)]
pub struct HeadAndShouldersDetector {
    tolerance: f64,
}

impl HeadAndShouldersDetector {
    /// 새 감지기를 생성합니다.
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl PatternDetector for HeadAndShouldersDetector {
    fn name(&self) -> &'static str {
        "head_and_shoulders"
    }

    fn detect(&self, candles: &[Candle], pivots: &[PeakValley]) -> Vec<PatternAnalysisResult> {
        let peaks = peaks(pivots);
        let valleys = valleys(pivots);
        let mut drafts = Vec::new();

        if peaks.len() < 3 || valleys.len() < 2 {
            return Vec::new();
        }

        // 연속된 3개의 피크 검사
        for w in peaks.windows(3) {
            let (left, head, right) = (w[0], w[1], w[2]);

            // 머리가 양 어깨보다 높고 양 어깨가 비슷한 높이
            if head.price <= left.price || head.price <= right.price {
                continue;
            }
            if !similar(left.price, right.price, self.tolerance) {
                continue;
            }

            let neckline_points: Vec<&PeakValley> = valleys
                .iter()
                .copied()
                .filter(|v| v.index > left.index && v.index < right.index)
                .collect();
            let (Some(first), Some(last)) = (neckline_points.first(), neckline_points.last())
            else {
                continue;
            };
            if neckline_points.len() < 2 {
                continue;
            }

            let neckline = (first.price + last.price) / Decimal::TWO;
            let height = head.price - neckline;

            drafts.push(Draft {
                pattern_type: PatternType::HeadAndShoulders,
                direction: Direction::Bearish,
                start_index: left.index,
                end_index: right.index,
                key_points: vec![
                    left.clone(),
                    (*first).clone(),
                    head.clone(),
                    (*last).clone(),
                    right.clone(),
                ],
                upper: head.price,
                lower: neckline,
                price_target: Some(neckline - height),
                converging: false,
                base_reliability: 80.0,
            });
        }

        // 역머리어깨형
        for w in valleys.windows(3) {
            let (left, head, right) = (w[0], w[1], w[2]);

            if head.price >= left.price || head.price >= right.price {
                continue;
            }
            if !similar(left.price, right.price, self.tolerance) {
                continue;
            }

            let neckline_points: Vec<&PeakValley> = peaks
                .iter()
                .copied()
                .filter(|p| p.index > left.index && p.index < right.index)
                .collect();
            let (Some(first), Some(last)) = (neckline_points.first(), neckline_points.last())
            else {
                continue;
            };
            if neckline_points.len() < 2 {
                continue;
            }

            let neckline = (first.price + last.price) / Decimal::TWO;
            let height = neckline - head.price;

            drafts.push(Draft {
                pattern_type: PatternType::InverseHeadAndShoulders,
                direction: Direction::Bullish,
                start_index: left.index,
                end_index: right.index,
                key_points: vec![
                    left.clone(),
                    (*first).clone(),
                    head.clone(),
                    (*last).clone(),
                    right.clone(),
                ],
                upper: neckline,
                lower: head.price,
                price_target: Some(neckline + height),
                converging: false,
                base_reliability: 80.0,
            });
        }

        drafts
            .into_iter()
            .filter_map(|d| d.build(candles, self.tolerance))
            .collect()
    }
}

// ==================== 이중/삼중 천장·바닥 ====================

/// 이중/삼중 천장 및 바닥 감지기.
#[derive(Debug, Clone)]
pub struct DoubleTripleDetector {
    tolerance: f64,
}

impl DoubleTripleDetector {
    /// 새 감지기를 생성합니다.
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl PatternDetector for DoubleTripleDetector {
    fn name(&self) -> &'static str {
        "double_triple"
    }

    fn detect(&self, candles: &[Candle], pivots: &[PeakValley]) -> Vec<PatternAnalysisResult> {
        let peaks = peaks(pivots);
        let valleys = valleys(pivots);
        let mut drafts = Vec::new();

        // 이중 천장
        for w in peaks.windows(2) {
            let (first, second) = (w[0], w[1]);
            if !similar(first.price, second.price, self.tolerance) {
                continue;
            }

            let middle = valleys
                .iter()
                .filter(|v| v.index > first.index && v.index < second.index)
                .min_by(|a, b| a.price.cmp(&b.price));

            if let Some(valley) = middle {
                let top = first.price.max(second.price);
                drafts.push(Draft {
                    pattern_type: PatternType::DoubleTop,
                    direction: Direction::Bearish,
                    start_index: first.index,
                    end_index: second.index,
                    key_points: vec![first.clone(), (*valley).clone(), second.clone()],
                    upper: top,
                    lower: valley.price,
                    price_target: Some(valley.price - (top - valley.price)),
                    converging: false,
                    base_reliability: 75.0,
                });
            }
        }

        // 이중 바닥
        for w in valleys.windows(2) {
            let (first, second) = (w[0], w[1]);
            if !similar(first.price, second.price, self.tolerance) {
                continue;
            }

            let middle = peaks
                .iter()
                .filter(|p| p.index > first.index && p.index < second.index)
                .max_by(|a, b| a.price.cmp(&b.price));

            if let Some(peak) = middle {
                let bottom = first.price.min(second.price);
                drafts.push(Draft {
                    pattern_type: PatternType::DoubleBottom,
                    direction: Direction::Bullish,
                    start_index: first.index,
                    end_index: second.index,
                    key_points: vec![first.clone(), (*peak).clone(), second.clone()],
                    upper: peak.price,
                    lower: bottom,
                    price_target: Some(peak.price + (peak.price - bottom)),
                    converging: false,
                    base_reliability: 75.0,
                });
            }
        }

        // 삼중 천장
        for w in peaks.windows(3) {
            let (p1, p2, p3) = (w[0], w[1], w[2]);
            if !(similar(p1.price, p2.price, self.tolerance)
                && similar(p2.price, p3.price, self.tolerance)
                && similar(p1.price, p3.price, self.tolerance))
            {
                continue;
            }

            let support = valleys
                .iter()
                .filter(|v| v.index > p1.index && v.index < p3.index)
                .map(|v| v.price)
                .min();

            if let Some(support) = support {
                let top = p1.price.max(p2.price).max(p3.price);
                drafts.push(Draft {
                    pattern_type: PatternType::TripleTop,
                    direction: Direction::Bearish,
                    start_index: p1.index,
                    end_index: p3.index,
                    key_points: vec![p1.clone(), p2.clone(), p3.clone()],
                    upper: top,
                    lower: support,
                    price_target: Some(support - (top - support)),
                    converging: false,
                    base_reliability: 80.0,
                });
            }
        }

        // 삼중 바닥
        for w in valleys.windows(3) {
            let (v1, v2, v3) = (w[0], w[1], w[2]);
            if !(similar(v1.price, v2.price, self.tolerance)
                && similar(v2.price, v3.price, self.tolerance)
                && similar(v1.price, v3.price, self.tolerance))
            {
                continue;
            }

            let resistance = peaks
                .iter()
                .filter(|p| p.index > v1.index && p.index < v3.index)
                .map(|p| p.price)
                .max();

            if let Some(resistance) = resistance {
                let bottom = v1.price.min(v2.price).min(v3.price);
                drafts.push(Draft {
                    pattern_type: PatternType::TripleBottom,
                    direction: Direction::Bullish,
                    start_index: v1.index,
                    end_index: v3.index,
                    key_points: vec![v1.clone(), v2.clone(), v3.clone()],
                    upper: resistance,
                    lower: bottom,
                    price_target: Some(resistance + (resistance - bottom)),
                    converging: false,
                    base_reliability: 80.0,
                });
            }
        }

        drafts
            .into_iter()
            .filter_map(|d| d.build(candles, self.tolerance))
            .collect()
    }
}

// ==================== 삼각형 / 쐐기 ====================

/// 겹치는 구간을 가진 연속 피크 쌍과 연속 밸리 쌍.
struct TrendlinePair<'a> {
    peak1: &'a PeakValley,
    peak2: &'a PeakValley,
    valley1: &'a PeakValley,
    valley2: &'a PeakValley,
}

impl TrendlinePair<'_> {
    fn start(&self) -> usize {
        self.peak1.index.min(self.valley1.index)
    }

    fn end(&self) -> usize {
        self.peak2.index.max(self.valley2.index)
    }

    fn upper(&self) -> Price {
        self.peak1.price.max(self.peak2.price)
    }

    fn lower(&self) -> Price {
        self.valley1.price.min(self.valley2.price)
    }

    fn peak_slope(&self) -> f64 {
        relative_slope(self.peak1, self.peak2)
    }

    fn valley_slope(&self) -> f64 {
        relative_slope(self.valley1, self.valley2)
    }

    fn key_points(&self) -> Vec<PeakValley> {
        vec![
            self.peak1.clone(),
            self.peak2.clone(),
            self.valley1.clone(),
            self.valley2.clone(),
        ]
    }
}

fn trendline_pairs<'a>(pivots: &'a [PeakValley]) -> Vec<TrendlinePair<'a>> {
    let peaks = peaks(pivots);
    let valleys = valleys(pivots);
    let mut pairs = Vec::new();

    for pw in peaks.windows(2) {
        for vw in valleys.windows(2) {
            let pair = TrendlinePair {
                peak1: pw[0],
                peak2: pw[1],
                valley1: vw[0],
                valley2: vw[1],
            };

            // 피크 구간과 밸리 구간이 겹치는지 확인
            let overlap_start = pair.peak1.index.max(pair.valley1.index);
            let overlap_end = pair.peak2.index.min(pair.valley2.index);
            if overlap_end > overlap_start {
                pairs.push(pair);
            }
        }
    }

    pairs
}

/// 삼각형(상승/하락/대칭) 및 박스권 감지기.
#[derive(Debug, Clone)]
pub struct TriangleDetector {
    tolerance: f64,
    slope_tolerance: f64,
}

impl TriangleDetector {
    /// 새 감지기를 생성합니다.
    pub fn new(tolerance: f64, slope_tolerance: f64) -> Self {
        Self {
            tolerance,
            slope_tolerance,
        }
    }
}

impl PatternDetector for TriangleDetector {
    fn name(&self) -> &'static str {
        "triangle"
    }

    fn detect(&self, candles: &[Candle], pivots: &[PeakValley]) -> Vec<PatternAnalysisResult> {
        let st = self.slope_tolerance;
        let mut drafts = Vec::new();

        for pair in trendline_pairs(pivots) {
            let peak_slope = pair.peak_slope();
            let valley_slope = pair.valley_slope();
            let (upper, lower) = (pair.upper(), pair.lower());
            let height = upper - lower;

            let classified = if peak_slope.abs() < st && valley_slope > st {
                // 상단 수평, 하단 상승
                Some((
                    PatternType::AscendingTriangle,
                    Direction::Bullish,
                    Some(upper + height),
                    70.0,
                ))
            } else if valley_slope.abs() < st && peak_slope < -st {
                // 하단 수평, 상단 하락
                Some((
                    PatternType::DescendingTriangle,
                    Direction::Bearish,
                    Some(lower - height),
                    70.0,
                ))
            } else if peak_slope < -st && valley_slope > st {
                // 양쪽 수렴, 방향 불확실
                Some((PatternType::SymmetricalTriangle, Direction::Neutral, None, 65.0))
            } else if peak_slope.abs() < st && valley_slope.abs() < st {
                Some((PatternType::Rectangle, Direction::Neutral, None, 60.0))
            } else {
                None
            };

            if let Some((pattern_type, direction, price_target, base_reliability)) = classified {
                drafts.push(Draft {
                    pattern_type,
                    direction,
                    start_index: pair.start(),
                    end_index: pair.end(),
                    key_points: pair.key_points(),
                    upper,
                    lower,
                    price_target,
                    converging: true,
                    base_reliability,
                });
            }
        }

        drafts
            .into_iter()
            .filter_map(|d| d.build(candles, self.tolerance))
            .collect()
    }
}

/// 상승/하락 쐐기 감지기.
#[derive(Debug, Clone)]
pub struct WedgeDetector {
    tolerance: f64,
    slope_tolerance: f64,
}

impl WedgeDetector {
    /// 새 감지기를 생성합니다.
    pub fn new(tolerance: f64, slope_tolerance: f64) -> Self {
        Self {
            tolerance,
            slope_tolerance,
        }
    }
}

impl PatternDetector for WedgeDetector {
    fn name(&self) -> &'static str {
        "wedge"
    }

    fn detect(&self, candles: &[Candle], pivots: &[PeakValley]) -> Vec<PatternAnalysisResult> {
        let st = self.slope_tolerance;
        let mut drafts = Vec::new();

        for pair in trendline_pairs(pivots) {
            let peak_slope = pair.peak_slope();
            let valley_slope = pair.valley_slope();

            // 상승 쐐기: 양쪽 상승하며 하단이 더 가파르게 수렴 (보통 하락 반전)
            if peak_slope > st && valley_slope > st && valley_slope > peak_slope {
                drafts.push(Draft {
                    pattern_type: PatternType::RisingWedge,
                    direction: Direction::Bearish,
                    start_index: pair.start(),
                    end_index: pair.end(),
                    key_points: pair.key_points(),
                    upper: pair.upper(),
                    lower: pair.lower(),
                    price_target: Some(pair.valley1.price),
                    converging: true,
                    base_reliability: 65.0,
                });
            }

            // 하락 쐐기: 양쪽 하락하며 상단이 더 가파르게 수렴 (보통 상승 반전)
            if peak_slope < -st && valley_slope < -st && peak_slope < valley_slope {
                drafts.push(Draft {
                    pattern_type: PatternType::FallingWedge,
                    direction: Direction::Bullish,
                    start_index: pair.start(),
                    end_index: pair.end(),
                    key_points: pair.key_points(),
                    upper: pair.upper(),
                    lower: pair.lower(),
                    price_target: Some(pair.peak1.price),
                    converging: true,
                    base_reliability: 65.0,
                });
            }
        }

        drafts
            .into_iter()
            .filter_map(|d| d.build(candles, self.tolerance))
            .collect()
    }
}

// ==================== 깃발형 / 페넌트 ====================

/// 깃발형/페넌트 감지기.
///
/// 강한 움직임(깃대) 직후의 짧은 조정 구간을 찾습니다.
#[derive(Debug, Clone)]
pub struct FlagPennantDetector {
    /// 깃대 길이 (캔들 수)
    pub pole_bars: usize,
    /// 깃대 최소 변동률
    pub min_pole_move: f64,
    /// 조정 구간 최대 길이
    pub consolidation_bars: usize,
    /// 돌파 임박 판단 허용 오차
    pub tolerance: f64,
}

impl Default for FlagPennantDetector {
    fn default() -> Self {
        Self {
            pole_bars: 10,
            min_pole_move: 0.05,
            consolidation_bars: 10,
            tolerance: 0.03,
        }
    }
}

/// 조정 구간 최소 길이.
const MIN_CONSOLIDATION_BARS: usize = 4;

impl PatternDetector for FlagPennantDetector {
    fn name(&self) -> &'static str {
        "flag_pennant"
    }

    fn detect(&self, candles: &[Candle], pivots: &[PeakValley]) -> Vec<PatternAnalysisResult> {
        let n = candles.len();
        let mut drafts = Vec::new();

        if self.pole_bars == 0 || n < self.pole_bars + MIN_CONSOLIDATION_BARS + 1 {
            return Vec::new();
        }

        let mut pole_end = self.pole_bars;
        while pole_end + MIN_CONSOLIDATION_BARS < n {
            let pole_start = pole_end - self.pole_bars;
            let base = candles[pole_start].close;
            let pole_move = candles[pole_end].close - base;

            if base <= Decimal::ZERO || to_f64(pole_move / base).abs() < self.min_pole_move {
                pole_end += 1;
                continue;
            }

            let consolidation_end = (pole_end + self.consolidation_bars).min(n - 1);
            let consolidation = &candles[pole_end + 1..=consolidation_end];
            let (first, second) = consolidation.split_at(consolidation.len() / 2);

            let max_high = |part: &[Candle]| part.iter().map(|c| c.high).max();
            let min_low = |part: &[Candle]| part.iter().map(|c| c.low).min();
            let (Some(high1), Some(high2), Some(low1), Some(low2)) =
                (max_high(first), max_high(second), min_low(first), min_low(second))
            else {
                pole_end += 1;
                continue;
            };

            let upper = high1.max(high2);
            let lower = low1.min(low2);
            let pole_height = pole_move.abs();

            // 조정 폭이 깃대의 절반을 넘으면 깃발로 보지 않음
            if upper - lower > pole_height / Decimal::TWO {
                pole_end += 1;
                continue;
            }

            let bullish = pole_move > Decimal::ZERO;
            let pattern_type = if high2 < high1 && low2 > low1 {
                PatternType::Pennant
            } else if (bullish && high2 <= high1 && low2 <= low1)
                || (!bullish && high2 >= high1 && low2 >= low1)
            {
                // 깃대 반대 방향으로 완만한 평행 조정
                PatternType::Flag
            } else {
                pole_end += 1;
                continue;
            };

            let (direction, price_target) = if bullish {
                (Direction::Bullish, upper + pole_height)
            } else {
                (Direction::Bearish, lower - pole_height)
            };

            drafts.push(Draft {
                pattern_type,
                direction,
                start_index: pole_start,
                end_index: consolidation_end,
                key_points: pivots
                    .iter()
                    .filter(|p| p.index >= pole_start && p.index <= consolidation_end)
                    .cloned()
                    .collect(),
                upper,
                lower,
                price_target: Some(price_target),
                converging: true,
                base_reliability: 65.0,
            });

            pole_end = consolidation_end + 1;
        }

        drafts
            .into_iter()
            .filter_map(|d| d.build(candles, self.tolerance))
            .collect()
    }
}

// ==================== 컵앤핸들 ====================

/// 컵앤핸들 감지기.
#[derive(Debug, Clone)]
pub struct CupAndHandleDetector {
    tolerance: f64,
    min_cup_bars: usize,
}

impl CupAndHandleDetector {
    /// 새 감지기를 생성합니다.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            min_cup_bars: 10,
        }
    }
}

impl PatternDetector for CupAndHandleDetector {
    fn name(&self) -> &'static str {
        "cup_and_handle"
    }

    fn detect(&self, candles: &[Candle], pivots: &[PeakValley]) -> Vec<PatternAnalysisResult> {
        let peaks = peaks(pivots);
        let mut drafts = Vec::new();

        for w in peaks.windows(2) {
            let (left_rim, right_rim) = (w[0], w[1]);
            let span = right_rim.index - left_rim.index;

            if span < self.min_cup_bars || right_rim.index + 1 >= candles.len() {
                continue;
            }
            if !similar(left_rim.price, right_rim.price, self.tolerance) {
                continue;
            }

            // 컵 바닥은 가운데 절반 구간에 있어야 함 (둥근 형태)
            let Some((bottom_index, bottom)) = candles[left_rim.index..=right_rim.index]
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.low.cmp(&b.1.low))
                .map(|(i, c)| (left_rim.index + i, c))
            else {
                continue;
            };
            let quarter = span / 4;
            if bottom_index < left_rim.index + quarter || bottom_index > right_rim.index - quarter {
                continue;
            }

            let rim = left_rim.price.max(right_rim.price);
            if rim <= Decimal::ZERO {
                continue;
            }
            let depth = rim - bottom.low;
            let depth_ratio = to_f64(depth / rim);
            if !(0.05..=0.5).contains(&depth_ratio) {
                continue;
            }

            // 핸들: 오른쪽 림 이후 컵 깊이의 절반 이내 되돌림
            let handle_end = (right_rim.index + span / 2).min(candles.len() - 1);
            let Some(handle_low) = candles[right_rim.index + 1..=handle_end]
                .iter()
                .map(|c| c.low)
                .min()
            else {
                continue;
            };
            if rim - handle_low > depth / Decimal::TWO {
                continue;
            }

            let bottom_point = PeakValley {
                index: bottom_index,
                price: bottom.low,
                timestamp: bottom.timestamp,
                kind: PivotKind::Valley,
            };

            drafts.push(Draft {
                pattern_type: PatternType::CupAndHandle,
                direction: Direction::Bullish,
                start_index: left_rim.index,
                end_index: handle_end,
                key_points: vec![left_rim.clone(), bottom_point, right_rim.clone()],
                upper: rim,
                lower: bottom.low,
                price_target: Some(rim + depth),
                converging: true,
                base_reliability: 70.0,
            });
        }

        drafts
            .into_iter()
            .filter_map(|d| d.build(candles, self.tolerance))
            .collect()
    }
}

// ==================== 둥근 바닥 / 천장 ====================

/// 둥근 바닥/천장 감지기.
///
/// 고정 길이 구간을 절반씩 겹쳐 이동하며 세 구간 평균 종가의 곡률을 봅니다.
#[derive(Debug, Clone)]
pub struct RoundingDetector {
    tolerance: f64,
    span: usize,
}

impl RoundingDetector {
    /// 새 감지기를 생성합니다.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            span: 30,
        }
    }
}

impl PatternDetector for RoundingDetector {
    fn name(&self) -> &'static str {
        "rounding"
    }

    fn detect(&self, candles: &[Candle], pivots: &[PeakValley]) -> Vec<PatternAnalysisResult> {
        let span = self.span;
        let mut drafts = Vec::new();

        if span < 6 || candles.len() < span {
            return Vec::new();
        }

        let third = span / 3;
        let average_close = |part: &[Candle]| {
            let sum: Decimal = part.iter().map(|c| c.close).sum();
            sum / Decimal::from(part.len().max(1))
        };

        for start in (0..=candles.len() - span).step_by(span / 2) {
            let end = start + span - 1;
            let segment = &candles[start..=end];
            let (left, rest) = segment.split_at(third);
            let (middle, right) = rest.split_at(third);

            let (a, b, c) = (average_close(left), average_close(middle), average_close(right));
            if a <= Decimal::ZERO || c <= Decimal::ZERO {
                continue;
            }

            let key_points: Vec<PeakValley> = pivots
                .iter()
                .filter(|p| p.index >= start && p.index <= end)
                .cloned()
                .collect();

            let extreme_in_middle = |index: usize| index >= third && index < third * 2;

            let lowest = segment
                .iter()
                .enumerate()
                .min_by(|x, y| x.1.low.cmp(&y.1.low));
            let highest = segment
                .iter()
                .enumerate()
                .max_by(|x, y| x.1.high.cmp(&y.1.high));
            let (Some((low_idx, low_candle)), Some((high_idx, high_candle))) = (lowest, highest)
            else {
                continue;
            };

            let dip_left = to_f64((a - b) / a);
            let dip_right = to_f64((c - b) / c);

            if dip_left > self.tolerance && dip_right > self.tolerance && extreme_in_middle(low_idx)
            {
                let rim = left.iter().map(|x| x.high).max().unwrap_or(a);
                drafts.push(Draft {
                    pattern_type: PatternType::RoundingBottom,
                    direction: Direction::Bullish,
                    start_index: start,
                    end_index: end,
                    key_points: key_points.clone(),
                    upper: rim,
                    lower: low_candle.low,
                    price_target: Some(rim + (rim - low_candle.low)),
                    converging: false,
                    base_reliability: 60.0,
                });
            }

            if -dip_left > self.tolerance
                && -dip_right > self.tolerance
                && extreme_in_middle(high_idx)
            {
                let rim = left.iter().map(|x| x.low).min().unwrap_or(a);
                drafts.push(Draft {
                    pattern_type: PatternType::RoundingTop,
                    direction: Direction::Bearish,
                    start_index: start,
                    end_index: end,
                    key_points,
                    upper: high_candle.high,
                    lower: rim,
                    price_target: Some(rim - (high_candle.high - rim)),
                    converging: false,
                    base_reliability: 60.0,
                });
            }
        }

        drafts
            .into_iter()
            .filter_map(|d| d.build(candles, self.tolerance))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::pivots::detect_pivots;
    use crate::test_support::candles_from_closes;

    #[test]
    fn test_double_bottom_confirmed() {
        // 100 → 90 → 100 → 90 → 105 (넥라인 위에서 마감)
        let closes = [
            100, 98, 95, 92, 90, 92, 95, 98, 100, 98, 95, 92, 90, 92, 95, 98, 101, 103, 105,
        ];
        let candles = candles_from_closes(&closes);
        let pivots = detect_pivots(&candles, 3);

        let patterns = DoubleTripleDetector::new(0.03).detect(&candles, &pivots);
        let double_bottom = patterns
            .iter()
            .find(|p| p.pattern_type == PatternType::DoubleBottom)
            .expect("double bottom");

        assert_eq!(double_bottom.direction, Direction::Bullish);
        assert_eq!(double_bottom.status, PatternStatus::Confirmed);
        assert!(double_bottom.price_target.unwrap() > double_bottom.component.breakout_level);
        assert!((0.0..=100.0).contains(&double_bottom.reliability));
    }

    #[test]
    fn test_head_and_shoulders() {
        let closes = [
            100, 103, 106, 109, 106, 103, 100, 104, 108, 112, 116, 112, 108, 104, 100, 103, 106,
            109, 106, 103, 100, 98, 96,
        ];
        let candles = candles_from_closes(&closes);
        let pivots = detect_pivots(&candles, 3);

        let patterns = HeadAndShouldersDetector::new(0.03).detect(&candles, &pivots);
        let hs = patterns
            .iter()
            .find(|p| p.pattern_type == PatternType::HeadAndShoulders)
            .expect("head and shoulders");

        assert_eq!(hs.direction, Direction::Bearish);
        // 마지막 종가가 넥라인 아래
        assert_eq!(hs.status, PatternStatus::Confirmed);
        assert_eq!(hs.component.key_points.len(), 5);
        assert_eq!(hs.stop_loss, Some(hs.component.key_points[2].price));
    }

    #[test]
    fn test_empty_candles() {
        let config = PatternConfig::default();
        let detectors = default_detectors(&config);
        assert_eq!(detectors.len(), 7);

        for detector in detectors {
            assert!(detector.detect(&[], &[]).is_empty(), "{}", detector.name());
        }
    }

    #[test]
    fn test_bull_flag() {
        // 깃대: 100 → 120 (10캔들), 이후 완만한 하락 조정
        let mut closes: Vec<i64> = (0..=10).map(|i| 100 + i * 2).collect();
        closes.extend([119, 119, 118, 118, 117, 117]);
        let candles = candles_from_closes(&closes);
        let pivots = detect_pivots(&candles, 3);

        let patterns = FlagPennantDetector::default().detect(&candles, &pivots);
        let flag = patterns
            .iter()
            .find(|p| p.pattern_type == PatternType::Flag)
            .expect("flag");

        assert_eq!(flag.direction, Direction::Bullish);
        assert_eq!(flag.component.start_index, 0);
        assert_eq!(flag.status, PatternStatus::Forming);
    }

    #[test]
    fn test_volume_pattern() {
        let mut candles = candles_from_closes(&[100, 100, 100, 100]);
        candles[2].volume = Decimal::from(2000);
        candles[3].volume = Decimal::from(2000);

        assert_eq!(volume_pattern(&candles, 0, 3), "increasing");
        assert_eq!(volume_pattern(&candles, 2, 2), "flat");
    }
}
