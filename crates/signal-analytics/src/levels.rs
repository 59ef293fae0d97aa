//! 가격 레벨 집계.
//!
//! 여러 출처(타임프레임별 매물대, 돌파 감지기)의 지지/저항 레벨을
//! 근접한 것끼리 묶어 대표 레벨로 만듭니다.
//!
//! 오름차순으로 정렬한 뒤 왼쪽부터 한 번 훑으며, 바로 앞 레벨과의 차이가
//! 기준가 대비 `proximity_threshold` 이하이면 같은 그룹에 넣습니다.
//! 인접한 작은 간격이 이어지면 절대 가격으로는 멀리 떨어진 레벨도
//! 한 그룹이 될 수 있습니다.

use rust_decimal::Decimal;
use signal_core::Price;
use tracing::debug;

/// 레벨 그룹화 기본 근접 비율 (2%).
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 0.02;

/// 근접한 가격 레벨을 그룹화하여 그룹별 평균을 반환합니다.
///
/// # 인자
///
/// * `levels` - 가격 레벨 (음수 가격은 제외)
/// * `reference_price` - 근접 비율 계산 기준가 (보통 현재가)
/// * `proximity_threshold` - 같은 그룹으로 볼 최대 간격 비율
///
/// # 반환
///
/// 오름차순 대표 레벨 목록 (입력이 비면 빈 목록)
pub fn group_nearby_levels(
    levels: &[Price],
    reference_price: Price,
    proximity_threshold: f64,
) -> Vec<Price> {
    let mut sorted: Vec<Price> = levels
        .iter()
        .copied()
        .filter(|level| !level.is_sign_negative())
        .collect();

    if sorted.len() < levels.len() {
        debug!(
            dropped = levels.len() - sorted.len(),
            "Negative price levels dropped before grouping"
        );
    }

    if sorted.is_empty() {
        return Vec::new();
    }

    sorted.sort();

    // 기준가가 양수가 아니면 비율을 계산할 수 없으므로 동일 가격만 묶음.
    // 비율이 Decimal 범위를 넘으면 묶지 않음
    let threshold = Decimal::try_from(proximity_threshold).unwrap_or(Decimal::ZERO);
    let joins = |previous: Price, current: Price| -> bool {
        if reference_price > Decimal::ZERO {
            (current - previous)
                .checked_div(reference_price)
                .is_some_and(|ratio| ratio <= threshold)
        } else {
            current == previous
        }
    };

    let mut grouped = Vec::new();
    let mut group = vec![sorted[0]];

    for window in sorted.windows(2) {
        let (previous, current) = (window[0], window[1]);

        if joins(previous, current) {
            group.push(current);
        } else {
            grouped.push(mean(&group));
            group = vec![current];
        }
    }

    grouped.push(mean(&group));
    grouped
}

fn mean(group: &[Price]) -> Price {
    let sum: Decimal = group.iter().sum();
    sum / Decimal::from(group.len())
}

/// 기준가 아래 레벨을 가까운 순서로 최대 `count`개 반환합니다.
pub fn nearest_below(levels: &[Price], price: Price, count: usize) -> Vec<Price> {
    let mut below: Vec<Price> = levels.iter().copied().filter(|l| *l < price).collect();
    below.sort_by(|a, b| b.cmp(a));
    below.truncate(count);
    below
}

/// 기준가 위 레벨을 가까운 순서로 최대 `count`개 반환합니다.
pub fn nearest_above(levels: &[Price], price: Price, count: usize) -> Vec<Price> {
    let mut above: Vec<Price> = levels.iter().copied().filter(|l| *l > price).collect();
    above.sort();
    above.truncate(count);
    above
}
