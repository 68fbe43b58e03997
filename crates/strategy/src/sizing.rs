use tracing::warn;

use common::models::PositionSize;

/// Shares to risk this iteration: `round(cash * cash_risk / last_price)`,
/// nearest integer with ties away from zero (`f64::round`). A non-positive
/// price or a result below one share yields quantity zero, which callers
/// treat as "skip trading this iteration".
pub fn position_size(cash: f64, cash_risk: f64, last_price: f64) -> PositionSize {
    if last_price <= 0.0 {
        warn!("Last price is non-positive, cannot compute position size.");
        return PositionSize {
            cash,
            last_price,
            quantity: 0,
        };
    }

    let shares = (cash * cash_risk / last_price).round();
    if shares < 1.0 {
        warn!("Position size would be less than 1 share, no trades will be made.");
        return PositionSize {
            cash,
            last_price,
            quantity: 0,
        };
    }

    PositionSize {
        cash,
        last_price,
        quantity: shares as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_cash_at_round_price() {
        let sized = position_size(10_000.0, 0.5, 100.0);
        assert_eq!(sized.quantity, 50);
        assert_eq!(sized.cash, 10_000.0);
        assert_eq!(sized.last_price, 100.0);
    }

    #[test]
    fn non_positive_price_yields_zero() {
        assert_eq!(position_size(10_000.0, 0.5, 0.0).quantity, 0);
        assert_eq!(position_size(10_000.0, 0.5, -3.5).quantity, 0);
    }

    #[test]
    fn sub_share_allocation_yields_zero() {
        // 100 * 0.5 / 200 = 0.25 shares, rounds to 0.
        assert_eq!(position_size(100.0, 0.5, 200.0).quantity, 0);
    }

    #[test]
    fn ties_round_away_from_zero() {
        // 300 * 0.5 / 100 = 1.5 shares -> 2 under f64::round.
        assert_eq!(position_size(300.0, 0.5, 100.0).quantity, 2);
    }

    #[test]
    fn zero_risk_fraction_never_trades() {
        assert_eq!(position_size(1_000_000.0, 0.0, 100.0).quantity, 0);
    }
}
