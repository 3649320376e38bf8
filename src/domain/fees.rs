use super::money::MoneyAmount;

/// How a purchase splits between the customer charge and the creator payout.
/// Whatever is not transferred stays with the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    /// Total charged to the customer: amount + tip.
    pub full_amount: i64,
    /// Routed to the creator's payout account: the tip net of processing
    /// cost, plus 75% of the base amount net of processing cost.
    pub creator_transfer: i64,
}

// Processing cost approximation: 2.9% + 30 on the base amount, 2.9% on the tip.
const RATE_NUM: i64 = 29;
const RATE_DEN: i64 = 1000;
const FLAT_COST: i64 = 30;

// Creator keeps 3/4 of the net base amount.
const SHARE_NUM: i64 = 3;
const SHARE_DEN: i64 = 4;

/// Pure and deterministic. Negative inputs are impossible by construction
/// (`MoneyAmount` rejects them upstream). Nets clamp at zero so a purchase
/// smaller than its own processing cost never produces a negative transfer.
pub fn compute_split(amount: MoneyAmount, tip: MoneyAmount) -> FeeSplit {
    let amount = amount.cents();
    let tip = tip.cents();

    let cost_on_amount = ceil_rate(amount) + FLAT_COST;
    let cost_on_tip = ceil_rate(tip);

    let net_amount = (amount - cost_on_amount).max(0);
    let net_tip = (tip - cost_on_tip).max(0);

    FeeSplit {
        full_amount: amount + tip,
        creator_transfer: net_tip + round_half_up(net_amount * SHARE_NUM, SHARE_DEN),
    }
}

fn ceil_rate(v: i64) -> i64 {
    (v * RATE_NUM + RATE_DEN - 1) / RATE_DEN
}

fn round_half_up(num: i64, den: i64) -> i64 {
    (num + den / 2) / den
}
