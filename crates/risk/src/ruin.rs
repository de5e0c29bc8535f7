//! Risk of ruin under repeated bets.

/// Ceiling on the reported percentage.
pub const MAX_RUIN_PCT: f64 = 99.9;

/// Probability, in percent, of losing `bankroll` by repeating a bet that
/// wins `avg_win` with probability `win_prob` and otherwise loses `avg_loss`.
///
/// Uses the diffusion approximation `exp(-2·edge·bankroll / variance)`.
/// Zero when nothing can be lost or the payoff has no variance;
/// [`MAX_RUIN_PCT`] when the edge is not positive.
#[must_use]
pub fn risk_of_ruin(win_prob: f64, avg_win: f64, avg_loss: f64, bankroll: f64) -> f64 {
    if avg_loss == 0.0 {
        return 0.0;
    }
    let lose_prob = 1.0 - win_prob;
    let edge = win_prob * avg_win - lose_prob * avg_loss;
    if edge <= 0.0 {
        return MAX_RUIN_PCT;
    }
    let variance = win_prob * avg_win.powi(2) + lose_prob * avg_loss.powi(2);
    if variance == 0.0 {
        return 0.0;
    }
    ((-2.0 * edge * bankroll / variance).exp() * 100.0).min(MAX_RUIN_PCT)
}
