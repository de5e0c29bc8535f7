//! Markdown renderers for desk results.
//!
//! Every venue gets its own status line: ✅ reporting, ❌ failed, ⚪ not
//! configured. One venue failing never hides the others.

#![allow(clippy::format_push_string)]

use rust_decimal::Decimal;
use tradedesk_core::{Balance, BalanceStatus};
use tradedesk_fair_value::{ConsensusResult, HistoricalAnalysis, MarketAssessment};
use tradedesk_risk::RiskAnalysis;
use tradedesk_signals::TechnicalSnapshot;

use crate::desk::{
    IntegrationStatus, LiquidityReport, PortfolioSnapshot, ScanReport, SimulationReport,
};

const RULE: &str = "================================";
const HEAVY_RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S UTC";

pub const OK_MARK: &str = "✅";
pub const FAIL_MARK: &str = "❌";
pub const UNCONFIGURED_MARK: &str = "⚪";

fn balance_mark(balance: &Balance) -> &'static str {
    match balance.status {
        BalanceStatus::Ok { .. } => OK_MARK,
        BalanceStatus::Error(_) => FAIL_MARK,
        BalanceStatus::Unconfigured => UNCONFIGURED_MARK,
    }
}

fn balance_text(balance: &Balance) -> String {
    match &balance.status {
        BalanceStatus::Ok {
            amount,
            currency,
            note,
        } => {
            let amount = amount.round_dp(2);
            match note {
                Some(note) => format!("${amount:.2} {currency} ({note})"),
                None => format!("${amount:.2} {currency}"),
            }
        }
        BalanceStatus::Unconfigured => "not configured".to_string(),
        BalanceStatus::Error(e) => format!("error: {e}"),
    }
}

#[must_use]
pub fn render_portfolio(snapshot: &PortfolioSnapshot) -> String {
    let mut out = format!(
        "**Portfolio Snapshot** | {}\n{RULE}\n",
        snapshot.taken_at.format(TIMESTAMP)
    );
    for entry in &snapshot.venues {
        let balance = &entry.balance;
        out.push_str(&format!(
            "{} **{}:** {}\n",
            balance_mark(balance),
            entry.venue(),
            balance_text(balance)
        ));
        for holding in &entry.holdings {
            match holding.usd_value {
                Some(usd) => out.push_str(&format!(
                    "   {}: {} (${usd:.2})\n",
                    holding.asset,
                    holding.quantity.normalize()
                )),
                None => out.push_str(&format!(
                    "   {}: {}\n",
                    holding.asset,
                    holding.quantity.normalize()
                )),
            }
        }
        if let Some(e) = &entry.holdings_error {
            out.push_str(&format!("   holdings unavailable: {e}\n"));
        }
    }
    out.push_str(&format!(
        "{RULE}\nCash total: ${:.2} | {}/{} venues reporting",
        snapshot.cash_total_usd().round_dp(2),
        snapshot.reporting(),
        snapshot.venues.len()
    ));
    out
}

#[must_use]
pub fn render_scan(scan: &ScanReport) -> String {
    let ts = scan.scanned_at.format(TIMESTAMP);
    let venue_lines: Vec<String> = scan
        .listings
        .iter()
        .map(|listing| match &listing.markets {
            Ok(count) => format!("{OK_MARK} {}: {count} markets", listing.venue),
            Err(e) => format!("{FAIL_MARK} {}: {e}", listing.venue),
        })
        .collect();

    let outcome = &scan.outcome;
    if outcome.ranked.is_empty() {
        return format!(
            "**EV Scan Complete** | {ts}\nNo strong opportunities found this cycle.\n{}\nScanned {} markets",
            venue_lines.join("\n"),
            scan.markets_scanned
        );
    }

    let mut out = format!("**EV Scan Results** | {ts}\n{RULE}\n");
    for (i, opp) in outcome.ranked.iter().enumerate() {
        let ev_pct = (opp.expected_value * Decimal::ONE_HUNDRED).round_dp(1);
        out.push_str(&format!(
            "**{}. [{}] {}** EV: +{ev_pct:.1}%\n   {}\n   {}\n\n",
            i + 1,
            opp.venue,
            opp.kind.label(),
            opp.question,
            opp.detail
        ));
    }
    out.push_str(&format!("{RULE}\n{}\n", venue_lines.join("\n")));
    let per_venue: Vec<String> = outcome
        .per_venue
        .iter()
        .filter(|(venue, _)| venue.lists_prediction_markets())
        .map(|(venue, count)| format!("{venue}: {count}"))
        .collect();
    out.push_str(&format!(
        "Total: {} opportunities | {}",
        outcome.total_found,
        per_venue.join(" | ")
    ));
    out
}

#[must_use]
pub fn render_risk(a: &RiskAnalysis) -> String {
    let sizing = a.sizing();
    format!(
        "🛡️ **Risk Analysis**
{HEAVY_RULE}
**Market:** {question}
**Fair Probability:** {fair:.1}%
**Market Price:** {price:.1}%
**EV Spread:** {ev:+.1}% ({ev_pct:+.1}%)
**Bankroll:** ${bankroll:.2}

**Kelly Criterion Sizing:**
  Full Kelly: {full:.1}% → ${full_usd:.2}
  Half Kelly: {half:.1}% → ${half_usd:.2} ← Recommended
  Quarter Kelly: {quarter:.1}% → ${quarter_usd:.2}

**If You Bet ${half_usd:.2} (Half Kelly):**
  Win (YES resolves): +${win:.2}
  Lose (NO resolves): -${lose:.2}
  Risk of Ruin: {ror:.1}%

**Portfolio Limits:**
  Risk Grade: {grade}
  Max Concurrent Positions: {positions}
  Max Single Position: ${max_single:.2}
  Daily Loss Limit: ${daily:.2}

**Recommendation:** {rec}
{HEAVY_RULE}",
        question = a.question,
        fair = a.fair_prob * 100.0,
        price = a.market_price * 100.0,
        ev = a.ev * 100.0,
        ev_pct = a.ev_percent,
        bankroll = a.bankroll,
        full = sizing.full_kelly * 100.0,
        full_usd = a.full_usd,
        half = sizing.half_kelly * 100.0,
        half_usd = sizing.recommended_usd,
        quarter = sizing.quarter_kelly * 100.0,
        quarter_usd = a.quarter_usd,
        win = a.profit_if_win,
        lose = a.loss_if_lose,
        ror = sizing.risk_of_ruin_pct,
        grade = sizing.grade.label(),
        positions = a.max_concurrent_positions,
        max_single = a.max_single_position,
        daily = a.daily_loss_limit,
        rec = a.recommendation.label(),
    )
}

#[must_use]
pub fn render_status(status: &IntegrationStatus) -> String {
    let mut lines = vec!["**Integration Status**".to_string()];
    for (venue, configured) in &status.venues {
        let mark = if *configured { OK_MARK } else { UNCONFIGURED_MARK };
        lines.push(format!("{mark} {venue}"));
    }
    for (name, configured) in &status.collaborators {
        let mark = if *configured { OK_MARK } else { UNCONFIGURED_MARK };
        lines.push(format!("{mark} {name}"));
    }
    lines.join("\n")
}

#[must_use]
pub fn render_simulation(report: &SimulationReport) -> String {
    let sim = &report.summary;
    let ev = &report.assessment;
    let variables = if report.extraction.variables.is_empty() {
        "  (none extracted)".to_string()
    } else {
        report
            .extraction
            .variables
            .iter()
            .map(|v| {
                format!(
                    "  {} {}: base {:.0}% (±{:.0}%) weight {:.0}%",
                    v.direction.arrow(),
                    v.name,
                    v.base_rate * 100.0,
                    v.volatility * 100.0,
                    v.weight * 100.0
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let reasoning = if report.extraction.reasoning.is_empty() {
        "N/A"
    } else {
        report.extraction.reasoning.as_str()
    };

    format!(
        "🎲 **Monte Carlo Simulation**
{HEAVY_RULE}
**Q:** {question}

**Simulations:** {trials} paths
**Fair Value:** {median:.1}% (95% CI: {low:.1}% to {high:.1}%)
**Market Price:** {price:.1}%
**EV Spread:** {ev_abs:+.1}% ({ev_pct:+.1}%)
**Confidence:** {confidence}
**Kelly Size:** {kelly:.1}% of bankroll

{marker} **Signal: {signal}**

**Key Variables:**
{variables}

**Reasoning:** {reasoning}
{HEAVY_RULE}",
        question = report.question,
        trials = sim.trials,
        median = sim.median * 100.0,
        low = sim.ci_low * 100.0,
        high = sim.ci_high * 100.0,
        price = ev.market_price * 100.0,
        ev_abs = ev.ev_absolute * 100.0,
        ev_pct = ev.ev_percent,
        confidence = ev.confidence.label(),
        kelly = ev.kelly_fraction * 100.0,
        marker = ev.signal.marker(),
        signal = ev.signal.label(),
    )
}

#[must_use]
pub fn render_consensus(question: &str, result: &ConsensusResult) -> String {
    let mut out = format!(
        "🧠 **Multi-Model Consensus**\n{HEAVY_RULE}\n**Q:** {question}\n**Market Price:** {:.1}%\n\n**Votes:**\n",
        result.market_price * 100.0
    );
    for vote in &result.votes {
        out.push_str(&format!(
            "  {}: {:.1}% {} ({:?})\n",
            vote.estimator_id,
            vote.probability * 100.0,
            vote.recommendation.label(),
            vote.confidence
        ));
    }
    for (id, error) in &result.failures {
        out.push_str(&format!("  {FAIL_MARK} {id}: {error}\n"));
    }
    out.push_str(&format!(
        "\n**Consensus:** {:.1}% (median {:.1}%, range {:.1}% to {:.1}%)\n\
         **Direction:** {} ({:.0}% agreement)\n\
         **EV:** {:+.1}%\n\
         **Conviction:** {}/10\n{HEAVY_RULE}",
        result.mean_probability * 100.0,
        result.median_probability * 100.0,
        result.min_probability * 100.0,
        result.max_probability * 100.0,
        result.direction.label(),
        result.agreement * 100.0,
        result.ev_percent,
        result.conviction
    ));
    out
}

#[must_use]
pub fn render_liquidity(report: &LiquidityReport) -> String {
    let a = &report.analysis;
    let mut out = format!(
        "Liquidity Scan
Market: {market}
Order Book:
  Best Bid: ${bid:.3} | Best Ask: ${ask:.3}
  Spread: ${spread:.3} ({spread_pct:.1}%)
  Bid Levels: {bid_levels} | Ask Levels: {ask_levels}
Depth:
  Bid Side: ${bid_depth:.0}
  Ask Side: ${ask_depth:.0}
  Total: ${total:.0}
Grade: {grade}
Slippage (${size} buy):
  Est. Slippage: {slippage:.2}%",
        market = report.market,
        bid = a.best_bid,
        ask = a.best_ask,
        spread = a.spread,
        spread_pct = a.spread_pct,
        bid_levels = a.bid_levels,
        ask_levels = a.ask_levels,
        bid_depth = a.bid_depth_usd,
        ask_depth = a.ask_depth_usd,
        total = a.total_depth_usd,
        grade = a.grade.label(),
        size = a.position_usd.normalize(),
        slippage = a.slippage_pct,
    );
    if let Some(warning) = a.slippage_warning() {
        out.push_str(&format!("\n  {warning}"));
    }
    out
}

#[must_use]
pub fn render_historical(question: &str, market_price: f64, a: &HistoricalAnalysis) -> String {
    let mark = match a.market_assessment {
        MarketAssessment::Underpriced => "🟢",
        MarketAssessment::Overpriced => "🔴",
        MarketAssessment::Fair => "⚪",
    };
    let mut out = format!(
        "📚 **Historical Parallels Analysis**\n{HEAVY_RULE}\n**Q:** {question}\n**Market Price:** {:.1}%\n\n**Parallels:**\n",
        market_price * 100.0
    );
    for (i, p) in a.parallels.iter().enumerate() {
        let filled = usize::from(p.similarity.div_ceil(2));
        let stars = format!("{}{}", "⭐".repeat(filled), "☆".repeat(5 - filled));
        out.push_str(&format!("{}. **{}** ({})\n", i + 1, p.event, p.date));
        out.push_str(&format!("   Outcome: {} | Similarity: {stars}\n", p.outcome));
        if !p.key_difference.is_empty() {
            out.push_str(&format!("   Difference: {}\n", p.key_difference));
        }
    }
    out.push_str(&format!(
        "\n**Base Rate:** {:.0}% ({} events)\n\
         **Historical Probability:** {:.1}%\n\
         **Assessment:** {mark} {} ({:?} confidence)\n",
        a.base_rate * 100.0,
        a.sample_size,
        a.historical_probability * 100.0,
        a.market_assessment.label(),
        a.confidence
    ));
    if !a.reasoning.is_empty() {
        out.push_str(&format!("\n{}\n", a.reasoning));
    }
    out.push_str(HEAVY_RULE);
    out
}

#[must_use]
pub fn render_technicals(t: &TechnicalSnapshot) -> String {
    let mut out = format!(
        "📈 **Technical Analysis: {}**\n{HEAVY_RULE}\n\
         **Price:** ${:.2}\n\
         **30d Range:** ${:.2} to ${:.2}\n\
         **Change:** 7d {:+.1}% | 30d {:+.1}%\n\n**Indicators:**\n",
        t.asset.to_uppercase(),
        t.current,
        t.low_30d,
        t.high_30d,
        t.change_7d_pct,
        t.change_30d_pct
    );
    if let Some(rsi) = t.rsi {
        out.push_str(&format!("  RSI(14): {rsi:.1}\n"));
    }
    if let Some(m) = t.macd {
        out.push_str(&format!(
            "  MACD: {:.2} | Signal: {:.2} | Histogram: {:+.2}\n",
            m.line, m.signal, m.histogram
        ));
    }
    if let Some(b) = t.bollinger {
        out.push_str(&format!(
            "  Bollinger: ${:.2} / ${:.2} / ${:.2}\n",
            b.lower, b.middle, b.upper
        ));
    }
    if let Some(sma) = t.sma_50 {
        out.push_str(&format!("  SMA(50): ${sma:.2}\n"));
    }
    if let Some(sma) = t.sma_200 {
        out.push_str(&format!("  SMA(200): ${sma:.2}\n"));
    }
    out.push_str("\n**Signals:**\n");
    if t.signals.is_empty() {
        out.push_str("  none\n");
    }
    for signal in &t.signals {
        out.push_str(&format!("  • {}\n", signal.label()));
    }
    out.push_str(HEAVY_RULE);
    out
}
