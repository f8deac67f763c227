//! One refresh cycle: snapshot in, signals out.
//!
//! Steps, all over an immutable input:
//! 1. Classify the VIX regime
//! 2. Build the governing `UnderlyingState` per ETF (index proxy when
//!    configured and supplied, else the ETF's own closes)
//! 3. Keep the expirations nearest the configured target DTEs
//! 4. Price every live contract, backing out IV from the mid when the
//!    feed sent none
//! 5. Run the rule engine and aggregate

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::{SignalAggregator, SignalSummary};
use crate::analytics::nearest_expiration;
use crate::config::SignalConfig;
use crate::data::{ContractKey, OptionContract, PriceSeries};
use crate::indicators::{RsiLabel, UnderlyingState};
use crate::pricing::{BlackScholes, PricingError};
use crate::regime::{classify_technical, classify_vix, StrategySide, TechnicalRegime, VixRegime};
use crate::rules::{RuleEngine, Signal, SignalColor};

/// Market data for one ETF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlyingSnapshot {
    pub symbol: String,
    /// Current price of the ETF.
    pub spot: f64,
    /// Daily closes of the ETF.
    #[serde(default)]
    pub series: PriceSeries,
    #[serde(default)]
    pub contracts: Vec<OptionContract>,
}

/// Everything one refresh consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshInput {
    pub as_of: NaiveDate,
    pub vix_level: f64,
    pub underlyings: Vec<UnderlyingSnapshot>,
    /// Daily closes of index proxies, keyed by index symbol.
    #[serde(default)]
    pub index_series: HashMap<String, PriceSeries>,
}

/// Per-contract output for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractEvaluation {
    pub key: ContractKey,
    pub dte: i64,
    pub mid: f64,
    /// Volatility used for pricing (feed IV or backed out from mid).
    pub implied_volatility: f64,
    pub theoretical_price: f64,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub annualized_return: f64,
    pub signal: Signal,
}

/// Technical read for an index display card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexCard {
    pub state: UnderlyingState,
    pub rsi_label: Option<RsiLabel>,
    pub call_sell: SignalColor,
    pub put_sell: SignalColor,
}

impl IndexCard {
    fn from_state(state: UnderlyingState, config: &SignalConfig) -> Self {
        let light = |side| classify_technical(&state, side, config).index_signal(side);
        let call_sell = light(StrategySide::CallSell);
        let put_sell = light(StrategySide::PutSell);
        Self {
            rsi_label: state.rsi_label(config),
            state,
            call_sell,
            put_sell,
        }
    }
}

/// Results for one ETF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingReport {
    pub symbol: String,
    pub spot: f64,
    /// State whose technicals drove the technical rule.
    pub governing: UnderlyingState,
    pub call_regime: TechnicalRegime,
    pub put_regime: TechnicalRegime,
    pub contracts: Vec<ContractEvaluation>,
}

/// Full output of one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub as_of: NaiveDate,
    pub vix_level: f64,
    pub vix_regime: VixRegime,
    pub indices: Vec<IndexCard>,
    pub underlyings: Vec<UnderlyingReport>,
    pub summary: SignalSummary,
}

impl RefreshReport {
    pub fn contracts(&self) -> impl Iterator<Item = &ContractEvaluation> {
        self.underlyings.iter().flat_map(|u| u.contracts.iter())
    }
}

/// State with no history: price only, every indicator absent.
fn price_only_state(symbol: &str, price: f64) -> UnderlyingState {
    UnderlyingState {
        symbol: symbol.to_string(),
        price,
        sma20: None,
        sma50: None,
        sma100: None,
        rsi14: None,
    }
}

fn governing_state(
    snapshot: &UnderlyingSnapshot,
    input: &RefreshInput,
    config: &SignalConfig,
) -> UnderlyingState {
    if let Some(index) = config.index_for(&snapshot.symbol) {
        match input.index_series.get(index) {
            Some(series) => {
                if let Some(state) = UnderlyingState::from_series(index, series, config) {
                    return state;
                }
            }
            None => {
                warn!(
                    symbol = %snapshot.symbol,
                    index = %index,
                    "Index series missing, using ETF technicals"
                );
            }
        }
    }

    UnderlyingState::from_series(&snapshot.symbol, &snapshot.series, config)
        .unwrap_or_else(|| price_only_state(&snapshot.symbol, snapshot.spot))
}

/// Expirations to evaluate: the nearest listed one for each target DTE.
/// No targets means every expiration.
fn target_expirations(
    contracts: &[OptionContract],
    as_of: NaiveDate,
    config: &SignalConfig,
) -> Option<BTreeSet<NaiveDate>> {
    if config.expiration_targets_dte.is_empty() {
        return None;
    }
    let listed: Vec<NaiveDate> = contracts
        .iter()
        .map(|c| c.expiration)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    Some(
        config
            .expiration_targets_dte
            .iter()
            .filter_map(|&dte| nearest_expiration(&listed, as_of, dte))
            .collect(),
    )
}

fn evaluate_contract(
    contract: &OptionContract,
    snapshot: &UnderlyingSnapshot,
    governing: &UnderlyingState,
    vix_regime: VixRegime,
    model: &BlackScholes,
    engine: &RuleEngine<'_>,
    as_of: NaiveDate,
) -> Result<ContractEvaluation, PricingError> {
    let time = contract.time_to_expiry_years(as_of);
    let mid = contract.mid_f64();

    let vol = if contract.implied_volatility > 0.0 && contract.implied_volatility.is_finite() {
        contract.implied_volatility
    } else {
        let backed_out = model.implied_vol(snapshot.spot, contract.strike_f64(), time, mid, contract.right);
        debug!(
            symbol = %contract.symbol,
            strike = %contract.strike,
            iv = ?backed_out,
            "Feed IV missing, solved from mid"
        );
        backed_out.unwrap_or(0.0)
    };

    let valuation = model
        .price_and_greeks(snapshot.spot, contract.strike_f64(), time, vol, contract.right)
        .map_err(|e| {
            PricingError::InvalidInput(format!(
                "{} {} {} {}: {}",
                contract.symbol,
                contract.expiration,
                contract.strike,
                contract.right.as_str(),
                e
            ))
        })?;

    let signal = engine.evaluate(contract, &valuation.greeks, snapshot.spot, governing, vix_regime);

    Ok(ContractEvaluation {
        key: contract.key(),
        dte: contract.dte(as_of),
        mid,
        implied_volatility: vol,
        theoretical_price: valuation.theoretical_price,
        delta: valuation.greeks.delta,
        gamma: valuation.greeks.gamma,
        theta: valuation.greeks.theta,
        vega: valuation.greeks.vega,
        annualized_return: signal.annualized_return,
        signal,
    })
}

/// Run one refresh over `input`.
///
/// Contracts already past expiration, or outside the target expirations,
/// are skipped. A contract the pricing model rejects fails the whole refresh.
pub fn run_refresh(input: &RefreshInput, config: &SignalConfig) -> Result<RefreshReport, PricingError> {
    let vix_regime = classify_vix(input.vix_level, config.vix_bands.into());
    info!(
        "Refresh {}: VIX {:.2} -> {:?}",
        input.as_of, input.vix_level, vix_regime
    );

    let model = BlackScholes::new(config.risk_free_rate);
    let engine = RuleEngine::new(config, input.as_of);
    let mut aggregator = SignalAggregator::new(&config.etfs);

    let mut index_symbols: Vec<&String> = input.index_series.keys().collect();
    index_symbols.sort();
    let indices: Vec<IndexCard> = index_symbols
        .into_iter()
        .filter_map(|symbol| {
            let series = input.index_series.get(symbol)?;
            UnderlyingState::from_series(symbol, series, config)
        })
        .map(|state| IndexCard::from_state(state, config))
        .collect();

    let mut underlyings = Vec::with_capacity(input.underlyings.len());
    for snapshot in &input.underlyings {
        let governing = governing_state(snapshot, input, config);
        let call_regime = classify_technical(&governing, StrategySide::CallSell, config);
        let put_regime = classify_technical(&governing, StrategySide::PutSell, config);

        let targets = target_expirations(&snapshot.contracts, input.as_of, config);
        let mut contracts = Vec::with_capacity(snapshot.contracts.len());
        let mut skipped = 0usize;
        for contract in &snapshot.contracts {
            let off_target = targets
                .as_ref()
                .is_some_and(|t| !t.contains(&contract.expiration));
            if contract.dte(input.as_of) < 0 || off_target {
                skipped += 1;
                continue;
            }
            let evaluation = evaluate_contract(
                contract,
                snapshot,
                &governing,
                vix_regime,
                &model,
                &engine,
                input.as_of,
            )?;
            aggregator.add(&evaluation.key, evaluation.signal.color);
            contracts.push(evaluation);
        }

        debug!(
            symbol = %snapshot.symbol,
            governing = %governing.symbol,
            calls = ?call_regime,
            puts = ?put_regime,
            evaluated = contracts.len(),
            skipped,
            "Evaluated underlying"
        );

        underlyings.push(UnderlyingReport {
            symbol: snapshot.symbol.clone(),
            spot: snapshot.spot,
            governing,
            call_regime,
            put_regime,
            contracts,
        });
    }

    let summary = aggregator.finish();
    info!(
        "Signals: {} green, {} yellow, {} red across {} underlyings",
        summary.green,
        summary.yellow,
        summary.red,
        summary.underlyings.len()
    );

    Ok(RefreshReport {
        as_of: input.as_of,
        vix_level: input.vix_level,
        vix_regime,
        indices,
        underlyings,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OptionType;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn ramp(n: usize, start: f64, slope: f64) -> PriceSeries {
        let closes: Vec<f64> = (0..n).map(|i| start + slope * i as f64).collect();
        PriceSeries::from_closes(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(), &closes).unwrap()
    }

    fn contract(symbol: &str, right: OptionType, strike: Decimal, iv: f64) -> OptionContract {
        OptionContract {
            symbol: symbol.to_string(),
            expiration: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            strike,
            right,
            bid: dec!(0.50),
            ask: dec!(0.54),
            last: dec!(0.52),
            implied_volatility: iv,
            open_interest: 1_000,
            volume: 100,
        }
    }

    fn input(vix: f64, contracts: Vec<OptionContract>) -> RefreshInput {
        RefreshInput {
            as_of: as_of(),
            vix_level: vix,
            underlyings: vec![UnderlyingSnapshot {
                symbol: "SQQQ".to_string(),
                spot: 20.0,
                series: ramp(120, 30.0, -0.08),
                contracts,
            }],
            index_series: HashMap::new(),
        }
    }

    #[test]
    fn test_red_vix_makes_everything_red() {
        let config = SignalConfig::default();
        let contracts = vec![
            contract("SQQQ", OptionType::Put, dec!(19), 0.65),
            contract("SQQQ", OptionType::Call, dec!(21), 0.65),
        ];

        let report = run_refresh(&input(28.0, contracts), &config).unwrap();

        assert_eq!(report.vix_regime, VixRegime::Red);
        assert!(report.contracts().all(|c| c.signal.color == SignalColor::Red));
        assert_eq!(report.summary.red, 2);
    }

    #[test]
    fn test_missing_iv_is_backed_out_from_mid() {
        let config = SignalConfig::default();
        let report = run_refresh(
            &input(12.0, vec![contract("SQQQ", OptionType::Put, dec!(20), 0.0)]),
            &config,
        )
        .unwrap();

        let eval = report.contracts().next().unwrap();
        assert!(eval.implied_volatility > 0.0);
        assert!((eval.theoretical_price - eval.mid).abs() < 1e-3);
    }

    #[test]
    fn test_expired_contracts_skipped() {
        let config = SignalConfig::default();
        let mut stale = contract("SQQQ", OptionType::Put, dec!(19), 0.65);
        stale.expiration = NaiveDate::from_ymd_opt(2024, 2, 23).unwrap();

        let report = run_refresh(&input(12.0, vec![stale]), &config).unwrap();
        assert_eq!(report.contracts().count(), 0);
        assert_eq!(report.summary.get("SQQQ").unwrap().best, SignalColor::Red);
    }

    #[test]
    fn test_only_target_expirations_evaluated() {
        let config = SignalConfig::default();
        let weekly = contract("SQQQ", OptionType::Put, dec!(19), 0.65);
        let mut near = weekly.clone();
        near.expiration = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let mut far = weekly.clone();
        far.expiration = NaiveDate::from_ymd_opt(2024, 4, 19).unwrap();

        // Targets 7 and 14 DTE pick 3/8 and 3/15; 4/19 is dropped
        let report = run_refresh(&input(12.0, vec![near, weekly, far]), &config).unwrap();
        let dtes: Vec<i64> = report.contracts().map(|c| c.dte).collect();
        assert_eq!(dtes, vec![7, 14]);

        let all = SignalConfig {
            expiration_targets_dte: Vec::new(),
            ..SignalConfig::default()
        };
        let mut far = contract("SQQQ", OptionType::Put, dec!(19), 0.65);
        far.expiration = NaiveDate::from_ymd_opt(2024, 4, 19).unwrap();
        let report = run_refresh(&input(12.0, vec![far]), &all).unwrap();
        assert_eq!(report.contracts().count(), 1);
    }

    #[test]
    fn test_invalid_contract_fails_refresh() {
        let config = SignalConfig::default();
        let bad = contract("SQQQ", OptionType::Put, Decimal::ZERO, 0.65);

        let err = run_refresh(&input(12.0, vec![bad]), &config).unwrap_err();
        let PricingError::InvalidInput(msg) = err;
        assert!(msg.starts_with("SQQQ 2024-03-15"));
    }

    #[test]
    fn test_index_proxy_governs_technicals() {
        let config = SignalConfig::default();
        let mut refresh = input(12.0, vec![contract("SQQQ", OptionType::Put, dec!(19), 0.65)]);
        refresh
            .index_series
            .insert("^IXIC".to_string(), ramp(120, 15_000.0, 10.0));

        let report = run_refresh(&refresh, &config).unwrap();

        let sqqq = &report.underlyings[0];
        assert_eq!(sqqq.governing.symbol, "^IXIC");
        assert_eq!(report.indices.len(), 1);
        assert_eq!(report.indices[0].state.symbol, "^IXIC");
        // Straight-line rally pins RSI at 100
        assert_eq!(report.indices[0].rsi_label, Some(RsiLabel::Overbought));
    }

    #[test]
    fn test_falls_back_to_etf_series() {
        let config = SignalConfig::default();
        let report = run_refresh(
            &input(12.0, vec![contract("SQQQ", OptionType::Put, dec!(19), 0.65)]),
            &config,
        )
        .unwrap();
        assert_eq!(report.underlyings[0].governing.symbol, "SQQQ");
        // Configured ETFs without snapshots still report
        assert!(report.summary.get("SPXS").is_some());
    }
}
