use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::services::levels::{
    HighsLows, HistoricalWindow, LabeledValue, LevelCalculator, LevelError, LevelSet, OhlcSample,
};

const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Signature de requête "navigateur" attendue par l'API chart (pas de clé API)
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid response from Yahoo Finance API")]
    InvalidResponse,
    #[error("{0}")]
    Level(#[from] LevelError),
}

// Structures de désérialisation de l'API chart de Yahoo Finance.
// Tous les champs sont optionnels/défauts : un champ manquant devient
// une erreur locale absorbée par le fallback, jamais un panic.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Adapter vers le provider de cotations (Yahoo Finance).
///
/// TOUT échec (réseau, body malformé, champ manquant, historique trop
/// court) est absorbé localement et converti en données synthétiques
/// déterministes : `fetch_market_data` ne remonte jamais d'erreur.
#[derive(Clone)]
pub struct QuoteService {
    client: reqwest::Client,
    base_url: String,
}

impl QuoteService {
    pub fn new() -> Self {
        Self::with_base_url(YAHOO_BASE_URL)
    }

    /// Base URL injectable (tests : pointer vers un provider injoignable)
    pub fn with_base_url(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Récupère les niveaux techniques pour un symbole.
    /// Ne retourne jamais d'erreur : en cas d'échec du provider, bascule
    /// une seule fois (pas de retry) sur le générateur synthétique avec
    /// `isRealData=false` et la raison embarquée dans `dataSource`.
    pub async fn fetch_market_data(&self, symbol: &str) -> LevelSet {
        match self.fetch_real_data(symbol).await {
            Ok(set) => set,
            Err(e) => {
                eprintln!(
                    "❌ [{}] Error fetching {} data from Yahoo Finance: {}",
                    Utc::now().to_rfc3339(),
                    symbol,
                    e
                );
                println!(
                    "🔄 [{}] Falling back to mock data for {} due to API error",
                    Utc::now().to_rfc3339(),
                    symbol
                );
                synthetic_level_set(symbol, &e.to_string())
            }
        }
    }

    async fn fetch_real_data(&self, symbol: &str) -> Result<LevelSet, QuoteError> {
        // SPX est coté sous l'alias ^SPX chez Yahoo
        let yahoo_symbol = provider_alias(symbol);

        println!(
            "📡 [{}] Fetching real-time data for {} ({}) from Yahoo Finance",
            Utc::now().to_rfc3339(),
            symbol,
            yahoo_symbol
        );

        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1mo",
            self.base_url, yahoo_symbol
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("Accept", BROWSER_ACCEPT)
            .header("Accept-Language", BROWSER_ACCEPT_LANGUAGE)
            .send()
            .await?
            .error_for_status()?
            .json::<ChartResponse>()
            .await?;

        let result = response
            .chart
            .result
            .and_then(|mut results| if results.is_empty() { None } else { Some(results.remove(0)) })
            .ok_or(QuoteError::InvalidResponse)?;

        let quote = result
            .indicators
            .quote
            .first()
            .ok_or(QuoteError::InvalidResponse)?;

        // Sessions courante et précédente = les deux derniers points de la fenêtre
        let len = result.timestamp.len();
        if len < 2 {
            return Err(LevelError::InsufficientHistory(len).into());
        }
        let current = sample_at(quote, &result.timestamp, len - 1)
            .ok_or(QuoteError::InvalidResponse)?;
        let previous = sample_at(quote, &result.timestamp, len - 2)
            .ok_or(QuoteError::InvalidResponse)?;

        println!(
            "✅ [{}] Successfully fetched data for {}:",
            Utc::now().to_rfc3339(),
            symbol
        );
        println!(
            "  Session {}: Open: {}, High: {}, Low: {}, Close: {}",
            current.timestamp.date_naive(),
            current.open,
            current.high,
            current.low,
            current.close
        );
        println!(
            "  Session {}: Prev Close: {}, Prev High: {}, Prev Low: {}",
            previous.timestamp.date_naive(),
            previous.close,
            previous.high,
            previous.low
        );

        let window = HistoricalWindow {
            highs: quote.high.clone(),
            lows: quote.low.clone(),
        };

        let mut set = LevelCalculator::compute(symbol, &previous, &current, &window)?;
        set.data_source = "Yahoo Finance API (Formatted to match Barchart)".to_string();

        println!(
            "✅ [{}] Successfully calculated pivot points for {}",
            Utc::now().to_rfc3339(),
            symbol
        );
        Ok(set)
    }
}

impl Default for QuoteService {
    fn default() -> Self {
        Self::new()
    }
}

fn provider_alias(symbol: &str) -> &str {
    match symbol {
        "SPX" => "^SPX",
        other => other,
    }
}

/// Prix de base fixes utilisés par le générateur synthétique
fn base_price(symbol: &str) -> f64 {
    match symbol {
        "SPX" => 5080.75,
        _ => 508.25,
    }
}

fn sample_at(quote: &QuoteBlock, timestamps: &[i64], index: usize) -> Option<OhlcSample> {
    let at = |values: &[Option<f64>]| values.get(index).copied().flatten();
    let ts = timestamps.get(index).copied()?;

    Some(OhlcSample {
        open: at(&quote.open)?,
        high: at(&quote.high)?,
        low: at(&quote.low)?,
        close: at(&quote.close)?,
        timestamp: Utc.timestamp_opt(ts, 0).single()?,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Génère un Level Set synthétique plausible à partir d'un prix de base
/// fixe, avec des offsets multiplicatifs constants (±0.5% à ±5%).
/// Déterministe : deux appels pour le même symbole et la même raison
/// produisent les mêmes niveaux.
fn synthetic_level_set(symbol: &str, reason: &str) -> LevelSet {
    let base = base_price(symbol);

    // Chaîne de pivots : chaque palier est arrondi avant de nourrir le suivant
    let pp = round2(base);
    let r1 = round2(pp + (pp * 0.005));
    let r2 = round2(r1 + (pp * 0.008));
    let r3 = round2(r2 + (pp * 0.01));
    let s1 = round2(pp - (pp * 0.005));
    let s2 = round2(s1 - (pp * 0.008));
    let s3 = round2(s2 - (pp * 0.01));

    let daily_high = round2(pp + (pp * 0.015));
    let daily_low = round2(pp - (pp * 0.015));
    let weekly_high = round2(pp + (pp * 0.03));
    let weekly_low = round2(pp - (pp * 0.025));
    let monthly_high = round2(pp + (pp * 0.05));
    let monthly_low = round2(pp - (pp * 0.04));

    let fmt2 = |v: f64| format!("{:.2}", v);

    LevelSet {
        symbol: symbol.to_string(),
        date: Utc::now().format("%B %-d, %Y").to_string(),
        pivot_points: vec![
            LabeledValue {
                label: "PP".to_string(),
                value: fmt2(pp),
            },
            LabeledValue {
                label: "R1".to_string(),
                value: fmt2(r1),
            },
            LabeledValue {
                label: "R2".to_string(),
                value: fmt2(r2),
            },
            LabeledValue {
                label: "R3".to_string(),
                value: fmt2(r3),
            },
            LabeledValue {
                label: "S1".to_string(),
                value: fmt2(s1),
            },
            LabeledValue {
                label: "S2".to_string(),
                value: fmt2(s2),
            },
            LabeledValue {
                label: "S3".to_string(),
                value: fmt2(s3),
            },
        ],
        standard_deviations: None,
        fibonacci: None,
        highs_lows: HighsLows {
            daily_high: fmt2(daily_high),
            daily_low: fmt2(daily_low),
            weekly_high: fmt2(weekly_high),
            weekly_low: fmt2(weekly_low),
            monthly_high: fmt2(monthly_high),
            monthly_low: fmt2(monthly_low),
            previous_close: None,
        },
        key_levels: None,
        is_real_data: false,
        data_source: format!("Mock Data (Yahoo Finance API Error: {})", reason),
        last_updated: None,
        current_price: None,
    }
}
