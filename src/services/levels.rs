use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Une session de trading (OHLC), immuable une fois extraite/générée
#[derive(Debug, Clone, Copy)]
pub struct OhlcSample {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub timestamp: DateTime<Utc>,
}

/// Fenêtre historique (~1 mois de sessions quotidiennes).
/// Les entrées None restent présentes pour garder l'alignement avec les
/// timestamps du provider ; elles sont exclues des min/max.
#[derive(Debug, Clone, Default)]
pub struct HistoricalWindow {
    pub highs: Vec<Option<f64>>,
    pub lows: Vec<Option<f64>>,
}

impl HistoricalWindow {
    pub fn session_count(&self) -> usize {
        self.highs.len()
    }
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("not enough sessions in window: got {0}, need at least 2")]
    InsufficientHistory(usize),
    #[error("window contains no usable high/low prices")]
    EmptyWindow,
    #[error("high/low series have different lengths: {highs} highs, {lows} lows")]
    MismatchedSeries { highs: usize, lows: usize },
}

#[derive(Debug, Serialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

impl LabeledValue {
    fn new(label: &str, value: f64) -> Self {
        Self {
            label: label.to_string(),
            value: fmt2(value),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HighsLows {
    #[serde(rename = "Daily High")]
    pub daily_high: String,
    #[serde(rename = "Daily Low")]
    pub daily_low: String,
    #[serde(rename = "Weekly High")]
    pub weekly_high: String,
    #[serde(rename = "Weekly Low")]
    pub weekly_low: String,
    #[serde(rename = "Monthly High")]
    pub monthly_high: String,
    #[serde(rename = "Monthly Low")]
    pub monthly_low: String,
    #[serde(rename = "Previous Close", skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<String>,
}

/// Résultat dérivé pour un symbole. Construit à chaque requête,
/// jamais persisté (durée de vie = une réponse HTTP).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSet {
    pub symbol: String,
    pub date: String,
    pub pivot_points: Vec<LabeledValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_deviations: Option<Vec<LabeledValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fibonacci: Option<Vec<LabeledValue>>,
    pub highs_lows: HighsLows,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_levels: Option<Vec<LabeledValue>>,
    pub is_real_data: bool,
    pub data_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<String>,
}

/// Niveaux pivots de la formule Barchart, calculés sur la session précédente
#[derive(Debug, Clone, Copy)]
struct PivotLevels {
    pp: f64,
    r1: f64,
    r2: f64,
    r3: f64,
    s1: f64,
    s2: f64,
    s3: f64,
}

fn barchart_pivots(previous: &OhlcSample) -> PivotLevels {
    let pp = (previous.high + previous.low + previous.close) / 3.0;
    let range = previous.high - previous.low;
    let r1 = (2.0 * pp) - previous.low;
    let s1 = (2.0 * pp) - previous.high;

    PivotLevels {
        pp,
        r1,
        r2: pp + range,
        r3: r1 + range,
        s1,
        s2: pp - range,
        s3: s1 - range,
    }
}

/// Arrondi à 2 décimales, appliqué UNE SEULE fois à la sortie.
/// Les valeurs intermédiaires restent en pleine précision.
fn fmt2(value: f64) -> String {
    format!("{:.2}", value)
}

fn max_ignoring_nulls(values: &[Option<f64>]) -> Option<f64> {
    values
        .iter()
        .flatten()
        .copied()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
}

fn min_ignoring_nulls(values: &[Option<f64>]) -> Option<f64> {
    values
        .iter()
        .flatten()
        .copied()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
}

/// Nombre de sessions de la fenêtre "hebdo" (5 derniers jours de bourse)
const WEEKLY_SESSIONS: usize = 5;

pub struct LevelCalculator;

impl LevelCalculator {
    /// Calcule l'ensemble des niveaux techniques pour un symbole :
    /// pivots Barchart, bandes de déviation standard, retracements
    /// Fibonacci et résumé highs/lows.
    ///
    /// `window` doit contenir au moins 2 sessions (courante + précédente),
    /// sinon le calcul de pivot n'est pas défini et on renvoie une erreur
    /// (le Quote Source Adapter bascule alors sur le fallback synthétique).
    pub fn compute(
        symbol: &str,
        previous: &OhlcSample,
        current: &OhlcSample,
        window: &HistoricalWindow,
    ) -> Result<LevelSet, LevelError> {
        if window.session_count() < 2 {
            return Err(LevelError::InsufficientHistory(window.session_count()));
        }

        // Un payload provider malformé peut livrer des séries high/low de
        // tailles différentes : refuser ici plutôt que paniquer sur un
        // slice plus bas (l'appelant bascule sur le fallback synthétique)
        if window.highs.len() != window.lows.len() {
            return Err(LevelError::MismatchedSeries {
                highs: window.highs.len(),
                lows: window.lows.len(),
            });
        }

        // 1. Points pivots (formule Barchart) sur la session précédente
        let pivots = barchart_pivots(previous);

        // 2. Bandes de déviation standard autour du close courant
        //    (approximation : 20% du range de la veille)
        let std_dev = (previous.high - previous.low) * 0.2;
        let sd1r = current.close + std_dev;
        let sd2r = current.close + (std_dev * 2.0);
        let sd3r = current.close + (std_dev * 3.0);
        let sd1s = current.close - std_dev;
        let sd2s = current.close - (std_dev * 2.0);
        let sd3s = current.close - (std_dev * 3.0);

        // 3. Retracements Fibonacci sur les extrêmes de la fenêtre complète
        //    (les None sont exclus du max ET du min)
        let month_high = max_ignoring_nulls(&window.highs).ok_or(LevelError::EmptyWindow)?;
        let month_low = min_ignoring_nulls(&window.lows).ok_or(LevelError::EmptyWindow)?;
        let fib_range = month_high - month_low;
        let fib382 = month_high - (fib_range * 0.382);
        let fib50 = month_high - (fib_range * 0.5);
        let fib618 = month_high - (fib_range * 0.618);

        // 4. Highs/lows hebdo (5 dernières sessions) et mensuels (fenêtre complète)
        let week_start = window.session_count().saturating_sub(WEEKLY_SESSIONS);
        let weekly_high =
            max_ignoring_nulls(&window.highs[week_start..]).ok_or(LevelError::EmptyWindow)?;
        let weekly_low =
            min_ignoring_nulls(&window.lows[week_start..]).ok_or(LevelError::EmptyWindow)?;

        let now = Utc::now();

        Ok(LevelSet {
            symbol: symbol.to_string(),
            date: now.format("%B %-d, %Y").to_string(),
            pivot_points: vec![
                LabeledValue::new("PP", pivots.pp),
                LabeledValue::new("R1", pivots.r1),
                LabeledValue::new("R2", pivots.r2),
                LabeledValue::new("R3", pivots.r3),
                LabeledValue::new("S1", pivots.s1),
                LabeledValue::new("S2", pivots.s2),
                LabeledValue::new("S3", pivots.s3),
            ],
            standard_deviations: Some(vec![
                LabeledValue::new("1 SD Resistance", sd1r),
                LabeledValue::new("2 SD Resistance", sd2r),
                LabeledValue::new("3 SD Resistance", sd3r),
                LabeledValue::new("1 SD Support", sd1s),
                LabeledValue::new("2 SD Support", sd2s),
                LabeledValue::new("3 SD Support", sd3s),
            ]),
            fibonacci: Some(vec![
                LabeledValue::new("38.2% Retracement", fib382),
                LabeledValue::new("50% Retracement", fib50),
                LabeledValue::new("61.8% Retracement", fib618),
            ]),
            highs_lows: HighsLows {
                daily_high: fmt2(current.high),
                daily_low: fmt2(current.low),
                weekly_high: fmt2(weekly_high),
                weekly_low: fmt2(weekly_low),
                monthly_high: fmt2(month_high),
                monthly_low: fmt2(month_low),
                previous_close: Some(fmt2(previous.close)),
            },
            key_levels: Some(vec![
                LabeledValue::new("Current Price", current.close),
                LabeledValue::new("Open", current.open),
                LabeledValue::new("Previous Close", previous.close),
            ]),
            is_real_data: true,
            data_source: String::new(), // renseigné par l'appelant
            last_updated: Some(now.to_rfc3339()),
            current_price: Some(fmt2(current.close)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(open: f64, high: f64, low: f64, close: f64) -> OhlcSample {
        OhlcSample {
            open,
            high,
            low,
            close,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 5, 21, 0, 0).unwrap(),
        }
    }

    fn window_from(highs: &[f64], lows: &[f64]) -> HistoricalWindow {
        HistoricalWindow {
            highs: highs.iter().copied().map(Some).collect(),
            lows: lows.iter().copied().map(Some).collect(),
        }
    }

    #[test]
    fn test_barchart_example_values() {
        // Session précédente {high: 5090, low: 5070, close: 5080}
        // => PP = 5080.00, R1 = 5090.00, S1 = 5070.00
        let previous = sample(5075.0, 5090.0, 5070.0, 5080.0);
        let current = sample(5080.0, 5095.0, 5072.0, 5085.0);
        let window = window_from(&[5090.0, 5095.0], &[5070.0, 5072.0]);

        let set = LevelCalculator::compute("SPX", &previous, &current, &window).unwrap();

        assert_eq!(set.pivot_points[0].label, "PP");
        assert_eq!(set.pivot_points[0].value, "5080.00");
        assert_eq!(set.pivot_points[1].label, "R1");
        assert_eq!(set.pivot_points[1].value, "5090.00");
        assert_eq!(set.pivot_points[4].label, "S1");
        assert_eq!(set.pivot_points[4].value, "5070.00");
    }

    #[test]
    fn test_pivot_band_symmetry() {
        // R1 - PP == PP - S1 et espacement des paliers Barchart
        let previous = sample(101.0, 104.5, 98.25, 102.75);
        let pivots = barchart_pivots(&previous);

        assert!((pivots.r1 - pivots.pp - (pivots.pp - pivots.s1)).abs() < 1e-9);
        assert!((pivots.r3 - pivots.r1 - (pivots.r2 - pivots.pp)).abs() < 1e-9);
        assert!((pivots.s1 - pivots.s3 - (pivots.pp - pivots.s2)).abs() < 1e-9);
    }

    #[test]
    fn test_sd_bands_ordered_around_close() {
        let previous = sample(100.0, 106.0, 96.0, 103.0);
        let current = sample(103.0, 108.0, 101.0, 105.0);
        let window = window_from(&[106.0, 108.0, 110.0], &[96.0, 101.0, 99.0]);

        let set = LevelCalculator::compute("SPY", &previous, &current, &window).unwrap();
        let sds = set.standard_deviations.unwrap();
        let value = |i: usize| sds[i].value.parse::<f64>().unwrap();

        // sd3s < sd2s < sd1s < close < sd1r < sd2r < sd3r
        let close = 105.0;
        assert!(value(5) < value(4));
        assert!(value(4) < value(3));
        assert!(value(3) < close);
        assert!(close < value(0));
        assert!(value(0) < value(1));
        assert!(value(1) < value(2));
    }

    #[test]
    fn test_fibonacci_levels_inside_range() {
        let previous = sample(100.0, 106.0, 96.0, 103.0);
        let current = sample(103.0, 108.0, 101.0, 105.0);
        let window = window_from(&[120.0, 118.0, 115.0], &[100.0, 98.0, 102.0]);

        let set = LevelCalculator::compute("SPX", &previous, &current, &window).unwrap();
        let fibs = set.fibonacci.unwrap();
        let fib382 = fibs[0].value.parse::<f64>().unwrap();
        let fib50 = fibs[1].value.parse::<f64>().unwrap();
        let fib618 = fibs[2].value.parse::<f64>().unwrap();

        // minLow < fib618 < fib50 < fib382 < maxHigh
        assert!(98.0 < fib618);
        assert!(fib618 < fib50);
        assert!(fib50 < fib382);
        assert!(fib382 < 120.0);
    }

    #[test]
    fn test_nulls_excluded_from_extremes() {
        let previous = sample(100.0, 106.0, 96.0, 103.0);
        let current = sample(103.0, 108.0, 101.0, 105.0);
        let window = HistoricalWindow {
            highs: vec![Some(110.0), None, Some(112.0)],
            lows: vec![None, Some(95.0), Some(97.0)],
        };

        let set = LevelCalculator::compute("SPX", &previous, &current, &window).unwrap();
        assert_eq!(set.highs_lows.monthly_high, "112.00");
        assert_eq!(set.highs_lows.monthly_low, "95.00");
    }

    #[test]
    fn test_weekly_window_is_last_five_sessions() {
        let previous = sample(100.0, 106.0, 96.0, 103.0);
        let current = sample(103.0, 108.0, 101.0, 105.0);
        // Le max global (200) est hors des 5 dernières sessions
        let window = window_from(
            &[200.0, 110.0, 111.0, 112.0, 113.0, 114.0],
            &[10.0, 100.0, 101.0, 102.0, 103.0, 104.0],
        );

        let set = LevelCalculator::compute("SPX", &previous, &current, &window).unwrap();
        assert_eq!(set.highs_lows.weekly_high, "114.00");
        assert_eq!(set.highs_lows.weekly_low, "100.00");
        assert_eq!(set.highs_lows.monthly_high, "200.00");
        assert_eq!(set.highs_lows.monthly_low, "10.00");
    }

    #[test]
    fn test_rounding_happens_once_at_output() {
        // (10.004 + 10.004 + 10.004) / 3 = 10.004 -> "10.00"
        // Un arrondi intermédiaire par valeur donnerait un cumul d'erreur
        let previous = sample(10.0, 10.004, 10.004, 10.004);
        let pivots = barchart_pivots(&previous);
        assert_eq!(fmt2(pivots.pp), "10.00");
        // R2 = PP + (H - L) reste en pleine précision avant formatage
        assert!((pivots.r2 - pivots.pp).abs() < 1e-9);
    }

    #[test]
    fn test_window_with_one_session_is_an_error() {
        let previous = sample(100.0, 106.0, 96.0, 103.0);
        let current = sample(103.0, 108.0, 101.0, 105.0);
        let window = window_from(&[108.0], &[101.0]);

        let err = LevelCalculator::compute("SPX", &previous, &current, &window).unwrap_err();
        assert!(matches!(err, LevelError::InsufficientHistory(1)));
    }

    #[test]
    fn test_mismatched_series_lengths_is_an_error_not_a_panic() {
        let previous = sample(100.0, 106.0, 96.0, 103.0);
        let current = sample(103.0, 108.0, 101.0, 105.0);
        // 7 highs mais une seule low : le calcul doit refuser proprement
        let window = HistoricalWindow {
            highs: vec![Some(110.0); 7],
            lows: vec![Some(95.0)],
        };

        let err = LevelCalculator::compute("SPX", &previous, &current, &window).unwrap_err();
        assert!(matches!(
            err,
            LevelError::MismatchedSeries { highs: 7, lows: 1 }
        ));
    }

    #[test]
    fn test_all_null_window_is_an_error() {
        let previous = sample(100.0, 106.0, 96.0, 103.0);
        let current = sample(103.0, 108.0, 101.0, 105.0);
        let window = HistoricalWindow {
            highs: vec![None, None],
            lows: vec![None, None],
        };

        let err = LevelCalculator::compute("SPX", &previous, &current, &window).unwrap_err();
        assert!(matches!(err, LevelError::EmptyWindow));
    }
}
