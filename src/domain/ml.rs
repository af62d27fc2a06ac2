//! Next-day direction classifier.
//!
//! Features per bar are RSI(14), the MACD line and volume; the label is
//! whether the next close is higher. Rows are split chronologically (no
//! shuffling), standardised with training statistics, and fitted with
//! full-batch gradient descent on the logistic loss.

use crate::domain::error::CrosswatchError;
use crate::domain::frame::IndicatorFrame;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::fmt;

pub const FEATURE_COUNT: usize = 3;
/// Fewer labelled rows than this and no model is trained.
pub const MIN_LABELLED_ROWS: usize = 10;

pub type Features = [f64; FEATURE_COUNT];

#[derive(Debug, Clone, PartialEq)]
pub struct MlConfig {
    pub train_fraction: f64,
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            epochs: 500,
            learning_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    fn from_up(up: bool) -> Self {
        if up { Direction::Up } else { Direction::Down }
    }

    fn index(self) -> usize {
        match self {
            Direction::Down => 0,
            Direction::Up => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Down => write!(f, "DOWN"),
            Direction::Up => write!(f, "UP"),
        }
    }
}

/// One bar with a complete feature vector. `next_up` is `None` on the final
/// bar, whose next close is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub features: Features,
    pub next_up: Option<bool>,
}

/// Rows for every bar where RSI and MACD are both defined.
pub fn build_features(bars: &[OhlcvBar], frame: &IndicatorFrame) -> Vec<FeatureRow> {
    bars.iter()
        .enumerate()
        .filter_map(|(i, bar)| {
            let rsi = frame.rsi.value_at(i)?;
            let macd = frame.macd.value_at(i)?;
            let next_up = bars.get(i + 1).map(|next| next.close > bar.close);
            Some(FeatureRow {
                date: bar.date,
                features: [rsi, macd, bar.volume as f64],
                next_up,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    weights: Features,
    bias: f64,
    means: Features,
    scales: Features,
}

impl LogisticModel {
    /// Fit from zero weights. `inputs` and `labels` must be the same length.
    pub fn fit(inputs: &[Features], labels: &[bool], epochs: usize, learning_rate: f64) -> Self {
        let (means, scales) = standardisation(inputs);
        let mut model = Self {
            weights: [0.0; FEATURE_COUNT],
            bias: 0.0,
            means,
            scales,
        };

        let scaled: Vec<Features> = inputs.iter().map(|x| model.scale(x)).collect();
        let n = scaled.len().max(1) as f64;

        for _ in 0..epochs {
            let mut grad_w = [0.0; FEATURE_COUNT];
            let mut grad_b = 0.0;
            for (x, &y) in scaled.iter().zip(labels) {
                let error = model.raw_probability(x) - if y { 1.0 } else { 0.0 };
                for (g, xi) in grad_w.iter_mut().zip(x) {
                    *g += error * xi;
                }
                grad_b += error;
            }
            for (w, g) in model.weights.iter_mut().zip(grad_w) {
                *w -= learning_rate * g / n;
            }
            model.bias -= learning_rate * grad_b / n;
        }

        model
    }

    /// Probability that the next close is higher.
    pub fn probability_up(&self, features: &Features) -> f64 {
        self.raw_probability(&self.scale(features))
    }

    pub fn predict(&self, features: &Features) -> Direction {
        Direction::from_up(self.probability_up(features) >= 0.5)
    }

    fn scale(&self, features: &Features) -> Features {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, value) in out.iter_mut().enumerate() {
            *value = (features[i] - self.means[i]) / self.scales[i];
        }
        out
    }

    fn raw_probability(&self, scaled: &Features) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(scaled)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        sigmoid(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Column means and standard deviations; a constant column scales by 1.
fn standardisation(inputs: &[Features]) -> (Features, Features) {
    let mut means = [0.0; FEATURE_COUNT];
    let mut scales = [1.0; FEATURE_COUNT];
    if inputs.is_empty() {
        return (means, scales);
    }
    let n = inputs.len() as f64;

    for i in 0..FEATURE_COUNT {
        let mean = inputs.iter().map(|x| x[i]).sum::<f64>() / n;
        let variance = inputs.iter().map(|x| (x[i] - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        means[i] = mean;
        scales[i] = if std > f64::EPSILON { std } else { 1.0 };
    }

    (means, scales)
}

/// Counts indexed `[actual][predicted]`, Down = 0, Up = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn record(&mut self, actual: Direction, predicted: Direction) {
        self.counts[actual.index()][predicted.index()] += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.counts[0][0] + self.counts[1][1]) as f64 / total as f64
    }

    /// Of the rows predicted as `class`, the fraction that were `class`.
    pub fn precision(&self, class: Direction) -> f64 {
        let c = class.index();
        let predicted = self.counts[0][c] + self.counts[1][c];
        ratio(self.counts[c][c], predicted)
    }

    /// Of the rows that were `class`, the fraction predicted as `class`.
    pub fn recall(&self, class: Direction) -> f64 {
        let c = class.index();
        let actual = self.counts[c][0] + self.counts[c][1];
        ratio(self.counts[c][c], actual)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelReport {
    pub symbol: String,
    pub train_rows: usize,
    pub test_rows: usize,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    /// Direction predicted from the most recent bar with complete features.
    pub latest_date: Option<NaiveDate>,
    pub latest_prediction: Option<Direction>,
    pub latest_probability_up: Option<f64>,
}

pub fn train_and_evaluate(
    symbol: &str,
    bars: &[OhlcvBar],
    frame: &IndicatorFrame,
    config: &MlConfig,
) -> Result<ModelReport, CrosswatchError> {
    let rows = build_features(bars, frame);
    let labelled: Vec<(&Features, bool)> = rows
        .iter()
        .filter_map(|row| row.next_up.map(|up| (&row.features, up)))
        .collect();

    let n = labelled.len();
    let train_rows = (n as f64 * config.train_fraction).floor() as usize;
    let test_rows = n - train_rows;
    if n < MIN_LABELLED_ROWS || train_rows == 0 || test_rows == 0 {
        return Err(CrosswatchError::InsufficientHistory {
            symbol: symbol.to_string(),
            bars: n,
            minimum: MIN_LABELLED_ROWS,
        });
    }

    let (train, test) = labelled.split_at(train_rows);
    let inputs: Vec<Features> = train.iter().map(|(x, _)| **x).collect();
    let labels: Vec<bool> = train.iter().map(|(_, y)| *y).collect();
    let model = LogisticModel::fit(&inputs, &labels, config.epochs, config.learning_rate);

    let mut confusion = ConfusionMatrix::default();
    for (features, up) in test {
        confusion.record(Direction::from_up(*up), model.predict(features));
    }

    let latest = rows.last();
    Ok(ModelReport {
        symbol: symbol.to_string(),
        train_rows,
        test_rows,
        accuracy: confusion.accuracy(),
        confusion,
        latest_date: latest.map(|row| row.date),
        latest_prediction: latest.map(|row| model.predict(&row.features)),
        latest_probability_up: latest.map(|row| model.probability_up(&row.features)),
    })
}
