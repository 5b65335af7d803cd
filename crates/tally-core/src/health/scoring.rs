//! Band interpolation and grading

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{BandScores, ScoreBands};

/// Piecewise-linear score of `value` across four metric bands
///
/// A value exactly on a band earns that band's score; values between bands
/// interpolate. Past the excellent band the score stays at the excellent
/// score. Past the poor band the fair-to-poor slope continues down to 0.
pub fn interpolate(value: f64, bands: &ScoreBands, scores: &BandScores) -> f64 {
    // Flip lower-is-better metrics so larger always means better
    let sign = if bands.higher_is_better() { 1.0 } else { -1.0 };
    let v = value * sign;
    let points = [
        (bands.excellent * sign, scores.excellent),
        (bands.good * sign, scores.good),
        (bands.fair * sign, scores.fair),
        (bands.poor * sign, scores.poor),
    ];

    if v >= points[0].0 {
        return scores.excellent.clamp(0.0, 100.0);
    }

    for pair in points.windows(2) {
        let (hi_x, hi_score) = pair[0];
        let (lo_x, lo_score) = pair[1];
        if v >= lo_x {
            return lerp(v, lo_x, lo_score, hi_x, hi_score).clamp(0.0, 100.0);
        }
    }

    let (fair_x, fair_score) = points[2];
    let (poor_x, poor_score) = points[3];
    let slope = (fair_score - poor_score) / (fair_x - poor_x);
    (poor_score - (poor_x - v) * slope).clamp(0.0, 100.0)
}

fn lerp(v: f64, lo_x: f64, lo_score: f64, hi_x: f64, hi_score: f64) -> f64 {
    if hi_x == lo_x {
        return hi_score;
    }
    lo_score + (v - lo_x) / (hi_x - lo_x) * (hi_score - lo_score)
}

/// Letter grade of an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(overall: u8) -> Self {
        match overall {
            90..=u8::MAX => Self::A,
            75..=89 => Self::B,
            60..=74 => Self::C,
            40..=59 => Self::D,
            _ => Self::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        }
    }

    /// Canned one-line summary for display
    pub fn summary(&self) -> &'static str {
        match self {
            Self::A => "🌟 Excellent! Your finances are in great shape.",
            Self::B => "👍 Good. A few small improvements would make a difference.",
            Self::C => "🙂 Fair. There is clear room for improvement.",
            Self::D => "⚠️ Needs attention. Several areas are under strain.",
            Self::F => "🚨 Critical. Your finances need immediate attention.",
        }
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "F" => Ok(Self::F),
            _ => Err(format!("Unknown grade: {}", s)),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
