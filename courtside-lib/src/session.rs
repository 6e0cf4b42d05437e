//! Practice session summaries
//!
//! A video analysis service reports a session as JSON: `shots` for
//! basketball and tennis, `events` for soccer, each with free-text coaching
//! feedback. This module parses that report, computes session statistics
//! and turns the feedback into a query the agent can answer from the
//! knowledge base.
//!
//! ```json
//! {
//!   "shots": [
//!     {
//!       "timestamp": "0:07.5",
//!       "shot_type": "Mid-range jump shot",
//!       "result": "missed",
//!       "feedback": "Get your elbow under the ball and follow through."
//!     }
//!   ]
//! }
//! ```

use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::Deserialize;

use crate::{Error, Result};

/// Sports the analysis service reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Basketball,
    Soccer,
    Tennis,
}

impl Sport {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basketball => "basketball",
            Self::Soccer => "soccer",
            Self::Tennis => "tennis",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basketball" => Ok(Self::Basketball),
            "soccer" => Ok(Self::Soccer),
            "tennis" => Ok(Self::Tennis),
            other => Err(Error::InvalidInput(format!(
                "unsupported sport '{other}', expected basketball, soccer or tennis"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotResult {
    Made,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RallyResult {
    Winner,
    Error,
    InPlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Goal,
    MissedShot,
    Pass,
    Foul,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasketballShot {
    pub timestamp: String,
    pub shot_type: String,
    pub result: ShotResult,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TennisShot {
    pub timestamp: String,
    pub shot_type: String,
    pub result: RallyResult,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoccerEvent {
    pub timestamp: String,
    pub event_type: EventKind,
    pub player_action: String,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Deserialize)]
struct ShotReport<T> {
    shots: Vec<T>,
}

#[derive(Deserialize)]
struct EventReport {
    events: Vec<SoccerEvent>,
}

/// A parsed session report.
#[derive(Debug, Clone)]
pub enum SessionAnalysis {
    Basketball(Vec<BasketballShot>),
    Tennis(Vec<TennisShot>),
    Soccer(Vec<SoccerEvent>),
}

/// Aggregate numbers for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionStats {
    Basketball {
        attempts: usize,
        made: usize,
        missed: usize,
        /// 0.0 when no shots were attempted
        percentage: f32,
    },
    Tennis {
        shots: usize,
        winners: usize,
        errors: usize,
    },
    Soccer {
        events: usize,
        goals: usize,
    },
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session Statistics:")?;
        match *self {
            Self::Basketball {
                attempts,
                made,
                missed,
                percentage,
            } => {
                writeln!(f, "- Total shots attempted: {attempts}")?;
                writeln!(f, "- Shots made: {made}")?;
                writeln!(f, "- Shots missed: {missed}")?;
                write!(f, "- Shooting percentage: {percentage:.1}%")
            }
            Self::Tennis {
                shots,
                winners,
                errors,
            } => {
                writeln!(f, "- Total shots: {shots}")?;
                writeln!(f, "- Winners: {winners}")?;
                write!(f, "- Errors: {errors}")
            }
            Self::Soccer { events, goals } => {
                writeln!(f, "- Total events: {events}")?;
                write!(f, "- Goals scored: {goals}")
            }
        }
    }
}

impl SessionAnalysis {
    /// Parse a report for `sport`.
    ///
    /// Accepts bare JSON, JSON inside a markdown code fence, or JSON embedded
    /// in surrounding prose (the outermost `{ ... }` is used).
    pub fn parse(sport: Sport, raw: &str) -> Result<Self> {
        let json = json_body(raw)?;
        Ok(match sport {
            Sport::Basketball => {
                Self::Basketball(serde_json::from_str::<ShotReport<BasketballShot>>(json)?.shots)
            }
            Sport::Tennis => Self::Tennis(serde_json::from_str::<ShotReport<TennisShot>>(json)?.shots),
            Sport::Soccer => Self::Soccer(serde_json::from_str::<EventReport>(json)?.events),
        })
    }

    #[must_use]
    pub fn sport(&self) -> Sport {
        match self {
            Self::Basketball(_) => Sport::Basketball,
            Self::Tennis(_) => Sport::Tennis,
            Self::Soccer(_) => Sport::Soccer,
        }
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        match self {
            Self::Basketball(shots) => {
                let attempts = shots.len();
                let made = shots.iter().filter(|s| s.result == ShotResult::Made).count();
                let percentage = if attempts == 0 {
                    0.0
                } else {
                    made as f32 / attempts as f32 * 100.0
                };
                SessionStats::Basketball {
                    attempts,
                    made,
                    missed: attempts - made,
                    percentage,
                }
            }
            Self::Tennis(shots) => SessionStats::Tennis {
                shots: shots.len(),
                winners: shots.iter().filter(|s| s.result == RallyResult::Winner).count(),
                errors: shots.iter().filter(|s| s.result == RallyResult::Error).count(),
            },
            Self::Soccer(events) => SessionStats::Soccer {
                events: events.len(),
                goals: events.iter().filter(|e| e.event_type == EventKind::Goal).count(),
            },
        }
    }

    /// Non-empty feedback lines in report order.
    #[must_use]
    pub fn feedback(&self) -> Vec<&str> {
        let lines: Vec<&str> = match self {
            Self::Basketball(shots) => shots.iter().map(|s| s.feedback.as_str()).collect(),
            Self::Tennis(shots) => shots.iter().map(|s| s.feedback.as_str()).collect(),
            Self::Soccer(events) => events.iter().map(|e| e.feedback.as_str()).collect(),
        };
        lines
            .into_iter()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }

    /// Statistics followed by item-by-item feedback.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = self.stats().to_string();
        out.push_str("\n\n");

        match self {
            Self::Basketball(shots) => {
                out.push_str("Shot-by-shot feedback:\n");
                for (i, shot) in shots.iter().enumerate() {
                    let result = match shot.result {
                        ShotResult::Made => "made",
                        ShotResult::Missed => "missed",
                    };
                    item(&mut out, "Shot", i + 1, &shot.shot_type, result, &shot.feedback);
                }
            }
            Self::Tennis(shots) => {
                out.push_str("Shot-by-shot feedback:\n");
                for (i, shot) in shots.iter().enumerate() {
                    let result = match shot.result {
                        RallyResult::Winner => "winner",
                        RallyResult::Error => "error",
                        RallyResult::InPlay => "in play",
                    };
                    item(&mut out, "Shot", i + 1, &shot.shot_type, result, &shot.feedback);
                }
            }
            Self::Soccer(events) => {
                out.push_str("Event-by-event feedback:\n");
                for (i, event) in events.iter().enumerate() {
                    let kind = match event.event_type {
                        EventKind::Goal => "goal",
                        EventKind::MissedShot => "missed shot",
                        EventKind::Pass => "pass",
                        EventKind::Foul => "foul",
                    };
                    item(&mut out, "Event", i + 1, kind, &event.player_action, &event.feedback);
                }
            }
        }
        out
    }

    /// Question for the agent built from the sport and the session feedback.
    #[must_use]
    pub fn coaching_query(&self) -> String {
        let feedback = self.feedback();
        if feedback.is_empty() {
            return format!("{} form and technique fundamentals", self.sport());
        }
        format!(
            "{} technique drills to fix: {}",
            self.sport(),
            feedback.join("; ")
        )
    }
}

fn item(out: &mut String, label: &str, n: usize, kind: &str, outcome: &str, feedback: &str) {
    let feedback = if feedback.trim().is_empty() {
        "No feedback"
    } else {
        feedback.trim()
    };
    let _ = write!(out, "\n{label} {n} ({kind}): {outcome}\nFeedback: {feedback}\n");
}

fn json_body(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if let Some(fenced) = trimmed.strip_prefix("```") {
        let body = fenced.strip_prefix("json").unwrap_or(fenced);
        let body = body.strip_suffix("```").unwrap_or(body).trim();
        if body.starts_with('{') {
            return Ok(body);
        }
    }
    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&trimmed[start..=end]),
        _ => Err(Error::InvalidInput(
            "no JSON object found in analysis report".into(),
        )),
    }
}
