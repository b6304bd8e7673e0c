//! Timeline consistency: time-of-day markers against the ledger time, and
//! in-scene durations against ledger constraints and the elapsed time since
//! the previous scene.

use super::{CheckContext, Finding};
use crate::models::rules::Structural;
use crate::models::{Category, Violation};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Coarse phase of the day, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeOfDay {
    Dawn,
    Morning,
    Noon,
    Afternoon,
    Evening,
    Night,
}

const MARKERS: &[(&str, TimeOfDay)] = &[
    ("dawn", TimeOfDay::Dawn),
    ("daybreak", TimeOfDay::Dawn),
    ("sunrise", TimeOfDay::Dawn),
    ("sunup", TimeOfDay::Dawn),
    ("first light", TimeOfDay::Dawn),
    ("morning", TimeOfDay::Morning),
    ("mornings", TimeOfDay::Morning),
    ("breakfast", TimeOfDay::Morning),
    ("noon", TimeOfDay::Noon),
    ("midday", TimeOfDay::Noon),
    ("noontime", TimeOfDay::Noon),
    ("lunchtime", TimeOfDay::Noon),
    ("afternoon", TimeOfDay::Afternoon),
    ("evening", TimeOfDay::Evening),
    ("dusk", TimeOfDay::Evening),
    ("sunset", TimeOfDay::Evening),
    ("sundown", TimeOfDay::Evening),
    ("twilight", TimeOfDay::Evening),
    ("nightfall", TimeOfDay::Evening),
    ("supper", TimeOfDay::Evening),
    ("night", TimeOfDay::Night),
    ("nights", TimeOfDay::Night),
    ("midnight", TimeOfDay::Night),
    ("moonlight", TimeOfDay::Night),
    ("moonlit", TimeOfDay::Night),
    ("starlight", TimeOfDay::Night),
    ("starlit", TimeOfDay::Night),
    ("stars", TimeOfDay::Night),
];

/// Words that move a marker off the present scene ("last night", "every morning").
const DISPLACING: &[&str] = &[
    "all", "each", "every", "last", "next", "other", "previous", "that", "tomorrow", "yesterday",
];

const NUMBER: &str = r"\d+|a\s+couple\s+of|a\s+few|several|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve";
const UNIT: &str = r"minutes?|hours?|days?|weeks?|months?|years?";

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let body = MARKERS
        .iter()
        .map(|(w, _)| w.replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", body)).expect("time marker regex")
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?P<num>{NUMBER})\s+(?P<unit>{UNIT})\b"
    ))
    .expect("duration regex")
});

/// A duration that the scene itself says has passed.
static ELAPSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:(?P<after>after)\s+)?(?P<num>{NUMBER})\s+(?P<unit>{UNIT})(?P<post>\s+(?:later|passed|had\s+passed|went\s+by|had\s+gone\s+by|elapsed|had\s+elapsed))?\b"
    ))
    .expect("elapsed regex")
});

static BOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:at\s+most|no\s+more\s+than|not\s+more\s+than|within|less\s+than|under|up\s+to|max(?:imum)?(?:\s+of)?|not\s+exceed(?:ing)?)\s+(?P<num>{NUMBER})\s+(?P<unit>{UNIT})\b"
    ))
    .expect("bound regex")
});

impl TimeOfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Dawn => "dawn",
            TimeOfDay::Morning => "morning",
            TimeOfDay::Noon => "noon",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }

    /// Phase named by a single marker ("stars" -> night).
    pub fn from_marker(marker: &str) -> Option<TimeOfDay> {
        let key = marker.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        MARKERS
            .iter()
            .find(|(w, _)| *w == key)
            .map(|(_, phase)| *phase)
    }

    /// Phase of a free-form ledger time ("late afternoon", "Night").
    pub fn parse(s: &str) -> Option<TimeOfDay> {
        MARKER_RE
            .find(s)
            .and_then(|m| TimeOfDay::from_marker(m.as_str()))
    }

    /// Distance in phases. Night and dawn are adjacent.
    pub fn distance(self, other: TimeOfDay) -> u8 {
        let a = self as i8;
        let b = other as i8;
        let d = (a - b).unsigned_abs();
        d.min(6 - d)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn number_value(raw: &str) -> Option<u64> {
    let key = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    if let Ok(n) = key.parse::<u64>() {
        return Some(n);
    }
    let n = match key.as_str() {
        "a" | "an" | "one" => 1,
        "two" | "a couple of" => 2,
        "three" | "a few" | "several" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        _ => return None,
    };
    Some(n)
}

fn unit_minutes(raw: &str) -> Option<u64> {
    let unit = raw.to_lowercase();
    let unit = unit.trim_end_matches('s');
    Some(match unit {
        "minute" => 1,
        "hour" => 60,
        "day" => 60 * 24,
        "week" => 60 * 24 * 7,
        "month" => 60 * 24 * 30,
        "year" => 60 * 24 * 365,
        _ => return None,
    })
}

fn minutes(caps: &Captures<'_>) -> Option<u64> {
    let n = number_value(caps.name("num")?.as_str())?;
    let unit = unit_minutes(caps.name("unit")?.as_str())?;
    Some(n.saturating_mul(unit))
}

/// First duration in a free-form phrase ("about 30 minutes"), in minutes.
pub fn parse_duration(s: &str) -> Option<u64> {
    DURATION_RE.captures(s).and_then(|c| minutes(&c))
}

/// Tightest upper bound stated by a constraint ("no more than 2 hours").
pub fn constraint_bound(s: &str) -> Option<u64> {
    BOUND_RE
        .captures_iter(s)
        .filter_map(|c| minutes(&c))
        .min()
}

pub fn check(ctx: &CheckContext<'_>) -> Vec<Violation> {
    let mut out = ctx.regex_violations(Category::TimelineConsistency);
    if ctx.wants(Structural::TimeOfDay) {
        out.extend(ctx.emit(Structural::TimeOfDay, time_of_day(ctx)));
    }
    let want_bound = ctx.wants(Structural::ElapsedBound);
    let want_since = ctx.wants(Structural::ElapsedSinceLastScene);
    if want_bound || want_since {
        let (bound, since) = elapsed(ctx);
        if want_bound {
            out.extend(ctx.emit(Structural::ElapsedBound, bound));
        }
        if want_since {
            out.extend(ctx.emit(Structural::ElapsedSinceLastScene, since));
        }
    }
    out
}

/// Markers in narration before any transition whose phase sits further
/// from the ledger time than the policy tolerance. One finding per phase.
fn time_of_day(ctx: &CheckContext<'_>) -> Vec<Finding> {
    let Some(expected) = TimeOfDay::parse(&ctx.ledger.time) else {
        tracing::debug!(time = %ctx.ledger.time, "ledger time has no recognisable phase; time-of-day check skipped");
        return Vec::new();
    };
    let doc = ctx.doc;
    let text = doc.text();
    let tolerance = ctx.policy().time_tolerance;
    let mut phases: BTreeMap<TimeOfDay, Finding> = BTreeMap::new();
    for m in MARKER_RE.find_iter(text) {
        if !doc.in_narration(&m.range()) || !ctx.before_transition(m.start()) {
            continue;
        }
        let Some(found) = TimeOfDay::from_marker(m.as_str()) else {
            continue;
        };
        if found.distance(expected) <= tolerance || is_displaced(&text[..m.start()]) {
            continue;
        }
        let span = doc.span(m.range());
        match phases.get_mut(&found) {
            Some(f) => f.spans.push(span),
            None => {
                phases.insert(
                    found,
                    Finding::new(span, m.as_str())
                        .var("found", found.as_str())
                        .var("expected", ctx.ledger.time.trim()),
                );
            }
        }
    }
    phases.into_values().collect()
}

fn is_displaced(before: &str) -> bool {
    before
        .split_whitespace()
        .next_back()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .is_some_and(|w| DISPLACING.contains(&w.as_str()))
}

/// Durations framed as elapsing inside the scene, checked against ledger
/// constraint bounds and against the elapsed time since the last scene.
fn elapsed(ctx: &CheckContext<'_>) -> (Vec<Finding>, Vec<Finding>) {
    let ledger = ctx.ledger;
    let bound = ledger
        .constraints
        .iter()
        .filter_map(|c| constraint_bound(c).map(|m| (m, c.trim())))
        .min_by_key(|(m, _)| *m);
    let since = ledger.elapsed_since_last_scene.as_deref().and_then(|s| {
        let parsed = parse_duration(s);
        if parsed.is_none() {
            tracing::debug!(elapsed = %s, "unparseable elapsed time since last scene");
        }
        parsed.map(|m| (m, s.trim()))
    });
    if bound.is_none() && since.is_none() {
        return (Vec::new(), Vec::new());
    }
    let factor = u64::from(ctx.policy().elapsed_slack_factor.max(1));
    let doc = ctx.doc;
    let mut over_bound = Vec::new();
    let mut over_since = Vec::new();
    for caps in ELAPSED_RE.captures_iter(doc.text()) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let framed = caps.name("after").is_some() || caps.name("post").is_some();
        if !framed || !doc.in_narration(&whole.range()) {
            continue;
        }
        let Some(mins) = minutes(&caps) else {
            continue;
        };
        let span = doc.span(whole.range());
        if let Some((limit, constraint)) = bound {
            if mins > limit {
                over_bound.push(Finding::new(span, whole.as_str()).var("expected", constraint));
            }
        }
        if let Some((gap, raw)) = since {
            if mins > gap.saturating_mul(factor) {
                over_since.push(Finding::new(span, whole.as_str()).var("expected", raw));
            }
        }
    }
    (over_bound, over_since)
}
