//! Rule-based 0–10 pain estimation from free text.
//!
//! The base score comes from the first source that yields one:
//! an explicit rating scale ("6 out of 10"), then the severity lexicon,
//! then a neutral default. Intensifier phrases shift the base afterwards.
//! Estimation is total: every input produces a clamped, bucketed score.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use painline_contracts::pain::PainEstimate;

/// Base score when the text carries no scale and no lexicon phrase.
pub const DEFAULT_SCORE: f64 = 4.5;

// ── Tables ───────────────────────────────────────────────────────────────────

static NUMERIC_SCALE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*(?:/|out of|over)\s*(?:10|ten)\b").unwrap()
});

static WORD_SCALE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(zero|one|two|three|four|five|six|seven|eight|nine|ten)\s*(?:/|out of|over)\s*(?:10|ten)\b",
    )
    .unwrap()
});

const NUMBER_WORDS: [&str; 11] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

/// A phrase and its compiled case-insensitive substring matcher.
///
/// Phrases match inside longer words, so "severe" fires on "severely" and
/// "numb" on "numbness".
struct Phrase {
    text: &'static str,
    value: f64,
    matcher: Regex,
}

fn compile(table: &[(&'static str, f64)]) -> Vec<Phrase> {
    let mut phrases: Vec<Phrase> = table
        .iter()
        .map(|&(text, value)| Phrase {
            text,
            value,
            matcher: Regex::new(&format!("(?i){}", regex::escape(text))).unwrap(),
        })
        .collect();
    // Longest first, so "very severe" claims its span before "severe".
    phrases.sort_by(|a, b| b.text.len().cmp(&a.text.len()));
    phrases
}

static SEVERITY_WORDS: Lazy<Vec<Phrase>> = Lazy::new(|| {
    compile(&[
        ("no pain", 0.0),
        ("mild", 2.0),
        ("slight", 2.0),
        ("tolerable", 3.0),
        ("moderate", 5.0),
        ("bad", 6.0),
        ("severe", 8.0),
        ("very severe", 9.0),
        ("excruciating", 9.5),
        ("worst imaginable", 10.0),
        ("worst", 10.0),
        ("agonizing", 10.0),
    ])
});

static INTENSIFIERS: Lazy<Vec<Phrase>> = Lazy::new(|| {
    compile(&[
        ("a little", -0.5),
        ("a bit", -0.5),
        ("some", -0.3),
        ("quite", 0.5),
        ("really", 0.8),
        ("very", 0.8),
        ("extremely", 1.0),
        ("wakes me up", 1.0),
        ("can't sleep", 1.2),
        ("throbbing", 0.3),
        ("stabbing", 0.7),
        ("burning", 0.5),
        ("numb", -0.4),
    ])
});

// ── Breakdown ────────────────────────────────────────────────────────────────

/// Where the base score came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum BaseSource {
    /// An explicit "N out of 10" style rating.
    Numeric { value: f64 },
    /// The mean of matched severity phrases.
    Lexicon,
    Default,
}

/// One lexicon phrase that contributed to an estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseHit {
    pub phrase: String,
    pub value: f64,
}

/// Every input that went into an estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateBreakdown {
    pub source: BaseSource,
    pub base: f64,
    /// Severity phrases matched. Empty when a numeric scale was found.
    pub severity_hits: Vec<PhraseHit>,
    pub intensifier_hits: Vec<PhraseHit>,
    /// Sum of intensifier shifts.
    pub shift: f64,
    pub estimate: PainEstimate,
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Estimate a 0–10 pain score from `text`.
pub fn estimate(text: &str) -> PainEstimate {
    explain(text).estimate
}

/// Estimate a score and report how it was reached.
pub fn explain(text: &str) -> EstimateBreakdown {
    let (source, base, severity_hits) = match parse_numeric_scale(text) {
        Some(value) => (BaseSource::Numeric { value }, value, Vec::new()),
        None => {
            let hits = parse_severity_words(text);
            if hits.is_empty() {
                (BaseSource::Default, DEFAULT_SCORE, hits)
            } else {
                let mean = hits.iter().map(|h| h.value).sum::<f64>() / hits.len() as f64;
                (BaseSource::Lexicon, mean, hits)
            }
        }
    };

    let intensifier_hits = match_phrases(&INTENSIFIERS, text, false);
    let shift = intensifier_hits.iter().fold(0.0, |acc, h| acc + h.value);

    EstimateBreakdown {
        source,
        base,
        severity_hits,
        intensifier_hits,
        shift,
        estimate: PainEstimate::from_score(base + shift),
    }
}

/// The first explicit rating in `text`, clamped to [0, 10].
///
/// Digit ratings win over spelled-out ones.
pub fn parse_numeric_scale(text: &str) -> Option<f64> {
    if let Some(caps) = NUMERIC_SCALE.captures(text) {
        if let Ok(n) = caps[1].parse::<u8>() {
            return Some(f64::from(n).clamp(0.0, 10.0));
        }
    }

    let caps = WORD_SCALE.captures(text)?;
    let word = caps[1].to_lowercase();
    NUMBER_WORDS
        .iter()
        .position(|w| *w == word)
        .map(|n| n as f64)
}

/// Severity phrases present in `text`, longest phrases claiming their spans first.
pub fn parse_severity_words(text: &str) -> Vec<PhraseHit> {
    match_phrases(&SEVERITY_WORDS, text, true)
}

/// Sum of intensifier shifts present in `text`. Each phrase counts once.
pub fn intensifier_shift(text: &str) -> f64 {
    match_phrases(&INTENSIFIERS, text, false)
        .iter()
        .fold(0.0, |acc, h| acc + h.value)
}

fn match_phrases(table: &[Phrase], text: &str, exclusive: bool) -> Vec<PhraseHit> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut hits = Vec::new();

    for phrase in table {
        let spans: Vec<(usize, usize)> = phrase
            .matcher
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .filter(|&(start, end)| {
                !exclusive || !claimed.iter().any(|&(s, e)| start < e && s < end)
            })
            .collect();

        if spans.is_empty() {
            continue;
        }
        if exclusive {
            claimed.extend(spans);
        }
        hits.push(PhraseHit {
            phrase: phrase.text.to_string(),
            value: phrase.value,
        });
    }
    hits
}

#[cfg(test)]
mod tests {
    use painline_contracts::pain::SeverityBucket;

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn explicit_rating_is_taken_exactly() {
        for n in 0..=10 {
            let est = estimate(&format!("I'd say {n} out of 10 today"));
            assert_eq!(est.score, n as f64, "rating {n}");
        }
        assert_eq!(estimate("it's 8/10").score, 8.0);
        assert_eq!(estimate("about 3 over ten").score, 3.0);
    }

    #[test]
    fn oversized_rating_is_clamped() {
        assert_eq!(parse_numeric_scale("it's like 15 out of 10"), Some(10.0));
        assert_eq!(estimate("it's like 15 out of 10").score, 10.0);
    }

    #[test]
    fn spelled_out_rating() {
        assert_eq!(parse_numeric_scale("Seven out of ten, honestly"), Some(7.0));
        assert_eq!(estimate("maybe two out of ten").bucket, SeverityBucket::Mild);
    }

    #[test]
    fn digit_rating_beats_word_rating() {
        assert_eq!(parse_numeric_scale("not two out of ten, more like 6/10"), Some(6.0));
    }

    #[test]
    fn no_signal_defaults_to_moderate() {
        let est = estimate("The weather was nice on the drive over.");
        assert_eq!(est.score, DEFAULT_SCORE);
        assert_eq!(est.bucket, SeverityBucket::Moderate);
        assert_eq!(explain("").source, BaseSource::Default);
    }

    #[test]
    fn rating_with_intensifier() {
        let breakdown = explain("My arm hurts about a 6 out of 10, it's throbbing.");
        assert_eq!(breakdown.source, BaseSource::Numeric { value: 6.0 });
        assert!(approx(breakdown.estimate.score, 6.3));
        assert_eq!(breakdown.estimate.bucket, SeverityBucket::Severe);
        assert_eq!(breakdown.intensifier_hits[0].phrase, "throbbing");
    }

    #[test]
    fn lexicon_phrases_are_averaged() {
        let hits = parse_severity_words("It went from mild to severe overnight");
        let phrases: Vec<&str> = hits.iter().map(|h| h.phrase.as_str()).collect();
        assert_eq!(phrases, vec!["severe", "mild"]);
        assert!(approx(estimate("It went from mild to severe overnight").score, 5.0));
    }

    #[test]
    fn longer_phrase_claims_its_span() {
        let hits = parse_severity_words("honestly the worst imaginable");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].phrase, "worst imaginable");

        // "very severe" is one hit at 9, plus the "very" intensifier.
        let breakdown = explain("Very severe since Tuesday");
        assert_eq!(breakdown.severity_hits.len(), 1);
        assert_eq!(breakdown.base, 9.0);
        assert!(approx(breakdown.estimate.score, 9.8));
    }

    #[test]
    fn repeated_phrase_counts_once() {
        assert!(approx(intensifier_shift("stabbing, stabbing, stabbing"), 0.7));
        assert_eq!(parse_severity_words("mild, mild, mild").len(), 1);
    }

    #[test]
    fn inflected_words_still_match() {
        let breakdown = explain("My arm hurts severely");
        assert_eq!(breakdown.source, BaseSource::Lexicon);
        assert_eq!(breakdown.estimate.score, 8.0);
        assert_eq!(breakdown.estimate.bucket, SeverityBucket::Severe);

        assert_eq!(estimate("it aches mildly").score, 2.0);
        assert_eq!(estimate("it hurts badly").score, 6.0);

        // "some" -0.3 and "numb" (in "numbness") -0.4 off the default.
        let est = estimate("there is some numbness");
        assert!(approx(est.score, 3.8));
        assert_eq!(est.bucket, SeverityBucket::Moderate);
    }

    #[test]
    fn no_intensifiers_is_positive_zero_shift() {
        let breakdown = explain("My arm hurts");
        assert!(breakdown.intensifier_hits.is_empty());
        assert!(breakdown.shift == 0.0 && breakdown.shift.is_sign_positive());
        assert_eq!(intensifier_shift("").to_bits(), 0.0f64.to_bits());

        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json["shift"].to_string(), "0.0");
    }

    #[test]
    fn intensifiers_cannot_leave_range() {
        let est = estimate("agonizing, extremely bad, can't sleep, it wakes me up");
        assert_eq!(est.score, 10.0);
        let est = estimate("no pain, just a little numb");
        assert_eq!(est.score, 0.0);
        assert_eq!(est.bucket, SeverityBucket::Mild);
    }

    #[test]
    fn score_is_always_in_range() {
        for text in [
            "",
            "99/10",
            "zero out of ten but stabbing burning throbbing really extremely",
            "tolerable, a bit, some, numb",
            "WORST. PAIN. EVER.",
        ] {
            let est = estimate(text);
            assert!((0.0..=10.0).contains(&est.score), "{text}: {}", est.score);
            assert_eq!(est.bucket, SeverityBucket::from_score(est.score));
        }
    }
}
