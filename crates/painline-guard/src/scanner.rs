//! Input security scan: sensitive-data redaction and concerning language.

use once_cell::sync::Lazy;
use regex::Regex;

use painline_contracts::validation::{
    InputScan, IssueSeverity, SecurityIssue, SensitiveDataKind,
};

/// Replacement for every sensitive-data match.
pub const REDACTION: &str = "[REDACTED]";

/// Terms that escalate a transcript to a human, matched case-insensitively
/// as substrings.
pub const CONCERNING_TERMS: [&str; 10] = [
    "suicide",
    "kill myself",
    "end it all",
    "self-harm",
    "overdose",
    "abuse",
    "neglect",
    "violence",
    "illegal",
    "drug dealing",
];

struct Detector {
    kind: SensitiveDataKind,
    pattern: &'static str,
    matcher: Regex,
}

impl Detector {
    fn new(kind: SensitiveDataKind, pattern: &'static str) -> Self {
        Self {
            kind,
            pattern,
            matcher: Regex::new(&format!("(?i){pattern}")).unwrap(),
        }
    }
}

// Redaction runs in this order; match positions always index the input.
static DETECTORS: Lazy<Vec<Detector>> = Lazy::new(|| {
    vec![
        Detector::new(SensitiveDataKind::Ssn, r"\b\d{3}-\d{2}-\d{4}\b"),
        Detector::new(SensitiveDataKind::CardNumber, r"\b\d{16}\b"),
        Detector::new(
            SensitiveDataKind::Email,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b",
        ),
        Detector::new(SensitiveDataKind::Phone, r"\b\d{10}\b"),
        Detector::new(SensitiveDataKind::Password, r"\b(?:password|pwd|pass)\s*[:=]\s*\S+"),
    ]
});

/// Scan `text` for sensitive data and concerning language.
///
/// Every sensitive match becomes a high-severity issue whose `position` is
/// a byte span of `text`, and is replaced by [`REDACTION`] in
/// `redacted_text`. Rescanning `redacted_text` finds no further sensitive
/// data.
pub fn scan_text(text: &str) -> InputScan {
    let mut issues = Vec::new();
    let mut redacted = text.to_string();

    for detector in DETECTORS.iter() {
        let found: Vec<SecurityIssue> = detector
            .matcher
            .find_iter(text)
            .map(|m| SecurityIssue::SensitiveData {
                detector: detector.kind,
                pattern: detector.pattern.to_string(),
                position: [m.start(), m.end()],
                severity: IssueSeverity::High,
            })
            .collect();
        if found.is_empty() {
            continue;
        }
        redacted = detector.matcher.replace_all(&redacted, REDACTION).into_owned();
        issues.extend(found);
    }

    let concerning_terms = concerning_terms_in(text);
    issues.extend(concerning_terms.iter().map(|term| SecurityIssue::ConcerningContent {
        term: term.clone(),
        severity: IssueSeverity::Medium,
        action_required: "review".to_string(),
    }));

    InputScan {
        secure: issues.is_empty(),
        requires_escalation: !concerning_terms.is_empty(),
        issues,
        redacted_text: redacted,
        concerning_terms,
    }
}

/// Concerning terms present in `text`, in lexicon order.
pub fn concerning_terms_in(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    CONCERNING_TERMS
        .iter()
        .filter(|term| lowered.contains(*term))
        .map(|term| term.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensitive_count(scan: &InputScan) -> usize {
        scan.issues.iter().filter(|i| i.is_sensitive_data()).count()
    }

    #[test]
    fn clean_text_is_secure() {
        let scan = scan_text("My arm hurts about a 6 out of 10. It's been bothering me for days.");
        assert!(scan.secure);
        assert!(scan.issues.is_empty());
        assert!(!scan.requires_escalation);
        assert_eq!(scan.redacted_text, "My arm hurts about a 6 out of 10. It's been bothering me for days.");
    }

    #[test]
    fn ssn_is_flagged_and_redacted() {
        let scan = scan_text("My arm hurts and my SSN is 123-45-6789, please help.");

        assert!(!scan.secure);
        assert_eq!(scan.issues.len(), 1);
        match &scan.issues[0] {
            SecurityIssue::SensitiveData { detector, position, severity, .. } => {
                assert_eq!(*detector, SensitiveDataKind::Ssn);
                assert_eq!(*severity, IssueSeverity::High);
                assert_eq!(*position, [27, 38]);
            }
            other => panic!("expected sensitive data, got {other:?}"),
        }
        assert_eq!(scan.redacted_text, "My arm hurts and my SSN is [REDACTED], please help.");
    }

    #[test]
    fn every_detector_fires() {
        let scan = scan_text(
            "card 4111111111111111, mail jo.doe@example.org, call 5551234567, password: hunter2",
        );
        let kinds: Vec<SensitiveDataKind> = scan
            .issues
            .iter()
            .filter_map(|i| match i {
                SecurityIssue::SensitiveData { detector, .. } => Some(*detector),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                SensitiveDataKind::CardNumber,
                SensitiveDataKind::Email,
                SensitiveDataKind::Phone,
                SensitiveDataKind::Password,
            ]
        );
        assert_eq!(
            scan.redacted_text,
            "card [REDACTED], mail [REDACTED], call [REDACTED], [REDACTED]"
        );
    }

    #[test]
    fn positions_index_the_original_input() {
        let text = "SSN 123-45-6789, write to jo@example.org";
        let scan = scan_text(text);

        let spans: Vec<(SensitiveDataKind, [usize; 2])> = scan
            .issues
            .iter()
            .filter_map(|i| match i {
                SecurityIssue::SensitiveData { detector, position, .. } => Some((*detector, *position)),
                _ => None,
            })
            .collect();
        assert_eq!(
            spans,
            vec![(SensitiveDataKind::Ssn, [4, 15]), (SensitiveDataKind::Email, [26, 40])]
        );
        assert_eq!(&text[26..40], "jo@example.org");
        assert_eq!(scan.redacted_text, "SSN [REDACTED], write to [REDACTED]");
    }

    #[test]
    fn password_match_is_case_insensitive() {
        let scan = scan_text("PWD=abc123 is what I use");
        assert_eq!(sensitive_count(&scan), 1);
        assert!(!scan.redacted_text.contains("abc123"));
    }

    #[test]
    fn redaction_is_idempotent() {
        for text in [
            "ssn 123-45-6789 and 987-65-4321",
            "pass: 123-45-6789",
            "reach me at a.b@c.io or 5551234567",
            "my pwd = 4111111111111111",
            "nothing here at all",
        ] {
            let first = scan_text(text);
            let second = scan_text(&first.redacted_text);
            assert_eq!(sensitive_count(&second), 0, "{text} -> {}", first.redacted_text);
            assert_eq!(second.redacted_text, first.redacted_text);
        }
    }

    #[test]
    fn concerning_language_escalates() {
        let scan = scan_text("The pain is so bad I just want to KILL MYSELF.");
        assert!(!scan.secure);
        assert!(scan.requires_escalation);
        assert_eq!(scan.concerning_terms, vec!["kill myself".to_string()]);
        match &scan.issues[0] {
            SecurityIssue::ConcerningContent { term, severity, action_required } => {
                assert_eq!(term, "kill myself");
                assert_eq!(*severity, IssueSeverity::Medium);
                assert_eq!(action_required, "review");
            }
            other => panic!("expected concerning content, got {other:?}"),
        }
        // Concerning language is not redacted.
        assert!(scan.redacted_text.contains("KILL MYSELF"));
    }

    #[test]
    fn concerning_terms_follow_lexicon_order() {
        assert_eq!(
            concerning_terms_in("violence at home, then an overdose"),
            vec!["overdose".to_string(), "violence".to_string()]
        );
    }
}
