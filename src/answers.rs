// Answer normalization and comparison rules
// Challenge answers get character folding (chat users type ё/е and dash
// variants interchangeably); event code words are operator-distributed
// literal strings and are compared without folding.

/// Canonicalize a free-text answer: trim surrounding whitespace and fold
/// visually-equivalent character pairs to a single form.
/// Idempotent: normalizing an already-normalized string is a no-op.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            'ё' => 'е',
            'Ё' => 'Е',
            '—' => '-',
            other => other,
        })
        .collect()
}

/// Compare a submitted answer against the canonical one.
/// Both sides are normalized identically, then case-folded.
pub fn answers_match(submitted: &str, canonical: &str) -> bool {
    normalize_answer(submitted).to_lowercase() == normalize_answer(canonical).to_lowercase()
}

/// Compare a submitted event code word against the stored one.
/// Trim + case-fold only - no character folding for codes.
pub fn codes_match(stored: &str, submitted: &str) -> bool {
    stored.trim().to_lowercase() == submitted.trim().to_lowercase()
}
