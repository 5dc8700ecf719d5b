//! String similarity metrics on a 0–100 integer scale.
//!
//! The base [`ratio`] is a normalized Levenshtein similarity. Two variants
//! widen recall for spoken-style input: [`partial_ratio`] tolerates queries
//! that truncate the candidate or trail extra words, and
//! [`token_sort_ratio`] tolerates word reordering. [`weighted_ratio`]
//! blends all three and is what the recognizer's candidate scan uses.
//!
//! All metrics assume both inputs already went through the session
//! [`Normalizer`](crate::normalize::Normalizer).

/// Highest possible score: the strings are equal.
pub const EXACT: u8 = 100;

/// Normalized Levenshtein similarity, rounded to an integer 0–100.
///
/// 100 iff the strings are equal; 0 when every character must change.
/// Char-based, so multi-byte text scores by perceived length.
pub fn ratio(a: &str, b: &str) -> u8 {
    (strsim::normalized_levenshtein(a, b) * 100.0).round() as u8
}

/// Best [`ratio`] of the shorter string against every same-length character
/// window of the longer one.
///
/// "turn off the light please" still scores 100 against the candidate
/// "turn off the light". Equal-length inputs degrade to plain [`ratio`].
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (short, long) = if a_chars.len() <= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };
    if short.is_empty() {
        return if long.is_empty() { EXACT } else { 0 };
    }
    if short.len() == long.len() {
        return ratio(a, b);
    }

    let needle: String = short.iter().collect();
    let mut best = 0u8;
    for window in long.windows(short.len()) {
        let haystack: String = window.iter().collect();
        let r = ratio(&needle, &haystack);
        if r > best {
            best = r;
            if best == EXACT {
                break;
            }
        }
    }
    best
}

/// [`ratio`] over whitespace tokens sorted into a canonical order.
///
/// "light the turn off" scores 100 against "turn off the light".
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sort_tokens(a), &sort_tokens(b))
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Length ratio above which the partial metric joins the blend.
const PARTIAL_THRESHOLD: f64 = 1.5;
/// Discount on the token-sort score: reordering is cheap but not free.
const TOKEN_SORT_SCALE: f64 = 0.95;
/// Discount on the partial score: a window match ignores the rest.
const PARTIAL_SCALE: f64 = 0.9;

/// Composite similarity: the maximum of the direct ratio, the discounted
/// token-sort ratio, and — once the strings differ enough in length for a
/// window match to mean something — the discounted partial ratio.
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let base = ratio(a, b);
    if base == EXACT {
        return EXACT;
    }
    let tsort = (f64::from(token_sort_ratio(a, b)) * TOKEN_SORT_SCALE).round() as u8;
    let mut best = base.max(tsort);

    let la = a.chars().count();
    let lb = b.chars().count();
    let (min, max) = (la.min(lb), la.max(lb));
    if min > 0 && (max as f64) / (min as f64) > PARTIAL_THRESHOLD {
        let partial = (f64::from(partial_ratio(a, b)) * PARTIAL_SCALE).round() as u8;
        best = best.max(partial);
    }
    best
}

/// Upper bound on [`weighted_ratio`] knowing only the two char counts.
///
/// The candidate scan uses this to skip scoring candidates that provably
/// cannot beat the running cutoff. Must never underestimate for normalized
/// (single-spaced) input.
pub fn weighted_upper_bound(len_a: usize, len_b: usize) -> u8 {
    let (min, max) = (len_a.min(len_b), len_a.max(len_b));
    if max == 0 {
        return EXACT;
    }
    // Direct and token-sort ratios are bounded by the length difference
    // (an edit per surplus char); the partial branch is capped by its scale.
    let diff = (max - min) as f64;
    let direct = ((1.0 - diff / max as f64) * 100.0).ceil() as u8;
    if min > 0 && (max as f64) / (min as f64) > PARTIAL_THRESHOLD {
        direct.max((100.0 * PARTIAL_SCALE).round() as u8)
    } else {
        direct
    }
}
