//! Text variation operators for the evolutionary search.
//!
//! Everything here works on whitespace-delimited words and re-joins them
//! with single spaces, so exact formatting of the input is not preserved.
//! Operators take their inputs by reference and return new genomes.
//!
//! - [`Strategy`]: six whole-text rewrites used to seed the first generation
//! - [`MutationType`]: four single-word edits applied to offspring
//! - [`VariationGenerator`]: crossover, mutation and offspring production

use std::fmt;

use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::OptimizerConfig;
use crate::Genome;

// =============================================================================
// WORD TABLES
// =============================================================================

/// Intensifiers, hedges and politeness markers that rarely carry meaning.
const FILLER_WORDS: &[&str] = &[
    "please",
    "very",
    "extremely",
    "really",
    "quite",
    "basically",
    "actually",
    "just",
    "simply",
    "kindly",
    "truly",
    "certainly",
    "definitely",
    "literally",
    "totally",
    "highly",
    "rather",
    "somewhat",
];

/// Words with a shorter common synonym.
const SYNONYMS: &[(&str, &str)] = &[
    ("utilize", "use"),
    ("demonstrate", "show"),
    ("comprehensive", "full"),
    ("approximately", "about"),
    ("additional", "more"),
    ("assistance", "help"),
    ("numerous", "many"),
    ("sufficient", "enough"),
    ("commence", "start"),
    ("facilitate", "help"),
    ("regarding", "about"),
    ("purchase", "buy"),
    ("individuals", "people"),
    ("obtain", "get"),
    ("require", "need"),
];

/// Wordy constructions and their compact forms.
const PHRASE_REWRITES: &[(&str, &str)] = &[
    ("due to the fact that", "because"),
    ("at this point in time", "now"),
    ("in the event that", "if"),
    ("a large number of", "many"),
    ("for the purpose of", "for"),
    ("with regard to", "about"),
    ("in order to", "to"),
    ("make a decision", "decide"),
    ("is able to", "can"),
];

/// Pairs that say the same thing twice.
const REDUNDANT_PAIRS: &[(&str, &str)] = &[
    ("each and every", "every"),
    ("first and foremost", "first"),
    ("past history", "history"),
    ("end result", "result"),
    ("future plans", "plans"),
];

/// Sentence openers dropped when two sentences are joined.
const TRANSITIONS: &[&str] = &["additionally", "furthermore", "moreover", "also"];

/// Candidates for the insertion mutation.
const FUNCTION_WORDS: &[&str] = &["the", "a", "and", "of", "to", "in", "for", "with"];

/// Fallbacks for the substitution mutation.
const GENERIC_WORDS: &[&str] = &["this", "that", "it", "thing", "one", "way"];

// =============================================================================
// WORD HELPERS
// =============================================================================

/// A raw word split into leading punctuation, core, and trailing punctuation.
#[derive(Debug, Clone, Copy)]
struct Word<'a> {
    prefix: &'a str,
    core: &'a str,
    suffix: &'a str,
}

impl<'a> Word<'a> {
    fn parse(raw: &'a str) -> Self {
        let start = raw.find(char::is_alphanumeric).unwrap_or(raw.len());
        let end = raw
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_alphanumeric())
            .map_or(start, |(i, c)| i + c.len_utf8());
        Self {
            prefix: &raw[..start],
            core: &raw[start..end],
            suffix: &raw[end..],
        }
    }

    fn bare(&self) -> String {
        self.core.to_lowercase()
    }

    fn ends_sentence(&self) -> bool {
        self.suffix.contains(|c: char| matches!(c, '.' | '!' | '?'))
    }

    fn has_punctuation(&self) -> bool {
        self.suffix
            .contains(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?'))
    }

    fn is_capitalized(&self) -> bool {
        self.core.chars().next().is_some_and(char::is_uppercase)
    }

    /// Rebuild with a new core, keeping the surrounding punctuation.
    fn with_core(&self, core: &str) -> String {
        format!("{}{}{}", self.prefix, core, self.suffix)
    }
}

fn split_words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn match_case(capitalized: bool, replacement: &str) -> String {
    if capitalized {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

/// Capitalize the core of a raw word.
fn capitalize_raw(raw: &str) -> String {
    let word = Word::parse(raw);
    word.with_core(&capitalize(word.core))
}

/// Lowercase the first letter of a raw word unless it is "I" or an acronym.
fn lowercase_initial(raw: &str) -> String {
    let word = Word::parse(raw);
    let mut chars = word.core.chars();
    match (chars.next(), chars.next()) {
        (Some('I'), None) | (Some('I'), Some('\'')) => raw.to_string(),
        (_, Some(second)) if second.is_uppercase() => raw.to_string(),
        (Some(first), _) => {
            let rest: String = word.core.chars().skip(1).collect();
            word.with_core(&format!("{}{}", first.to_lowercase(), rest))
        }
        (None, _) => raw.to_string(),
    }
}

/// Drop the flagged words.
///
/// Trailing punctuation of a dropped word moves to the previous kept word,
/// and a dropped capitalized sentence opener passes its capital on.
fn remove_words(words: &[&str], remove: &[bool]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(words.len());
    let mut capitalize_next = false;

    for (i, raw) in words.iter().enumerate() {
        let word = Word::parse(raw);
        let sentence_start = i == 0 || Word::parse(words[i - 1]).ends_sentence();

        if !remove.get(i).copied().unwrap_or(false) {
            kept.push(if capitalize_next {
                capitalize_raw(raw)
            } else {
                raw.to_string()
            });
            capitalize_next = false;
            continue;
        }

        if word.has_punctuation() {
            if let Some(prev) = kept.last_mut() {
                let previous = Word::parse(prev);
                let (prev_ends, prev_punct) = (previous.ends_sentence(), previous.has_punctuation());
                if word.ends_sentence() && !prev_ends {
                    *prev = format!(
                        "{}{}",
                        prev.trim_end_matches(|c: char| matches!(c, ',' | ';' | ':')),
                        word.suffix
                    );
                } else if !prev_punct {
                    prev.push_str(word.suffix);
                }
            }
        }

        if sentence_start && word.is_capitalized() && !word.ends_sentence() {
            capitalize_next = true;
        }
    }

    kept
}

/// Find the first table phrase that starts the window.
///
/// Only the last matched word may carry trailing punctuation.
fn find_phrase(
    window: &[Word<'_>],
    table: &[(&'static str, &'static str)],
) -> Option<(usize, &'static str)> {
    table.iter().find_map(|(phrase, replacement)| {
        let parts: Vec<&str> = phrase.split(' ').collect();
        if parts.len() > window.len() {
            return None;
        }
        let matched = parts.iter().zip(window).enumerate().all(|(k, (part, word))| {
            word.core.eq_ignore_ascii_case(part)
                && (k + 1 == parts.len() || word.suffix.is_empty())
                && (k == 0 || word.prefix.is_empty())
        });
        matched.then_some((parts.len(), *replacement))
    })
}

/// Replace table phrases, each occurrence with probability `p`.
fn rewrite_phrases<R: Rng>(
    words: &[&str],
    table: &[(&'static str, &'static str)],
    p: f64,
    rng: &mut R,
) -> Vec<String> {
    let parsed: Vec<Word<'_>> = words.iter().map(|w| Word::parse(w)).collect();
    let mut out = Vec::with_capacity(words.len());
    let mut i = 0;

    while i < words.len() {
        match find_phrase(&parsed[i..], table) {
            Some((len, replacement)) if rng.gen_bool(p) => {
                let (first, last) = (parsed[i], parsed[i + len - 1]);
                let mut rewritten: Vec<String> =
                    replacement.split(' ').map(str::to_string).collect();
                if let Some(head) = rewritten.first_mut() {
                    *head = format!("{}{}", first.prefix, match_case(first.is_capitalized(), head));
                }
                if let Some(tail) = rewritten.last_mut() {
                    tail.push_str(last.suffix);
                }
                out.extend(rewritten);
                i += len;
            }
            _ => {
                out.push(words[i].to_string());
                i += 1;
            }
        }
    }

    out
}

// =============================================================================
// STRATEGY
// =============================================================================

/// Whole-text rewrites used to build the initial population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Remove 10-15% of the words at random positions.
    WordRemoval,

    /// Replace words that have a shorter synonym.
    SynonymSubstitution,

    /// Rewrite wordy constructions ("in order to" -> "to").
    StructuralSimplification,

    /// Drop repeated words and collapse redundant pairs.
    RedundancyRemoval,

    /// Join adjacent sentences with a semicolon.
    SentenceMerging,

    /// Remove every filler, intensifier and politeness word.
    FillerRemoval,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WordRemoval => write!(f, "word_removal"),
            Self::SynonymSubstitution => write!(f, "synonym_substitution"),
            Self::StructuralSimplification => write!(f, "structural_simplification"),
            Self::RedundancyRemoval => write!(f, "redundancy_removal"),
            Self::SentenceMerging => write!(f, "sentence_merging"),
            Self::FillerRemoval => write!(f, "filler_removal"),
        }
    }
}

impl Strategy {
    /// Every strategy, in seeding order.
    pub const ALL: [Strategy; 6] = [
        Self::WordRemoval,
        Self::SynonymSubstitution,
        Self::StructuralSimplification,
        Self::RedundancyRemoval,
        Self::SentenceMerging,
        Self::FillerRemoval,
    ];

    /// Strategy used for the initial genome at `index`.
    pub fn for_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Apply this rewrite to `text`. Never returns an empty genome for
    /// non-empty input: a rewrite that would erase everything yields `text`.
    pub fn apply<R: Rng>(&self, text: &str, rng: &mut R) -> Genome {
        let words = split_words(text);
        if words.is_empty() {
            return text.to_string();
        }

        let rewritten = match self {
            Self::WordRemoval => word_removal(&words, rng),
            Self::SynonymSubstitution => synonym_substitution(&words, rng),
            Self::StructuralSimplification => {
                let p = rng.gen_range(0.6..=1.0);
                rewrite_phrases(&words, PHRASE_REWRITES, p, rng)
            }
            Self::RedundancyRemoval => redundancy_removal(&words, rng),
            Self::SentenceMerging => match sentence_merging(&words, rng) {
                Some(merged) => merged,
                None => return text.to_string(),
            },
            Self::FillerRemoval => {
                let p = rng.gen_range(0.5..=1.0);
                let remove: Vec<bool> = words
                    .iter()
                    .map(|w| {
                        FILLER_WORDS.contains(&Word::parse(w).bare().as_str()) && rng.gen_bool(p)
                    })
                    .collect();
                remove_words(&words, &remove)
            }
        };

        if rewritten.is_empty() {
            text.to_string()
        } else {
            rewritten.join(" ")
        }
    }
}

fn word_removal<R: Rng>(words: &[&str], rng: &mut R) -> Vec<String> {
    let n = words.len();
    let fraction = rng.gen_range(0.10..=0.15);
    let mut count = (n as f64 * fraction).round() as usize;
    if n > 3 {
        count = count.max(1);
    }
    let count = count.min(n);

    let mut remove = vec![false; n];
    for i in index::sample(rng, n, count).into_iter() {
        remove[i] = true;
    }
    remove_words(words, &remove)
}

fn synonym_substitution<R: Rng>(words: &[&str], rng: &mut R) -> Vec<String> {
    let p = rng.gen_range(0.5..=1.0);
    words
        .iter()
        .map(|raw| {
            let word = Word::parse(raw);
            match lookup(SYNONYMS, &word.bare()) {
                Some(short) if rng.gen_bool(p) => {
                    word.with_core(&match_case(word.is_capitalized(), short))
                }
                _ => raw.to_string(),
            }
        })
        .collect()
}

fn redundancy_removal<R: Rng>(words: &[&str], rng: &mut R) -> Vec<String> {
    let p = rng.gen_range(0.6..=1.0);
    let collapsed = rewrite_phrases(words, REDUNDANT_PAIRS, p, rng);
    let refs: Vec<&str> = collapsed.iter().map(String::as_str).collect();

    let mut remove = vec![false; refs.len()];
    for i in 1..refs.len() {
        let (prev, cur) = (Word::parse(refs[i - 1]), Word::parse(refs[i]));
        if !cur.core.is_empty()
            && prev.suffix.is_empty()
            && cur.core.eq_ignore_ascii_case(prev.core)
            && rng.gen_bool(p)
        {
            remove[i] = true;
        }
    }
    remove_words(&refs, &remove)
}

/// Returns `None` for single-sentence input.
fn sentence_merging<R: Rng>(words: &[&str], rng: &mut R) -> Option<Vec<String>> {
    let n = words.len();
    let boundaries: Vec<usize> = (0..n.saturating_sub(1))
        .filter(|&i| Word::parse(words[i]).ends_sentence())
        .collect();
    if boundaries.is_empty() {
        return None;
    }

    let p = rng.gen_range(0.5..=1.0);
    let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    let mut dropped = vec![false; n];

    for &b in &boundaries {
        if !rng.gen_bool(p) {
            continue;
        }

        // out[b] may already carry a lowercased opener from the previous merge.
        let merged_end = {
            let end = Word::parse(&out[b]);
            let suffix: String = end
                .suffix
                .chars()
                .filter(|c| !matches!(*c, '.' | '!' | '?'))
                .collect();
            format!("{}{}{};", end.prefix, end.core, suffix)
        };
        out[b] = merged_end;

        let next = b + 1;
        let opener = Word::parse(words[next]);
        let sentence_continues = next + 1 < n && !opener.ends_sentence();
        if sentence_continues && TRANSITIONS.contains(&opener.bare().as_str()) {
            dropped[next] = true;
            out[next + 1] = lowercase_initial(&out[next + 1]);
        } else {
            out[next] = lowercase_initial(&out[next]);
        }
    }

    Some(
        out.into_iter()
            .zip(dropped)
            .filter_map(|(w, d)| (!d).then_some(w))
            .collect(),
    )
}

// =============================================================================
// MUTATION TYPE
// =============================================================================

/// Single-word edits applied to offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationType {
    /// Insert a common function word at a random position.
    Insertion,

    /// Delete a random word. No-op at three words or fewer.
    Deletion,

    /// Replace a random word with a synonym or a generic word.
    Substitution,

    /// Swap two random words. No-op below two words.
    Swap,
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insertion => write!(f, "Insertion"),
            Self::Deletion => write!(f, "Deletion"),
            Self::Substitution => write!(f, "Substitution"),
            Self::Swap => write!(f, "Swap"),
        }
    }
}

impl MutationType {
    /// Every mutation type.
    pub const ALL: [MutationType; 4] = [Self::Insertion, Self::Deletion, Self::Substitution, Self::Swap];

    /// Apply this edit to `genome`.
    pub fn apply<R: Rng>(&self, genome: &str, rng: &mut R) -> Genome {
        let words = split_words(genome);
        let n = words.len();

        match self {
            Self::Insertion => {
                let inserted = FUNCTION_WORDS.choose(rng).copied().unwrap_or("the");
                let position = rng.gen_range(0..=n);
                let mut out = words;
                out.insert(position, inserted);
                out.join(" ")
            }
            Self::Deletion => {
                if n <= 3 {
                    return words.join(" ");
                }
                let mut remove = vec![false; n];
                remove[rng.gen_range(0..n)] = true;
                remove_words(&words, &remove).join(" ")
            }
            Self::Substitution => {
                if n == 0 {
                    return String::new();
                }
                let position = rng.gen_range(0..n);
                let word = Word::parse(words[position]);
                let replacement = match lookup(SYNONYMS, &word.bare()) {
                    Some(short) => short,
                    None => GENERIC_WORDS.choose(rng).copied().unwrap_or("this"),
                };
                let replaced = word.with_core(&match_case(word.is_capitalized(), replacement));

                let mut out: Vec<String> = words.iter().map(|w| w.to_string()).collect();
                out[position] = replaced;
                out.join(" ")
            }
            Self::Swap => {
                if n < 2 {
                    return words.join(" ");
                }
                let i = rng.gen_range(0..n);
                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                let mut out = words;
                out.swap(i, j);
                out.join(" ")
            }
        }
    }
}

// =============================================================================
// VARIATION GENERATOR
// =============================================================================

/// Produces initial genomes and offspring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariationGenerator {
    crossover_rate: f64,
    mutation_rate: f64,
}

impl Default for VariationGenerator {
    fn default() -> Self {
        Self::from_config(&OptimizerConfig::default())
    }
}

impl VariationGenerator {
    /// Create a generator. Rates are clamped into `[0, 1]`.
    pub fn new(crossover_rate: f64, mutation_rate: f64) -> Self {
        Self {
            crossover_rate: crossover_rate.clamp(0.0, 1.0),
            mutation_rate: mutation_rate.clamp(0.0, 1.0),
        }
    }

    /// Create a generator from the search configuration.
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self::new(config.crossover_rate, config.mutation_rate)
    }

    /// Genome 0 is `original`; genome `i` is `Strategy::for_index(i)` applied
    /// to `original`.
    pub fn initial_population<R: Rng>(&self, original: &str, size: usize, rng: &mut R) -> Vec<Genome> {
        (0..size)
            .map(|i| {
                if i == 0 {
                    original.to_string()
                } else {
                    let strategy = Strategy::for_index(i);
                    trace!(index = i, strategy = %strategy, "Seeding genome");
                    strategy.apply(original, rng)
                }
            })
            .collect()
    }

    /// Single-point word crossover: `parent1[..k] + parent2[k..]` with `k`
    /// drawn from `0..=min(len1, len2)`.
    pub fn crossover<R: Rng>(&self, parent1: &str, parent2: &str, rng: &mut R) -> Genome {
        let words1 = split_words(parent1);
        let words2 = split_words(parent2);
        let point = rng.gen_range(0..=words1.len().min(words2.len()));

        words1[..point]
            .iter()
            .chain(&words2[point..])
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Apply one uniformly chosen point mutation.
    pub fn mutate<R: Rng>(&self, genome: &str, rng: &mut R) -> Genome {
        let mutation = MutationType::ALL
            .choose(rng)
            .copied()
            .unwrap_or(MutationType::Substitution);
        trace!(mutation = %mutation, "Mutating genome");
        mutation.apply(genome, rng)
    }

    /// One child: crossover with probability `crossover_rate` (otherwise a
    /// copy of `parent1`), then a mutation with probability `mutation_rate`.
    pub fn offspring<R: Rng>(&self, parent1: &str, parent2: &str, rng: &mut R) -> Genome {
        let child = if rng.gen_bool(self.crossover_rate) {
            self.crossover(parent1, parent2, rng)
        } else {
            parent1.to_string()
        };

        if rng.gen_bool(self.mutation_rate) {
            self.mutate(&child, rng)
        } else {
            child
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const MARKET_PROMPT: &str =
        "Please provide a very comprehensive and extremely detailed analysis of current market trends.";

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }

    // ---- Word Helper Tests ----

    #[test]
    fn test_word_parse() {
        let w = Word::parse("\"hello,");
        assert_eq!((w.prefix, w.core, w.suffix), ("\"", "hello", ","));
        assert!(w.has_punctuation());
        assert!(!w.ends_sentence());

        let w = Word::parse("...");
        assert_eq!(w.core, "");
        assert_eq!(w.prefix, "...");
    }

    #[test]
    fn test_remove_words_moves_punctuation() {
        let words = split_words("Do it now, please.");
        let remove = [false, false, false, true];
        assert_eq!(remove_words(&words, &remove).join(" "), "Do it now.");

        let words = split_words("Finish the report quickly.");
        let remove = [false, false, false, true];
        assert_eq!(remove_words(&words, &remove).join(" "), "Finish the report.");
    }

    #[test]
    fn test_remove_words_passes_capital_on() {
        let words = split_words("Kindly review the draft.");
        let remove = [true, false, false, false];
        assert_eq!(remove_words(&words, &remove).join(" "), "Review the draft.");
    }

    #[test]
    fn test_lowercase_initial_keeps_acronyms() {
        assert_eq!(lowercase_initial("Summarize"), "summarize");
        assert_eq!(lowercase_initial("API"), "API");
        assert_eq!(lowercase_initial("I"), "I");
    }

    // ---- Strategy Tests ----

    /// Whether `out` is `original` with some filler words dropped.
    fn only_fillers_removed(original: &str, out: &str) -> bool {
        let bare = |text: &str| -> Vec<String> {
            split_words(text).iter().map(|w| Word::parse(w).bare()).collect()
        };
        let kept = bare(out);
        let mut kept_iter = kept.iter().peekable();
        for word in bare(original) {
            if kept_iter.peek() == Some(&&word) {
                kept_iter.next();
            } else if !FILLER_WORDS.contains(&word.as_str()) {
                return false;
            }
        }
        kept_iter.next().is_none()
    }

    #[test]
    fn test_filler_removal_varies_by_seed() {
        let mut outcomes = std::collections::HashSet::new();
        for seed in 0..40 {
            let out = Strategy::FillerRemoval.apply(MARKET_PROMPT, &mut rng(seed));
            assert!(only_fillers_removed(MARKET_PROMPT, &out), "unexpected: {}", out);
            outcomes.insert(out);
        }
        assert!(outcomes.len() > 1, "every seed gave the same genome");
        assert!(outcomes.contains("Provide a comprehensive and detailed analysis of current market trends."));
    }

    #[test]
    fn test_filler_removal_never_empties() {
        for seed in 0..16 {
            let out = Strategy::FillerRemoval.apply("Please, really.", &mut rng(seed));
            assert!(!out.is_empty());
            assert!((1..=2).contains(&word_count(&out)), "unexpected: {}", out);
        }
    }

    #[test]
    fn test_word_removal_fraction() {
        let text = "one two three four five six seven eight nine ten \
                    eleven twelve thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty";
        for seed in 0..16 {
            let out = Strategy::WordRemoval.apply(text, &mut rng(seed));
            let removed = 20 - word_count(&out);
            assert!((2..=3).contains(&removed), "removed {} words", removed);
        }
    }

    #[test]
    fn test_word_removal_removes_one_word_from_short_prompts() {
        // 10-15% of four to six words rounds to zero; one word still goes.
        for text in ["a b c d", "a b c d e", "a b c d e f"] {
            for seed in 0..8 {
                let out = Strategy::WordRemoval.apply(text, &mut rng(seed));
                assert_eq!(word_count(&out), word_count(text) - 1);
            }
        }
    }

    #[test]
    fn test_word_removal_short_text() {
        // Four words: at least one goes.
        let out = Strategy::WordRemoval.apply("Summarize this short note", &mut rng(3));
        assert_eq!(word_count(&out), 3);
        // Three words: nothing to remove.
        assert_eq!(Strategy::WordRemoval.apply("Summarize this note", &mut rng(3)), "Summarize this note");
    }

    #[test]
    fn test_synonym_substitution_outcomes() {
        let mut changed = false;
        for seed in 0..32 {
            let out = Strategy::SynonymSubstitution.apply("Utilize it.", &mut rng(seed));
            assert!(out == "Utilize it." || out == "Use it.", "unexpected: {}", out);
            changed |= out == "Use it.";
        }
        assert!(changed);
    }

    #[test]
    fn test_structural_simplification_outcomes() {
        let text = "In order to win, we must train.";
        let mut changed = false;
        for seed in 0..32 {
            let out = Strategy::StructuralSimplification.apply(text, &mut rng(seed));
            assert!(out == text || out == "To win, we must train.", "unexpected: {}", out);
            changed |= out != text;
        }
        assert!(changed);
    }

    #[test]
    fn test_phrase_with_inner_punctuation_is_not_rewritten() {
        let text = "Work in order, to finish.";
        for seed in 0..8 {
            assert_eq!(Strategy::StructuralSimplification.apply(text, &mut rng(seed)), text);
        }
    }

    #[test]
    fn test_redundancy_removal_outcomes() {
        let text = "Check the the end result.";
        let allowed = [
            "Check the the end result.",
            "Check the end result.",
            "Check the the result.",
            "Check the result.",
        ];
        let mut fully = false;
        for seed in 0..32 {
            let out = Strategy::RedundancyRemoval.apply(text, &mut rng(seed));
            assert!(allowed.contains(&out.as_str()), "unexpected: {}", out);
            fully |= out == "Check the result.";
        }
        assert!(fully);
    }

    #[test]
    fn test_sentence_merging_outcomes() {
        let text = "Read the file. Additionally, summarize it.";
        let mut merged = false;
        for seed in 0..32 {
            let out = Strategy::SentenceMerging.apply(text, &mut rng(seed));
            assert!(out == text || out == "Read the file; summarize it.", "unexpected: {}", out);
            merged |= out != text;
        }
        assert!(merged);
    }

    #[test]
    fn test_chained_merge_keeps_lowercased_opener() {
        let text = "Read it. Also Go. Stop.";
        let mut fully = false;
        for seed in 0..64 {
            let out = Strategy::SentenceMerging.apply(text, &mut rng(seed));
            let words = split_words(&out);
            for pair in words.windows(2) {
                if pair[0].ends_with(';') {
                    assert!(
                        !Word::parse(pair[1]).is_capitalized(),
                        "capital after merge: {}",
                        out
                    );
                }
            }
            fully |= out == "Read it; go; stop.";
        }
        assert!(fully);
    }

    #[test]
    fn test_sentence_merging_single_sentence_unchanged() {
        let text = "Explain   the code.";
        assert_eq!(Strategy::SentenceMerging.apply(text, &mut rng(0)), text);
    }

    #[test]
    fn test_strategy_for_index_cycles() {
        assert_eq!(Strategy::for_index(0), Strategy::WordRemoval);
        assert_eq!(Strategy::for_index(5), Strategy::FillerRemoval);
        assert_eq!(Strategy::for_index(6), Strategy::WordRemoval);
        assert_eq!(Strategy::FillerRemoval.to_string(), "filler_removal");
    }

    // ---- Mutation Tests ----

    #[test]
    fn test_insertion_adds_function_word() {
        for seed in 0..8 {
            let out = MutationType::Insertion.apply("alpha beta", &mut rng(seed));
            assert_eq!(word_count(&out), 3);
            assert!(out
                .split_whitespace()
                .any(|w| FUNCTION_WORDS.contains(&w)));
        }
    }

    #[test]
    fn test_deletion_respects_minimum() {
        assert_eq!(MutationType::Deletion.apply("one two three", &mut rng(0)), "one two three");
        let out = MutationType::Deletion.apply("one two three four", &mut rng(0));
        assert_eq!(word_count(&out), 3);
    }

    #[test]
    fn test_substitution_keeps_length() {
        for seed in 0..8 {
            let out = MutationType::Substitution.apply("We utilize numerous tools", &mut rng(seed));
            assert_eq!(word_count(&out), 4);
        }
        assert_eq!(MutationType::Substitution.apply("purchase", &mut rng(0)), "buy");
    }

    #[test]
    fn test_swap_behaviour() {
        assert_eq!(MutationType::Swap.apply("solo", &mut rng(0)), "solo");
        assert_eq!(MutationType::Swap.apply("left right", &mut rng(0)), "right left");
    }

    // ---- Generator Tests ----

    #[test]
    fn test_initial_population_starts_with_original() {
        let generator = VariationGenerator::default();
        let population = generator.initial_population(MARKET_PROMPT, 12, &mut rng(5));

        assert_eq!(population.len(), 12);
        assert_eq!(population[0], MARKET_PROMPT);
        assert!(population.iter().all(|g| !g.is_empty()));
        for i in [5, 11] {
            assert!(only_fillers_removed(MARKET_PROMPT, &population[i]));
        }
    }

    #[test]
    fn test_crossover_is_prefix_plus_suffix() {
        let generator = VariationGenerator::new(1.0, 0.0);
        let p1 = "a b c d e";
        let p2 = "v w x y z q";
        let w1: Vec<&str> = p1.split(' ').collect();
        let w2: Vec<&str> = p2.split(' ').collect();

        for seed in 0..16 {
            let child = generator.crossover(p1, p2, &mut rng(seed));
            let matches_some_point = (0..=5).any(|k| {
                let expected: Vec<&str> = w1[..k].iter().chain(&w2[k..]).copied().collect();
                child == expected.join(" ")
            });
            assert!(matches_some_point, "unexpected child: {}", child);
        }
    }

    #[test]
    fn test_offspring_without_variation_copies_parent() {
        let generator = VariationGenerator::new(0.0, 0.0);
        assert_eq!(generator.offspring("keep me", "other", &mut rng(0)), "keep me");
    }

    #[test]
    fn test_same_seed_same_offspring() {
        let generator = VariationGenerator::new(0.7, 0.5);
        let a = generator.offspring(MARKET_PROMPT, "Analyze market trends.", &mut rng(42));
        let b = generator.offspring(MARKET_PROMPT, "Analyze market trends.", &mut rng(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rates_are_clamped() {
        let generator = VariationGenerator::new(1.5, -0.2);
        assert_eq!(generator, VariationGenerator::new(1.0, 0.0));
    }
}
