//! Sentiment scoring of interaction logs.
//!
//! Per-text polarity comes from a `PolarityAnalyzer`; the default one is a
//! rule-based word lexicon with negation and intensifier handling.

use std::collections::{HashMap, HashSet};
use std::fmt;

use regex::Regex;
use tracing::{instrument, trace};

use crate::domain::{DomainError, DomainResult, User};

/// Maps a text to a polarity in `[-1, 1]`. Must be deterministic.
pub trait PolarityAnalyzer {
    fn analyze_polarity(&self, text: &str) -> f64;
}

/// Word lexicon analyzer.
///
/// 1. Look up word scores
/// 2. Flip the sign of a scored word that follows a negation
/// 3. Scale a scored word that follows an intensifier
///
/// A pending negation or intensifier is dropped at the next unscored word,
/// unless that word is a skip word ("not this good" still negates).
///
/// The polarity is the mean of the matched word scores, clamped to `[-1, 1]`.
/// Texts without any known word are neutral (0.0).
#[derive(Debug, Clone)]
pub struct LexiconAnalyzer {
    words: HashMap<String, f64>,
    negations: HashSet<String>,
    skip_words: HashSet<String>,
    intensifiers: HashMap<String, f64>,
    token_regex: Regex,
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        let positive_words = [
            ("love", 0.5),
            ("loved", 0.7),
            ("like", 0.2),
            ("good", 0.7),
            ("great", 0.8),
            ("excellent", 1.0),
            ("amazing", 0.6),
            ("awesome", 1.0),
            ("wonderful", 1.0),
            ("fantastic", 0.4),
            ("perfect", 1.0),
            ("best", 1.0),
            ("brilliant", 0.9),
            ("beautiful", 0.85),
            ("nice", 0.6),
            ("happy", 0.8),
            ("glad", 0.5),
            ("fun", 0.3),
            ("cool", 0.35),
            ("kind", 0.6),
            ("friendly", 0.4),
            ("helpful", 0.5),
            ("enjoy", 0.4),
            ("interesting", 0.5),
            ("welcome", 0.8),
            ("thanks", 0.2),
            ("thank", 0.2),
        ];

        let negative_words = [
            ("hate", -0.8),
            ("hated", -0.9),
            ("dislike", -0.5),
            ("bad", -0.7),
            ("terrible", -1.0),
            ("awful", -1.0),
            ("horrible", -1.0),
            ("worst", -1.0),
            ("poor", -0.4),
            ("sad", -0.5),
            ("angry", -0.5),
            ("upset", -0.5),
            ("boring", -1.0),
            ("annoying", -0.8),
            ("disappointing", -0.6),
            ("ugly", -0.7),
            ("rude", -0.6),
            ("stupid", -0.8),
            ("wrong", -0.5),
            ("sick", -0.7),
            ("tired", -0.4),
            ("lonely", -0.4),
        ];

        let words = positive_words
            .into_iter()
            .chain(negative_words)
            .map(|(word, score)| (word.to_string(), score))
            .collect();

        let negations = [
            "not", "no", "never", "neither", "nobody", "nothing", "none", "cannot", "can't",
            "cant", "don't", "dont", "doesn't", "doesnt", "didn't", "didnt", "won't", "wont",
            "isn't", "isnt", "aren't", "arent", "wasn't", "wasnt", "hardly", "barely",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let skip_words = ["this", "that", "it", "i", "a", "an", "the"]
            .into_iter()
            .map(String::from)
            .collect();

        let intensifiers = [
            ("very", 1.5),
            ("really", 1.3),
            ("so", 1.3),
            ("extremely", 2.0),
            ("super", 1.5),
            ("totally", 1.5),
            ("slightly", 0.5),
            ("somewhat", 0.7),
            ("quite", 1.2),
        ]
        .into_iter()
        .map(|(word, mult)| (word.to_string(), mult))
        .collect();

        Self {
            words,
            negations,
            skip_words,
            intensifiers,
            token_regex: Regex::new(r"[\p{L}\p{N}']+").unwrap(),
        }
    }

    /// Add or override lexicon entries; scores are clamped to `[-1, 1]`.
    pub fn with_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        for (word, score) in words {
            self.add_word(word.as_ref(), score);
        }
        self
    }

    pub fn add_word(&mut self, word: &str, score: f64) {
        self.words
            .insert(word.to_lowercase(), score.clamp(-1.0, 1.0));
    }

    pub fn get_score(&self, word: &str) -> Option<f64> {
        self.words.get(&word.to_lowercase()).copied()
    }

    pub fn is_negation(&self, word: &str) -> bool {
        self.negations.contains(&word.to_lowercase())
    }

    pub fn is_skip_word(&self, word: &str) -> bool {
        self.skip_words.contains(&word.to_lowercase())
    }

    pub fn get_intensifier(&self, word: &str) -> Option<f64> {
        self.intensifiers.get(&word.to_lowercase()).copied()
    }
}

impl PolarityAnalyzer for LexiconAnalyzer {
    fn analyze_polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let mut scores: Vec<f64> = Vec::new();
        let mut negate_next = false;
        let mut intensifier: f64 = 1.0;

        for token in self.token_regex.find_iter(&lowered) {
            let word = token.as_str();

            if self.is_negation(word) {
                negate_next = true;
                continue;
            }

            if let Some(mult) = self.get_intensifier(word) {
                intensifier = mult;
                continue;
            }

            match self.get_score(word) {
                Some(mut score) => {
                    if negate_next {
                        score = -score;
                        negate_next = false;
                    }
                    score *= intensifier;
                    intensifier = 1.0;
                    scores.push(score);
                }
                None if self.is_skip_word(word) => {}
                None => {
                    negate_next = false;
                    intensifier = 1.0;
                }
            }
        }

        if scores.is_empty() {
            return 0.0;
        }
        let polarity = scores.iter().sum::<f64>() / scores.len() as f64;
        trace!("polarity {:.4} from {} words: {:?}", polarity, scores.len(), text);
        polarity.clamp(-1.0, 1.0)
    }
}

/// Coarse reading of a polarity value, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLevel {
    Negative,
    Neutral,
    Positive,
}

impl SentimentLevel {
    pub fn from_score(score: f64) -> Self {
        if score < -0.05 {
            SentimentLevel::Negative
        } else if score > 0.05 {
            SentimentLevel::Positive
        } else {
            SentimentLevel::Neutral
        }
    }
}

impl fmt::Display for SentimentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SentimentLevel::Negative => "negative",
            SentimentLevel::Neutral => "neutral",
            SentimentLevel::Positive => "positive",
        };
        f.write_str(label)
    }
}

/// Averages per-interaction polarity over a user's log.
#[derive(Debug, Clone, Default)]
pub struct SentimentScorer<A = LexiconAnalyzer> {
    analyzer: A,
}

impl<A: PolarityAnalyzer> SentimentScorer<A> {
    pub fn new(analyzer: A) -> Self {
        Self { analyzer }
    }

    /// Mean polarity of the user's interactions.
    ///
    /// An empty log is `NoInteractionData`, which is not the same as neutral.
    #[instrument(level = "debug", skip(self, user), fields(user = %user.name))]
    pub fn score_user(&self, user: &User) -> DomainResult<f64> {
        self.score_texts(user.interactions())
            .ok_or_else(|| DomainError::NoInteractionData(user.name.clone()))
    }

    pub fn score_texts(&self, texts: &[String]) -> Option<f64> {
        if texts.is_empty() {
            return None;
        }
        let total: f64 = texts
            .iter()
            .map(|text| self.analyzer.analyze_polarity(text))
            .sum();
        Some(total / texts.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl PolarityAnalyzer for Fixed {
        fn analyze_polarity(&self, _text: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn given_opposing_texts_when_analyzed_then_signs_differ() {
        let lexicon = LexiconAnalyzer::new();
        assert!(lexicon.analyze_polarity("I love this") > 0.0);
        assert!(lexicon.analyze_polarity("I hate that") < 0.0);
        assert_eq!(lexicon.analyze_polarity("the sky is blue"), 0.0);
    }

    #[test]
    fn given_negation_when_analyzed_then_sign_flips() {
        let lexicon = LexiconAnalyzer::new();
        assert!(lexicon.analyze_polarity("this is not good") < 0.0);
        assert!(lexicon.analyze_polarity("not bad at all") > 0.0);
    }

    #[test]
    fn given_skip_word_after_negation_then_negation_still_binds() {
        let lexicon = LexiconAnalyzer::new();
        assert!(lexicon.is_skip_word("The"));
        assert!(!lexicon.is_skip_word("party"));
        assert!(lexicon.analyze_polarity("not the best") < 0.0);
        assert!(lexicon.analyze_polarity("not party good") > 0.0);
        assert_eq!(lexicon.analyze_polarity("very the good"), lexicon.analyze_polarity("very good"));
    }

    #[test]
    fn given_intensifier_when_analyzed_then_magnitude_grows_within_bounds() {
        let lexicon = LexiconAnalyzer::new();
        let plain = lexicon.analyze_polarity("good");
        let strong = lexicon.analyze_polarity("very good");
        assert!(strong > plain);
        assert_eq!(lexicon.analyze_polarity("extremely excellent"), 1.0);
    }

    #[test]
    fn given_same_text_when_analyzed_twice_then_identical() {
        let lexicon = LexiconAnalyzer::new();
        let text = "Great party, but the music was really annoying!";
        assert_eq!(lexicon.analyze_polarity(text), lexicon.analyze_polarity(text));
    }

    #[test]
    fn given_custom_words_then_they_override_and_clamp() {
        let lexicon = LexiconAnalyzer::new().with_words([("Saudade", -3.0), ("love", 0.9)]);
        assert_eq!(lexicon.get_score("saudade"), Some(-1.0));
        assert_eq!(lexicon.get_score("love"), Some(0.9));
    }

    #[test]
    fn given_empty_log_when_scoring_then_no_data() {
        let scorer = SentimentScorer::<LexiconAnalyzer>::default();
        let user = User::new("Ana");
        assert_eq!(
            scorer.score_user(&user),
            Err(DomainError::NoInteractionData("Ana".to_string()))
        );
    }

    #[test]
    fn given_log_when_scoring_then_returns_mean() {
        let scorer = SentimentScorer::new(Fixed(0.25));
        let mut user = User::new("Ana");
        user.add_interaction("a");
        user.add_interaction("b");
        assert_eq!(scorer.score_user(&user), Ok(0.25));
    }

    #[test]
    fn given_scores_then_levels_are_classified() {
        assert_eq!(SentimentLevel::from_score(-0.5), SentimentLevel::Negative);
        assert_eq!(SentimentLevel::from_score(0.0), SentimentLevel::Neutral);
        assert_eq!(SentimentLevel::from_score(0.4).to_string(), "positive");
    }
}
