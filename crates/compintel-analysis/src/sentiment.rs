//! Word-list sentiment scorer for competitor post text.

use serde::Serialize;

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "amazing",
    "awesome",
    "fantastic",
    "love",
    "best",
    "success",
    "successful",
    "win",
    "growth",
    "launch",
    "innovative",
    "happy",
    "excited",
    "proud",
    "record",
    "improved",
    "thrilled",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "awful",
    "worst",
    "hate",
    "failure",
    "failed",
    "loss",
    "problem",
    "issue",
    "outage",
    "decline",
    "layoffs",
    "lawsuit",
    "recall",
    "delay",
    "disappointed",
    "broken",
    "bug",
    "down",
];

const WORD_WEIGHT: f32 = 0.2;
const LABEL_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sentiment {
    pub score: f32,
    pub label: SentimentLabel,
}

/// Scores text at ±0.2 per matching word, clamped to `[-1.0, 1.0]`.
#[must_use]
pub fn sentiment_score(text: &str) -> f32 {
    let mut score = 0.0_f32;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        if POSITIVE_WORDS.contains(&w.as_str()) {
            score += WORD_WEIGHT;
        } else if NEGATIVE_WORDS.contains(&w.as_str()) {
            score -= WORD_WEIGHT;
        }
    }
    score.clamp(-1.0, 1.0)
}

#[must_use]
pub fn label_for(score: f32) -> SentimentLabel {
    if score > LABEL_THRESHOLD {
        SentimentLabel::Positive
    } else if score < -LABEL_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

#[must_use]
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let score = sentiment_score(text);
    Sentiment {
        score,
        label: label_for(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn great_success_is_positive() {
        let s = analyze_sentiment("great success");
        assert!((s.score - 0.4).abs() < 1e-6, "score was {}", s.score);
        assert_eq!(s.label, SentimentLabel::Positive);
    }

    #[test]
    fn failure_and_loss_is_negative() {
        let s = analyze_sentiment("failure and loss");
        assert!((s.score + 0.4).abs() < 1e-6, "score was {}", s.score);
        assert_eq!(s.label, SentimentLabel::Negative);
    }

    #[test]
    fn plain_statement_is_neutral() {
        let s = analyze_sentiment("the meeting is at noon");
        assert_eq!(s.score, 0.0);
        assert_eq!(s.label, SentimentLabel::Neutral);
    }

    #[test]
    fn single_hit_crosses_threshold() {
        assert_eq!(analyze_sentiment("good").label, SentimentLabel::Positive);
    }

    #[test]
    fn score_is_clamped() {
        let text = "great great great great great great great";
        assert_eq!(sentiment_score(text), 1.0);
        let text = "bad bad bad bad bad bad bad bad";
        assert_eq!(sentiment_score(text), -1.0);
    }

    #[test]
    fn punctuation_is_stripped() {
        assert!(sentiment_score("Amazing!!") > 0.0);
        assert!(sentiment_score("(outage)") < 0.0);
    }
}
