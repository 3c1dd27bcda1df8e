//! Topic keyword tables.
//!
//! Category and title are matched word by word, case-insensitively, so
//! "bill" does not fire on "Billboard" and "fed" does not fire on "Federer".
//! A trailing "s"/"es" is accepted on the last word of a keyword, so "vote"
//! matches "votes". Multi-word keywords must appear as consecutive words.
//!
//! Tickers carry no word boundaries ("KXFEDDECISION-26DEC"), so the series
//! code is matched by prefix instead, and the longest matching keyword wins.

use crate::types::MarketSnapshot;

/// Macro and political topics that research can say something useful about.
pub const CORE_TOPICS: &[&str] = &[
    "fed",
    "federal reserve",
    "interest rate",
    "fomc",
    "inflation",
    "cpi",
    "pce",
    "unemployment",
    "jobs report",
    "nonfarm",
    "gdp",
    "recession",
    "election",
    "senate",
    "congress",
    "house",
    "vote",
    "bill",
    "president",
    "executive order",
    "trump",
    "biden",
    "treasury",
    "tax",
    "tariff",
    "trade deal",
    "supreme court",
    "scotus",
];

/// Topics with some public information but weaker research leverage.
pub const RELATED_TOPICS: &[&str] = &[
    "crypto",
    "bitcoin",
    "ethereum",
    "s&p",
    "nasdaq",
    "stock",
    "oil",
    "gas price",
    "mortgage",
    "housing",
    "earnings",
    "governor",
    "mayor",
    "court",
    "ukraine",
    "china",
    "nato",
];

/// Sports and entertainment: outcomes driven by noise, not research.
pub const NOISE_TOPICS: &[&str] = &[
    "nfl",
    "nba",
    "mlb",
    "nhl",
    "ufc",
    "super bowl",
    "world series",
    "championship",
    "playoff",
    "sports",
    "oscar",
    "grammy",
    "emmy",
    "box office",
    "billboard",
    "entertainment",
    "celebrity",
];

/// Which keyword table a market falls into, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TopicMatch {
    Core,
    Related,
    Noise,
    Unmatched,
}

/// Classify a market against the keyword tables.
pub fn classify_topic(market: &MarketSnapshot) -> TopicMatch {
    let mut words = tokenize(&market.category);
    words.extend(tokenize(&market.title));
    let hit = |table: &[&str]| table.iter().any(|kw| contains_keyword(&words, kw));

    let from_text = if hit(CORE_TOPICS) {
        TopicMatch::Core
    } else if hit(RELATED_TOPICS) {
        TopicMatch::Related
    } else if hit(NOISE_TOPICS) {
        TopicMatch::Noise
    } else {
        TopicMatch::Unmatched
    };

    from_text.min(ticker_topic(&market.ticker))
}

/// Lowercased words. `&` stays inside a word so "S&P" survives.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '&'))
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

fn contains_keyword(words: &[String], keyword: &str) -> bool {
    let parts: Vec<&str> = keyword.split_whitespace().collect();
    let Some((last, init)) = parts.split_last() else {
        return false;
    };
    words.windows(parts.len()).any(|window| {
        let Some((tail, head)) = window.split_last() else {
            return false;
        };
        head.iter().zip(init).all(|(w, p)| w.as_str() == *p) && plural_of(tail, last)
    })
}

fn plural_of(word: &str, stem: &str) -> bool {
    match word.strip_prefix(stem) {
        Some(rest) => rest.is_empty() || rest == "s" || rest == "es",
        None => false,
    }
}

/// Topic from the ticker's series code, e.g. "fomc" in "KXFOMC-26DEC".
fn ticker_topic(ticker: &str) -> TopicMatch {
    let lower = ticker.to_lowercase();
    let head = lower.split('-').next().unwrap_or_default();
    let series = head.strip_prefix("kx").unwrap_or(head);

    let tables = [
        (CORE_TOPICS, TopicMatch::Core),
        (RELATED_TOPICS, TopicMatch::Related),
        (NOISE_TOPICS, TopicMatch::Noise),
    ];
    tables
        .iter()
        .flat_map(|(table, topic)| table.iter().map(move |kw| (kw.replace(' ', ""), *topic)))
        .filter(|(kw, _)| series.starts_with(kw.as_str()))
        .max_by_key(|(kw, _)| kw.len())
        .map(|(_, topic)| topic)
        .unwrap_or(TopicMatch::Unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn market(category: &str, ticker: &str, title: &str) -> MarketSnapshot {
        MarketSnapshot {
            ticker: ticker.into(),
            title: title.into(),
            category: category.into(),
            ..MarketSnapshot::sample()
        }
    }

    #[test]
    fn test_core_from_title() {
        let m = market("", "X-1", "Will CPI come in above 3%?");
        assert_eq!(classify_topic(&m), TopicMatch::Core);
    }

    #[test]
    fn test_core_from_category_case_insensitive() {
        let m = market("ELECTIONS", "X-1", "Who wins?");
        assert_eq!(classify_topic(&m), TopicMatch::Core);
    }

    #[test]
    fn test_core_from_ticker() {
        let m = market("", "KXFOMC-26DEC", "Cut in December?");
        assert_eq!(classify_topic(&m), TopicMatch::Core);
    }

    #[test]
    fn test_core_beats_noise() {
        let m = market("Sports", "X-1", "Will the president attend the Super Bowl?");
        assert_eq!(classify_topic(&m), TopicMatch::Core);
    }

    #[test]
    fn test_related_and_noise() {
        assert_eq!(
            classify_topic(&market("Crypto", "BTC-1", "Bitcoin above 100k?")),
            TopicMatch::Related
        );
        assert_eq!(
            classify_topic(&market("Sports", "NBA-1", "Lakers win tonight?")),
            TopicMatch::Noise
        );
    }

    #[test]
    fn test_unmatched() {
        let m = market("", "WX-1", "Will it snow in Denver on Friday?");
        assert_eq!(classify_topic(&m), TopicMatch::Unmatched);
    }

    #[test]
    fn test_billboard_is_noise_not_core() {
        let m = market("Entertainment", "KXBILLBOARD-26W12", "Billboard Hot 100 number one this week?");
        assert_eq!(classify_topic(&m), TopicMatch::Noise);
    }

    #[test]
    fn test_whole_words_only() {
        let federer = market("", "X-1", "Will Federer play an exhibition?");
        assert_eq!(classify_topic(&federer), TopicMatch::Unmatched);

        let conflict = market("World", "X-1", "Will the border conflict escalate?");
        assert_eq!(classify_topic(&conflict), TopicMatch::Unmatched);
    }

    #[test]
    fn test_plurals_and_phrases() {
        let m = market("", "X-1", "New tariffs announced before midterm elections?");
        assert_eq!(classify_topic(&m), TopicMatch::Core);

        let m = market("", "X-1", "Average gas prices above $4?");
        assert_eq!(classify_topic(&m), TopicMatch::Related);

        let m = market("", "X-1", "S&P 500 closes green?");
        assert_eq!(classify_topic(&m), TopicMatch::Related);
    }

    #[test]
    fn test_ticker_series_prefix() {
        assert_eq!(classify_topic(&market("", "KXFEDDECISION-26DEC-H0", "?")), TopicMatch::Core);
        assert_eq!(classify_topic(&market("", "KXNBAGAME-26OCT", "?")), TopicMatch::Noise);
        // Longest prefix wins: "billboard" over "bill".
        assert_eq!(classify_topic(&market("", "KXBILLBOARD-1", "?")), TopicMatch::Noise);
    }
}
