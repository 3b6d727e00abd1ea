/// Magic word matching
///
/// Scores how well one magic word matches what the user typed. No fuzzy
/// scores here, just seven tiers that sort the obvious hits above the clever
/// ones.

use crate::store::models::MagicWord;
use tracing::trace;

/// Match quality, worst to best so `Ord` sorts the way you'd expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    NoMatch,
    /// Every fragment char shows up in order, gaps allowed
    Subsequence,
    /// Fragment is inside the acronym ("ttotc" in "The Tail of Two Cities")
    Acronym,
    Contains,
    /// Fragment starts a word after a space
    WordStartsWith,
    StartsWith,
    Equal,
}

impl MatchTier {
    pub fn is_match(self) -> bool {
        self != MatchTier::NoMatch
    }
}

/// Best tier across a wish's magic words, and which word produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestMatch {
    pub tier: MatchTier,
    pub index: Option<usize>,
}

/// Magic word matcher
pub struct StringMatcher;

impl StringMatcher {
    /// Rank one magic word against a fragment. Case-insensitive.
    pub fn rank(candidate: &str, fragment: &str) -> MatchTier {
        let candidate = candidate.to_lowercase();
        let fragment = fragment.to_lowercase();

        // too long to ever match
        let fragment_len = fragment.chars().count();
        if fragment_len > candidate.chars().count() {
            return MatchTier::NoMatch;
        }

        if candidate == fragment {
            return MatchTier::Equal;
        }

        if candidate.starts_with(&fragment) {
            return MatchTier::StartsWith;
        }

        if candidate.contains(&format!(" {}", fragment)) {
            return MatchTier::WordStartsWith;
        }

        if candidate.contains(&fragment) {
            return MatchTier::Contains;
        }

        // A single char that isn't in there at all can't match anything below
        if fragment_len == 1 {
            return MatchTier::NoMatch;
        }

        if Self::acronym(&candidate).contains(&fragment) {
            return MatchTier::Acronym;
        }

        if Self::is_subsequence(&candidate, &fragment) {
            MatchTier::Subsequence
        } else {
            MatchTier::NoMatch
        }
    }

    /// Best tier over all magic words. Stops early on an exact match.
    pub fn best_match(magic_words: &[MagicWord], fragment: &str) -> BestMatch {
        let mut best = BestMatch {
            tier: MatchTier::NoMatch,
            index: None,
        };

        for (index, word) in magic_words.iter().enumerate() {
            let tier = Self::rank(word.as_str(), fragment);
            if tier > best.tier {
                best = BestMatch {
                    tier,
                    index: Some(index),
                };
            }
            if best.tier == MatchTier::Equal {
                break;
            }
        }

        trace!(fragment, tier = ?best.tier, index = ?best.index, "best magic word match");
        best
    }

    /// First letter of every space- and hyphen-separated word
    ///
    /// "i love candy" -> "ilc", "jack-in-the-box" -> "jitb"
    pub fn acronym(text: &str) -> String {
        text.split(char::is_whitespace)
            .flat_map(|word| word.split('-'))
            .filter_map(|piece| piece.chars().next())
            .collect()
    }

    /// Greedy left-to-right scan: each fragment char must appear after the
    /// previous one
    fn is_subsequence(candidate: &str, fragment: &str) -> bool {
        let mut remaining = candidate.chars();
        fragment
            .chars()
            .all(|wanted| remaining.by_ref().any(|c| c == wanted))
    }
}
