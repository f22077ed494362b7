//! Mention Filter
//!
//! Turns raw social posts into structured mentions: keyword match,
//! author follower gate, then syntactic extraction of a token address.
//! Stateless per call.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default minimum follower count for an author to be considered
pub const DEFAULT_MIN_FOLLOWER_COUNT: u64 = 100;

/// Base58 run of 32-44 characters (Solana address shape)
const TOKEN_ADDRESS_PATTERN: &str = r"\b[1-9A-HJ-NP-Za-km-z]{32,44}\b";

#[derive(Debug, Error)]
pub enum MentionFilterError {
    #[error("Keyword set cannot be empty")]
    NoKeywords,

    #[error("Invalid token pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A post as delivered by the social stream, with the author expansion joined in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialPost {
    pub post_id: String,
    pub text: String,
    pub author_id: String,
    #[serde(default)]
    pub author_username: Option<String>,
    pub author_follower_count: u64,
    pub created_at: DateTime<Utc>,
}

/// A qualifying post. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mention {
    pub author_id: String,
    pub author_follower_count: u64,
    pub text: String,
    pub candidate_token_id: Option<String>,
    /// Always non-empty
    pub matched_keywords: BTreeSet<String>,
    pub observed_at: DateTime<Utc>,
}

/// Why a post did not become a mention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoKeywordMatch,
    BelowFollowerFloor,
}

#[derive(Debug, Clone)]
pub struct MentionFilterConfig {
    pub keywords: Vec<String>,
    pub min_follower_count: u64,
}

impl Default for MentionFilterConfig {
    fn default() -> Self {
        Self {
            keywords: vec!["memecoin".to_string()],
            min_follower_count: DEFAULT_MIN_FOLLOWER_COUNT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MentionFilter {
    /// (original, lowercased) keyword pairs
    keywords: Vec<(String, String)>,
    min_follower_count: u64,
    token_pattern: Regex,
}

impl MentionFilter {
    pub fn new(config: MentionFilterConfig) -> Result<Self, MentionFilterError> {
        let keywords: Vec<(String, String)> = config
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(|k| {
                let lower = k.to_lowercase();
                (k, lower)
            })
            .collect();

        if keywords.is_empty() {
            return Err(MentionFilterError::NoKeywords);
        }

        Ok(Self {
            keywords,
            min_follower_count: config.min_follower_count,
            token_pattern: Regex::new(TOKEN_ADDRESS_PATTERN)?,
        })
    }

    pub fn keywords(&self) -> Vec<String> {
        self.keywords.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn min_follower_count(&self) -> u64 {
        self.min_follower_count
    }

    /// Returns the mention for a qualifying post, `None` otherwise
    pub fn process(&self, post: &SocialPost) -> Option<Mention> {
        match self.classify(post) {
            Ok(mention) => Some(mention),
            Err(reason) => {
                tracing::trace!(post = %post.post_id, ?reason, "post discarded");
                None
            }
        }
    }

    /// Same as `process` but reports the rejection reason
    pub fn classify(&self, post: &SocialPost) -> Result<Mention, RejectReason> {
        let matched = self.match_keywords(&post.text);
        if matched.is_empty() {
            return Err(RejectReason::NoKeywordMatch);
        }

        if post.author_follower_count < self.min_follower_count {
            return Err(RejectReason::BelowFollowerFloor);
        }

        Ok(Mention {
            author_id: post.author_id.clone(),
            author_follower_count: post.author_follower_count,
            text: post.text.clone(),
            candidate_token_id: self.extract_token_id(&post.text),
            matched_keywords: matched,
            observed_at: post.created_at,
        })
    }

    /// Case-insensitive keyword match
    pub fn match_keywords(&self, text: &str) -> BTreeSet<String> {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|(_, lower)| haystack.contains(lower.as_str()))
            .map(|(original, _)| original.clone())
            .collect()
    }

    /// First substring shaped like a chain address. Syntactic only.
    pub fn extract_token_id(&self, text: &str) -> Option<String> {
        self.token_pattern
            .find(text)
            .map(|m| m.as_str().to_string())
    }
}
