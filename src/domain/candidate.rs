use std::time::Instant;

use super::mention_filter::Mention;

/// A token surfaced by a social mention, pending evaluation. Identity is the token id.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub token_id: String,
    pub first_seen_at: Instant,
    pub originating_mention: Mention,
}

impl Candidate {
    /// Build a candidate from a mention, if it carries a token id
    pub fn from_mention(mention: Mention) -> Option<Self> {
        let token_id = mention.candidate_token_id.clone()?;
        Some(Self {
            token_id,
            first_seen_at: Instant::now(),
            originating_mention: mention,
        })
    }

    pub fn author_id(&self) -> &str {
        &self.originating_mention.author_id
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.token_id == other.token_id
    }
}

impl Eq for Candidate {}
