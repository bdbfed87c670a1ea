//! Keyword topic classifier
//!
//! Maps a user turn onto a canned response by walking an ordered rule
//! table. The first rule whose predicate holds wins; nothing is scored.
//! When no rule matches the catch-all `default` response is used and the
//! topic memory is cleared.


use crate::responses::{ResponseTable, TableError, DEFAULT_KEY};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic label remembered between turns to resolve follow-up questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicTag {
    Briefing,
    Tech,
    Business,
    Health,
    Podcast,
}

impl TopicTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TopicTag::Briefing => "briefing",
            TopicTag::Tech => "tech",
            TopicTag::Business => "business",
            TopicTag::Health => "health",
            TopicTag::Podcast => "podcast",
        }
    }
}

impl fmt::Display for TopicTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition a rule checks against the lowercased user text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Text contains at least one keyword
    ContainsAny(Vec<String>),
    /// Text contains at least one keyword and the previous turn left `topic` in memory
    FollowUp { keywords: Vec<String>, topic: TopicTag },
}

impl Predicate {
    pub fn contains_any<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Self {
        Predicate::ContainsAny(normalize(keywords))
    }

    pub fn follow_up<'a>(keywords: impl IntoIterator<Item = &'a str>, topic: TopicTag) -> Self {
        Predicate::FollowUp {
            keywords: normalize(keywords),
            topic,
        }
    }

    /// `text` must already be lowercased
    fn matches(&self, text: &str, last_topic: Option<TopicTag>) -> bool {
        match self {
            Predicate::ContainsAny(keywords) => keywords.iter().any(|k| text.contains(k.as_str())),
            Predicate::FollowUp { keywords, topic } => {
                last_topic == Some(*topic) && keywords.iter().any(|k| text.contains(k.as_str()))
            }
        }
    }
}

fn normalize<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    keywords.into_iter().map(str::to_lowercase).collect()
}

/// One row of the priority table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub predicate: Predicate,
    /// Topic remembered after this rule answers; `None` clears memory
    pub topic: Option<TopicTag>,
    pub response_key: String,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        predicate: Predicate,
        topic: Option<TopicTag>,
        response_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            predicate,
            topic,
            response_key: response_key.into(),
        }
    }
}

/// Outcome of classifying one user turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    /// Matched rule, `None` for the fallback
    pub rule: Option<&'a Rule>,
    pub response_key: &'a str,
    pub topic: Option<TopicTag>,
}

impl Classification<'_> {
    pub fn rule_name(&self) -> &str {
        self.rule.map_or("fallback", |rule| rule.name.as_str())
    }

    #[cfg(test)]
    pub fn is_fallback(&self) -> bool {
        self.rule.is_none()
    }
}

/// Ordered rule list; position is priority
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Rules of the Global News Network demo, highest priority first
    pub fn builtin() -> Self {
        Self::new(vec![
            Rule::new(
                "briefing",
                Predicate::contains_any(["briefing"]),
                Some(TopicTag::Briefing),
                "briefing",
            ),
            Rule::new(
                "innovate_summit",
                Predicate::contains_any(["innovate", "summit"]),
                Some(TopicTag::Tech),
                "innovate_summit",
            ),
            Rule::new(
                "keynote_followup",
                Predicate::follow_up(["keynote", "speaker"], TopicTag::Tech),
                Some(TopicTag::Tech),
                "keynote_speaker",
            ),
            Rule::new(
                "supply_chain",
                Predicate::contains_any(["supply chain", "logistics"]),
                Some(TopicTag::Business),
                "supply_chain",
            ),
            Rule::new(
                "health",
                Predicate::contains_any(["health", "vaccine"]),
                Some(TopicTag::Health),
                "health",
            ),
            Rule::new(
                "podcast",
                Predicate::contains_any(["podcast"]),
                Some(TopicTag::Podcast),
                "podcast",
            ),
        ])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Check every rule targets an entry that exists in `responses`.
    pub fn validate(&self, responses: &ResponseTable) -> Result<(), TableError> {
        match self
            .rules
            .iter()
            .find(|rule| !responses.contains(&rule.response_key))
        {
            Some(rule) => Err(TableError::UnknownResponse {
                rule: rule.name.clone(),
                key: rule.response_key.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Classify `text` given the topic left by the previous turn.
    pub fn classify(&self, text: &str, last_topic: Option<TopicTag>) -> Classification<'_> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(&lowered, last_topic))
            .map_or(
                Classification {
                    rule: None,
                    response_key: DEFAULT_KEY,
                    topic: None,
                },
                |rule| Classification {
                    rule: Some(rule),
                    response_key: &rule.response_key,
                    topic: rule.topic,
                },
            )
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}
