//! Built-in Global News Network catalog

use super::{ResponseEntry, DEFAULT_KEY};

const INNOVATE_SUMMIT_ARTICLE: &str = "Innovate Summit 2025 Highlights AI Breakthroughs";
const SUPPLY_CHAIN_ARTICLE: &str = "AI Revolutionizes Global Supply Chains, Report Finds";
const VACCINE_ARTICLE: &str = "Global Vaccine Alliance Secures New Funding";
const PODCAST_EPISODE: &str = "Podcast: Tech Forward Weekly - The AI Revolution";

/// Opening line the shell shows before the first turn. Not part of the transcript.
pub const GREETING: &str = "Welcome! I'm the AI assistant for the 'Global News Network'. \
    I can answer questions about our latest international news coverage. \
    Try one of the prompts below or ask your own!";

/// A canned prompt the shell offers as a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestedPrompt {
    pub label: &'static str,
    pub prompt: &'static str,
}

pub const SUGGESTED_PROMPTS: [SuggestedPrompt; 3] = [
    SuggestedPrompt {
        label: "Summarize",
        prompt: "Can you summarize the report on AI in supply chains?",
    },
    SuggestedPrompt {
        label: "Deep Q&A",
        prompt: "What happened at the Innovate Summit?",
    },
    SuggestedPrompt {
        label: "Personalize",
        prompt: "Create a briefing for me on AI and healthcare.",
    },
];

pub(super) fn default_entry() -> ResponseEntry {
    ResponseEntry::new(
        DEFAULT_KEY,
        "I can answer questions about the latest global news from the Global News Network. \
         You can ask me about technology, international business, or global health initiatives.",
        Vec::<String>::new(),
    )
}

pub fn builtin_entries() -> Vec<ResponseEntry> {
    vec![
        ResponseEntry::new(
            "innovate_summit",
            "At the Innovate Summit 2025 in Geneva, the keynote by Dr. Aris Thorne focused on \
             generative AI's role in scientific research. A major highlight was the announcement \
             of 'Project Chimera,' a new open-source AI model for drug discovery.",
            [INNOVATE_SUMMIT_ARTICLE],
        ),
        ResponseEntry::new(
            "keynote_speaker",
            "The keynote speaker at the Innovate Summit was Dr. Aris Thorne, a leading researcher \
             in computational biology.",
            [INNOVATE_SUMMIT_ARTICLE],
        ),
        ResponseEntry::new(
            "supply_chain",
            "A new report discussed this week finds that AI is significantly impacting global \
             supply chains by improving demand forecasting and optimizing logistics, cutting \
             costs by up to 15% for early adopters.",
            [SUPPLY_CHAIN_ARTICLE],
        ),
        // No rule routes here yet.
        ResponseEntry::new(
            "ai_impact",
            "AI is having a major impact across industries. A recent report highlighted its role \
             in optimizing global supply chains, while the Innovate Summit 2025 showcased new AI \
             models for accelerating scientific research and drug discovery.",
            [SUPPLY_CHAIN_ARTICLE, INNOVATE_SUMMIT_ARTICLE],
        ),
        ResponseEntry::new(
            "health",
            "In global health news, the Global Vaccine Alliance announced it has secured an \
             additional $5 billion in funding to support equitable vaccine distribution in \
             developing nations, with a focus on new mRNA-based technologies.",
            [VACCINE_ARTICLE],
        ),
        ResponseEntry::new(
            "podcast",
            "Yes, our 'Tech Forward Weekly' podcast featured a deep dive into the announcements \
             from the Innovate Summit, including an interview with a panelist about the \
             implications of 'Project Chimera'.",
            [PODCAST_EPISODE],
        ),
        ResponseEntry::new(
            "briefing",
            "Here is your personalized briefing on AI and healthcare: The Innovate Summit in \
             Geneva featured the announcement of 'Project Chimera,' an AI model for drug \
             discovery. Separately, the Global Vaccine Alliance has secured $5 billion in new \
             funding, partly to support new mRNA vaccine technologies.",
            [INNOVATE_SUMMIT_ARTICLE, VACCINE_ARTICLE],
        ),
        default_entry(),
    ]
}
