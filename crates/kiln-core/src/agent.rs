//! The fixed set of logical agents in the listing pipeline.
//!
//! Each agent has a display name (what appears in the `agentName` field of a
//! trace entry) and a step slug (used to build coordinator step ids). The
//! Orchestrator is the lifecycle pseudo-agent: it brackets the pipeline with
//! `started`/`completed`/`failure` entries but is excluded from the
//! `completedAgents`/`errors` rollup so pipeline outcomes are not
//! double-counted.

use serde::{Deserialize, Serialize};

/// Number of metered pipeline stages (everything except the Orchestrator).
pub const PIPELINE_TOTAL_AGENTS: i64 = 4;

/// A logical stage of the listing pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentName {
    /// Lifecycle pseudo-agent bracketing the pipeline.
    Orchestrator,
    /// Voice transcript validation (local, no external call).
    Voice,
    /// Image enhancement service.
    ImageEnhancer,
    /// Marketing caption generation service.
    MarketingNudge,
    /// Inventory confirmation service.
    Inventory,
}

impl AgentName {
    /// Display name as it appears in trace entries.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Orchestrator => "Orchestrator",
            Self::Voice => "Voice Agent",
            Self::ImageEnhancer => "Image Enhancer Agent",
            Self::MarketingNudge => "Marketing Nudge Agent",
            Self::Inventory => "Inventory Agent",
        }
    }

    /// Slug used when building coordinator-generated step ids.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Orchestrator => "orchestrator",
            Self::Voice => "voice-agent",
            Self::ImageEnhancer => "image-enhancer",
            Self::MarketingNudge => "marketing-nudge",
            Self::Inventory => "inventory",
        }
    }

    /// Whether this agent's terminal entries count toward session metrics.
    pub fn is_metered(self) -> bool {
        !matches!(self, Self::Orchestrator)
    }
}

impl std::fmt::Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_match_trace_contract() {
        assert_eq!(AgentName::Orchestrator.as_str(), "Orchestrator");
        assert_eq!(AgentName::Voice.as_str(), "Voice Agent");
        assert_eq!(AgentName::ImageEnhancer.as_str(), "Image Enhancer Agent");
        assert_eq!(AgentName::MarketingNudge.as_str(), "Marketing Nudge Agent");
        assert_eq!(AgentName::Inventory.as_str(), "Inventory Agent");
    }

    #[test]
    fn slugs_are_lowercase_kebab() {
        for agent in [
            AgentName::Orchestrator,
            AgentName::Voice,
            AgentName::ImageEnhancer,
            AgentName::MarketingNudge,
            AgentName::Inventory,
        ] {
            let slug = agent.slug();
            assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
        }
    }

    #[test]
    fn orchestrator_is_not_metered() {
        assert!(!AgentName::Orchestrator.is_metered());
    }

    #[test]
    fn pipeline_stages_are_metered() {
        assert!(AgentName::Voice.is_metered());
        assert!(AgentName::ImageEnhancer.is_metered());
        assert!(AgentName::MarketingNudge.is_metered());
        assert!(AgentName::Inventory.is_metered());
    }

    #[test]
    fn metered_count_matches_total() {
        let metered = [
            AgentName::Orchestrator,
            AgentName::Voice,
            AgentName::ImageEnhancer,
            AgentName::MarketingNudge,
            AgentName::Inventory,
        ]
        .iter()
        .filter(|a| a.is_metered())
        .count();
        assert_eq!(metered as i64, PIPELINE_TOTAL_AGENTS);
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(format!("{}", AgentName::Voice), "Voice Agent");
    }
}
