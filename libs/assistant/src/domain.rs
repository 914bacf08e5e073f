//! The platform's three specialised assistants

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::conversation::Conversation;

/// Record domain an assistant specialises in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssistantDomain {
    CyberSecurity,
    Datasets,
    Tickets,
}

impl AssistantDomain {
    pub const ALL: [AssistantDomain; 3] = [
        AssistantDomain::CyberSecurity,
        AssistantDomain::Datasets,
        AssistantDomain::Tickets,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            AssistantDomain::CyberSecurity => "cyber-security",
            AssistantDomain::Datasets => "datasets",
            AssistantDomain::Tickets => "tickets",
        }
    }

    /// Default system prompt for this domain
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AssistantDomain::CyberSecurity => {
                "You are a professional cybersecurity expert assistant."
            }
            AssistantDomain::Datasets => "You are a data analysis expert assistant.",
            AssistantDomain::Tickets => {
                "You are an IT operations and support ticket expert assistant."
            }
        }
    }

    /// Fresh conversation seeded with this domain's system prompt
    pub fn conversation(&self) -> Conversation {
        Conversation::new(self.system_prompt())
    }
}

impl fmt::Display for AssistantDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for AssistantDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssistantDomain::ALL
            .into_iter()
            .find(|domain| domain.slug() == s)
            .ok_or_else(|| format!("Unknown assistant domain: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_parses_back() {
        for domain in AssistantDomain::ALL {
            assert_eq!(domain.slug().parse::<AssistantDomain>().unwrap(), domain);
        }
        assert!("weather".parse::<AssistantDomain>().is_err());
    }

    #[test]
    fn test_conversation_starts_with_domain_prompt() {
        let conversation = AssistantDomain::Tickets.conversation();
        assert_eq!(conversation.history().len(), 1);
        assert!(conversation.system_prompt().contains("support ticket"));
    }
}
