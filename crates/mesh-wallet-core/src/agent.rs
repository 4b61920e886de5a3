//! Agent catalog for mesh-wallet.
//!
//! The marketplace sells invocations of externally-hosted agent workflows.
//! Each catalog entry carries the per-invocation price and the webhook path
//! the runner exposes for it. The catalog ships with built-in defaults and
//! can be replaced wholesale from a JSON file at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::AgentSlug;

/// A single marketplace agent listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentListing {
    /// Routing slug, unique within the catalog.
    pub slug: AgentSlug,

    /// Display name.
    pub name: String,

    /// Short description shown in the marketplace.
    pub description: String,

    /// Price per invocation in cents.
    pub price_cents: i64,

    /// Webhook path on the runner, joined to the configured runner base URL.
    pub webhook_path: String,
}

/// The agent catalog: all invocable listings keyed by slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCatalog {
    /// Listings by slug.
    agents: HashMap<AgentSlug, AgentListing>,
}

impl Default for AgentCatalog {
    fn default() -> Self {
        let defaults = [
            AgentListing {
                slug: AgentSlug::new("lead-enricher").expect("valid default slug"),
                name: "Lead Enricher".into(),
                description: "Enriches a company domain with firmographic data".into(),
                price_cents: 150, // $1.50 per run
                webhook_path: "/hooks/lead-enricher".into(),
            },
            AgentListing {
                slug: AgentSlug::new("invoice-parser").expect("valid default slug"),
                name: "Invoice Parser".into(),
                description: "Extracts line items and totals from invoice PDFs".into(),
                price_cents: 75, // $0.75 per run
                webhook_path: "/hooks/invoice-parser".into(),
            },
            AgentListing {
                slug: AgentSlug::new("outreach-writer").expect("valid default slug"),
                name: "Outreach Writer".into(),
                description: "Drafts a personalized outreach email from a lead profile".into(),
                price_cents: 50, // $0.50 per run
                webhook_path: "/hooks/outreach-writer".into(),
            },
        ];

        Self {
            agents: defaults
                .into_iter()
                .map(|listing| (listing.slug.clone(), listing))
                .collect(),
        }
    }
}

impl AgentCatalog {
    /// Build a catalog from an explicit list of listings.
    ///
    /// Later entries with a duplicate slug replace earlier ones.
    #[must_use]
    pub fn from_listings(listings: Vec<AgentListing>) -> Self {
        Self {
            agents: listings
                .into_iter()
                .map(|listing| (listing.slug.clone(), listing))
                .collect(),
        }
    }

    /// Look up a listing by slug.
    #[must_use]
    pub fn get(&self, slug: &AgentSlug) -> Option<&AgentListing> {
        self.agents.get(slug)
    }

    /// All listings, sorted by slug for stable API output.
    #[must_use]
    pub fn listings(&self) -> Vec<&AgentListing> {
        let mut listings: Vec<_> = self.agents.values().collect();
        listings.sort_by(|a, b| a.slug.as_str().cmp(b.slug.as_str()));
        listings
    }

    /// Number of listings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
