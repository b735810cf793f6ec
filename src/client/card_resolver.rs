//! Agent card discovery and resolution.
//!
//! Implements the well-known URI convention for discovering A2A agent cards
//! and picks the JSON-RPC endpoint the client should talk to.

use tracing::debug;

use crate::error::{A2AError, A2AResult};
use crate::types::{AgentCard, AgentInterface};

/// Default path for the agent card well-known endpoint (A2A v0.3+).
const DEFAULT_AGENT_CARD_PATH: &str = "/.well-known/agent-card.json";

/// Previous well-known path (pre-v0.3 compat).
const PREV_AGENT_CARD_PATH: &str = "/.well-known/agent.json";

const JSONRPC: &str = "JSONRPC";

/// Resolves [`AgentCard`]s from agent base URLs.
///
/// # Example
///
/// ```no_run
/// use a2a_chat::client::CardResolver;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = CardResolver::new();
/// let card = resolver.resolve("http://localhost:10000").await?;
/// println!("Agent: {} v{}", card.name, card.version);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CardResolver {
    client: reqwest::Client,
    card_path: Option<String>,
}

impl CardResolver {
    /// Create a new resolver with default settings.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a new resolver with an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            card_path: None,
        }
    }

    /// Override the agent card path (no fallback is attempted).
    pub fn with_card_path(mut self, path: impl Into<String>) -> Self {
        self.card_path = Some(path.into());
        self
    }

    /// Fetch and parse the agent card from the given base URL.
    ///
    /// With the default path, `/.well-known/agent-card.json` is tried first
    /// and `/.well-known/agent.json` on a 404.
    ///
    /// # Errors
    ///
    /// Returns [`A2AError::Transport`] on connection failures, [`A2AError::Http`]
    /// on non-2xx responses, and [`A2AError::InvalidJson`] on parse failures.
    pub async fn resolve(&self, base_url: &str) -> A2AResult<AgentCard> {
        let base = base_url.trim_end_matches('/');

        if let Some(path) = self.card_path.as_deref() {
            return self.fetch_card(base, path).await;
        }

        match self.fetch_card(base, DEFAULT_AGENT_CARD_PATH).await {
            Err(A2AError::Http { status: 404, .. }) => {
                debug!(
                    "agent card not found at {}{}, trying fallback path {}",
                    base, DEFAULT_AGENT_CARD_PATH, PREV_AGENT_CARD_PATH,
                );
                self.fetch_card(base, PREV_AGENT_CARD_PATH).await
            }
            other => other,
        }
    }

    async fn fetch_card(&self, base: &str, path: &str) -> A2AResult<AgentCard> {
        let url = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        debug!("resolving agent card from {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    A2AError::Transport(format!("failed to connect to agent at {url}: {e}"))
                } else if e.is_timeout() {
                    A2AError::Timeout(format!("timed out fetching agent card from {url}: {e}"))
                } else {
                    A2AError::Transport(format!("failed to fetch agent card from {url}: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(A2AError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| A2AError::Transport(format!("failed to read agent card response: {e}")))?;

        let card: AgentCard = serde_json::from_slice(&bytes)
            .map_err(|e| A2AError::InvalidJson(format!("failed to parse agent card: {e}")))?;

        debug!("resolved agent card: {} v{}", card.name, card.version);

        Ok(card)
    }

    /// Pick the JSON-RPC endpoint URL from an agent card.
    ///
    /// Order: the first `JSONRPC` entry of `supportedInterfaces`, then of
    /// `additionalInterfaces`, then the card's own `url` when its preferred
    /// transport is JSON-RPC or unspecified. Transport names compare
    /// case-insensitively.
    pub fn jsonrpc_endpoint(card: &AgentCard) -> Option<String> {
        fn find(interfaces: &[AgentInterface]) -> Option<String> {
            interfaces
                .iter()
                .find(|iface| iface.transport.eq_ignore_ascii_case(JSONRPC))
                .map(|iface| iface.url.clone())
        }

        find(&card.supported_interfaces)
            .or_else(|| card.additional_interfaces.as_deref().and_then(find))
            .or_else(|| {
                let preferred = card.preferred_transport.as_deref().unwrap_or(JSONRPC);
                (preferred.eq_ignore_ascii_case(JSONRPC) && !card.url.is_empty())
                    .then(|| card.url.clone())
            })
    }
}

impl Default for CardResolver {
    fn default() -> Self {
        Self::new()
    }
}
