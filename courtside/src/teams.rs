//! NBA team listings.
//!
//! [`TeamsService::get_teams`] sends one fixed prompt per [`TeamQuery`] through
//! the structured-output capability and returns the model's list of
//! [`Team`]s in the order the model produced them.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chat::{ChatRequest, SharedChatProvider};
use crate::error::{Error, Result};
use crate::structured::{self, OutputSchema};

/// One NBA franchise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Team {
    /// Franchise name, e.g. "Lakers".
    #[schemars(length(min = 1))]
    pub team_name: String,
    /// Home city, e.g. "Los Angeles".
    #[schemars(length(min = 1))]
    pub city: String,
}

impl Team {
    /// Creates a team.
    #[must_use]
    pub fn new(team_name: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            city: city.into(),
        }
    }

    /// `true` when both fields carry visible text.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.team_name.trim().is_empty() && !self.city.trim().is_empty()
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.city, self.team_name)
    }
}

/// Which teams to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TeamQuery {
    /// Every team in the league.
    #[default]
    All,
    /// Eastern Conference teams only.
    EasternConference,
}

impl TeamQuery {
    /// The user prompt sent for this query.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::All => "Please name all of the teams in the NBA.",
            Self::EasternConference => {
                "Please name all of the teams in the Eastern Conference of the NBA."
            }
        }
    }

    /// Short label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::EasternConference => "eastern_conference",
        }
    }
}

/// What [`TeamsService`] does when the upstream call fails.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Surface every failure.
    #[default]
    Propagate,
    /// Answer rate-limited and unavailable failures with this list.
    Fallback(Vec<Team>),
}

/// Lists NBA teams by asking a chat model.
pub struct TeamsService {
    provider: SharedChatProvider,
    model: String,
    policy: ErrorPolicy,
    schema: OutputSchema,
}

impl TeamsService {
    /// Creates a service that uses the provider's default model and
    /// propagates every failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the team schema cannot be compiled.
    pub fn new(provider: SharedChatProvider) -> Result<Self> {
        let model = provider.default_model().to_owned();
        Ok(Self {
            provider,
            model,
            policy: ErrorPolicy::Propagate,
            schema: OutputSchema::of::<Vec<Team>>()?,
        })
    }

    /// Overrides the model name sent with each request.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the upstream failure policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a fallback policy without teams.
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Result<Self> {
        if let ErrorPolicy::Fallback(teams) = &policy {
            if teams.is_empty() {
                return Err(Error::config("fallback policy needs at least one team"));
            }
            if let Some(team) = teams.iter().find(|t| !t.is_complete()) {
                return Err(Error::config(format!(
                    "fallback team has an empty field: {team:?}"
                )));
            }
        }
        self.policy = policy;
        Ok(self)
    }

    /// Model name sent with each request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Active failure policy.
    #[must_use]
    pub const fn policy(&self) -> &ErrorPolicy {
        &self.policy
    }

    /// Asks the model for the teams matching `query`.
    ///
    /// # Errors
    ///
    /// Returns the upstream failure (see [`Error::kind`]) unless the
    /// fallback policy covers it, and [`Error::SchemaParse`] when the reply
    /// does not describe a list of teams.
    pub async fn get_teams(&self, query: TeamQuery) -> Result<Vec<Team>> {
        let request = ChatRequest::new(&self.model).user(query.prompt());

        match self.fetch(request).await {
            Ok(teams) => {
                info!(query = query.as_str(), count = teams.len(), "teams listed");
                Ok(teams)
            }
            Err(err) => self.recover(query, err),
        }
    }

    async fn fetch(&self, request: ChatRequest) -> Result<Vec<Team>> {
        let teams: Vec<Team> =
            structured::entity_with(self.provider.as_ref(), &self.schema, request).await?;

        if let Some(index) = teams.iter().position(|t| !t.is_complete()) {
            return Err(Error::schema_parse(
                self.schema.name(),
                format!("team at index {index} has a blank field"),
            ));
        }
        Ok(teams)
    }

    fn recover(&self, query: TeamQuery, err: Error) -> Result<Vec<Team>> {
        match &self.policy {
            ErrorPolicy::Fallback(teams) if err.kind().is_transient() => {
                warn!(
                    query = query.as_str(),
                    kind = %err.kind(),
                    error = %err,
                    "upstream failed, answering with fallback teams"
                );
                Ok(teams.clone())
            }
            _ => Err(err),
        }
    }
}

impl fmt::Debug for TeamsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeamsService")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.model)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
