//! Positioning provider selection and position feeds
//!
//! [`LocationResolutionPolicy`] picks the best available positioning provider
//! for a session, subscribes to it and, when the primary is not the network
//! provider, to the network provider as well. Both feeds go to the same
//! [`PositionConsumer`]; whichever update arrives last wins, regardless of
//! which provider sent it.

use std::sync::Arc;
use std::time::Duration;

use domain::value_objects::{
    Coordinate, DEFAULT_LOCATION, LocationProvider, ProviderChoice, ProviderCriteria,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::LocationConfig;

/// Errors from positioning
#[derive(Debug, Error)]
pub enum LocationError {
    /// No enabled provider matches the criteria
    #[error("No positioning provider available")]
    NoProviderAvailable,

    /// Subscribing to a provider failed
    #[error("Failed to subscribe to {provider} provider: {reason}")]
    SubscriptionFailed {
        /// The provider that refused the subscription
        provider: LocationProvider,
        /// Provider-supplied reason
        reason: String,
    },
}

/// Receives position updates from one or more providers
pub trait PositionConsumer: Send + Sync {
    /// Called for every update delivered by `source`
    fn on_position(&self, source: LocationProvider, position: Coordinate);
}

impl<F> PositionConsumer for F
where
    F: Fn(LocationProvider, Coordinate) + Send + Sync,
{
    fn on_position(&self, source: LocationProvider, position: Coordinate) {
        self(source, position);
    }
}

/// Platform positioning capability
#[cfg_attr(test, mockall::automock)]
pub trait PositioningService: Send + Sync {
    /// Best enabled provider for the criteria, if any
    fn best_provider(&self, criteria: &ProviderCriteria) -> Option<LocationProvider>;

    /// Whether a provider exists and is enabled right now
    fn is_provider_enabled(&self, provider: LocationProvider) -> bool;

    /// Start delivering updates from `provider` to `consumer`
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses the subscription.
    fn request_updates(
        &self,
        provider: LocationProvider,
        min_interval: Duration,
        min_distance_m: f32,
        consumer: Arc<dyn PositionConsumer>,
    ) -> Result<(), LocationError>;

    /// Stop delivering updates from `provider`
    fn remove_updates(&self, provider: LocationProvider);

    /// Cached fix of a provider; never waits for a new one
    fn last_known_position(&self, provider: LocationProvider) -> Option<Coordinate>;
}

/// Provider selection and subscription policy
#[derive(Clone)]
pub struct LocationResolutionPolicy {
    service: Arc<dyn PositioningService>,
    config: LocationConfig,
}

impl std::fmt::Debug for LocationResolutionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolutionPolicy")
            .field("service", &"dyn PositioningService")
            .field("config", &self.config)
            .finish()
    }
}

impl LocationResolutionPolicy {
    /// Create a policy over a platform positioning service
    #[must_use]
    pub fn new(service: Arc<dyn PositioningService>, config: LocationConfig) -> Self {
        Self { service, config }
    }

    /// How long a session waits for its first fix
    #[must_use]
    pub const fn fix_timeout(&self) -> Duration {
        self.config.fix_timeout()
    }

    /// Whether GPS or network positioning is enabled
    #[must_use]
    pub fn is_positioning_available(&self) -> bool {
        self.service.is_provider_enabled(LocationProvider::Gps)
            || self.service.is_provider_enabled(LocationProvider::Network)
    }

    /// Pick the best provider; `None` if it is missing or disabled
    #[must_use]
    pub fn select_provider(&self, criteria: &ProviderCriteria) -> ProviderChoice {
        let Some(provider) = self.service.best_provider(criteria) else {
            debug!(?criteria, "No provider matches criteria");
            return ProviderChoice::None;
        };
        if !self.service.is_provider_enabled(provider) {
            debug!(%provider, "Best provider is not available");
            return ProviderChoice::None;
        }
        debug!(%provider, "Selected location provider");
        ProviderChoice::from(provider)
    }

    /// Cached fix of the chosen provider, or [`DEFAULT_LOCATION`]
    #[must_use]
    pub fn last_known_or_default(&self, choice: ProviderChoice) -> Coordinate {
        choice
            .provider()
            .and_then(|provider| self.service.last_known_position(provider))
            .unwrap_or_else(|| {
                debug!(?choice, "No cached fix, using default location");
                DEFAULT_LOCATION
            })
    }

    /// Subscribe `consumer` to the best provider and, unless that is the
    /// network provider, to the network provider too
    ///
    /// # Errors
    ///
    /// Returns `LocationError::NoProviderAvailable` when no provider can be
    /// selected; the dependent session cannot continue. A failed primary
    /// subscription is returned as-is; a failed network fallback is logged.
    pub fn request_updates(
        &self,
        criteria: &ProviderCriteria,
        consumer: Arc<dyn PositionConsumer>,
    ) -> Result<SessionSubscriptions, LocationError> {
        let primary = self
            .select_provider(criteria)
            .provider()
            .ok_or(LocationError::NoProviderAvailable)?;

        let mut subscriptions = SessionSubscriptions {
            service: Arc::clone(&self.service),
            providers: Vec::with_capacity(2),
        };

        self.subscribe(primary, Arc::clone(&consumer))?;
        subscriptions.providers.push(primary);

        if primary != LocationProvider::Network
            && self.service.is_provider_enabled(LocationProvider::Network)
        {
            match self.subscribe(LocationProvider::Network, consumer) {
                Ok(()) => subscriptions.providers.push(LocationProvider::Network),
                Err(e) => warn!(error = %e, "Network fallback subscription failed"),
            }
        }

        info!(providers = ?subscriptions.providers, "Position updates requested");
        Ok(subscriptions)
    }

    /// Select a provider, subscribe, and seed the initial position
    ///
    /// # Errors
    ///
    /// Same as [`Self::request_updates`].
    pub fn start_session(
        &self,
        criteria: &ProviderCriteria,
        consumer: Arc<dyn PositionConsumer>,
    ) -> Result<LocationSession, LocationError> {
        let subscriptions = self.request_updates(criteria, consumer)?;
        let choice = subscriptions
            .providers
            .first()
            .copied()
            .map_or(ProviderChoice::None, ProviderChoice::from);
        let initial_position = self.last_known_or_default(choice);

        Ok(LocationSession {
            choice,
            initial_position,
            subscriptions,
        })
    }

    fn subscribe(
        &self,
        provider: LocationProvider,
        consumer: Arc<dyn PositionConsumer>,
    ) -> Result<(), LocationError> {
        self.service.request_updates(
            provider,
            self.config.min_update_interval(),
            self.config.min_distance_m,
            consumer,
        )
    }
}

/// Providers subscribed for one session
pub struct SessionSubscriptions {
    service: Arc<dyn PositioningService>,
    providers: Vec<LocationProvider>,
}

impl std::fmt::Debug for SessionSubscriptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSubscriptions")
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

impl SessionSubscriptions {
    /// Subscribed providers, primary first
    #[must_use]
    pub fn providers(&self) -> &[LocationProvider] {
        &self.providers
    }

    /// Unsubscribe from every provider of this session
    pub fn cancel(self) {
        for provider in &self.providers {
            self.service.remove_updates(*provider);
        }
        debug!(providers = ?self.providers, "Position updates removed");
    }
}

/// Result of starting a positioning session
#[derive(Debug)]
pub struct LocationSession {
    /// Primary provider
    pub choice: ProviderChoice,
    /// Cached fix of the primary provider, or the default location
    pub initial_position: Coordinate,
    /// Active subscriptions
    pub subscriptions: SessionSubscriptions,
}

/// A position and the provider that reported it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    /// Reported position
    pub position: Coordinate,
    /// Reporting provider; `None` for the seed value
    pub source: Option<LocationProvider>,
}

/// Last-write-wins merge point for position feeds
#[derive(Debug)]
pub struct CurrentPosition {
    tx: watch::Sender<PositionFix>,
}

impl CurrentPosition {
    /// Start from a seed position
    #[must_use]
    pub fn new(initial: Coordinate) -> Self {
        let (tx, _rx) = watch::channel(PositionFix {
            position: initial,
            source: None,
        });
        Self { tx }
    }

    /// The most recent fix
    #[must_use]
    pub fn latest(&self) -> PositionFix {
        *self.tx.borrow()
    }

    /// Watch for changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PositionFix> {
        self.tx.subscribe()
    }

    /// Wait up to `timeout` for the first provider fix
    ///
    /// Returns the latest fix either way; on timeout that is still the seed.
    pub async fn first_fix(&self, timeout: Duration) -> PositionFix {
        let mut rx = self.tx.subscribe();
        let waited = tokio::time::timeout(timeout, async {
            rx.wait_for(|fix| fix.source.is_some()).await.map(|fix| *fix)
        })
        .await;

        match waited {
            Ok(Ok(fix)) => fix,
            Ok(Err(_)) | Err(_) => {
                debug!(?timeout, "No provider fix yet, keeping seed position");
                self.latest()
            },
        }
    }
}

impl PositionConsumer for CurrentPosition {
    fn on_position(&self, source: LocationProvider, position: Coordinate) {
        self.tx.send_replace(PositionFix {
            position,
            source: Some(source),
        });
    }
}
