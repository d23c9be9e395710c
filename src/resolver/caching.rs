use std::cell::Cell;
use std::time::{Duration, SystemTime};

use super::cache::{CacheEntry, ResolutionCache};
use super::{Coordinate, ResolveError, ResolvedArtifact, Resolver};

/// Source of "now" for freshness checks
pub trait Clock {
    fn now(&self) -> SystemTime;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<SystemTime>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> SystemTime {
        (**self).now()
    }
}

/// When a cached resolution may be reused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Window for changing coordinates
    pub changing_window: Duration,
    /// Window for dynamic selectors on non-changing coordinates
    pub dynamic_window: Duration,
    /// Reuse any intact entry regardless of age; never go upstream
    pub offline: bool,
    /// Ignore cached entries
    pub refresh: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            changing_window: Duration::from_secs(60 * 60),
            dynamic_window: Duration::from_secs(24 * 60 * 60),
            offline: false,
            refresh: false,
        }
    }
}

impl CachePolicy {
    /// Freshness window for a coordinate; `None` means cached forever
    pub fn window_for(&self, coordinate: &Coordinate) -> Option<Duration> {
        if coordinate.changing {
            Some(self.changing_window)
        } else if coordinate.selector.is_dynamic() {
            Some(self.dynamic_window)
        } else {
            None
        }
    }

    fn allows_reuse(&self, coordinate: &Coordinate, entry: &CacheEntry, now: SystemTime) -> bool {
        if self.offline {
            return true;
        }
        self.window_for(coordinate)
            .map_or(true, |window| entry.is_fresh(now, window))
    }
}

/// A [`Resolver`] that consults a [`ResolutionCache`] before going upstream
///
/// Upstream failures propagate unchanged; nothing is retried.
pub struct CachingResolver<R, C = SystemClock> {
    upstream: R,
    cache: ResolutionCache,
    policy: CachePolicy,
    clock: C,
}

impl<R: Resolver> CachingResolver<R, SystemClock> {
    pub fn new(upstream: R, cache: ResolutionCache, policy: CachePolicy) -> Self {
        Self::with_clock(upstream, cache, policy, SystemClock)
    }
}

impl<R: Resolver, C: Clock> CachingResolver<R, C> {
    pub fn with_clock(upstream: R, cache: ResolutionCache, policy: CachePolicy, clock: C) -> Self {
        Self {
            upstream,
            cache,
            policy,
            clock,
        }
    }

    pub fn upstream(&self) -> &R {
        &self.upstream
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }
}

impl<R: Resolver, C: Clock> Resolver for CachingResolver<R, C> {
    fn resolve(&mut self, coordinate: &Coordinate) -> Result<ResolvedArtifact, ResolveError> {
        let key = coordinate.cache_key();
        let now = self.clock.now();

        if !self.policy.refresh {
            if let Some(entry) = self.cache.get(&key) {
                if !entry.is_intact() {
                    tracing::debug!("Cached artifact for {} is missing or modified", key);
                } else if self.policy.allows_reuse(coordinate, entry, now) {
                    tracing::debug!(
                        "Reusing cached resolution of {} -> {} (age {}s)",
                        key,
                        entry.artifact.version,
                        entry.age(now).as_secs()
                    );
                    return Ok(entry.artifact.clone());
                } else {
                    tracing::debug!(
                        "Cached resolution of {} is stale (age {}s)",
                        key,
                        entry.age(now).as_secs()
                    );
                }
            }
        }

        if self.policy.offline {
            return Err(ResolveError::Offline(key));
        }

        let artifact = self.upstream.resolve(coordinate)?;
        tracing::info!(
            "Resolved {} -> {} from {}",
            key,
            artifact.version,
            artifact.repository
        );
        self.cache.insert(key, CacheEntry::new(artifact.clone(), now));
        if let Err(e) = self.cache.save() {
            tracing::warn!("Failed to persist resolution cache: {}", e);
        }
        Ok(artifact)
    }
}
