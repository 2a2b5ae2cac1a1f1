//! Per-client rate limiting (spec §4.3.6), keyed identically to how the
//! client is identified for signature verification so an attacker can't
//! dodge limits by varying headers the signature check would have rejected
//! anyway.

use std::num::NonZeroU32;

use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorLimiter};

use crate::config::RateLimitConfig;
use crate::error::{Error, Result};

type KeyedLimiter = GovernorLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Category {
    Login,
    Read,
    Write,
}

pub struct RateLimiters {
    login: KeyedLimiter,
    read: KeyedLimiter,
    write: KeyedLimiter,
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            login: GovernorLimiter::keyed(quota_per_minute(config.login_rpm)),
            read: GovernorLimiter::keyed(quota_per_minute(config.read_rpm)),
            write: GovernorLimiter::keyed(quota_per_minute(config.write_rpm)),
        }
    }

    /// Check whether `client_id` may proceed under `category`. On rejection
    /// returns the number of whole seconds until the next slot opens.
    pub fn check(&self, category: Category, client_id: &str) -> Result<()> {
        let limiter = match category {
            Category::Login => &self.login,
            Category::Read => &self.read,
            Category::Write => &self.write,
        };

        limiter.check_key(&client_id.to_string()).map_err(|not_until| {
            let retry_after_secs = not_until.wait_time_from(DefaultClock::default().now()).as_secs();
            Error::RateLimited {
                retry_after_secs: retry_after_secs.max(1),
            }
        })
    }
}

fn quota_per_minute(rpm: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(rpm.max(1)).expect("max(1) is never zero"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_configured_burst() {
        let limiters = RateLimiters::new(&RateLimitConfig {
            login_rpm: 2,
            read_rpm: 60,
            write_rpm: 30,
        });
        assert!(limiters.check(Category::Login, "client-a").is_ok());
        assert!(limiters.check(Category::Login, "client-a").is_ok());
        assert!(limiters.check(Category::Login, "client-a").is_err());
    }

    #[test]
    fn keys_are_independent() {
        let limiters = RateLimiters::new(&RateLimitConfig {
            login_rpm: 1,
            read_rpm: 60,
            write_rpm: 30,
        });
        assert!(limiters.check(Category::Login, "client-a").is_ok());
        assert!(limiters.check(Category::Login, "client-b").is_ok());
    }
}
