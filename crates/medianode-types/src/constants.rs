//! System-wide constants for the medianode leasing engine.

/// Module name; also the seed for the escrow module account.
pub const MODULE_NAME: &str = "medianode";

/// Module account receiving the fee-collector share of lease commission.
pub const FEE_COLLECTOR_NAME: &str = "fee_collector";

/// Module account receiving the community-pool share of lease commission.
pub const COMMUNITY_POOL_NAME: &str = "community_pool";

/// Human-readable prefix of account addresses.
pub const ADDRESS_PREFIX: &str = "mnode";

/// Number of digest bytes kept when deriving an address.
pub const ADDRESS_BYTES: usize = 20;

/// Prefix of counter-generated resource ids (`mn1`, `mn2`, ...).
pub const RESOURCE_ID_PREFIX: &str = "mn";

/// Resource id length bounds.
pub const MIN_RESOURCE_ID_LEN: usize = 3;
pub const MAX_RESOURCE_ID_LEN: usize = 64;

/// Maximum length of the node URL.
pub const MAX_URL_LEN: usize = 256;

/// Maximum lengths of the descriptive node info fields.
pub const MAX_MONIKER_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 512;
pub const MAX_CONTACT_LEN: usize = 128;

/// Seconds in one billable hour.
pub const SECONDS_PER_HOUR: i64 = 3_600;

/// Default staking denomination.
pub const DEFAULT_DENOM: &str = "umedia";

/// Default minimum lease duration in hours.
pub const DEFAULT_MIN_LEASE_HOURS: u64 = 1;

/// Default maximum lease duration in hours (30 days).
pub const DEFAULT_MAX_LEASE_HOURS: u64 = 720;

/// Default minimum deposit (in base units of [`DEFAULT_DENOM`]).
pub const DEFAULT_MIN_DEPOSIT: i64 = 1_000;

/// Default share of `min_deposit` required at registration, in percent.
pub const DEFAULT_INITIAL_DEPOSIT_PERCENT: i64 = 10;

/// Default lease commission, in percent.
pub const DEFAULT_LEASE_COMMISSION_PERCENT: i64 = 10;

/// Default deposit release period after close (7 days).
pub const DEFAULT_DEPOSIT_RELEASE_SECS: i64 = 7 * 24 * SECONDS_PER_HOUR;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
