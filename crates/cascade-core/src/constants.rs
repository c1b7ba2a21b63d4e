//! Engine constants. All monetary values in base units (1 credit = 10^8 units).

/// Base units per whole credit.
pub const UNIT: u64 = 100_000_000;

/// Basis-point denominator (10,000 bps = 100%).
pub const BPS_PRECISION: u64 = 10_000;

/// Default hard cap on referral chain length, counting the triggering user.
pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 50;

/// Default cap on credited ancestors per reward event.
pub const DEFAULT_MAX_RECIPIENTS: usize = 10;

/// Number of levels covered by the fixed geometric weight table.
pub const GEOMETRIC_LEVELS: usize = 10;

/// Per-level weights for the contract's 0.6-ratio geometric split, in bps.
///
/// `GEOMETRIC_WEIGHTS[k] = floor(10_000 * 0.6^k)`.
pub const GEOMETRIC_WEIGHTS: [u64; GEOMETRIC_LEVELS] = [
    10_000, // 0.6^0
    6_000,  // 0.6^1
    3_600,  // 0.6^2
    2_160,  // 0.6^3
    1_296,  // 0.6^4
    777,    // 0.6^5 = 0.07776
    466,    // 0.6^6 = 0.046656
    279,    // 0.6^7 = 0.0279936
    167,    // 0.6^8 = 0.01679616
    100,    // 0.6^9 = 0.010077696
];

/// Prefix sums of [`GEOMETRIC_WEIGHTS`]: `GEOMETRIC_CUMULATIVE[n]` is the
/// total weight shared by `n` recipients.
pub const GEOMETRIC_CUMULATIVE: [u64; GEOMETRIC_LEVELS + 1] = [
    0, 10_000, 16_000, 19_600, 21_760, 23_056, 23_833, 24_299, 24_578, 24_745, 24_845,
];

/// Default share of the gross amount kept by the triggering user (80%).
pub const DEFAULT_ORIGINAL_USER_SHARE_BPS: u64 = 8_000;
