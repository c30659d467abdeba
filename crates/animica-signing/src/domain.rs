//! The closed SignBytes domain registry.

/// `animica/tx/sign/v1` — the domain used to sign an `UnsignedTx`.
pub const DOM_TX_SIGN_V1: &str = "animica/tx/sign/v1";
/// `animica/header/sign/v1` — the domain used to sign a `Header`.
pub const DOM_HEADER_SIGN_V1: &str = "animica/header/sign/v1";
/// `animica/tx/hash/v1` — reserved, not yet part of the consensus hash
/// contract.
pub const DOM_TX_HASH_V1: &str = "animica/tx/hash/v1";
/// `animica/header/hash/v1` — reserved, not yet part of the consensus hash
/// contract.
pub const DOM_HEADER_HASH_V1: &str = "animica/header/hash/v1";

const ALLOWED_DOMAINS: [&str; 4] = [
    DOM_TX_SIGN_V1,
    DOM_HEADER_SIGN_V1,
    DOM_TX_HASH_V1,
    DOM_HEADER_HASH_V1,
];

/// Returns whether `domain` is a member of the closed registry.
pub fn is_known_domain(domain: &str) -> bool {
    ALLOWED_DOMAINS.contains(&domain)
}
