use crate::grid::Token;

/// A token drawn uniformly from `1..=colors`.
pub fn random_token(colors: Token) -> Token {
    debug_assert!(colors > 0);
    1 + random_usize(colors as usize) as Token
}

#[cfg(target_arch = "wasm32")]
pub fn random_usize(max_exclusive: usize) -> usize {
    debug_assert!(max_exclusive > 0);
    (js_sys::Math::random() * max_exclusive as f64).floor() as usize
}

#[cfg(not(target_arch = "wasm32"))]
pub fn random_usize(max_exclusive: usize) -> usize {
    use std::sync::atomic::{AtomicU64, Ordering};

    static SEED: AtomicU64 = AtomicU64::new(0x2545_f491_4f6c_dd1d);

    debug_assert!(max_exclusive > 0);

    let mut value = SEED.load(Ordering::Relaxed);
    value ^= value << 13;
    value ^= value >> 7;
    value ^= value << 17;
    SEED.store(value, Ordering::Relaxed);

    (value as usize) % max_exclusive
}
