// Small helpers shared across the cookie subsystem.

#[cfg(target_arch = "wasm32")]
pub fn clog(msg: &str) {
    web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(msg));
}

#[cfg(not(target_arch = "wasm32"))]
pub fn clog(msg: &str) {
    let _ = msg;
}

/// Uniform random in [0,1). Math.random on wasm; a seeded xorshift on
/// native targets so the logic can run under plain `cargo test`.
#[cfg(target_arch = "wasm32")]
pub fn random() -> f64 {
    js_sys::Math::random()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn random() -> f64 {
    use std::cell::Cell;
    thread_local! {
        static SEED: Cell<u64> = const { Cell::new(0x9e3779b97f4a7c15) };
    }
    SEED.with(|s| {
        let mut x = s.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        s.set(x);
        (x >> 11) as f64 / (1u64 << 53) as f64
    })
}

/// Uniform random in [lo, hi).
pub fn rand_range(lo: f64, hi: f64) -> f64 {
    lo + random() * (hi - lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rand_range_stays_in_bounds() {
        for _ in 0..1000 {
            let v = rand_range(2.0, 5.0);
            assert!((2.0..5.0).contains(&v));
        }
    }
}
