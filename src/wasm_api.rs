use crate::api;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Main WASM API: find and commit the best play for one turn
///
/// # Arguments
/// * `hand_cards` - JSON array of card strings (e.g., ["H1", "S13", "W"])
/// * `table_melds` - JSON array of meld objects (e.g., [{"type": "run", "cards": ["H1", "H2", "H3"]}])
/// * `round` - Round number; cards of this rank are wild
/// * `config` - JSON search config (e.g., {"time_limit_ms": 500}), or "" for defaults
///
/// # Returns
/// JSON string with a SolveResponse containing success, plays, or error
#[wasm_bindgen]
pub fn solve_rummy(hand_cards: &str, table_melds: &str, round: u8, config: &str) -> String {
    api::solve(hand_cards, table_melds, round, config)
}

/// Whether the hand can reach a zero residual score this turn
#[wasm_bindgen]
pub fn can_go_out(hand_cards: &str, table_melds: &str, round: u8) -> Result<bool, JsValue> {
    api::check_go_out_json(hand_cards, table_melds, round)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Get the git commit hash that this WASM module was built from
///
/// Returns the first 8 characters of the commit hash, or "unknown" if not available
#[wasm_bindgen]
pub fn get_build_commit() -> String {
    env!("BUILD_COMMIT").to_string()
}
