#![cfg(target_arch = "wasm32")]

use rummy_solver::wasm_api::{can_go_out, get_build_commit, solve_rummy};
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn solves_through_bindings() {
    let raw = solve_rummy(r#"["H1","H2","H3","H8","H9"]"#, "[]", 4, "");
    let response: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(response["success"], true);
    assert_eq!(response["residual_score"], 8);
}

#[wasm_bindgen_test]
fn time_limit_uses_browser_clock() {
    let raw = solve_rummy(r#"["C6","W","C6","W"]"#, "[]", 3, r#"{"time_limit_ms": 50}"#);
    let response: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(response["can_go_out"], true);
}

#[wasm_bindgen_test]
fn go_out_check_reports_bad_input() {
    assert_eq!(can_go_out(r#"["C6","W","C6","W"]"#, "[]", 3).ok(), Some(true));
    assert!(can_go_out("nope", "[]", 3).is_err());
    assert!(!get_build_commit().is_empty());
}
