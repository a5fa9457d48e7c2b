//! JSON entry points shared by the wasm bindings and the command line.

use crate::config::SearchConfig;
use crate::error::{Result, RummyError};
use crate::meld::{Meld, RunPlay, SetPlay};
use crate::solver::{self, CommitReport, SearchResult};
use crate::table::{Growth, Play, Table};
use crate::{Card, DiscardPile, Hand};
use serde::{Deserialize, Serialize};

/// JSON-serializable representation of a meld
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeldJson {
    Run { cards: Vec<String> },
    Set { cards: Vec<String> },
}

/// JSON-serializable representation of one play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayJson {
    LayDown {
        meld: MeldJson,
    },
    Extend {
        target: usize,
        growth: Growth,
        cards: Vec<String>,
    },
}

/// Result of [`solve`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub success: bool,
    pub can_go_out: bool,
    /// Plays in commit order, wilds shown as dealt.
    pub plays: Vec<PlayJson>,
    /// Table after committing the plays, wilds shown as fixed.
    pub table: Vec<MeldJson>,
    /// Hand after committing and discarding.
    pub remaining: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discard: Option<String>,
    pub residual_score: u32,
    pub wilds_used: Vec<String>,
    pub natural: bool,
    /// Bonus earned if this player is the first out.
    pub go_out_adjustment: i32,
    /// Whether the search completed fully (true) or hit a limit (false)
    pub search_completed: bool,
    pub outcomes_examined: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Solve one turn.
///
/// # Arguments
/// * `hand_json` - JSON array of card strings (e.g., `["H1", "S13", "W"]`)
/// * `table_json` - JSON array of meld objects (e.g., `[{"type": "run", "cards": ["H1", "H2", "H3"]}]`)
/// * `round` - the round number, whose rank is wild
/// * `config_json` - a [`SearchConfig`] object; empty string for defaults
///
/// # Returns
/// JSON string with a [`SolveResponse`]; failures set `success: false` and `error`.
pub fn solve(hand_json: &str, table_json: &str, round: u8, config_json: &str) -> String {
    let response = solve_internal(hand_json, table_json, round, config_json).unwrap_or_else(|e| {
        SolveResponse {
            success: false,
            error: Some(e.to_string()),
            ..SolveResponse::default()
        }
    });
    serde_json::to_string(&response)
        .unwrap_or_else(|e| format!(r#"{{"success":false,"error":"Serialization error: {}"}}"#, e))
}

/// Internal implementation of [`solve`]
pub fn solve_internal(
    hand_json: &str,
    table_json: &str,
    round: u8,
    config_json: &str,
) -> Result<SolveResponse> {
    let hand = parse_hand(hand_json)?;
    let round = check_round(round)?;
    let table = parse_table(table_json, round)?;
    let config = if config_json.trim().is_empty() {
        SearchConfig::default()
    } else {
        SearchConfig::from_json(config_json)?
    };

    solve_turn(hand, table, round, &config)
}

/// Search, then commit the best play onto the given hand and table and
/// describe the result.
pub fn solve_turn(
    hand: Hand,
    table: Table,
    round: u8,
    config: &SearchConfig,
) -> Result<SolveResponse> {
    let result = solver::find_best_play(&hand, round, &table, config);

    let mut committed_hand = hand;
    let mut committed_table = table;
    let mut pile = DiscardPile::new();
    let report = solver::commit_play(
        &mut committed_hand,
        &mut committed_table,
        &mut pile,
        &result.best,
        config.fix_value,
    )?;

    Ok(build_response(&result, &report, &committed_hand, &committed_table))
}

/// Whether the hand can go out against the given table.
pub fn check_go_out_json(hand_json: &str, table_json: &str, round: u8) -> Result<bool> {
    let hand = parse_hand(hand_json)?;
    let round = check_round(round)?;
    let table = parse_table(table_json, round)?;
    Ok(solver::check_go_out(&hand, round, &table))
}

fn check_round(round: u8) -> Result<u8> {
    if (1..=Card::MAX_RANK).contains(&round) {
        Ok(round)
    } else {
        Err(RummyError::InvalidConfig(format!(
            "round must be 1-{}, got {}",
            Card::MAX_RANK,
            round
        )))
    }
}

pub fn parse_hand(hand_json: &str) -> Result<Hand> {
    let card_strs: Vec<String> = serde_json::from_str(hand_json)?;
    parse_cards(&card_strs).map(Hand::with_cards)
}

pub fn parse_table(table_json: &str, round: u8) -> Result<Table> {
    let melds: Vec<MeldJson> = serde_json::from_str(table_json)?;
    let mut table = Table::new();
    for meld_json in melds {
        table.add_meld(meld_from_json(&meld_json, round)?);
    }
    Ok(table)
}

fn parse_cards(card_strs: &[String]) -> Result<Vec<Card>> {
    card_strs.iter().map(|s| Card::from_string(s)).collect()
}

fn card_strings(cards: &[Card]) -> Vec<String> {
    cards.iter().map(|c| c.to_string()).collect()
}

/// Convert JSON meld to internal Meld type
pub fn meld_from_json(meld_json: &MeldJson, round: u8) -> Result<Meld> {
    match meld_json {
        MeldJson::Run { cards } => RunPlay::new(parse_cards(cards)?, round).map(Meld::Run),
        MeldJson::Set { cards } => SetPlay::new(parse_cards(cards)?, round).map(Meld::Set),
    }
}

/// Convert internal Meld to JSON representation
pub fn meld_to_json(meld: &Meld) -> MeldJson {
    let cards = card_strings(meld.cards());
    match meld {
        Meld::Run(_) => MeldJson::Run { cards },
        Meld::Set(_) => MeldJson::Set { cards },
    }
}

fn play_to_json(play: &Play) -> PlayJson {
    let cards = card_strings(play.cards());
    match play {
        Play::Run(_) => PlayJson::LayDown {
            meld: MeldJson::Run { cards },
        },
        Play::Set(_) => PlayJson::LayDown {
            meld: MeldJson::Set { cards },
        },
        Play::Public(delta) => PlayJson::Extend {
            target: delta.target().index(),
            growth: delta.growth(),
            cards,
        },
    }
}

fn build_response(
    result: &SearchResult,
    report: &CommitReport,
    hand: &Hand,
    table: &Table,
) -> SolveResponse {
    SolveResponse {
        success: true,
        can_go_out: report.went_out(),
        plays: result.best.plays().iter().map(play_to_json).collect(),
        table: table.melds().iter().map(meld_to_json).collect(),
        remaining: card_strings(hand.cards()),
        discard: report.discard.map(|c| c.to_string()),
        residual_score: report.residual_score,
        wilds_used: card_strings(&report.wilds_used),
        natural: report.natural,
        go_out_adjustment: report.go_out_adjustment(true),
        search_completed: result.search_completed,
        outcomes_examined: result.outcomes_examined,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve_value(hand: &str, table: &str, round: u8, config: &str) -> serde_json::Value {
        serde_json::from_str(&solve(hand, table, round, config)).unwrap()
    }

    #[test]
    fn test_solve_single_run() {
        let response = solve_value(r#"["H1","H2","H3","H8","H9"]"#, "[]", 4, "");
        assert_eq!(response["success"], true);
        assert_eq!(response["can_go_out"], false);
        assert_eq!(response["residual_score"], 8);
        assert_eq!(response["discard"], "H9");
        assert_eq!(response["remaining"], serde_json::json!(["H8"]));
        assert_eq!(
            response["plays"],
            serde_json::json!([{"action": "lay_down", "meld": {"type": "run", "cards": ["H1", "H2", "H3"]}}])
        );
        assert_eq!(response["natural"], true);
        assert!(response.get("error").is_none());
    }

    #[test]
    fn test_solve_extends_table_set() {
        let table = r#"[{"type": "set", "cards": ["H7", "D7", "D7"]}]"#;
        let raw = solve(r#"["H7","C2"]"#, table, 3, "{}");
        let response: SolveResponse = serde_json::from_str(&raw).unwrap();
        assert!(response.success);
        assert!(response.can_go_out);
        assert_eq!(
            response.plays,
            vec![PlayJson::Extend {
                target: 0,
                growth: Growth::Append,
                cards: vec!["H7".to_string()],
            }]
        );
        assert_eq!(
            response.table,
            vec![MeldJson::Set {
                cards: vec!["H7", "D7", "D7", "H7"].into_iter().map(String::from).collect(),
            }]
        );
        assert_eq!(response.go_out_adjustment, -15);
        assert!(response.remaining.is_empty());
    }

    #[test]
    fn test_solve_shows_fixed_wilds_on_table() {
        let response = solve_value(r#"["C6","W","C6","W"]"#, "[]", 3, r#"{"fix_value": 1}"#);
        assert_eq!(response["can_go_out"], true);
        assert_eq!(
            response["table"],
            serde_json::json!([{"type": "set", "cards": ["C6", "C6", "C6*", "C6*"]}])
        );
        assert_eq!(response["wilds_used"], serde_json::json!(["W", "W"]));
        assert_eq!(response["go_out_adjustment"], -5);
    }

    #[test]
    fn test_solve_reports_errors() {
        let bad_card = solve_value(r#"["H1","X9"]"#, "[]", 4, "");
        assert_eq!(bad_card["success"], false);
        assert!(bad_card["error"].as_str().unwrap().contains("X9"));

        let bad_meld = solve_value(r#"["H1"]"#, r#"[{"type": "run", "cards": ["H1", "S2", "H3"]}]"#, 4, "");
        assert_eq!(bad_meld["success"], false);
        assert!(bad_meld["error"].as_str().unwrap().contains("valid run"));

        let bad_config = solve_value(r#"["H1"]"#, "[]", 4, r#"{"fix_value": 20}"#);
        assert_eq!(bad_config["success"], false);

        let bad_round = solve_value(r#"["H1"]"#, "[]", 0, "");
        assert_eq!(bad_round["success"], false);

        let bad_json = solve_value("not json", "[]", 4, "");
        assert_eq!(bad_json["success"], false);
    }

    #[test]
    fn test_meld_json_round_trip() {
        let json = r#"{"type":"run","cards":["S4","W","S6"]}"#;
        let meld_json: MeldJson = serde_json::from_str(json).unwrap();
        let meld = meld_from_json(&meld_json, 3).unwrap();
        assert!(meld.is_run());
        assert_eq!(meld_to_json(&meld), meld_json);
        assert_eq!(serde_json::to_string(&meld_json).unwrap(), json);
    }

    #[test]
    fn test_check_go_out_json() {
        assert!(check_go_out_json(r#"["C6","W","C6","W"]"#, "[]", 3).unwrap());
        assert!(!check_go_out_json(r#"["H2","H9","C13"]"#, "[]", 5).unwrap());
        assert!(check_go_out_json("{}", "[]", 5).is_err());
    }
}
