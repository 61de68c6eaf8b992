//! # Ledger Flows
//!
//! Single-client behaviour of the contract, driven by function name through
//! the gateway the way an application client would.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use evote_contract::prelude::*;
    use serde_json::Value;

    use crate::stepping_gateway;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    async fn read_option(gateway: &Gateway, key: &str) -> OptionRecord {
        let bytes = gateway.evaluate("GetOption", &[key]).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn all_options(gateway: &Gateway) -> Vec<OptionRecord> {
        let bytes = gateway.evaluate("GetAllOptions", &[]).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn history(gateway: &Gateway, key: &str) -> Vec<Value> {
        let bytes = gateway.evaluate("GetHistory", &[key]).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn voters(gateway: &Gateway) -> Vec<String> {
        let bytes = gateway.evaluate("GetAllVoters", &[]).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // =============================================================================
    // OPTION REGISTRY
    // =============================================================================

    #[tokio::test]
    async fn test_created_option_has_zero_votes() {
        let gateway = stepping_gateway();
        gateway.submit("CreateOption", &["Paris"]).await.unwrap();

        let paris = read_option(&gateway, "paris").await;
        assert_eq!(paris, OptionRecord::new("paris", "Paris"));
        assert_eq!(paris.votes, 0);
    }

    #[tokio::test]
    async fn test_n_votes_yield_n() {
        let gateway = stepping_gateway();
        gateway.submit("CreateOption", &["Paris"]).await.unwrap();
        for _ in 0..7 {
            gateway.submit("CastVote", &["paris"]).await.unwrap();
        }
        assert_eq!(read_option(&gateway, "paris").await.votes, 7);
    }

    #[tokio::test]
    async fn test_duplicate_create_leaves_state_unchanged() {
        let gateway = stepping_gateway();
        gateway.submit("CreateOption", &["Paris"]).await.unwrap();
        gateway.submit("CastVote", &["paris"]).await.unwrap();
        let before = gateway.evaluate("GetOption", &["paris"]).await.unwrap();
        let height = gateway.ledger().height().unwrap();

        let err = gateway.submit("CreateOption", &["PARIS"]).await.unwrap_err();
        assert_eq!(err, ContractError::AlreadyExists { key: "paris".into() });

        assert_eq!(gateway.evaluate("GetOption", &["paris"]).await.unwrap(), before);
        assert_eq!(gateway.ledger().height().unwrap(), height);
    }

    #[tokio::test]
    async fn test_delete_of_absent_option_writes_nothing() {
        let gateway = stepping_gateway();
        let err = gateway.submit("DeleteOption", &["paris"]).await.unwrap_err();

        assert_eq!(err, ContractError::NotFound { key: "paris".into() });
        assert_eq!(gateway.ledger().height().unwrap(), 0);
        assert!(history(&gateway, "paris").await.is_empty());
    }

    #[tokio::test]
    async fn test_key_arguments_are_normalized() {
        let gateway = stepping_gateway();
        gateway.submit("CreateOption", &["New York"]).await.unwrap();
        gateway.submit("CastVote", &["NEW york"]).await.unwrap();

        let exists = gateway.evaluate("OptionExists", &[" new York "]).await.unwrap();
        assert_eq!(exists, b"true");
        assert_eq!(read_option(&gateway, "newyork").await.votes, 1);
    }

    #[tokio::test]
    async fn test_stored_bytes_are_insertion_order_independent() {
        let gateway = stepping_gateway();
        gateway.submit("CreateOption", &["Rom"]).await.unwrap();
        let stored = gateway.evaluate("GetOption", &["rom"]).await.unwrap();

        let mut forward = HashMap::new();
        forward.insert("docType", Value::from("option"));
        forward.insert("key", Value::from("rom"));
        forward.insert("name", Value::from("Rom"));
        forward.insert("votes", Value::from(0));

        let mut backward = HashMap::new();
        backward.insert("votes", Value::from(0));
        backward.insert("name", Value::from("Rom"));
        backward.insert("key", Value::from("rom"));
        backward.insert("docType", Value::from("option"));

        assert_eq!(to_canonical_vec(&forward).unwrap(), stored);
        assert_eq!(to_canonical_vec(&backward).unwrap(), stored);
    }

    // =============================================================================
    // HISTORY
    // =============================================================================

    #[tokio::test]
    async fn test_history_of_create_vote_vote_delete() {
        let gateway = stepping_gateway();
        gateway.submit("CreateOption", &["Rom"]).await.unwrap();
        gateway.submit("CastVote", &["rom"]).await.unwrap();
        gateway.submit("CastVote", &["rom"]).await.unwrap();
        gateway.submit("DeleteOption", &["rom"]).await.unwrap();

        let entries = history(&gateway, "rom").await;
        assert_eq!(entries.len(), 4);

        let votes: Vec<&Value> = entries.iter().map(|e| &e["votes"]).collect();
        assert_eq!(votes, [&Value::from(0), &Value::from(1), &Value::from(2), &Value::from("DELETED")]);

        let last = &entries[3];
        assert_eq!(last["isDeleted"], Value::Bool(true));
        assert_eq!(last["name"], Value::from("DELETED"));
        assert_eq!(last["key"], Value::from("rom"));

        let millis: Vec<i64> = entries
            .iter()
            .map(|e| e["timestampMillis"].as_i64().unwrap())
            .collect();
        assert!(millis.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(entries[0]["timestamp"], Value::from("Montag, 5.2.2024, 14:03:07"));
        assert_eq!(entries[1]["timestamp"], Value::from("Montag, 5.2.2024, 14:03:08"));
    }

    #[tokio::test]
    async fn test_history_tx_ids_match_vote_results() {
        let gateway = stepping_gateway();
        gateway.submit("CreateOption", &["Rom"]).await.unwrap();
        let tx_id = gateway.submit("CastVote", &["rom"]).await.unwrap();

        let entries = history(&gateway, "rom").await;
        assert_eq!(entries[1]["txId"], Value::from(String::from_utf8(tx_id).unwrap()));
        assert_ne!(entries[0]["txId"], entries[1]["txId"]);
    }

    // =============================================================================
    // VOTER MONITOR
    // =============================================================================

    #[tokio::test]
    async fn test_add_to_voter_appends_exactly_once() {
        let gateway = stepping_gateway();
        gateway.submit("addToVoter", &["alice"]).await.unwrap();
        let before = voters(&gateway).await;

        gateway.submit("AddToVoters", &["bob"]).await.unwrap();
        let after = voters(&gateway).await;

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after[..before.len()], before[..]);
        assert_eq!(after.last().map(String::as_str), Some("bob"));
    }

    #[tokio::test]
    async fn test_has_voted_is_exact_match() {
        let gateway = stepping_gateway();
        assert_eq!(gateway.evaluate("HasVoted", &["alice"]).await.unwrap(), b"false");

        gateway.submit("AddToVoters", &["alice"]).await.unwrap();
        assert_eq!(gateway.evaluate("HasVoted", &["alice"]).await.unwrap(), b"true");
        assert_eq!(gateway.evaluate("HasVoted", &["Alice"]).await.unwrap(), b"false");
    }

    #[tokio::test]
    async fn test_delete_all_voters() {
        let gateway = stepping_gateway();
        gateway.submit("AddToVoters", &["alice"]).await.unwrap();
        gateway.submit("DeleteAllVoters", &[]).await.unwrap();
        assert!(voters(&gateway).await.is_empty());

        // Absent monitor: still succeeds.
        gateway.submit("DeleteAllVoters", &[]).await.unwrap();
    }

    // =============================================================================
    // SEEDED LEDGER
    // =============================================================================

    #[tokio::test]
    async fn test_init_then_two_votes_for_rom() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();
        gateway.submit("CastVote", &["rom"]).await.unwrap();
        gateway.submit("CastVote", &["rom"]).await.unwrap();

        let counts: Vec<(String, u64)> = all_options(&gateway)
            .await
            .into_iter()
            .map(|o| (o.key, o.votes))
            .collect();
        assert_eq!(
            counts,
            [
                ("barcelona".to_string(), 0),
                ("hamburg".to_string(), 0),
                ("rom".to_string(), 2)
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_all_options_keeps_history() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();
        gateway.submit("CastVote", &["rom"]).await.unwrap();
        gateway.submit("DeleteAllOptions", &[]).await.unwrap();

        assert!(all_options(&gateway).await.is_empty());

        let entries = history(&gateway, "rom").await;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2]["isDeleted"], Value::Bool(true));
        assert_eq!(history(&gateway, "hamburg").await.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_all_options_leaves_voter_monitor() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();
        gateway.submit("AddToVoters", &["alice"]).await.unwrap();
        gateway.submit("DeleteAllOptions", &[]).await.unwrap();

        assert_eq!(voters(&gateway).await, ["alice"]);
    }
}
