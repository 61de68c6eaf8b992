//! # End-to-End Elections
//!
//! Whole elections run through the gateway, including submissions that are
//! simulated concurrently and then committed one after the other.
//!
//! ## Flows Tested
//!
//! 1. Seed → ballots → tally → reset → reseed
//! 2. Guarded seeding
//! 3. Repeat voters rejected by `CastBallot`
//! 4. MVCC conflicts on option counters, the voter monitor and range scans

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use evote_contract::prelude::*;

    use crate::{init_test_logging, stepping_gateway};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    async fn votes(gateway: &Gateway, key: &str) -> u64 {
        let bytes = gateway.evaluate("GetOption", &[key]).await.unwrap();
        serde_json::from_slice::<OptionRecord>(&bytes).unwrap().votes
    }

    async fn tally(gateway: &Gateway) -> Vec<(String, u64)> {
        let bytes = gateway.evaluate("GetAllOptions", &[]).await.unwrap();
        serde_json::from_slice::<Vec<OptionRecord>>(&bytes)
            .unwrap()
            .into_iter()
            .map(|o| (o.name, o.votes))
            .collect()
    }

    // =============================================================================
    // FULL ELECTION
    // =============================================================================

    #[tokio::test]
    async fn test_full_election_cycle() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();

        for (voter, choice) in [
            ("alice", "Rom"),
            ("bob", "Hamburg"),
            ("carol", "rom"),
            ("dave", "Barcelona"),
            ("erin", "ROM"),
        ] {
            gateway.submit("CastBallot", &[voter, choice]).await.unwrap();
        }

        assert_eq!(
            tally(&gateway).await,
            [
                ("Barcelona".to_string(), 1),
                ("Hamburg".to_string(), 1),
                ("Rom".to_string(), 3)
            ]
        );
        let voters = gateway.evaluate("GetAllVoters", &[]).await.unwrap();
        assert_eq!(voters, br#"["alice","bob","carol","dave","erin"]"#);

        gateway.submit("ResetElection", &[]).await.unwrap();
        assert!(tally(&gateway).await.is_empty());
        assert_eq!(gateway.evaluate("GetAllVoters", &[]).await.unwrap(), b"[]");

        gateway.submit("InitLedger", &[]).await.unwrap();
        assert_eq!(votes(&gateway, "rom").await, 0);

        let stats = gateway.stats().await;
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.conflicts, 0);
        assert_eq!(stats.committed, 8);
    }

    #[tokio::test]
    async fn test_custom_ballot() {
        init_test_logging();
        let gateway = Gateway::open(
            Arc::new(InMemoryLedger::new()),
            VotingContract::new(ContractConfig {
                seed_options: vec!["Yes".into(), "No".into(), "Abstain".into()],
                voter_monitor_key: "ballotbox".into(),
            }),
        );
        gateway.submit("InitLedger", &[]).await.unwrap();
        gateway.submit("CastBallot", &["alice", "yes"]).await.unwrap();

        assert_eq!(votes(&gateway, "yes").await, 1);
        assert!(gateway.ledger().committed_value("ballotbox").unwrap().is_some());
        assert!(gateway.ledger().committed_value("voterMonitor").unwrap().is_none());

        let err = gateway.submit("CreateOption", &["ballot Box"]).await.unwrap_err();
        assert!(matches!(err, ContractError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_second_init_is_rejected() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();
        gateway.submit("CastVote", &["hamburg"]).await.unwrap();
        let height = gateway.ledger().height().unwrap();

        let err = gateway.submit("InitLedger", &[]).await.unwrap_err();
        assert!(matches!(err, ContractError::AlreadyExists { .. }));
        assert_eq!(gateway.ledger().height().unwrap(), height);
        assert_eq!(votes(&gateway, "hamburg").await, 1);
    }

    #[tokio::test]
    async fn test_repeat_ballot_is_rejected() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();
        gateway.submit("CastBallot", &["alice", "rom"]).await.unwrap();

        let err = gateway.submit("CastBallot", &["alice", "barcelona"]).await.unwrap_err();
        assert_eq!(err, ContractError::AlreadyVoted { voter: "alice".into() });
        assert!(!err.is_retryable());
        assert_eq!(votes(&gateway, "barcelona").await, 0);
    }

    #[tokio::test]
    async fn test_primitive_flow_does_not_guard_votes() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();

        // Check, vote, record as separate submissions.
        assert_eq!(gateway.evaluate("HasVoted", &["alice"]).await.unwrap(), b"false");
        gateway.submit("CastVote", &["rom"]).await.unwrap();
        gateway.submit("AddToVoters", &["alice"]).await.unwrap();

        // CastVote itself never consults the monitor.
        gateway.submit("CastVote", &["rom"]).await.unwrap();
        assert_eq!(votes(&gateway, "rom").await, 2);
    }

    // =============================================================================
    // CONCURRENT SUBMISSIONS
    // =============================================================================

    #[tokio::test]
    async fn test_concurrent_votes_on_same_option() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();

        let first = gateway.endorse("CastVote", &["rom"]).await.unwrap();
        let second = gateway.endorse("CastVote", &["rom"]).await.unwrap();

        gateway.commit(first).await.unwrap();
        let err = gateway.commit(second).await.unwrap_err();
        assert!(matches!(
            err,
            ContractError::Conflict { ref key, read: Some(1), committed: Some(2) } if key == "rom"
        ));
        assert_eq!(votes(&gateway, "rom").await, 1);

        // Resubmitting against the new snapshot succeeds.
        gateway.submit("CastVote", &["rom"]).await.unwrap();
        assert_eq!(votes(&gateway, "rom").await, 2);
    }

    #[tokio::test]
    async fn test_vote_receipts_verify() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();

        let first = gateway.endorse("CastVote", &["hamburg"]).await.unwrap();
        let second = gateway.endorse("CastVote", &["hamburg"]).await.unwrap();
        let receipt = String::from_utf8(first.payload.clone()).unwrap();
        let lost = String::from_utf8(second.payload.clone()).unwrap();
        gateway.commit(first).await.unwrap();
        gateway.commit(second).await.unwrap_err();

        let valid = gateway.verify(&receipt).await.unwrap().unwrap();
        assert!(valid.valid);
        assert_eq!(valid.validation_code, ValidationCode::Valid);
        assert_eq!(valid.height, Some(2));
        assert_eq!(valid.timestamp, format_cet(valid.timestamp_millis));

        let invalid = gateway.verify(&lost).await.unwrap().unwrap();
        assert!(!invalid.valid);
        assert_eq!(invalid.validation_code, ValidationCode::MvccReadConflict);
        assert_eq!(votes(&gateway, "hamburg").await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_votes_on_different_options() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();

        let rom = gateway.endorse("CastVote", &["rom"]).await.unwrap();
        let hamburg = gateway.endorse("CastVote", &["hamburg"]).await.unwrap();

        gateway.commit(hamburg).await.unwrap();
        gateway.commit(rom).await.unwrap();
        assert_eq!(votes(&gateway, "rom").await, 1);
        assert_eq!(votes(&gateway, "hamburg").await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_ballots_from_same_voter() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();

        let rom = gateway.endorse("CastBallot", &["alice", "rom"]).await.unwrap();
        let hamburg = gateway.endorse("CastBallot", &["alice", "hamburg"]).await.unwrap();

        gateway.commit(rom).await.unwrap();
        let err = gateway.commit(hamburg).await.unwrap_err();
        assert!(matches!(
            err,
            ContractError::Conflict { ref key, read: None, committed: Some(_) } if key == VOTER_MONITOR_KEY
        ));

        // Resubmitting now sees alice recorded.
        let err = gateway.submit("CastBallot", &["alice", "hamburg"]).await.unwrap_err();
        assert!(matches!(err, ContractError::AlreadyVoted { .. }));
        assert_eq!(votes(&gateway, "hamburg").await, 0);
    }

    #[tokio::test]
    async fn test_create_during_delete_all_is_a_phantom() {
        let gateway = stepping_gateway();
        gateway.submit("InitLedger", &[]).await.unwrap();

        let wipe = gateway.endorse("DeleteAllOptions", &[]).await.unwrap();
        gateway.submit("CreateOption", &["Paris"]).await.unwrap();

        let err = gateway.commit(wipe).await.unwrap_err();
        assert!(matches!(err, ContractError::Conflict { ref key, .. } if key == "paris"));
        assert_eq!(tally(&gateway).await.len(), 4);
        assert_eq!(gateway.stats().await.conflicts, 1);
    }

    #[tokio::test]
    async fn test_parallel_endorsement_tasks() {
        let gateway = Arc::new(stepping_gateway());
        gateway.submit("InitLedger", &[]).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gateway = Arc::clone(&gateway);
            handles.push(tokio::spawn(async move {
                gateway.endorse("CastVote", &["barcelona"]).await
            }));
        }

        let mut committed = 0;
        for handle in handles {
            let endorsement = handle.await.unwrap().unwrap();
            if gateway.commit(endorsement).await.is_ok() {
                committed += 1;
            }
        }

        assert_eq!(committed, 1);
        assert_eq!(votes(&gateway, "barcelona").await, 1);
        assert_eq!(gateway.stats().await.conflicts, 7);
    }
}
