//! End-to-end batch behavior against recording collaborators.

use super::test_utils::*;
use imageseed::batch::{CatalogWarning, Disposition, PassSelection, RunMode, SkipReason};
use imageseed::client::ArtifactLocation;
use imageseed::entity::EntityKind;
use imageseed::error::{RequestFailure, SeedError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn test_building_generated_with_prompt_override() {
    let store = Arc::new(FixedStore {
        buildings: vec![building_row("b1", "Room 441", "sim-A", "office")],
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::ok());
    let client = Arc::new(RecordingClient::with_script([(
        "Room 441",
        Ok(ArtifactLocation::Url("https://x/y.avif".to_string())),
    )]));
    let runner = runner(
        store,
        catalogs(&[("Room 441", "prompt text")], &[]),
        auth.clone(),
        client.clone(),
    );

    let report = runner
        .run(PassSelection::from_flags(false, true), RunMode::Execute)
        .await
        .unwrap();

    let lines: Vec<String> = report.outcomes().map(|o| o.to_string()).collect();
    assert_eq!(lines, vec!["Room 441 -> https://x/y.avif".to_string()]);

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    let body = serde_json::to_value(&calls[0].request).unwrap();
    assert_eq!(body["extra"]["description_override"], "prompt text");
    assert_eq!(body["extra"]["building_type"], "office");
    assert_eq!(calls[0].request.owning_context_id, "sim-A");
}

#[tokio::test]
async fn test_agent_without_prompt_is_skipped_without_request() {
    let store = Arc::new(FixedStore {
        agents: vec![agent_row("a1", "Unknown Agent", "sim-A")],
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::ok());
    let client = Arc::new(RecordingClient::default());
    let runner = runner(
        store,
        catalogs(&[], &[("Mira Voss", "portrait")]),
        auth,
        client.clone(),
    );

    let report = runner
        .run(PassSelection::from_flags(true, false), RunMode::Execute)
        .await
        .unwrap();

    let outcome = report.outcomes().next().unwrap();
    assert_eq!(outcome.name, "Unknown Agent");
    assert_eq!(
        outcome.disposition,
        Disposition::Skipped {
            reason: SkipReason::NoPrompt
        }
    );
    assert_eq!(outcome.to_string(), "Unknown Agent -> SKIPPED (no prompt)");
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_timeout_does_not_stop_following_entities() {
    let store = Arc::new(FixedStore {
        buildings: vec![
            building_row("b1", "Relay Chamber 7", "sim-A", "embassy"),
            building_row("b2", "Visa Annex", "sim-A", "embassy"),
        ],
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::ok());
    let client = Arc::new(RecordingClient::with_script([(
        "Relay Chamber 7",
        Err(RequestFailure::Timeout("operation timed out".to_string())),
    )]));
    let runner = runner(
        store,
        catalogs(&[("Relay Chamber 7", "relays"), ("Visa Annex", "annex")], &[]),
        auth,
        client.clone(),
    );

    let report = runner
        .run(PassSelection::from_flags(false, true), RunMode::Execute)
        .await
        .unwrap();

    let outcomes: Vec<_> = report.outcomes().collect();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].name, "Relay Chamber 7");
    assert!(outcomes[0].disposition.is_failure());
    assert!(outcomes[0].to_string().starts_with("Relay Chamber 7 -> ERROR: request timed out"));
    assert_eq!(outcomes[1].to_string(), "Visa Annex -> https://img/b2.avif");
    assert_eq!(client.calls().len(), 2);
    assert_eq!(report.failure_count(), 1);
}

#[tokio::test]
async fn test_portraits_only_never_enumerates_buildings() {
    let store = Arc::new(FixedStore {
        buildings: vec![
            building_row("b1", "Room 441", "sim-A", "embassy"),
            building_row("b2", "Visa Annex", "sim-A", "embassy"),
        ],
        agents: vec![agent_row("a1", "Mira Voss", "sim-A")],
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::ok());
    let client = Arc::new(RecordingClient::default());
    let runner = runner(
        store.clone(),
        catalogs(&[("Room 441", "a"), ("Visa Annex", "b")], &[("Mira Voss", "c")]),
        auth,
        client.clone(),
    );

    let report = runner
        .run(PassSelection::from_flags(true, false), RunMode::Execute)
        .await
        .unwrap();

    assert_eq!(store.queried_kinds(), vec![EntityKind::Agent]);
    assert!(report.pass(EntityKind::Building).is_none());
    assert!(report.outcomes().all(|o| o.kind == EntityKind::Agent));
    assert!(client
        .calls()
        .iter()
        .all(|c| c.request.entity_type == EntityKind::Agent));
}

#[tokio::test]
async fn test_authenticates_once_and_reuses_token() {
    let store = Arc::new(FixedStore {
        buildings: vec![
            building_row("b1", "Room 441", "sim-A", "embassy"),
            building_row("b2", "Visa Annex", "sim-B", "embassy"),
        ],
        agents: vec![
            agent_row("a1", "Mira Voss", "sim-A"),
            agent_row("a2", "Sable Quist", "sim-B"),
        ],
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::ok());
    let client = Arc::new(RecordingClient::default());
    let runner = runner(
        store,
        catalogs(
            &[("Room 441", "a"), ("Visa Annex", "b")],
            &[("Mira Voss", "c"), ("Sable Quist", "d")],
        ),
        auth.clone(),
        client.clone(),
    );

    runner.run(PassSelection::all(), RunMode::Execute).await.unwrap();

    assert_eq!(auth.call_count(), 1);
    let calls = client.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls.iter().all(|c| c.token.as_str() == TEST_TOKEN));
}

#[tokio::test]
async fn test_each_prompted_entity_gets_exactly_one_request_with_verbatim_prompt() {
    let store = Arc::new(FixedStore {
        buildings: vec![
            building_row("b1", "Room 441", "sim-A", "embassy"),
            building_row("b2", "Boiler House", "sim-A", "embassy"),
            building_row("b3", "Cipher Vault", "sim-B", "embassy"),
        ],
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::ok());
    let client = Arc::new(RecordingClient::default());
    let prompts = [("Room 441", "room prompt"), ("Cipher Vault", "vault prompt")];
    let runner = runner(store, catalogs(&prompts, &[]), auth, client.clone());

    let report = runner
        .run(PassSelection::from_flags(false, true), RunMode::Execute)
        .await
        .unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    for (name, prompt) in prompts {
        let matching: Vec<_> = calls
            .iter()
            .filter(|c| c.request.entity_name == name)
            .collect();
        assert_eq!(matching.len(), 1, "exactly one request for {}", name);
        assert_eq!(matching[0].request.description_override(), Some(prompt));
    }
    let summary = report.pass(EntityKind::Building).unwrap().summary();
    assert_eq!(summary.generated, 2);
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn test_authentication_failure_issues_no_requests() {
    let store = Arc::new(FixedStore {
        buildings: vec![building_row("b1", "Room 441", "sim-A", "embassy")],
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::failing());
    let client = Arc::new(RecordingClient::default());
    let runner = runner(
        store,
        catalogs(&[("Room 441", "a")], &[]),
        auth.clone(),
        client.clone(),
    );

    let result = runner.run(PassSelection::all(), RunMode::Execute).await;

    assert!(matches!(result, Err(SeedError::Authentication(_))));
    assert_eq!(auth.call_count(), 1);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_entity_resolution_failure_aborts_before_authentication() {
    let store = Arc::new(FixedStore {
        fail: true,
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::ok());
    let client = Arc::new(RecordingClient::default());
    let runner = runner(store, catalogs(&[], &[]), auth.clone(), client.clone());

    let result = runner.run(PassSelection::all(), RunMode::Execute).await;

    assert!(matches!(result, Err(SeedError::EntityResolution(_))));
    assert_eq!(auth.call_count(), 0);
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_consecutive_requests_are_paced() {
    let pacing = Duration::from_millis(40);
    let store = Arc::new(FixedStore {
        buildings: vec![
            building_row("b1", "Room 441", "sim-A", "embassy"),
            building_row("b2", "Visa Annex", "sim-A", "embassy"),
        ],
        agents: vec![agent_row("a1", "Mira Voss", "sim-A")],
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::ok());
    let client = Arc::new(RecordingClient::with_script([(
        "Visa Annex",
        Err(RequestFailure::Status {
            status: 500,
            body: "boom".to_string(),
        }),
    )]));
    let runner = runner_with_pacing(
        store,
        catalogs(&[("Room 441", "a"), ("Visa Annex", "b")], &[("Mira Voss", "c")]),
        auth,
        client.clone(),
        pacing,
    );

    runner.run(PassSelection::all(), RunMode::Execute).await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 3);
    for pair in calls.windows(2) {
        assert!(pair[1].at.duration_since(pair[0].at) >= pacing);
    }
}

#[tokio::test]
async fn test_missing_image_url_reports_no_url() {
    let store = Arc::new(FixedStore {
        buildings: vec![building_row("b1", "Room 441", "sim-A", "embassy")],
        ..FixedStore::default()
    });
    let client = Arc::new(RecordingClient::with_script([(
        "Room 441",
        Ok(ArtifactLocation::Missing),
    )]));
    let runner = runner(
        store,
        catalogs(&[("Room 441", "a")], &[]),
        Arc::new(CountingAuthenticator::ok()),
        client,
    );

    let report = runner.run(PassSelection::all(), RunMode::Execute).await.unwrap();

    let outcome = report.outcomes().next().unwrap();
    assert_eq!(outcome.to_string(), "Room 441 -> NO URL");
    assert!(!report.has_failures());
}

#[tokio::test]
async fn test_dry_run_plans_without_authenticating() {
    let store = Arc::new(FixedStore {
        buildings: vec![
            building_row("b1", "Room 441", "sim-A", "embassy"),
            building_row("b2", "Boiler House", "sim-A", "embassy"),
        ],
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::ok());
    let client = Arc::new(RecordingClient::default());
    let runner = runner(
        store,
        catalogs(&[("Room 441", "a")], &[]),
        auth.clone(),
        client.clone(),
    );

    let report = runner
        .run(PassSelection::from_flags(false, true), RunMode::DryRun)
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(auth.call_count(), 0);
    assert!(client.calls().is_empty());
    let summary = report.pass(EntityKind::Building).unwrap().summary();
    assert_eq!(summary.planned, 1);
    assert_eq!(summary.skipped, 1);
}

#[tokio::test]
async fn test_catalog_mismatches_become_warnings() {
    let store = Arc::new(FixedStore {
        buildings: vec![building_row("b1", "Boiler House", "sim-A", "embassy")],
        agents: vec![agent_row("a1", "Mira Voss", "sim-A")],
        ..FixedStore::default()
    });
    let runner = runner(
        store,
        catalogs(&[("Room 441", "a")], &[("Mira Voss", "b"), ("Sable Quist", "c")]),
        Arc::new(CountingAuthenticator::ok()),
        Arc::new(RecordingClient::default()),
    );

    let report = runner.run(PassSelection::all(), RunMode::Execute).await.unwrap();

    let warnings: Vec<String> = report.warnings.iter().map(|w| w.to_string()).collect();
    assert_eq!(
        warnings,
        vec![
            "building \"Boiler House\" has no prompt in the catalog".to_string(),
            "prompt \"Room 441\" has no matching building".to_string(),
            "prompt \"Sable Quist\" has no matching agent".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_warnings_delivered_before_authentication() {
    let store = Arc::new(FixedStore {
        buildings: vec![building_row("b1", "Boiler House", "sim-A", "embassy")],
        ..FixedStore::default()
    });
    let auth = Arc::new(CountingAuthenticator::failing());
    let seen: Arc<Mutex<Vec<(String, usize)>>> = Arc::new(Mutex::new(Vec::new()));

    let sink_auth = auth.clone();
    let sink_seen = seen.clone();
    let runner = runner(
        store,
        catalogs(&[], &[]),
        auth.clone(),
        Arc::new(RecordingClient::default()),
    )
    .with_warning_sink(Arc::new(move |warnings: &[CatalogWarning]| {
        let mut seen = sink_seen.lock().unwrap();
        for warning in warnings {
            seen.push((warning.to_string(), sink_auth.call_count()));
        }
    }));

    let result = runner.run(PassSelection::all(), RunMode::Execute).await;

    assert!(matches!(result, Err(SeedError::Authentication(_))));
    assert_eq!(auth.call_count(), 1);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            "building \"Boiler House\" has no prompt in the catalog".to_string(),
            0
        )]
    );
}

#[tokio::test]
async fn test_warning_sink_not_called_when_catalogs_match() {
    let store = Arc::new(FixedStore {
        buildings: vec![building_row("b1", "Room 441", "sim-A", "embassy")],
        ..FixedStore::default()
    });
    let calls = Arc::new(Mutex::new(0usize));
    let sink_calls = calls.clone();
    let runner = runner(
        store,
        catalogs(&[("Room 441", "a")], &[]),
        Arc::new(CountingAuthenticator::ok()),
        Arc::new(RecordingClient::default()),
    )
    .with_warning_sink(Arc::new(move |_: &[CatalogWarning]| {
        *sink_calls.lock().unwrap() += 1;
    }));

    let report = runner.run(PassSelection::all(), RunMode::Execute).await.unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(*calls.lock().unwrap(), 0);
}
