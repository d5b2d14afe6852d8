mod harness;

use std::time::Duration;

use conduit_core::{HealthStatus, PowerLevel};
use conduit_routing::{NoAvailableReason, RoutingError, SelectOptions};
use conduit_usage::Outcome;
use harness::catalog::{CatalogBuilder, priority_pair};
use harness::engine::EngineBuilder;

#[tokio::test]
async fn every_valid_tier_returns_matching_decision() {
    let engine = EngineBuilder::new().build();
    let catalog = priority_pair();

    for level in ["eco", "Balanced", "PRECISION"] {
        let decision = engine
            .select_model(level, "u1", &catalog, &SelectOptions::default())
            .await
            .unwrap();

        assert_eq!(decision.power_level, PowerLevel::parse(level).unwrap());
        assert_eq!(decision.provider_id, "a");
    }
}

#[tokio::test]
async fn unknown_tier_never_yields_a_decision() {
    let engine = EngineBuilder::new().build();

    for level in ["", "turbo", "eco2", "medium"] {
        let err = engine
            .select_model(level, "u1", &priority_pair(), &SelectOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::InvalidPowerLevel { .. }));
    }
}

#[tokio::test]
async fn priority_provider_fails_over_after_three_failures() {
    let engine = EngineBuilder::new().build();
    let catalog = priority_pair();
    let options = SelectOptions::default();

    let first = engine.select_model("eco", "u1", &catalog, &options).await.unwrap();
    assert_eq!(first.provider_id, "a");

    for _ in 0..3 {
        engine
            .report_outcome("u1", &first, &Outcome::failure(0, 0, Duration::from_millis(900), "502"))
            .await
            .unwrap();
    }
    assert_eq!(engine.health().status("a"), HealthStatus::Unhealthy);

    let second = engine.select_model("eco", "u1", &catalog, &options).await.unwrap();
    assert_eq!(second.provider_id, "b");

    // Recovery is driven only by a success signal
    engine.health().report_success("a");
    let third = engine.select_model("eco", "u1", &catalog, &options).await.unwrap();
    assert_eq!(third.provider_id, "a");
}

#[tokio::test]
async fn all_unhealthy_fails_every_tier() {
    let engine = EngineBuilder::new().build();
    let catalog = priority_pair();
    for provider in ["a", "b"] {
        for _ in 0..3 {
            engine.health().report_failure(provider, "down");
        }
    }

    for level in PowerLevel::ALL {
        let err = engine
            .select_model_typed(level, "u1", &catalog, &SelectOptions::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RoutingError::NoAvailableProvider {
                power_level: level,
                reason: NoAvailableReason::NoHealthyProvider,
            }
        );
        assert!(err.is_retryable());
    }
}

#[tokio::test]
async fn catalog_reported_unhealthy_provider_is_skipped() {
    let engine = EngineBuilder::new().build();
    let catalog = CatalogBuilder::new()
        .provider("a", 1)
        .model("a-eco", PowerLevel::Eco, 0.0, 8_000)
        .health(HealthStatus::Unhealthy)
        .provider("b", 2)
        .model("b-eco", PowerLevel::Eco, 0.0, 8_000)
        .provider("c", 0)
        .model("c-eco", PowerLevel::Eco, 0.0, 8_000)
        .disabled()
        .build();

    let decision = engine
        .select_model("eco", "u1", &catalog, &SelectOptions::default())
        .await
        .unwrap();
    assert_eq!(decision.provider_id, "b");
}

#[tokio::test]
async fn context_window_shortfall_is_distinguishable() {
    let engine = EngineBuilder::new().build();
    let catalog = CatalogBuilder::new()
        .provider("a", 1)
        .model("small", PowerLevel::Precision, 0.01, 8_192)
        .provider("b", 2)
        .model("large", PowerLevel::Precision, 0.02, 200_000)
        .build();

    let options = SelectOptions {
        min_context_window: Some(100_000),
        ..SelectOptions::default()
    };
    let decision = engine.select_model("precision", "u1", &catalog, &options).await.unwrap();
    assert_eq!(decision.model_id, "large");

    let too_big = SelectOptions {
        min_context_window: Some(1_000_000),
        ..SelectOptions::default()
    };
    let err = engine
        .select_model("precision", "u1", &catalog, &too_big)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RoutingError::NoAvailableProvider {
            power_level: PowerLevel::Precision,
            reason: NoAvailableReason::ContextWindowTooSmall,
        }
    );
}

#[tokio::test]
async fn decision_prices_drive_cost() {
    let engine = EngineBuilder::new().build();
    let catalog = priority_pair();
    for _ in 0..3 {
        engine.health().report_failure("a", "down");
    }

    let decision = engine
        .select_model("eco", "u1", &catalog, &SelectOptions::default())
        .await
        .unwrap();

    assert!((decision.cost_for(1000, 0) - 0.0001).abs() < f64::EPSILON);
    assert_eq!(decision.cost_for(0, 0).to_bits(), 0.0_f64.to_bits());
}
