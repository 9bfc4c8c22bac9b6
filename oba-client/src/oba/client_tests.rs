//! Tests for the transit client against a scripted transport.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use tokio::time::Instant;

use super::*;
use crate::clock::{Clock, ManualClock};
use crate::domain::StopId;

const NOW_MS: i64 = 1_700_000_000_000;

fn stop(s: &str) -> StopId {
    StopId::parse(s).unwrap()
}

fn clock() -> ManualClock {
    ManualClock::new(DateTime::from_timestamp_millis(NOW_MS).unwrap())
}

fn stop_path(id: &str) -> String {
    format!("stop/{id}.json")
}

fn arrivals_path(id: &str) -> String {
    format!("arrivals-and-departures-for-stop/{id}.json")
}

fn stop_body(id: &str, name: &str, code: Option<&str>, direction: Option<&str>) -> String {
    let mut entry = serde_json::json!({
        "id": id,
        "name": name,
        "lat": 47.6563,
        "lon": -122.3129,
    });
    if let Some(code) = code {
        entry["code"] = code.into();
    }
    if let Some(direction) = direction {
        entry["direction"] = direction.into();
    }
    serde_json::json!({
        "code": 200,
        "text": "OK",
        "currentTime": NOW_MS,
        "data": { "entry": entry, "references": {} },
    })
    .to_string()
}

/// Arrivals body from (route, predicted offset ms, scheduled offset ms).
fn arrivals_body(items: &[(&str, Option<i64>, i64)]) -> String {
    let items: Vec<serde_json::Value> = items
        .iter()
        .map(|(route, predicted, scheduled)| {
            serde_json::json!({
                "routeId": format!("1_{route}"),
                "routeShortName": route,
                "tripHeadsign": "Downtown Seattle",
                "predictedArrivalTime": predicted.map(|p| NOW_MS + p),
                "scheduledArrivalTime": NOW_MS + scheduled,
            })
        })
        .collect();

    serde_json::json!({
        "code": 200,
        "data": { "entry": { "arrivalsAndDepartures": items } },
    })
    .to_string()
}

fn api_error_body(code: i64) -> String {
    serde_json::json!({ "code": code, "text": "resource not found" }).to_string()
}

fn make_client(
    mock: &Arc<MockTransport>,
    clock: &ManualClock,
    stops: &[&str],
) -> TransitClient<Arc<MockTransport>, ManualClock> {
    let config =
        ObaConfig::default().with_stop_ids(stops.iter().map(|s| stop(s)).collect());
    TransitClient::with_transport(config, Arc::clone(mock), clock.clone())
}

#[tokio::test(start_paused = true)]
async fn stations_parsed_with_optional_fields_absent() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(
        stop_path("1_10914"),
        stop_body("1_10914", "15th Ave NE & NE Campus Pkwy", Some("10914"), Some("S")),
    );
    mock.push_body(
        stop_path("1_11160"),
        stop_body("1_11160", "15th Ave NE & NE 55th St", None, None),
    );

    let client = make_client(&mock, &clock(), &["1_10914", "1_11160"]);
    let batch = client.fetch_stations().await;

    assert_eq!(batch.stations.len(), 2);
    assert!(batch.skipped.is_empty());

    assert_eq!(batch.stations[0].code(), Some("10914"));
    assert_eq!(batch.stations[0].direction(), Some("S"));
    assert_eq!(batch.stations[1].id(), &stop("1_11160"));
    assert_eq!(batch.stations[1].code(), None);
    assert_eq!(batch.stations[1].direction(), None);
}

#[tokio::test(start_paused = true)]
async fn non_200_api_code_excludes_station() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(stop_path("1_10914"), stop_body("1_10914", "A", None, None));
    mock.push_body(stop_path("1_11160"), api_error_body(404));

    let client = make_client(&mock, &clock(), &["1_10914", "1_11160"]);
    let batch = client.fetch_stations().await;

    assert_eq!(batch.stations.len(), 1);
    assert_eq!(batch.stations[0].id(), &stop("1_10914"));
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].stop_id, stop("1_11160"));
    assert!(matches!(
        batch.skipped[0].reason,
        ObaError::ApiCode { code: 404, .. }
    ));
    assert_eq!(batch.failure_message(), None);
}

#[tokio::test(start_paused = true)]
async fn missing_required_field_skips_stop() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(
        stop_path("1_10914"),
        r#"{"code":200,"data":{"entry":{"id":"1_10914","lat":47.6,"lon":-122.3}}}"#,
    );

    let client = make_client(&mock, &clock(), &["1_10914"]);
    let batch = client.fetch_stations().await;

    assert!(batch.stations.is_empty());
    assert!(matches!(batch.skipped[0].reason, ObaError::Json { .. }));
    assert!(batch.failure_message().unwrap().starts_with("Failed to load stations"));
}

#[tokio::test(start_paused = true)]
async fn second_call_within_ttl_uses_cache() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(stop_path("1_10914"), stop_body("1_10914", "A", None, None));

    let clock = clock();
    let client = make_client(&mock, &clock, &["1_10914"]);

    let first = client.fetch_stations().await;
    let requests = mock.request_count();
    clock.advance(chrono::Duration::seconds(299));
    let second = client.fetch_stations().await;

    assert_eq!(mock.request_count(), requests);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test(start_paused = true)]
async fn call_after_ttl_refetches() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(stop_path("1_10914"), stop_body("1_10914", "A", None, None));

    let clock = clock();
    let client = make_client(&mock, &clock, &["1_10914"]);

    client.fetch_stations().await;
    clock.advance(chrono::Duration::minutes(5));
    client.fetch_stations().await;

    assert_eq!(mock.count_for(&stop_path("1_10914")), 2);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_then_success_is_retried() {
    let mock = Arc::new(MockTransport::new());
    mock.push(stop_path("1_10914"), MockResponse::Status(429));
    mock.push_body(stop_path("1_10914"), stop_body("1_10914", "A", None, None));

    let client = make_client(&mock, &clock(), &["1_10914"]);
    let start = Instant::now();
    let batch = client.fetch_stations().await;

    assert_eq!(batch.stations.len(), 1);
    assert_eq!(mock.count_for(&stop_path("1_10914")), 2);
    assert!(start.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn retry_budget_exhausted_skips_only_that_stop() {
    let mock = Arc::new(MockTransport::new());
    for _ in 0..4 {
        mock.push(stop_path("1_10914"), MockResponse::Status(429));
    }
    mock.push_body(stop_path("1_11160"), stop_body("1_11160", "B", None, None));

    let client = make_client(&mock, &clock(), &["1_10914", "1_11160"]);
    let batch = client.fetch_stations().await;

    // One attempt plus three retries
    assert_eq!(mock.count_for(&stop_path("1_10914")), 4);
    assert_eq!(batch.stations.len(), 1);
    assert_eq!(batch.stations[0].id(), &stop("1_11160"));
    assert!(batch.skipped[0].reason.is_rate_limited());
}

#[tokio::test(start_paused = true)]
async fn server_error_retried_but_not_found_is_not() {
    let mock = Arc::new(MockTransport::new());
    mock.push(stop_path("1_10914"), MockResponse::Status(503));
    mock.push_body(stop_path("1_10914"), stop_body("1_10914", "A", None, None));
    mock.push(stop_path("1_11160"), MockResponse::Status(404));

    let client = make_client(&mock, &clock(), &["1_10914", "1_11160"]);
    let batch = client.fetch_stations().await;

    assert_eq!(mock.count_for(&stop_path("1_10914")), 2);
    assert_eq!(mock.count_for(&stop_path("1_11160")), 1);
    assert_eq!(batch.stations.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn all_stops_failing_is_not_cached() {
    let mock = Arc::new(MockTransport::new());
    mock.push(stop_path("1_10914"), MockResponse::Status(429));

    let client = make_client(&mock, &clock(), &["1_10914"]);
    let batch = client.fetch_stations().await;

    assert!(batch.stations.is_empty());
    assert_eq!(batch.failure_message().as_deref(), Some(RATE_LIMIT_MESSAGE));

    client.fetch_stations().await;
    assert_eq!(mock.count_for(&stop_path("1_10914")), 8);
}

#[tokio::test(start_paused = true)]
async fn requests_are_spaced_one_second_apart() {
    let mock = Arc::new(MockTransport::new());
    let ids = ["1_10914", "1_11160", "1_11370"];
    for id in ids {
        mock.push_body(stop_path(id), stop_body(id, id, None, None));
    }

    let client = make_client(&mock, &clock(), &ids);
    let start = Instant::now();
    let batch = client.fetch_stations().await;

    assert_eq!(batch.stations.len(), 3);
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(3));

    let paths: Vec<String> = mock.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, ids.map(stop_path).to_vec());
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_fetch() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(stop_path("1_10914"), stop_body("1_10914", "A", None, None));
    mock.push_body(stop_path("1_11160"), stop_body("1_11160", "B", None, None));

    let client = make_client(&mock, &clock(), &["1_10914", "1_11160"]);
    let (a, b) = futures::future::join(client.fetch_stations(), client.fetch_stations()).await;

    assert_eq!(mock.request_count(), 2);
    assert!(Arc::ptr_eq(&a, &b));
}

#[tokio::test(start_paused = true)]
async fn arrivals_sorted_by_minutes_until() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(
        arrivals_path("1_10914"),
        arrivals_body(&[
            ("A", None, 12 * 60_000),
            ("B", Some(-60_000), 5 * 60_000),
            ("C", None, 5 * 60_000),
        ]),
    );

    let client = make_client(&mock, &clock(), &[]);
    let arrivals = client.fetch_arrivals(&stop("1_10914")).await.unwrap();

    let now = client.clock().now();
    let minutes: Vec<i64> = arrivals.iter().map(|a| a.minutes_until(now)).collect();
    assert_eq!(minutes, vec![-1, 5, 12]);

    let routes: Vec<&str> = arrivals.iter().map(|a| a.route_name()).collect();
    assert_eq!(routes, vec!["B", "C", "A"]);
}

#[tokio::test(start_paused = true)]
async fn extreme_timestamps_sort_without_overflow() {
    let mock = Arc::new(MockTransport::new());
    let body = serde_json::json!({
        "code": 200,
        "data": { "entry": { "arrivalsAndDepartures": [
            { "routeId": "1_45", "routeShortName": "45", "scheduledArrivalTime": i64::MAX },
            { "routeId": "1_67", "routeShortName": "67", "scheduledArrivalTime": NOW_MS + 300_000 },
            { "routeId": "1_70", "routeShortName": "70", "scheduledArrivalTime": i64::MIN },
        ] } },
    });
    mock.push_body(arrivals_path("1_10914"), body.to_string());

    let client = make_client(&mock, &clock(), &[]);
    let arrivals = client.fetch_arrivals(&stop("1_10914")).await.unwrap();

    let routes: Vec<&str> = arrivals.iter().map(|a| a.route_name()).collect();
    assert_eq!(routes, vec!["70", "67", "45"]);
}

#[tokio::test(start_paused = true)]
async fn arrivals_request_window() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(arrivals_path("1_10914"), arrivals_body(&[]));

    let client = make_client(&mock, &clock(), &[]);
    client.fetch_arrivals(&stop("1_10914")).await.unwrap();

    let request = &mock.requests()[0];
    assert_eq!(request.path, "arrivals-and-departures-for-stop/1_10914.json");
    assert_eq!(
        request.query,
        vec![
            ("minutesBefore".to_string(), "0".to_string()),
            ("minutesAfter".to_string(), "60".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn scheduled_only_arrival_ten_minutes_out() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(
        arrivals_path("1_10914"),
        arrivals_body(&[("45", None, 600_000)]),
    );

    let client = make_client(&mock, &clock(), &[]);
    let arrivals = client.fetch_arrivals(&stop("1_10914")).await.unwrap();
    let now = client.clock().now();

    assert_eq!(arrivals[0].minutes_until(now), 10);
    assert_eq!(arrivals[0].countdown(now), "10 min");
}

#[tokio::test(start_paused = true)]
async fn no_arrivals_distinguished_from_failure() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(arrivals_path("1_10914"), arrivals_body(&[]));
    mock.push(arrivals_path("1_11160"), MockResponse::Status(500));

    let client = make_client(&mock, &clock(), &[]);

    let empty = client.fetch_arrivals(&stop("1_10914")).await;
    assert!(empty.unwrap().is_empty());

    let failed = client.fetch_arrivals(&stop("1_11160")).await;
    let err = failed.unwrap_err();
    assert!(matches!(err, ObaError::Status { status: 500, .. }));
    assert!(err.user_message("arrivals").starts_with("Failed to load arrivals"));
    assert_eq!(mock.count_for(&arrivals_path("1_11160")), 4);
}

#[tokio::test(start_paused = true)]
async fn arrivals_api_error_code() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(arrivals_path("1_10914"), api_error_body(404));

    let client = make_client(&mock, &clock(), &[]);
    let err = client.fetch_arrivals(&stop("1_10914")).await.unwrap_err();

    assert!(matches!(err, ObaError::ApiCode { code: 404, .. }));
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn refetch_arrivals_waits_before_request() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(arrivals_path("1_10914"), arrivals_body(&[]));

    let client = make_client(&mock, &clock(), &[]);
    let start = Instant::now();
    client.refetch_arrivals(&stop("1_10914")).await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn refetch_stations_still_honours_cache() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(stop_path("1_10914"), stop_body("1_10914", "A", None, None));

    let client = make_client(&mock, &clock(), &["1_10914"]);
    let first = client.fetch_stations().await;
    let second = client.refetch_stations().await;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stations_near_location() {
    let mock = Arc::new(MockTransport::new());
    mock.push_body(
        "stops-for-location.json",
        r#"{"code":200,"data":{"limitExceeded":false,"list":[
            {"id":"1_10914","name":"A","lat":47.6564,"lon":-122.3122},
            {"id":"1_10380","name":"B","code":"10380","lat":47.6613,"lon":-122.3134,"direction":"N"}
        ]}}"#,
    );

    let client = make_client(&mock, &clock(), &[]);
    let stations = client
        .fetch_stations_near(47.6588, -122.3130, 500)
        .await
        .unwrap();

    assert_eq!(stations.len(), 2);
    assert_eq!(stations[1].direction(), Some("N"));

    let request = &mock.requests()[0];
    assert_eq!(
        request.query,
        vec![
            ("lat".to_string(), "47.6588".to_string()),
            ("lon".to_string(), "-122.313".to_string()),
            ("radius".to_string(), "500".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn bundled_mock_data_serves_default_stops() {
    let data_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/data/mock_api");
    let mock = Arc::new(MockTransport::from_dir(data_dir).unwrap());
    let clock = ManualClock::new(DateTime::from_timestamp_millis(1_760_800_000_000).unwrap());
    let client =
        TransitClient::with_transport(ObaConfig::default(), Arc::clone(&mock), clock.clone());

    let batch = client.fetch_stations().await;
    assert_eq!(batch.stations.len(), 4);
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].stop_id, stop("1_10380"));

    let arrivals = client.fetch_arrivals(&stop("1_10914")).await.unwrap();
    let now = clock.now();
    let lines: Vec<String> = arrivals
        .iter()
        .map(|a| a.display_at(now).to_string())
        .collect();
    assert_eq!(
        lines,
        vec![
            "542 - Redmond Technology Station: 3 min",
            "45 - Loyal Heights Greenwood: 7 min",
            "67 - Unknown: 25 min",
        ]
    );

    assert!(client.fetch_arrivals(&stop("1_11160")).await.unwrap().is_empty());
}
