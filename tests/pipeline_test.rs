//! End-to-end tests for a report run against a scripted detections API

use birdweather_digest::config::Config;
use birdweather_digest::fetcher::{
    DetectionSource, FetchError, PageQuery, PageResponse, RetryPolicy, StopReason,
};
use birdweather_digest::pipeline::{generate_summary, ReportError};
use birdweather_digest::report::{render, ReportFormat};
use chrono::{DateTime, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

/// Serves JSON bodies in order, the way the station API would.
struct ScriptedApi {
    pages: RefCell<VecDeque<Result<serde_json::Value, FetchError>>>,
    queries: RefCell<Vec<PageQuery>>,
}

impl ScriptedApi {
    fn new(pages: Vec<Result<serde_json::Value, FetchError>>) -> Self {
        Self {
            pages: RefCell::new(pages.into()),
            queries: RefCell::new(Vec::new()),
        }
    }

    fn requests(&self) -> usize {
        self.queries.borrow().len()
    }
}

impl DetectionSource for ScriptedApi {
    fn fetch_page(&self, query: &PageQuery) -> Result<PageResponse, FetchError> {
        self.queries.borrow_mut().push(query.clone());
        let body = self
            .pages
            .borrow_mut()
            .pop_front()
            .expect("pipeline requested more pages than scripted")?;
        serde_json::from_value(body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap()
}

fn config() -> Config {
    Config {
        station_token: "station-xyz".to_string(),
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        },
        ..Config::default()
    }
}

fn detection(id: u64, name: &str, confidence: f64, timestamp: &str, clip: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "timestamp": timestamp,
        "confidence": confidence,
        "species": {
            "commonName": name,
            "scientificName": format!("{name} scientific"),
            "imageUrl": format!("https://img.example/{id}.jpg")
        },
        "soundscape": { "url": clip, "startTime": 2.0, "endTime": 5.0 }
    })
}

fn page(detections: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({ "success": true, "detections": detections })
}

/// A page of `len` detections with descending ids starting at `first_id`.
fn filler_page(first_id: u64, len: u64) -> serde_json::Value {
    page(
        (0..len)
            .map(|i| {
                let name = if i % 2 == 0 { "House Sparrow" } else { "Mourning Dove" };
                detection(first_id - i, name, 0.6, "2024-05-02T05:30:00-04:00", "clip")
            })
            .collect(),
    )
}

#[test]
fn test_three_page_window() {
    let api = ScriptedApi::new(vec![
        Ok(filler_page(1000, 100)),
        Ok(filler_page(900, 100)),
        Ok(filler_page(800, 47)),
    ]);

    let run = generate_summary(&config(), &api, now()).unwrap();

    assert_eq!(api.requests(), 3);
    let queries = api.queries.borrow();
    assert!(queries[0].cursor.is_none());
    assert_eq!(queries[1].cursor.as_ref().unwrap().as_str(), "901");
    assert_eq!(queries[2].cursor.as_ref().unwrap().as_str(), "801");
    assert_eq!(queries[0].from, Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());

    let summary = &run.summary;
    assert_eq!(summary.total_detections, 247);
    assert_eq!(summary.total_species, 2);
    assert_eq!(summary.species[0].stat.name, "House Sparrow");
    assert_eq!(summary.species[0].stat.count, 124);
    assert_eq!(summary.species[1].stat.count, 123);
    // 05:30-04:00 is 09:30 UTC.
    assert_eq!(summary.species[0].hours[9].count, 124);
    assert_eq!(summary.species[0].hours[9].intensity, 255);
    assert_eq!(run.fetch_stats.stop_reason, StopReason::ShortPage);
}

#[test]
fn test_best_detection_per_species() {
    let api = ScriptedApi::new(vec![Ok(page(vec![
        detection(3, "A", 0.80, "2024-05-02T07:00:00Z", "a-first"),
        detection(2, "B", 0.90, "2024-05-02T06:00:00Z", "b"),
        detection(1, "A", 0.95, "2024-05-02T05:00:00Z", "a-best"),
    ]))]);

    let run = generate_summary(&config(), &api, now()).unwrap();
    let species = &run.summary.species;

    assert_eq!(species[0].stat.name, "A");
    assert_eq!(species[0].stat.count, 2);
    assert_eq!(species[0].stat.max_confidence, 0.95);
    assert_eq!(
        species[0].stat.best_soundscape.as_ref().unwrap().url,
        "a-best"
    );
    assert_eq!(species[1].stat.name, "B");
    assert_eq!(species[1].stat.count, 1);
    assert_eq!(species[1].stat.max_confidence, 0.90);

    for s in species {
        assert_eq!(s.stat.hour_counts.iter().sum::<u32>(), s.stat.count);
    }
}

#[test]
fn test_refused_first_page_gives_empty_report() {
    let api = ScriptedApi::new(vec![Ok(serde_json::json!({ "success": false }))]);

    let run = generate_summary(&config(), &api, now()).unwrap();

    assert_eq!(api.requests(), 1);
    assert!(run.summary.is_empty());
    assert_eq!(run.fetch_stats.stop_reason, StopReason::UpstreamRefused);
}

#[test]
fn test_empty_window_renders() {
    let api = ScriptedApi::new(vec![Ok(page(Vec::new()))]);

    let run = generate_summary(&config(), &api, now()).unwrap();
    assert_eq!(run.summary.total_species, 0);
    assert_eq!(run.summary.total_detections, 0);

    let document = render(&run.summary, ReportFormat::Html).unwrap();
    assert!(document.body.contains("0 Species, 0 Total Detections"));

    let json = render(&run.summary, ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json.body).unwrap();
    assert_eq!(value["total_species"], 0);
    assert_eq!(value["meta"]["station_token"], "station-xyz");
}

#[test]
fn test_transient_failure_is_retried_from_same_cursor() {
    let api = ScriptedApi::new(vec![
        Ok(filler_page(500, 100)),
        Err(FetchError::Server {
            status: 503,
            message: "maintenance".to_string(),
        }),
        Ok(filler_page(400, 3)),
    ]);

    let run = generate_summary(&config(), &api, now()).unwrap();

    assert_eq!(run.summary.total_detections, 103);
    assert_eq!(run.fetch_stats.retries, 1);
    let queries = api.queries.borrow();
    assert_eq!(queries[1].cursor, queries[2].cursor);
}

#[test]
fn test_fetch_failure_aborts_without_partial_report() {
    let api = ScriptedApi::new(vec![
        Ok(filler_page(500, 100)),
        Err(FetchError::Server {
            status: 403,
            message: "forbidden".to_string(),
        }),
    ]);

    let err = generate_summary(&config(), &api, now()).unwrap_err();
    assert!(matches!(
        err,
        ReportError::Fetch(FetchError::Server { status: 403, .. })
    ));
}

#[test]
fn test_malformed_record_aborts() {
    let mut bad = detection(1, "A", 0.5, "2024-05-02T07:00:00Z", "clip");
    bad["species"]
        .as_object_mut()
        .unwrap()
        .remove("scientificName");
    let api = ScriptedApi::new(vec![Ok(page(vec![bad]))]);

    let err = generate_summary(&config(), &api, now()).unwrap_err();
    match err {
        ReportError::Fetch(FetchError::Malformed(m)) => {
            assert_eq!(m.field, "species.scientificName")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_named_zone_buckets() {
    let mut config = config();
    config.hour_zone = "Europe/Berlin".to_string();
    let api = ScriptedApi::new(vec![Ok(page(vec![detection(
        1,
        "Blackbird",
        0.7,
        "2024-05-02T03:15:00Z",
        "clip",
    )]))]);

    let run = generate_summary(&config, &api, now()).unwrap();
    // CEST is UTC+2 in May.
    assert_eq!(run.summary.species[0].hours[5].count, 1);
    assert_eq!(run.summary.meta.hour_zone, "Europe/Berlin");
}

#[test]
fn test_invalid_config_issues_no_requests() {
    let mut config = config();
    config.station_token.clear();
    let api = ScriptedApi::new(Vec::new());

    let err = generate_summary(&config, &api, now()).unwrap_err();
    assert!(matches!(err, ReportError::Config(_)));
    assert_eq!(api.requests(), 0);
}

#[test]
fn test_oversized_window_is_rejected_before_fetching() {
    let mut config = config();
    config.hours = u32::MAX;
    let api = ScriptedApi::new(Vec::new());

    let err = generate_summary(&config, &api, now()).unwrap_err();
    assert!(matches!(err, ReportError::Config(_)));
    assert_eq!(api.requests(), 0);
}

#[test]
fn test_page_without_success_flag_is_a_decode_error() {
    let api = ScriptedApi::new(vec![Ok(serde_json::json!({
        "detections": [detection(1, "A", 0.5, "2024-05-02T07:00:00Z", "clip")]
    }))]);

    let err = generate_summary(&config(), &api, now()).unwrap_err();
    assert!(matches!(err, ReportError::Fetch(FetchError::Decode(_))));
    assert_eq!(api.requests(), 1);
}
