#![allow(clippy::unwrap_used)]
// Integration tests for `Advisor` and its query cache against a mock server.

use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agrisage_api::{ApiClient, Session};
use agrisage_core::{
    Advisor, AdvisorConfig, CacheEvent, CoreError, CreateCropRequest, CropId, Farm, FarmId,
    FarmRequest, GrowthStage, Priority, QueryKey, QueryState, RecommendationKind, SessionState,
    SoilType,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Advisor) {
    let server = MockServer::start().await;
    let api = ApiClient::with_client(
        &server.uri(),
        reqwest::Client::new(),
        Session::in_memory(Some("tok")),
    )
    .unwrap();
    let config = AdvisorConfig::new(server.uri().parse().unwrap());
    (server, Advisor::from_client(api, &config))
}

fn farm_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "farmer_id": 1,
        "name": name,
        "size_acres": 12.5,
        "soil_type": "loamy",
        "latitude": -1.29,
        "longitude": 36.82,
        "created_at": "2024-02-01T08:00:00",
        "crops": []
    })
}

fn wheat_json() -> serde_json::Value {
    json!({
        "id": 11,
        "farm_id": 1,
        "crop_name": "Wheat-A",
        "planting_date": "2024-03-01T00:00:00",
        "expected_harvest_date": null,
        "current_stage": "seedling",
        "area_planted": 2.5,
        "created_at": "2024-03-01T09:00:00"
    })
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_reads_issue_one_request() {
    let (server, advisor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/farms"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([farm_json(1, "North"), farm_json(2, "South")]))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reads = (0..6).map(|_| {
        let advisor = advisor.clone();
        tokio::spawn(async move { advisor.farms().await })
    });
    for handle in reads.collect::<Vec<_>>() {
        assert_eq!(handle.await.unwrap().unwrap().len(), 2);
    }

    // A fresh value is served without another request.
    assert_eq!(advisor.farms().await.unwrap()[1].name, "South");
    assert_eq!(advisor.cache().state(&QueryKey::Farms), QueryState::Fresh);
}

#[tokio::test]
async fn recommendations_are_sorted_by_priority() {
    let (server, advisor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/farms/1/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1, "farm_id": 1, "crop_id": null,
                "recommendation_type": "general", "title": "Mulch",
                "description": "Retain moisture", "priority": "low",
                "status": "pending", "created_at": "2024-03-01T06:00:00"
            },
            {
                "id": 2, "farm_id": 1, "crop_id": 11,
                "recommendation_type": "irrigation", "title": "Water now",
                "description": "Heat wave", "priority": "high",
                "status": "pending", "created_at": "2024-03-01T06:00:00"
            }
        ])))
        .mount(&server)
        .await;

    let recs = advisor.recommendations(FarmId::new(1)).await.unwrap();
    assert_eq!(recs[0].priority, Priority::High);
    assert_eq!(recs[1].kind, RecommendationKind::Other);
}

#[tokio::test]
async fn crop_advice_becomes_a_pending_recommendation() {
    let (server, advisor) = setup().await;

    Mock::given(method("GET"))
        .and(path("/farms/1/crops/11/fertilizer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fertilizer_type": "DAP",
            "amount_per_acre": 50.0,
            "application_method": "band placement",
            "timing": "at planting",
            "reason": "Seedlings need phosphorus"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rec = advisor
        .fertilizer(FarmId::new(1), CropId::new(11))
        .await
        .unwrap();
    assert!(rec.id.is_none());
    assert_eq!(rec.kind, RecommendationKind::Fertilizer);
    assert_eq!(rec.title, "Apply DAP at 50.0 kg/acre");
    assert_eq!(rec.description, "Seedlings need phosphorus");
}

#[tokio::test]
async fn forecast_days_out_of_range_sends_nothing() {
    let (server, advisor) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"forecast": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = advisor.forecast(FarmId::new(1), 6).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

#[tokio::test]
async fn failed_read_is_not_retried_until_refresh() {
    let (server, advisor) = setup().await;
    let farm = FarmId::new(3);

    Mock::given(method("GET"))
        .and(path("/farms/3/weather"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/farms/3/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "temperature": 21.0,
            "humidity": 70.0,
            "wind_speed": 1.5,
            "rainfall": 2.0,
            "source": "openweathermap"
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(advisor.weather(farm).await.is_err());
    assert!(advisor.weather(farm).await.is_err());
    assert_eq!(
        advisor.cache().state(&QueryKey::FarmWeather(farm)),
        QueryState::Error
    );

    advisor.refresh(QueryKey::FarmWeather(farm)).await.unwrap();
    assert_eq!(advisor.weather(farm).await.unwrap().rainfall_mm, 2.0);
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn created_crop_appears_in_reread_of_farm_crops() {
    let (server, advisor) = setup().await;
    let farm = FarmId::new(1);

    Mock::given(method("GET"))
        .and(path("/farms/1/crops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/farms/1/crops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wheat_json()])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/crops"))
        .and(body_string_contains("\"crop_name\":\"Wheat-A\""))
        .and(body_string_contains("\"planting_date\":\"2024-03-01T00:00:00\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(wheat_json()))
        .expect(1)
        .mount(&server)
        .await;

    assert!(advisor.farm_crops(farm).await.unwrap().is_empty());

    let created = advisor
        .create_crop(CreateCropRequest {
            farm,
            name: "Wheat-A".into(),
            planting_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            expected_harvest_date: None,
            stage: GrowthStage::Seedling,
            area_acres: 2.5,
        })
        .await
        .unwrap();

    let crops = advisor.farm_crops(farm).await.unwrap();
    assert_eq!(crops.len(), 1);
    let wheat = &crops[0];
    assert_eq!(wheat.id, created.id);
    assert_eq!(wheat.name, "Wheat-A");
    assert_eq!(wheat.stage, GrowthStage::Seedling);
    assert_eq!(wheat.area_acres, 2.5);
    assert_eq!(wheat.planting_date.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
}

#[tokio::test]
async fn invalid_coordinates_are_rejected_before_sending() {
    let (server, advisor) = setup().await;

    Mock::given(method("POST"))
        .and(path("/farms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(farm_json(1, "Nowhere")))
        .expect(0)
        .mount(&server)
        .await;

    for (latitude, longitude) in [(-90.5, 0.0), (91.0, 10.0), (0.0, 180.5), (0.0, -181.0)] {
        let err = advisor
            .create_farm(FarmRequest {
                name: "Nowhere".into(),
                size_acres: 3.0,
                soil_type: SoilType::Clay,
                latitude,
                longitude,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");
    }
}

#[tokio::test]
async fn update_farm_invalidates_farm_scoped_reads() {
    let (server, advisor) = setup().await;
    let farm = FarmId::new(4);

    Mock::given(method("GET"))
        .and(path("/farms/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(farm_json(4, "Old name")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/farms/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(farm_json(4, "New name")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/farms/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(farm_json(4, "New name")))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(advisor.farm(farm).await.unwrap().name, "Old name");
    advisor
        .update_farm(
            farm,
            FarmRequest {
                name: "New name".into(),
                size_acres: 12.5,
                soil_type: SoilType::Loamy,
                latitude: -1.29,
                longitude: 36.82,
            },
        )
        .await
        .unwrap();
    assert_eq!(advisor.farm(farm).await.unwrap().name, "New name");
}

#[tokio::test]
async fn unauthorized_read_expires_session_and_clears_cache() {
    let (server, advisor) = setup().await;
    let mut states = advisor.session_stream();

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "name": "Grace", "email": "grace@example.com",
            "created_at": "2024-01-01T00:00:00"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/farms"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;

    advisor.current_user().await.unwrap();
    let err = advisor.farms().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(advisor.session().expirations(), 1);
    assert_eq!(states.changed().await, Some(SessionState::Expired));
    assert!(advisor.cache().peek::<agrisage_core::Farmer>(&QueryKey::CurrentUser).is_none());
}

#[tokio::test]
async fn background_unauthorized_stops_serving_previous_identity() {
    let server = MockServer::start().await;
    let api = ApiClient::with_client(
        &server.uri(),
        reqwest::Client::new(),
        Session::in_memory(Some("tok")),
    )
    .unwrap();
    let mut config = AdvisorConfig::new(server.uri().parse().unwrap());
    config.stale_time = Duration::from_millis(50);
    let advisor = Advisor::from_client(api, &config);

    Mock::given(method("GET"))
        .and(path("/farms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([farm_json(1, "North")])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/farms"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&server)
        .await;

    assert_eq!(advisor.farms().await.unwrap().len(), 1);
    tokio::time::sleep(Duration::from_millis(80)).await;

    // The stale list is served once while its refresh is rejected.
    let mut events = advisor.cache().subscribe();
    assert_eq!(advisor.farms().await.unwrap()[0].name, "North");
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if event == CacheEvent::Cleared {
                break;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(advisor.session().state(), SessionState::Expired);
    assert!(advisor.cache().peek::<Vec<Farm>>(&QueryKey::Farms).is_none());

    let err = advisor.farms().await.unwrap_err();
    assert!(err.is_unauthorized());
}

// ── Overviews ───────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_totals_every_farm() {
    let (server, advisor) = setup().await;

    let mut north = farm_json(1, "North");
    north["crops"] = json!([wheat_json()]);
    Mock::given(method("GET"))
        .and(path("/farms"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([north, farm_json(2, "South")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dash = advisor.dashboard().await.unwrap();
    assert_eq!((dash.total_farms, dash.total_crops), (2, 1));
    assert_eq!(dash.total_acres, 25.0);

    // Served from the cache the second time.
    assert_eq!(advisor.dashboard().await.unwrap(), dash);
}

#[tokio::test]
async fn farm_overview_tolerates_missing_weather() {
    let (server, advisor) = setup().await;
    let farm = FarmId::new(1);

    Mock::given(method("GET"))
        .and(path("/farms/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(farm_json(1, "North")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/farms/1/crops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([wheat_json()])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/farms/1/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/farms/1/weather"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let overview = advisor.farm_overview(farm).await.unwrap();
    assert_eq!(overview.name, "North");
    assert_eq!(overview.crops, 1);
    assert_eq!(overview.recommendations, 0);
    assert_eq!(overview.temperature_c, None);
}

#[tokio::test]
async fn detection_refreshes_history() {
    let (server, advisor) = setup().await;
    let farm = FarmId::new(1);

    Mock::given(method("GET"))
        .and(path("/farms/1/disease-history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/farms/1/disease-history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1, "farm_id": 1, "crop_id": 11,
            "predicted_disease": "Leaf Rust", "confidence_score": 0.91,
            "detection_date": "2024-03-02T10:00:00"
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/farms/1/crops/11/disease-detection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "disease_name": "Leaf Rust",
            "confidence": 0.91,
            "severity": "High",
            "treatment_recommendations": ["Apply fungicide"],
            "prevention_tips": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(advisor.disease_history(farm).await.unwrap().is_empty());

    let image = agrisage_core::ImageUpload::new("leaf.jpg", vec![0xFF, 0xD8, 0xFF]);
    let detection = advisor
        .detect_disease(farm, CropId::new(11), image)
        .await
        .unwrap();
    assert_eq!(detection.confidence.to_string(), "91.0%");

    let history = advisor.disease_history(farm).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].disease, "Leaf Rust");
}

#[tokio::test]
async fn logout_clears_session_and_cache() {
    let (_server, advisor) = setup().await;
    advisor
        .cache()
        .fetch(QueryKey::Farms, async { Ok(Vec::<u8>::new()) })
        .await
        .unwrap();

    advisor.logout().unwrap();

    assert_eq!(advisor.session().state(), SessionState::SignedOut);
    assert!(advisor.cache().is_empty());
    assert!(advisor.session().token().is_none());
}

#[tokio::test]
async fn oneshot_restores_stored_token() {
    use std::sync::Arc;
    use tokio_stream::StreamExt;
    use wiremock::matchers::header;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/farms"))
        .and(header("authorization", "Bearer stored"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([farm_json(1, "North")])))
        .expect(1)
        .mount(&server)
        .await;

    let config = AdvisorConfig::new(server.uri().parse().unwrap());
    let store = Arc::new(agrisage_core::MemoryTokenStore::with_token("stored"));

    let names = Advisor::oneshot(&config, store, |advisor| async move {
        let mut states = advisor.session_stream().into_stream();
        assert_eq!(states.next().await, Some(SessionState::SignedIn));
        let farms = advisor.farms().await?;
        Ok(farms.iter().map(|f| f.name.clone()).collect::<Vec<_>>())
    })
    .await
    .unwrap();

    assert_eq!(names, vec!["North".to_owned()]);
}
