use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;
use triage_api::{build_app_with_generator, ServerSettings};
use triage_llm::{Generator, ScriptedGenerator};

fn emergency_script() -> ScriptedGenerator {
    ScriptedGenerator::new()
        .with_rule("Classify the symptom", "Emergency")
        .with_rule(
            "certified dietitian",
            "Diet Suggestion: Avoid heavy meals until you have been examined.",
        )
        .with_rule(
            "hospital assistant",
            "### Specialist\nCardiologist\n\n### Hospitals\n- Lilavati Hospital, Bandra – Cardiology\n- Kokilaben Hospital, Andheri – Emergency Cardiac Care",
        )
}

fn app_with(generator: ScriptedGenerator) -> Router {
    build_app_with_generator(Generator::scripted(generator), &ServerSettings::default())
}

fn form_request(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn health_reports_generator_and_metrics() {
    let app = app_with(emergency_script());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["generator"], "scripted");
    assert_eq!(parsed["metrics"]["requests_total"], 0);
}

#[tokio::test]
async fn form_submission_renders_all_sections() {
    let generator = emergency_script();
    let app = app_with(generator.clone());

    let response = app
        .oneshot(form_request(
            "/triage",
            "symptom=I+have+chest+pain+and+can%27t+breathe&city=Mumbai",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_text(response).await;
    assert!(page.contains("'I have chest pain and can't breathe'"));
    assert!(page.contains("seems to be an emergency! Please act fast."));
    assert!(page.contains("Contact emergency services immediately."));
    assert!(page.contains("Diet Suggestion: Avoid heavy meals"));
    assert!(page.contains("<h3>Hospitals</h3>"));
    assert!(page.contains("Lilavati Hospital, Bandra"));
    assert!(page.contains("action=\"/next-action\""));
    assert_eq!(generator.call_count(), 3);
}

#[tokio::test]
async fn empty_symptom_warns_without_running_pipeline() {
    let generator = emergency_script();
    let app = app_with(generator.clone());

    let response = app
        .oneshot(form_request("/triage", "symptom=&city=Mumbai"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let page = body_text(response).await;
    assert!(page.contains("Please enter both symptom and city."));
    assert!(!page.contains("<h2>Diagnosis</h2>"));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn generation_failure_shows_failure_page() {
    let app = app_with(emergency_script().failing_on("hospital assistant"));

    let response = app
        .oneshot(form_request("/triage", "symptom=chest+pain&city=Pune"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let page = body_text(response).await;
    assert!(page.contains("Something went wrong"));
    assert!(!page.contains("<h2>Diagnosis</h2>"));
}

#[tokio::test]
async fn json_triage_returns_full_record() {
    let app = app_with(emergency_script());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/triage")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "symptom": "I have chest pain and can't breathe" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let record: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(record["city"], "Mumbai");
    assert_eq!(record["category"], "emergency");
    assert_eq!(record["branch"], "emergency");
    assert_eq!(record["advice"], "Contact emergency services immediately.");
    for field in ["symptom", "city", "category", "answer", "advice", "diet", "follow_up"] {
        let value = record[field].as_str().unwrap_or_default();
        assert!(!value.is_empty(), "{field} should be populated");
    }
    assert!(record["diet"]
        .as_str()
        .unwrap()
        .starts_with(triage_core::DIET_PREFIX));
}

#[tokio::test]
async fn json_triage_rejects_blank_symptom() {
    let app = app_with(emergency_script());

    let request = Request::builder()
        .method("POST")
        .uri("/v1/triage")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "symptom": "   ", "city": "Mumbai" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let parsed: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(parsed["error"], "empty_input");
}

#[tokio::test]
async fn next_action_is_display_only() {
    let generator = emergency_script();
    let app = app_with(generator.clone());

    let response = app
        .clone()
        .oneshot(form_request("/next-action", "choice=speak_to_doctor"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("Connecting you to a doctor now..."));

    let response = app
        .oneshot(form_request("/next-action", "choice=teleport"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn metrics_track_completed_and_rejected_runs() {
    let app = app_with(emergency_script());

    let ok = app
        .clone()
        .oneshot(form_request("/triage", "symptom=chest+pain&city=Mumbai"))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let rejected = app
        .clone()
        .oneshot(form_request("/triage", "symptom=cough&city="))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&body_text(health).await).unwrap();
    assert_eq!(parsed["metrics"]["requests_total"], 2);
    assert_eq!(parsed["metrics"]["completed_total"], 1);
    assert_eq!(parsed["metrics"]["rejected_inputs_total"], 1);
    assert_eq!(parsed["metrics"]["branches"]["emergency"], 1);
}
