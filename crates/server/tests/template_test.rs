//! # Template Endpoint Tests
//!
//! End-to-end generation and refinement against a mocked Gemini API.

mod common;

use anyhow::Result;
use common::TestApp;
use consultkit::GRAPH_VISUALIZATION_OPTION;
use consultkit_test_utils::MockAiProvider;
use httpmock::Method;
use serde_json::{json, Value};

#[tokio::test]
async fn test_generate_template_streams_model_text() -> Result<()> {
    let app = TestApp::spawn().await?;
    let mock = app.mock_gemini_stream(
        "Company Name: Acme Corp",
        &["# Acme Corp\n\n", "## Introduction\n", "Acme makes rockets."],
    );

    let response = app
        .client
        .post(app.url("/generate-template"))
        .json(&json!({"company_name": "Acme Corp", "task_or_domain": "Launch pricing"}))
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );
    assert_eq!(
        response.text().await?,
        "# Acme Corp\n\n## Introduction\nAcme makes rockets."
    );
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_template_alias_behaves_like_generate() -> Result<()> {
    let app = TestApp::spawn().await?;
    let mock = app.mock_gemini_stream("Company Name: Initech", &["Hello ", "World"]);

    let response = app
        .client
        .post(app.url("/template"))
        .json(&json!({"company_name": "Initech", "task_or_domain": "TPS reports"}))
        .send()
        .await?;

    assert_eq!(response.text().await?, "Hello World");
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_refine_template_free_form_streams() -> Result<()> {
    let app = TestApp::spawn().await?;
    let mock = app.mock_gemini_stream("Please expand section as follows", &["Refined ", "text"]);

    let response = app
        .client
        .post(app.url("/refine-template"))
        .json(&json!({
            "template": "# Acme",
            "refinement_option": "Expand Section",
            "refinement_prompt": "Add market sizing."
        }))
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await?, "Refined text");
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_refine_template_graph_returns_png() -> Result<()> {
    let app = TestApp::spawn().await?;
    let mock = app.mock_gemini_generate(
        "Visualization data for: Revenue",
        "{2021: 10.5, 2022: 12.0, 2023: 14.2}",
    );

    let response = app
        .client
        .post(app.url("/refine-template"))
        .json(&json!({
            "template": "# Acme",
            "refinement_option": GRAPH_VISUALIZATION_OPTION,
            "visualize_data": "Revenue"
        }))
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.headers()["content-type"], "image/png");
    let bytes = response.bytes().await?;
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_refine_template_graph_without_mapping_is_500() -> Result<()> {
    let provider = MockAiProvider::new();
    provider.add_response("Visualization data for: Headcount", "No data available.");
    let app = TestApp::spawn_with_provider(Box::new(provider)).await?;

    let response = app
        .client
        .post(app.url("/refine-template"))
        .json(&json!({
            "template": "# Acme",
            "refinement_option": GRAPH_VISUALIZATION_OPTION,
            "visualize_data": "Headcount"
        }))
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await?;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("graph visualization"));
    Ok(())
}

#[tokio::test]
async fn test_refine_template_graph_without_subject_is_400() -> Result<()> {
    let provider = MockAiProvider::new();
    let app = TestApp::spawn_with_provider(Box::new(provider.clone())).await?;

    let response = app
        .client
        .post(app.url("/refine-template"))
        .json(&json!({
            "template": "# Acme",
            "refinement_option": GRAPH_VISUALIZATION_OPTION
        }))
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 400);
    assert!(provider.get_calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_provider_error_maps_to_bad_gateway() -> Result<()> {
    let app = TestApp::spawn().await?;
    let mock = app.mock_server.mock(|when, then| {
        when.method(Method::POST);
        then.status(403).body("API key not valid");
    });

    let response = app
        .client
        .post(app.url("/generate-template"))
        .json(&json!({"company_name": "Acme", "task_or_domain": "Audit"}))
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 502);
    let body: Value = response.json().await?;
    assert!(body["error"].as_str().unwrap().contains("403"));
    mock.assert();
    Ok(())
}
