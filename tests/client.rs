use std::sync::Arc;

use exam_score_reader::{
    build_router, scores::SelectedImage, AppState, ClientError, Config, ScoreClient, ScoreView,
};
use mockito::Matcher;

fn exam_image() -> SelectedImage {
    SelectedImage {
        file_name: "exam.jpg".to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: b"fake-jpeg-bytes".to_vec(),
    }
}

#[tokio::test]
async fn fenced_result_is_parsed_into_scores() {
    let mut relay = mockito::Server::new_async().await;
    let mock = relay
        .mock("POST", "/api/upload")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data".to_string()),
        )
        .match_body(Matcher::Regex(r#"name="image"; filename="exam.jpg""#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success":true,"result":"```json\n{\"1\":\"5\",\"2\":\"7\"}\n```"}"#)
        .create_async()
        .await;

    let scores = ScoreClient::new(&relay.url())
        .submit(&exam_image())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(scores.get("1"), Some("5"));
    assert_eq!(scores.get("2"), Some("7"));
}

#[tokio::test]
async fn relay_error_status_is_an_upload_failure() {
    let mut relay = mockito::Server::new_async().await;
    relay
        .mock("POST", "/api/upload")
        .with_status(500)
        .with_body(r#"{"success":false,"message":"Failed to process image"}"#)
        .create_async()
        .await;

    let err = ScoreClient::new(&relay.url())
        .submit(&exam_image())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::UploadStatus(500)));
    assert_eq!(err.to_string(), "Image upload failed");
}

#[tokio::test]
async fn envelope_without_result_is_a_format_failure() {
    let mut relay = mockito::Server::new_async().await;
    relay
        .mock("POST", "/api/upload")
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .create_async()
        .await;

    let err = ScoreClient::new(&relay.url())
        .submit(&exam_image())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Format));
}

#[tokio::test]
async fn non_json_envelope_is_a_format_failure() {
    let mut relay = mockito::Server::new_async().await;
    relay
        .mock("POST", "/api/upload")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html>proxy error</html>")
        .create_async()
        .await;

    let err = ScoreClient::new(&relay.url())
        .submit(&exam_image())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Format));
    assert_eq!(err.to_string(), "Invalid response format");
}

#[tokio::test]
async fn malformed_result_clears_previous_scores() {
    let mut good_relay = mockito::Server::new_async().await;
    good_relay
        .mock("POST", "/api/upload")
        .with_status(200)
        .with_body(r#"{"success":true,"result":"{\"1\":\"5\"}"}"#)
        .create_async()
        .await;
    let mut bad_relay = mockito::Server::new_async().await;
    bad_relay
        .mock("POST", "/api/upload")
        .with_status(200)
        .with_body(r#"{"success":true,"result":"not json"}"#)
        .create_async()
        .await;

    let mut view = ScoreView::new();
    view.select(exam_image());

    let image = view.begin_submit().unwrap();
    view.finish(ScoreClient::new(&good_relay.url()).submit(&image).await);
    assert_eq!(view.scores().and_then(|s| s.get("1")), Some("5"));

    let image = view.begin_submit().unwrap();
    view.finish(ScoreClient::new(&bad_relay.url()).submit(&image).await);

    assert!(view.scores().is_none());
    assert!(view.error().is_some());
    assert!(view.can_submit());
}

#[tokio::test]
async fn client_and_relay_work_end_to_end() {
    let mut provider = mockito::Server::new_async().await;
    provider
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("data:image/jpeg;base64,".to_string()))
        .with_status(200)
        .with_body(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"1\":\"10\",\"2\":\"0\"}"}}]}"#,
        )
        .create_async()
        .await;

    let base_url = provider.url();
    let config = Config::from_lookup(move |name| match name {
        "OPENAI_API_KEY" => Some("sk-test".to_string()),
        "OPENAI_BASE_URL" => Some(base_url.clone()),
        _ => None,
    })
    .unwrap();
    let app = build_router(Arc::new(AppState::new(&config)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let scores = ScoreClient::new(&format!("http://{addr}"))
        .submit(&exam_image())
        .await
        .unwrap();

    assert_eq!(scores.render(), "Question 1: 10\nQuestion 2: 0\n");
}
