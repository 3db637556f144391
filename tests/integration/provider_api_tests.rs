/*!
 * Provider HTTP client tests against a local stub server
 */

use anyhow::Result;
use bytes::Bytes;

use pagetrans::errors::{ProviderError, SubmissionError};
use pagetrans::providers::etranslation::ETranslation;
use pagetrans::providers::mouse_tm::MouseTm;
use pagetrans::providers::{MachineTranslator, PollResult, TranslationMemory};

use crate::common::StubServer;

fn client(server: &StubServer) -> ETranslation {
    ETranslation::new(&server.base_url, "user", "secret", 5).unwrap()
}

#[tokio::test]
async fn test_submit_shouldPostMultipartWithBasicAuth() -> Result<()> {
    let server = StubServer::start(vec![("200 OK", "12345".to_string())]).await?;

    let job_id = client(&server)
        .submit("en", "nl", Bytes::from("Hello there.\n\n"))
        .await?;

    assert_eq!(job_id, "12345");
    let request = &server.requests()[0];
    assert!(request.starts_with("POST /api/translate/document "));
    // base64("user:secret")
    assert!(request.contains("dXNlcjpzZWNyZXQ="));
    assert!(request.contains("name=\"source\"\r\n\r\nen"));
    assert!(request.contains("name=\"target\"\r\n\r\nnl"));
    assert!(request.contains("filename=\"sentences.txt\""));
    assert!(request.contains("Hello there.\n\n"));
    Ok(())
}

#[tokio::test]
async fn test_submit_withNegativeJobId_shouldBeRejected() -> Result<()> {
    let server = StubServer::start(vec![("200 OK", "-20000".to_string())]).await?;

    let result = client(&server).submit("en", "nl", Bytes::from("x\n")).await;

    assert!(matches!(result, Err(SubmissionError::Rejected(_))));
    Ok(())
}

#[tokio::test]
async fn test_submit_withStatusCodes_shouldMapErrors() -> Result<()> {
    let server = StubServer::start(vec![
        ("401 Unauthorized", String::new()),
        ("400 Bad Request", "bad language".to_string()),
        ("503 Service Unavailable", "down".to_string()),
    ])
    .await?;
    let mt = client(&server);

    assert!(matches!(
        mt.submit("en", "nl", Bytes::from("x\n")).await,
        Err(SubmissionError::Provider(ProviderError::AuthenticationError(_)))
    ));
    assert!(matches!(
        mt.submit("en", "nl", Bytes::from("x\n")).await,
        Err(SubmissionError::Rejected(_))
    ));
    assert!(matches!(
        mt.submit("en", "nl", Bytes::from("x\n")).await,
        Err(SubmissionError::Provider(ProviderError::ApiError { status_code: 503, .. }))
    ));
    Ok(())
}

#[tokio::test]
async fn test_poll_shouldBePendingUntilOk() -> Result<()> {
    let server = StubServer::start(vec![
        ("202 Accepted", String::new()),
        ("404 Not Found", String::new()),
        ("200 OK", "Hallo daar.\n\n".to_string()),
    ])
    .await?;
    let mt = client(&server);

    assert_eq!(mt.poll("42").await?, PollResult::Pending);
    assert_eq!(mt.poll("42").await?, PollResult::Pending);
    assert_eq!(mt.poll("42").await?, PollResult::Ready(Bytes::from("Hallo daar.\n\n")));
    assert!(server.requests()[2].starts_with("GET /api/translate/document/42 "));
    Ok(())
}

#[tokio::test]
async fn test_submit_withUnreachableEndpoint_shouldReturnConnectionError() {
    let mt = ETranslation::new("http://127.0.0.1:9/etranslation", "user", "secret", 2).unwrap();

    let result = mt.submit("en", "nl", Bytes::from("x\n")).await;

    assert!(matches!(
        result,
        Err(SubmissionError::Provider(ProviderError::ConnectionError(_)))
    ));
}

#[tokio::test]
async fn test_lookup_shouldSendQueryAndParseMatches() -> Result<()> {
    let body = r#"{"matches": [
        {"match": 1.0, "translation": "dit is een test", "segment": "This is a test."},
        {"match": 0.8, "translation": "dit is een toets"}
    ]}"#;
    let server = StubServer::start(vec![("200 OK", body.to_string())]).await?;
    let tm = MouseTm::new(&server.base_url, 5)?;

    let matches = tm.lookup("k1", "en-nl", "This is a test.").await?;

    assert_eq!(matches.len(), 2);
    assert!(matches[0].is_full_match());
    assert!(!matches[1].is_full_match());
    let request = &server.requests()[0];
    assert!(request.starts_with("GET /api/get?"));
    assert!(request.contains("conc=false"));
    assert!(request.contains("key=k1"));
    assert!(request.contains("langpair=en-nl"));
    assert!(request.contains("q=This+is+a+test."));
    Ok(())
}

#[tokio::test]
async fn test_lookup_withServerError_shouldReturnApiError() -> Result<()> {
    let server = StubServer::start(vec![("500 Internal Server Error", "boom".to_string())]).await?;
    let tm = MouseTm::new(&server.base_url, 5)?;

    let result = tm.lookup("", "en-nl", "anything").await;

    assert!(matches!(result, Err(ProviderError::ApiError { status_code: 500, .. })));
    Ok(())
}

#[tokio::test]
async fn test_addAndDeleteUnit_shouldPostForms() -> Result<()> {
    let server = StubServer::start(vec![("200 OK", String::new()), ("200 OK", String::new())]).await?;
    let tm = MouseTm::new(&server.base_url, 5)?;

    tm.add_unit("k1", "en-nl", "Good morning.", "Goedemorgen.").await?;
    tm.delete_unit("k1", "en-nl", "Good morning.", "Goedemorgen.").await?;

    let requests = server.requests();
    assert!(requests[0].starts_with("POST /api/set "));
    assert!(requests[0].contains("key=k1&langpair=en-nl&seg=Good+morning.&tra=Goedemorgen."));
    assert!(requests[1].starts_with("POST /api/delete "));
    assert!(requests[1].contains("seg=Good+morning."));
    Ok(())
}

#[tokio::test]
async fn test_importTmx_shouldUploadFilePart() -> Result<()> {
    let server = StubServer::start(vec![("200 OK", "imported".to_string())]).await?;
    let tm = MouseTm::new(&server.base_url, 5)?;

    tm.import_tmx("k1", "glossary", Bytes::from("<tmx version=\"1.4\"/>")).await?;

    let request = &server.requests()[0];
    assert!(request.starts_with("POST /api/tmx/import "));
    assert!(request.contains("name=\"key\"\r\n\r\nk1"));
    assert!(request.contains("name=\"name\"\r\n\r\nglossary"));
    assert!(request.contains("name=\"tmx\"; filename=\"glossary.tmx\""));
    assert!(request.contains("<tmx version=\"1.4\"/>"));
    Ok(())
}

#[tokio::test]
async fn test_unitCountAndLanguagePairs_shouldParseResponses() -> Result<()> {
    let server = StubServer::start(vec![
        ("200 OK", "42\n".to_string()),
        ("200 OK", "not a number".to_string()),
        ("200 OK", r#"{"langPairs": ["en-nl"]}"#.to_string()),
        ("200 OK", "TM is up".to_string()),
    ])
    .await?;
    let tm = MouseTm::new(&server.base_url, 5)?;

    assert_eq!(tm.unit_count("k1", "en-nl").await?, 42);
    assert!(matches!(tm.unit_count("k1", "en-nl").await, Err(ProviderError::ParseError(_))));
    assert_eq!(tm.language_pairs("k1").await?, vec!["en-nl"]);
    tm.health().await?;

    let requests = server.requests();
    assert!(requests[0].starts_with("GET /api/tu/amount?key=k1&langpair=en-nl "));
    assert!(requests[2].starts_with("GET /api/admin/tminfo?key=k1 "));
    assert!(requests[3].starts_with("GET /api/admin/tminfo "));
    Ok(())
}

#[tokio::test]
async fn test_health_withServerError_shouldFail() -> Result<()> {
    let server = StubServer::start(vec![("503 Service Unavailable", "maintenance".to_string())]).await?;
    let tm = MouseTm::new(&server.base_url, 5)?;

    assert!(matches!(tm.health().await, Err(ProviderError::ApiError { status_code: 503, .. })));
    Ok(())
}
