/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use pagetrans::app_config::Config;
use pagetrans::app_controller::Controller;
use pagetrans::database::{JobStatus, MemoryJobStore};
use pagetrans::layout::LayoutDocument;
use pagetrans::providers::mock::{MockMachineTranslator, MockTranslationMemory};

use crate::common;

fn mock_controller(config: Config, mt: MockMachineTranslator) -> Controller {
    Controller::with_backends(
        config,
        Arc::new(mt),
        Arc::new(MockTranslationMemory::new().with_match("en-nl", "Good morning.", 1.0, "Goedemorgen.")),
        Arc::new(MemoryJobStore::new()),
    )
}

/// Test the controller initialization against a file database
#[tokio::test]
async fn test_withConfig_withDatabasePath_shouldOpenStorage() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut config = Config::default();
    config.storage.database_path = Some(temp_dir.path().join("db").join("jobs.db").to_string_lossy().into_owned());

    let controller = Controller::with_config(config)?;

    let stats = controller.database_stats()?.expect("sqlite storage should report stats");
    assert_eq!(stats.pending_jobs, 0);
    assert!(controller.list_jobs(0, 10).await?.is_empty());
    assert!(temp_dir.path().join("db").join("jobs.db").exists());
    Ok(())
}

#[tokio::test]
async fn test_translateFile_shouldWriteDocumentNextToInput() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_document(temp_dir.path(), "page.json")?;
    let controller = mock_controller(Config::default(), MockMachineTranslator::working());
    let output = controller.output_filename(&input);

    controller
        .translate_file(&input, &output, Duration::from_secs(5), false)
        .await?;

    assert_eq!(output, temp_dir.path().join("page.nl.json"));
    let translated = LayoutDocument::from_file(&output)?;
    assert_eq!(
        translated.translated_lines(),
        vec!["[nl] This is", "a test sentence.", "Goedemorgen.", "[nl] See you later."]
    );
    Ok(())
}

#[tokio::test]
async fn test_submitThenRetrieve_shouldFinishJob() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_document(temp_dir.path(), "page.json")?;
    let output = temp_dir.path().join("page.out.json");
    let mut config = Config::default();
    config.use_tm = false;
    config.poll_interval_ms = 1;
    let controller = mock_controller(config, MockMachineTranslator::pending_for(3));

    let job_id = controller.submit_file(&input).await?;
    assert!(!controller.retrieve_job(&job_id, &output, false).await?);

    controller
        .wait_for_job(&job_id, &output, Duration::from_secs(5), false)
        .await?;

    let jobs = controller.list_jobs(0, 10).await?;
    assert_eq!(jobs[0].job_id, job_id);
    assert_eq!(jobs[0].status, JobStatus::Done);
    assert_eq!(LayoutDocument::from_file(&output)?.translated_lines()[2], "[nl] Good morning.");
    Ok(())
}

#[test]
fn test_submitFile_withMissingInput_shouldFail() {
    let controller = mock_controller(Config::default(), MockMachineTranslator::working());

    let result = tokio_test::block_on(controller.submit_file(std::path::Path::new("/nonexistent/page.json")));

    assert!(result.is_err());
}
