/*!
 * Integration tests for the submit/retrieve pipeline over SQLite job storage
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use pagetrans::database::{DatabaseConnection, JobStatus, JobStore, Repository};
use pagetrans::errors::PipelineError;
use pagetrans::layout::LayoutDocument;
use pagetrans::providers::mock::{MockMachineTranslator, MockTranslationMemory};
use pagetrans::translation::{FullMatchResolver, RetrieveOutcome, TranslationOrchestrator};

use crate::common;

fn echo(line: &str) -> String {
    line.to_string()
}

fn wrong(_line: &str) -> String {
    "WRONG".to_string()
}

#[tokio::test]
async fn test_translate_withEchoBackend_shouldReproduceOriginalLines() -> Result<()> {
    let mt = Arc::new(MockMachineTranslator::working().with_custom_response(echo));
    let (orchestrator, _repository) = common::sqlite_orchestrator(mt, Arc::new(MockTranslationMemory::new()))?;

    let translated = orchestrator
        .translate_blocking(common::submit_request(common::sample_document(), false), Duration::from_millis(1))
        .await?;

    assert_eq!(
        translated.region_lines,
        vec![
            vec!["This is a", "test sentence."],
            vec!["Good morning.", "See you later."],
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_translate_withBlankFirstLine_shouldKeepItBlankAfterStorage() -> Result<()> {
    let mt = Arc::new(MockMachineTranslator::working().with_custom_response(echo));
    let (orchestrator, _repository) = common::sqlite_orchestrator(mt, Arc::new(MockTranslationMemory::new()))?;
    let document = LayoutDocument::from_region_lines(&[vec!["", "Hello world."], vec!["   ", "Bye now."]]);

    let translated = orchestrator
        .translate_blocking(common::submit_request(document, false), Duration::from_millis(1))
        .await?;

    assert_eq!(translated.region_lines, vec![vec!["", "Hello world."], vec!["", "Bye now."]]);
    Ok(())
}

#[tokio::test]
async fn test_retrieve_withFullMatch_shouldUseMemoryTranslationVerbatim() -> Result<()> {
    let mt = Arc::new(MockMachineTranslator::working().with_custom_response(wrong));
    let tm = Arc::new(MockTranslationMemory::new().with_match("en-nl", "This is a test.", 1.0, "dit is een test"));
    let (orchestrator, _repository) = common::sqlite_orchestrator(mt.clone(), tm)?;
    let document = LayoutDocument::from_region_lines(&[vec!["This is a test."], vec!["Not in memory."]]);

    let job_id = orchestrator.submit(common::submit_request(document, true)).await?;
    let outcome = orchestrator.retrieve(&job_id).await?;

    assert_eq!(mt.payload_of(&job_id).as_deref(), Some("\nNot in memory.\n"));
    match outcome {
        RetrieveOutcome::Ready(translated) => {
            assert_eq!(translated.region_lines, vec![vec!["dit is een test"], vec!["WRONG"]]);
        }
        RetrieveOutcome::NotReady => panic!("job should be ready"),
    }
    Ok(())
}

#[tokio::test]
async fn test_retrieve_beforeCompletion_shouldReportNotReadyAndStayPending() -> Result<()> {
    common::init_test_logging();
    let mt = Arc::new(MockMachineTranslator::pending_for(2));
    let (orchestrator, repository) = common::sqlite_orchestrator(mt, Arc::new(MockTranslationMemory::new()))?;

    let job_id = orchestrator
        .submit(common::submit_request(common::sample_document(), false))
        .await?;

    for _ in 0..2 {
        assert_eq!(orchestrator.retrieve(&job_id).await?, RetrieveOutcome::NotReady);
        assert_eq!(repository.get_by_job_id(&job_id).await?.status, JobStatus::Pending);
    }

    assert!(matches!(orchestrator.retrieve(&job_id).await?, RetrieveOutcome::Ready(_)));
    let job = repository.get_by_job_id(&job_id).await?;
    assert_eq!(job.status, JobStatus::Done);
    assert!(job.finished_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_retrieve_afterReopeningDatabase_shouldFinishJob() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let db_path = temp_dir.path().join("jobs.db");
    let mt = Arc::new(MockMachineTranslator::working());

    let job_id = {
        let store: Arc<dyn JobStore> = Arc::new(Repository::new(DatabaseConnection::new(&db_path)?));
        let resolver = FullMatchResolver::new(Arc::new(MockTranslationMemory::new()), "", 2);
        let orchestrator = TranslationOrchestrator::new(mt.clone(), resolver, store);
        orchestrator
            .submit(common::submit_request(common::sample_document(), false))
            .await?
    };

    let store: Arc<dyn JobStore> = Arc::new(Repository::new(DatabaseConnection::new(&db_path)?));
    let resolver = FullMatchResolver::new(Arc::new(MockTranslationMemory::new()), "", 2);
    let orchestrator = TranslationOrchestrator::new(mt, resolver, store);

    match orchestrator.retrieve(&job_id).await? {
        RetrieveOutcome::Ready(translated) => {
            assert_eq!(translated.document.target_language.as_deref(), Some("nl"));
            assert_eq!(translated.region_lines[1], vec!["[nl] Good morning.", "[nl] See you later."]);
        }
        RetrieveOutcome::NotReady => panic!("job should be ready"),
    }
    Ok(())
}

#[tokio::test]
async fn test_submit_withRejectingBackend_shouldStoreFailedJob() -> Result<()> {
    let mt = Arc::new(MockMachineTranslator::rejecting());
    let (orchestrator, _repository) = common::sqlite_orchestrator(mt, Arc::new(MockTranslationMemory::new()))?;

    let result = orchestrator
        .submit(common::submit_request(common::sample_document(), false))
        .await;
    assert!(matches!(result, Err(PipelineError::Submission(_))));

    let jobs = orchestrator.list_jobs(0, 10).await?;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Failed);
    assert!(jobs[0].job_id.starts_with("failed-"));
    assert!(matches!(
        orchestrator.retrieve(&jobs[0].job_id).await,
        Err(PipelineError::JobFailed(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_retrieve_calledTwice_shouldGiveSameTranslation() -> Result<()> {
    let mt = Arc::new(MockMachineTranslator::working());
    let (orchestrator, repository) = common::sqlite_orchestrator(mt, Arc::new(MockTranslationMemory::new()))?;
    let job_id = orchestrator
        .submit(common::submit_request(common::sample_document(), false))
        .await?;

    let first = orchestrator.retrieve(&job_id).await?;
    let finished_at = repository.get_by_job_id(&job_id).await?.finished_at;
    let second = orchestrator.retrieve(&job_id).await?;

    assert_eq!(first, second);
    assert_eq!(repository.get_by_job_id(&job_id).await?.finished_at, finished_at);
    Ok(())
}

#[tokio::test]
async fn test_retrieve_withUnknownJob_shouldFail() -> Result<()> {
    let mt = Arc::new(MockMachineTranslator::working());
    let (orchestrator, _repository) = common::sqlite_orchestrator(mt, Arc::new(MockTranslationMemory::new()))?;

    assert!(matches!(
        orchestrator.retrieve("does-not-exist").await,
        Err(PipelineError::Store(_))
    ));
    Ok(())
}
