use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::database::{DatabaseConnection, DatabaseStats, JobStore, JobSummary, Repository};
use crate::language_utils::{self, langpair};
use crate::layout::{LayoutDocument, is_xml_path};
use crate::providers::etranslation::ETranslation;
use crate::providers::mouse_tm::MouseTm;
use crate::providers::{MachineTranslator, TranslationMemory};
use crate::translation::{
    FullMatchResolver, RetrieveOutcome, SubmitRequest, TranslatedDocument, TranslationOrchestrator,
};

// @module: Application controller for document translation

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    orchestrator: TranslationOrchestrator,
    // @field: Translation memory for maintenance calls
    memory: Arc<dyn TranslationMemory>,
    // @field: Set when jobs live in SQLite
    database: Option<DatabaseConnection>,
}

impl Controller {
    // @method: Create a controller talking to the configured services
    pub fn with_config(config: Config) -> Result<Self> {
        let mt = ETranslation::new(
            &config.mt.endpoint,
            config.mt.username.clone(),
            config.mt.password.clone(),
            config.mt.timeout_secs,
        )
        .context("Failed to create eTranslation client")?;
        let tm = MouseTm::new(&config.tm.endpoint, config.tm.timeout_secs)
            .context("Failed to create translation memory client")?;

        let database_path = config.storage.resolved_database_path()?;
        let database = DatabaseConnection::new(&database_path)?;
        let repository = Repository::new(database.clone());

        let mut controller = Self::with_backends(config, Arc::new(mt), Arc::new(tm), Arc::new(repository));
        controller.database = Some(database);
        Ok(controller)
    }

    /// Create a controller over explicit backends and job store
    pub fn with_backends(
        config: Config,
        mt: Arc<dyn MachineTranslator>,
        tm: Arc<dyn TranslationMemory>,
        store: Arc<dyn JobStore>,
    ) -> Self {
        let resolver = FullMatchResolver::new(tm.clone(), config.tm.key.clone(), config.tm.concurrent_requests);
        let orchestrator =
            TranslationOrchestrator::new(mt, resolver, store).with_overflow_policy(config.overflow_policy);

        Self {
            config,
            orchestrator,
            memory: tm,
            database: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Submit a layout document file (JSON or PAGE XML) and return the job id
    pub async fn submit_file(&self, input_file: &Path) -> Result<String> {
        let document = LayoutDocument::load(input_file)?;
        self.log_language_pair();

        let job_id = self
            .orchestrator
            .submit(self.submit_request(document))
            .await
            .with_context(|| format!("Failed to submit {:?}", input_file))?;

        info!("Submitted {:?} as job {}", input_file, job_id);
        Ok(job_id)
    }

    /// Poll a job once and write the translated document when it is finished.
    ///
    /// Returns false when the job is still running.
    pub async fn retrieve_job(&self, job_id: &str, output_file: &Path, force_overwrite: bool) -> Result<bool> {
        ensure_writable(output_file, force_overwrite)?;

        match self.orchestrator.retrieve(job_id).await? {
            RetrieveOutcome::NotReady => {
                info!("Job {} is not ready yet", job_id);
                Ok(false)
            }
            RetrieveOutcome::Ready(translated) => {
                self.save_translation(&translated, output_file)?;
                Ok(true)
            }
        }
    }

    /// Wait for a job with a spinner, giving up after `timeout`
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        output_file: &Path,
        timeout: Duration,
        force_overwrite: bool,
    ) -> Result<()> {
        ensure_writable(output_file, force_overwrite)?;

        let translated = self.wait_with_progress(job_id, timeout).await?;
        self.save_translation(&translated, output_file)
    }

    /// Submit a file, wait for its translation and write the result
    pub async fn translate_file(
        &self,
        input_file: &Path,
        output_file: &Path,
        timeout: Duration,
        force_overwrite: bool,
    ) -> Result<()> {
        let start_time = Instant::now();
        ensure_writable(output_file, force_overwrite)?;

        let job_id = self.submit_file(input_file).await?;
        let translated = self.wait_with_progress(&job_id, timeout).await?;
        self.save_translation(&translated, output_file)?;

        info!("Finished {:?} in {:.1}s", input_file, start_time.elapsed().as_secs_f64());
        Ok(())
    }

    /// Stored jobs, newest first
    pub async fn list_jobs(&self, skip: usize, limit: usize) -> Result<Vec<JobSummary>> {
        Ok(self.orchestrator.list_jobs(skip, limit).await?)
    }

    /// Database statistics, when jobs are stored in SQLite
    pub fn database_stats(&self) -> Result<Option<DatabaseStats>> {
        self.database.as_ref().map(|db| db.stats()).transpose()
    }

    /// Default output path: `<stem>.<target>.xml` for PAGE XML input,
    /// `<stem>.<target>.json` otherwise, next to the input
    pub fn output_filename(&self, input_file: &Path) -> PathBuf {
        let stem = input_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let extension = if is_xml_path(input_file) { "xml" } else { "json" };

        input_file.with_file_name(format!("{}.{}.{}", stem, self.config.target_language, extension))
    }

    /// Check that the translation memory answers
    pub async fn memory_health(&self) -> Result<()> {
        self.memory
            .health()
            .await
            .with_context(|| format!("Translation memory at {} is not available", self.config.tm.endpoint))
    }

    /// Store a translation unit for the configured language pair
    pub async fn add_memory_unit(&self, segment: &str, translation: &str) -> Result<()> {
        let pair = self.langpair();
        self.memory
            .add_unit(&self.config.tm.key, &pair, segment, translation)
            .await
            .context("Failed to add translation unit")?;

        info!("Added translation unit ({})", pair);
        Ok(())
    }

    /// Remove a translation unit for the configured language pair
    pub async fn delete_memory_unit(&self, segment: &str, translation: &str) -> Result<()> {
        let pair = self.langpair();
        self.memory
            .delete_unit(&self.config.tm.key, &pair, segment, translation)
            .await
            .context("Failed to delete translation unit")?;

        info!("Deleted translation unit ({})", pair);
        Ok(())
    }

    /// Upload a TMX file, named after the file unless `name` is given
    pub async fn import_tmx(&self, tmx_file: &Path, name: Option<&str>) -> Result<()> {
        let content = tokio::fs::read(tmx_file)
            .await
            .with_context(|| format!("Failed to read TMX file: {:?}", tmx_file))?;
        let name = match name {
            Some(name) => name.to_string(),
            None => tmx_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow!("Cannot derive a memory name from {:?}", tmx_file))?,
        };

        info!("Importing {:?} ({} bytes) as {:?}", tmx_file, content.len(), name);
        self.memory
            .import_tmx(&self.config.tm.key, &name, Bytes::from(content))
            .await
            .with_context(|| format!("Failed to import {:?}", tmx_file))?;
        Ok(())
    }

    /// Number of translation units for the configured language pair
    pub async fn memory_unit_count(&self) -> Result<u64> {
        Ok(self.memory.unit_count(&self.config.tm.key, &self.langpair()).await?)
    }

    /// Language pairs available under the configured key
    pub async fn memory_language_pairs(&self) -> Result<Vec<String>> {
        Ok(self.memory.language_pairs(&self.config.tm.key).await?)
    }

    fn langpair(&self) -> String {
        langpair(&self.config.source_language, &self.config.target_language)
    }

    fn submit_request(&self, document: LayoutDocument) -> SubmitRequest {
        SubmitRequest {
            document,
            source_language: self.config.source_language.clone(),
            target_language: self.config.target_language.clone(),
            use_tm: self.config.use_tm,
        }
    }

    fn log_language_pair(&self) {
        let source_name = language_utils::get_language_name(&self.config.source_language)
            .unwrap_or_else(|_| self.config.source_language.clone());
        let target_name = language_utils::get_language_name(&self.config.target_language)
            .unwrap_or_else(|_| self.config.target_language.clone());
        let memory = if self.config.use_tm { "with" } else { "without" };

        info!("{} -> {} ({} translation memory)", source_name, target_name, memory);
    }

    async fn wait_with_progress(&self, job_id: &str, timeout: Duration) -> Result<TranslatedDocument> {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(format!("Waiting for job {}", job_id));
        spinner.enable_steady_tick(Duration::from_millis(120));

        let result = tokio::time::timeout(
            timeout,
            self.orchestrator.retrieve_blocking(job_id, self.config.poll_interval()),
        )
        .await;
        spinner.finish_and_clear();

        match result {
            Ok(translated) => Ok(translated?),
            Err(_) => {
                warn!(
                    "Job {} still pending after {}s, retrieve it later with: pagetrans retrieve {}",
                    job_id,
                    timeout.as_secs(),
                    job_id
                );
                Err(anyhow!("Timed out waiting for job {}", job_id))
            }
        }
    }

    fn save_translation(&self, translated: &TranslatedDocument, output_file: &Path) -> Result<()> {
        translated.document.save_as(output_file)?;
        info!(
            "Success: job {} written to {:?} ({} lines)",
            translated.job_id,
            output_file,
            translated.document.line_count()
        );
        Ok(())
    }
}

fn ensure_writable(output_file: &Path, force_overwrite: bool) -> Result<()> {
    if output_file.exists() && !force_overwrite {
        return Err(anyhow!(
            "Output file already exists: {:?}. Use -f to force overwrite.",
            output_file
        ));
    }
    Ok(())
}
