//! Batch orchestrator
//!
//! Renders both badge faces for every spreadsheet row on a fixed-width worker
//! pool. A failing row never stops its siblings; all failures are collected
//! and the error log is rewritten once, after every row has been attempted.

use crate::{BatchError, Notifier};
use badge_template::{BadgeRenderer, Config, FontCache, Preset, RenderError, Side};
use parking_lot::Mutex;
use roster::{find_duplicates, missing_columns, validate_row, BatchRow, Sheet, ValidatedRow};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tracing::{debug, error, info, warn};

/// Final result of a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every row rendered; no error log was written
    Succeeded { rendered: usize },
    /// At least one error; the messages were written to `error_log`
    Failed {
        error_log: PathBuf,
        errors: Vec<String>,
    },
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Succeeded { .. })
    }
}

/// One line of the error log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// Spreadsheet line; 0 for batch-wide messages
    pub line: usize,
    pub message: String,
}

impl BatchEntry {
    fn row(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Runs batches against a loaded configuration
pub struct Orchestrator<'a> {
    config: &'a Config,
    fonts: FontCache,
    notifier: Option<Notifier>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            fonts: FontCache::new(),
            notifier: None,
        }
    }

    /// Report the outcome through a notification queue
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Share a font cache with other renderers
    pub fn with_font_cache(mut self, fonts: FontCache) -> Self {
        self.fonts = fonts;
        self
    }

    /// Read a spreadsheet and run the batch over it
    ///
    /// Every error returned here has already been sent to the notifier.
    ///
    /// # Arguments
    /// * `path` - Spreadsheet file
    /// * `preset_name` - Preset used for every row
    pub fn run_file<P: AsRef<Path>>(
        &self,
        path: P,
        preset_name: &str,
    ) -> Result<BatchOutcome, BatchError> {
        match Sheet::from_path(path) {
            Ok(sheet) => self.run(&sheet, preset_name),
            Err(e) => Err(self.fatal(BatchError::Roster(e))),
        }
    }

    /// Run the batch over an already loaded sheet
    ///
    /// Every error returned here has already been sent to the notifier.
    ///
    /// # Arguments
    /// * `sheet` - Spreadsheet rows
    /// * `preset_name` - Preset used for every row
    pub fn run(&self, sheet: &Sheet, preset_name: &str) -> Result<BatchOutcome, BatchError> {
        self.run_sheet(sheet, preset_name)
            .map_err(|err| self.fatal(err))
    }

    fn run_sheet(&self, sheet: &Sheet, preset_name: &str) -> Result<BatchOutcome, BatchError> {
        let missing = missing_columns(sheet);
        if !missing.is_empty() {
            let columns = missing.into_iter().map(str::to_string).collect();
            return Err(BatchError::MissingColumns(columns));
        }

        let Some(preset) = self.config.presets.get(preset_name) else {
            return Err(BatchError::PresetNotFound(preset_name.to_string()));
        };

        let mut entries = Vec::new();
        let duplicates = find_duplicates(sheet);
        if !duplicates.is_empty() {
            let list: Vec<&str> = duplicates.iter().map(String::as_str).collect();
            let message = format!("Duplicate Employee Numbers found: {}", list.join(", "));
            warn!(count = duplicates.len(), "{message}");
            entries.push(BatchEntry::row(0, message));
        }

        let renderer =
            BadgeRenderer::with_font_cache(&self.config.output_folder, self.fonts.clone());
        let workers = self.config.batch.workers.max(1).min(sheet.len().max(1));
        info!(
            preset = preset_name,
            rows = sheet.len(),
            workers,
            "starting batch"
        );

        let errors = Mutex::new(entries);
        let rendered = AtomicUsize::new(0);
        let (jobs, queue) = crossbeam::channel::unbounded::<&BatchRow>();

        thread::scope(|scope| {
            for worker in 0..workers {
                let queue = queue.clone();
                let (errors, rendered, renderer, duplicates) =
                    (&errors, &rendered, &renderer, &duplicates);
                scope.spawn(move || {
                    for row in queue.iter() {
                        let result = validate_row(row, duplicates)
                            .map_err(|e| e.to_string())
                            .and_then(|valid| {
                                render_row(renderer, preset, &valid).map_err(|e| {
                                    format!(
                                        "Row {}: Failed to generate badge for Employee ID {}: {e}",
                                        valid.line, valid.employee_number
                                    )
                                })
                            });
                        match result {
                            Ok(()) => {
                                rendered.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(message) => {
                                debug!(worker, line = row.line, "{message}");
                                errors.lock().push(BatchEntry::row(row.line, message));
                            }
                        }
                    }
                });
            }

            for row in sheet.rows() {
                if jobs.send(row).is_err() {
                    break;
                }
            }
            drop(jobs);
        });

        let mut entries = errors.into_inner();
        let rendered = rendered.into_inner();
        if entries.is_empty() {
            info!(rendered, "batch finished");
            if let Some(notifier) = &self.notifier {
                notifier.info(
                    "Success",
                    format!(
                        "All badges have been successfully generated and saved in the '{}' folder.",
                        self.config.output_folder.display()
                    ),
                );
            }
            return Ok(BatchOutcome::Succeeded { rendered });
        }

        entries.sort_by_key(|entry| entry.line);
        let errors: Vec<String> = entries.into_iter().map(|entry| entry.message).collect();
        let error_log = self.config.error_log.clone();
        write_error_log(&error_log, &errors)?;

        error!(
            failed = errors.len(),
            rendered,
            log = %error_log.display(),
            "batch finished with errors"
        );
        if let Some(notifier) = &self.notifier {
            notifier.error(
                "Batch Generation Errors",
                format!(
                    "Errors were encountered during batch generation. Please check the error log at:\n{}",
                    error_log.display()
                ),
            );
        }
        Ok(BatchOutcome::Failed { error_log, errors })
    }

    /// Report a fatal error to the notification queue and the error log
    fn fatal(&self, err: BatchError) -> BatchError {
        error!("{err}");
        let message = err.to_string();
        if let Some(notifier) = &self.notifier {
            notifier.error("Error", message.as_str());
        }
        if matches!(err, BatchError::Log { .. }) {
            return err;
        }
        if let Err(log_err) = write_error_log(&self.config.error_log, &[message]) {
            warn!("{log_err}");
        }
        err
    }
}

fn render_row(
    renderer: &BadgeRenderer,
    preset: &Preset,
    row: &ValidatedRow,
) -> Result<(), RenderError> {
    let front = preset.front.merge(Side::Front, row.front.clone());
    renderer.render(&front)?;
    let back = preset.back.merge(Side::Back, row.back.clone());
    renderer.render(&back)?;
    Ok(())
}

/// Rewrite the error log with one message per line
///
/// The parent directory is created when absent.
pub fn write_error_log(path: &Path, errors: &[String]) -> Result<(), BatchError> {
    let log_err = |source| BatchError::Log {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(log_err)?;
    }
    let mut file = std::fs::File::create(path).map_err(log_err)?;
    for message in errors {
        writeln!(file, "{message}").map_err(log_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_error_log_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("errors.txt");

        write_error_log(&path, &["first".into(), "second".into(), "third".into()]).unwrap();
        write_error_log(&path, &["only".into()]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "only\n");
    }

    #[test]
    fn test_write_error_log_bare_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.txt");
        write_error_log(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_outcome_is_success() {
        assert!(BatchOutcome::Succeeded { rendered: 0 }.is_success());
        assert!(!BatchOutcome::Failed {
            error_log: PathBuf::from("e.txt"),
            errors: vec![]
        }
        .is_success());
    }
}
