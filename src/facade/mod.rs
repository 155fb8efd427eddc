//! The configuration facade: the boundary the dialog talks to.
//!
//! `ConfigurationFacade` owns a [`CascadeEngine`] and the three collaborators,
//! and runs the effects each engine operation returns until the engine is
//! settled again. Every public operation returns a fresh
//! [`CascadeSnapshot`] for rendering.
//!
//! # Effect Execution
//!
//! - `Resolve`: the query runs under `resolution_timeout`; the result (or
//!   the failure) is handed back to the engine, which may request the next
//!   step during a restore.
//! - `Persist`: values are staged, then saved with exponential backoff. If
//!   the save is never acknowledged, execution stops and the dialog stays
//!   open.
//! - `CloseDialog`: only reached after a successful `Persist`.

use std::collections::VecDeque;

use chrono::{Locale, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use crate::cascade::{CascadeEngine, CascadeError, CascadeSnapshot, Resolution};
use crate::config::CascadeConfig;
use crate::effects::{DialogCloser, Effect, OptionSource, SettingsStore, run_query};
use crate::persistence::codec;
use crate::types::{DisplayOptionChange, Step, date_format_samples, date_locale};

pub mod service;

pub use service::{ConfigurationHandle, ServiceError, ServiceMessage, spawn};

/// Errors surfaced to the dialog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacadeError {
    /// The operation was rejected by the cascade.
    #[error(transparent)]
    Cascade(#[from] CascadeError),

    /// The settings store never acknowledged the save.
    #[error("settings were not saved: {0}")]
    Persistence(String),

    /// Settings were saved but the dialog could not be closed.
    #[error("dialog could not be closed: {0}")]
    DialogClose(String),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, FacadeError>;

/// The date format presets rendered for a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFormatSamples {
    /// The configured language tag, or `en` if it named no known locale.
    pub locale: String,
    pub samples: Vec<String>,
}

/// Drives a cascade against live collaborators.
pub struct ConfigurationFacade<S, P, D> {
    engine: CascadeEngine,
    source: S,
    settings: P,
    closer: D,
    config: CascadeConfig,
}

impl<S, P, D> ConfigurationFacade<S, P, D>
where
    S: OptionSource,
    P: SettingsStore,
    D: DialogCloser,
{
    pub fn new(source: S, settings: P, closer: D, config: CascadeConfig) -> Self {
        ConfigurationFacade {
            engine: CascadeEngine::new(),
            source,
            settings,
            closer,
            config,
        }
    }

    pub fn settings(&self) -> &P {
        &self.settings
    }

    pub fn closer(&self) -> &D {
        &self.closer
    }

    pub fn snapshot(&self) -> CascadeSnapshot {
        self.engine.snapshot()
    }

    /// Starts the session from whatever is already persisted.
    ///
    /// A finalized configuration is revalidated step by step; anything else
    /// starts from an empty cascade.
    #[instrument(skip(self))]
    pub async fn initialize(&mut self) -> Result<CascadeSnapshot> {
        let restored = codec::decode(&self.settings.get_all());
        debug!(restoring = restored.is_some(), "initializing");
        let effects = self.engine.begin(restored);
        self.run(effects).await?;
        Ok(self.snapshot())
    }

    #[instrument(skip(self))]
    pub async fn select(&mut self, step: Step, value: &str) -> Result<CascadeSnapshot> {
        self.engine.select(step, value)?;
        Ok(self.snapshot())
    }

    #[instrument(skip(self))]
    pub async fn lock(&mut self, step: Step) -> Result<CascadeSnapshot> {
        let effects = self.engine.lock(step)?;
        self.run(effects).await?;
        Ok(self.snapshot())
    }

    #[instrument(skip(self))]
    pub async fn unlock(&mut self, step: Step) -> Result<CascadeSnapshot> {
        let effects = self.engine.unlock(step)?;
        self.run(effects).await?;
        Ok(self.snapshot())
    }

    #[instrument(skip(self))]
    pub async fn reset(&mut self) -> Result<CascadeSnapshot> {
        let effects = self.engine.reset();
        self.run(effects).await?;
        Ok(self.snapshot())
    }

    pub fn set_option(&mut self, change: DisplayOptionChange) -> Result<CascadeSnapshot> {
        self.engine.set_option(change)?;
        Ok(self.snapshot())
    }

    /// Persists the configuration and closes the dialog.
    ///
    /// Returns the locked worksheet name handed to the closer. If the save
    /// fails the dialog stays open and finalize may be called again.
    #[instrument(skip(self))]
    pub async fn finalize(&mut self) -> Result<String> {
        let effects = self.engine.finalize()?;
        let closed = self.run(effects).await?;
        let worksheet = closed.ok_or(FacadeError::Cascade(CascadeError::NotConfigured))?;
        info!(worksheet = %worksheet, "configuration finalized");
        Ok(worksheet)
    }

    /// The date format presets rendered for `date`.
    pub fn date_format_samples(&self, date: NaiveDate) -> DateFormatSamples {
        let (locale, tag) = match date_locale(&self.config.locale) {
            Some(locale) => (locale, self.config.locale.clone()),
            None => {
                warn!(locale = %self.config.locale, "unknown locale, rendering dates in en");
                (Locale::en_US, "en".to_string())
            }
        };
        DateFormatSamples {
            locale: tag,
            samples: date_format_samples(date, locale),
        }
    }

    /// Executes effects until the engine is settled.
    ///
    /// Returns the worksheet passed to the closer, if a `CloseDialog` ran.
    async fn run(&mut self, effects: Vec<Effect>) -> Result<Option<String>> {
        let mut queue: VecDeque<Effect> = effects.into();
        let mut closed = None;

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Resolve(request) => {
                    let outcome =
                        match timeout(self.config.resolution_timeout, run_query(&self.source, &request.query))
                            .await
                        {
                            Ok(outcome) => outcome,
                            Err(_) => Err(format!(
                                "no answer within {}s",
                                self.config.resolution_timeout.as_secs()
                            )),
                        };
                    let resolution = Resolution::for_request(&request, outcome);
                    queue.extend(self.engine.apply_resolution(resolution).into_effects());
                }
                Effect::Persist { entries } => {
                    for (key, value) in entries {
                        self.settings.set(&key, value);
                    }
                    self.save_with_retry().await?;
                }
                Effect::CloseDialog { worksheet } => {
                    self.closer
                        .close(&worksheet)
                        .await
                        .map_err(|e| FacadeError::DialogClose(e.to_string()))?;
                    closed = Some(worksheet);
                }
            }
        }

        Ok(closed)
    }

    async fn save_with_retry(&mut self) -> Result<()> {
        let retry = self.config.save_retry;
        let mut delays = retry.delays();
        let mut attempts = 1;

        loop {
            let message = match self.settings.save().await {
                Ok(()) => {
                    debug!(attempts, "settings saved");
                    return Ok(());
                }
                Err(e) => e.to_string(),
            };

            let Some(delay) = delays.next() else {
                error!(attempts, error = %message, "settings save failed");
                return Err(FacadeError::Persistence(message));
            };

            warn!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %message,
                "settings save failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempts += 1;
        }
    }
}
