use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ghost_trail_core::{CompletedLevels, ProgressStore, NORMAL_LEVEL_COUNT};
use thiserror::Error;

/// Errors raised while decoding a stored progress string.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ProgressError {
    /// More flags than there are regular levels.
    #[error("progress holds {found} flags but only {max} levels exist", max = NORMAL_LEVEL_COUNT)]
    TooManyFlags {
        /// Number of flags found.
        found: usize,
    },
    /// A character other than `0` or `1`.
    #[error("invalid progress flag {flag:?} at offset {offset}")]
    InvalidFlag {
        /// Offending character.
        flag: char,
        /// Character offset within the trimmed string.
        offset: usize,
    },
}

/// Encodes the flags as one `0`/`1` digit per level.
pub(crate) fn encode(completed: &CompletedLevels) -> String {
    completed
        .flags()
        .iter()
        .map(|flag| if *flag { '1' } else { '0' })
        .collect()
}

/// Decodes a progress string; missing trailing flags count as not completed.
pub(crate) fn decode(value: &str) -> Result<CompletedLevels, ProgressError> {
    let trimmed = value.trim();
    let found = trimmed.chars().count();
    if found > NORMAL_LEVEL_COUNT {
        return Err(ProgressError::TooManyFlags { found });
    }

    let mut flags = [false; NORMAL_LEVEL_COUNT];
    for ((offset, flag), slot) in trimmed.chars().enumerate().zip(flags.iter_mut()) {
        *slot = match flag {
            '1' => true,
            '0' => false,
            _ => return Err(ProgressError::InvalidFlag { flag, offset }),
        };
    }
    Ok(CompletedLevels::from_flags(flags))
}

/// Progress persisted in a small text file.
#[derive(Clone, Debug)]
pub(crate) struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn try_load(&self) -> Result<CompletedLevels> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read progress at {}", self.path.display()))?;
        let completed = decode(&contents)
            .with_context(|| format!("corrupt progress at {}", self.path.display()))?;
        Ok(completed)
    }

    fn try_store(&self, completed: &CompletedLevels) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, encode(completed))
            .with_context(|| format!("failed to write progress to {}", self.path.display()))
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self) -> CompletedLevels {
        if !self.path.exists() {
            return CompletedLevels::default();
        }
        self.try_load().unwrap_or_else(|error| {
            log::warn!("{error:#}; starting without progress");
            CompletedLevels::default()
        })
    }

    fn store(&mut self, completed: &CompletedLevels) {
        match self.try_store(completed) {
            Ok(()) => log::debug!("saved progress {}", encode(completed)),
            Err(error) => log::error!("{error:#}"),
        }
    }
}
