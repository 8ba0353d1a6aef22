//! Rule persistence.
//!
//! The JSON store rewrites the whole table on every mutation; the table is
//! small (a few hundred variants) and full rewrites keep the on-disk shape
//! trivially consistent. A missing file means "never written" and triggers
//! seeding by the normalizer.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use procsearch_core::traits::RuleStore;
use procsearch_core::types::RuleTable;

/// File-backed store holding a `category -> rules` JSON document.
pub struct JsonRuleStore {
    path: PathBuf,
}

impl JsonRuleStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl RuleStore for JsonRuleStore {
    fn load(&self) -> Result<Option<RuleTable>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading rule store {}", self.path.display()))?;
        let table: RuleTable = serde_json::from_str(&raw)
            .with_context(|| format!("parsing rule store {}", self.path.display()))?;
        Ok(Some(table))
    }

    fn save(&self, rules: &RuleTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating rule store dir {}", parent.display()))?;
            }
        }
        let raw = serde_json::to_string_pretty(rules)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("writing rule store {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "rule table persisted");
        Ok(())
    }
}

/// Ephemeral store for tests and throwaway runs; behaves like a file that
/// starts out absent. `set_fail_saves` switches the store into an
/// I/O-failure mode for exercising the hard-error path.
#[derive(Default)]
pub struct MemoryRuleStore {
    table: Mutex<Option<RuleTable>>,
    fail_saves: AtomicBool,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preloaded(table: RuleTable) -> Self {
        Self { table: Mutex::new(Some(table)), fail_saves: AtomicBool::new(false) }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl RuleStore for MemoryRuleStore {
    fn load(&self) -> Result<Option<RuleTable>> {
        let guard = self.table.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, rules: &RuleTable) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated rule store I/O failure"));
        }
        let mut guard = self.table.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(rules.clone());
        Ok(())
    }
}
