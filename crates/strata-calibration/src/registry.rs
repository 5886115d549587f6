//! Lazy, cached access to calibration curves by name

use crate::{CalibrationCurve, CurveConfig, CurveError};
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard};

/// Registry of calibration curves
///
/// Curves are parsed on first access and cached; every later `load` of the
/// same name returns the same shared table. Curves registered in memory
/// take precedence over files.
///
/// # Thread Safety
///
/// The cache sits behind a mutex, so one registry can serve several chains.
/// The returned curves are immutable and shared through `Arc`.
#[derive(Debug)]
pub struct CurveRegistry {
    config: Option<CurveConfig>,
    cache: Mutex<HashMap<String, Arc<CalibrationCurve>>>,
}

impl CurveRegistry {
    /// Registry reading curve files according to `config`
    pub fn new(config: CurveConfig) -> Result<Self, CurveError> {
        config.validate().map_err(CurveError::Config)?;
        Ok(Self {
            config: Some(config),
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Registry with no backing directory; only registered curves are known
    pub fn in_memory() -> Self {
        Self {
            config: None,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Add (or replace) a curve under its own name
    pub fn register(&self, curve: CalibrationCurve) -> Arc<CalibrationCurve> {
        let curve = Arc::new(curve);
        self.lock()
            .insert(curve.name().to_string(), Arc::clone(&curve));
        curve
    }

    /// Get the named curve, reading and caching it on first access
    ///
    /// # Errors
    ///
    /// `CurveError::ResourceNotFound` if the name is neither registered nor
    /// present in the curve directory; I/O and parse errors otherwise.
    pub fn load(&self, name: &str) -> Result<Arc<CalibrationCurve>, CurveError> {
        if let Some(curve) = self.lock().get(name) {
            return Ok(Arc::clone(curve));
        }

        let path = self
            .config
            .as_ref()
            .and_then(|config| config.path_for(name))
            .filter(|path| path.is_file())
            .ok_or_else(|| CurveError::ResourceNotFound(name.to_string()))?;

        tracing::debug!("Loading calibration curve '{}' from {}", name, path.display());
        let text = fs::read_to_string(&path)?;
        let curve = CalibrationCurve::parse_14c(name, &text)?;
        tracing::info!(
            "Loaded calibration curve '{}' ({} rows, years {}..={})",
            name,
            curve.len(),
            curve.first_year(),
            curve.last_year()
        );

        // Another caller may have loaded the same curve meanwhile; keep the first
        let mut cache = self.lock();
        let cached = cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(curve));
        Ok(Arc::clone(cached))
    }

    /// Whether the named curve is already parsed and cached
    pub fn is_cached(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Names of every curve that `load` could return, sorted
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();

        if let Some(config) = &self.config {
            if let Ok(entries) = fs::read_dir(&config.directory) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    let matches_ext = path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e == config.extension);
                    if !matches_ext {
                        continue;
                    }
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
            }
        }

        names.sort();
        names.dedup();
        names
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<CalibrationCurve>>> {
        // The cache holds only fully built curves, so a poisoned lock is still consistent
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
