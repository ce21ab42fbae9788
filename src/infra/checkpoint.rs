// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights with Burn's named MessagePack
// recorder, gzip-compressed, full precision. The recorder appends
// the extension itself, so `model_path` asks it for the extension
// instead of guessing.
//
// Only the BEST model is kept: each save overwrites the same
// file, so after training the file holds the epoch with the
// highest validation score.
//
//   checkpoints/
//     bilstm_sentiment.mpk.gz          ← best sentiment weights
//     bilstm_sentiment_config.json     ← architecture of those weights
//     sentiment_config.json            ← run configuration
//     chirp_gru.mpk.gz
//     chirp_config.json
//     ...
//
// The config is needed to rebuild the exact architecture before
// the weights can be loaded into it.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::PathBuf};
use burn::{
    backend::NdArray,
    prelude::*,
    record::{FileRecorder, FullPrecisionSettings, NamedMpkGzFileRecorder},
};

type ModelRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Path of the record file for `name` (with extension).
    pub fn model_path(&self, name: &str) -> PathBuf {
        // The extension does not depend on the backend
        let ext = <ModelRecorder as FileRecorder<NdArray>>::file_extension();
        self.dir.join(format!("{name}.{ext}"))
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.model_path(name).exists()
    }

    /// Overwrite the stored weights for `name`.
    pub fn save_model<B: Backend, M: Module<B>>(&self, name: &str, model: &M) -> Result<()> {
        // Recorder adds the extension itself
        let stem = self.dir.join(name);
        model
            .clone()
            .save_file(stem.clone(), &ModelRecorder::new())
            .map_err(|e| anyhow!("Failed to save checkpoint '{}': {e:?}", stem.display()))?;

        tracing::debug!("Saved checkpoint '{}'", self.model_path(name).display());
        Ok(())
    }

    /// Load stored weights into `model`, which must have the same
    /// architecture as the saved one.
    pub fn load_model<B: Backend, M: Module<B>>(
        &self,
        name:   &str,
        model:  M,
        device: &B::Device,
    ) -> Result<M> {
        let stem = self.dir.join(name);
        if !self.has_model(name) {
            return Err(anyhow!(
                "No checkpoint at '{}'. Train the model first.",
                self.model_path(name).display()
            ));
        }

        tracing::info!("Loading checkpoint '{}'", self.model_path(name).display());
        model
            .load_file(stem.clone(), &ModelRecorder::new(), device)
            .map_err(|e| anyhow!("Cannot load checkpoint '{}': {e:?}", stem.display()))
    }

    /// Write `<name>_config.json`.
    pub fn save_config<T: Serialize>(&self, name: &str, cfg: &T) -> Result<()> {
        let path = self.dir.join(format!("{name}_config.json"));
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved config to '{}'", path.display());
        Ok(())
    }

    /// Read `<name>_config.json`.
    pub fn load_config<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(format!("{name}_config.json"));
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::NdArray,
        nn::{Linear, LinearConfig},
    };
    use serde::Deserialize;

    type TestBackend = NdArray;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Cfg {
        epochs: usize,
    }

    #[test]
    fn test_config_round_trip_names_file() {
        let dir  = tempfile::tempdir().unwrap();
        let mgr  = CheckpointManager::new(dir.path()).unwrap();
        mgr.save_config("sentiment", &Cfg { epochs: 3 }).unwrap();
        assert!(dir.path().join("sentiment_config.json").exists());
        assert_eq!(mgr.load_config::<Cfg>("sentiment").unwrap(), Cfg { epochs: 3 });
    }

    #[test]
    fn test_save_overwrites_single_file() {
        let dir    = tempfile::tempdir().unwrap();
        let mgr    = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let model: Linear<TestBackend> = LinearConfig::new(3, 2).init(&device);

        mgr.save_model("linear", &model).unwrap();
        mgr.save_model("linear", &model).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(files, vec![mgr.model_path("linear")]);
        assert!(mgr.has_model("linear"));
        assert!(mgr.model_path("linear").to_string_lossy().ends_with("linear.mpk.gz"));
    }

    #[test]
    fn test_load_restores_weights() {
        let dir    = tempfile::tempdir().unwrap();
        let mgr    = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let saved: Linear<TestBackend> = LinearConfig::new(3, 2).init(&device);
        mgr.save_model("linear", &saved).unwrap();

        let fresh: Linear<TestBackend> = LinearConfig::new(3, 2).init(&device);
        let loaded = mgr.load_model("linear", fresh, &device).unwrap();

        let a: Vec<f32> = saved.weight.val().into_data().iter::<f32>().collect();
        let b: Vec<f32> = loaded.weight.val().into_data().iter::<f32>().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir    = tempfile::tempdir().unwrap();
        let mgr    = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let model: Linear<TestBackend> = LinearConfig::new(3, 2).init(&device);
        assert!(mgr.load_model("absent", model, &device).is_err());
    }
}
