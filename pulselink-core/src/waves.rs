//! Waveform catalog: built-in and user-defined waveform sets.
//!
//! User waves live in a directory of `*.json` files, each a JSON array of
//! 16-hex-character segment strings; the file stem is the wave name. Files
//! are validated strictly at load time — an invalid segment rejects the whole
//! file — so a `WaveformSet` handed to the engine is always sendable.
//! Reload replaces the loaded set wholesale; there is no partial mutation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use log::{error, info, warn};
use regex::Regex;

use pulselink_types::{WaveformSegment, WaveformSet};

use crate::config::Config;

/// Name of the built-in wave used when configuration selects none.
pub const DEFAULT_WAVE: &str = "steady";

/// Built-in waves, always available even with an empty wave directory.
const BUILTIN_WAVES: &[(&str, &[&str])] = &[
    (
        "steady",
        &[
            "0A0A0A0A64646464",
            "0A0A0A0A64646464",
            "0A0A0A0A64646464",
        ],
    ),
    (
        "pulse",
        &[
            "0A0A0A0A00000000",
            "0A0A0A0A64646464",
            "0A0A0A0A00000000",
            "0A0A0A0A64646464",
        ],
    ),
    (
        "surge",
        &[
            "0A0A0A0A14141414",
            "0A0A0A0A28282828",
            "0A0A0A0A3C3C3C3C",
            "0A0A0A0A50505050",
            "0A0A0A0A64646464",
        ],
    ),
];

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[0-9A-Fa-f]{16}$").expect("segment regex"))
}

/// Catalog of named waveform sets.
pub struct WaveCatalog {
    dir: PathBuf,
    waves: Mutex<Vec<WaveformSet>>,
}

impl WaveCatalog {
    /// Open the catalog on the configured wave directory and load it.
    pub fn load(config: &Config) -> Self {
        Self::open(config.wave_dir())
    }

    /// Open the catalog on an explicit directory and load it.
    pub fn open(dir: PathBuf) -> Self {
        let catalog = Self {
            dir,
            waves: Mutex::new(builtin_sets()),
        };
        catalog.reload();
        catalog
    }

    /// Re-read the wave directory, replacing the loaded set wholesale.
    ///
    /// Built-ins are always present; a user file with the same name (case
    /// insensitive) shadows the built-in. Returns false if the directory
    /// could not be listed, in which case the previous set is kept.
    pub fn reload(&self) -> bool {
        let mut loaded = builtin_sets();

        if self.dir.exists() {
            let entries = match std::fs::read_dir(&self.dir) {
                Ok(entries) => entries,
                Err(e) => {
                    error!("failed to read wave directory {}: {}", self.dir.display(), e);
                    return false;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                match load_wave_file(&path) {
                    Ok(set) => {
                        loaded.retain(|w| !w.name().eq_ignore_ascii_case(set.name()));
                        loaded.push(set);
                    }
                    Err(e) => warn!("skipping wave file {}: {}", path.display(), e),
                }
            }
        }

        info!("wave catalog loaded: {} waves", loaded.len());
        *self.waves.lock().unwrap() = loaded;
        true
    }

    /// Look up a wave by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<WaveformSet> {
        self.waves
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// The built-in default wave.
    pub fn default_wave(&self) -> WaveformSet {
        self.get(DEFAULT_WAVE)
            .expect("built-in default wave always present")
    }

    /// All wave names, built-ins first.
    pub fn names(&self) -> Vec<String> {
        self.waves
            .lock()
            .unwrap()
            .iter()
            .map(|w| w.name().to_string())
            .collect()
    }

    /// Seed the wave directory with one file per built-in wave.
    /// Existing files are left alone.
    pub fn write_default_files(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        for (name, segments) in BUILTIN_WAVES {
            let path = self.dir.join(format!("{name}.json"));
            if path.exists() {
                continue;
            }
            let json = serde_json::to_string_pretty(segments)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            std::fs::write(&path, json)?;
        }
        Ok(())
    }
}

fn builtin_sets() -> Vec<WaveformSet> {
    BUILTIN_WAVES
        .iter()
        .map(|(name, segments)| {
            let segments = segments
                .iter()
                .map(|s| WaveformSegment::new(*s).expect("built-in segment valid"))
                .collect();
            WaveformSet::new(*name, segments).expect("built-in wave non-empty")
        })
        .collect()
}

fn load_wave_file(path: &Path) -> Result<WaveformSet, String> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| "unreadable file name".to_string())?
        .to_string();

    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let raw: Vec<String> = serde_json::from_str(&contents).map_err(|e| e.to_string())?;
    if raw.is_empty() {
        return Err("wave file is empty".into());
    }

    let mut segments = Vec::with_capacity(raw.len());
    for s in raw {
        if !segment_re().is_match(&s) {
            return Err(format!("segment {:?} does not match the 16-hex-char format", s));
        }
        let seg = WaveformSegment::new(s).map_err(|e| e.to_string())?;
        segments.push(seg);
    }

    WaveformSet::new(name, segments).ok_or_else(|| "wave name is empty".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn builtins_always_present() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = WaveCatalog::open(dir.path().to_path_buf());
        assert!(catalog.get("steady").is_some());
        assert!(catalog.get("pulse").is_some());
        assert!(catalog.get("surge").is_some());
        assert_eq!(catalog.default_wave().name(), DEFAULT_WAVE);
    }

    #[test]
    fn user_file_loads_and_lookup_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Tingle.json",
            r#"["0A0A0A0A11111111", "0A0A0A0A22222222"]"#,
        );
        let catalog = WaveCatalog::open(dir.path().to_path_buf());
        let wave = catalog.get("tingle").expect("loaded");
        assert_eq!(wave.name(), "Tingle");
        assert_eq!(wave.segments().len(), 2);
    }

    #[test]
    fn invalid_segment_rejects_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "bad.json",
            r#"["0A0A0A0A11111111", "not-a-segment"]"#,
        );
        let catalog = WaveCatalog::open(dir.path().to_path_buf());
        assert!(catalog.get("bad").is_none());
    }

    #[test]
    fn malformed_json_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.json", "{ not json");
        write(dir.path(), "good.json", r#"["0A0A0A0A33333333"]"#);
        let catalog = WaveCatalog::open(dir.path().to_path_buf());
        assert!(catalog.get("broken").is_none());
        assert!(catalog.get("good").is_some());
    }

    #[test]
    fn user_file_shadows_builtin() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "pulse.json", r#"["0A0A0A0A44444444"]"#);
        let catalog = WaveCatalog::open(dir.path().to_path_buf());
        let wave = catalog.get("pulse").unwrap();
        assert_eq!(wave.segments().len(), 1);
        assert_eq!(wave.segments()[0].as_str(), "0A0A0A0A44444444");
    }

    #[test]
    fn reload_replaces_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "first.json", r#"["0A0A0A0A55555555"]"#);
        let catalog = WaveCatalog::open(dir.path().to_path_buf());
        assert!(catalog.get("first").is_some());

        std::fs::remove_file(dir.path().join("first.json")).unwrap();
        write(dir.path(), "second.json", r#"["0A0A0A0A66666666"]"#);
        assert!(catalog.reload());

        assert!(catalog.get("first").is_none(), "removed file is gone after reload");
        assert!(catalog.get("second").is_some());
    }

    #[test]
    fn write_default_files_seeds_directory() {
        let dir = tempfile::tempdir().unwrap();
        let wave_dir = dir.path().join("waves");
        let catalog = WaveCatalog::open(wave_dir.clone());
        catalog.write_default_files().unwrap();

        for (name, _) in BUILTIN_WAVES {
            assert!(wave_dir.join(format!("{name}.json")).exists());
        }

        // Seeded files parse back into the same waves.
        assert!(catalog.reload());
        assert_eq!(
            catalog.get("surge").unwrap().segments().len(),
            BUILTIN_WAVES[2].1.len()
        );
    }

    #[test]
    fn non_json_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.txt", "not a wave");
        let catalog = WaveCatalog::open(dir.path().to_path_buf());
        // Only built-ins.
        assert_eq!(catalog.names().len(), BUILTIN_WAVES.len());
    }
}
