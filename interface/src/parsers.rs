use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{self, prelude::*},
    marker::PhantomData,
    path::PathBuf,
};
use thiserror::Error;

mod settings;
pub use settings::Settings;

const CONFIG_DIR: &str = "simple-sampler";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait ConfigPath {
    fn filename() -> PathBuf;
}

/// A JSON settings file in the user's config directory.
pub struct Config<T>
where
    T: Default + Serialize + for<'a> Deserialize<'a> + ConfigPath,
{
    path: PathBuf,
    _config: PhantomData<T>,
}

impl<T> Config<T>
where
    T: Default + Serialize + for<'a> Deserialize<'a> + ConfigPath,
{
    pub fn path() -> PathBuf {
        match directories::BaseDirs::new() {
            Some(dirs) => {
                let mut path = dirs.config_dir().to_path_buf();
                path.push(CONFIG_DIR);
                path.push(T::filename());
                path
            }
            None => T::filename(),
        }
    }

    pub fn new() -> Self {
        Self::at(Config::<T>::path())
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            _config: PhantomData,
        }
    }

    pub fn file_path(&self) -> &PathBuf {
        &self.path
    }

    fn load_from_file(&self) -> Result<T, ConfigError> {
        let mut file = File::open(&self.path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, config: &T) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(config)?;
        let mut file = File::create(&self.path)?;
        file.write_all(contents.as_bytes())?;

        Ok(())
    }

    fn create_empty(&self) -> Result<(), ConfigError> {
        self.save(&T::default())
    }

    /// Loads the file, writing the defaults first if it does not exist.
    pub fn load(&self) -> Result<T, ConfigError> {
        if !self.path.exists() {
            self.create_empty()?;
        }
        self.load_from_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_default_file_and_reads_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::<Settings>::at(dir.path().join("nested").join("settings.json"));

        let settings = config.load().unwrap();
        assert!(config.file_path().exists());
        assert_eq!(settings.polyphony, Settings::default().polyphony);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "polyphony": 8, "envelope": { "attack": 0.5 } }"#).unwrap();

        let settings = Config::<Settings>::at(path).load().unwrap();
        assert_eq!(settings.polyphony, 8);
        assert_eq!(settings.envelope.attack, 0.5);
        assert_eq!(settings.envelope.release, 0.1);
        assert!(settings.use_limiter);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Config::<Settings>::at(path).load(),
            Err(ConfigError::Json(_))
        ));
    }
}
