use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod actors;
pub mod avatar;
pub mod config;
pub mod coordinator;
pub mod directives;
pub mod monitor;
pub mod render;
pub mod runtime;
pub mod sync;
pub mod world;

pub use avatar::{AvatarController, Command, Direction, Flow};
pub use config::{GuardedRegion, SimConfig, SpawnArea};
pub use render::{Surface, INSTRUCTIONS, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use runtime::{Session, SessionError};
pub use sync::{Gate, SharedWorld, ShutdownSignal, ShutdownToken};
pub use world::{load_map, Color, Element, GridState, MapError, Position};

pub const ROOT_ENV_VAR: &str = "HAUNT_ROOT";

const DEFAULT_MAP_FILE: &str = "default.txt";

/// Where the game finds its shipped assets.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub maps_dir: PathBuf,
}

impl AppPaths {
    fn at(root: PathBuf) -> Self {
        let maps_dir = maps_dir_of(&root);
        Self { root, maps_dir }
    }

    pub fn default_map(&self) -> PathBuf {
        self.maps_dir.join(DEFAULT_MAP_FILE)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("{var} is not valid unicode: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("cannot locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("{var}={path} has no assets/maps directory")]
    InvalidEnvRoot { var: &'static str, path: PathBuf },
    #[error(
        "no assets/maps directory above {searched_from}; set {var} to the game directory \
or pass a map file as the first argument"
    )]
    RootNotFound {
        searched_from: PathBuf,
        var: &'static str,
    },
}

/// Finds the game root: `HAUNT_ROOT` when set, otherwise the nearest ancestor
/// of the executable that holds `assets/maps`.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let path = canonical_or_given(Path::new(&value));
            if !holds_maps(&path) {
                return Err(StartupError::InvalidEnvRoot {
                    var: ROOT_ENV_VAR,
                    path,
                });
            }
            path
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            nearest_game_root(&exe).ok_or_else(|| StartupError::RootNotFound {
                searched_from: canonical_or_given(&exe),
                var: ROOT_ENV_VAR,
            })?
        }
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: ROOT_ENV_VAR,
                source,
            })
        }
    };
    Ok(AppPaths::at(root))
}

fn maps_dir_of(root: &Path) -> PathBuf {
    root.join("assets").join("maps")
}

fn holds_maps(root: &Path) -> bool {
    maps_dir_of(root).is_dir()
}

fn nearest_game_root(from: &Path) -> Option<PathBuf> {
    from.ancestors()
        .skip(1)
        .find(|dir| holds_maps(dir))
        .map(canonical_or_given)
}

fn canonical_or_given(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_without_maps_is_not_a_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        assert!(!holds_maps(temp.path()));
    }

    #[test]
    fn root_is_found_above_a_nested_executable() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(maps_dir_of(temp.path())).expect("mkdir");
        let exe_dir = temp.path().join("target").join("debug");
        fs::create_dir_all(&exe_dir).expect("mkdir");

        let root = nearest_game_root(&exe_dir.join("haunt")).expect("root");

        assert_eq!(root, canonical_or_given(temp.path()));
    }

    #[test]
    fn default_map_lives_under_assets() {
        let paths = AppPaths::at(PathBuf::from("/game"));
        assert_eq!(paths.maps_dir, PathBuf::from("/game/assets/maps"));
        assert_eq!(paths.default_map(), PathBuf::from("/game/assets/maps/default.txt"));
    }
}
