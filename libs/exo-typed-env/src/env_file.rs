// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::Environment;

/// Describe how env files are loaded into an environment before it is used.
///
/// - `Process(Some(profile))`: Load `.env.<profile>.local`, `.env.local`, `.env.<profile>`, and `.env`
/// - `Process(None)`: Load the profile-agnostic files (`.env.local` and `.env`)
/// - `DoNotProcess`: Do not load env files at all
///
/// Files are listed in order of precedence. A key that is already set (in the environment itself
/// or by a file with higher precedence) is never overwritten.
pub enum EnvFileProcessing {
    Process(Option<String>),
    DoNotProcess,
}

impl EnvFileProcessing {
    /// Load env files from the current directory.
    pub fn load(&self, env: &dyn Environment) -> Vec<PathBuf> {
        self.load_from_dir(Path::new("."), env)
    }

    /// Load env files found in `dir` and return the paths of the files that were loaded.
    ///
    /// Missing or unreadable files are not an error: the environment is used as is.
    pub fn load_from_dir(&self, dir: &Path, env: &dyn Environment) -> Vec<PathBuf> {
        let EnvFileProcessing::Process(profile) = self else {
            return vec![];
        };

        let mut loaded = vec![];

        for file_name in env_file_names(profile.as_deref()) {
            let path = dir.join(file_name);
            if !path.exists() {
                continue;
            }

            match load_env_file(&path, env) {
                Ok(()) => {
                    info!(path = %path.display(), "Loaded env file");
                    loaded.push(path);
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "Skipping env file that could not be read")
                }
            }
        }

        if loaded.is_empty() {
            info!(dir = %dir.display(), "No environment variable file was found");
        }

        loaded
    }
}

fn env_file_names(profile: Option<&str>) -> Vec<String> {
    let mut names = vec![];

    if let Some(profile) = profile {
        names.push(format!(".env.{profile}.local"));
    }

    names.push(".env.local".to_string());

    if let Some(profile) = profile {
        names.push(format!(".env.{profile}"));
    }

    names.push(".env".to_string());

    names
}

// Parse the whole file before writing so that a malformed file leaves the environment untouched
fn load_env_file(path: &Path, env: &dyn Environment) -> Result<(), dotenvy::Error> {
    let entries = dotenvy::from_path_iter(path)?.collect::<Result<Vec<_>, _>>()?;

    for (key, value) in entries {
        if env.get(&key).is_some() {
            continue;
        }

        if let Err(err) = env.set_string(&key, &value) {
            warn!(path = %path.display(), %err, "Skipping env file entry");
        }
    }

    Ok(())
}
