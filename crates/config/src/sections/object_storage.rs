// Copyright 2026 The Campushare Authors.
//
// SPDX-License-Identifier: AGPL-3.0-only
// Please see LICENSE in the repository root for full details.

use camino::Utf8PathBuf;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ConfigurationSection;

fn default_path() -> Utf8PathBuf {
    "./attachments".into()
}

/// Where attachment blobs are stored
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct ObjectStorageConfig {
    /// Directory under which blobs are kept, one file per storage key
    #[schemars(with = "String")]
    #[serde(default = "default_path")]
    pub path: Utf8PathBuf,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl ConfigurationSection for ObjectStorageConfig {
    const PATH: Option<&'static str> = Some("object_storage");
}
