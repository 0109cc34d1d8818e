// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tracing::warn;

use crate::Environment;

/// The environment of the current process.
///
/// Values that are not valid unicode are reported as absent.
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&self, key: &str, value: &str) {
        // `std::env::set_var` panics on these
        if key.is_empty() || key.contains(['=', '\0']) || value.contains('\0') {
            warn!(key, "Refusing to set an environment variable the OS would reject");
            return;
        }

        // SAFETY: the process environment is not synchronised with code that reads it outside
        // `std::env` (such as `getenv` in C libraries). Multi-threaded callers must make sure no
        // such read runs concurrently with a write.
        unsafe { std::env::set_var(key, value) }
    }
}
