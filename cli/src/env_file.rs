// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `.env` loading for the binary.

use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Load `.env` from the working directory or its parents, if there is one.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    accept_missing(dotenvy::dotenv())
}

/// A missing file is normal. A file that exists but cannot be read or parsed is not.
pub fn accept_missing<T>(result: Result<T, dotenvy::Error>) -> Result<Option<T>> {
    match result {
        Ok(loaded) => Ok(Some(loaded)),
        Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).context("Failed to load .env file"),
    }
}
