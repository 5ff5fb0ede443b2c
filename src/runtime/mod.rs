//! Runtime abstraction for process-environment access.
//!
//! Credential resolution and the request retry loop never touch the process
//! environment directly; they go through [`Runtime`] so tests can substitute
//! a `MockRuntime`.
//!
//! # Structure
//!
//! - `env` - Environment variables, home directory, git identity
//! - `fs` - File reads used by the config-file credential source
//! - `time` - Async sleep used by the retry backoff

mod env;
mod fs;
mod time;

use anyhow::Result;
use async_trait::async_trait;
use std::env as std_env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    /// The `user.email` from git configuration, if git is installed and set up.
    fn git_user_email(&self) -> Option<String>;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;

    // Directories
    fn home_dir(&self) -> Option<PathBuf>;

    // Time
    async fn sleep(&self, duration: Duration);
}

pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn git_user_email(&self) -> Option<String> {
        self.git_user_email_impl()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleep_impl(duration).await
    }
}
