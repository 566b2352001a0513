//! Shared test utilities and fixtures
//!
//! Every test gets its own temporary home directory holding the config
//! file, the database and the log directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::rc::Rc;

use resilience_core::{ProfileStore, RitualCatalog};
use resilience_store::SqliteBackend;
use resilience_types::{NewRitual, NewUser, Ritual, RitualCategory, User, UserId};
use tempfile::TempDir;

pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp home"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join(".resilience").join("config.toml")
    }

    pub fn database_path(&self) -> PathBuf {
        self.dir.path().join("data").join("rituals.db")
    }

    pub fn write_config(&self, contents: &str) {
        let path = self.config_path();
        fs::create_dir_all(path.parent().expect("config has a parent")).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn read_config(&self) -> String {
        fs::read_to_string(self.config_path()).unwrap_or_default()
    }

    /// Run the binary with this home, config and database.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_resilience"))
            .args(args)
            .env("HOME", self.dir.path())
            .env("RESILIENCE_CONFIG", self.config_path())
            .env("RESILIENCE_DATABASE", self.database_path())
            .env_remove("RUST_LOG")
            .current_dir(self.dir.path())
            .output()
            .expect("failed to execute resilience")
    }

    /// Run the binary and return stdout, failing the test on a non-zero exit.
    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "resilience {args:?} failed:\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("utf8 stdout")
    }

    /// Open the stores directly against this home's database.
    pub fn stores(&self) -> Stores {
        Stores::open(&self.database_path())
    }
}

pub struct Stores {
    pub backend: Rc<SqliteBackend>,
    pub profile: ProfileStore,
    pub catalog: RitualCatalog,
}

impl Stores {
    pub fn open(path: &Path) -> Self {
        let backend = Rc::new(SqliteBackend::open(path).expect("open database"));
        Self {
            profile: ProfileStore::new(backend.clone()),
            catalog: RitualCatalog::new(backend.clone()),
            backend,
        }
    }

    pub fn sign_up(&mut self, id: &str) -> User {
        self.profile
            .create_user(&NewUser::new(UserId::new(id).unwrap()))
            .unwrap()
            .clone()
    }

    pub fn sign_in(&mut self, id: &str) -> User {
        self.profile
            .fetch_user(&UserId::new(id).unwrap())
            .unwrap()
            .expect("profile exists")
            .clone()
    }

    pub fn add_ritual(&mut self, user: &User, name: &str, category: RitualCategory) -> Ritual {
        let new = NewRitual::new(user.user_id.clone(), name, category).unwrap();
        self.catalog
            .create_ritual(&new, &mut self.profile)
            .unwrap()
            .clone()
    }
}

/// The ritual id printed as the first token of `ritual add` output.
pub fn first_token(stdout: &str) -> String {
    stdout
        .split_whitespace()
        .next()
        .expect("output is not empty")
        .to_string()
}
