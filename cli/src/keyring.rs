//! Key management
//!
//! Two backends: `test` keeps one plaintext JSON file per key under
//! `<home>/keyring-test`, `memory` keeps keys for the life of the process.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use wolochain_core::{Address, PublicKey, Timestamp, WolochainError, WolochainResult};
use wolochain_crypto::KeyPair;

pub const BACKEND_TEST: &str = "test";
pub const BACKEND_MEMORY: &str = "memory";

/// Key file format of the `test` backend
#[derive(Serialize, Deserialize)]
pub struct KeyFile {
    pub version: u32,
    pub name: String,
    pub address: Address,
    pub pub_key: PublicKey,
    pub secret: String,
    pub created_at: u64,
}

/// Public description of a stored key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub name: String,
    pub address: Address,
    pub pub_key: PublicKey,
}

impl KeyInfo {
    fn new(name: &str, keypair: &KeyPair) -> Self {
        Self {
            name: name.to_string(),
            address: keypair.address(),
            pub_key: keypair.public_key(),
        }
    }
}

enum Backend {
    Test { dir: PathBuf },
    Memory { keys: BTreeMap<String, KeyPair> },
}

pub struct Keyring {
    backend: Backend,
}

fn validate_name(name: &str) -> WolochainResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !name.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(WolochainError::Keyring(format!("invalid key name {name:?}")))
    }
}

impl Keyring {
    /// Open the keyring of `backend` for the node home `home`
    pub fn open(backend: &str, home: &Path) -> WolochainResult<Self> {
        let backend = match backend {
            BACKEND_TEST => Backend::Test {
                dir: home.join("keyring-test"),
            },
            BACKEND_MEMORY => Backend::Memory {
                keys: BTreeMap::new(),
            },
            other => {
                return Err(WolochainError::Keyring(format!(
                    "unsupported keyring backend {other:?}, expected {BACKEND_TEST} or {BACKEND_MEMORY}"
                )))
            }
        };
        Ok(Self { backend })
    }

    pub fn backend(&self) -> &'static str {
        match self.backend {
            Backend::Test { .. } => BACKEND_TEST,
            Backend::Memory { .. } => BACKEND_MEMORY,
        }
    }

    fn key_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.json"))
    }

    fn contains(&self, name: &str) -> bool {
        match &self.backend {
            Backend::Test { dir } => Self::key_path(dir, name).exists(),
            Backend::Memory { keys } => keys.contains_key(name),
        }
    }

    /// Generate and store a new key
    pub fn add(&mut self, name: &str) -> WolochainResult<(KeyInfo, KeyPair)> {
        let keypair = KeyPair::generate();
        let info = self.import(name, keypair.clone())?;
        Ok((info, keypair))
    }

    /// Store an existing key under `name`
    pub fn import(&mut self, name: &str, keypair: KeyPair) -> WolochainResult<KeyInfo> {
        validate_name(name)?;
        if self.contains(name) {
            return Err(WolochainError::Keyring(format!("key {name} already exists")));
        }
        let info = KeyInfo::new(name, &keypair);

        match &mut self.backend {
            Backend::Test { dir } => {
                std::fs::create_dir_all(&*dir)?;
                let file = KeyFile {
                    version: 1,
                    name: name.to_string(),
                    address: info.address,
                    pub_key: info.pub_key,
                    secret: keypair.secret_bytes().to_hex(),
                    created_at: Timestamp::now().as_millis(),
                };
                std::fs::write(Self::key_path(dir, name), serde_json::to_string_pretty(&file)?)?;
            }
            Backend::Memory { keys } => {
                keys.insert(name.to_string(), keypair);
            }
        }
        Ok(info)
    }

    fn load_file(path: &Path) -> WolochainResult<KeyFile> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| WolochainError::Keyring(format!("corrupt key file {}: {}", path.display(), e)))
    }

    /// Key pair stored under `name`
    pub fn get(&self, name: &str) -> WolochainResult<KeyPair> {
        match &self.backend {
            Backend::Test { dir } => {
                let path = Self::key_path(dir, name);
                if !path.exists() {
                    return Err(WolochainError::KeyNotFound(name.to_string()));
                }
                let file = Self::load_file(&path)?;
                let keypair = KeyPair::from_secret_hex(&file.secret)?;
                if keypair.address() != file.address {
                    return Err(WolochainError::Keyring(format!(
                        "key file {} does not match its address",
                        path.display()
                    )));
                }
                Ok(keypair)
            }
            Backend::Memory { keys } => keys
                .get(name)
                .cloned()
                .ok_or_else(|| WolochainError::KeyNotFound(name.to_string())),
        }
    }

    pub fn show(&self, name: &str) -> WolochainResult<KeyInfo> {
        Ok(KeyInfo::new(name, &self.get(name)?))
    }

    /// All keys, ordered by name
    pub fn list(&self) -> WolochainResult<Vec<KeyInfo>> {
        match &self.backend {
            Backend::Test { dir } => {
                if !dir.exists() {
                    return Ok(Vec::new());
                }
                let mut keys = Vec::new();
                for entry in std::fs::read_dir(dir)? {
                    let path = entry?.path();
                    if path.extension().map(|e| e == "json").unwrap_or(false) {
                        let file = Self::load_file(&path)?;
                        keys.push(KeyInfo {
                            name: file.name,
                            address: file.address,
                            pub_key: file.pub_key,
                        });
                    }
                }
                keys.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(keys)
            }
            Backend::Memory { keys } => Ok(keys
                .iter()
                .map(|(name, keypair)| KeyInfo::new(name, keypair))
                .collect()),
        }
    }

    pub fn delete(&mut self, name: &str) -> WolochainResult<()> {
        match &mut self.backend {
            Backend::Test { dir } => {
                let path = Self::key_path(dir, name);
                if !path.exists() {
                    return Err(WolochainError::KeyNotFound(name.to_string()));
                }
                std::fs::remove_file(path)?;
            }
            Backend::Memory { keys } => {
                keys.remove(name)
                    .ok_or_else(|| WolochainError::KeyNotFound(name.to_string()))?;
            }
        }
        Ok(())
    }

    /// An account address, given either in hex or as the name of a key
    pub fn resolve_address(&self, name_or_address: &str) -> WolochainResult<Address> {
        match name_or_address.parse::<Address>() {
            Ok(address) => Ok(address),
            Err(_) if self.contains(name_or_address) => Ok(self.show(name_or_address)?.address),
            Err(_) => Err(WolochainError::InvalidAddress(format!(
                "{name_or_address} is neither an address nor a key in the {} keyring",
                self.backend()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_backend_persists_keys() {
        let tmp = TempDir::new().unwrap();
        let mut keyring = Keyring::open(BACKEND_TEST, tmp.path()).unwrap();
        let (alice, keypair) = keyring.add("alice").unwrap();
        keyring.import("bob", KeyPair::from_seed(&[2; 32])).unwrap();

        let reopened = Keyring::open(BACKEND_TEST, tmp.path()).unwrap();
        assert_eq!(reopened.get("alice").unwrap().address(), keypair.address());
        let names: Vec<String> = reopened.list().unwrap().into_iter().map(|k| k.name).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(reopened.resolve_address("alice").unwrap(), alice.address);
        assert_eq!(reopened.resolve_address(&alice.address.to_hex()).unwrap(), alice.address);
        assert!(reopened.resolve_address("carol").is_err());
    }

    #[test]
    fn test_duplicates_and_deletion() {
        let tmp = TempDir::new().unwrap();
        let mut keyring = Keyring::open(BACKEND_TEST, tmp.path()).unwrap();
        keyring.add("alice").unwrap();
        assert!(keyring.add("alice").is_err());
        assert!(keyring.add("../escape").is_err());

        keyring.delete("alice").unwrap();
        assert!(matches!(keyring.get("alice"), Err(WolochainError::KeyNotFound(_))));
        assert!(keyring.delete("alice").is_err());
    }

    #[test]
    fn test_memory_backend_and_unknown_backend() {
        let tmp = TempDir::new().unwrap();
        let mut keyring = Keyring::open(BACKEND_MEMORY, tmp.path()).unwrap();
        keyring.add("alice").unwrap();
        assert_eq!(keyring.list().unwrap().len(), 1);
        assert!(!tmp.path().join("keyring-test").exists());

        assert!(Keyring::open(BACKEND_MEMORY, tmp.path()).unwrap().list().unwrap().is_empty());
        assert!(matches!(
            Keyring::open("os", tmp.path()),
            Err(WolochainError::Keyring(_))
        ));
    }
}
