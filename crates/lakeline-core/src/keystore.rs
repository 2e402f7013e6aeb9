//! Project-scoped secret storage.
//!
//! A [`KeyEntry`] is the public half of a secret: its name, type and
//! metadata. The value itself is sealed by a [`KeyCipher`] before it reaches
//! the store and is never part of a read. Only [`Keystore::reveal`] opens it,
//! for pipeline code running in-process.
//!
//! # Sealed layout
//!
//! `salt (16) ‖ nonce (12) ‖ ciphertext`. The key is derived per entry with
//! Argon2id from the configured passphrase and the entry's salt; the value
//! is encrypted with ChaCha20-Poly1305.

use std::{fmt, sync::Arc};

use argon2::Argon2;
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce, aead::Aead};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Error, Result, catalog::Metadata, store::CatalogStore};

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;

/// A keystore entry as returned by every read. Identified by
/// `(keystore_name, project_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEntry {
  pub keystore_name: String,
  pub key_type:      String,
  pub project_id:    String,
  #[serde(default)]
  pub key_metadata:  Metadata,
}

// ─── Cipher ──────────────────────────────────────────────────────────────────

pub struct KeyCipher {
  passphrase: Vec<u8>,
}

impl fmt::Debug for KeyCipher {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("KeyCipher").finish_non_exhaustive()
  }
}

impl KeyCipher {
  pub fn new(passphrase: impl Into<String>) -> Self {
    Self {
      passphrase: passphrase.into().into_bytes(),
    }
  }

  fn cipher(&self, salt: &[u8]) -> Result<ChaCha20Poly1305> {
    let mut key = [0u8; 32];
    Argon2::default()
      .hash_password_into(&self.passphrase, salt, &mut key)
      .map_err(|e| Error::Keystore(format!("key derivation failed: {e}")))?;
    Ok(ChaCha20Poly1305::new(Key::from_slice(&key)))
  }

  /// Encrypt `plaintext` under a fresh salt and nonce.
  pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = self
      .cipher(&salt)?
      .encrypt(Nonce::from_slice(&nonce), plaintext)
      .map_err(|_| Error::Keystore("encryption failed".into()))?;

    let mut sealed = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
  }

  /// Reverse [`seal`](Self::seal). A wrong passphrase or a modified blob
  /// fails authentication.
  pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < SALT_LEN + NONCE_LEN {
      return Err(Error::Keystore("sealed value is truncated".into()));
    }
    let (salt, rest) = sealed.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    self
      .cipher(salt)?
      .decrypt(Nonce::from_slice(nonce), ciphertext)
      .map_err(|_| Error::Keystore("decryption failed".into()))
  }
}

// ─── Component ───────────────────────────────────────────────────────────────

fn check_entry(entry: &KeyEntry, key_value: &str) -> Result<()> {
  let missing = [
    entry.keystore_name.as_str(),
    key_value,
    entry.key_type.as_str(),
    entry.project_id.as_str(),
  ]
  .iter()
  .any(|f| f.trim().is_empty());
  if missing {
    return Err(Error::InvalidArgument(
      "Missing required fields: keystore_name, key_value, key_type, project_id".into(),
    ));
  }
  Ok(())
}

pub struct Keystore<S> {
  store:  Arc<S>,
  cipher: Option<Arc<KeyCipher>>,
}

impl<S: CatalogStore> Keystore<S> {
  /// Without a cipher the keystore is read-only: writes and
  /// [`reveal`](Self::reveal) fail with [`Error::Keystore`].
  pub fn new(store: Arc<S>, cipher: Option<Arc<KeyCipher>>) -> Self { Self { store, cipher } }

  fn cipher(&self) -> Result<&KeyCipher> {
    self
      .cipher
      .as_deref()
      .ok_or_else(|| Error::Keystore("no keystore passphrase is configured".into()))
  }

  /// Create the entry, or replace the value, type and metadata of an
  /// existing one.
  pub async fn put(&self, entry: KeyEntry, key_value: &str) -> Result<KeyEntry> {
    check_entry(&entry, key_value)?;
    let sealed = self.cipher()?.seal(key_value.as_bytes())?;
    self
      .store
      .put_key(entry.clone(), sealed)
      .await
      .map_err(Error::from_store)?;
    info!(project_id = %entry.project_id, keystore_name = %entry.keystore_name, "key stored");
    Ok(entry)
  }

  /// Replace an existing entry. Returns `false` when there is none.
  pub async fn update(&self, entry: KeyEntry, key_value: &str) -> Result<bool> {
    check_entry(&entry, key_value)?;
    let sealed = self.cipher()?.seal(key_value.as_bytes())?;
    let rows = self
      .store
      .update_key(entry.clone(), sealed)
      .await
      .map_err(Error::from_store)?;
    if rows > 0 {
      info!(project_id = %entry.project_id, keystore_name = %entry.keystore_name, "key updated");
    }
    Ok(rows > 0)
  }

  pub async fn get(&self, project_id: &str, keystore_name: &str) -> Result<Option<KeyEntry>> {
    self
      .store
      .get_key(project_id, keystore_name)
      .await
      .map_err(Error::from_store)
  }

  /// A project's entries ordered by name.
  pub async fn list(&self, project_id: &str) -> Result<Vec<KeyEntry>> {
    self.store.list_keys(project_id).await.map_err(Error::from_store)
  }

  pub async fn delete(&self, project_id: &str, keystore_name: &str) -> Result<bool> {
    let deleted = self
      .store
      .delete_key(project_id, keystore_name)
      .await
      .map_err(Error::from_store)?;
    if deleted {
      info!(%project_id, %keystore_name, "key deleted");
    }
    Ok(deleted)
  }

  /// Decrypt an entry's value.
  pub async fn reveal(&self, project_id: &str, keystore_name: &str) -> Result<Option<String>> {
    let cipher = self.cipher()?;
    let Some(sealed) = self
      .store
      .get_key_value(project_id, keystore_name)
      .await
      .map_err(Error::from_store)?
    else {
      return Ok(None);
    };
    let plaintext = cipher.open(&sealed)?;
    String::from_utf8(plaintext)
      .map(Some)
      .map_err(|_| Error::Keystore("stored value is not UTF-8".into()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sealed_values_open_with_the_same_passphrase() {
    let cipher = KeyCipher::new("correct horse");
    let sealed = cipher.seal(b"api-token").unwrap();
    assert!(!sealed.windows(9).any(|w| w == b"api-token"));
    assert_eq!(cipher.open(&sealed).unwrap(), b"api-token");
  }

  #[test]
  fn each_seal_uses_a_fresh_salt_and_nonce() {
    let cipher = KeyCipher::new("correct horse");
    let a = cipher.seal(b"same").unwrap();
    let b = cipher.seal(b"same").unwrap();
    assert_ne!(a[..SALT_LEN + NONCE_LEN], b[..SALT_LEN + NONCE_LEN]);
  }

  #[test]
  fn wrong_passphrase_fails() {
    let sealed = KeyCipher::new("one").seal(b"secret").unwrap();
    let err = KeyCipher::new("two").open(&sealed).unwrap_err();
    assert!(matches!(err, Error::Keystore(_)));
  }

  #[test]
  fn tampered_ciphertext_fails() {
    let cipher = KeyCipher::new("pass");
    let mut sealed = cipher.seal(b"secret").unwrap();
    let last = sealed.len() - 1;
    sealed[last] ^= 0x01;
    assert!(cipher.open(&sealed).is_err());
    assert!(cipher.open(&sealed[..10]).is_err());
  }

  #[test]
  fn debug_hides_the_passphrase() {
    let shown = format!("{:?}", KeyCipher::new("hunter2"));
    assert!(!shown.contains("hunter2"));
  }

  #[test]
  fn blank_fields_are_rejected() {
    let entry = KeyEntry {
      keystore_name: "k".into(),
      key_type:      "token".into(),
      project_id:    " ".into(),
      key_metadata:  Metadata::new(),
    };
    assert!(matches!(check_entry(&entry, "v"), Err(Error::InvalidArgument(_))));
    let entry = KeyEntry { project_id: "P1".into(), ..entry };
    assert!(check_entry(&entry, "").is_err());
    assert!(check_entry(&entry, "v").is_ok());
  }
}
