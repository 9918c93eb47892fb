//! # envelope-crypto-core
//!
//! Client-side envelope encryption for an object-storage service: a client
//! encrypts payloads locally before upload and decrypts them locally on
//! download. The storage service never observes plaintext and never holds
//! wrapping keys.
//!
//! ## Quick start
//!
//! ```rust
//! use envelope_crypto_core::context::EncryptionContext;
//! use envelope_crypto_core::keyring::aes::AesWrappingKey;
//! use envelope_crypto_core::keyring::Keyring;
//! use envelope_crypto_core::materials::MaterialsManager;
//! use envelope_crypto_core::rng::OsSecureRandom;
//!
//! let wrapping_key = AesWrappingKey::new(vec![0u8; 32]).unwrap();
//! let manager = MaterialsManager::new(Keyring::aes(wrapping_key));
//! let materials = manager
//!     .get_encryption_materials(EncryptionContext::new(), &OsSecureRandom)
//!     .unwrap();
//! assert!(materials.plaintext_data_key.is_some());
//! ```
//!
//! ## What's NOT provided
//!
//! - Server-side encryption
//! - Random-access/multipart decryption of GCM objects
//! - Key derivation beyond what a named algorithm suite mandates
//! - Object-storage transport, credentials, or KMS wire transport (these
//!   are the `StorageClient`/`KmsClient` trait seams)

#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/envelope-crypto-core/0.1.0")]

pub mod content;
pub mod context;
pub mod error;
pub mod keyring;
pub mod materials;
pub mod metadata;
pub mod pipeline;
pub mod rng;
pub mod suite;

pub use context::EncryptionContext;
pub use error::EnvelopeError;
pub use keyring::Keyring;
pub use materials::{DecryptionMaterials, EncryptedDataKey, EncryptionMaterials, MaterialsManager};
pub use metadata::{inspect_envelope, EnvelopeInspection, ObjectEnvelope};
pub use pipeline::{
    EncryptionClient, GetObjectRequest, GetObjectResponse, PutObjectRequest, PutObjectResponse, StorageClient,
};
pub use rng::{OsSecureRandom, SecureRandom};
pub use suite::AlgorithmSuite;
