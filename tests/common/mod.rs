use envelope_crypto_core::context::EncryptionContext;
use envelope_crypto_core::keyring::aes::AesWrappingKey;
use envelope_crypto_core::keyring::Keyring;
use envelope_crypto_core::materials::MaterialsManager;
use envelope_crypto_core::pipeline::{GetObjectRequest, GetObjectResponse, PutObjectRequest, PutObjectResponse, StorageClient};
use envelope_crypto_core::EnvelopeError;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub fn aes_manager(key_byte: u8) -> MaterialsManager {
    let key = AesWrappingKey::new(vec![key_byte; 32]).unwrap();
    MaterialsManager::new(Keyring::aes(key))
}

pub fn aes_manager_allowing_legacy(key_byte: u8) -> MaterialsManager {
    let key = AesWrappingKey::new(vec![key_byte; 32]).unwrap();
    MaterialsManager::allowing_legacy(Keyring::aes(key))
}

pub fn sample_context() -> EncryptionContext {
    let mut ctx = EncryptionContext::new();
    ctx.insert("customer", "acme");
    ctx.insert("purpose", "integration-test");
    ctx
}

/// An in-memory `StorageClient` test double: objects live for the lifetime
/// of the test, keyed by object key.
pub struct MemoryStorageClient {
    objects: Mutex<BTreeMap<String, (BTreeMap<String, String>, Vec<u8>)>>,
}

impl MemoryStorageClient {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn raw_metadata(&self, key: &str) -> BTreeMap<String, String> {
        self.objects.lock().unwrap()[key].0.clone()
    }

    pub fn raw_body(&self, key: &str) -> Vec<u8> {
        self.objects.lock().unwrap()[key].1.clone()
    }

    /// Directly inserts an object, bypassing the pipeline. Used to stage
    /// tampered or hand-built envelopes.
    pub fn put_raw(&self, key: &str, metadata: BTreeMap<String, String>, body: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), (metadata, body));
    }
}

impl StorageClient for MemoryStorageClient {
    fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectResponse, EnvelopeError> {
        self.objects
            .lock()
            .unwrap()
            .insert(request.key, (request.metadata, request.body));
        Ok(PutObjectResponse { e_tag: None })
    }

    fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectResponse, EnvelopeError> {
        let objects = self.objects.lock().unwrap();
        let (metadata, body) = objects
            .get(&request.key)
            .ok_or_else(|| EnvelopeError::io(format!("no such object: {}", request.key)))?;
        let body = match request.range {
            Some((start, end)) => body[start as usize..end as usize].to_vec(),
            None => body.clone(),
        };
        Ok(GetObjectResponse {
            metadata: metadata.clone(),
            body,
        })
    }
}

/// `EncryptionClient` takes ownership of its storage client; tests that need
/// to inspect stored objects after a `put_object` share one through an `Arc`.
impl StorageClient for Arc<MemoryStorageClient> {
    fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectResponse, EnvelopeError> {
        (**self).put_object(request)
    }

    fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectResponse, EnvelopeError> {
        (**self).get_object(request)
    }
}
