//! envelope-crypto — demo CLI around `envelope_crypto_core`
//!
//! Usage:
//!   envelope-crypto keygen --name <NAME>
//!   envelope-crypto put --key <KEYFILE> --bucket <DIR> --object <KEY> --in <FILE> [--ctx k=v,...]
//!   envelope-crypto get --key <KEYFILE> --bucket <DIR> --object <KEY> --out <FILE> [--ctx k=v,...] [--allow-legacy]
//!   envelope-crypto inspect --bucket <DIR> --object <KEY>

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use envelope_crypto_core::context::EncryptionContext;
use envelope_crypto_core::keyring::aes::AesWrappingKey;
use envelope_crypto_core::keyring::Keyring;
use envelope_crypto_core::materials::MaterialsManager;
use envelope_crypto_core::pipeline::{EncryptionClient, GetObjectRequest, GetObjectResponse, PutObjectRequest, PutObjectResponse, StorageClient};
use envelope_crypto_core::{inspect_envelope, EnvelopeError};

fn usage() -> ! {
    eprintln!(
        "envelope-crypto — client-side envelope encryption demo\n\
         \n\
         Commands:\n\
         \n\
         envelope-crypto keygen --name <NAME>\n\
         Writes <NAME>.key (32 random bytes, an AES-256 wrapping key)\n\
         \n\
         envelope-crypto put --key <KEYFILE> --bucket <DIR> --object <KEY> --in <FILE> [--ctx k=v,...]\n\
         \n\
         envelope-crypto get --key <KEYFILE> --bucket <DIR> --object <KEY> --out <FILE> [--ctx k=v,...] [--allow-legacy]\n\
         \n\
         envelope-crypto inspect --bucket <DIR> --object <KEY>\n"
    );
    process::exit(2);
}

fn die(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(2);
}

fn parse_args() -> (String, Vec<(String, String)>) {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
    }
    let command = args[1].clone();
    let mut flags = Vec::new();
    let mut i = 2;
    while i < args.len() {
        if args[i].starts_with("--") && i + 1 < args.len() {
            flags.push((args[i].clone(), args[i + 1].clone()));
            i += 2;
        } else {
            die(&format!("unexpected argument: {}", args[i]));
        }
    }
    (command, flags)
}

fn get_flag(flags: &[(String, String)], name: &str) -> Option<String> {
    flags.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
}

fn require_flag(flags: &[(String, String)], name: &str) -> String {
    get_flag(flags, name).unwrap_or_else(|| die(&format!("missing required flag: {name}")))
}

fn parse_context(raw: Option<String>) -> EncryptionContext {
    let mut ctx = EncryptionContext::new();
    let Some(raw) = raw else { return ctx };
    for pair in raw.split(',').filter(|s| !s.is_empty()) {
        match pair.split_once('=') {
            Some((k, v)) => ctx.insert(k, v),
            None => die(&format!("malformed --ctx entry (expected k=v): {pair}")),
        }
    }
    ctx
}

/// A trivial `StorageClient` backed by a directory: `<bucket>/<object>` holds
/// ciphertext, `<bucket>/<object>.meta.json` holds the `x-amz-*` metadata map.
struct LocalFileStorageClient {
    bucket: PathBuf,
}

impl LocalFileStorageClient {
    fn object_path(&self, key: &str) -> PathBuf {
        self.bucket.join(key)
    }

    fn metadata_path(&self, key: &str) -> PathBuf {
        self.bucket.join(format!("{key}.meta.json"))
    }
}

impl StorageClient for LocalFileStorageClient {
    fn put_object(&self, request: PutObjectRequest) -> Result<PutObjectResponse, EnvelopeError> {
        fs::create_dir_all(&self.bucket).map_err(|e| EnvelopeError::io(e.to_string()))?;
        fs::write(self.object_path(&request.key), &request.body).map_err(|e| EnvelopeError::io(e.to_string()))?;
        let meta_json =
            serde_json::to_vec(&request.metadata).map_err(|e| EnvelopeError::io(e.to_string()))?;
        fs::write(self.metadata_path(&request.key), meta_json).map_err(|e| EnvelopeError::io(e.to_string()))?;
        Ok(PutObjectResponse { e_tag: None })
    }

    fn get_object(&self, request: GetObjectRequest) -> Result<GetObjectResponse, EnvelopeError> {
        let body = fs::read(self.object_path(&request.key)).map_err(|e| EnvelopeError::io(e.to_string()))?;
        let body = match request.range {
            Some((start, end)) => body
                .get(start as usize..end as usize)
                .ok_or_else(|| EnvelopeError::configuration("range out of bounds"))?
                .to_vec(),
            None => body,
        };
        let meta_bytes = fs::read(self.metadata_path(&request.key)).map_err(|e| EnvelopeError::io(e.to_string()))?;
        let metadata: BTreeMap<String, String> =
            serde_json::from_slice(&meta_bytes).map_err(|e| EnvelopeError::io(e.to_string()))?;
        Ok(GetObjectResponse { metadata, body })
    }
}

fn cmd_keygen(flags: &[(String, String)]) -> Result<(), EnvelopeError> {
    let name = require_flag(flags, "--name");
    let mut key = vec![0u8; 32];
    getrandom::getrandom(&mut key).map_err(|e| EnvelopeError::wrap_failure(e.to_string()))?;
    let path = format!("{name}.key");
    fs::write(&path, &key).map_err(|e| EnvelopeError::io(e.to_string()))?;
    eprintln!("wrapping key written to {path} (32 bytes, AES-256)");
    Ok(())
}

fn cmd_put(flags: &[(String, String)]) -> Result<(), EnvelopeError> {
    let key_file = require_flag(flags, "--key");
    let bucket = require_flag(flags, "--bucket");
    let object = require_flag(flags, "--object");
    let in_file = require_flag(flags, "--in");
    let ctx = parse_context(get_flag(flags, "--ctx"));

    let key_bytes = fs::read(&key_file).map_err(|e| EnvelopeError::io(e.to_string()))?;
    let wrapping_key = AesWrappingKey::new(key_bytes)?;
    let manager = MaterialsManager::new(Keyring::aes(wrapping_key));
    let client = EncryptionClient::new(LocalFileStorageClient { bucket: PathBuf::from(bucket) }, manager);

    let plaintext = fs::read(&in_file).map_err(|e| EnvelopeError::io(e.to_string()))?;
    client.put_object(&object, &plaintext, ctx)?;
    eprintln!("put {object} ({} bytes plaintext)", plaintext.len());
    Ok(())
}

fn cmd_get(flags: &[(String, String)]) -> Result<(), EnvelopeError> {
    let key_file = require_flag(flags, "--key");
    let bucket = require_flag(flags, "--bucket");
    let object = require_flag(flags, "--object");
    let out_file = require_flag(flags, "--out");
    let allow_legacy = get_flag(flags, "--allow-legacy").is_some();
    let ctx_flag = get_flag(flags, "--ctx");
    let ctx = ctx_flag.map(parse_context);

    let key_bytes = fs::read(&key_file).map_err(|e| EnvelopeError::io(e.to_string()))?;
    let wrapping_key = AesWrappingKey::new(key_bytes)?;
    let keyring = Keyring::aes(wrapping_key);
    let manager = if allow_legacy {
        MaterialsManager::allowing_legacy(keyring)
    } else {
        MaterialsManager::new(keyring)
    };
    let client = EncryptionClient::new(LocalFileStorageClient { bucket: PathBuf::from(bucket) }, manager);

    let plaintext = client.get_object(&object, ctx.as_ref())?;
    fs::write(&out_file, &plaintext).map_err(|e| EnvelopeError::io(e.to_string()))?;
    eprintln!("got {object} ({} bytes plaintext) -> {out_file}", plaintext.len());
    Ok(())
}

fn cmd_inspect(flags: &[(String, String)]) -> Result<(), EnvelopeError> {
    let bucket = require_flag(flags, "--bucket");
    let object = require_flag(flags, "--object");
    let meta_path = Path::new(&bucket).join(format!("{object}.meta.json"));
    let meta_bytes = fs::read(&meta_path).map_err(|e| EnvelopeError::io(e.to_string()))?;
    let metadata: BTreeMap<String, String> =
        serde_json::from_slice(&meta_bytes).map_err(|e| EnvelopeError::io(e.to_string()))?;

    match inspect_envelope(&metadata)? {
        Some(info) => {
            eprintln!("suite:         {}", info.suite);
            eprintln!("wrap alg:      {}", info.wrap_algorithm);
            eprintln!("legacy:        {}", info.is_legacy);
            eprintln!("v1 envelope:   {}", info.is_v1);
            if let Some(bits) = info.tag_len_bits {
                eprintln!("tag length:    {bits} bits");
            }
        }
        None => eprintln!("object carries no client-encryption metadata"),
    }
    Ok(())
}

fn main() {
    let (command, flags) = parse_args();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let result = match command.as_str() {
        "keygen" => cmd_keygen(&flags),
        "put" => cmd_put(&flags),
        "get" => cmd_get(&flags),
        "inspect" => cmd_inspect(&flags),
        _ => {
            eprintln!("unknown command: {command}");
            usage();
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(e.exit_code() as i32);
    }
}
