//! File hashing and batch naming.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Vowel-free alphabet for batch names.
const BATCH_ALPHABET: &[u8; 24] = b"BCDFGHJKLMNPQRSTVWXZ2345";
const BATCH_NAME_LEN: usize = 10;

/// Hex MD5 and SHA-256 of a file, computed in a single pass.
pub fn file_digests(path: &Path) -> io::Result<(String, String)> {
    let (md5, sha) = raw_digests(path)?;
    Ok((format!("{:x}", md5), hex::encode(sha)))
}

/// Hex MD5 of a file.
pub fn file_md5(path: &Path) -> io::Result<String> {
    file_digests(path).map(|(md5, _)| md5)
}

/// Deterministic batch identifier derived from the content of the upload file.
pub fn batch_name(path: &Path) -> io::Result<String> {
    let (_, sha) = raw_digests(path)?;
    Ok(format!("B-{}", encode_base24(&sha[..8])))
}

fn raw_digests(path: &Path) -> io::Result<(md5::Digest, [u8; 32])> {
    let mut file = File::open(path)?;
    let mut md5_ctx = md5::Context::new();
    let mut sha = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        md5_ctx.consume(&buf[..n]);
        sha.update(&buf[..n]);
    }
    Ok((md5_ctx.compute(), sha.finalize().into()))
}

fn encode_base24(bytes: &[u8]) -> String {
    let mut value = bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
    let mut out = Vec::with_capacity(BATCH_NAME_LEN);
    for _ in 0..BATCH_NAME_LEN {
        out.push(BATCH_ALPHABET[(value % 24) as usize]);
        value /= 24;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
