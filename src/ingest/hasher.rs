use sha2::{Digest, Sha256};

/// Hex SHA-256 of an in-memory blob.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Short content tag used to disambiguate blob filenames.
pub fn short_digest(bytes: &[u8]) -> String {
    let mut digest = digest_bytes(bytes);
    digest.truncate(10);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(
            digest_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(short_digest(b"abc"), "ba7816bf8f");
    }
}
