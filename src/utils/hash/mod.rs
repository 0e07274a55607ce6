use sha2::Sha256;
use sha3::{
    Digest,
    Sha3_256
};

const TAG_DIGEST_DOMAIN: &[u8] = b"medabe/kem/digest/v1";
const TAG_DOMAIN: &[u8] = b"medabe/kem/tag/v1";

/// SHA-256 of `data`; used to turn a serialized `Gt` element into AES key bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    key
}

/// Domain separated verification tag over a serialized `Gt` element:
/// `SHA3-256(tag domain || SHA-256(digest domain || data))`.
pub fn verification_tag(data: &[u8]) -> [u8; 32] {
    let mut inner = Sha256::new();
    inner.update(TAG_DIGEST_DOMAIN);
    inner.update(data);
    let digest = inner.finalize();
    let mut outer = Sha3_256::new();
    outer.update(TAG_DOMAIN);
    outer.update(digest);
    let mut tag = [0u8; 32];
    tag.copy_from_slice(&outer.finalize());
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_answer() {
        let digest = sha256(b"abc");
        assert_eq!(
            digest[..4],
            [0xba, 0x78, 0x16, 0xbf]
        );
    }

    #[test]
    fn test_tag_is_domain_separated() {
        let data = b"some serialized element";
        assert_ne!(verification_tag(data), sha256(data));
        assert_eq!(verification_tag(data), verification_tag(data));
        assert_ne!(verification_tag(data), verification_tag(b"another element"));
    }
}
