use rand::rngs::OsRng;
use rand::RngCore;

pub const SHARE_TOKEN_BYTES: usize = 32;

/// 32 bytes from the OS RNG, hex-encoded (64 characters).
pub fn generate_share_token() -> String {
    let mut bytes = [0u8; SHARE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Cheap shape check so malformed tokens never reach the database.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == SHARE_TOKEN_BYTES * 2 && token.bytes().all(|b| b.is_ascii_hexdigit())
}
