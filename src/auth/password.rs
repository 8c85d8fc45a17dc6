use crate::error::Result;

// cost 12 matches what existing member records were hashed with
const BCRYPT_COST: u32 = 12;

pub fn hash(plaintext: &str) -> Result<String> {
    Ok(bcrypt::hash(plaintext, BCRYPT_COST)?)
}

pub fn verify(plaintext: &str, hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(plaintext, hash)?)
}
