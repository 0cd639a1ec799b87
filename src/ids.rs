// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Random identifiers for documents and sessions.

use ring::rand::{SecureRandom, SystemRandom};

const DOCUMENT_ID_LEN: usize = 20;
const SESSION_ID_BYTES: usize = 32;
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a Firestore-style auto ID (20 alphanumeric characters).
pub fn document_id() -> anyhow::Result<String> {
    let rng = SystemRandom::new();
    let mut id = String::with_capacity(DOCUMENT_ID_LEN);

    while id.len() < DOCUMENT_ID_LEN {
        let mut buf = [0u8; DOCUMENT_ID_LEN];
        rng.fill(&mut buf)
            .map_err(|_| anyhow::anyhow!("system RNG failure"))?;
        // Rejection sampling keeps the distribution uniform (248 = 4 * 62).
        for b in buf {
            if (b as usize) < ALPHABET.len() * 4 && id.len() < DOCUMENT_ID_LEN {
                id.push(ALPHABET[b as usize % ALPHABET.len()] as char);
            }
        }
    }

    Ok(id)
}

/// Generate an opaque session ID (hex-encoded, 256 bits).
pub fn session_id() -> anyhow::Result<String> {
    let mut buf = [0u8; SESSION_ID_BYTES];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| anyhow::anyhow!("system RNG failure"))?;
    Ok(hex::encode(buf))
}
