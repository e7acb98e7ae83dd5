//! End-to-end tests over real state files: initialize a key pool,
//! sign messages in leaf order, verify against the written public
//! key, and exhaust a signer.

use std::fs;
use std::path::PathBuf;

use hardyhash::error::Error;
use hardyhash::keygen::{initialize, write_signer_states};
use hardyhash::params::Params;
use hardyhash::sign::{load_signer_state, sign, store_signer_state, write_signature};
use hardyhash::verify::{load_public_key, load_signature, verify};

/// A fresh scratch directory under the system temp dir, emptied of
/// any leftovers from an earlier run.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hardyhash_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("creating scratch dir");
    dir
}

#[test]
fn test_known_public_key() {
    let params = Params::new(4, 4).unwrap();
    let keys = initialize(params, b"randomness").unwrap();
    assert_eq!(
        hex::encode(keys.public_key),
        "b5730b639bd2b93074e417fd4be16bfb19751ac13e18ac567ba3b58684699d3e"
    );
    assert_eq!(keys.signer_states.len(), 16);
}

#[test]
fn test_sign_all_leaves_and_exhaust() {
    let dir = scratch_dir("exhaust");
    let params = Params::new(4, 4).unwrap();
    let keys = initialize(params, b"otherrandomness").unwrap();
    assert_eq!(keys.signer_states.len(), 16);
    write_signer_states(&keys, &dir).unwrap();

    let public_key = load_public_key(&dir.join("public_key")).unwrap();
    assert_eq!(public_key, keys.public_key);

    let state_path = dir.join("signer_0");
    let wrong_message = [1u8, 2, 3, 4, 5];
    for i in 0..16u8 {
        let message = [4u8, 2, 4, 2, i];
        let signature = sign(&state_path, &message).unwrap();
        assert_eq!(signature.leaf.index, i as u32);
        assert!(
            verify(&public_key, &message, &signature),
            "signature {} should verify",
            i
        );
        assert!(
            !verify(&public_key, &wrong_message, &signature),
            "signature {} should not verify a different message",
            i
        );
    }

    // The sixteenth signature exhausted the state; the file is gone.
    assert!(!state_path.exists());
    assert!(sign(&state_path, b"one more").is_err());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_signature_files_roundtrip() {
    let dir = scratch_dir("files");
    let params = Params::new(2, 2).unwrap();
    let keys = initialize(params, b"file roundtrip").unwrap();
    write_signer_states(&keys, &dir).unwrap();

    let message = b"message on disk";
    let signature = sign(&dir.join("signer_1"), message).unwrap();
    let signature_path = dir.join("signature");
    write_signature(&signature_path, &signature).unwrap();

    let loaded = load_signature(&signature_path).unwrap();
    let public_key = load_public_key(&dir.join("public_key")).unwrap();
    assert!(verify(&public_key, message, &loaded));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_tampering_defeats_verification() {
    let dir = scratch_dir("tamper");
    let params = Params::new(2, 2).unwrap();
    let keys = initialize(params, b"tamper pool").unwrap();
    write_signer_states(&keys, &dir).unwrap();

    let message = b"untampered message".to_vec();
    let signature = sign(&dir.join("signer_0"), &message).unwrap();
    let public_key = keys.public_key;
    assert!(verify(&public_key, &message, &signature));

    // Any single message bit flip must fail.
    for bit in [0, 7, 70] {
        let mut flipped = message.clone();
        flipped[bit / 8] ^= 1 << (bit % 8);
        assert!(!verify(&public_key, &flipped, &signature));
    }

    // A corrupted one-time signature element must fail.
    for position in [0, 67, 133] {
        let mut bad = signature.clone();
        bad.ots[position][9] ^= 0x40;
        assert!(!verify(&public_key, &message, &bad));
    }

    // A corrupted leaf hash must fail.
    let mut bad = signature.clone();
    bad.leaf.hash[0] ^= 1;
    assert!(!verify(&public_key, &message, &bad));

    // A corrupted node at any height of the auth path must fail.
    for level in 0..signature.auth_path.len() {
        let mut bad = signature.clone();
        bad.auth_path[level].hash[31] ^= 1;
        assert!(!verify(&public_key, &message, &bad));
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_leaf_is_consumed_even_if_signature_is_dropped() {
    // The state file is rewritten before the signature is released,
    // so a crash between the two discards the in-flight signature
    // instead of allowing the leaf to be reissued.
    let dir = scratch_dir("atomicity");
    let params = Params::new(2, 2).unwrap();
    let keys = initialize(params, b"crash simulation").unwrap();
    write_signer_states(&keys, &dir).unwrap();

    let state_path = dir.join("signer_3");
    let first = sign(&state_path, b"never written to disk").unwrap();
    assert_eq!(first.leaf.index, 0);

    // "Crash": the first signature is dropped without being written.
    // The next signature must use the next leaf.
    let second = sign(&state_path, b"second message").unwrap();
    assert_eq!(second.leaf.index, 1);
    assert!(verify(&keys.public_key, b"second message", &second));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_tombstoned_state_refuses_to_sign() {
    let dir = scratch_dir("tombstone");
    let params = Params::new(2, 2).unwrap();
    let keys = initialize(params, b"tombstone pool").unwrap();
    write_signer_states(&keys, &dir).unwrap();

    let state_path = dir.join("signer_2");
    let mut state = load_signer_state(&state_path).unwrap();
    state.exhausted = true;
    store_signer_state(&state_path, &state).unwrap();

    assert!(matches!(
        sign(&state_path, b"refused"),
        Err(Error::Exhausted)
    ));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_distinct_signers_verify_against_one_public_key() {
    let dir = scratch_dir("signers");
    let params = Params::new(2, 2).unwrap();
    let keys = initialize(params, b"many signers").unwrap();
    write_signer_states(&keys, &dir).unwrap();
    let public_key = load_public_key(&dir.join("public_key")).unwrap();

    for i in 0..4 {
        let message = format!("message from signer {}", i).into_bytes();
        let signature = sign(&dir.join(format!("signer_{}", i)), &message).unwrap();
        assert!(verify(&public_key, &message, &signature));
    }

    let _ = fs::remove_dir_all(&dir);
}
