//! Closed-loop demo of the proof engine lifecycle: generate a validator
//! set, collect signatures on a winning message and a couple of dissenting
//! ones, gossip-merge them, finalize, and validate the result. Not part of
//! the core engine — an external collaborator exercising the public API.

use std::collections::HashMap;

use anyhow::{bail, Context};
use clap::Parser;
use containers::{Message, PubKey, ValidatorSet};
use curve::Signer;
use rand::rngs::OsRng;
use scheme::SignatureProofScheme;
use sig_proof::SignatureProof;
use tracing::level_filters::LevelFilter;
use tracing::info;

#[derive(Parser, Debug)]
struct Args {
    /// Number of validators in the demo set.
    #[arg(short, long, default_value_t = 7)]
    validators: usize,

    /// Number of validators who sign the winning message. Defaults to a
    /// bare supermajority (2/3 rounded up).
    #[arg(short, long)]
    quorum: Option<usize>,

    /// Seed validator keys deterministically instead of drawing them from
    /// the OS RNG, for reproducible demo output.
    #[arg(long)]
    deterministic: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();
    if args.validators == 0 {
        bail!("--validators must be at least 1");
    }
    let quorum = args.quorum.unwrap_or_else(|| args.validators * 2 / 3 + 1);
    if quorum > args.validators {
        bail!("--quorum ({quorum}) cannot exceed --validators ({})", args.validators);
    }

    let signers: Vec<Signer> = (0..args.validators)
        .map(|i| {
            if args.deterministic {
                Signer::from_seed(format!("demo-validator-{i}").as_bytes())
            } else {
                Signer::generate(&mut OsRng)
            }
        })
        .collect();
    let keys: Vec<PubKey> = signers.iter().map(|s| PubKey::from_point(s.public_key())).collect();
    let validator_set = ValidatorSet::new(keys.clone()).context("building the validator set")?;
    info!(n = args.validators, quorum, "validator set generated");

    let winning_msg = Message::new(b"block-42".to_vec());
    let mut main_proof = SignatureProof::new(winning_msg.clone(), &validator_set);
    for (i, signer) in signers.iter().enumerate().take(quorum) {
        let sig = signer.sign(winning_msg.as_bytes());
        main_proof.add_signature(&keys[i], &sig.to_compressed())?;
    }

    // A minority dissents on a different message, to exercise the
    // multi-message finalize/validate path.
    let dissent_count = args.validators - quorum;
    let dissent_msg = Message::new(b"nil".to_vec());
    let mut rest_proofs = Vec::new();
    if dissent_count > 0 {
        let mut dissent_proof = SignatureProof::new(dissent_msg.clone(), &validator_set);
        for (i, signer) in signers.iter().enumerate().skip(quorum) {
            let sig = signer.sign(dissent_msg.as_bytes());
            dissent_proof.add_signature(&keys[i], &sig.to_compressed())?;
        }
        rest_proofs.push(dissent_proof);
    }

    // Simulate gossip: an independently-built proof over the same message
    // merges into the main one without ever seeing signer 0's vote first.
    let mut gossiped = main_proof.derive();
    for (i, signer) in signers.iter().enumerate().take(quorum) {
        let sig = signer.sign(winning_msg.as_bytes());
        gossiped.add_signature(&keys[i], &sig.to_compressed())?;
    }
    let merge = main_proof
        .merge(&gossiped)
        .context("gossiped proof must reference the same message and validator set")?;
    info!(
        all_valid = merge.all_valid_signatures,
        increased = merge.increased_signatures,
        "gossip merge complete"
    );

    let finalized = SignatureProofScheme::finalize(&main_proof, &rest_proofs);
    info!(
        main_key_id_len = finalized.main_signature.key_id.len(),
        rest_groups = finalized.rest.len(),
        "proof finalized"
    );

    let mut hashes = HashMap::new();
    hashes.insert(winning_msg.clone(), "block-42".to_string());
    if dissent_count > 0 {
        hashes.insert(dissent_msg.clone(), "nil".to_string());
    }

    let (decoded, ok) = SignatureProofScheme::validate(&finalized, &hashes);
    if !ok {
        bail!("finalized proof failed validation");
    }
    let decoded = decoded.expect("validate returns Some on success");

    println!("validated {} signed message(s):", decoded.len());
    for (hash, bits) in &decoded {
        let voters: Vec<usize> = bits.iter().enumerate().filter(|(_, v)| **v).map(|(i, _)| i).collect();
        println!("  {hash}: {} vote(s) -> {voters:?}", bits.count_ones());
    }

    Ok(())
}
