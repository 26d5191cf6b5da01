use std::collections::HashMap;
use std::str::FromStr;

use anyhow::Result;
use serde_json::json;
use sha2::{Digest, Sha256};
use solana_idl_codec::errors::{IdlError, ResolveError};
use solana_idl_codec::{derive_pda, parse_program, resolve_instruction_addresses};
use solana_pubkey::Pubkey;

fn sample_idl() -> serde_json::Value {
    json!({
        "address": "11111111111111111111111111111111",
        "metadata": {"name": "escrow", "version": "0.1.0"},
        "instructions": [
            {
                "name": "make_offer",
                "discriminator": [1, 0, 0, 0],
                "accounts": [
                    {"name": "maker", "signer": true, "writable": true},
                    {"name": "offer", "writable": true, "pda": {"seeds": [
                        {"kind": "const", "value": "offer"},
                        {"kind": "account", "path": "maker"},
                        {"kind": "arg", "path": "id"}
                    ]}},
                    {"name": "system_program", "address": "11111111111111111111111111111111"}
                ],
                "args": [
                    {"name": "id", "type": "u64"},
                    {"name": "amount", "type": "u64"},
                    {"name": "memo", "type": "string"}
                ]
            },
            {
                "name": "take_offer",
                "accounts": [
                    {"name": "taker", "signer": true, "writable": true},
                    {"name": "offer", "writable": true},
                    {"name": "vault", "pda": {"seeds": [
                        {"kind": "const", "value": "vault"},
                        {"kind": "account", "path": "offer.maker", "account": "Offer"}
                    ]}}
                ],
                "args": []
            }
        ],
        "accounts": [
            {"name": "Offer", "discriminator": [10, 20]}
        ],
        "types": [
            {"name": "Offer", "type": {"kind": "struct", "fields": [
                {"name": "maker", "type": "pubkey"},
                {"name": "amount", "type": "u64"},
                {"name": "state", "type": {"defined": "OfferState"}}
            ]}},
            {"name": "OfferState", "type": {"kind": "enum", "variants": [
                {"name": "open"},
                {"name": "closed"}
            ]}}
        ],
        "events": [
            {"name": "OfferMade", "type": {"kind": "struct", "fields": [
                {"name": "id", "type": "u64"}
            ]}}
        ],
        "errors": [
            {"code": 6000, "name": "InvalidAmount", "msg": "Amount must be positive"}
        ],
        "constants": [
            {"name": "MAX_MEMO", "type": "u64", "value": "64"}
        ]
    })
}

fn wallet() -> Pubkey {
    // The Ed25519 base point is a valid public key
    let mut bytes = [0x66u8; 32];
    bytes[0] = 0x58;
    Pubkey::new_from_array(bytes)
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_parse_program_sections() {
    let program = parse_program(&sample_idl()).unwrap();

    assert_eq!(program.name(), Some("escrow"));
    assert_eq!(
        program.address,
        Some(Pubkey::from_str("11111111111111111111111111111111").unwrap())
    );
    assert_eq!(program.instructions.len(), 2);
    assert_eq!(program.accounts.len(), 1);
    assert_eq!(program.events.len(), 1);
    assert_eq!(program.typedefs.len(), 3); // Offer, OfferState, OfferMade (inline)

    let error = program.lookup_error(6000).unwrap();
    assert_eq!(error.name, "InvalidAmount");
    assert_eq!(error.msg.as_deref(), Some("Amount must be positive"));

    // String-wrapped constant values parse down to their JSON form
    let constant = program.constants.get("MAX_MEMO").unwrap();
    assert_eq!(constant.value, json!(64));
}

#[test]
fn test_instruction_payload_round_trip() -> Result<()> {
    let program = parse_program(&sample_idl())?;
    let instruction = program.instructions.get("make_offer").unwrap();

    let payload = json!({"id": 7, "amount": 100, "memo": "hello"});
    let data = instruction.encode_payload(&payload)?;

    // Discriminator, id, amount, then the length-prefixed memo
    assert_eq!(&data[..4], &[1, 0, 0, 0]);
    assert_eq!(data.len(), 4 + 8 + 8 + 4 + 5);

    let decoded = instruction.decode_payload(&data)?;
    assert_eq!(decoded, payload);

    assert_eq!(program.guess_instruction(&data).unwrap().name, "make_offer");
    Ok(())
}

#[test]
fn test_instruction_default_discriminator() {
    let program = parse_program(&sample_idl()).unwrap();
    let instruction = program.instructions.get("take_offer").unwrap();

    let mut hasher = Sha256::new();
    hasher.update(b"global:take_offer");
    let expected = hasher.finalize();
    assert_eq!(instruction.discriminator, expected[..8].to_vec());
}

#[test]
fn test_resolve_and_compile_instruction() -> Result<()> {
    init_logs();
    let program = parse_program(&sample_idl())?;
    let program_id = program.address.unwrap();
    let instruction = program.instructions.get("make_offer").unwrap();

    let payload = json!({"id": 7, "amount": 100, "memo": "hello"});
    let known = HashMap::from([("maker".to_string(), wallet())]);
    let resolved = resolve_instruction_addresses(
        instruction,
        &program_id,
        &known,
        &payload,
        &HashMap::new(),
    );

    // The offer PDA mixes a constant, an account address and a typed arg
    let (expected_offer, _) = derive_pda(
        &program_id,
        &[b"offer", &wallet().to_bytes(), &7u64.to_le_bytes()],
    )?;
    assert_eq!(resolved.get("offer"), Some(&expected_offer));
    // The fixed address resolves without being supplied
    assert_eq!(resolved.get("system_program"), Some(&program_id));

    let compiled = instruction.compile(&program_id, &payload, &resolved)?;
    assert_eq!(compiled.program_id, program_id);
    assert_eq!(compiled.accounts.len(), 3);
    assert_eq!(compiled.accounts[0].pubkey, wallet());
    assert!(compiled.accounts[0].is_signer);
    assert!(compiled.accounts[1].is_writable);
    assert!(!compiled.accounts[2].is_signer);
    assert_eq!(&compiled.data[..4], &[1, 0, 0, 0]);
    Ok(())
}

#[test]
fn test_compile_without_required_account_fails() {
    init_logs();
    let program = parse_program(&sample_idl()).unwrap();
    let program_id = program.address.unwrap();
    let instruction = program.instructions.get("make_offer").unwrap();

    // Without the maker nothing else can resolve
    let payload = json!({"id": 7, "amount": 100, "memo": "hello"});
    let resolved = resolve_instruction_addresses(
        instruction,
        &program_id,
        &HashMap::new(),
        &payload,
        &HashMap::new(),
    );
    let error = instruction
        .compile(&program_id, &payload, &resolved)
        .unwrap_err();
    assert!(matches!(
        error,
        IdlError::Resolve(ResolveError::MissingRequiredAccount { name }) if name == "maker"
    ));
}

#[test]
fn test_resolve_seed_from_account_state() {
    let program = parse_program(&sample_idl()).unwrap();
    let program_id = program.address.unwrap();
    let instruction = program.instructions.get("take_offer").unwrap();

    let offer_address = wallet();
    let known = HashMap::from([
        ("taker".to_string(), wallet()),
        ("offer".to_string(), offer_address),
    ]);
    // The vault seed reads the maker out of the offer's decoded state
    let states = HashMap::from([(
        "offer".to_string(),
        json!({"maker": wallet().to_string(), "amount": 100, "state": "open"}),
    )]);
    let resolved = resolve_instruction_addresses(
        instruction,
        &program_id,
        &known,
        &json!({}),
        &states,
    );

    let (expected_vault, _) =
        derive_pda(&program_id, &[b"vault", &wallet().to_bytes()]).unwrap();
    assert_eq!(resolved.get("vault"), Some(&expected_vault));
}

#[test]
fn test_account_round_trip_and_guessing() -> Result<()> {
    let program = parse_program(&sample_idl())?;
    let account = program.accounts.get("Offer").unwrap();

    let value = json!({
        "maker": wallet().to_string(),
        "amount": 500,
        "state": "open"
    });
    let data = account.encode(&value)?;
    assert_eq!(&data[..2], &[10, 20]);
    assert_eq!(data.len(), 2 + 32 + 8 + 1);

    assert_eq!(account.decode(&data)?, value);
    assert_eq!(program.guess_account(&data).unwrap().name, "Offer");
    assert!(program.guess_account(&[0xFF; 16]).is_none());
    Ok(())
}

#[test]
fn test_event_round_trip_with_default_discriminator() {
    let program = parse_program(&sample_idl()).unwrap();
    let event = program.events.get("OfferMade").unwrap();

    let mut hasher = Sha256::new();
    hasher.update(b"event:OfferMade");
    let expected = hasher.finalize();
    assert_eq!(event.discriminator, expected[..8].to_vec());

    let value = json!({"id": 9});
    let data = event.encode(&value).unwrap();
    assert_eq!(event.decode(&data).unwrap(), value);
    assert_eq!(program.guess_event(&data).unwrap().name, "OfferMade");
}

#[test]
fn test_blob_disambiguation_between_accounts() {
    // Two accounts share a 1-byte discriminator and differ only by a
    // blob at offset 5
    let idl = json!({
        "accounts": [
            {"name": "Left", "discriminator": [9],
             "blobs": [{"offset": 5, "bytes": [1]}],
             "type": {"kind": "struct", "fields": [
                 {"name": "header", "type": ["u8", 4]},
                 {"name": "tag", "type": "u8"}
             ]}},
            {"name": "Right", "discriminator": [9],
             "blobs": [{"offset": 5, "bytes": [2]}],
             "type": {"kind": "struct", "fields": [
                 {"name": "header", "type": ["u8", 4]},
                 {"name": "tag", "type": "u8"}
             ]}}
        ]
    });
    let program = parse_program(&idl).unwrap();

    let left_data: [u8; 6] = [9, 0, 0, 0, 0, 1];
    let right_data: [u8; 6] = [9, 0, 0, 0, 0, 2];
    let neither_data: [u8; 6] = [9, 0, 0, 0, 0, 3];
    assert_eq!(program.guess_account(&left_data).unwrap().name, "Left");
    assert_eq!(program.guess_account(&right_data).unwrap().name, "Right");
    assert!(program.guess_account(&neither_data).is_none());
}

#[test]
fn test_parse_program_str_rejects_bad_json() {
    let error = solana_idl_codec::parse_program_str("{not json").unwrap_err();
    assert!(error.to_string().contains("invalid JSON"));
}
