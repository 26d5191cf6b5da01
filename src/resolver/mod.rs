//! Instruction address resolution
//!
//! Derives every account address an instruction needs: fixed addresses
//! come straight from the IDL, PDAs are derived from their seed blobs.
//! Seeds may reference other accounts (their address, or a field of
//! their decoded state), so resolution runs full passes until a pass
//! resolves nothing new. Passes are bounded by the account count, which
//! guarantees termination even for circular seed specifications.
//!
//! Non-resolution is a normal, silent outcome here (logged at debug
//! level); `IdlInstruction::account_metas` is where a missing required
//! account becomes an error.

use std::collections::HashMap;

use log::debug;
use serde_json::Value;
use solana_pubkey::Pubkey;

use crate::codec;
use crate::errors::ResolveError;
use crate::models::blob::IdlInstructionBlob;
use crate::models::instruction::{IdlInstruction, IdlInstructionAccount};
use crate::pda;

/// Resolve as many instruction account addresses as possible.
///
/// `known_addresses` seeds the result (caller-supplied signers, state
/// accounts, ...); `payload` feeds `arg` seeds; `account_states` feeds
/// multi-segment `account` seeds with decoded account contents. Accounts
/// still unresolved at the fixed point are simply absent from the result.
pub fn resolve_instruction_addresses(
    instruction: &IdlInstruction,
    instruction_program_id: &Pubkey,
    known_addresses: &HashMap<String, Pubkey>,
    payload: &Value,
    account_states: &HashMap<String, Value>,
) -> HashMap<String, Pubkey> {
    let mut resolved = known_addresses.clone();
    // Each productive pass resolves at least one account, so account
    // count + 1 passes always reach the fixed point
    for _ in 0..=instruction.accounts.len() {
        let mut progressed = false;
        for account in &instruction.accounts {
            if resolved.contains_key(&account.name) {
                continue;
            }
            match try_resolve_account(
                account,
                instruction_program_id,
                &resolved,
                payload,
                account_states,
            ) {
                Ok(Some(address)) => {
                    resolved.insert(account.name.clone(), address);
                    progressed = true;
                }
                Ok(None) => {}
                Err(error) => {
                    debug!(
                        "account \"{}\" not resolvable this pass: {}",
                        account.name, error
                    );
                }
            }
        }
        if !progressed {
            break;
        }
    }
    resolved
}

/// Resolve one account: fixed address, else PDA spec, else nothing.
///
/// Errors mean "not resolvable with what is known so far" and are
/// swallowed by the pass loop.
fn try_resolve_account(
    account: &IdlInstructionAccount,
    instruction_program_id: &Pubkey,
    resolved: &HashMap<String, Pubkey>,
    payload: &Value,
    account_states: &HashMap<String, Value>,
) -> Result<Option<Pubkey>, ResolveError> {
    if let Some(address) = account.address {
        return Ok(Some(address));
    }
    let Some(pda_spec) = &account.pda else {
        return Ok(None);
    };

    let mut seeds = Vec::with_capacity(pda_spec.seeds.len());
    for blob in &pda_spec.seeds {
        seeds.push(blob_bytes(blob, payload, resolved, account_states)?);
    }

    let program_id = match &pda_spec.program {
        Some(blob) => {
            let bytes = blob_bytes(blob, payload, resolved, account_states)?;
            Pubkey::try_from(bytes.as_slice()).map_err(|_| ResolveError::InvalidProgramBlob {
                length: bytes.len(),
            })?
        }
        None => *instruction_program_id,
    };

    let (address, _bump) = pda::derive_pda_from_bytes(&program_id, &seeds)?;
    Ok(Some(address))
}

/// Materialize one seed blob into bytes
fn blob_bytes(
    blob: &IdlInstructionBlob,
    payload: &Value,
    resolved: &HashMap<String, Pubkey>,
    account_states: &HashMap<String, Value>,
) -> Result<Vec<u8>, ResolveError> {
    match blob {
        IdlInstructionBlob::Const { bytes } => Ok(bytes.clone()),
        IdlInstructionBlob::Arg { path, type_full } => {
            let value = path
                .value_at(payload)
                .ok_or_else(|| ResolveError::UnknownPathValue {
                    path: path.to_string(),
                    context: "instruction payload".to_string(),
                })?;
            // Seeds are the typed encoding of the located value, without
            // length prefixes
            let mut data = Vec::new();
            codec::serialize(type_full, value, &mut data, false)?;
            Ok(data)
        }
        IdlInstructionBlob::Account { path, content_type } => {
            let name = path
                .first_key()
                .ok_or_else(|| ResolveError::UnknownPathValue {
                    path: path.to_string(),
                    context: "instruction accounts".to_string(),
                })?;
            if path.len() == 1 {
                // The seed is the account's own address
                let address = resolved
                    .get(name)
                    .ok_or_else(|| ResolveError::UnknownAccount {
                        name: name.to_string(),
                    })?;
                return Ok(address.to_bytes().to_vec());
            }
            // The seed lives inside the account's decoded state
            let state =
                account_states
                    .get(name)
                    .ok_or_else(|| ResolveError::UnknownAccountState {
                        name: name.to_string(),
                    })?;
            let (_, field_path) = path.split_first().expect("path has at least two segments");
            let value = field_path
                .value_at(state)
                .ok_or_else(|| ResolveError::UnknownPathValue {
                    path: path.to_string(),
                    context: format!("state of account \"{}\"", name),
                })?;
            let type_full = content_type
                .as_ref()
                .ok_or_else(|| ResolveError::UntypedSeed {
                    path: path.to_string(),
                })?;
            let mut data = Vec::new();
            codec::serialize(type_full, value, &mut data, false)?;
            Ok(data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    use crate::models::blob::IdlInstructionAccountPda;
    use crate::models::type_flat::TypeFlatFields;
    use crate::models::type_full::{TypeFull, TypeFullFields};
    use crate::models::type_primitive::TypePrimitive;
    use crate::utils::path::IdlPath;

    fn program_id() -> Pubkey {
        Pubkey::from_str("11111111111111111111111111111111").unwrap()
    }

    fn payer() -> Pubkey {
        // The base point is a valid key, good enough for a test wallet
        let mut bytes = [0x66u8; 32];
        bytes[0] = 0x58;
        Pubkey::new_from_array(bytes)
    }

    fn base_account(name: &str) -> IdlInstructionAccount {
        IdlInstructionAccount {
            name: name.to_string(),
            docs: None,
            writable: false,
            signer: false,
            optional: false,
            address: None,
            pda: None,
        }
    }

    fn pda_account(name: &str, seeds: Vec<IdlInstructionBlob>) -> IdlInstructionAccount {
        IdlInstructionAccount {
            pda: Some(IdlInstructionAccountPda {
                seeds,
                program: None,
            }),
            ..base_account(name)
        }
    }

    fn const_seed(bytes: &[u8]) -> IdlInstructionBlob {
        IdlInstructionBlob::Const {
            bytes: bytes.to_vec(),
        }
    }

    fn account_seed(path: &str) -> IdlInstructionBlob {
        IdlInstructionBlob::Account {
            path: IdlPath::parse(path),
            content_type: None,
        }
    }

    fn instruction(accounts: Vec<IdlInstructionAccount>) -> IdlInstruction {
        IdlInstruction {
            name: "test".to_string(),
            docs: None,
            discriminator: vec![0xAA],
            accounts,
            args_type_flat_fields: TypeFlatFields::Nothing,
            args_type_full_fields: TypeFullFields::Nothing,
            return_type_flat: None,
            return_type_full: None,
        }
    }

    #[test]
    fn test_chained_pdas_reach_fixed_point() {
        // vault depends on payer, meta depends on vault
        let instruction = instruction(vec![
            base_account("payer"),
            pda_account("vault", vec![const_seed(b"vault"), account_seed("payer")]),
            pda_account("meta", vec![const_seed(b"meta"), account_seed("vault")]),
        ]);
        let known = HashMap::from([("payer".to_string(), payer())]);
        let resolved = resolve_instruction_addresses(
            &instruction,
            &program_id(),
            &known,
            &json!({}),
            &HashMap::new(),
        );
        assert_eq!(resolved.len(), 3);

        let (vault, _) =
            pda::derive_pda(&program_id(), &[b"vault", &payer().to_bytes()]).unwrap();
        assert_eq!(resolved.get("vault"), Some(&vault));
        let (meta, _) = pda::derive_pda(&program_id(), &[b"meta", &vault.to_bytes()]).unwrap();
        assert_eq!(resolved.get("meta"), Some(&meta));
    }

    #[test]
    fn test_resolution_is_order_independent() {
        // Same chain, declared in the worst order for a single pass
        let forward = instruction(vec![
            base_account("payer"),
            pda_account("vault", vec![const_seed(b"vault"), account_seed("payer")]),
            pda_account("meta", vec![const_seed(b"meta"), account_seed("vault")]),
        ]);
        let backward = instruction(vec![
            pda_account("meta", vec![const_seed(b"meta"), account_seed("vault")]),
            pda_account("vault", vec![const_seed(b"vault"), account_seed("payer")]),
            base_account("payer"),
        ]);
        let known = HashMap::from([("payer".to_string(), payer())]);
        let resolve = |instruction: &IdlInstruction| {
            resolve_instruction_addresses(
                instruction,
                &program_id(),
                &known,
                &json!({}),
                &HashMap::new(),
            )
        };
        assert_eq!(resolve(&forward), resolve(&backward));
    }

    #[test]
    fn test_arg_seed_uses_typed_encoding() {
        let instruction = instruction(vec![pda_account(
            "counter",
            vec![
                const_seed(b"counter"),
                IdlInstructionBlob::Arg {
                    path: IdlPath::parse("id"),
                    type_full: TypeFull::primitive(TypePrimitive::U64),
                },
            ],
        )]);
        let resolved = resolve_instruction_addresses(
            &instruction,
            &program_id(),
            &HashMap::new(),
            &json!({"id": 300}),
            &HashMap::new(),
        );
        // 300u64 little-endian, not the string "300"
        let (expected, _) = pda::derive_pda(
            &program_id(),
            &[b"counter", &300u64.to_le_bytes()],
        )
        .unwrap();
        assert_eq!(resolved.get("counter"), Some(&expected));
    }

    #[test]
    fn test_account_state_seed() {
        let instruction = instruction(vec![
            base_account("escrow"),
            pda_account(
                "vault",
                vec![IdlInstructionBlob::Account {
                    path: IdlPath::parse("escrow.maker"),
                    content_type: Some(TypeFull::primitive(TypePrimitive::Pubkey)),
                }],
            ),
        ]);
        let escrow = payer();
        let maker = payer();
        let known = HashMap::from([("escrow".to_string(), escrow)]);
        let states = HashMap::from([(
            "escrow".to_string(),
            json!({"maker": maker.to_string()}),
        )]);
        let resolved = resolve_instruction_addresses(
            &instruction,
            &program_id(),
            &known,
            &json!({}),
            &states,
        );
        let (expected, _) = pda::derive_pda(&program_id(), &[&maker.to_bytes()]).unwrap();
        assert_eq!(resolved.get("vault"), Some(&expected));
    }

    #[test]
    fn test_unresolvable_accounts_are_left_out() {
        let instruction = instruction(vec![
            // No address, no pda spec, nothing known: stays unresolved
            base_account("mystery"),
            pda_account("vault", vec![account_seed("mystery")]),
        ]);
        let resolved = resolve_instruction_addresses(
            &instruction,
            &program_id(),
            &HashMap::new(),
            &json!({}),
            &HashMap::new(),
        );
        assert!(resolved.is_empty());

        // Compiling afterward names the missing account
        let error = instruction.account_metas(&resolved).unwrap_err();
        assert!(
            matches!(error, ResolveError::MissingRequiredAccount { name } if name == "mystery")
        );
    }

    #[test]
    fn test_fixed_address_and_optional_accounts() {
        let fixed = payer();
        let mut with_address = base_account("config");
        with_address.address = Some(fixed);
        let mut optional = base_account("hint");
        optional.optional = true;
        let instruction = instruction(vec![with_address, optional]);

        let resolved = resolve_instruction_addresses(
            &instruction,
            &program_id(),
            &HashMap::new(),
            &json!({}),
            &HashMap::new(),
        );
        assert_eq!(resolved.get("config"), Some(&fixed));
        assert_eq!(resolved.get("hint"), None);

        // Optional account absent: metas simply skip it
        let metas = instruction.account_metas(&resolved).unwrap();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].pubkey, fixed);
    }
}
