use solana_sdk::{
    compute_budget::{self, ComputeBudgetInstruction},
    instruction::CompiledInstruction,
    message::VersionedMessage,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::VersionedTransaction,
};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::domain::GasSettings;
use crate::ports::{ExecutionError, SignedTransaction, TransactionSigner};

const SET_COMPUTE_UNIT_LIMIT_TAG: u8 = 2;
const SET_COMPUTE_UNIT_PRICE_TAG: u8 = 3;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Failed to load keypair from file: {0}")]
    LoadError(String),
    #[error("Failed to sign transaction: {0}")]
    SigningError(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<WalletError> for ExecutionError {
    fn from(err: WalletError) -> Self {
        ExecutionError::SigningError(err.to_string())
    }
}

/// Wallet manager for loading and signing with Solana keypairs
pub struct WalletManager {
    keypair: Keypair,
}

impl WalletManager {
    /// Load keypair from a file path (JSON array format)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| WalletError::LoadError(format!("Failed to read file: {}", e)))?;

        // Parse JSON array of bytes
        let bytes: Vec<u8> = serde_json::from_str(&contents)
            .map_err(|e| WalletError::LoadError(format!("Invalid JSON format: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Load keypair from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let keypair = Keypair::try_from(bytes)
            .map_err(|e| WalletError::InvalidKeypair(e.to_string()))?;

        Ok(Self { keypair })
    }

    /// Load keypair from a base58 secret key, as exported by browser wallets
    pub fn from_base58(secret: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidKeypair(format!("Invalid base58: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Create a new random keypair (for testing)
    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    /// Get the public key as a string
    pub fn public_key(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    /// Get the public key as Pubkey
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Export keypair as bytes (use with caution)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.keypair.to_bytes().to_vec()
    }

    /// Keypair as the JSON byte array the file loader reads
    pub fn to_json(&self) -> Result<String, WalletError> {
        serde_json::to_string(&self.to_bytes())
            .map_err(|e| WalletError::LoadError(format!("Failed to serialize: {}", e)))
    }

    /// Save keypair to file (JSON array format)
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WalletError> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// Pin compute budget instructions to `gas` and sign a router-built transaction
    pub fn sign_versioned(
        &self,
        unsigned: &[u8],
        gas: &GasSettings,
    ) -> Result<VersionedTransaction, WalletError> {
        let tx: VersionedTransaction = bincode::deserialize(unsigned)
            .map_err(|e| WalletError::InvalidTransaction(e.to_string()))?;

        let mut message = tx.message;
        pin_compute_budget(&mut message, gas)?;

        VersionedTransaction::try_new(message, &[&self.keypair])
            .map_err(|e| WalletError::SigningError(e.to_string()))
    }
}

/// Rewrite SetComputeUnitLimit/SetComputeUnitPrice in place, inserting missing ones
fn pin_compute_budget(message: &mut VersionedMessage, gas: &GasSettings) -> Result<(), WalletError> {
    let (account_keys, instructions) = match message {
        VersionedMessage::Legacy(m) => (&m.account_keys, &mut m.instructions),
        VersionedMessage::V0(m) => (&m.account_keys, &mut m.instructions),
    };

    let program_index = account_keys
        .iter()
        .position(|key| *key == compute_budget::id())
        .ok_or_else(|| {
            WalletError::InvalidTransaction("no ComputeBudget program in account keys".into())
        })?;
    let program_index = u8::try_from(program_index)
        .map_err(|_| WalletError::InvalidTransaction("account index out of range".into()))?;

    let limit_data = ComputeBudgetInstruction::set_compute_unit_limit(gas.compute_unit_limit).data;
    let price_data = ComputeBudgetInstruction::set_compute_unit_price(gas.priority_fee_per_unit).data;

    let mut limit_set = false;
    let mut price_set = false;
    for ix in instructions.iter_mut().filter(|ix| ix.program_id_index == program_index) {
        match ix.data.first() {
            Some(&SET_COMPUTE_UNIT_LIMIT_TAG) => {
                ix.data = limit_data.clone();
                limit_set = true;
            }
            Some(&SET_COMPUTE_UNIT_PRICE_TAG) => {
                ix.data = price_data.clone();
                price_set = true;
            }
            _ => {}
        }
    }

    if !price_set {
        instructions.insert(0, compiled(program_index, price_data));
    }
    if !limit_set {
        instructions.insert(0, compiled(program_index, limit_data));
    }

    Ok(())
}

fn compiled(program_id_index: u8, data: Vec<u8>) -> CompiledInstruction {
    CompiledInstruction {
        program_id_index,
        accounts: Vec::new(),
        data,
    }
}

impl TransactionSigner for WalletManager {
    fn pubkey(&self) -> String {
        self.public_key()
    }

    fn sign(&self, unsigned: &[u8], gas: &GasSettings) -> Result<SignedTransaction, ExecutionError> {
        let tx = self.sign_versioned(unsigned, gas)?;

        let signature = tx
            .signatures
            .first()
            .map(|s| s.to_string())
            .ok_or_else(|| ExecutionError::SigningError("transaction has no signatures".into()))?;
        let wire = bincode::serialize(&tx)
            .map_err(|e| ExecutionError::SigningError(format!("Failed to serialize: {}", e)))?;

        Ok(SignedTransaction { signature, wire })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{hash::Hash, message::Message, signature::Signature, system_instruction};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn unsigned_swap(payer: &Pubkey, with_budget: bool) -> Vec<u8> {
        let mut ixs = Vec::new();
        if with_budget {
            ixs.push(ComputeBudgetInstruction::set_compute_unit_limit(1_000));
            ixs.push(ComputeBudgetInstruction::set_compute_unit_price(1));
        }
        ixs.push(system_instruction::transfer(payer, &Pubkey::new_unique(), 1));

        let message = Message::new_with_blockhash(&ixs, Some(payer), &Hash::new_unique());
        let tx = VersionedTransaction {
            signatures: vec![Signature::default(); message.header.num_required_signatures as usize],
            message: VersionedMessage::Legacy(message),
        };
        bincode::serialize(&tx).unwrap()
    }

    fn budget_data(tx: &VersionedTransaction) -> Vec<Vec<u8>> {
        let keys = tx.message.static_account_keys();
        tx.message
            .instructions()
            .iter()
            .filter(|ix| keys[ix.program_id_index as usize] == compute_budget::id())
            .map(|ix| ix.data.clone())
            .collect()
    }

    #[test]
    fn test_new_random_wallet() {
        let wallet = WalletManager::new_random();
        let pubkey = wallet.public_key();
        assert!(pubkey.len() >= 32 && pubkey.len() <= 44);
    }

    #[test]
    fn test_from_bytes() {
        let wallet1 = WalletManager::new_random();
        let wallet2 = WalletManager::from_bytes(&wallet1.to_bytes()).unwrap();
        assert_eq!(wallet1.public_key(), wallet2.public_key());
    }

    #[test]
    fn test_from_base58() {
        let wallet1 = WalletManager::new_random();
        let secret = bs58::encode(wallet1.to_bytes()).into_string();

        let wallet2 = WalletManager::from_base58(&secret).unwrap();
        assert_eq!(wallet1.public_key(), wallet2.public_key());
    }

    #[test]
    fn test_from_base58_invalid() {
        assert!(matches!(
            WalletManager::from_base58("0OIl"),
            Err(WalletError::InvalidKeypair(_))
        ));
        assert!(WalletManager::from_base58("3yZe7d").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let wallet1 = WalletManager::new_random();

        wallet1.save_to_file(temp_file.path()).unwrap();

        let wallet2 = WalletManager::from_file(temp_file.path()).unwrap();
        assert_eq!(wallet1.public_key(), wallet2.public_key());
    }

    #[test]
    fn test_invalid_bytes() {
        assert!(WalletManager::from_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_invalid_json_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"not valid json").unwrap();
        temp_file.flush().unwrap();

        assert!(WalletManager::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_sign_rewrites_compute_budget() {
        let wallet = WalletManager::new_random();
        let gas = GasSettings::new(400_000, 25_000);
        let unsigned = unsigned_swap(&wallet.pubkey(), true);

        let signed = TransactionSigner::sign(&wallet, &unsigned, &gas).unwrap();
        let tx: VersionedTransaction = bincode::deserialize(&signed.wire).unwrap();

        assert_eq!(
            budget_data(&tx),
            vec![
                ComputeBudgetInstruction::set_compute_unit_limit(400_000).data,
                ComputeBudgetInstruction::set_compute_unit_price(25_000).data,
            ]
        );
        assert_eq!(signed.signature, tx.signatures[0].to_string());
        assert!(tx.verify_with_results().iter().all(|ok| *ok));
    }

    #[test]
    fn test_sign_inserts_missing_instruction() {
        let wallet = WalletManager::new_random();
        let payer = wallet.pubkey();
        let ixs = vec![
            ComputeBudgetInstruction::set_compute_unit_price(7),
            system_instruction::transfer(&payer, &Pubkey::new_unique(), 1),
        ];
        let message = Message::new_with_blockhash(&ixs, Some(&payer), &Hash::new_unique());
        let unsigned = bincode::serialize(&VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::Legacy(message),
        })
        .unwrap();

        let tx = wallet.sign_versioned(&unsigned, &GasSettings::new(300_000, 9_000)).unwrap();
        let data = budget_data(&tx);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0], ComputeBudgetInstruction::set_compute_unit_limit(300_000).data);
        assert_eq!(data[1], ComputeBudgetInstruction::set_compute_unit_price(9_000).data);
    }

    #[test]
    fn test_sign_without_budget_program_fails() {
        let wallet = WalletManager::new_random();
        let unsigned = unsigned_swap(&wallet.pubkey(), false);

        let err = TransactionSigner::sign(&wallet, &unsigned, &GasSettings::new(1, 1)).unwrap_err();
        assert!(matches!(err, ExecutionError::SigningError(_)));
    }

    #[test]
    fn test_sign_garbage_fails() {
        let wallet = WalletManager::new_random();
        let err = TransactionSigner::sign(&wallet, b"unsigned:xyz", &GasSettings::new(1, 1)).unwrap_err();
        assert!(matches!(err, ExecutionError::SigningError(_)));
    }
}
