//! Transaction builder

use bytes::Bytes;
use web3_primitives::{Address, U256};
use web3_types::{DynamicFeeTx, LegacyTx, SignedTransaction};

use crate::{SdkError, Wallet};

/// Transaction builder with fluent API
#[derive(Debug, Clone, Default)]
pub struct TxBuilder {
    chain_id: u64,
    nonce: Option<u64>,
    gas_limit: Option<u64>,
    gas_price: Option<U256>,
    max_fee_per_gas: Option<U256>,
    max_priority_fee_per_gas: Option<U256>,
    to: Option<Address>,
    value: U256,
    data: Bytes,
}

impl TxBuilder {
    /// Create a new transaction builder
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            ..Default::default()
        }
    }

    /// Set the nonce
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the gas limit
    pub fn gas_limit(mut self, limit: u64) -> Self {
        self.gas_limit = Some(limit);
        self
    }

    /// Set the gas price (for legacy transactions)
    pub fn gas_price(mut self, price: U256) -> Self {
        self.gas_price = Some(price);
        self
    }

    /// Set max fee per gas (for EIP-1559 transactions)
    pub fn max_fee_per_gas(mut self, fee: U256) -> Self {
        self.max_fee_per_gas = Some(fee);
        self
    }

    /// Set max priority fee per gas (for EIP-1559 transactions)
    pub fn max_priority_fee_per_gas(mut self, fee: U256) -> Self {
        self.max_priority_fee_per_gas = Some(fee);
        self
    }

    /// Set the recipient address
    pub fn to(mut self, address: Address) -> Self {
        self.to = Some(address);
        self
    }

    /// Set the value to transfer (in wei)
    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set the input data
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Build a legacy transaction (unsigned)
    pub fn build_legacy(&self) -> Result<LegacyTx, SdkError> {
        let nonce = self.nonce.ok_or(SdkError::MissingField("nonce".to_string()))?;
        let gas_limit = self.gas_limit.ok_or(SdkError::MissingField("gas_limit".to_string()))?;
        let gas_price = self.gas_price.ok_or(SdkError::MissingField("gas_price".to_string()))?;

        Ok(LegacyTx {
            nonce,
            gas_price,
            gas_limit,
            to: self.to,
            value: self.value,
            data: self.data.clone(),
        })
    }

    /// Build an EIP-1559 transaction (unsigned)
    pub fn build_dynamic_fee(&self) -> Result<DynamicFeeTx, SdkError> {
        let nonce = self.nonce.ok_or(SdkError::MissingField("nonce".to_string()))?;
        let gas_limit = self.gas_limit.ok_or(SdkError::MissingField("gas_limit".to_string()))?;
        let max_fee = self
            .max_fee_per_gas
            .ok_or(SdkError::MissingField("max_fee_per_gas".to_string()))?;
        let max_priority = self
            .max_priority_fee_per_gas
            .ok_or(SdkError::MissingField("max_priority_fee_per_gas".to_string()))?;

        Ok(DynamicFeeTx {
            chain_id: self.chain_id,
            nonce,
            max_priority_fee_per_gas: max_priority,
            max_fee_per_gas: max_fee,
            gas_limit,
            to: self.to,
            value: self.value,
            data: self.data.clone(),
        })
    }

    /// Sign as an EIP-155 legacy transaction
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required fields are missing (nonce, gas_limit, gas_price)
    /// - Chain ID is 0
    pub fn sign_legacy(&self, wallet: &Wallet) -> Result<SignedTransaction, SdkError> {
        Ok(self.build_legacy()?.sign(wallet.private_key(), self.chain_id)?)
    }

    /// Sign as an EIP-1559 transaction
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required fields are missing (nonce, gas_limit, max fees)
    /// - Chain ID is 0
    pub fn sign_dynamic_fee(&self, wallet: &Wallet) -> Result<SignedTransaction, SdkError> {
        Ok(self.build_dynamic_fee()?.sign(wallet.private_key())?)
    }

    /// Sign as EIP-1559 when a fee cap was set, otherwise as legacy.
    pub fn sign(&self, wallet: &Wallet) -> Result<SignedTransaction, SdkError> {
        if self.max_fee_per_gas.is_some() {
            self.sign_dynamic_fee(wallet)
        } else {
            self.sign_legacy(wallet)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web3_types::TxType;

    fn test_wallet() -> Wallet {
        Wallet::from_private_key("0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
            .unwrap()
    }

    fn recipient() -> Address {
        Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap()
    }

    #[test]
    fn test_tx_builder_legacy() {
        let tx = TxBuilder::new(1)
            .nonce(0)
            .gas_limit(21000)
            .gas_price(U256::from(1_000_000_000u64))
            .to(recipient())
            .value(U256::exp10(18))
            .build_legacy()
            .unwrap();

        assert_eq!(tx.nonce, 0);
        assert_eq!(tx.gas_limit, 21000);
        assert_eq!(tx.gas_price, U256::from(1_000_000_000u64));
        assert_eq!(tx.to, Some(recipient()));
        assert_eq!(tx.value, U256::exp10(18));
    }

    #[test]
    fn test_tx_builder_missing_nonce() {
        let result = TxBuilder::new(1)
            .gas_limit(21000)
            .gas_price(U256::one())
            .build_legacy();
        assert!(matches!(result, Err(SdkError::MissingField(f)) if f == "nonce"));
    }

    #[test]
    fn test_sign_legacy_recovers_sender() {
        let wallet = test_wallet();
        let signed = TxBuilder::new(60)
            .nonce(3)
            .gas_limit(21000)
            .gas_price(U256::from(1_000_000_000u64))
            .to(recipient())
            .value(U256::one())
            .sign_legacy(&wallet)
            .unwrap();

        assert_eq!(signed.tx_type(), TxType::Legacy);
        assert_eq!(signed.chain_id(), Some(60));
        assert_eq!(signed.recover_sender().unwrap(), *wallet.address());
    }

    #[test]
    fn test_sign_picks_dynamic_fee() {
        let wallet = test_wallet();
        let signed = TxBuilder::new(1)
            .nonce(0)
            .gas_limit(21000)
            .max_fee_per_gas(U256::from(100_000_000_000u64))
            .max_priority_fee_per_gas(U256::from(2_000_000_000u64))
            .to(recipient())
            .sign(&wallet)
            .unwrap();

        assert_eq!(signed.tx_type(), TxType::DynamicFee);
        assert_eq!(signed.encode()[0], 0x02);
        assert_eq!(signed.recover_sender().unwrap(), *wallet.address());
    }

    #[test]
    fn test_contract_creation_has_no_recipient() {
        let signed = TxBuilder::new(1)
            .nonce(0)
            .gas_limit(1_000_000)
            .gas_price(U256::one())
            .data(vec![0x60, 0x80, 0x60, 0x40])
            .sign_legacy(&test_wallet())
            .unwrap();
        assert!(signed.to().is_none());
    }

    #[test]
    fn test_rejects_zero_chain_id() {
        let result = TxBuilder::new(0)
            .nonce(0)
            .gas_limit(21000)
            .gas_price(U256::one())
            .to(recipient())
            .sign_legacy(&test_wallet());
        assert!(matches!(result, Err(SdkError::InvalidChainId(_))));
    }
}
