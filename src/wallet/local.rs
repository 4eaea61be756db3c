//! Key-backed signers for running without a browser wallet. Both hold an
//! [`InjectiveWallet`] derived from a mnemonic and sign in-process.

use async_trait::async_trait;
use prost::Message as _;
use std::sync::Arc;
use tracing::{debug, info};

use super::eip712::hash_typed_data;
use super::keys::InjectiveWallet;
use super::signer::TransactionSigner;
use super::{CosmosSignRequest, DirectSignResponse, EvmSigner, NativeSigner, SendTxOptions, StdSignature};
use crate::chain::proto::{
    Any, AuthInfo, Coin, EthSecp256k1PubKey, Fee, ModeInfo, ModeInfoSingle, SignDoc, SignerInfo, TxBody, TxRaw,
    ETH_SECP256K1_PUBKEY_TYPE_URL, SIGN_MODE_DIRECT,
};
use crate::chain::{GasAmount, TxRestClient};
use crate::error::{BroadcastError, BroadcastResult};
use crate::indexer::{PreparedTransaction, TransactionApi, Web3BroadcastRequest, Web3BroadcastResponse};

/// Signs EIP-712 payloads with a local key and submits through the web3 gateway
pub struct LocalEvmSigner {
    wallet: Arc<InjectiveWallet>,
    signer: TransactionSigner,
    transaction_api: Arc<dyn TransactionApi>,
}

impl LocalEvmSigner {
    pub fn new(wallet: Arc<InjectiveWallet>, transaction_api: Arc<dyn TransactionApi>) -> Self {
        Self {
            wallet,
            signer: TransactionSigner::new(),
            transaction_api,
        }
    }
}

#[async_trait]
impl EvmSigner for LocalEvmSigner {
    async fn accounts(&self) -> BroadcastResult<Vec<String>> {
        Ok(vec![self.wallet.ethereum_address.clone()])
    }

    async fn sign_transaction(&self, prepared: &PreparedTransaction, address: &str) -> BroadcastResult<String> {
        if !self.wallet.owns(address) {
            return Err(BroadcastError::SigningRejected(format!(
                "No key for {} in this wallet",
                address
            )));
        }

        let typed_data: serde_json::Value = serde_json::from_str(&prepared.data)
            .map_err(|e| BroadcastError::Wallet(format!("Prepared payload is not JSON: {}", e)))?;
        let digest = hash_typed_data(&typed_data)?;
        let signature = self.signer.sign_recoverable(&digest, &self.wallet.private_key()?)?;

        debug!("Signed EIP-712 payload for {}", address);
        Ok(format!("0x{}", hex::encode(signature)))
    }

    async fn send_transaction(&self, request: Web3BroadcastRequest) -> BroadcastResult<Web3BroadcastResponse> {
        self.transaction_api.broadcast_tx(request).await
    }
}

/// Signs SIGN_MODE_DIRECT documents with a local key and submits to a node
pub struct LocalNativeSigner {
    wallet: Arc<InjectiveWallet>,
    signer: TransactionSigner,
    client: TxRestClient,
    chain_id: String,
    gas_price: String,
}

impl LocalNativeSigner {
    pub fn new(
        wallet: Arc<InjectiveWallet>,
        client: TxRestClient,
        chain_id: impl Into<String>,
        gas_price: impl Into<String>,
    ) -> Self {
        Self {
            wallet,
            signer: TransactionSigner::new(),
            client,
            chain_id: chain_id.into(),
            gas_price: gas_price.into(),
        }
    }

    fn signer_info(public_key: Vec<u8>, sequence: u64) -> SignerInfo {
        SignerInfo {
            public_key: Some(Any::pack(ETH_SECP256K1_PUBKEY_TYPE_URL, &EthSecp256k1PubKey { key: public_key })),
            mode_info: Some(ModeInfo {
                single: Some(ModeInfoSingle { mode: SIGN_MODE_DIRECT }),
            }),
            sequence,
        }
    }

    /// Body, auth info and sign doc for a request. Signer infos follow the
    /// signature order of a fee-delegated transaction: fee payer first, then
    /// the user. A fee payer whose key the chain does not know yet is an error.
    async fn build_sign_doc(&self, request: &CosmosSignRequest) -> BroadcastResult<SignDoc> {
        let gas = request
            .gas_amount()
            .ok_or_else(|| BroadcastError::Wallet(format!("Invalid gas amount: {}", request.gas)))?;

        let account = self.client.query_account(&self.wallet.address).await?;
        let mut signer_infos = Vec::with_capacity(2);
        if !request.fee_payer.is_empty() && request.fee_payer != self.wallet.address {
            let fee_payer = self.client.query_account(&request.fee_payer).await?;
            let key = fee_payer.pub_key.ok_or_else(|| {
                BroadcastError::Wallet(format!("No public key on chain for fee payer {}", request.fee_payer))
            })?;
            signer_infos.push(Self::signer_info(key, fee_payer.sequence));
        }
        signer_infos.push(Self::signer_info(
            self.wallet.public_key_compressed().to_vec(),
            account.sequence,
        ));

        let body = TxBody {
            messages: request.messages.iter().map(|msg| msg.to_any()).collect(),
            memo: request.memo.clone(),
            timeout_height: 0,
            extension_options: vec![],
            non_critical_extension_options: vec![],
        };

        let auth_info = AuthInfo {
            signer_infos,
            fee: Some(Fee {
                amount: parse_gas_price(&self.gas_price, gas)?,
                gas_limit: gas.as_u64(),
                payer: request.fee_payer.clone(),
                granter: String::new(),
            }),
        };

        Ok(SignDoc {
            body_bytes: body.encode_to_vec(),
            auth_info_bytes: auth_info.encode_to_vec(),
            chain_id: self.chain_id.clone(),
            account_number: account.account_number,
        })
    }
}

#[async_trait]
impl NativeSigner for LocalNativeSigner {
    async fn accounts(&self) -> BroadcastResult<Vec<String>> {
        Ok(vec![self.wallet.address.clone()])
    }

    async fn sign_transaction(&self, request: CosmosSignRequest, address: &str) -> BroadcastResult<DirectSignResponse> {
        if !self.wallet.owns(address) {
            return Err(BroadcastError::SigningRejected(format!(
                "No key for {} in this wallet",
                address
            )));
        }

        let sign_doc = self.build_sign_doc(&request).await?;
        let signature = self
            .signer
            .sign_direct(&sign_doc.encode_to_vec(), &self.wallet.private_key()?)?;

        debug!("Signed direct sign doc for {} (account {})", address, sign_doc.account_number);
        Ok(DirectSignResponse {
            signed: sign_doc,
            signature: StdSignature {
                pub_key: self.wallet.public_key_compressed().to_vec(),
                signature: signature.to_vec(),
            },
        })
    }

    async fn send_transaction(&self, tx: TxRaw, options: SendTxOptions) -> BroadcastResult<String> {
        if options.chain_id != self.chain_id {
            return Err(BroadcastError::Submission(format!(
                "Signer is bound to {}, not {}",
                self.chain_id, options.chain_id
            )));
        }
        info!("Submitting transaction for {} to {}", options.address, options.chain_id);
        self.client.broadcast_tx(&tx).await
    }
}

/// Fee for `gas` at a price like "500000000inj". The price is already in the
/// smallest unit, so the fee is a plain product.
pub fn parse_gas_price(gas_price: &str, gas: GasAmount) -> BroadcastResult<Vec<Coin>> {
    let split_pos = gas_price
        .chars()
        .position(|c| c.is_alphabetic())
        .ok_or_else(|| BroadcastError::Config(format!("Invalid gas price format: {}", gas_price)))?;

    let (amount_str, denom) = gas_price.split_at(split_pos);
    let amount: u128 = amount_str
        .parse()
        .map_err(|e| BroadcastError::Config(format!("Invalid gas price amount {}: {}", amount_str, e)))?;

    let fee = amount
        .checked_mul(gas.as_u64() as u128)
        .ok_or_else(|| BroadcastError::Config(format!("Fee overflows at gas price {}", gas_price)))?;

    Ok(vec![Coin {
        denom: denom.to_string(),
        amount: fee.to_string(),
    }])
}
