#![allow(dead_code)]

use pay_gate::models::{AssetDescriptor, Chain, BASE_USDC_SEPOLIA, SOLANA_USDC_DEVNET};
use serde_json::{json, Value};

pub const SERVICE_SOLANA_WALLET: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
pub const SERVICE_TOKEN_ACCOUNT: &str = "3Ht9rUEqHb1T7YFZPQ2rGGhWwGK4rFZyWNDGqFhMgp6b";
pub const STRANGER_TOKEN_ACCOUNT: &str = "7Qv1ZQnT7XH6nDAnXnfGbc2oWv8oB2pTqyfJJRNGY7J1";
pub const PAYER_TOKEN_ACCOUNT: &str = "BZnJH9VNcZC5SLcMCsnYZp6sCS6FLa4UGTmAMxPo7e2g";
pub const PAYER_WALLET: &str = "HN7cABqLq46Es1jh92dQQisAq662SmxELLLsHHe4YWrH";
pub const SIGNATURE: &str =
    "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW";

pub const SERVICE_BASE_WALLET: &str = "0x1111111111111111111111111111111111111111";
pub const PAYER_BASE_WALLET: &str = "0x2222222222222222222222222222222222222222";
pub const TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";
pub const TRANSFER_TOPIC: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

pub fn solana_usdc() -> AssetDescriptor {
    AssetDescriptor::new(Chain::Solana, SOLANA_USDC_DEVNET, 6)
}

pub fn base_usdc() -> AssetDescriptor {
    AssetDescriptor::new(Chain::Base, BASE_USDC_SEPOLIA, 6)
}

pub fn rpc_result(result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

pub fn rpc_error(code: i64, message: &str) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": code, "message": message } }).to_string()
}

/// `getTransaction` result with one `transferChecked` of `raw_amount` into `destination`.
pub fn solana_transfer(destination: &str, raw_amount: u64) -> Value {
    json!({
        "slot": 301_234_567u64,
        "blockTime": 1_730_000_000,
        "version": 0,
        "meta": {
            "err": null,
            "fee": 5000,
            "status": { "Ok": null },
            "innerInstructions": [],
            "preTokenBalances": [],
            "postTokenBalances": [
                {
                    "accountIndex": 1,
                    "mint": SOLANA_USDC_DEVNET,
                    "owner": PAYER_WALLET,
                    "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                    "uiTokenAmount": { "amount": "0", "decimals": 6, "uiAmount": 0.0, "uiAmountString": "0" }
                },
                {
                    "accountIndex": 2,
                    "mint": SOLANA_USDC_DEVNET,
                    "owner": SERVICE_SOLANA_WALLET,
                    "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                    "uiTokenAmount": { "amount": "10000", "decimals": 6, "uiAmount": 0.01, "uiAmountString": "0.01" }
                },
                {
                    "accountIndex": 3,
                    "mint": SOLANA_USDC_DEVNET,
                    "owner": PAYER_WALLET,
                    "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                    "uiTokenAmount": { "amount": "10000", "decimals": 6, "uiAmount": 0.01, "uiAmountString": "0.01" }
                }
            ]
        },
        "transaction": {
            "signatures": [SIGNATURE],
            "message": {
                "accountKeys": [
                    { "pubkey": PAYER_WALLET, "signer": true, "writable": true, "source": "transaction" },
                    { "pubkey": PAYER_TOKEN_ACCOUNT, "signer": false, "writable": true, "source": "transaction" },
                    { "pubkey": SERVICE_TOKEN_ACCOUNT, "signer": false, "writable": true, "source": "transaction" },
                    { "pubkey": STRANGER_TOKEN_ACCOUNT, "signer": false, "writable": true, "source": "transaction" },
                    { "pubkey": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA", "signer": false, "writable": false, "source": "transaction" }
                ],
                "recentBlockhash": "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N",
                "instructions": [
                    {
                        "program": "spl-token",
                        "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                        "parsed": {
                            "type": "transferChecked",
                            "info": {
                                "authority": PAYER_WALLET,
                                "destination": destination,
                                "mint": SOLANA_USDC_DEVNET,
                                "source": PAYER_TOKEN_ACCOUNT,
                                "tokenAmount": {
                                    "amount": raw_amount.to_string(),
                                    "decimals": 6,
                                    "uiAmount": raw_amount as f64 / 1e6,
                                    "uiAmountString": (raw_amount as f64 / 1e6).to_string()
                                }
                            }
                        },
                        "stackHeight": null
                    }
                ]
            }
        }
    })
}

fn address_topic(address: &str) -> String {
    format!("0x{:0>64}", address.trim_start_matches("0x"))
}

/// `eth_getTransactionReceipt` result with one USDC Transfer log.
pub fn base_receipt(status: u64, to: &str, raw_amount: u64) -> Value {
    json!({
        "transactionHash": TX_HASH,
        "transactionIndex": "0x3",
        "blockHash": "0x8e2a0c2f5b1c1d0f9b0e7d0a6a2e9bc1f4d0e0f0a1b2c3d4e5f60718293a4b5c",
        "blockNumber": "0x1406f40",
        "from": PAYER_BASE_WALLET,
        "to": BASE_USDC_SEPOLIA.to_lowercase(),
        "cumulativeGasUsed": "0x2dc6c0",
        "gasUsed": "0xd3c2",
        "effectiveGasPrice": "0x5f5e100",
        "contractAddress": null,
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "type": "0x2",
        "status": format!("0x{:x}", status),
        "logs": [
            {
                "address": BASE_USDC_SEPOLIA.to_lowercase(),
                "topics": [TRANSFER_TOPIC, address_topic(PAYER_BASE_WALLET), address_topic(to)],
                "data": format!("0x{:064x}", raw_amount),
                "blockNumber": "0x1406f40",
                "transactionHash": TX_HASH,
                "transactionIndex": "0x3",
                "blockHash": "0x8e2a0c2f5b1c1d0f9b0e7d0a6a2e9bc1f4d0e0f0a1b2c3d4e5f60718293a4b5c",
                "logIndex": "0x7",
                "removed": false
            }
        ]
    })
}

/// An endpoint that accepts connections and never answers.
pub async fn silent_rpc_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}
