use anyhow::Context;
use serde::{Deserialize, Serialize};

use tickr_core::record::RegistryConfig;
use tickr_core::types::{AccountId, Balance};
use tickr_state::AllowanceLedger;

/// Registry parameters read from `--registry-params`.
///
/// Only consulted when the database is fresh; afterwards the stored config
/// is authoritative. Amounts are decimal strings (u128 base units).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryParams {
    /// Base-58 id of the administrator. Fixed for the life of the database.
    pub administrator: String,
    /// Base-58 id credited with registration fees.
    pub treasury: String,
    /// Initial fee; protocol default when absent.
    #[serde(default)]
    pub registration_fee: Option<String>,
    /// Initial expiry window; protocol default when absent.
    #[serde(default)]
    pub expiry_window_secs: Option<i64>,
    /// Development only: balances and approvals loaded into the in-memory
    /// fee ledger on every start.
    #[serde(default)]
    pub fee_allocations: Vec<FeeAllocation>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeeAllocation {
    pub account: String,
    pub balance: String,
    /// Amount approved for the registry to pull; zero when absent.
    #[serde(default)]
    pub allowance: Option<String>,
}

fn parse_amount(field: &str, s: &str) -> anyhow::Result<Balance> {
    s.parse::<Balance>()
        .with_context(|| format!("parsing {field} amount {s:?}"))
}

impl RegistryParams {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading registry params from {}", path.display()))?;
        serde_json::from_str(&json).context("parsing registry params JSON")
    }

    pub fn to_config(&self) -> anyhow::Result<RegistryConfig> {
        let administrator = AccountId::from_b58(&self.administrator).context("administrator")?;
        let treasury = AccountId::from_b58(&self.treasury).context("treasury")?;
        let mut config = RegistryConfig::new(administrator, treasury);
        if let Some(fee) = &self.registration_fee {
            config = config.with_fee_amount(parse_amount("registration_fee", fee)?);
        }
        if let Some(secs) = self.expiry_window_secs {
            config = config.with_expiry_window(secs).context("expiry_window_secs")?;
        }
        Ok(config)
    }

    pub fn seed_ledger(&self, ledger: &AllowanceLedger) -> anyhow::Result<()> {
        for alloc in &self.fee_allocations {
            let account = AccountId::from_b58(&alloc.account).context("fee allocation account")?;
            ledger.credit(&account, parse_amount("balance", &alloc.balance)?);
            if let Some(allowance) = &alloc.allowance {
                ledger.approve(&account, parse_amount("allowance", allowance)?);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickr_core::constants::{DEFAULT_EXPIRY_WINDOW_SECS, DEFAULT_REGISTRATION_FEE};

    fn id(b: u8) -> String {
        AccountId::from_bytes([b; 32]).to_b58()
    }

    #[test]
    fn minimal_params_use_defaults() {
        let json = format!(r#"{{"administrator":"{}","treasury":"{}"}}"#, id(1), id(2));
        let params: RegistryParams = serde_json::from_str(&json).unwrap();
        let cfg = params.to_config().unwrap();
        assert_eq!(cfg.fee_amount, DEFAULT_REGISTRATION_FEE);
        assert_eq!(cfg.expiry_window_secs, DEFAULT_EXPIRY_WINDOW_SECS);
        assert!(cfg.downstream_caller.is_none());
    }

    #[test]
    fn short_window_rejected() {
        let params = RegistryParams {
            administrator: id(1),
            treasury: id(2),
            registration_fee: Some("0".into()),
            expiry_window_secs: Some(3_600),
            fee_allocations: vec![],
        };
        assert!(params.to_config().is_err());
    }

    #[test]
    fn allocations_seed_ledger() {
        let params = RegistryParams {
            administrator: id(1),
            treasury: id(2),
            registration_fee: None,
            expiry_window_secs: None,
            fee_allocations: vec![FeeAllocation {
                account: id(5),
                balance: "1000".into(),
                allowance: Some("400".into()),
            }],
        };
        let ledger = AllowanceLedger::new();
        params.seed_ledger(&ledger).unwrap();
        let who = AccountId::from_bytes([5; 32]);
        assert_eq!(ledger.balance_of(&who), 1_000);
        assert_eq!(ledger.allowance_of(&who), 400);
    }
}
