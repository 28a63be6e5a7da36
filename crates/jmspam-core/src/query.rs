use uuid::Uuid;

use crate::errors::QueryError;
use crate::types::Operation;

/// Path of the account-secret endpoint.
pub const ACCOUNT_SECRET_PATH: &str =
    "/api/v1/accounts/integration-applications/account-secret/";

/// Parameter set selecting one account on the PAM API.
///
/// Either `account_id` alone, or an asset selector (`asset` or `asset_id`)
/// together with `account`. Id fields must be valid UUIDs.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SecretQuery {
    pub asset: Option<String>,
    pub asset_id: Option<String>,
    pub account: Option<String>,
    pub account_id: Option<String>,
}

impl SecretQuery {
    pub fn by_account_id(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..Self::default()
        }
    }

    pub fn by_asset_name(asset: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            asset: Some(asset.into()),
            account: Some(account.into()),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        check_uuid("asset_id", self.asset_id.as_deref())?;
        check_uuid("account_id", self.account_id.as_deref())?;

        if is_set(&self.account_id) {
            if is_set(&self.asset) || is_set(&self.asset_id) || is_set(&self.account) {
                return Err(QueryError::AccountIdExclusive);
            }
            return Ok(());
        }

        if !is_set(&self.asset) && !is_set(&self.asset_id) {
            return Err(QueryError::MissingParams(vec!["asset", "asset_id"]));
        }
        if !is_set(&self.account) {
            return Err(QueryError::MissingParams(vec!["account", "account_id"]));
        }
        Ok(())
    }

    /// Validate and produce the GET operation for the account-secret
    /// endpoint. Empty fields are omitted; the rest keep field order.
    pub fn to_operation(&self) -> Result<Operation, QueryError> {
        self.validate()?;

        let mut op = Operation::get(ACCOUNT_SECRET_PATH);
        for (name, value) in [
            ("asset", &self.asset),
            ("asset_id", &self.asset_id),
            ("account", &self.account),
            ("account_id", &self.account_id),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                op = op.query(name, value);
            }
        }
        Ok(op)
    }
}

fn is_set(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.is_empty())
}

fn check_uuid(field: &'static str, value: Option<&str>) -> Result<(), QueryError> {
    match value {
        None | Some("") => Ok(()),
        Some(v) => Uuid::parse_str(v).map(|_| ()).map_err(|_| QueryError::InvalidUuid {
            field,
            value: v.to_string(),
        }),
    }
}
