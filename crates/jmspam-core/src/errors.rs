#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid uuid for {field}: {value}")]
    InvalidUuid { field: &'static str, value: String },
    #[error("account_id cannot be combined with asset, asset_id or account")]
    AccountIdExclusive,
    #[error("at least one of the following fields must be provided: {}", .0.join(", "))]
    MissingParams(Vec<&'static str>),
}
