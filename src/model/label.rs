use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The field an account record is keyed by in the directory.
pub const ACCOUNT_ID_FIELD: &str = "Id";

/// The label field used when none is configured.
pub const DEFAULT_LABEL_FIELD: &str = "Email";

/// One account from the account directory, e.g.
/// `{"Id": "111222333444", "Email": "prod@example.com", "Name": "Prod Account", ...}`.
///
/// Fields are kept as an open map because the label field is chosen by configuration.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountRecord(Map<String, Value>);

impl AccountRecord {
    pub fn new<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get(ACCOUNT_ID_FIELD).and_then(Value::as_str)
    }

    /// Returns the value of `field` as text. Non-string JSON values are rendered as JSON.
    pub fn field(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Maps a dimension key (an account ID) to the account's directory record. Built once per run
/// and read-only afterwards.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct LabelTable {
    accounts: HashMap<String, AccountRecord>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from directory records. Records without an `Id` are skipped.
    pub fn from_records(records: impl IntoIterator<Item = AccountRecord>) -> Self {
        let accounts = records
            .into_iter()
            .filter_map(|record| {
                let id = record.id()?.to_string();
                Some((id, record))
            })
            .collect();
        Self { accounts }
    }

    pub fn get(&self, key: &str) -> Option<&AccountRecord> {
        self.accounts.get(key)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_records_keys_by_id() {
        let table = LabelTable::from_records(vec![
            AccountRecord::new([("Id", "111"), ("Email", "a@example.com")]),
            AccountRecord::new([("Email", "orphan@example.com")]),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get("111").and_then(|r| r.field("Email")).as_deref(),
            Some("a@example.com")
        );
    }

    #[test]
    fn test_field_renders_non_strings() {
        let record: AccountRecord =
            serde_json::from_str(r#"{"Id": "1", "JoinedTimestamp": 1700000000, "Arn": null}"#)
                .unwrap();
        assert_eq!(record.field("JoinedTimestamp").as_deref(), Some("1700000000"));
        assert_eq!(record.field("Arn"), None);
        assert_eq!(record.field("Missing"), None);
    }
}
