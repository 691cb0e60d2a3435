use chrono::{DateTime, Utc};

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Accepted,
    Blocked,
    Expired,
    Invalid,
    ConcurrentTx,
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdTagInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id_tag: Option<String>,
    pub status: AuthorizationStatus,
}

impl IdTagInfo {
    pub fn accepted() -> Self {
        Self {
            expiry_date: None,
            parent_id_tag: None,
            status: AuthorizationStatus::Accepted,
        }
    }

    /// Accepted and not past its expiry date. An unknown clock never expires a tag.
    pub fn is_valid(&self, now: Option<DateTime<Utc>>) -> bool {
        if self.status != AuthorizationStatus::Accepted {
            return false;
        }
        match (self.expiry_date, now) {
            (Some(expiry), Some(now)) => now <= expiry,
            _ => true,
        }
    }
}
