//! Relational store collaborator
//!
//! The production deployment talks to a relational database through this
//! typed surface; the in-process implementation keeps the same query
//! semantics (case-insensitive wallet lookup, payee-to-user linking by
//! email, ownership-scoped reads) behind a `RwLock`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("email already in use: {0}")]
    EmailTaken(String),
}

// ==================== Entities ====================

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub wallet_address: Option<String>,
    pub encrypted_erc_registered: bool,
    pub encrypted_erc_public_key: Option<[String; 2]>,
    pub encrypted_erc_registration_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Payee {
    pub id: Uuid,
    pub email: String,
    pub monthly_amount: f64,
    /// Linked user, resolved by email match at write time
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WageGroup {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub payment_day: u8,
    pub yield_source: Option<String>,
    pub is_active: bool,
    pub payees: Vec<Payee>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    /// Vault deposit confirmed, confidential deposit still outstanding
    PendingConfidential,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Deposit {
    pub id: Uuid,
    pub wage_group_id: Uuid,
    pub owner_id: Uuid,
    pub tx_hash: String,
    pub amount: f64,
    /// Vault shares received, as a decimal string
    pub shares_received: String,
    pub yield_source: String,
    pub status: DepositStatus,
    pub encrypted_erc_tx_hash: Option<String>,
    pub encrypted_erc_status: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated wage-group fields, ready to persist.
#[derive(Debug, Clone)]
pub struct WageGroupDraft {
    pub name: String,
    pub start_date: NaiveDate,
    pub payment_day: u8,
    pub yield_source: Option<String>,
    pub payees: Vec<(String, f64)>,
}

// ==================== Store ====================

#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    users: HashMap<Uuid, User>,
    wage_groups: HashMap<Uuid, WageGroup>,
    deposits: HashMap<Uuid, Deposit>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // -------- users --------

    pub async fn create_user(
        &self,
        email: &str,
        wallet_address: Option<&str>,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email))
        {
            return Err(StoreError::EmailTaken(email.to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            first_name: None,
            last_name: None,
            wallet_address: wallet_address.map(str::to_string),
            encrypted_erc_registered: false,
            encrypted_erc_public_key: None,
            encrypted_erc_registration_tx_hash: None,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());

        // Adopt any payees that were created for this email before signup.
        for group in inner.wage_groups.values_mut() {
            for payee in &mut group.payees {
                if payee.email.eq_ignore_ascii_case(email) {
                    payee.user_id = Some(user.id);
                }
            }
        }

        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Option<User> {
        self.inner.read().await.users.get(&id).cloned()
    }

    pub async fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    /// Wallet addresses compare case-insensitively; callers mix checksummed
    /// and lowercase forms.
    pub async fn find_user_by_wallet(&self, address: &str) -> Option<User> {
        self.inner
            .read()
            .await
            .users
            .values()
            .find(|u| {
                u.wallet_address
                    .as_deref()
                    .is_some_and(|w| w.eq_ignore_ascii_case(address))
            })
            .cloned()
    }

    pub async fn update_user_names(
        &self,
        id: Uuid,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.first_name = Some(first_name.to_string());
        user.last_name = Some(last_name.to_string());
        Ok(user.clone())
    }

    pub async fn record_registration(
        &self,
        id: Uuid,
        wallet_address: &str,
        public_key: [String; 2],
        tx_hash: Option<&str>,
    ) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.wallet_address = Some(wallet_address.to_string());
        user.encrypted_erc_registered = true;
        user.encrypted_erc_public_key = Some(public_key);
        user.encrypted_erc_registration_tx_hash = tx_hash.map(str::to_string);
        Ok(user.clone())
    }

    // -------- wage groups --------

    pub async fn create_wage_group(
        &self,
        owner_id: Uuid,
        draft: WageGroupDraft,
    ) -> WageGroup {
        let mut inner = self.inner.write().await;
        let payees = link_payees(&inner.users, &draft.payees);
        let group = WageGroup {
            id: Uuid::new_v4(),
            owner_id,
            name: draft.name.trim().to_string(),
            start_date: draft.start_date,
            payment_day: draft.payment_day,
            yield_source: draft.yield_source,
            is_active: true,
            payees,
            created_at: Utc::now(),
        };
        inner.wage_groups.insert(group.id, group.clone());
        group
    }

    pub async fn list_wage_groups(&self, owner_id: Uuid) -> Vec<WageGroup> {
        let inner = self.inner.read().await;
        let mut groups: Vec<_> = inner
            .wage_groups
            .values()
            .filter(|g| g.owner_id == owner_id)
            .cloned()
            .collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        groups
    }

    pub async fn get_wage_group(&self, owner_id: Uuid, id: Uuid) -> Option<WageGroup> {
        self.inner
            .read()
            .await
            .wage_groups
            .get(&id)
            .filter(|g| g.owner_id == owner_id)
            .cloned()
    }

    /// Replaces the payee list wholesale, re-linking users by email.
    pub async fn update_wage_group(
        &self,
        owner_id: Uuid,
        id: Uuid,
        draft: WageGroupDraft,
    ) -> Result<WageGroup, StoreError> {
        let mut inner = self.inner.write().await;
        let payees = link_payees(&inner.users, &draft.payees);
        let group = inner
            .wage_groups
            .get_mut(&id)
            .filter(|g| g.owner_id == owner_id)
            .ok_or(StoreError::NotFound)?;
        group.name = draft.name.trim().to_string();
        group.start_date = draft.start_date;
        group.payment_day = draft.payment_day;
        group.yield_source = draft.yield_source;
        group.payees = payees;
        Ok(group.clone())
    }

    pub async fn delete_wage_group(&self, owner_id: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        match inner.wage_groups.get(&id) {
            Some(g) if g.owner_id == owner_id => {
                inner.wage_groups.remove(&id);
                // Payees are rows of the group; deposits keep their history.
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    // -------- deposits --------

    #[allow(clippy::too_many_arguments)]
    pub async fn create_deposit(
        &self,
        owner_id: Uuid,
        wage_group_id: Uuid,
        tx_hash: &str,
        amount: f64,
        shares_received: &str,
        yield_source: &str,
        status: DepositStatus,
    ) -> Deposit {
        let deposit = Deposit {
            id: Uuid::new_v4(),
            wage_group_id,
            owner_id,
            tx_hash: tx_hash.to_string(),
            amount,
            shares_received: shares_received.to_string(),
            yield_source: yield_source.to_string(),
            status,
            encrypted_erc_tx_hash: None,
            encrypted_erc_status: None,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .deposits
            .insert(deposit.id, deposit.clone());
        deposit
    }

    pub async fn update_deposit(
        &self,
        id: Uuid,
        status: Option<DepositStatus>,
        encrypted_erc_tx_hash: Option<&str>,
        encrypted_erc_status: Option<&str>,
    ) -> Result<Deposit, StoreError> {
        let mut inner = self.inner.write().await;
        let deposit = inner.deposits.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(status) = status {
            deposit.status = status;
        }
        if let Some(tx) = encrypted_erc_tx_hash {
            deposit.encrypted_erc_tx_hash = Some(tx.to_string());
        }
        if let Some(status) = encrypted_erc_status {
            deposit.encrypted_erc_status = Some(status.to_string());
        }
        Ok(deposit.clone())
    }

    pub async fn get_deposit(&self, owner_id: Uuid, id: Uuid) -> Option<Deposit> {
        self.inner
            .read()
            .await
            .deposits
            .get(&id)
            .filter(|d| d.owner_id == owner_id)
            .cloned()
    }

    pub async fn list_deposits(
        &self,
        owner_id: Uuid,
        wage_group_id: Option<Uuid>,
    ) -> Vec<Deposit> {
        let inner = self.inner.read().await;
        let mut deposits: Vec<_> = inner
            .deposits
            .values()
            .filter(|d| d.owner_id == owner_id)
            .filter(|d| wage_group_id.map_or(true, |g| d.wage_group_id == g))
            .cloned()
            .collect();
        deposits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        deposits
    }
}

fn link_payees(users: &HashMap<Uuid, User>, payees: &[(String, f64)]) -> Vec<Payee> {
    payees
        .iter()
        .map(|(email, amount)| Payee {
            id: Uuid::new_v4(),
            email: email.clone(),
            monthly_amount: *amount,
            user_id: users
                .values()
                .find(|u| u.email.eq_ignore_ascii_case(email))
                .map(|u| u.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(payees: Vec<(&str, f64)>) -> WageGroupDraft {
        WageGroupDraft {
            name: "engineering".to_string(),
            start_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            payment_day: 15,
            yield_source: None,
            payees: payees
                .into_iter()
                .map(|(e, a)| (e.to_string(), a))
                .collect(),
        }
    }

    #[tokio::test]
    async fn wage_group_roundtrip_links_known_users() {
        let store = Store::new();
        let owner = store.create_user("boss@example.com", None).await.unwrap();
        let worker = store
            .create_user("alice@example.com", None)
            .await
            .unwrap();

        let group = store
            .create_wage_group(
                owner.id,
                draft(vec![("alice@example.com", 1200.0), ("bob@example.com", 900.0)]),
            )
            .await;

        let listed = store.list_wage_groups(owner.id).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, group.id);
        assert_eq!(listed[0].payees.len(), 2);
        assert_eq!(listed[0].payees[0].user_id, Some(worker.id));
        assert_eq!(listed[0].payees[1].user_id, None);
    }

    #[tokio::test]
    async fn late_signup_adopts_existing_payees() {
        let store = Store::new();
        let owner = store.create_user("boss@example.com", None).await.unwrap();
        store
            .create_wage_group(owner.id, draft(vec![("bob@example.com", 900.0)]))
            .await;

        let bob = store.create_user("Bob@Example.com", None).await.unwrap();
        let groups = store.list_wage_groups(owner.id).await;
        assert_eq!(groups[0].payees[0].user_id, Some(bob.id));
    }

    #[tokio::test]
    async fn wage_groups_are_owner_scoped() {
        let store = Store::new();
        let owner = store.create_user("a@example.com", None).await.unwrap();
        let other = store.create_user("b@example.com", None).await.unwrap();
        let group = store
            .create_wage_group(owner.id, draft(vec![("c@example.com", 1.0)]))
            .await;

        assert!(store.get_wage_group(other.id, group.id).await.is_none());
        assert!(store
            .delete_wage_group(other.id, group.id)
            .await
            .is_err());
        assert!(store.delete_wage_group(owner.id, group.id).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = Store::new();
        store.create_user("x@example.com", None).await.unwrap();
        assert!(matches!(
            store.create_user("X@EXAMPLE.COM", None).await,
            Err(StoreError::EmailTaken(_))
        ));
    }

    #[tokio::test]
    async fn wallet_lookup_is_case_insensitive() {
        let store = Store::new();
        store
            .create_user("x@example.com", Some("0xAbCd000000000000000000000000000000000001"))
            .await
            .unwrap();
        assert!(store
            .find_user_by_wallet("0xabcd000000000000000000000000000000000001")
            .await
            .is_some());
    }

    #[tokio::test]
    async fn deposit_status_transitions_persist() {
        let store = Store::new();
        let owner = store.create_user("a@example.com", None).await.unwrap();
        let group = store
            .create_wage_group(owner.id, draft(vec![("c@example.com", 1.0)]))
            .await;

        let deposit = store
            .create_deposit(
                owner.id,
                group.id,
                "0xhash",
                250.0,
                "250000000",
                "vault-a",
                DepositStatus::PendingConfidential,
            )
            .await;

        let updated = store
            .update_deposit(
                deposit.id,
                Some(DepositStatus::Completed),
                Some("0xeerc"),
                Some("confirmed"),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, DepositStatus::Completed);

        let fetched = store.get_deposit(owner.id, deposit.id).await.unwrap();
        assert_eq!(fetched.encrypted_erc_tx_hash.as_deref(), Some("0xeerc"));
    }
}
