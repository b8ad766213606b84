//! Users and their credentials
//!
//! The user record lives at `User_<id>`. The password never enters that
//! record: it is stored on its own at `Pwd_<id>` and only compared on
//! login.

use crate::policy::NegativePolicy;
use crate::repository::{Entity, KeyScheme, Repository};
use recordchain_core::decimal::{checked_add, format_fixed, parse_decimal};
use recordchain_core::keys::{prefix, primary_key};
use recordchain_core::{RecordError, RecordResult};
use recordchain_store::{record, HistoryRecord, Ledger};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::{debug, info};

/// Fractional digits kept for accumulated cost
const COST_DP: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    /// Only present on insert requests
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub coupon: String,
    #[serde(rename = "VIP")]
    pub vip: String,
    pub phone: String,
    /// Total amount spent
    pub cost: String,
    pub create_time: String,
}

impl HistoryRecord for User {}

impl Entity for User {
    const KIND: &'static str = "User";
    const SCHEME: KeyScheme = KeyScheme::Flat { prefix: prefix::USER };

    fn id(&self) -> &str {
        &self.id
    }

    fn create_time(&self) -> &str {
        &self.create_time
    }

    fn set_create_time(&mut self, create_time: String) {
        self.create_time = create_time;
    }

    fn prepare_insert(&mut self) {
        if self.vip.is_empty() {
            self.vip = VipLevel::default().to_string();
        }
        if self.cost.is_empty() {
            self.cost = format_fixed(Default::default(), COST_DP);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum VipLevel {
    #[default]
    Level0,
    Level1,
    Level2,
    Level3,
    Level4,
}

/// Fields accepted by [`Users::change`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum UserField {
    Coupon,
    #[strum(serialize = "VIP")]
    Vip,
    Phone,
    /// Additive: the value is added to the stored total
    Cost,
}

impl UserField {
    pub fn parse(field: &str) -> RecordResult<Self> {
        field
            .parse()
            .map_err(|_| RecordError::InvalidField(field.to_string()))
    }
}

/// Outcome of a credential check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LoginOutcome {
    Success,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct Users {
    repo: Repository<User>,
    cost_policy: NegativePolicy,
}

impl Users {
    pub fn new(cost_policy: NegativePolicy) -> Self {
        Self {
            repo: Repository::new(),
            cost_policy,
        }
    }

    /// Store the user and, separately, its credential
    pub fn insert(&self, ledger: &mut dyn Ledger, mut user: User) -> RecordResult<User> {
        let password = std::mem::take(&mut user.password);

        let user = self.repo.insert(ledger, user)?;
        ledger.put_state(&password_key(&user.id), password.into_bytes())?;
        Ok(user)
    }

    pub fn query_by_id(&self, ledger: &dyn Ledger, id: &str) -> RecordResult<User> {
        self.repo.get::<&str>(ledger, id, &[])
    }

    pub fn login(&self, ledger: &dyn Ledger, id: &str, password: &str) -> RecordResult<LoginOutcome> {
        let stored = ledger
            .get_state(&password_key(id))?
            .ok_or_else(|| RecordError::not_found(User::KIND, id))?;

        let outcome = if stored == password.as_bytes() {
            LoginOutcome::Success
        } else {
            LoginOutcome::Failed
        };
        debug!(id, %outcome, "Login checked");
        Ok(outcome)
    }

    /// Field-level update. `Cost` adds `value` to the stored total.
    pub fn change(&self, ledger: &mut dyn Ledger, id: &str, field: &str, value: &str) -> RecordResult<User> {
        let field = UserField::parse(field)?;
        let cost_policy = self.cost_policy;

        let user = self.repo.modify::<&str, _>(ledger, id, &[], |user| {
            match field {
                UserField::Coupon => user.coupon = value.to_string(),
                UserField::Vip => user.vip = value.to_string(),
                UserField::Phone => user.phone = value.to_string(),
                UserField::Cost => {
                    let current = parse_decimal("Cost", &user.cost)?;
                    let total = checked_add("Cost", current, parse_decimal("Cost", value)?)?;
                    let total = cost_policy.apply("Cost", total)?;
                    user.cost = format_fixed(total, COST_DP);
                }
            }
            Ok(())
        })?;

        info!(id, %field, "User changed");
        Ok(user)
    }

    /// Remove the user and its credential
    pub fn delete(&self, ledger: &mut dyn Ledger, id: &str) -> RecordResult<User> {
        let removed = self.repo.delete::<&str>(ledger, id, &[])?;
        record::delete(ledger, &password_key(id))?;
        Ok(removed)
    }
}

fn password_key(id: &str) -> String {
    primary_key(prefix::PASSWORD, id)
}
