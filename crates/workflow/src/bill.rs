//! Bill entity and its endorsement state

use recordchain_core::keys::{prefix, primary_key};
use recordchain_core::{RecordError, RecordResult};
use recordchain_store::HistoryRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// Signer roles a bill passes through after the drawer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Role {
    Teacher,
    School,
}

/// Endorsement state of a bill
///
/// Stored as the legacy state strings. The school wait phase is written
/// as `TeacherSigned`; `WaitSchoolSign` is accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BillState {
    /// Waiting for the given role to accept or reject
    AwaitingFrom(Role),
    SchoolSigned,
    TeacherReject,
    SchoolReject,
    OverDue,
}

impl BillState {
    pub const ISSUED: BillState = BillState::AwaitingFrom(Role::Teacher);

    pub fn as_str(&self) -> &'static str {
        match self {
            BillState::AwaitingFrom(Role::Teacher) => "WaitTeacherSign",
            BillState::AwaitingFrom(Role::School) => "TeacherSigned",
            BillState::SchoolSigned => "SchoolSigned",
            BillState::TeacherReject => "TeacherReject",
            BillState::SchoolReject => "SchoolReject",
            BillState::OverDue => "OverDue",
        }
    }

    /// Role expected to act next, if any
    pub fn awaiting(&self) -> Option<Role> {
        match self {
            BillState::AwaitingFrom(role) => Some(*role),
            _ => None,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting().is_some()
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_awaiting()
    }
}

impl FromStr for BillState {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WaitTeacherSign" => Ok(BillState::AwaitingFrom(Role::Teacher)),
            "TeacherSigned" | "WaitSchoolSign" => Ok(BillState::AwaitingFrom(Role::School)),
            "SchoolSigned" => Ok(BillState::SchoolSigned),
            "TeacherReject" => Ok(BillState::TeacherReject),
            "SchoolReject" => Ok(BillState::SchoolReject),
            "OverDue" => Ok(BillState::OverDue),
            other => Err(RecordError::Encoding(format!("unknown bill state: {:?}", other))),
        }
    }
}

impl fmt::Display for BillState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for BillState {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BillState> for String {
    fn from(state: BillState) -> Self {
        state.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bill {
    #[serde(rename = "BillInfoID")]
    pub id: String,

    #[serde(rename = "BillInfoType")]
    pub bill_type: String,

    /// Unix seconds, assigned on issue
    #[serde(rename = "BillInfoIsseDate", alias = "BillInfoIssueDate")]
    pub issue_date: String,

    /// Unix seconds; empty means the bill never falls due
    #[serde(rename = "BillInfoDueDate")]
    pub due_date: String,

    #[serde(rename = "DrwrCmID")]
    pub drawer_id: String,

    #[serde(rename = "DrwrAcct")]
    pub drawer_name: String,

    #[serde(rename = "WaitEndorserCmID")]
    pub wait_endorser_id: String,

    #[serde(rename = "WaitEndorserAcct")]
    pub wait_endorser_name: String,

    #[serde(rename = "RejectEndorserCmID")]
    pub reject_endorser_id: String,

    #[serde(rename = "RejectEndorserAcct")]
    pub reject_endorser_name: String,

    /// `None` only for the empty snapshot standing in for a deletion
    #[serde(rename = "State", with = "optional_state")]
    pub state: Option<BillState>,
}

impl Bill {
    pub fn key(&self) -> String {
        bill_key(&self.id)
    }

    /// Due time in Unix seconds, `None` when no due date is set
    pub fn due_at(&self) -> RecordResult<Option<i64>> {
        let due = self.due_date.trim();
        if due.is_empty() {
            return Ok(None);
        }
        due.parse::<i64>()
            .map(Some)
            .map_err(|_| RecordError::parse("BillInfoDueDate", &self.due_date))
    }

    /// Due date set and strictly before `now`
    pub fn is_overdue(&self, now: i64) -> RecordResult<bool> {
        Ok(matches!(self.due_at()?, Some(due) if due < now))
    }

    pub fn is_awaiting(&self) -> bool {
        self.state.is_some_and(|s| s.is_awaiting())
    }

    /// Whether `endorser_id` is the party expected to act now
    pub fn is_waiting_on(&self, endorser_id: &str) -> bool {
        self.is_awaiting() && self.wait_endorser_id == endorser_id
    }

    pub(crate) fn clear_wait(&mut self) {
        self.wait_endorser_id.clear();
        self.wait_endorser_name.clear();
    }
}

impl HistoryRecord for Bill {
    const HISTORY_FIELD: &'static str = "bill";
}

pub fn bill_key(id: &str) -> String {
    primary_key(prefix::BILL, id)
}

/// Empty `State` string maps to `None`
mod optional_state {
    use super::BillState;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(state: &Option<BillState>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(state.map_or("", |s| s.as_str()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BillState>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_strings() {
        assert_eq!(BillState::ISSUED.as_str(), "WaitTeacherSign");
        assert_eq!(BillState::AwaitingFrom(Role::School).to_string(), "TeacherSigned");
        assert_eq!(BillState::SchoolSigned.as_str(), "SchoolSigned");
        assert_eq!(
            "WaitSchoolSign".parse::<BillState>().unwrap(),
            BillState::AwaitingFrom(Role::School)
        );
        assert!("Signed".parse::<BillState>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(BillState::ISSUED.is_awaiting());
        assert_eq!(BillState::AwaitingFrom(Role::School).awaiting(), Some(Role::School));
        for state in [
            BillState::SchoolSigned,
            BillState::TeacherReject,
            BillState::SchoolReject,
            BillState::OverDue,
        ] {
            assert!(state.is_terminal());
        }
    }

    #[test]
    fn test_bill_wire_format() {
        let json = r#"{"BillInfoID":"B1","DrwrCmID":"D1","WaitEndorserCmID":"T1","BillInfoDueDate":"","State":"WaitTeacherSign"}"#;
        let bill: Bill = serde_json::from_str(json).unwrap();
        assert_eq!(bill.id, "B1");
        assert_eq!(bill.state, Some(BillState::ISSUED));

        let value = serde_json::to_value(&bill).unwrap();
        assert_eq!(value["State"], "WaitTeacherSign");
        assert_eq!(value["BillInfoIsseDate"], "");
        assert_eq!(value["WaitEndorserCmID"], "T1");
    }

    #[test]
    fn test_empty_state_is_none() {
        let bill: Bill = serde_json::from_str(r#"{"BillInfoID":"B1","State":""}"#).unwrap();
        assert_eq!(bill.state, None);
        assert_eq!(serde_json::to_value(Bill::default()).unwrap()["State"], "");

        let bad = serde_json::from_str::<Bill>(r#"{"BillInfoID":"B1","State":"Lost"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_due_date() {
        let mut bill = Bill::default();
        assert_eq!(bill.due_at().unwrap(), None);
        assert!(!bill.is_overdue(i64::MAX).unwrap());

        bill.due_date = "1000".into();
        assert!(bill.is_overdue(1001).unwrap());
        assert!(!bill.is_overdue(1000).unwrap());

        bill.due_date = "tomorrow".into();
        assert!(matches!(bill.due_at(), Err(RecordError::Parse { .. })));
    }
}
