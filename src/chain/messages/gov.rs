use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ChainMessage, MessageKind};
use crate::chain::proto::{self, Any};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

impl VoteOption {
    fn as_proto(self) -> i32 {
        match self {
            VoteOption::Yes => 1,
            VoteOption::Abstain => 2,
            VoteOption::No => 3,
            VoteOption::NoWithVeto => 4,
        }
    }
}

/// Vote on a governance proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVote {
    pub proposal_id: u64,
    pub voter: String,
    pub option: VoteOption,
}

impl ChainMessage for MsgVote {
    fn type_url(&self) -> &'static str {
        "/cosmos.gov.v1beta1.MsgVote"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Governance
    }

    fn web3_fields(&self) -> Value {
        json!({
            "proposal_id": self.proposal_id.to_string(),
            "voter": self.voter,
            "option": self.option.as_proto(),
        })
    }

    fn to_any(&self) -> Any {
        let msg = proto::MsgVote {
            proposal_id: self.proposal_id,
            voter: self.voter.clone(),
            option: self.option.as_proto(),
        };
        Any::pack(self.type_url(), &msg)
    }
}
