//! Message server
//!
//! The module defines no message types; every message routed here is
//! rejected as unrecognized.

use wolochain_core::{Any, Context, MsgResponse, WolochainError, WolochainResult};

use crate::keeper::Keeper;
use crate::types::MODULE_NAME;

/// Type-URL prefix of the module's messages
pub const MSG_TYPE_PREFIX: &str = "/wolochain.wolochain.";

pub struct MsgServer<'k> {
    keeper: &'k Keeper,
}

impl<'k> MsgServer<'k> {
    pub fn new(keeper: &'k Keeper) -> Self {
        Self { keeper }
    }

    pub fn keeper(&self) -> &Keeper {
        self.keeper
    }

    pub fn handle(&self, _ctx: &mut Context<'_>, msg: &Any) -> WolochainResult<MsgResponse> {
        Err(WolochainError::UnknownMessage {
            module: MODULE_NAME.to_string(),
            type_url: msg.type_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wolochain_core::{BlockHeader, Height, Timestamp};
    use wolochain_state::MemoryStore;

    #[test]
    fn test_msg_server_rejects_messages() {
        let keeper = Keeper::new();
        let server = MsgServer::new(&keeper);
        let mut store = MemoryStore::new();
        let mut ctx = Context::new(
            &mut store,
            BlockHeader::new("wolochain", Height::new(1), Timestamp::from_millis(0)),
        );

        let msg = Any::new("/wolochain.wolochain.MsgDoSomething", serde_json::json!({}));
        let err = server.handle(&mut ctx, &msg).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unrecognized wolochain message type: /wolochain.wolochain.MsgDoSomething"
        );
        assert!(store.is_empty());
    }
}
